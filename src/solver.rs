/* ************************************************************************ **
** This file is part of rsp2, and is licensed under EITHER the MIT license  **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                          **
**     http://opensource.org/licenses/MIT                                  **
**                                                                          **
** Be aware that not all of rsp2 is provided under this permissive license, **
** and that the project as a whole is licensed under the GPL 3.0.          **
** ************************************************************************ */

//! Diagonalization of the dynamical matrix.
//!
//! The reference takes an unconditional `sqrt` of the eigenvalues, which
//! turns negative eigenvalues (imaginary/unstable modes) into NaN. This is
//! the one deliberate behavioral departure from that reference noted in the
//! spec: frequencies are reported as `sign(lambda) * sqrt(|lambda|)`.

use nalgebra::DMatrix;
use num_complex::Complex64;

use crate::error::{Outcome, PhononError};

pub struct HermitianSolver;

impl HermitianSolver {
    /// Diagonalizes a Hermitian `matrix`, returning `(frequencies, eigenvectors)`
    /// with frequencies ascending and eigenvectors as the matching columns of
    /// a unitary matrix.
    ///
    /// `qpoint_index` is only used to annotate [`PhononError::NumericalFailure`].
    pub fn solve(
        matrix: &DMatrix<Complex64>,
        qpoint_index: usize,
    ) -> Outcome<(Vec<f64>, DMatrix<Complex64>)> {
        let eigen = matrix.clone().symmetric_eigen();
        let n = eigen.eigenvalues.len();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            eigen.eigenvalues[a].partial_cmp(&eigen.eigenvalues[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        if order.iter().any(|&i| !eigen.eigenvalues[i].is_finite()) {
            return Err(PhononError::NumericalFailure {
                qpoint_index,
                detail: "eigendecomposition produced a non-finite eigenvalue".into(),
            });
        }

        let mut frequencies = vec![0.0; n];
        let mut eigenvectors = DMatrix::from_element(n, n, Complex64::new(0.0, 0.0));
        for (new_col, &old_col) in order.iter().enumerate() {
            let lambda = eigen.eigenvalues[old_col];
            frequencies[new_col] = signed_sqrt(lambda);
            eigenvectors.set_column(new_col, &eigen.eigenvectors.column(old_col));
        }

        Ok((frequencies, eigenvectors))
    }
}

fn signed_sqrt(lambda: f64) -> f64 {
    if lambda >= 0.0 { lambda.sqrt() } else { -(-lambda).sqrt() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::DMatrix;

    #[test]
    fn diagonal_matrix_round_trips_eigenvalues() {
        let data = [2.0, 0.0, 0.0, 8.0];
        let m = DMatrix::from_iterator(2, 2, data.iter().map(|&x| Complex64::new(x, 0.0)));
        let (freqs, _) = HermitianSolver::solve(&m, 0).unwrap();
        assert_abs_diff_eq!(freqs[0], 2.0f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(freqs[1], 8.0f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn negative_eigenvalue_yields_signed_sqrt() {
        let data = [-4.0, 0.0, 0.0, 9.0];
        let m = DMatrix::from_iterator(2, 2, data.iter().map(|&x| Complex64::new(x, 0.0)));
        let (freqs, _) = HermitianSolver::solve(&m, 0).unwrap();
        assert_abs_diff_eq!(freqs[0], -2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(freqs[1], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn eigenvectors_are_orthonormal() {
        let m = DMatrix::from_iterator(
            2, 2,
            [2.0, 1.0, 1.0, 2.0].iter().map(|&x| Complex64::new(x, 0.0)),
        );
        let (_, vecs) = HermitianSolver::solve(&m, 0).unwrap();
        let should_be_identity = vecs.adjoint() * &vecs;
        for r in 0..2 {
            for c in 0..2 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(should_be_identity[(r, c)].re, expected, epsilon = 1e-10);
                assert_abs_diff_eq!(should_be_identity[(r, c)].im, 0.0, epsilon = 1e-10);
            }
        }
    }
}
