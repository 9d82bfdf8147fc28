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

//! Assembly of the 3N x 3N Hermitian dynamical matrix at a single q-point
//! from force constants, a [`PhaseTable`], and an [`ImageTable`].
//!
//! The cumulant average (dividing by `counts[i, J]`) makes the result
//! invariant to how many symmetry-equivalent images were selected for a
//! given pair; see [`crate::images`] for the selection itself.

use nalgebra::DMatrix;
use num_complex::Complex64;

use crate::force_constants::ForceConstants;
use crate::images::ImageTable;
use crate::phase::PhaseTable;

pub struct DynamicalMatrixBuilder<'a> {
    pub force_constants: &'a ForceConstants,
    pub images: &'a ImageTable,
    pub ion_mass: &'a [f64],
    pub mass_weight: bool,
    pub enforce_hermitian: bool,
}

impl<'a> DynamicalMatrixBuilder<'a> {
    /// Assembles `D(q)` given the phase table for that q-point.
    pub fn build(&self, phase: &PhaseTable) -> DMatrix<Complex64> {
        let n_ions = self.force_constants.n_ions();
        let n_cells = self.force_constants.n_cells();
        let n_branches = 3 * n_ions;

        let mut d = DMatrix::from_element(n_branches, n_branches, Complex64::new(0.0, 0.0));

        for i in 0..n_ions {
            for big_j in 0..n_ions * n_cells {
                let (cell, j) = (big_j / n_ions, big_j % n_ions);
                let count = self.images.count(i, big_j);
                if count == 0 {
                    // Geometry/force-constant mismatch at this lim; the evaluator
                    // is responsible for having already failed fast on underflow.
                    continue;
                }

                let term: Complex64 = self.images.images(i, big_j).iter()
                    .map(|&k| phase.get(cell, k))
                    .sum();
                let weight = term / count as f64;

                for alpha in 0..3 {
                    for beta in 0..3 {
                        let fc = self.force_constants.get(cell, i, alpha, j, beta);
                        d[(3 * i + alpha, 3 * j + beta)] += weight * fc;
                    }
                }
            }
        }

        if self.mass_weight {
            for i in 0..n_ions {
                for j in 0..n_ions {
                    let denom = (self.ion_mass[i] * self.ion_mass[j]).sqrt();
                    for alpha in 0..3 {
                        for beta in 0..3 {
                            d[(3 * i + alpha, 3 * j + beta)] /= denom;
                        }
                    }
                }
            }
        }

        if self.enforce_hermitian {
            d = (&d + d.adjoint()) * Complex64::new(0.5, 0.0);
        }

        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Matrix3, Vector3};
    use crate::geometry::LatticeGeometry;
    use crate::images::ImageEnumerator;

    #[test]
    fn single_atom_identity_fc_reproduces_scalar() {
        // A single-atom cubic cell, 2x2x2 supercell, with identity-times-k force
        // constants at cell 0 only. The cumulant average should reduce to a
        // plain scalar k on the diagonal at gamma, since counts and the image
        // sum cancel exactly (invariant 6).
        let cell = Matrix3::identity();
        let sc = Matrix3::new(2, 0, 0, 0, 2, 0, 0, 0, 2);
        let mut origins = Vec::new();
        for x in 0..2 { for y in 0..2 { for z in 0..2 {
            origins.push(Vector3::new(x, y, z));
        }}}
        let geom = LatticeGeometry::new(
            cell, sc, origins, vec![Vector3::zeros()], vec![1.0],
        ).unwrap();
        let images = ImageEnumerator::build(&geom, 2).unwrap();

        let n_cells = geom.n_cells();
        let k = 3.5;
        let mut data = vec![0.0; n_cells * 9];
        for c in 0..n_cells {
            for a in 0..3 {
                data[c * 9 + a * 3 + a] = if c == 0 { k } else { 0.0 };
            }
        }
        let fc = crate::force_constants::ForceConstants::from_flat(n_cells, 1, data).unwrap();

        let phase = crate::phase::PhaseTable::build(&Vector3::zeros(), &geom, &images);
        let builder = DynamicalMatrixBuilder {
            force_constants: &fc,
            images: &images,
            ion_mass: &[1.0],
            mass_weight: true,
            enforce_hermitian: true,
        };
        let d = builder.build(&phase);
        for a in 0..3 {
            assert_abs_diff_eq!(d[(a, a)].re, k, epsilon = 1e-10);
        }
    }
}
