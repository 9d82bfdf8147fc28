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

//! The `(n_cells, 3 n_ions, 3 n_ions)` force-constant tensor, one of the
//! fixed external interfaces described in the spec: shape, units
//! (hartree/bohr^2) and index ordering `(cell, 3i+alpha, 3j+beta)` are owned
//! by the calling layer and must be honored bit-exactly here.

use crate::error::{Outcome, PhononError};

/// C-contiguous `(n_cells, 3 n_ions, 3 n_ions)` force-constant tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceConstants {
    n_cells: usize,
    n_branches: usize,
    data: Vec<f64>,
}

impl ForceConstants {
    /// Wraps a flat, C-contiguous buffer of length `n_cells * (3 n_ions)^2`.
    pub fn from_flat(n_cells: usize, n_ions: usize, data: Vec<f64>) -> Outcome<Self> {
        let n_branches = 3 * n_ions;
        let expected = n_cells * n_branches * n_branches;
        if data.len() != expected {
            return Err(PhononError::geometry_invalid(format!(
                "force constants have {} entries, expected {} for {} cells x {} branches",
                data.len(), expected, n_cells, n_branches,
            )));
        }
        Ok(ForceConstants { n_cells, n_branches, data })
    }

    pub fn n_cells(&self) -> usize { self.n_cells }

    pub fn n_ions(&self) -> usize { self.n_branches / 3 }

    /// The alpha,beta Cartesian component of the force between atom i in cell 0
    /// and atom j in cell `cell`.
    #[inline]
    pub fn get(&self, cell: usize, i: usize, alpha: usize, j: usize, beta: usize) -> f64 {
        let row = 3 * i + alpha;
        let col = 3 * j + beta;
        self.data[(cell * self.n_branches + row) * self.n_branches + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        let err = ForceConstants::from_flat(2, 1, vec![0.0; 5]).unwrap_err();
        assert!(format!("{}", err).contains("force constants"));
    }

    #[test]
    fn indexes_c_contiguous() {
        // 1 cell, 1 ion => 3x3, entries 0..9 in row-major order.
        let data: Vec<f64> = (0..9).map(|x| x as f64).collect();
        let fc = ForceConstants::from_flat(1, 1, data).unwrap();
        assert_eq!(fc.get(0, 0, 0, 0, 0), 0.0);
        assert_eq!(fc.get(0, 0, 1, 0, 2), 5.0);
        assert_eq!(fc.get(0, 0, 2, 0, 2), 8.0);
    }
}
