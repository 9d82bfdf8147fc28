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

//! Primitive cell, supercell, and ion data shared by every other component.
//!
//! Everything here is immutable once constructed; [`LatticeGeometry::new`]
//! is the single validation point for the invariants listed in the data
//! model (nonzero supercell determinant, positive masses, matching shapes).

use nalgebra::{Matrix3, Vector3};

use crate::error::{Outcome, PhononError};

/// Primitive cell + supercell description, immutable after construction.
///
/// `cell_vectors` rows are the primitive lattice vectors in Cartesian bohr;
/// `sc_matrix` is the integer transform to the supercell; `cell_origins` give
/// the placement of each primitive cell within the supercell; `ion_frac` and
/// `ion_mass` describe the ions of the primitive cell.
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeGeometry {
    cell_vectors: Matrix3<f64>,
    sc_matrix: Matrix3<i32>,
    cell_origins: Vec<Vector3<i32>>,
    ion_frac: Vec<Vector3<f64>>,
    ion_mass: Vec<f64>,
}

impl LatticeGeometry {
    /// Validates and builds a geometry.
    ///
    /// Fails with [`PhononError::GeometryInvalid`] if the supercell matrix is
    /// singular, if `cell_origins` doesn't have exactly `n_cells` rows, or if
    /// any mass is non-positive.
    pub fn new(
        cell_vectors: Matrix3<f64>,
        sc_matrix: Matrix3<i32>,
        cell_origins: Vec<Vector3<i32>>,
        ion_frac: Vec<Vector3<f64>>,
        ion_mass: Vec<f64>,
    ) -> Outcome<Self> {
        let det = sc_matrix.map(|x| x as f64).determinant();
        if det.round() == 0.0 {
            return Err(PhononError::geometry_invalid("supercell matrix is singular"));
        }

        let n_cells = det.abs().round() as usize;
        if cell_origins.len() != n_cells {
            return Err(PhononError::geometry_invalid(format!(
                "cell_origins has {} rows, but |det(sc_matrix)| = {}",
                cell_origins.len(), n_cells,
            )));
        }

        if ion_mass.len() != ion_frac.len() {
            return Err(PhononError::geometry_invalid(format!(
                "{} ion positions but {} masses", ion_frac.len(), ion_mass.len(),
            )));
        }
        if let Some(&bad) = ion_mass.iter().find(|&&m| !(m > 0.0)) {
            return Err(PhononError::geometry_invalid(format!(
                "ion mass must be positive, got {}", bad,
            )));
        }

        Ok(LatticeGeometry { cell_vectors, sc_matrix, cell_origins, ion_frac, ion_mass })
    }

    pub fn n_ions(&self) -> usize { self.ion_frac.len() }

    pub fn n_cells(&self) -> usize { self.cell_origins.len() }

    pub fn cell_vectors(&self) -> &Matrix3<f64> { &self.cell_vectors }

    pub fn sc_matrix(&self) -> &Matrix3<i32> { &self.sc_matrix }

    pub fn cell_origins(&self) -> &[Vector3<i32>] { &self.cell_origins }

    pub fn ion_frac(&self) -> &[Vector3<f64>] { &self.ion_frac }

    pub fn ion_mass(&self) -> &[f64] { &self.ion_mass }

    /// Rows are the supercell lattice vectors in Cartesian bohr: `sc_matrix · cell_vectors`.
    pub fn supercell_vectors(&self) -> Matrix3<f64> {
        let sc_f = self.sc_matrix.map(|x| x as f64);
        sc_f * self.cell_vectors
    }

    /// Converts fractional (primitive-cell) coordinates to Cartesian bohr.
    pub fn to_cartesian(&self, frac: &Vector3<f64>) -> Vector3<f64> {
        self.cell_vectors.transpose() * frac
    }

    /// Cartesian position (bohr) of atom `j` of primitive cell `c` within the supercell,
    /// i.e. ion `j` displaced by the integer cell origin `cell_origins[c]`.
    pub fn supercell_atom_cartesian(&self, cell: usize, ion: usize) -> Vector3<f64> {
        let origin = self.cell_origins[cell].map(|x| x as f64);
        self.to_cartesian(&(self.ion_frac[ion] + origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic(a: f64) -> Matrix3<f64> {
        Matrix3::new(
            a, 0.0, 0.0,
            0.0, a, 0.0,
            0.0, 0.0, a,
        )
    }

    #[test]
    fn rejects_singular_supercell() {
        let sc = Matrix3::new(1, 0, 0, 0, 1, 0, 0, 0, 0);
        let err = LatticeGeometry::new(
            cubic(1.0), sc, vec![Vector3::zeros()], vec![Vector3::zeros()], vec![1.0],
        ).unwrap_err();
        assert!(format!("{}", err).contains("singular"));
    }

    #[test]
    fn rejects_nonpositive_mass() {
        let sc = Matrix3::identity();
        let err = LatticeGeometry::new(
            cubic(1.0), sc, vec![Vector3::zeros()], vec![Vector3::zeros()], vec![0.0],
        ).unwrap_err();
        assert!(format!("{}", err).contains("positive"));
    }

    #[test]
    fn rejects_mismatched_cell_origins() {
        let sc = Matrix3::new(2, 0, 0, 0, 1, 0, 0, 0, 1);
        let err = LatticeGeometry::new(
            cubic(1.0), sc, vec![Vector3::zeros()], vec![Vector3::zeros()], vec![1.0],
        ).unwrap_err();
        assert!(format!("{}", err).contains("cell_origins"));
    }

    #[test]
    fn supercell_vectors_scale_diagonal() {
        let sc = Matrix3::new(3, 0, 0, 0, 3, 0, 0, 0, 3);
        let geom = LatticeGeometry::new(
            cubic(2.0), sc,
            (0..27).map(|_| Vector3::zeros()).collect(),
            vec![Vector3::zeros()], vec![1.0],
        ).unwrap();
        assert_eq!(geom.supercell_vectors(), cubic(6.0));
    }
}
