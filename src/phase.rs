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

//! Bloch phase factors for a single q-point, recomputed fresh per q (this
//! table is transient per-q scratch, not cached across calls to `evaluate`).

use num_complex::Complex64;
use nalgebra::Vector3;

use crate::geometry::LatticeGeometry;
use crate::images::ImageTable;

/// `phase[c * n_offsets + k] = exp(2 pi i q . (sc_matrix^T offsets[k] + cell_origins[c]))`.
pub struct PhaseTable {
    n_offsets: usize,
    phase: Vec<Complex64>,
}

impl PhaseTable {
    pub fn build(q: &Vector3<f64>, geometry: &LatticeGeometry, images: &ImageTable) -> Self {
        use std::f64::consts::PI;

        let n_offsets = images.offsets().len();
        let n_cells = geometry.n_cells();

        let phase_offset: Vec<Complex64> = images.offset_term().iter()
            .map(|term| Complex64::from_polar(1.0, 2.0 * PI * q.dot(term)))
            .collect();
        let phase_cell: Vec<Complex64> = geometry.cell_origins().iter()
            .map(|origin| {
                let origin = origin.map(|x| x as f64);
                Complex64::from_polar(1.0, 2.0 * PI * q.dot(&origin))
            })
            .collect();

        let mut phase = Vec::with_capacity(n_cells * n_offsets);
        for cell_phase in &phase_cell {
            for offset_phase in &phase_offset {
                phase.push(cell_phase * offset_phase);
            }
        }

        PhaseTable { n_offsets, phase }
    }

    pub fn get(&self, cell: usize, offset_index: u32) -> Complex64 {
        self.phase[cell * self.n_offsets + offset_index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Matrix3;
    use crate::images::ImageEnumerator;

    #[test]
    fn gamma_point_phase_is_unity() {
        let cell = Matrix3::identity();
        let sc = Matrix3::new(2, 0, 0, 0, 1, 0, 0, 0, 1);
        let origins = vec![Vector3::new(0, 0, 0), Vector3::new(1, 0, 0)];
        let geom = LatticeGeometry::new(
            cell, sc, origins, vec![Vector3::zeros()], vec![1.0],
        ).unwrap();
        let images = ImageEnumerator::build(&geom, 2).unwrap();

        let table = PhaseTable::build(&Vector3::zeros(), &geom, &images);
        for c in 0..geom.n_cells() {
            for k in 0..images.offsets().len() as u32 {
                let phase = table.get(c, k);
                assert_abs_diff_eq!(phase.re, 1.0, epsilon = 1e-12);
                assert_abs_diff_eq!(phase.im, 0.0, epsilon = 1e-12);
            }
        }
    }
}
