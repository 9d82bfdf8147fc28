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

//! The orchestrator: [`PhononEvaluator`] ties geometry, force constants and
//! options together and drives the per-q-point pipeline described in the
//! system overview (phase table -> dynamical matrix -> diagonalization).

use nalgebra::{DMatrix, Vector3};
use num_complex::Complex64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dynmat::DynamicalMatrixBuilder;
use crate::error::{Outcome, PhononError};
use crate::force_constants::ForceConstants;
use crate::geometry::LatticeGeometry;
use crate::images::{ImageEnumerator, ImageTable, DEFAULT_LIM};
use crate::phase::PhaseTable;
use crate::solver::HermitianSolver;

fn _phonon_options__image_search_radius() -> u32 { DEFAULT_LIM }
fn _phonon_options__mass_weight() -> bool { true }
fn _phonon_options__enforce_hermitian() -> bool { true }

/// How many times the image search radius is allowed to grow past the
/// configured value before a persistent underflow is reported to the caller.
const IMAGE_SEARCH_RETRY_BUDGET: u32 = 3;

/// Recognized configuration fields for [`PhononEvaluator::new`].
///
/// Deserializable with the same `kebab-case` wire convention the rest of the
/// lattice-dynamics toolkit's settings objects use.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct PhononOptions {
    /// Half-width (in supercells) of the periodic-image search box. See [`crate::images`].
    #[serde(default = "_phonon_options__image_search_radius")]
    pub image_search_radius: u32,

    /// Whether to divide the assembled matrix by `sqrt(m_i * m_j)`. Disable
    /// this if the force constants supplied to [`PhononEvaluator::new`] are
    /// already mass-weighted.
    #[serde(default = "_phonon_options__mass_weight")]
    pub mass_weight: bool,

    /// Whether to symmetrize `D <- (D + D^dagger)/2` before diagonalizing.
    /// See the "Hermitian enforcement" design note for why this defaults on.
    #[serde(default = "_phonon_options__enforce_hermitian")]
    pub enforce_hermitian: bool,
}

impl Default for PhononOptions {
    fn default() -> Self {
        PhononOptions {
            image_search_radius: _phonon_options__image_search_radius(),
            mass_weight: _phonon_options__mass_weight(),
            enforce_hermitian: _phonon_options__enforce_hermitian(),
        }
    }
}

/// Frequencies and eigenvectors for a batch of q-points.
///
/// `frequencies[q]` is sorted ascending and signed per the convention in
/// [`crate::solver`]; `eigenvectors[q]` is the unitary matrix whose columns
/// are the matching mode displacement vectors, ordered `3*atom + alpha`.
pub struct PhononResult {
    n_ions: usize,
    frequencies: Vec<Vec<f64>>,
    eigenvectors: Vec<DMatrix<Complex64>>,
}

impl PhononResult {
    pub fn n_qpoints(&self) -> usize { self.frequencies.len() }

    pub fn frequencies(&self, q: usize) -> &[f64] { &self.frequencies[q] }

    pub fn eigenvectors(&self, q: usize) -> &DMatrix<Complex64> { &self.eigenvectors[q] }

    /// The Cartesian displacement of `atom` in mode `mode` of q-point `q`.
    pub fn displacement(&self, q: usize, mode: usize, atom: usize) -> Vector3<Complex64> {
        let v = &self.eigenvectors[q];
        Vector3::new(v[(3 * atom, mode)], v[(3 * atom + 1, mode)], v[(3 * atom + 2, mode)])
    }

    pub fn n_ions(&self) -> usize { self.n_ions }
}

/// Orchestrator for phonon Fourier interpolation.
///
/// Constructed once from an immutable [`LatticeGeometry`] and
/// [`ForceConstants`]; the image table is built eagerly in [`PhononEvaluator::new`]
/// (see the "Lazy cache keyed by geometry" design note for why an eager,
/// once-built cache is equivalent here to the reference's on-demand one).
pub struct PhononEvaluator {
    geometry: LatticeGeometry,
    force_constants: ForceConstants,
    options: PhononOptions,
    images: ImageTable,
}

impl PhononEvaluator {
    pub fn new(
        geometry: LatticeGeometry,
        force_constants: ForceConstants,
        options: PhononOptions,
    ) -> Outcome<Self> {
        if force_constants.n_cells() != geometry.n_cells() {
            return Err(PhononError::geometry_invalid(format!(
                "force constants have {} cells but geometry has {}",
                force_constants.n_cells(), geometry.n_cells(),
            )));
        }
        if force_constants.n_ions() != geometry.n_ions() {
            return Err(PhononError::geometry_invalid(format!(
                "force constants describe {} ions but geometry has {}",
                force_constants.n_ions(), geometry.n_ions(),
            )));
        }

        let images = Self::build_images_with_retry(&geometry, options.image_search_radius)?;
        Ok(PhononEvaluator { geometry, force_constants, options, images })
    }

    fn build_images_with_retry(geometry: &LatticeGeometry, lim: u32) -> Outcome<ImageTable> {
        let cap = lim + IMAGE_SEARCH_RETRY_BUDGET;
        let mut current = lim;
        loop {
            match ImageEnumerator::build(geometry, current) {
                Ok(table) => return Ok(table),
                Err(err @ PhononError::ImageSearchUnderflow { .. }) => {
                    if current >= cap {
                        return Err(err);
                    }
                    log::warn!(
                        "image search underflow at lim={}; retrying with lim={}",
                        current, current + 1,
                    );
                    current += 1;
                }
                Err(other) => return Err(other),
            }
        }
    }

    pub fn geometry(&self) -> &LatticeGeometry { &self.geometry }

    pub fn image_table(&self) -> &ImageTable { &self.images }

    /// Computes frequencies and eigenvectors at every q-point in `qpoints`.
    ///
    /// Fails the entire call (returning no partial results) if diagonalization
    /// fails at any single q-point, per the error-handling policy in the spec.
    pub fn evaluate(&self, qpoints: &[Vector3<f64>]) -> Outcome<PhononResult> {
        log::debug!(
            "evaluating {} q-points (image table lim={})",
            qpoints.len(), self.images.lim(),
        );

        let results: Vec<Outcome<(Vec<f64>, DMatrix<Complex64>)>> = qpoints
            .par_iter()
            .enumerate()
            .map(|(qi, q)| {
                let phase = PhaseTable::build(q, &self.geometry, &self.images);
                let builder = DynamicalMatrixBuilder {
                    force_constants: &self.force_constants,
                    images: &self.images,
                    ion_mass: self.geometry.ion_mass(),
                    mass_weight: self.options.mass_weight,
                    enforce_hermitian: self.options.enforce_hermitian,
                };
                let d = builder.build(&phase);
                HermitianSolver::solve(&d, qi)
            })
            .collect();

        let mut frequencies = Vec::with_capacity(qpoints.len());
        let mut eigenvectors = Vec::with_capacity(qpoints.len());
        for result in results {
            let (freqs, evecs) = result?;
            frequencies.push(freqs);
            eigenvectors.push(evecs);
        }

        Ok(PhononResult { n_ions: self.geometry.n_ions(), frequencies, eigenvectors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Matrix3;

    fn monatomic_cubic(n: i32, k: f64) -> (LatticeGeometry, ForceConstants) {
        let cell = Matrix3::identity();
        let sc = Matrix3::new(n, 0, 0, 0, n, 0, 0, 0, n);
        let mut origins = Vec::new();
        for x in 0..n { for y in 0..n { for z in 0..n {
            origins.push(Vector3::new(x, y, z));
        }}}
        let n_cells = origins.len();
        let geom = LatticeGeometry::new(
            cell, sc, origins, vec![Vector3::zeros()], vec![1.0],
        ).unwrap();

        let mut data = vec![0.0; n_cells * 9];
        for a in 0..3 {
            data[a * 3 + a] = k;
        }
        let fc = ForceConstants::from_flat(n_cells, 1, data).unwrap();
        (geom, fc)
    }

    #[test]
    fn s1_gamma_point_eigenvalues_equal_k() {
        let (geom, fc) = monatomic_cubic(3, 4.0);
        let evaluator = PhononEvaluator::new(geom, fc, PhononOptions::default()).unwrap();
        let result = evaluator.evaluate(&[Vector3::zeros()]).unwrap();
        for &f in result.frequencies(0) {
            assert_abs_diff_eq!(f, 4.0f64.sqrt(), epsilon = 1e-10);
        }
    }

    #[test]
    fn options_defaults_match_spec() {
        let opts = PhononOptions::default();
        assert_eq!(opts.image_search_radius, 2);
        assert!(opts.mass_weight);
        assert!(opts.enforce_hermitian);
    }

    #[test]
    fn rejects_force_constants_with_wrong_cell_count() {
        let (geom, _) = monatomic_cubic(2, 1.0);
        let bad_fc = ForceConstants::from_flat(1, 1, vec![0.0; 9]).unwrap();
        let err = PhononEvaluator::new(geom, bad_fc, PhononOptions::default()).unwrap_err();
        assert!(format!("{}", err).contains("cells"));
    }

    #[test]
    fn options_deserialize_from_partial_kebab_case_json() {
        let opts: PhononOptions = serde_json::from_str(r#"{"mass-weight": false}"#).unwrap();
        assert_eq!(opts.mass_weight, false);
        // unspecified fields fall back to their defaults
        assert_eq!(opts.image_search_radius, DEFAULT_LIM);
        assert!(opts.enforce_hermitian);
    }
}
