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

//! Fourier interpolation of phonon frequencies and polarization vectors from
//! short-range force constants on a finite supercell.
//!
//! This crate is the numerical core of a lattice-dynamics toolkit: given a
//! [`LatticeGeometry`], a [`ForceConstants`] tensor, and a list of q-points,
//! [`PhononEvaluator`] produces frequencies and eigenvectors by enumerating
//! Wigner-Seitz-equivalent supercell images ([`images`]), building the Bloch
//! phase factors for each q-point ([`phase`]), assembling the Hermitian
//! dynamical matrix ([`dynmat`]), and diagonalizing it ([`solver`]).
//!
//! Binary file I/O, unit conversion, CLI front-ends, and Brillouin-zone
//! grid/symmetry machinery live elsewhere; this crate only evaluates the
//! q-points it is handed.

mod dynmat;
mod error;
mod force_constants;
mod geometry;
mod images;
mod phase;
mod solver;
mod evaluator;

pub use crate::dynmat::DynamicalMatrixBuilder;
pub use crate::error::{Outcome, PhononError};
pub use crate::evaluator::{PhononEvaluator, PhononOptions, PhononResult};
pub use crate::force_constants::ForceConstants;
pub use crate::geometry::LatticeGeometry;
pub use crate::images::{ImageEnumerator, ImageTable, DEFAULT_LIM};
pub use crate::phase::PhaseTable;
pub use crate::solver::HermitianSolver;
