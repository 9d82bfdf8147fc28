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

//! Structured error taxonomy for the phonon interpolation core.
//!
//! Every fallible entry point returns `Outcome<T>`; callers that want to
//! match on the failure kind can do so against [`PhononError`] directly
//! rather than parsing a message string.

use failure::Fail;

/// Alias for the common `Result<T, PhononError>` used throughout this crate.
pub type Outcome<T> = Result<T, PhononError>;

#[derive(Debug, Fail)]
pub enum PhononError {
    #[fail(display = "invalid geometry: {}", detail)]
    GeometryInvalid {
        detail: String,
    },

    #[fail(
        display = "image search underflow for primitive atom {} vs supercell atom {} at lim={}",
        prim_atom, super_atom, lim,
    )]
    ImageSearchUnderflow {
        prim_atom: usize,
        super_atom: usize,
        lim: u32,
    },

    #[fail(display = "diagonalization failed at q-point {}: {}", qpoint_index, detail)]
    NumericalFailure {
        qpoint_index: usize,
        detail: String,
    },
}

impl PhononError {
    pub fn geometry_invalid(detail: impl Into<String>) -> Self {
        PhononError::GeometryInvalid { detail: detail.into() }
    }
}
