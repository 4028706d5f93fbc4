// SPDX-License-Identifier: MIT

pub mod types;

pub use crate::core::errors::{FsCheckerError, FsCheckerResult};
pub use types::*;

/// Verifies the internal consistency of a volume.
///
/// Checks never stop at the first problem: every finding goes into the
/// returned report. `Err` is reserved for failures that prevent checking at
/// all, such as device errors.
pub trait FsChecker {
    /// Runs the selected phases.
    fn check(&mut self, phases: VerifyPhases) -> FsCheckerResult<VerifyReport>;

    /// Runs every phase.
    fn check_all(&mut self) -> FsCheckerResult<VerifyReport> {
        self.check(VerifyPhases::ALL)
    }
}
