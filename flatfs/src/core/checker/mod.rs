// SPDX-License-Identifier: MIT

mod types;

pub use types::{
    Finding, ReportDisplay, ReportDisplayOpts, Severity, VerifierOptionsLike,
    VerifyPhases, VerifyReport,
};

pub use crate::core::errors::{FsCheckerError, FsCheckerResult};

/// Trait for verifying the integrity of a filesystem.
///
/// Checks are read-only. Structural problems become findings in the
/// report; only device failures abort a check with an error.
///
/// Phases run in order: superblock, table, hierarchy, allocation. Later
/// phases may rely on state gathered by earlier ones and should skip
/// themselves when it is missing.
pub trait FsChecker {
    type Options: VerifierOptionsLike + Default;

    fn check_with(&mut self, opt: &Self::Options) -> FsCheckerResult<VerifyReport> {
        let mut rep = VerifyReport::default();
        let phases: [(VerifyPhases, CheckFn<Self>); 4] = [
            (VerifyPhases::SUPERBLOCK, Self::check_superblock),
            (VerifyPhases::TABLE, Self::check_table),
            (VerifyPhases::HIERARCHY, Self::check_hierarchy),
            (VerifyPhases::ALLOCATION, Self::check_allocation),
        ];
        for (phase, f) in phases {
            if !self.run_phase(opt, &mut rep, phase, f)? {
                break;
            }
        }
        Ok(rep)
    }

    fn check_all(&mut self) -> FsCheckerResult<VerifyReport> {
        self.check_with(&Self::Options::default())
    }

    fn check_superblock(
        &mut self,
        _opt: &Self::Options,
        _rep: &mut VerifyReport,
    ) -> FsCheckerResult<()> {
        Ok(())
    }
    fn check_table(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsCheckerResult<()> {
        Ok(())
    }
    fn check_hierarchy(
        &mut self,
        _opt: &Self::Options,
        _rep: &mut VerifyReport,
    ) -> FsCheckerResult<()> {
        Ok(())
    }
    fn check_allocation(
        &mut self,
        _opt: &Self::Options,
        _rep: &mut VerifyReport,
    ) -> FsCheckerResult<()> {
        Ok(())
    }

    /// Runs `f` if `phase` is enabled. Returns `false` when the check
    /// should stop (fail-fast with an error already reported).
    fn run_phase<F>(
        &mut self,
        opt: &Self::Options,
        rep: &mut VerifyReport,
        phase: VerifyPhases,
        f: F,
    ) -> FsCheckerResult<bool>
    where
        F: Fn(&mut Self, &Self::Options, &mut VerifyReport) -> FsCheckerResult<()>,
    {
        if opt.phases().contains(phase) {
            f(self, opt, rep)?;
            if opt.fail_fast() && rep.has_error() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

type CheckFn<C> = fn(
    &mut C,
    &<C as FsChecker>::Options,
    &mut VerifyReport,
) -> FsCheckerResult<()>;
