// SPDX-License-Identifier: MIT

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};
use core::cmp::Ordering;
use core::fmt;

use bitflags::bitflags;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        use Severity::*;
        fn rank(s: Severity) -> u8 {
            match s {
                Info => 0,
                Warn => 1,
                Error => 2,
            }
        }
        rank(*self).cmp(&rank(*other))
    }
}

#[derive(Clone, Debug)]
pub struct Finding {
    pub sev: Severity,
    pub code: &'static str,
    pub msg: String,
}
impl Finding {
    pub fn info(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Info,
            code,
            msg: msg.into(),
        }
    }
    pub fn warn(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Warn,
            code,
            msg: msg.into(),
        }
    }
    pub fn err(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Error,
            code,
            msg: msg.into(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct VerifyReport {
    pub findings: Vec<Finding>,
}

impl VerifyReport {
    pub fn has_error(&self) -> bool {
        self.findings
            .iter()
            .any(|f| matches!(f.sev, Severity::Error))
    }

    pub fn first_error(&self) -> Option<&str> {
        self.findings
            .iter()
            .find(|f| matches!(f.sev, Severity::Error))
            .map(|f| f.msg.as_str())
    }

    pub fn ok(&self) -> bool {
        !self.has_error()
    }

    pub fn push(&mut self, f: Finding) {
        self.findings.push(f)
    }

    pub fn count(&self, s: Severity) -> usize {
        self.findings.iter().filter(|f| f.sev == s).count()
    }

    /// `true` if any finding carries `code`.
    pub fn has_code(&self, code: &str) -> bool {
        self.findings.iter().any(|f| f.code == code)
    }

    /// Display with options (filtering, prefix, summary...)
    pub fn display_with(&self, opts: ReportDisplayOpts) -> ReportDisplay<'_> {
        ReportDisplay::new(self, opts)
    }
}

#[derive(Copy, Clone, Debug)]
pub struct ReportDisplayOpts {
    pub min_level: Severity,
    pub prefix: &'static str,
    pub show_summary: bool,
    pub pad_code: usize,
}

impl Default for ReportDisplayOpts {
    fn default() -> Self {
        Self {
            min_level: Severity::Info,
            prefix: "",
            show_summary: false,
            pad_code: 16,
        }
    }
}

pub struct ReportDisplay<'a> {
    rep: &'a VerifyReport,
    opts: ReportDisplayOpts,
}

impl<'a> ReportDisplay<'a> {
    pub fn new(rep: &'a VerifyReport, opts: ReportDisplayOpts) -> Self {
        Self { rep, opts }
    }
}

impl fmt::Display for ReportDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for it in &self.rep.findings {
            if it.sev < self.opts.min_level {
                continue;
            }
            let tag = match it.sev {
                Severity::Info => "INFO",
                Severity::Warn => "WARN",
                Severity::Error => "ERR ",
            };
            writeln!(
                f,
                "{}{tag}: {:<width$} {}",
                self.opts.prefix,
                it.code,
                it.msg,
                width = self.opts.pad_code
            )?;
        }

        if self.opts.show_summary {
            writeln!(
                f,
                "{}Summary: errors={}  warns={}  infos={}",
                self.opts.prefix,
                self.rep.count(Severity::Error),
                self.rep.count(Severity::Warn),
                self.rep.count(Severity::Info)
            )?;
        }

        Ok(())
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ReportDisplay::new(self, ReportDisplayOpts::default()).fmt(f)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct VerifyPhases: u32 {
        const SUPERBLOCK = 1 << 0;
        const TABLE      = 1 << 1;
        const HIERARCHY  = 1 << 2;
        const ALLOCATION = 1 << 3;
        const ALL        = u32::MAX;
    }
}

/// Generic options that the FS can encapsulate/extend.
pub trait VerifierOptionsLike {
    fn phases(&self) -> VerifyPhases {
        VerifyPhases::ALL
    }
    fn fail_fast(&self) -> bool {
        false
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn test_report_display() {
        let mut rep = VerifyReport::default();
        rep.push(Finding::info("SB_OK", "superblock valid"));
        rep.push(Finding::warn("ALLOC_LEAK", "block 3 marked used but unowned"));
        assert!(rep.ok());

        rep.push(Finding::err("ROOT_MISSING", "no root entry"));
        assert!(rep.has_error());
        assert_eq!(rep.first_error(), Some("no root entry"));
        assert!(rep.has_code("ALLOC_LEAK"));

        let text = rep
            .display_with(ReportDisplayOpts {
                min_level: Severity::Warn,
                show_summary: true,
                ..ReportDisplayOpts::default()
            })
            .to_string();
        assert!(!text.contains("SB_OK"));
        assert!(text.contains("WARN: ALLOC_LEAK"));
        assert!(text.contains("ERR : ROOT_MISSING"));
        assert!(text.contains("Summary: errors=1  warns=1  infos=1"));
    }
}
