// SPDX-License-Identifier: MIT

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    fn tag(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERR ",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    pub sev: Severity,
    pub code: &'static str,
    pub msg: String,
}

impl Finding {
    pub fn new(sev: Severity, code: &'static str, msg: impl Into<String>) -> Self {
        Self { sev, code, msg: msg.into() }
    }

    #[inline]
    pub fn info(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, msg)
    }

    #[inline]
    pub fn warn(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(Severity::Warn, code, msg)
    }

    #[inline]
    pub fn err(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, msg)
    }
}

#[derive(Clone, Debug, Default)]
pub struct VerifyReport {
    pub findings: Vec<Finding>,
}

impl VerifyReport {
    pub fn push(&mut self, f: Finding) {
        self.findings.push(f)
    }

    pub fn has_error(&self) -> bool {
        self.findings.iter().any(|f| f.sev == Severity::Error)
    }

    pub fn ok(&self) -> bool {
        !self.has_error()
    }

    pub fn first_error(&self) -> Option<&Finding> {
        self.findings.iter().find(|f| f.sev == Severity::Error)
    }

    pub fn count(&self, s: Severity) -> usize {
        self.findings.iter().filter(|f| f.sev == s).count()
    }

    /// Findings carrying `code`.
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Finding> + 'a {
        self.findings.iter().filter(move |f| f.code == code)
    }

    pub fn display_with(&self, opts: ReportDisplayOpts) -> ReportDisplay<'_> {
        ReportDisplay { rep: self, opts }
    }

    /// Warnings and errors only, with a summary line.
    pub fn problems(&self) -> ReportDisplay<'_> {
        self.display_with(ReportDisplayOpts {
            min_level: Severity::Warn,
            show_summary: true,
            ..ReportDisplayOpts::default()
        })
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
            pad_code: 12,
        }
    }
}

pub struct ReportDisplay<'a> {
    rep: &'a VerifyReport,
    opts: ReportDisplayOpts,
}

impl fmt::Display for ReportDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for it in self.rep.findings.iter().filter(|it| it.sev >= self.opts.min_level) {
            writeln!(
                f,
                "{}{}: {:<width$} {}",
                self.opts.prefix,
                it.sev.tag(),
                it.code,
                it.msg,
                width = self.opts.pad_code
            )?;
        }

        if self.opts.show_summary {
            writeln!(
                f,
                "{}{} error(s), {} warning(s), {} note(s)",
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
        self.display_with(ReportDisplayOpts::default()).fmt(f)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct VerifyPhases: u32 {
        /// Superblock signature and geometry.
        const BOOT     = 1 << 0;
        /// Per-file chain shape and length.
        const CHAIN    = 1 << 1;
        /// Shared blocks, leaks, reserved entry.
        const CROSSREF = 1 << 2;
        /// Directory names.
        const ROOT     = 1 << 3;
        const ALL      = Self::BOOT.bits() | Self::CHAIN.bits() | Self::CROSSREF.bits() | Self::ROOT.bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn test_report_counts_and_display() {
        let mut rep = VerifyReport::default();
        rep.push(Finding::info("BOOT", "signature ok"));
        rep.push(Finding::warn("LEAK", "block 3 unreachable"));
        assert!(rep.ok());

        rep.push(Finding::err("CHAIN_LEN", "file a: 2 blocks, expected 1"));
        assert!(rep.has_error());
        assert_eq!(rep.count(Severity::Warn), 1);
        assert_eq!(rep.first_error().map(|f| f.code), Some("CHAIN_LEN"));
        assert_eq!(rep.with_code("LEAK").count(), 1);

        let text = rep.problems().to_string();
        assert!(!text.contains("signature ok"));
        assert!(text.contains("WARN: LEAK"));
        assert!(text.contains("1 error(s), 1 warning(s), 1 note(s)"));
    }
}
