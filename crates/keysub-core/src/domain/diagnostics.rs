//! Human-readable probe diagnostics.
//!
//! The report is for troubleshooting only; no control logic reads it.

use std::fmt;

use super::candidates::CandidateKeySet;
use crate::keymap::vk_name;

/// A VK code found to produce the source character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeMatch {
    pub vk_code: u8,
    pub plain: Option<char>,
    pub shifted: Option<char>,
}

/// Outcome of one layout probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub source: char,
    /// VK codes translated during the scan.
    pub scanned_keys: usize,
    /// VK codes that produced any character.
    pub producing_keys: usize,
    pub matches: Vec<ProbeMatch>,
    pub used_fallback: bool,
    pub candidates: CandidateKeySet,
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Source character: {:?} (U+{:04X})",
            self.source, self.source as u32
        )?;
        writeln!(
            f,
            "Scanned {} keys, {} produce a character",
            self.scanned_keys, self.producing_keys
        )?;

        if self.matches.is_empty() {
            writeln!(f, "No key produces the source character on this layout.")?;
        }
        for m in &self.matches {
            writeln!(
                f,
                "  0x{:02X} {:<14} plain: {:<8} shift: {}",
                m.vk_code,
                vk_name(m.vk_code).unwrap_or("?"),
                describe(m.plain),
                describe(m.shifted),
            )?;
        }

        if self.used_fallback {
            writeln!(f, "Fallback active: verifying every OEM key live.")?;
        }
        let codes: Vec<String> = self
            .candidates
            .iter()
            .map(|vk| format!("0x{vk:02X}"))
            .collect();
        write!(f, "Candidate keys: {}", codes.join(", "))
    }
}

fn describe(c: Option<char>) -> String {
    c.map_or_else(|| "-".to_string(), |c| format!("{c:?}"))
}
