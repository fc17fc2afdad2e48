//! Repair of malformed table markup before parsing
//!
//! Extraction models occasionally emit a bare `<table>` immediately followed
//! by the real, attributed opening tag, and forget closing tags. Both are
//! fixed here so the parser can rely on balanced `<table>` elements.

use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

lazy_static! {
    /// A bare `<table>` followed (whitespace only) by an attributed `<table ...>`
    static ref DOUBLED_OPEN: Regex = Regex::new(r"(?i)<table\s*>\s*(<table\s+[^>]*>)").unwrap();

    static ref TABLE_OPEN: Regex = Regex::new(r"(?i)<table(?:\s[^>]*)?>").unwrap();

    static ref TABLE_CLOSE: Regex = Regex::new(r"(?i)</table\s*>").unwrap();
}

/// Summary of what [`repair_table_html`] changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Doubled opening tags collapsed into one
    pub collapsed_openings: usize,
    /// Closing tags appended to balance the markup
    pub appended_closings: usize,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        self.collapsed_openings == 0 && self.appended_closings == 0
    }
}

/// Repair gross malformation in a table fragment
pub fn repair_table_html(html: &str) -> (Cow<'_, str>, RepairReport) {
    let mut report = RepairReport {
        collapsed_openings: DOUBLED_OPEN.find_iter(html).count(),
        ..Default::default()
    };

    let mut repaired = DOUBLED_OPEN.replace_all(html, "$1");

    let opens = TABLE_OPEN.find_iter(&repaired).count();
    let closes = TABLE_CLOSE.find_iter(&repaired).count();
    if opens > closes {
        report.appended_closings = opens - closes;
        let owned = repaired.to_mut();
        for _ in closes..opens {
            owned.push_str("</table>");
        }
    }

    if !report.is_clean() {
        tracing::warn!(
            collapsed = report.collapsed_openings,
            appended = report.appended_closings,
            "repaired malformed table markup"
        );
    }

    (repaired, report)
}
