use std::collections::HashSet;

use xcdiag_core::DiagnosticEntry;

/// Drop entries whose fingerprint was already seen, keeping log order.
///
/// Returns the surviving entries and the number collapsed.
#[must_use]
pub fn dedup(entries: Vec<DiagnosticEntry>) -> (Vec<DiagnosticEntry>, usize) {
    let total = entries.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<_> = entries
        .into_iter()
        .filter(|entry| seen.insert(entry.fingerprint.clone()))
        .collect();
    let collapsed = total - unique.len();
    (unique, collapsed)
}
