//! Timestamp-keyed line merge
//!
//! Reconciles two copies of a record file. Lines are keyed by the numeric
//! prefix before the first comma; the output preserves the insertion order
//! of the first occurrence of each key and keeps the last-seen value per
//! key. Remote lines are inserted first, so local lines passed second
//! overwrite remote lines sharing a key.

use std::collections::HashMap;

use super::record::Record;

/// Merge two record file bodies.
///
/// Blank lines and lines with a missing or non-numeric timestamp prefix
/// are dropped. Merging a file with itself is a no-op.
pub fn merge_lines(remote: &str, local: &str) -> String {
    let mut order: Vec<u64> = Vec::new();
    let mut merged: HashMap<u64, String> = HashMap::new();

    for line in remote.lines().chain(local.lines()) {
        let Some(record) = Record::parse(line) else {
            continue;
        };
        if merged.insert(record.timestamp, record.to_line()).is_none() {
            order.push(record.timestamp);
        }
    }

    order
        .iter()
        .map(|ts| merged[ts].as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove the line keyed by `timestamp` from a record file body.
pub fn remove_entry(text: &str, timestamp: u64) -> String {
    let prefix = format!("{timestamp},");
    text.lines()
        .filter(|line| !line.starts_with(&prefix))
        .collect::<Vec<_>>()
        .join("\n")
}
