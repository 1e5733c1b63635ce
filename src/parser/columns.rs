use crate::parser::types::RawRow;

/// Returned when no candidate spelling matches. Callers treat it as "no value":
/// an empty unit label or a zero metric.
pub const MISSING: &str = "";

/// Resolve a logical field against a row whose headers vary in case.
///
/// Each candidate is tried verbatim, then lowercased, then uppercased, before
/// moving to the next candidate. The first key present wins, even when its
/// cell is empty. Never fails: absence yields `MISSING`.
pub fn resolve_field<'a, S: AsRef<str>>(row: &'a RawRow, candidates: &[S]) -> &'a str {
    for candidate in candidates {
        let candidate = candidate.as_ref();
        if let Some(v) = row.get(candidate) {
            return v;
        }
        if let Some(v) = row.get(&candidate.to_lowercase()) {
            return v;
        }
        if let Some(v) = row.get(&candidate.to_uppercase()) {
            return v;
        }
    }
    MISSING
}
