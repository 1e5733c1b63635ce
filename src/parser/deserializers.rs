/// Coerce a spreadsheet cell into a number, degrading to 0 instead of failing.
///
/// Keeps ASCII digits, `-`, `,` and `.`, turns the first comma into a decimal
/// point and parses what is left. Empty cells, leftovers that are not a number
/// ("1.234.5", "--5", "-") and non-finite results all give 0.
///
/// Thousands separators are not understood: "1.234,56" becomes "1.234.56",
/// which does not parse, so the cell counts as 0.
pub fn coerce_number(raw: &str) -> f64 {
    if raw.is_empty() {
        return 0.0;
    }
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '-' | ',' | '.'))
        .collect();
    let normalized = kept.replacen(',', ".", 1);
    match normalized.parse::<f64>() {
        // `+ 0.0` folds -0.0 into 0.0
        Ok(n) if n.is_finite() => n + 0.0,
        _ => 0.0,
    }
}
