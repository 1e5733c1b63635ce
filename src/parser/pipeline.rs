use std::io::Read;
use std::time::Instant;

use crate::error::AppError;
use crate::parser::types::{ParseWarning, RawRow};

const BOM: char = '\u{FEFF}';

/// Output of `parse_csv_reader`: the rows of one export plus import metadata.
#[derive(Debug)]
pub struct ParseOutput {
    pub rows: Vec<RawRow>,
    pub warnings: Vec<ParseWarning>,
    pub total_rows_processed: usize,
    pub skipped_rows: usize,
    pub detected_columns: Vec<String>,
    pub delimiter: u8,
    pub parse_duration_ms: u64,
}

/// Pick the delimiter from the header line: tab for TSV exports, `;` for
/// sheets saved with a comma decimal locale, `,` otherwise.
pub fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if header.contains('\t') {
        b'\t'
    } else if header.contains(';') && !header.contains(',') {
        b';'
    } else {
        b','
    }
}

/// Parse an in-memory export. `delimiter = None` auto-detects it.
pub fn parse_csv_text(text: &str, delimiter: Option<u8>) -> Result<ParseOutput, AppError> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(text));
    parse_csv_reader(text.as_bytes(), delimiter)
}

/// Parse an export from any `Read` source with a known delimiter.
///
/// Headers are trimmed; blank lines are skipped; a short line simply lacks
/// the trailing columns and extra cells are ignored. Records the CSV reader
/// rejects are skipped with a warning.
pub fn parse_csv_reader<R: Read>(reader: R, delimiter: u8) -> Result<ParseOutput, AppError> {
    let start = Instant::now();

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .double_quote(true)
        .quoting(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches(BOM).to_string())
        .collect();

    let mut rows: Vec<RawRow> = Vec::new();
    let mut warnings: Vec<ParseWarning> = Vec::new();
    let mut skipped = 0usize;
    let mut row_idx = 0usize;

    for result in rdr.records() {
        row_idx += 1;
        match result {
            Ok(record) => {
                if record.iter().all(|cell| cell.trim().is_empty()) {
                    // Lines like ",,,," left behind by deleted spreadsheet rows
                    skipped += 1;
                    continue;
                }
                let row: RawRow = headers
                    .iter()
                    .zip(record.iter())
                    .filter(|(h, _)| !h.is_empty())
                    .map(|(h, cell)| (h.clone(), cell.to_string()))
                    .collect();
                rows.push(row);
            }
            Err(err) => {
                warnings.push(ParseWarning {
                    line: row_idx + 1, // +1 for the header row
                    message: err.to_string(),
                });
                skipped += 1;
            }
        }
    }

    let headers = headers.into_iter().filter(|h| !h.is_empty()).collect();

    Ok(ParseOutput {
        rows,
        warnings,
        total_rows_processed: row_idx,
        skipped_rows: skipped,
        detected_columns: headers,
        delimiter,
        parse_duration_ms: start.elapsed().as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HDR: &str = "Unidade,Directs,Respostas,Agendamentos,Comparecimentos,Vendas";

    fn parse(csv: &str) -> ParseOutput {
        parse_csv_text(csv, None).unwrap()
    }

    #[test]
    fn test_basic_rows() {
        let out = parse(&format!("{HDR}\nLoja A,10,5,2,1,1\nLoja B,20,4,3,2,0"));
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0].get("Unidade"), Some("Loja A"));
        assert_eq!(out.rows[1].get("Directs"), Some("20"));
        assert_eq!(out.detected_columns.len(), 6);
        assert_eq!(out.delimiter, b',');
    }

    #[test]
    fn test_quoted_decimal_comma() {
        let out = parse(&format!("{HDR}\nLoja A,\"1,5\",5,0,0,0"));
        assert_eq!(out.rows[0].get("Directs"), Some("1,5"));
    }

    #[test]
    fn test_tsv_detected() {
        let out = parse("Unidade\tDirects\nLoja A\t7\n");
        assert_eq!(out.delimiter, b'\t');
        assert_eq!(out.rows[0].get("Directs"), Some("7"));
    }

    #[test]
    fn test_semicolon_detected() {
        let out = parse("Unidade;Directs\nLoja A;7,5\n");
        assert_eq!(out.delimiter, b';');
        assert_eq!(out.rows[0].get("Directs"), Some("7,5"));
    }

    #[test]
    fn test_explicit_delimiter_wins() {
        let out = parse_csv_text("a;b\n1;2", Some(b',')).unwrap();
        assert_eq!(out.detected_columns, vec!["a;b".to_string()]);
    }

    #[test]
    fn test_bom_stripped() {
        let out = parse(&format!("\u{FEFF}{HDR}\nLoja A,1,1,1,1,1"));
        assert_eq!(out.rows[0].get("Unidade"), Some("Loja A"));
    }

    #[test]
    fn test_headers_trimmed_cells_kept() {
        let out = parse(" Unidade , Directs \n Loja A ,3");
        assert_eq!(out.rows[0].get("Unidade"), Some(" Loja A "));
        assert_eq!(out.rows[0].get("Directs"), Some("3"));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let out = parse(&format!("{HDR}\n\nLoja A,1,1,1,1,1\n\n,,,,,\nLoja B,2,2,2,2,2\n"));
        assert_eq!(out.rows.len(), 2);
    }

    #[test]
    fn test_short_line_lacks_trailing_columns() {
        let out = parse(&format!("{HDR}\nLoja A,10"));
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].get("Directs"), Some("10"));
        assert_eq!(out.rows[0].get("Vendas"), None);
    }

    #[test]
    fn test_extra_cells_ignored() {
        let out = parse("Unidade,Directs\nLoja A,10,99,100");
        assert_eq!(out.rows[0].len(), 2);
    }

    #[test]
    fn test_header_only_yields_no_rows() {
        let out = parse(HDR);
        assert!(out.rows.is_empty());
        assert_eq!(out.detected_columns.len(), 6);
    }

    #[test]
    fn test_empty_body_yields_no_rows() {
        let out = parse("");
        assert!(out.rows.is_empty());
        assert!(out.detected_columns.is_empty());
    }

    #[test]
    fn test_invalid_utf8_record_skipped_with_warning() {
        let mut bytes = b"Unidade,Directs\nLoja A,1\n".to_vec();
        bytes.extend_from_slice(b"Loja \xFF,2\nLoja C,3\n");
        let out = parse_csv_reader(bytes.as_slice(), b',').unwrap();
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.skipped_rows, 1);
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].line, 3);
    }
}
