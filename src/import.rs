use crate::error::StoreError;
use crate::normalizer::Row;
use std::path::Path;

/// Parse CSV text into rows
///
/// Handles quoted cells, doubled quotes and line breaks inside quotes. Blank lines are
/// skipped. No header handling happens here; callers decide whether row 0 is a header.
///
/// # Arguments
/// * `text` - CSV content, for example a sheet downloaded from the spreadsheet backend
///
/// # Returns
/// * `Result<Vec<Row>, StoreError>` - The rows, or `Malformed` on an unterminated quote
pub fn rows_from_csv(text: &str) -> Result<Vec<Row>, StoreError> {
    let mut rows = Vec::new();
    let mut row: Row = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    // Doubled quote inside a quoted field
                    current_field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => row.push(std::mem::take(&mut current_field)),
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => {
                line += 1;
                row.push(std::mem::take(&mut current_field));
                if row.iter().any(|cell| !cell.is_empty()) {
                    rows.push(std::mem::take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => {
                if c == '\n' {
                    line += 1;
                }
                current_field.push(c);
            }
        }
    }

    if in_quotes {
        return Err(StoreError::Malformed(format!("unterminated quote before line {line}")));
    }

    // Last line without a trailing newline
    row.push(current_field);
    if row.iter().any(|cell| !cell.is_empty()) {
        rows.push(row);
    }

    Ok(rows)
}

/// Read a CSV file into rows
pub fn read_csv(path: impl AsRef<Path>) -> Result<Vec<Row>, StoreError> {
    let text = std::fs::read_to_string(path)?;
    rows_from_csv(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::to_csv;
    use crate::schema::FeedbackCategory;

    #[test]
    fn parses_quotes_and_embedded_newlines() {
        let rows = rows_from_csv("a,\"b, c\",\"say \"\"hi\"\"\"\r\n\nx,\"line one\nline two\",\n").unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), "b, c".into(), "say \"hi\"".into()],
                vec!["x".to_string(), "line one\nline two".into(), String::new()],
            ]
        );
    }

    #[test]
    fn unterminated_quote_is_malformed() {
        let err = rows_from_csv("a,\"open\nb,c").unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }

    #[test]
    fn reads_back_an_export() {
        let mut row = vec![String::new(); 24];
        row[0] = "2025-01-18T09:30:00.000Z".into();
        row[22] = "Dal was great,\nrice was cold".into();
        let rows = rows_from_csv(&to_csv(FeedbackCategory::Catering, &[row.clone()])).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "timestamp");
        assert_eq!(rows[1], row);
    }
}
