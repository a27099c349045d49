use crate::record::{FieldValue, SubmissionRecord};
use crate::schema::{FeedbackCategory, TIMESTAMP_FIELD, schema_for};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

/// One stored sheet row: cell text in schema column order
pub type Row = Vec<String>;

/// Format a submission time the way it is written to column 0
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Convert a submission into a positional row stamped with the current time
///
/// # Arguments
/// * `category` - The form the record belongs to
/// * `record` - The validated submission
///
/// # Returns
/// * `Row` - A row exactly as long as the category's schema
pub fn normalize(category: FeedbackCategory, record: &SubmissionRecord) -> Row {
    normalize_at(category, record, Utc::now())
}

/// Convert a submission into a positional row with an explicit timestamp
///
/// Walks the schema in column order. Absent, null and unknown fields become empty
/// cells so that column positions never shift; multi-select answers are joined into
/// one cell. Column 0 always holds `at`, whatever the record says.
pub fn normalize_at(category: FeedbackCategory, record: &SubmissionRecord, at: DateTime<Utc>) -> Row {
    let schema = schema_for(category);

    for name in record.names() {
        if is_reserved(name) {
            log::debug!("Discarding client-supplied {TIMESTAMP_FIELD} on a {category} submission");
        } else if schema.index_of(name).is_none() {
            log::debug!("Ignoring field '{name}' not present in the {category} schema");
        }
    }

    let mut row = Vec::with_capacity(schema.len());
    row.push(format_timestamp(at));
    row.extend(schema.fields[1..].iter().map(|field| {
        record
            .get(field.name)
            .and_then(FieldValue::to_cell)
            .unwrap_or_default()
    }));

    debug_assert_eq!(row.len(), schema.len());
    row
}

/// Read a stored row back into named fields by column position
///
/// Empty cells are left out. Rows shorter than the schema (a spreadsheet backend may
/// drop trailing blanks) simply yield fewer fields; extra trailing cells are ignored.
///
/// # Arguments
/// * `category` - The category the row was read from
/// * `row` - The stored row
///
/// # Returns
/// * `BTreeMap<String, String>` - Field name to cell text, timestamp included
pub fn parse_row(category: FeedbackCategory, row: &[String]) -> BTreeMap<String, String> {
    schema_for(category)
        .columns()
        .filter_map(|(name, index)| {
            row.get(index)
                .filter(|cell| !cell.is_empty())
                .map(|cell| (name.to_string(), cell.clone()))
        })
        .collect()
}

/// Whether a record field would be overwritten by the server timestamp
pub fn is_reserved(name: &str) -> bool {
    name == TIMESTAMP_FIELD
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 18, 9, 30, 0).unwrap()
    }

    #[test]
    fn empty_record_fills_every_column() {
        for category in FeedbackCategory::ALL {
            let row = normalize_at(category, &SubmissionRecord::new(), at());
            assert_eq!(row.len(), schema_for(category).len());
            assert_eq!(row[0], "2025-01-18T09:30:00.000Z");
            assert!(row[1..].iter().all(String::is_empty));
        }
    }

    #[test]
    fn record_cannot_forge_the_timestamp() {
        let record = SubmissionRecord::new().with(TIMESTAMP_FIELD, "1999-01-01T00:00:00Z");
        let row = normalize_at(FeedbackCategory::Catering, &record, at());
        assert_eq!(row[0], "2025-01-18T09:30:00.000Z");
        assert!(is_reserved(TIMESTAMP_FIELD));
    }

    #[test]
    fn values_land_at_their_schema_positions() {
        let record = SubmissionRecord::new()
            .with("email", "p@example.org")
            .with("poster_id", "P-17")
            .with("comments", "Great visuals")
            .with("not_a_field", "ignored");
        let row = normalize_at(FeedbackCategory::Poster, &record, at());
        let schema = schema_for(FeedbackCategory::Poster);

        assert_eq!(row[schema.index_of("email").unwrap()], "p@example.org");
        assert_eq!(row[schema.index_of("poster_id").unwrap()], "P-17");
        assert_eq!(row[21], "Great visuals");
        assert!(!row.contains(&"ignored".to_string()));
    }

    #[test]
    fn multi_select_is_comma_joined() {
        let record = SubmissionRecord::new().with("zones_visited", vec!["Hall A", "Food Court"]);
        let row = normalize_at(FeedbackCategory::Exhibition, &record, at());
        assert_eq!(row[8], "Hall A, Food Court");
    }

    #[test]
    fn parse_row_recovers_present_fields() {
        let record = SubmissionRecord::new()
            .with("email", "o@example.org")
            .with("session_name", "Oral 2B")
            .with("qa_rating", "5");
        let row = normalize_at(FeedbackCategory::Oral, &record, at());
        let parsed = parse_row(FeedbackCategory::Oral, &row);

        for (name, value) in record.iter() {
            assert_eq!(parsed.get(name), value.to_cell().as_ref());
        }
        assert_eq!(parsed.len(), 4);
    }

    #[test]
    fn parse_row_tolerates_short_rows() {
        let row: Row = vec!["2025-01-18T09:30:00.000Z".into(), "s@example.org".into()];
        let parsed = parse_row(FeedbackCategory::Scientific, &row);
        assert_eq!(parsed.get("email").map(String::as_str), Some("s@example.org"));
        assert_eq!(parsed.len(), 2);
    }
}
