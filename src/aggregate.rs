//! Dashboard statistics over the `overall` sheet.
//!
//! Every offset used here is resolved by field name from the shared `overall`
//! column schema, the same one the normalizer writes with.

use crate::normalizer::Row;
use crate::schema::{FeedbackCategory, schema_for};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref YEAR_TOKEN_REGEX: Regex = Regex::new(r"20\d\d").unwrap();
    static ref ISO_TIME_REGEX: Regex = Regex::new(r"\dT\d").unwrap();
    static ref DASHBOARD_COLUMNS: DashboardColumns = DashboardColumns::resolve();
}

/// Rating metrics shown on the dashboard: label and `overall` field
pub const DASHBOARD_METRICS: [(&str, &str); 5] = [
    ("Inauguration", "inauguration_rating"),
    ("Transport", "transport_rating"),
    ("Scientific", "scientific_rating"),
    ("Catering", "catering_rating"),
    ("Cultural", "cultural_rating"),
];

/// Column grouped for the participation distribution
pub const PARTICIPATION_FIELD: &str = "participation_level";
/// Primary and fallback free-text columns of a recent comment
pub const COMMENT_FIELDS: [&str; 2] = ["comments", "suggestions"];
pub const NAME_FIELD: &str = "full_name";

/// Number of recent comments in a snapshot
pub const RECENT_LIMIT: usize = 5;

pub const UNKNOWN_LABEL: &str = "Unknown";
pub const NO_COMMENT: &str = "No comment";
pub const ANONYMOUS: &str = "Anonymous";
pub const DEFAULT_ROLE: &str = "Participant";

/// Whether the first stored row is a human-written header
///
/// Decided once when the store is set up, never guessed per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderRow {
    #[default]
    Absent,
    Present,
}

/// `{name, value}` pair of the averages list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricAverage {
    pub name: String,
    pub value: f64,
}

/// `{name, value}` pair of the participation distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub value: usize,
}

/// One entry of the recent-comments list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentFeedback {
    pub name: String,
    pub role: String,
    pub comment: String,
}

/// Summary recomputed from the current rows on every dashboard request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSnapshot {
    pub total_feedback: usize,
    pub average_ratings: Vec<MetricAverage>,
    pub participation_config: Vec<CategoryCount>,
    pub recent_feedback: Vec<RecentFeedback>,
}

/// `overall` column offsets of every field the dashboard reads
///
/// Resolved once by name. A dashboard field missing from the schema is a
/// programming error and panics on first use instead of reading as blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardColumns {
    pub metrics: Vec<(&'static str, usize)>,
    pub participation: usize,
    pub comments: Vec<usize>,
    pub name: usize,
}

impl DashboardColumns {
    fn resolve() -> Self {
        let schema = schema_for(FeedbackCategory::Overall);
        let column = |field: &str| {
            schema.index_of(field).unwrap_or_else(|| {
                panic!("dashboard field '{field}' is missing from the overall schema")
            })
        };
        DashboardColumns {
            metrics: DASHBOARD_METRICS
                .into_iter()
                .map(|(label, field)| (label, column(field)))
                .collect(),
            participation: column(PARTICIPATION_FIELD),
            comments: COMMENT_FIELDS.into_iter().map(column).collect(),
            name: column(NAME_FIELD),
        }
    }
}

/// Offsets the dashboard reads, resolved against the `overall` schema
pub fn dashboard_columns() -> &'static DashboardColumns {
    &DASHBOARD_COLUMNS
}

/// Whether a cell superficially looks like a stored ISO timestamp
///
/// A `T` only counts between two digits, so a `Timestamp` header does not match.
pub fn looks_like_timestamp(cell: &str) -> bool {
    ISO_TIME_REGEX.is_match(cell) || YEAR_TOKEN_REGEX.is_match(cell)
}

/// Summarize rows that contain no header row
pub fn summarize(rows: &[Row]) -> AggregateSnapshot {
    summarize_with(rows, HeaderRow::Absent)
}

/// Summarize the `overall` sheet
///
/// # Arguments
/// * `rows` - Every row fetched for the `overall` category, in append order
/// * `header` - Whether row 0 is a header to skip
///
/// # Returns
/// * `AggregateSnapshot` - The zero snapshot when no data rows remain
pub fn summarize_with(rows: &[Row], header: HeaderRow) -> AggregateSnapshot {
    if let Some(first) = rows.first() {
        let first_cell = first.first().map(String::as_str).unwrap_or_default();
        match (header, looks_like_timestamp(first_cell)) {
            (HeaderRow::Absent, false) => {
                log::warn!("First overall row does not start with a timestamp; is there an unflagged header row?")
            }
            (HeaderRow::Present, true) => {
                log::warn!("Skipping first overall row as a header although it starts with a timestamp")
            }
            _ => {}
        }
    }

    let data = match header {
        HeaderRow::Present => rows.get(1..).unwrap_or_default(),
        HeaderRow::Absent => rows,
    };
    if data.is_empty() {
        return AggregateSnapshot::default();
    }

    let columns = dashboard_columns();

    let average_ratings = columns
        .metrics
        .iter()
        .map(|&(label, index)| MetricAverage {
            name: label.to_string(),
            value: positive_average(data, index),
        })
        .collect();

    let participation_config = distribution(data, columns.participation);

    let recent_feedback = data
        .iter()
        .rev()
        .take(RECENT_LIMIT)
        .map(|row| {
            let comment = columns
                .comments
                .iter()
                .find_map(|&index| non_blank(row, index))
                .unwrap_or(NO_COMMENT);
            RecentFeedback {
                name: non_blank(row, columns.name).unwrap_or(ANONYMOUS).to_string(),
                role: non_blank(row, columns.participation)
                    .unwrap_or(DEFAULT_ROLE)
                    .to_string(),
                comment: comment.to_string(),
            }
        })
        .collect();

    AggregateSnapshot {
        total_feedback: data.len(),
        average_ratings,
        participation_config,
        recent_feedback,
    }
}

fn non_blank(row: &Row, index: usize) -> Option<&str> {
    row.get(index)
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
}

/// Mean of the positive numeric cells in a column, rounded to one decimal place
///
/// Cells that do not parse, or parse to zero or less, are left out entirely.
fn positive_average(rows: &[Row], index: usize) -> f64 {
    let (sum, count) = rows
        .iter()
        .filter_map(|row| row.get(index))
        .filter_map(|cell| cell.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value > 0.0)
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        return 0.0;
    }
    (sum / count as f64 * 10.0).round() / 10.0
}

/// Count rows per exact cell value, in first-seen order
///
/// Blank or whitespace-only cells count as `Unknown`; every other cell is its
/// own label, untrimmed.
fn distribution(rows: &[Row], index: usize) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for row in rows {
        let label = match row.get(index) {
            Some(cell) if !cell.trim().is_empty() => cell.as_str(),
            _ => UNKNOWN_LABEL,
        };
        match counts.iter_mut().find(|entry| entry.name == label) {
            Some(entry) => entry.value += 1,
            None => counts.push(CategoryCount {
                name: label.to_string(),
                value: 1,
            }),
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> usize {
        schema_for(FeedbackCategory::Overall).index_of(name).unwrap()
    }

    fn overall_row(cells: &[(&str, &str)]) -> Row {
        let mut row = vec![String::new(); schema_for(FeedbackCategory::Overall).len()];
        row[0] = "2025-01-18T09:30:00.000Z".to_string();
        for (name, value) in cells {
            row[col(name)] = value.to_string();
        }
        row
    }

    fn metric(snapshot: &AggregateSnapshot, name: &str) -> f64 {
        snapshot
            .average_ratings
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.value)
            .unwrap()
    }

    #[test]
    fn empty_rows_give_the_zero_snapshot() {
        let snapshot = summarize(&[]);
        assert_eq!(snapshot.total_feedback, 0);
        assert!(snapshot.average_ratings.is_empty());
        assert!(snapshot.participation_config.is_empty());
        assert!(snapshot.recent_feedback.is_empty());
    }

    #[test]
    fn averages_skip_malformed_and_non_positive_cells() {
        let rows: Vec<Row> = ["4", "5", "-1", "abc", ""]
            .iter()
            .map(|v| overall_row(&[("transport_rating", *v)]))
            .collect();
        let snapshot = summarize(&rows);
        assert_eq!(metric(&snapshot, "Transport"), 4.5);
        assert_eq!(metric(&snapshot, "Cultural"), 0.0);
        assert_eq!(snapshot.total_feedback, 5);
    }

    #[test]
    fn averages_round_to_one_decimal() {
        let rows: Vec<Row> = ["4", "4", "5"]
            .iter()
            .map(|v| overall_row(&[("catering_rating", *v)]))
            .collect();
        assert_eq!(metric(&summarize(&rows), "Catering"), 4.3);
    }

    #[test]
    fn metric_order_is_fixed() {
        let snapshot = summarize(&[overall_row(&[])]);
        let names: Vec<&str> = snapshot.average_ratings.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Inauguration", "Transport", "Scientific", "Catering", "Cultural"]);
    }

    #[test]
    fn participation_counts_in_first_seen_order() {
        let rows: Vec<Row> = ["Delegate", "Delegate", "", "Volunteer"]
            .iter()
            .map(|v| overall_row(&[(PARTICIPATION_FIELD, *v)]))
            .collect();
        let counts: Vec<(String, usize)> = summarize(&rows)
            .participation_config
            .into_iter()
            .map(|c| (c.name, c.value))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("Delegate".to_string(), 2),
                ("Unknown".to_string(), 1),
                ("Volunteer".to_string(), 1),
            ]
        );
    }

    #[test]
    fn recent_feedback_is_newest_first_with_fallbacks() {
        let mut rows: Vec<Row> = (1..=6)
            .map(|i| {
                let name = format!("Person {i}");
                let comment = format!("Comment {i}");
                overall_row(&[
                    (NAME_FIELD, name.as_str()),
                    (PARTICIPATION_FIELD, "Delegate"),
                    ("comments", comment.as_str()),
                ])
            })
            .collect();
        rows.push(overall_row(&[("suggestions", "More coffee")]));

        let recent = summarize(&rows).recent_feedback;
        assert_eq!(recent.len(), 5);
        assert_eq!(
            recent[0],
            RecentFeedback {
                name: ANONYMOUS.to_string(),
                role: DEFAULT_ROLE.to_string(),
                comment: "More coffee".to_string(),
            }
        );
        let names: Vec<&str> = recent[1..].iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Person 6", "Person 5", "Person 4", "Person 3"]);

        let blank = summarize(&[overall_row(&[])]).recent_feedback;
        assert_eq!(blank[0].comment, NO_COMMENT);
    }

    #[test]
    fn header_row_is_skipped_only_when_flagged() {
        let header: Row = schema_for(FeedbackCategory::Overall)
            .fields
            .iter()
            .map(|f| f.name.to_string())
            .collect();
        let rows = vec![header, overall_row(&[(PARTICIPATION_FIELD, "Organiser")])];

        let skipped = summarize_with(&rows, HeaderRow::Present);
        assert_eq!(skipped.total_feedback, 1);
        assert_eq!(skipped.participation_config.len(), 1);

        let kept = summarize_with(&rows, HeaderRow::Absent);
        assert_eq!(kept.total_feedback, 2);

        let only_header = summarize_with(&rows[..1], HeaderRow::Present);
        assert_eq!(only_header, AggregateSnapshot::default());
    }

    #[test]
    fn short_rows_read_as_blank() {
        let rows = vec![vec!["2025-01-18T09:30:00.000Z".to_string()]];
        let snapshot = summarize(&rows);
        assert_eq!(snapshot.participation_config[0].name, UNKNOWN_LABEL);
        assert_eq!(snapshot.recent_feedback[0].name, ANONYMOUS);
    }

    #[test]
    fn timestamp_heuristic() {
        assert!(looks_like_timestamp("2025-01-18T09:30:00.000Z"));
        assert!(looks_like_timestamp("18/01/2025 09:30"));
        assert!(!looks_like_timestamp("timestamp"));
        assert!(!looks_like_timestamp("Timestamp"));
        assert!(!looks_like_timestamp("TIMESTAMP"));
    }

    #[test]
    fn participation_groups_by_the_untrimmed_value() {
        let rows: Vec<Row> = ["Delegate", " Delegate", "   ", "Delegate"]
            .iter()
            .map(|v| overall_row(&[(PARTICIPATION_FIELD, *v)]))
            .collect();
        let counts: Vec<(String, usize)> = summarize(&rows)
            .participation_config
            .into_iter()
            .map(|c| (c.name, c.value))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("Delegate".to_string(), 2),
                (" Delegate".to_string(), 1),
                ("Unknown".to_string(), 1),
            ]
        );
    }

    #[test]
    fn dashboard_columns_follow_the_overall_schema() {
        let columns = dashboard_columns();
        let labels: Vec<&str> = columns.metrics.iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, vec!["Inauguration", "Transport", "Scientific", "Catering", "Cultural"]);
        assert_eq!(columns.metrics[2].1, col("scientific_rating"));
        assert_eq!(columns.participation, col(PARTICIPATION_FIELD));
        assert_eq!(columns.comments, vec![col("comments"), col("suggestions")]);
        assert_eq!(columns.name, col(NAME_FIELD));
    }

    #[test]
    fn snapshot_serializes_with_dashboard_keys() {
        let json = serde_json::to_value(summarize(&[overall_row(&[])])).unwrap();
        for key in ["totalFeedback", "averageRatings", "participationConfig", "recentFeedback"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
