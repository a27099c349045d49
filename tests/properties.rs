use chrono::{TimeZone, Utc};
use feedback::normalizer::{normalize_at, parse_row};
use feedback::record::SubmissionRecord;
use feedback::schema::{FeedbackCategory, FieldKind, schema_for};
use proptest::prelude::*;

fn category() -> impl Strategy<Value = FeedbackCategory> {
    prop::sample::select(FeedbackCategory::ALL.to_vec())
}

/// A record holding a random subset of the category's fields with non-blank text answers
fn record_for(category: FeedbackCategory) -> impl Strategy<Value = SubmissionRecord> {
    let names: Vec<&'static str> = schema_for(category)
        .fields
        .iter()
        .filter(|f| f.kind != FieldKind::Timestamp)
        .map(|f| f.name)
        .collect();
    prop::collection::vec((prop::sample::select(names), "[A-Za-z0-9@. ]{0,8}[A-Za-z0-9]"), 0..20)
        .prop_map(|pairs| pairs.into_iter().collect::<SubmissionRecord>())
}

proptest! {
    #[test]
    fn row_length_always_matches_the_schema(
        (category, record) in category().prop_flat_map(|c| (Just(c), record_for(c)))
    ) {
        let at = Utc.with_ymd_and_hms(2025, 1, 18, 9, 30, 0).unwrap();
        let row = normalize_at(category, &record, at);
        prop_assert_eq!(row.len(), schema_for(category).len());
    }

    #[test]
    fn parsing_a_row_recovers_every_submitted_field(
        (category, record) in category().prop_flat_map(|c| (Just(c), record_for(c)))
    ) {
        let at = Utc.with_ymd_and_hms(2025, 1, 18, 9, 30, 0).unwrap();
        let parsed = parse_row(category, &normalize_at(category, &record, at));

        for (name, value) in record.iter() {
            let cell = value.to_cell();
            prop_assert_eq!(parsed.get(name), cell.as_ref());
        }
        prop_assert_eq!(parsed.len(), record.iter().count() + 1);
    }
}
