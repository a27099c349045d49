use crate::error::FeedbackError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version of the column layouts below. Bump it whenever a field is moved, inserted or removed.
pub const SCHEMA_VERSION: u32 = 1;

/// Name of the reserved first column in every schema.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Feedback form a submission belongs to
///
/// Each category owns its own sheet in the row store and its own column schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackCategory {
    Overall,
    Scientific,
    Catering,
    Exhibition,
    Oral,
    Poster,
}

impl FeedbackCategory {
    pub const ALL: [FeedbackCategory; 6] = [
        FeedbackCategory::Overall,
        FeedbackCategory::Scientific,
        FeedbackCategory::Catering,
        FeedbackCategory::Exhibition,
        FeedbackCategory::Oral,
        FeedbackCategory::Poster,
    ];

    /// The lowercase tag used in URLs and file names
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackCategory::Overall => "overall",
            FeedbackCategory::Scientific => "scientific",
            FeedbackCategory::Catering => "catering",
            FeedbackCategory::Exhibition => "exhibition",
            FeedbackCategory::Oral => "oral",
            FeedbackCategory::Poster => "poster",
        }
    }

    /// The tab title used for this category in a spreadsheet backend
    pub fn sheet_title(&self) -> &'static str {
        match self {
            FeedbackCategory::Overall => "Overall",
            FeedbackCategory::Scientific => "Scientific",
            FeedbackCategory::Catering => "Catering",
            FeedbackCategory::Exhibition => "Exhibition",
            FeedbackCategory::Oral => "Oral",
            FeedbackCategory::Poster => "Poster",
        }
    }
}

impl fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackCategory {
    type Err = FeedbackError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        FeedbackCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(tag.trim()))
            .ok_or_else(|| FeedbackError::UnknownCategory(tag.to_string()))
    }
}

/// How a column's value is checked and flattened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Server-generated submission time, never taken from the record
    Timestamp,
    Text,
    Email,
    /// Mobile number, must carry exactly 10 digits
    Phone,
    /// Participation level, drawn from the form's vocabulary
    Choice,
    /// 1 to 5 rating
    Rating,
    /// Multi-select answer, comma-joined when written
    MultiSelect,
}

/// One named column of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> Field {
    Field { name, kind }
}

use FieldKind::{Choice, Email, MultiSelect, Phone, Rating, Text, Timestamp};

/// Respondent role declared on a form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipationLevel {
    Delegate,
    Volunteer,
    Evaluator,
    Presenter,
    Organiser,
    Exhibitor,
    Other,
}

impl ParticipationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipationLevel::Delegate => "Delegate",
            ParticipationLevel::Volunteer => "Volunteer",
            ParticipationLevel::Evaluator => "Evaluator",
            ParticipationLevel::Presenter => "Presenter",
            ParticipationLevel::Organiser => "Organiser",
            ParticipationLevel::Exhibitor => "Exhibitor",
            ParticipationLevel::Other => "Other",
        }
    }
}

/// Ordered column layout of one feedback category
///
/// Column `i` of a stored row holds `fields[i]`. Index 0 is always the timestamp.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ColumnSchema {
    pub category: FeedbackCategory,
    pub version: u32,
    pub fields: &'static [Field],
    /// Fields that must be present and non-blank
    pub required: &'static [&'static str],
    /// Accepted values for the `participation_level` column
    pub participation_levels: &'static [ParticipationLevel],
}

impl ColumnSchema {
    /// Number of columns in a row of this category
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column position of a named field
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Field definition of a named field
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// `(fieldName, columnIndex)` pairs in column order
    pub fn columns(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.fields.iter().enumerate().map(|(i, f)| (f.name, i))
    }

    /// Whether a participation value is accepted on this form
    pub fn accepts_participation(&self, value: &str) -> bool {
        self.participation_levels
            .iter()
            .any(|level| level.as_str() == value)
    }
}

/// Look up the column schema of a category
///
/// # Arguments
/// * `category` - The feedback category
///
/// # Returns
/// * `&'static ColumnSchema` - The category's fixed layout
pub fn schema_for(category: FeedbackCategory) -> &'static ColumnSchema {
    match category {
        FeedbackCategory::Overall => &OVERALL,
        FeedbackCategory::Scientific => &SCIENTIFIC,
        FeedbackCategory::Catering => &CATERING,
        FeedbackCategory::Exhibition => &EXHIBITION,
        FeedbackCategory::Oral => &ORAL,
        FeedbackCategory::Poster => &POSTER,
    }
}

/// Look up a schema by its category tag, failing on unregistered tags
pub fn schema_for_tag(tag: &str) -> Result<&'static ColumnSchema, FeedbackError> {
    tag.parse::<FeedbackCategory>().map(schema_for)
}

use ParticipationLevel::{Delegate, Evaluator, Exhibitor, Organiser, Other, Presenter, Volunteer};

const ALL_ROLES: &[ParticipationLevel] = &[
    Delegate, Volunteer, Evaluator, Presenter, Organiser, Exhibitor, Other,
];
const SESSION_ROLES: &[ParticipationLevel] = &[Delegate, Evaluator, Presenter, Other];

static OVERALL: ColumnSchema = ColumnSchema {
    category: FeedbackCategory::Overall,
    version: SCHEMA_VERSION,
    required: &["email", "full_name", "participation_level"],
    participation_levels: ALL_ROLES,
    fields: &[
        field(TIMESTAMP_FIELD, Timestamp),
        field("email", Email),
        field("full_name", Text),
        field("mobile", Phone),
        field("institution", Text),
        field("designation", Text),
        field("city", Text),
        field("country", Text),
        field("participation_level", Choice),
        field("participation_other", Text),
        field("first_time_attendee", Text),
        // 11: general organisation
        field("registration_rating", Rating),
        field("communication_rating", Rating),
        field("website_rating", Rating),
        field("inauguration_rating", Rating),
        field("keynote_rating", Rating),
        field("scientific_rating", Rating),
        field("session_timeliness_rating", Rating),
        field("hall_rating", Rating),
        field("av_rating", Rating),
        field("catering_rating", Rating),
        field("breakfast_rating", Rating),
        field("lunch_rating", Rating),
        field("dinner_rating", Rating),
        field("tea_break_rating", Rating),
        field("transport_rating", Rating),
        field("accommodation_rating", Rating),
        field("venue_rating", Rating),
        field("signage_rating", Rating),
        field("volunteer_support_rating", Rating),
        field("cultural_rating", Rating),
        field("gala_dinner_rating", Rating),
        field("exhibition_rating", Rating),
        field("networking_rating", Rating),
        field("kit_rating", Rating),
        field("certificate_rating", Rating),
        // 36: role specific, blank unless the declared role asks for them
        field("sessions_attended", MultiSelect),
        field("learning_value_rating", Rating),
        field("volunteer_team", Text),
        field("volunteer_hours", Text),
        field("volunteer_experience_rating", Rating),
        field("sessions_evaluated", MultiSelect),
        field("evaluation_process_rating", Rating),
        field("presentation_type", Text),
        field("presentation_title", Text),
        field("presentation_slot_rating", Rating),
        field("organising_committee", Text),
        field("coordination_rating", Rating),
        field("exhibitor_company", Text),
        field("stall_number", Text),
        field("footfall_rating", Rating),
        field("lead_quality_rating", Rating),
        // 52: closing questions
        field("zones_visited", MultiSelect),
        field("highlights", Text),
        field("improvement_areas", MultiSelect),
        field("recommend_score", Text),
        field("attend_next_year", Text),
        field("overall_rating", Rating),
        field("comments", Text),
        field("suggestions", Text),
        field("consent_to_contact", Text),
    ],
};

static SCIENTIFIC: ColumnSchema = ColumnSchema {
    category: FeedbackCategory::Scientific,
    version: SCHEMA_VERSION,
    required: &["email", "full_name", "session_title"],
    participation_levels: SESSION_ROLES,
    fields: &[
        field(TIMESTAMP_FIELD, Timestamp),
        field("email", Email),
        field("full_name", Text),
        field("mobile", Phone),
        field("participation_level", Choice),
        field("participation_other", Text),
        field("session_title", Text),
        field("session_date", Text),
        field("hall", Text),
        field("sessions_attended", MultiSelect),
        field("relevance_rating", Rating),
        field("content_rating", Rating),
        field("speaker_rating", Rating),
        field("time_management_rating", Rating),
        field("av_rating", Rating),
        field("interaction_rating", Rating),
        field("moderator_rating", Rating),
        field("depth_rating", Rating),
        field("practical_value_rating", Rating),
        field("overall_rating", Rating),
        field("best_talk", Text),
        field("topics_missing", Text),
        field("preferred_format", Text),
        field("future_topics", MultiSelect),
        field("comments", Text),
        field("suggestions", Text),
    ],
};

static CATERING: ColumnSchema = ColumnSchema {
    category: FeedbackCategory::Catering,
    version: SCHEMA_VERSION,
    required: &["email", "full_name", "participation_level"],
    participation_levels: &[Delegate, Volunteer, Organiser, Exhibitor, Other],
    fields: &[
        field(TIMESTAMP_FIELD, Timestamp),
        field("email", Email),
        field("full_name", Text),
        field("mobile", Phone),
        field("participation_level", Choice),
        field("participation_other", Text),
        field("meals_taken", MultiSelect),
        field("dietary_preference", Text),
        field("breakfast_rating", Rating),
        field("lunch_rating", Rating),
        field("dinner_rating", Rating),
        field("tea_break_rating", Rating),
        field("taste_rating", Rating),
        field("variety_rating", Rating),
        field("quantity_rating", Rating),
        field("hygiene_rating", Rating),
        field("service_rating", Rating),
        field("queue_rating", Rating),
        field("seating_rating", Rating),
        field("water_rating", Rating),
        field("overall_rating", Rating),
        field("best_dish", Text),
        field("comments", Text),
        field("suggestions", Text),
    ],
};

static EXHIBITION: ColumnSchema = ColumnSchema {
    category: FeedbackCategory::Exhibition,
    version: SCHEMA_VERSION,
    required: &["email", "full_name", "participation_level"],
    participation_levels: &[Delegate, Presenter, Evaluator, Exhibitor, Other],
    fields: &[
        field(TIMESTAMP_FIELD, Timestamp),
        field("email", Email),
        field("full_name", Text),
        field("mobile", Phone),
        field("participation_level", Choice),
        field("participation_other", Text),
        field("organisation", Text),
        field("stall_number", Text),
        field("zones_visited", MultiSelect),
        field("stalls_visited_count", Text),
        field("layout_rating", Rating),
        field("signage_rating", Rating),
        field("product_relevance_rating", Rating),
        field("staff_rating", Rating),
        field("demo_rating", Rating),
        field("crowd_rating", Rating),
        field("lighting_rating", Rating),
        field("timing_rating", Rating),
        field("business_value_rating", Rating),
        field("overall_rating", Rating),
        field("best_stall", Text),
        field("would_exhibit_again", Text),
        field("comments", Text),
        field("suggestions", Text),
    ],
};

static ORAL: ColumnSchema = ColumnSchema {
    category: FeedbackCategory::Oral,
    version: SCHEMA_VERSION,
    required: &["email", "full_name", "session_name"],
    participation_levels: SESSION_ROLES,
    fields: &[
        field(TIMESTAMP_FIELD, Timestamp),
        field("email", Email),
        field("full_name", Text),
        field("mobile", Phone),
        field("participation_level", Choice),
        field("participation_other", Text),
        field("session_name", Text),
        field("presentation_id", Text),
        field("presentation_title", Text),
        field("presenter_name", Text),
        field("relevance_rating", Rating),
        field("clarity_rating", Rating),
        field("methodology_rating", Rating),
        field("results_rating", Rating),
        field("slides_rating", Rating),
        field("delivery_rating", Rating),
        field("time_management_rating", Rating),
        field("qa_rating", Rating),
        field("originality_rating", Rating),
        field("overall_rating", Rating),
        field("award_recommendation", Text),
        field("strengths", Text),
        field("weaknesses", Text),
        field("comments", Text),
        field("suggestions", Text),
    ],
};

static POSTER: ColumnSchema = ColumnSchema {
    category: FeedbackCategory::Poster,
    version: SCHEMA_VERSION,
    required: &["email", "full_name", "poster_session"],
    participation_levels: SESSION_ROLES,
    fields: &[
        field(TIMESTAMP_FIELD, Timestamp),
        field("email", Email),
        field("full_name", Text),
        field("mobile", Phone),
        field("participation_level", Choice),
        field("participation_other", Text),
        field("poster_session", Text),
        field("poster_id", Text),
        field("poster_title", Text),
        field("presenter_name", Text),
        field("visual_rating", Rating),
        field("content_rating", Rating),
        field("methodology_rating", Rating),
        field("results_rating", Rating),
        field("originality_rating", Rating),
        field("explanation_rating", Rating),
        field("qa_rating", Rating),
        field("overall_rating", Rating),
        field("award_recommendation", Text),
        field("strengths", Text),
        field("suggestions", Text),
        field("comments", Text),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn column_counts_are_fixed() {
        let counts: Vec<(FeedbackCategory, usize)> = FeedbackCategory::ALL
            .into_iter()
            .map(|c| (c, schema_for(c).len()))
            .collect();
        assert_eq!(
            counts,
            vec![
                (FeedbackCategory::Overall, 61),
                (FeedbackCategory::Scientific, 26),
                (FeedbackCategory::Catering, 24),
                (FeedbackCategory::Exhibition, 24),
                (FeedbackCategory::Oral, 25),
                (FeedbackCategory::Poster, 22),
            ]
        );
    }

    #[test]
    fn dashboard_fields_exist_in_the_overall_schema() {
        use crate::aggregate::{COMMENT_FIELDS, DASHBOARD_METRICS, NAME_FIELD, PARTICIPATION_FIELD};

        let overall = schema_for(FeedbackCategory::Overall);
        let fields = DASHBOARD_METRICS
            .into_iter()
            .map(|(_, field)| field)
            .chain(COMMENT_FIELDS)
            .chain([PARTICIPATION_FIELD, NAME_FIELD]);
        for field in fields {
            assert!(overall.index_of(field).is_some(), "{field} is not an overall column");
        }
        for (_, field) in DASHBOARD_METRICS {
            assert_eq!(overall.field(field).map(|f| f.kind), Some(FieldKind::Rating));
        }
    }

    #[test]
    fn every_schema_reserves_column_zero_for_the_timestamp() {
        for category in FeedbackCategory::ALL {
            let schema = schema_for(category);
            assert_eq!(schema.fields[0].name, TIMESTAMP_FIELD);
            assert_eq!(schema.fields[0].kind, FieldKind::Timestamp);
            assert_eq!(
                schema.fields.iter().filter(|f| f.kind == FieldKind::Timestamp).count(),
                1
            );
        }
    }

    #[test]
    fn field_names_are_unique_and_indices_contiguous() {
        for category in FeedbackCategory::ALL {
            let schema = schema_for(category);
            let names: HashSet<&str> = schema.fields.iter().map(|f| f.name).collect();
            assert_eq!(names.len(), schema.len(), "duplicate field in {category}");

            let indices: Vec<usize> = schema.columns().map(|(_, i)| i).collect();
            assert_eq!(indices, (0..schema.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn required_fields_exist_in_their_schema() {
        for category in FeedbackCategory::ALL {
            let schema = schema_for(category);
            for name in schema.required {
                assert!(schema.index_of(name).is_some(), "{name} missing from {category}");
            }
            assert!(schema.required.contains(&"email"));
            assert!(schema.required.contains(&"full_name"));
        }
    }

    #[test]
    fn tags_parse_case_insensitively() {
        assert_eq!("poster".parse::<FeedbackCategory>().unwrap(), FeedbackCategory::Poster);
        assert_eq!(" Overall ".parse::<FeedbackCategory>().unwrap(), FeedbackCategory::Overall);
        assert!(matches!(
            schema_for_tag("registration"),
            Err(FeedbackError::UnknownCategory(tag)) if tag == "registration"
        ));
    }
}
