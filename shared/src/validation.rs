use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

use crate::task::{Category, Priority};

pub const MIN_TITLE_LEN: usize = 3;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("title must be at least {} characters", MIN_TITLE_LEN)]
    TitleTooShort,
    #[error("unknown priority `{0}`, expected low, medium or high")]
    UnknownPriority(String),
    #[error("unknown category `{0}`, expected new, pending or scheduled")]
    UnknownCategory(String),
    #[error("`{0}` is not a valid date")]
    InvalidDueDate(String),
}

impl FieldError {
    pub fn field(&self) -> &'static str {
        match self {
            FieldError::TitleTooShort => "title",
            FieldError::UnknownPriority(_) => "priority",
            FieldError::UnknownCategory(_) => "category",
            FieldError::InvalidDueDate(_) => "due_date",
        }
    }
}

/// Every field that failed validation for one input, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid task input: {}", describe(.errors))]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    fn collect(errors: impl IntoIterator<Item = Option<FieldError>>) -> Self {
        Self {
            errors: errors.into_iter().flatten().collect(),
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.errors.iter().map(FieldError::field)
    }
}

impl From<FieldError> for ValidationError {
    fn from(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field(), e))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Fields accepted when creating a task.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Partial edit. An absent field is left alone; an explicit `null` clears
/// a nullable field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<String>>,
    #[serde(default)]
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleInput {
    pub completed: bool,
}

/// Validated creation fields, waiting for an id and an owner.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category: Option<Category>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Validated partial edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub category: Option<Option<Category>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub completed: Option<bool>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        *self == TaskChanges::default()
    }
}

impl CreateTaskInput {
    pub fn validate(self) -> Result<TaskDraft, ValidationError> {
        let title = check_title(&self.title);
        let priority = self.priority.as_deref().map(str::parse::<Priority>).transpose();
        let category = self.category.as_deref().map(str::parse::<Category>).transpose();
        let due_date = self.due_date.as_deref().map(parse_due_date).transpose();

        match (title, priority, category, due_date) {
            (Ok(title), Ok(priority), Ok(category), Ok(due_date)) => Ok(TaskDraft {
                title,
                description: normalize_description(self.description),
                priority: priority.unwrap_or_default(),
                category,
                due_date,
            }),
            (title, priority, category, due_date) => Err(ValidationError::collect([
                title.err(),
                priority.err(),
                category.err(),
                due_date.err(),
            ])),
        }
    }
}

impl UpdateTaskInput {
    pub fn validate(self) -> Result<TaskChanges, ValidationError> {
        let title = self.title.as_deref().map(check_title).transpose();
        let priority = self.priority.as_deref().map(str::parse::<Priority>).transpose();
        let category = self
            .category
            .map(|c| c.as_deref().map(str::parse::<Category>).transpose())
            .transpose();
        let due_date = self
            .due_date
            .map(|d| d.as_deref().map(parse_due_date).transpose())
            .transpose();

        match (title, priority, category, due_date) {
            (Ok(title), Ok(priority), Ok(category), Ok(due_date)) => Ok(TaskChanges {
                title,
                description: self.description.map(normalize_description),
                priority,
                category,
                due_date,
                completed: self.completed,
            }),
            (title, priority, category, due_date) => Err(ValidationError::collect([
                title.err(),
                priority.err(),
                category.err(),
                due_date.err(),
            ])),
        }
    }
}

fn check_title(raw: &str) -> Result<String, FieldError> {
    let title = raw.trim();
    if title.chars().count() < MIN_TITLE_LEN {
        return Err(FieldError::TitleTooShort);
    }
    Ok(title.to_string())
}

fn normalize_description(raw: Option<String>) -> Option<String> {
    raw.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, FieldError> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
        .ok_or_else(|| FieldError::InvalidDueDate(raw.to_string()))
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str) -> CreateTaskInput {
        CreateTaskInput {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn title_needs_three_characters_after_trimming() {
        assert!(input("abc").validate().is_ok());
        assert!(input("  ab  ").validate().is_err());
        assert!(input("").validate().is_err());
        // counted in characters, not bytes
        assert!(input("çã").validate().is_err());
        assert_eq!(input("  Buy milk ").validate().unwrap().title, "Buy milk");
    }

    #[test]
    fn priority_defaults_to_medium() {
        let draft = input("Buy milk").validate().unwrap();
        assert_eq!(draft.priority, Priority::Medium);
        assert_eq!(draft.category, None);
    }

    #[test]
    fn collects_every_failing_field() {
        let err = CreateTaskInput {
            title: "x".to_string(),
            priority: Some("urgent".to_string()),
            category: Some("someday".to_string()),
            due_date: Some("2024-02-30".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();

        assert_eq!(
            err.fields().collect::<Vec<_>>(),
            vec!["title", "priority", "category", "due_date"]
        );
        assert!(err.to_string().contains("priority: unknown priority `urgent`"));
    }

    #[test]
    fn accepts_known_enums() {
        let draft = CreateTaskInput {
            title: "Plan trip".to_string(),
            priority: Some("high".to_string()),
            category: Some("scheduled".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(draft.priority, Priority::High);
        assert_eq!(draft.category, Some(Category::Scheduled));
    }

    #[test]
    fn due_date_accepts_timestamps_and_calendar_dates() {
        let midnight = parse_due_date("2024-05-01").unwrap();
        assert_eq!(midnight, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

        let shifted = parse_due_date("2024-05-01T23:59:00-03:00").unwrap();
        assert_eq!(shifted, Utc.with_ymd_and_hms(2024, 5, 2, 2, 59, 0).unwrap());

        // no range restriction
        assert!(parse_due_date("1999-12-31").is_ok());
        assert_eq!(
            parse_due_date("tomorrow"),
            Err(FieldError::InvalidDueDate("tomorrow".to_string()))
        );
    }

    #[test]
    fn blank_description_is_dropped() {
        let draft = CreateTaskInput {
            title: "Buy milk".to_string(),
            description: Some("   ".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(draft.description, None);
    }

    #[test]
    fn update_only_checks_present_fields() {
        let changes = UpdateTaskInput {
            priority: Some("low".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.priority, Some(Priority::Low));
        assert_eq!(changes.title, None);

        let err = UpdateTaskInput {
            title: Some("no".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.errors(), &[FieldError::TitleTooShort]);
    }

    #[test]
    fn update_distinguishes_missing_from_null() {
        let input: UpdateTaskInput =
            serde_json::from_str(r#"{"category": null, "title": "Renamed"}"#).unwrap();
        assert_eq!(input.category, Some(None));
        assert_eq!(input.due_date, None);

        let changes = input.validate().unwrap();
        assert_eq!(changes.category, Some(None));
        assert_eq!(changes.due_date, None);
        assert_eq!(changes.title.as_deref(), Some("Renamed"));
    }

    #[test]
    fn inputs_reject_unknown_fields() {
        assert!(serde_json::from_str::<CreateTaskInput>(
            r#"{"title": "Buy milk", "user_id": "00000000-0000-0000-0000-000000000000"}"#
        )
        .is_err());
        assert!(serde_json::from_str::<ToggleInput>(r#"{"completed": true, "title": "x"}"#).is_err());
        assert!(serde_json::from_str::<UpdateTaskInput>(r#"{"id": "x"}"#).is_err());
    }

    #[test]
    fn empty_update_is_detected() {
        let changes = UpdateTaskInput::default().validate().unwrap();
        assert!(changes.is_empty());
    }
}
