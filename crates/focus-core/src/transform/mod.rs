//! Conversion between local records and spreadsheet rows.
//!
//! Forward maps are total. Inverse maps are lenient: a malformed cell falls
//! back to a safe default instead of failing the row. Only a missing `ID`
//! rejects a row.

mod item;
mod prompt;

pub use item::{item_to_row, parse_item_row, ParsedItem, ResolvedLinks};
pub use prompt::{parse_prompt_row, prompt_to_row, ParsedPrompt};

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::models::{names_match, Category, CategoryId, Project, ProjectId, Tag, TagId};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Tags, categories and projects known locally, used for id/name lookups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataSnapshot {
    pub tags: Vec<Tag>,
    pub categories: Vec<Category>,
    pub projects: Vec<Project>,
}

impl MetadataSnapshot {
    pub fn tag_name(&self, id: &TagId) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| &tag.id == id)
            .map(|tag| tag.name.as_str())
    }

    pub fn category_name(&self, id: &CategoryId) -> Option<&str> {
        self.categories
            .iter()
            .find(|category| &category.id == id)
            .map(|category| category.name.as_str())
    }

    pub fn project_name(&self, id: &ProjectId) -> Option<&str> {
        self.projects
            .iter()
            .find(|project| &project.id == id)
            .map(|project| project.name.as_str())
    }

    pub fn find_tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| names_match(&tag.name, name))
    }

    pub fn find_category(&self, name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|category| names_match(&category.name, name))
    }

    pub fn find_project(&self, name: &str) -> Option<&Project> {
        self.projects
            .iter()
            .find(|project| names_match(&project.name, name))
    }
}

/// `"TRUE"` in any casing is true; everything else is false
pub fn parse_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("TRUE")
}

pub const fn format_bool(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-01-01T00:00:00.000Z`
pub fn format_timestamp(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a sheet timestamp into Unix ms.
///
/// Accepts RFC 3339, a naive date-time (read as UTC) or a bare date.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.timestamp_millis());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc().timestamp_millis());
        }
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a deadline cell: `YYYY-MM-DD` or a full timestamp (UTC date taken)
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .or_else(|| {
            parse_timestamp(value)
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|parsed| parsed.date_naive())
        })
}

/// Split a comma-joined name list, trimming and dropping empty entries
pub fn split_names(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Trimmed cell text, or `None` when blank
pub(crate) fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
