//! Job posting records
//!
//! [`RawJob`] is what an adapter produces from a listing page: unvalidated
//! text fields where an absent value is an empty string. [`JobRecord`] is a
//! row that the store has accepted and stamped.

use crate::ValidationError;
use chrono::{DateTime, Utc};
use url::Url;

/// An unvalidated, unpersisted posting as extracted from a listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub experience: String,
    pub education: String,
    pub url: String,
    pub source: String,
    pub posted_date: String,
    pub keyword: String,
}

impl RawJob {
    /// Returns a copy with every field trimmed and inner whitespace runs
    /// collapsed to a single space
    pub fn normalized(&self) -> RawJob {
        RawJob {
            title: collapse_whitespace(&self.title),
            company: collapse_whitespace(&self.company),
            location: collapse_whitespace(&self.location),
            salary: collapse_whitespace(&self.salary),
            experience: collapse_whitespace(&self.experience),
            education: collapse_whitespace(&self.education),
            url: self.url.trim().to_string(),
            source: collapse_whitespace(&self.source),
            posted_date: collapse_whitespace(&self.posted_date),
            keyword: collapse_whitespace(&self.keyword),
        }
    }

    /// Checks the fields required for persistence
    ///
    /// `title`, `company`, `url` and `source` must be non-empty, and `url`
    /// must parse as an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("title", &self.title),
            ("company", &self.company),
            ("url", &self.url),
            ("source", &self.source),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField {
                    field,
                    url: self.url.clone(),
                });
            }
        }

        match Url::parse(self.url.trim()) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
            _ => Err(ValidationError::InvalidUrl(self.url.clone())),
        }
    }
}

/// A validated posting persisted by the job store, unique by `url`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub url: String,
    pub source: String,
    pub posted_date: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub keyword: String,
}

impl JobRecord {
    /// Builds the record for a normalized raw job stamped at `scraped_at`
    pub fn from_raw(id: i64, raw: &RawJob, scraped_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: raw.title.clone(),
            company: raw.company.clone(),
            location: non_empty(&raw.location),
            salary: non_empty(&raw.salary),
            experience: non_empty(&raw.experience),
            education: non_empty(&raw.education),
            url: raw.url.clone(),
            source: raw.source.clone(),
            posted_date: non_empty(&raw.posted_date),
            scraped_at,
            keyword: raw.keyword.clone(),
        }
    }
}

/// Maps an empty string to `None`
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Trims and collapses runs of whitespace (including newlines) to one space
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
