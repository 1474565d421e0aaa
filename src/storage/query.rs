//! Read-side query builder
//!
//! A [`JobQuery`] compiles to a parameterized `SELECT` over the `jobs` table.
//! Column names only ever come from the enums below; every user-supplied value
//! is bound as a parameter.

use chrono::{Duration, NaiveDate};

/// Columns that can be filtered on and listed for filter choices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterColumn {
    Source,
    Location,
    Experience,
    Keyword,
}

impl FilterColumn {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Location => "location",
            Self::Experience => "experience",
            Self::Keyword => "keyword",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    ScrapedAt,
    Title,
    Company,
    Location,
}

impl SortField {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::ScrapedAt => "scraped_at",
            Self::Title => "title",
            Self::Company => "company",
            Self::Location => "location",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filters, sort and limit for reading stored postings
///
/// The default query returns every record, newest first. Exact filters
/// combine with AND. `search` is a case-insensitive (ASCII) substring match
/// on title or company. Date bounds are inclusive UTC calendar dates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobQuery {
    pub source: Option<String>,
    pub location: Option<String>,
    pub experience: Option<String>,
    pub keyword: Option<String>,
    pub scraped_from: Option<NaiveDate>,
    pub scraped_to: Option<NaiveDate>,
    pub search: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl JobQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn experience(mut self, experience: impl Into<String>) -> Self {
        self.experience = Some(experience.into());
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn scraped_between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.scraped_from = from;
        self.scraped_to = to;
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn sort_by(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort = field;
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Builds the SQL text and its bound parameters
    pub(crate) fn to_sql(&self) -> (String, Vec<String>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<String> = Vec::new();

        let exact = [
            (FilterColumn::Source, &self.source),
            (FilterColumn::Location, &self.location),
            (FilterColumn::Experience, &self.experience),
            (FilterColumn::Keyword, &self.keyword),
        ];
        for (column, value) in exact {
            if let Some(value) = value {
                params.push(value.clone());
                clauses.push(format!("{} = ?{}", column.as_sql(), params.len()));
            }
        }

        if let Some(from) = self.scraped_from {
            params.push(day_start(from));
            clauses.push(format!("scraped_at >= ?{}", params.len()));
        }

        if let Some(to) = self.scraped_to {
            params.push(day_start(to + Duration::days(1)));
            clauses.push(format!("scraped_at < ?{}", params.len()));
        }

        if let Some(text) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            params.push(format!("%{}%", escape_like(text)));
            let n = params.len();
            clauses.push(format!(
                "(title LIKE ?{n} ESCAPE '\\' OR company LIKE ?{n} ESCAPE '\\')"
            ));
        }

        let mut sql = String::from(
            "SELECT id, title, company, location, salary, experience, education, url, source, \
             posted_date, scraped_at, keyword FROM jobs",
        );
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let order = self.order.as_sql();
        sql.push_str(&format!(
            " ORDER BY {} {}, id {}",
            self.sort.as_sql(),
            order,
            order
        ));

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        (sql, params)
    }
}

fn day_start(date: NaiveDate) -> String {
    date.format("%Y-%m-%dT00:00:00").to_string()
}

/// Escapes LIKE wildcards so user text matches literally
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
