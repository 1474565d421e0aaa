//! HTML rendering for notification emails
//!
//! Every function here is pure: the same input always renders the same
//! text. Interpolated values are HTML-escaped.

use crate::models::JobRecord;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

const NOT_AVAILABLE: &str = "N/A";

const STYLE: &str = "\
body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
.header { background-color: #4CAF50; color: white; padding: 20px; text-align: center; }
.job-card { background-color: #f9f9f9; border-left: 4px solid #4CAF50; padding: 15px; margin: 15px 0; border-radius: 5px; }
.job-title { color: #2c3e50; font-size: 18px; font-weight: bold; margin-bottom: 10px; }
.job-company { color: #34495e; font-size: 16px; margin-bottom: 5px; }
.job-details { color: #7f8c8d; font-size: 14px; }
.job-link { display: inline-block; background-color: #4CAF50; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px; margin-top: 10px; }
.footer { text-align: center; color: #7f8c8d; padding: 20px; font-size: 12px; }
";

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        NOT_AVAILABLE
    } else {
        value
    }
}

fn optional(value: &Option<String>) -> &str {
    or_na(value.as_deref().unwrap_or(""))
}

/// Subject line for a digest of `count` new postings
pub fn digest_subject(count: usize) -> String {
    format!("{count} New Job Postings Found!")
}

/// Subject line for the daily summary
pub fn summary_subject(new: u64) -> String {
    format!("Daily Summary: {new} New Jobs")
}

/// Renders the new-postings digest, one card per record
pub fn render_digest(records: &[JobRecord]) -> String {
    let mut html = String::new();
    html.push_str("<html>\n<head>\n<style>\n");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");
    // Writing into a String cannot fail.
    let _ = write!(
        html,
        "<div class=\"header\">\n<h1>New Job Alerts</h1>\n<p>We found {} new jobs matching your criteria!</p>\n</div>\n",
        records.len()
    );
    html.push_str("<div style=\"padding: 20px;\">\n");

    for record in records {
        let _ = write!(
            html,
            "<div class=\"job-card\">\n\
             <div class=\"job-title\">{}</div>\n\
             <div class=\"job-company\">{}</div>\n\
             <div class=\"job-details\">{} | {} | {}<br>Source: {}</div>\n\
             <a href=\"{}\" class=\"job-link\">View Job</a>\n\
             </div>\n",
            encode_text(or_na(&record.title)),
            encode_text(or_na(&record.company)),
            encode_text(optional(&record.location)),
            encode_text(optional(&record.experience)),
            encode_text(optional(&record.education)),
            encode_text(or_na(&record.source)),
            encode_double_quoted_attribute(&record.url),
        );
    }

    html.push_str("</div>\n<div class=\"footer\">\n<p>This is an automated email from jobtide</p>\n</div>\n</body>\n</html>\n");
    html
}

/// Renders the daily summary; only the first five companies are listed
pub fn render_daily_summary(total: u64, new: u64, top_companies: &[String]) -> String {
    let companies = top_companies
        .iter()
        .take(5)
        .map(|c| encode_text(c).into_owned())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "<html>\n<body style=\"font-family: Arial, sans-serif;\">\n\
         <div style=\"background-color: #4CAF50; color: white; padding: 20px; text-align: center;\">\n\
         <h1>Daily Job Scraping Summary</h1>\n</div>\n\
         <div style=\"padding: 20px;\">\n<h2>Today's Statistics:</h2>\n\
         <ul style=\"font-size: 16px; line-height: 2;\">\n\
         <li>Total Jobs in Database: <strong>{total}</strong></li>\n\
         <li>New Jobs Today: <strong>{new}</strong></li>\n\
         <li>Top Companies: {}</li>\n\
         </ul>\n</div>\n</body>\n</html>\n",
        or_na(&companies)
    )
}
