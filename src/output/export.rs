//! CSV export of stored postings

use crate::models::{JobRecord, RawJob};
use crate::storage::format_timestamp;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

const HEADER: [&str; 12] = [
    "id",
    "title",
    "company",
    "location",
    "salary",
    "experience",
    "education",
    "url",
    "source",
    "posted_date",
    "scraped_at",
    "keyword",
];

/// Writes a header row plus one row per record
pub fn export_csv<W: Write>(records: &[JobRecord], writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADER)?;

    for record in records {
        let id = record.id.to_string();
        let scraped_at = format_timestamp(&record.scraped_at);
        out.write_record([
            id.as_str(),
            record.title.as_str(),
            record.company.as_str(),
            record.location.as_deref().unwrap_or(""),
            record.salary.as_deref().unwrap_or(""),
            record.experience.as_deref().unwrap_or(""),
            record.education.as_deref().unwrap_or(""),
            record.url.as_str(),
            record.source.as_str(),
            record.posted_date.as_deref().unwrap_or(""),
            scraped_at.as_str(),
            record.keyword.as_str(),
        ])?;
    }

    out.flush()?;
    Ok(())
}

/// Writes raw, unsaved records; used to keep a crawl whose save failed
pub fn export_raw_csv<W: Write>(jobs: &[RawJob], writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&HEADER[1..])?;

    for job in jobs {
        out.write_record([
            job.title.as_str(),
            job.company.as_str(),
            job.location.as_str(),
            job.salary.as_str(),
            job.experience.as_str(),
            job.education.as_str(),
            job.url.as_str(),
            job.source.as_str(),
            job.posted_date.as_str(),
            "",
            job.keyword.as_str(),
        ])?;
    }

    out.flush()?;
    Ok(())
}

/// `jobs_YYYYMMDD_HHMMSS.csv` for the given time
pub fn export_file_name(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}.csv", prefix, now.format("%Y%m%d_%H%M%S"))
}

/// Exports `records` into a timestamped file under `dir`
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(JobtideError)` - Failed to create or write the file
pub fn export_to_dir(
    records: &[JobRecord],
    dir: &Path,
    now: DateTime<Utc>,
) -> crate::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name("jobs", now));
    export_csv(records, File::create(&path)?)?;
    tracing::info!("Exported {} jobs to {}", records.len(), path.display());
    Ok(path)
}

/// Dumps an unsaved batch into a timestamped file under `dir`
pub fn export_unsaved_to_dir(
    jobs: &[RawJob],
    dir: &Path,
    now: DateTime<Utc>,
) -> crate::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name("unsaved_jobs", now));
    export_raw_csv(jobs, File::create(&path)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn record() -> JobRecord {
        JobRecord {
            id: 7,
            title: "Backend, Senior".to_string(),
            company: "Acme \"Labs\"".to_string(),
            location: Some("Seoul".to_string()),
            salary: None,
            experience: Some("3y".to_string()),
            education: None,
            url: "https://jobs.example.com/7".to_string(),
            source: "Saramin".to_string(),
            posted_date: None,
            scraped_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            keyword: "backend".to_string(),
        }
    }

    #[test]
    fn test_export_csv_quotes_fields() {
        let mut buffer = Vec::new();
        export_csv(&[record()], &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,title,company,location,salary,experience,education,url,source,posted_date,scraped_at,keyword"
        );
        assert_eq!(
            lines.next().unwrap(),
            "7,\"Backend, Senior\",\"Acme \"\"Labs\"\"\",Seoul,,3y,,https://jobs.example.com/7,Saramin,,2024-05-01T09:30:00.000000Z,backend"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_export_empty_has_header_only() {
        let mut buffer = Vec::new();
        export_csv(&[], &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_export_to_dir() {
        let dir = TempDir::new().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 5).unwrap();

        let path = export_to_dir(&[record()], dir.path(), now).unwrap();
        assert_eq!(path.file_name().unwrap(), "jobs_20240501_093005.csv");

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][1], "Backend, Senior");
    }

    #[test]
    fn test_export_unsaved() {
        let dir = TempDir::new().unwrap();
        let job = RawJob {
            title: "Orphan".to_string(),
            url: "/relative".to_string(),
            ..RawJob::default()
        };

        let path = export_unsaved_to_dir(&[job], dir.path(), Utc::now()).unwrap();
        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.headers().unwrap().len(), 11);
        assert_eq!(reader.records().count(), 1);
    }
}
