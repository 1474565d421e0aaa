use crate::adapters::SiteAdapter;
use crate::models::RawJob;
use crate::render::dom;
use crate::{ExtractionError, FetchError};
use scraper::ElementRef;
use url::Url;

const ITEM: &str = ".list-default__item";
const TITLE_LINK: &str = ".information-title a";
const COMPANY: &str = ".name a";
const OPTION: &str = ".option";
const POSTED: &str = ".date";

/// JobKorea search results
///
/// Detail fields are labeled: each `.option` element starts with a marker
/// such as "지역" (region), "경력" (experience) or "학력" (education). The
/// element is matched by its label and the label is stripped from the value.
#[derive(Debug, Clone)]
pub struct JobKoreaAdapter {
    base_url: Url,
}

impl JobKoreaAdapter {
    pub const DEFAULT_BASE_URL: &'static str = "https://www.jobkorea.co.kr";

    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Location,
    Education,
    Experience,
    Salary,
}

/// Checked in order; the first label found in an option claims it
const LABELS: &[(&str, Field)] = &[
    ("지역", Field::Location),
    ("학력", Field::Education),
    ("경력", Field::Experience),
    ("연봉", Field::Salary),
    ("급여", Field::Salary),
];

impl SiteAdapter for JobKoreaAdapter {
    fn name(&self) -> &'static str {
        "JobKorea"
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn page_url(&self, keyword: &str, page: u32) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join("/Search/")
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("stext", keyword)
            .append_pair("Page_No", &page.to_string());
        Ok(url)
    }

    fn item_selector(&self) -> &'static str {
        ITEM
    }

    fn parse_item(&self, item: ElementRef<'_>) -> Result<RawJob, ExtractionError> {
        let title_link = dom::query_first(item, &dom::selector(TITLE_LINK)?)
            .ok_or(ExtractionError::MissingElement(TITLE_LINK))?;
        let title = dom::text(title_link);
        if title.is_empty() {
            return Err(ExtractionError::MissingElement(TITLE_LINK));
        }

        let href = dom::attribute(title_link, "href").ok_or(ExtractionError::MissingAttribute {
            selector: TITLE_LINK,
            attribute: "href",
        })?;
        let url = dom::resolve_url(&self.base_url, &href)?;

        let company = dom::query_first(item, &dom::selector(COMPANY)?)
            .map(dom::text)
            .filter(|c| !c.is_empty())
            .ok_or(ExtractionError::MissingElement(COMPANY))?;

        let mut job = RawJob {
            title,
            company,
            url: url.to_string(),
            ..RawJob::default()
        };

        for option in dom::query(item, &dom::selector(OPTION)?) {
            let text = dom::text(option);
            let Some((label, field)) = LABELS.iter().find(|(label, _)| text.contains(label)) else {
                continue;
            };

            let slot = match field {
                Field::Location => &mut job.location,
                Field::Education => &mut job.education,
                Field::Experience => &mut job.experience,
                Field::Salary => &mut job.salary,
            };
            if slot.is_empty() {
                *slot = strip_label(&text, label);
            }
        }

        job.posted_date = dom::query_first(item, &dom::selector(POSTED)?)
            .map(dom::text)
            .unwrap_or_default();

        Ok(job)
    }
}

/// Removes a leading label and separator; text that merely mentions the
/// label elsewhere (e.g. "신입·경력") is kept whole
fn strip_label(text: &str, label: &str) -> String {
    match text.strip_prefix(label) {
        Some(rest) => rest.trim_start_matches([':', ' ']).trim().to_string(),
        None => text.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderedPage;

    fn adapter() -> JobKoreaAdapter {
        JobKoreaAdapter::new(Url::parse(JobKoreaAdapter::DEFAULT_BASE_URL).unwrap())
    }

    const LISTING: &str = r#"
        <ul class="list-default">
          <li class="list-default__item">
            <div class="information-title"><a href="/Recruit/GI_Read/1001">ML 엔지니어</a></div>
            <div class="name"><a href="/Recruit/Co_Read/C/1">데이터웍스</a></div>
            <ul class="options">
              <li class="option">경력 5년↑</li>
              <li class="option">학력 대졸↑</li>
              <li class="option">지역 서울 마포구</li>
            </ul>
            <span class="date">~06/30(일)</span>
          </li>
          <li class="list-default__item">
            <div class="information-title"><a href="https://www.jobkorea.co.kr/Recruit/GI_Read/1002">백엔드 개발자</a></div>
            <div class="name"><a>코드팩토리</a></div>
            <ul class="options">
              <li class="option">신입·경력</li>
              <li class="option">연봉: 4,000만원</li>
            </ul>
          </li>
          <li class="list-default__item">
            <div class="information-title"><a href="/Recruit/GI_Read/1003">회사명 없음</a></div>
          </li>
        </ul>
    "#;

    #[test]
    fn test_page_url() {
        let url = adapter().page_url("데이터분석", 3).unwrap();
        assert_eq!(url.path(), "/Search/");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("stext".to_string(), "데이터분석".to_string()),
                ("Page_No".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_extract_labeled_fields() {
        let adapter = adapter();
        let page = RenderedPage::new(adapter.page_url("ml", 1).unwrap(), LISTING);
        let jobs = adapter.extract(&page);

        assert_eq!(jobs.len(), 2);

        let first = &jobs[0];
        assert_eq!(first.title, "ML 엔지니어");
        assert_eq!(first.company, "데이터웍스");
        assert_eq!(first.location, "서울 마포구");
        assert_eq!(first.experience, "5년↑");
        assert_eq!(first.education, "대졸↑");
        assert_eq!(first.posted_date, "~06/30(일)");
        assert_eq!(first.url, "https://www.jobkorea.co.kr/Recruit/GI_Read/1001");
        assert_eq!(first.source, "JobKorea");
    }

    #[test]
    fn test_missing_labels_are_empty() {
        let adapter = adapter();
        let page = RenderedPage::new(adapter.page_url("backend", 1).unwrap(), LISTING);
        let second = &adapter.extract(&page)[1];

        assert_eq!(second.url, "https://www.jobkorea.co.kr/Recruit/GI_Read/1002");
        assert_eq!(second.location, "");
        assert_eq!(second.education, "");
        assert_eq!(second.experience, "신입·경력");
        assert_eq!(second.salary, "4,000만원");
    }

    #[test]
    fn test_strip_label() {
        assert_eq!(strip_label("지역 서울", "지역"), "서울");
        assert_eq!(strip_label("경력: 3년", "경력"), "3년");
        assert_eq!(strip_label("신입·경력", "경력"), "신입·경력");
    }
}
