use crate::adapters::SiteAdapter;
use crate::models::RawJob;
use crate::render::dom;
use crate::{ExtractionError, FetchError};
use scraper::ElementRef;
use url::Url;

const ITEM: &str = ".item_recruit";
const TITLE_LINK: &str = ".job_tit a";
const COMPANY: &str = ".corp_name a";
const CONDITIONS: &str = ".job_condition";
const CONDITION_PART: &str = ".job_condition span";
const POSTED: &str = ".job_day";

/// Saramin search results
///
/// Location, experience and education come from a single "conditions" block
/// whose parts are unlabeled. Parts are classified by marker text first and
/// only unmarked parts fall back to their position, so a listing that omits
/// experience does not shift education into the experience slot.
#[derive(Debug, Clone)]
pub struct SaraminAdapter {
    base_url: Url,
}

impl SaraminAdapter {
    pub const DEFAULT_BASE_URL: &'static str = "https://www.saramin.co.kr";

    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }
}

impl SiteAdapter for SaraminAdapter {
    fn name(&self) -> &'static str {
        "Saramin"
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn page_url(&self, keyword: &str, page: u32) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join("/zf_user/search/recruit")
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("searchType", "search")
            .append_pair("searchword", keyword)
            .append_pair("recruitPage", &page.to_string());
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

        let conditions = classify_conditions(&condition_parts(item)?);

        let posted_date = dom::query_first(item, &dom::selector(POSTED)?)
            .map(|e| strip_date_label(&dom::text(e)))
            .unwrap_or_default();

        Ok(RawJob {
            title,
            company,
            location: conditions.location,
            salary: conditions.salary,
            experience: conditions.experience,
            education: conditions.education,
            url: url.to_string(),
            posted_date,
            ..RawJob::default()
        })
    }
}

/// Condition parts, from the block's spans or else its comma-separated text
fn condition_parts(item: ElementRef<'_>) -> Result<Vec<String>, ExtractionError> {
    let spans: Vec<String> = dom::query(item, &dom::selector(CONDITION_PART)?)
        .into_iter()
        .map(dom::text)
        .filter(|t| !t.is_empty())
        .collect();
    if !spans.is_empty() {
        return Ok(spans);
    }

    let block = dom::query_first(item, &dom::selector(CONDITIONS)?)
        .map(dom::text)
        .unwrap_or_default();
    Ok(block
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect())
}

#[derive(Debug, Default, PartialEq)]
struct Conditions {
    location: String,
    experience: String,
    education: String,
    salary: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ConditionKind {
    Education,
    Experience,
    Salary,
    Employment,
}

const EDUCATION_MARKERS: &[&str] = &[
    "학력", "졸", "석사", "박사", "bachelor", "master", "degree", "phd", "high school",
];
const EXPERIENCE_MARKERS: &[&str] = &["경력", "신입", "년차", "year", "entry", "experience"];
const SALARY_MARKERS: &[&str] = &["연봉", "급여", "만원", "salary"];
const EMPLOYMENT_MARKERS: &[&str] = &["정규직", "계약직", "인턴", "파견직", "프리랜서", "full-time"];

impl ConditionKind {
    fn detect(part: &str) -> Option<Self> {
        let lower = part.to_lowercase();
        let has = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

        // Education first: "대학교졸업(4년)" also carries a year marker.
        if has(EDUCATION_MARKERS) {
            Some(Self::Education)
        } else if has(EXPERIENCE_MARKERS) {
            Some(Self::Experience)
        } else if has(SALARY_MARKERS) {
            Some(Self::Salary)
        } else if has(EMPLOYMENT_MARKERS) {
            Some(Self::Employment)
        } else {
            None
        }
    }
}

fn classify_conditions(parts: &[String]) -> Conditions {
    let mut out = Conditions::default();
    let mut unmarked = Vec::new();

    for part in parts {
        let slot = match ConditionKind::detect(part) {
            Some(ConditionKind::Education) => &mut out.education,
            Some(ConditionKind::Experience) => &mut out.experience,
            Some(ConditionKind::Salary) => &mut out.salary,
            Some(ConditionKind::Employment) => continue,
            None => {
                unmarked.push(part.clone());
                continue;
            }
        };
        // A repeated marker keeps the first part; it never falls through to
        // the positional fill.
        if slot.is_empty() {
            *slot = part.clone();
        }
    }

    let mut unmarked = unmarked.into_iter();
    for slot in [&mut out.location, &mut out.experience, &mut out.education] {
        if slot.is_empty() {
            match unmarked.next() {
                Some(part) => *slot = part,
                None => break,
            }
        }
    }

    out
}

fn strip_date_label(text: &str) -> String {
    text.replace("등록일", "")
        .replace("수정일", "")
        .trim()
        .to_string()
}
