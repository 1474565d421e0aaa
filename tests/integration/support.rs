//! Shared fixtures: listing markup, configs and mock routes

use jobtide::config::{parse_config, Config};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One Saramin-shaped listing item; `company: None` leaves the company out
pub fn saramin_item(id: u32, title: &str, company: Option<&str>) -> String {
    let corp = company
        .map(|c| format!(r#"<strong class="corp_name"><a>{c}</a></strong>"#))
        .unwrap_or_default();
    format!(
        r#"<div class="item_recruit">
             <h2 class="job_tit"><a href="/zf_user/jobs/relay/view?rec_idx={id}">{title}</a></h2>
             <div class="job_condition"><span>서울</span><span>경력 3년↑</span><span>대졸↑</span></div>
             {corp}
           </div>"#
    )
}

/// One JobKorea-shaped listing item
pub fn jobkorea_item(id: u32, title: &str, company: &str) -> String {
    format!(
        r#"<li class="list-default__item">
             <div class="information-title"><a href="/Recruit/GI_Read/{id}">{title}</a></div>
             <div class="name"><a>{company}</a></div>
             <ul class="options"><li class="option">지역 부산</li><li class="option">경력 신입</li></ul>
           </li>"#
    )
}

pub fn page(items: &[String]) -> String {
    format!("<html><body><div class=\"content\">{}</div></body></html>", items.join("\n"))
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

/// Serves `body` for Saramin `keyword` page `page_no`
pub async fn mount_saramin(server: &MockServer, keyword: &str, page_no: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/zf_user/search/recruit"))
        .and(query_param("searchword", keyword))
        .and(query_param("recruitPage", page_no.to_string()))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Serves `body` for JobKorea `keyword` page `page_no`
pub async fn mount_jobkorea(server: &MockServer, keyword: &str, page_no: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/Search/"))
        .and(query_param("stext", keyword))
        .and(query_param("Page_No", page_no.to_string()))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Answers Saramin `keyword` page `page_no` with a server error
pub async fn fail_saramin(server: &MockServer, keyword: &str, page_no: u32) {
    Mock::given(method("GET"))
        .and(path("/zf_user/search/recruit"))
        .and(query_param("searchword", keyword))
        .and(query_param("recruitPage", page_no.to_string()))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

/// A config whose sites all point at `base`, with no pacing delays
pub fn config_for(
    base: &str,
    sites: &[&str],
    keywords: &[&str],
    pages: u32,
    dir: &TempDir,
) -> Config {
    let keywords = keywords
        .iter()
        .map(|k| format!("\"{k}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let sites = sites
        .iter()
        .map(|name| format!("[[site]]\nname = \"{name}\"\nbase-url = \"{base}\"\n"))
        .collect::<Vec<_>>()
        .join("\n");
    let db = dir.path().join("jobs.db");

    let toml = format!(
        r#"
[crawler]
keywords = [{keywords}]
pages-per-site = {pages}
politeness-delay-ms = 0
settle-delay-ms = 0
page-delay-ms = 0
fetch-timeout-secs = 5

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
database-path = "{db}"
export-dir = "{exports}"

{sites}
"#,
        db = db.display(),
        exports = dir.path().join("exports").display(),
    );

    parse_config(&toml).expect("test config should be valid")
}
