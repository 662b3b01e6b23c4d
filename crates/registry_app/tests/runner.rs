use pretty_assertions::assert_eq;
use registry_app::config::AppConfig;
use registry_app::runner::{run, RunSummary};
use registry_core::{SearchQuery, SiteConfig};
use registry_engine::{Crawler, FormSession, SessionSettings};
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    let page = format!(
        r#"<html><head><title>Registry</title></head><body><form method="post">
             <input type="hidden" name="__VIEWSTATE" value="vs" />{body}</form></body></html>"#
    );
    ResponseTemplate::new(200).set_body_raw(page, "text/html; charset=utf-8")
}

async fn registry() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/DB/Dog_Search"))
        .respond_with(html(""))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/DB/Dog_Search"))
        .respond_with(html(
            r#"<table class="mGrid">
                 <tr><th>Registered Name</th><th>Breeder</th></tr>
                 <tr><td><a href="Dog_Detail?DogID=5">Bear</a></td><td><a href="People_Detail?PID=9">J. Smith</a></td></tr>
                 <tr><td><a href="Dog_Detail?DogID=6">Honey</a></td><td><a href="People_Detail?PID=9">J. Smith</a></td></tr>
               </table>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/DB/Dog_Detail"))
        .respond_with(html(
            r#"<table><tr><td>Sex</td><td>Male</td></tr></table>"#,
        ))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn searches_and_details_are_written_as_json_lines() {
    registry_logging::initialize_for_tests();
    let server = registry().await;
    let site = SiteConfig {
        base_url: server.uri(),
        request_delay_ms: 0,
        retry_delay_ms: 0,
        ..SiteConfig::default()
    };
    let query = SearchQuery::DogsByBreeder("Smith".to_string());
    let config = AppConfig {
        site: site.clone(),
        searches: vec![query.clone(), query],
        follow_details: true,
    };
    let session = FormSession::new(SessionSettings::default()).expect("session");
    let mut crawler = Crawler::new(session, site);

    let mut out = Vec::new();
    let summary = run(&mut crawler, &config, &mut out).await.expect("run");

    assert_eq!(
        summary,
        RunSummary {
            searches: 2,
            failed_searches: 0,
            rows: 4,
            details: 2,
            failed_details: 0,
        }
    );

    let lines: Vec<Value> = String::from_utf8(out)
        .expect("utf8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 6);

    assert_eq!(lines[0]["record_type"], "search_row");
    assert_eq!(lines[0]["search"], "dogs bred by 'Smith'");
    assert_eq!(lines[0]["registered_name"], "Bear");
    assert_eq!(lines[0]["registered_name_link"], "Dog_Detail?DogID=5");
    assert!(lines[0]["scraped_at"]
        .as_str()
        .is_some_and(|stamp| chrono::DateTime::parse_from_rfc3339(stamp).is_ok()));

    let dogs: Vec<&Value> = lines
        .iter()
        .filter(|line| line["record_type"] == "dog")
        .collect();
    assert_eq!(dogs.len(), 2);
    assert_eq!(dogs[0]["bg_dog_id"], "5");
    assert_eq!(dogs[1]["bg_dog_id"], "6");
    assert_eq!(dogs[0]["sex"], "Male");
}

#[tokio::test]
async fn a_failing_search_does_not_stop_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let site = SiteConfig {
        base_url: server.uri(),
        request_delay_ms: 0,
        retry_delay_ms: 0,
        max_retries: 0,
        ..SiteConfig::default()
    };
    let config = AppConfig {
        site: site.clone(),
        searches: SearchQuery::people_by_initial("AB"),
        follow_details: false,
    };
    let session = FormSession::new(SessionSettings::default()).expect("session");
    let mut crawler = Crawler::new(session, site);

    let mut out = Vec::new();
    let summary = run(&mut crawler, &config, &mut out).await.expect("run");

    assert_eq!(summary.searches, 2);
    assert_eq!(summary.failed_searches, 2);
    assert!(out.is_empty());
}
