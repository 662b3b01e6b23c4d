use std::collections::VecDeque;

use pretty_assertions::assert_eq;
use registry_core::{RecordKind, SearchQuery, SiteConfig};
use registry_engine::{
    looks_stale, CrawlError, Crawler, Document, FailureKind, FormSession, PageSource, Record,
    SessionSettings, TransportError, EVENT_ARGUMENT, EVENT_TARGET, VIEW_STATE,
};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH: &str = "/DB/Dog_Search";

fn page(title: &str, view_state: &str, body: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head><body><form method="post">
             <input type="hidden" name="__VIEWSTATE" value="{view_state}" />
             <input type="hidden" name="__EVENTVALIDATION" value="ev-{view_state}" />
             {body}
           </form></body></html>"#
    )
}

fn results(names: &[&str], pager: &str) -> String {
    let rows: String = names
        .iter()
        .map(|name| format!("<tr><td>{name}</td><td>Smith</td></tr>"))
        .collect();
    format!(
        r#"<table class="mGrid"><tr><th>Registered Name</th><th>Breeder</th></tr>{rows}{pager}</table>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

fn record(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn site(server: &MockServer) -> SiteConfig {
    SiteConfig {
        base_url: server.uri(),
        request_delay_ms: 0,
        retry_delay_ms: 0,
        max_retries: 0,
        ..SiteConfig::default()
    }
}

fn crawler(site: SiteConfig) -> Crawler<FormSession> {
    registry_logging::initialize_for_tests();
    let session = FormSession::new(SessionSettings::default()).expect("session");
    Crawler::new(session, site)
}

async fn mount_once(server: &MockServer, verb: &str, route: &str, response: ResponseTemplate) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(response)
        .up_to_n_times(1)
        .mount(server)
        .await;
}

async fn count(server: &MockServer, verb: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method.as_str() == verb)
        .count()
}

#[tokio::test]
async fn search_follows_postback_pages_and_drops_duplicate_rows() {
    let server = MockServer::start().await;
    let next = r#"<tr class="pgr"><td><table><tr>
        <td><span>1</span></td>
        <td><a href="javascript:__doPostBack('ctl00$MainContent$gv','Page$2')">2</a></td>
        <td><a href="javascript:__doPostBack('ctl00$MainContent$gv','Page$Next')">Next</a></td>
      </tr></table></td></tr>"#;
    let last = r#"<tr class="pgr"><td><table><tr>
        <td><a href="javascript:__doPostBack('ctl00$MainContent$gv','Page$1')">1</a></td>
        <td><span>2</span></td>
      </tr></table></td></tr>"#;
    mount_once(&server, "GET", SEARCH, html(page("Dog Search", "vs0", ""))).await;
    mount_once(&server, "POST", SEARCH, html(page("Dog Search", "vs1", &results(&["Bear", "Honey"], next)))).await;
    mount_once(&server, "POST", SEARCH, html(page("Dog Search", "vs2", &results(&["Honey", "Moose"], last)))).await;

    let mut crawler = crawler(site(&server));
    let rows = crawler
        .search(&SearchQuery::DogsByBreeder("Smith".to_string()))
        .await
        .expect("search");

    assert_eq!(
        rows,
        vec![
            record(&[("registered_name", "Bear"), ("breeder", "Smith")]),
            record(&[("registered_name", "Honey"), ("breeder", "Smith")]),
            record(&[("registered_name", "Moose"), ("breeder", "Smith")]),
        ]
    );

    let posts: Vec<Vec<(String, String)>> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.method.as_str() == "POST")
        .map(|request| url::form_urlencoded::parse(&request.body).into_owned().collect())
        .collect();
    assert_eq!(posts.len(), 2);
    let value = |form: &[(String, String)], name: &str| {
        form.iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    };
    assert_eq!(value(&posts[0], "ctl00$MainContent$tb_Breeder").as_deref(), Some("Smith"));
    assert_eq!(value(&posts[0], VIEW_STATE).as_deref(), Some("vs0"));
    assert_eq!(value(&posts[1], EVENT_TARGET).as_deref(), Some("ctl00$MainContent$gv"));
    assert_eq!(value(&posts[1], EVENT_ARGUMENT).as_deref(), Some("Page$Next"));
    assert_eq!(value(&posts[1], VIEW_STATE).as_deref(), Some("vs1"));
}

#[tokio::test]
async fn stale_session_is_reset_and_the_search_restarted() {
    let server = MockServer::start().await;
    mount_once(&server, "GET", SEARCH, html(page("Session Redirect", "old", ""))).await;
    mount_once(&server, "GET", SEARCH, html(page("Dog Search", "vs0", ""))).await;
    mount_once(&server, "POST", SEARCH, html(page("Dog Search", "vs1", &results(&["Bear"], "")))).await;

    let mut crawler = crawler(site(&server));
    let rows = crawler
        .search(&SearchQuery::DogsByKennel("Bernwood".to_string()))
        .await
        .expect("search after reset");

    assert_eq!(rows, vec![record(&[("registered_name", "Bear"), ("breeder", "Smith")])]);
    assert_eq!(count(&server, "GET").await, 2);
}

#[tokio::test]
async fn a_second_stale_page_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .respond_with(html(page("Redirecting", "old", "")))
        .mount(&server)
        .await;

    let mut crawler = crawler(site(&server));
    let err = crawler
        .search(&SearchQuery::DogsByBreeder("Smith".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, CrawlError::StaleSession { .. }), "{err}");
}

#[tokio::test]
async fn transport_failures_are_retried_up_to_the_limit() {
    let server = MockServer::start().await;
    mount_once(&server, "GET", "/DB/People_Search", ResponseTemplate::new(503)).await;
    mount_once(&server, "GET", "/DB/People_Search", html(page("People Search", "vs0", ""))).await;
    mount_once(&server, "POST", "/DB/People_Search", html(page("People Search", "vs1", ""))).await;

    let mut retrying = crawler(SiteConfig {
        max_retries: 1,
        ..site(&server)
    });
    let rows = retrying
        .search(&SearchQuery::PeopleByState("CO".to_string()))
        .await
        .expect("search after retry");
    assert!(rows.is_empty());

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let err = crawler(site(&server))
        .search(&SearchQuery::PeopleByState("CO".to_string()))
        .await
        .unwrap_err();
    match err {
        CrawlError::Transport(err) => assert_eq!(err.kind, FailureKind::HttpStatus(503)),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn detail_pages_are_fetched_once_per_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/DB/Dog_Detail"))
        .and(query_param("DogID", "5"))
        .respond_with(html(page(
            "Dog Detail",
            "vs",
            r#"<span class="dogname">ALPENROSE'S BEAR</span>
               <span class="gridlbl">Sex:</span><span>Male</span>"#,
        )))
        .mount(&server)
        .await;

    let mut crawler = crawler(site(&server));
    let first = crawler
        .detail(RecordKind::Dog, "Dog_Detail?DogID=5")
        .await
        .expect("detail")
        .expect("new id");
    assert_eq!(first["bg_dog_id"], "5");
    assert_eq!(first["registered_name"], "ALPENROSE'S BEAR");
    assert_eq!(first["sex"], "Male");

    let again = crawler
        .detail_by_id(RecordKind::Dog, "5")
        .await
        .expect("detail");
    assert_eq!(again, None);
    assert_eq!(crawler.seen().count(RecordKind::Dog), 1);
    assert_eq!(count(&server, "GET").await, 1);
}

/// Serves scripted documents and records what was asked for.
struct ScriptedSource {
    pages: VecDeque<Document>,
    calls: Vec<String>,
}

#[async_trait::async_trait(?Send)]
impl PageSource for ScriptedSource {
    async fn fetch(
        &mut self,
        url: &str,
        _params: &[(String, String)],
    ) -> Result<Document, TransportError> {
        self.calls.push(format!("GET {url}"));
        Ok(self.pages.pop_front().expect("scripted page"))
    }

    async fn submit(
        &mut self,
        url: &str,
        _fields: &[(String, String)],
        _extra_headers: &[(String, String)],
    ) -> Result<Document, TransportError> {
        self.calls.push(format!("POST {url}"));
        Ok(self.pages.pop_front().expect("scripted page"))
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        self.calls.push("RESET".to_string());
        Ok(())
    }
}

#[tokio::test]
async fn a_repeating_next_link_ends_the_traversal() {
    let base = "https://registry.example";
    let search = Url::parse(&format!("{base}{SEARCH}")).unwrap();
    let pager = r#"<div class="pager"><span class="current">1</span><a href="Dog_Search?page=2">Next</a></div>"#;
    let results_page = Document::parse(
        search.clone(),
        &page("Dog Search", "vs", &format!("{}{pager}", results(&["Bear"], ""))),
    );
    let next_url = search.join("Dog_Search?page=2").unwrap();
    let source = ScriptedSource {
        pages: VecDeque::from(vec![
            Document::parse(search.clone(), &page("Dog Search", "vs", "")),
            results_page.clone(),
            Document::parse(next_url, &page("Dog Search", "vs", &format!("{}{pager}", results(&["Bear"], "")))),
        ]),
        calls: Vec::new(),
    };

    let mut crawler = Crawler::new(
        source,
        SiteConfig {
            base_url: base.to_string(),
            request_delay_ms: 0,
            ..SiteConfig::default()
        },
    );
    let rows = crawler
        .search(&SearchQuery::DogsByBreeder("Smith".to_string()))
        .await
        .expect("search");

    assert_eq!(rows, vec![record(&[("registered_name", "Bear"), ("breeder", "Smith")])]);
    assert_eq!(
        crawler.into_source().calls,
        vec![
            format!("GET {base}{SEARCH}"),
            format!("POST {base}{SEARCH}"),
            format!("GET {base}/DB/Dog_Search?page=2"),
        ]
    );
}

#[test]
fn landing_elsewhere_counts_as_stale() {
    let requested = Url::parse("https://registry.example/DB/Dog_Search").unwrap();
    let home = Document::parse(
        Url::parse("https://registry.example/Default").unwrap(),
        "<html><head><title>Home</title></head></html>",
    );
    let same = Document::parse(
        Url::parse("https://registry.example/db/dog_search").unwrap(),
        "<html><head><title>Dog Search</title></head></html>",
    );
    assert!(looks_stale(&requested, &home));
    assert!(!looks_stale(&requested, &same));
}
