//! Extraction tests: pairing, dedup, count invariant, failure isolation.

use std::sync::Arc;

use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{RegexScan, SourceScan, extract};
use crate::downloader::test_helpers::{RecordingSink, descriptor_json};
use crate::normalize::normalize;
use crate::types::SourceKind;

fn scan_for(server: &MockServer) -> RegexScan {
    RegexScan::new(
        SourceKind::CurrentBroadcast,
        Url::parse(&format!("{}/page/", server.uri())).unwrap(),
        r#"src="(img/[^"]+\.jpg)""#,
        r#"'(http://[^']+/desc/\d+\.js)'"#,
    )
    .unwrap()
}

async fn mount_page(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path("/page/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_descriptor(server: &MockServer, id: u32, unique: &str) {
    let body = format!(
        "$mediaObject.jsonpHelper.storeAndPlay({});",
        descriptor_json(unique, false, false)
    );
    Mock::given(method("GET"))
        .and(path(format!("/desc/{id}.js")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn pairs_images_with_descriptors_in_page_order() {
    let server = MockServer::start().await;
    let page = format!(
        r#"<img src="img/a.jpg"> '{0}/desc/1.js'
           <img src="img/b.jpg"> '{0}/desc/2.js'"#,
        server.uri()
    );
    mount_page(&server, page).await;
    mount_descriptor(&server, 1, "mdb-1").await;
    mount_descriptor(&server, 2, "mdb-2").await;

    let sink = RecordingSink::default();
    let client = reqwest::Client::new();
    let scan = scan_for(&server);
    let entries = extract(&scan, &client, &sink).await;

    assert_eq!(entries.len(), 2);
    assert!(entries[0].image.as_str().ends_with("/page/img/a.jpg"));
    assert_eq!(normalize(&entries[0].descriptor).unwrap().unique_id, "mdb-1");
    assert!(entries[1].image.as_str().ends_with("/page/img/b.jpg"));
    assert_eq!(normalize(&entries[1].descriptor).unwrap().unique_id, "mdb-2");
    assert!(sink.reports.lock().unwrap().is_empty());
}

#[tokio::test]
async fn repeated_image_fragments_are_deduplicated() {
    let server = MockServer::start().await;
    // The same image enumerated twice (one per title variant), one descriptor
    let page = format!(
        r#"<img src="img/a.jpg" title="x"> <img src="img/a.jpg" title="y"> '{}/desc/1.js'"#,
        server.uri()
    );
    mount_page(&server, page).await;
    mount_descriptor(&server, 1, "mdb-1").await;

    let sink = RecordingSink::default();
    let entries = extract(&scan_for(&server), &reqwest::Client::new(), &sink).await;

    assert_eq!(entries.len(), 1);
    assert!(sink.reports.lock().unwrap().is_empty());
}

#[tokio::test]
async fn count_mismatch_fails_the_source_without_guessing() {
    let server = MockServer::start().await;
    let page = format!(
        r#"<img src="img/a.jpg"> <img src="img/b.jpg"> <img src="img/c.jpg">
           '{0}/desc/1.js' '{0}/desc/2.js'"#,
        server.uri()
    );
    mount_page(&server, page).await;

    let sink = RecordingSink::default();
    let entries = extract(&scan_for(&server), &reqwest::Client::new(), &sink).await;

    assert!(entries.is_empty());
    let reports = sink.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0, "current-broadcast");
    assert!(reports[0].1.contains("3 image urls but 2 descriptor urls"));
}

#[tokio::test]
async fn unreachable_page_is_reported_and_yields_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sink = RecordingSink::default();
    let entries = extract(&scan_for(&server), &reqwest::Client::new(), &sink).await;

    assert!(entries.is_empty());
    assert_eq!(sink.reports.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn changed_envelope_format_fails_loudly() {
    let server = MockServer::start().await;
    let page = format!(r#"<img src="img/a.jpg"> '{}/desc/1.js'"#, server.uri());
    mount_page(&server, page).await;
    Mock::given(method("GET"))
        .and(path("/desc/1.js"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"someNewWrapper({"a": 1});"#),
        )
        .mount(&server)
        .await;

    let sink = RecordingSink::default();
    let entries = extract(&scan_for(&server), &reqwest::Client::new(), &sink).await;

    assert!(entries.is_empty());
    let reports = sink.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].1.contains("callback prefix"));
}

#[test]
fn builtin_scans_cover_all_sources() {
    for kind in SourceKind::ALL {
        let scan = RegexScan::for_kind(kind).unwrap();
        assert_eq!(scan.kind(), kind);
        assert!(scan.page_url().as_str().starts_with("https://"));
    }
}

#[test]
fn current_broadcast_patterns_match_page_markup() {
    let scan = RegexScan::current_broadcast().unwrap();
    let body = r#"
        <img src="/aktuelle-sendung/bild.jpg">
        <a href="aktuelle-sendung/startbild_100.jpg">x</a>
        <a href="aktuelle-sendung/startbild_100.jpg">x</a>
        <script>'https://cdn.example.net/deviceids/fsk0/123/1234567.js'</script>
    "#;
    // Captured fragments are relative to the page base; dedup keeps first-seen order
    assert_eq!(scan.image_urls(body), ["bild.jpg", "startbild_100.jpg"]);
    assert_eq!(
        scan.descriptor_urls(body),
        ["https://cdn.example.net/deviceids/fsk0/123/1234567.js"]
    );
}

#[test]
fn special_broadcast_pattern_strips_relative_prefix() {
    let scan = RegexScan::special_broadcast().unwrap();
    let body = r#"<img src="../../../extras/mausthemen/corona/imggen/thumb_100.jpg">"#;
    assert_eq!(scan.image_urls(body), ["imggen/thumb_100.jpg"]);
}

#[tokio::test]
async fn extract_accepts_trait_objects() {
    // New sources plug in behind the trait without touching pipeline logic
    struct EmptyScan(Url);
    impl SourceScan for EmptyScan {
        fn kind(&self) -> SourceKind {
            SourceKind::ThemedDigest
        }
        fn page_url(&self) -> &Url {
            &self.0
        }
        fn image_urls(&self, _body: &str) -> Vec<String> {
            Vec::new()
        }
        fn descriptor_urls(&self, _body: &str) -> Vec<String> {
            Vec::new()
        }
    }

    let server = MockServer::start().await;
    mount_page(&server, "<html></html>".to_string()).await;
    let scan = EmptyScan(Url::parse(&format!("{}/page/", server.uri())).unwrap());
    let sink = Arc::new(RecordingSink::default());

    let entries = extract(&scan, &reqwest::Client::new(), sink.as_ref()).await;
    assert!(entries.is_empty());
    assert!(sink.reports.lock().unwrap().is_empty());
}
