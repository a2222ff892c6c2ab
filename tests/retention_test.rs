//! Retention interplay with fetched content.

mod common;

use std::time::{Duration, SystemTime};

use common::{post_fetch, sample_video, FakeOutput, TestHarness};
use rarstream::retention::RetentionSweeper;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOUR: Duration = Duration::from_secs(3600);

#[tokio::test]
async fn swept_content_is_no_longer_streamable() {
    let remote = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"rar".to_vec()))
        .mount(&remote)
        .await;
    let (harness, addr) =
        TestHarness::with_server(FakeOutput::Files(vec![("episode1.mp4".into(), b"video".to_vec())]))
            .await;

    let resp = post_fetch(addr, &format!("{}/show.rar", remote.uri())).await;
    let json: serde_json::Value = resp.json().await.unwrap();
    let stream_url = format!("http://{addr}{}", json["stream_url"].as_str().unwrap());

    let sweeper = RetentionSweeper::new(harness.extract_dir(), HOUR);

    // Ten minutes in: still inside the window.
    let report = sweeper
        .sweep_at(SystemTime::now() + Duration::from_secs(10 * 60))
        .await
        .unwrap();
    assert_eq!(report.removed, 0);
    assert_eq!(report.retained, 1);
    assert_eq!(reqwest::get(&stream_url).await.unwrap().status(), 200);

    // Ninety minutes in: expired.
    let report = sweeper
        .sweep_at(SystemTime::now() + Duration::from_secs(90 * 60))
        .await
        .unwrap();
    assert_eq!(report.removed, 1);
    assert!(TestHarness::entries(&harness.extract_dir()).is_empty());

    let resp = reqwest::get(&stream_url).await.unwrap();
    assert_eq!(resp.status(), 404);
    assert!(resp.bytes().await.unwrap().is_empty());

    // Downloads are left alone unless configured.
    assert_eq!(TestHarness::entries(&harness.download_dir()).len(), 1);
}

#[tokio::test]
async fn download_sweeping_is_opt_in() {
    let harness = TestHarness::new(FakeOutput::Files(vec![]));
    std::fs::write(harness.download_dir().join("1-show.rar"), b"rar").unwrap();
    std::fs::create_dir(harness.extract_dir().join("1-show")).unwrap();

    let later = SystemTime::now() + 2 * HOUR;
    let report = RetentionSweeper::new(harness.extract_dir(), HOUR)
        .with_download_root(harness.download_dir())
        .sweep_at(later)
        .await
        .unwrap();

    assert_eq!(report.removed, 2);
    assert!(TestHarness::entries(&harness.download_dir()).is_empty());
    assert!(TestHarness::entries(&harness.extract_dir()).is_empty());
}

#[tokio::test]
async fn sweep_during_stream_keeps_server_available() {
    let harness = TestHarness::new(FakeOutput::Files(vec![]));
    let folder = harness.extract_dir().join("1-big");
    std::fs::create_dir_all(&folder).unwrap();
    std::fs::write(folder.join("movie.mkv"), sample_video(8 * 1024 * 1024)).unwrap();
    let addr = harness.serve().await;

    let resp = reqwest::get(format!("http://{addr}/stream/1-big/movie.mkv"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let report = RetentionSweeper::new(harness.extract_dir(), HOUR)
        .sweep_at(SystemTime::now() + 2 * HOUR)
        .await
        .unwrap();
    assert_eq!(report.removed, 1);
    assert!(!folder.exists());

    // The body may complete from the open handle or end early; either is fine.
    let _ = resp.bytes().await;

    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = reqwest::get(format!("http://{addr}/stream/1-big/movie.mkv"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
