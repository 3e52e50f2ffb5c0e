//! Integration tests for the download engine and HTTP client.
//!
//! These tests run the engine against a wiremock server and real temp
//! directories: cache hits, redirects, timeouts and failure isolation.

use std::path::Path;
use std::time::{Duration, Instant};

use stagepack_core::download::partial_path;
use stagepack_core::{
    ClientSettings, DownloadEngine, DownloadError, DownloadTask, HttpClient, Schedule,
};
use tempfile::TempDir;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::{PNG_BYTES, require_mock_server};

// ==================== Helper Functions ====================

fn client_for(server: &MockServer) -> Result<HttpClient, DownloadError> {
    client_with(server, Duration::from_secs(5), 5)
}

fn client_with(
    server: &MockServer,
    request_timeout: Duration,
    max_redirects: u32,
) -> Result<HttpClient, DownloadError> {
    HttpClient::with_settings(ClientSettings {
        base_url: server.uri(),
        request_timeout,
        max_redirects,
        ..ClientSettings::default()
    })
}

fn task(dir: &Path, remote_ref: &str, relative_path: &str) -> DownloadTask {
    let name = relative_path
        .rsplit('/')
        .next()
        .unwrap_or(relative_path)
        .to_string();
    DownloadTask {
        remote_ref: remote_ref.to_string(),
        relative_path: relative_path.to_string(),
        destination: dir.join(relative_path),
        name,
    }
}

async fn mount_png(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_BYTES))
        .mount(server)
        .await;
}

fn batched(concurrency: usize) -> Result<DownloadEngine, stagepack_core::EngineError> {
    DownloadEngine::new(concurrency, Duration::ZERO, Schedule::Batched)
}

// ==================== Tests ====================

#[tokio::test]
async fn test_engine_downloads_every_task() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = require_mock_server!();
    for name in ["Sword", "Bow", "Wand"] {
        mount_png(&mock_server, &format!("/images/{name}.png")).await;
    }

    let assets = TempDir::new()?;
    let tasks = vec![
        task(assets.path(), "/images/Sword.png", "pre-boss/melee/weapons/Sword.png"),
        task(assets.path(), "/images/Bow.png?hash=2", "pre-boss/ranged/weapons/Bow.png"),
        task(assets.path(), "/images/Wand.png", "pre-boss/magic/weapons/Wand.png"),
    ];

    let report = batched(2)?.run(&tasks, &client_for(&mock_server)?).await;

    assert_eq!(report.queued, 3);
    assert_eq!(report.downloaded, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(report.successful(), 3);
    for task in &tasks {
        assert_eq!(std::fs::read(&task.destination)?, PNG_BYTES);
        assert!(!partial_path(&task.destination).exists());
    }
    Ok(())
}

#[tokio::test]
async fn test_engine_existing_destinations_make_no_requests() -> Result<(), Box<dyn std::error::Error>>
{
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_BYTES))
        .expect(0)
        .mount(&mock_server)
        .await;

    let assets = TempDir::new()?;
    let tasks = vec![
        task(assets.path(), "/images/Sword.png", "pre-boss/melee/weapons/Sword.png"),
        task(assets.path(), "/images/Bow.png", "pre-boss/ranged/weapons/Bow.png"),
    ];
    for task in &tasks {
        std::fs::create_dir_all(task.destination.parent().ok_or("no parent")?)?;
        std::fs::write(&task.destination, b"already here")?;
    }

    let report = batched(5)?.run(&tasks, &client_for(&mock_server)?).await;

    assert_eq!(report.cached, 2);
    assert_eq!(report.downloaded, 0);
    assert_eq!(report.successful(), report.queued);
    assert_eq!(std::fs::read(&tasks[0].destination)?, b"already here");
    mock_server.verify().await;
    Ok(())
}

#[tokio::test]
async fn test_engine_one_failure_does_not_affect_group() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = require_mock_server!();
    for name in ["A", "B", "D", "E"] {
        mount_png(&mock_server, &format!("/images/{name}.png")).await;
    }
    Mock::given(method("GET"))
        .and(path("/images/C.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let assets = TempDir::new()?;
    let tasks: Vec<_> = ["A", "B", "C", "D", "E"]
        .iter()
        .map(|name| {
            task(
                assets.path(),
                &format!("/images/{name}.png"),
                &format!("endgame/mixed/accessories/{name}.png"),
            )
        })
        .collect();

    let report = batched(5)?.run(&tasks, &client_for(&mock_server)?).await;

    assert_eq!(report.downloaded, 4);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.name, "C.png");
    assert_eq!(failure.remote_ref, "/images/C.png");
    assert!(matches!(
        failure.error,
        DownloadError::HttpStatus { status: 404, .. }
    ));
    assert!(!tasks[2].destination.exists());
    assert!(tasks[4].destination.exists());
    Ok(())
}

#[tokio::test]
async fn test_engine_follows_redirect_keeping_destination() -> Result<(), Box<dyn std::error::Error>>
{
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/images/Old_Sword.png"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/images/New_Sword.png"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/New_Sword.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"moved content"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let assets = TempDir::new()?;
    let tasks = vec![task(
        assets.path(),
        "/images/Old_Sword.png",
        "pre-boss/melee/weapons/Old_Sword.png",
    )];

    let report = batched(1)?.run(&tasks, &client_for(&mock_server)?).await;

    assert_eq!(report.downloaded, 1);
    assert_eq!(report.redirects, 1);
    assert_eq!(std::fs::read(&tasks[0].destination)?, b"moved content");
    assert!(!assets.path().join("pre-boss/melee/weapons/New_Sword.png").exists());
    mock_server.verify().await;
    Ok(())
}

#[tokio::test]
async fn test_client_follows_relative_location_and_reports_final_url()
-> Result<(), Box<dyn std::error::Error>> {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/images/a/Bow.png"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "../b/Bow.png"))
        .mount(&mock_server)
        .await;
    mount_png(&mock_server, "/images/b/Bow.png").await;

    let dir = TempDir::new()?;
    let destination = dir.path().join("Bow.png");
    let outcome = client_for(&mock_server)?
        .download_to_file("/images/a/Bow.png", &destination)
        .await?;

    assert_eq!(outcome.redirects, 1);
    assert_eq!(outcome.final_url.path(), "/images/b/Bow.png");
    assert_eq!(outcome.bytes, PNG_BYTES.len() as u64);
    Ok(())
}

#[tokio::test]
async fn test_engine_redirect_loop_fails_after_bound() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/images/Loop.png"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/images/Loop.png"))
        .mount(&mock_server)
        .await;

    let assets = TempDir::new()?;
    let tasks = vec![task(assets.path(), "/images/Loop.png", "pre-golem/magic/armor/Loop.png")];
    let client = client_with(&mock_server, Duration::from_secs(5), 3)?;

    let report = batched(1)?.run(&tasks, &client).await;

    assert_eq!(report.failed, 1);
    assert!(matches!(
        report.failures[0].error,
        DownloadError::RedirectLoop { hops: 3, .. }
    ));
    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 4, "initial request plus three redirects");
    assert!(!tasks[0].destination.exists());
    Ok(())
}

#[tokio::test]
async fn test_engine_redirect_without_location_fails() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/images/Gone.png"))
        .respond_with(ResponseTemplate::new(301))
        .mount(&mock_server)
        .await;

    let assets = TempDir::new()?;
    let tasks = vec![task(assets.path(), "/images/Gone.png", "pre-lunar/ranged/weapons/Gone.png")];

    let report = batched(1)?.run(&tasks, &client_for(&mock_server)?).await;

    assert_eq!(report.failed, 1);
    assert!(matches!(
        report.failures[0].error,
        DownloadError::MissingLocation { status: 301, .. }
    ));
    Ok(())
}

#[tokio::test]
async fn test_engine_timeout_leaves_no_file() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/images/Slow.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(PNG_BYTES)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;
    mount_png(&mock_server, "/images/Fast.png").await;

    let assets = TempDir::new()?;
    let tasks = vec![
        task(assets.path(), "/images/Slow.png", "pre-moon-lord/summoner/weapons/Slow.png"),
        task(assets.path(), "/images/Fast.png", "pre-moon-lord/summoner/weapons/Fast.png"),
    ];
    let client = client_with(&mock_server, Duration::from_millis(300), 5)?;

    let report = batched(2)?.run(&tasks, &client).await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.downloaded, 1);
    assert!(matches!(
        report.failures[0].error,
        DownloadError::Timeout { .. }
    ));
    assert!(!tasks[0].destination.exists());
    assert!(!partial_path(&tasks[0].destination).exists());
    assert!(tasks[1].destination.exists());
    Ok(())
}

#[tokio::test]
async fn test_engine_batched_pauses_between_groups_only() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = require_mock_server!();
    for name in ["One", "Two"] {
        mount_png(&mock_server, &format!("/images/{name}.png")).await;
    }

    let assets = TempDir::new()?;
    let tasks: Vec<_> = ["One", "Two"]
        .iter()
        .map(|name| {
            task(
                assets.path(),
                &format!("/images/{name}.png"),
                &format!("pre-boss/melee/armor/{name}.png"),
            )
        })
        .collect();

    // Two groups of one: a single pause, none after the last group.
    let engine = DownloadEngine::new(1, Duration::from_millis(500), Schedule::Batched)?;
    let started = Instant::now();
    let report = engine.run(&tasks, &client_for(&mock_server)?).await;
    let elapsed = started.elapsed();

    assert_eq!(report.downloaded, 2);
    assert!(elapsed >= Duration::from_millis(500), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(900), "elapsed {elapsed:?}");
    Ok(())
}

#[tokio::test]
async fn test_engine_pool_keeps_requests_in_flight() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(PNG_BYTES)
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&mock_server)
        .await;

    let assets = TempDir::new()?;
    let tasks: Vec<_> = (1..=4)
        .map(|n| {
            task(
                assets.path(),
                &format!("/images/Item{n}.png"),
                &format!("endgame/melee/weapons/Item{n}.png"),
            )
        })
        .collect();

    let engine = DownloadEngine::new(4, Duration::from_secs(5), Schedule::Pool)?;
    let started = Instant::now();
    let report = engine.run(&tasks, &client_for(&mock_server)?).await;

    assert_eq!(report.downloaded, 4);
    // Sequential fetching would take at least 1.6s; the pool never pauses.
    assert!(started.elapsed() < Duration::from_millis(1_500));
    Ok(())
}

#[tokio::test]
async fn test_engine_never_exceeds_concurrency() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(PNG_BYTES)
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock_server)
        .await;
    let client = client_for(&mock_server)?;

    for schedule in [Schedule::Batched, Schedule::Pool] {
        let assets = TempDir::new()?;
        let tasks: Vec<_> = (1..=4)
            .map(|n| {
                task(
                    assets.path(),
                    &format!("/images/Slot{n}.png"),
                    &format!("pre-golem/ranged/weapons/Slot{n}.png"),
                )
            })
            .collect();

        // Four slow requests two at a time need two full rounds.
        let engine = DownloadEngine::new(2, Duration::ZERO, schedule)?;
        let started = Instant::now();
        let report = engine.run(&tasks, &client).await;
        let elapsed = started.elapsed();

        assert_eq!(report.downloaded, 4, "{schedule}");
        assert!(
            elapsed >= Duration::from_millis(600),
            "{schedule}: elapsed {elapsed:?}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_client_sends_browser_headers() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/images/Sword.png"))
        .and(header("DNT", "1"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept-language"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_BYTES))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new()?;
    client_for(&mock_server)?
        .download_to_file("/images/Sword.png", &dir.path().join("Sword.png"))
        .await?;

    mock_server.verify().await;
    Ok(())
}
