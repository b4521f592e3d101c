//! End-to-end smoke runs against mock HTTP servers.
//!
//! Each test stands up its own mockito servers for the API and dashboard, runs
//! the full check sequence into a buffer, and inspects the printed report and
//! the returned summary.
//!
//! Run with: cargo test --test smoke_run
use std::time::Duration;

use mockito::{Mock, Server, ServerGuard};
use smokecheck::config::SmokeConfig;
use smokecheck::{run, CheckError, CheckOutcome, CheckResult, Endpoint, EndpointChecker, RunSummary};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};

fn config(api_url: &str, dashboard_url: &str, auth_mode: &str) -> SmokeConfig {
    SmokeConfig {
        api_url: api_url.to_string(),
        dashboard_url: dashboard_url.to_string(),
        auth_mode: auth_mode.to_string(),
        timeout: Duration::from_secs(5),
        ..SmokeConfig::default()
    }
}

async fn smoke(config: &SmokeConfig) -> (RunSummary, String) {
    colored::control::set_override(false);
    let checker = EndpointChecker::new(config.timeout).expect("client should build");
    let mut out = Vec::new();
    let summary = run(config, &checker, &mut out)
        .await
        .expect("writing to a buffer cannot fail");
    (summary, String::from_utf8(out).expect("report is utf-8"))
}

async fn mock_get(server: &mut ServerGuard, path: &str, status: usize, body: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

/// A base URL on a port nothing is listening on.
async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// A listener whose accept queue is full, so further connects never complete.
/// The queued streams must stay alive for the duration of the test.
async fn stalled_listener() -> (TcpListener, Vec<TcpStream>, String) {
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(0).unwrap();
    let addr = listener.local_addr().unwrap();

    let mut queued = Vec::new();
    for _ in 0..16 {
        match tokio::time::timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => queued.push(stream),
            _ => break,
        }
    }

    (listener, queued, format!("http://{}", addr))
}

/// Serves `/hop/0` .. `/hop/{hops}`, sleeping `delay` before every response.
/// Each hop but the last redirects to the next one.
async fn slow_redirect_chain(hops: usize, delay: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let request = String::from_utf8_lossy(&request);
                let hop: usize = request
                    .split_whitespace()
                    .nth(1)
                    .and_then(|path| path.strip_prefix("/hop/"))
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(hops);

                tokio::time::sleep(delay).await;
                let response = if hop < hops {
                    format!(
                        "HTTP/1.1 302 Found\r\nLocation: /hop/{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                        hop + 1
                    )
                } else {
                    "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok".to_string()
                };
                let _ = socket.write_all(response.as_bytes()).await;
            });
        }
    });

    format!("http://{}/hop/0", addr)
}

#[tokio::test]
async fn test_all_endpoints_healthy() {
    let mut api = Server::new_async().await;
    let mut dashboard = Server::new_async().await;

    let health = mock_get(&mut api, "/health", 200, r#"{"status":"ok"}"#).await;
    let root = mock_get(&mut api, "/", 200, "{}").await;
    let workspaces = mock_get(&mut api, "/api/workspaces", 200, "[]").await;
    let dash = mock_get(&mut dashboard, "/", 200, "<html></html>").await;

    let config = config(&api.url(), &dashboard.url(), "multi-tenant");
    let (summary, text) = smoke(&config).await;

    health.assert_async().await;
    root.assert_async().await;
    workspaces.assert_async().await;
    dash.assert_async().await;

    assert_eq!(summary.exit_status(), 0);
    assert_eq!(summary.passed(), 4);
    assert_eq!(summary.total(), 4);
    assert!(text.contains("Total: 4/4 tests passed"));
    assert!(text.contains("✅ API Health: {\n  \"status\": \"ok\"\n}"));
    assert!(!text.contains("Testing API Health"));
    assert!(text.contains(&format!("Testing Workspaces API: {}/api/workspaces", api.url())));
    assert!(text.contains("2. Multi-Tenant Endpoints"));
    assert!(text.contains("All tests passed! Deployment is operational."));
}

#[tokio::test]
async fn test_dashboard_server_error_fails_run() {
    let mut api = Server::new_async().await;
    let mut dashboard = Server::new_async().await;

    let _health = mock_get(&mut api, "/health", 200, r#"{"status":"ok"}"#).await;
    let _root = mock_get(&mut api, "/", 200, "{}").await;
    let _workspaces = mock_get(&mut api, "/api/workspaces", 200, "[]").await;
    let _dash = mock_get(&mut dashboard, "/", 500, "boom").await;

    let config = config(&api.url(), &dashboard.url(), "multi-tenant");
    let (summary, text) = smoke(&config).await;

    assert_eq!(summary.exit_status(), 1);
    assert_eq!(
        summary.results(),
        &[
            CheckResult::new("API Health", true),
            CheckResult::new("API Root", true),
            CheckResult::new("Dashboard", false),
            CheckResult::new("Workspaces", true),
        ]
    );
    assert!(text.contains("  ❌ Failed (HTTP 500)"));
    assert!(text.contains("  Dashboard: ❌ FAIL"));
    assert!(text.contains("Total: 3/4 tests passed"));
    assert!(text.contains("Troubleshooting:"));
}

#[tokio::test]
async fn test_unreachable_api_does_not_stop_dashboard_check() {
    let mut dashboard = Server::new_async().await;
    let dash = mock_get(&mut dashboard, "/", 200, "<html></html>").await;

    let api_url = closed_port_url().await;
    let config = config(&api_url, &dashboard.url(), "single-tenant");
    let (summary, text) = smoke(&config).await;

    dash.assert_async().await;
    assert_eq!(
        summary.results(),
        &[
            CheckResult::new("API Health", false),
            CheckResult::new("API Root", false),
            CheckResult::new("Dashboard", true),
        ]
    );
    assert_eq!(text.matches("❌ Connection failed").count(), 2);
    assert!(text.contains("Total: 1/3 tests passed"));
    assert_eq!(summary.exit_status(), 1);
}

#[tokio::test]
async fn test_single_tenant_skips_workspaces() {
    let mut api = Server::new_async().await;
    let mut dashboard = Server::new_async().await;

    let _health = mock_get(&mut api, "/health", 200, r#"{"status":"ok"}"#).await;
    let _root = mock_get(&mut api, "/", 200, "{}").await;
    let workspaces = api
        .mock("GET", "/api/workspaces")
        .expect(0)
        .create_async()
        .await;
    let _dash = mock_get(&mut dashboard, "/", 200, "<html></html>").await;

    let config = config(&api.url(), &dashboard.url(), "single-tenant");
    let (summary, text) = smoke(&config).await;

    workspaces.assert_async().await;
    assert_eq!(summary.total(), 3);
    assert!(summary.results().iter().all(|r| r.name != "Workspaces"));
    assert!(!text.contains("Multi-Tenant Endpoints"));
    assert!(text.contains("Total: 3/3 tests passed"));
    assert_eq!(summary.exit_status(), 0);
}

#[tokio::test]
async fn test_non_json_health_falls_back_to_status() {
    let mut api = Server::new_async().await;
    let mut dashboard = Server::new_async().await;

    let _health = mock_get(&mut api, "/health", 200, "OK").await;
    let _root = mock_get(&mut api, "/", 200, "{}").await;
    let _dash = mock_get(&mut dashboard, "/", 200, "<html></html>").await;

    let config = config(&api.url(), &dashboard.url(), "single-tenant");
    let (summary, text) = smoke(&config).await;

    assert!(summary.all_passed());
    assert!(!text.contains("✅ API Health:"));
    assert!(text.contains(&format!("Testing API Health: {}/health", api.url())));
    assert!(text.contains("  ✅ Success (HTTP 200)"));
}

#[tokio::test]
async fn test_unhealthy_status_fails_health_check() {
    let mut api = Server::new_async().await;
    let mut dashboard = Server::new_async().await;

    let _health = mock_get(&mut api, "/health", 503, r#"{"status":"down"}"#).await;
    let _root = mock_get(&mut api, "/", 304, "").await;
    let _dash = mock_get(&mut dashboard, "/", 200, "<html></html>").await;

    let config = config(&api.url(), &dashboard.url(), "single-tenant");
    let (summary, text) = smoke(&config).await;

    assert_eq!(summary.results()[0], CheckResult::new("API Health", false));
    assert_eq!(summary.results()[1], CheckResult::new("API Root", true));
    assert!(text.contains("  ❌ Failed (HTTP 503)"));
    assert!(text.contains("  ✅ OK (HTTP 304)"));
    assert!(!text.contains("\"down\""));
}

#[tokio::test]
async fn test_redirects_are_followed() {
    let mut api = Server::new_async().await;
    let mut dashboard = Server::new_async().await;

    let _health = mock_get(&mut api, "/health", 200, r#"{"status":"ok"}"#).await;
    let _root = mock_get(&mut api, "/", 200, "{}").await;
    let _redirect = dashboard
        .mock("GET", "/")
        .with_status(302)
        .with_header("location", "/login")
        .create_async()
        .await;
    let login = mock_get(&mut dashboard, "/login", 200, "<html></html>").await;

    let config = config(&api.url(), &dashboard.url(), "single-tenant");
    let (summary, _text) = smoke(&config).await;

    login.assert_async().await;
    assert!(summary.all_passed());
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept connections and hold them open without ever answering.
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let mut dashboard = Server::new_async().await;
    let _dash = mock_get(&mut dashboard, "/", 200, "<html></html>").await;

    let mut config = config(&format!("http://{}", addr), &dashboard.url(), "single-tenant");
    config.timeout = Duration::from_millis(300);
    let (summary, text) = smoke(&config).await;

    assert_eq!(text.matches("❌ Timeout after 0.3s").count(), 2);
    assert_eq!(summary.passed(), 1);
    assert_eq!(summary.exit_status(), 1);
}

#[tokio::test]
async fn test_stalled_connect_is_connection_failure() {
    let (_listener, _queued, url) = stalled_listener().await;

    let checker = EndpointChecker::new(Duration::from_millis(500)).unwrap();
    let outcome = checker.check(&Endpoint::new("Stalled", url)).await;

    match outcome {
        CheckOutcome::Error(err @ CheckError::Connection(_)) => {
            assert_eq!(err.to_string(), "Connection failed");
        }
        other => panic!("expected connection failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_applies_per_hop_not_per_chain() {
    // Three slow hops add up to more than the timeout, but no single read does.
    let url = slow_redirect_chain(3, Duration::from_millis(400)).await;

    let checker = EndpointChecker::new(Duration::from_secs(1)).unwrap();
    let outcome = checker.check(&Endpoint::new("Slow", url)).await;

    assert!(
        matches!(outcome, CheckOutcome::Status { code: 200, .. }),
        "expected 200 after redirects, got {:?}",
        outcome
    );
}
