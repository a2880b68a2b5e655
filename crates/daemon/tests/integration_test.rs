//! Integration tests for server startup and the full sign-in flow

use larkauth_daemon::config::ServerConfig;
use larkauth_daemon::{RunningServer, ServerBuilder, Settings};
use larkauth_http::LarkConfig;
use reqwest::{StatusCode, redirect::Policy};
use serde_json::{Value, json};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INDEX_HTML: &str = "<!doctype html><title>larkauth widget</title>";

/// Create test settings
fn test_settings(lark_uri: &str, static_dir: &Path) -> Settings {
    Settings {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            static_dir: static_dir.to_path_buf(),
            frontend_port: 0,
            frontend_enabled: true,
        },
        lark: LarkConfig {
            app_id: "cli_test".to_string(),
            app_secret: "secret".to_string(),
            api_base_url: lark_uri.to_string(),
            auth_base_url: "https://accounts.example.com/open-apis".to_string(),
            redirect_uri: "http://127.0.0.1/api/auth/user/lark/callback".to_string(),
            timeout_seconds: 5,
        },
        ..Settings::default()
    }
}

async fn mount_lark(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/v3/app_access_token/internal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "app_access_token": "a-app-token"
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/authen/v1/oidc/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {
                "access_token": "u-access",
                "refresh_token": "ur-refresh",
                "token_type": "Bearer",
                "expires_in": 7200,
                "refresh_expires_in": 2_592_000
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/authen/v1/oidc/refresh_access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {"access_token": "u-access-2", "refresh_token": "ur-refresh-2"}
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/authen/v1/user_info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "avatar_url": "https://example.com/ada.png",
                "open_id": "ou_123",
                "union_id": "on_456"
            }
        })))
        .mount(server)
        .await;
}

/// Helper to start a test server against a mocked Lark
async fn start_test_server(lark: &MockServer, static_dir: &Path) -> RunningServer {
    ServerBuilder::new(test_settings(&lark.uri(), static_dir))
        .start()
        .await
        .expect("server should start")
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_full_login_flow() {
    let lark = MockServer::start().await;
    mount_lark(&lark).await;
    let static_dir = tempfile::tempdir().unwrap();
    let server = start_test_server(&lark, static_dir.path()).await;
    let base = format!("http://{}", server.api_addr);
    let client = client();

    // Login redirects to Lark
    let response = client
        .get(format!("{base}/api/auth/user/lark/login"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.starts_with("https://accounts.example.com/open-apis/authen/v1/authorize"));

    // Callback completes the login
    let response = client
        .get(format!("{base}/api/auth/user/lark/callback?code=auth-code"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()["location"].to_str().unwrap().to_string();
    let user_id = location
        .strip_prefix("/static/login-success.html?userId=")
        .expect("redirect to the success page");

    // The widget fetches the session
    let session: Value = client
        .get(format!("{base}/api/user/{user_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["user"]["name"], "Ada Lovelace");
    assert_eq!(session["user"]["open_id"], "ou_123");
    assert_eq!(session["auth"]["access_token"], "u-access");

    // And later refreshes it
    let tokens: Value = client
        .post(format!("{base}/api/auth/user/lark/refresh"))
        .json(&json!({"refresh_token": session["auth"]["refresh_token"]}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tokens["access_token"], "u-access-2");
    assert_eq!(tokens["token_type"], "Bearer");

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_static_and_frontend_serving() {
    let lark = MockServer::start().await;
    let static_dir = tempfile::tempdir().unwrap();
    std::fs::write(static_dir.path().join("index.html"), INDEX_HTML).unwrap();

    let server = start_test_server(&lark, static_dir.path()).await;
    let client = client();

    // Client-side routes fall back to index.html on both listeners
    let api = format!("http://{}", server.api_addr);
    let body = client
        .get(format!("{api}/static/login-success.html"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, INDEX_HTML);

    let frontend = format!("http://{}", server.frontend_addr.expect("frontend listener"));
    for page in ["/", "/index.html", "/login-success.html"] {
        let response = client.get(format!("{frontend}{page}")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{page}");
        assert_eq!(response.text().await.unwrap(), INDEX_HTML);
    }

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_health_docs_and_cors() {
    let lark = MockServer::start().await;
    let static_dir = tempfile::tempdir().unwrap();
    let server = start_test_server(&lark, static_dir.path()).await;
    let base = format!("http://{}", server.api_addr);
    let client = client();

    let response = client
        .get(format!("{base}/health"))
        .header("origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let health: Value = response.json().await.unwrap();
    assert_eq!(health["status"], "healthy");

    let response = client.get(format!("{base}/docs/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_lark_outage_is_service_unavailable() {
    let lark = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v3/app_access_token/internal"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&lark)
        .await;

    let static_dir = tempfile::tempdir().unwrap();
    let server = start_test_server(&lark, static_dir.path()).await;

    let response = client()
        .get(format!(
            "http://{}/api/auth/user/lark/callback?code=abc",
            server.api_addr
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Failed to communicate with Lark API");

    server.shutdown().await.unwrap();
}
