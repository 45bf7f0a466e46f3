#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::Value;

use benefits_api::auth::{generate_jwt, Claims, ADMIN_ROLE, USER_ROLE};

pub const JWT_SECRET: &str = "integration-test-secret";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // In-memory storage keeps the suite independent of a running PostgreSQL
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_benefits-api"));
        cmd.env("SERVER_HOST", "127.0.0.1")
            .env("PORT", port.to_string())
            .env("STORAGE_BACKEND", "memory")
            .env("JWT_SECRET", JWT_SECRET)
            .env_remove("CONFIG_PATH")
            .env_remove("APP_ENV")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Tests share one server, so each one works under its own user id and
/// tags its catalogue rows with a unique marker.
pub fn unique_user_id() -> i64 {
    (uuid::Uuid::new_v4().as_u128() >> 72) as i64
}

pub fn unique_marker() -> String {
    format!("t{}", uuid::Uuid::new_v4().simple())
}

pub fn user_token(user_id: i64) -> String {
    generate_jwt(&Claims::new(user_id, USER_ROLE, 1), JWT_SECRET).expect("sign user token")
}

pub fn admin_token() -> String {
    generate_jwt(&Claims::new(0, ADMIN_ROLE, 1), JWT_SECRET).expect("sign admin token")
}

/// Send a request and return the status with the parsed body (`Null` when empty)
pub async fn call(
    server: &TestServer,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let client = reqwest::Client::new();
    let mut request = client.request(method, format!("{}{}", server.base_url, path));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    let json = if text.is_empty() { Value::Null } else { serde_json::from_str(&text)? };
    Ok((status, json))
}

/// Create a filter definition through the admin API and return its id
pub async fn create_filter(server: &TestServer, name: &str, filter_type: &str, values: &[&str]) -> Result<i64> {
    let (status, body) = call(
        server,
        Method::POST,
        "/api/v1/admin/filters",
        Some(&admin_token()),
        Some(serde_json::json!({ "name": name, "type": filter_type, "values": values })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "create filter failed: {} {}", status, body);
    body["data"]["id"].as_i64().context("filter id missing")
}
