#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use base64::Engine as _;
use reqwest::StatusCode;

static DEFAULT_SERVER: OnceLock<TestServer> = OnceLock::new();
static VERIFIED_SERVER: OnceLock<TestServer> = OnceLock::new();
static STATIC_SERVER: OnceLock<TestServer> = OnceLock::new();

/// Secret the development preset signs and verifies with.
pub const DEV_SECRET: &str = "crm-system";

/// Settings a developer might have exported; cleared so every server starts from its preset.
const ISOLATED_VARS: &[&str] = &[
    "GATE_LOGIN_PATH",
    "GATE_FALLBACK_HOME",
    "GATE_COOKIE_NAME",
    "GATE_PATH_MATCHING",
    "GATE_VERIFY_SIGNATURE",
    "GATE_ROUTES_FILE",
    "GATE_TRIGGER_PATTERNS",
    "GATE_TOKEN_SECRET",
    "API_STATIC_DIR",
    "PORT",
];

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
    static_dir: Option<tempfile::TempDir>,
}

impl TestServer {
    fn spawn(envs: &[(&str, &str)]) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_crm-gate"));
        for var in ISOLATED_VARS {
            cmd.env_remove(var);
        }
        cmd.env("APP_ENV", "development")
            .env("CRM_GATE_HOST", "127.0.0.1")
            .env("CRM_GATE_PORT", port.to_string())
            .envs(envs.iter().copied())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child, static_dir: None })
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

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}

/// Server with the development preset: unverified tokens, prefix matching.
pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = DEFAULT_SERVER.get_or_init(|| TestServer::spawn(&[]).expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Server that verifies token signatures and uses segment-aware matching.
pub async fn ensure_verified_server() -> Result<&'static TestServer> {
    let server = VERIFIED_SERVER.get_or_init(|| {
        TestServer::spawn(&[
            ("GATE_VERIFY_SIGNATURE", "true"),
            ("GATE_TOKEN_SECRET", DEV_SECRET),
            ("GATE_PATH_MATCHING", "segment"),
        ])
        .expect("failed to spawn server binary")
    });
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Server that serves pages from a temporary static directory instead of the placeholder.
pub async fn ensure_static_server() -> Result<&'static TestServer> {
    let server = STATIC_SERVER.get_or_init(|| {
        let dir = static_pages().expect("failed to write static pages");
        let root = dir.path().to_str().expect("utf-8 temp path").to_string();
        let mut server = TestServer::spawn(&[("API_STATIC_DIR", &root)]).expect("failed to spawn server binary");
        server.static_dir = Some(dir);
        server
    });
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// One `index.html` per dashboard area, each naming its own page.
fn static_pages() -> Result<tempfile::TempDir> {
    let dir = tempfile::tempdir()?;
    for page in ["dashboard", "agent"] {
        std::fs::create_dir_all(dir.path().join(page))?;
        std::fs::write(dir.path().join(page).join("index.html"), format!("<h1>{} page</h1>", page))?;
    }
    Ok(dir)
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client")
}

/// Three-segment token whose payload is `payload`, with a junk signature.
pub fn unsigned_token(payload: serde_json::Value) -> String {
    let body = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.{}.not-a-signature", body)
}

pub fn signed_token(role: &str) -> String {
    let claims = crm_gate::auth::Claims::new(role, 1).expect("claims");
    crm_gate::auth::issue_token(&claims, DEV_SECRET).expect("token")
}

pub async fn get_with_cookie(server: &TestServer, path: &str, token: Option<&str>) -> Result<reqwest::Response> {
    let mut request = client().get(server.url(path));
    if let Some(token) = token {
        request = request.header(reqwest::header::COOKIE, format!("token={}", token));
    }
    Ok(request.send().await?)
}

pub fn location(res: &reqwest::Response) -> Option<&str> {
    res.headers().get(reqwest::header::LOCATION).and_then(|v| v.to_str().ok())
}
