use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

pub mod database;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub const API_PREFIX: &str = "/api/v1";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let upload_dir = std::env::temp_dir().join(format!("cdmis-api-test-{}", port));

        // Cargo builds the binary for integration tests and tells us where it is
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_cdmis-api"));
        cmd.arg("serve")
            .env("PORT", port.to_string())
            .env("API_PREFIX", API_PREFIX)
            .env("UPLOAD_DIR", &upload_dir)
            .env("BCRYPT_COST", "4")
            .env("DATABASE_CONNECTION_TIMEOUT", "3")
            .env("API_ENABLE_RATE_LIMITING", "false")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // DATABASE_URL is inherited (or read from .env by the server); without one
        // the server still starts and reports itself degraded
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        let url = self.url("/health");
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(&url).send().await {
                // Up once health answers, with or without a database
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// Absolute URL for a path under the API prefix.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(30)).await?;
    Ok(server)
}
