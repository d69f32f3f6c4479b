//! Parley served from an ephemeral port

use std::net::SocketAddr;

use parley_config::Config;
use parley_server::Server;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Live Parley instance, stopped on drop
pub struct TestServer {
    addr: SocketAddr,
    client: reqwest::Client,
    stop: CancellationToken,
}

impl TestServer {
    /// Build the router from `config` and serve it on `127.0.0.1:0`
    ///
    /// The configured listen address is ignored.
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let router = Server::new(&config)?.into_router();

        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;

        let stop = CancellationToken::new();
        let stopped = stop.clone().cancelled_owned();

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).with_graceful_shutdown(stopped).await {
                eprintln!("test server failed: {e}");
            }
        });

        Ok(Self {
            addr,
            client: reqwest::Client::new(),
            stop,
        })
    }

    /// Absolute URL for `path`
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// POST `body` as JSON without credentials
    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("request reaches the test server")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}
