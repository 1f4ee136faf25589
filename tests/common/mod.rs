//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use smock::config::RouteConfig;
use smock::{HttpServer, MockConfig, Shutdown};

/// A running server with its own document root.
pub struct TestServer {
    pub addr: SocketAddr,
    pub root: TempDir,
    pub config: MockConfig,
    pub config_tx: mpsc::UnboundedSender<MockConfig>,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn write_document(&self, name: &str, document: Value) {
        write_document(self.root.path(), name, document);
    }

    pub fn read_document(&self, name: &str) -> Value {
        read_document(self.root.path(), name)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config rooted at `root` with the given routes.
pub fn config_for(root: &Path, routes: Vec<RouteConfig>, dynamic_route: bool) -> MockConfig {
    let mut config = MockConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.storage.db_root = root.to_string_lossy().into_owned();
    config.storage.dynamic_route = dynamic_route;
    config.routes = routes;
    config
}

/// Start a server on an ephemeral port over a fresh temporary root.
pub async fn start_server(routes: Vec<RouteConfig>, dynamic_route: bool) -> TestServer {
    let root = tempfile::tempdir().unwrap();
    let config = config_for(root.path(), routes, dynamic_route);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config.clone()).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    TestServer {
        addr,
        root,
        config,
        config_tx,
        shutdown,
    }
}

pub fn route(path: &str, method: &str, action: &str) -> RouteConfig {
    RouteConfig {
        path: path.into(),
        method: method.into(),
        action: action.into(),
        ..Default::default()
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

pub fn write_document(root: &Path, name: &str, document: Value) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, serde_json::to_vec(&document).unwrap()).unwrap();
}

pub fn read_document(root: &Path, name: &str) -> Value {
    let bytes = std::fs::read(root.join(name)).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
