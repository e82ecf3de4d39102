//! Server lifecycle: load the index, then serve it over HTTP.

use crate::config::ServerConfig;
use crate::http::{HttpServer, HttpServerError, QueryLimits};
use crate::metrics::QueryMetrics;
use d2v_index::{DocumentIndex, IndexError};
use std::net::SocketAddr;
use std::sync::Arc;

/// A loaded index plus the HTTP server in front of it.
pub struct Server {
    config: ServerConfig,
    index: Arc<DocumentIndex>,
    metrics: Arc<QueryMetrics>,
    http_server: Option<HttpServer>,
}

impl Server {
    /// Load the vectors file and build the index.
    ///
    /// Loading runs on the blocking pool; nothing is served until it is done.
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        tracing::info!(path = %config.vectors_path.display(), "Loading vectors");

        let path = config.vectors_path.clone();
        let options = config.load_options();
        let index = tokio::task::spawn_blocking(move || DocumentIndex::open(&path, &options))
            .await
            .map_err(|e| ServerError::Internal(format!("Index load task failed: {}", e)))??;

        let metrics = Arc::new(QueryMetrics::new());
        metrics.set_documents(index.len());

        Ok(Self {
            config,
            index: Arc::new(index),
            metrics,
            http_server: None,
        })
    }

    /// Start serving HTTP.
    pub async fn start(&mut self) -> Result<(), ServerError> {
        let addr: SocketAddr = self
            .config
            .http_addr
            .parse()
            .map_err(|e| ServerError::Config(format!("Invalid http_addr: {}", e)))?;

        let limits = QueryLimits {
            timeout: self.config.query_timeout(),
            default_page_size: self.config.default_page_size,
            max_page_size: self.config.max_page_size,
        };

        let mut http_server = HttpServer::new(
            addr,
            Arc::clone(&self.index),
            Arc::clone(&self.metrics),
            limits,
        );
        http_server.start().await?;
        self.http_server = Some(http_server);

        Ok(())
    }

    /// Address the HTTP server is bound to, once started.
    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http_server.as_ref().and_then(HttpServer::local_addr)
    }

    pub fn index(&self) -> &Arc<DocumentIndex> {
        &self.index
    }

    pub fn metrics(&self) -> &Arc<QueryMetrics> {
        &self.metrics
    }

    /// Stop the HTTP server, letting in-flight requests finish.
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(http_server) = self.http_server.take() {
            http_server.shutdown().await?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpServerError),

    #[error("Internal error: {0}")]
    Internal(String),
}
