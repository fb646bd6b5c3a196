//! HTTP access to the distribution server.

use tokio::runtime::Runtime;

use crate::error::FetchError;

/// Body and metadata of a successful GET.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub body: String,
    /// Raw `Last-Modified` header value, if the server sent one.
    pub last_modified: Option<String>,
}

/// Blocking GET access to the remote catalog.
pub trait CatalogTransport {
    fn get(&self, url: &str) -> Result<TransportResponse, FetchError>;
}

/// `reqwest` client driven on a private tokio runtime.
pub struct HttpTransport {
    client: reqwest::Client,
    runtime: Runtime,
}

impl HttpTransport {
    pub fn new() -> Result<Self, FetchError> {
        let runtime = Runtime::new().map_err(FetchError::Runtime)?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("shared-stack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client, runtime })
    }

    async fn fetch(&self, url: &str) -> Result<TransportResponse, FetchError> {
        let transport_error = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let last_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(transport_error)?;

        Ok(TransportResponse {
            body,
            last_modified,
        })
    }
}

impl CatalogTransport for HttpTransport {
    fn get(&self, url: &str) -> Result<TransportResponse, FetchError> {
        tracing::debug!(url, "GET");
        self.runtime.block_on(self.fetch(url))
    }
}
