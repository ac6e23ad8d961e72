//! Client configuration.

use std::time::Duration;

use url::Url;
use uuid::Uuid;

/// Configuration for a sync session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL, ws or wss scheme (e.g. "ws://127.0.0.1:3000")
    pub server_url: String,
    /// Document to join
    pub doc_id: String,
    /// Client identity, stable across reconnects within one session
    pub client_id: String,
    /// Quiet period before a local edit is sent
    pub debounce_window: Duration,
    /// Fixed delay between reconnect attempts
    pub reconnect_delay: Duration,
    /// Application-level keep-alive cadence
    pub keepalive_interval: Duration,
}

impl ClientConfig {
    /// Defaults everything except the server and document; the client id is
    /// a fresh UUID unless overridden.
    pub fn new(server_url: impl Into<String>, doc_id: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            doc_id: doc_id.into(),
            client_id: Uuid::new_v4().to_string(),
            debounce_window: Duration::from_millis(400),
            reconnect_delay: Duration::from_secs(2),
            keepalive_interval: Duration::from_secs(15),
        }
    }

    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    #[must_use]
    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    #[must_use]
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Full websocket URL with join parameters.
    pub(crate) fn ws_url(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.server_url)?;
        url.set_path("/ws");
        url.query_pairs_mut()
            .clear()
            .append_pair("docId", &self.doc_id)
            .append_pair("clientId", &self.client_id);
        Ok(url)
    }
}
