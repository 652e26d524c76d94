//! HTTP transport for the QR API and asynchronous image loads

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::watch;
use url::Url;

/// Raw HTTP response from the QR API.
#[derive(Debug, Clone)]
pub struct Fetched {
    /// HTTP status code
    pub status: u16,
    /// `Content-Type` header, if present
    pub content_type: Option<String>,
    /// Response body
    pub body: Bytes,
}

impl Fetched {
    /// True for 2xx responses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything that can GET an image URL.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch the resource at `url`. Non-2xx responses are returned, not turned into errors.
    async fn fetch(&self, url: &Url) -> Result<Fetched>;
}

/// [`ImageSource`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: reqwest::Client,
}

impl HttpImageSource {
    /// Build a client sending the given `User-Agent`.
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &Url) -> Result<Fetched> {
        let resp = self.client.get(url.clone()).send().await?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().await?;

        tracing::debug!(%url, status, bytes = body.len(), "Fetched QR resource");
        Ok(Fetched {
            status,
            content_type,
            body,
        })
    }
}

/// Progress of an image load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Request still in flight
    Pending,
    /// Image bytes are available
    Loaded(Bytes),
    /// The load failed; the image shows as broken
    Failed(String),
}

impl LoadState {
    /// True once the load has finished, successfully or not.
    pub fn is_complete(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Handle to a fire-and-forget image load.
///
/// The load runs on its own task; [`ImageLoad::wait`] is the completion signal
/// consumers await instead of registering callbacks.
#[derive(Debug, Clone)]
pub struct ImageLoad {
    url: Url,
    rx: watch::Receiver<LoadState>,
}

impl ImageLoad {
    /// Start loading `url` in the background. Requires a tokio runtime.
    pub fn spawn(source: Arc<dyn ImageSource>, url: Url) -> Self {
        let (tx, rx) = watch::channel(LoadState::Pending);
        let task_url = url.clone();

        tokio::spawn(async move {
            let state = match source.fetch(&task_url).await {
                Ok(fetched) if fetched.is_success() => LoadState::Loaded(fetched.body),
                Ok(fetched) => LoadState::Failed(format!("HTTP status {}", fetched.status)),
                Err(err) => LoadState::Failed(err.to_string()),
            };

            match &state {
                LoadState::Loaded(body) => {
                    tracing::debug!(url = %task_url, bytes = body.len(), "Image loaded")
                }
                LoadState::Failed(reason) => {
                    tracing::warn!(url = %task_url, %reason, "Image failed to load")
                }
                LoadState::Pending => {}
            }

            // Nobody listening is fine; the result was superseded.
            let _ = tx.send(state);
        });

        Self { url, rx }
    }

    /// A load that has already finished with `state`.
    pub fn resolved(url: Url, state: LoadState) -> Self {
        let (_tx, rx) = watch::channel(state);
        Self { url, rx }
    }

    /// URL being loaded.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> LoadState {
        self.rx.borrow().clone()
    }

    /// True once the image bytes are available.
    pub fn is_loaded(&self) -> bool {
        matches!(*self.rx.borrow(), LoadState::Loaded(_))
    }

    /// True once the load has finished, successfully or not.
    pub fn is_complete(&self) -> bool {
        self.rx.borrow().is_complete()
    }

    /// Wait until the load finishes and return the final state.
    pub async fn wait(&self) -> LoadState {
        let mut rx = self.rx.clone();
        loop {
            {
                let current = rx.borrow_and_update();
                if current.is_complete() {
                    return current.clone();
                }
            }
            if rx.changed().await.is_err() {
                let last = rx.borrow().clone();
                if last.is_complete() {
                    return last;
                }
                return LoadState::Failed("image load abandoned".to_string());
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory [`ImageSource`] used across unit tests.

    use super::*;
    use crate::error::Error;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Scripted response for [`FakeSource`].
    #[derive(Debug, Clone)]
    pub enum Reply {
        Body(u16, Bytes),
        NetworkDown,
    }

    /// Serves a fixed reply, optionally holding it until released.
    pub struct FakeSource {
        reply: Mutex<Reply>,
        gate: Option<Arc<Notify>>,
        pub requests: Mutex<Vec<Url>>,
    }

    impl FakeSource {
        pub fn new(reply: Reply) -> Self {
            Self {
                reply: Mutex::new(reply),
                gate: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn gated(reply: Reply, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new(reply)
            }
        }

        pub fn set_reply(&self, reply: Reply) {
            *self.reply.lock().unwrap() = reply;
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ImageSource for FakeSource {
        async fn fetch(&self, url: &Url) -> Result<Fetched> {
            self.requests.lock().unwrap().push(url.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let reply = self.reply.lock().unwrap().clone();
            match reply {
                Reply::Body(status, body) => Ok(Fetched {
                    status,
                    content_type: None,
                    body,
                }),
                Reply::NetworkDown => Err(Error::Other("connection refused".to_string())),
            }
        }
    }
}
