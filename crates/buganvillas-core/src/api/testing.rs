//! Scripted transport for exercising the gateway without a network.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::transport::{ApiRequest, ApiResponse, Transport};
use super::TransportError;

type Handler = dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync;

pub(crate) struct MockTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<ApiRequest>>,
    delay: Option<(String, Duration)>,
}

impl MockTransport {
    pub(crate) fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            delay: None,
        })
    }

    /// Delay responses for URLs ending in `path`
    pub(crate) fn with_delay(self: Arc<Self>, path: &str, delay: Duration) -> Arc<Self> {
        let mut this = Arc::try_unwrap(self).unwrap_or_else(|_| panic!("transport already shared"));
        this.delay = Some((path.to_string(), delay));
        Arc::new(this)
    }

    pub(crate) fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.url.ends_with(path))
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.calls.lock().unwrap().push(request.clone());
        if let Some((ref path, delay)) = self.delay {
            if request.url.ends_with(path.as_str()) {
                tokio::time::sleep(delay).await;
            }
        }
        (self.handler)(&request)
    }
}
