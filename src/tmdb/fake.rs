use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::client::{ApiError, CatalogApi, Params};

/// In-memory catalog for tests. Unknown endpoints answer with HTTP 404.
#[derive(Default)]
pub struct FakeApi {
    responses: HashMap<String, Result<Value, ApiError>>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<(String, Params)>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, endpoint: &str, body: Value) -> Self {
        self.responses.insert(endpoint.to_string(), Ok(body));
        self
    }

    pub fn fail(mut self, endpoint: &str, err: ApiError) -> Self {
        self.responses.insert(endpoint.to_string(), Err(err));
        self
    }

    pub fn delay(mut self, endpoint: &str, delay: Duration) -> Self {
        self.delays.insert(endpoint.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<(String, Params)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.calls().iter().filter(|(e, _)| e == endpoint).count()
    }
}

#[async_trait]
impl CatalogApi for FakeApi {
    async fn call(&self, endpoint: &str, params: Params) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push((endpoint.to_string(), params));

        if let Some(delay) = self.delays.get(endpoint) {
            tokio::time::sleep(*delay).await;
        }

        self.responses
            .get(endpoint)
            .cloned()
            .unwrap_or(Err(ApiError::Status(404)))
    }
}
