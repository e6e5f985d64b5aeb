// Common test utilities and fixtures for the integration suites

#![allow(dead_code)]

use cbx::{Callback, SpawnTimer, Timer};
use futures::future::BoxFuture;
use serde_json::{json, Value};

pub use cbx_test::{Recorder, Stub};

/// Timer on the ambient Tokio runtime, without relying on the `tokio` feature.
pub fn tokio_timer() -> impl Timer + Clone + Send + Sync + 'static {
    SpawnTimer::new(
        |fut: BoxFuture<'static, ()>| {
            tokio::spawn(fut);
        },
        tokio::time::sleep,
    )
}

/// Error type of the fixture services.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    Timeout,
    NotFound(u32),
    Other(String),
}

impl From<cbx::Error> for FetchError {
    fn from(err: cbx::Error) -> Self {
        match err {
            cbx::Error::FuseTimeout => FetchError::Timeout,
            other => FetchError::Other(other.to_string()),
        }
    }
}

/// Looks up a user record by id. Only ids 1 and 2 exist.
pub fn fetch_user(args: Vec<u32>, callback: Callback<Value, FetchError>) {
    match args.first().copied() {
        Some(1) => callback(Ok(json!({
            "id": 1,
            "profile": { "name": "Ada", "emails": ["ada@example.com"] },
        }))),
        Some(2) => callback(Ok(json!({ "id": 2, "profile": {} }))),
        Some(id) => callback(Err(FetchError::NotFound(id))),
        None => callback(Err(FetchError::Other("missing id".to_string()))),
    }
}
