//! Shared types for the load driver: errors, run configuration and the request schema

pub mod config;
pub mod duration;
pub mod schema;

pub use schema::ScoreRequest;

pub type Result<T> = core::result::Result<T, ScoreLoadError>;

#[derive(thiserror::Error, Debug)]
pub enum ScoreLoadError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid duration `{0}` (expected e.g. 200ms, 20s, 1m30s)")]
    InvalidDuration(String),
    #[error("invalid value for {key}: `{value}`")]
    InvalidValue { key: String, value: String },
    #[error("http client: {0}")]
    Client(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Message(String),
}
