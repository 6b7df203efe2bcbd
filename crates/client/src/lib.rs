//! HTTP client for the Agentic task-tracking platform.
//!
//! Provides the retrying transport, typed endpoint calls for the
//! project → product → spec → task hierarchy, and a TTL-throttled
//! connection probe.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod transport;
pub mod api;
pub mod probe;

pub use config::{
    ClientConfig, CredentialSource, EnvCredentials, StaticCredentials, DEFAULT_BASE_URL,
    DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT,
};
pub use error::{ApiError, ClientError, Result};
pub use transport::{ApiResponse, PlatformClient, USER_AGENT};
pub use api::DataEnvelope;
pub use probe::{ConnectionProbe, DEFAULT_PROBE_TTL};

pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;
