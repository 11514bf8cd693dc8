//! Failover router for a PRIMARY / SECONDARY replica pair.

pub mod clock;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod measurement;
pub mod observability;
pub mod order;
pub mod proxy;
pub mod resilience;
pub mod routing;
pub mod service;
pub mod state;

pub use config::schema::RouterConfig;
pub use error::{RouterError, UpstreamError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::Replica;
