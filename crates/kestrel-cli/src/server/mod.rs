//! HTTP server startup and graceful shutdown.

mod http_server;
mod lifecycle;
mod shutdown;

pub use http_server::serve;
