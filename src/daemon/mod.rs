//! Broker daemon: queue service, HTTP adapters and shutdown handling.

pub mod http;
pub mod services;
pub mod shutdown;
