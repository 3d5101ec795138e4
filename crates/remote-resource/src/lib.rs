//! Remote resource access for the portal sync layer.
//!
//! This crate provides:
//! - [`Transport`]: the GET/POST/DELETE seam to the backend (black box to the core)
//! - [`HttpTransport`]: reqwest implementation that unwraps the `{ "data": ... }` envelope
//! - [`RemoteResource`]: typed `fetch(key)` / `mutate(request)` boundary calls
//! - [`InMemoryTransport`]: scripted transport for tests and demos
//!
//! Nothing here caches, retries, or keeps state between calls. Every failure
//! is reported as a single [`TransportError`](portal_types::TransportError);
//! the caller decides the recovery policy.

mod http;
mod memory;
mod resource;
pub mod routes;
mod transport;

pub use http::{HttpTransport, HttpTransportConfig};
pub use memory::{Gate, InMemoryTransport};
pub use resource::RemoteResource;
pub use transport::{Method, Transport, TransportRequest, TransportResponse};
