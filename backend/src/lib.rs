//! Fleet tracking backend library.
//!
//! Layout follows a hexagonal split: [`domain`] holds the model, use cases
//! and ports; [`inbound`] serves HTTP and WebSocket clients; [`outbound`]
//! implements storage, geocoding and credential adapters.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(test)]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI.
pub use doc::ApiDoc;
pub use middleware::Trace;
