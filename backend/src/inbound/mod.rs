//! Inbound adapters translating external requests into driving-port calls.
//!
//! [`http`] serves the REST API and probes; [`ws`] serves the live tracking
//! channel. Both share the process-wide tracking hub.

pub mod http;
pub mod ws;
