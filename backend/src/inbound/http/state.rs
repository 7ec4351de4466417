//! Shared HTTP adapter state.
//!
//! Handlers receive this through `actix_web::web::Data` so they depend only on
//! domain ports and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{Accounts, LocationIngest, LocationPublisher, LocationQuery};

/// Dependency bundle for HTTP handlers.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
///
/// use fleet_tracker::domain::ports::{Accounts, LocationIngest, LocationQuery};
/// use fleet_tracker::domain::ports::FixtureLocationPublisher;
/// use fleet_tracker::inbound::http::state::HttpState;
///
/// fn build(
///     accounts: Arc<dyn Accounts>,
///     ingest: Arc<dyn LocationIngest>,
///     locations: Arc<dyn LocationQuery>,
/// ) -> HttpState {
///     HttpState::new(accounts, ingest, locations, Arc::new(FixtureLocationPublisher))
/// }
/// ```
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn Accounts>,
    pub ingest: Arc<dyn LocationIngest>,
    pub locations: Arc<dyn LocationQuery>,
    pub publisher: Arc<dyn LocationPublisher>,
}

impl HttpState {
    pub fn new(
        accounts: Arc<dyn Accounts>,
        ingest: Arc<dyn LocationIngest>,
        locations: Arc<dyn LocationQuery>,
        publisher: Arc<dyn LocationPublisher>,
    ) -> Self {
        Self {
            accounts,
            ingest,
            locations,
            publisher,
        }
    }
}
