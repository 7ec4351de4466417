//! Shared WebSocket adapter state.
//!
//! Connections depend on driving ports and the process-wide [`TrackingHub`]
//! only, so the session loop can run against test doubles.

use std::sync::Arc;

use crate::domain::ports::{Accounts, LocationIngest};
use crate::inbound::ws::hub::TrackingHub;
use crate::inbound::ws::origins::AllowedOrigins;

/// Dependency bundle for the `/ws` endpoint and its sessions.
#[derive(Clone)]
pub struct WsState {
    pub accounts: Arc<dyn Accounts>,
    pub ingest: Arc<dyn LocationIngest>,
    pub hub: Arc<TrackingHub>,
    pub origins: AllowedOrigins,
}

impl WsState {
    pub fn new(
        accounts: Arc<dyn Accounts>,
        ingest: Arc<dyn LocationIngest>,
        hub: Arc<TrackingHub>,
        origins: AllowedOrigins,
    ) -> Self {
        Self {
            accounts,
            ingest,
            hub,
            origins,
        }
    }
}
