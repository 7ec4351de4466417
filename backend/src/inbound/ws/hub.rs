//! Open channels plus the subscription registry, and the fan-out over them.
//!
//! One [`TrackingHub`] exists per process and is shared by the HTTP and
//! WebSocket adapters. Each connection owns an unbounded outbox; publishing
//! only enqueues, and the connection task drains the outbox onto its socket.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, warn};

use crate::domain::ports::{LocationPublisher, PublishReport};
use crate::domain::{Location, UserId};
use crate::inbound::ws::messages::{LocationUpdated, ServerEvent};
use crate::inbound::ws::registry::{ChannelId, SubscriptionRegistry};

/// Serialised frames queued for one connection.
pub type Outbox = UnboundedReceiver<String>;

#[derive(Default)]
struct HubState {
    channels: BTreeMap<ChannelId, UnboundedSender<String>>,
    registry: SubscriptionRegistry,
}

/// Process-wide set of open channels and who they follow.
#[derive(Default)]
pub struct TrackingHub {
    state: Mutex<HubState>,
    next_id: AtomicU64,
}

impl TrackingHub {
    pub fn new() -> Self {
        Self::default()
    }

    // Every update is a single map operation; a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a channel and hand back its id and outbox.
    pub fn connect(&self) -> (ChannelId, Outbox) {
        let id = ChannelId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let (sender, outbox) = unbounded_channel();
        self.lock().channels.insert(id, sender);
        debug!(channel = %id, "channel opened");
        (id, outbox)
    }

    /// Close a channel and drop its subscription.
    pub fn disconnect(&self, channel: ChannelId) {
        let mut state = self.lock();
        state.channels.remove(&channel);
        state.registry.leave(channel);
        debug!(channel = %channel, "channel closed");
    }

    /// Follow `user_id` from `channel`, replacing any earlier subscription.
    pub fn join(&self, channel: ChannelId, user_id: UserId) {
        let previous = self.lock().registry.join(channel, user_id);
        debug!(channel = %channel, user_id = %user_id, previous = ?previous, "joined room");
    }

    pub fn leave(&self, channel: ChannelId) {
        self.lock().registry.leave(channel);
    }

    pub fn following(&self, channel: ChannelId) -> Option<UserId> {
        self.lock().registry.lookup(channel)
    }

    pub fn open_channels(&self) -> usize {
        self.lock().channels.len()
    }

    /// Queue `frame` on every open channel, counting room and global
    /// deliveries for `owner`. Channels whose connection is gone are pruned.
    fn fan_out(&self, owner: UserId, frame: &str) -> PublishReport {
        let mut report = PublishReport::default();
        let mut state = self.lock();
        let HubState { channels, registry } = &mut *state;
        channels.retain(|channel, sender| {
            if sender.send(frame.to_owned()).is_err() {
                registry.leave(*channel);
                return false;
            }
            if registry.follows(*channel, owner) {
                report.room += 1;
            } else {
                report.global += 1;
            }
            true
        });
        report
    }
}

impl LocationPublisher for TrackingHub {
    fn publish(&self, owner: UserId, location: &Location) -> PublishReport {
        let event = ServerEvent::LocationUpdated(LocationUpdated {
            user_id: owner,
            location: location.clone(),
        });
        let frame = match serde_json::to_string(&event) {
            Ok(frame) => frame,
            Err(error) => {
                warn!(error = %error, "failed to serialise location_updated");
                return PublishReport::default();
            }
        };
        let report = self.fan_out(owner, &frame);
        debug!(
            user_id = %owner,
            location_id = location.id,
            room = report.room,
            global = report.global,
            "location fanned out"
        );
        report
    }
}
