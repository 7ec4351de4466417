//! Per-connection WebSocket handler.
//!
//! The loop multiplexes three sources: heartbeat ticks, client frames and the
//! connection's hub outbox. Clients are pinged every 5s and dropped after 10s
//! without traffic; tests shorten both intervals.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::time;
use tracing::{debug, info, warn};

use crate::domain::ports::{LocationIngest, LocationPublisher};
use crate::domain::{Actor, Error, TraceId};
use crate::inbound::http::error::public_view;
use crate::inbound::ws::hub::{Outbox, TrackingHub};
use crate::inbound::ws::messages::{ClientEvent, ServerEvent, UpdateLocation, UpdateLocationAck};
use crate::inbound::ws::registry::ChannelId;
use crate::inbound::ws::state::WsState;

#[cfg(not(test))]
pub(crate) const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
pub(crate) const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
pub(crate) const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
pub(crate) const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

pub(super) async fn handle_ws_session(
    state: WsState,
    actor: Actor,
    session: Session,
    stream: MessageStream,
) {
    let (channel, outbox) = state.hub.connect();
    let ws = WsSession {
        actor,
        channel,
        ingest: state.ingest,
        hub: state.hub,
    };
    ws.run(session, stream, outbox).await;
    ws.hub.disconnect(channel);
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    Detached,
    Network(Closed),
}

struct WsSession {
    actor: Actor,
    channel: ChannelId,
    ingest: Arc<dyn LocationIngest>,
    hub: Arc<TrackingHub>,
}

impl WsSession {
    async fn run(&self, mut session: Session, mut stream: MessageStream, mut outbox: Outbox) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    Self::handle_heartbeat_tick(&mut session, last_heartbeat).await
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message).await
                }
                frame = outbox.recv() => match frame {
                    Some(frame) => session.text(frame).await.map_err(SessionError::Network),
                    None => Err(SessionError::Detached),
                },
            };

            if let Err(error) = result {
                self.log_shutdown_reason(&error);
                if let CloseAction::Close(reason) = CloseAction::for_error(error)
                    && let Err(error) = session.close(reason).await
                {
                    debug!(error = %error, "WebSocket already closed");
                }
                return;
            }
        }
    }

    async fn handle_heartbeat_tick(
        session: &mut Session,
        last_heartbeat: Instant,
    ) -> Result<(), SessionError> {
        if last_heartbeat.elapsed() > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }
        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let message = message
            .ok_or(SessionError::StreamClosed)?
            .map_err(SessionError::Protocol)?;
        *last_heartbeat = Instant::now();
        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(SessionError::Network),
            Message::Text(text) => {
                let trace_id = TraceId::generate();
                TraceId::scope(trace_id, self.handle_text_message(session, text.as_ref())).await
            }
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    async fn handle_text_message(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<(), SessionError> {
        let event = ClientEvent::parse(text).map_err(|error| {
            warn!(error = %error, channel = %self.channel, "rejected malformed WebSocket frame");
            SessionError::InvalidPayload
        })?;
        match event {
            ClientEvent::JoinTracking(join) => {
                self.hub.join(self.channel, join.user_id);
                Ok(())
            }
            ClientEvent::LeaveTracking => {
                self.hub.leave(self.channel);
                Ok(())
            }
            ClientEvent::UpdateLocation(update) => {
                let ack = self.update_location(update).await;
                send_json(session, &ServerEvent::UpdateLocationAck(ack))
                    .await
                    .map_err(SessionError::Network)
            }
            ClientEvent::Unknown(name) => {
                debug!(event = %name, channel = %self.channel, "ignoring unknown event");
                Ok(())
            }
        }
    }

    async fn update_location(&self, update: UpdateLocation) -> UpdateLocationAck {
        if update.user_id != self.actor.id {
            return UpdateLocationAck::rejected(Error::forbidden(
                "cannot submit samples for another user",
            ));
        }
        match self.ingest.submit(update.user_id, update.location).await {
            Ok(location) => {
                let report = self.hub.publish(update.user_id, &location);
                debug!(
                    channel = %self.channel,
                    location_id = location.id,
                    deliveries = report.total(),
                    "update_location published"
                );
                UpdateLocationAck::accepted(location)
            }
            Err(error) => {
                debug!(code = ?error.code(), message = error.message(), "update_location rejected");
                UpdateLocationAck::rejected(public_view(&error).into_owned())
            }
        }
    }

    fn log_shutdown_reason(&self, error: &SessionError) {
        let channel = self.channel;
        match error {
            SessionError::HeartbeatTimeout => {
                warn!(channel = %channel, "WebSocket heartbeat timeout; closing connection");
            }
            SessionError::Protocol(error) => {
                warn!(channel = %channel, error = %error, "WebSocket protocol error");
            }
            SessionError::Network(error) => {
                warn!(channel = %channel, error = %error, "WebSocket send failed; closing connection");
            }
            SessionError::Detached => {
                warn!(channel = %channel, "channel detached from hub; closing connection");
            }
            SessionError::InvalidPayload
            | SessionError::ClientClosed(_)
            | SessionError::StreamClosed => {
                info!(channel = %channel, user_id = %self.actor.id, "WebSocket closed");
            }
        }
    }
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

impl CloseAction {
    fn with(code: CloseCode, description: &str) -> Self {
        Self::Close(Some(CloseReason {
            code,
            description: Some(description.to_owned()),
        }))
    }

    fn for_error(error: SessionError) -> Self {
        match error {
            SessionError::HeartbeatTimeout => Self::with(CloseCode::Normal, "heartbeat timeout"),
            SessionError::Protocol(_) => Self::with(CloseCode::Protocol, "protocol error"),
            SessionError::InvalidPayload => Self::with(CloseCode::Policy, "invalid payload"),
            SessionError::Detached => Self::with(CloseCode::Away, "server shutting down"),
            SessionError::ClientClosed(reason) => Self::Close(reason),
            SessionError::StreamClosed | SessionError::Network(_) => Self::None,
        }
    }
}

async fn send_json<T: serde::Serialize>(session: &mut Session, payload: &T) -> Result<(), Closed> {
    match serde_json::to_string(payload) {
        Ok(body) => session.text(body).await,
        Err(error) => {
            warn!(error = %error, "failed to serialise WebSocket payload");
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
