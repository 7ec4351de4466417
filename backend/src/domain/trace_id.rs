//! Correlation identifiers for HTTP requests and WebSocket frames.
//!
//! The identifier for the unit of work in progress sits in a Tokio
//! task-local, so errors built deep inside a service pick it up through
//! [`TraceId::current`]. Spawned tasks start without one; run them through
//! [`TraceId::scope`] when correlation matters.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

/// Header echoing the identifier on every HTTP response.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    static CURRENT: TraceId;
}

/// Identifier correlating log lines and error payloads of one request.
///
/// Rendered as a hyphenated UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reuse a caller-supplied identifier when it is a well-formed UUID,
    /// otherwise start a new one.
    ///
    /// Proxies and clients may send `trace-id` to stitch their own logs to
    /// ours; anything unparsable is ignored rather than rejected.
    ///
    /// ```
    /// use fleet_tracker::domain::TraceId;
    ///
    /// let supplied = "0f8fad5b-d9cb-469f-a165-70867728950e";
    /// assert_eq!(TraceId::adopt_or_generate(Some(supplied)).to_string(), supplied);
    /// assert_ne!(TraceId::adopt_or_generate(Some("junk")).to_string(), "junk");
    /// ```
    #[must_use]
    pub fn adopt_or_generate(supplied: Option<&str>) -> Self {
        supplied
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or_else(Self::generate)
    }

    /// Identifier of the enclosing scope, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    /// Drive `work` with `id` visible through [`TraceId::current`].
    pub async fn scope<F>(id: Self, work: F) -> F::Output
    where
        F: Future,
    {
        CURRENT.scope(id, work).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.as_hyphenated().fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::try_parse(raw).map(Self)
    }
}
