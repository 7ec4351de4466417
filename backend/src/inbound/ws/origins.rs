//! Origin allow-list for WebSocket upgrades and cross-origin REST calls.

use std::str::FromStr;

use url::{Origin, Url};

/// Origins accepted on the `/ws` upgrade and by the REST CORS policy.
///
/// Entries are compared by scheme, host and port, so `http://localhost:3000/`
/// and `http://localhost:3000` are the same origin.
///
/// # Examples
/// ```
/// use fleet_tracker::inbound::ws::AllowedOrigins;
/// use url::Url;
///
/// let origins: AllowedOrigins = "http://localhost:3000, https://fleet.example".parse().unwrap();
/// assert!(origins.allows(&Url::parse("https://fleet.example").unwrap()));
/// assert!(!origins.allows(&Url::parse("https://evil.example").unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigins(Vec<Origin>);

impl AllowedOrigins {
    pub fn new(origins: impl IntoIterator<Item = Url>) -> Self {
        Self(origins.into_iter().map(|url| url.origin()).collect())
    }

    pub fn allows(&self, origin: &Url) -> bool {
        let candidate = origin.origin();
        candidate.is_tuple() && self.0.contains(&candidate)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for AllowedOrigins {
    type Err = url::ParseError;

    /// Parse a comma separated list; blank entries are skipped.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let urls = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(Url::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(urls))
    }
}
