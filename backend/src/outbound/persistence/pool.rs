//! Shared PostgreSQL connection pool.
//!
//! Both repositories draw `diesel-async` connections from one bb8 pool. A
//! checkout that times out becomes [`PoolError::Checkout`], which the
//! repositories report as a connection failure and clients see as a 503.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use tracing::{debug, info};

use crate::domain::ports::define_port_error;

define_port_error! {
    /// Failures while building the pool or borrowing from it.
    pub enum PoolError {
        /// No connection became free before the checkout timeout.
        Checkout { message: String } => "no database connection available: {message}",
        /// The pool could not open its initial connections.
        Build { message: String } => "database pool could not start: {message}",
    }
}

/// Connection string plus sizing for [`DbPool`].
///
/// ```
/// use std::time::Duration;
/// use fleet_tracker::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://gpsuser@db/gps_tracking")
///     .with_max_size(4)
///     .with_checkout_timeout(Duration::from_secs(2));
/// assert_eq!(config.max_size(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    checkout_timeout: Duration,
}

impl PoolConfig {
    /// Default number of pooled connections.
    pub const DEFAULT_MAX_SIZE: u32 = 10;
    /// Default wait for a free connection.
    pub const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: Self::DEFAULT_MAX_SIZE,
            checkout_timeout: Self::DEFAULT_CHECKOUT_TIMEOUT,
        }
    }

    /// Cap the pool; zero is raised to one.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    #[must_use]
    pub fn with_checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = timeout;
        self
    }

    #[must_use]
    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    /// Idle connections kept warm: a fifth of the pool, at least one.
    fn min_idle(&self) -> u32 {
        (self.max_size / 5).max(1)
    }
}

/// Cloneable handle to the pool.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Open the pool and its idle connections.
    ///
    /// # Errors
    ///
    /// [`PoolError::Build`] when the URL is malformed or the server refuses
    /// the initial connections.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url.as_str());
        let inner = Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(config.min_idle()))
            .connection_timeout(config.checkout_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        info!(
            max_size = config.max_size,
            min_idle = config.min_idle(),
            "database pool ready"
        );
        Ok(Self { inner })
    }

    /// Borrow a connection.
    ///
    /// # Errors
    ///
    /// [`PoolError::Checkout`] once the checkout timeout elapses.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner.get().await.map_err(|err| {
            debug!(error = %err, "database checkout failed");
            PoolError::checkout(err.to_string())
        })
    }
}
