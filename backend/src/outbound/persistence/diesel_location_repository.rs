//! PostgreSQL-backed `LocationRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Nullable, Text};
use diesel_async::RunQueryDsl;

use crate::domain::ports::{LocationRepository, LocationRepositoryError};
use crate::domain::{Location, NewLocation, UserId};

use super::diesel_basic_error_mapping::{
    ConstraintViolation, constraint_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::LocationRow;
use super::pool::{DbPool, PoolError};
use super::schema::locations;

/// Insert that stamps a timestamp never earlier than the owner's newest
/// sample, keeping per-user insert order and timestamp order aligned.
const INSERT_LOCATION_SQL: &str = r#"
INSERT INTO locations (user_id, latitude, longitude, speed, heading, address, "timestamp")
VALUES (
    $1, $2, $3, $4, $5, $6,
    GREATEST(
        clock_timestamp(),
        COALESCE(
            (SELECT max(l."timestamp") FROM locations l WHERE l.user_id = $1),
            clock_timestamp()
        )
    )
)
RETURNING id, user_id, latitude, longitude, speed, heading, address, "timestamp"
"#;

/// Diesel-backed implementation of the location store.
#[derive(Clone)]
pub struct DieselLocationRepository {
    pool: DbPool,
}

impl DieselLocationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> LocationRepositoryError {
    map_basic_pool_error(error, LocationRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> LocationRepositoryError {
    map_basic_diesel_error(
        error,
        LocationRepositoryError::query,
        LocationRepositoryError::connection,
    )
}

fn row_to_location(row: LocationRow) -> Result<Location, LocationRepositoryError> {
    let LocationRow {
        id,
        user_id,
        latitude,
        longitude,
        speed,
        heading,
        address,
        timestamp,
    } = row;
    let user_id = UserId::new(user_id)
        .map_err(|err| LocationRepositoryError::query(format!("stored owner id: {err}")))?;
    Ok(Location {
        id,
        user_id,
        latitude,
        longitude,
        speed,
        heading,
        address,
        timestamp,
    })
}

fn rows_to_locations(rows: Vec<LocationRow>) -> Result<Vec<Location>, LocationRepositoryError> {
    rows.into_iter().map(row_to_location).collect()
}

#[async_trait]
impl LocationRepository for DieselLocationRepository {
    async fn insert(&self, location: &NewLocation) -> Result<Location, LocationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner = location.user_id.get();
        let row = diesel::sql_query(INSERT_LOCATION_SQL)
            .bind::<BigInt, _>(owner)
            .bind::<Double, _>(location.coordinates.latitude())
            .bind::<Double, _>(location.coordinates.longitude())
            .bind::<Nullable<Double>, _>(location.speed)
            .bind::<Nullable<Double>, _>(location.heading)
            .bind::<Nullable<Text>, _>(location.address.as_deref())
            .get_result::<LocationRow>(&mut conn)
            .await
            .map_err(|err| match constraint_violation(&err) {
                Some(ConstraintViolation::ForeignKey) => {
                    LocationRepositoryError::unknown_owner(owner)
                }
                _ => map_diesel_error(err),
            })?;
        row_to_location(row)
    }

    async fn latest(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Option<Location>, LocationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = locations::table
            .select(LocationRow::as_select())
            .order((locations::timestamp.desc(), locations::id.desc()))
            .into_boxed();
        if let Some(id) = user_id {
            query = query.filter(locations::user_id.eq(id.get()));
        }
        let row = query
            .first::<LocationRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_location).transpose()
    }

    async fn list(
        &self,
        user_id: Option<UserId>,
        limit: Option<i64>,
    ) -> Result<Vec<Location>, LocationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = locations::table
            .select(LocationRow::as_select())
            .order((locations::timestamp.desc(), locations::id.desc()))
            .into_boxed();
        if let Some(id) = user_id {
            query = query.filter(locations::user_id.eq(id.get()));
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        let rows = query
            .load::<LocationRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_locations(rows)
    }

    async fn count_for_user(&self, user_id: UserId) -> Result<i64, LocationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        locations::table
            .filter(locations::user_id.eq(user_id.get()))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn list_in_window(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Location>, LocationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = locations::table
            .filter(locations::user_id.eq(user_id.get()))
            .filter(locations::timestamp.between(from, to))
            .order((locations::timestamp.asc(), locations::id.asc()))
            .select(LocationRow::as_select())
            .load::<LocationRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_locations(rows)
    }
}
