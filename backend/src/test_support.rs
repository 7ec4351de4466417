//! Test utilities shared by unit tests across the crate.
//!
//! Only compiled for `cfg(test)`.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{Actor, Email, Location, Role, User, UserId, UserName};

/// Clock whose current instant is set by the test.
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Fixed instant used as "now" by deterministic tests.
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0) {
        chrono::LocalResult::Single(instant) => instant,
        _ => panic!("fixed instant"),
    }
}

pub fn user_id(raw: i64) -> UserId {
    UserId::new(raw).expect("valid user id")
}

pub fn actor(raw: i64, role: Role) -> Actor {
    Actor::new(user_id(raw), role)
}

/// Roster entry with predictable email and name.
pub fn user(raw: i64, role: Role, created_by: Option<i64>) -> User {
    let now = fixed_now();
    User {
        id: user_id(raw),
        email: Email::new(format!("user{raw}@fleet.test")).expect("valid email"),
        name: UserName::new(format!("User {raw}")).expect("valid name"),
        role,
        is_active: true,
        created_by: created_by.map(user_id),
        created_at: now,
        updated_at: now,
    }
}

/// Stored sample for `owner` taken at `timestamp`.
pub fn location(id: i64, owner: i64, timestamp: DateTime<Utc>) -> Location {
    Location {
        id,
        user_id: user_id(owner),
        latitude: 48.8566,
        longitude: 2.3522,
        speed: None,
        heading: None,
        address: None,
        timestamp,
    }
}
