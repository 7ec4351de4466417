//! Mutex-guarded implementation of the roster and location ports.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;

use crate::domain::ports::{
    LocationRepository, LocationRepositoryError, UserListFilter, UserListing, UserRepository,
    UserRepositoryError,
};
use crate::domain::{
    Email, Location, NewLocation, NewUser, Role, RosterScope, User, UserChanges,
    UserCredentials, UserId,
};

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, UserCredentials>,
    locations: Vec<Location>,
    last_user_id: i64,
    last_location_id: i64,
}

impl State {
    fn email_taken(&self, email: &Email, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|stored| &stored.user.email == email && Some(stored.user.id) != except)
    }

    fn newest_for(&self, user_id: Option<UserId>) -> impl Iterator<Item = &Location> {
        // Samples are appended in timestamp order, so reverse iteration is
        // newest first.
        self.locations
            .iter()
            .rev()
            .filter(move |location| user_id.is_none_or(|id| location.user_id == id))
    }
}

/// In-memory roster and location store.
#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, String> {
        self.state
            .lock()
            .map_err(|_| "in-memory store lock poisoned".to_owned())
    }

    fn lock_users(&self) -> Result<MutexGuard<'_, State>, UserRepositoryError> {
        self.lock().map_err(UserRepositoryError::query)
    }

    fn lock_locations(&self) -> Result<MutexGuard<'_, State>, LocationRepositoryError> {
        self.lock().map_err(LocationRepositoryError::query)
    }
}

fn in_scope(user: &User, scope: RosterScope) -> bool {
    match scope {
        RosterScope::All => true,
        RosterScope::CreatedBy(creator) => user.created_by == Some(creator),
    }
}

fn matches_filter(user: &User, filter: &UserListFilter) -> bool {
    let search_hit = filter.search.as_deref().is_none_or(|term| {
        let term = term.to_lowercase();
        user.name.as_ref().to_lowercase().contains(&term) || user.email.as_ref().contains(&term)
    });
    in_scope(user, filter.scope)
        && search_hit
        && filter.role.is_none_or(|role| user.role == role)
        && filter.is_active.is_none_or(|active| user.is_active == active)
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        let state = self.lock_users()?;
        Ok(state.users.get(&id).map(|stored| stored.user.clone()))
    }

    async fn find_credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, UserRepositoryError> {
        let state = self.lock_users()?;
        Ok(state
            .users
            .values()
            .find(|stored| &stored.user.email == email)
            .cloned())
    }

    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let now = self.clock.utc();
        let mut state = self.lock_users()?;
        if state.email_taken(&user.email, None) {
            return Err(UserRepositoryError::duplicate_email(user.email.as_ref()));
        }
        state.last_user_id += 1;
        let id = UserId::new(state.last_user_id)
            .map_err(|err| UserRepositoryError::query(err.to_string()))?;
        let created = User {
            id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            is_active: user.is_active,
            created_by: user.created_by,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(
            id,
            UserCredentials {
                user: created.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(created)
    }

    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, UserRepositoryError> {
        let now = self.clock.utc();
        let mut state = self.lock_users()?;
        if let Some(email) = &changes.email
            && state.email_taken(email, Some(id))
        {
            return Err(UserRepositoryError::duplicate_email(email.as_ref()));
        }
        let Some(stored) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = &changes.email {
            stored.user.email = email.clone();
        }
        if let Some(name) = &changes.name {
            stored.user.name = name.clone();
        }
        if let Some(hash) = &changes.password_hash {
            stored.password_hash.clone_from(hash);
        }
        if let Some(role) = changes.role {
            stored.user.role = role;
        }
        if let Some(is_active) = changes.is_active {
            stored.user.is_active = is_active;
        }
        stored.user.updated_at = now;
        Ok(Some(stored.user.clone()))
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserRepositoryError> {
        let mut state = self.lock_users()?;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.locations.retain(|location| location.user_id != id);
        for stored in state.users.values_mut() {
            if stored.user.created_by == Some(id) {
                stored.user.created_by = None;
            }
        }
        Ok(true)
    }

    async fn list(&self, filter: &UserListFilter) -> Result<UserListing, UserRepositoryError> {
        let state = self.lock_users()?;
        let mut matching: Vec<&User> = state
            .users
            .values()
            .map(|stored| &stored.user)
            .filter(|user| matches_filter(user, filter))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = i64::try_from(matching.len())
            .map_err(|err| UserRepositoryError::query(err.to_string()))?;
        let skip = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(filter.limit).unwrap_or(usize::MAX);
        let users = matching.into_iter().skip(skip).take(take).cloned().collect();
        Ok(UserListing { users, total })
    }

    async fn roster(&self, scope: RosterScope) -> Result<Vec<User>, UserRepositoryError> {
        let state = self.lock_users()?;
        Ok(state
            .users
            .values()
            .map(|stored| &stored.user)
            .filter(|user| in_scope(user, scope))
            .cloned()
            .collect())
    }

    async fn any_super_admin(&self) -> Result<bool, UserRepositoryError> {
        let state = self.lock_users()?;
        Ok(state
            .users
            .values()
            .any(|stored| stored.user.role == Role::SuperAdmin))
    }
}

#[async_trait]
impl LocationRepository for InMemoryStore {
    async fn insert(&self, location: &NewLocation) -> Result<Location, LocationRepositoryError> {
        let now = self.clock.utc();
        let mut state = self.lock_locations()?;
        if !state.users.contains_key(&location.user_id) {
            return Err(LocationRepositoryError::unknown_owner(location.user_id.get()));
        }
        // Timestamps never go backwards, even if the clock does.
        let floor: Option<DateTime<Utc>> = state.locations.last().map(|last| last.timestamp);
        let timestamp = floor.map_or(now, |floor| floor.max(now));
        state.last_location_id += 1;
        let stored = Location {
            id: state.last_location_id,
            user_id: location.user_id,
            latitude: location.coordinates.latitude(),
            longitude: location.coordinates.longitude(),
            speed: location.speed,
            heading: location.heading,
            address: location.address.clone(),
            timestamp,
        };
        state.locations.push(stored.clone());
        Ok(stored)
    }

    async fn latest(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Option<Location>, LocationRepositoryError> {
        let state = self.lock_locations()?;
        Ok(state.newest_for(user_id).next().cloned())
    }

    async fn list(
        &self,
        user_id: Option<UserId>,
        limit: Option<i64>,
    ) -> Result<Vec<Location>, LocationRepositoryError> {
        let state = self.lock_locations()?;
        let take = limit
            .map(|limit| usize::try_from(limit).unwrap_or(0))
            .unwrap_or(usize::MAX);
        Ok(state.newest_for(user_id).take(take).cloned().collect())
    }

    async fn count_for_user(&self, user_id: UserId) -> Result<i64, LocationRepositoryError> {
        let state = self.lock_locations()?;
        let count = state.newest_for(Some(user_id)).count();
        i64::try_from(count).map_err(|err| LocationRepositoryError::query(err.to_string()))
    }

    async fn list_in_window(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Location>, LocationRepositoryError> {
        let state = self.lock_locations()?;
        Ok(state
            .locations
            .iter()
            .filter(|location| {
                location.user_id == user_id && (from..=to).contains(&location.timestamp)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
