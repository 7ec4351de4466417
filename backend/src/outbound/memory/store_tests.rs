use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::{Coordinates, UserName};
use crate::test_support::{MutableClock, fixed_now, user_id};

struct Harness {
    clock: Arc<MutableClock>,
    store: InMemoryStore,
}

#[fixture]
fn harness() -> Harness {
    let clock = Arc::new(MutableClock::new(fixed_now()));
    let store = InMemoryStore::new(clock.clone());
    Harness { clock, store }
}

fn new_user(email: &str, role: Role, created_by: Option<UserId>) -> NewUser {
    NewUser {
        email: Email::new(email).expect("valid email"),
        name: UserName::new(email.split('@').next().unwrap_or("x")).expect("valid name"),
        password_hash: "plain$secret".to_owned(),
        role,
        is_active: true,
        created_by,
    }
}

fn sample(owner: UserId) -> NewLocation {
    NewLocation {
        user_id: owner,
        coordinates: Coordinates::new(51.5074, -0.1278).expect("valid coordinates"),
        speed: Some(12.5),
        heading: None,
        address: None,
    }
}

async fn add_user(store: &InMemoryStore, email: &str, role: Role, by: Option<UserId>) -> User {
    UserRepository::insert(store, &new_user(email, role, by))
        .await
        .expect("insert user")
}

fn filter(scope: RosterScope) -> UserListFilter {
    UserListFilter {
        scope,
        search: None,
        role: None,
        is_active: None,
        page: 1,
        limit: 10,
    }
}

#[rstest]
#[tokio::test]
async fn duplicate_emails_are_rejected(harness: Harness) {
    add_user(&harness.store, "ann@fleet.test", Role::User, None).await;

    let err = UserRepository::insert(&harness.store, &new_user("ann@fleet.test", Role::User, None))
        .await
        .expect_err("duplicate");

    assert_eq!(err, UserRepositoryError::duplicate_email("ann@fleet.test"));
}

#[rstest]
#[tokio::test]
async fn updating_to_a_taken_email_fails(harness: Harness) {
    add_user(&harness.store, "ann@fleet.test", Role::User, None).await;
    let bob = add_user(&harness.store, "bob@fleet.test", Role::User, None).await;
    let changes = UserChanges {
        email: Some(Email::new("ann@fleet.test").expect("valid email")),
        ..UserChanges::default()
    };

    let err = harness
        .store
        .update(bob.id, &changes)
        .await
        .expect_err("taken");

    assert!(matches!(err, UserRepositoryError::DuplicateEmail { .. }));
}

#[rstest]
#[tokio::test]
async fn updates_touch_the_modified_timestamp(harness: Harness) {
    let ann = add_user(&harness.store, "ann@fleet.test", Role::User, None).await;
    harness.clock.advance_seconds(30);
    let changes = UserChanges {
        is_active: Some(false),
        ..UserChanges::default()
    };

    let updated = harness
        .store
        .update(ann.id, &changes)
        .await
        .expect("update")
        .expect("present");

    assert!(!updated.is_active);
    assert_eq!(updated.email, ann.email);
    assert!(updated.updated_at > ann.updated_at);
}

#[rstest]
#[tokio::test]
async fn samples_for_unknown_owners_are_rejected(harness: Harness) {
    let err = LocationRepository::insert(&harness.store, &sample(user_id(42)))
        .await
        .expect_err("unknown owner");

    assert_eq!(err, LocationRepositoryError::unknown_owner(42));
}

#[rstest]
#[tokio::test]
async fn timestamps_never_decrease(harness: Harness) {
    let ann = add_user(&harness.store, "ann@fleet.test", Role::User, None).await;
    let first = LocationRepository::insert(&harness.store, &sample(ann.id))
        .await
        .expect("first");
    harness.clock.advance_seconds(-60);

    let second = LocationRepository::insert(&harness.store, &sample(ann.id))
        .await
        .expect("second");

    assert_eq!(second.timestamp, first.timestamp);
    assert!(second.id > first.id);
    let latest = harness.store.latest(Some(ann.id)).await.expect("latest");
    assert_eq!(latest.map(|location| location.id), Some(second.id));
}

#[rstest]
#[tokio::test]
async fn listing_is_newest_first_and_limited(harness: Harness) {
    let ann = add_user(&harness.store, "ann@fleet.test", Role::User, None).await;
    let bob = add_user(&harness.store, "bob@fleet.test", Role::User, None).await;
    for owner in [ann.id, bob.id, ann.id] {
        harness.clock.advance_seconds(1);
        LocationRepository::insert(&harness.store, &sample(owner))
            .await
            .expect("insert");
    }

    let everyone = LocationRepository::list(&harness.store, None, None)
        .await
        .expect("list");
    let ann_latest = LocationRepository::list(&harness.store, Some(ann.id), Some(1))
        .await
        .expect("list");

    let ids: Vec<i64> = everyone.iter().map(|location| location.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert_eq!(ann_latest.len(), 1);
    assert_eq!(ann_latest.first().map(|location| location.id), Some(3));
    assert_eq!(harness.store.count_for_user(ann.id).await.expect("count"), 2);
}

#[rstest]
#[tokio::test]
async fn window_is_inclusive_and_ascending(harness: Harness) {
    let ann = add_user(&harness.store, "ann@fleet.test", Role::User, None).await;
    let mut stamps = Vec::new();
    for _ in 0..3 {
        harness.clock.advance_seconds(60);
        let stored = LocationRepository::insert(&harness.store, &sample(ann.id))
            .await
            .expect("insert");
        stamps.push(stored.timestamp);
    }
    let (Some(from), Some(to)) = (stamps.first().copied(), stamps.get(1).copied()) else {
        panic!("three samples");
    };

    let window = harness
        .store
        .list_in_window(ann.id, from, to)
        .await
        .expect("window");

    let ids: Vec<i64> = window.iter().map(|location| location.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[rstest]
#[tokio::test]
async fn deleting_a_user_cascades(harness: Harness) {
    let admin = add_user(&harness.store, "boss@fleet.test", Role::Admin, None).await;
    let driver = add_user(&harness.store, "van@fleet.test", Role::User, Some(admin.id)).await;
    LocationRepository::insert(&harness.store, &sample(admin.id))
        .await
        .expect("insert");

    assert!(harness.store.delete(admin.id).await.expect("delete"));
    assert!(!harness.store.delete(admin.id).await.expect("second delete"));

    let orphan = harness
        .store
        .find_by_id(driver.id)
        .await
        .expect("find")
        .expect("present");
    assert_eq!(orphan.created_by, None);
    assert_eq!(harness.store.count_for_user(admin.id).await.expect("count"), 0);
}

#[rstest]
#[tokio::test]
async fn roster_scope_and_filters_apply(harness: Harness) {
    let admin = add_user(&harness.store, "boss@fleet.test", Role::Admin, None).await;
    add_user(&harness.store, "van@fleet.test", Role::User, Some(admin.id)).await;
    harness.clock.advance_seconds(1);
    add_user(&harness.store, "truck@fleet.test", Role::User, Some(admin.id)).await;
    add_user(&harness.store, "other@fleet.test", Role::User, None).await;

    let scoped = UserRepository::list(
        &harness.store,
        &filter(RosterScope::CreatedBy(admin.id)),
    )
    .await
    .expect("list");
    let searched = UserRepository::list(
        &harness.store,
        &UserListFilter {
            search: Some("TRUCK".to_owned()),
            ..filter(RosterScope::All)
        },
    )
    .await
    .expect("search");
    let admins = UserRepository::list(
        &harness.store,
        &UserListFilter {
            role: Some(Role::Admin),
            ..filter(RosterScope::All)
        },
    )
    .await
    .expect("role");

    assert_eq!(scoped.total, 2);
    let emails: Vec<&str> = scoped.users.iter().map(|user| user.email.as_ref()).collect();
    assert_eq!(emails, vec!["truck@fleet.test", "van@fleet.test"]);
    assert_eq!(searched.total, 1);
    assert_eq!(admins.users.first().map(|user| user.id), Some(admin.id));
}

#[rstest]
#[tokio::test]
async fn paging_reports_the_full_total(harness: Harness) {
    for idx in 0..5 {
        add_user(&harness.store, &format!("u{idx}@fleet.test"), Role::User, None).await;
    }

    let page = UserRepository::list(
        &harness.store,
        &UserListFilter {
            page: 3,
            limit: 2,
            ..filter(RosterScope::All)
        },
    )
    .await
    .expect("page");

    assert_eq!(page.total, 5);
    assert_eq!(page.users.len(), 1);
}

#[rstest]
#[tokio::test]
async fn super_admin_presence_is_reported(harness: Harness) {
    assert!(!harness.store.any_super_admin().await.expect("empty"));
    add_user(&harness.store, "root@fleet.test", Role::SuperAdmin, None).await;
    assert!(harness.store.any_super_admin().await.expect("present"));
}
