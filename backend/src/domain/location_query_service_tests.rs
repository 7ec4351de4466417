//! Tests for the location query service.

use std::sync::Arc;

use chrono::TimeDelta;
use mockall::predicate::eq;
use rstest::rstest;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::RosterScope;
use crate::domain::ports::{MockLocationRepository, MockUserRepository};
use crate::test_support::{MutableClock, actor, fixed_now, location, user, user_id};

type Service = LocationQueryService<MockLocationRepository, MockUserRepository>;

fn make_service(locations: MockLocationRepository, users: MockUserRepository) -> Service {
    LocationQueryService::new(
        Arc::new(locations),
        Arc::new(users),
        Arc::new(MutableClock::new(fixed_now())),
    )
}

#[rstest]
#[tokio::test]
async fn plain_user_list_is_pinned_to_self() {
    let mut locations = MockLocationRepository::new();
    locations
        .expect_list()
        .with(eq(Some(user_id(4))), eq(None))
        .times(1)
        .return_once(|_, _| Ok(vec![location(1, 4, fixed_now())]));

    let listed = make_service(locations, MockUserRepository::new())
        .list(actor(4, Role::User), None)
        .await
        .expect("list succeeds");

    assert_eq!(listed.len(), 1);
}

#[rstest]
#[tokio::test]
async fn plain_user_listing_someone_else_gets_nothing() {
    let mut locations = MockLocationRepository::new();
    locations.expect_list().never();

    let listed = make_service(locations, MockUserRepository::new())
        .list(actor(4, Role::User), Some(user_id(9)))
        .await
        .expect("list succeeds");

    assert!(listed.is_empty());
}

#[rstest]
#[tokio::test]
async fn plain_user_latest_for_someone_else_answers_for_self() {
    let mut locations = MockLocationRepository::new();
    locations
        .expect_latest()
        .with(eq(Some(user_id(4))))
        .times(1)
        .return_once(|_| Ok(Some(location(3, 4, fixed_now()))));

    let latest = make_service(locations, MockUserRepository::new())
        .latest(actor(4, Role::User), Some(user_id(9)))
        .await
        .expect("latest succeeds");

    assert_eq!(latest.map(|found| found.user_id), Some(user_id(4)));
}

#[rstest]
#[tokio::test]
async fn plain_user_history_for_someone_else_answers_for_self() {
    let mut locations = MockLocationRepository::new();
    locations
        .expect_list()
        .with(eq(Some(user_id(4))), eq(Some(HISTORY_LIMIT_DEFAULT)))
        .times(1)
        .return_once(|_, _| Ok(vec![location(3, 4, fixed_now())]));

    let history = make_service(locations, MockUserRepository::new())
        .history(actor(4, Role::User), Some(user_id(9)), None)
        .await
        .expect("history succeeds");

    assert_eq!(history.len(), 1);
}

#[rstest]
#[case::user(Role::User)]
#[case::admin(Role::Admin)]
#[case::super_admin(Role::SuperAdmin)]
#[tokio::test]
async fn reads_without_user_default_to_the_caller(#[case] role: Role) {
    let mut locations = MockLocationRepository::new();
    locations
        .expect_list()
        .with(eq(Some(user_id(1))), eq(None))
        .times(1)
        .return_once(|_, _| Ok(vec![location(1, 1, fixed_now())]));
    locations
        .expect_latest()
        .with(eq(Some(user_id(1))))
        .times(1)
        .return_once(|_| Ok(None));

    let service = make_service(locations, MockUserRepository::new());
    let caller = actor(1, role);

    let listed = service.list(caller, None).await.expect("list succeeds");
    assert_eq!(listed.len(), 1);
    assert_eq!(service.latest(caller, None).await.expect("latest succeeds"), None);
}

#[rstest]
#[tokio::test]
async fn super_admin_may_name_any_user() {
    let mut locations = MockLocationRepository::new();
    locations
        .expect_list()
        .with(eq(Some(user_id(5))), eq(None))
        .times(1)
        .return_once(|_, _| Ok(vec![location(2, 5, fixed_now())]));

    let listed = make_service(locations, MockUserRepository::new())
        .list(actor(1, Role::SuperAdmin), Some(user_id(5)))
        .await
        .expect("list succeeds");

    assert_eq!(listed.len(), 1);
}

#[rstest]
#[case::own_roster(Some(2), true)]
#[case::foreign_roster(Some(3), false)]
#[case::seeded_account(None, false)]
#[tokio::test]
async fn admin_latest_respects_roster(#[case] created_by: Option<i64>, #[case] visible: bool) {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .with(eq(user_id(8)))
        .return_once(move |_| Ok(Some(user(8, Role::User, created_by))));
    let mut locations = MockLocationRepository::new();
    locations
        .expect_latest()
        .times(usize::from(visible))
        .return_once(|_| Ok(Some(location(1, 8, fixed_now()))));

    let latest = make_service(locations, users)
        .latest(actor(2, Role::Admin), Some(user_id(8)))
        .await
        .expect("latest succeeds");

    assert_eq!(latest.is_some(), visible);
}

#[rstest]
#[case(None, HISTORY_LIMIT_DEFAULT)]
#[case(Some(5), 5)]
#[case(Some(HISTORY_LIMIT_MAX), HISTORY_LIMIT_MAX)]
#[tokio::test]
async fn history_applies_default_and_explicit_limits(
    #[case] requested: Option<i64>,
    #[case] expected: i64,
) {
    let mut locations = MockLocationRepository::new();
    locations
        .expect_list()
        .with(eq(Some(user_id(4))), eq(Some(expected)))
        .times(1)
        .return_once(|_, _| Ok(Vec::new()));

    make_service(locations, MockUserRepository::new())
        .history(actor(4, Role::User), None, requested)
        .await
        .expect("history succeeds");
}

#[rstest]
#[case(0)]
#[case(HISTORY_LIMIT_MAX + 1)]
#[tokio::test]
async fn history_rejects_out_of_range_limits(#[case] limit: i64) {
    let err = make_service(MockLocationRepository::new(), MockUserRepository::new())
        .history(actor(4, Role::User), None, Some(limit))
        .await
        .expect_err("limit rejected");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn activity_reports_roster_in_order_with_threshold() {
    let now = fixed_now();
    let mut users = MockUserRepository::new();
    users
        .expect_roster()
        .with(eq(RosterScope::CreatedBy(user_id(2))))
        .return_once(|_| Ok(vec![user(5, Role::User, Some(2)), user(6, Role::User, Some(2))]));
    let mut locations = MockLocationRepository::new();
    locations.expect_latest().returning(move |id| {
        Ok(match id.map(UserId::get) {
            Some(5) => Some(location(10, 5, now - TimeDelta::seconds(299))),
            Some(6) => Some(location(11, 6, now - TimeDelta::seconds(301))),
            _ => None,
        })
    });
    locations.expect_count_for_user().returning(|id| Ok(id.get() * 10));

    let report = make_service(locations, users)
        .activity(actor(2, Role::Admin))
        .await
        .expect("activity succeeds");

    let flags: Vec<_> = report
        .iter()
        .map(|summary| (summary.user_id.get(), summary.is_tracking, summary.total_locations))
        .collect();
    assert_eq!(flags, vec![(5, true, 50), (6, false, 60)]);
}

#[rstest]
#[tokio::test]
async fn activity_is_forbidden_for_plain_users() {
    let err = make_service(MockLocationRepository::new(), MockUserRepository::new())
        .activity(actor(4, Role::User))
        .await
        .expect_err("forbidden");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn route_for_foreign_user_matches_missing_user() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().returning(|id| {
        Ok(match id.get() {
            8 => Some(user(8, Role::User, Some(3))),
            _ => None,
        })
    });
    let mut locations = MockLocationRepository::new();
    locations.expect_list_in_window().never();
    let service = make_service(locations, users);
    let admin = actor(2, Role::Admin);

    let foreign = service
        .route(admin, user_id(8), RouteRange::Last24Hours)
        .await
        .expect_err("foreign user hidden");
    let missing = service
        .route(admin, user_id(99), RouteRange::Last24Hours)
        .await
        .expect_err("missing user");

    assert_eq!(foreign.code(), ErrorCode::NotFound);
    assert_eq!(missing.code(), ErrorCode::NotFound);
    assert_eq!(
        serde_json::to_value(&foreign).expect("serialise").as_object().map(|o| o.len()),
        serde_json::to_value(&missing).expect("serialise").as_object().map(|o| o.len()),
    );
}

#[rstest]
#[case(RouteRange::Last24Hours, 24)]
#[case(RouteRange::Last72Hours, 72)]
#[tokio::test]
async fn route_queries_lookback_window(#[case] range: RouteRange, #[case] hours: i64) {
    let now = fixed_now();
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(|_| Ok(Some(user(8, Role::User, Some(2)))));
    let mut locations = MockLocationRepository::new();
    locations
        .expect_list_in_window()
        .with(eq(user_id(8)), eq(now - TimeDelta::hours(hours)), eq(now))
        .times(1)
        .return_once(|_, _, _| Ok(Vec::new()));

    let route = make_service(locations, users)
        .route(actor(1, Role::SuperAdmin), user_id(8), range)
        .await
        .expect("route succeeds");

    assert!(route.is_empty());
}

#[rstest]
#[tokio::test]
async fn route_is_forbidden_for_plain_users() {
    let err = make_service(MockLocationRepository::new(), MockUserRepository::new())
        .route(actor(4, Role::User), user_id(4), RouteRange::default())
        .await
        .expect_err("forbidden");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn store_outage_maps_to_service_unavailable() {
    let mut locations = MockLocationRepository::new();
    locations
        .expect_latest()
        .return_once(|_| Err(LocationRepositoryError::connection("refused")));

    let err = make_service(locations, MockUserRepository::new())
        .latest(actor(4, Role::User), None)
        .await
        .expect_err("outage");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}
