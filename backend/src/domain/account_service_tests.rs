//! Tests for the account service.

use std::sync::Arc;

use mockall::predicate::eq;
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    AccessToken, FixturePasswordHasher, MockTokenService, MockUserRepository, UserListing,
};
use crate::domain::{ErrorCode, RosterScope, UserCredentials};
use crate::test_support::{actor, fixed_now, user, user_id};

type Service = AccountService<MockUserRepository, FixturePasswordHasher, MockTokenService>;

fn make_service(users: MockUserRepository, tokens: MockTokenService) -> Service {
    AccountService::new(Arc::new(users), Arc::new(FixturePasswordHasher), Arc::new(tokens))
}

fn issuing_tokens() -> MockTokenService {
    let mut tokens = MockTokenService::new();
    tokens
        .expect_issue()
        .returning(|user| Ok(AccessToken::new(format!("token-for-{}", user.id))));
    tokens
}

fn inserted(record: &NewUser) -> User {
    User {
        id: user_id(42),
        email: record.email.clone(),
        name: record.name.clone(),
        role: record.role,
        is_active: record.is_active,
        created_by: record.created_by,
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }
}

fn credentials(user: User, password: &str) -> UserCredentials {
    UserCredentials {
        user,
        password_hash: format!("plain${password}"),
    }
}

fn new_account(role: Role) -> NewAccount {
    NewAccount {
        email: Email::new("new@fleet.test").expect("email"),
        password: Password::new("secret-1").expect("password"),
        name: UserName::new("New Driver").expect("name"),
        role,
        is_active: true,
    }
}

#[rstest]
#[tokio::test]
async fn login_issues_token_for_valid_credentials() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_credentials_by_email()
        .return_once(|_| Ok(Some(credentials(user(3, Role::User, None), "secret-1"))));

    let session = make_service(users, issuing_tokens())
        .login(&LoginCredentials::try_from_parts("user3@fleet.test", "secret-1").expect("creds"))
        .await
        .expect("login succeeds");

    assert_eq!(session.access_token, "token-for-3");
    assert_eq!(session.user.id, user_id(3));
}

#[rstest]
#[case::wrong_password("nope", true, "invalid credentials")]
#[case::disabled("secret-1", false, "account disabled")]
#[tokio::test]
async fn login_rejects_bad_password_and_disabled_accounts(
    #[case] password: &str,
    #[case] active: bool,
    #[case] message: &str,
) {
    let mut users = MockUserRepository::new();
    users.expect_find_credentials_by_email().return_once(move |_| {
        let mut account = user(3, Role::User, None);
        account.is_active = active;
        Ok(Some(credentials(account, "secret-1")))
    });
    let mut tokens = MockTokenService::new();
    tokens.expect_issue().never();

    let err = make_service(users, tokens)
        .login(&LoginCredentials::try_from_parts("user3@fleet.test", password).expect("creds"))
        .await
        .expect_err("login fails");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), message);
}

#[rstest]
#[tokio::test]
async fn register_always_creates_plain_users() {
    let mut users = MockUserRepository::new();
    users
        .expect_insert()
        .withf(|record| {
            record.role == Role::User
                && record.created_by.is_none()
                && record.password_hash == "plain$secret-1"
        })
        .times(1)
        .returning(|record| Ok(inserted(record)));

    let session = make_service(users, issuing_tokens())
        .register(Registration {
            email: Email::new("new@fleet.test").expect("email"),
            password: Password::new("secret-1").expect("password"),
            name: UserName::new("New Driver").expect("name"),
        })
        .await
        .expect("register succeeds");

    assert_eq!(session.user.role, Role::User);
}

#[rstest]
#[tokio::test]
async fn register_reports_duplicate_email_as_conflict() {
    let mut users = MockUserRepository::new();
    users
        .expect_insert()
        .return_once(|_| Err(UserRepositoryError::duplicate_email("new@fleet.test")));

    let err = make_service(users, MockTokenService::new())
        .register(Registration {
            email: Email::new("new@fleet.test").expect("email"),
            password: Password::new("secret-1").expect("password"),
            name: UserName::new("New Driver").expect("name"),
        })
        .await
        .expect_err("duplicate");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn authenticate_uses_stored_role_over_token_role() {
    let mut tokens = MockTokenService::new();
    tokens
        .expect_verify()
        .return_once(|_| Ok(actor(5, Role::SuperAdmin)));
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .with(eq(user_id(5)))
        .return_once(|_| Ok(Some(user(5, Role::Admin, None))));

    let resolved = make_service(users, tokens)
        .authenticate("token")
        .await
        .expect("token accepted");

    assert_eq!(resolved, actor(5, Role::Admin));
}

#[rstest]
#[tokio::test]
async fn authenticate_rejects_bad_tokens_and_deleted_accounts() {
    let mut tokens = MockTokenService::new();
    tokens
        .expect_verify()
        .withf(|token| token == "garbage")
        .return_once(|_| Err(TokenServiceError::invalid("bad signature")));
    tokens
        .expect_verify()
        .withf(|token| token == "orphan")
        .return_once(|_| Ok(actor(9, Role::User)));
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().return_once(|_| Ok(None));
    let service = make_service(users, tokens);

    let bad = service.authenticate("garbage").await.expect_err("bad token");
    let orphan = service.authenticate("orphan").await.expect_err("deleted");

    assert_eq!(bad.code(), ErrorCode::Unauthorized);
    assert_eq!(orphan.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn list_users_scopes_admins_to_their_roster() {
    let mut users = MockUserRepository::new();
    users
        .expect_list()
        .withf(|filter| {
            filter.scope == RosterScope::CreatedBy(user_id(2))
                && filter.search.as_deref() == Some("jo")
                && filter.offset() == 10
        })
        .return_once(|_| {
            Ok(UserListing {
                users: vec![user(5, Role::User, Some(2))],
                total: 11,
            })
        });

    let page = make_service(users, MockTokenService::new())
        .list_users(
            actor(2, Role::Admin),
            UserQuery {
                search: Some("  jo ".to_owned()),
                page: 2,
                ..UserQuery::default()
            },
        )
        .await
        .expect("list succeeds");

    assert_eq!(page.total, 11);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.data.len(), 1);
}

#[rstest]
#[case::plain_user(Role::User, 1, 10, ErrorCode::Forbidden)]
#[case::page_zero(Role::SuperAdmin, 0, 10, ErrorCode::InvalidRequest)]
#[case::limit_too_large(Role::SuperAdmin, 1, PAGE_LIMIT_MAX + 1, ErrorCode::InvalidRequest)]
#[tokio::test]
async fn list_users_rejects_bad_requests(
    #[case] role: Role,
    #[case] page: u32,
    #[case] limit: u32,
    #[case] expected: ErrorCode,
) {
    let mut users = MockUserRepository::new();
    users.expect_list().never();

    let err = make_service(users, MockTokenService::new())
        .list_users(
            actor(1, role),
            UserQuery {
                page,
                limit,
                ..UserQuery::default()
            },
        )
        .await
        .expect_err("rejected");

    assert_eq!(err.code(), expected);
}

#[rstest]
#[case::admin_creates_user(Role::Admin, Role::User, true)]
#[case::admin_creates_admin(Role::Admin, Role::Admin, false)]
#[case::admin_creates_super_admin(Role::Admin, Role::SuperAdmin, false)]
#[case::super_admin_creates_super_admin(Role::SuperAdmin, Role::SuperAdmin, true)]
#[case::user_creates_user(Role::User, Role::User, false)]
#[tokio::test]
async fn create_user_follows_role_hierarchy(
    #[case] actor_role: Role,
    #[case] requested: Role,
    #[case] allowed: bool,
) {
    let mut users = MockUserRepository::new();
    users
        .expect_insert()
        .times(usize::from(allowed))
        .withf(|record| record.created_by == Some(user_id(2)))
        .returning(|record| Ok(inserted(record)));

    let result = make_service(users, MockTokenService::new())
        .create_user(actor(2, actor_role), new_account(requested))
        .await;

    match (allowed, result) {
        (true, Ok(profile)) => assert_eq!(profile.role, requested),
        (false, Err(err)) => assert_eq!(err.code(), ErrorCode::Forbidden),
        (true, Err(err)) => panic!("expected success, got {err:?}"),
        (false, Ok(profile)) => panic!("expected rejection, got {profile:?}"),
    }
}

#[rstest]
#[tokio::test]
async fn admin_cannot_promote_own_users() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(|_| Ok(Some(user(5, Role::User, Some(2)))));
    users.expect_update().never();

    let err = make_service(users, MockTokenService::new())
        .update_user(
            actor(2, Role::Admin),
            user_id(5),
            AccountUpdate {
                role: Some(Role::Admin),
                ..AccountUpdate::default()
            },
        )
        .await
        .expect_err("promotion rejected");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn update_rehashes_new_passwords() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(|_| Ok(Some(user(5, Role::User, Some(2)))));
    users
        .expect_update()
        .withf(|_, changes| changes.password_hash.as_deref() == Some("plain$changed-1"))
        .return_once(|_, _| Ok(Some(user(5, Role::User, Some(2)))));

    make_service(users, MockTokenService::new())
        .update_user(
            actor(2, Role::Admin),
            user_id(5),
            AccountUpdate {
                password: Some(Password::new("changed-1").expect("password")),
                ..AccountUpdate::default()
            },
        )
        .await
        .expect("update succeeds");
}

#[rstest]
#[tokio::test]
async fn admin_sees_foreign_accounts_as_missing() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(|_| Ok(Some(user(6, Role::User, Some(3)))));
    users.expect_delete().never();
    let service = make_service(users, MockTokenService::new());

    let get = service
        .get_user(actor(2, Role::Admin), user_id(6))
        .await
        .expect_err("hidden");
    let delete = service
        .delete_user(actor(2, Role::Admin), user_id(6))
        .await
        .expect_err("hidden");

    assert_eq!(get.code(), ErrorCode::NotFound);
    assert_eq!(delete.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn nobody_deletes_themselves() {
    let mut users = MockUserRepository::new();
    users.expect_delete().never();

    let err = make_service(users, MockTokenService::new())
        .delete_user(actor(1, Role::SuperAdmin), user_id(1))
        .await
        .expect_err("self delete");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn super_admin_deletes_any_account() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(|_| Ok(Some(user(6, Role::Admin, None))));
    users
        .expect_delete()
        .with(eq(user_id(6)))
        .return_once(|_| Ok(true));

    make_service(users, MockTokenService::new())
        .delete_user(actor(1, Role::SuperAdmin), user_id(6))
        .await
        .expect("delete succeeds");
}

#[rstest]
#[tokio::test]
async fn bootstrap_is_a_no_op_when_super_admin_exists() {
    let mut users = MockUserRepository::new();
    users.expect_any_super_admin().return_once(|| Ok(true));
    users.expect_insert().never();

    let outcome = make_service(users, MockTokenService::new())
        .bootstrap_super_admin(
            Email::new("root@fleet.test").expect("email"),
            &Password::new("secret-1").expect("password"),
            UserName::new("Root").expect("name"),
        )
        .await
        .expect("bootstrap");

    assert_eq!(outcome, SuperAdminBootstrap::AlreadyPresent);
}

#[rstest]
#[tokio::test]
async fn bootstrap_promotes_existing_account() {
    let mut users = MockUserRepository::new();
    users.expect_any_super_admin().return_once(|| Ok(false));
    users
        .expect_find_credentials_by_email()
        .return_once(|_| Ok(Some(credentials(user(4, Role::User, None), "x"))));
    users
        .expect_update()
        .withf(|id, changes| *id == user_id(4) && changes.role == Some(Role::SuperAdmin))
        .return_once(|_, _| Ok(Some(user(4, Role::SuperAdmin, None))));
    users.expect_insert().never();

    let outcome = make_service(users, MockTokenService::new())
        .bootstrap_super_admin(
            Email::new("user4@fleet.test").expect("email"),
            &Password::new("secret-1").expect("password"),
            UserName::new("Root").expect("name"),
        )
        .await
        .expect("bootstrap");

    assert!(matches!(outcome, SuperAdminBootstrap::Promoted(user) if user.role == Role::SuperAdmin));
}

#[rstest]
#[tokio::test]
async fn bootstrap_creates_missing_account() {
    let mut users = MockUserRepository::new();
    users.expect_any_super_admin().return_once(|| Ok(false));
    users
        .expect_find_credentials_by_email()
        .return_once(|_| Ok(None));
    users
        .expect_insert()
        .withf(|record| record.role == Role::SuperAdmin && record.created_by.is_none())
        .returning(|record| Ok(inserted(record)));

    let outcome = make_service(users, MockTokenService::new())
        .bootstrap_super_admin(
            Email::new("root@fleet.test").expect("email"),
            &Password::new("secret-1").expect("password"),
            UserName::new("Root").expect("name"),
        )
        .await
        .expect("bootstrap");

    assert!(matches!(outcome, SuperAdminBootstrap::Created(_)));
}
