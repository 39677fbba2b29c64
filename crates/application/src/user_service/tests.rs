use std::sync::Arc;

use wardbook_core::AppError;
use wardbook_domain::{Grant, Permission, Role, UserId};

use crate::test_support::{FakePasswordHasher, FakeSecurityStore, identity_of};
use crate::{AuthorizationService, UserAccount, UserService};

struct Fixture {
    store: Arc<FakeSecurityStore>,
    service: UserService,
    admin: UserAccount,
    admin_role: Role,
    clerk: UserAccount,
    clerk_role: Role,
}

async fn fixture() -> Fixture {
    let store = Arc::new(FakeSecurityStore::default());
    let admin_role = store.seed_role("Admin", &[Grant::All]).await;
    let clerk_role = store
        .seed_role("Clerk", &[Grant::Permission(Permission::AccessSurvey)])
        .await;
    let admin = store.seed_user("admin@ward.example.in", admin_role.id).await;
    let clerk = store.seed_user("clerk@ward.example.in", clerk_role.id).await;
    let service = UserService::new(
        AuthorizationService::new(store.clone()),
        store.clone(),
        store.clone(),
        Arc::new(FakePasswordHasher),
    );

    Fixture {
        store,
        service,
        admin,
        admin_role,
        clerk,
        clerk_role,
    }
}

#[tokio::test]
async fn login_returns_identity_for_valid_credentials() {
    let fixture = fixture().await;

    let identity = fixture
        .service
        .login("  Clerk@Ward.Example.in ", "secret-password")
        .await;

    let Ok(identity) = identity else {
        panic!("login should succeed");
    };
    assert_eq!(identity.subject(), fixture.clerk.id.to_string());
    assert_eq!(identity.email(), Some("clerk@ward.example.in"));
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let fixture = fixture().await;

    let wrong_password = fixture
        .service
        .login("clerk@ward.example.in", "not-the-password")
        .await;
    let unknown_email = fixture
        .service
        .login("nobody@ward.example.in", "secret-password")
        .await;
    let malformed = fixture.service.login("not-an-email", "secret-password").await;

    let messages: Vec<String> = [wrong_password, unknown_email, malformed]
        .into_iter()
        .map(|result| match result {
            Err(AppError::Unauthorized(message)) => message,
            other => panic!("expected unauthorized, got {other:?}"),
        })
        .collect();
    assert!(messages.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn admin_user_cannot_be_deleted() {
    let fixture = fixture().await;

    let result = fixture
        .service
        .delete_user(&identity_of(&fixture.admin), fixture.admin.id)
        .await;

    assert!(matches!(result, Err(AppError::PolicyViolation(_))));
    assert!(fixture.store.user(fixture.admin.id).await.is_some());
}

#[tokio::test]
async fn admin_can_delete_regular_user() {
    let fixture = fixture().await;

    let result = fixture
        .service
        .delete_user(&identity_of(&fixture.admin), fixture.clerk.id)
        .await;

    assert!(result.is_ok());
    assert!(fixture.store.user(fixture.clerk.id).await.is_none());
}

#[tokio::test]
async fn deleting_unknown_user_is_not_found() {
    let fixture = fixture().await;

    let result = fixture
        .service
        .delete_user(&identity_of(&fixture.admin), UserId::new())
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn admin_membership_cannot_change() {
    let fixture = fixture().await;
    let admin = identity_of(&fixture.admin);

    let demote = fixture
        .service
        .change_user_role(&admin, fixture.admin.id, fixture.clerk_role.id)
        .await;
    assert!(matches!(demote, Err(AppError::PolicyViolation(_))));

    let promote = fixture
        .service
        .change_user_role(&admin, fixture.clerk.id, fixture.admin_role.id)
        .await;
    assert!(matches!(promote, Err(AppError::PolicyViolation(_))));
}

#[tokio::test]
async fn regular_user_can_move_between_custom_roles() {
    let fixture = fixture().await;
    let inspector = fixture
        .store
        .seed_role("Inspector", &[Grant::Permission(Permission::EditSurvey)])
        .await;

    let result = fixture
        .service
        .change_user_role(&identity_of(&fixture.admin), fixture.clerk.id, inspector.id)
        .await;

    assert!(result.is_ok());
    let role_id = fixture
        .store
        .user(fixture.clerk.id)
        .await
        .map(|user| user.role_id);
    assert_eq!(role_id, Some(inspector.id));
}

#[tokio::test]
async fn regular_user_cannot_administer_users() {
    let fixture = fixture().await;

    let result = fixture
        .service
        .delete_user(&identity_of(&fixture.clerk), fixture.admin.id)
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}
