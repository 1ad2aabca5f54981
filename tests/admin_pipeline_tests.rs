// Integration tests for the admin request, approval and sign-in pipeline.

mod common;

use common::{spawn_app, PASSWORD, ROOT_ADMIN};
use workbridge::{
    models::usermodel::{Decision, Profile, UserRole, VerificationStatus},
    service::{error::ServiceError, notification_service::EventKind},
};

fn request_profile() -> Profile {
    Profile {
        name: "New Admin".to_string(),
        department: Some("Trust & Safety".to_string()),
        reason: Some("Reviewing disputes".to_string()),
    }
}

#[tokio::test]
async fn test_request_outside_reserved_domain_creates_nothing() {
    let app = spawn_app().await;
    app.clear_events().await;

    for email in ["someone@gmail.com", "sneaky@eu.corp.io", "no-domain"] {
        let result = app
            .state
            .admin_service
            .register_request(email, PASSWORD, request_profile())
            .await;
        assert!(
            matches!(result, Err(ServiceError::DomainRestricted(_))),
            "{} should be restricted",
            email
        );
        assert!(app
            .state
            .identity_service
            .find_by_email(email)
            .await
            .unwrap()
            .is_none());
    }

    assert!(app.events().await.is_empty());
}

#[tokio::test]
async fn test_request_matches_domain_case_insensitively() {
    let app = spawn_app().await;

    let user = app
        .state
        .admin_service
        .register_request("Ops@STAFF.corp.net", PASSWORD, request_profile())
        .await
        .unwrap();

    assert_eq!(user.email, "ops@staff.corp.net");
    assert_eq!(user.role, UserRole::Admin);
}

#[tokio::test]
async fn test_request_then_approve_then_login() {
    let app = spawn_app().await;
    app.clear_events().await;
    let admin_service = &app.state.admin_service;

    let requested = admin_service
        .register_request("new.admin@corp.io", PASSWORD, request_profile())
        .await
        .unwrap();
    assert_eq!(
        requested.verification_status,
        VerificationStatus::PendingAdminApproval
    );
    assert!(!requested.admin_approved);
    assert_eq!(requested.department.as_deref(), Some("Trust & Safety"));

    // Pending: refused whatever the credential.
    assert!(matches!(
        admin_service.login("new.admin@corp.io", PASSWORD).await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        admin_service.login("new.admin@corp.io", "wrong-password").await,
        Err(ServiceError::Forbidden(_))
    ));

    let root = app.root_admin().await;
    let pending = admin_service.pending_requests(&root).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, requested.id);

    let approved = admin_service
        .approve_or_reject(&root, requested.id, Decision::Approved, None)
        .await
        .unwrap();
    assert!(approved.admin_approved);
    assert_eq!(approved.verification_status, VerificationStatus::Approved);
    assert_eq!(approved.approved_by, Some(root.id));
    assert!(approved.approved_at.is_some());

    assert!(admin_service.pending_requests(&root).await.unwrap().is_empty());

    assert!(matches!(
        admin_service.login("new.admin@corp.io", "wrong-password").await,
        Err(ServiceError::Unauthorized(_))
    ));

    let session = admin_service
        .login("NEW.ADMIN@corp.io", PASSWORD)
        .await
        .unwrap();
    let resolved = app
        .state
        .identity_service
        .authenticate(&session.token)
        .await
        .unwrap();
    assert_eq!(resolved.id, requested.id);

    assert_eq!(
        app.kinds().await,
        vec![EventKind::AdminRequested, EventKind::AdminDecided]
    );
    let events = app.events().await;
    let decided = &events[1];
    assert_eq!(decided.recipient_hint.as_deref(), Some("new.admin@corp.io"));
    assert_eq!(decided.payload["decision"], "approved");
}

#[tokio::test]
async fn test_reject_records_reason_and_blocks_login() {
    let app = spawn_app().await;
    let admin_service = &app.state.admin_service;
    let root = app.root_admin().await;

    let requested = admin_service
        .register_request("maybe@corp.io", PASSWORD, request_profile())
        .await
        .unwrap();

    let rejected = admin_service
        .approve_or_reject(
            &root,
            requested.id,
            Decision::Rejected,
            Some("No business need".to_string()),
        )
        .await
        .unwrap();
    assert!(!rejected.admin_approved);
    assert_eq!(rejected.verification_status, VerificationStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("No business need"));

    assert!(matches!(
        admin_service.login("maybe@corp.io", PASSWORD).await,
        Err(ServiceError::Forbidden(_))
    ));

    for decision in [Decision::Approved, Decision::Rejected] {
        assert!(matches!(
            admin_service
                .approve_or_reject(&root, requested.id, decision, None)
                .await,
            Err(ServiceError::InvalidState(_))
        ));
    }
}

#[tokio::test]
async fn test_only_approved_admins_decide() {
    let app = spawn_app().await;
    let admin_service = &app.state.admin_service;

    let requested = admin_service
        .register_request("first@corp.io", PASSWORD, request_profile())
        .await
        .unwrap();
    let other_pending = admin_service
        .register_request("second@corp.io", PASSWORD, request_profile())
        .await
        .unwrap();
    let client = app.client("client@shop.io").await;

    assert!(matches!(
        admin_service
            .approve_or_reject(&client, requested.id, Decision::Approved, None)
            .await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        admin_service
            .approve_or_reject(&other_pending, requested.id, Decision::Approved, None)
            .await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        admin_service.pending_requests(&client).await,
        Err(ServiceError::Forbidden(_))
    ));

    let still_pending = app.user("first@corp.io").await;
    assert_eq!(
        still_pending.verification_status,
        VerificationStatus::PendingAdminApproval
    );
}

#[tokio::test]
async fn test_decision_targets_must_be_pending_admins() {
    let app = spawn_app().await;
    let root = app.root_admin().await;
    let client = app.client("client@shop.io").await;

    assert!(matches!(
        app.state
            .admin_service
            .approve_or_reject(&root, uuid::Uuid::new_v4(), Decision::Approved, None)
            .await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        app.state
            .admin_service
            .approve_or_reject(&root, client.id, Decision::Approved, None)
            .await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        app.state
            .admin_service
            .approve_or_reject(&root, root.id, Decision::Rejected, None)
            .await,
        Err(ServiceError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_duplicate_request_email() {
    let app = spawn_app().await;

    app.state
        .admin_service
        .register_request("dup@corp.io", PASSWORD, request_profile())
        .await
        .unwrap();

    assert!(matches!(
        app.state
            .admin_service
            .register_request("DUP@corp.io", PASSWORD, request_profile())
            .await,
        Err(ServiceError::DuplicateEmail)
    ));
}

#[tokio::test]
async fn test_login_failures() {
    let app = spawn_app().await;
    let admin_service = &app.state.admin_service;

    assert!(matches!(
        admin_service.login("nobody@corp.io", PASSWORD).await,
        Err(ServiceError::Unauthorized(_))
    ));
    assert!(matches!(
        admin_service.login(ROOT_ADMIN, "not-the-password").await,
        Err(ServiceError::Unauthorized(_))
    ));

    // Right password, wrong kind of account.
    app.client("client@corp.io").await;
    assert!(matches!(
        admin_service.login("client@corp.io", PASSWORD).await,
        Err(ServiceError::Forbidden(_))
    ));

    assert!(admin_service.login(ROOT_ADMIN, PASSWORD).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_decisions_serialize() {
    let app = spawn_app().await;
    let root = app.root_admin().await;
    let second = app.approved_admin("second@corp.io").await;

    let target = app
        .state
        .admin_service
        .register_request("contested@corp.io", PASSWORD, request_profile())
        .await
        .unwrap();
    let target_id = target.id;

    let approve = {
        let service = app.state.admin_service.clone();
        tokio::spawn(async move {
            service
                .approve_or_reject(&root, target_id, Decision::Approved, None)
                .await
        })
    };
    let reject = {
        let service = app.state.admin_service.clone();
        tokio::spawn(async move {
            service
                .approve_or_reject(&second, target_id, Decision::Rejected, None)
                .await
        })
    };

    let results = [approve.await.unwrap(), reject.await.unwrap()];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    let losers = results
        .iter()
        .filter(|r| matches!(r, Err(ServiceError::InvalidState(_))))
        .count();
    assert_eq!((winners, losers), (1, 1));

    let decided = app.user("contested@corp.io").await;
    assert!(decided.verification_status.is_decided());
    assert_eq!(
        decided.admin_approved,
        decided.verification_status == VerificationStatus::Approved
    );
}

#[tokio::test]
async fn test_list_users_is_admin_only() {
    let app = spawn_app().await;
    let client = app.client("client@shop.io").await;
    app.freelancer("dev@work.io").await;

    let root = app.root_admin().await;
    let page = app.state.admin_service.list_users(&root, 1, 10).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.users.len(), 3);

    let first = app.state.admin_service.list_users(&root, 1, 2).await.unwrap();
    assert_eq!(first.users.len(), 2);

    assert!(matches!(
        app.state.admin_service.list_users(&client, 1, 10).await,
        Err(ServiceError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_bootstrap_is_idempotent() {
    let app = spawn_app().await;
    let again = app
        .state
        .admin_service
        .bootstrap_admin(ROOT_ADMIN, PASSWORD, "Root")
        .await
        .unwrap();
    assert!(again.is_none());

    assert!(matches!(
        app.state
            .admin_service
            .bootstrap_admin("root@gmail.com", PASSWORD, "Root")
            .await,
        Err(ServiceError::DomainRestricted(_))
    ));
}
