mod common;

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use roomcheck_api::config::GatewayConfig;
use roomcheck_api::gateway::{
    AdminGateway, BulkProgress, CancelFlag, GatewayError, RequestError,
};
use roomcheck_api::store::{NewUser, UploadStore, UserDirectory};

fn test_gateway_config() -> GatewayConfig {
    GatewayConfig {
        request_timeout_ms: 5_000,
        max_retry_attempts: 3,
        backoff_base_ms: 1,
        backoff_cap_ms: 4,
    }
}

#[tokio::test]
async fn gateway_lists_uploads_through_the_envelope() -> Result<()> {
    let server = common::spawn_server().await?;
    let at = Utc::now();
    server
        .uploads
        .seed(vec![common::sample_upload("ra-1", at), common::sample_upload("ra-2", at)])
        .await;

    let gateway =
        AdminGateway::connect(&server.base_url, common::admin_token(), test_gateway_config());

    let uploads = gateway.list_uploads().await?;
    assert_eq!(uploads.len(), 2);
    Ok(())
}

#[tokio::test]
async fn bulk_delete_captures_the_missing_item_and_continues() -> Result<()> {
    let server = common::spawn_server().await?;
    let base = Utc::now();
    let uploads: Vec<_> = (0..3)
        .map(|i| common::sample_upload(&format!("ra-{}", i), base + ChronoDuration::seconds(i)))
        .collect();

    // item 2 (index 1) is never seeded, so its backend call returns 404
    let seeded = vec![uploads[0].clone(), uploads[2].clone()];
    server.uploads.seed(seeded).await;

    let gateway =
        AdminGateway::connect(&server.base_url, common::admin_token(), test_gateway_config());

    let mut progress: Vec<BulkProgress> = Vec::new();
    let cancel = CancelFlag::new();
    let result = gateway
        .bulk_delete_uploads(&uploads, |p| progress.push(p), &cancel)
        .await;

    assert_eq!(result.successful.len(), 2);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.attempted(), 3);
    assert_eq!(result.failed[0].message, "upload not found");

    assert_eq!(progress.len(), 3);
    for (i, p) in progress.iter().enumerate() {
        assert_eq!(p.current, i + 1);
        assert_eq!(p.total, 3);
    }

    // Both real deletions landed and were audited
    assert!(server.uploads.list().await?.is_empty());
    assert_eq!(server.audit_log.records().await.len(), 2);
    Ok(())
}

#[tokio::test]
async fn cancelled_bulk_run_returns_partial_results() -> Result<()> {
    let server = common::spawn_server().await?;
    let base = Utc::now();
    let uploads: Vec<_> = (0..5)
        .map(|i| common::sample_upload(&format!("ra-{}", i), base + ChronoDuration::seconds(i)))
        .collect();
    server.uploads.seed(uploads.clone()).await;

    let gateway =
        AdminGateway::connect(&server.base_url, common::admin_token(), test_gateway_config());

    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    let result = gateway
        .bulk_delete_uploads(
            &uploads,
            |p| {
                if p.current == 2 {
                    flag.cancel();
                }
            },
            &cancel,
        )
        .await;

    assert!(result.cancelled);
    assert_eq!(result.attempted(), 2);
    assert_eq!(server.uploads.list().await?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn gateway_surfaces_backend_404_as_a_client_error() -> Result<()> {
    let server = common::spawn_server().await?;
    let gateway =
        AdminGateway::connect(&server.base_url, common::admin_token(), test_gateway_config());

    let err = gateway.delete_user("ghost", "ghost@dorm.example.com").await.unwrap_err();
    match err {
        GatewayError::Request(RequestError::Client { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "User not found");
        }
        other => panic!("expected client error, got: {}", other),
    }
    Ok(())
}

#[tokio::test]
async fn gateway_rejects_incomplete_mutations_before_the_wire() -> Result<()> {
    let server = common::spawn_server().await?;
    let gateway =
        AdminGateway::connect(&server.base_url, common::admin_token(), test_gateway_config());

    let err = gateway.delete_user("", "ra@dorm.example.com").await.unwrap_err();
    assert!(matches!(err, GatewayError::Validation(_)));

    // create_user enforces the same required fields the backend does
    let err = gateway
        .create_user(&NewUser {
            email: "new-ra@dorm.example.com".to_string(),
            first_name: "Sam".to_string(),
            last_name: String::new(),
            role: "RA".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Validation(_)));
    assert!(server.users.list().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn gateway_creates_and_lists_users() -> Result<()> {
    let server = common::spawn_server().await?;
    let gateway =
        AdminGateway::connect(&server.base_url, common::admin_token(), test_gateway_config());

    let account = gateway
        .create_user(&NewUser {
            email: "new-ra@dorm.example.com".to_string(),
            first_name: "Sam".to_string(),
            last_name: "Cho".to_string(),
            role: "RA".to_string(),
        })
        .await?;
    assert_eq!(account.email, "new-ra@dorm.example.com");

    let users = gateway.list_users().await?;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].user_id, account.user_id);
    Ok(())
}

#[tokio::test]
async fn expired_credential_fails_every_bulk_item_without_mutating() -> Result<()> {
    let server = common::spawn_server().await?;
    let base = Utc::now();
    let uploads: Vec<_> = (0..2)
        .map(|i| common::sample_upload(&format!("ra-{}", i), base + ChronoDuration::seconds(i)))
        .collect();
    server.uploads.seed(uploads.clone()).await;

    let expired = common::mint_token("admin-1", vec!["Admins"], -1);
    let gateway = AdminGateway::connect(&server.base_url, expired, test_gateway_config());

    let cancel = CancelFlag::new();
    let result = gateway.bulk_delete_uploads(&uploads, |_| {}, &cancel).await;

    assert!(result.successful.is_empty());
    assert_eq!(result.failed.len(), 2);
    assert_eq!(server.uploads.list().await?.len(), 2);
    assert!(server.audit_log.records().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn gateway_health_probe() -> Result<()> {
    let server = common::spawn_server().await?;
    let gateway =
        AdminGateway::connect(&server.base_url, common::admin_token(), test_gateway_config());
    assert!(gateway.health().await);
    Ok(())
}
