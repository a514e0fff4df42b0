use chrono::{Duration, Utc};
use lapse_db::ServerStore;
use lapse_shared::servers::ServerResponse;
use uuid::Uuid;

use crate::helpers::{TestApplication, TestServer};

impl TestApplication {
    pub async fn put_expiration(
        &self,
        server_id: String,
        body: serde_json::Value,
    ) -> reqwest::Response {
        self.http_client()
            .put(&format!("{}/servers/{}/expiration", &self.address, server_id))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

#[lapse_macros::test(strategy = "ActiveServer")]
async fn extension_adds_days_to_current_expiration() {
    // Arrange
    let test_server = app.test_server();
    let current = test_server.expires_at.unwrap();

    // Act
    let response = app
        .put_expiration(test_server.id.to_string(), serde_json::json!({ "days": 10 }))
        .await;

    // Assert
    assert_eq!(200, response.status().as_u16());

    let server = response.json::<ServerResponse>().await.unwrap();

    assert_eq!(
        (current + Duration::days(10)).timestamp(),
        server.expires_at.unwrap().timestamp()
    );
}

#[lapse_macros::test(strategy = "ActiveServer")]
async fn concurrent_extensions_are_not_lost() {
    // Arrange
    let test_server = app.test_server();
    let current = test_server.expires_at.unwrap();
    let id = test_server.id.to_string();

    // Act
    let (first, second) = tokio::join!(
        app.put_expiration(id.clone(), serde_json::json!({ "days": 10 })),
        app.put_expiration(id.clone(), serde_json::json!({ "days": 10 }))
    );

    // Assert
    assert_eq!(200, first.status().as_u16());
    assert_eq!(200, second.status().as_u16());

    let server = app
        .store
        .server(test_server.id)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        (current + Duration::days(20)).timestamp(),
        server.expires_at.unwrap().timestamp()
    );
}

#[lapse_macros::test(strategy = "ActiveServer")]
async fn extension_defaults_to_30_days() {
    // Arrange
    let test_server = app.test_server();
    let current = test_server.expires_at.unwrap();

    // Act
    let server = app
        .put_expiration(test_server.id.to_string(), serde_json::json!({}))
        .await
        .json::<ServerResponse>()
        .await
        .unwrap();

    // Assert
    assert_eq!(
        (current + Duration::days(30)).timestamp(),
        server.expires_at.unwrap().timestamp()
    );
}

#[lapse_macros::test]
async fn extension_of_unlimited_server_starts_from_now() {
    // Arrange
    let test_server = TestServer::generate(lapse_shared::servers::ServerStatus::Active, None);
    test_server.store(&app.store);
    let before = Utc::now();

    // Act
    let server = app
        .put_expiration(test_server.id.to_string(), serde_json::json!({ "days": 7 }))
        .await
        .json::<ServerResponse>()
        .await
        .unwrap();

    // Assert
    let expires_at = server.expires_at.unwrap();

    assert!(expires_at >= before + Duration::days(7));
    assert!(expires_at <= Utc::now() + Duration::days(7));
}

#[lapse_macros::test(strategy = "SuspendedServer")]
async fn extension_does_not_unsuspend() {
    // Act
    app.put_expiration(
        app.test_server().id.to_string(),
        serde_json::json!({ "days": 365 }),
    )
    .await;

    // Assert
    assert_eq!(
        lapse_shared::servers::ServerStatus::Suspended,
        app.status_of(app.test_server().id).await
    );
    assert_eq!(0, app.suspension_calls(app.test_server().id).await);
}

#[lapse_macros::test(strategy = "ActiveServer")]
async fn extension_returns_400_for_invalid_days() {
    // Arrange
    let test_cases = vec![
        (serde_json::json!({ "days": 0 }), "zero days"),
        (serde_json::json!({ "days": -5 }), "negative days"),
        (serde_json::json!({ "days": 3651 }), "more than ten years"),
        (serde_json::json!({ "days": "ten" }), "days as string"),
    ];

    for (body, message) in test_cases {
        // Act
        let response = app
            .put_expiration(app.test_server().id.to_string(), body)
            .await;

        // Assert
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload had {}.",
            message
        );
    }
}

#[lapse_macros::test]
async fn extension_returns_404_for_unknown_server() {
    // Act
    let response = app
        .put_expiration(Uuid::new_v4().to_string(), serde_json::json!({ "days": 5 }))
        .await;

    // Assert
    assert_eq!(404, response.status().as_u16());
}
