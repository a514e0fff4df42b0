use lapse_shared::servers::{ServerResponse, ServerStatus};
use uuid::Uuid;

use crate::helpers::TestApplication;

impl TestApplication {
    pub async fn get_server(&self, server_id: String) -> reqwest::Response {
        self.http_client()
            .get(&format!("{}/servers/{}", &self.address, server_id))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

#[lapse_macros::test(strategy = "ActiveServer")]
async fn get_server_returns_200_for_existing_server() {
    // Act
    let response = app.get_server(app.test_server().id.to_string()).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
}

#[lapse_macros::test(strategy = "ActiveServer")]
async fn get_server_returns_persisted_status_and_expiration() {
    // Act
    let response = app
        .get_server(app.test_server().id.to_string())
        .await
        .json::<ServerResponse>()
        .await
        .unwrap();

    // Assert
    assert_eq!(app.test_server().id, response.id);
    assert_eq!(app.test_server().name, response.name);
    assert_eq!(ServerStatus::Active, response.status);
    assert_eq!(
        app.test_server().expires_at.map(|e| e.timestamp()),
        response.expires_at.map(|e| e.timestamp())
    );
    assert_eq!(1024, response.limits.memory);
    assert_eq!(0, response.limits.disk);
    assert_eq!(
        Some("play.example.com"),
        response
            .default_allocation()
            .and_then(|allocation| allocation.alias.as_deref())
    );
}

#[lapse_macros::test(strategy = "SuspendedServer")]
async fn get_server_reflects_suspension() {
    // Act
    let response = app
        .get_server(app.test_server().id.to_string())
        .await
        .json::<ServerResponse>()
        .await
        .unwrap();

    // Assert
    assert_eq!(ServerStatus::Suspended, response.status);
}

#[lapse_macros::test]
async fn get_server_returns_404_for_unknown_server() {
    // Act
    let response = app.get_server(Uuid::new_v4().to_string()).await;

    // Assert
    assert_eq!(404, response.status().as_u16());
}

#[lapse_macros::test]
async fn get_server_returns_404_for_invalid_id() {
    // Act
    let response = app.get_server("not-a-uuid".to_string()).await;

    // Assert
    assert_eq!(404, response.status().as_u16());
}
