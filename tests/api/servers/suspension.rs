use lapse_shared::servers::ServerStatus;
use uuid::Uuid;

use crate::helpers::TestApplication;

impl TestApplication {
    pub async fn post_suspension(&self, server_id: String, action: &str) -> reqwest::Response {
        self.http_client()
            .post(&format!("{}/servers/{}/suspension", &self.address, server_id))
            .json(&serde_json::json!({ "action": action }))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

#[lapse_macros::test(strategy = "ActiveServer")]
async fn suspend_returns_204_and_persists_status() {
    // Act
    let response = app
        .post_suspension(app.test_server().id.to_string(), "suspend")
        .await;

    // Assert
    assert_eq!(204, response.status().as_u16());
    assert_eq!(ServerStatus::Suspended, app.status_of(app.test_server().id).await);
    assert_eq!(1, app.suspension_calls(app.test_server().id).await);
}

#[lapse_macros::test(strategy = "SuspendedServer")]
async fn unsuspend_restores_active_status() {
    // Act
    let response = app
        .post_suspension(app.test_server().id.to_string(), "unsuspend")
        .await;

    // Assert
    assert_eq!(204, response.status().as_u16());
    assert_eq!(ServerStatus::Active, app.status_of(app.test_server().id).await);
}

#[lapse_macros::test(strategy = "SuspendedServer")]
async fn suspending_a_suspended_server_is_a_no_op() {
    // Act
    let response = app
        .post_suspension(app.test_server().id.to_string(), "suspend")
        .await;

    // Assert
    assert_eq!(204, response.status().as_u16());
    assert_eq!(0, app.suspension_calls(app.test_server().id).await);
}

#[lapse_macros::test(strategy = "ActiveServer", daemon = "Failing")]
async fn daemon_failure_returns_502_and_keeps_status() {
    // Act
    let response = app
        .post_suspension(app.test_server().id.to_string(), "suspend")
        .await;

    // Assert
    assert_eq!(502, response.status().as_u16());
    assert_eq!(ServerStatus::Active, app.status_of(app.test_server().id).await);
}

#[lapse_macros::test(strategy = "ActiveServer")]
async fn unknown_action_returns_400() {
    // Act
    let response = app
        .post_suspension(app.test_server().id.to_string(), "hibernate")
        .await;

    // Assert
    assert_eq!(400, response.status().as_u16());
    assert_eq!(0, app.suspension_calls(app.test_server().id).await);
}

#[lapse_macros::test]
async fn suspend_returns_404_for_unknown_server() {
    // Act
    let response = app
        .post_suspension(Uuid::new_v4().to_string(), "suspend")
        .await;

    // Assert
    assert_eq!(404, response.status().as_u16());
}
