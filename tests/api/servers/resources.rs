use lapse_shared::resources::{PowerState, ResourceSnapshot};
use uuid::Uuid;

use crate::helpers::TestApplication;

impl TestApplication {
    pub async fn get_resources(&self, server_id: String) -> reqwest::Response {
        self.http_client()
            .get(&format!("{}/servers/{}/resources", &self.address, server_id))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

#[lapse_macros::test(strategy = "ActiveServer")]
async fn resources_returns_live_utilization() {
    // Act
    let response = app.get_resources(app.test_server().id.to_string()).await;

    // Assert
    assert_eq!(200, response.status().as_u16());

    let snapshot = response.json::<ResourceSnapshot>().await.unwrap();

    assert_eq!(PowerState::Running, snapshot.display_state);
    assert_eq!(37.5, snapshot.cpu_usage_percent);
    assert_eq!(268435456, snapshot.memory_usage_bytes);
    assert_eq!(1073741824, snapshot.disk_usage_bytes);
    assert!(!snapshot.is_suspended);
}

#[lapse_macros::test(strategy = "SuspendedServer", daemon = "Failing")]
async fn resources_of_suspended_server_do_not_need_the_daemon() {
    // Act
    let response = app.get_resources(app.test_server().id.to_string()).await;

    // Assert
    assert_eq!(200, response.status().as_u16());

    let snapshot = response.json::<ResourceSnapshot>().await.unwrap();

    assert!(snapshot.is_suspended);
    assert_eq!(PowerState::Offline, snapshot.display_state);
}

#[lapse_macros::test(strategy = "ActiveServer", daemon = "Failing")]
async fn resources_returns_502_when_daemon_fails() {
    // Act
    let response = app.get_resources(app.test_server().id.to_string()).await;

    // Assert
    assert_eq!(502, response.status().as_u16());
}

#[lapse_macros::test]
async fn resources_returns_404_for_unknown_server() {
    // Act
    let response = app.get_resources(Uuid::new_v4().to_string()).await;

    // Assert
    assert_eq!(404, response.status().as_u16());
}
