use lapse::enforcer::EnforcementSummary;
use lapse_shared::servers::ServerStatus;

use crate::helpers::TestApplication;

impl TestApplication {
    pub async fn post_check_expirations(&self) -> reqwest::Response {
        self.http_client()
            .post(&format!("{}/expirations/check", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

#[lapse_macros::test(strategy = "ExpiredServers")]
async fn check_suspends_only_expired_servers() {
    // Arrange
    let test_servers = app.test_servers();

    // Act
    let response = app.post_check_expirations().await;

    // Assert
    assert_eq!(200, response.status().as_u16());

    let summary = response.json::<EnforcementSummary>().await.unwrap();

    assert_eq!(2, summary.attempted);
    assert_eq!(2, summary.suspended);
    assert!(summary.failures.is_empty());

    for expired in &test_servers[..2] {
        assert_eq!(ServerStatus::Suspended, app.status_of(expired.id).await);
        assert_eq!(1, app.suspension_calls(expired.id).await);
    }

    for untouched in &test_servers[2..] {
        assert_eq!(ServerStatus::Active, app.status_of(untouched.id).await);
        assert_eq!(0, app.suspension_calls(untouched.id).await);
    }
}

#[lapse_macros::test(strategy = "ExpiredServers")]
async fn second_check_does_nothing() {
    // Arrange
    app.post_check_expirations().await;

    // Act
    let summary = app
        .post_check_expirations()
        .await
        .json::<EnforcementSummary>()
        .await
        .unwrap();

    // Assert
    assert_eq!(0, summary.attempted);

    for server in app.test_servers() {
        assert!(app.suspension_calls(server.id).await <= 1);
    }
}

#[lapse_macros::test(strategy = "ExpiredServers", daemon = "Failing")]
async fn check_reports_failures_and_leaves_status() {
    // Act
    let response = app.post_check_expirations().await;

    // Assert
    assert_eq!(200, response.status().as_u16());

    let summary = response.json::<EnforcementSummary>().await.unwrap();

    assert_eq!(2, summary.attempted);
    assert_eq!(0, summary.suspended);
    assert_eq!(2, summary.failures.len());

    for server in app.test_servers() {
        assert_eq!(ServerStatus::Active, app.status_of(server.id).await);
    }
}

#[lapse_macros::test(strategy = "ExpiredServers")]
async fn check_returns_500_when_store_is_unavailable() {
    // Arrange
    app.store.set_unavailable(true);

    // Act
    let response = app.post_check_expirations().await;

    // Assert
    assert_eq!(500, response.status().as_u16());

    app.store.set_unavailable(false);

    for server in app.test_servers() {
        assert_eq!(0, app.suspension_calls(server.id).await);
    }
}
