use lapse_shared::servers::{Paginated, ServerResponse};

use crate::helpers::{TestApplication, TestServer};

impl TestApplication {
    pub async fn get_servers(&self, page: Option<&str>) -> reqwest::Response {
        let mut request = self
            .http_client()
            .get(&format!("{}/servers", &self.address));

        if let Some(page) = page {
            request = request.query(&[("page", page)]);
        }

        request.send().await.expect("Failed to execute request.")
    }
}

#[lapse_macros::test(strategy = "ExpiredServers")]
async fn list_servers_returns_every_server_on_the_first_page() {
    // Act
    let response = app
        .get_servers(None)
        .await
        .json::<Paginated<ServerResponse>>()
        .await
        .unwrap();

    // Assert
    assert_eq!(1, response.page);
    assert_eq!(50, response.per_page);
    assert_eq!(4, response.total);
    assert_eq!(4, response.data.len());
}

#[lapse_macros::test]
async fn list_servers_is_paginated_by_50() {
    // Arrange
    for _ in 0..53 {
        TestServer::generate(lapse_shared::servers::ServerStatus::Active, None).store(&app.store);
    }

    // Act
    let first = app
        .get_servers(Some("1"))
        .await
        .json::<Paginated<ServerResponse>>()
        .await
        .unwrap();
    let second = app
        .get_servers(Some("2"))
        .await
        .json::<Paginated<ServerResponse>>()
        .await
        .unwrap();

    // Assert
    assert_eq!(50, first.data.len());
    assert_eq!(3, second.data.len());
    assert_eq!(53, second.total);
}

#[lapse_macros::test]
async fn list_servers_returns_400_for_invalid_page() {
    for page in ["0", "minus-one"] {
        // Act
        let response = app.get_servers(Some(page)).await;

        // Assert
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request for page {}",
            page
        );
    }
}

#[lapse_macros::test]
async fn list_servers_returns_500_when_store_is_unavailable() {
    // Arrange
    app.store.set_unavailable(true);

    // Act
    let response = app.get_servers(None).await;

    // Assert
    assert_eq!(500, response.status().as_u16());
}
