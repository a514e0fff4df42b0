#[lapse_macros::test]
async fn health_check_works() {
    // Act
    let response = app
        .http_client()
        .get(&format!("{}/health_check", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    // Assert
    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length());
}
