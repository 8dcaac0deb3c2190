use marketplace_api::routes::health::health_check;

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    let json = serde_json::to_value(&data).expect("serialize");
    assert_eq!(json["status"], "ok");
}
