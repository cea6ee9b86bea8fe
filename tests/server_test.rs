//! Integration tests for the vision agent HTTP surface

#[cfg(feature = "server")]
mod server_tests {
    use flexflow_vision_agent::server::{run, ServerConfig};
    use flexflow_vision_agent::{ArmAngles, MetricsUpdate, SharedBodyState};
    use std::time::Duration;

    #[tokio::test]
    async fn test_health_endpoint() {
        let config = ServerConfig::new(0, "http://localhost:3000");
        let body = SharedBodyState::new();

        let (addr, shutdown_tx) = run(config, body).await.expect("Failed to start server");

        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "flexflow-vision");

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_metrics_endpoint_reflects_whiteboard() {
        let config = ServerConfig::new(0, "http://localhost:3000");
        let body = SharedBodyState::new();

        let (addr, shutdown_tx) =
            run(config, body.clone()).await.expect("Failed to start server");

        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();

        // Defaults before any pipeline writes.
        let response: serde_json::Value = client
            .get(format!("http://{}/metrics", addr))
            .send()
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        assert_eq!(response["is_upper_body_only"], true);
        assert_eq!(response["pointed_body_part"], "(none)");

        body.update(MetricsUpdate {
            is_upper_body_only: Some(false),
            neck_angle: Some(12.3),
            arm_angles: Some(ArmAngles {
                left_elbow: 95.0,
                right_elbow: 90.5,
            }),
            pointed_body_part: Some("Left Elbow".to_string()),
        });

        let response: serde_json::Value = client
            .get(format!("http://{}/metrics", addr))
            .send()
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        assert_eq!(response["is_upper_body_only"], false);
        assert_eq!(response["neck_angle"], 12.3);
        assert_eq!(response["arm_angles"]["right_elbow"], 90.5);
        assert_eq!(response["pointed_body_part"], "Left Elbow");

        let _ = shutdown_tx.send(());
    }
}
