/// Tests to verify that required dependencies (reqwest, tokio, axum) can be used correctly.
///
/// These tests ensure that:
/// - the blocking reqwest client used for chat can be built with timeouts
/// - tokio runtime can be used for async operations
/// - axum can bind an ephemeral listener for the API
use std::time::Duration;

#[test]
fn blocking_reqwest_client_can_be_created_with_timeout_configuration() {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(5))
        .connect_timeout(Duration::from_secs(5))
        .build()
        .expect("Failed to create reqwest client with timeout configuration");

    drop(client);
}

#[tokio::test]
async fn tokio_runtime_can_be_used_for_async_operations() {
    let result = tokio::time::timeout(Duration::from_millis(100), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        "async operation completed"
    })
    .await;

    assert!(result.is_ok());
    assert_eq!(result.unwrap(), "async operation completed");
}

#[tokio::test]
async fn tcp_listener_binds_ephemeral_port() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().unwrap();
    assert_ne!(addr.port(), 0);
}
