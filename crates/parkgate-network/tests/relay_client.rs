//! Integration tests for RelayClient
//!
//! These tests run the client against mock relay controllers on loopback TCP
//! sockets. They exercise real network I/O, timeouts and failure isolation.

use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use parkgate_core::{Channel, GateAction, RelayEndpoint, constants::COMMAND_SENT};
use parkgate_network::{LinkError, RelayClient, RelayClientConfig};

fn client(timeout_ms: u64) -> RelayClient {
    RelayClient::new(RelayClientConfig {
        timeout: Duration::from_millis(timeout_ms),
    })
}

async fn bind() -> (TcpListener, RelayEndpoint) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, RelayEndpoint::new("127.0.0.1", port).unwrap())
}

/// Mock relay that answers every query with `reply`.
async fn spawn_replying_relay(reply: &'static str) -> RelayEndpoint {
    let (listener, endpoint) = bind().await;

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 64];
                if let Ok(n) = stream.read(&mut buf).await {
                    if n > 0 {
                        let _ = stream.write_all(reply.as_bytes()).await;
                    }
                }
                let _ = stream.read(&mut buf).await;
            });
        }
    });

    endpoint
}

/// Mock relay that accepts and then never says anything.
async fn spawn_silent_relay() -> RelayEndpoint {
    let (listener, endpoint) = bind().await;

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    endpoint
}

/// Test gate command bytes reach the relay and the client closes afterwards
#[tokio::test]
async fn test_control_gate_delivers_command_and_closes() {
    let (listener, endpoint) = bind().await;

    let relay = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        // Reads until the client shuts the connection down.
        stream.read_to_end(&mut received).await.unwrap();
        String::from_utf8(received).unwrap()
    });

    let ack = client(1000)
        .control_gate(&endpoint, 1, GateAction::Open)
        .await
        .unwrap();
    assert_eq!(ack.command, "all10000000");

    let received = relay.await.unwrap();
    assert_eq!(received, "all10000000");
}

/// Test closing a gate sends all zeros regardless of channel
#[tokio::test]
async fn test_close_gate_sends_cleared_vector() {
    let (listener, endpoint) = bind().await;

    let relay = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut received = String::new();
        stream.read_to_string(&mut received).await.unwrap();
        received
    });

    client(1000)
        .control_gate(&endpoint, 6, GateAction::Close)
        .await
        .unwrap();

    assert_eq!(relay.await.unwrap(), "all00000000");
}

/// Test fire-and-forget returns the sentinel even if the relay never answers
#[tokio::test]
async fn test_send_without_response_does_not_wait() {
    let endpoint = spawn_silent_relay().await;

    let started = Instant::now();
    let result = client(2000)
        .send_command(&endpoint, "all00000000", false)
        .await
        .unwrap();

    assert_eq!(result, COMMAND_SENT);
    assert!(started.elapsed() < Duration::from_millis(1000));
}

/// Test reading sensors from a mock relay
#[tokio::test]
async fn test_read_sensors_from_mock_relay() {
    let endpoint = spawn_replying_relay("input00100000\r\n").await;

    let inputs = client(1000).read_sensors(&endpoint).await.unwrap();

    assert_eq!(inputs.as_string(), "00100000");
    assert!(inputs.input(Channel::new(6).unwrap()));
    assert!(!inputs.input(Channel::new(3).unwrap()));
}

/// Test the relay sees exactly the sensor query token
#[tokio::test]
async fn test_sensor_query_token_on_wire() {
    let (listener, endpoint) = bind().await;

    let relay = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 64];
        let n = stream.read(&mut buf).await.unwrap();
        stream.write_all(b"input00000000").await.unwrap();
        String::from_utf8_lossy(&buf[..n]).to_string()
    });

    client(1000).read_sensors(&endpoint).await.unwrap();
    assert_eq!(relay.await.unwrap(), "input");
}

/// Test unexpected reply shape is a protocol error carrying the raw text
#[tokio::test]
async fn test_malformed_reply_is_protocol_error() {
    let endpoint = spawn_replying_relay("ERROR 12").await;

    let result = client(1000).read_sensors(&endpoint).await;

    assert_eq!(result, Err(LinkError::protocol("ERROR 12")));
}

/// Test the timeout bound against a relay that never responds
#[tokio::test]
async fn test_timeout_when_relay_never_answers() {
    let endpoint = spawn_silent_relay().await;
    let client = RelayClient::new(RelayClientConfig::default());

    let started = Instant::now();
    let result = client.send_command(&endpoint, "input", true).await;
    let elapsed = started.elapsed();

    assert_eq!(result, Err(LinkError::Timeout { duration_ms: 5000 }));
    assert!(elapsed >= Duration::from_millis(5000), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(5500), "elapsed {elapsed:?}");
}

/// Test connection refused surfaces as a transport error and nothing fires later
#[tokio::test]
async fn test_refused_is_transport_error_without_late_timeout() {
    let (listener, endpoint) = bind().await;
    drop(listener);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let started = Instant::now();

    tokio::spawn(async move {
        let result = client(300).send_command(&endpoint, "input", true).await;
        let _ = tx.send(result);
    });

    let first = rx.recv().await.unwrap();
    assert!(matches!(first, Err(LinkError::Transport { .. })));
    assert!(started.elapsed() < Duration::from_millis(300));

    // Wait past the deadline: the call must not have produced a second outcome.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(rx.recv().await.is_none());
}

/// Test relay that drops the connection right after accepting
#[tokio::test]
async fn test_connection_closed_before_reply() {
    let (listener, endpoint) = bind().await;

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });

    let started = Instant::now();
    let result = client(2000).read_sensors(&endpoint).await;

    assert!(matches!(result, Err(LinkError::Transport { .. })));
    assert!(started.elapsed() < Duration::from_millis(2000));
}

/// Test relay that resets the connection right after accepting
#[tokio::test]
async fn test_connection_reset_is_transport_error() {
    let (listener, endpoint) = bind().await;

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        // Zero linger turns the close into an RST.
        #[allow(deprecated)]
        stream.set_linger(Some(Duration::ZERO)).unwrap();
        drop(stream);
    });

    let started = Instant::now();
    let result = client(2000).read_sensors(&endpoint).await;

    assert!(matches!(result, Err(LinkError::Transport { .. })), "{result:?}");
    assert!(started.elapsed() < Duration::from_millis(2000));
}

/// Mock relay that answers the first query with an owned reply
async fn spawn_relay_with_reply(reply: String) -> RelayEndpoint {
    let (listener, endpoint) = bind().await;

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 64];
        let _ = stream.read(&mut buf).await;
        let _ = stream.write_all(reply.as_bytes()).await;
        let _ = stream.read(&mut buf).await;
    });

    endpoint
}

/// Test a valid reading followed by a long tail is still a reading
#[tokio::test]
async fn test_long_reply_with_valid_prefix_is_read() {
    let endpoint = spawn_relay_with_reply(format!("input00100000{}", "x".repeat(6000))).await;

    let inputs = client(1000).read_sensors(&endpoint).await.unwrap();

    assert_eq!(inputs.as_string(), "00100000");
    assert!(inputs.input(Channel::new(6).unwrap()));
}

/// Test an oversized malformed reply is a protocol error, not an unreachable gate
#[tokio::test]
async fn test_long_malformed_reply_is_protocol_error() {
    let endpoint = spawn_relay_with_reply("x".repeat(6000)).await;

    let result = client(1000).read_sensors(&endpoint).await;

    match result {
        Err(LinkError::Protocol { raw }) => {
            assert!(raw.starts_with("xxxx"));
            assert!(raw.len() <= 4096);
        }
        other => panic!("expected protocol error, got {other:?}"),
    }
}

/// Test a slow gate does not delay or fail a healthy one
#[tokio::test]
async fn test_concurrent_calls_are_isolated() {
    let slow = spawn_silent_relay().await;
    let healthy = spawn_replying_relay("input00000001").await;
    let client = client(400);

    let (slow_result, healthy_result) =
        tokio::join!(client.read_sensors(&slow), async {
            let started = Instant::now();
            let result = client.read_sensors(&healthy).await;
            (result, started.elapsed())
        });

    assert_eq!(slow_result, Err(LinkError::timeout(400)));

    let (healthy_result, healthy_elapsed) = healthy_result;
    assert!(healthy_result.unwrap().input(Channel::new(1).unwrap()));
    assert!(healthy_elapsed < Duration::from_millis(400));
}

/// Test many concurrent calls against the same relay each get their own socket
#[tokio::test]
async fn test_parallel_calls_same_endpoint() {
    let endpoint = spawn_replying_relay("input10000000").await;
    let client = client(1000);

    let calls = (0..8).map(|_| client.read_sensors(&endpoint));
    let results = futures::future::join_all(calls).await;

    for result in results {
        assert!(result.unwrap().input(Channel::new(8).unwrap()));
    }
}
