//! Mock relay controllers for control integration tests.
//!
//! A [`MockRelay`] listens on a loopback port and behaves like a relay
//! controller: it records every command it receives and answers sensor
//! queries with a configurable reply. Its behaviour can be switched while a
//! test runs to simulate a relay going down and coming back.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use parkgate_control::{GateConfig, GateRole, LinkSettings};
use parkgate_network::{RelayClient, RelayClientConfig};

/// What the relay does with the next connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Read the command and answer with this text.
    Reply(&'static str),
    /// Accept the connection and drop it without answering.
    Hangup,
}

#[derive(Clone)]
pub struct MockRelay {
    pub port: u16,
    behaviour: Arc<Mutex<Behaviour>>,
    received: Arc<Mutex<Vec<String>>>,
}

impl MockRelay {
    pub async fn spawn(behaviour: Behaviour) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let relay = Self {
            port: listener.local_addr().unwrap().port(),
            behaviour: Arc::new(Mutex::new(behaviour)),
            received: Arc::new(Mutex::new(Vec::new())),
        };

        let shared = relay.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let relay = shared.clone();
                tokio::spawn(async move {
                    let behaviour = *relay.behaviour.lock().unwrap();
                    if behaviour == Behaviour::Hangup {
                        return;
                    }

                    let mut buf = [0u8; 64];
                    let n = stream.read(&mut buf).await.unwrap_or(0);
                    relay
                        .received
                        .lock()
                        .unwrap()
                        .push(String::from_utf8_lossy(&buf[..n]).to_string());

                    if let Behaviour::Reply(reply) = behaviour {
                        let _ = stream.write_all(reply.as_bytes()).await;
                    }
                    let _ = stream.read(&mut buf).await;
                });
            }
        });

        relay
    }

    pub fn set(&self, behaviour: Behaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    /// Commands received so far, in arrival order.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    pub fn gate(&self, name: &str, channel: u8, role: GateRole) -> GateConfig {
        GateConfig {
            name: name.to_string(),
            host: "127.0.0.1".to_string(),
            port: self.port,
            channel,
            role,
        }
    }
}

/// A port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

pub fn client() -> RelayClient {
    RelayClient::new(RelayClientConfig {
        timeout: Duration::from_millis(1000),
    })
}

pub fn settings() -> LinkSettings {
    LinkSettings {
        timeout_ms: 1000,
        poll_interval_ms: 50,
        offline_threshold: 3,
    }
}

/// Wait briefly so relay tasks can record what they received.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
