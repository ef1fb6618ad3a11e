use cypher_adapter::adapter::{Adapter, AdapterError, ConnectionRegistry, RegistryError, TransportError};
use cypher_adapter::config::ConnectionConfig;
use std::sync::Arc;

use super::fake_server::{FakeServer, CYPHER};

fn config(identity: &str) -> ConnectionConfig {
    ConnectionConfig {
        identity: identity.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_registries_are_isolated() {
    let adapter = Adapter::new(FakeServer::new());
    let first = ConnectionRegistry::new();
    let second = ConnectionRegistry::new();

    adapter.register(&first, config("shared")).await.unwrap();
    adapter.register(&second, config("shared")).await.unwrap();

    first.teardown(None).await;
    assert!(first.resolve("shared").await.is_err());
    assert_eq!(second.resolve("shared").await.unwrap().service.cypher, CYPHER);
}

#[tokio::test]
async fn test_concurrent_registration_of_one_identity() {
    let adapter = Arc::new(Adapter::new(FakeServer::new()));
    let registry = Arc::new(ConnectionRegistry::new());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let adapter = adapter.clone();
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            adapter.register(&registry, config("race")).await.is_ok()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(registry.identities().await, vec!["race"]);
}

#[tokio::test]
async fn test_unreachable_server_is_not_registered() {
    let adapter = Adapter::new(FakeServer::unreachable());
    let registry = ConnectionRegistry::new();

    let err = adapter.register(&registry, config("down")).await.unwrap_err();
    assert!(matches!(
        err,
        AdapterError::Transport(TransportError::Unreachable { .. })
    ));
    assert_eq!(
        registry.resolve("down").await.unwrap_err(),
        RegistryError::NotRegistered("down".to_string())
    );
}
