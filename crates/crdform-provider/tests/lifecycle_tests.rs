//! Resource lifecycle against the file store and the PodNetworkChaos fixture

use crdform_provider::{Provider, ProviderConfig, ProviderError, StateStore};
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;

const TYPE_NAME: &str = "chaos_mesh_org_pod_network_chaos_v1alpha1";

fn fixture_crds() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/crds")
}

fn provider(dir: &TempDir) -> Provider {
    let config = ProviderConfig {
        schema_paths: vec![fixture_crds()],
        state_dir: dir.path().join("state"),
        id_policy: crdform_core::IdPolicy::Monotonic,
        ..Default::default()
    };
    Provider::from_config(&config, &[]).unwrap().0
}

fn demo_config(direction: &str) -> serde_json::Value {
    json!({
        "metadata": {"name": "demo", "namespace": "chaos"},
        "spec": {
            "iptables": [{"direction": direction, "name": "chain-a", "source": "ns/app"}]
        }
    })
}

#[tokio::test]
async fn test_create_writes_state_file() {
    let dir = TempDir::new().unwrap();
    let provider = provider(&dir);

    let state = provider.create(TYPE_NAME, &demo_config("input")).await.unwrap();

    let path = dir
        .path()
        .join("state")
        .join(TYPE_NAME)
        .join(format!("{}.json", state.id));
    assert!(path.is_file());

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(stored["kind"], "PodNetworkChaos");
    assert_eq!(stored["apiVersion"], "chaos-mesh.org/v1alpha1");
    assert_eq!(stored["manifest"], state.manifest.as_str());
}

#[tokio::test]
async fn test_update_replaces_state_file() {
    let dir = TempDir::new().unwrap();
    let provider = provider(&dir);

    let first = provider.create(TYPE_NAME, &demo_config("input")).await.unwrap();
    let second = provider
        .update(TYPE_NAME, first.id, &demo_config("output"))
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert!(second.manifest.contains("direction: output"));

    let ids: Vec<u64> = provider.list(Some(TYPE_NAME)).await.unwrap().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![second.id]);
}

#[tokio::test]
async fn test_failed_validation_persists_nothing() {
    let dir = TempDir::new().unwrap();
    let provider = provider(&dir);

    let config = json!({"metadata": {"name": "demo"}, "spec": {"iptables": [{"name": "x"}]}});
    let err = provider.create(TYPE_NAME, &config).await.unwrap_err();

    let violations = err.core().and_then(|e| e.violations()).unwrap();
    let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
    assert_eq!(paths, vec!["spec.iptables[0].direction", "spec.iptables[0].source"]);
    assert!(provider.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_read_and_delete() {
    let dir = TempDir::new().unwrap();
    let provider = provider(&dir);

    let state = provider.create(TYPE_NAME, &demo_config("input")).await.unwrap();
    assert_eq!(provider.read(state.id).await.unwrap(), state);

    provider.delete(state.id).await.unwrap();
    assert!(!provider.store().exists(state.id).await.unwrap());
    assert!(matches!(
        provider.read(state.id).await,
        Err(ProviderError::StateNotFound { .. })
    ));
}

#[tokio::test]
async fn test_state_survives_reload() {
    let dir = TempDir::new().unwrap();
    let state = provider(&dir)
        .create(TYPE_NAME, &demo_config("input"))
        .await
        .unwrap();

    let reloaded = provider(&dir);
    assert_eq!(reloaded.read(state.id).await.unwrap(), state);
}
