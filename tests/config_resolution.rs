//! End-to-end configuration resolution tests.

use std::fs;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

use srv::config::remote::{crypt, KvProvider};
use srv::config::{resolve_remote, ConfigError, ConfigLoader, Params, RemoteParams};

mod common;

const DOCUMENT: &str = r#"{"server_address": ":8123", "log": {"level": "debug"}}"#;

fn remote_env(provider: &str, endpoint: &str) -> Vec<(&'static str, String)> {
    vec![
        ("SRV_REMOTECONFIGPROVIDER", provider.to_string()),
        ("SRV_REMOTECONFIGENDPOINT", endpoint.to_string()),
        ("SRV_REMOTECONFIGPATH", "/config/srv".to_string()),
    ]
}

async fn load_with(dir: &TempDir, vars: &[(&str, String)]) -> Result<Params, ConfigError> {
    let vars: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();
    ConfigLoader::new()
        .with_local(common::local_resolver(dir.path(), &vars))
        .load()
        .await
}

#[tokio::test]
async fn test_load_defaults() {
    let dir = TempDir::new().unwrap();
    let params = load_with(&dir, &[]).await.unwrap();

    assert_eq!(params.server_address, ":8080");
    assert_eq!(params.stats.prefix, "srv");
    assert_eq!(params.stats.network, "udp");
    assert_eq!(params.stats.address, ":8125");
    assert_eq!(params.stats.flush_period, 100);
    assert_eq!(params.log.level, "info");
}

#[tokio::test]
async fn test_load_fails_on_closed_port() {
    let dir = TempDir::new().unwrap();
    let vars = vec![
        ("SRV_REMOTECONFIGPROVIDER", "consul".to_string()),
        ("SRV_REMOTECONFIGENDPOINT", "127.0.0.1:1".to_string()),
        ("SRV_REMOTECONFIGPATH", "/config/svc".to_string()),
        ("SRV_REMOTECONFIGSECRETKEYRING", String::new()),
    ];

    let err = load_with(&dir, &vars).await.unwrap_err();
    assert!(matches!(err, ConfigError::RemoteUnreachable { .. }), "got {:?}", err);
    assert!(err.is_remote());
}

#[tokio::test]
async fn test_load_fails_on_unknown_provider() {
    let dir = TempDir::new().unwrap();
    let err = load_with(&dir, &remote_env("consul-like", "127.0.0.1:1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::RemoteProviderUnsupported(_)));
}

#[tokio::test]
async fn test_consul_overlay() {
    let addr = common::start_kv_backend(|target| {
        if target == "/v1/kv/config/srv?raw" {
            (200, DOCUMENT.to_string())
        } else {
            (404, String::new())
        }
    })
    .await;

    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "server_address = \":8812\"\n[stats]\nprefix = \"from-file\"\n",
    )
    .unwrap();

    let mut vars = remote_env("consul", &addr.to_string());
    vars.push(("SRV_STATS_ADDRESS", "10.0.0.9:8125".to_string()));

    let params = load_with(&dir, &vars).await.unwrap();

    assert_eq!(params.server_address, ":8123");
    assert_eq!(params.log.level, "debug");
    assert_eq!(params.stats.prefix, "from-file");
    assert_eq!(params.stats.address, "10.0.0.9:8125");
}

#[tokio::test]
async fn test_etcd_overlay() {
    let addr = common::start_kv_backend(|target| {
        if target == "/v2/keys/config/srv" {
            let body = serde_json::json!({
                "action": "get",
                "node": { "key": "/config/srv", "value": DOCUMENT }
            });
            (200, body.to_string())
        } else {
            (404, r#"{"errorCode":100,"message":"Key not found"}"#.to_string())
        }
    })
    .await;

    let dir = TempDir::new().unwrap();
    let params = load_with(&dir, &remote_env("etcd", &addr.to_string())).await.unwrap();

    assert_eq!(params.server_address, ":8123");
    assert_eq!(params.log.level, "debug");
}

#[tokio::test]
async fn test_path_not_found() {
    let addr = common::start_kv_backend(|_| (404, String::new())).await;
    let dir = TempDir::new().unwrap();

    let err = load_with(&dir, &remote_env("consul", &addr.to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::RemotePathNotFound { ref path } if path == "/config/srv"));
}

#[tokio::test]
async fn test_server_error_is_unreachable() {
    let addr = common::start_kv_backend(|_| (500, "boom".to_string())).await;
    let dir = TempDir::new().unwrap();

    let err = load_with(&dir, &remote_env("consul", &addr.to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::RemoteUnreachable { .. }));
}

#[tokio::test]
async fn test_invalid_remote_document() {
    let addr = common::start_kv_backend(|_| (200, "server_address = oops".to_string())).await;
    let dir = TempDir::new().unwrap();

    let err = load_with(&dir, &remote_env("consul", &addr.to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::RemoteInvalidDocument(_)));
}

#[tokio::test]
async fn test_encrypted_overlay() {
    let dir = TempDir::new().unwrap();
    let encoded_key = crypt::generate_key().unwrap();
    let keyring = dir.path().join("cfgkey");
    fs::write(&keyring, &encoded_key).unwrap();

    let key = crypt::key_from_base64(&encoded_key).unwrap();
    let sealed = crypt::seal(&key, DOCUMENT.as_bytes()).unwrap();
    let addr = common::start_kv_backend(move |_| (200, sealed.clone())).await;

    let mut vars = remote_env("consul", &addr.to_string());
    vars.push((
        "SRV_REMOTECONFIGSECRETKEYRING",
        keyring.display().to_string(),
    ));

    let params = load_with(&dir, &vars).await.unwrap();
    assert_eq!(params.server_address, ":8123");
    assert_eq!(params.log.level, "debug");
}

#[tokio::test]
async fn test_decryption_failures() {
    let dir = TempDir::new().unwrap();
    let keyring = dir.path().join("cfgkey");
    fs::write(&keyring, crypt::generate_key().unwrap()).unwrap();

    let other = crypt::key_from_base64(&crypt::generate_key().unwrap()).unwrap();
    let sealed = crypt::seal(&other, DOCUMENT.as_bytes()).unwrap();
    let addr = common::start_kv_backend(move |_| (200, sealed.clone())).await;

    // Sealed with a different key.
    let mut vars = remote_env("consul", &addr.to_string());
    vars.push(("SRV_REMOTECONFIGSECRETKEYRING", keyring.display().to_string()));
    let err = load_with(&dir, &vars).await.unwrap_err();
    assert!(matches!(err, ConfigError::RemoteDecryptionFailed(_)), "got {:?}", err);

    // Keyring file missing.
    let mut vars = remote_env("consul", &addr.to_string());
    vars.push(("SRV_REMOTECONFIGSECRETKEYRING", "/etc/srv/cfgkey.missing".to_string()));
    let err = load_with(&dir, &vars).await.unwrap_err();
    assert!(matches!(err, ConfigError::RemoteDecryptionFailed(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_wins_over_missing_keyring() {
    let dir = TempDir::new().unwrap();
    let mut vars = remote_env("consul", "127.0.0.1:1");
    vars.push(("SRV_REMOTECONFIGSECRETKEYRING", "/etc/srv/cfgkey.missing".to_string()));

    let err = load_with(&dir, &vars).await.unwrap_err();
    assert!(matches!(err, ConfigError::RemoteUnreachable { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_remote_fetch_is_not_cached() {
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let addr = common::start_kv_backend(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        (200, DOCUMENT.to_string())
    })
    .await;

    let remote = RemoteParams {
        provider: "consul".into(),
        endpoint: addr.to_string(),
        path: "/config/srv".into(),
        secret_keyring: String::new(),
    };

    let first = resolve_remote(Params::default(), &remote).await.unwrap();
    let second = resolve_remote(Params::default(), &remote).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_silent_provider_times_out() {
    let addr = common::start_silent_backend().await;
    let dir = TempDir::new().unwrap();
    let vars = remote_env("consul", &addr.to_string());
    let vars: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();

    let provider =
        KvProvider::with_timeouts(Duration::from_millis(200), Duration::from_millis(500)).unwrap();

    let started = Instant::now();
    let err = ConfigLoader::new()
        .with_local(common::local_resolver(dir.path(), &vars))
        .with_provider(provider)
        .load()
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(
        matches!(
            err,
            ConfigError::RemoteUnreachable { ref reason, .. } if reason == "request timed out"
        ),
        "got {:?}",
        err
    );
    assert!(elapsed >= Duration::from_millis(400), "returned after {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "returned after {:?}", elapsed);
}

#[tokio::test]
async fn test_key_with_query_chars_is_read_verbatim() {
    let addr = common::start_kv_backend(|target| {
        if target == "/v1/kv/config/svc%3Fdc=eu?raw" {
            (200, DOCUMENT.to_string())
        } else {
            (404, String::new())
        }
    })
    .await;

    let remote = RemoteParams {
        provider: "consul".into(),
        endpoint: addr.to_string(),
        path: "/config/svc?dc=eu".into(),
        secret_keyring: String::new(),
    };

    let params = resolve_remote(Params::default(), &remote).await.unwrap();
    assert_eq!(params.server_address, ":8123");
}
