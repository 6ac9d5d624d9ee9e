//! Unit tests for configuration parsing, defaults, and credential loading.

use outreach_relay::config::GlobalConfig;
use serial_test::serial;

fn minimal_toml() -> &'static str {
    r#"
[google]
client_id = "client-123.apps.googleusercontent.com"
"#
}

#[test]
fn minimal_config_parses_with_defaults() {
    let config = GlobalConfig::from_toml_str(minimal_toml()).expect("valid config");
    assert_eq!(config.http_port, 8080);
    assert_eq!(
        config.google.token_uri,
        "https://oauth2.googleapis.com/token"
    );
    assert_eq!(
        config.google.send_endpoint,
        "https://gmail.googleapis.com/gmail/v1/users/me/messages/send"
    );
    assert_eq!(config.send.default_batch_size, 10);
    assert_eq!(config.send.default_pace_ms, 250);
    assert_eq!(config.send.preview_limit, 5);
    // Secrets never come from the file.
    assert!(config.callback_secret.is_empty());
    assert!(config.google.client_secret.is_empty());
    assert!(config.google.refresh_token.is_empty());
}

#[test]
fn explicit_values_override_defaults() {
    let toml = r#"
http_port = 9090

[google]
client_id = "client-123"
token_uri = "http://localhost:1/token"
send_endpoint = "http://localhost:1/send"

[send]
default_batch_size = 25
default_pace_ms = 0
preview_limit = 3
"#;
    let config = GlobalConfig::from_toml_str(toml).expect("valid config");
    assert_eq!(config.http_port, 9090);
    assert_eq!(config.google.token_uri, "http://localhost:1/token");
    assert_eq!(config.send.default_batch_size, 25);
    assert_eq!(config.send.default_pace_ms, 0);
    assert_eq!(config.send.preview_limit, 3);
}

#[test]
fn empty_client_id_is_rejected() {
    let toml = r#"
[google]
client_id = "  "
"#;
    assert!(GlobalConfig::from_toml_str(toml).is_err());
}

#[test]
fn zero_batch_size_is_rejected() {
    let toml = r#"
[google]
client_id = "client-123"

[send]
default_batch_size = 0
"#;
    assert!(GlobalConfig::from_toml_str(toml).is_err());
}

#[test]
fn oversized_batch_size_is_rejected() {
    let toml = r#"
[google]
client_id = "client-123"

[send]
default_batch_size = 51
"#;
    assert!(GlobalConfig::from_toml_str(toml).is_err());
}

#[test]
fn zero_preview_limit_is_rejected() {
    let toml = r#"
[google]
client_id = "client-123"

[send]
preview_limit = 0
"#;
    assert!(GlobalConfig::from_toml_str(toml).is_err());
}

#[test]
fn missing_google_table_is_rejected() {
    assert!(GlobalConfig::from_toml_str("http_port = 8080").is_err());
}

#[tokio::test]
#[serial]
async fn credentials_fall_back_to_env_vars() {
    std::env::set_var("CALLBACK_SIGNING_SECRET", "env-callback-secret");
    std::env::set_var("GOOGLE_CLIENT_SECRET", "env-client-secret");
    std::env::set_var("GOOGLE_REFRESH_TOKEN", "env-refresh-token");

    let mut config = GlobalConfig::from_toml_str(minimal_toml()).expect("valid config");
    config.load_credentials().await.expect("credentials load");

    assert_eq!(config.callback_secret, "env-callback-secret");
    assert_eq!(config.google.client_secret, "env-client-secret");
    assert_eq!(config.google.refresh_token, "env-refresh-token");

    std::env::remove_var("CALLBACK_SIGNING_SECRET");
    std::env::remove_var("GOOGLE_CLIENT_SECRET");
    std::env::remove_var("GOOGLE_REFRESH_TOKEN");
}

#[tokio::test]
#[serial]
async fn missing_credentials_everywhere_is_an_error() {
    std::env::remove_var("CALLBACK_SIGNING_SECRET");
    std::env::remove_var("GOOGLE_CLIENT_SECRET");
    std::env::remove_var("GOOGLE_REFRESH_TOKEN");

    let mut config = GlobalConfig::from_toml_str(minimal_toml()).expect("valid config");
    assert!(config.load_credentials().await.is_err());
}
