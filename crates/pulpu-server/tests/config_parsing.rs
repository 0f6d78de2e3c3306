use std::{env, fs, time::Duration};

use pulpu_server::config::loader::{load_config, load_config_with_default_path};

const SECRET_HEX: &str = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    // Create a temporary TOML configuration file
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("pulpu.toml");

    let toml_content = format!(
        r#"
[server]
host = "127.0.0.1"
port = 8081

[logging]
level = "debug"

[auth.session]
secret_key = "{SECRET_HEX}"
duration = "2h"
cookie_name = "sid"

[auth.google]
client_id = "client.apps.googleusercontent.com"
client_secret = "file-secret"
callback_url = "https://pulpu.example.com/auth/google/callback"
request_timeout = "5s"
"#
    );
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.addr().to_string(), "127.0.0.1:8081");
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.auth.session.duration, Duration::from_secs(7200));
    assert_eq!(cfg.auth.session.cookie_name, "sid");
    assert_eq!(cfg.auth.google.client_secret, "file-secret");
    assert_eq!(cfg.auth.google.request_timeout, Duration::from_secs(5));
    assert_eq!(cfg.auth.routes.after_login, "/protected");

    let settings = cfg.auth.session_settings().expect("session settings");
    assert_eq!(settings.key.to_hex(), SECRET_HEX);

    // 2) Env override should win over file
    unsafe {
        env::set_var("PULPU__SERVER__PORT", "9090");
        env::set_var("PULPU__AUTH__GOOGLE__CLIENT_SECRET", "env-secret");
    }
    let cfg_env = load_config_with_default_path(Some(&path))
        .expect("should parse config with env overrides");
    assert_eq!(cfg_env.server.port, 9090);
    assert_eq!(cfg_env.auth.google.client_secret, "env-secret");
    // cleanup env vars
    unsafe {
        env::remove_var("PULPU__SERVER__PORT");
        env::remove_var("PULPU__AUTH__GOOGLE__CLIENT_SECRET");
    }

    // 3) Short secret key should fail validation
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[auth.session]
secret_key = "00ff00ff"

[auth.google]
client_id = "client"
client_secret = "secret"
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("at least 32 bytes"), "{err}");

    // 4) Missing secret key is reported by name
    let missing_path = dir.path().join("missing.toml");
    fs::write(&missing_path, "[auth.google]\nclient_id = \"c\"\nclient_secret = \"s\"\n")
        .expect("write toml");
    let err = load_config(missing_path.to_str()).expect_err("expected missing secret");
    assert!(err.contains("auth.session.secret_key"), "{err}");

    // 5) An explicit path that does not exist is an error
    let err = load_config(dir.path().join("absent.toml").to_str()).expect_err("expected error");
    assert!(err.contains("not found"), "{err}");
}
