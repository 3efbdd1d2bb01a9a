use std::{env, fs};

use clinic_db_postgres::DatabaseTarget;
use clinic_server::StorageBackend;
use clinic_server::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("clinic.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081
body_limit_bytes = 4096

[storage]
backend = "postgres"

[storage.postgres]
host = "db.internal"
port = 5433
user = "clinic"
password = "clinic"
pool_size = 4

[auth]
jwt_secret = "0123456789abcdef0123456789abcdef"
token_lifetime_secs = 900

[logging]
level = "debug"

[bootstrap.admin_user]
username = "admin"
password = "change-me"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.storage.backend, StorageBackend::Postgres);
    assert_eq!(
        cfg.storage.postgres.to_postgres_config().target,
        DatabaseTarget::Parts {
            host: "db.internal".into(),
            port: 5433,
            user: "clinic".into(),
            password: Some("clinic".into()),
            database: "healthcare_management".into(),
        }
    );
    assert_eq!(cfg.auth.token_lifetime_secs, 900);
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(
        cfg.bootstrap.admin_user.as_ref().map(|a| a.username.as_str()),
        Some("admin")
    );

    // 2) Env override should win over file
    unsafe {
        env::set_var("CLINIC__SERVER__PORT", "9099");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.server.port, 9099);
    unsafe {
        env::remove_var("CLINIC__SERVER__PORT");
    }

    // 3) A short secret fails validation
    let short = toml_content.replace("0123456789abcdef0123456789abcdef", "short");
    fs::write(&path, short).expect("write toml");
    let err = load_config(path.to_str()).unwrap_err();
    assert!(err.contains("jwt_secret"), "{err}");
}
