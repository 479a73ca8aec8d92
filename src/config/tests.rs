use super::*;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    clear_crossrank_env();

    // SAFETY: Test code only, env-mutating tests run under #[serial].
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    clear_crossrank_env();
    result
}

fn clear_crossrank_env() {
    // SAFETY: Test code only, env-mutating tests run under #[serial].
    unsafe {
        env::remove_var("CROSSRANK_MODEL");
        env::remove_var("CROSSRANK_MODEL_ROOT");
        env::remove_var("CROSSRANK_TOP_K");
        env::remove_var("CROSSRANK_BATCH_SIZE");
        env::remove_var("CROSSRANK_MAX_SEQ_LEN");
        env::remove_var("CROSSRANK_K_VALUES");
        env::remove_var("CROSSRANK_DATASET");
    }
}

#[test]
fn test_new_uses_defaults() {
    let config = Config::new("cross-encoder/ms-marco-MiniLM-L-6-v2");

    assert_eq!(config.model.as_str(), "cross-encoder/ms-marco-MiniLM-L-6-v2");
    assert_eq!(config.model_root, PathBuf::from("./models"));
    assert_eq!(config.top_k, 4);
    assert_eq!(config.batch_size, 128);
    assert_eq!(config.max_seq_len, 512);
    assert_eq!(config.k_values, vec![1, 3, 5, 10]);
    assert!(config.dataset_path.is_none());
}

#[test]
#[serial]
fn test_from_env_requires_model() {
    let result = with_env_vars(&[], Config::from_env);

    assert!(matches!(
        result,
        Err(ConfigError::MissingEnvVar {
            name: "CROSSRANK_MODEL"
        })
    ));
}

#[test]
#[serial]
fn test_from_env_blank_model_is_missing() {
    let result = with_env_vars(&[("CROSSRANK_MODEL", "   ")], Config::from_env);

    assert!(matches!(result, Err(ConfigError::MissingEnvVar { .. })));
}

#[test]
#[serial]
fn test_from_env_defaults() {
    let config = with_env_vars(&[("CROSSRANK_MODEL", "minilm")], Config::from_env).unwrap();

    assert_eq!(config, Config::new("minilm"));
}

#[test]
#[serial]
fn test_from_env_overrides() {
    let config = with_env_vars(
        &[
            ("CROSSRANK_MODEL", "minilm"),
            ("CROSSRANK_MODEL_ROOT", "/opt/models"),
            ("CROSSRANK_TOP_K", "0"),
            ("CROSSRANK_BATCH_SIZE", "16"),
            ("CROSSRANK_MAX_SEQ_LEN", "256"),
            ("CROSSRANK_K_VALUES", "1, 5 ,20"),
            ("CROSSRANK_DATASET", "/tmp/eval.json"),
        ],
        Config::from_env,
    )
    .unwrap();

    assert_eq!(config.model_root, PathBuf::from("/opt/models"));
    assert_eq!(config.top_k, 0);
    assert_eq!(config.batch_size, 16);
    assert_eq!(config.max_seq_len, 256);
    assert_eq!(config.k_values, vec![1, 5, 20]);
    assert_eq!(config.dataset_path, Some(PathBuf::from("/tmp/eval.json")));
}

#[test]
#[serial]
fn test_from_env_rejects_zero_batch_size() {
    let result = with_env_vars(
        &[("CROSSRANK_MODEL", "minilm"), ("CROSSRANK_BATCH_SIZE", "0")],
        Config::from_env,
    );

    assert!(matches!(
        result,
        Err(ConfigError::OutOfRange {
            name: "CROSSRANK_BATCH_SIZE",
            ..
        })
    ));
}

#[test]
#[serial]
fn test_from_env_rejects_negative_top_k() {
    let result = with_env_vars(
        &[("CROSSRANK_MODEL", "minilm"), ("CROSSRANK_TOP_K", "-1")],
        Config::from_env,
    );

    assert!(matches!(
        result,
        Err(ConfigError::InvalidNumber {
            name: "CROSSRANK_TOP_K",
            ..
        })
    ));
}

#[test]
#[serial]
fn test_from_env_rejects_bad_k_values() {
    let result = with_env_vars(
        &[("CROSSRANK_MODEL", "minilm"), ("CROSSRANK_K_VALUES", "1,three")],
        Config::from_env,
    );

    assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));
}

#[test]
fn test_validate_missing_dataset() {
    let config = Config {
        dataset_path: Some(PathBuf::from("/nonexistent/eval.json")),
        ..Config::new("minilm")
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::PathNotFound { .. })
    ));
}

#[test]
fn test_validate_dataset_must_be_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        dataset_path: Some(dir.path().to_path_buf()),
        ..Config::new("minilm")
    };

    assert!(matches!(config.validate(), Err(ConfigError::NotAFile { .. })));
}

#[test]
fn test_validate_model_root_must_be_dir() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let config = Config {
        model_root: file.path().to_path_buf(),
        ..Config::new("minilm")
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::NotADirectory { .. })
    ));
}

#[test]
fn test_validate_ok() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        model_root: dir.path().to_path_buf(),
        ..Config::new("minilm")
    };

    assert!(config.validate().is_ok());
}
