use mediaops_core::config::{CoreConfig, ENV_SEARCH_DIRS, ENV_THUMBNAIL_DIR, ENV_TIMEOUT_SECS};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Environment variables are process-wide, so every case lives in one test.
#[test]
fn test_env_var_overrides() {
    // SAFETY: no other test in this binary touches the environment.
    unsafe {
        env::remove_var(ENV_SEARCH_DIRS);
        env::remove_var(ENV_THUMBNAIL_DIR);
        env::remove_var(ENV_TIMEOUT_SECS);
    }
    let defaults = CoreConfig::from_env();
    assert_eq!(defaults.search_dirs, CoreConfig::default().search_dirs);
    assert!(defaults.operation_timeout.is_none());

    let dirs = env::join_paths(["/custom/bin", "/other/bin"]).unwrap();
    unsafe {
        env::set_var(ENV_SEARCH_DIRS, &dirs);
        env::set_var(ENV_THUMBNAIL_DIR, "/tmp/mediaops-test-thumbs");
        env::set_var(ENV_TIMEOUT_SECS, "90");
    }
    let config = CoreConfig::from_env();
    assert_eq!(
        config.search_dirs,
        vec![PathBuf::from("/custom/bin"), PathBuf::from("/other/bin")]
    );
    assert_eq!(config.thumbnail_dir, PathBuf::from("/tmp/mediaops-test-thumbs"));
    assert_eq!(config.operation_timeout, Some(Duration::from_secs(90)));

    // Zero disables the timeout, garbage is ignored.
    unsafe {
        env::set_var(ENV_TIMEOUT_SECS, "0");
    }
    assert!(CoreConfig::from_env().operation_timeout.is_none());
    unsafe {
        env::set_var(ENV_TIMEOUT_SECS, "soon");
    }
    assert!(CoreConfig::from_env().operation_timeout.is_none());

    // Clean up
    unsafe {
        env::remove_var(ENV_SEARCH_DIRS);
        env::remove_var(ENV_THUMBNAIL_DIR);
        env::remove_var(ENV_TIMEOUT_SECS);
    }
}
