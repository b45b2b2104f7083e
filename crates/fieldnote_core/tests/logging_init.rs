use fieldnote_core::{init_logging, logging_status, LogLevel, LoggingError};

#[test]
fn init_logging_is_idempotent_and_rejects_reconfiguration() {
    let dir = tempfile::tempdir().expect("temp dir");
    let log_dir = dir.path().join("logs");
    let log_dir_str = log_dir.to_str().expect("utf-8 temp path");

    assert!(matches!(
        init_logging("info", "relative/logs"),
        Err(LoggingError::InvalidDirectory(_))
    ));
    assert!(logging_status().is_none());

    init_logging("info", log_dir_str).expect("first init");
    init_logging("INFO", log_dir_str).expect("same config is idempotent");

    let err = init_logging("debug", log_dir_str).expect_err("level change must fail");
    assert!(matches!(err, LoggingError::AlreadyInitialized { .. }));

    let other = dir.path().join("other");
    let err = init_logging("info", other.to_str().expect("utf-8 temp path"))
        .expect_err("directory change must fail");
    assert!(err.to_string().contains("already initialized"));

    let (level, active_dir) = logging_status().expect("logging active");
    assert_eq!(level, LogLevel::Info);
    assert_eq!(active_dir, log_dir);
    assert!(log_dir.is_dir());
}
