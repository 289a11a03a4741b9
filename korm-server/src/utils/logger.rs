//! Logging Infrastructure
//!
//! `RUST_LOG` wins when set; otherwise the given level applies to this crate,
//! `shared` and `tower_http`.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger (stdout, `info`)
pub fn init_logger() {
    init_logger_with_file(None, false, None);
}

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "korm_server={level},shared={level},tower_http={level},security=info"
        ))
    })
}

/// Initialize the logger with optional JSON format and daily rolling file output
pub fn init_logger_with_file(log_level: Option<&str>, json: bool, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");

    let builder = tracing_subscriber::fmt()
        .with_env_filter(default_filter(level))
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.is_dir() {
            let file_appender = tracing_appender::rolling::daily(log_path, "korm-server");
            let builder = builder.with_writer(file_appender).with_ansi(false);
            // 已有全局 subscriber 时 (测试中多次调用) 忽略
            let _ = if json {
                builder.json().try_init()
            } else {
                builder.try_init()
            };
            return;
        }
        eprintln!("LOG_DIR {dir} is not a directory, logging to stdout");
    }

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
