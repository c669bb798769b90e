use tracing_subscriber::EnvFilter;

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}

/// Console logging on stderr, plus a daily file when `MEMTIERD_LOG_DIR` is set.
///
/// stdout is reserved for prompt output and `-config-dump-json`.
pub fn init_logging(debug: bool) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = std::env::var("MEMTIERD_LOG_DIR")
        .ok()
        .and_then(|log_dir| {
            // `tracing_appender::rolling::daily` panics if it can't create the
            // initial log file, so preflight writability.
            if let Err(e) = std::fs::create_dir_all(&log_dir) {
                eprintln!("memtierd: cannot create log directory {log_dir}: {e}, file logging disabled");
                return None;
            }
            let test_path = std::path::Path::new(&log_dir).join(".memtierd_write_test");
            match std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&test_path)
            {
                Ok(_) => {
                    let _ = std::fs::remove_file(&test_path);
                    let file_appender = tracing_appender::rolling::daily(&log_dir, "memtierd.log");
                    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                    // The daemon logs until it is killed; keep the writer alive.
                    Box::leak(Box::new(guard));

                    Some(
                        tracing_subscriber::fmt::layer()
                            .with_writer(non_blocking)
                            .with_ansi(false)
                            .with_target(true),
                    )
                }
                Err(e) => {
                    eprintln!(
                        "memtierd: cannot write to log directory {log_dir}: {e}, file logging disabled"
                    );
                    None
                }
            }
        });

    let json = env_flag("MEMTIERD_LOG_JSON");
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
    });
    let console_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init();
}
