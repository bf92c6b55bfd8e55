//! Tracing subscriber setup
//!
//! stdout gets pretty or JSON lines per `LOG_FORMAT`. When `LOG_FILE` is set
//! every event is also appended to that file as JSON.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::Config;

/// Install the global subscriber. Call once, before anything logs.
pub fn init(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("cardiorisk={level},tower_http={level}", level = config.log_level).into()
    });

    let mut file_error = None;
    let file_layer = match config.log_file.as_deref() {
        Some(path) => match open_log_file(Path::new(path)) {
            Ok(file) => Some(json_file_layer(file)),
            Err(e) => {
                file_error = Some((path, e));
                None
            }
        },
        None => None,
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if config.log_json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    if let Some((path, e)) = file_error {
        tracing::warn!(path, error = %e, "Log file unavailable, logging to stdout only");
    }
}

/// Open `path` for appending, creating missing parent directories
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// JSON lines written to `file`
pub fn json_file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
}
