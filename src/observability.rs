//! Logging setup and structured metric lines.
//!
//! The library only emits through the `log` facade. Binaries and the Python
//! bindings call [`init_logging`] once to route those records to stderr or a file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Once;

use log::LevelFilter;

use crate::error::NcdError;

static INIT_LOGGER: Once = Once::new();

/// Logs a structured key-value metric line at debug level, only in debug builds.
///
/// # Example
/// ```
/// use ncd_matrix::log_metric;
/// let items = 4;
/// log_metric!("event" = "build_matrix", "items" = items);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            $crate::__log::debug!("NCD_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

/// Installs the global logger. Later calls are no-ops.
///
/// Records are written as `[LEVEL] message`, to stderr by default or appended to
/// `log_file` when one is given. `RUST_LOG` is not consulted; `level` decides.
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<(), NcdError> {
    // Opened before `call_once` so that a bad path is reported to the caller.
    let file = match log_file {
        Some(path) => Some(OpenOptions::new().append(true).create(true).open(path)?),
        None => None,
    };

    INIT_LOGGER.call_once(move || {
        let mut builder = env_logger::Builder::new();
        builder.is_test(false);
        builder.filter_level(level);
        builder.format(|buf, record| {
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });
        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        let _ = builder.try_init();
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritable_log_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_such_dir").join("ncd.log");
        let err = init_logging(LevelFilter::Info, Some(&missing)).unwrap_err();
        assert!(matches!(err, NcdError::Io(_)), "got {:?}", err);
    }

    #[test]
    fn test_metric_macro_accepts_mixed_values() {
        let n = 3usize;
        log_metric!("event" = "unit", "n" = n, "ratio" = 0.5);
    }
}
