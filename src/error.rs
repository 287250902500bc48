//! Error taxonomy, spec §7. Configuration errors are fatal at load
//! and surfaced with a `file:line` diagnostic; the runtime conditions
//! below that are logged rather than returned (`UnknownEventCode`,
//! `SinkFailure`, `DeviceLost`) live here only as the shared vocabulary
//! the device/sink/logger layers report through `tracing`.

use thiserror::Error;

/// A malformed configuration file. Fatal: load aborts, partial
/// configs are never accepted (§4.1).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing colon, unknown token shape, malformed time limit, empty
    /// pattern, or an unparsable line.
    #[error("{path}:{line}: {message}")]
    Syntax {
        path: String,
        line: u32,
        message: String,
    },
    /// Semantically invalid but syntactically well-formed: duplicate
    /// identical rule, zero/negative button number, `max_use` out of
    /// range.
    #[error("{path}:{line}: {message}")]
    Semantic {
        path: String,
        line: u32,
        message: String,
    },
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn syntax(path: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        ConfigError::Syntax {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub fn semantic(path: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        ConfigError::Semantic {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

/// Device-layer failure opening or reading a configured evdev node.
/// `Lost` (EOF/EIO on an already-open device) is fatal and initiates
/// shutdown per §7; `Open` is fatal at startup.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to open device {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("device {path} lost: {source}")]
    Lost {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
