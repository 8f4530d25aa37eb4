//! Error types

use snafu::{prelude::*, Backtrace};

use crate::ec::LightId;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum LedError {
    #[snafu(display("Failed to open {path}: {source}"))]
    IoOpeningFile {
        path: String,
        source: std::io::Error,
        backtrace: Backtrace,
    },
    #[snafu(display(
        "Could not find {path}. Maybe --wait is too short, or ec_sys is not loaded with write_support=1?"
    ))]
    IoFileNotFound { path: String, backtrace: Backtrace },
    #[snafu(display("Failed to open input device {path}: {source}"))]
    InputDevice {
        path: String,
        source: std::io::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Failed to write {light:?} to embedded controller: {source}"))]
    EcWrite {
        light: LightId,
        source: std::io::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Epoll polling error: {source}"))]
    Epoll {
        source: nix::Error,
        backtrace: Backtrace,
    },
}
