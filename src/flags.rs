//! Command line argument parsing
use std::path::PathBuf;

use crate::{
    ec::{LightId, LightState, DEFAULT_EC_PATH},
    tracker::DEFAULT_STALE_THRESHOLD,
};

#[derive(Debug, clap::Parser)]
#[command(version, about, long_about = None)]
/// Control ThinkPad indicator lights through the embedded controller.
///
/// With only LIGHT given, the light follows the keyboard: on while any key
/// is held, off when all are released.
pub(crate) struct Cli {
    /// Light to control.
    #[arg(value_enum)]
    pub(crate) light: LightId,
    /// State to set, then exit.
    #[arg(value_enum)]
    pub(crate) state: Option<LightState>,
    /// Path to the EC debug register file (needs ec_sys write_support=1).
    #[clap(short, long, default_value = DEFAULT_EC_PATH)]
    pub(crate) device: PathBuf,
    /// Paths to evdev devices to monitor, in addition to detected
    /// keyboards. Use /dev/input/by-id or /dev/input/by-path.
    #[clap(short = 'i', long)]
    pub(crate) monitor_input: Vec<PathBuf>,
    /// Milliseconds without input after which all keys are considered
    /// released.
    #[clap(short, long, default_value_t = DEFAULT_STALE_THRESHOLD.as_millis() as u64)]
    pub(crate) stale_timeout: u64,
    /// Enable extra verbosity!
    #[clap(short, long)]
    pub(crate) verbose: bool,
    /// Timeout in milliseconds during startup for the EC file to appear.
    ///
    /// This can help with late loaded kernel modules.
    #[clap(short, long)]
    pub(crate) wait: Option<u32>,
}

/// Exit code to use when argument parsing fails.
///
/// Help and version output are not failures.
pub(crate) fn exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}
