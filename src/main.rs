//! Control ThinkPad indicator lights through the embedded controller, and
//! optionally light one up while keys are held.
//!
//! There is no public code API for you to use! However, the command line
//! interface should be stable.

use std::fs::File;
use std::io::{Seek, Write};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::info;

use driver::ActivityDriver;
use handlers::{EvDevListener, Handler};
use monitor::Monitor;
use tracker::KeyTracker;

use crate::utils::wait_for_file;

mod driver;
mod ec;
mod errors;
mod flags;
mod handlers;
mod monitor;
mod tracker;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = match flags::Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(flags::exit_code(&err));
        }
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();

    if let Some(timeout) = cli.wait {
        wait_for_file(&cli.device, Duration::from_millis(timeout.into()))?;
    }
    let mut dev = ec::open(&cli.device)?;

    match cli.state {
        Some(state) => set_once(&mut dev, &cli, state),
        None => run_daemon(dev, &cli),
    }
}

/// Single write, then exit
fn set_once<W: Write + Seek>(
    dev: &mut W,
    config: &flags::Cli,
    state: ec::LightState,
) -> anyhow::Result<()> {
    ec::write_state(dev, config.light, state).with_context(|| {
        format!(
            "Failed to set {:?} to {:?} via {}",
            config.light,
            state,
            config.device.display()
        )
    })
}

/// Follow keyboard activity until killed
fn run_daemon(dev: File, config: &flags::Cli) -> anyhow::Result<()> {
    let devices = utils::merge_inputs(
        config.monitor_input.clone(),
        utils::detect_keyboards().context("Failed to enumerate input devices")?,
    )?;
    if devices.is_empty() {
        anyhow::bail!("No keyboard found. Please specify one explicitly with -i.");
    }

    let mut listeners: Vec<Option<Box<dyn Handler>>> = vec![];
    for path in &devices {
        info!("Monitoring {}", path.display());
        let listener: Box<dyn Handler> = Box::new(EvDevListener::new(path)?);
        listeners.push(Some(listener));
    }

    let tracker = KeyTracker::new(Duration::from_millis(config.stale_timeout));
    let mut driver = ActivityDriver::new(tracker, config.light, dev);

    Monitor::new()?.monitor(listeners, &mut driver)
}
