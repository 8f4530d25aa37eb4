use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use anyhow::Context;
use udev::Device;

use crate::errors::{IoFileNotFoundSnafu, LedError};

/// Wait for a file to show up
pub(crate) fn wait_for_file(path: &Path, timeout: Duration) -> Result<(), LedError> {
    let last_time = Instant::now() + timeout;
    loop {
        if path.exists() {
            return Ok(());
        }
        if Instant::now() >= last_time {
            break;
        }
        std::thread::sleep(Duration::from_millis(250));
    }
    IoFileNotFoundSnafu {
        path: path.display().to_string(),
    }
    .fail()
}

/// Device node of `device` if it is a keyboard event device.
pub(crate) fn get_devnode_if_keyboard(device: &Device) -> Option<&Path> {
    let devnode = device.devnode()?;

    if !devnode
        .file_name()?
        .to_str()?
        .starts_with("event")
    {
        return None;
    }

    device.property_value("ID_INPUT_KEYBOARD")?;

    Some(devnode)
}

/// Keyboards known to udev.
pub(crate) fn detect_keyboards() -> anyhow::Result<Vec<PathBuf>> {
    let mut enumerator = udev::Enumerator::new()?;
    enumerator.match_subsystem("input")?;

    Ok(enumerator
        .scan_devices()?
        .filter_map(|device| get_devnode_if_keyboard(&device).map(Path::to_path_buf))
        .collect())
}

/// Explicit inputs first, then detected keyboards that were not given
/// explicitly. Explicit inputs must exist and be unique.
pub(crate) fn merge_inputs(
    explicit: Vec<PathBuf>,
    mut detected: Vec<PathBuf>,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    for path in &explicit {
        let canon = fs::canonicalize(path)
            .with_context(|| format!("Input device {} is not accessible", path.display()))?;
        if !seen.insert(canon.clone()) {
            anyhow::bail!(
                "Input device {} was given more than once (resolves to {})",
                path.display(),
                canon.display()
            );
        }
        detected.retain(|p| *p != canon);
    }

    Ok(explicit.into_iter().chain(detected).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provided_devices_replace_defaults() {
        let devices = merge_inputs(
            vec![PathBuf::from("/dev/../dev")],
            vec![PathBuf::from("/dev"), PathBuf::from("/proc")],
        )
        .unwrap();
        assert_eq!(devices, vec![PathBuf::from("/dev/../dev"), PathBuf::from("/proc")]);
    }

    #[test]
    fn duplicate_provided_devices_are_rejected() {
        let err = merge_inputs(
            vec![PathBuf::from("/dev"), PathBuf::from("/dev/.")],
            vec![],
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Input device /dev/. was given more than once (resolves to /dev)"
        );
    }

    #[test]
    fn detected_order_is_kept() {
        let devices = merge_inputs(
            vec![PathBuf::from("/proc")],
            vec![PathBuf::from("/a"), PathBuf::from("/proc"), PathBuf::from("/b")],
        )
        .unwrap();
        assert_eq!(
            devices,
            vec![PathBuf::from("/proc"), PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }

    #[test]
    fn missing_provided_device_is_an_error() {
        assert!(merge_inputs(vec![PathBuf::from("/nonexistent/event0")], vec![]).is_err());
    }

    #[test]
    fn wait_for_existing_file() {
        wait_for_file(Path::new("/"), Duration::ZERO).unwrap();
    }

    #[test]
    fn wait_for_missing_file_times_out() {
        let err = wait_for_file(Path::new("/nonexistent/ec0/io"), Duration::from_millis(10))
            .unwrap_err();
        assert!(matches!(err, LedError::IoFileNotFound { .. }));
    }
}
