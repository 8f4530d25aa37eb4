//! Embedded controller debug interface.
//!
//! The EC exposes its register space through debugfs (`ec_sys` with
//! `write_support=1`). Register 12 controls the indicator lights: the low
//! nibble selects the light and the high nibble the mode.

use std::{
    fs::{File, OpenOptions},
    io::{Seek, SeekFrom, Write},
    path::Path,
};

use snafu::ResultExt;

use crate::errors::{IoOpeningFileSnafu, LedError};

/// Default location of the EC register file.
pub(crate) const DEFAULT_EC_PATH: &str = "/sys/kernel/debug/ec/ec0/io";

/// Offset of the LED control register.
pub(crate) const LED_REGISTER: u64 = 12;

/// Indicator lights that can be addressed through the LED register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[repr(u8)]
pub(crate) enum LightId {
    #[value(name = "POWER")]
    Power = 0x0,
    #[value(name = "FN_LOCK")]
    FnLock = 0x6,
    /// Lid logo dot on X1 style models
    #[value(name = "THINKPAD_I_X1", alias = "THINKPAD_LOGO_VARIANT_1")]
    ThinkpadLogoX1 = 0x7,
    /// Lid logo dot on P51 style models
    #[value(name = "THINKPAD_I_P51", alias = "THINKPAD_LOGO_VARIANT_2")]
    ThinkpadLogoP51 = 0xa,
}

/// Display mode of a light. Codes are shifted into the high nibble on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[repr(u8)]
pub(crate) enum LightState {
    #[value(name = "OFF")]
    Off = 0x0,
    #[value(name = "ON")]
    On = 0x8,
    #[value(name = "BLINK")]
    Blink = 0xc,
}

/// Value to store in the LED register for this combination.
pub(crate) fn status_byte(light: LightId, state: LightState) -> u8 {
    ((state as u8) << 4) | light as u8
}

/// Set `light` to `state`.
///
/// `dev` must not buffer: the register is live hardware state.
pub(crate) fn write_state<W: Write + Seek>(
    dev: &mut W,
    light: LightId,
    state: LightState,
) -> std::io::Result<()> {
    dev.seek(SeekFrom::Start(LED_REGISTER))?;
    dev.write_all(&[status_byte(light, state)])
}

/// Open the EC register file for unbuffered read/write access.
pub(crate) fn open(path: &Path) -> Result<File, LedError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .context(IoOpeningFileSnafu {
            path: path.display().to_string(),
        })
}
