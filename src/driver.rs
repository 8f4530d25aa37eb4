//! Turns keyboard activity edges into light changes.

use std::io::{Seek, Write};

use log::{debug, info};
use snafu::ResultExt;

use crate::{
    ec::{write_state, LightId, LightState},
    errors::{EcWriteSnafu, LedError},
    tracker::{Activity, KeyEvent, KeyEventKind, KeyTracker},
};

#[derive(Debug)]
pub(crate) struct ActivityDriver<W> {
    tracker: KeyTracker,
    light: LightId,
    /// EC register file (or anything else that does not buffer).
    dev: W,
}

impl<W: Write + Seek> ActivityDriver<W> {
    pub(crate) fn new(tracker: KeyTracker, light: LightId, dev: W) -> Self {
        Self {
            tracker,
            light,
            dev,
        }
    }

    /// Feed one key event. Write errors are not retried.
    pub(crate) fn handle(&mut self, event: KeyEvent) -> Result<(), LedError> {
        // Never log the key code, that would be a keylogger.
        match event.kind {
            KeyEventKind::Down => info!("event_type = down"),
            KeyEventKind::Up => info!("event_type = up"),
        }

        let state = match self.tracker.on_event(event) {
            Some(Activity::Started) => {
                info!("ON");
                LightState::On
            }
            Some(Activity::Stopped) => {
                info!("OFF");
                LightState::Off
            }
            None => return Ok(()),
        };
        debug!("Keys held: {}", self.tracker.pressed_count());

        write_state(&mut self.dev, self.light, state).context(EcWriteSnafu { light: self.light })
    }

    #[cfg(test)]
    fn dev(&self) -> &W {
        &self.dev
    }
}
