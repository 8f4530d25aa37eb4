//! Handlers for input devices

use std::os::fd::BorrowedFd;

use smallvec::SmallVec;

use crate::tracker::KeyEvent;

/// Events read in one wakeup.
pub(crate) type EventBatch = SmallVec<[KeyEvent; 8]>;

/// What the monitor should do with a handler after processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessAction {
    /// Keep polling
    Keep,
    /// The device is gone, stop polling it
    Remove,
}

/// Produces key events when its file descriptor becomes readable
pub(crate) trait Handler {
    /// FD that needs to be monitored for this listener
    fn monitored(&self) -> BorrowedFd<'_>;
    /// Called when the FD is readable. Key events are appended to `events`.
    fn process(&mut self, events: &mut EventBatch) -> ProcessAction;
}

pub(crate) use ev_dev::EvDevListener;

/// Code for handling /dev/input
mod ev_dev {
    use std::{
        io,
        os::fd::{AsFd, BorrowedFd},
        path::{Path, PathBuf},
    };

    use evdev_rs::{
        enums::EventCode,
        util::event_code_to_int,
        Device, InputEvent, ReadFlag, ReadStatus,
    };
    use log::{debug, warn};
    use nix::errno::Errno;
    use snafu::ResultExt;

    use crate::{
        errors::{InputDeviceSnafu, LedError},
        tracker::KeyEvent,
    };

    use super::{EventBatch, Handler, ProcessAction};

    /// Value of an EV_KEY event
    const KEY_UP: i32 = 0;
    const KEY_DOWN: i32 = 1;
    const KEY_REPEAT: i32 = 2;

    /// Handler for /dev/input
    #[derive(Debug)]
    pub(crate) struct EvDevListener {
        path: PathBuf,
        dev: Device,
    }

    impl EvDevListener {
        pub fn new(path: &Path) -> Result<Self, LedError> {
            Ok(Self {
                path: path.to_path_buf(),
                dev: Device::new_from_path(path).context(InputDeviceSnafu {
                    path: path.display().to_string(),
                })?,
            })
        }
    }

    /// Map a raw evdev event to a key event, if it is one.
    pub(super) fn key_event(code: &EventCode, value: i32) -> Option<KeyEvent> {
        if !matches!(code, EventCode::EV_KEY(_)) {
            return None;
        }
        let (_, key) = event_code_to_int(code);
        match value {
            KEY_UP => Some(KeyEvent::up(key as u16)),
            // Auto-repeat is just another down for the same hold.
            KEY_DOWN | KEY_REPEAT => Some(KeyEvent::down(key as u16)),
            _ => None,
        }
    }

    /// Read the state delta libevdev synthesizes after SYN_DROPPED.
    ///
    /// Releases that happened while the kernel buffer overflowed only show
    /// up here, so this must run before going back to normal reads.
    pub(super) fn drain_sync<F>(mut next: F, events: &mut EventBatch) -> io::Result<()>
    where
        F: FnMut() -> io::Result<(ReadStatus, InputEvent)>,
    {
        loop {
            match next() {
                Ok((_, ev)) => events.extend(key_event(&ev.event_code, ev.value)),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }

    impl Handler for EvDevListener {
        fn monitored(&self) -> BorrowedFd<'_> {
            self.dev.file().as_fd()
        }

        fn process(&mut self, events: &mut EventBatch) -> ProcessAction {
            // libevdev buffers internally, so drain it or epoll will not
            // wake us for what is already read.
            loop {
                match self.dev.next_event(ReadFlag::NORMAL) {
                    Ok((ReadStatus::Sync, _)) => {
                        debug!("Events dropped on {:?}, resyncing", self.path);
                        let dev = &self.dev;
                        match drain_sync(|| dev.next_event(ReadFlag::SYNC), events) {
                            Ok(()) => (),
                            Err(e) if e.raw_os_error() == Some(Errno::ENODEV as i32) => {
                                warn!("Input device {:?} disappeared", self.path);
                                return ProcessAction::Remove;
                            }
                            Err(e) => {
                                warn!("Error resyncing {:?}: {}", self.path, e);
                                break;
                            }
                        }
                    }
                    Ok((_, ev)) => events.extend(key_event(&ev.event_code, ev.value)),
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(e) if e.raw_os_error() == Some(Errno::ENODEV as i32) => {
                        warn!("Input device {:?} disappeared", self.path);
                        return ProcessAction::Remove;
                    }
                    Err(e) => {
                        warn!("Error reading {:?}: {}", self.path, e);
                        break;
                    }
                }
                if !self.dev.has_event_pending() {
                    break;
                }
            }
            ProcessAction::Keep
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, io};

    use evdev_rs::{
        enums::{EventCode, EV_KEY, EV_MSC, EV_SYN},
        InputEvent, ReadStatus, TimeVal,
    };

    use super::{
        ev_dev::{drain_sync, key_event},
        EventBatch,
    };
    use crate::tracker::KeyEvent;

    fn sync_event(code: EventCode, value: i32) -> io::Result<(ReadStatus, InputEvent)> {
        Ok((
            ReadStatus::Sync,
            InputEvent::new(&TimeVal::new(0, 0), &code, value),
        ))
    }

    #[test]
    fn key_values() {
        let a = EventCode::EV_KEY(EV_KEY::KEY_A);
        assert_eq!(key_event(&a, 1), Some(KeyEvent::down(30)));
        assert_eq!(key_event(&a, 2), Some(KeyEvent::down(30)));
        assert_eq!(key_event(&a, 0), Some(KeyEvent::up(30)));
        assert_eq!(key_event(&a, 7), None);
    }

    #[test]
    fn non_key_events_are_ignored() {
        assert_eq!(key_event(&EventCode::EV_SYN(EV_SYN::SYN_REPORT), 0), None);
        assert_eq!(key_event(&EventCode::EV_MSC(EV_MSC::MSC_SCAN), 30), None);
    }

    #[test]
    fn resync_reports_missed_releases() {
        let mut reads = VecDeque::from([
            sync_event(EventCode::EV_KEY(EV_KEY::KEY_A), 0),
            sync_event(EventCode::EV_MSC(EV_MSC::MSC_SCAN), 4),
            sync_event(EventCode::EV_KEY(EV_KEY::KEY_B), 0),
            sync_event(EventCode::EV_SYN(EV_SYN::SYN_REPORT), 0),
        ]);
        let mut events = EventBatch::new();
        drain_sync(
            || {
                reads
                    .pop_front()
                    .unwrap_or_else(|| Err(io::ErrorKind::WouldBlock.into()))
            },
            &mut events,
        )
        .unwrap();
        assert_eq!(events.as_slice(), &[KeyEvent::up(30), KeyEvent::up(48)]);
    }

    #[test]
    fn resync_read_error_is_reported() {
        let mut events = EventBatch::new();
        let err = drain_sync(
            || Err(io::Error::from_raw_os_error(nix::errno::Errno::ENODEV as i32)),
            &mut events,
        )
        .unwrap_err();
        assert_eq!(err.raw_os_error(), Some(nix::errno::Errno::ENODEV as i32));
        assert!(events.is_empty());
    }
}
