//! Main epoll loop

use std::io::{Seek, Write};

use log::{debug, info};
use nix::{
    errno::Errno,
    sys::epoll::{Epoll, EpollCreateFlags, EpollEvent, EpollFlags, EpollTimeout},
};
use snafu::ResultExt;

use crate::{
    driver::ActivityDriver,
    errors::{EpollSnafu, LedError},
    handlers::{EventBatch, Handler, ProcessAction},
};

#[derive(Debug)]
pub(crate) struct Monitor {
    epoll: Epoll,
}

impl Monitor {
    pub(crate) fn new() -> Result<Self, LedError> {
        Ok(Self {
            epoll: Epoll::new(EpollCreateFlags::EPOLL_CLOEXEC).context(EpollSnafu)?,
        })
    }

    fn setup(&mut self, listeners: &[Option<Box<dyn Handler>>]) -> Result<(), LedError> {
        for (idx, listener) in listeners.iter().enumerate() {
            if let Some(l) = listener {
                // TRICKY BIT: Data = 0 is used to indicate nothing happend.
                // We thus offset the array index into listeners by one.
                self.epoll
                    .add(
                        l.monitored(),
                        EpollEvent::new(
                            EpollFlags::EPOLLIN | EpollFlags::EPOLLERR,
                            (idx + 1) as u64,
                        ),
                    )
                    .context(EpollSnafu)?;
            }
        }
        Ok(())
    }

    /// Main loop. Events from all listeners are handed to `driver` one at a
    /// time, in the order they are read.
    ///
    /// Only returns on error, or when no listener is left.
    pub(crate) fn monitor<W: Write + Seek>(
        &mut self,
        mut listeners: Vec<Option<Box<dyn Handler>>>,
        driver: &mut ActivityDriver<W>,
    ) -> anyhow::Result<()> {
        self.setup(&listeners)?;
        let mut remaining = listeners.iter().flatten().count();
        let mut batch = EventBatch::new();

        while remaining > 0 {
            let mut events = [EpollEvent::empty(); 32];
            let n = match self.epoll.wait(&mut events, EpollTimeout::NONE) {
                Err(Errno::EINTR) => continue,
                res => res.context(EpollSnafu)?,
            };
            for event in &events[..n] {
                let idx = match event.data() {
                    0 => continue,
                    idx => (idx - 1) as usize,
                };
                let Some(l) = listeners.get_mut(idx).and_then(Option::as_mut) else {
                    continue;
                };
                let action = l.process(&mut batch);
                for key_event in batch.drain(..) {
                    driver.handle(key_event)?;
                }
                if action == ProcessAction::Remove {
                    self.epoll.delete(l.monitored()).context(EpollSnafu)?;
                    listeners[idx] = None;
                    remaining -= 1;
                    debug!("{remaining} input devices left");
                }
            }
        }
        info!("No input devices left to monitor");
        Ok(())
    }
}
