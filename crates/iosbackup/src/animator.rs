//! Background ticker that keeps the activity indicator moving
//!
//! Every period the ticker takes the screen lock, snapshots the shared
//! [`UiState`] and redraws it with the next indicator phase. Session draws
//! take the same locks in the same order (screen, then state), so a tick
//! never renders a state older than one the session already drew.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use platform::PanelDriver;
use ui::widgets::PHASES;
use ui::UiState;

use crate::display::{intent_for, SharedScreen};
use crate::lock;

/// UI snapshot shared between the session driver and the animator
pub type SharedUi = Arc<Mutex<UiState>>;

/// How long [`Animator::stop`] waits for the ticker thread to exit
pub const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Running ticker thread
pub struct Animator<P: PanelDriver + 'static> {
    screen: SharedScreen<P>,
    stopped: Arc<AtomicBool>,
    phase: Arc<AtomicU8>,
    wake: mpsc::Sender<()>,
    exited: mpsc::Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl<P: PanelDriver + 'static> Animator<P> {
    /// Spawn the ticker
    pub fn start(screen: SharedScreen<P>, ui: SharedUi, period: Duration) -> std::io::Result<Self> {
        let stopped = Arc::new(AtomicBool::new(false));
        let phase = Arc::new(AtomicU8::new(0));
        let (wake, wake_rx) = mpsc::channel::<()>();
        let (exited_tx, exited) = mpsc::channel::<()>();

        let ticker = Ticker {
            screen: Arc::clone(&screen),
            ui,
            stopped: Arc::clone(&stopped),
            phase: Arc::clone(&phase),
            period,
        };
        let handle = std::thread::Builder::new()
            .name("animator".into())
            .spawn(move || {
                ticker.run(&wake_rx);
                let _ = exited_tx.send(());
            })?;
        tracing::debug!(?period, "animator started");

        Ok(Self {
            screen,
            stopped,
            phase,
            wake,
            exited,
            handle: Some(handle),
        })
    }

    /// Indicator phase of the most recent tick
    pub fn phase(&self) -> u8 {
        self.phase.load(Ordering::SeqCst)
    }

    /// Whether [`stop`](Self::stop) has been called
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Halt the ticker
    ///
    /// When this returns no further display call will come from the ticker:
    /// an in-flight tick has finished and later ticks observe the stop flag
    /// under the screen lock. Returns false if the thread did not exit within
    /// `timeout` (it is then detached).
    pub fn stop(&mut self, timeout: Duration) -> bool {
        self.stopped.store(true, Ordering::SeqCst);
        let _ = self.wake.send(());

        // Barrier: waits out a tick that is mid-draw.
        drop(lock(&self.screen));

        let Some(handle) = self.handle.take() else {
            return true;
        };
        match self.exited.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    tracing::warn!("animator thread panicked");
                }
                tracing::debug!("animator stopped");
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(?timeout, "animator did not exit in time; detaching");
                false
            }
        }
    }
}

impl<P: PanelDriver + 'static> Drop for Animator<P> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop(STOP_TIMEOUT);
        }
    }
}

struct Ticker<P: PanelDriver> {
    screen: SharedScreen<P>,
    ui: SharedUi,
    stopped: Arc<AtomicBool>,
    phase: Arc<AtomicU8>,
    period: Duration,
}

impl<P: PanelDriver> Ticker<P> {
    fn run(&self, wake: &mpsc::Receiver<()>) {
        loop {
            match wake.recv_timeout(self.period) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
            if !self.tick() {
                break;
            }
        }
    }

    /// One redraw; false once stopped
    fn tick(&self) -> bool {
        let mut screen = lock(&self.screen);
        if self.stopped.load(Ordering::SeqCst) {
            return false;
        }
        let snapshot = lock(&self.ui).clone();
        if !snapshot.animate {
            return true;
        }
        let phase = (self.phase.load(Ordering::SeqCst) + 1) % PHASES;
        self.phase.store(phase, Ordering::SeqCst);
        if let Err(e) = screen.draw(&snapshot, phase, intent_for(&snapshot)) {
            tracing::warn!(error = %e, "animation frame failed");
        }
        true
    }
}
