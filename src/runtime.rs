use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseEvent};

/// Raw event handed over by a [`QteEventSource`]
#[derive(Clone, Debug)]
pub enum QteEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    /// Ask for a frame right away instead of waiting out the period
    Tick,
}

/// Source of terminal events (keyboard, mouse, resize)
pub trait QteEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<QteEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<QteEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => QteEvent::Key(key),
                Ok(CtEvent::Mouse(mouse)) => QteEvent::Mouse(mouse),
                Ok(CtEvent::Resize(_, _)) => QteEvent::Resize,
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(%err, "terminal event reader stopped");
                    break;
                }
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QteEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QteEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// A bare channel works as a scripted source for headless runs
impl QteEventSource for Receiver<QteEvent> {
    fn recv_timeout(&self, timeout: Duration) -> Result<QteEvent, RecvTimeoutError> {
        Receiver::recv_timeout(self, timeout)
    }
}

/// What the game loop should do next
#[derive(Clone, Debug)]
pub enum Step {
    Key(KeyEvent),
    Pointer(MouseEvent),
    Resize,
    /// Run one game tick; carries the wall time since the previous frame
    Frame(Duration),
}

/// Paces the game loop: input is passed through as it arrives and a frame is
/// due once per `period`, whether or not anything was typed.
pub struct Runner<E: QteEventSource> {
    source: E,
    period: Duration,
    last_frame: Instant,
}

impl<E: QteEventSource> Runner<E> {
    pub fn new(source: E, period: Duration) -> Self {
        Self {
            source,
            period: period.max(Duration::from_millis(1)),
            last_frame: Instant::now(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Block until the next input event or the next frame, whichever is first
    pub fn step(&mut self) -> Step {
        let waited = self.last_frame.elapsed();
        if waited >= self.period {
            return self.frame();
        }

        match self.source.recv_timeout(self.period - waited) {
            Ok(QteEvent::Key(key)) => Step::Key(key),
            Ok(QteEvent::Mouse(mouse)) => Step::Pointer(mouse),
            Ok(QteEvent::Resize) => Step::Resize,
            Ok(QteEvent::Tick) | Err(RecvTimeoutError::Timeout) => self.frame(),
            Err(RecvTimeoutError::Disconnected) => {
                // no more input will come; keep the frame cadence anyway
                std::thread::sleep(self.period - waited);
                self.frame()
            }
        }
    }

    fn frame(&mut self) -> Step {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;
        Step::Frame(elapsed)
    }
}
