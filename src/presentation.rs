use crate::wave::{Outcome, Wave};

/// Opaque handle for a visual key widget, issued by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetHandle(pub u64);

/// Callback surface the controller drives.
///
/// Implementations own all rendering and every timed effect (flash, pulse);
/// the controller only emits the trigger and never waits on it.
pub trait Presentation {
    /// Build one widget per key of `wave`, returned in key order.
    fn build_wave_widgets(&mut self, wave_index: usize, wave: &Wave) -> Vec<WidgetHandle>;
    fn destroy_wave_widgets(&mut self, handles: &[WidgetHandle]);
    fn on_key_partial_press(&mut self, handle: WidgetHandle, remaining: u32);
    fn on_key_cleared(&mut self, handle: WidgetHandle);
    fn on_wave_resolved(&mut self, outcome: Outcome);
    fn on_timer_update(&mut self, seconds_remaining: f64);
}

/// Presentation that draws nothing; handles are still unique
#[derive(Debug, Default)]
pub struct NullPresentation {
    next_handle: u64,
}

impl Presentation for NullPresentation {
    fn build_wave_widgets(&mut self, _wave_index: usize, wave: &Wave) -> Vec<WidgetHandle> {
        wave.keys
            .iter()
            .map(|_| {
                self.next_handle += 1;
                WidgetHandle(self.next_handle)
            })
            .collect()
    }

    fn destroy_wave_widgets(&mut self, _handles: &[WidgetHandle]) {}
    fn on_key_partial_press(&mut self, _handle: WidgetHandle, _remaining: u32) {}
    fn on_key_cleared(&mut self, _handle: WidgetHandle) {}
    fn on_wave_resolved(&mut self, _outcome: Outcome) {}
    fn on_timer_update(&mut self, _seconds_remaining: f64) {}
}

/// One recorded presentation call
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationEvent {
    Built {
        wave_index: usize,
        handles: Vec<WidgetHandle>,
    },
    Destroyed(Vec<WidgetHandle>),
    PartialPress {
        handle: WidgetHandle,
        remaining: u32,
    },
    Cleared(WidgetHandle),
    Resolved(Outcome),
    Timer(f64),
}

/// Presentation that records every call, for headless runs and tests
#[derive(Debug, Default)]
pub struct RecordingPresentation {
    pub events: Vec<PresentationEvent>,
    inner: NullPresentation,
}

impl RecordingPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop recorded events, keeping handle numbering
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn resolutions(&self) -> Vec<Outcome> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresentationEvent::Resolved(o) => Some(*o),
                _ => None,
            })
            .collect()
    }

    pub fn cleared(&self) -> Vec<WidgetHandle> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresentationEvent::Cleared(h) => Some(*h),
                _ => None,
            })
            .collect()
    }

    pub fn partial_presses(&self) -> Vec<(WidgetHandle, u32)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresentationEvent::PartialPress { handle, remaining } => {
                    Some((*handle, *remaining))
                }
                _ => None,
            })
            .collect()
    }
}

impl Presentation for RecordingPresentation {
    fn build_wave_widgets(&mut self, wave_index: usize, wave: &Wave) -> Vec<WidgetHandle> {
        let handles = self.inner.build_wave_widgets(wave_index, wave);
        self.events.push(PresentationEvent::Built {
            wave_index,
            handles: handles.clone(),
        });
        handles
    }

    fn destroy_wave_widgets(&mut self, handles: &[WidgetHandle]) {
        self.events
            .push(PresentationEvent::Destroyed(handles.to_vec()));
    }

    fn on_key_partial_press(&mut self, handle: WidgetHandle, remaining: u32) {
        self.events
            .push(PresentationEvent::PartialPress { handle, remaining });
    }

    fn on_key_cleared(&mut self, handle: WidgetHandle) {
        self.events.push(PresentationEvent::Cleared(handle));
    }

    fn on_wave_resolved(&mut self, outcome: Outcome) {
        self.events.push(PresentationEvent::Resolved(outcome));
    }

    fn on_timer_update(&mut self, seconds_remaining: f64) {
        self.events.push(PresentationEvent::Timer(seconds_remaining));
    }
}
