//! Progress reporting side channel.
//!
//! Load and save report phase transitions and percentages through an
//! injected sink. The sink is best-effort: it must not block indefinitely,
//! and the default implementation does nothing.

use std::path::Path;

/// A progress event. Percentages are 0..=100.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress<'a> {
    Loading(&'a Path),
    LoadingFinish,
    Saving(&'a Path),
    SavingFinish,
    ResourcesLoad { percent: u8 },
    ResourcesSave { percent: u8 },
    TextureLoad { percent: u8, index: usize },
    TextureSave { percent: u8, index: usize },
}

/// Receiver for progress events. Side-effect only.
pub trait ProgressSink {
    fn progress(&self, event: Progress<'_>);
}

/// Sink that discards every event.
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn progress(&self, _event: Progress<'_>) {}
}

impl<F: Fn(Progress<'_>)> ProgressSink for F {
    fn progress(&self, event: Progress<'_>) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn closures_are_sinks() {
        let seen = RefCell::new(Vec::new());
        let sink = |event: Progress<'_>| seen.borrow_mut().push(format!("{event:?}"));
        sink.progress(Progress::LoadingFinish);
        sink.progress(Progress::ResourcesLoad { percent: 40 });
        assert_eq!(seen.borrow().len(), 2);
    }
}
