use serde::Serialize;

/// Stages of a run, in the order they are entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Resolving,
    Downloading,
    Extracting,
    Locating,
    Decompiling,
    Cataloging,
    Completed,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Resolving,
        Phase::Downloading,
        Phase::Extracting,
        Phase::Locating,
        Phase::Decompiling,
        Phase::Cataloging,
        Phase::Completed,
    ];
}

/// Observer for phase transitions. Purely informational: nothing it does can
/// affect the run.
pub trait ProgressSink: Send + Sync {
    fn on_phase(&self, _phase: Phase) {}
}

/// Sink that ignores every transition.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

impl<F: Fn(Phase) + Send + Sync> ProgressSink for F {
    fn on_phase(&self, phase: Phase) {
        self(phase)
    }
}
