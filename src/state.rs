use serde::{Deserialize, Serialize};

/// Audio loopback worker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoopbackState {
    /// Worker constructed, no streams open
    #[default]
    Idle,
    /// Worker thread shuttling frames
    Running,
    /// Stop requested, release sequence in progress
    Stopping,
    /// Unrecoverable failure; terminal for this worker instance
    Error,
}

/// State transition error
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionError {
    pub from: LoopbackState,
    pub to: LoopbackState,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid transition from {:?} to {:?}",
            self.from, self.to
        )
    }
}

impl std::error::Error for TransitionError {}

/// State machine for the audio loopback worker
///
/// The happy path is Idle → Running → Stopping → Idle. Error is terminal:
/// a worker that failed stays failed until the instance is dropped.
#[derive(Debug, Default)]
pub struct LoopbackStateMachine {
    state: LoopbackState,
    last_error: Option<String>,
}

impl LoopbackStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoopbackState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Validate and perform state transition
    fn transition(&mut self, to: LoopbackState) -> Result<LoopbackState, TransitionError> {
        let from = self.state;

        let valid = match (from, to) {
            (LoopbackState::Idle, LoopbackState::Running) => true,
            (LoopbackState::Running, LoopbackState::Stopping) => true,
            (LoopbackState::Stopping, LoopbackState::Idle) => true,

            // Same state is always valid (no-op)
            (a, b) if a == b => true,

            _ => false,
        };

        if valid {
            self.state = to;
            Ok(to)
        } else {
            Err(TransitionError { from, to })
        }
    }

    /// Worker thread launched (Idle → Running)
    pub fn begin(&mut self) -> Result<LoopbackState, TransitionError> {
        self.transition(LoopbackState::Running)
    }

    /// Cooperative stop requested (Running → Stopping)
    pub fn request_stop(&mut self) -> Result<LoopbackState, TransitionError> {
        self.transition(LoopbackState::Stopping)
    }

    /// Release sequence complete (Stopping → Idle)
    pub fn finish(&mut self) -> Result<LoopbackState, TransitionError> {
        self.transition(LoopbackState::Idle)
    }

    /// Record an unrecoverable failure; allowed from any state
    pub fn fail(&mut self, message: impl Into<String>) -> LoopbackState {
        self.last_error = Some(message.into());
        self.state = LoopbackState::Error;
        LoopbackState::Error
    }
}
