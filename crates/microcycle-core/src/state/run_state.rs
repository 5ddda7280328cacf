use std::fmt;

/// Lifecycle of a loaded program inside the step engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum EngineState {
    /// Program loaded, no step applied yet.
    #[default]
    Loaded,
    /// At least one step applied and steps remain.
    Running,
    /// Every step has been applied.
    Completed,
    /// Terminated by the host or by a fault before completion.
    Aborted,
}

impl EngineState {
    /// Returns `true` while `advance` is permitted.
    #[must_use]
    pub const fn can_advance(self) -> bool {
        matches!(self, Self::Loaded | Self::Running)
    }

    /// Returns `true` once no further progress is possible without reset.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !self.can_advance()
    }

    /// State reached after the cursor moved to `cursor` of `total` steps.
    #[must_use]
    pub const fn after_step(cursor: usize, total: usize) -> Self {
        if cursor >= total {
            Self::Completed
        } else {
            Self::Running
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Loaded => "loaded",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::EngineState;

    #[test]
    fn default_state_is_loaded() {
        assert_eq!(EngineState::default(), EngineState::Loaded);
    }

    #[test]
    fn only_loaded_and_running_can_advance() {
        assert!(EngineState::Loaded.can_advance());
        assert!(EngineState::Running.can_advance());
        assert!(EngineState::Completed.is_terminal());
        assert!(EngineState::Aborted.is_terminal());
    }

    #[test]
    fn cursor_position_selects_running_or_completed() {
        assert_eq!(EngineState::after_step(1, 3), EngineState::Running);
        assert_eq!(EngineState::after_step(3, 3), EngineState::Completed);
    }
}
