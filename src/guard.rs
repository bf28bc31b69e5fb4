/// Re-entrancy guard for a user-triggered action: at most one request of
/// the action may be outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Idle,
    InFlight,
}

#[derive(Debug, Clone)]
pub struct InFlight {
    pub state: ActionState,
    pub rejected: u32,
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}

impl InFlight {
    pub fn new() -> Self {
        Self { state: ActionState::Idle, rejected: 0 }
    }

    /// Enter the in-flight state; false (and counted) when already in flight.
    pub fn try_begin(&mut self) -> bool {
        match self.state {
            ActionState::Idle => {
                self.state = ActionState::InFlight;
                true
            }
            ActionState::InFlight => {
                self.rejected += 1;
                false
            }
        }
    }

    pub fn finish(&mut self) {
        self.state = ActionState::Idle;
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, ActionState::InFlight)
    }
}
