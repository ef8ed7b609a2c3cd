#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Gate for the per-frame callback chain. Starts running; once stopped it
/// never runs again.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    state: LoopState,
    frames: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            state: LoopState::Running,
            frames: 0,
        }
    }

    /// Claim the next frame. Returns false once stopped.
    pub fn begin_frame(&mut self) -> bool {
        match self.state {
            LoopState::Running => {
                self.frames += 1;
                true
            }
            LoopState::Stopped => false,
        }
    }

    /// Returns true only for the call that actually stopped the loop.
    pub fn stop(&mut self) -> bool {
        let was_running = self.is_running();
        self.state = LoopState::Stopped;
        was_running
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_running() {
        let mut scheduler = FrameScheduler::new();
        assert!(scheduler.is_running());
        assert!(scheduler.begin_frame());
        assert!(scheduler.begin_frame());
        assert_eq!(scheduler.frames_rendered(), 2);
    }

    #[test]
    fn test_stop_is_terminal_and_idempotent() {
        let mut scheduler = FrameScheduler::new();
        scheduler.begin_frame();
        assert!(scheduler.stop());
        assert!(!scheduler.stop());
        assert!(!scheduler.begin_frame());
        assert_eq!(scheduler.state(), LoopState::Stopped);
        assert_eq!(scheduler.frames_rendered(), 1);
    }
}
