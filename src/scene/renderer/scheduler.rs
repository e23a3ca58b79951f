#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameMode {
    /// Redraw only when something asks for it.
    Idle,
    /// Request a frame every vsync.
    Animating,
}

/// Decides between continuous frames and redraw-on-demand. Stays animating
/// for a short grace period after motion stops so the last smoothing steps
/// and late input are not cut off.
#[derive(Clone, Copy, Debug)]
pub struct FrameScheduler {
    grace: f32,
    settled_for: f32,
    mode: FrameMode,
}

impl FrameScheduler {
    pub fn new(grace_secs: f32) -> Self {
        Self {
            grace: grace_secs.max(0.0),
            settled_for: 0.0,
            mode: FrameMode::Idle,
        }
    }

    pub fn mode(&self) -> FrameMode {
        self.mode
    }

    /// Forces animation, e.g. when a new target or new buffers arrive.
    pub fn wake(&mut self) {
        self.settled_for = 0.0;
        if self.mode != FrameMode::Animating {
            tracing::trace!("frame scheduler animating");
        }
        self.mode = FrameMode::Animating;
    }

    pub fn update(&mut self, moving: bool, dt: f32) -> FrameMode {
        if moving {
            self.wake();
            return self.mode;
        }
        if self.mode == FrameMode::Idle {
            return self.mode;
        }

        if dt.is_finite() && dt > 0.0 {
            self.settled_for += dt;
        }
        if self.settled_for >= self.grace {
            self.mode = FrameMode::Idle;
            tracing::trace!("frame scheduler idle");
        }
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_animates_and_settling_returns_to_idle_after_grace() {
        let mut scheduler = FrameScheduler::new(0.25);
        assert_eq!(scheduler.mode(), FrameMode::Idle);
        assert_eq!(scheduler.update(true, 0.016), FrameMode::Animating);

        for _ in 0..10 {
            assert_eq!(scheduler.update(false, 0.02), FrameMode::Animating);
        }
        assert_eq!(scheduler.update(false, 0.1), FrameMode::Idle);
        assert_eq!(scheduler.mode(), FrameMode::Idle);
    }

    #[test]
    fn motion_during_grace_restarts_it() {
        let mut scheduler = FrameScheduler::new(0.25);
        scheduler.wake();
        scheduler.update(false, 0.2);
        scheduler.update(true, 0.016);
        assert_eq!(scheduler.update(false, 0.2), FrameMode::Animating);
    }
}
