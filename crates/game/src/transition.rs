//! Fade-to-black scene transitions.
//!
//! A transition fades the screen to full black, swaps the scene at the
//! moment nothing is visible, then fades back in. Interactions are
//! ignored while one is in flight.

/// Which scene a transition lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapTarget {
    Inside,
    Outside,
}

/// What the frame loop should do after advancing the fade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeEvent {
    None,
    /// The screen is fully black; swap scenes now.
    SwapNow(SwapTarget),
    /// The fade-in completed; the transition is over.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    FadingOut(SwapTarget),
    FadingIn,
}

/// Drives overlay opacity through fade-out, swap, fade-in.
#[derive(Debug)]
pub struct TransitionController {
    opacity: f32,
    phase: Phase,
    /// Opacity change per second.
    rate: f32,
}

impl Default for TransitionController {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionController {
    pub fn new() -> Self {
        Self {
            opacity: 0.0,
            phase: Phase::Idle,
            rate: 4.0,
        }
    }

    /// Start a transition toward `target`. Ignored if one is already
    /// running.
    pub fn begin(&mut self, target: SwapTarget) {
        if self.phase != Phase::Idle {
            log::debug!("Transition already in flight, ignoring {target:?}");
            return;
        }
        log::info!("Transition started: {target:?}");
        self.phase = Phase::FadingOut(target);
    }

    /// Advance the fade by `dt` seconds.
    pub fn update(&mut self, dt: f32) -> FadeEvent {
        match self.phase {
            Phase::Idle => FadeEvent::None,
            Phase::FadingOut(target) => {
                self.opacity += self.rate * dt;
                if self.opacity >= 1.0 {
                    self.opacity = 1.0;
                    self.phase = Phase::FadingIn;
                    FadeEvent::SwapNow(target)
                } else {
                    FadeEvent::None
                }
            }
            Phase::FadingIn => {
                self.opacity -= self.rate * dt;
                if self.opacity <= 0.0 {
                    self.opacity = 0.0;
                    self.phase = Phase::Idle;
                    FadeEvent::Finished
                } else {
                    FadeEvent::None
                }
            }
        }
    }

    /// Current overlay opacity in 0..=1.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// True while a transition is running; clicks are ignored then.
    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }
}
