/// Frame counter and elapsed time.
/// Drives the update cadences and time-varying light colors.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameClock {
    /// Frames ticked so far.
    frame: u64,
    /// Seconds accumulated from frame deltas.
    elapsed: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one frame of `dt` seconds. Returns the new frame number.
    pub fn advance(&mut self, dt: f64) -> u64 {
        self.frame += 1;
        self.elapsed += dt.max(0.0);
        self.frame
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

/// "Every Nth frame" throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    every: u32,
}

impl Cadence {
    /// `every` of 0 or 1 fires on every frame.
    pub fn new(every: u32) -> Self {
        Self { every: every.max(1) }
    }

    pub fn every(&self) -> u32 {
        self.every
    }

    /// Whether work scheduled on this cadence runs on `frame`.
    pub fn fires(&self, frame: u64) -> bool {
        frame % self.every as u64 == 0
    }
}
