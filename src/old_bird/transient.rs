//! Turns threshold crossings into transients of bounded length.

/// Outward-going crossing of the detection thresholds at a sample index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crossing {
    /// Power ratio rose above the threshold
    Rise(usize),
    /// Power ratio fell below the inverse threshold
    Fall(usize),
}

/// A detected transient, `length` samples from `start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transient {
    pub start: usize,
    pub length: usize,
}

impl Transient {
    /// Sample range of the clip cut around this transient, with `padding`
    /// samples of lead-in.
    pub fn padded(&self, padding: usize) -> std::ops::Range<usize> {
        (self.start + 1).saturating_sub(padding)..self.start + self.length + 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Down,
    Up,
    /// Fell before reaching the minimum length
    Holding,
}

/// Crossing state machine. Transients shorter than the minimum length are
/// stretched to it and longer ones are cut at the maximum length.
#[derive(Clone, Debug)]
pub struct TransientFinder {
    min_length: usize,
    max_length: usize,
    state: State,
    start: usize,
}

impl TransientFinder {
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length,
            state: State::Down,
            start: 0,
        }
    }

    /// Lengths are `floor(duration * sample_rate)`.
    pub fn from_durations(min_duration: f64, max_duration: f64, sample_rate: f64) -> Self {
        Self::new(
            (min_duration * sample_rate).floor() as usize,
            (max_duration * sample_rate).floor() as usize,
        )
    }

    /// Feed one crossing; crossings must arrive in index order.
    pub fn process(&mut self, crossing: Crossing) -> Option<Transient> {
        let (min, max) = (self.min_length, self.max_length);

        match (self.state, crossing) {
            (State::Down, Crossing::Rise(i)) => {
                self.start = i;
                self.state = State::Up;
                None
            }
            (State::Down, Crossing::Fall(_)) => None,

            (State::Up, Crossing::Rise(i)) => {
                if i == self.start + max {
                    // a rise exactly one maximal length later ends the transient
                    self.state = State::Down;
                    Some(self.emit(max))
                } else if i > self.start + max {
                    let transient = self.emit(max);
                    self.start = i;
                    Some(transient)
                } else {
                    None
                }
            }
            (State::Up, Crossing::Fall(i)) => {
                if i < self.start + min {
                    self.state = State::Holding;
                    None
                } else {
                    self.state = State::Down;
                    Some(self.emit((i - self.start).min(max)))
                }
            }

            (State::Holding, Crossing::Rise(i)) => {
                self.state = State::Up;
                if i > self.start + min {
                    let transient = self.emit(min);
                    self.start = i;
                    Some(transient)
                } else {
                    None
                }
            }
            (State::Holding, Crossing::Fall(i)) => {
                if i >= self.start + min {
                    self.state = State::Down;
                    Some(self.emit(min))
                } else {
                    None
                }
            }
        }
    }

    fn emit(&self, length: usize) -> Transient {
        Transient {
            start: self.start,
            length,
        }
    }
}
