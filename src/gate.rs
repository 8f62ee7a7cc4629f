//! Gate streams for driving a [`ClipSaver`](crate::saver::ClipSaver) from plain audio.

/// Level-triggered gate with a release hold.
///
/// Opens while any channel of a frame reaches `threshold` in magnitude and
/// stays open for `release` more frames after the level drops below it.
#[derive(Clone, Debug)]
pub struct LevelGate {
    threshold: f64,
    release: usize,
    hold: usize,
}

impl LevelGate {
    pub fn new(threshold: f64, release: usize) -> Self {
        Self {
            threshold: threshold.abs(),
            release,
            hold: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.hold > 0
    }

    /// Feed one frame, returns 1.0 while open and 0.0 while closed.
    pub fn next_frame(&mut self, frame: &[f64]) -> f64 {
        if frame.iter().any(|x| x.abs() >= self.threshold) {
            self.hold = self.release + 1;
        } else {
            self.hold = self.hold.saturating_sub(1);
        }
        if self.is_open() { 1.0 } else { 0.0 }
    }

    /// Gate values for interleaved `samples`, one per frame.
    pub fn process_interleaved(&mut self, samples: &[f64], channels: usize) -> Vec<f64> {
        samples.chunks(channels).map(|frame| self.next_frame(frame)).collect()
    }
}

/// Split channel `gate_channel` out of interleaved `samples`.
///
/// Returns the remaining channels, still interleaved, and the gate.
pub fn split_gate_channel(
    samples: &[f64],
    channels: usize,
    gate_channel: usize,
) -> Option<(Vec<f64>, Vec<f64>)> {
    if gate_channel >= channels || channels < 2 {
        return None;
    }
    let frames = samples.len() / channels;
    let mut rest = Vec::with_capacity(frames * (channels - 1));
    let mut gate = Vec::with_capacity(frames);

    for frame in samples.chunks_exact(channels) {
        for (c, &x) in frame.iter().enumerate() {
            if c == gate_channel {
                gate.push(x);
            } else {
                rest.push(x);
            }
        }
    }
    Some((rest, gate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_on_level_and_holds_for_release() {
        let mut gate = LevelGate::new(0.5, 2);
        let input = [0.0, 0.6, 0.1, 0.1, 0.1, 0.1, -0.7, 0.0];
        let out: Vec<f64> = input.iter().map(|&x| gate.next_frame(&[x])).collect();
        assert_eq!(out, vec![0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn zero_release_follows_level() {
        let mut gate = LevelGate::new(0.5, 0);
        assert_eq!(gate.process_interleaved(&[0.9, 0.2, 0.1], 1), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn any_channel_opens() {
        let mut gate = LevelGate::new(0.5, 0);
        let samples = [0.1, 0.0, 0.0, 0.8, 0.0, 0.0];
        assert_eq!(gate.process_interleaved(&samples, 2), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn state_carries_across_blocks() {
        let mut gate = LevelGate::new(0.5, 1);
        assert_eq!(gate.process_interleaved(&[0.0, 0.9], 1), vec![0.0, 1.0]);
        assert_eq!(gate.process_interleaved(&[0.0, 0.0], 1), vec![1.0, 0.0]);
    }

    #[test]
    fn splits_gate_channel() {
        let samples = [1.0, 0.0, 10.0, 2.0, 1.0, 20.0];
        let (rest, gate) = split_gate_channel(&samples, 3, 1).unwrap();
        assert_eq!(rest, vec![1.0, 10.0, 2.0, 20.0]);
        assert_eq!(gate, vec![0.0, 1.0]);
        assert!(split_gate_channel(&samples, 3, 3).is_none());
        assert!(split_gate_channel(&samples, 1, 0).is_none());
    }
}
