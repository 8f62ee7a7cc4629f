//! Gate edge detection over overlapping windows.
//!
//! Every cycle the gate window holds `fifo_width` slots of which only the
//! last `buffer_size` are new. The leading `fifo_width - buffer_size` slots
//! (the look-back) repeat the previous cycle and let a run that was still
//! open last cycle be recovered with its true start once it closes.

use crate::window::GateWindow;

/// Half-open slot range `[start, end)` of one closed high-gate run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipInterval {
    pub start: usize,
    pub end: usize,
}

impl ClipInterval {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Find every closed run that has not been reported in an earlier cycle.
///
/// Scanning starts at the first new slot. A run that is already high there,
/// or at the last look-back slot, is walked back into the look-back to its
/// true start. Runs still high at the end of the window are left for a
/// later cycle.
pub fn find_clips(gate: &GateWindow<'_>, buffer_size: usize) -> Vec<ClipInterval> {
    let width = gate.width();
    let overlap = width.saturating_sub(buffer_size);
    let mut clips = Vec::new();

    // The last look-back slot was the last slot of the previous window, so a
    // run high there was still open last cycle and has not been reported.
    let mut rising = if overlap > 0 && gate.is_high(overlap - 1) {
        overlap - 1
    } else {
        overlap
    };

    loop {
        while rising < width && !gate.is_high(rising) {
            rising += 1;
        }
        if rising == width {
            break;
        }

        if rising == overlap || rising + 1 == overlap {
            while rising > 0 && gate.is_high(rising - 1) {
                rising -= 1;
            }
        }

        let mut trailing = rising.max(overlap);
        while trailing < width && gate.is_high(trailing) {
            trailing += 1;
        }
        if trailing == width {
            // still open, picked up next cycle
            break;
        }

        clips.push(ClipInterval {
            start: rising,
            end: trailing,
        });
        rising = trailing;
    }

    clips
}

/// State that persists across cycles.
#[derive(Clone, Debug, Default)]
pub struct DetectorState {
    cycle: u64,
}

impl DetectorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed cycles since the start of the run.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn advance(&mut self) {
        self.cycle += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fifo::OverlapFifo;
    use crate::window::ChannelOrder;

    fn clips(gate: &[f64], buffer_size: usize) -> Vec<(usize, usize)> {
        find_clips(&GateWindow::new(gate), buffer_size)
            .into_iter()
            .map(|c| (c.start, c.end))
            .collect()
    }

    #[test]
    fn finds_closed_run_in_new_region() {
        let gate = [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        assert_eq!(clips(&gate, 4), vec![(5, 7)]);
    }

    #[test]
    fn ignores_runs_wholly_in_look_back() {
        let gate = [0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0];
        assert_eq!(clips(&gate, 4), vec![(4, 6)]);
    }

    #[test]
    fn walks_back_to_true_start() {
        let gate = [0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        assert_eq!(clips(&gate, 4), vec![(2, 5)]);
    }

    #[test]
    fn open_run_is_deferred() {
        let gate = [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        assert!(clips(&gate, 4).is_empty());
    }

    #[test]
    fn emits_multiple_runs_in_order() {
        let gate = [0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
        assert_eq!(clips(&gate, 8), vec![(2, 3), (4, 5), (6, 8)]);
    }

    #[test]
    fn zero_look_back_starts_at_window_start() {
        let gate = [1.0, 1.0, 0.0, 0.0];
        assert_eq!(clips(&gate, 4), vec![(0, 2)]);
    }

    #[test]
    fn run_covering_whole_look_back_starts_at_zero() {
        let gate = [1.0, 1.0, 1.0, 1.0, 1.0, 0.0];
        assert_eq!(clips(&gate, 2), vec![(0, 5)]);
    }

    #[test]
    fn run_closing_on_block_boundary_is_not_lost() {
        let mut fifo = OverlapFifo::new(4, 8, 1, ChannelOrder::Interleaved);
        let first = fifo.push(&[0.0, 0.0, 1.0, 1.0]).to_vec();
        assert!(find_clips(&GateWindow::new(&first), 4).is_empty());

        let second = fifo.push(&[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(
            find_clips(&GateWindow::new(second), 4),
            vec![ClipInterval { start: 2, end: 4 }]
        );
    }

    #[test]
    fn all_low_yields_nothing() {
        assert!(clips(&[0.0; 8], 4).is_empty());
    }

    #[test]
    fn two_cycle_scenario() {
        let cycle1 = [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        let cycle2 = [0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0];
        assert_eq!(clips(&cycle1, 4), vec![(5, 7)]);
        assert_eq!(clips(&cycle2, 4), vec![(4, 6)]);
    }

    fn true_runs(stream: &[f64]) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        let mut start = None;
        for (i, &g) in stream.iter().enumerate() {
            match (g != 0.0, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    runs.push((s, i));
                    start = None;
                }
                _ => {}
            }
        }
        runs
    }

    fn detected_runs(stream: &[f64], buffer_size: usize, fifo_width: usize) -> Vec<(usize, usize)> {
        let mut fifo = OverlapFifo::new(buffer_size, fifo_width, 1, ChannelOrder::Interleaved);
        let mut found = Vec::new();
        let mut padded = stream.to_vec();
        padded.resize(stream.len().div_ceil(buffer_size) * buffer_size + buffer_size, 0.0);

        for (cycle, block) in padded.chunks(buffer_size).enumerate() {
            let window = fifo.push(block);
            // absolute slot of window index 0; may precede the stream
            let origin = (cycle * buffer_size + buffer_size) as isize - fifo_width as isize;
            for clip in find_clips(&GateWindow::new(window), buffer_size) {
                let start = origin + clip.start as isize;
                let end = origin + clip.end as isize;
                assert!(start >= 0, "clip reaches into prehistory");
                found.push((start as usize, end as usize));
            }
        }
        found
    }

    #[test]
    fn multi_cycle_runs_match_stream_runs() {
        let pattern: Vec<f64> = [
            0, 1, 1, 0, 0, 0, 1, 0, 1, 1, 1, 1, 1, 0, 0, 1, 0, 0, 0, 0, 1, 1, 0, 1, 0, 1, 1, 1, 0,
            0, 0, 1, 1, 1, 1, 1, 1, 0, 1, 0,
        ]
        .iter()
        .map(|&g| g as f64)
        .collect();

        for (buffer_size, fifo_width) in [(1, 8), (2, 8), (3, 9), (4, 10), (4, 12), (5, 13)] {
            assert_eq!(
                detected_runs(&pattern, buffer_size, fifo_width),
                true_runs(&pattern),
                "buffer_size={} fifo_width={}",
                buffer_size,
                fifo_width
            );
        }
    }

    #[test]
    fn run_open_at_window_end_is_emitted_later_with_true_start() {
        let mut fifo = OverlapFifo::new(4, 8, 1, ChannelOrder::Interleaved);
        let first = fifo.push(&[0.0, 0.0, 1.0, 1.0]).to_vec();
        assert!(find_clips(&GateWindow::new(&first), 4).is_empty());

        let second = fifo.push(&[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(
            find_clips(&GateWindow::new(second), 4),
            vec![ClipInterval { start: 2, end: 5 }]
        );
    }

    #[test]
    fn cycle_counter_advances() {
        let mut state = DetectorState::new();
        assert_eq!(state.cycle(), 0);
        state.advance();
        state.advance();
        assert_eq!(state.cycle(), 2);
    }
}
