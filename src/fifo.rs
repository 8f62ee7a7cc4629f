//! Turns a stream of non-overlapping blocks into overlapping windows.

use crate::window::ChannelOrder;

/// Sliding window over the last `fifo_width` slots of a block stream.
///
/// Each pushed block holds `buffer_size` new slots. The first
/// `fifo_width - buffer_size` slots of the returned window repeat the tail
/// of the previous window. Slots before the start of the stream are zero.
pub struct OverlapFifo {
    buffer_size: usize,
    fifo_width: usize,
    channels: usize,
    order: ChannelOrder,
    window: Vec<f64>,
}

impl OverlapFifo {
    pub fn new(
        buffer_size: usize,
        fifo_width: usize,
        channels: usize,
        order: ChannelOrder,
    ) -> Self {
        assert!(buffer_size > 0 && fifo_width >= buffer_size && channels > 0);
        Self {
            buffer_size,
            fifo_width,
            channels,
            order,
            window: vec![0.0; fifo_width * channels],
        }
    }

    pub fn overlap(&self) -> usize {
        self.fifo_width - self.buffer_size
    }

    /// Expected length of a block passed to [`push`](Self::push).
    pub fn block_len(&self) -> usize {
        self.buffer_size * self.channels
    }

    /// Shift in one block and return the updated window.
    ///
    /// Panics if `block.len() != self.block_len()`.
    pub fn push(&mut self, block: &[f64]) -> &[f64] {
        assert_eq!(block.len(), self.block_len(), "block length mismatch");
        let (b, f) = (self.buffer_size, self.fifo_width);

        match self.order {
            ChannelOrder::Interleaved => {
                let c = self.channels;
                self.window.copy_within(b * c.., 0);
                self.window[(f - b) * c..].copy_from_slice(block);
            }
            ChannelOrder::ChannelMajor => {
                for (channel, new) in block.chunks_exact(b).enumerate() {
                    let row = &mut self.window[channel * f..(channel + 1) * f];
                    row.copy_within(b.., 0);
                    row[f - b..].copy_from_slice(new);
                }
            }
        }

        &self.window
    }

    pub fn window(&self) -> &[f64] {
        &self.window
    }
}
