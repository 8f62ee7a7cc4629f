//! Read-only views over one processing cycle's sample and gate buffers.

/// Storage convention of a multi-channel buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelOrder {
    /// One time slot after another, all channels of a slot adjacent.
    #[default]
    Interleaved,
    /// All of channel 0, then all of channel 1, and so on.
    ChannelMajor,
}

impl ChannelOrder {
    pub fn from_column_major(column_major: bool) -> Self {
        if column_major {
            ChannelOrder::ChannelMajor
        } else {
            ChannelOrder::Interleaved
        }
    }

    pub fn is_column_major(self) -> bool {
        self == ChannelOrder::ChannelMajor
    }

    /// Buffer index of `(channel, t)` in a buffer `width` slots wide.
    #[inline]
    pub fn index(self, width: usize, channels: usize, channel: usize, t: usize) -> usize {
        match self {
            ChannelOrder::ChannelMajor => width * channel + t,
            ChannelOrder::Interleaved => channels * t + channel,
        }
    }
}

/// Multi-channel samples for one cycle, `fifo_width` slots by `channels`.
#[derive(Clone, Copy, Debug)]
pub struct SampleWindow<'a> {
    data: &'a [f64],
    fifo_width: usize,
    channels: usize,
    order: ChannelOrder,
}

impl<'a> SampleWindow<'a> {
    /// Returns `None` unless `data.len() == fifo_width * channels`.
    pub fn new(
        data: &'a [f64],
        fifo_width: usize,
        channels: usize,
        order: ChannelOrder,
    ) -> Option<Self> {
        if channels == 0 || data.len() != fifo_width * channels {
            return None;
        }
        Some(Self {
            data,
            fifo_width,
            channels,
            order,
        })
    }

    pub fn fifo_width(&self) -> usize {
        self.fifo_width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    #[inline]
    pub fn sample(&self, channel: usize, t: usize) -> f64 {
        self.data[self.order.index(self.fifo_width, self.channels, channel, t)]
    }
}

/// Single-channel gate aligned with a [`SampleWindow`]. Non-zero means asserted.
#[derive(Clone, Copy, Debug)]
pub struct GateWindow<'a> {
    data: &'a [f64],
}

impl<'a> GateWindow<'a> {
    pub fn new(data: &'a [f64]) -> Self {
        Self { data }
    }

    pub fn width(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_high(&self, t: usize) -> bool {
        self.data[t] != 0.0
    }
}
