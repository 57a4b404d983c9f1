// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Command-level capability contract of an AWG.
//!
//! Everything below this interface (VISA, sockets, file transfer to the
//! instrument's disk) belongs to the driver implementing [`AwgDevice`].

use std::fmt::{self, Display};
use std::time::Duration;

use sample_buffer::{MarkerBuffer, SampleBuffer};

/// Analog output channel of a two-channel AWG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    One,
    Two,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::One, Channel::Two];

    /// Zero-based index, as used for waveform and marker pairs.
    pub const fn index(&self) -> usize {
        match self {
            Channel::One => 0,
            Channel::Two => 1,
        }
    }

    /// One-based channel number, as used by the instrument.
    pub const fn number(&self) -> u8 {
        match self {
            Channel::One => 1,
            Channel::Two => 2,
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Continuous,
    Sequence,
}

/// Repeat count of a sequence table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    Finite(u32),
    Infinite,
}

/// Commands an AWG driver must support for sequence loading.
///
/// Sequence table positions are one-based, as on the instrument. Every
/// command is a blocking round trip; failures are reported as the driver's
/// own error and classified as device errors by the caller.
pub trait AwgDevice {
    /// Instrument identification, e.g. `"Tektronix_AWG7062"` or `"Tabor_WX1284"`.
    fn device_type(&self) -> anyhow::Result<String>;

    fn set_run_mode(&mut self, mode: RunMode) -> anyhow::Result<()>;

    /// Resize the sequence table. A length of 0 clears it.
    fn set_sequence_length(&mut self, length: usize) -> anyhow::Result<()>;

    fn set_offset(&mut self, channel: Channel, offset: f64) -> anyhow::Result<()>;

    fn set_amplitude(&mut self, channel: Channel, amplitude: f64) -> anyhow::Result<()>;

    /// Transfer samples and markers into a waveform file on the instrument.
    fn send_waveform(
        &mut self,
        samples: &SampleBuffer,
        marker1: &MarkerBuffer,
        marker2: &MarkerBuffer,
        file_path: &str,
        clock: Option<f64>,
    ) -> anyhow::Result<()>;

    /// Import a previously sent waveform file into the waveform list under `name`.
    fn import_waveform(&mut self, name: &str, file_path: &str) -> anyhow::Result<()>;

    /// Assign the named waveform to the table cell of `channel` at `position`.
    fn assign_waveform(&mut self, channel: Channel, position: usize, name: &str)
    -> anyhow::Result<()>;

    fn set_sequence_loop(&mut self, position: usize, count: LoopCount) -> anyhow::Result<()>;

    /// Send the waveforms of both channels together with one marker pair to the
    /// sequence segment at `position`.
    fn send_combined(
        &mut self,
        samples1: &SampleBuffer,
        samples2: &SampleBuffer,
        marker1: &MarkerBuffer,
        marker2: &MarkerBuffer,
        channel: Channel,
        position: usize,
    ) -> anyhow::Result<()>;

    fn set_output_enabled(&mut self, channel: Channel, enabled: bool) -> anyhow::Result<()>;

    /// Jump to `target` after the entry at `position` has been played.
    fn set_sequence_goto(&mut self, position: usize, target: usize) -> anyhow::Result<()>;

    fn run(&mut self) -> anyhow::Result<()>;

    /// Wait up to `timeout` for the instrument to finish pending operations.
    ///
    /// Returns `Ok(false)` on timeout; a timeout is not an error.
    fn wait(&mut self, timeout: Duration) -> anyhow::Result<bool>;

    fn output_enabled(&mut self, channel: Channel) -> anyhow::Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_numbering() {
        assert_eq!(Channel::ALL.map(|c| c.index()), [0, 1]);
        assert_eq!(Channel::ALL.map(|c| c.number()), [1, 2]);
        assert_eq!(Channel::Two.to_string(), "ch2");
    }
}
