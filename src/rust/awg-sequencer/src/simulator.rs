// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! In-memory AWG for dry runs and tests.
//!
//! [`SimulatedAwg`] records every command it receives and models the parts of
//! the instrument state a sequence load touches: run mode, sequence table,
//! waveform files and the output stage. Commands that a real instrument would
//! reject (assigning to a cell outside the table, importing a file that was
//! never sent) fail the same way.
use std::time::Duration;

use anyhow::{anyhow, bail};
use indexmap::IndexMap;
use sample_buffer::{MarkerBuffer, SampleBuffer};

use crate::device::{AwgDevice, Channel, LoopCount, RunMode};

/// A state changing command received by a [`SimulatedAwg`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetRunMode(RunMode),
    SetSequenceLength(usize),
    SetOffset {
        channel: Channel,
        offset: f64,
    },
    SetAmplitude {
        channel: Channel,
        amplitude: f64,
    },
    SendWaveform {
        file_path: String,
        len: usize,
        clock: Option<f64>,
    },
    ImportWaveform {
        name: String,
        file_path: String,
    },
    AssignWaveform {
        channel: Channel,
        position: usize,
        name: String,
    },
    SetSequenceLoop {
        position: usize,
        count: LoopCount,
    },
    SendCombined {
        channel: Channel,
        position: usize,
        len: usize,
    },
    SetOutputEnabled {
        channel: Channel,
        enabled: bool,
    },
    SetSequenceGoto {
        position: usize,
        target: usize,
    },
    Run,
    Wait(Duration),
}

/// Waveform file stored on the simulated instrument's disk.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformFile {
    pub samples: SampleBuffer,
    pub marker1: MarkerBuffer,
    pub marker2: MarkerBuffer,
    pub clock: Option<f64>,
}

/// Sequence segment written by a combined send.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub samples1: SampleBuffer,
    pub samples2: SampleBuffer,
    pub marker1: MarkerBuffer,
    pub marker2: MarkerBuffer,
}

#[derive(Debug, Clone)]
pub struct SimulatedAwg {
    device_type: String,
    run_mode: RunMode,
    sequence_length: usize,
    offsets: [f64; 2],
    amplitudes: [f64; 2],
    outputs: [bool; 2],
    running: bool,
    goto: Option<(usize, usize)>,
    loops: IndexMap<usize, LoopCount>,
    table: IndexMap<(Channel, usize), String>,
    files: IndexMap<String, WaveformFile>,
    waveforms: IndexMap<String, String>,
    segments: IndexMap<usize, Segment>,
    commands: Vec<Command>,
    fail_after: Option<usize>,
    settled: bool,
}

impl SimulatedAwg {
    pub fn new(device_type: impl Into<String>) -> Self {
        SimulatedAwg {
            device_type: device_type.into(),
            run_mode: RunMode::Continuous,
            sequence_length: 0,
            offsets: [0.0; 2],
            amplitudes: [1.0; 2],
            outputs: [false; 2],
            running: false,
            goto: None,
            loops: IndexMap::new(),
            table: IndexMap::new(),
            files: IndexMap::new(),
            waveforms: IndexMap::new(),
            segments: IndexMap::new(),
            commands: Vec::new(),
            fail_after: None,
            settled: true,
        }
    }

    pub fn tektronix() -> Self {
        SimulatedAwg::new("Tektronix_AWG5014")
    }

    pub fn tabor() -> Self {
        SimulatedAwg::new("Tabor_WX1284C")
    }

    /// Let every command after the first `count` accepted ones fail.
    pub fn fail_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    /// Whether `wait` reports the instrument as settled.
    pub fn with_settled(mut self, settled: bool) -> Self {
        self.settled = settled;
        self
    }

    /// Accepted commands in the order received.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn count_commands(&self, predicate: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(*c)).count()
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn offset(&self, channel: Channel) -> f64 {
        self.offsets[channel.index()]
    }

    pub fn amplitude(&self, channel: Channel) -> f64 {
        self.amplitudes[channel.index()]
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn sequence_goto(&self) -> Option<(usize, usize)> {
        self.goto
    }

    pub fn loop_count(&self, position: usize) -> Option<LoopCount> {
        self.loops.get(&position).copied()
    }

    /// Name of the waveform assigned to the table cell of `channel` at `position`.
    pub fn table_entry(&self, channel: Channel, position: usize) -> Option<&str> {
        self.table.get(&(channel, position)).map(String::as_str)
    }

    /// File content behind an imported waveform.
    pub fn waveform(&self, name: &str) -> Option<&WaveformFile> {
        self.waveforms
            .get(name)
            .and_then(|file_path| self.files.get(file_path))
    }

    pub fn segment(&self, position: usize) -> Option<&Segment> {
        self.segments.get(&position)
    }

    fn accept(&mut self, command: Command) -> anyhow::Result<()> {
        if let Some(limit) = self.fail_after
            && self.commands.len() >= limit
        {
            bail!("Simulated failure on {command:?}");
        }
        self.commands.push(command);
        Ok(())
    }

    fn check_position(&self, position: usize) -> anyhow::Result<()> {
        if position == 0 || position > self.sequence_length {
            bail!(
                "Sequence position {position} outside of table (length {})",
                self.sequence_length
            );
        }
        Ok(())
    }
}

impl AwgDevice for SimulatedAwg {
    fn device_type(&self) -> anyhow::Result<String> {
        Ok(self.device_type.clone())
    }

    fn set_run_mode(&mut self, mode: RunMode) -> anyhow::Result<()> {
        self.accept(Command::SetRunMode(mode))?;
        self.run_mode = mode;
        Ok(())
    }

    fn set_sequence_length(&mut self, length: usize) -> anyhow::Result<()> {
        self.accept(Command::SetSequenceLength(length))?;
        self.sequence_length = length;
        self.table.retain(|(_, position), _| *position <= length);
        self.loops.retain(|position, _| *position <= length);
        self.segments.retain(|position, _| *position <= length);
        if self.goto.is_some_and(|(position, _)| position > length) {
            self.goto = None;
        }
        Ok(())
    }

    fn set_offset(&mut self, channel: Channel, offset: f64) -> anyhow::Result<()> {
        self.accept(Command::SetOffset { channel, offset })?;
        self.offsets[channel.index()] = offset;
        Ok(())
    }

    fn set_amplitude(&mut self, channel: Channel, amplitude: f64) -> anyhow::Result<()> {
        self.accept(Command::SetAmplitude { channel, amplitude })?;
        self.amplitudes[channel.index()] = amplitude;
        Ok(())
    }

    fn send_waveform(
        &mut self,
        samples: &SampleBuffer,
        marker1: &MarkerBuffer,
        marker2: &MarkerBuffer,
        file_path: &str,
        clock: Option<f64>,
    ) -> anyhow::Result<()> {
        if marker1.len() != samples.len() || marker2.len() != samples.len() {
            bail!("Marker length does not match waveform length");
        }
        self.accept(Command::SendWaveform {
            file_path: file_path.to_string(),
            len: samples.len(),
            clock,
        })?;
        self.files.insert(
            file_path.to_string(),
            WaveformFile {
                samples: samples.clone(),
                marker1: marker1.clone(),
                marker2: marker2.clone(),
                clock,
            },
        );
        Ok(())
    }

    fn import_waveform(&mut self, name: &str, file_path: &str) -> anyhow::Result<()> {
        if !self.files.contains_key(file_path) {
            bail!("No waveform file at '{file_path}'");
        }
        self.accept(Command::ImportWaveform {
            name: name.to_string(),
            file_path: file_path.to_string(),
        })?;
        self.waveforms
            .insert(name.to_string(), file_path.to_string());
        Ok(())
    }

    fn assign_waveform(
        &mut self,
        channel: Channel,
        position: usize,
        name: &str,
    ) -> anyhow::Result<()> {
        self.check_position(position)?;
        if !self.waveforms.contains_key(name) {
            bail!("Waveform '{name}' was not imported");
        }
        self.accept(Command::AssignWaveform {
            channel,
            position,
            name: name.to_string(),
        })?;
        self.table.insert((channel, position), name.to_string());
        Ok(())
    }

    fn set_sequence_loop(&mut self, position: usize, count: LoopCount) -> anyhow::Result<()> {
        self.check_position(position)?;
        self.accept(Command::SetSequenceLoop { position, count })?;
        self.loops.insert(position, count);
        Ok(())
    }

    fn send_combined(
        &mut self,
        samples1: &SampleBuffer,
        samples2: &SampleBuffer,
        marker1: &MarkerBuffer,
        marker2: &MarkerBuffer,
        channel: Channel,
        position: usize,
    ) -> anyhow::Result<()> {
        self.check_position(position)?;
        let len = samples1.len();
        if [samples2.len(), marker1.len(), marker2.len()]
            .iter()
            .any(|l| *l != len)
        {
            bail!("Segment buffers differ in length");
        }
        self.accept(Command::SendCombined {
            channel,
            position,
            len,
        })?;
        self.segments.insert(
            position,
            Segment {
                samples1: samples1.clone(),
                samples2: samples2.clone(),
                marker1: marker1.clone(),
                marker2: marker2.clone(),
            },
        );
        Ok(())
    }

    fn set_output_enabled(&mut self, channel: Channel, enabled: bool) -> anyhow::Result<()> {
        self.accept(Command::SetOutputEnabled { channel, enabled })?;
        self.outputs[channel.index()] = enabled;
        Ok(())
    }

    fn set_sequence_goto(&mut self, position: usize, target: usize) -> anyhow::Result<()> {
        self.check_position(position)?;
        self.check_position(target)?;
        self.accept(Command::SetSequenceGoto { position, target })?;
        self.goto = Some((position, target));
        Ok(())
    }

    fn run(&mut self) -> anyhow::Result<()> {
        self.accept(Command::Run)?;
        self.running = true;
        Ok(())
    }

    fn wait(&mut self, timeout: Duration) -> anyhow::Result<bool> {
        self.accept(Command::Wait(timeout))?;
        Ok(self.settled)
    }

    fn output_enabled(&mut self, channel: Channel) -> anyhow::Result<bool> {
        if self.fail_after.is_some_and(|limit| self.commands.len() >= limit) {
            return Err(anyhow!("Simulated failure reading {channel} status"));
        }
        Ok(self.outputs[channel.index()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_bounds() {
        let mut awg = SimulatedAwg::tektronix();
        let samples = SampleBuffer::Float64(vec![0.0; 64]);
        let markers = MarkerBuffer::zeros(64);
        awg.send_waveform(&samples, &markers, &markers, "c:\\w\\a", None).unwrap();
        awg.import_waveform("a", "c:\\w\\a").unwrap();
        assert!(awg.assign_waveform(Channel::One, 1, "a").is_err());
        awg.set_sequence_length(2).unwrap();
        awg.assign_waveform(Channel::One, 2, "a").unwrap();
        assert!(awg.assign_waveform(Channel::One, 3, "a").is_err());
        assert!(awg.assign_waveform(Channel::Two, 1, "b").is_err());
        assert_eq!(awg.table_entry(Channel::One, 2), Some("a"));
        assert_eq!(awg.waveform("a").unwrap().samples, samples);

        awg.set_sequence_length(0).unwrap();
        assert_eq!(awg.table_entry(Channel::One, 2), None);
    }

    #[test]
    fn test_import_requires_file() {
        let mut awg = SimulatedAwg::tektronix();
        assert!(awg.import_waveform("a", "c:\\w\\a").is_err());
        assert!(awg.commands().is_empty());
    }

    #[test]
    fn test_fail_after() {
        let mut awg = SimulatedAwg::tabor().fail_after(2);
        awg.set_run_mode(RunMode::Sequence).unwrap();
        awg.set_sequence_length(4).unwrap();
        assert!(awg.set_offset(Channel::One, 0.0).is_err());
        assert_eq!(awg.commands().len(), 2);
        assert!(awg.output_enabled(Channel::One).is_err());
    }

    #[test]
    fn test_wait() {
        let mut awg = SimulatedAwg::tektronix().with_settled(false);
        assert!(!awg.wait(Duration::from_secs(10)).unwrap());
        assert_eq!(
            awg.commands(),
            &[Command::Wait(Duration::from_secs(10))]
        );
    }
}
