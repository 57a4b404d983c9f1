// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Backend adapters translating the sequence loading workflow into the
//! command model of an AWG family.
mod combined_send;
mod slot_table;

pub use combined_send::CombinedSendProgrammer;
pub use slot_table::SlotTableProgrammer;

use anyhow::Context;

use crate::device::{AwgDevice, Channel};
use crate::device_traits::BackendKind;
use crate::markers::MarkerPair;
use crate::settings::LoadOptions;
use crate::waveform::WaveformPair;
use crate::{Error, Result};

/// Everything needed to upload one channel of one sequence slot.
pub struct SlotUpload<'a> {
    /// Zero-based slot index.
    pub slot: usize,
    pub channel: Channel,
    pub waveforms: &'a WaveformPair,
    /// Resolved markers of both channels, indexed by channel.
    pub markers: &'a [MarkerPair; 2],
}

impl SlotUpload<'_> {
    /// One-based position of the slot in the device sequence table.
    pub fn position(&self) -> usize {
        self.slot + 1
    }
}

/// Outcome of a per-slot upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Uploaded,
    /// The channel was already covered by another upload of the same slot.
    Skipped,
}

/// Programs a sequence into a device following one command model.
pub trait SequenceProgrammer {
    fn kind(&self) -> BackendKind;

    /// Put the device into sequence mode and size the table for `slot_count` slots.
    fn setup(
        &self,
        device: &mut dyn AwgDevice,
        slot_count: usize,
        options: &LoadOptions,
    ) -> Result<()>;

    fn upload_slot(
        &self,
        device: &mut dyn AwgDevice,
        upload: &SlotUpload,
        options: &LoadOptions,
    ) -> Result<Dispatch>;

    /// Enable the outputs and start playback.
    fn finalize(
        &self,
        device: &mut dyn AwgDevice,
        slot_count: usize,
        options: &LoadOptions,
    ) -> Result<()>;
}

pub fn programmer_for(kind: BackendKind) -> Box<dyn SequenceProgrammer> {
    match kind {
        BackendKind::SlotTable => Box::new(SlotTableProgrammer),
        BackendKind::CombinedSend => Box::new(CombinedSendProgrammer),
    }
}

/// Wrap a failed device command into a device error.
pub(crate) fn device_command<T>(result: anyhow::Result<T>, command: &str) -> Result<T> {
    result
        .with_context(|| format!("'{command}' failed"))
        .map_err(Error::Device)
}

/// Zero offsets and the configured amplitudes on both channels.
pub(crate) fn apply_output_levels(device: &mut dyn AwgDevice, options: &LoadOptions) -> Result<()> {
    for channel in Channel::ALL {
        device_command(device.set_offset(channel, 0.0), "set offset")?;
    }
    for channel in Channel::ALL {
        device_command(
            device.set_amplitude(channel, options.amplitude(channel)),
            "set amplitude",
        )?;
    }
    Ok(())
}

pub(crate) fn enable_outputs(device: &mut dyn AwgDevice) -> Result<()> {
    for channel in Channel::ALL {
        device_command(device.set_output_enabled(channel, true), "enable output")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::{Command, SimulatedAwg};

    #[test]
    fn test_offsets_before_amplitudes() {
        let mut device = SimulatedAwg::tektronix();
        let options = LoadOptions {
            ch2_amplitude: 0.5,
            ..LoadOptions::default()
        };
        apply_output_levels(&mut device, &options).unwrap();
        assert_eq!(
            device.commands(),
            &[
                Command::SetOffset {
                    channel: Channel::One,
                    offset: 0.0,
                },
                Command::SetOffset {
                    channel: Channel::Two,
                    offset: 0.0,
                },
                Command::SetAmplitude {
                    channel: Channel::One,
                    amplitude: 2.0,
                },
                Command::SetAmplitude {
                    channel: Channel::Two,
                    amplitude: 0.5,
                },
            ]
        );
    }
}
