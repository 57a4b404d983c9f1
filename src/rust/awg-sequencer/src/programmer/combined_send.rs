// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::Result;
use crate::device::{AwgDevice, Channel, RunMode};
use crate::device_traits::BackendKind;
use crate::settings::LoadOptions;

use super::{
    Dispatch, SequenceProgrammer, SlotUpload, apply_output_levels, device_command,
    enable_outputs,
};

/// Tabor style programming: both channels of a segment are sent in one call,
/// together with the markers of channel 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct CombinedSendProgrammer;

impl SequenceProgrammer for CombinedSendProgrammer {
    fn kind(&self) -> BackendKind {
        BackendKind::CombinedSend
    }

    fn setup(
        &self,
        device: &mut dyn AwgDevice,
        slot_count: usize,
        options: &LoadOptions,
    ) -> Result<()> {
        device_command(device.set_run_mode(RunMode::Sequence), "set run mode")?;
        device_command(device.set_sequence_length(slot_count), "set sequence length")?;
        apply_output_levels(device, options)
    }

    fn upload_slot(
        &self,
        device: &mut dyn AwgDevice,
        upload: &SlotUpload,
        _options: &LoadOptions,
    ) -> Result<Dispatch> {
        if upload.channel != Channel::One {
            return Ok(Dispatch::Skipped);
        }
        let markers = &upload.markers[Channel::One.index()];
        sequencer_log::diagnostic!("Sending segment {}", upload.position());
        device_command(
            device.send_combined(
                upload.waveforms.channel(Channel::One),
                upload.waveforms.channel(Channel::Two),
                &markers.marker1,
                &markers.marker2,
                Channel::One,
                upload.position(),
            ),
            "send combined waveform",
        )?;
        Ok(Dispatch::Uploaded)
    }

    fn finalize(
        &self,
        device: &mut dyn AwgDevice,
        _slot_count: usize,
        _options: &LoadOptions,
    ) -> Result<()> {
        enable_outputs(device)
    }
}
