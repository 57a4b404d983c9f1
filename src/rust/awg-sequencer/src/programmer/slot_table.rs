// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::Result;
use crate::device::{AwgDevice, LoopCount, RunMode};
use crate::device_traits::BackendKind;
use crate::settings::LoadOptions;

use super::{
    Dispatch, SequenceProgrammer, SlotUpload, apply_output_levels, device_command,
    enable_outputs,
};

/// Tektronix style programming: every (slot, channel) waveform is sent as a
/// file, imported as a named waveform and assigned to its table cell.
#[derive(Debug, Default, Clone, Copy)]
pub struct SlotTableProgrammer;

/// Name of the waveform resource of a table cell, e.g. `ch2_t00017`.
pub fn resource_name(upload: &SlotUpload) -> String {
    format!("ch{}_t{:05}", upload.channel.number(), upload.slot)
}

impl SequenceProgrammer for SlotTableProgrammer {
    fn kind(&self) -> BackendKind {
        BackendKind::SlotTable
    }

    fn setup(
        &self,
        device: &mut dyn AwgDevice,
        slot_count: usize,
        options: &LoadOptions,
    ) -> Result<()> {
        device_command(device.set_run_mode(RunMode::Sequence), "set run mode")?;
        // Clear the table so no cell of a previous sequence survives.
        device_command(device.set_sequence_length(0), "set sequence length")?;
        device_command(device.set_sequence_length(slot_count), "set sequence length")?;
        apply_output_levels(device, options)
    }

    fn upload_slot(
        &self,
        device: &mut dyn AwgDevice,
        upload: &SlotUpload,
        options: &LoadOptions,
    ) -> Result<Dispatch> {
        let channel = upload.channel;
        let name = resource_name(upload);
        let file_path = options.waveform_path(&name);
        let markers = &upload.markers[channel.index()];
        sequencer_log::diagnostic!("Uploading {name} to {file_path}");
        device_command(
            device.send_waveform(
                upload.waveforms.channel(channel),
                &markers.marker1,
                &markers.marker2,
                &file_path,
                options.clock,
            ),
            "send waveform",
        )?;
        device_command(device.import_waveform(&name, &file_path), "import waveform")?;
        device_command(
            device.assign_waveform(channel, upload.position(), &name),
            "assign waveform",
        )?;
        if options.loop_slots {
            device_command(
                device.set_sequence_loop(upload.position(), LoopCount::Infinite),
                "set sequence loop",
            )?;
        }
        Ok(Dispatch::Uploaded)
    }

    fn finalize(
        &self,
        device: &mut dyn AwgDevice,
        slot_count: usize,
        options: &LoadOptions,
    ) -> Result<()> {
        enable_outputs(device)?;
        device_command(device.set_sequence_goto(slot_count, 1), "set sequence goto")?;
        device_command(device.run(), "run")?;
        let timeout = options.settle_timeout()?;
        if !device_command(device.wait(timeout), "wait")? {
            sequencer_log::warn!(
                "Device did not settle within {:.1} s after starting the sequence",
                timeout.as_secs_f64()
            );
        }
        Ok(())
    }
}
