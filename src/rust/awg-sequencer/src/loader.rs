// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;

use crate::device::{AwgDevice, Channel};
use crate::device_traits::BackendKind;
use crate::markers::{MarkerResolver, MarkerSpec};
use crate::programmer::{Dispatch, SequenceProgrammer, SlotUpload, device_command, programmer_for};
use crate::progress::Progress;
use crate::settings::LoadOptions;
use crate::waveform::{IqConverter, WaveformPair, WaveformSource};
use crate::{Error, Result};

/// Channel status read back after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadResult {
    pub channels_enabled: [bool; 2],
}

impl LoadResult {
    pub fn channel_enabled(&self, channel: Channel) -> bool {
        self.channels_enabled[channel.index()]
    }

    /// Both outputs report enabled.
    pub fn success(&self) -> bool {
        self.channels_enabled.iter().all(|enabled| *enabled)
    }
}

/// Programs a time-indexed waveform sequence into an AWG sequence table.
///
/// For every time parameter in the slot sequence the waveform source is
/// sampled, the optional IQ converter applied and the markers resolved. The
/// result is uploaded with the command model matching the device type.
pub struct SequenceLoader<'a, C: ?Sized> {
    source: &'a dyn WaveformSource<C>,
    iq_converter: Option<&'a dyn IqConverter>,
    markers: MarkerResolver<C>,
    options: LoadOptions,
}

impl<'a, C: ?Sized> SequenceLoader<'a, C> {
    pub fn new(source: &'a dyn WaveformSource<C>) -> Self {
        SequenceLoader {
            source,
            iq_converter: None,
            markers: MarkerResolver::new(MarkerSpec::None),
            options: LoadOptions::default(),
        }
    }

    pub fn with_iq_converter(mut self, iq_converter: &'a dyn IqConverter) -> Self {
        self.iq_converter = Some(iq_converter);
        self
    }

    pub fn with_markers(mut self, markers: MarkerSpec<C>) -> Self {
        self.markers = MarkerResolver::new(markers);
        self
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load one waveform per time parameter in `slots` into consecutive
    /// sequence table entries of `device`.
    ///
    /// Errors raised while processing a slot carry its location. A device that
    /// does not settle after starting is not an error.
    pub fn load(
        &self,
        slots: &[f64],
        config: &C,
        device: &mut dyn AwgDevice,
        progress: &mut dyn Progress,
    ) -> Result<LoadResult> {
        self.options.validate()?;
        if slots.is_empty() {
            return Err(Error::configuration("Cannot load an empty sequence"));
        }
        let device_type = device_command(device.device_type(), "read device type")?;
        let kind = BackendKind::from_device_type(&device_type)?;
        let programmer = programmer_for(kind);
        let slot_count = slots.len();
        sequencer_log::info!(
            "Loading {slot_count} slots onto '{device_type}' using the {kind} model"
        );

        if self.options.reset {
            programmer.setup(device, slot_count, &self.options)?;
        }
        progress.start(slot_count * Channel::ALL.len());
        for (slot, &time) in slots.iter().enumerate() {
            self.load_slot(programmer.as_ref(), device, progress, slot, time, config)?;
        }
        if self.options.reset {
            programmer.finalize(device, slot_count, &self.options)?;
        }
        progress.finish();

        let mut channels_enabled = [false; 2];
        for channel in Channel::ALL {
            channels_enabled[channel.index()] =
                device_command(device.output_enabled(channel), "read output status")?;
        }
        let result = LoadResult { channels_enabled };
        if !result.success() {
            sequencer_log::warn!("Outputs not enabled after load: {channels_enabled:?}");
        }
        Ok(result)
    }

    fn load_slot(
        &self,
        programmer: &dyn SequenceProgrammer,
        device: &mut dyn AwgDevice,
        progress: &mut dyn Progress,
        slot: usize,
        time: f64,
        config: &C,
    ) -> Result<()> {
        let waveforms = self
            .generate(programmer.kind(), time, config)
            .map_err(|e| e.at(slot, None))?;
        let resolve = |channel: Channel| {
            self.markers
                .resolve(slot, time, config, channel, waveforms.channel(channel))
                .map_err(|e| e.at(slot, Some(channel)))
        };
        let markers = [resolve(Channel::One)?, resolve(Channel::Two)?];
        sequencer_log::diagnostic!(
            "Slot {slot} (t = {time}): {} samples{}",
            waveforms.len(),
            if waveforms.is_homodyne() { ", homodyne" } else { "" }
        );

        for channel in Channel::ALL {
            let upload = SlotUpload {
                slot,
                channel,
                waveforms: &waveforms,
                markers: &markers,
            };
            let dispatch = programmer
                .upload_slot(device, &upload, &self.options)
                .map_err(|e| e.at(slot, Some(channel)))?;
            if dispatch == Dispatch::Skipped {
                sequencer_log::diagnostic!("Slot {slot} {channel}: covered by combined upload");
            }
            progress.advance();
        }
        Ok(())
    }

    fn generate(&self, kind: BackendKind, time: f64, config: &C) -> Result<WaveformPair> {
        let waveform = self
            .source
            .sample(time, config)
            .with_context(|| format!("Waveform source failed for time parameter {time}"))
            .map_err(Error::Source)?;
        let waveform = match self.iq_converter {
            Some(iq_converter) => iq_converter
                .convert(waveform)
                .context("IQ conversion failed")
                .map_err(Error::Source)?,
            None => waveform,
        };
        let waveforms = waveform.into_pair()?;
        waveforms.validate(kind.traits().sample_multiple)?;
        Ok(waveforms)
    }
}
