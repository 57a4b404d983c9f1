// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Options of a sequence load.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::device::Channel;
use crate::{Error, Result};

/// Amplitude (Vpp) of channel 1. Fixed, only channel 2 is configurable.
pub const CH1_AMPLITUDE: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Repeat each slot indefinitely until an external event advances the sequence.
    #[serde(rename = "loop")]
    pub loop_slots: bool,
    /// Prepare the device before uploading and start it afterwards.
    pub reset: bool,
    /// Amplitude (Vpp) of channel 2.
    pub ch2_amplitude: f64,
    /// Drive prefix of waveform files on the instrument.
    pub drive: String,
    /// Directory of waveform files on the instrument.
    pub path: String,
    /// Sample clock passed along with every waveform file.
    pub clock: Option<f64>,
    /// Time the instrument gets to settle after starting, in seconds.
    pub settle_timeout_s: f64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            loop_slots: false,
            reset: true,
            ch2_amplitude: 2.0,
            drive: "c:".to_string(),
            path: "\\waveforms".to_string(),
            clock: None,
            settle_timeout_s: 10.0,
        }
    }
}

impl LoadOptions {
    /// Parse options from JSON. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: LoadOptions = serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("Invalid load options: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.ch2_amplitude.is_finite() || self.ch2_amplitude <= 0.0 {
            return Err(Error::configuration(format!(
                "Channel 2 amplitude must be positive, got {}",
                self.ch2_amplitude
            )));
        }
        if let Some(clock) = self.clock
            && (!clock.is_finite() || clock <= 0.0)
        {
            return Err(Error::configuration(format!(
                "Sample clock must be positive, got {clock}"
            )));
        }
        self.settle_timeout()?;
        Ok(())
    }

    /// Amplitude (Vpp) of the given channel.
    pub fn amplitude(&self, channel: Channel) -> f64 {
        match channel {
            Channel::One => CH1_AMPLITUDE,
            Channel::Two => self.ch2_amplitude,
        }
    }

    /// Full path of a waveform file on the instrument, e.g. `c:\waveforms\ch1_t00000`.
    pub fn waveform_path(&self, name: &str) -> String {
        format!("{}{}\\{name}", self.drive, self.path)
    }

    /// Settle timeout as a [`Duration`]. Negative, non-finite and overflowing values are rejected.
    pub fn settle_timeout(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.settle_timeout_s).map_err(|e| {
            Error::configuration(format!(
                "Invalid settle timeout {} s: {e}",
                self.settle_timeout_s
            ))
        })
    }
}
