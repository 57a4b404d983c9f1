// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use num_complex::Complex;
use sample_buffer::{ElementType, SampleBuffer};

use crate::device::Channel;
use crate::{Error, Result};

/// Output of a waveform source for one sequence slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Waveform {
    /// Homodyne: only channel 1 carries a signal.
    SingleChannel(SampleBuffer),
    /// Heterodyne: one buffer per channel.
    DualChannel(SampleBuffer, SampleBuffer),
}

impl Waveform {
    /// Normalize into a buffer per channel.
    ///
    /// A homodyne waveform gets an all-zero second channel of the same length
    /// and element type.
    pub fn into_pair(self) -> Result<WaveformPair> {
        match self {
            Waveform::SingleChannel(samples) => {
                let zeros = samples.zeros_like();
                Ok(WaveformPair {
                    channels: [samples, zeros],
                    homodyne: true,
                })
            }
            Waveform::DualChannel(first, second) => {
                if first.len() != second.len() {
                    return Err(Error::configuration(format!(
                        "Channel waveforms differ in length: {} vs. {} samples",
                        first.len(),
                        second.len()
                    )));
                }
                Ok(WaveformPair {
                    channels: [first, second],
                    homodyne: false,
                })
            }
        }
    }
}

/// Samples of both channels for one slot, equal in length.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformPair {
    channels: [SampleBuffer; 2],
    homodyne: bool,
}

impl WaveformPair {
    pub fn channel(&self, channel: Channel) -> &SampleBuffer {
        &self.channels[channel.index()]
    }

    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels[0].is_empty()
    }

    /// Whether the second channel was synthesized from a single-channel waveform.
    pub fn is_homodyne(&self) -> bool {
        self.homodyne
    }

    /// Check that the pair can be uploaded to a device with the given sample multiple.
    pub(crate) fn validate(&self, sample_multiple: usize) -> Result<()> {
        if self.is_empty() {
            return Err(Error::configuration("Waveform is empty"));
        }
        if !self.len().is_multiple_of(sample_multiple) {
            return Err(Error::configuration(format!(
                "Waveform length {} is not a multiple of {sample_multiple} samples",
                self.len()
            )));
        }
        if self
            .channels
            .iter()
            .any(|c| c.element_type() == ElementType::Complex64)
        {
            return Err(Error::configuration(
                "Complex samples cannot be uploaded, convert them with an IQ converter first",
            ));
        }
        Ok(())
    }
}

/// Produces the waveform of a sequence slot from its time parameter.
///
/// Must be deterministic for a given `(time, config)` pair during one load.
pub trait WaveformSource<C: ?Sized> {
    fn sample(&self, time: f64, config: &C) -> anyhow::Result<Waveform>;
}

impl<C: ?Sized, F> WaveformSource<C> for F
where
    F: Fn(f64, &C) -> anyhow::Result<Waveform>,
{
    fn sample(&self, time: f64, config: &C) -> anyhow::Result<Waveform> {
        self(time, config)
    }
}

/// Transforms the raw source output before markers are resolved, e.g. an IQ mixer
/// calibration.
pub trait IqConverter {
    fn convert(&self, waveform: Waveform) -> anyhow::Result<Waveform>;
}

impl<F> IqConverter for F
where
    F: Fn(Waveform) -> anyhow::Result<Waveform>,
{
    fn convert(&self, waveform: Waveform) -> anyhow::Result<Waveform> {
        self(waveform)
    }
}

/// Splits a complex baseband envelope into its I (channel 1) and Q (channel 2)
/// quadratures. Real waveforms pass unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitQuadratures;

fn split_quadratures(samples: &[Complex<f64>]) -> Waveform {
    let (i, q) = samples.iter().map(|s| (s.re, s.im)).unzip();
    Waveform::DualChannel(SampleBuffer::Float64(i), SampleBuffer::Float64(q))
}

impl IqConverter for SplitQuadratures {
    fn convert(&self, waveform: Waveform) -> anyhow::Result<Waveform> {
        match waveform {
            Waveform::SingleChannel(SampleBuffer::Complex64(samples)) => {
                Ok(split_quadratures(&samples))
            }
            Waveform::DualChannel(SampleBuffer::Complex64(_), _)
            | Waveform::DualChannel(_, SampleBuffer::Complex64(_)) => Err(anyhow::anyhow!(
                "Cannot split quadratures of a waveform that already has two channels"
            )),
            other => Ok(other),
        }
    }
}
