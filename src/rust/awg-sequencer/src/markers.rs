// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Marker specification and resolution.
//!
//! Every uploaded channel carries exactly two marker buffers. Where they come
//! from is decided once per load by a [`MarkerSpec`]:
//!
//! 1. [`MarkerSpec::PerChannelFunctions`]: a function per channel and marker,
//!    called with the slot's time parameter. Missing functions yield zeros.
//! 2. [`MarkerSpec::StaticArrays`]: precomputed buffers indexed by
//!    `[channel][marker][slot]`. Missing entries are an error.
//! 3. [`MarkerSpec::None`]: all markers are zero.
use anyhow::Context;
use sample_buffer::{MarkerBuffer, SampleBuffer};

use crate::device::Channel;
use crate::{Error, Result};

/// Computes one marker buffer from a slot's time parameter and the sample configuration.
pub type MarkerFn<C> = Box<dyn Fn(f64, &C) -> anyhow::Result<MarkerBuffer>>;

/// Marker functions indexed by `[channel][marker]`.
pub type MarkerFnTable<C> = [[Option<MarkerFn<C>>; 2]; 2];

/// Marker functions as supplied by the caller.
pub enum MarkerFunctions<C: ?Sized> {
    /// Shorthand: drives marker 1 of channel 1, every other marker is zero.
    Single(MarkerFn<C>),
    PerChannel(MarkerFnTable<C>),
}

impl<C: ?Sized> MarkerFunctions<C> {
    pub fn into_table(self) -> MarkerFnTable<C> {
        match self {
            MarkerFunctions::Single(function) => [[Some(function), None], [None, None]],
            MarkerFunctions::PerChannel(table) => table,
        }
    }
}

/// Precomputed marker buffers indexed by `[channel][marker][slot]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticMarkers {
    markers: [[Vec<MarkerBuffer>; 2]; 2],
}

impl StaticMarkers {
    pub fn new(markers: [[Vec<MarkerBuffer>; 2]; 2]) -> Self {
        StaticMarkers { markers }
    }

    fn get(&self, channel: Channel, marker: usize, slot: usize) -> Result<&MarkerBuffer> {
        let buffers = &self.markers[channel.index()][marker];
        buffers.get(slot).ok_or_else(|| {
            Error::configuration(format!(
                "Static markers for {channel} marker {} have no entry for slot {slot} (length {})",
                marker + 1,
                buffers.len()
            ))
        })
    }
}

pub enum MarkerSpec<C: ?Sized> {
    PerChannelFunctions(MarkerFnTable<C>),
    StaticArrays(StaticMarkers),
    None,
}

impl<C: ?Sized> MarkerSpec<C> {
    /// Build the specification from the optional caller inputs.
    ///
    /// Functions take precedence over static arrays.
    pub fn from_parts(
        functions: Option<MarkerFunctions<C>>,
        arrays: Option<StaticMarkers>,
    ) -> Self {
        match (functions, arrays) {
            (Some(functions), arrays) => {
                if arrays.is_some() {
                    sequencer_log::warn!(
                        "Both marker functions and static markers given, static markers are ignored"
                    );
                }
                MarkerSpec::PerChannelFunctions(functions.into_table())
            }
            (None, Some(arrays)) => MarkerSpec::StaticArrays(arrays),
            (None, None) => MarkerSpec::None,
        }
    }
}

impl<C: ?Sized> From<MarkerFunctions<C>> for MarkerSpec<C> {
    fn from(value: MarkerFunctions<C>) -> Self {
        MarkerSpec::PerChannelFunctions(value.into_table())
    }
}

impl<C: ?Sized> From<StaticMarkers> for MarkerSpec<C> {
    fn from(value: StaticMarkers) -> Self {
        MarkerSpec::StaticArrays(value)
    }
}

impl<C: ?Sized> Default for MarkerSpec<C> {
    fn default() -> Self {
        MarkerSpec::None
    }
}

/// Marker 1 and marker 2 of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPair {
    pub marker1: MarkerBuffer,
    pub marker2: MarkerBuffer,
}

impl MarkerPair {
    pub fn zeros(len: usize) -> Self {
        MarkerPair {
            marker1: MarkerBuffer::zeros(len),
            marker2: MarkerBuffer::zeros(len),
        }
    }
}

/// Applies a [`MarkerSpec`] to the slots of a sequence.
pub struct MarkerResolver<C: ?Sized> {
    spec: MarkerSpec<C>,
}

impl<C: ?Sized> MarkerResolver<C> {
    pub fn new(spec: MarkerSpec<C>) -> Self {
        MarkerResolver { spec }
    }

    /// Marker buffers of `channel` for the slot at `slot` with time parameter `time`.
    ///
    /// The returned buffers always have the length of `waveform`.
    pub fn resolve(
        &self,
        slot: usize,
        time: f64,
        config: &C,
        channel: Channel,
        waveform: &SampleBuffer,
    ) -> Result<MarkerPair> {
        let len = waveform.len();
        let pair = match &self.spec {
            MarkerSpec::PerChannelFunctions(table) => {
                let [function1, function2] = &table[channel.index()];
                MarkerPair {
                    marker1: call_marker_function(function1.as_ref(), time, config, len)
                        .with_context(|| format!("Marker function for {channel} marker 1 failed"))
                        .map_err(Error::Source)?,
                    marker2: call_marker_function(function2.as_ref(), time, config, len)
                        .with_context(|| format!("Marker function for {channel} marker 2 failed"))
                        .map_err(Error::Source)?,
                }
            }
            MarkerSpec::StaticArrays(markers) => MarkerPair {
                marker1: markers.get(channel, 0, slot)?.clone(),
                marker2: markers.get(channel, 1, slot)?.clone(),
            },
            MarkerSpec::None => MarkerPair::zeros(len),
        };
        for (number, marker) in [(1, &pair.marker1), (2, &pair.marker2)] {
            if marker.len() != len {
                return Err(Error::configuration(format!(
                    "Marker {number} of {channel} has {} samples, waveform has {len}",
                    marker.len()
                )));
            }
        }
        Ok(pair)
    }
}

fn call_marker_function<C: ?Sized>(
    function: Option<&MarkerFn<C>>,
    time: f64,
    config: &C,
    len: usize,
) -> anyhow::Result<MarkerBuffer> {
    match function {
        Some(function) => function(time, config),
        None => Ok(MarkerBuffer::zeros(len)),
    }
}
