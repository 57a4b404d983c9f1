// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Programs time-indexed waveform sequences into the hardware sequence table
//! of a two-channel arbitrary waveform generator.
pub mod device;
pub mod device_traits;
mod error;
pub mod loader;
pub mod markers;
pub mod programmer;
pub mod progress;
pub mod settings;
pub mod simulator;
pub mod waveform;

pub use error::{Error, ErrorKind, Location, Result};
pub use loader::{LoadResult, SequenceLoader};
pub use sample_buffer::{ElementType, MarkerBuffer, SampleBuffer};
