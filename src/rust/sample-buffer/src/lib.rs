// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Sample and marker buffers exchanged between waveform sources and AWG devices.

use num_complex::Complex;

#[cfg(feature = "pyo3")]
mod py_bindings;

/// Element type of a [`SampleBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Integer64,
    Float64,
    Complex64,
}

/// One channel worth of analog samples.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer {
    Integer64(Vec<i64>),
    Float64(Vec<f64>),
    Complex64(Vec<Complex<f64>>),
}

impl SampleBuffer {
    pub fn len(&self) -> usize {
        match self {
            SampleBuffer::Integer64(vec) => vec.len(),
            SampleBuffer::Float64(vec) => vec.len(),
            SampleBuffer::Complex64(vec) => vec.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SampleBuffer::Integer64(vec) => vec.is_empty(),
            SampleBuffer::Float64(vec) => vec.is_empty(),
            SampleBuffer::Complex64(vec) => vec.is_empty(),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            SampleBuffer::Integer64(_) => ElementType::Integer64,
            SampleBuffer::Float64(_) => ElementType::Float64,
            SampleBuffer::Complex64(_) => ElementType::Complex64,
        }
    }

    /// An all-zero buffer with the same length and element type.
    pub fn zeros_like(&self) -> Self {
        match self {
            SampleBuffer::Integer64(vec) => SampleBuffer::Integer64(vec![0; vec.len()]),
            SampleBuffer::Float64(vec) => SampleBuffer::Float64(vec![0.0; vec.len()]),
            SampleBuffer::Complex64(vec) => {
                SampleBuffer::Complex64(vec![Complex::new(0.0, 0.0); vec.len()])
            }
        }
    }

    pub fn is_all_zero(&self) -> bool {
        match self {
            SampleBuffer::Integer64(vec) => vec.iter().all(|x| *x == 0),
            SampleBuffer::Float64(vec) => vec.iter().all(|x| *x == 0.0),
            SampleBuffer::Complex64(vec) => vec.iter().all(|x| x.re == 0.0 && x.im == 0.0),
        }
    }
}

impl From<Vec<f64>> for SampleBuffer {
    fn from(value: Vec<f64>) -> Self {
        SampleBuffer::Float64(value)
    }
}

impl From<Vec<i64>> for SampleBuffer {
    fn from(value: Vec<i64>) -> Self {
        SampleBuffer::Integer64(value)
    }
}

impl From<Vec<Complex<f64>>> for SampleBuffer {
    fn from(value: Vec<Complex<f64>>) -> Self {
        SampleBuffer::Complex64(value)
    }
}

/// Digital marker levels accompanying one analog channel.
///
/// Values are small integers, in practice 0 or 1.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkerBuffer(Vec<u8>);

impl MarkerBuffer {
    pub fn new(levels: Vec<u8>) -> Self {
        MarkerBuffer(levels)
    }

    pub fn zeros(len: usize) -> Self {
        MarkerBuffer(vec![0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_all_zero(&self) -> bool {
        self.0.iter().all(|x| *x == 0)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for MarkerBuffer {
    fn from(value: Vec<u8>) -> Self {
        MarkerBuffer(value)
    }
}
