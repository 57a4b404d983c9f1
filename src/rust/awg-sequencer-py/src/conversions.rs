// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Conversions between Python waveform and marker values and their Rust
//! representation.
use awg_sequencer::markers::StaticMarkers;
use awg_sequencer::waveform::Waveform;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyList, PyTuple};
use pyo3::{IntoPyObjectExt, intern};
use sample_buffer::{MarkerBuffer, SampleBuffer};

fn is_array_like(ob: &Bound<'_, PyAny>) -> PyResult<bool> {
    if ob.is_instance_of::<PyList>() || ob.is_instance_of::<PyTuple>() {
        return Ok(true);
    }
    let py = ob.py();
    let nd_array = py.import(intern!(py, "numpy"))?.getattr(intern!(py, "ndarray"))?;
    ob.is_instance(&nd_array)
}

/// Convert the output of a Python waveform function.
///
/// A pair of arrays (tuple, list or a 2-D array with two rows) is a
/// heterodyne waveform, a flat array a homodyne one.
pub fn waveform_from_py(ob: &Bound<'_, PyAny>) -> PyResult<Waveform> {
    let first = match ob.get_item(0) {
        Ok(first) => first,
        Err(_) => return SampleBuffer::from_py(ob).map(Waveform::SingleChannel),
    };
    if !is_array_like(&first)? {
        return SampleBuffer::from_py(ob).map(Waveform::SingleChannel);
    }
    let channels = ob.len()?;
    if channels != 2 {
        return Err(PyValueError::new_err(format!(
            "Expected a waveform for one or two channels, got {channels} channels"
        )));
    }
    Ok(Waveform::DualChannel(
        SampleBuffer::from_py(&first)?,
        SampleBuffer::from_py(&ob.get_item(1)?)?,
    ))
}

/// Convert a waveform into the form Python waveform functions return.
pub fn waveform_to_py<'py>(py: Python<'py>, waveform: &Waveform) -> PyResult<Bound<'py, PyAny>> {
    match waveform {
        Waveform::SingleChannel(samples) => samples.to_py(py),
        Waveform::DualChannel(first, second) => {
            (first.to_py(py)?, second.to_py(py)?).into_bound_py_any(py)
        }
    }
}

/// Time parameters of the sequence slots.
pub fn time_parameters(ob: &Bound<'_, PyAny>) -> PyResult<Vec<f64>> {
    match SampleBuffer::from_py(ob)? {
        SampleBuffer::Float64(times) => Ok(times),
        SampleBuffer::Integer64(times) => Ok(times.into_iter().map(|t| t as f64).collect()),
        SampleBuffer::Complex64(_) => Err(PyValueError::new_err(
            "Time parameters must be real numbers",
        )),
    }
}

/// Convert marker arrays given as `[[ch1m1, ch1m2], [ch2m1, ch2m2]]`, where each
/// entry holds one marker array per slot.
pub fn static_markers_from_py(ob: &Bound<'_, PyAny>) -> PyResult<StaticMarkers> {
    let mut markers: [[Vec<MarkerBuffer>; 2]; 2] = Default::default();
    for (channel, channel_markers) in markers.iter_mut().enumerate() {
        let py_channel = ob.get_item(channel).map_err(|_| {
            PyValueError::new_err(format!("Markers for channel {} missing", channel + 1))
        })?;
        for (marker, slots) in channel_markers.iter_mut().enumerate() {
            let py_slots = py_channel.get_item(marker).map_err(|_| {
                PyValueError::new_err(format!(
                    "Marker {} of channel {} missing",
                    marker + 1,
                    channel + 1
                ))
            })?;
            *slots = py_slots
                .try_iter()?
                .map(|levels| MarkerBuffer::from_py(&levels?))
                .collect::<PyResult<_>>()?;
        }
    }
    Ok(StaticMarkers::new(markers))
}
