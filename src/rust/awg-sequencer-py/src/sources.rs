// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Python callables as waveform sources, IQ converters and marker functions.
use awg_sequencer::markers::{MarkerFn, MarkerFunctions};
use awg_sequencer::waveform::{IqConverter, Waveform, WaveformSource};
use pyo3::exceptions::PyTypeError;
use pyo3::intern;
use pyo3::prelude::*;
use sample_buffer::MarkerBuffer;

use crate::conversions::{waveform_from_py, waveform_to_py};

/// Python function `wfm_func(t, sample)` returning one or two sample arrays.
pub struct PyWaveformSource<'py> {
    function: Bound<'py, PyAny>,
}

impl<'py> PyWaveformSource<'py> {
    pub fn new(function: Bound<'py, PyAny>) -> PyResult<Self> {
        if !function.is_callable() {
            return Err(PyTypeError::new_err("Waveform function is not callable"));
        }
        Ok(PyWaveformSource { function })
    }
}

impl<'py> WaveformSource<Bound<'py, PyAny>> for PyWaveformSource<'py> {
    fn sample(&self, time: f64, config: &Bound<'py, PyAny>) -> anyhow::Result<Waveform> {
        let output = self.function.call1((time, config))?;
        Ok(waveform_from_py(&output)?)
    }
}

/// IQ mixer object with a `convert(waveform)` method.
pub struct PyIqConverter<'py> {
    iq: Bound<'py, PyAny>,
}

impl<'py> PyIqConverter<'py> {
    pub fn new(iq: Bound<'py, PyAny>) -> PyResult<Self> {
        if !iq.hasattr(intern!(iq.py(), "convert"))? {
            return Err(PyTypeError::new_err("IQ mixer has no 'convert' method"));
        }
        Ok(PyIqConverter { iq })
    }
}

impl IqConverter for PyIqConverter<'_> {
    fn convert(&self, waveform: Waveform) -> anyhow::Result<Waveform> {
        let py = self.iq.py();
        let converted = self
            .iq
            .call_method1(intern!(py, "convert"), (waveform_to_py(py, &waveform)?,))?;
        Ok(waveform_from_py(&converted)?)
    }
}

fn marker_function<'py>(function: &Bound<'py, PyAny>) -> PyResult<MarkerFn<Bound<'py, PyAny>>> {
    if !function.is_callable() {
        return Err(PyTypeError::new_err(format!(
            "Marker function must be callable or None, got {}",
            function.get_type().name()?
        )));
    }
    let function = function.clone().unbind();
    Ok(Box::new(
        move |time: f64, sample: &Bound<'py, PyAny>| -> anyhow::Result<MarkerBuffer> {
            let levels = function.bind(sample.py()).call1((time, sample))?;
            Ok(MarkerBuffer::from_py(&levels)?)
        },
    ))
}

/// Convert `markerfunc`: either a single callable or `[[ch1m1, ch1m2], [ch2m1, ch2m2]]`
/// with callables or `None` entries.
pub fn marker_functions_from_py<'py>(
    ob: &Bound<'py, PyAny>,
) -> PyResult<MarkerFunctions<Bound<'py, PyAny>>> {
    if ob.is_callable() {
        return Ok(MarkerFunctions::Single(marker_function(ob)?));
    }
    let mut table: [[Option<MarkerFn<Bound<'py, PyAny>>>; 2]; 2] = Default::default();
    for (channel, functions) in table.iter_mut().enumerate() {
        let py_functions = ob.get_item(channel)?;
        for (marker, function) in functions.iter_mut().enumerate() {
            let py_function = py_functions.get_item(marker)?;
            if !py_function.is_none() {
                *function = Some(marker_function(&py_function)?);
            }
        }
    }
    Ok(MarkerFunctions::PerChannel(table))
}

#[cfg(test)]
mod tests {
    use awg_sequencer::device::Channel;
    use awg_sequencer::markers::{MarkerResolver, MarkerSpec};
    use pyo3::types::PyList;
    use pyo3_ffi::c_str;
    use sample_buffer::SampleBuffer;

    use super::*;

    const FUNCTIONS: &std::ffi::CStr = c_str!(
        r#"
import numpy as np

class Sample:
    length = 8

def pulse(t, sample):
    return np.full(sample.length, t)

def gate(t, sample):
    m = np.zeros(sample.length, dtype=np.int8)
    m[: int(t)] = 1
    return m

def broken(t, sample):
    raise KeyError("pulse")

class Mixer:
    def convert(self, wfm):
        return (wfm, wfm * 0.5)
"#
    );

    fn with_module<F>(f: F)
    where
        F: for<'py> FnOnce(&Bound<'py, PyModule>, Bound<'py, PyAny>),
    {
        Python::with_gil(|py| {
            let module =
                PyModule::from_code(py, FUNCTIONS, c_str!("functions.py"), c_str!("functions"))
                    .unwrap();
            let sample = module.getattr("Sample").unwrap().call0().unwrap();
            f(&module, sample);
        });
    }

    #[test]
    fn test_waveform_source() {
        with_module(|module, sample| {
            let source = PyWaveformSource::new(module.getattr("pulse").unwrap()).unwrap();
            assert_eq!(
                source.sample(0.5, &sample).unwrap(),
                Waveform::SingleChannel(SampleBuffer::Float64(vec![0.5; 8]))
            );
            let source = PyWaveformSource::new(module.getattr("broken").unwrap()).unwrap();
            let err = source.sample(0.5, &sample).unwrap_err();
            assert!(err.downcast_ref::<PyErr>().is_some());
            assert!(PyWaveformSource::new(sample.clone()).is_err());
        });
    }

    #[test]
    fn test_iq_converter() {
        with_module(|module, sample| {
            let mixer = module.getattr("Mixer").unwrap().call0().unwrap();
            let converter = PyIqConverter::new(mixer).unwrap();
            let source = PyWaveformSource::new(module.getattr("pulse").unwrap()).unwrap();
            let converted = converter
                .convert(source.sample(1.0, &sample).unwrap())
                .unwrap();
            assert_eq!(
                converted,
                Waveform::DualChannel(
                    SampleBuffer::Float64(vec![1.0; 8]),
                    SampleBuffer::Float64(vec![0.5; 8])
                )
            );
            assert!(PyIqConverter::new(sample.clone()).is_err());
        });
    }

    #[test]
    fn test_marker_functions() {
        with_module(|module, sample| {
            let gate = module.getattr("gate").unwrap();
            let functions = marker_functions_from_py(&gate).unwrap();
            assert!(matches!(functions, MarkerFunctions::Single(_)));

            let py = module.py();
            let table = PyList::new(
                py,
                [
                    PyList::new(py, [py.None(), gate.clone().unbind()]).unwrap(),
                    PyList::new(py, [py.None(), py.None()]).unwrap(),
                ],
            )
            .unwrap();
            let functions = marker_functions_from_py(table.as_any()).unwrap();
            let resolver = MarkerResolver::new(MarkerSpec::from(functions));
            let waveform = SampleBuffer::Float64(vec![0.0; 8]);
            let pair = resolver
                .resolve(0, 3.0, &sample, Channel::One, &waveform)
                .unwrap();
            assert!(pair.marker1.is_all_zero());
            assert_eq!(pair.marker2.as_slice(), &[1, 1, 1, 0, 0, 0, 0, 0]);
        });
    }
}
