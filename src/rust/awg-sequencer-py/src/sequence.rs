// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use awg_sequencer::SequenceLoader;
use awg_sequencer::markers::MarkerSpec;
use awg_sequencer::progress::LogProgress;
use awg_sequencer::settings::LoadOptions;
use pyo3::intern;
use pyo3::prelude::*;
use pyo3::types::PyString;

use crate::conversions::{static_markers_from_py, time_parameters};
use crate::error::Result;
use crate::py_device::PyAwgDevice;
use crate::sources::{PyIqConverter, PyWaveformSource, marker_functions_from_py};

/// Call an optional getter of the sample object, e.g. `get_clock`.
fn sample_attribute<'py>(
    sample: &Bound<'py, PyAny>,
    getter: &Bound<'py, PyString>,
) -> PyResult<Option<Bound<'py, PyAny>>> {
    if !sample.hasattr(getter)? {
        return Ok(None);
    }
    let value = sample.call_method0(getter)?;
    Ok((!value.is_none()).then_some(value))
}

/// Set the AWG to sequence mode and push one waveform per time parameter into
/// the sequencer.
///
/// `wfm_func(t, sample)` returns either one array (homodyne) or a pair of arrays
/// (heterodyne). Markers come from `markerfunc` (a function for marker 1 of
/// channel 1, or `[[ch1m1, ch1m2], [ch2m1, ch2m2]]` with functions or `None`),
/// otherwise from `marker` (`[[ch1m1, ch1m2], [ch2m1, ch2m2]]` with one array
/// per time parameter), otherwise they are zero.
///
/// Returns whether both output channels are enabled after loading.
#[pyfunction]
#[pyo3(signature = (
    ts,
    wfm_func,
    sample,
    iq=None,
    r#loop=false,
    drive="c:",
    path="\\waveforms",
    reset=true,
    marker=None,
    markerfunc=None,
    ch2_amp=2.0,
    awg=None
))]
#[allow(clippy::too_many_arguments)]
pub fn load_sequence<'py>(
    ts: &Bound<'py, PyAny>,
    wfm_func: Bound<'py, PyAny>,
    sample: Bound<'py, PyAny>,
    iq: Option<Bound<'py, PyAny>>,
    r#loop: bool,
    drive: &str,
    path: &str,
    reset: bool,
    marker: Option<Bound<'py, PyAny>>,
    markerfunc: Option<Bound<'py, PyAny>>,
    ch2_amp: f64,
    awg: Option<Bound<'py, PyAny>>,
) -> Result<bool> {
    let py = sample.py();
    let slots = time_parameters(ts)?;
    let awg = match awg {
        Some(awg) => awg,
        None => sample.call_method0(intern!(py, "get_awg"))?,
    };
    let clock = sample_attribute(&sample, intern!(py, "get_clock"))?
        .map(|clock| clock.extract::<f64>())
        .transpose()?;
    let options = LoadOptions {
        loop_slots: r#loop,
        reset,
        ch2_amplitude: ch2_amp,
        drive: drive.to_string(),
        path: path.to_string(),
        clock,
        ..LoadOptions::default()
    };
    let functions = markerfunc
        .filter(|f| !f.is_none())
        .map(|f| marker_functions_from_py(&f))
        .transpose()?;
    let arrays = marker
        .filter(|m| !m.is_none())
        .map(|m| static_markers_from_py(&m))
        .transpose()?;

    let source = PyWaveformSource::new(wfm_func)?;
    let iq_converter = iq.filter(|iq| !iq.is_none()).map(PyIqConverter::new).transpose()?;
    let mut loader: SequenceLoader<'_, Bound<'py, PyAny>> = SequenceLoader::new(&source)
        .with_markers(MarkerSpec::from_parts(functions, arrays))
        .with_options(options);
    if let Some(iq_converter) = &iq_converter {
        loader = loader.with_iq_converter(iq_converter);
    }
    let mut device = PyAwgDevice::new(awg);
    let result = loader.load(&slots, &sample, &mut device, &mut LogProgress::default())?;
    Ok(result.success())
}

#[cfg(test)]
mod tests {
    use pyo3::types::PyDict;
    use pyo3_ffi::c_str;

    use super::*;
    use crate::error::{ConfigurationError, SourceError};

    const SETUP: &std::ffi::CStr = c_str!(
        r#"
import numpy as np

class Awg:
    def __init__(self, device_type):
        self.device_type = device_type
        self.calls = []
        self.status = {"ch1_status": False, "ch2_status": False}

    def get_type(self):
        return self.device_type

    def get(self, name):
        return self.status[name]

    def __getattr__(self, name):
        if name == "set_p1_runmode" and "Tabor" not in self.device_type:
            raise AttributeError(name)

        def record(*args):
            self.calls.append((name, args))
            if name.startswith("set_ch") and name.endswith("_status"):
                self.status[name[4:7] + "_status"] = args[0]
        return record

class Sample:
    def __init__(self, awg):
        self.awg = awg

    def get_awg(self):
        return self.awg

    def get_clock(self):
        return 1.2e9

def homodyne(t, sample):
    return np.ones(4, dtype=np.int64)

def heterodyne(t, sample):
    return (np.full(64, t), np.full(64, -t))

def trigger(t, sample):
    m = np.zeros(64, dtype=np.int8)
    m[0] = 1
    return m

def broken(t, sample):
    raise KeyError("pulse")
"#
    );

    fn setup<'py>(py: Python<'py>, device_type: &str) -> (Bound<'py, PyDict>, Bound<'py, PyAny>) {
        let module = PyModule::from_code(py, SETUP, c_str!("setup.py"), c_str!("setup")).unwrap();
        let awg = module
            .getattr("Awg")
            .unwrap()
            .call1((device_type,))
            .unwrap();
        let sample = module.getattr("Sample").unwrap().call1((awg,)).unwrap();
        (module.dict(), sample)
    }

    fn call_names(awg: &Bound<'_, PyAny>) -> Vec<String> {
        let calls: Vec<(String, Bound<'_, PyAny>)> =
            awg.getattr("calls").unwrap().extract().unwrap();
        calls.into_iter().map(|(name, _)| name).collect()
    }

    #[test]
    fn test_tabor_homodyne() {
        Python::with_gil(|py| {
            let (globals, sample) = setup(py, "Tabor_WX1284C");
            let wfm_func = globals.get_item("homodyne").unwrap().unwrap();
            let ts = vec![0.0, 1e-6, 2e-6].into_pyobject(py).unwrap();
            let ok = load_sequence(
                ts.as_any(),
                wfm_func,
                sample.clone(),
                None,
                false,
                "c:",
                "\\waveforms",
                true,
                None,
                None,
                2.0,
                None,
            )
            .unwrap();
            assert!(ok);
            let awg = sample.call_method0("get_awg").unwrap();
            let names = call_names(&awg);
            assert_eq!(names.iter().filter(|n| *n == "wfm_send2").count(), 3);
            assert_eq!(names[0], "set_p1_runmode");
        });
    }

    #[test]
    fn test_tektronix_heterodyne_with_marker_function() {
        Python::with_gil(|py| {
            let (globals, sample) = setup(py, "Tektronix_AWG7062");
            let wfm_func = globals.get_item("heterodyne").unwrap().unwrap();
            let trigger = globals.get_item("trigger").unwrap().unwrap();
            let ts = vec![0.25, 0.75].into_pyobject(py).unwrap();
            let ok = load_sequence(
                ts.as_any(),
                wfm_func,
                sample.clone(),
                None,
                true,
                "c:",
                "\\waveforms",
                true,
                None,
                Some(trigger),
                1.0,
                None,
            )
            .unwrap();
            assert!(ok);
            let awg = sample.call_method0("get_awg").unwrap();
            let names = call_names(&awg);
            for (method, count) in [
                ("wfm_send", 4),
                ("wfm_import", 4),
                ("wfm_assign", 4),
                ("set_seq_loop", 4),
                ("set_seq_goto", 1),
                ("run", 1),
            ] {
                assert_eq!(names.iter().filter(|n| *n == method).count(), count);
            }
            let calls: Vec<(String, Bound<'_, PyAny>)> =
                awg.getattr("calls").unwrap().extract().unwrap();
            let (_, send) = calls.iter().find(|(name, _)| name == "wfm_send").unwrap();
            let path: String = send.get_item(3).unwrap().extract().unwrap();
            assert_eq!(path, "c:\\waveforms\\ch1_t00000");
            let clock: f64 = send.get_item(4).unwrap().extract().unwrap();
            assert_eq!(clock, 1.2e9);
        });
    }

    #[test]
    fn test_errors_are_python_exceptions() {
        Python::with_gil(|py| {
            let (globals, sample) = setup(py, "Tektronix_AWG7062");
            let broken = globals.get_item("broken").unwrap().unwrap();
            let ts = vec![0.0].into_pyobject(py).unwrap();
            let err: PyErr = load_sequence(
                ts.as_any(),
                broken,
                sample.clone(),
                None,
                false,
                "c:",
                "\\waveforms",
                true,
                None,
                None,
                2.0,
                None,
            )
            .unwrap_err()
            .into();
            assert!(err.is_instance_of::<SourceError>(py));
            assert!(err.cause(py).is_some());

            let (globals, sample) = setup(py, "Keysight_M8190A");
            let wfm_func = globals.get_item("heterodyne").unwrap().unwrap();
            let ts = vec![0.0].into_pyobject(py).unwrap();
            let err: PyErr = load_sequence(
                ts.as_any(),
                wfm_func,
                sample,
                None,
                false,
                "c:",
                "\\waveforms",
                true,
                None,
                None,
                2.0,
                None,
            )
            .unwrap_err()
            .into();
            assert!(err.is_instance_of::<ConfigurationError>(py));
        });
    }
}
