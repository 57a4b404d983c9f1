// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! [`AwgDevice`] backed by a Python AWG driver instance.
//!
//! The driver is expected to expose the method names of the Tektronix
//! AWG5014/7062 and Tabor WX drivers, e.g. `wfm_send`, `wfm_assign` and
//! `set_seq_length`.
use std::time::Duration;

use awg_sequencer::device::{AwgDevice, Channel, LoopCount, RunMode};
use pyo3::intern;
use pyo3::prelude::*;
use sample_buffer::{MarkerBuffer, SampleBuffer};

pub struct PyAwgDevice<'py> {
    awg: Bound<'py, PyAny>,
}

impl<'py> PyAwgDevice<'py> {
    pub fn new(awg: Bound<'py, PyAny>) -> Self {
        PyAwgDevice { awg }
    }

    fn py(&self) -> Python<'py> {
        self.awg.py()
    }
}

fn run_mode_name(mode: RunMode) -> &'static str {
    match mode {
        RunMode::Continuous => "CONT",
        RunMode::Sequence => "SEQ",
    }
}

impl AwgDevice for PyAwgDevice<'_> {
    fn device_type(&self) -> anyhow::Result<String> {
        let device_type = self.awg.call_method0(intern!(self.py(), "get_type"))?;
        Ok(device_type.extract()?)
    }

    fn set_run_mode(&mut self, mode: RunMode) -> anyhow::Result<()> {
        let py = self.py();
        // Tabor drivers configure the run mode per channel pair.
        let method = if self.awg.hasattr(intern!(py, "set_p1_runmode"))? {
            intern!(py, "set_p1_runmode")
        } else {
            intern!(py, "set_runmode")
        };
        self.awg.call_method1(method, (run_mode_name(mode),))?;
        Ok(())
    }

    fn set_sequence_length(&mut self, length: usize) -> anyhow::Result<()> {
        self.awg
            .call_method1(intern!(self.py(), "set_seq_length"), (length,))?;
        Ok(())
    }

    fn set_offset(&mut self, channel: Channel, offset: f64) -> anyhow::Result<()> {
        let method = format!("set_ch{}_offset", channel.number());
        self.awg.call_method1(method, (offset,))?;
        Ok(())
    }

    fn set_amplitude(&mut self, channel: Channel, amplitude: f64) -> anyhow::Result<()> {
        let method = format!("set_ch{}_amplitude", channel.number());
        self.awg.call_method1(method, (amplitude,))?;
        Ok(())
    }

    fn send_waveform(
        &mut self,
        samples: &SampleBuffer,
        marker1: &MarkerBuffer,
        marker2: &MarkerBuffer,
        file_path: &str,
        clock: Option<f64>,
    ) -> anyhow::Result<()> {
        let py = self.py();
        self.awg.call_method1(
            intern!(py, "wfm_send"),
            (
                samples.to_py(py)?,
                marker1.to_py(py)?,
                marker2.to_py(py)?,
                file_path,
                clock,
            ),
        )?;
        Ok(())
    }

    fn import_waveform(&mut self, name: &str, file_path: &str) -> anyhow::Result<()> {
        self.awg
            .call_method1(intern!(self.py(), "wfm_import"), (name, file_path, "WFM"))?;
        Ok(())
    }

    fn assign_waveform(
        &mut self,
        channel: Channel,
        position: usize,
        name: &str,
    ) -> anyhow::Result<()> {
        self.awg.call_method1(
            intern!(self.py(), "wfm_assign"),
            (channel.number(), position, name),
        )?;
        Ok(())
    }

    fn set_sequence_loop(&mut self, position: usize, count: LoopCount) -> anyhow::Result<()> {
        let count = match count {
            LoopCount::Finite(count) => f64::from(count),
            LoopCount::Infinite => f64::INFINITY,
        };
        self.awg
            .call_method1(intern!(self.py(), "set_seq_loop"), (position, count))?;
        Ok(())
    }

    fn send_combined(
        &mut self,
        samples1: &SampleBuffer,
        samples2: &SampleBuffer,
        marker1: &MarkerBuffer,
        marker2: &MarkerBuffer,
        channel: Channel,
        position: usize,
    ) -> anyhow::Result<()> {
        let py = self.py();
        self.awg.call_method1(
            intern!(py, "wfm_send2"),
            (
                samples1.to_py(py)?,
                samples2.to_py(py)?,
                marker1.to_py(py)?,
                marker2.to_py(py)?,
                channel.number(),
                position,
            ),
        )?;
        Ok(())
    }

    fn set_output_enabled(&mut self, channel: Channel, enabled: bool) -> anyhow::Result<()> {
        let method = format!("set_ch{}_status", channel.number());
        self.awg.call_method1(method, (enabled,))?;
        Ok(())
    }

    fn set_sequence_goto(&mut self, position: usize, target: usize) -> anyhow::Result<()> {
        self.awg
            .call_method1(intern!(self.py(), "set_seq_goto"), (position, target))?;
        Ok(())
    }

    fn run(&mut self) -> anyhow::Result<()> {
        self.awg.call_method0(intern!(self.py(), "run"))?;
        Ok(())
    }

    fn wait(&mut self, timeout: Duration) -> anyhow::Result<bool> {
        let settled = self.awg.call_method1(
            intern!(self.py(), "wait"),
            (timeout.as_secs_f64(), false),
        )?;
        // Drivers that do not report the outcome are treated as settled.
        if settled.is_none() {
            return Ok(true);
        }
        Ok(settled.is_truthy()?)
    }

    fn output_enabled(&mut self, channel: Channel) -> anyhow::Result<bool> {
        let status = self.awg.call_method1(
            intern!(self.py(), "get"),
            (format!("ch{}_status", channel.number()),),
        )?;
        Ok(status.is_truthy()?)
    }
}

#[cfg(test)]
mod tests {
    use pyo3_ffi::c_str;

    use super::*;

    const DRIVER: &std::ffi::CStr = c_str!(
        r#"
class Tektronix:
    def __init__(self):
        self.calls = []
        self.status = {}

    def get_type(self):
        return "Tektronix_AWG5014"

    def __getattr__(self, name):
        if name == "set_p1_runmode":
            raise AttributeError(name)

        def record(*args):
            self.calls.append((name, args))
            if name.startswith("set_ch") and name.endswith("_status"):
                self.status[name[4:7] + "_status"] = args[0]
        return record

    def get(self, name):
        return self.status.get(name, False)

class Tabor(Tektronix):
    settled = 1

    def get_type(self):
        return "Tabor_WX1284C"

    def wait(self, timeout, loud):
        return self.settled
"#
    );

    #[test]
    fn test_driver_calls() {
        Python::with_gil(|py| {
            let module =
                PyModule::from_code(py, DRIVER, c_str!("driver.py"), c_str!("driver")).unwrap();
            let awg = module.getattr("Tektronix").unwrap().call0().unwrap();
            let mut device = PyAwgDevice::new(awg.clone());

            assert_eq!(device.device_type().unwrap(), "Tektronix_AWG5014");
            device.set_run_mode(RunMode::Sequence).unwrap();
            device.set_sequence_loop(3, LoopCount::Infinite).unwrap();
            device.set_output_enabled(Channel::Two, true).unwrap();
            assert!(device.output_enabled(Channel::Two).unwrap());
            assert!(!device.output_enabled(Channel::One).unwrap());
            assert!(device.wait(Duration::from_secs(10)).unwrap());

            let calls: Vec<(String, Bound<'_, PyAny>)> =
                awg.getattr("calls").unwrap().extract().unwrap();
            let names: Vec<&str> = calls.iter().map(|(name, _)| name.as_str()).collect();
            assert_eq!(
                names,
                ["set_runmode", "set_seq_loop", "set_ch2_status", "wait"]
            );
            let (position, count): (usize, f64) = calls[1].1.extract().unwrap();
            assert_eq!(position, 3);
            assert!(count.is_infinite());
        });
    }

    #[test]
    fn test_wait_accepts_truthy_results() {
        Python::with_gil(|py| {
            let module =
                PyModule::from_code(py, DRIVER, c_str!("driver.py"), c_str!("driver")).unwrap();
            let awg = module.getattr("Tabor").unwrap().call0().unwrap();
            let mut device = PyAwgDevice::new(awg.clone());
            assert!(device.wait(Duration::from_secs(1)).unwrap());
            awg.setattr("settled", 0).unwrap();
            assert!(!device.wait(Duration::from_secs(1)).unwrap());
            awg.setattr("settled", "").unwrap();
            assert!(!device.wait(Duration::from_secs(1)).unwrap());
        });
    }
}
