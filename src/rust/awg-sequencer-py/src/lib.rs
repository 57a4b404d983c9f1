// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use pyo3::prelude::*;

mod conversions;
mod error;
mod logging;
mod py_device;
mod sequence;
mod sources;

#[pymodule]
mod _awg_sequencer {
    use super::*;

    #[pymodule_export]
    use crate::sequence::load_sequence;

    #[pymodule_export]
    use crate::logging::init_logging_py;

    #[pymodule_init]
    fn init(m: &Bound<'_, PyModule>) -> PyResult<()> {
        let py = m.py();
        m.add("SequenceLoadError", py.get_type::<crate::error::SequenceLoadError>())?;
        m.add("ConfigurationError", py.get_type::<crate::error::ConfigurationError>())?;
        m.add("SourceError", py.get_type::<crate::error::SourceError>())?;
        m.add("DeviceError", py.get_type::<crate::error::DeviceError>())?;
        // Route `log` records of the Rust crates to Python's `logging`. A logger
        // may already be installed by another extension module.
        let _ = pyo3_log::try_init();
        Ok(())
    }
}
