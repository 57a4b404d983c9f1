// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use pyo3::prelude::*;

use sequencer_log::init_logging;

/// A level between Python info and debug. Per-slot records are logged at and
/// below it.
const DIAGNOSTICS_LEVEL: i64 = 15;

#[pyfunction(name = "init_logging")]
pub fn init_logging_py(log_level: i64) {
    init_logging(log_level <= DIAGNOSTICS_LEVEL);
}
