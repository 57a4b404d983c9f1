// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Logging macros for the AWG sequencer crates.
//!
//! All records are emitted through the [`log`] facade under the
//! `awg_sequencer.rust::<module path>` target, so that a host application
//! (e.g. Python via `pyo3-log`) can route them as one logger hierarchy.

use std::sync::{atomic::AtomicBool, atomic::Ordering};

#[doc(hidden)]
pub use log as _log;

#[doc(hidden)]
#[macro_export]
macro_rules! __record {
    ($level:ident, $($arg:tt)+) => {
        $crate::_log::log!(
            target: concat!("awg_sequencer.rust::", module_path!()),
            $crate::_log::Level::$level,
            $($arg)+
        )
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        $crate::__record!(Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        $crate::__record!(Warn, $($arg)+)
    };
}

/// Log at info level, only when diagnostics are enabled.
///
/// Used for per-slot detail that would flood the log on long sequences.
#[macro_export]
macro_rules! diagnostic {
    ($($arg:tt)+) => {
        if $crate::is_diagnostics_enabled() {
            $crate::__record!(Info, $($arg)+)
        }
    };
}

static DIAGNOSTICS_ENABLED: AtomicBool = AtomicBool::new(false);

#[inline]
pub fn is_diagnostics_enabled() -> bool {
    DIAGNOSTICS_ENABLED.load(Ordering::Acquire)
}

/// Initialize the logging.
///
/// Does not install a logger; the host decides where records go. Only the
/// diagnostics switch is stored here.
pub fn init_logging(with_diagnostics: bool) {
    DIAGNOSTICS_ENABLED.store(with_diagnostics, Ordering::Release);
}
