// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Error handling for the Python bindings.
//! This module provides functionality to translate Rust errors
//! into Python exceptions.

use std::error::Error as _;

use awg_sequencer::{Error as SequenceError, ErrorKind};
use pyo3::create_exception;
use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

create_exception!(_awg_sequencer, SequenceLoadError, PyRuntimeError);
create_exception!(_awg_sequencer, ConfigurationError, SequenceLoadError);
create_exception!(_awg_sequencer, SourceError, SequenceLoadError);
create_exception!(_awg_sequencer, DeviceError, SequenceLoadError);

/// Base error for Python bindings.
///
/// If the root error is a Python exception, it is set as the cause of the raised
/// `SequenceLoadError` to keep the full traceback in Python. The messages in the
/// error chain are included in the exception message.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

impl From<Error> for PyErr {
    fn from(error: Error) -> Self {
        let err_message = create_python_error_message(&error);
        let py_error = match &error {
            Error::Sequence(e) => match e.kind() {
                ErrorKind::Configuration => ConfigurationError::new_err(err_message),
                ErrorKind::Source => SourceError::new_err(err_message),
                ErrorKind::Device => DeviceError::new_err(err_message),
            },
            Error::Anyhow(_) => SequenceLoadError::new_err(err_message),
        };
        if let Some(cause) = find_python_root_cause(&error) {
            Python::with_gil(|py| {
                py_error.set_cause(py, Some(cause.clone_ref(py)));
                py_error
            })
        } else {
            py_error
        }
    }
}

impl From<PyErr> for Error {
    fn from(error: PyErr) -> Self {
        Error::Anyhow(error.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Messages of the errors below the top level one.
fn cause_messages(error: &Error) -> Vec<String> {
    match error {
        Error::Anyhow(e) => e.chain().skip(1).map(|cause| format!("{cause}")).collect(),
        Error::Sequence(e) => {
            let mut causes = vec![];
            let mut source = e.source();
            while let Some(cause) = source {
                causes.push(format!("{cause}"));
                source = cause.source();
            }
            causes
        }
    }
}

/// Format the error message for Python exceptions.
///
/// The root cause is listed first.
fn create_python_error_message(error: &Error) -> String {
    let mut causes = cause_messages(error);
    if causes.is_empty() {
        return format!("{error}");
    }
    causes.reverse();
    format!("{error}\nCaused by:\n  {}", causes.join("\n  "))
}

fn find_python_root_cause(error: &Error) -> Option<&PyErr> {
    let root = match error {
        Error::Anyhow(e) => e.root_cause(),
        Error::Sequence(e) => e.cause()?.root_cause(),
    };
    root.downcast_ref::<PyErr>()
}
