// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! `pyo3` support for `SampleBuffer` and `MarkerBuffer`.
//!
//! This module requires optional feature `pyo3`.
use num_complex::Complex64;
use numpy::{PyArray1, PyArrayMethods};
use pyo3::exceptions::PyValueError;
use pyo3::intern;
use pyo3::prelude::*;

use crate::{MarkerBuffer, SampleBuffer};

/// Wrap lists, tuples and iterators into `numpy.ndarray` so that `PyArray1` handles validation.
fn as_ndarray<'py>(arr: &Bound<'py, PyAny>) -> PyResult<Bound<'py, PyAny>> {
    let numpy = PyModule::import(arr.py(), "numpy")?;
    let nd_array = numpy.getattr("ndarray")?;
    if arr.is_instance(&nd_array)? {
        Ok(arr.clone())
    } else {
        numpy.getattr("array")?.call1((arr,))
    }
}

/// Cast `arr` to the dtype `target` selects for its dtype kind, e.g. `float32` to `float64`.
///
/// Arrays of a kind without a target are returned unchanged.
fn cast_by_kind<'py>(
    arr: Bound<'py, PyAny>,
    target: fn(&str) -> Option<&'static str>,
) -> PyResult<Bound<'py, PyAny>> {
    let py = arr.py();
    let kind: String = arr
        .getattr(intern!(py, "dtype"))?
        .getattr(intern!(py, "kind"))?
        .extract()?;
    match target(&kind) {
        Some(dtype) => PyModule::import(py, "numpy")?
            .getattr("asarray")?
            .call1((arr, dtype)),
        None => Ok(arr),
    }
}

fn sample_dtype(kind: &str) -> Option<&'static str> {
    match kind {
        "f" => Some("float64"),
        "i" | "u" | "b" => Some("int64"),
        "c" => Some("complex128"),
        _ => None,
    }
}

fn marker_dtype(kind: &str) -> Option<&'static str> {
    match kind {
        "f" => Some("float64"),
        "i" | "u" => Some("int64"),
        _ => None,
    }
}

fn extract_sample_buffer(arr: &Bound<'_, PyAny>) -> PyResult<SampleBuffer> {
    let py_arr = cast_by_kind(as_ndarray(arr)?, sample_dtype)?;
    if let Ok(arr) = py_arr.downcast::<PyArray1<f64>>() {
        return Ok(SampleBuffer::Float64(arr.try_readonly()?.to_vec()?));
    }
    if let Ok(arr) = py_arr.downcast::<PyArray1<i64>>() {
        return Ok(SampleBuffer::Integer64(arr.try_readonly()?.to_vec()?));
    }
    if let Ok(arr) = py_arr.downcast::<PyArray1<Complex64>>() {
        return Ok(SampleBuffer::Complex64(arr.try_readonly()?.to_vec()?));
    }
    Err(PyValueError::new_err(
        "Expected a 1-dimensional waveform of real, integer or complex numbers",
    ))
}

fn extract_marker_buffer(arr: &Bound<'_, PyAny>) -> PyResult<MarkerBuffer> {
    let py_arr = cast_by_kind(as_ndarray(arr)?, marker_dtype)?;
    if let Ok(arr) = py_arr.downcast::<PyArray1<bool>>() {
        let levels = arr.try_readonly()?.to_vec()?;
        return Ok(MarkerBuffer::new(levels.into_iter().map(u8::from).collect()));
    }
    if let Ok(arr) = py_arr.downcast::<PyArray1<i64>>() {
        let levels = arr.try_readonly()?.to_vec()?;
        return levels
            .into_iter()
            .map(|level| {
                u8::try_from(level)
                    .map_err(|_| PyValueError::new_err(format!("Invalid marker level: {level}")))
            })
            .collect::<PyResult<Vec<_>>>()
            .map(MarkerBuffer::new);
    }
    if let Ok(arr) = py_arr.downcast::<PyArray1<f64>>() {
        let levels = arr.try_readonly()?.to_vec()?;
        return levels
            .into_iter()
            .map(|level| {
                if level.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(&level) {
                    Ok(level as u8)
                } else {
                    Err(PyValueError::new_err(format!("Invalid marker level: {level}")))
                }
            })
            .collect::<PyResult<Vec<_>>>()
            .map(MarkerBuffer::new);
    }
    Err(PyValueError::new_err(
        "Expected a 1-dimensional marker array of integer or boolean levels",
    ))
}

impl SampleBuffer {
    /// Convert a Python list or an numpy array into a `SampleBuffer`.
    ///
    /// # Arguments
    ///
    /// * ob - A 1-dimensional Python `list` or `numpy.ndarray` of homogenous values types
    pub fn from_py(ob: &Bound<'_, PyAny>) -> PyResult<Self> {
        extract_sample_buffer(ob)
    }

    /// Convert the `SampleBuffer` into a numpy array.
    pub fn to_py<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        use pyo3::IntoPyObjectExt;

        match self {
            SampleBuffer::Float64(arr) => PyArray1::from_slice(py, arr).into_bound_py_any(py),
            SampleBuffer::Integer64(arr) => PyArray1::from_slice(py, arr).into_bound_py_any(py),
            SampleBuffer::Complex64(arr) => PyArray1::from_slice(py, arr).into_bound_py_any(py),
        }
    }
}

impl MarkerBuffer {
    /// Convert a Python list or an numpy array of marker levels into a `MarkerBuffer`.
    pub fn from_py(ob: &Bound<'_, PyAny>) -> PyResult<Self> {
        extract_marker_buffer(ob)
    }

    /// Convert the `MarkerBuffer` into a `numpy.uint8` array.
    pub fn to_py<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        use pyo3::IntoPyObjectExt;

        PyArray1::from_slice(py, self.as_slice()).into_bound_py_any(py)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyo3_ffi::c_str;
    use std::ffi::CStr;

    fn eval_arr<T>(py_text: &CStr, convert: fn(&Bound<'_, PyAny>) -> PyResult<T>) -> PyResult<T> {
        Python::with_gil(|py| {
            let module =
                PyModule::from_code(py, py_text, c_str!("test.py"), c_str!("test")).unwrap();
            let py_obj = module.getattr("arr").unwrap();
            convert(&py_obj)
        })
    }

    #[test]
    fn test_samples_from_list() {
        let arr = eval_arr(c_str!(r#"arr = [1, 2]"#), SampleBuffer::from_py).unwrap();
        assert_eq!(arr, SampleBuffer::Integer64(vec![1, 2]));

        let arr = eval_arr(c_str!(r#"arr = [-1.5, 2]"#), SampleBuffer::from_py).unwrap();
        assert_eq!(arr, SampleBuffer::Float64(vec![-1.5, 2.0]));
    }

    #[test]
    fn test_samples_round_trip() {
        let buffer = SampleBuffer::Float64(vec![0.25, -0.5, 1.0, 0.0]);
        Python::with_gil(|py| {
            let ob = buffer.to_py(py).unwrap();
            assert_eq!(SampleBuffer::from_py(&ob).unwrap(), buffer);
        });
    }

    #[test]
    fn test_markers_from_numpy() {
        let arr = eval_arr(
            c_str!(r#"import numpy as np; arr = np.zeros(4, dtype=np.int8)"#),
            MarkerBuffer::from_py,
        )
        .unwrap();
        assert_eq!(arr, MarkerBuffer::zeros(4));

        let arr = eval_arr(
            c_str!(r#"import numpy as np; arr = np.array([True, False])"#),
            MarkerBuffer::from_py,
        )
        .unwrap();
        assert_eq!(arr, MarkerBuffer::new(vec![1, 0]));

        let arr = eval_arr(c_str!(r#"arr = [0.0, 1.0]"#), MarkerBuffer::from_py).unwrap();
        assert_eq!(arr, MarkerBuffer::new(vec![0, 1]));
    }

    #[test]
    fn test_narrow_dtypes_are_widened() {
        let arr = eval_arr(
            c_str!(r#"import numpy as np; arr = np.full(4, 0.5, dtype=np.float32)"#),
            SampleBuffer::from_py,
        )
        .unwrap();
        assert_eq!(arr, SampleBuffer::Float64(vec![0.5; 4]));

        let arr = eval_arr(
            c_str!(r#"import numpy as np; arr = np.ones(4, dtype=np.int32)"#),
            SampleBuffer::from_py,
        )
        .unwrap();
        assert_eq!(arr, SampleBuffer::Integer64(vec![1; 4]));

        let arr = eval_arr(
            c_str!(r#"import numpy as np; arr = np.full(2, 1j, dtype=np.complex64)"#),
            SampleBuffer::from_py,
        )
        .unwrap();
        assert_eq!(arr, SampleBuffer::Complex64(vec![Complex64::new(0.0, 1.0); 2]));

        let arr = eval_arr(
            c_str!(r#"import numpy as np; arr = np.array([1, 0, 1], dtype=np.int16)"#),
            MarkerBuffer::from_py,
        )
        .unwrap();
        assert_eq!(arr, MarkerBuffer::new(vec![1, 0, 1]));

        let arr = eval_arr(
            c_str!(r#"import numpy as np; arr = np.array([0, 1], dtype=np.uint32)"#),
            MarkerBuffer::from_py,
        )
        .unwrap();
        assert_eq!(arr, MarkerBuffer::new(vec![0, 1]));

        let arr = eval_arr(
            c_str!(r#"import numpy as np; arr = np.array([1.0, 0.0], dtype=np.float32)"#),
            MarkerBuffer::from_py,
        )
        .unwrap();
        assert_eq!(arr, MarkerBuffer::new(vec![1, 0]));
    }

    #[test]
    fn test_invalid_markers() {
        assert!(eval_arr(c_str!(r#"arr = [-1, 1]"#), MarkerBuffer::from_py).is_err());
        assert!(eval_arr(c_str!(r#"arr = [256]"#), MarkerBuffer::from_py).is_err());
        assert!(eval_arr(c_str!(r#"arr = [0.5]"#), MarkerBuffer::from_py).is_err());
        assert!(eval_arr(c_str!(r#"arr = ["high"]"#), MarkerBuffer::from_py).is_err());
    }
}
