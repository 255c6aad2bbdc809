//! One synchronous call into the hosted CPython interpreter.
//!
//! Three adapters share the same import-and-call core and differ only in how
//! arguments arrive and how the result leaves. The interpreter initializes
//! on first use and stays up for the life of the process: CPython cannot be
//! safely re-initialized, so per-call teardown is not attempted.

use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyList, PyLong, PyTuple};
use serde_json::Value as Json;
use tracing::debug;

use crate::config;
use crate::convert::{json_to_py, py_to_json, stringify};
use crate::errors::{BridgeError, Result};
use crate::marshal::Value;

/// String-eval adapter: runs `from <module> import <callable>` in a fresh
/// namespace, then evaluates `<callable>(<args>)` where `args` is a raw
/// Python expression fragment (possibly empty). The result is its `str()`.
pub fn eval_call(module: &str, callable: &str, args: &str) -> Result<String> {
    debug!(module, callable, "eval call");

    Python::with_gil(|py| {
        extend_sys_path(py)?;

        let globals = PyDict::new(py);
        py.run(
            &format!("from {} import {}", module, callable),
            Some(globals),
            None,
        )
        .map_err(|e| python_error(py, e))?;

        let result = py
            .eval(&format!("{}({})", callable, args), Some(globals), None)
            .map_err(|e| python_error(py, e))?;

        stringify(result).map_err(|e| python_error(py, e))
    })
}

/// JSON adapter: positional arguments as a JSON array, keyword arguments as
/// a JSON object (or empty). The result comes back as JSON text.
pub fn json_call(module: &str, callable: &str, args: &str, kwargs: &str) -> Result<String> {
    Python::with_gil(|py| {
        let result = invoke(py, module, callable, args, kwargs)?;
        let json = py_to_json(result).map_err(|e| python_error(py, e))?;

        serde_json::to_string(&json).map_err(|e| BridgeError::InvalidJson {
            field: "result",
            detail: e.to_string(),
        })
    })
}

/// Typed adapter behind the buffer protocol: same invocation as [`json_call`],
/// but the result is classified into a [`Value`] for fixed-width encoding.
pub fn typed_call(module: &str, callable: &str, args: &str, kwargs: &str) -> Result<Value> {
    Python::with_gil(|py| {
        let result = invoke(py, module, callable, args, kwargs)?;
        classify(result).map_err(|e| python_error(py, e))
    })
}

/// Import `module`, look up `callable`, and call it with converted arguments.
fn invoke<'py>(
    py: Python<'py>,
    module: &str,
    callable: &str,
    args: &str,
    kwargs: &str,
) -> Result<&'py PyAny> {
    extend_sys_path(py)?;

    let positional = parse_positional(args)?;
    let keywords = parse_keywords(kwargs)?;

    let target = py
        .import(module)
        .and_then(|m| m.getattr(callable))
        .map_err(|e| python_error(py, e))?;

    let arg_objs: Vec<PyObject> = positional
        .iter()
        .map(|item| json_to_py(py, item))
        .collect::<PyResult<_>>()
        .map_err(|e| python_error(py, e))?;
    let arg_tuple = PyTuple::new(py, arg_objs);

    let kw = match &keywords {
        Some(entries) => {
            let dict = PyDict::new(py);
            for (key, item) in entries {
                json_to_py(py, item)
                    .and_then(|obj| dict.set_item(key, obj))
                    .map_err(|e| python_error(py, e))?;
            }
            Some(dict)
        }
        None => None,
    };

    debug!(module, callable, argc = positional.len(), "invoking");
    target.call(arg_tuple, kw).map_err(|e| python_error(py, e))
}

fn parse_positional(args: &str) -> Result<Vec<Json>> {
    let trimmed = args.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let parsed: Json = serde_json::from_str(trimmed).map_err(|e| BridgeError::InvalidJson {
        field: "args",
        detail: e.to_string(),
    })?;

    match parsed {
        Json::Array(items) => Ok(items),
        other => Err(BridgeError::InvalidJson {
            field: "args",
            detail: format!("expected an array, got {}", other),
        }),
    }
}

fn parse_keywords(kwargs: &str) -> Result<Option<serde_json::Map<String, Json>>> {
    let trimmed = kwargs.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }

    let parsed: Json = serde_json::from_str(trimmed).map_err(|e| BridgeError::InvalidJson {
        field: "kwargs",
        detail: e.to_string(),
    })?;

    match parsed {
        Json::Object(entries) => Ok(Some(entries)),
        other => Err(BridgeError::InvalidJson {
            field: "kwargs",
            detail: format!("expected an object, got {}", other),
        }),
    }
}

/// Map a return value onto the wire types. `bool` before `int` (it is an int
/// subclass); ints that overflow i64 and everything non-scalar fall back to
/// their `str()` rendering.
fn classify(any: &PyAny) -> PyResult<Value> {
    if any.is_none() {
        return Ok(Value::None);
    }
    if any.is_instance_of::<PyBool>() {
        return Ok(Value::Bool(any.extract()?));
    }
    if any.is_instance_of::<PyLong>() {
        if let Ok(i) = any.extract::<i64>() {
            return Ok(Value::Int(i));
        }
        return Ok(Value::Str(stringify(any)?));
    }
    if any.is_instance_of::<PyFloat>() {
        return Ok(Value::Float(any.extract()?));
    }

    Ok(Value::Str(stringify(any)?))
}

/// Prepend the configured search paths and the working directory to
/// `sys.path` so game-adjacent scripts resolve. Idempotent across calls.
fn extend_sys_path(py: Python<'_>) -> Result<()> {
    let mut entries = config::global().python.path.clone();
    if let Ok(cwd) = std::env::current_dir() {
        entries.push(cwd.to_string_lossy().into_owned());
    }

    let result: PyResult<()> = (|| {
        let path: &PyList = py.import("sys")?.getattr("path")?.downcast()?;
        // insert in reverse so the first configured entry ends up first on
        // sys.path, ahead of the working directory
        for entry in entries.iter().rev() {
            if !path.contains(entry)? {
                path.insert(0, entry)?;
            }
        }
        Ok(())
    })();

    result.map_err(|e| python_error(py, e))
}

/// Stringify an interpreter failure: exception message plus the formatted
/// traceback when one exists.
fn python_error(py: Python<'_>, err: PyErr) -> BridgeError {
    let traceback = err.traceback(py).and_then(|tb| tb.format().ok());
    BridgeError::Python {
        message: err.to_string(),
        traceback,
    }
}
