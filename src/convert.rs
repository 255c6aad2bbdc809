//! JSON <-> Python conversion for the JSON and buffer adapters.
//!
//! Conversion is lossy only in the directions Python itself is: non-finite
//! floats, oversized ints and arbitrary objects render through `str()`.

use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyList, PyLong, PyString, PyTuple};
use serde_json::{Map, Number, Value as Json};

/// Build a Python object from a JSON value.
pub fn json_to_py(py: Python<'_>, value: &Json) -> PyResult<PyObject> {
    Ok(match value {
        Json::Null => py.None(),
        Json::Bool(b) => b.to_object(py),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into_py(py)
            } else if let Some(u) = n.as_u64() {
                u.into_py(py)
            } else {
                n.as_f64().unwrap_or(f64::NAN).into_py(py)
            }
        }
        Json::String(s) => s.to_object(py),
        Json::Array(items) => {
            let elements: Vec<PyObject> = items
                .iter()
                .map(|item| json_to_py(py, item))
                .collect::<PyResult<_>>()?;
            PyList::new(py, elements).to_object(py)
        }
        Json::Object(entries) => {
            let dict = PyDict::new(py);
            for (key, item) in entries {
                dict.set_item(key, json_to_py(py, item)?)?;
            }
            dict.to_object(py)
        }
    })
}

/// Render a Python object as a JSON value.
///
/// `bool` is checked before `int` (it is an int subclass), and tuples map to
/// arrays. Dict keys go through `str()` since JSON keys must be strings.
pub fn py_to_json(any: &PyAny) -> PyResult<Json> {
    if any.is_none() {
        return Ok(Json::Null);
    }
    if any.is_instance_of::<PyBool>() {
        return Ok(Json::Bool(any.extract()?));
    }
    if any.is_instance_of::<PyLong>() {
        if let Ok(i) = any.extract::<i64>() {
            return Ok(Json::from(i));
        }
        if let Ok(u) = any.extract::<u64>() {
            return Ok(Json::from(u));
        }
        return Ok(Json::String(stringify(any)?));
    }
    if any.is_instance_of::<PyFloat>() {
        let f: f64 = any.extract()?;
        return Ok(match Number::from_f64(f) {
            Some(n) => Json::Number(n),
            // inf/nan have no JSON form
            None => Json::String(stringify(any)?),
        });
    }
    if any.is_instance_of::<PyString>() {
        return Ok(Json::String(any.extract()?));
    }
    if let Ok(list) = any.downcast::<PyList>() {
        let items = list.iter().map(py_to_json).collect::<PyResult<Vec<_>>>()?;
        return Ok(Json::Array(items));
    }
    if let Ok(tuple) = any.downcast::<PyTuple>() {
        let items = tuple.iter().map(py_to_json).collect::<PyResult<Vec<_>>>()?;
        return Ok(Json::Array(items));
    }
    if let Ok(dict) = any.downcast::<PyDict>() {
        let mut entries = Map::new();
        for (key, item) in dict {
            entries.insert(stringify(key)?, py_to_json(item)?);
        }
        return Ok(Json::Object(entries));
    }

    Ok(Json::String(stringify(any)?))
}

/// The Python `str()` of an object, lossy on invalid surrogates.
pub fn stringify(any: &PyAny) -> PyResult<String> {
    Ok(any.str()?.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_to_py_round_trip() {
        Python::with_gil(|py| {
            let json: Json = serde_json::from_str(
                r#"{"a": [1, 2.5, "x", true, null], "b": {"nested": -3}}"#,
            )
            .unwrap();

            let obj = json_to_py(py, &json).unwrap();
            let back = py_to_json(obj.as_ref(py)).unwrap();
            assert_eq!(back, json);
        });
    }

    #[test]
    fn test_bool_is_not_int() {
        Python::with_gil(|py| {
            let t = py.eval("True", None, None).unwrap();
            assert_eq!(py_to_json(t).unwrap(), Json::Bool(true));

            let one = py.eval("1", None, None).unwrap();
            assert_eq!(py_to_json(one).unwrap(), Json::from(1));
        });
    }

    #[test]
    fn test_tuple_becomes_array() {
        Python::with_gil(|py| {
            let t = py.eval("(1, 'a')", None, None).unwrap();
            let json = py_to_json(t).unwrap();
            assert_eq!(json, serde_json::json!([1, "a"]));
        });
    }

    #[test]
    fn test_huge_int_falls_back_to_string() {
        Python::with_gil(|py| {
            let big = py.eval("10**30", None, None).unwrap();
            let json = py_to_json(big).unwrap();
            assert_eq!(json, Json::String("1000000000000000000000000000000".to_string()));
        });
    }

    #[test]
    fn test_nan_falls_back_to_string() {
        Python::with_gil(|py| {
            let nan = py.eval("float('nan')", None, None).unwrap();
            assert_eq!(py_to_json(nan).unwrap(), Json::String("nan".to_string()));
        });
    }

    #[test]
    fn test_object_falls_back_to_str() {
        Python::with_gil(|py| {
            let obj = py.eval("range(3)", None, None).unwrap();
            assert_eq!(py_to_json(obj).unwrap(), Json::String("range(0, 3)".to_string()));
        });
    }

    #[test]
    fn test_dict_keys_stringified() {
        Python::with_gil(|py| {
            let d = py.eval("{1: 'a'}", None, None).unwrap();
            assert_eq!(py_to_json(d).unwrap(), serde_json::json!({"1": "a"}));
        });
    }
}
