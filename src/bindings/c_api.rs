//! C ABI for the GameMaker extension surface
//!
//! GameMaker extensions exchange exactly two types, doubles and C strings,
//! so every export speaks `*c_char` and `f64`. Strings returned by the two
//! string adapters are owned by the caller and must be released through
//! `python_free_string`. Bad pointers and malformed requests are reported
//! through the normal error channel, never a crash.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;
use std::sync::Once;

use tracing::{error, warn};

use crate::buffer::BufferReader;
use crate::config::{self, Config};
use crate::errors::{BridgeError, Result};
use crate::interp;
use crate::logging::init_logging;
use crate::marshal::{encode_error, encode_reply, Status};

static SETUP: Once = Once::new();

/// Pin the configuration and bring up logging before the first call.
fn ensure_setup() {
    SETUP.call_once(|| {
        init_logging(&config::global().log);
    });
}

/// Optional explicit setup: load a TOML config and initialize logging.
/// Pass a null or empty path to use discovery.
/// Returns 0 on success, -1 when configuration was already pinned by an
/// earlier call, -2 when the file cannot be read or parsed.
#[no_mangle]
pub extern "C" fn python_init(config_path: *const c_char) -> f64 {
    let path = if config_path.is_null() {
        None
    } else {
        match unsafe { CStr::from_ptr(config_path) }.to_str() {
            Ok(p) if !p.trim().is_empty() => Some(p.to_string()),
            Ok(_) => None,
            Err(_) => return -2.0,
        }
    };

    let loaded = match &path {
        Some(p) => Config::load(Path::new(p)),
        None => Ok(Config::discover()),
    };

    let config = match loaded {
        Ok(c) => c,
        Err(_) => return -2.0,
    };

    if config::init(config).is_err() {
        return -1.0;
    }

    ensure_setup();
    0.0
}

/// String-eval adapter: evaluate `<callable>(<args>)` from `<module>` and
/// return the `str()` of the result. `args` is a raw Python expression
/// fragment and may be null or empty. Exceptions come back through the same
/// channel as message plus traceback. Free the result with
/// `python_free_string`.
#[no_mangle]
pub extern "C" fn python_call(
    module: *const c_char,
    callable: *const c_char,
    args: *const c_char,
) -> *mut c_char {
    ensure_setup();

    let outcome = required(module, "module").and_then(|m| {
        let c = required(callable, "callable")?;
        let a = optional(args)?;
        interp::eval_call(m, c, a)
    });

    string_reply(outcome)
}

/// JSON adapter: `args` is a JSON array of positional arguments, `kwargs` a
/// JSON object or null/empty. Returns the result as JSON text; same
/// ownership rules as `python_call`.
#[no_mangle]
pub extern "C" fn python_call_json(
    module: *const c_char,
    callable: *const c_char,
    args: *const c_char,
    kwargs: *const c_char,
) -> *mut c_char {
    ensure_setup();

    let outcome = required(module, "module").and_then(|m| {
        let c = required(callable, "callable")?;
        let a = optional(args)?;
        let k = optional(kwargs)?;
        interp::json_call(m, c, a, k)
    });

    string_reply(outcome)
}

/// Typed adapter over a shared buffer. Request layout: module, callable,
/// args JSON and kwargs JSON as consecutive null-terminated strings (the
/// kwargs string may be absent). The reply overwrites the buffer from offset
/// zero; the returned double is the status code selecting how to read it.
///
/// A null buffer or a capacity below 1 returns -1 with the buffer untouched:
/// the call never reached the interpreter, so the buffer still holds the
/// request bytes rather than an error message.
#[no_mangle]
pub extern "C" fn python_call_buffer(buffer: *mut c_char, capacity: f64) -> f64 {
    ensure_setup();

    if buffer.is_null() || !capacity.is_finite() || capacity < 1.0 {
        warn!("rejecting buffer call without a usable buffer");
        return Status::Error.code() as f64;
    }

    let buf = unsafe { std::slice::from_raw_parts_mut(buffer as *mut u8, capacity as usize) };
    buffer_call(buf).code() as f64
}

/// Free a string returned by `python_call` or `python_call_json`.
#[no_mangle]
pub extern "C" fn python_free_string(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            drop(CString::from_raw(s));
        }
    }
}

fn buffer_call(buf: &mut [u8]) -> Status {
    let request = {
        let mut reader = BufferReader::new(buf);
        read_request(&mut reader)
    };

    let outcome = request.and_then(|(module, callable, args, kwargs)| {
        interp::typed_call(&module, &callable, &args, &kwargs)
    });

    match outcome {
        Ok(value) => encode_reply(buf, &value),
        Err(e) => {
            error!("python call failed: {}", e);
            encode_error(buf, &e.to_report())
        }
    }
}

fn read_request(reader: &mut BufferReader<'_>) -> Result<(String, String, String, String)> {
    let module = reader.read_str()?.to_string();
    let callable = reader.read_str()?.to_string();
    let args = reader.read_str()?.to_string();

    // a request may end after args; kwargs are optional
    let kwargs = match reader.read_str() {
        Ok(s) => s.to_string(),
        Err(BridgeError::MissingTerminator { .. }) => String::new(),
        Err(e) => return Err(e),
    };

    Ok((module, callable, args, kwargs))
}

fn required<'a>(ptr: *const c_char, param: &'static str) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(BridgeError::NullPointer { param });
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| BridgeError::InvalidUtf8 { position: 0 })
}

fn optional<'a>(ptr: *const c_char) -> Result<&'a str> {
    if ptr.is_null() {
        return Ok("");
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| BridgeError::InvalidUtf8 { position: 0 })
}

fn string_reply(outcome: Result<String>) -> *mut c_char {
    let text = match outcome {
        Ok(s) => s,
        Err(e) => {
            error!("python call failed: {}", e);
            e.to_report()
        }
    };

    // interior NULs cannot cross the C boundary
    let cleaned = text.replace('\0', "");
    match CString::new(cleaned) {
        Ok(c) => c.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_null() {
        let err = required(ptr::null(), "module").unwrap_err();
        assert_eq!(err, BridgeError::NullPointer { param: "module" });
    }

    #[test]
    fn test_optional_null_is_empty() {
        assert_eq!(optional(ptr::null()).unwrap(), "");
    }

    #[test]
    fn test_free_null_is_noop() {
        python_free_string(ptr::null_mut());
    }

    #[test]
    fn test_string_reply_strips_interior_nul() {
        let raw = string_reply(Ok("a\0b".to_string()));
        assert!(!raw.is_null());
        let s = unsafe { CStr::from_ptr(raw) }.to_str().unwrap().to_string();
        python_free_string(raw);
        assert_eq!(s, "ab");
    }

    #[test]
    fn test_read_request_without_kwargs() {
        let data = b"demo\0sum\0[1, 2]\0";
        let mut reader = BufferReader::new(data);
        let (module, callable, args, kwargs) = read_request(&mut reader).unwrap();
        assert_eq!(module, "demo");
        assert_eq!(callable, "sum");
        assert_eq!(args, "[1, 2]");
        assert_eq!(kwargs, "");
    }

    #[test]
    fn test_read_request_truncated() {
        let mut reader = BufferReader::new(b"demo\0sum");
        assert!(matches!(
            read_request(&mut reader).unwrap_err(),
            BridgeError::MissingTerminator { .. }
        ));
    }
}
