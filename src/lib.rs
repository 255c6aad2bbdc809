//! pygml - call Python functions from GameMaker
//!
//! GameMaker extensions can only exchange doubles and C strings, so this
//! library exposes three thin adapters around one embedded-interpreter call:
//! a string-eval call, a JSON-argument call, and a buffer call that returns
//! a typed value plus a status code the GML side can branch on.

// Core modules
pub mod buffer;
pub mod config;
pub mod convert;
pub mod errors;
pub mod interp;
pub mod logging;
pub mod marshal;

// FFI and bindings layer
pub mod bindings;

// Re-export commonly used items
pub use buffer::{BufferReader, BufferWriter};
pub use config::Config;
pub use errors::{BridgeError, Result};
pub use logging::{init_logging, LogFormat, LogSettings};
pub use marshal::{encode_error, encode_reply, Status, Value};
