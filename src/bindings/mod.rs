pub mod c_api;

// Re-export commonly used items
pub use c_api::*;
