//! Top-level facade crate for metrix.
//!
//! Re-exports the core domain and the API library so users can depend on a single crate.

pub mod core {
    pub use metrix_core::*;
}

pub mod api {
    pub use metrix_api::*;
}
