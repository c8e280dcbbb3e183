//! Image formats, file naming and codec operations
//!
//! The pixel work (decode, linear resize, encode) is delegated to the
//! `image` crate; everything here is synchronous and meant to run on a
//! blocking thread.

pub mod format;
pub mod naming;
pub mod processor;

pub use format::resolve_format;
pub use naming::{format_token_from_path, format_token_from_url, NamingPolicy};
pub use processor::{decode_bytes, resize_job_sync, write_image};
