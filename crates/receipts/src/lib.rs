//! Receipt history and upload rules.

pub mod receipt;
pub mod upload;

pub use receipt::Receipt;
pub use upload::{UploadError, UploadPolicy, stored_file_name};
