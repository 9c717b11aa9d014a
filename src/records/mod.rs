//! Record operations for recordspace
//!
//! `find`, `find_one`, `create`, `update` and `delete` over a schema
//! provider, a record store, and a hasher.

mod errors;
mod service;

pub use errors::{ServiceError, ServiceResult};
pub use service::RecordService;
