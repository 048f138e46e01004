//! Browser storage tier adapters.

pub mod chrome_local;
pub mod local_storage;
