//! Administrative account operations.
//!
//! None of these check the caller's rights; the boundary layer gates them
//! on the superuser flag before they run.

pub mod manager;

pub use manager::AdminManager;
