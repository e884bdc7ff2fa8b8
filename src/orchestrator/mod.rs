//! Application-level orchestration utilities.
//!
//! This module owns the scan lifecycle (validation, request, progress timer)
//! and the command loop UI layers drive it through.

mod controller;

pub(crate) use controller::{run_controller, ScanController, UiCommand};
