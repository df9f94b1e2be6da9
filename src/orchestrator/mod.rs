//! Application-level orchestration utilities.
//!
//! This module owns the run lifecycle (one request in flight at a time) and post-run
//! processing such as exports. UI/CLI layers call into this module to keep
//! responsibilities separated.

mod controller;
mod post_process;

pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use post_process::process_run_completion;
