//! Small helpers shared by every crate in the shim workspace.

pub mod env;
