//! Collaborators for the cfgdrift kernel.
//!
//! This crate is intentionally thin: it shells out to `kubectl` for the
//! desired state and for command execution in the Db2 pod, and reads
//! captured outputs from disk for offline runs. It keeps no validation
//! policy of its own.

mod capture;
mod kubectl;

pub use capture::CaptureDir;
pub use kubectl::{KubectlClient, KubectlSettings};
