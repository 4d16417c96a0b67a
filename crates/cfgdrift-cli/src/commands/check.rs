use crate::support::{finish, setup_or_exit};
use cfgdrift_exec::CaptureDir;
use cfgdrift_kernel::{InstanceRef, Validator};
use std::path::PathBuf;

/// Captures carry no cluster identity; this one only labels diagnostics.
const CAPTURE_INSTANCE: (&str, &str) = ("capture", "offline");

pub fn run(dir: PathBuf, config: Option<PathBuf>, json_output: bool) {
    setup_or_exit(config.as_deref());
    let capture = CaptureDir::new(dir);
    let instance = InstanceRef::new(CAPTURE_INSTANCE.0, CAPTURE_INSTANCE.1);

    let validator = Validator::new(&capture, &capture);
    let outcome = validator.run(&instance);
    finish(
        &format!("cfgdrift check {}", capture.root().display()),
        outcome,
        json_output,
    );
}
