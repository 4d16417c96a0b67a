use crate::support::{EXIT_FATAL, finish, setup_or_exit};
use cfgdrift_exec::KubectlClient;
use cfgdrift_kernel::{InstanceRef, Validator};
use std::path::PathBuf;

pub fn run(instance_id: String, app_id: String, config: Option<PathBuf>, json_output: bool) {
    let config = setup_or_exit(config.as_deref());
    let instance = InstanceRef::new(instance_id, app_id);

    let kubectl = KubectlClient::new(config.kubectl).unwrap_or_else(|e| {
        eprintln!("error: failed to start runtime: {e}");
        std::process::exit(EXIT_FATAL);
    });
    if !kubectl.is_available() {
        tracing::warn!(
            binary = %kubectl.settings().binary,
            "kubectl did not answer `version --client`"
        );
    }

    let validator = Validator::new(&kubectl, &kubectl);
    let outcome = validator.run(&instance);
    finish(
        &format!("cfgdrift validate {} {}", instance.instance_id, instance.app_id),
        outcome,
        json_output,
    );
}
