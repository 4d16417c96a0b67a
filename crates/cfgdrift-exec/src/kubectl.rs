//! `kubectl`-backed collaborators.

use cfgdrift_kernel::command::{CR_GROUP, CR_KIND, CR_PLURAL, CR_VERSION};
use cfgdrift_kernel::{
    ConfigCommand, DesiredState, DesiredStateSource, ExecError, FetchError, InstanceRef,
    RemoteExec,
};
use serde::{Deserialize, Serialize};
use std::process::{Output, Stdio};
use std::time::Duration;

/// How cfgdrift reaches the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KubectlSettings {
    /// Executable used for cluster access.
    pub binary: String,
    /// Kube context; the current context when unset.
    pub context: Option<String>,
    /// Upper bound on each remote command and resource read.
    pub exec_timeout_secs: u64,
    /// User the db2 commands run as inside the pod.
    pub instance_owner: String,
    /// Container inside the Db2 pod; kubectl's default when unset.
    pub container: Option<String>,
}

impl Default for KubectlSettings {
    fn default() -> Self {
        Self {
            binary: "kubectl".to_string(),
            context: None,
            exec_timeout_secs: 60,
            instance_owner: "db2inst1".to_string(),
            container: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("not installed")]
    NotInstalled,

    #[error("{0}")]
    Io(String),

    #[error("timed out")]
    Timeout,
}

/// Thin client around the `kubectl` CLI.
///
/// Calls are blocking; each one is driven to completion on a private
/// current-thread runtime so the timeout can kill a hung process.
#[derive(Debug)]
pub struct KubectlClient {
    settings: KubectlSettings,
    runtime: tokio::runtime::Runtime,
}

impl KubectlClient {
    pub fn new(settings: KubectlSettings) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { settings, runtime })
    }

    pub fn settings(&self) -> &KubectlSettings {
        &self.settings
    }

    /// Returns true if the configured binary answers `version --client`.
    pub fn is_available(&self) -> bool {
        std::process::Command::new(&self.settings.binary)
            .args(["version", "--client"])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.settings.exec_timeout_secs)
    }

    fn run(&self, args: &[String]) -> Result<Output, RunError> {
        tracing::debug!(binary = %self.settings.binary, args = %args.join(" "), "running kubectl");
        let mut command = tokio::process::Command::new(&self.settings.binary);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let timeout = self.timeout();
        self.runtime.block_on(async {
            let child = command.spawn().map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    RunError::NotInstalled
                } else {
                    RunError::Io(err.to_string())
                }
            })?;
            match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(Ok(output)) => Ok(output),
                Ok(Err(err)) => Err(RunError::Io(err.to_string())),
                Err(_) => Err(RunError::Timeout),
            }
        })
    }

    fn context_args(&self) -> Vec<String> {
        match &self.settings.context {
            Some(context) => vec!["--context".to_string(), context.clone()],
            None => Vec::new(),
        }
    }

    fn get_args(&self, instance: &InstanceRef) -> Vec<String> {
        let mut args = self.context_args();
        args.extend([
            "get".to_string(),
            format!("{CR_PLURAL}.{CR_VERSION}.{CR_GROUP}"),
            instance.resource_name(),
            "-n".to_string(),
            instance.namespace(),
            "-o".to_string(),
            "json".to_string(),
            format!("--request-timeout={}s", self.settings.exec_timeout_secs),
        ]);
        args
    }

    fn exec_args(&self, instance: &InstanceRef, command: &ConfigCommand) -> Vec<String> {
        let mut args = self.context_args();
        args.extend([
            "exec".to_string(),
            "-n".to_string(),
            instance.namespace(),
            instance.pod_name(),
        ]);
        if let Some(container) = &self.settings.container {
            args.extend(["-c".to_string(), container.clone()]);
        }
        args.push("--".to_string());
        args.extend(command.argv(&self.settings.instance_owner));
        args
    }
}

impl DesiredStateSource for KubectlClient {
    fn fetch(&self, instance: &InstanceRef) -> Result<DesiredState, FetchError> {
        let origin = format!("{CR_KIND} {instance}");
        tracing::debug!(%instance, "getting {CR_KIND}");

        let output = self.run(&self.get_args(instance)).map_err(|err| FetchError::Read {
            origin: origin.clone(),
            message: match err {
                RunError::NotInstalled => {
                    format!("{} executable is not available in PATH", self.settings.binary)
                }
                RunError::Timeout => format!(
                    "no response within {}s",
                    self.settings.exec_timeout_secs
                ),
                RunError::Io(message) => message,
            },
        })?;

        if !output.status.success() {
            let stderr = lossy_trimmed(&output.stderr);
            if is_server_not_found(&stderr) {
                return Err(FetchError::NotFound {
                    kind: CR_KIND.to_string(),
                    name: instance.resource_name(),
                    namespace: instance.namespace(),
                });
            }
            return Err(FetchError::Read {
                origin,
                message: non_empty_or_unknown(stderr),
            });
        }

        DesiredState::from_json_str(&String::from_utf8_lossy(&output.stdout), &origin)
    }
}

impl RemoteExec for KubectlClient {
    fn exec(&self, instance: &InstanceRef, command: &ConfigCommand) -> Result<String, ExecError> {
        let pod = instance.pod_name();
        let target = format!("{pod} in namespace {}", instance.namespace());
        tracing::debug!(%pod, command = %command.shell_line(), "executing in pod");

        let output = self
            .run(&self.exec_args(instance, command))
            .map_err(|err| match err {
                RunError::NotInstalled => ExecError::NotInstalled {
                    program: self.settings.binary.clone(),
                },
                RunError::Timeout => ExecError::Timeout {
                    command: command.shell_line(),
                    target: target.clone(),
                    seconds: self.settings.exec_timeout_secs,
                },
                RunError::Io(message) => ExecError::Failed {
                    command: command.shell_line(),
                    target: target.clone(),
                    message,
                    stdout: String::new(),
                    stderr: String::new(),
                },
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = lossy_trimmed(&output.stderr);
        Err(ExecError::Failed {
            command: command.shell_line(),
            target,
            message: match output.status.code() {
                Some(code) => format!("exit status {code}"),
                None => "terminated by signal".to_string(),
            },
            stdout,
            stderr,
        })
    }
}

/// kubectl marks a missing resource as `Error from server (NotFound): ...`;
/// other "not found" texts (unknown context, missing kubeconfig) are not
/// about the resource.
fn is_server_not_found(stderr: &str) -> bool {
    stderr.contains("(NotFound)")
}

fn lossy_trimmed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

fn non_empty_or_unknown(message: String) -> String {
    if message.is_empty() {
        "unknown error".to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(settings: KubectlSettings) -> KubectlClient {
        KubectlClient::new(settings).expect("runtime should build")
    }

    #[test]
    fn default_settings_match_db2u_layout() {
        let settings = KubectlSettings::default();
        assert_eq!(settings.binary, "kubectl");
        assert_eq!(settings.exec_timeout_secs, 60);
        assert_eq!(settings.instance_owner, "db2inst1");
        assert_eq!(settings.context, None);
    }

    #[test]
    fn get_args_target_the_instance_resource() {
        let kubectl = client(KubectlSettings::default());
        let args = kubectl.get_args(&InstanceRef::new("inst1", "manage"));
        assert_eq!(
            args,
            vec![
                "get",
                "db2uinstances.v1.db2u.databases.ibm.com",
                "db2wh-inst1-manage",
                "-n",
                "db2u-inst1",
                "-o",
                "json",
                "--request-timeout=60s",
            ]
        );
    }

    #[test]
    fn exec_args_run_db2_as_instance_owner() {
        let kubectl = client(KubectlSettings {
            context: Some("prod".to_string()),
            container: Some("db2u".to_string()),
            ..KubectlSettings::default()
        });
        let command = ConfigCommand::DbCfg {
            database: "BLUDB".to_string(),
        };
        let args = kubectl.exec_args(&InstanceRef::new("inst1", "manage"), &command);
        assert_eq!(
            args,
            vec![
                "--context",
                "prod",
                "exec",
                "-n",
                "db2u-inst1",
                "c-db2wh-inst1-manage-db2u-0",
                "-c",
                "db2u",
                "--",
                "su",
                "-lc",
                "db2 get db cfg for BLUDB",
                "db2inst1",
            ]
        );
    }

    #[test]
    fn missing_binary_is_reported_as_not_installed() {
        let kubectl = client(KubectlSettings {
            binary: "cfgdrift-no-such-kubectl".to_string(),
            ..KubectlSettings::default()
        });
        let err = kubectl
            .exec(&InstanceRef::new("a", "b"), &ConfigCommand::DbmCfg)
            .expect_err("binary is missing");
        assert!(matches!(err, ExecError::NotInstalled { .. }));
        assert!(!kubectl.is_available());
    }

    #[test]
    fn only_server_side_not_found_means_missing_resource() {
        assert!(is_server_not_found(
            "Error from server (NotFound): db2uinstances.db2u.databases.ibm.com \"db2wh-a-b\" not found"
        ));
        assert!(!is_server_not_found("error: context \"prod\" not found"));
        assert!(!is_server_not_found("error: the server doesn't have a resource type \"db2uinstances\""));
    }

    #[cfg(unix)]
    struct FakeKubectl {
        dir: std::path::PathBuf,
    }

    #[cfg(unix)]
    impl FakeKubectl {
        /// A `kubectl` stand-in whose body is `script`.
        fn new(name: &str, script: &str) -> Self {
            use std::os::unix::fs::PermissionsExt;

            let dir = std::env::temp_dir().join(format!(
                "cfgdrift-kubectl-{name}-{}",
                std::process::id()
            ));
            std::fs::create_dir_all(&dir).expect("temp dir should be created");
            let path = dir.join("kubectl");
            std::fs::write(&path, format!("#!/bin/sh\n{script}\n"))
                .expect("fake kubectl should be written");
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("fake kubectl should be executable");
            Self { dir }
        }

        fn client(&self, exec_timeout_secs: u64) -> KubectlClient {
            client(KubectlSettings {
                binary: self.dir.join("kubectl").display().to_string(),
                exec_timeout_secs,
                ..KubectlSettings::default()
            })
        }
    }

    #[cfg(unix)]
    impl Drop for FakeKubectl {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    #[cfg(unix)]
    #[test]
    fn hung_command_times_out() {
        let fake = FakeKubectl::new("hang", "exec sleep 30");
        let kubectl = fake.client(1);

        let started = std::time::Instant::now();
        let err = kubectl
            .exec(&InstanceRef::new("a", "b"), &ConfigCommand::DbmCfg)
            .expect_err("command should time out");
        let elapsed = started.elapsed();

        assert!(elapsed < Duration::from_secs(10), "took {elapsed:?}");
        match err {
            ExecError::Timeout {
                command,
                target,
                seconds,
            } => {
                assert_eq!(command, "db2 get dbm cfg");
                assert_eq!(target, "c-db2wh-a-b-db2u-0 in namespace db2u-a");
                assert_eq!(seconds, 1);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_carries_output() {
        let fake = FakeKubectl::new("exit3", "echo partial; echo boom >&2; exit 3");
        let kubectl = fake.client(10);

        let err = kubectl
            .exec(&InstanceRef::new("a", "b"), &ConfigCommand::Registry)
            .expect_err("command should fail");
        match err {
            ExecError::Failed {
                command,
                message,
                stdout,
                stderr,
                ..
            } => {
                assert_eq!(command, "db2set");
                assert_eq!(message, "exit status 3");
                assert_eq!(stdout, "partial\n");
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn fetch_distinguishes_missing_resource_from_other_errors() {
        let instance = InstanceRef::new("a", "b");

        let missing = FakeKubectl::new(
            "missing",
            "echo 'Error from server (NotFound): db2uinstances.db2u.databases.ibm.com \"db2wh-a-b\" not found' >&2; exit 1",
        );
        let err = missing.client(10).fetch(&instance).expect_err("resource is missing");
        assert!(matches!(err, FetchError::NotFound { .. }), "{err:?}");

        let bad_context = FakeKubectl::new(
            "bad-context",
            "echo 'error: context \"prod\" not found' >&2; exit 1",
        );
        let err = bad_context.client(10).fetch(&instance).expect_err("context is missing");
        match err {
            FetchError::Read { message, .. } => assert_eq!(message, "error: context \"prod\" not found"),
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[test]
    fn non_empty_or_unknown_fills_blank_messages() {
        assert_eq!(non_empty_or_unknown(String::new()), "unknown error");
        assert_eq!(non_empty_or_unknown("boom".to_string()), "boom");
    }
}
