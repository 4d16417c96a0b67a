//! Capture directories: the desired state and command outputs saved to disk.
//!
//! ```text
//! <dir>/db2uinstance.yaml        (or .yml / .json)
//! <dir>/db2getdbcfg-<DB>.txt     per database, preferred when present
//! <dir>/db2getdbcfg.txt          shared by every database otherwise
//! <dir>/db2getdbmcfg.txt
//! <dir>/db2set.txt
//! ```
//!
//! A capture holds one instance, so the instance reference is only used in
//! diagnostics.

use cfgdrift_kernel::{
    ConfigCommand, DesiredState, DesiredStateSource, ExecError, FetchError, InstanceRef,
    RemoteExec,
};
use std::fs;
use std::path::{Path, PathBuf};

const DESIRED_STATE_FILES: &[&str] = &["db2uinstance.yaml", "db2uinstance.yml", "db2uinstance.json"];

#[derive(Debug, Clone)]
pub struct CaptureDir {
    root: PathBuf,
}

impl CaptureDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files that may hold the output of `command`, in lookup order.
    fn output_candidates(&self, command: &ConfigCommand) -> Vec<PathBuf> {
        match command {
            ConfigCommand::DbCfg { database } => vec![
                self.root.join(format!("db2getdbcfg-{database}.txt")),
                self.root.join("db2getdbcfg.txt"),
            ],
            ConfigCommand::DbmCfg => vec![self.root.join("db2getdbmcfg.txt")],
            ConfigCommand::Registry => vec![self.root.join("db2set.txt")],
        }
    }
}

impl DesiredStateSource for CaptureDir {
    fn fetch(&self, instance: &InstanceRef) -> Result<DesiredState, FetchError> {
        let Some(path) = DESIRED_STATE_FILES
            .iter()
            .map(|name| self.root.join(name))
            .find(|path| path.is_file())
        else {
            return Err(FetchError::Read {
                origin: self.root.display().to_string(),
                message: format!("no {} desired state found for {instance}", DESIRED_STATE_FILES.join(" / ")),
            });
        };

        let origin = path.display().to_string();
        let text = fs::read_to_string(&path).map_err(|e| FetchError::Read {
            origin: origin.clone(),
            message: e.to_string(),
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            DesiredState::from_json_str(&text, &origin)
        } else {
            DesiredState::from_yaml_str(&text, &origin)
        }
    }
}

impl RemoteExec for CaptureDir {
    fn exec(&self, instance: &InstanceRef, command: &ConfigCommand) -> Result<String, ExecError> {
        let candidates = self.output_candidates(command);
        let Some(path) = candidates.iter().find(|path| path.is_file()) else {
            let names: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
            return Err(ExecError::MissingOutput {
                command: command.shell_line(),
                message: format!("none of {} exists for {instance}", names.join(", ")),
            });
        };

        tracing::debug!(path = %path.display(), command = %command.shell_line(), "reading captured output");
        fs::read_to_string(path).map_err(|e| ExecError::MissingOutput {
            command: command.shell_line(),
            message: format!("{}: {e}", path.display()),
        })
    }
}
