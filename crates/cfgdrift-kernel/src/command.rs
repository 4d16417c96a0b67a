//! Collaborator boundary: which instance, which command, and the two traits
//! through which the kernel reaches the outside world.

use crate::desired::DesiredState;
use crate::error::{ExecError, FetchError};
use crate::extract::Format;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CR_GROUP: &str = "db2u.databases.ibm.com";
pub const CR_VERSION: &str = "v1";
pub const CR_PLURAL: &str = "db2uinstances";
pub const CR_KIND: &str = "Db2uInstance";

/// A Db2 warehouse instance serving one application of one platform instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceRef {
    pub instance_id: String,
    pub app_id: String,
}

impl InstanceRef {
    pub fn new(instance_id: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            app_id: app_id.into(),
        }
    }

    /// Name of the Db2uInstance resource.
    pub fn resource_name(&self) -> String {
        format!("db2wh-{}-{}", self.instance_id, self.app_id)
    }

    pub fn namespace(&self) -> String {
        format!("db2u-{}", self.instance_id)
    }

    /// First Db2 engine pod of the instance.
    pub fn pod_name(&self) -> String {
        format!("c-db2wh-{}-{}-db2u-0", self.instance_id, self.app_id)
    }
}

impl fmt::Display for InstanceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace(), self.resource_name())
    }
}

/// The three configuration listings the checker knows how to read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigCommand {
    /// `db2 get db cfg for <database>`
    DbCfg { database: String },
    /// `db2 get dbm cfg`
    DbmCfg,
    /// `db2set`
    Registry,
}

impl ConfigCommand {
    /// Shell line executed as the instance owner.
    pub fn shell_line(&self) -> String {
        match self {
            Self::DbCfg { database } => format!("db2 get db cfg for {database}"),
            Self::DbmCfg => "db2 get dbm cfg".to_string(),
            Self::Registry => "db2set".to_string(),
        }
    }

    /// Database-independent name used in failure records.
    pub fn description(&self) -> &'static str {
        match self {
            Self::DbCfg { .. } => "db2 get db cfg",
            Self::DbmCfg => "db2 get dbm cfg",
            Self::Registry => "db2set",
        }
    }

    pub fn format(&self) -> Format {
        match self {
            Self::DbCfg { .. } | Self::DbmCfg => Format::Config,
            Self::Registry => Format::Registry,
        }
    }

    /// Full argv: a login shell for `owner` running [`Self::shell_line`].
    pub fn argv(&self, owner: &str) -> Vec<String> {
        vec![
            "su".to_string(),
            "-lc".to_string(),
            self.shell_line(),
            owner.to_string(),
        ]
    }
}

/// Reads the desired state of an instance.
///
/// Must fail, rather than return partial data, when the resource does not exist.
pub trait DesiredStateSource {
    fn fetch(&self, instance: &InstanceRef) -> Result<DesiredState, FetchError>;
}

/// Runs a configuration listing inside the database workload and returns its
/// standard output.
pub trait RemoteExec {
    fn exec(&self, instance: &InstanceRef, command: &ConfigCommand) -> Result<String, ExecError>;
}

impl<T: DesiredStateSource + ?Sized> DesiredStateSource for &T {
    fn fetch(&self, instance: &InstanceRef) -> Result<DesiredState, FetchError> {
        (**self).fetch(instance)
    }
}

impl<T: RemoteExec + ?Sized> RemoteExec for &T {
    fn exec(&self, instance: &InstanceRef, command: &ConfigCommand) -> Result<String, ExecError> {
        (**self).exec(instance, command)
    }
}
