//! Failure records and the per-domain drift report.

use crate::error::StructuredFailure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration category a record belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "snake_case")]
pub enum Domain {
    Database { name: String },
    Dbm,
    Registry,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database { name } => write!(f, "db cfg for {name}"),
            Self::Dbm => f.write_str("dbm cfg"),
            Self::Registry => f.write_str("registry cfg"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// No line of the command output carries the parameter.
    NotFound { command: String },
    /// Present, but not equivalent to the declared value.
    Mismatch { declared: String, observed: String },
}

/// One drifted parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    #[serde(flatten)]
    pub domain: Domain,
    pub parameter: String,
    #[serde(flatten)]
    pub kind: FailureKind,
}

impl FailureRecord {
    pub fn not_found(domain: Domain, parameter: &str, command: &str) -> Self {
        Self {
            domain,
            parameter: parameter.to_string(),
            kind: FailureKind::NotFound {
                command: command.to_string(),
            },
        }
    }

    pub fn mismatch(domain: Domain, parameter: &str, declared: &str, observed: &str) -> Self {
        Self {
            domain,
            parameter: parameter.to_string(),
            kind: FailureKind::Mismatch {
                declared: declared.to_string(),
                observed: observed.to_string(),
            },
        }
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FailureKind::NotFound { command } => write!(
                f,
                "[{}] {} not found in output of {command} command",
                self.domain, self.parameter
            ),
            FailureKind::Mismatch { declared, observed } => write!(
                f,
                "[{}] {}: {declared} != {observed}",
                self.domain, self.parameter
            ),
        }
    }
}

/// Records of one validation run, grouped by domain in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftReport {
    pub databases: Vec<FailureRecord>,
    pub dbm: Vec<FailureRecord>,
    pub registry: Vec<FailureRecord>,
}

impl DriftReport {
    /// All records: databases first, then dbm, then registry.
    pub fn records(&self) -> impl Iterator<Item = &FailureRecord> {
        self.databases
            .iter()
            .chain(self.dbm.iter())
            .chain(self.registry.iter())
    }

    pub fn total(&self) -> usize {
        self.databases.len() + self.dbm.len() + self.registry.len()
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    /// Rendered records, in [`Self::records`] order.
    pub fn details(&self) -> Vec<String> {
        self.records().map(ToString::to_string).collect()
    }

    /// `Ok` when clean, otherwise the structured failure callers display.
    pub fn into_result(self) -> Result<(), StructuredFailure> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(StructuredFailure::from_details(self.details()))
        }
    }

    /// Log the outcome: one line when clean, otherwise per-domain counts
    /// followed by every record at `error` level.
    pub fn log_summary(&self) {
        if self.is_clean() {
            tracing::info!("all checks passed");
            return;
        }

        tracing::error!(failed = self.total(), "checks failed");
        for (label, records) in [
            ("db cfg", &self.databases),
            ("dbm cfg", &self.dbm),
            ("registry cfg", &self.registry),
        ] {
            tracing::error!(domain = label, failed = records.len(), "domain failures");
            for record in records {
                tracing::error!(domain = label, "{record}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bludb() -> Domain {
        Domain::Database {
            name: "BLUDB".to_string(),
        }
    }

    #[test]
    fn records_render_like_operator_messages() {
        assert_eq!(
            FailureRecord::not_found(bludb(), "NOTFOUNDINOUTPUT", "db2 get db cfg").to_string(),
            "[db cfg for BLUDB] NOTFOUNDINOUTPUT not found in output of db2 get db cfg command"
        );
        assert_eq!(
            FailureRecord::mismatch(Domain::Dbm, "AGENT_STACK_SZ", "2048", "1024").to_string(),
            "[dbm cfg] AGENT_STACK_SZ: 2048 != 1024"
        );
        assert_eq!(
            FailureRecord::mismatch(bludb(), "MIRRORLOGPATH", "/mnt/backup", "").to_string(),
            "[db cfg for BLUDB] MIRRORLOGPATH: /mnt/backup != "
        );
    }

    #[test]
    fn report_orders_domains_and_counts() {
        let report = DriftReport {
            databases: vec![FailureRecord::mismatch(bludb(), "LOGPRIMARY", "100", "20")],
            dbm: Vec::new(),
            registry: vec![FailureRecord::not_found(Domain::Registry, "DB2_SKIPDELETED", "db2set")],
        };
        assert_eq!(report.total(), 2);
        assert!(!report.is_clean());

        let failure = report.into_result().expect_err("report has drift");
        insta::assert_snapshot!(failure.details.join("\n"), @r"
        [db cfg for BLUDB] LOGPRIMARY: 100 != 20
        [registry cfg] DB2_SKIPDELETED not found in output of db2set command
        ");
        assert_eq!(failure.message, "2 checks failed");
    }

    #[test]
    fn clean_report_is_ok() {
        assert!(DriftReport::default().into_result().is_ok());
    }

    #[test]
    fn records_serialize_flat() {
        let record = FailureRecord::mismatch(bludb(), "LOGPRIMARY", "100", "20");
        let value = serde_json::to_value(&record).expect("record serializes");
        assert_eq!(
            value,
            serde_json::json!({
                "domain": "database",
                "name": "BLUDB",
                "parameter": "LOGPRIMARY",
                "kind": "mismatch",
                "declared": "100",
                "observed": "20",
            })
        );
    }
}
