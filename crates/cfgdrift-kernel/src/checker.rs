//! One generic checker for the three configuration domains.
//!
//! A checker is a (domain, command) pair; the command fixes both the text
//! format and the description quoted in not-found records. Comparison and
//! record building are shared so the domains cannot drift apart.

use crate::command::ConfigCommand;
use crate::desired::{DatabaseDecl, Parameters};
use crate::equivalence::matches;
use crate::error::ExecError;
use crate::extract::extract;
use crate::failure::{Domain, FailureRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainChecker {
    domain: Domain,
    command: ConfigCommand,
}

impl DomainChecker {
    pub fn database(name: &str) -> Self {
        Self {
            domain: Domain::Database {
                name: name.to_string(),
            },
            command: ConfigCommand::DbCfg {
                database: name.to_string(),
            },
        }
    }

    pub fn dbm() -> Self {
        Self {
            domain: Domain::Dbm,
            command: ConfigCommand::DbmCfg,
        }
    }

    pub fn registry() -> Self {
        Self {
            domain: Domain::Registry,
            command: ConfigCommand::Registry,
        }
    }

    /// Compare `declared` against the output produced by `fetch`.
    ///
    /// `fetch` runs at most once, and not at all when nothing is declared.
    /// Its failure aborts the check.
    pub fn check<F>(&self, declared: &Parameters, fetch: F) -> Result<Vec<FailureRecord>, ExecError>
    where
        F: FnOnce(&ConfigCommand) -> Result<String, ExecError>,
    {
        let _span = tracing::info_span!("domain_check", domain = %self.domain).entered();

        if declared.is_empty() {
            tracing::info!("no settings declared, skipping");
            return Ok(Vec::new());
        }

        let raw = fetch(&self.command)?;
        tracing::debug!(command = %self.command.shell_line(), output = %raw, "command output");
        tracing::debug!(declared = declared.len(), "running checks");

        let failures = self.compare(declared, &raw);
        if failures.is_empty() {
            tracing::info!("all checks passed");
        } else {
            tracing::warn!(failed = failures.len(), "checks failed");
        }
        Ok(failures)
    }

    /// Compare every declared pair against already captured output.
    pub fn compare(&self, declared: &Parameters, raw: &str) -> Vec<FailureRecord> {
        let format = self.command.format();
        let mut failures = Vec::new();

        for (name, value) in declared.iter() {
            match extract(raw, name, format) {
                None => failures.push(FailureRecord::not_found(
                    self.domain.clone(),
                    name,
                    self.command.description(),
                )),
                Some(observed) if !matches(name, value, observed) => failures.push(
                    FailureRecord::mismatch(self.domain.clone(), name, value, observed),
                ),
                Some(_) => {}
            }
        }

        failures
    }
}

/// Run the per-database checker over every declared database in order.
///
/// Databases without settings are skipped without executing anything.
pub fn check_databases<F>(
    databases: &[DatabaseDecl],
    mut fetch: F,
) -> Result<Vec<FailureRecord>, ExecError>
where
    F: FnMut(&ConfigCommand) -> Result<String, ExecError>,
{
    let mut failures = Vec::new();
    for database in databases {
        let checker = DomainChecker::database(&database.name);
        failures.extend(checker.check(&database.db_config, &mut fetch)?);
    }
    Ok(failures)
}
