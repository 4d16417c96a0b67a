//! Validation aggregator: one run over all three domains.

use crate::checker::{DomainChecker, check_databases};
use crate::command::{ConfigCommand, DesiredStateSource, InstanceRef, RemoteExec};
use crate::desired::DesiredState;
use crate::error::ValidationError;
use crate::failure::DriftReport;

/// Validates instances against their desired state.
///
/// Holds no state between runs: every run fetches the desired state and all
/// command output afresh.
#[derive(Debug, Clone)]
pub struct Validator<S, E> {
    source: S,
    exec: E,
}

impl<S: DesiredStateSource, E: RemoteExec> Validator<S, E> {
    pub fn new(source: S, exec: E) -> Self {
        Self { source, exec }
    }

    /// Succeeds only when every declared parameter matches.
    ///
    /// Drift is reported as [`ValidationError::Drift`]; any other error means
    /// the run was aborted before completion.
    pub fn validate(&self, instance: &InstanceRef) -> Result<(), ValidationError> {
        let report = self.run(instance)?;
        report.log_summary();
        report.into_result().map_err(ValidationError::Drift)
    }

    /// Fetch the desired state and check it, returning the full report.
    pub fn run(&self, instance: &InstanceRef) -> Result<DriftReport, ValidationError> {
        let _span = tracing::info_span!("validate", %instance).entered();
        let desired = self.source.fetch(instance)?;
        self.check(instance, &desired)
    }

    /// Check an already fetched desired state.
    ///
    /// Fails before executing anything when no databases are declared.
    pub fn check(
        &self,
        instance: &InstanceRef,
        desired: &DesiredState,
    ) -> Result<DriftReport, ValidationError> {
        let databases = desired.databases()?;
        let mut fetch = |command: &ConfigCommand| self.exec.exec(instance, command);

        let databases = check_databases(databases, &mut fetch)?;
        let dbm = DomainChecker::dbm().check(desired.dbm_config(), &mut fetch)?;
        let registry = DomainChecker::registry().check(desired.registry(), &mut fetch)?;

        Ok(DriftReport {
            databases,
            dbm,
            registry,
        })
    }
}
