//! # cfgdrift kernel
//!
//! Compares a declarative desired state (a Db2uInstance resource) against the
//! configuration a live Db2 instance actually reports, and produces the exact
//! list of discrepancies.
//!
//! The kernel is **transport-agnostic**: fetching the desired state and
//! running commands in the database pod are collaborator traits
//! ([`DesiredStateSource`], [`RemoteExec`]). The kernel only prescribes how
//! observed text is parsed and reconciled.
//!
//! ## Architecture
//!
//! ```text
//! equivalence::matches      ← declared ~ observed, with AUTOMATIC/path rules
//!     │
//! extract::extract          ← (PARAM) = value  |  PARAM=value [O]
//!     │
//! DomainChecker             ← one generic checker, three instances
//!     │
//! Validator                 ← fetch, run db → dbm → registry, aggregate
//! ```

pub mod checker;
pub mod command;
pub mod desired;
pub mod equivalence;
pub mod error;
pub mod extract;
pub mod failure;
pub mod validate;

pub use checker::DomainChecker;
pub use command::{ConfigCommand, DesiredStateSource, InstanceRef, RemoteExec};
pub use desired::{DatabaseDecl, DesiredState, Parameters};
pub use equivalence::matches;
pub use error::{ExecError, FetchError, StructuredFailure, ValidationError};
pub use extract::{Format, extract};
pub use failure::{Domain, DriftReport, FailureKind, FailureRecord};
pub use validate::Validator;
