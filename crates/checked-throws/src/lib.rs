//! Checked-exception analysis for a dynamically typed language with
//! `@throws` docblock annotations.
//!
//! The host parser and reflection layer hand over a typed [`ast::Program`]
//! and a populated [`registry::Registry`]; the passes here report checked
//! exceptions escaping undeclared, dead annotations, and dead catch clauses
//! as [`diagnostics::Diagnostic`] records.

pub mod ast;
pub mod checked_exceptions;
pub mod dead_catch_union_finder;
pub mod default_throw_type;
pub mod diagnostics;
pub mod extensions;
pub mod registry;
pub mod throw_type_service;
pub mod throws_analyzer;
pub mod throws_scope;
pub mod unreachable_catch_finder;
pub mod useless_throws_finder;

use thiserror::Error;

pub use crate::ast::Program;
pub use crate::checked_exceptions::{CheckedExceptions, ConfigError};
pub use crate::dead_catch_union_finder::find_dead_catch_unions;
pub use crate::default_throw_type::DefaultThrowTypeService;
pub use crate::diagnostics::{Diagnostic, Severity};
pub use crate::extensions::{DefaultThrowTypeExtension, IntdivThrowTypeExtension};
pub use crate::registry::{CallableDef, ClassDef, Registry, ThrowsTag};
pub use crate::throw_type_service::{DynamicThrowTypeService, UnsupportedCallable};
pub use crate::throws_analyzer::ThrowsAnalyzer;
pub use crate::unreachable_catch_finder::find_unreachable_catches;
pub use crate::useless_throws_finder::find_useless_throws;

/// Invariant violations that abort analysis of a program. Reported back as
/// a single internal-severity diagnostic instead of poisoning later runs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InternalError {
  #[error("scope stack underflow")]
  ScopeUnderflow,
  #[error("statement nesting exceeds the limit of {0}")]
  NestingTooDeep(usize),
  #[error("class {class} has no reflection entry for method {method}")]
  MissingMethodReflection { class: String, method: String },
}

#[derive(Clone, Debug)]
pub struct AnalyzerSettings {
  /// Also report never-thrown catch types whose declared class is unchecked.
  pub report_unused_catches_of_unchecked_exceptions: bool,
  /// Report checked exceptions thrown from global scope, where no `@throws`
  /// annotation can exist.
  pub report_checked_throws_in_global_scope: bool,
  /// Hard cap on statement and expression nesting before analysis aborts.
  pub max_nesting_depth: usize,
}

impl Default for AnalyzerSettings {
  fn default() -> Self {
    AnalyzerSettings {
      report_unused_catches_of_unchecked_exceptions: false,
      report_checked_throws_in_global_scope: true,
      max_nesting_depth: 256,
    }
  }
}

/// Runs every pass over one program: exception flow first, then the pure
/// catch-redundancy and annotation-hygiene passes, appended in that order.
pub fn lint_program(
  program: &Program,
  registry: &Registry,
  checked_exceptions: &CheckedExceptions,
  dynamic_throw_type: &mut DynamicThrowTypeService,
  default_throw_type: &DefaultThrowTypeService,
  settings: &AnalyzerSettings,
) -> Vec<Diagnostic> {
  let mut diagnostics = ThrowsAnalyzer::new(
    registry,
    checked_exceptions,
    dynamic_throw_type,
    default_throw_type,
    settings,
  )
  .analyze(program);
  diagnostics.extend(find_unreachable_catches(program, registry));
  diagnostics.extend(find_dead_catch_unions(program, registry));
  diagnostics.extend(find_useless_throws(program, registry));
  diagnostics
}
