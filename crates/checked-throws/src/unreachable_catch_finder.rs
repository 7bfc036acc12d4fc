//! Flags catch clauses that can never run because an earlier sibling clause
//! already handles the same exception type or a supertype of it.

use crate::ast::{for_each_try, Program};
use crate::diagnostics::Diagnostic;
use crate::registry::Registry;

pub fn find_unreachable_catches(program: &Program, registry: &Registry) -> Vec<Diagnostic> {
  let mut diagnostics = Vec::new();
  for_each_try(program, &mut |try_stmt| {
    let mut already_caught: Vec<String> = Vec::new();
    for clause in &try_stmt.catches {
      for class in &clause.types {
        // Unknown classes are someone else's problem; they also must not
        // shadow later clauses.
        if !registry.has_class(class) {
          continue;
        }
        if let Some(message) = redundancy_message(&already_caught, class, registry) {
          diagnostics.push(Diagnostic::error(message, clause.line));
        }
        already_caught.push(class.clone());
      }
    }
  });
  diagnostics
}

/// The first earlier type that shadows `class` wins, so repeated subtypes
/// always name the original occurrence.
pub(crate) fn redundancy_message(
  already_caught: &[String],
  class: &str,
  registry: &Registry,
) -> Option<String> {
  for earlier in already_caught {
    if earlier == class {
      return Some(format!("Type {class} is redundant"));
    }
    if registry.is_strict_subtype_of(class, earlier) {
      return Some(format!("Type {class} is already caught by {earlier}"));
    }
  }
  None
}
