//! Flags dead members inside one catch clause's union type, e.g.
//! `catch (RuntimeException | IOException $e)` where the second member is
//! already covered by the first.

use crate::ast::{for_each_try, Program};
use crate::diagnostics::Diagnostic;
use crate::registry::Registry;
use crate::unreachable_catch_finder::redundancy_message;

pub fn find_dead_catch_unions(program: &Program, registry: &Registry) -> Vec<Diagnostic> {
  let mut diagnostics = Vec::new();
  for_each_try(program, &mut |try_stmt| {
    for clause in &try_stmt.catches {
      if clause.types.len() <= 1 {
        continue;
      }

      let mut already_caught: Vec<String> = Vec::new();
      let mut messages: Vec<String> = Vec::new();
      for class in &clause.types {
        if !registry.has_class(class) {
          continue;
        }
        if let Some(message) = redundancy_message(&already_caught, class, registry) {
          if !messages.contains(&message) {
            messages.push(message);
          }
        }
        already_caught.push(class.clone());
      }

      for message in messages {
        diagnostics.push(Diagnostic::error(message, clause.line));
      }
    }
  });
  diagnostics
}
