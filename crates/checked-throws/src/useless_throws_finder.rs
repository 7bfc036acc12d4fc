//! Flags `@throws` annotations that add no information: a repeated tag, or
//! a bare tag whose class is already implied by a broader tag on the same
//! declaration. A narrower tag carrying its own description documents a
//! specific sub-case and is kept.

use std::cmp::Ordering;

use crate::ast::{Item, Program};
use crate::diagnostics::Diagnostic;
use crate::registry::{CallableDef, Registry};

pub fn find_useless_throws(program: &Program, registry: &Registry) -> Vec<Diagnostic> {
  let mut diagnostics = Vec::new();
  for item in &program.items {
    match item {
      Item::Function(decl) => {
        if let Some(def) = registry.function(&decl.name) {
          check_declaration(def, registry, decl.line, &mut diagnostics);
        }
      }
      Item::Class(decl) => {
        let Some(class_def) = registry.class(&decl.name) else {
          continue;
        };
        for method in &decl.methods {
          if let Some(def) = class_def.methods.iter().find(|def| def.name == method.name) {
            check_declaration(def, registry, method.line, &mut diagnostics);
          }
        }
      }
      Item::Stmt(_) => {}
    }
  }
  diagnostics
}

fn check_declaration(
  def: &CallableDef,
  registry: &Registry,
  line: usize,
  diagnostics: &mut Vec<Diagnostic>,
) {
  if def.throws.is_empty() {
    return;
  }

  // Collapse repeated tags into one entry per class, merging descriptions
  // in docblock order.
  let mut annotations: Vec<(String, Vec<String>)> = Vec::new();
  for tag in &def.throws {
    if let Some((_, descriptions)) =
      annotations.iter_mut().find(|(class, _)| *class == tag.exception)
    {
      descriptions.extend(tag.descriptions.iter().cloned());
    } else {
      annotations.push((tag.exception.clone(), tag.descriptions.clone()));
    }
  }

  // Supertypes first, so a broad tag lands in the useful set before the
  // narrower tags it subsumes.
  annotations.sort_by(|(left, _), (right, _)| compare_hierarchically(left, right, registry));

  let mut useful: Vec<String> = Vec::new();
  for (class, descriptions) in annotations {
    for description in descriptions {
      if useful.contains(&class)
        || (description.is_empty() && is_strict_subtype_of_any(&class, &useful, registry))
      {
        diagnostics
          .push(Diagnostic::error(format!("Useless @throws {class} annotation"), line));
      }
      if !useful.contains(&class) {
        useful.push(class.clone());
      }
    }
  }
}

fn is_strict_subtype_of_any(class: &str, useful: &[String], registry: &Registry) -> bool {
  useful.iter().any(|earlier| registry.is_strict_subtype_of(class, earlier))
}

fn compare_hierarchically(left: &str, right: &str, registry: &Registry) -> Ordering {
  if left == right {
    return Ordering::Equal;
  }
  if registry.is_strict_subtype_of(left, right) {
    return Ordering::Greater;
  }
  if registry.is_strict_subtype_of(right, left) {
    return Ordering::Less;
  }
  left.cmp(right)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ast::FunctionDecl;
  use crate::registry::{ClassDef, ThrowsTag};

  fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.add_class(ClassDef::new("Exception"));
    registry.add_class(ClassDef::extending("RuntimeException", "Exception"));
    registry.add_class(ClassDef::extending("IOException", "RuntimeException"));
    registry
  }

  fn program_for(name: &str) -> Program {
    Program::new(vec![Item::Function(FunctionDecl {
      name: name.to_string(),
      body: vec![],
      line: 3,
    })])
  }

  #[test]
  fn a_repeated_tag_is_useless() {
    let mut registry = registry();
    registry.add_function(
      CallableDef::new("load")
        .with_throws(ThrowsTag::new("RuntimeException"))
        .with_throws(ThrowsTag::new("RuntimeException")),
    );
    let diagnostics = find_useless_throws(&program_for("load"), &registry);
    assert_eq!(
      diagnostics,
      vec![Diagnostic::error("Useless @throws RuntimeException annotation", 3)]
    );
  }

  #[test]
  fn a_bare_subtype_of_a_broader_tag_is_useless() {
    let mut registry = registry();
    registry.add_function(
      CallableDef::new("load")
        .with_throws(ThrowsTag::new("IOException"))
        .with_throws(ThrowsTag::new("RuntimeException")),
    );
    let diagnostics = find_useless_throws(&program_for("load"), &registry);
    assert_eq!(
      diagnostics,
      vec![Diagnostic::error("Useless @throws IOException annotation", 3)]
    );
  }

  #[test]
  fn a_described_subtype_is_kept() {
    let mut registry = registry();
    registry.add_function(
      CallableDef::new("load")
        .with_throws(ThrowsTag::new("RuntimeException"))
        .with_throws(ThrowsTag::described("IOException", "when the disk is full")),
    );
    assert!(find_useless_throws(&program_for("load"), &registry).is_empty());
  }

  #[test]
  fn unrelated_tags_are_kept() {
    let mut registry = registry();
    registry.add_class(ClassDef::extending("LogicException", "Exception"));
    registry.add_function(
      CallableDef::new("load")
        .with_throws(ThrowsTag::new("RuntimeException"))
        .with_throws(ThrowsTag::new("LogicException")),
    );
    assert!(find_useless_throws(&program_for("load"), &registry).is_empty());
  }

  #[test]
  fn methods_are_checked_too() {
    let mut registry = registry();
    registry.add_class(ClassDef::new("Loader").with_method(
      CallableDef::new("load")
        .with_throws(ThrowsTag::new("Exception"))
        .with_throws(ThrowsTag::new("RuntimeException")),
    ));
    let program = Program::new(vec![Item::Class(crate::ast::ClassDecl {
      name: "Loader".to_string(),
      methods: vec![crate::ast::MethodDecl {
        name: "load".to_string(),
        is_static: false,
        body: Some(vec![]),
        line: 5,
      }],
      line: 1,
    })]);
    let diagnostics = find_useless_throws(&program, &registry);
    assert_eq!(
      diagnostics,
      vec![Diagnostic::error("Useless @throws RuntimeException annotation", 5)]
    );
  }
}
