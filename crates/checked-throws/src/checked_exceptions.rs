//! Decides which exception types are "checked" and therefore must be
//! declared with a `@throws` annotation wherever they can propagate.

use thiserror::Error;

use crate::registry::Registry;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("checked and unchecked exception lists cannot be configured at the same time")]
  AmbiguousMode,
}

#[derive(Clone, Debug)]
enum Mode {
  /// Default: everything is checked unless it descends from a listed type.
  DenyList(Vec<String>),
  /// Only subtypes of the listed types are checked.
  AllowList(Vec<String>),
  /// Subtypes of an allow entry are checked unless a deny entry nested
  /// under that allow entry carves them out.
  CarveOut { allow: Vec<String>, deny: Vec<String> },
}

#[derive(Clone, Debug)]
pub struct CheckedExceptions {
  mode: Mode,
}

impl CheckedExceptions {
  /// Plain allow-list / deny-list configuration. Supplying both lists
  /// non-empty is a configuration mistake, rejected up front.
  pub fn new(checked: Vec<String>, unchecked: Vec<String>) -> Result<Self, ConfigError> {
    if !checked.is_empty() && !unchecked.is_empty() {
      return Err(ConfigError::AmbiguousMode);
    }

    let mode = if checked.is_empty() {
      Mode::DenyList(unchecked)
    } else {
      Mode::AllowList(checked)
    };
    Ok(CheckedExceptions { mode })
  }

  /// Allow a broad exception family while carving specific subtrees back
  /// out. A deny entry only suppresses allow entries it is nested under.
  pub fn with_carve_outs(allow: Vec<String>, deny: Vec<String>) -> Self {
    CheckedExceptions { mode: Mode::CarveOut { allow, deny } }
  }

  pub fn is_checked(&self, registry: &Registry, exception_class: &str) -> bool {
    match &self.mode {
      Mode::DenyList(unchecked) => !unchecked
        .iter()
        .any(|denied| registry.is_subtype_of(exception_class, denied)),
      Mode::AllowList(checked) => checked
        .iter()
        .any(|allowed| registry.is_subtype_of(exception_class, allowed)),
      Mode::CarveOut { allow, deny } => {
        'allow: for allowed in allow {
          if !registry.is_subtype_of(exception_class, allowed) {
            continue;
          }
          for denied in deny {
            if registry.is_subtype_of(exception_class, denied)
              && registry.is_subtype_of(denied, allowed)
            {
              continue 'allow;
            }
          }
          return true;
        }
        false
      }
    }
  }

  pub fn filter_checked(&self, registry: &Registry, classes: Vec<String>) -> Vec<String> {
    classes
      .into_iter()
      .filter(|class| self.is_checked(registry, class))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::registry::ClassDef;

  fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.add_class(ClassDef::new("Exception"));
    registry.add_class(ClassDef::extending("RuntimeException", "Exception"));
    registry.add_class(ClassDef::extending("SpecificSubException", "RuntimeException"));
    registry.add_class(ClassDef::extending("OtherSubException", "RuntimeException"));
    registry.add_class(ClassDef::extending("LogicException", "Exception"));
    registry
  }

  #[test]
  fn configuring_both_lists_fails_fast() {
    let result = CheckedExceptions::new(
      vec!["Exception".to_string()],
      vec!["LogicException".to_string()],
    );
    assert_eq!(result.err(), Some(ConfigError::AmbiguousMode));
  }

  #[test]
  fn deny_list_mode_checks_everything_else() {
    let registry = registry();
    let checked =
      CheckedExceptions::new(vec![], vec!["LogicException".to_string()]).unwrap();
    assert!(checked.is_checked(&registry, "RuntimeException"));
    assert!(!checked.is_checked(&registry, "LogicException"));
  }

  #[test]
  fn allow_list_mode_checks_only_the_listed_family() {
    let registry = registry();
    let checked =
      CheckedExceptions::new(vec!["RuntimeException".to_string()], vec![]).unwrap();
    assert!(checked.is_checked(&registry, "SpecificSubException"));
    assert!(!checked.is_checked(&registry, "LogicException"));
  }

  #[test]
  fn carve_out_suppresses_only_nested_deny_entries() {
    let registry = registry();
    let checked = CheckedExceptions::with_carve_outs(
      vec!["RuntimeException".to_string()],
      vec!["SpecificSubException".to_string()],
    );
    assert!(!checked.is_checked(&registry, "SpecificSubException"));
    assert!(checked.is_checked(&registry, "OtherSubException"));
  }

  #[test]
  fn unrelated_deny_entry_does_not_suppress_an_allow() {
    let registry = registry();
    let checked = CheckedExceptions::with_carve_outs(
      vec!["RuntimeException".to_string()],
      vec!["LogicException".to_string()],
    );
    assert!(checked.is_checked(&registry, "OtherSubException"));
  }

  #[test]
  fn filter_checked_keeps_input_order() {
    let registry = registry();
    let checked =
      CheckedExceptions::new(vec![], vec!["LogicException".to_string()]).unwrap();
    let filtered = checked.filter_checked(
      &registry,
      vec![
        "RuntimeException".to_string(),
        "LogicException".to_string(),
        "Exception".to_string(),
      ],
    );
    assert_eq!(filtered, vec!["RuntimeException", "Exception"]);
  }
}
