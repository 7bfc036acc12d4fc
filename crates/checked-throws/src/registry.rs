//! Class-hierarchy oracle and throws-annotation storage.
//!
//! The host's reflection layer populates a `Registry` once per analysis run:
//! every class with its parent, interfaces and members, every free function,
//! and the parsed `@throws` tags of each callable in docblock order. The
//! analyzer only ever asks questions; it never creates types of its own.

use std::collections::{HashMap, HashSet};

/// One `@throws` docblock tag family: a class name plus every description
/// the docblock gave for it. A bare tag carries a single empty description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThrowsTag {
  pub exception: String,
  pub descriptions: Vec<String>,
}

impl ThrowsTag {
  pub fn new(exception: &str) -> Self {
    ThrowsTag { exception: exception.to_string(), descriptions: vec![String::new()] }
  }

  pub fn described(exception: &str, description: &str) -> Self {
    ThrowsTag { exception: exception.to_string(), descriptions: vec![description.to_string()] }
  }
}

/// A function or method as the host reflection sees it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallableDef {
  pub name: String,
  pub throws: Vec<ThrowsTag>,
}

impl CallableDef {
  pub fn new(name: &str) -> Self {
    CallableDef { name: name.to_string(), throws: Vec::new() }
  }

  pub fn with_throws(mut self, tag: ThrowsTag) -> Self {
    self.throws.push(tag);
    self
  }

  /// Declared throw classes in docblock order, or `None` when the callable
  /// has no `@throws` annotation at all.
  pub fn declared_throws(&self) -> Option<Vec<String>> {
    if self.throws.is_empty() {
      return None;
    }
    Some(self.throws.iter().map(|tag| tag.exception.clone()).collect())
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassDef {
  pub name: String,
  pub parent: Option<String>,
  pub interfaces: Vec<String>,
  pub is_abstract: bool,
  pub is_interface: bool,
  pub methods: Vec<CallableDef>,
}

impl ClassDef {
  pub fn new(name: &str) -> Self {
    ClassDef { name: name.to_string(), ..ClassDef::default() }
  }

  pub fn extending(name: &str, parent: &str) -> Self {
    ClassDef { name: name.to_string(), parent: Some(parent.to_string()), ..ClassDef::default() }
  }

  pub fn interface(name: &str) -> Self {
    ClassDef { name: name.to_string(), is_interface: true, ..ClassDef::default() }
  }

  pub fn with_interface(mut self, interface: &str) -> Self {
    self.interfaces.push(interface.to_string());
    self
  }

  pub fn with_method(mut self, method: CallableDef) -> Self {
    self.methods.push(method);
    self
  }

  pub fn abstract_class(mut self) -> Self {
    self.is_abstract = true;
    self
  }

  fn method(&self, name: &str) -> Option<&CallableDef> {
    self.methods.iter().find(|method| method.name == name)
  }
}

/// A resolved method together with the class that declares it.
#[derive(Clone, Copy, Debug)]
pub struct MethodRef<'a> {
  pub declaring_class: &'a str,
  pub def: &'a CallableDef,
}

#[derive(Clone, Debug, Default)]
pub struct Registry {
  classes: HashMap<String, ClassDef>,
  functions: HashMap<String, CallableDef>,
}

impl Registry {
  pub fn new() -> Self {
    Registry::default()
  }

  pub fn add_class(&mut self, class: ClassDef) {
    self.classes.insert(class.name.clone(), class);
  }

  pub fn add_function(&mut self, function: CallableDef) {
    self.functions.insert(function.name.clone(), function);
  }

  pub fn has_class(&self, name: &str) -> bool {
    self.classes.contains_key(name)
  }

  pub fn class(&self, name: &str) -> Option<&ClassDef> {
    self.classes.get(name)
  }

  pub fn function(&self, name: &str) -> Option<&CallableDef> {
    self.functions.get(name)
  }

  /// Reflexive, transitive subtype check over parent classes and interfaces.
  pub fn is_subtype_of(&self, sub: &str, sup: &str) -> bool {
    if sub == sup {
      return true;
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: Vec<&str> = vec![sub];
    while let Some(current) = queue.pop() {
      if !visited.insert(current) {
        continue;
      }
      let Some(class) = self.classes.get(current) else {
        continue;
      };
      if let Some(parent) = &class.parent {
        if parent == sup {
          return true;
        }
        queue.push(parent);
      }
      for interface in &class.interfaces {
        if interface == sup {
          return true;
        }
        queue.push(interface);
      }
    }

    false
  }

  pub fn is_strict_subtype_of(&self, sub: &str, sup: &str) -> bool {
    sub != sup && self.is_subtype_of(sub, sup)
  }

  /// Parent classes from nearest to root. Unknown parents end the walk.
  pub fn ancestors(&self, name: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = name;
    while let Some(parent) = self.classes.get(current).and_then(|class| class.parent.as_deref()) {
      if out.iter().any(|seen: &String| seen == parent) {
        break;
      }
      out.push(parent.to_string());
      current = parent;
    }
    out
  }

  /// Interfaces implemented by the class or any ancestor, own-first, each
  /// expanded transitively.
  pub fn interfaces(&self, name: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut queue: Vec<String> = Vec::new();

    let mut classes = vec![name.to_string()];
    classes.extend(self.ancestors(name));
    for class_name in &classes {
      if let Some(class) = self.classes.get(class_name) {
        queue.extend(class.interfaces.iter().cloned());
      }
    }

    let mut index = 0;
    while index < queue.len() {
      let interface = queue[index].clone();
      index += 1;
      if out.contains(&interface) {
        continue;
      }
      if let Some(def) = self.classes.get(&interface) {
        queue.extend(def.interfaces.iter().cloned());
        if let Some(parent) = &def.parent {
          queue.push(parent.clone());
        }
      }
      out.push(interface);
    }

    out
  }

  /// Resolves a method by walking the class, its ancestors, then its
  /// interfaces. Returns the declaring class alongside the definition.
  pub fn find_method(&self, class_name: &str, method_name: &str) -> Option<MethodRef<'_>> {
    let mut candidates = vec![class_name.to_string()];
    candidates.extend(self.ancestors(class_name));
    candidates.extend(self.interfaces(class_name));

    for candidate in &candidates {
      if let Some(class) = self.classes.get(candidate) {
        if let Some(def) = class.method(method_name) {
          return Some(MethodRef { declaring_class: &class.name, def });
        }
      }
    }

    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn exception_registry() -> Registry {
    let mut registry = Registry::new();
    registry.add_class(ClassDef::interface("Throwable"));
    registry.add_class(ClassDef::new("Exception").with_interface("Throwable"));
    registry.add_class(ClassDef::extending("RuntimeException", "Exception"));
    registry.add_class(ClassDef::extending("IOException", "RuntimeException"));
    registry
  }

  #[test]
  fn subtype_check_is_reflexive_and_transitive() {
    let registry = exception_registry();
    assert!(registry.is_subtype_of("IOException", "IOException"));
    assert!(registry.is_subtype_of("IOException", "Exception"));
    assert!(registry.is_subtype_of("IOException", "Throwable"));
    assert!(!registry.is_subtype_of("Exception", "IOException"));
    assert!(!registry.is_strict_subtype_of("Exception", "Exception"));
  }

  #[test]
  fn ancestors_are_ordered_nearest_first() {
    let registry = exception_registry();
    assert_eq!(registry.ancestors("IOException"), vec!["RuntimeException", "Exception"]);
  }

  #[test]
  fn interfaces_include_inherited_ones() {
    let registry = exception_registry();
    assert_eq!(registry.interfaces("IOException"), vec!["Throwable"]);
  }

  #[test]
  fn find_method_walks_the_ancestry() {
    let mut registry = exception_registry();
    registry.add_class(
      ClassDef::new("Base").with_method(CallableDef::new("load")),
    );
    registry.add_class(ClassDef::extending("Derived", "Base"));

    let method = registry.find_method("Derived", "load").expect("method resolves");
    assert_eq!(method.declaring_class, "Base");
    assert_eq!(method.def.name, "load");
    assert!(registry.find_method("Derived", "missing").is_none());
  }

  #[test]
  fn declared_throws_keeps_docblock_order() {
    let def = CallableDef::new("run")
      .with_throws(ThrowsTag::new("RuntimeException"))
      .with_throws(ThrowsTag::described("IOException", "on disk failure"));
    assert_eq!(
      def.declared_throws(),
      Some(vec!["RuntimeException".to_string(), "IOException".to_string()])
    );
    assert_eq!(CallableDef::new("noop").declared_throws(), None);
  }
}
