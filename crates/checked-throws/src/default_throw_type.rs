//! Static fallback table of throw types for callables whose documentation
//! the host cannot (or should not) read, typically language builtins.
//!
//! An entry with an empty class list means "explicitly throws nothing" and
//! still counts as supported; an absent entry is an unsupported signal so
//! the resolver can keep negotiating.

use std::collections::HashMap;

use crate::registry::MethodRef;
use crate::throw_type_service::UnsupportedCallable;

#[derive(Clone, Debug, Default)]
pub struct DefaultThrowTypeService {
  method_throw_types: HashMap<String, HashMap<String, Vec<String>>>,
  function_throw_types: HashMap<String, Vec<String>>,
}

impl DefaultThrowTypeService {
  pub fn new() -> Self {
    DefaultThrowTypeService::default()
  }

  pub fn add_method_throws(&mut self, class: &str, method: &str, throw_classes: Vec<String>) {
    self
      .method_throw_types
      .entry(class.to_string())
      .or_default()
      .insert(method.to_string(), throw_classes);
  }

  pub fn add_function_throws(&mut self, function: &str, throw_classes: Vec<String>) {
    self.function_throw_types.insert(function.to_string(), throw_classes);
  }

  pub fn function_throw_type(&self, function_name: &str) -> Result<Vec<String>, UnsupportedCallable> {
    self
      .function_throw_types
      .get(function_name)
      .cloned()
      .ok_or(UnsupportedCallable::UnsupportedFunction)
  }

  pub fn method_throw_type(&self, method: MethodRef<'_>) -> Result<Vec<String>, UnsupportedCallable> {
    let methods = self
      .method_throw_types
      .get(method.declaring_class)
      .ok_or(UnsupportedCallable::UnsupportedClass)?;
    methods
      .get(&method.def.name)
      .cloned()
      .ok_or(UnsupportedCallable::UnsupportedFunction)
  }

  /// Constructor misses collapse to unsupported-class: a class absent from
  /// the table has no default constructor behavior either way.
  pub fn constructor_throw_type(&self, method: MethodRef<'_>) -> Result<Vec<String>, UnsupportedCallable> {
    self.method_throw_type(method).map_err(|_| UnsupportedCallable::UnsupportedClass)
  }
}
