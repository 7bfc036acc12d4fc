//! Dynamic throw-type resolution for call sites.
//!
//! Extensions compute the throw type of calls whose behavior depends on
//! argument values, not just signatures. Each extension either answers or
//! signals that it does not handle the declaring class or the specific
//! callable; unsupported combinations are memoized for the rest of the run
//! and the first extension that answers wins. When nobody answers, the
//! callable's own `@throws` annotation is the fallback, and total
//! non-resolution means "throws nothing".

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::ast::Expr;
use crate::registry::{CallableDef, MethodRef, Registry};

/// Negotiation signal: the extension's author did not intend to handle this
/// declaring class at all, or handles the class but not this member.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum UnsupportedCallable {
  #[error("extension does not support this class")]
  UnsupportedClass,
  #[error("extension does not support this callable")]
  UnsupportedFunction,
}

pub trait DynamicMethodThrowTypeExtension {
  fn throw_type_from_method_call(
    &self,
    method: MethodRef<'_>,
    args: &[Expr],
    registry: &Registry,
  ) -> Result<Vec<String>, UnsupportedCallable>;
}

pub trait DynamicStaticMethodThrowTypeExtension {
  fn throw_type_from_static_call(
    &self,
    method: MethodRef<'_>,
    args: &[Expr],
    registry: &Registry,
  ) -> Result<Vec<String>, UnsupportedCallable>;
}

pub trait DynamicConstructorThrowTypeExtension {
  fn throw_type_from_constructor(
    &self,
    method: MethodRef<'_>,
    args: &[Expr],
    registry: &Registry,
  ) -> Result<Vec<String>, UnsupportedCallable>;
}

pub trait DynamicFunctionThrowTypeExtension {
  fn throw_type_from_function_call(
    &self,
    function: &CallableDef,
    args: &[Expr],
    registry: &Registry,
  ) -> Result<Vec<String>, UnsupportedCallable>;
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
enum Variant {
  Method,
  StaticMethod,
  Constructor,
  Function,
}

struct Registered<T> {
  /// Declaring class or interface this extension is bound to; `None` means
  /// it is consulted for every call of its kind.
  binding: Option<String>,
  extension: T,
}

#[derive(Default)]
pub struct DynamicThrowTypeService {
  method_extensions: Vec<Registered<Box<dyn DynamicMethodThrowTypeExtension>>>,
  static_method_extensions: Vec<Registered<Box<dyn DynamicStaticMethodThrowTypeExtension>>>,
  constructor_extensions: Vec<Registered<Box<dyn DynamicConstructorThrowTypeExtension>>>,
  function_extensions: Vec<Box<dyn DynamicFunctionThrowTypeExtension>>,
  unsupported_classes: HashSet<(Variant, String, usize)>,
  unsupported_callables: HashSet<(Variant, String, usize)>,
}

impl DynamicThrowTypeService {
  pub fn new() -> Self {
    DynamicThrowTypeService::default()
  }

  pub fn add_method_extension(&mut self, extension: Box<dyn DynamicMethodThrowTypeExtension>) {
    self.method_extensions.push(Registered { binding: None, extension });
  }

  pub fn add_method_extension_for_class(
    &mut self,
    class: &str,
    extension: Box<dyn DynamicMethodThrowTypeExtension>,
  ) {
    self.method_extensions.push(Registered { binding: Some(class.to_string()), extension });
  }

  pub fn add_static_method_extension(
    &mut self,
    extension: Box<dyn DynamicStaticMethodThrowTypeExtension>,
  ) {
    self.static_method_extensions.push(Registered { binding: None, extension });
  }

  pub fn add_static_method_extension_for_class(
    &mut self,
    class: &str,
    extension: Box<dyn DynamicStaticMethodThrowTypeExtension>,
  ) {
    self.static_method_extensions.push(Registered { binding: Some(class.to_string()), extension });
  }

  pub fn add_constructor_extension(
    &mut self,
    extension: Box<dyn DynamicConstructorThrowTypeExtension>,
  ) {
    self.constructor_extensions.push(Registered { binding: None, extension });
  }

  pub fn add_constructor_extension_for_class(
    &mut self,
    class: &str,
    extension: Box<dyn DynamicConstructorThrowTypeExtension>,
  ) {
    self.constructor_extensions.push(Registered { binding: Some(class.to_string()), extension });
  }

  pub fn add_function_extension(&mut self, extension: Box<dyn DynamicFunctionThrowTypeExtension>) {
    self.function_extensions.push(extension);
  }

  pub fn method_throw_type(
    &mut self,
    method: MethodRef<'_>,
    args: &[Expr],
    registry: &Registry,
  ) -> Vec<String> {
    let candidates =
      candidate_indices(&self.method_extensions, method.declaring_class, registry);
    let callable_key = callable_key(method);

    for index in candidates {
      if self.is_memoized(Variant::Method, method.declaring_class, &callable_key, index) {
        continue;
      }
      match self.method_extensions[index].extension.throw_type_from_method_call(method, args, registry) {
        Ok(throw_classes) => return throw_classes,
        Err(unsupported) => {
          self.memoize(Variant::Method, method.declaring_class, &callable_key, index, unsupported)
        }
      }
    }

    method.def.declared_throws().unwrap_or_default()
  }

  pub fn static_method_throw_type(
    &mut self,
    method: MethodRef<'_>,
    args: &[Expr],
    registry: &Registry,
  ) -> Vec<String> {
    let candidates =
      candidate_indices(&self.static_method_extensions, method.declaring_class, registry);
    let callable_key = callable_key(method);

    for index in candidates {
      if self.is_memoized(Variant::StaticMethod, method.declaring_class, &callable_key, index) {
        continue;
      }
      match self.static_method_extensions[index].extension.throw_type_from_static_call(method, args, registry) {
        Ok(throw_classes) => return throw_classes,
        Err(unsupported) => self.memoize(
          Variant::StaticMethod,
          method.declaring_class,
          &callable_key,
          index,
          unsupported,
        ),
      }
    }

    method.def.declared_throws().unwrap_or_default()
  }

  pub fn constructor_throw_type(
    &mut self,
    method: MethodRef<'_>,
    args: &[Expr],
    registry: &Registry,
  ) -> Vec<String> {
    let candidates =
      candidate_indices(&self.constructor_extensions, method.declaring_class, registry);
    let callable_key = callable_key(method);

    for index in candidates {
      if self.is_memoized(Variant::Constructor, method.declaring_class, &callable_key, index) {
        continue;
      }
      match self.constructor_extensions[index].extension.throw_type_from_constructor(method, args, registry) {
        Ok(throw_classes) => return throw_classes,
        Err(unsupported) => self.memoize(
          Variant::Constructor,
          method.declaring_class,
          &callable_key,
          index,
          unsupported,
        ),
      }
    }

    method.def.declared_throws().unwrap_or_default()
  }

  pub fn function_throw_type(
    &mut self,
    function: &CallableDef,
    args: &[Expr],
    registry: &Registry,
  ) -> Vec<String> {
    for (index, extension) in self.function_extensions.iter().enumerate() {
      let key = (Variant::Function, function.name.clone(), index);
      if self.unsupported_callables.contains(&key) {
        continue;
      }
      match extension.throw_type_from_function_call(function, args, registry) {
        Ok(throw_classes) => return throw_classes,
        Err(_) => {
          debug!(function = %function.name, extension = index, "marking extension unsupported");
          self.unsupported_callables.insert(key);
        }
      }
    }

    function.declared_throws().unwrap_or_default()
  }

  fn is_memoized(&self, variant: Variant, class: &str, callable_key: &str, index: usize) -> bool {
    self.unsupported_classes.contains(&(variant, class.to_string(), index))
      || self.unsupported_callables.contains(&(variant, callable_key.to_string(), index))
  }

  fn memoize(
    &mut self,
    variant: Variant,
    class: &str,
    callable_key: &str,
    index: usize,
    unsupported: UnsupportedCallable,
  ) {
    debug!(
      ?variant,
      class,
      callable = callable_key,
      extension = index,
      ?unsupported,
      "marking extension unsupported"
    );
    match unsupported {
      UnsupportedCallable::UnsupportedClass => {
        self.unsupported_classes.insert((variant, class.to_string(), index));
      }
      UnsupportedCallable::UnsupportedFunction => {
        self.unsupported_callables.insert((variant, callable_key.to_string(), index));
      }
    }
  }
}

fn callable_key(method: MethodRef<'_>) -> String {
  format!("{}::{}", method.declaring_class, method.def.name)
}

/// Candidate extensions for a declaring class, in tie-break order: extensions
/// bound to the class itself, then to each ancestor, then to each interface,
/// then global extensions; registration order within each bucket.
fn candidate_indices<T>(
  extensions: &[Registered<T>],
  declaring_class: &str,
  registry: &Registry,
) -> Vec<usize> {
  let mut names = vec![declaring_class.to_string()];
  names.extend(registry.ancestors(declaring_class));
  names.extend(registry.interfaces(declaring_class));

  let mut out = Vec::new();
  for name in &names {
    for (index, registered) in extensions.iter().enumerate() {
      if registered.binding.as_deref() == Some(name.as_str()) && !out.contains(&index) {
        out.push(index);
      }
    }
  }
  for (index, registered) in extensions.iter().enumerate() {
    if registered.binding.is_none() {
      out.push(index);
    }
  }
  out
}
