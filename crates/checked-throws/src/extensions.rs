//! Bundled throw-type extensions.

use crate::ast::{Expr, StaticType};
use crate::default_throw_type::DefaultThrowTypeService;
use crate::registry::{CallableDef, MethodRef, Registry};
use crate::throw_type_service::{
  DynamicConstructorThrowTypeExtension, DynamicFunctionThrowTypeExtension,
  DynamicMethodThrowTypeExtension, DynamicStaticMethodThrowTypeExtension, UnsupportedCallable,
};
use crate::throws_analyzer::{ARITHMETIC_ERROR, DIVISION_BY_ZERO_ERROR};

/// Adapts the static default table into the extension protocol so that
/// table entries take precedence over `@throws` annotations during
/// resolution.
pub struct DefaultThrowTypeExtension {
  defaults: DefaultThrowTypeService,
}

impl DefaultThrowTypeExtension {
  pub fn new(defaults: DefaultThrowTypeService) -> Self {
    DefaultThrowTypeExtension { defaults }
  }
}

impl DynamicMethodThrowTypeExtension for DefaultThrowTypeExtension {
  fn throw_type_from_method_call(
    &self,
    method: MethodRef<'_>,
    _args: &[Expr],
    _registry: &Registry,
  ) -> Result<Vec<String>, UnsupportedCallable> {
    self.defaults.method_throw_type(method)
  }
}

impl DynamicStaticMethodThrowTypeExtension for DefaultThrowTypeExtension {
  fn throw_type_from_static_call(
    &self,
    method: MethodRef<'_>,
    _args: &[Expr],
    _registry: &Registry,
  ) -> Result<Vec<String>, UnsupportedCallable> {
    self.defaults.method_throw_type(method)
  }
}

impl DynamicConstructorThrowTypeExtension for DefaultThrowTypeExtension {
  fn throw_type_from_constructor(
    &self,
    method: MethodRef<'_>,
    _args: &[Expr],
    _registry: &Registry,
  ) -> Result<Vec<String>, UnsupportedCallable> {
    self.defaults.constructor_throw_type(method)
  }
}

impl DynamicFunctionThrowTypeExtension for DefaultThrowTypeExtension {
  fn throw_type_from_function_call(
    &self,
    function: &CallableDef,
    _args: &[Expr],
    _registry: &Registry,
  ) -> Result<Vec<String>, UnsupportedCallable> {
    self.defaults.function_throw_type(&function.name)
  }
}

/// Value-sensitive throw type for `intdiv`: a divisor that can be zero
/// throws `DivisionByZeroError`, and `intdiv(PHP_INT_MAX-equivalent, -1)`
/// overflows with `ArithmeticError`.
pub struct IntdivThrowTypeExtension;

impl DynamicFunctionThrowTypeExtension for IntdivThrowTypeExtension {
  fn throw_type_from_function_call(
    &self,
    function: &CallableDef,
    args: &[Expr],
    _registry: &Registry,
  ) -> Result<Vec<String>, UnsupportedCallable> {
    if function.name != "intdiv" {
      return Err(UnsupportedCallable::UnsupportedFunction);
    }
    if args.len() < 2 {
      return Err(UnsupportedCallable::UnsupportedFunction);
    }

    let dividend_may_overflow = match args[0].static_type() {
      StaticType::IntConstants(values) => values.contains(&i64::MAX),
      // Cannot rule out the overflowing dividend.
      _ => return Ok(vec![ARITHMETIC_ERROR.to_string()]),
    };

    match args[1].static_type() {
      StaticType::IntConstants(values) => {
        if values.contains(&0) {
          Ok(vec![DIVISION_BY_ZERO_ERROR.to_string()])
        } else if dividend_may_overflow && values.contains(&-1) {
          Ok(vec![ARITHMETIC_ERROR.to_string()])
        } else {
          Ok(vec![])
        }
      }
      // An unknown divisor may be zero or -1; ArithmeticError covers both.
      _ => Ok(vec![ARITHMETIC_ERROR.to_string()]),
    }
  }
}
