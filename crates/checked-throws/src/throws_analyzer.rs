//! The exception-flow pass: walks a program, tracks which thrown exceptions
//! are handled where, and reports checked exceptions that escape a callable
//! without a covering `@throws` annotation.
//!
//! Catch clauses are processed after their protected block, against the
//! observations the block's traversal recorded; a catch body itself runs
//! with its own try already popped, matching runtime semantics.

use std::collections::HashMap;

use tracing::debug;

use crate::ast::{
  BinaryOp, CatchClause, ClassDecl, ClosureId, Expr, FunctionDecl, Item, MethodDecl, Program,
  StaticType, Stmt, TryStmt,
};
use crate::checked_exceptions::CheckedExceptions;
use crate::default_throw_type::DefaultThrowTypeService;
use crate::diagnostics::Diagnostic;
use crate::registry::{MethodRef, Registry};
use crate::throw_type_service::DynamicThrowTypeService;
use crate::throws_scope::{CatchObservations, ThrowsScope};
use crate::{AnalyzerSettings, InternalError};

pub const ARITHMETIC_ERROR: &str = "ArithmeticError";
pub const DIVISION_BY_ZERO_ERROR: &str = "DivisionByZeroError";

const ITERATOR_CLASS: &str = "Iterator";
const ITERATOR_AGGREGATE_CLASS: &str = "IteratorAggregate";
const ITERATOR_METHODS_WITHOUT_KEY: &[&str] = &["rewind", "valid", "current", "next"];
const ITERATOR_METHODS: &[&str] = &["rewind", "valid", "current", "next", "key"];
const ITERATOR_AGGREGATE_METHODS: &[&str] = &["getIterator"];

pub struct ThrowsAnalyzer<'a> {
  registry: &'a Registry,
  checked_exceptions: &'a CheckedExceptions,
  dynamic_throw_type: &'a mut DynamicThrowTypeService,
  default_throw_type: &'a DefaultThrowTypeService,
  settings: &'a AnalyzerSettings,
  scope: ThrowsScope,
  closure_throws: HashMap<ClosureId, Vec<String>>,
  diagnostics: Vec<Diagnostic>,
  depth: usize,
}

impl<'a> ThrowsAnalyzer<'a> {
  pub fn new(
    registry: &'a Registry,
    checked_exceptions: &'a CheckedExceptions,
    dynamic_throw_type: &'a mut DynamicThrowTypeService,
    default_throw_type: &'a DefaultThrowTypeService,
    settings: &'a AnalyzerSettings,
  ) -> Self {
    ThrowsAnalyzer {
      registry,
      checked_exceptions,
      dynamic_throw_type,
      default_throw_type,
      settings,
      scope: ThrowsScope::new(),
      closure_throws: HashMap::new(),
      diagnostics: Vec::new(),
      depth: 0,
    }
  }

  pub fn analyze(mut self, program: &Program) -> Vec<Diagnostic> {
    debug!(items = program.items.len(), "analyzing program");
    if let Err(error) = self.visit_program(program) {
      self.diagnostics.push(Diagnostic::internal(error.to_string(), 0));
    }
    self.diagnostics
  }

  fn visit_program(&mut self, program: &Program) -> Result<(), InternalError> {
    for item in &program.items {
      match item {
        Item::Function(decl) => self.visit_function(decl)?,
        Item::Class(decl) => {
          for method in &decl.methods {
            self.visit_method(decl, method)?;
          }
        }
        Item::Stmt(stmt) => self.visit_stmt(stmt)?,
      }
    }
    Ok(())
  }

  fn visit_function(&mut self, decl: &FunctionDecl) -> Result<(), InternalError> {
    let registry = self.registry;
    let declared = registry.function(&decl.name).and_then(|def| def.declared_throws());

    self.scope.enter_function(declared.clone());
    self.visit_stmts(&decl.body)?;
    let used = self.scope.exit_function()?;

    if let Some(declared) = declared {
      let defaults = self.default_throw_type.function_throw_type(&decl.name).unwrap_or_default();
      self.report_unused_annotations(declared, used, defaults, decl.line);
    }
    Ok(())
  }

  fn visit_method(&mut self, class: &ClassDecl, method: &MethodDecl) -> Result<(), InternalError> {
    // Abstract and interface methods have no body to analyze.
    let Some(body) = &method.body else {
      return Ok(());
    };

    let registry = self.registry;
    let Some(class_def) = registry.class(&class.name) else {
      return Ok(());
    };
    let Some(def) = class_def.methods.iter().find(|def| def.name == method.name) else {
      return Err(InternalError::MissingMethodReflection {
        class: class.name.clone(),
        method: method.name.clone(),
      });
    };
    let declared = def.declared_throws();

    self.scope.enter_function(declared.clone());
    self.visit_stmts(body)?;
    let used = self.scope.exit_function()?;

    if class_def.is_interface || class_def.is_abstract {
      return Ok(());
    }
    if let Some(declared) = declared {
      let method_ref = MethodRef { declaring_class: &class_def.name, def };
      let defaults = if def.name == "__construct" {
        self.default_throw_type.constructor_throw_type(method_ref)
      } else {
        self.default_throw_type.method_throw_type(method_ref)
      }
      .unwrap_or_default();
      self.report_unused_annotations(declared, used, defaults, method.line);
    }
    Ok(())
  }

  /// Declared classes not consumed by an escaping checked exception and not
  /// implied by the default throw-type table are dead annotations.
  fn report_unused_annotations(
    &mut self,
    declared: Vec<String>,
    used: Vec<String>,
    defaults: Vec<String>,
    line: usize,
  ) {
    let registry = self.registry;
    let used_checked = self.checked_exceptions.filter_checked(registry, used);
    for class in declared {
      if used_checked.contains(&class) || defaults.contains(&class) {
        continue;
      }
      self
        .diagnostics
        .push(Diagnostic::error(format!("Unused @throws {class} annotation"), line));
    }
  }

  fn visit_stmts(&mut self, stmts: &[Stmt]) -> Result<(), InternalError> {
    for stmt in stmts {
      self.visit_stmt(stmt)?;
    }
    Ok(())
  }

  fn visit_stmt(&mut self, stmt: &Stmt) -> Result<(), InternalError> {
    self.enter_nesting()?;
    match stmt {
      Stmt::Expr(expr) => self.visit_expr(expr)?,
      Stmt::Throw { expr, line } => {
        self.process_throw(expr, *line);
        self.visit_expr(expr)?;
      }
      Stmt::Try(try_stmt) => self.visit_try(try_stmt)?,
      Stmt::Foreach { expr, binds_key, body, line } => {
        self.visit_expr(expr)?;
        self.process_traversal(expr, *binds_key, *line);
        self.visit_stmts(body)?;
      }
      Stmt::If { cond, then_branch, else_branch, .. } => {
        self.visit_expr(cond)?;
        self.visit_stmts(then_branch)?;
        self.visit_stmts(else_branch)?;
      }
      Stmt::While { cond, body, .. } => {
        self.visit_expr(cond)?;
        self.visit_stmts(body)?;
      }
      Stmt::Return { expr, .. } => {
        if let Some(expr) = expr {
          self.visit_expr(expr)?;
        }
      }
    }
    self.depth -= 1;
    Ok(())
  }

  fn visit_try(&mut self, try_stmt: &TryStmt) -> Result<(), InternalError> {
    self.scope.enter_try(&try_stmt.catches);
    self.visit_stmts(&try_stmt.body)?;
    let observations = self.scope.exit_try()?;

    for (clause, clause_observations) in try_stmt.catches.iter().zip(&observations.catches) {
      self.process_catch(clause, clause_observations);
      self.visit_stmts(&clause.body)?;
    }
    if let Some(finally) = &try_stmt.finally {
      self.visit_stmts(finally)?;
    }
    Ok(())
  }

  fn visit_exprs(&mut self, exprs: &[Expr]) -> Result<(), InternalError> {
    for expr in exprs {
      self.visit_expr(expr)?;
    }
    Ok(())
  }

  fn visit_expr(&mut self, expr: &Expr) -> Result<(), InternalError> {
    self.enter_nesting()?;
    match expr {
      Expr::New { class, args, line } => {
        self.visit_exprs(args)?;
        let throws = self.constructor_throw_classes(class, args);
        self.report_escaping(throws, *line);
      }
      Expr::MethodCall { target, method, args, line } => {
        self.visit_expr(target)?;
        self.visit_exprs(args)?;
        let throws = self.method_call_throw_classes(target, method, args);
        self.report_escaping(throws, *line);
      }
      Expr::StaticCall { class, method, args, line } => {
        self.visit_exprs(args)?;
        let throws = self.static_call_throw_classes(class, method, args);
        self.report_escaping(throws, *line);
      }
      Expr::FunctionCall { function, args, line } => {
        self.visit_exprs(args)?;
        self.process_function_call(function, args, *line);
      }
      Expr::ClosureCall { callee, args, line } => {
        self.visit_expr(callee)?;
        self.visit_exprs(args)?;
        let throws = self.closure_callee_throws(callee);
        self.report_escaping(throws, *line);
      }
      Expr::Closure { id, body, .. } => {
        self.scope.enter_closure();
        self.visit_stmts(body)?;
        let escaped = self.scope.exit_closure()?;
        self.closure_throws.insert(*id, escaped);
      }
      Expr::Binary { op, left, right, line } => {
        self.visit_expr(left)?;
        self.visit_expr(right)?;
        self.process_arithmetic(*op, right, *line);
      }
      Expr::AssignOp { op, value, line, .. } => {
        self.visit_expr(value)?;
        self.process_arithmetic(*op, value, *line);
      }
      Expr::YieldFrom { expr, line } => {
        self.visit_expr(expr)?;
        self.process_traversal(expr, true, *line);
      }
      Expr::Var { .. } | Expr::IntLit { .. } | Expr::StringLit { .. } => {}
    }
    self.depth -= 1;
    Ok(())
  }

  fn process_throw(&mut self, expr: &Expr, line: usize) {
    let registry = self.registry;
    let thrown = expr.static_type().class_names();
    let uncaught = self.scope.filter_uncaught(registry, thrown);
    let escaping = self.checked_exceptions.filter_checked(registry, uncaught);

    let in_global_scope = self.scope.in_global_scope();
    if in_global_scope && !self.settings.report_checked_throws_in_global_scope {
      return;
    }

    for class in escaping {
      let message = if in_global_scope {
        format!("Throwing checked exception {class} in global scope is prohibited")
      } else {
        format!("Missing @throws {class} annotation")
      };
      self.diagnostics.push(Diagnostic::error(message, line));
    }
  }

  fn process_catch(&mut self, clause: &CatchClause, observations: &CatchObservations) {
    let registry = self.registry;
    for entry in &observations.types {
      let catch_class = &entry.class_name;
      let catch_is_checked = self.checked_exceptions.is_checked(registry, catch_class);

      if !catch_is_checked {
        for caught in &entry.observed {
          if self.checked_exceptions.is_checked(registry, caught) {
            self.diagnostics.push(Diagnostic::warning(
              format!(
                "Catching checked exception {caught} as unchecked {catch_class} is not supported properly in this moment. Eliminate checked exceptions by custom catch statement."
              ),
              clause.line,
            ));
          }
        }
      }

      if !self.settings.report_unused_catches_of_unchecked_exceptions && !catch_is_checked {
        continue;
      }
      let observed = if self.settings.report_unused_catches_of_unchecked_exceptions {
        entry.observed.clone()
      } else {
        self.checked_exceptions.filter_checked(registry, entry.observed.clone())
      };
      if observed.is_empty() {
        self.diagnostics.push(Diagnostic::error(
          format!("{catch_class} is never thrown in the corresponding try block"),
          clause.line,
        ));
      }
    }
  }

  fn process_function_call(&mut self, function: &str, args: &[Expr], line: usize) {
    match function {
      "count" => {
        if let Some(arg) = args.first() {
          let throws = self.annotation_throws_on_expr(arg, &["count"]);
          self.report_escaping(throws, line);
        }
        return;
      }
      "iterator_count" | "iterator_apply" => {
        if let Some(arg) = args.first() {
          let throws = self.annotation_throws_on_expr(arg, &["rewind", "valid", "next"]);
          self.report_escaping(throws, line);
        }
        return;
      }
      "iterator_to_array" => {
        if let Some(arg) = args.first() {
          let throws =
            self.annotation_throws_on_expr(arg, &["rewind", "valid", "current", "key", "next"]);
          self.report_escaping(throws, line);
        }
        return;
      }
      _ => {}
    }

    let registry = self.registry;
    let Some(def) = registry.function(function) else {
      return;
    };
    let mut throws = self.dynamic_throw_type.function_throw_type(def, args, registry);

    // json_encode serializes its argument through jsonSerialize.
    if function == "json_encode" {
      if let Some(arg) = args.first() {
        for class in self.annotation_throws_on_expr(arg, &["jsonSerialize"]) {
          if !throws.contains(&class) {
            throws.push(class);
          }
        }
      }
    }

    self.report_escaping(throws, line);
  }

  fn process_arithmetic(&mut self, op: BinaryOp, operand: &Expr, line: usize) {
    match op {
      BinaryOp::Div | BinaryOp::Mod => self.process_div(operand, line),
      BinaryOp::ShiftLeft | BinaryOp::ShiftRight => self.process_shift(operand, line),
      _ => {}
    }
  }

  fn process_div(&mut self, divisor: &Expr, line: usize) {
    match divisor.static_type() {
      StaticType::IntConstants(values) => {
        if values.contains(&0) {
          self.report_escaping(vec![DIVISION_BY_ZERO_ERROR.to_string()], line);
        }
      }
      // Not constant-enumerable: a zero divisor cannot be ruled out.
      _ => self.report_escaping(vec![ARITHMETIC_ERROR.to_string()], line),
    }
  }

  fn process_shift(&mut self, amount: &Expr, line: usize) {
    match amount.static_type() {
      StaticType::IntConstants(values) => {
        if values.iter().any(|value| *value < 0) {
          self.report_escaping(vec![ARITHMETIC_ERROR.to_string()], line);
        }
      }
      _ => self.report_escaping(vec![ARITHMETIC_ERROR.to_string()], line),
    }
  }

  /// Iterating an object drives the iteration protocol: `Iterator`
  /// implementors run their cursor methods, `IteratorAggregate` implementors
  /// run the factory method. `key` only runs when the loop binds a key.
  fn process_traversal(&mut self, expr: &Expr, binds_key: bool, line: usize) {
    let registry = self.registry;
    let mut throws: Vec<String> = Vec::new();
    for class in expr.static_type().class_names() {
      let methods: &[&str] = if registry.is_strict_subtype_of(&class, ITERATOR_CLASS) {
        if binds_key {
          ITERATOR_METHODS
        } else {
          ITERATOR_METHODS_WITHOUT_KEY
        }
      } else if registry.is_strict_subtype_of(&class, ITERATOR_AGGREGATE_CLASS) {
        ITERATOR_AGGREGATE_METHODS
      } else {
        continue;
      };
      for throw_class in self.annotation_throws_on_class(&class, methods) {
        if !throws.contains(&throw_class) {
          throws.push(throw_class);
        }
      }
    }
    self.report_escaping(throws, line);
  }

  fn constructor_throw_classes(&mut self, class: &str, args: &[Expr]) -> Vec<String> {
    let registry = self.registry;
    let Some(method) = registry.find_method(class, "__construct") else {
      return Vec::new();
    };
    self.dynamic_throw_type.constructor_throw_type(method, args, registry)
  }

  fn method_call_throw_classes(
    &mut self,
    target: &Expr,
    method_name: &str,
    args: &[Expr],
  ) -> Vec<String> {
    let registry = self.registry;
    let mut out: Vec<String> = Vec::new();
    for class in target.static_type().class_names() {
      if !registry.has_class(&class) {
        continue;
      }
      // Unknown members fall back to the magic dispatch method.
      let Some(method) = registry
        .find_method(&class, method_name)
        .or_else(|| registry.find_method(&class, "__call"))
      else {
        continue;
      };
      for throw_class in self.dynamic_throw_type.method_throw_type(method, args, registry) {
        if !out.contains(&throw_class) {
          out.push(throw_class);
        }
      }
    }
    out
  }

  fn static_call_throw_classes(
    &mut self,
    class: &str,
    method_name: &str,
    args: &[Expr],
  ) -> Vec<String> {
    let registry = self.registry;
    if !registry.has_class(class) {
      return Vec::new();
    }
    let Some(method) = registry
      .find_method(class, method_name)
      .or_else(|| registry.find_method(class, "__callStatic"))
    else {
      return Vec::new();
    };
    self.dynamic_throw_type.static_method_throw_type(method, args, registry)
  }

  fn closure_callee_throws(&self, callee: &Expr) -> Vec<String> {
    if let Expr::Closure { id, .. } = callee {
      return self.closure_throws.get(id).cloned().unwrap_or_default();
    }
    match callee.static_type() {
      StaticType::Closure { throws } => throws,
      _ => Vec::new(),
    }
  }

  /// `@throws` annotations of the named methods across the classes of an
  /// expression's static type, deduplicated in encounter order.
  fn annotation_throws_on_expr(&self, expr: &Expr, methods: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for class in expr.static_type().class_names() {
      for throw_class in self.annotation_throws_on_class(&class, methods) {
        if !out.contains(&throw_class) {
          out.push(throw_class);
        }
      }
    }
    out
  }

  fn annotation_throws_on_class(&self, class: &str, methods: &[&str]) -> Vec<String> {
    let registry = self.registry;
    let mut out: Vec<String> = Vec::new();
    for method_name in methods {
      let Some(method) = registry.find_method(class, method_name) else {
        continue;
      };
      let Some(declared) = method.def.declared_throws() else {
        continue;
      };
      for throw_class in declared {
        if !out.contains(&throw_class) {
          out.push(throw_class);
        }
      }
    }
    out
  }

  /// Filters a resolved throw set down to checked exceptions that escape the
  /// current position, and reports each one, in union order.
  fn report_escaping(&mut self, throw_classes: Vec<String>, line: usize) {
    if throw_classes.is_empty() {
      return;
    }
    let registry = self.registry;
    let uncaught = self.scope.filter_uncaught(registry, throw_classes);
    let escaping = self.checked_exceptions.filter_checked(registry, uncaught);
    for class in escaping {
      self
        .diagnostics
        .push(Diagnostic::error(format!("Missing @throws {class} annotation"), line));
    }
  }

  fn enter_nesting(&mut self) -> Result<(), InternalError> {
    self.depth += 1;
    if self.depth > self.settings.max_nesting_depth {
      return Err(InternalError::NestingTooDeep(self.settings.max_nesting_depth));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ast::TryStmt;
  use crate::diagnostics::Severity;
  use crate::registry::{CallableDef, ClassDef, ThrowsTag};

  fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.add_class(ClassDef::new("Exception"));
    registry.add_class(ClassDef::extending("RuntimeException", "Exception"));
    registry.add_class(ClassDef::extending("LogicException", "Exception"));
    registry.add_class(ClassDef::new(ARITHMETIC_ERROR));
    registry.add_class(ClassDef::extending(DIVISION_BY_ZERO_ERROR, ARITHMETIC_ERROR));
    registry
  }

  fn check_all() -> CheckedExceptions {
    CheckedExceptions::new(vec![], vec![]).unwrap()
  }

  fn analyze(registry: &Registry, program: &Program) -> Vec<Diagnostic> {
    let checked = check_all();
    let mut dynamic = DynamicThrowTypeService::new();
    let defaults = DefaultThrowTypeService::new();
    let settings = AnalyzerSettings::default();
    ThrowsAnalyzer::new(registry, &checked, &mut dynamic, &defaults, &settings).analyze(program)
  }

  fn throw_new(class: &str, line: usize) -> Stmt {
    Stmt::Throw {
      expr: Expr::New { class: class.to_string(), args: vec![], line },
      line,
    }
  }

  #[test]
  fn global_scope_throws_are_prohibited() {
    let registry = registry();
    let program = Program::new(vec![Item::Stmt(throw_new("RuntimeException", 2))]);
    let diagnostics = analyze(&registry, &program);
    assert_eq!(
      diagnostics,
      vec![Diagnostic::error(
        "Throwing checked exception RuntimeException in global scope is prohibited",
        2,
      )]
    );
  }

  #[test]
  fn global_scope_reporting_can_be_disabled() {
    let registry = registry();
    let program = Program::new(vec![Item::Stmt(throw_new("RuntimeException", 2))]);

    let checked = check_all();
    let mut dynamic = DynamicThrowTypeService::new();
    let defaults = DefaultThrowTypeService::new();
    let settings = AnalyzerSettings {
      report_checked_throws_in_global_scope: false,
      ..AnalyzerSettings::default()
    };
    let diagnostics =
      ThrowsAnalyzer::new(&registry, &checked, &mut dynamic, &defaults, &settings)
        .analyze(&program);
    assert!(diagnostics.is_empty());
  }

  #[test]
  fn division_by_literal_zero_reports_division_by_zero_error() {
    let registry = registry();
    let division = Expr::Binary {
      op: BinaryOp::Div,
      left: Box::new(Expr::Var { name: "a".to_string(), ty: StaticType::Int, line: 3 }),
      right: Box::new(Expr::IntLit { value: 0, line: 3 }),
      line: 3,
    };
    let program = Program::new(vec![Item::Function(FunctionDecl {
      name: "divide".to_string(),
      body: vec![Stmt::Expr(division)],
      line: 1,
    })]);

    let diagnostics = analyze(&registry, &program);
    assert_eq!(
      diagnostics,
      vec![Diagnostic::error("Missing @throws DivisionByZeroError annotation", 3)]
    );
  }

  #[test]
  fn division_by_unknown_integer_reports_arithmetic_error() {
    let registry = registry();
    let division = Expr::AssignOp {
      op: BinaryOp::Mod,
      var: "a".to_string(),
      value: Box::new(Expr::Var { name: "b".to_string(), ty: StaticType::Int, line: 4 }),
      line: 4,
    };
    let program = Program::new(vec![Item::Function(FunctionDecl {
      name: "divide".to_string(),
      body: vec![Stmt::Expr(division)],
      line: 1,
    })]);

    let diagnostics = analyze(&registry, &program);
    assert_eq!(
      diagnostics,
      vec![Diagnostic::error("Missing @throws ArithmeticError annotation", 4)]
    );
  }

  #[test]
  fn negative_shift_amount_reports_arithmetic_error() {
    let registry = registry();
    let shift = Expr::Binary {
      op: BinaryOp::ShiftLeft,
      left: Box::new(Expr::IntLit { value: 1, line: 5 }),
      right: Box::new(Expr::IntLit { value: -2, line: 5 }),
      line: 5,
    };
    let program = Program::new(vec![Item::Function(FunctionDecl {
      name: "shift".to_string(),
      body: vec![Stmt::Expr(shift)],
      line: 1,
    })]);

    let diagnostics = analyze(&registry, &program);
    assert_eq!(
      diagnostics,
      vec![Diagnostic::error("Missing @throws ArithmeticError annotation", 5)]
    );

    let safe_shift = Expr::Binary {
      op: BinaryOp::ShiftLeft,
      left: Box::new(Expr::IntLit { value: 1, line: 6 }),
      right: Box::new(Expr::IntLit { value: 2, line: 6 }),
      line: 6,
    };
    let program = Program::new(vec![Item::Function(FunctionDecl {
      name: "shift".to_string(),
      body: vec![Stmt::Expr(safe_shift)],
      line: 1,
    })]);
    assert!(analyze(&registry, &program).is_empty());
  }

  #[test]
  fn annotation_consumption_is_reported_once_per_declaration() {
    let mut registry = registry();
    registry.add_function(
      CallableDef::new("risky")
        .with_throws(ThrowsTag::new("RuntimeException"))
        .with_throws(ThrowsTag::new("LogicException")),
    );
    let program = Program::new(vec![Item::Function(FunctionDecl {
      name: "risky".to_string(),
      body: vec![throw_new("RuntimeException", 3)],
      line: 1,
    })]);

    let diagnostics = analyze(&registry, &program);
    assert_eq!(
      diagnostics,
      vec![Diagnostic::error("Unused @throws LogicException annotation", 1)]
    );
  }

  #[test]
  fn interface_and_abstract_methods_skip_unused_annotation_checks() {
    let mut registry = registry();
    registry.add_class(
      ClassDef::new("Worker")
        .abstract_class()
        .with_method(CallableDef::new("run").with_throws(ThrowsTag::new("RuntimeException"))),
    );
    let program = Program::new(vec![Item::Class(ClassDecl {
      name: "Worker".to_string(),
      methods: vec![MethodDecl {
        name: "run".to_string(),
        is_static: false,
        body: Some(vec![]),
        line: 2,
      }],
      line: 1,
    })]);

    assert!(analyze(&registry, &program).is_empty());
  }

  #[test]
  fn closure_throws_are_charged_at_the_call_site() {
    let registry = registry();
    let closure = Expr::Closure {
      id: 1,
      body: vec![throw_new("RuntimeException", 3)],
      line: 2,
    };
    let call = Expr::ClosureCall { callee: Box::new(closure), args: vec![], line: 4 };
    let program = Program::new(vec![Item::Function(FunctionDecl {
      name: "caller".to_string(),
      body: vec![Stmt::Expr(call)],
      line: 1,
    })]);

    let diagnostics = analyze(&registry, &program);
    assert_eq!(
      diagnostics,
      vec![Diagnostic::error("Missing @throws RuntimeException annotation", 4)]
    );
  }

  #[test]
  fn unexercised_closure_literals_report_nothing() {
    let registry = registry();
    let closure = Expr::Closure {
      id: 1,
      body: vec![throw_new("RuntimeException", 3)],
      line: 2,
    };
    let program = Program::new(vec![Item::Function(FunctionDecl {
      name: "builder".to_string(),
      body: vec![Stmt::Expr(closure)],
      line: 1,
    })]);

    assert!(analyze(&registry, &program).is_empty());
  }

  #[test]
  fn catching_checked_as_unchecked_emits_guidance() {
    let registry = registry();
    let checked =
      CheckedExceptions::new(vec!["RuntimeException".to_string()], vec![]).unwrap();
    let try_stmt = TryStmt {
      body: vec![throw_new("RuntimeException", 3)],
      catches: vec![CatchClause {
        types: vec!["Exception".to_string()],
        var: Some("e".to_string()),
        body: vec![],
        line: 4,
      }],
      finally: None,
      line: 2,
    };
    let program = Program::new(vec![Item::Function(FunctionDecl {
      name: "handle".to_string(),
      body: vec![Stmt::Try(try_stmt)],
      line: 1,
    })]);

    let mut dynamic = DynamicThrowTypeService::new();
    let defaults = DefaultThrowTypeService::new();
    let settings = AnalyzerSettings::default();
    let diagnostics =
      ThrowsAnalyzer::new(&registry, &checked, &mut dynamic, &defaults, &settings)
        .analyze(&program);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
    assert_eq!(diagnostics[0].line, 4);
    assert!(diagnostics[0].message.contains("RuntimeException"));
    assert!(diagnostics[0].message.contains("unchecked Exception"));
  }

  #[test]
  fn never_thrown_catch_types_are_reported() {
    let registry = registry();
    let try_stmt = TryStmt {
      body: vec![throw_new("RuntimeException", 3)],
      catches: vec![
        CatchClause {
          types: vec!["RuntimeException".to_string()],
          var: None,
          body: vec![],
          line: 4,
        },
        CatchClause {
          types: vec!["LogicException".to_string()],
          var: None,
          body: vec![],
          line: 5,
        },
      ],
      finally: None,
      line: 2,
    };
    let program = Program::new(vec![Item::Function(FunctionDecl {
      name: "handle".to_string(),
      body: vec![Stmt::Try(try_stmt)],
      line: 1,
    })]);

    let diagnostics = analyze(&registry, &program);
    assert_eq!(
      diagnostics,
      vec![Diagnostic::error(
        "LogicException is never thrown in the corresponding try block",
        5,
      )]
    );
  }

  #[test]
  fn runaway_nesting_aborts_with_an_internal_diagnostic() {
    let registry = registry();
    let mut expr = Expr::IntLit { value: 1, line: 1 };
    for _ in 0..600 {
      expr = Expr::Binary {
        op: BinaryOp::Add,
        left: Box::new(expr),
        right: Box::new(Expr::IntLit { value: 1, line: 1 }),
        line: 1,
      };
    }
    let program = Program::new(vec![Item::Stmt(Stmt::Expr(expr))]);

    let diagnostics = analyze(&registry, &program);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Internal);
  }
}
