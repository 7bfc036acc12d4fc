//! Typed AST supplied by the host parser and type-inference pipeline.
//!
//! The analyzer never parses source text. The host hands over a `Program`
//! whose expressions already carry the static types its inference computed;
//! everything here is plain data.

/// Identifies one closure literal within a program, assigned by the host.
pub type ClosureId = u32;

/// The host inference's verdict about an expression's static type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StaticType {
  /// One or more nominal class names (a union of object types).
  Object(Vec<String>),
  /// A closure value with its inferred throw type attached.
  Closure { throws: Vec<String> },
  /// An integer whose possible constant values are fully enumerable.
  IntConstants(Vec<i64>),
  /// An integer the inference could not enumerate.
  Int,
  /// Anything else.
  Mixed,
}

impl StaticType {
  pub fn object(class_name: &str) -> Self {
    StaticType::Object(vec![class_name.to_string()])
  }

  /// Nominal class names this type can hold at runtime, in union order.
  pub fn class_names(&self) -> Vec<String> {
    match self {
      StaticType::Object(names) => names.clone(),
      _ => Vec::new(),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Mod,
  ShiftLeft,
  ShiftRight,
  Concat,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
  /// `new ClassName(...)`
  New { class: String, args: Vec<Expr>, line: usize },
  /// `$target->method(...)`
  MethodCall { target: Box<Expr>, method: String, args: Vec<Expr>, line: usize },
  /// `ClassName::method(...)`
  StaticCall { class: String, method: String, args: Vec<Expr>, line: usize },
  /// `function_name(...)`
  FunctionCall { function: String, args: Vec<Expr>, line: usize },
  /// `$callee(...)` where the callee is an expression (closure value).
  ClosureCall { callee: Box<Expr>, args: Vec<Expr>, line: usize },
  /// An inline closure literal.
  Closure { id: ClosureId, body: Vec<Stmt>, line: usize },
  Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr>, line: usize },
  /// `$var op= value`, e.g. `$x /= $y`.
  AssignOp { op: BinaryOp, var: String, value: Box<Expr>, line: usize },
  /// A variable or opaque sub-expression, typed by the host inference.
  Var { name: String, ty: StaticType, line: usize },
  IntLit { value: i64, line: usize },
  StringLit { value: String, line: usize },
  /// `yield from expr`, delegated generator iteration.
  YieldFrom { expr: Box<Expr>, line: usize },
}

impl Expr {
  pub fn line(&self) -> usize {
    match self {
      Expr::New { line, .. }
      | Expr::MethodCall { line, .. }
      | Expr::StaticCall { line, .. }
      | Expr::FunctionCall { line, .. }
      | Expr::ClosureCall { line, .. }
      | Expr::Closure { line, .. }
      | Expr::Binary { line, .. }
      | Expr::AssignOp { line, .. }
      | Expr::Var { line, .. }
      | Expr::IntLit { line, .. }
      | Expr::StringLit { line, .. }
      | Expr::YieldFrom { line, .. } => *line,
    }
  }

  /// Static type as far as the syntax alone determines it. Closure literals
  /// report `Mixed` here; the flow analyzer substitutes the throw type it
  /// computed for the closure body.
  pub fn static_type(&self) -> StaticType {
    match self {
      Expr::New { class, .. } => StaticType::object(class),
      Expr::Var { ty, .. } => ty.clone(),
      Expr::IntLit { value, .. } => StaticType::IntConstants(vec![*value]),
      _ => StaticType::Mixed,
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatchClause {
  /// Declared exception types, possibly a union (`catch (A | B $e)`).
  pub types: Vec<String>,
  pub var: Option<String>,
  pub body: Vec<Stmt>,
  pub line: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TryStmt {
  pub body: Vec<Stmt>,
  pub catches: Vec<CatchClause>,
  pub finally: Option<Vec<Stmt>>,
  pub line: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
  Expr(Expr),
  Throw { expr: Expr, line: usize },
  Try(TryStmt),
  Foreach { expr: Expr, binds_key: bool, body: Vec<Stmt>, line: usize },
  If { cond: Expr, then_branch: Vec<Stmt>, else_branch: Vec<Stmt>, line: usize },
  While { cond: Expr, body: Vec<Stmt>, line: usize },
  Return { expr: Option<Expr>, line: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
  pub name: String,
  pub body: Vec<Stmt>,
  pub line: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodDecl {
  pub name: String,
  pub is_static: bool,
  /// `None` for abstract or interface methods.
  pub body: Option<Vec<Stmt>>,
  pub line: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassDecl {
  pub name: String,
  pub methods: Vec<MethodDecl>,
  pub line: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Item {
  Function(FunctionDecl),
  Class(ClassDecl),
  /// Global-scope code.
  Stmt(Stmt),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
  pub items: Vec<Item>,
}

impl Program {
  pub fn new(items: Vec<Item>) -> Self {
    Program { items }
  }
}

/// Calls `f` for every try statement in the program, in source order,
/// including tries nested in function bodies, closures, catch and finally
/// blocks.
pub fn for_each_try<'a>(program: &'a Program, f: &mut dyn FnMut(&'a TryStmt)) {
  for item in &program.items {
    match item {
      Item::Function(decl) => for_each_try_in_stmts(&decl.body, f),
      Item::Class(decl) => {
        for method in &decl.methods {
          if let Some(body) = &method.body {
            for_each_try_in_stmts(body, f);
          }
        }
      }
      Item::Stmt(stmt) => for_each_try_in_stmt(stmt, f),
    }
  }
}

fn for_each_try_in_stmts<'a>(stmts: &'a [Stmt], f: &mut dyn FnMut(&'a TryStmt)) {
  for stmt in stmts {
    for_each_try_in_stmt(stmt, f);
  }
}

fn for_each_try_in_stmt<'a>(stmt: &'a Stmt, f: &mut dyn FnMut(&'a TryStmt)) {
  match stmt {
    Stmt::Expr(expr) => for_each_try_in_expr(expr, f),
    Stmt::Throw { expr, .. } => for_each_try_in_expr(expr, f),
    Stmt::Try(try_stmt) => {
      f(try_stmt);
      for_each_try_in_stmts(&try_stmt.body, f);
      for catch in &try_stmt.catches {
        for_each_try_in_stmts(&catch.body, f);
      }
      if let Some(finally) = &try_stmt.finally {
        for_each_try_in_stmts(finally, f);
      }
    }
    Stmt::Foreach { expr, body, .. } => {
      for_each_try_in_expr(expr, f);
      for_each_try_in_stmts(body, f);
    }
    Stmt::If { cond, then_branch, else_branch, .. } => {
      for_each_try_in_expr(cond, f);
      for_each_try_in_stmts(then_branch, f);
      for_each_try_in_stmts(else_branch, f);
    }
    Stmt::While { cond, body, .. } => {
      for_each_try_in_expr(cond, f);
      for_each_try_in_stmts(body, f);
    }
    Stmt::Return { expr, .. } => {
      if let Some(expr) = expr {
        for_each_try_in_expr(expr, f);
      }
    }
  }
}

fn for_each_try_in_expr<'a>(expr: &'a Expr, f: &mut dyn FnMut(&'a TryStmt)) {
  match expr {
    Expr::New { args, .. }
    | Expr::StaticCall { args, .. }
    | Expr::FunctionCall { args, .. } => {
      for arg in args {
        for_each_try_in_expr(arg, f);
      }
    }
    Expr::MethodCall { target, args, .. } => {
      for_each_try_in_expr(target, f);
      for arg in args {
        for_each_try_in_expr(arg, f);
      }
    }
    Expr::ClosureCall { callee, args, .. } => {
      for_each_try_in_expr(callee, f);
      for arg in args {
        for_each_try_in_expr(arg, f);
      }
    }
    Expr::Closure { body, .. } => for_each_try_in_stmts(body, f),
    Expr::Binary { left, right, .. } => {
      for_each_try_in_expr(left, f);
      for_each_try_in_expr(right, f);
    }
    Expr::AssignOp { value, .. } => for_each_try_in_expr(value, f),
    Expr::YieldFrom { expr, .. } => for_each_try_in_expr(expr, f),
    Expr::Var { .. } | Expr::IntLit { .. } | Expr::StringLit { .. } => {}
  }
}
