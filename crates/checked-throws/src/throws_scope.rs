//! Tracks where a thrown exception can land while the analyzer walks a
//! program: the enclosing callable, any closure literals, and the stack of
//! enclosing try statements with their catch clauses.
//!
//! The bottom frame is the global scope. It is pushed once and never popped,
//! so an exit without a matching enter is an internal error, not a panic.

use tracing::trace;

use crate::ast::CatchClause;
use crate::registry::Registry;
use crate::InternalError;

/// What one declared catch type saw during its try block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatchTypeObservation {
  pub class_name: String,
  /// Thrown classes this type caught, or may catch, in throw order.
  pub observed: Vec<String>,
}

/// Observations for one catch clause, one entry per declared type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatchObservations {
  pub types: Vec<CatchTypeObservation>,
}

/// Observations for one try statement, one entry per catch clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TryObservations {
  pub catches: Vec<CatchObservations>,
}

#[derive(Clone, Debug)]
enum FrameKind {
  Global,
  Callable {
    /// Classes from the callable's `@throws` annotation, `None` when it has
    /// no annotation at all.
    declared: Option<Vec<String>>,
  },
  Closure {
    /// Classes that escaped the closure body; the caller charges them to
    /// whoever invokes the closure.
    escaped: Vec<String>,
  },
}

#[derive(Clone, Debug)]
struct Frame {
  kind: FrameKind,
  try_stack: Vec<TryObservations>,
  /// Declared throw classes that covered at least one escaping exception.
  used_annotations: Vec<String>,
}

impl Frame {
  fn new(kind: FrameKind) -> Self {
    Frame { kind, try_stack: Vec::new(), used_annotations: Vec::new() }
  }
}

pub struct ThrowsScope {
  frames: Vec<Frame>,
}

impl Default for ThrowsScope {
  fn default() -> Self {
    ThrowsScope::new()
  }
}

impl ThrowsScope {
  pub fn new() -> Self {
    ThrowsScope { frames: vec![Frame::new(FrameKind::Global)] }
  }

  pub fn in_global_scope(&self) -> bool {
    self.frames.len() == 1
  }

  pub fn enter_function(&mut self, declared: Option<Vec<String>>) {
    trace!(?declared, "entering callable frame");
    self.frames.push(Frame::new(FrameKind::Callable { declared }));
  }

  /// Pops the callable frame, returning the declared classes that covered an
  /// escaping exception.
  pub fn exit_function(&mut self) -> Result<Vec<String>, InternalError> {
    let frame = self.pop_frame()?;
    match frame.kind {
      FrameKind::Callable { .. } => {
        trace!(used = ?frame.used_annotations, "exiting callable frame");
        Ok(frame.used_annotations)
      }
      _ => Err(InternalError::ScopeUnderflow),
    }
  }

  pub fn enter_closure(&mut self) {
    trace!("entering closure frame");
    self.frames.push(Frame::new(FrameKind::Closure { escaped: Vec::new() }));
  }

  /// Pops the closure frame, returning the classes that escaped its body.
  pub fn exit_closure(&mut self) -> Result<Vec<String>, InternalError> {
    let frame = self.pop_frame()?;
    match frame.kind {
      FrameKind::Closure { escaped } => {
        trace!(?escaped, "exiting closure frame");
        Ok(escaped)
      }
      _ => Err(InternalError::ScopeUnderflow),
    }
  }

  pub fn enter_try(&mut self, catches: &[CatchClause]) {
    let observations = TryObservations {
      catches: catches
        .iter()
        .map(|clause| CatchObservations {
          types: clause
            .types
            .iter()
            .map(|class_name| CatchTypeObservation {
              class_name: class_name.clone(),
              observed: Vec::new(),
            })
            .collect(),
        })
        .collect(),
    };
    self.current_frame().try_stack.push(observations);
  }

  pub fn exit_try(&mut self) -> Result<TryObservations, InternalError> {
    self
      .current_frame()
      .try_stack
      .pop()
      .ok_or(InternalError::ScopeUnderflow)
  }

  /// Whether an exception thrown at the current position is handled before
  /// it would escape the enclosing callable. Records catch observations and
  /// annotation usage as side effects.
  ///
  /// A catch type that is a strict subtype of the thrown class observes it
  /// but does not contain it: the exception may still escape past it.
  pub fn is_caught(&mut self, registry: &Registry, thrown: &str) -> bool {
    let index = self.frames.len() - 1;
    let frame = &mut self.frames[index];

    for observations in frame.try_stack.iter_mut().rev() {
      for clause in &mut observations.catches {
        for entry in &mut clause.types {
          if registry.is_subtype_of(thrown, &entry.class_name) {
            if !entry.observed.contains(&thrown.to_string()) {
              entry.observed.push(thrown.to_string());
            }
            return true;
          }
          if registry.is_subtype_of(&entry.class_name, thrown)
            && !entry.observed.contains(&thrown.to_string())
          {
            entry.observed.push(thrown.to_string());
          }
        }
      }
    }

    match &mut frame.kind {
      FrameKind::Global => false,
      FrameKind::Callable { declared } => {
        let Some(declared) = declared else {
          return false;
        };
        for declared_class in declared.iter() {
          if registry.is_subtype_of(thrown, declared_class) {
            if !frame.used_annotations.contains(declared_class) {
              frame.used_annotations.push(declared_class.clone());
            }
            return true;
          }
        }
        false
      }
      FrameKind::Closure { escaped } => {
        if !escaped.contains(&thrown.to_string()) {
          escaped.push(thrown.to_string());
        }
        true
      }
    }
  }

  /// Classes from `thrown` that neither a try statement nor the enclosing
  /// callable's annotation handles, in input order.
  pub fn filter_uncaught(&mut self, registry: &Registry, thrown: Vec<String>) -> Vec<String> {
    thrown
      .into_iter()
      .filter(|class| !self.is_caught(registry, class))
      .collect()
  }

  fn current_frame(&mut self) -> &mut Frame {
    // The global frame is never popped, so the stack is never empty.
    let index = self.frames.len() - 1;
    &mut self.frames[index]
  }

  fn pop_frame(&mut self) -> Result<Frame, InternalError> {
    if self.frames.len() <= 1 {
      return Err(InternalError::ScopeUnderflow);
    }
    self.frames.pop().ok_or(InternalError::ScopeUnderflow)
  }
}
