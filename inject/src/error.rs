use crate::key::{Key, Tag};

/// Convenience alias used throughout the crate.
pub type Result<T, E = InjectError> = std::result::Result<T, E>;

/// Broad category of an [`InjectError`].
///
/// Every error is a configuration or programming mistake; none of them is
/// expected in a correctly wired program, and callers are expected to
/// propagate them rather than retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// A key, scope tag or map entry was bound a second time.
  DuplicateBinding,
  /// Nothing reachable is bound to the requested key or scope tag.
  Unbound,
  /// A container was asked for a key it already looked up.
  RepeatedLookup,
  /// A scope was used outside of an entered context, or entered/exited wrongly.
  ScopeMisuse,
  /// `expose` was called without a parent or without a local binding.
  Exposure,
  /// A resolved instance did not have the requested type.
  TypeMismatch,
}

/// Errors raised while configuring an injector or resolving from a container.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InjectError {
  #[error("{key} is already bound")]
  DuplicateBinding { key: Key },

  #[error("scope is already bound for tag '{tag}'")]
  DuplicateScope { tag: Tag },

  #[error("map {key} already has an entry for '{entry}'")]
  DuplicateMapEntry { key: Key, entry: Tag },

  #[error("unable to find {key} in injector")]
  UnboundKey { key: Key },

  #[error("scope tag '{tag}' is not bound")]
  UnboundScope { tag: Tag },

  #[error("already looked up {key}; is there a cycle of dependencies?")]
  RepeatedLookup { key: Key },

  #[error("attempt to access {key} outside of scope {scope}")]
  OutOfScope { scope: String, key: Key },

  #[error("context is already entered in scope {scope}")]
  AlreadyEntered { scope: String },

  #[error("context is not entered in scope {scope}")]
  NotEntered { scope: String },

  #[error("the singleton scope is always entered and cannot be entered or exited")]
  SingletonLifecycle,

  #[error("no parent injector available when exposing {key}")]
  NoParent { key: Key },

  #[error("no binding for {key} is present in this injector")]
  NotBoundLocally { key: Key },

  #[error("instance bound to {key} is not a {expected}")]
  TypeMismatch { key: Key, expected: &'static str },
}

impl InjectError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      InjectError::DuplicateBinding { .. }
      | InjectError::DuplicateScope { .. }
      | InjectError::DuplicateMapEntry { .. } => ErrorKind::DuplicateBinding,
      InjectError::UnboundKey { .. } | InjectError::UnboundScope { .. } => ErrorKind::Unbound,
      InjectError::RepeatedLookup { .. } => ErrorKind::RepeatedLookup,
      InjectError::OutOfScope { .. }
      | InjectError::AlreadyEntered { .. }
      | InjectError::NotEntered { .. }
      | InjectError::SingletonLifecycle => ErrorKind::ScopeMisuse,
      InjectError::NoParent { .. } | InjectError::NotBoundLocally { .. } => ErrorKind::Exposure,
      InjectError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
    }
  }
}
