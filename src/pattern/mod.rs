//! # Pattern Module
//!
//! Compiles declarative path templates into anchored regular expressions and
//! the ordered list of parameter names they bind.
//!
//! ## Template grammar
//!
//! Templates are split on `/` and compiled one segment at a time; empty
//! segments are skipped, so `//users///:id` and `/users/:id` are the same
//! template.
//!
//! - `**` captures the rest of the path (slashes included) as one binding
//! - `*` captures one optional segment
//! - `:name` captures one non-empty segment under `name`
//! - a literal mixing text and `*` (e.g. `*.css`) captures the starred parts;
//!   all of them share a single positional index
//! - anything else is matched literally
//!
//! The empty template and `/` compile to a root matcher. Every template
//! matcher is case-insensitive and accepts a trailing slash.
//!
//! A path starting with `^` is a raw pattern: it is used as written (anchored
//! with `$` when missing) and its names come only from the explicit list.
//!
//! ## Example
//!
//! ```rust
//! use zest::pattern::{compile, RoutePath};
//!
//! let pattern = compile(&RoutePath::from("/users/:id")).unwrap();
//! assert_eq!(pattern.captures("/users/42"), Some(vec![Some("42".to_string())]));
//! assert!(pattern.captures("/users/").is_none());
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use core::{compile, CompiledPattern, PatternError, RoutePath, RAW_PATTERN_SENTINEL};
