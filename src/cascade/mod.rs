//! # Error Cascade
//!
//! Every failure edge of a dispatch ends up here, as does any [`Condition`]
//! an application raises with [`halt!`](crate::halt).
//!
//! ## Classification
//!
//! A fixed set of condition numbers (warnings, user notices, deprecations)
//! is **non-fatal**: the condition is appended to the dispatch's
//! [`NoticeLog`] and the dispatch continues. Every other number is fatal and
//! walks the ordered handler registry:
//!
//! 1. entries in registration order; an entry accepts a condition when its
//!    [`MatchSet`] holds the number itself, the [`ANY_RUNTIME_ERROR`] marker,
//!    or the [`ANY_HTTP_STATUS`] marker and the number is a valid HTTP status
//! 2. the built-in default handler, which accepts everything
//!
//! The first accepting entry renders the response body and the dispatch
//! terminates.
//!
//! ## Default handler
//!
//! Answers with the condition number as status when it is a valid HTTP
//! status and with `500` otherwise. `404` renders a "Page not found" page
//! showing the decoded path; everything else renders the diagnostic error
//! page. Both are replaceable through [`ErrorCascade::set_not_found`] and
//! [`ErrorCascade::set_server_error`], and the surrounding layout through
//! [`ErrorCascade::set_layout`].
//!
//! ## Example
//!
//! ```rust
//! use zest::cascade::{Condition, ErrorCascade, ANY_HTTP_STATUS};
//! use zest::dispatcher::Body;
//!
//! let mut cascade = ErrorCascade::new();
//! cascade.error(ANY_HTTP_STATUS, |ctx, c: &Condition| {
//!     ctx.status(c.http_status());
//!     Body::from(format!("oops: {}", c.message))
//! });
//! assert_eq!(cascade.entries().count(), 2);
//! ```

pub mod condition;
mod core;
mod notice;
#[cfg(test)]
mod tests;

pub use condition::{
    halt, is_non_fatal, type_name, Condition, HaltArg, ANY_HTTP_STATUS, ANY_RUNTIME_ERROR,
    FRAMEWORK_DEPRECATED, RUNTIME_ERROR,
};
pub use core::{ErrorCascade, ErrorHandler, ErrorHandlerEntry, Flow, MatchSet};
pub use notice::{Notice, NoticeLog};

/// Value a handler returns to stop the dispatch through the cascade.
pub type Halt = Condition;
