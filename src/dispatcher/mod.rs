//! # Dispatcher
//!
//! The request lifecycle. [`Dispatcher::run`] takes one
//! [`RequestEnv`](crate::request::RequestEnv) through a fixed sequence of
//! states and always returns a [`Response`]:
//!
//! ```text
//! METHOD_CHECK -> ROUTE_LOOKUP -> PARAM_BIND -> HANDLER_RESOLVE
//!     -> PRE_HOOK -> INVOKE -> POST_HOOK -> OUTPUT -> TERMINATE
//! ```
//!
//! | Edge | Condition |
//! |---|---|
//! | method is not GET, HEAD, POST, PUT or DELETE (after POST overrides) | `501` |
//! | no route matches (and no `route_missing` hook) | `404` `(<METHOD>) <uri>` |
//! | the route's handler name resolves to nothing | `500` `Routing error: undefined function '<name>'` |
//! | the handler returns `Err(halt)` | the halt's number |
//! | the handler panics | `65536`, rendered as `500` |
//!
//! Every escape goes through the [`ErrorCascade`](crate::cascade::ErrorCascade)
//! and then to TERMINATE, which always runs: `before_exit` hook, flash sweep,
//! session save, signature and request id headers. HEAD requests run the
//! whole pipeline and have their body dropped at the end.
//!
//! ## Handlers
//!
//! Routes name their handler; names resolve through a
//! [`HandlerRegistry`] when a request reaches the route, so a route may be
//! declared before its handler exists. Handlers receive the bound values in
//! declared-name order:
//!
//! ```rust
//! use zest::dispatcher::{Body, Dispatcher};
//! use zest::request::RequestEnv;
//! use zest::router::RouteOptions;
//!
//! let mut app = Dispatcher::default();
//! app.dispatch_get("/hello/:name", "hello", RouteOptions::new()).unwrap();
//! app.handler("hello", |_ctx, args| {
//!     let name = args[0].as_deref().unwrap_or("nobody");
//!     Ok(Some(Body::from(format!("Hello {name}"))))
//! });
//!
//! let response = app.run(RequestEnv::builder("GET", "/hello/jane").build());
//! assert_eq!(response.status, 200);
//! assert_eq!(response.text(), "Hello jane");
//! ```

mod context;
mod core;
mod handler;
mod response;

pub use context::DispatchContext;
pub use core::{
    AfterHook, AutorenderHook, BeforeExitHook, BeforeHook, Dispatcher, RouteMissingHook,
};
pub use handler::{Autoload, Handler, HandlerRegistry, HandlerResult, SharedHandler};
pub use response::{Body, HeaderVec, Response, MAX_INLINE_HEADERS};
