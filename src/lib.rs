//! # zest
//!
//! **zest** is a small request dispatcher: declare routes as path templates
//! bound to handler names, and every request is run through one linear
//! lifecycle that ends in a response or in an ordered error-handler
//! cascade. It is served over `may_minihttp` coroutines.
//!
//! ## Architecture
//!
//! Leaf first:
//!
//! - **[`pattern`]** - compiles templates (`/users/:id`, `/files/**`,
//!   `/img/*.png`) and raw `^...` patterns into anchored matchers
//! - **[`router`]** - the ordered, append-only [`RouteTable`] with GET to
//!   HEAD mirroring and first-match-wins resolution
//! - **[`dispatcher`]** - the lifecycle: method check, route lookup,
//!   parameter binding, late handler resolution, hooks, invocation, output
//! - **[`cascade`]** - [`halt!`], condition classification, the notice log
//!   and the error handler registry with its default handler
//!
//! Collaborators used by the lifecycle:
//!
//! - **[`request`]** - the per-request environment snapshot
//! - **[`render`]** - `minijinja` views, layouts and the built-in error pages
//! - **[`static_files`]** - MIME table, safe path mapping, chunked copy
//! - **[`session`]** and **[`flash`]** - session storage and flash messages
//! - **[`config`]**, **[`logging`]**, **[`server`]**, **[`cli`]**
//!
//! ## Request flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as server::AppService
//!     participant Dispatcher
//!     participant Router as RouteTable
//!     participant Handler
//!     participant Cascade as ErrorCascade
//!
//!     Client->>Server: HTTP request
//!     Server->>Dispatcher: run(RequestEnv)
//!     Dispatcher->>Dispatcher: method check (501)
//!     Dispatcher->>Router: find(method, uri)
//!     Router-->>Dispatcher: RouteMatch or none (404)
//!     Dispatcher->>Dispatcher: resolve handler name (500)
//!     Dispatcher->>Handler: call(ctx, args)
//!     Handler-->>Dispatcher: Ok(body) / Err(halt)
//!     Dispatcher->>Cascade: raise(condition) on any failure edge
//!     Cascade-->>Dispatcher: body
//!     Dispatcher-->>Server: Response
//!     Server-->>Client: status line, headers, body
//! ```
//!
//! ## Example
//!
//! ```rust
//! use zest::dispatcher::{Body, Dispatcher};
//! use zest::halt;
//! use zest::request::RequestEnv;
//!
//! let mut app = Dispatcher::default();
//! app.get("/users/:id", |_ctx, args| match args[0].as_deref() {
//!     Some("0") => Err(halt!(404, "no such user")),
//!     id => Ok(Some(Body::from(format!("user {}", id.unwrap_or_default())))),
//! })
//! .unwrap();
//!
//! let ok = app.run(RequestEnv::builder("GET", "/users/7").build());
//! assert_eq!((ok.status, ok.text()), (200, "user 7"));
//!
//! let missing = app.run(RequestEnv::builder("GET", "/users/0").build());
//! assert_eq!(missing.status, 404);
//! ```

pub mod cascade;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod flash;
pub mod ids;
pub mod logging;
pub mod params;
pub mod pattern;
pub mod render;
pub mod request;
pub mod router;
pub mod server;
pub mod session;
pub mod static_files;
pub mod status;

pub use cascade::{Condition, ErrorCascade, Halt};
pub use config::AppConfig;
pub use dispatcher::{Body, DispatchContext, Dispatcher, HandlerResult, Response};
pub use params::{ParamBindings, ParamName};
pub use request::RequestEnv;
pub use router::{RouteMatch, RouteOptions, RouteTable};
