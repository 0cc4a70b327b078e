//! # Router Module
//!
//! Route declaration and resolution.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling declared templates (see [`crate::pattern`]) into a [`RouteTable`]
//! - Mirroring every GET route as a HEAD route with the same matcher
//! - Resolving an incoming `(method, path)` to the **first** matching route
//! - Reconciling captured groups with the route's parameter names
//!
//! ## First match wins
//!
//! The table is scanned in registration order. Two routes for the same
//! method and template both stay in the table, but only the earlier one can
//! ever be selected. Matching is linear in the number of routes.
//!
//! ## Parameter binding
//!
//! 1. The whole-match group is discarded.
//! 2. If the route declares more names than groups were captured, the
//!    captures are padded with `None`.
//! 3. If more groups were captured than names declared, the surplus gets
//!    positional names `n, n+1, ...` where `n` is the declared count.
//! 4. The route's default params are the base; captures are laid over them,
//!    but a `None` never removes a default.
//!
//! ## Example
//!
//! ```rust
//! use zest::router::{RouteOptions, RouteTable};
//!
//! let mut table = RouteTable::new();
//! table.dispatch_get("/users/:id", "show_user", RouteOptions::new()).unwrap();
//! table
//!     .dispatch_get("/pages/*", "show_page", RouteOptions::new().param("0", "home"))
//!     .unwrap();
//!
//! let m = table.find("GET", "/users/42").unwrap();
//! assert_eq!(m.handler_name(), "show_user");
//! assert_eq!(m.params.get("id"), Some("42"));
//!
//! // HEAD mirrors GET
//! assert!(table.find("head", "/users/42").is_some());
//! assert!(table.find("POST", "/users/42").is_none());
//! ```

mod core;

pub use core::{
    is_supported_method, Route, RouteError, RouteMatch, RouteOptions, RouteTable,
    SUPPORTED_METHODS,
};
