//! # CLI
//!
//! The `zest` binary works from a configuration file (YAML or TOML, see
//! [`AppConfig`](crate::config::AppConfig)) that declares routes by handler
//! name:
//!
//! ```yaml
//! env: development
//! public_dir: ./public
//! routes:
//!   - { path: "/hello/:name", handler: echo }
//!   - { path: "/assets/**", handler: public }
//!   - { path: "/about", handler: "view:about.html" }
//!   - { method: POST, path: "/items", handler: create_item }
//! ```
//!
//! | Command | Does |
//! |---|---|
//! | `zest serve --config app.yaml [--addr 0.0.0.0:8080]` | serve the routes over HTTP |
//! | `zest routes --config app.yaml` | print method, template, matcher, names and handler per route |
//! | `zest match --config app.yaml GET /hello/jane` | resolve one request offline |
//!
//! Handler names resolve to the built-ins `echo`, `public` and
//! `view:<template>`; any other name stays unresolved and answers `500`.

mod builtins;
mod commands;


pub use builtins::{builtin_handler, VIEW_PREFIX};
pub use commands::{
    build_dispatcher, load_config, match_report, routes_report, run_cli, Cli, Commands,
};
