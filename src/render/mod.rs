//! # Rendering
//!
//! [`View`] wraps a `minijinja` environment. Application templates live in
//! the configured views directory and are found by relative name; a name
//! with no matching file is treated as an inline template, so handlers can
//! render short strings without a file:
//!
//! ```rust
//! use serde_json::{json, Map, Value};
//! use zest::render::View;
//!
//! let view = View::new(None);
//! let mut vars = Map::new();
//! vars.insert("name".into(), json!("<b>jane</b>"));
//! let out = view.render("Hello {{ name | h }}", &vars).unwrap();
//! assert_eq!(out, "Hello &lt;b&gt;jane&lt;/b&gt;");
//! ```
//!
//! Nothing is escaped automatically. The `h` filter escapes `&`, `<` and
//! `>`; the `url_for(...)` function builds encoded links.
//!
//! Error pages and the development notices block use templates embedded in
//! the crate ([`ERROR_TEMPLATE`], [`LAYOUT_TEMPLATE`], [`NOTICES_TEMPLATE`]).

mod core;

pub use core::{
    h, url_for, RenderError, View, ERROR_TEMPLATE, LAYOUT_TEMPLATE, NOTICES_TEMPLATE,
};
