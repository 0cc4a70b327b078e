//! Handlers that declarative routes can name without any code.

use crate::dispatcher::{DispatchContext, HandlerResult, SharedHandler};
use crate::halt;
use crate::static_files::StaticFiles;
use crate::status;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Prefix of the template-rendering handler names.
pub const VIEW_PREFIX: &str = "view:";

/// Resolve a built-in handler name: `echo`, `public` or `view:<template>`.
#[must_use]
pub fn builtin_handler(name: &str) -> Option<SharedHandler> {
    if name == "echo" {
        return Some(Arc::new(echo));
    }
    if name == "public" {
        return Some(Arc::new(public));
    }
    let template = name.strip_prefix(VIEW_PREFIX)?;
    if template.is_empty() {
        return None;
    }
    let template = template.to_owned();
    let handler = move |ctx: &mut DispatchContext, _args: &[Option<String>]| -> HandlerResult {
        let locals: Map<String, Value> = ctx
            .params()
            .iter()
            .map(|(name, value)| (name.key(), value.map_or(Value::Null, Value::from)))
            .collect();
        ctx.html(&template, locals)
    };
    Some(Arc::new(handler))
}

/// The bindings, the handler arguments and the request URI as JSON.
fn echo(ctx: &mut DispatchContext, args: &[Option<String>]) -> HandlerResult {
    let body = json!({
        "handler": ctx.route().map(|r| r.handler_name().to_owned()),
        "uri": ctx.env().request_uri(),
        "params": ctx.params(),
        "args": args,
    });
    ctx.json(&body)
}

/// Stream the file of the public directory named by the first argument.
fn public(ctx: &mut DispatchContext, args: &[Option<String>]) -> HandlerResult {
    let requested = args.first().cloned().flatten().unwrap_or_default();
    let resolved = ctx
        .config()
        .public_dir
        .as_ref()
        .and_then(|dir| StaticFiles::new(dir.clone()).resolve(&requested));
    match resolved {
        Some(path) => ctx.render_file(path),
        None => Err(halt!(
            status::NOT_FOUND,
            format!("unknown filename {requested}")
        )),
    }
}
