use super::condition::{Condition, ANY_HTTP_STATUS, ANY_RUNTIME_ERROR};
use super::notice::Notice;
use crate::dispatcher::{Body, DispatchContext};
use crate::render::{self, RenderError};
use crate::status;
use serde_json::json;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Error handler callable: receives the dispatch context and the condition,
/// returns the body to emit.
pub type ErrorHandler = Arc<dyn Fn(&mut DispatchContext, &Condition) -> Body + Send + Sync>;

/// Condition numbers an error handler entry answers to.
///
/// Besides plain numbers the set may hold [`ANY_RUNTIME_ERROR`] (matches
/// everything) and [`ANY_HTTP_STATUS`] (matches any valid HTTP status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSet(SmallVec<[u32; 4]>);

impl MatchSet {
    #[must_use]
    pub fn numbers(&self) -> &[u32] {
        &self.0
    }

    /// Whether a condition `number` is accepted by this set.
    #[inline]
    #[must_use]
    pub fn accepts(&self, number: u32, is_http_status: bool) -> bool {
        self.0.iter().any(|&candidate| {
            candidate == number
                || candidate == ANY_RUNTIME_ERROR
                || (candidate == ANY_HTTP_STATUS && is_http_status)
        })
    }
}

impl From<u32> for MatchSet {
    fn from(number: u32) -> Self {
        MatchSet(smallvec::smallvec![number])
    }
}

impl From<u16> for MatchSet {
    fn from(number: u16) -> Self {
        MatchSet::from(u32::from(number))
    }
}

impl<const N: usize> From<[u32; N]> for MatchSet {
    fn from(numbers: [u32; N]) -> Self {
        MatchSet(numbers.into_iter().collect())
    }
}

impl From<Vec<u32>> for MatchSet {
    fn from(numbers: Vec<u32>) -> Self {
        MatchSet(numbers.into_iter().collect())
    }
}

impl From<&[u32]> for MatchSet {
    fn from(numbers: &[u32]) -> Self {
        MatchSet(numbers.iter().copied().collect())
    }
}

#[derive(Clone)]
enum Target {
    Custom(ErrorHandler),
    Default,
}

/// One registered error handler.
#[derive(Clone)]
pub struct ErrorHandlerEntry {
    matches: MatchSet,
    target: Target,
}

impl ErrorHandlerEntry {
    #[must_use]
    pub fn match_set(&self) -> &MatchSet {
        &self.matches
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self.target, Target::Default)
    }
}

impl fmt::Debug for ErrorHandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandlerEntry")
            .field("matches", &self.matches)
            .field("default", &self.is_default())
            .finish()
    }
}

/// What the dispatcher does after a condition was raised.
#[derive(Debug)]
pub enum Flow {
    /// Non-fatal: recorded as a notice, execution goes on.
    Continue,
    /// Fatal: the handler's body is the response body.
    Halted(Body),
}

/// Ordered error handler registry.
///
/// Entries are tried in registration order; the built-in default handler is
/// always tried last and accepts every condition, so a fatal condition
/// always yields a body.
#[derive(Clone)]
pub struct ErrorCascade {
    entries: Vec<ErrorHandlerEntry>,
    fallback: ErrorHandlerEntry,
    not_found: Option<ErrorHandler>,
    server_error: Option<ErrorHandler>,
    layout: Option<String>,
}

impl Default for ErrorCascade {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorCascade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorCascade")
            .field("entries", &self.entries)
            .field("not_found_override", &self.not_found.is_some())
            .field("server_error_override", &self.server_error.is_some())
            .field("layout", &self.layout)
            .finish()
    }
}

impl ErrorCascade {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            fallback: ErrorHandlerEntry {
                matches: MatchSet::from(ANY_RUNTIME_ERROR),
                target: Target::Default,
            },
            not_found: None,
            server_error: None,
            layout: None,
        }
    }

    /// Register `handler` for the condition numbers in `matches`.
    pub fn error<M, F>(&mut self, matches: M, handler: F)
    where
        M: Into<MatchSet>,
        F: Fn(&mut DispatchContext, &Condition) -> Body + Send + Sync + 'static,
    {
        let matches = matches.into();
        debug!(matches = ?matches.numbers(), position = self.entries.len(), "Error handler registered");
        self.entries.push(ErrorHandlerEntry {
            matches,
            target: Target::Custom(Arc::new(handler)),
        });
    }

    /// Replace the body the default handler produces for `404`.
    pub fn set_not_found<F>(&mut self, handler: F)
    where
        F: Fn(&mut DispatchContext, &Condition) -> Body + Send + Sync + 'static,
    {
        self.not_found = Some(Arc::new(handler));
    }

    /// Replace the body the default handler produces for everything but `404`.
    pub fn set_server_error<F>(&mut self, handler: F)
    where
        F: Fn(&mut DispatchContext, &Condition) -> Body + Send + Sync + 'static,
    {
        self.server_error = Some(Arc::new(handler));
    }

    /// Layout template (from the views directory) wrapped around the default
    /// error pages. `None` restores the built-in layout.
    pub fn set_layout(&mut self, layout: Option<String>) {
        self.layout = layout;
    }

    #[must_use]
    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    /// Registered entries in lookup order, the default handler last.
    pub fn entries(&self) -> impl Iterator<Item = &ErrorHandlerEntry> {
        self.entries.iter().chain(std::iter::once(&self.fallback))
    }

    /// Drop every user registration and override.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Classify and handle a condition.
    ///
    /// Non-fatal numbers go to the notice log. Anything else walks the
    /// registry and the first accepting entry renders the body.
    pub fn raise(&self, ctx: &mut DispatchContext, mut condition: Condition) -> Flow {
        if condition.is_non_fatal() {
            debug!(
                request_id = %ctx.request_id(),
                condition = condition.number,
                kind = condition.type_name(),
                message = %condition.message,
                "Notice recorded"
            );
            ctx.notices_mut().push(Notice::from(condition));
            return Flow::Continue;
        }

        if condition.message.is_empty() && condition.number == u32::from(status::NOT_FOUND) {
            condition.message = ctx.env().request_uri();
        }

        let is_http = condition.is_http_status();
        warn!(
            request_id = %ctx.request_id(),
            condition = condition.number,
            kind = condition.type_name(),
            message = %condition.message,
            file = condition.file.as_deref().unwrap_or(""),
            line = condition.line.unwrap_or(0),
            "Condition raised"
        );

        let entry = self
            .entries()
            .find(|e| e.matches.accepts(condition.number, is_http))
            .unwrap_or(&self.fallback);
        let body = match &entry.target {
            Target::Custom(handler) => handler(ctx, &condition),
            Target::Default => self.default_handler(ctx, &condition),
        };
        Flow::Halted(body)
    }

    /// Built-in catch-all: answers with the condition's status when it is a
    /// valid HTTP status, `500` otherwise.
    fn default_handler(&self, ctx: &mut DispatchContext, condition: &Condition) -> Body {
        let code = condition.http_status();
        ctx.status(code);

        if code == status::NOT_FOUND {
            match &self.not_found {
                Some(handler) => handler(ctx, condition),
                None => self.not_found_output(ctx, condition),
            }
        } else {
            match &self.server_error {
                Some(handler) => handler(ctx, condition),
                None => self.server_error_output(ctx, condition),
            }
        }
    }

    fn not_found_output(&self, ctx: &mut DispatchContext, condition: &Condition) -> Body {
        let path = urlencoding::decode(&condition.message)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| condition.message.clone());
        let content = format!(
            "<h1>Page not found:</h1><p><code>{}</code></p>",
            render::h(&path)
        );
        ctx.set_content_type("text/html");
        Body::Text(self.wrap_in_layout(ctx, content))
    }

    fn server_error_output(&self, ctx: &mut DispatchContext, condition: &Condition) -> Body {
        let verbose = ctx.config().shows_notices();
        let vars = json!({
            "errno": condition.number,
            "errstr": condition.message,
            "errfile": condition.file,
            "errline": condition.line,
            "is_http_error": condition.is_http_status(),
            "type_name": condition.type_name(),
            "status": condition.http_status(),
            "reason": status::reason(u32::from(condition.http_status())),
            "debug": condition
                .debug
                .as_ref()
                .filter(|_| verbose)
                .and_then(|d| serde_json::to_string_pretty(d).ok()),
            "verbose": verbose,
        });
        let content = ctx
            .view()
            .render_builtin(render::ERROR_TEMPLATE, &vars)
            .unwrap_or_else(|err| {
                error!(error = %err, "Built-in error template failed to render");
                render::h(&condition.to_string())
            });
        ctx.set_content_type("text/html");
        Body::Text(self.wrap_in_layout(ctx, content))
    }

    fn wrap_in_layout(&self, ctx: &DispatchContext, content: String) -> String {
        let rendered: Result<String, RenderError> = ctx
            .view()
            .render_layout(self.layout.as_deref(), &content);
        rendered.unwrap_or_else(|err| {
            error!(error = %err, layout = ?self.layout, "Error layout failed to render");
            content
        })
    }
}
