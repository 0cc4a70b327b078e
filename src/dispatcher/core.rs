use super::context::DispatchContext;
use super::handler::{Autoload, HandlerRegistry, HandlerResult, SharedHandler};
use super::response::{Body, Response};
use crate::cascade::{Condition, ErrorCascade, Flow, Halt, MatchSet, RUNTIME_ERROR};
use crate::config::AppConfig;
use crate::halt;
use crate::ids::RequestId;
use crate::pattern::RoutePath;
use crate::render::{self, View};
use crate::request::RequestEnv;
use crate::router::{RouteError, RouteMatch, RouteOptions, RouteTable};
use crate::session::{MemorySessionStore, Session, SessionStore};
use crate::status;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Runs before the handler; side effects only.
pub type BeforeHook = Arc<dyn Fn(&mut DispatchContext, &RouteMatch) + Send + Sync>;
/// Transforms the output before it is emitted.
pub type AfterHook = Arc<dyn Fn(&mut DispatchContext, Body, &RouteMatch) -> Body + Send + Sync>;
/// Produces output when the handler returned none.
pub type AutorenderHook = Arc<dyn Fn(&mut DispatchContext, &RouteMatch) -> HandlerResult + Send + Sync>;
/// Called with the method and URI when no route matches.
pub type RouteMissingHook = Arc<dyn Fn(&mut DispatchContext, &str, &str) -> HandlerResult + Send + Sync>;
/// Runs at the end of every dispatch, whichever way it ended.
pub type BeforeExitHook = Arc<dyn Fn(&mut DispatchContext) + Send + Sync>;

/// The request lifecycle.
///
/// Configure it once (routes, handlers, error handlers, hooks), then call
/// [`Dispatcher::run`] for each request. `run` takes `&self`: every piece of
/// per-request state lives on the [`DispatchContext`] it creates, so one
/// dispatcher can serve concurrent requests.
pub struct Dispatcher {
    config: Arc<AppConfig>,
    view: Arc<View>,
    routes: RouteTable,
    cascade: ErrorCascade,
    handlers: HandlerRegistry,
    sessions: Arc<dyn SessionStore>,
    before: Option<BeforeHook>,
    after: Option<AfterHook>,
    autorender: Option<AutorenderHook>,
    route_missing: Option<RouteMissingHook>,
    before_exit: Option<BeforeExitHook>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.len())
            .field("cascade", &self.cascade)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let view = View::new(config.views_dir.clone());
        Self {
            config: Arc::new(config),
            view: Arc::new(view),
            routes: RouteTable::new(),
            cascade: ErrorCascade::new(),
            handlers: HandlerRegistry::new(),
            sessions: Arc::new(MemorySessionStore::new()),
            before: None,
            after: None,
            autorender: None,
            route_missing: None,
            before_exit: None,
        }
    }

    /// A dispatcher for `config`, with its declarative routes registered.
    ///
    /// # Errors
    ///
    /// A declared route does not compile.
    pub fn from_config(config: AppConfig) -> Result<Self, RouteError> {
        let routes = config.build_routes()?;
        let mut dispatcher = Self::new(config);
        dispatcher.routes = routes;
        Ok(dispatcher)
    }

    #[must_use]
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.sessions = store;
        self
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn routes_mut(&mut self) -> &mut RouteTable {
        &mut self.routes
    }

    #[must_use]
    pub fn cascade(&self) -> &ErrorCascade {
        &self.cascade
    }

    pub fn cascade_mut(&mut self) -> &mut ErrorCascade {
        &mut self.cascade
    }

    #[must_use]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    // ---- declarations ----

    /// Route `method` + `path` to the handler named `handler`. An unknown
    /// method is stored with a warning.
    ///
    /// # Errors
    ///
    /// Invalid method token or raw pattern.
    #[track_caller]
    pub fn route(
        &mut self,
        method: &str,
        path: impl Into<RoutePath>,
        handler: &str,
        options: RouteOptions,
    ) -> Result<(), RouteError> {
        self.routes.route(method, path, handler, options).map(drop)
    }

    /// Same as [`Dispatcher::dispatch_get`].
    ///
    /// # Errors
    ///
    /// Invalid raw pattern.
    pub fn dispatch(
        &mut self,
        path: impl Into<RoutePath>,
        handler: &str,
        options: RouteOptions,
    ) -> Result<(), RouteError> {
        self.dispatch_get(path, handler, options)
    }

    /// Route GET (and HEAD) `path` to the handler named `handler`.
    ///
    /// # Errors
    ///
    /// Invalid raw pattern.
    pub fn dispatch_get(
        &mut self,
        path: impl Into<RoutePath>,
        handler: &str,
        options: RouteOptions,
    ) -> Result<(), RouteError> {
        self.routes.dispatch_get(path, handler, options).map(drop)
    }

    /// # Errors
    ///
    /// Invalid raw pattern.
    pub fn dispatch_post(
        &mut self,
        path: impl Into<RoutePath>,
        handler: &str,
        options: RouteOptions,
    ) -> Result<(), RouteError> {
        self.routes.dispatch_post(path, handler, options).map(drop)
    }

    /// # Errors
    ///
    /// Invalid raw pattern.
    pub fn dispatch_put(
        &mut self,
        path: impl Into<RoutePath>,
        handler: &str,
        options: RouteOptions,
    ) -> Result<(), RouteError> {
        self.routes.dispatch_put(path, handler, options).map(drop)
    }

    /// # Errors
    ///
    /// Invalid raw pattern.
    pub fn dispatch_delete(
        &mut self,
        path: impl Into<RoutePath>,
        handler: &str,
        options: RouteOptions,
    ) -> Result<(), RouteError> {
        self.routes.dispatch_delete(path, handler, options).map(drop)
    }

    /// Register a handler under `name`.
    pub fn handler<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut DispatchContext, &[Option<String>]) -> HandlerResult + Send + Sync + 'static,
    {
        self.handlers.register(name, handler);
        self
    }

    /// Resolver for handler names not registered by the time a request
    /// reaches them.
    pub fn autoload<F>(&mut self, resolver: F) -> &mut Self
    where
        F: Fn(&str) -> Option<SharedHandler> + Send + Sync + 'static,
    {
        let resolver: Autoload = Arc::new(resolver);
        self.handlers.set_autoload(resolver);
        self
    }

    /// Route GET `path` to `handler`, registered under the name `GET <path>`.
    ///
    /// # Errors
    ///
    /// Invalid pattern.
    pub fn get<F>(&mut self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut DispatchContext, &[Option<String>]) -> HandlerResult + Send + Sync + 'static,
    {
        let name = format!("GET {path}");
        self.handlers.register(&name, handler);
        self.dispatch_get(path, &name, RouteOptions::new())
    }

    /// # Errors
    ///
    /// Invalid pattern.
    pub fn post<F>(&mut self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut DispatchContext, &[Option<String>]) -> HandlerResult + Send + Sync + 'static,
    {
        let name = format!("POST {path}");
        self.handlers.register(&name, handler);
        self.dispatch_post(path, &name, RouteOptions::new())
    }

    /// # Errors
    ///
    /// Invalid pattern.
    pub fn put<F>(&mut self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut DispatchContext, &[Option<String>]) -> HandlerResult + Send + Sync + 'static,
    {
        let name = format!("PUT {path}");
        self.handlers.register(&name, handler);
        self.dispatch_put(path, &name, RouteOptions::new())
    }

    /// # Errors
    ///
    /// Invalid pattern.
    pub fn delete<F>(&mut self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut DispatchContext, &[Option<String>]) -> HandlerResult + Send + Sync + 'static,
    {
        let name = format!("DELETE {path}");
        self.handlers.register(&name, handler);
        self.dispatch_delete(path, &name, RouteOptions::new())
    }

    /// Register an error handler; see [`ErrorCascade::error`].
    pub fn error<M, F>(&mut self, matches: M, handler: F) -> &mut Self
    where
        M: Into<MatchSet>,
        F: Fn(&mut DispatchContext, &Condition) -> Body + Send + Sync + 'static,
    {
        self.cascade.error(matches, handler);
        self
    }

    // ---- hooks ----

    pub fn before<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut DispatchContext, &RouteMatch) + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(hook));
        self
    }

    pub fn after<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut DispatchContext, Body, &RouteMatch) -> Body + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(hook));
        self
    }

    pub fn autorender<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut DispatchContext, &RouteMatch) -> HandlerResult + Send + Sync + 'static,
    {
        self.autorender = Some(Arc::new(hook));
        self
    }

    pub fn route_missing<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut DispatchContext, &str, &str) -> HandlerResult + Send + Sync + 'static,
    {
        self.route_missing = Some(Arc::new(hook));
        self
    }

    pub fn before_exit<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut DispatchContext) + Send + Sync + 'static,
    {
        self.before_exit = Some(Arc::new(hook));
        self
    }

    // ---- lifecycle ----

    /// Dispatch one request.
    ///
    /// Always produces a response: every failure edge ends in the error
    /// cascade, whose default handler accepts any condition.
    pub fn run(&self, env: RequestEnv) -> Response {
        let started = Instant::now();
        let request_id = RequestId::parse_or_new(env.header("x-request-id"));
        let mut ctx = DispatchContext::new(
            request_id,
            env,
            Arc::clone(&self.config),
            Arc::clone(&self.view),
        );
        debug!(
            request_id = %request_id,
            method = %ctx.env().raw_method(),
            path = %ctx.env().raw_path(),
            "Dispatch start"
        );

        // Warnings raised while the routes were declared.
        ctx.notices_mut()
            .extend(self.routes.notices().entries().iter().cloned());

        if let Some(cookie_name) = &self.config.session {
            let cookie = ctx.env().cookie(cookie_name).map(str::to_owned);
            let session = Session::start(self.sessions.as_ref(), cookie.as_deref());
            ctx.start_session(session);
        }

        let body = match self.lifecycle(&mut ctx) {
            Ok(body) => body,
            Err(condition) => match self.cascade.raise(&mut ctx, condition) {
                Flow::Halted(body) => body,
                Flow::Continue => Body::Empty,
            },
        };
        self.terminate(ctx, body, started)
    }

    /// Method check through post-hook. Any `Err` goes to the cascade.
    fn lifecycle(&self, ctx: &mut DispatchContext) -> Result<Body, Halt> {
        let Some(method) = ctx.request_method() else {
            let requested = ctx
                .env()
                .effective_method()
                .map_or_else(|token| token, |m| m.to_string());
            return Err(halt!(
                status::NOT_IMPLEMENTED,
                format!(
                    "The requested method <code>'{}'</code> is not implemented",
                    render::h(&requested)
                )
            ));
        };

        let uri = ctx.env().request_uri();
        let Some(route) = self.routes.find(method.as_str(), &uri) else {
            return match &self.route_missing {
                Some(hook) => Ok(hook(ctx, method.as_str(), &uri)?.unwrap_or_default()),
                None => Err(halt!(status::NOT_FOUND, format!("({method}) {uri}"))),
            };
        };
        ctx.bind(route.clone());

        let handler_name = route.handler_name();
        let Some(handler) = self.handlers.resolve(handler_name) else {
            error!(
                request_id = %ctx.request_id(),
                handler_name = %handler_name,
                "Handler missing"
            );
            return Err(halt!(
                status::SERVER_ERROR,
                format!("Routing error: undefined function '{handler_name}'")
            ));
        };
        debug!(request_id = %ctx.request_id(), handler_name = %handler_name, "Handler resolved");

        if let Some(before) = &self.before {
            before(ctx, &route);
        }

        let args = route.args();
        let invoked = Instant::now();
        let output = match panic::catch_unwind(AssertUnwindSafe(|| handler.call(ctx, &args))) {
            Ok(Ok(output)) => output,
            Ok(Err(condition)) => {
                ctx.trigger(condition)?;
                None
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(
                    request_id = %ctx.request_id(),
                    handler_name = %handler_name,
                    panic_message = %message,
                    "Handler panicked"
                );
                return Err(Condition::detached(
                    RUNTIME_ERROR,
                    format!("Handler '{handler_name}' panicked: {message}"),
                ));
            }
        };
        debug!(
            request_id = %ctx.request_id(),
            handler_name = %handler_name,
            execution_us = invoked.elapsed().as_micros() as u64,
            "Handler returned"
        );

        let output = match output {
            Some(body) => body,
            None => match &self.autorender {
                Some(autorender) => match autorender(ctx, &route) {
                    Ok(body) => body.unwrap_or_default(),
                    Err(condition) => {
                        ctx.trigger(condition)?;
                        Body::Empty
                    }
                },
                None => Body::Empty,
            },
        };
        let output = self.append_notices(ctx, output);
        Ok(match &self.after {
            Some(after) => after(ctx, output, &route),
            None => output,
        })
    }

    /// In development, the notice log goes at the end of text bodies.
    fn append_notices(&self, ctx: &mut DispatchContext, body: Body) -> Body {
        if !self.config.shows_notices() || ctx.notices().is_empty() {
            return body;
        }
        let mut text = match body {
            Body::Empty => String::new(),
            Body::Text(text) => text,
            other => return other,
        };
        let notices = ctx.notices_mut().take();
        match ctx.view().render_notices(&notices) {
            Ok(block) => text.push_str(&block),
            Err(err) => warn!(request_id = %ctx.request_id(), error = %err, "Notices failed to render"),
        }
        Body::Text(text)
    }

    /// Cleanup that runs however the dispatch ended.
    fn terminate(&self, mut ctx: DispatchContext, body: Body, started: Instant) -> Response {
        if let Some(before_exit) = &self.before_exit {
            before_exit(&mut ctx);
        }

        if let Some(session_id) = ctx.finish_session(self.sessions.as_ref()) {
            if let Some(cookie_name) = &self.config.session {
                ctx.set_header(
                    "Set-Cookie",
                    format!("{cookie_name}={session_id}; Path=/; HttpOnly"),
                );
            }
        }
        if let Some(signature) = &self.config.signature {
            ctx.set_header("X-Zest", signature.as_str());
        }
        let request_id = ctx.request_id();
        ctx.set_header("X-Request-Id", request_id.to_string());

        let body = if ctx.env().is_head() { Body::Empty } else { body };
        let status = ctx.response_status();
        info!(
            request_id = %request_id,
            method = %ctx.env().raw_method(),
            path = %ctx.env().raw_path(),
            handler_name = ctx.route().map_or("", RouteMatch::handler_name),
            status,
            notices = ctx.notices().len(),
            duration_us = started.elapsed().as_micros() as u64,
            "Response emitted"
        );

        Response {
            status,
            headers: ctx.take_headers(),
            body,
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
