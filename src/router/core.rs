//! Route table and first-match resolver.

use crate::cascade::{condition::USER_WARNING, Notice, NoticeLog};
use crate::params::{ParamBindings, ParamName};
use crate::pattern::{compile, CompiledPattern, PatternError, RoutePath};
use http::Method;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The verbs a route may be declared for without a warning.
pub const SUPPORTED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::HEAD,
];

/// Route matching slower than this is logged as a warning.
const SLOW_MATCH_THRESHOLD: Duration = Duration::from_millis(1);

/// Whether `method` is one of [`SUPPORTED_METHODS`].
#[inline]
#[must_use]
pub fn is_supported_method(method: &Method) -> bool {
    SUPPORTED_METHODS.contains(method)
}

/// Errors raised while declaring a route.
#[derive(Debug, Clone)]
pub enum RouteError {
    /// The method is not a valid HTTP token at all.
    InvalidMethod { method: String },
    /// A raw pattern failed to compile.
    Pattern(PatternError),
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::InvalidMethod { method } => write!(f, "invalid request method '{method}'"),
            RouteError::Pattern(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::InvalidMethod { .. } => None,
            RouteError::Pattern(err) => Some(err),
        }
    }
}

impl From<PatternError> for RouteError {
    fn from(err: PatternError) -> Self {
        RouteError::Pattern(err)
    }
}

/// Per-route options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// Bindings every match starts from; captures are laid over them.
    pub params: ParamBindings,
}

impl RouteOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a default binding.
    #[must_use]
    pub fn param(mut self, name: impl Into<ParamName>, value: impl Into<String>) -> Self {
        self.params.insert(name, Some(value.into()));
        self
    }
}

/// A declared route. Immutable once built.
#[derive(Debug)]
pub struct Route {
    method: Method,
    pattern: Arc<CompiledPattern>,
    handler: Arc<str>,
    options: Arc<RouteOptions>,
}

impl Route {
    #[inline]
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    /// Declared parameter names, in binding order.
    #[must_use]
    pub fn names(&self) -> &[ParamName] {
        self.pattern.names()
    }

    /// Name of the late-bound handler.
    #[inline]
    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.handler
    }

    #[must_use]
    pub fn options(&self) -> &RouteOptions {
        &self.options
    }
}

/// A successful resolution.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    /// Parameter names in handler-argument order: declared names, then
    /// synthesized positional names for surplus captures.
    pub names: Vec<ParamName>,
    /// Defaults with the captures laid over them.
    pub params: ParamBindings,
}

impl RouteMatch {
    /// Handler arguments: the bound values in [`RouteMatch::names`] order.
    #[must_use]
    pub fn args(&self) -> Vec<Option<String>> {
        self.params.values_for(&self.names)
    }

    #[inline]
    #[must_use]
    pub fn handler_name(&self) -> &str {
        self.route.handler_name()
    }
}

/// Ordered, append-only route collection. Insertion order is match priority.
#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
    notices: NoticeLog,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route.
    ///
    /// The method is uppercased. A method outside [`SUPPORTED_METHODS`] is
    /// still stored, with a `USER_WARNING` notice recorded in
    /// [`RouteTable::notices`]. Routes are never de-duplicated.
    ///
    /// # Errors
    ///
    /// [`RouteError::InvalidMethod`] when `method` is not an HTTP token,
    /// [`RouteError::Pattern`] when a raw pattern does not compile.
    #[track_caller]
    pub fn route(
        &mut self,
        method: &str,
        path: impl Into<RoutePath>,
        handler: &str,
        options: RouteOptions,
    ) -> Result<Arc<Route>, RouteError> {
        let method = parse_method(method)?;
        let pattern = Arc::new(compile(&path.into())?);
        Ok(self.push(method, pattern, Arc::from(handler), Arc::new(options)))
    }

    #[track_caller]
    fn push(
        &mut self,
        method: Method,
        pattern: Arc<CompiledPattern>,
        handler: Arc<str>,
        options: Arc<RouteOptions>,
    ) -> Arc<Route> {
        if !is_supported_method(&method) {
            warn!(
                method = %method,
                template = %pattern.template(),
                "Route declared for an unsupported request method"
            );
            self.notices.push(Notice::here(
                USER_WARNING,
                format!("'{method}' request method is unknown or unavailable."),
            ));
        }

        let route = Arc::new(Route {
            method,
            pattern,
            handler,
            options,
        });
        debug!(
            method = %route.method,
            template = %route.pattern.template(),
            matcher = %route.pattern.matcher(),
            handler_name = %route.handler,
            position = self.routes.len(),
            "Route registered"
        );
        self.routes.push(Arc::clone(&route));
        route
    }

    /// Alias of [`RouteTable::dispatch_get`].
    ///
    /// # Errors
    ///
    /// See [`RouteTable::route`].
    pub fn dispatch(
        &mut self,
        path: impl Into<RoutePath>,
        handler: &str,
        options: RouteOptions,
    ) -> Result<Arc<Route>, RouteError> {
        self.dispatch_get(path, handler, options)
    }

    /// Declare a GET route and its HEAD mirror. Both share one compiled
    /// matcher. Returns the GET route.
    ///
    /// # Errors
    ///
    /// See [`RouteTable::route`].
    pub fn dispatch_get(
        &mut self,
        path: impl Into<RoutePath>,
        handler: &str,
        options: RouteOptions,
    ) -> Result<Arc<Route>, RouteError> {
        let pattern = Arc::new(compile(&path.into())?);
        let handler: Arc<str> = Arc::from(handler);
        let options = Arc::new(options);
        let get = self.push(
            Method::GET,
            Arc::clone(&pattern),
            Arc::clone(&handler),
            Arc::clone(&options),
        );
        self.push(Method::HEAD, pattern, handler, options);
        Ok(get)
    }

    /// # Errors
    ///
    /// See [`RouteTable::route`].
    pub fn dispatch_post(
        &mut self,
        path: impl Into<RoutePath>,
        handler: &str,
        options: RouteOptions,
    ) -> Result<Arc<Route>, RouteError> {
        self.route("POST", path, handler, options)
    }

    /// # Errors
    ///
    /// See [`RouteTable::route`].
    pub fn dispatch_put(
        &mut self,
        path: impl Into<RoutePath>,
        handler: &str,
        options: RouteOptions,
    ) -> Result<Arc<Route>, RouteError> {
        self.route("PUT", path, handler, options)
    }

    /// # Errors
    ///
    /// See [`RouteTable::route`].
    pub fn dispatch_delete(
        &mut self,
        path: impl Into<RoutePath>,
        handler: &str,
        options: RouteOptions,
    ) -> Result<Arc<Route>, RouteError> {
        self.route("DELETE", path, handler, options)
    }

    /// Remove every route and recorded notice.
    pub fn reset(&mut self) {
        info!(routes_count = self.routes.len(), "Routing table reset");
        self.routes.clear();
        self.notices.clear();
    }

    #[must_use]
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Notices recorded while declaring routes.
    #[must_use]
    pub fn notices(&self) -> &NoticeLog {
        &self.notices
    }

    /// Resolve `(method, path)` to the earliest registered matching route.
    ///
    /// Method comparison is case-insensitive. On a match the captures are
    /// reconciled with the declared names: missing captures are padded with
    /// `None`, surplus captures get positional names following the declared
    /// count. The route's default params are the base; a `None` binding
    /// never replaces a default.
    #[must_use]
    pub fn find(&self, method: &str, path: &str) -> Option<RouteMatch> {
        debug!(method = %method, path = %path, routes_count = self.routes.len(), "Route match attempt");
        let started = Instant::now();

        let found = self.routes.iter().find_map(|route| {
            if !route.method.as_str().eq_ignore_ascii_case(method) {
                return None;
            }
            route
                .pattern
                .captures(path)
                .map(|captures| bind(route, captures))
        });

        let elapsed = started.elapsed();
        match &found {
            Some(m) if elapsed > SLOW_MATCH_THRESHOLD => warn!(
                method = %method,
                path = %path,
                handler_name = %m.handler_name(),
                template = %m.route.pattern.template(),
                duration_us = elapsed.as_micros(),
                "Slow route matching detected"
            ),
            Some(m) => debug!(
                method = %method,
                path = %path,
                handler_name = %m.handler_name(),
                template = %m.route.pattern.template(),
                params = ?m.params,
                duration_us = elapsed.as_micros(),
                "Route matched"
            ),
            None => debug!(
                method = %method,
                path = %path,
                duration_us = elapsed.as_micros(),
                "No route matched"
            ),
        }
        found
    }
}

fn parse_method(method: &str) -> Result<Method, RouteError> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|_| {
        RouteError::InvalidMethod {
            method: method.to_owned(),
        }
    })
}

fn bind(route: &Arc<Route>, mut captures: Vec<Option<String>>) -> RouteMatch {
    let mut names = route.names().to_vec();
    if captures.len() < names.len() {
        captures.resize(names.len(), None);
    } else {
        let declared = names.len();
        names.extend((declared..captures.len()).map(ParamName::Positional));
    }

    let mut params = route.options.params.clone();
    for (name, value) in names.iter().zip(captures) {
        params.overlay(name.clone(), value);
    }

    RouteMatch {
        route: Arc::clone(route),
        names,
        params,
    }
}
