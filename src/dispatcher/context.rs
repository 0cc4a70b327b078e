use super::handler::HandlerResult;
use super::response::{self, Body, HeaderVec};
use crate::cascade::condition::{USER_NOTICE, USER_WARNING};
use crate::cascade::{Condition, Halt, Notice, NoticeLog};
use crate::config::AppConfig;
use crate::flash::{self, Flash};
use crate::halt;
use crate::ids::RequestId;
use crate::params::ParamBindings;
use crate::render::{RenderError, View};
use crate::request::RequestEnv;
use crate::router::RouteMatch;
use crate::session::{Session, SessionStore};
use crate::static_files;
use crate::status;
use http::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

/// State of one dispatch.
///
/// Built fresh for every request and dropped at the end of it, so nothing
/// here leaks between requests: bindings, notices, locals, flash messages
/// and the response status and headers all live on this value.
#[derive(Debug)]
pub struct DispatchContext {
    request_id: RequestId,
    env: RequestEnv,
    config: Arc<AppConfig>,
    view: Arc<View>,
    route: Option<RouteMatch>,
    params: ParamBindings,
    locals: Map<String, Value>,
    layout: Option<String>,
    notices: NoticeLog,
    session: Option<Session>,
    flash: Flash,
    status: u16,
    headers: HeaderVec,
}

impl DispatchContext {
    #[must_use]
    pub fn new(
        request_id: RequestId,
        env: RequestEnv,
        config: Arc<AppConfig>,
        view: Arc<View>,
    ) -> Self {
        let layout = config.layout.clone();
        Self {
            request_id,
            env,
            config,
            view,
            route: None,
            params: ParamBindings::new(),
            locals: Map::new(),
            layout,
            notices: NoticeLog::new(),
            session: None,
            flash: Flash::default(),
            status: 200,
            headers: HeaderVec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[inline]
    #[must_use]
    pub fn env(&self) -> &RequestEnv {
        &self.env
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn view(&self) -> &View {
        &self.view
    }

    /// The effective request method; an unsupported one is recorded as a
    /// notice and yields `None`.
    #[track_caller]
    pub fn request_method(&mut self) -> Option<Method> {
        self.env.request_method(&mut self.notices)
    }

    /// The matched route, once routing succeeded.
    #[must_use]
    pub fn route(&self) -> Option<&RouteMatch> {
        self.route.as_ref()
    }

    pub(crate) fn bind(&mut self, route: RouteMatch) {
        self.params = route.params.clone();
        self.route = Some(route);
    }

    /// Bindings of the matched route, defaults included.
    #[must_use]
    pub fn params(&self) -> &ParamBindings {
        &self.params
    }

    /// One binding by name; digit-only names address positional bindings.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    // ---- response status and headers ----

    /// Set the response status.
    pub fn status(&mut self, code: u16) {
        self.status = code;
    }

    #[must_use]
    pub fn response_status(&self) -> u16 {
        self.status
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        response::set_header(&mut self.headers, name, value.into());
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        response::find_header(&self.headers, name)
    }

    /// Set `Content-Type`, adding the configured charset to textual types.
    pub fn set_content_type(&mut self, mime: &str) {
        let value = if is_textual(mime) {
            self.config.content_type(mime)
        } else {
            mime.to_owned()
        };
        self.set_header("Content-Type", value);
    }

    pub(crate) fn take_headers(&mut self) -> HeaderVec {
        std::mem::take(&mut self.headers)
    }

    // ---- notices ----

    #[must_use]
    pub fn notices(&self) -> &NoticeLog {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut NoticeLog {
        &mut self.notices
    }

    /// Record a non-fatal diagnostic.
    #[track_caller]
    pub fn notice(&mut self, number: u32, message: impl Into<String>) {
        self.notices.push(Notice::here(number, message));
    }

    /// Record `condition` when it is non-fatal; hand it back otherwise.
    ///
    /// # Errors
    ///
    /// The condition is fatal.
    pub fn trigger(&mut self, condition: Condition) -> Result<(), Halt> {
        if condition.is_non_fatal() {
            debug!(
                request_id = %self.request_id,
                condition = condition.number,
                message = %condition.message,
                "Notice recorded"
            );
            self.notices.push(Notice::from(condition));
            Ok(())
        } else {
            Err(condition)
        }
    }

    // ---- template variables ----

    /// Set a template variable for every render of this dispatch.
    pub fn set(&mut self, name: impl Into<String>, value: impl Serialize) {
        let name = name.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.locals.insert(name, value);
            }
            Err(err) => {
                error!(request_id = %self.request_id, variable = %name, error = %err, "Template variable not serializable");
            }
        }
    }

    #[must_use]
    pub fn locals(&self) -> &Map<String, Value> {
        &self.locals
    }

    /// Layout for [`DispatchContext::render`] and [`DispatchContext::html`];
    /// starts as the configured default.
    pub fn set_layout(&mut self, layout: Option<String>) {
        self.layout = layout;
    }

    // ---- rendering ----

    /// Render `template` (a views file or an inline template) in the current
    /// layout.
    ///
    /// Variables are the ones set with [`DispatchContext::set`] overlaid
    /// with `locals`, plus the current flash messages as `flash`.
    ///
    /// # Errors
    ///
    /// A template fails; the condition is a `500`.
    #[track_caller]
    pub fn render(&mut self, template: &str, locals: Map<String, Value>) -> HandlerResult {
        let layout = self.layout.clone();
        self.render_in(template, layout.as_deref(), locals)
    }

    /// Render `template` without a layout.
    ///
    /// # Errors
    ///
    /// The template fails; the condition is a `500`.
    #[track_caller]
    pub fn partial(&mut self, template: &str, locals: Map<String, Value>) -> HandlerResult {
        self.render_in(template, None, locals)
    }

    /// Render as `text/html` in the current layout.
    ///
    /// # Errors
    ///
    /// See [`DispatchContext::render`].
    #[track_caller]
    pub fn html(&mut self, template: &str, locals: Map<String, Value>) -> HandlerResult {
        self.set_content_type("text/html");
        self.render(template, locals)
    }

    /// Render as `text/css`.
    ///
    /// # Errors
    ///
    /// See [`DispatchContext::render`].
    #[track_caller]
    pub fn css(&mut self, template: &str, locals: Map<String, Value>) -> HandlerResult {
        self.set_content_type("text/css");
        self.partial(template, locals)
    }

    /// Render as `text/plain`.
    ///
    /// # Errors
    ///
    /// See [`DispatchContext::render`].
    #[track_caller]
    pub fn txt(&mut self, template: &str, locals: Map<String, Value>) -> HandlerResult {
        self.set_content_type("text/plain");
        self.partial(template, locals)
    }

    /// Render as `text/xml`.
    ///
    /// # Errors
    ///
    /// See [`DispatchContext::render`].
    #[track_caller]
    pub fn xml(&mut self, template: &str, locals: Map<String, Value>) -> HandlerResult {
        self.set_content_type("text/xml");
        self.partial(template, locals)
    }

    /// Serialize `data` as `application/json`.
    ///
    /// # Errors
    ///
    /// `data` is not serializable; the condition is a `500`.
    #[track_caller]
    pub fn json(&mut self, data: &impl Serialize) -> HandlerResult {
        let body = serde_json::to_string(data)
            .map_err(|e| Condition::new(u32::from(status::SERVER_ERROR), e.to_string()))?;
        self.set_content_type("application/json");
        Ok(Some(Body::Text(body)))
    }

    #[track_caller]
    fn render_in(
        &mut self,
        template: &str,
        layout: Option<&str>,
        locals: Map<String, Value>,
    ) -> HandlerResult {
        let mut vars = self.locals.clone();
        vars.extend(locals);
        if vars.contains_key("flash") {
            self.notice(
                USER_NOTICE,
                "A template variable named 'flash' hides the flash messages.",
            );
        } else {
            vars.insert("flash".to_owned(), Value::Object(self.flash.now().clone()));
        }

        let rendered: Result<String, RenderError> =
            self.view.render_with_layout(template, layout, &vars);
        match rendered {
            Ok(out) => Ok(Some(Body::Text(out))),
            Err(err) => Err(Condition::new(u32::from(status::SERVER_ERROR), err.to_string())),
        }
    }

    /// Stream a file.
    ///
    /// `../` sequences are stripped from `path`. The content type comes from
    /// the extension, with the charset added for text types.
    ///
    /// # Errors
    ///
    /// No such file: a `404` condition "unknown filename ...".
    #[track_caller]
    pub fn render_file(&mut self, path: impl AsRef<Path>) -> HandlerResult {
        let path = strip_parent_dirs(path.as_ref());
        if !path.is_file() {
            return Err(halt!(
                status::NOT_FOUND,
                format!("unknown filename {}", path.display())
            ));
        }
        let mime = static_files::mime_content_type(&path);
        if static_files::is_text(&path) {
            let value = self.config.content_type(mime);
            self.set_header("Content-Type", value);
        } else {
            self.set_header("Content-Type", mime);
        }
        Ok(Some(Body::File(path)))
    }

    /// Redirect to `url` with `status` (`302` when `None`).
    ///
    /// # Errors
    ///
    /// Never; the signature lets handlers `return ctx.redirect(..)`.
    pub fn redirect(&mut self, url: &str, status: Option<u16>) -> HandlerResult {
        self.status = status.unwrap_or(status::MOVED_TEMPORARILY);
        self.set_header("Location", url);
        debug!(request_id = %self.request_id, location = %url, status = self.status, "Redirect");
        Ok(Some(Body::Empty))
    }

    // ---- session and flash ----

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    pub(crate) fn start_session(&mut self, session: Session) {
        self.flash = Flash::load(Some(&session));
        self.session = Some(session);
    }

    #[must_use]
    pub fn flash_messages(&self) -> &Flash {
        &self.flash
    }

    /// Keep a message for the next request.
    #[track_caller]
    pub fn flash(&mut self, name: impl Into<String>, value: impl Serialize) {
        if self.session.is_none() {
            self.notice(USER_WARNING, "Flash messages need a session.");
            return;
        }
        if let Ok(value) = serde_json::to_value(value) {
            self.flash.set(name, value);
        }
    }

    /// Show a message to this request only.
    pub fn flash_now(&mut self, name: impl Into<String>, value: impl Serialize) {
        if let Ok(value) = serde_json::to_value(value) {
            self.flash.set_now(name, value);
        }
    }

    /// Sweep flash messages into the session and save it. Returns the
    /// cookie value to send when the session is new and holds data.
    pub(crate) fn finish_session(&mut self, store: &dyn SessionStore) -> Option<String> {
        let content_type = self.header("content-type").map(str::to_owned);
        let session = self.session.as_mut()?;
        if flash::sweeps_for(content_type.as_deref()) {
            self.flash.sweep(session);
        }
        if session.is_new() && session.data().is_empty() {
            return None;
        }
        session.save(store);
        session.is_new().then(|| session.id().to_string())
    }
}

fn is_textual(mime: &str) -> bool {
    !mime.contains(';')
        && (mime.starts_with("text/")
            || mime == "application/json"
            || mime == "application/xml"
            || mime == "application/javascript")
}

fn strip_parent_dirs(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::ParentDir))
        .collect()
}
