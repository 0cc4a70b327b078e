use crate::cascade::Notice;
use minijinja::value::Rest;
use minijinja::{path_loader, AutoEscape, Environment};
use serde_json::{json, Map, Value};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Built-in diagnostic page for fatal conditions.
pub const ERROR_TEMPLATE: &str = "zest/error.html";
/// Built-in page layout around error pages.
pub const LAYOUT_TEMPLATE: &str = "zest/layout.html";
/// Built-in notices block appended in development.
pub const NOTICES_TEMPLATE: &str = "zest/notices.html";

const BUILTINS: [(&str, &str); 3] = [
    (ERROR_TEMPLATE, include_str!("templates/error.html")),
    (LAYOUT_TEMPLATE, include_str!("templates/layout.html")),
    (NOTICES_TEMPLATE, include_str!("templates/notices.html")),
];

/// Rendering failure.
#[derive(Debug)]
pub enum RenderError {
    /// The template did not parse or failed while rendering.
    Template {
        name: String,
        source: minijinja::Error,
    },
    /// No built-in template carries that name.
    TemplateNotFound(String),
    /// Locals could not be turned into template values.
    Serialization(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Template { name, source } => {
                write!(f, "template '{name}' failed: {source}")
            }
            RenderError::TemplateNotFound(name) => write!(f, "template not found: {name}"),
            RenderError::Serialization(msg) => write!(f, "serialization error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Template { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Escape `&`, `<` and `>`; quotes are left alone.
#[must_use]
pub fn h(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Build a relative URL from path parts and query pairs.
///
/// Parts are split on `/`, empty segments dropped and each segment
/// percent-encoded. A first part that is already an absolute URL is kept
/// verbatim.
///
/// ```rust
/// use zest::render::url_for;
///
/// assert_eq!(url_for(&["users", "jane doe"], &[]), "/users/jane%20doe");
/// assert_eq!(url_for(&["/search"], &[("q", "a&b")]), "/search?q=a%26b");
/// ```
#[must_use]
pub fn url_for(parts: &[&str], query: &[(&str, &str)]) -> String {
    let mut parts = parts.iter().copied().peekable();
    let mut url = match parts.peek() {
        Some(&first) if url::Url::parse(first).is_ok() => {
            parts.next();
            first.trim_end_matches('/').to_owned()
        }
        _ => String::new(),
    };
    for segment in parts.flat_map(|p| p.split('/')).filter(|s| !s.is_empty()) {
        url.push('/');
        url.push_str(&urlencoding::encode(segment));
    }
    if url.is_empty() {
        url.push('/');
    }
    for (i, (key, value)) in query.iter().enumerate() {
        url.push(if i == 0 { '?' } else { '&' });
        url.push_str(&urlencoding::encode(key));
        url.push('=');
        url.push_str(&urlencoding::encode(value));
    }
    url
}

/// Template renderer.
///
/// Templates are looked up in the views directory; a name that is not a
/// file there is rendered as an inline template string. Output is not
/// auto-escaped: templates escape explicitly with the `h` filter.
pub struct View {
    env: Environment<'static>,
    views_dir: Option<PathBuf>,
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("views_dir", &self.views_dir)
            .finish_non_exhaustive()
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new(None)
    }
}

impl View {
    #[must_use]
    pub fn new(views_dir: Option<PathBuf>) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_filter("h", |text: String| h(&text));
        env.add_function("url_for", |parts: Rest<String>| {
            let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
            url_for(&parts, &[])
        });
        for (name, source) in BUILTINS {
            if let Err(err) = env.add_template(name, source) {
                warn!(template = name, error = %err, "Built-in template rejected");
            }
        }
        if let Some(dir) = &views_dir {
            env.set_loader(path_loader(dir.clone()));
        }
        Self { env, views_dir }
    }

    #[must_use]
    pub fn views_dir(&self) -> Option<&Path> {
        self.views_dir.as_deref()
    }

    /// Whether `name` is a template file in the views directory.
    #[must_use]
    pub fn has_template(&self, name: &str) -> bool {
        let Some(dir) = &self.views_dir else {
            return false;
        };
        let relative = Path::new(name);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        safe && dir.join(relative).is_file()
    }

    /// Render a template file, or `template` itself when no such file
    /// exists.
    ///
    /// # Errors
    ///
    /// The template does not parse or fails while rendering.
    pub fn render(&self, template: &str, vars: &Map<String, Value>) -> Result<String, RenderError> {
        if self.has_template(template) {
            debug!(template, "Rendering view");
            let tmpl = self
                .env
                .get_template(template)
                .map_err(|source| template_error(template, source))?;
            tmpl.render(vars)
                .map_err(|source| template_error(template, source))
        } else {
            self.env
                .render_str(template, vars)
                .map_err(|source| template_error("<inline>", source))
        }
    }

    /// Render `template`, then wrap it in `layout` as `content`.
    ///
    /// # Errors
    ///
    /// Either template fails.
    pub fn render_with_layout(
        &self,
        template: &str,
        layout: Option<&str>,
        vars: &Map<String, Value>,
    ) -> Result<String, RenderError> {
        let content = self.render(template, vars)?;
        match layout {
            Some(layout) => {
                let mut outer = vars.clone();
                outer.insert("content".to_owned(), Value::String(content));
                self.render(layout, &outer)
            }
            None => Ok(content),
        }
    }

    /// Wrap `content` in `layout`, or in the built-in page layout when
    /// `None`.
    ///
    /// # Errors
    ///
    /// The layout fails.
    pub fn render_layout(&self, layout: Option<&str>, content: &str) -> Result<String, RenderError> {
        let mut vars = Map::new();
        vars.insert("content".to_owned(), Value::String(content.to_owned()));
        match layout {
            Some(layout) => self.render(layout, &vars),
            None => self.render_builtin(LAYOUT_TEMPLATE, &Value::Object(vars)),
        }
    }

    /// Render one of the embedded templates.
    ///
    /// # Errors
    ///
    /// Unknown name, or the template fails.
    pub fn render_builtin(&self, name: &str, vars: &Value) -> Result<String, RenderError> {
        if !BUILTINS.iter().any(|(builtin, _)| *builtin == name) {
            return Err(RenderError::TemplateNotFound(name.to_owned()));
        }
        let tmpl = self
            .env
            .get_template(name)
            .map_err(|source| template_error(name, source))?;
        tmpl.render(vars).map_err(|source| template_error(name, source))
    }

    /// The notices block shown in development.
    ///
    /// # Errors
    ///
    /// The built-in template fails.
    pub fn render_notices(&self, notices: &[Notice]) -> Result<String, RenderError> {
        let notices: Vec<Value> = notices
            .iter()
            .map(|n| {
                let mut value = serde_json::to_value(n)
                    .map_err(|e| RenderError::Serialization(e.to_string()))?;
                if let Value::Object(map) = &mut value {
                    map.insert("type_name".to_owned(), Value::from(n.type_name()));
                }
                Ok(value)
            })
            .collect::<Result<_, RenderError>>()?;
        self.render_builtin(NOTICES_TEMPLATE, &json!({ "notices": notices }))
    }
}

fn template_error(name: &str, source: minijinja::Error) -> RenderError {
    RenderError::Template {
        name: name.to_owned(),
        source,
    }
}
