//! Template-to-matcher compiler.

use crate::params::ParamName;
use regex::Regex;
use std::fmt;
use tracing::debug;

/// `*` segment: one optional segment, may be empty.
const SINGLE_ASTERISK: &str = "(?:/([^/]*))?";
/// `**` segment: everything that follows, slashes included.
const DOUBLE_ASTERISK: &str = "(?:/(.*))?";
/// `:name` segment: one non-empty segment.
const NAMED_SEGMENT: &str = "/([^/]+)";
/// Trailing slash tolerance appended to every template matcher.
const OPTIONAL_SLASH: &str = "(?:/*?)";
/// Asterisk inside a literal-mixed segment.
const NO_SLASH_ASTERISK: &str = "(?:([^/]*))?";

/// Leading character that marks a raw, pre-anchored pattern.
pub const RAW_PATTERN_SENTINEL: char = '^';

/// Error returned when a raw pattern cannot be compiled.
///
/// Templates never fail; only raw patterns (leading `^`) are passed to the
/// regex engine as written.
#[derive(Debug, Clone)]
pub enum PatternError {
    InvalidRawPattern {
        pattern: String,
        source: regex::Error,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::InvalidRawPattern { pattern, source } => {
                write!(f, "invalid raw route pattern '{pattern}': {source}")
            }
        }
    }
}

impl std::error::Error for PatternError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PatternError::InvalidRawPattern { source, .. } => Some(source),
        }
    }
}

/// A route path as declared: a template or raw pattern plus optional
/// explicit parameter names.
///
/// An explicit name at index `i` takes precedence over the name the compiler
/// would extract for the `i`-th binding segment. `None` entries keep their
/// slot but let the compiler fill it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutePath {
    pub path: String,
    pub names: Vec<Option<ParamName>>,
}

impl RoutePath {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            names: Vec::new(),
        }
    }

    /// A path with an explicit, ordered name list.
    #[must_use]
    pub fn with_names<I, N>(path: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<ParamName>,
    {
        Self {
            path: path.into(),
            names: names.into_iter().map(|n| Some(n.into())).collect(),
        }
    }

    /// Whether this path is a raw pattern rather than a template.
    #[inline]
    #[must_use]
    pub fn is_raw(&self) -> bool {
        self.path.starts_with(RAW_PATTERN_SENTINEL)
    }
}

impl From<&str> for RoutePath {
    fn from(path: &str) -> Self {
        RoutePath::new(path)
    }
}

impl From<String> for RoutePath {
    fn from(path: String) -> Self {
        RoutePath::new(path)
    }
}

impl<const N: usize> From<(&str, [&str; N])> for RoutePath {
    fn from((path, names): (&str, [&str; N])) -> Self {
        RoutePath::with_names(path, names)
    }
}

impl From<(&str, Vec<&str>)> for RoutePath {
    fn from((path, names): (&str, Vec<&str>)) -> Self {
        RoutePath::with_names(path, names)
    }
}

impl From<(&str, &[&str])> for RoutePath {
    fn from((path, names): (&str, &[&str])) -> Self {
        RoutePath::with_names(path, names.iter().copied())
    }
}

/// Compiled matcher plus the ordered parameter names it binds.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    template: String,
    regex: Regex,
    names: Vec<ParamName>,
}

impl CompiledPattern {
    /// The template or raw pattern this matcher was compiled from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Source of the compiled regular expression.
    #[must_use]
    pub fn matcher(&self) -> &str {
        self.regex.as_str()
    }

    #[must_use]
    pub fn names(&self) -> &[ParamName] {
        &self.names
    }

    #[inline]
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Capture groups for `path`, whole-match group excluded.
    ///
    /// A group that did not take part in the match is `None`; a group that
    /// matched the empty string is `Some("")`.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<Vec<Option<String>>> {
        let caps = self.regex.captures(path)?;
        Some(
            caps.iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_owned()))
                .collect(),
        )
    }
}

/// Compile a route path into a matcher.
///
/// Templates are compiled segment by segment (empty segments are skipped):
///
/// | Segment | Matcher | Binding |
/// |---|---|---|
/// | `**` | rest of the path, one group | next positional index |
/// | `*` | one optional segment | next positional index |
/// | `:name` | one non-empty segment | `name` |
/// | `a*b` | literal pieces around no-slash groups | one shared positional index |
/// | literal | escaped literal | none |
///
/// The result is anchored, case-insensitive and tolerates a trailing slash.
/// Raw patterns are anchored with a trailing `$` if missing, made
/// case-insensitive and otherwise used verbatim with the explicit names.
///
/// # Errors
///
/// Returns [`PatternError::InvalidRawPattern`] when a raw pattern is not a
/// valid regular expression.
pub fn compile(path: &RoutePath) -> Result<CompiledPattern, PatternError> {
    let (source, names) = if path.is_raw() {
        compile_raw(path)
    } else {
        compile_template(path)
    };

    let regex = Regex::new(&source).map_err(|source_err| PatternError::InvalidRawPattern {
        pattern: path.path.clone(),
        source: source_err,
    })?;

    debug!(
        template = %path.path,
        matcher = %source,
        names = ?names,
        "Route pattern compiled"
    );

    Ok(CompiledPattern {
        template: path.path.clone(),
        regex,
        names,
    })
}

fn compile_raw(path: &RoutePath) -> (String, Vec<ParamName>) {
    let mut source = String::with_capacity(path.path.len() + 5);
    source.push_str("(?i)");
    source.push_str(&path.path);
    if !path.path.ends_with('$') {
        source.push('$');
    }
    (source, finalize_names(path.names.clone()))
}

fn compile_template(path: &RoutePath) -> (String, Vec<ParamName>) {
    let trimmed = path.path.trim();
    if trimmed.is_empty() || trimmed == "/" {
        return (
            format!("^{OPTIONAL_SLASH}$"),
            finalize_names(path.names.clone()),
        );
    }

    let mut source = String::with_capacity(path.path.len() * 2 + 16);
    source.push_str("(?i)^");
    let mut names = path.names.clone();
    let mut binding_idx = 0usize;

    for segment in path.path.split('/').filter(|s| !s.is_empty()) {
        let extracted = if segment == "**" {
            source.push_str(DOUBLE_ASTERISK);
            Some(ParamName::Positional(binding_idx))
        } else if segment == "*" {
            source.push_str(SINGLE_ASTERISK);
            Some(ParamName::Positional(binding_idx))
        } else if let Some(name) = named_segment(segment) {
            source.push_str(NAMED_SEGMENT);
            Some(ParamName::from(name))
        } else if segment.contains('*') {
            // every asterisk of the segment binds to the same index
            source.push('/');
            let pieces: Vec<String> = segment.split('*').map(regex::escape).collect();
            source.push_str(&pieces.join(NO_SLASH_ASTERISK));
            Some(ParamName::Positional(binding_idx))
        } else {
            source.push('/');
            source.push_str(&regex::escape(segment));
            None
        };

        let Some(extracted) = extracted else {
            continue;
        };
        match names.get_mut(binding_idx) {
            Some(slot @ None) => *slot = Some(extracted),
            Some(Some(_)) => {}
            None => names.push(Some(extracted)),
        }
        binding_idx += 1;
    }

    source.push_str(OPTIONAL_SLASH);
    source.push_str("?$");
    (source, finalize_names(names))
}

/// `:name` with a non-empty name and no further colon.
fn named_segment(segment: &str) -> Option<&str> {
    let name = segment.strip_prefix(':')?;
    if name.is_empty() || name.contains(':') {
        None
    } else {
        Some(name)
    }
}

fn finalize_names(names: Vec<Option<ParamName>>) -> Vec<ParamName> {
    names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| name.unwrap_or(ParamName::Positional(idx)))
        .collect()
}
