//! Condition numbers, the [`Condition`] value and the `halt` entry point.

use crate::status;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::panic::Location;

pub const ERROR: u32 = 1;
pub const WARNING: u32 = 2;
pub const PARSE: u32 = 4;
pub const NOTICE: u32 = 8;
pub const CORE_ERROR: u32 = 16;
pub const CORE_WARNING: u32 = 32;
pub const COMPILE_ERROR: u32 = 64;
pub const COMPILE_WARNING: u32 = 128;
pub const USER_ERROR: u32 = 256;
pub const USER_WARNING: u32 = 512;
pub const USER_NOTICE: u32 = 1024;
pub const STRICT: u32 = 2048;
pub const RECOVERABLE_ERROR: u32 = 4096;
pub const DEPRECATED: u32 = 8192;
pub const USER_DEPRECATED: u32 = 16384;

/// Match-set marker: any condition whose number is a valid HTTP status.
pub const ANY_HTTP_STATUS: u32 = 32768;
/// Match-set marker: any condition at all. Also the number raised for an
/// uncaught runtime error (a handler panic).
pub const ANY_RUNTIME_ERROR: u32 = 65536;
/// Number raised for an uncaught runtime error.
pub const RUNTIME_ERROR: u32 = ANY_RUNTIME_ERROR;
/// Framework-level deprecation notice.
pub const FRAMEWORK_DEPRECATED: u32 = 35000;

/// Conditions that are logged as notices and never stop a dispatch.
#[must_use]
pub fn is_non_fatal(number: u32) -> bool {
    matches!(
        number,
        NOTICE
            | WARNING
            | CORE_WARNING
            | COMPILE_WARNING
            | USER_WARNING
            | USER_NOTICE
            | DEPRECATED
            | USER_DEPRECATED
            | FRAMEWORK_DEPRECATED
    )
}

/// Human readable name for a condition number.
#[must_use]
pub fn type_name(number: u32) -> Option<&'static str> {
    Some(match number {
        ERROR => "ERROR",
        WARNING => "WARNING",
        PARSE => "PARSING ERROR",
        NOTICE => "NOTICE",
        CORE_ERROR => "CORE ERROR",
        CORE_WARNING => "CORE WARNING",
        COMPILE_ERROR => "COMPILE ERROR",
        COMPILE_WARNING => "COMPILE WARNING",
        USER_ERROR => "USER ERROR",
        USER_WARNING => "USER WARNING",
        USER_NOTICE => "USER NOTICE",
        STRICT => "STRICT NOTICE",
        RECOVERABLE_ERROR => "RECOVERABLE ERROR",
        DEPRECATED => "DEPRECATED WARNING",
        USER_DEPRECATED => "USER DEPRECATED WARNING",
        FRAMEWORK_DEPRECATED => "FRAMEWORK DEPRECATED WARNING",
        RUNTIME_ERROR => "RUNTIME ERROR",
        _ => return None,
    })
}

/// A raised condition: an HTTP status, a runtime error number or a notice.
///
/// Handlers return `Err(Condition)` to stop the dispatch; the dispatcher
/// hands it to the error cascade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub number: u32,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    /// Extra diagnostic context passed to `halt`.
    pub debug: Option<Value>,
}

impl Condition {
    /// New condition originating at the caller's location.
    #[track_caller]
    #[must_use]
    pub fn new(number: u32, message: impl Into<String>) -> Self {
        let location = Location::caller();
        Self {
            number,
            message: message.into(),
            file: Some(location.file().to_owned()),
            line: Some(location.line()),
            debug: None,
        }
    }

    /// New condition without an origin.
    #[must_use]
    pub fn detached(number: u32, message: impl Into<String>) -> Self {
        Self {
            number,
            message: message.into(),
            file: None,
            line: None,
            debug: None,
        }
    }

    #[must_use]
    pub fn with_debug(mut self, debug: Value) -> Self {
        self.debug = Some(debug);
        self
    }

    #[must_use]
    pub fn is_http_status(&self) -> bool {
        status::is_valid(self.number)
    }

    /// Status the default handler answers with: the number itself when it
    /// is a valid HTTP status, otherwise `500`.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        if self.is_http_status() {
            u16::try_from(self.number).unwrap_or(status::SERVER_ERROR)
        } else {
            status::SERVER_ERROR
        }
    }

    #[must_use]
    pub fn is_non_fatal(&self) -> bool {
        is_non_fatal(self.number)
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        type_name(self.number)
            .or_else(|| status::reason(self.number))
            .unwrap_or("UNKNOWN")
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.number, self.message)?;
        if let (Some(file), Some(line)) = (&self.file, self.line) {
            write!(f, " ({file}:{line})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Condition {}

/// One argument of [`halt`]. Codes and messages may come in either order.
#[derive(Debug, Clone, PartialEq)]
pub enum HaltArg {
    Code(u32),
    Message(String),
    Debug(Value),
}

impl From<u16> for HaltArg {
    fn from(code: u16) -> Self {
        HaltArg::Code(u32::from(code))
    }
}

impl From<u32> for HaltArg {
    fn from(code: u32) -> Self {
        HaltArg::Code(code)
    }
}

impl From<i32> for HaltArg {
    fn from(code: i32) -> Self {
        HaltArg::Code(u32::try_from(code).unwrap_or(0))
    }
}

impl From<&str> for HaltArg {
    fn from(message: &str) -> Self {
        HaltArg::Message(message.to_owned())
    }
}

impl From<String> for HaltArg {
    fn from(message: String) -> Self {
        HaltArg::Message(message)
    }
}

impl From<&String> for HaltArg {
    fn from(message: &String) -> Self {
        HaltArg::Message(message.clone())
    }
}

impl From<Value> for HaltArg {
    fn from(debug: Value) -> Self {
        HaltArg::Debug(debug)
    }
}

impl HaltArg {
    fn into_value(self) -> Value {
        match self {
            HaltArg::Code(c) => Value::from(c),
            HaltArg::Message(m) => Value::String(m),
            HaltArg::Debug(v) => v,
        }
    }
}

/// Build a fatal condition from order-tolerant arguments.
///
/// - no argument: `500` with an empty message
/// - a code first: the next message argument, if any, is the message
/// - a message first: the next code argument, if any, is the code
///   (defaulting to `500`; a zero code also means `500`)
/// - everything left over becomes the debug context
///
/// An empty `404` message is later replaced by the request URI.
#[track_caller]
pub fn halt<I: IntoIterator<Item = HaltArg>>(args: I) -> Condition {
    let mut args: VecDeque<HaltArg> = args.into_iter().collect();
    let server_error = u32::from(status::SERVER_ERROR);

    let (number, message) = match args.pop_front() {
        None => (server_error, String::new()),
        Some(HaltArg::Message(message)) => match args.front() {
            Some(HaltArg::Code(code)) => {
                let code = *code;
                args.pop_front();
                (if code == 0 { server_error } else { code }, message)
            }
            _ => (server_error, message),
        },
        Some(HaltArg::Code(code)) => match args.pop_front() {
            Some(HaltArg::Message(message)) => (code, message),
            Some(other) => {
                args.push_front(other);
                (code, String::new())
            }
            None => (code, String::new()),
        },
        Some(debug @ HaltArg::Debug(_)) => {
            args.push_front(debug);
            (server_error, String::new())
        }
    };

    let mut condition = Condition::new(number, message);
    condition.debug = match args.len() {
        0 => None,
        1 => args.pop_front().map(HaltArg::into_value),
        _ => Some(Value::Array(args.into_iter().map(HaltArg::into_value).collect())),
    };
    condition
}

/// Raise a fatal condition with order-tolerant arguments.
///
/// ```rust
/// use zest::halt;
///
/// let c = halt!("Nobody home", 404);
/// assert_eq!(c.number, 404);
/// assert_eq!(c.message, "Nobody home");
///
/// let c = halt!();
/// assert_eq!(c.number, 500);
/// ```
#[macro_export]
macro_rules! halt {
    () => {
        $crate::cascade::halt(::std::iter::empty())
    };
    ($($arg:expr),+ $(,)?) => {
        $crate::cascade::halt([$($crate::cascade::HaltArg::from($arg)),+])
    };
}
