//! HTTP status codes known to the dispatcher.
//!
//! Only the textbook codes below count as "valid HTTP statuses" for the error
//! cascade. Any other number raised through [`crate::halt!`] is rendered as a
//! `500`.

/// Generic not-found status.
pub const NOT_FOUND: u16 = 404;
/// Generic server-error status, also the default `halt` code.
pub const SERVER_ERROR: u16 = 500;
/// Raised when the request method is outside the supported verb set.
pub const NOT_IMPLEMENTED: u16 = 501;
/// Default redirect status.
pub const MOVED_TEMPORARILY: u16 = 302;

const STATUS_TABLE: &[(u16, &str)] = &[
    (100, "Continue"),
    (101, "Switching Protocols"),
    (102, "Processing"),
    (200, "OK"),
    (201, "Created"),
    (202, "Accepted"),
    (203, "Non-Authoritative Information"),
    (204, "No Content"),
    (205, "Reset Content"),
    (206, "Partial Content"),
    (207, "Multi-Status"),
    (226, "IM Used"),
    (300, "Multiple Choices"),
    (301, "Moved Permanently"),
    (302, "Found"),
    (303, "See Other"),
    (304, "Not Modified"),
    (305, "Use Proxy"),
    (306, "Reserved"),
    (307, "Temporary Redirect"),
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (402, "Payment Required"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (406, "Not Acceptable"),
    (407, "Proxy Authentication Required"),
    (408, "Request Timeout"),
    (409, "Conflict"),
    (410, "Gone"),
    (411, "Length Required"),
    (412, "Precondition Failed"),
    (413, "Request Entity Too Large"),
    (414, "Request-URI Too Long"),
    (415, "Unsupported Media Type"),
    (416, "Requested Range Not Satisfiable"),
    (417, "Expectation Failed"),
    (422, "Unprocessable Entity"),
    (423, "Locked"),
    (424, "Failed Dependency"),
    (426, "Upgrade Required"),
    (500, "Internal Server Error"),
    (501, "Not Implemented"),
    (502, "Bad Gateway"),
    (503, "Service Unavailable"),
    (504, "Gateway Timeout"),
    (505, "HTTP Version Not Supported"),
    (506, "Variant Also Negotiates"),
    (507, "Insufficient Storage"),
    (510, "Not Extended"),
];

/// Reason phrase for a status code, `None` if the code is not in the table.
#[must_use]
pub fn reason(code: u32) -> Option<&'static str> {
    let code = u16::try_from(code).ok()?;
    STATUS_TABLE
        .binary_search_by_key(&code, |(c, _)| *c)
        .ok()
        .map(|idx| STATUS_TABLE[idx].1)
}

/// Whether `code` is one of the textbook HTTP status codes.
#[inline]
#[must_use]
pub fn is_valid(code: u32) -> bool {
    reason(code).is_some()
}

/// Full status line, e.g. `HTTP/1.1 404 Not Found`.
#[must_use]
pub fn status_line(code: u32) -> Option<String> {
    reason(code).map(|r| format!("HTTP/1.1 {code} {r}"))
}

/// Every `(code, reason)` pair, ordered by code.
#[must_use]
pub fn all() -> &'static [(u16, &'static str)] {
    STATUS_TABLE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(reason(200), Some("OK"));
        assert_eq!(reason(404), Some("Not Found"));
        assert_eq!(reason(418), None);
        assert_eq!(reason(70_000), None);
    }

    #[test]
    fn test_table_is_sorted_for_lookup() {
        assert!(STATUS_TABLE.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_status_line() {
        assert_eq!(
            status_line(501).as_deref(),
            Some("HTTP/1.1 501 Not Implemented")
        );
        assert!(status_line(1).is_none());
    }
}
