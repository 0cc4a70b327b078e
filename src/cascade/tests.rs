use super::condition::{self, USER_ERROR, USER_NOTICE, USER_WARNING};
use super::*;
use serde_json::json;

#[test]
fn test_halt_defaults_to_server_error() {
    let c = crate::halt!();
    assert_eq!(c.number, 500);
    assert!(c.message.is_empty());
    assert!(c.debug.is_none());
    assert!(c.file.as_deref().is_some_and(|f| f.ends_with("tests.rs")));
}

#[test]
fn test_halt_code_then_message() {
    let c = crate::halt!(403, "keep out");
    assert_eq!(c.number, 403);
    assert_eq!(c.message, "keep out");
}

#[test]
fn test_halt_message_then_code() {
    let c = crate::halt!("gone fishing", 503);
    assert_eq!(c.number, 503);
    assert_eq!(c.message, "gone fishing");
}

#[test]
fn test_halt_message_only_is_server_error() {
    let c = crate::halt!("boom");
    assert_eq!(c.number, 500);
    let c = crate::halt!("boom", 0);
    assert_eq!(c.number, 500);
}

#[test]
fn test_halt_extra_args_become_debug() {
    let c = crate::halt!(404, "", json!({"id": 3}));
    assert_eq!(c.debug, Some(json!({"id": 3})));

    let c = crate::halt!(500, "x", "a", 2);
    assert_eq!(c.debug, Some(json!(["a", 2])));
}

#[test]
fn test_halt_code_followed_by_debug_keeps_debug() {
    let c = crate::halt!(418u32, json!(["ctx"]));
    assert_eq!(c.number, 418);
    assert!(c.message.is_empty());
    assert_eq!(c.debug, Some(json!(["ctx"])));
}

#[test]
fn test_match_set_accepts() {
    let exact = MatchSet::from(404u32);
    assert!(exact.accepts(404, true));
    assert!(!exact.accepts(500, true));

    let http = MatchSet::from(ANY_HTTP_STATUS);
    assert!(http.accepts(401, true));
    assert!(!http.accepts(9999, false));

    let any = MatchSet::from(ANY_RUNTIME_ERROR);
    assert!(any.accepts(9999, false));
    assert!(any.accepts(404, true));

    let several = MatchSet::from([401u32, 403]);
    assert!(several.accepts(403, true));
    assert!(!several.accepts(404, true));
}

#[test]
fn test_non_fatal_classification() {
    for n in [
        USER_WARNING,
        USER_NOTICE,
        condition::NOTICE,
        condition::WARNING,
        condition::DEPRECATED,
        FRAMEWORK_DEPRECATED,
    ] {
        assert!(is_non_fatal(n), "{n} should be non-fatal");
    }
    for n in [USER_ERROR, condition::ERROR, 404, 500, RUNTIME_ERROR] {
        assert!(!is_non_fatal(n), "{n} should be fatal");
    }
}

#[test]
fn test_condition_http_status() {
    assert_eq!(Condition::new(404, "").http_status(), 404);
    assert_eq!(Condition::new(USER_ERROR, "").http_status(), 500);
    assert_eq!(Condition::new(70_000, "").http_status(), 500);
}

#[test]
fn test_type_names() {
    assert_eq!(type_name(USER_WARNING), Some("USER WARNING"));
    assert_eq!(type_name(FRAMEWORK_DEPRECATED), Some("FRAMEWORK DEPRECATED WARNING"));
    assert_eq!(type_name(404), None);
    assert_eq!(Condition::new(404, "").type_name(), "Not Found");
}

#[test]
fn test_cascade_default_is_last() {
    let mut cascade = ErrorCascade::new();
    cascade.error(404u32, |_, _| crate::dispatcher::Body::from("custom"));
    let entries: Vec<_> = cascade.entries().collect();
    assert_eq!(entries.len(), 2);
    assert!(!entries[0].is_default());
    assert!(entries[1].is_default());
    cascade.reset();
    assert_eq!(cascade.entries().count(), 1);
}

#[test]
fn test_notice_log_is_append_only_until_cleared() {
    let mut log = NoticeLog::new();
    log.push(Notice::here(USER_WARNING, "first"));
    log.push(Notice::here(USER_NOTICE, "second"));
    assert_eq!(log.len(), 2);
    assert_eq!(log.entries()[0].message, "first");
    let drained = log.take();
    assert_eq!(drained.len(), 2);
    assert!(log.is_empty());
}
