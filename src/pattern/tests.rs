use super::{compile, RoutePath};
use crate::params::ParamName;

fn caps(template: impl Into<RoutePath>, path: &str) -> Option<Vec<Option<String>>> {
    compile(&template.into()).unwrap().captures(path)
}

fn some(s: &str) -> Option<String> {
    Some(s.to_string())
}

#[test]
fn test_root_path() {
    for template in ["", "/"] {
        let p = compile(&RoutePath::from(template)).unwrap();
        assert!(p.is_match(""));
        assert!(p.is_match("/"));
        assert!(!p.is_match("/a"));
        assert!(p.names().is_empty());
    }
}

#[test]
fn test_named_param() {
    let p = compile(&RoutePath::from("/users/:id")).unwrap();
    assert_eq!(p.names(), &[ParamName::from("id")]);
    assert_eq!(p.captures("/users/42"), Some(vec![some("42")]));
    assert_eq!(p.captures("/users/42/"), Some(vec![some("42")]));
    assert!(p.captures("/users/").is_none());
    assert!(p.captures("/users").is_none());
    assert!(p.captures("/users/42/x").is_none());
}

#[test]
fn test_single_asterisk_empty_vs_absent() {
    let p = compile(&RoutePath::from("/users/*")).unwrap();
    assert_eq!(p.names(), &[ParamName::Positional(0)]);
    assert_eq!(p.captures("/users/"), Some(vec![some("")]));
    assert_eq!(p.captures("/users"), Some(vec![None]));
    assert!(p.captures("/users/a/b").is_none());
}

#[test]
fn test_double_asterisk() {
    assert_eq!(caps("/files/**", "/files/a/b/c"), Some(vec![some("a/b/c")]));
    assert_eq!(caps("/files/**", "/files"), Some(vec![None]));
}

#[test]
fn test_case_insensitive_and_trailing_slash() {
    let p = compile(&RoutePath::from("/About/Team")).unwrap();
    assert!(p.is_match("/about/team"));
    assert!(p.is_match("/ABOUT/TEAM/"));
    assert!(!p.is_match("/about/teams"));
}

#[test]
fn test_repeated_slashes_normalize() {
    let a = compile(&RoutePath::from("//users///:id/")).unwrap();
    let b = compile(&RoutePath::from("/users/:id")).unwrap();
    assert_eq!(a.matcher(), b.matcher());
    assert_eq!(a.names(), b.names());
}

#[test]
fn test_literal_is_escaped() {
    let p = compile(&RoutePath::from("/v1.0/(x)")).unwrap();
    assert!(p.is_match("/v1.0/(x)"));
    assert!(!p.is_match("/v1x0/(x)"));
}

#[test]
fn test_mixed_segment_with_explicit_name() {
    let p = compile(&RoutePath::from(("/css/*.css", ["filename"]))).unwrap();
    assert_eq!(p.names(), &[ParamName::from("filename")]);
    assert_eq!(p.captures("/css/screen.css"), Some(vec![some("screen")]));
    assert!(!p.is_match("/css/screen.js"));
}

#[test]
fn test_multiple_asterisks_in_one_segment_share_an_index() {
    let p = compile(&RoutePath::from("/img/*-*.png/:size")).unwrap();
    // two groups for the segment, but only one declared index
    assert_eq!(
        p.names(),
        &[ParamName::Positional(0), ParamName::from("size")]
    );
    assert_eq!(
        p.captures("/img/cat-small.png/2x"),
        Some(vec![some("cat"), some("small"), some("2x")])
    );
}

#[test]
fn test_positional_indexes_count_named_segments() {
    let p = compile(&RoutePath::from("/:lang/*/**")).unwrap();
    assert_eq!(
        p.names(),
        &[
            ParamName::from("lang"),
            ParamName::Positional(1),
            ParamName::Positional(2)
        ]
    );
}

#[test]
fn test_explicit_names_take_precedence() {
    let p = compile(&RoutePath::from(("/a/:x/*", ["first"]))).unwrap();
    assert_eq!(
        p.names(),
        &[ParamName::from("first"), ParamName::Positional(1)]
    );
}

#[test]
fn test_malformed_named_segment_is_literal() {
    let p = compile(&RoutePath::from("/a/:/b")).unwrap();
    assert!(p.names().is_empty());
    assert!(p.is_match("/a/:/b"));
    assert!(!p.is_match("/a/b"));
}

#[test]
fn test_raw_pattern() {
    let p = compile(&RoutePath::from(("^/posts/(\\d+)/(\\w+)", ["id", "slug"]))).unwrap();
    assert_eq!(p.matcher(), "(?i)^/posts/(\\d+)/(\\w+)$");
    assert_eq!(p.captures("/POSTS/7/hello"), Some(vec![some("7"), some("hello")]));
    assert!(!p.is_match("/posts/7/hello/more"));
}

#[test]
fn test_raw_pattern_keeps_existing_anchor_and_no_extraction() {
    let p = compile(&RoutePath::from("^/x/(.*)$")).unwrap();
    assert_eq!(p.matcher(), "(?i)^/x/(.*)$");
    assert!(p.names().is_empty());
}

#[test]
fn test_invalid_raw_pattern_fails_at_compile_time() {
    let err = compile(&RoutePath::from("^/broken/(")).unwrap_err();
    assert!(err.to_string().contains("/broken/("));
}

#[test]
fn test_compilation_is_deterministic() {
    let t = RoutePath::from("/shop/:category/*/items/**");
    let a = compile(&t).unwrap();
    let b = compile(&t).unwrap();
    assert_eq!(a.matcher(), b.matcher());
    assert_eq!(a.names(), b.names());
}
