use zest::config::AppConfig;
use zest::router::{RouteOptions, RouteTable};

const ZOO_CONFIG: &str = r#"
routes:
  - path: /
    handler: index
  - path: /animals/:kind
    handler: show_animal
  - path: /animals/:kind/:name
    handler: show_named
  - path: /files/**
    handler: files
  - path: /pages/*
    handler: page
    params:
      "0": home
  - method: POST
    path: /animals/:kind
    handler: create_animal
  - method: DELETE
    path: /animals/:kind/:name
    handler: delete_animal
  - path: "^/feeding/(\\d+)/(\\w+)?$"
    names: [hour]
    handler: feeding
"#;

fn zoo() -> RouteTable {
    AppConfig::from_yaml_str(ZOO_CONFIG)
        .unwrap()
        .build_routes()
        .unwrap()
}

#[test]
fn test_config_routes_resolve_in_declaration_order() {
    let table = zoo();
    // 6 GET routes mirrored as HEAD, plus POST and DELETE
    assert_eq!(table.len(), 14);

    assert_eq!(table.find("GET", "/").unwrap().handler_name(), "index");
    assert_eq!(
        table.find("GET", "/animals/otter").unwrap().handler_name(),
        "show_animal"
    );
    let m = table.find("GET", "/animals/otter/olive").unwrap();
    assert_eq!(m.handler_name(), "show_named");
    assert_eq!(m.args(), vec![Some("otter".into()), Some("olive".into())]);
}

#[test]
fn test_methods_select_distinct_routes() {
    let table = zoo();
    assert_eq!(
        table.find("POST", "/animals/otter").unwrap().handler_name(),
        "create_animal"
    );
    assert_eq!(
        table.find("delete", "/animals/otter/olive").unwrap().handler_name(),
        "delete_animal"
    );
    assert!(table.find("PUT", "/animals/otter").is_none());
    assert_eq!(
        table.find("HEAD", "/animals/otter").unwrap().handler_name(),
        "show_animal"
    );
}

#[test]
fn test_double_asterisk_spans_segments() {
    let table = zoo();
    let m = table.find("GET", "/files/docs/2024/report.pdf").unwrap();
    assert_eq!(m.params.positional(0), Some("docs/2024/report.pdf"));

    let m = table.find("GET", "/files").unwrap();
    assert_eq!(m.params.positional(0), None);
}

#[test]
fn test_default_survives_absent_capture() {
    let table = zoo();
    let m = table.find("GET", "/pages").unwrap();
    assert_eq!(m.params.positional(0), Some("home"));

    let m = table.find("GET", "/pages/about").unwrap();
    assert_eq!(m.params.positional(0), Some("about"));
}

#[test]
fn test_raw_pattern_names_and_positional_surplus() {
    let table = zoo();
    let m = table.find("GET", "/feeding/9/fish").unwrap();
    assert_eq!(m.handler_name(), "feeding");
    assert_eq!(m.params.get("hour"), Some("9"));
    assert_eq!(m.params.positional(1), Some("fish"));

    let m = table.find("GET", "/feeding/9/").unwrap();
    assert_eq!(m.params.positional(1), None);
    assert!(table.find("GET", "/feeding/noon").is_none());
}

#[test]
fn test_trailing_slash_and_case_are_tolerated() {
    let table = zoo();
    assert_eq!(
        table.find("GET", "/Animals/otter/").unwrap().handler_name(),
        "show_animal"
    );
}

#[test]
fn test_named_segment_requires_a_value() {
    let mut table = RouteTable::new();
    table
        .dispatch_get("/tickets/:id", "ticket", RouteOptions::new())
        .unwrap();
    assert!(table.find("GET", "/tickets").is_none());
    assert!(table.find("GET", "/tickets/").is_none());
    assert!(table.find("GET", "/tickets/a/b").is_none());
    assert!(table.find("GET", "/tickets/7").is_some());
}

#[test]
fn test_toml_config_builds_same_table() {
    let config = AppConfig::from_toml_str(
        r#"
[[routes]]
path = "/animals/:kind"
handler = "show_animal"

[[routes]]
method = "PUT"
path = "/animals/:kind"
handler = "update_animal"
"#,
    )
    .unwrap();
    let table = config.build_routes().unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(
        table.find("PUT", "/animals/otter").unwrap().handler_name(),
        "update_animal"
    );
}

#[test]
fn test_invalid_raw_pattern_in_config_fails_build() {
    let config = AppConfig::from_yaml_str(
        r#"
routes:
  - path: "^/broken/(\\d+$"
    handler: broken
"#,
    )
    .unwrap();
    assert!(config.build_routes().is_err());
}
