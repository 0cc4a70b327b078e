mod common;

use common::run;
use std::fs;
use zest::cascade::{Condition, ANY_HTTP_STATUS, ANY_RUNTIME_ERROR, RUNTIME_ERROR};
use zest::config::AppConfig;
use zest::dispatcher::{Body, Dispatcher};
use zest::halt;

fn app_with_routes() -> Dispatcher {
    let mut app = Dispatcher::default();
    app.get("/gone", |_ctx, _args| Err(halt!(410))).unwrap();
    app.get("/lost", |_ctx, _args| Err(halt!(404))).unwrap();
    app.get("/crash", |_ctx, _args| {
        Err(Condition::new(RUNTIME_ERROR, "disk on fire"))
    })
    .unwrap();
    app
}

#[test]
fn test_first_accepting_handler_wins() {
    let mut app = app_with_routes();
    app.error(410u16, |ctx, _c: &Condition| {
        ctx.status(410);
        Body::from("specific")
    });
    app.error(ANY_HTTP_STATUS, |ctx, c: &Condition| {
        ctx.status(c.http_status());
        Body::from("any http")
    });

    assert_eq!(run(&app, "GET", "/gone").text(), "specific");
    let res = run(&app, "GET", "/lost");
    assert_eq!(res.status, 404);
    assert_eq!(res.text(), "any http");
}

#[test]
fn test_any_http_status_skips_runtime_errors() {
    let mut app = app_with_routes();
    app.error(ANY_HTTP_STATUS, |_ctx, _c: &Condition| Body::from("http"));

    let res = run(&app, "GET", "/crash");
    assert_eq!(res.status, 500);
    assert!(res.text().contains("Internal Server Error"));
}

#[test]
fn test_runtime_marker_catches_everything() {
    let mut app = app_with_routes();
    app.error(ANY_RUNTIME_ERROR, |ctx, c: &Condition| {
        ctx.status(503);
        Body::from(format!("caught {}", c.number))
    });

    let res = run(&app, "GET", "/crash");
    assert_eq!(res.status, 503);
    assert_eq!(res.text(), "caught 65536");
    assert_eq!(run(&app, "GET", "/gone").text(), "caught 410");
}

#[test]
fn test_several_numbers_in_one_registration() {
    let mut app = app_with_routes();
    app.error([404u32, 410], |ctx, c: &Condition| {
        ctx.status(c.http_status());
        Body::from("missing")
    });
    assert_eq!(run(&app, "GET", "/gone").text(), "missing");
    assert_eq!(run(&app, "GET", "/lost").text(), "missing");
    assert_eq!(run(&app, "GET", "/crash").status, 500);
}

#[test]
fn test_bare_404_halt_reports_request_path() {
    let app = app_with_routes();
    let res = run(&app, "GET", "/lost");
    assert_eq!(res.status, 404);
    assert!(res.text().contains("Page not found:"));
    assert!(res.text().contains("<code>/lost</code>"));
}

#[test]
fn test_not_found_page_decodes_and_escapes_path() {
    let app = app_with_routes();
    let res = run(&app, "GET", "/a%3Cb%3E");
    assert_eq!(res.status, 404);
    assert!(res.text().contains("/a&lt;b&gt;"));
    assert!(!res.text().contains("<b>"));
}

#[test]
fn test_default_page_overrides() {
    let mut app = app_with_routes();
    app.cascade_mut()
        .set_not_found(|_ctx, c: &Condition| Body::from(format!("nothing at {}", c.message)));
    app.cascade_mut()
        .set_server_error(|_ctx, c: &Condition| Body::from(format!("failed with {}", c.number)));

    let res = run(&app, "GET", "/lost");
    assert_eq!(res.status, 404);
    assert_eq!(res.text(), "nothing at /lost");

    let res = run(&app, "GET", "/gone");
    assert_eq!(res.status, 410);
    assert_eq!(res.text(), "failed with 410");
}

#[test]
fn test_error_layout_from_views_dir() {
    let views = tempfile::tempdir().unwrap();
    fs::write(
        views.path().join("oops.html"),
        "<section class=\"error\">{{ content }}</section>",
    )
    .unwrap();
    let config = AppConfig {
        views_dir: Some(views.path().to_path_buf()),
        ..AppConfig::default()
    };
    let mut app = Dispatcher::new(config);
    app.get("/gone", |_ctx, _args| Err(halt!(410, "moved away"))).unwrap();
    app.cascade_mut().set_layout(Some("oops.html".to_owned()));

    let res = run(&app, "GET", "/gone");
    assert_eq!(res.status, 410);
    assert!(res.text().starts_with("<section class=\"error\">"));
    assert!(res.text().contains("410 Gone"));
    assert!(res.text().contains("moved away"));
}

#[test]
fn test_reset_restores_default_handler() {
    let mut app = app_with_routes();
    app.error(ANY_RUNTIME_ERROR, |_ctx, _c: &Condition| Body::from("custom"));
    app.cascade_mut().reset();
    assert_eq!(app.cascade().entries().count(), 1);
    assert!(run(&app, "GET", "/gone").text().contains("410 Gone"));
}
