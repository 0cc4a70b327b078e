mod common;

use common::run;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use zest::cli::build_dispatcher;
use zest::config::AppConfig;
use zest::dispatcher::{Body, Dispatcher};
use zest::static_files::CHUNK_SIZE;

struct PublicSite {
    _dir: TempDir,
    root: PathBuf,
    app: Dispatcher,
}

impl PublicSite {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("public");
        fs::create_dir_all(root.join("css")).unwrap();
        fs::write(root.join("css/site.css"), "body { margin: 0 }").unwrap();
        fs::write(root.join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        fs::write(dir.path().join("secret.txt"), "keep out").unwrap();

        let yaml = format!(
            "public_dir: {}\nroutes:\n  - path: /assets/**\n    handler: public\n",
            root.display()
        );
        let config = AppConfig::from_yaml_str(&yaml).unwrap();
        let app = build_dispatcher(config).unwrap();
        Self { _dir: dir, root, app }
    }
}

fn body_bytes(body: &Body) -> Vec<u8> {
    let mut out = Vec::new();
    body.write_to(&mut out).unwrap();
    out
}

#[test]
fn test_text_file_gets_charset() {
    let site = PublicSite::new();
    let res = run(&site.app, "GET", "/assets/css/site.css");
    assert_eq!(res.status, 200);
    assert_eq!(res.content_type(), Some("text/css; charset=utf-8"));
    assert_eq!(res.body, Body::File(site.root.join("css/site.css")));
    assert_eq!(body_bytes(&res.body), b"body { margin: 0 }");
}

#[test]
fn test_binary_file_has_plain_mime() {
    let site = PublicSite::new();
    let res = run(&site.app, "GET", "/assets/logo.png");
    assert_eq!(res.content_type(), Some("image/png"));
    assert_eq!(body_bytes(&res.body), vec![0x89, b'P', b'N', b'G']);
}

#[test]
fn test_missing_file_is_404() {
    let site = PublicSite::new();
    let res = run(&site.app, "GET", "/assets/nope.js");
    assert_eq!(res.status, 404);
    assert!(res.text().contains("unknown filename nope.js"));
}

#[test]
fn test_parent_directories_are_rejected() {
    let site = PublicSite::new();
    let res = run(&site.app, "GET", "/assets/../secret.txt");
    assert_eq!(res.status, 404);
    assert!(!res.text().contains("keep out"));
}

#[test]
fn test_render_file_streams_large_files_in_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.bin");
    let data: Vec<u8> = (0..CHUNK_SIZE * 2 + 17).map(|i| (i % 251) as u8).collect();
    fs::write(&path, &data).unwrap();

    let mut app = Dispatcher::default();
    let served = path.clone();
    app.get("/download", move |ctx, _args| ctx.render_file(&served))
        .unwrap();

    let res = run(&app, "GET", "/download");
    assert_eq!(res.content_type(), Some("application/octet-stream"));
    assert_eq!(body_bytes(&res.body), data);
}

#[test]
fn test_render_file_of_missing_path_is_404() {
    let mut app = Dispatcher::default();
    app.get("/download", |ctx, _args| ctx.render_file("/definitely/not/here.txt"))
        .unwrap();
    let res = run(&app, "GET", "/download");
    assert_eq!(res.status, 404);
    assert!(res.text().contains("unknown filename"));
}
