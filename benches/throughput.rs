#![allow(clippy::unwrap_used)]

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use zest::config::AppConfig;
use zest::dispatcher::{Body, Dispatcher};
use zest::request::RequestEnv;
use zest::router::RouteTable;

fn example_config() -> &'static str {
    r#"
routes:
  - { path: "/", handler: root_handler }
  - { path: "/zoo/animals", handler: get_animals }
  - { method: POST, path: "/zoo/animals", handler: create_animal }
  - { path: "/zoo/animals/:id", handler: get_animal }
  - { method: PUT, path: "/zoo/animals/:id", handler: update_animal }
  - { method: DELETE, path: "/zoo/animals/:id", handler: delete_animal }
  - { path: "/zoo/animals/:id/toys/:toy_id", handler: animal_toy }
  - { path: "/zoo/:category/animals/:id/habitats/:habitat_id/sections/:section_id", handler: habitat_section }
  - { method: POST, path: "/inventory/:warehouse/feeds/:feed/items/:item/batches/:batch", handler: post_item_batch }
  - { path: "/complex/:a/:b/:c/:d/:e/:f/:g/:h/:i", handler: complex_many_params }
  - { path: "/assets/**", handler: assets }
  - { path: "/img/*.png", handler: images }
"#
}

fn table() -> RouteTable {
    AppConfig::from_yaml_str(example_config())
        .unwrap()
        .build_routes()
        .unwrap()
}

fn bench_route_throughput(c: &mut Criterion) {
    let table = table();
    let test_paths = [
        ("GET", "/zoo/animals/123"),
        ("GET", "/zoo/animals/123/toys/456"),
        ("GET", "/zoo/cats/animals/123/habitats/88/sections/5"),
        ("POST", "/inventory/1/feeds/2/items/3/batches/4"),
        ("GET", "/complex/1/2/3/4/5/6/7/8/9"),
        ("GET", "/assets/css/site/main.css"),
        ("HEAD", "/img/logo.png"),
        ("GET", "/does/not/exist"),
    ];
    c.bench_function("route_match", |b| {
        b.iter(|| {
            for (method, path) in &test_paths {
                black_box(table.find(method, path));
            }
        });
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let mut app = Dispatcher::default();
    app.get("/zoo/animals/:id", |_ctx, args| {
        Ok(Some(Body::from(args[0].clone().unwrap_or_default())))
    })
    .unwrap();
    c.bench_function("dispatch_run", |b| {
        b.iter(|| {
            let env = RequestEnv::builder("GET", "/zoo/animals/42").build();
            black_box(app.run(env));
        });
    });
}

criterion_group!(benches, bench_route_throughput, bench_dispatch);
criterion_main!(benches);
