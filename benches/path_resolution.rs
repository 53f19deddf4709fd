//! Benchmark: Path Resolution
//!
//! Measures template resolution, cross-studio translation and department
//! graph construction.
//! Run: cargo bench --bench path_resolution

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use bifrost::ast::{DependenciesDoc, FolderMappingDoc};
use bifrost::template::ConfigVars;
use bifrost::{Context, DepartmentGraph, MappingRegistry, Platform, Resolver, Translator};

const MAPPING: &str = r#"
default_studio: main
variables:
  VERSION: { type: string, pattern: "^v[0-9]{3}$" }
studio_mappings:
  main:
    templates:
      shot_work_path: "{ROOT}/shots/{SERIES}/{EPISODE}/{SEQUENCE}/{SHOT}/{VERSION}/{DEPARTMENT}/"
  partner:
    parent: main
    templates:
      shot_work_path: "{ROOT}/ext/{EPISODE}_{SEQUENCE}_{SHOT}/{DEPARTMENT}/{VERSION}/"
  remote:
    parent: partner
"#;

fn registry() -> MappingRegistry {
    let doc = FolderMappingDoc::parse(MAPPING).unwrap();
    MappingRegistry::build(&doc, &ConfigVars::new()).unwrap()
}

fn shot_context() -> Context {
    Context::builder()
        .set("ROOT", "/proj")
        .set("SERIES", "s01")
        .set("EPISODE", "ep01")
        .shot("seq001", "shot010")
        .set("VERSION", "v002")
        .set("DEPARTMENT", "anim")
        .build()
}

/// Linear department chain: d1 requires d0, d2 requires d1, ...
fn linear_departments(size: usize) -> String {
    let mut yaml = String::from("departments:\n  - id: d0\n");
    for i in 1..size {
        yaml.push_str(&format!(
            "  - id: d{i}\n    requires: [{{ department: d{} }}]\n",
            i - 1
        ));
    }
    yaml
}

fn bench_resolve(c: &mut Criterion) {
    let reg = registry();
    let resolver = Resolver::new(&reg).with_platform(Platform::Posix);
    let ctx = shot_context();

    let mut group = c.benchmark_group("resolve");
    for studio in ["main", "partner", "remote"] {
        group.bench_with_input(BenchmarkId::from_parameter(studio), &studio, |b, studio| {
            b.iter(|| {
                resolver
                    .resolve(black_box(studio), "shot_work_path", black_box(&ctx))
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_translate(c: &mut Criterion) {
    let reg = registry();
    let translator = Translator::new(Resolver::new(&reg).with_platform(Platform::Posix));
    let ctx = shot_context();

    c.bench_function("translate/main_to_partner", |b| {
        b.iter(|| {
            translator
                .translate_pair(black_box(&ctx), "shot_work_path", "main", "partner")
                .unwrap()
        })
    });
}

fn bench_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("department_graph");
    for size in [10, 50, 200] {
        let doc = DependenciesDoc::parse(&linear_departments(size)).unwrap();
        group.bench_with_input(BenchmarkId::new("build_and_validate", size), &doc, |b, doc| {
            b.iter(|| DepartmentGraph::from_doc(black_box(doc)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resolve, bench_translate, bench_graph);
criterion_main!(benches);
