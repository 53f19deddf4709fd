//! Series metadata and project task templates over the fixture config

mod common;

use bifrost::ContextValue;
use common::fixtures::service;
use pretty_assertions::assert_eq;

#[test]
fn test_series_catalog_is_loaded() {
    let svc = service();
    let snapshot = svc.snapshot();
    let series = snapshot.series();
    assert_eq!(series.name(), "Harbor Lights");
    assert_eq!(series.episodes().len(), 2);
    assert_eq!(
        series.sequence("ep01", "seq002").map(|s| s.name.as_str()),
        Some("Market")
    );
    assert!(series.sequence("ep02", "seq002").is_none());
    assert_eq!(series.deliverables()[0].frame_rate, 25.0);

    let shared: Vec<&str> = series
        .shared_elements(Some("ep01"))
        .iter()
        .map(|e| e.id.as_ref())
        .collect();
    assert_eq!(shared, vec!["keeper"]);
}

#[test]
fn test_shot_context_resolves_worked_example() {
    let svc = service();
    assert_eq!(svc.generate_shot_id("ep01", "seq001", 10), "shot010");

    let ctx = svc
        .shot_context("ep01", "seq001", 10)
        .unwrap()
        .with("ROOT", "/proj")
        .with("VERSION", "v002")
        .with("DEPARTMENT", "anim");
    assert_eq!(ctx.get("SERIES"), Some(&ContextValue::from("s01")));

    let path = svc.resolve("main_studio", "shot_work_path", &ctx).unwrap();
    assert_eq!(path.as_str(), "/proj/shots/s01/ep01/seq001/shot010/v002/anim/");

    assert!(svc.shot_context("ep03", "seq001", 10).is_none());
}

#[test]
fn test_project_task_templates() {
    let svc = service();
    let lighting = svc.task_template("show_x", "lighting").unwrap();
    assert_eq!(lighting.name_template.as_deref(), Some("{SHOT}_lighting"));
    assert_eq!(lighting.estimated_hours, Some(6.0));
    assert!(svc.task_template("show_x", "animation").is_none());
    assert!(svc.task_template("show_y", "lighting").is_none());
}
