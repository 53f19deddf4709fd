//! Path resolution and cross-studio translation over the fixture config

mod common;

use std::collections::BTreeMap;

use bifrost::{Context, ContextValue, EventKind, Platform};
use common::fixtures::{service, shot_context};
use pretty_assertions::assert_eq;

#[test]
fn test_worked_example_resolves() {
    let svc = service();
    let path = svc
        .resolve("main_studio", "shot_work_path", &shot_context("/proj", "shot010"))
        .unwrap();
    assert_eq!(path.as_str(), "/proj/shots/s01/ep01/seq001/shot010/v002/anim/");
    assert!(path.is_directory());
    assert_eq!(path.studio(), "main_studio");
}

#[test]
fn test_resolution_is_deterministic_across_threads() {
    let svc = service();
    let ctx = shot_context("/proj", "shot010");
    let expected = svc.resolve("partner_studio", "shot_work_path", &ctx).unwrap();

    let (svc, ctx) = (&svc, &ctx);
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(move || svc.resolve("partner_studio", "shot_work_path", ctx).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_child_studio_inherits_parent_template() {
    let svc = service();
    let ctx = shot_context("/mnt", "shot010");
    let remote = svc.resolve("remote_studio", "shot_work_path", &ctx).unwrap();
    let partner = svc.resolve("partner_studio", "shot_work_path", &ctx).unwrap();
    assert_eq!(remote.as_str(), partner.as_str());
    assert_eq!(remote.as_str(), "/mnt/ext/ep01_seq001_shot010/anim/v002/");
}

#[test]
fn test_default_studio_is_last_fallback() {
    let svc = service();
    let ctx = Context::builder()
        .set("ROOT", "/mnt")
        .set("PROJECT", "show")
        .asset("character", "hero")
        .set("VERSION", "v001")
        .build();
    let path = svc.resolve("remote_studio", "asset_published_path", &ctx).unwrap();
    assert_eq!(path.as_str(), "/mnt/show/assets/character/hero/published/v001/");
}

#[test]
fn test_optional_variable_collapses_segment() {
    let svc = service();
    let ctx = Context::from_pairs([("ROOT", "/mnt"), ("SHOT", "shot010")]);
    let path = svc.resolve("main_studio", "render_path", &ctx).unwrap();
    assert_eq!(path.as_str(), "/mnt/render/shot010/");

    let layered = ctx.with("LAYER", "beauty");
    let path = svc.resolve("main_studio", "render_path", &layered).unwrap();
    assert_eq!(path.as_str(), "/mnt/render/shot010/beauty/");
}

#[test]
fn test_missing_required_variable_names_it() {
    let svc = service();
    let ctx = shot_context("/proj", "shot010").with("PROJECT", "show");
    let err = svc
        .resolve("main_studio", "asset_published_path", &ctx)
        .unwrap_err();
    assert_eq!(err.code(), "BIF-030");
    assert!(err.to_string().contains("ASSET_TYPE"));
}

#[test]
fn test_pattern_violation_is_rejected() {
    let svc = service();
    let ctx = shot_context("/proj", "shot010").with("VERSION", "2");
    let err = svc.resolve("main_studio", "shot_work_path", &ctx).unwrap_err();
    assert_eq!(err.code(), "BIF-031");
    assert!(err.to_string().contains("VERSION"));
}

#[test]
fn test_studio_variable_override_applies_only_there() {
    let svc = service();
    let ctx = shot_context("/proj", "shot010").with("EPISODE", "pilot");
    assert!(svc.resolve("main_studio", "shot_work_path", &ctx).is_ok());
    let err = svc.resolve("partner_studio", "shot_work_path", &ctx).unwrap_err();
    assert_eq!(err.code(), "BIF-031");
}

#[test]
fn test_unknown_lookups() {
    let svc = service();
    let ctx = shot_context("/proj", "shot010");
    assert_eq!(
        svc.resolve("main_studio", "nope_path", &ctx).unwrap_err().code(),
        "BIF-020"
    );
    assert_eq!(
        svc.resolve("ghost_studio", "shot_work_path", &ctx).unwrap_err().code(),
        "BIF-021"
    );
}

#[test]
fn test_windows_platform_separators() {
    let svc = service().with_platform(Platform::Windows);
    let path = svc
        .resolve("main_studio", "shot_work_path", &shot_context("P:", "shot010"))
        .unwrap();
    assert_eq!(path.as_str(), r"P:\shots\s01\ep01\seq001\shot010\v002\anim\");
}

#[test]
fn test_translation_round_trip_is_stable() {
    let svc = service();
    let ctx = shot_context("/proj", "shot010");
    let original = svc.resolve("main_studio", "shot_work_path", &ctx).unwrap();

    let there = svc
        .translate(&ctx, "shot_work_path", "main_studio", "partner_studio")
        .unwrap();
    assert_eq!(there.from, original);
    assert_eq!(there.to.as_str(), "/proj/ext/ep01_seq001_shot010/anim/v002/");

    let back = svc
        .translate(&ctx, "shot_work_path", "partner_studio", "main_studio")
        .unwrap();
    assert_eq!(back.to, original);
}

#[test]
fn test_translation_is_logged() {
    let svc = service();
    let ctx = shot_context("/proj", "shot010");
    svc.translate(&ctx, "shot_work_path", "main_studio", "partner_studio")
        .unwrap();

    let events = svc.events().events();
    let translated = events
        .iter()
        .find(|e| matches!(e.kind, EventKind::PathTranslated { .. }))
        .expect("translation event");
    match &translated.kind {
        EventKind::PathTranslated { from_studio, to_studio, .. } => {
            assert_eq!(from_studio.as_ref(), "main_studio");
            assert_eq!(to_studio.as_ref(), "partner_studio");
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_context_defaults_fill_gaps() {
    let defaults: BTreeMap<String, ContextValue> =
        [("ROOT".to_string(), ContextValue::from("/studio"))].into_iter().collect();
    let svc = service().with_defaults(defaults);

    let ctx = Context::builder()
        .set("SERIES", "s01")
        .set("EPISODE", "ep01")
        .shot("seq001", "shot010")
        .set("VERSION", "v002")
        .set("DEPARTMENT", "anim")
        .build();
    let path = svc.resolve("main_studio", "shot_work_path", &ctx).unwrap();
    assert!(path.as_str().starts_with("/studio/shots/"));

    // Supplied values win over defaults
    let path = svc
        .resolve("main_studio", "shot_work_path", &shot_context("/mine", "shot010"))
        .unwrap();
    assert!(path.as_str().starts_with("/mine/shots/"));
}
