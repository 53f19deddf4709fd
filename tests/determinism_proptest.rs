//! Property tests: resolution is a pure function of its inputs

mod common;

use bifrost::Context;
use common::fixtures::service;
use proptest::prelude::*;

fn shot_context() -> impl Strategy<Value = Context> {
    (
        "[a-z][a-z0-9_]{0,8}",
        "ep[0-9]{2}",
        "seq[0-9]{3}",
        "shot[0-9]{3}",
        "v[0-9]{3}",
        prop::sample::select(vec!["anim", "layout", "lighting"]),
    )
        .prop_map(|(series, episode, sequence, shot, version, dept)| {
            Context::builder()
                .set("ROOT", "/proj")
                .set("SERIES", series)
                .set("EPISODE", episode)
                .shot(&sequence, &shot)
                .set("VERSION", version)
                .set("DEPARTMENT", dept)
                .build()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn resolve_is_deterministic(ctx in shot_context()) {
        let svc = service();
        let a = svc.resolve("main_studio", "shot_work_path", &ctx).unwrap();
        let b = svc.resolve("main_studio", "shot_work_path", &ctx.clone()).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn resolved_paths_are_normalized(ctx in shot_context()) {
        let svc = service();
        for studio in ["main_studio", "partner_studio", "remote_studio"] {
            let path = svc.resolve(studio, "shot_work_path", &ctx).unwrap();
            prop_assert!(!path.as_str().contains("//"));
            prop_assert!(path.as_str().ends_with('/'));
        }
    }

    #[test]
    fn translation_never_changes_the_source(ctx in shot_context()) {
        let svc = service();
        let original = svc.resolve("main_studio", "shot_work_path", &ctx).unwrap();
        let there = svc.translate(&ctx, "shot_work_path", "main_studio", "partner_studio").unwrap();
        let back = svc.translate(&ctx, "shot_work_path", "partner_studio", "main_studio").unwrap();
        prop_assert_eq!(&there.from, &original);
        prop_assert_eq!(&back.to, &original);
    }
}
