//! Snapshot reload: atomic swap and last-good fallback

mod common;

use std::fs;
use std::sync::Arc;

use bifrost::{Bifrost, ConfigSources, EventKind, EventLog, Platform, SnapshotStore};
use common::fixtures::{shot_context, writable_config};

fn open(dir: &camino::Utf8Path) -> Bifrost {
    let store = SnapshotStore::load(ConfigSources::from_dir(dir), EventLog::new()).unwrap();
    Bifrost::new(Arc::new(store)).with_platform(Platform::Posix)
}

#[test]
fn test_reload_picks_up_new_templates() {
    let (_tmp, dir) = writable_config();
    let svc = open(&dir);
    let ctx = shot_context("/proj", "shot010");
    let held = svc.snapshot();

    let mapping = fs::read_to_string(dir.join("folder_mapping.yaml")).unwrap();
    fs::write(
        dir.join("folder_mapping.yaml"),
        mapping.replace("{ROOT}/shots/", "{ROOT}/episodic/"),
    )
    .unwrap();

    let fresh = svc.reload().unwrap();
    assert_eq!(fresh.generation(), held.generation() + 1);
    assert_eq!(
        svc.resolve("main_studio", "shot_work_path", &ctx).unwrap().as_str(),
        "/proj/episodic/s01/ep01/seq001/shot010/v002/anim/"
    );

    // Work started on the old snapshot keeps seeing it in full
    let template = held.registry().lookup("main_studio", "shot_work_path").unwrap();
    assert!(template.raw().contains("/shots/"));
}

#[test]
fn test_reload_keeps_last_good_on_cycle() {
    let (_tmp, dir) = writable_config();
    let svc = open(&dir);
    let before = svc.snapshot().fingerprint();

    let deps = fs::read_to_string(dir.join("dependencies.yaml")).unwrap();
    fs::write(
        dir.join("dependencies.yaml"),
        deps.replace(
            "  - id: layout\n    name: Layout\n",
            "  - id: layout\n    name: Layout\n    requires:\n      - { department: lighting }\n",
        ),
    )
    .unwrap();

    let err = svc.reload().unwrap_err();
    assert_eq!(err.code(), "BIF-050");
    assert!(err.to_string().contains("→"));
    assert_eq!(svc.snapshot().fingerprint(), before);
    assert_eq!(svc.snapshot().generation(), 1);

    let rejected = svc
        .events()
        .events()
        .into_iter()
        .any(|e| matches!(e.kind, EventKind::ReloadRejected { active_generation: 1, .. }));
    assert!(rejected);
}

#[test]
fn test_reload_rejects_broken_project_override() {
    let (_tmp, dir) = writable_config();
    let svc = open(&dir);

    fs::write(
        dir.join("projects/show_z.yaml"),
        "custom_department_dependencies:\n  sound:\n    requires: []\n",
    )
    .unwrap();

    assert_eq!(svc.reload().unwrap_err().code(), "BIF-051");
    assert!(svc.snapshot().engine().project("show_z").is_none());
}

#[test]
fn test_readers_during_reload_see_whole_snapshots() {
    let (_tmp, dir) = writable_config();
    let svc = open(&dir);
    let ctx = shot_context("/proj", "shot010");

    let mapping = fs::read_to_string(dir.join("folder_mapping.yaml")).unwrap();
    fs::write(
        dir.join("folder_mapping.yaml"),
        mapping.replace("{ROOT}/shots/", "{ROOT}/episodic/"),
    )
    .unwrap();

    let (svc, ctx) = (&svc, &ctx);
    std::thread::scope(|s| {
        let readers: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(move || {
                    for _ in 0..50 {
                        let path = svc.resolve("main_studio", "shot_work_path", ctx).unwrap();
                        assert!(
                            path.as_str() == "/proj/shots/s01/ep01/seq001/shot010/v002/anim/"
                                || path.as_str()
                                    == "/proj/episodic/s01/ep01/seq001/shot010/v002/anim/"
                        );
                    }
                })
            })
            .collect();
        svc.reload().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    });
}
