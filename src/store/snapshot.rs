//! Snapshot + SnapshotStore

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{info, instrument, warn};
use xxhash_rust::xxh3::Xxh3;

use crate::ast::{DependenciesDoc, FolderMappingDoc, ProjectDoc};
use crate::error::{BifrostError, Result};
use crate::event::{EventKind, EventLog};
use crate::mapping::MappingRegistry;
use crate::series::SeriesCatalog;
use crate::template::ConfigVars;
use crate::util::constants::{DEPENDENCIES_FILE, FOLDER_MAPPING_FILE, PROJECTS_DIR, SERIES_FILE};
use crate::workflow::WorkflowEngine;

/// Suffix stripped from project file stems (`show_x_pipeline.yaml` → `show_x`)
const PROJECT_FILE_SUFFIX: &str = "_pipeline";

/// Locations of the pipeline documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSources {
    pub dependencies: Utf8PathBuf,
    pub folder_mapping: Utf8PathBuf,
    /// Optional: a missing directory means no project overrides
    pub projects_dir: Utf8PathBuf,
    /// Optional: a missing file means an empty series catalog
    pub series: Utf8PathBuf,
    pub template_vars: ConfigVars,
}

impl ConfigSources {
    /// Standard layout under one directory
    pub fn from_dir(dir: impl AsRef<Utf8Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            dependencies: dir.join(DEPENDENCIES_FILE),
            folder_mapping: dir.join(FOLDER_MAPPING_FILE),
            projects_dir: dir.join(PROJECTS_DIR),
            series: dir.join(SERIES_FILE),
            template_vars: ConfigVars::new(),
        }
    }

    pub fn with_template_vars(mut self, vars: ConfigVars) -> Self {
        self.template_vars = vars;
        self
    }

    /// Read every document; projects sorted by name
    fn read(&self) -> Result<RawDocuments> {
        let dependencies = read_document(&self.dependencies)?;
        let folder_mapping = read_document(&self.folder_mapping)?;

        let mut projects = Vec::new();
        let mut seen: BTreeMap<String, Utf8PathBuf> = BTreeMap::new();
        if self.projects_dir.is_dir() {
            let entries = fs::read_dir(&self.projects_dir).map_err(|e| BifrostError::ConfigLoad {
                document: self.projects_dir.to_string(),
                reason: e.to_string(),
            })?;
            for entry in entries {
                let entry = entry.map_err(|e| BifrostError::ConfigLoad {
                    document: self.projects_dir.to_string(),
                    reason: e.to_string(),
                })?;
                let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
                    warn!(path = %entry.path().display(), "Skipping non UTF-8 project file");
                    continue;
                };
                if !matches!(path.extension(), Some("yaml" | "yml")) {
                    continue;
                }
                let Some(stem) = path.file_stem() else { continue };
                let name = stem.strip_suffix(PROJECT_FILE_SUFFIX).unwrap_or(stem).to_string();
                if let Some(other) = seen.get(&name) {
                    let mut files = [other.as_str(), path.as_str()];
                    files.sort_unstable();
                    return Err(BifrostError::ConfigLoad {
                        document: self.projects_dir.to_string(),
                        reason: format!(
                            "project '{}' is defined by both {} and {}",
                            name, files[0], files[1]
                        ),
                    });
                }
                projects.push((name.clone(), read_document(&path)?));
                seen.insert(name, path);
            }
        }
        projects.sort_by(|a, b| a.0.cmp(&b.0));

        let series = if self.series.is_file() {
            Some(read_document(&self.series)?)
        } else {
            None
        };

        Ok(RawDocuments {
            dependencies,
            folder_mapping,
            projects,
            series,
        })
    }
}

fn read_document(path: &Utf8Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| BifrostError::ConfigLoad {
        document: path.to_string(),
        reason: e.to_string(),
    })
}

struct RawDocuments {
    dependencies: String,
    folder_mapping: String,
    projects: Vec<(String, String)>,
    series: Option<String>,
}

/// Immutable compiled configuration
#[derive(Debug)]
pub struct Snapshot {
    generation: u64,
    fingerprint: u64,
    loaded_at: DateTime<Utc>,
    registry: Arc<MappingRegistry>,
    engine: WorkflowEngine,
    series: SeriesCatalog,
}

impl Snapshot {
    /// Read and compile the documents named by `sources`
    pub fn load(sources: &ConfigSources, generation: u64) -> Result<Self> {
        let raw = sources.read()?;
        let projects: Vec<(&str, &str)> = raw
            .projects
            .iter()
            .map(|(n, y)| (n.as_str(), y.as_str()))
            .collect();
        let snapshot = Self::from_documents(
            &raw.folder_mapping,
            &raw.dependencies,
            &projects,
            &sources.template_vars,
            generation,
        )?;
        match &raw.series {
            Some(yaml) => snapshot.with_series(yaml),
            None => Ok(snapshot),
        }
    }

    /// Compile in-memory documents; `projects` pairs are `(name, yaml)`
    pub fn from_documents(
        folder_mapping: &str,
        dependencies: &str,
        projects: &[(&str, &str)],
        template_vars: &ConfigVars,
        generation: u64,
    ) -> Result<Self> {
        let mapping_doc = FolderMappingDoc::parse(folder_mapping).map_err(|e| tag(e, FOLDER_MAPPING_FILE))?;
        let deps_doc = DependenciesDoc::parse(dependencies).map_err(|e| tag(e, DEPENDENCIES_FILE))?;
        let mut names = BTreeSet::new();
        for (name, _) in projects {
            if !names.insert(*name) {
                return Err(BifrostError::ConfigLoad {
                    document: PROJECTS_DIR.to_string(),
                    reason: format!("project '{}' is defined more than once", name),
                });
            }
        }
        let project_docs = projects
            .iter()
            .map(|(name, yaml)| {
                ProjectDoc::parse(name, yaml).map_err(|e| tag(e, &format!("{}/{}.yaml", PROJECTS_DIR, name)))
            })
            .collect::<Result<Vec<_>>>()?;

        let registry = MappingRegistry::build(&mapping_doc, template_vars)?;
        let engine = WorkflowEngine::build(&deps_doc, &project_docs)?;

        let mut hasher = Xxh3::new();
        for doc in [folder_mapping, dependencies] {
            hasher.update(doc.as_bytes());
            hasher.update(&[0]);
        }
        for (name, yaml) in projects {
            hasher.update(name.as_bytes());
            hasher.update(yaml.as_bytes());
            hasher.update(&[0]);
        }
        for (key, value) in template_vars {
            hasher.update(key.as_bytes());
            hasher.update(value.as_bytes());
        }

        Ok(Self {
            generation,
            fingerprint: hasher.digest(),
            loaded_at: Utc::now(),
            registry: Arc::new(registry),
            engine,
            series: SeriesCatalog::default(),
        })
    }

    /// Attach a series metadata document; it joins the fingerprint
    pub fn with_series(mut self, yaml: &str) -> Result<Self> {
        self.series = SeriesCatalog::parse(yaml).map_err(|e| tag(e, SERIES_FILE))?;
        let mut hasher = Xxh3::new();
        hasher.update(&self.fingerprint.to_le_bytes());
        hasher.update(yaml.as_bytes());
        self.fingerprint = hasher.digest();
        Ok(self)
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// xxh3 of the source documents
    #[inline]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn fingerprint_hex(&self) -> String {
        format!("{:016x}", self.fingerprint)
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    #[inline]
    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    /// Shared handle for work that outlives a borrow (blocking scans)
    pub fn registry_arc(&self) -> Arc<MappingRegistry> {
        Arc::clone(&self.registry)
    }

    #[inline]
    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    /// Episodic metadata; empty when no series document exists
    #[inline]
    pub fn series(&self) -> &SeriesCatalog {
        &self.series
    }

    fn loaded_event(&self) -> EventKind {
        EventKind::SnapshotLoaded {
            generation: self.generation,
            fingerprint: self.fingerprint_hex(),
            studios: self.registry.studio_ids().len(),
            departments: self.engine.global_graph().departments().count(),
            projects: self.engine.project_names().len(),
        }
    }
}

/// Parse errors do not say which document they came from; load errors do
fn tag(err: BifrostError, document: &str) -> BifrostError {
    match err {
        BifrostError::YamlParse(e) => BifrostError::ConfigLoad {
            document: document.to_string(),
            reason: e.to_string(),
        },
        other => other,
    }
}

/// Holder of the active snapshot
pub struct SnapshotStore {
    sources: ConfigSources,
    current: RwLock<Arc<Snapshot>>,
    next_generation: AtomicU64,
    /// Serializes reloads; readers never take it
    reload_lock: Mutex<()>,
    events: EventLog,
}

impl SnapshotStore {
    /// Load the first snapshot; fails if the documents are invalid
    #[instrument(skip_all, fields(dir = %sources.folder_mapping))]
    pub fn load(sources: ConfigSources, events: EventLog) -> Result<Self> {
        let snapshot = Snapshot::load(&sources, 1)?;
        info!(
            generation = 1,
            fingerprint = %snapshot.fingerprint_hex(),
            "Loaded pipeline configuration"
        );
        events.emit(snapshot.loaded_event());
        Ok(Self {
            sources,
            current: RwLock::new(Arc::new(snapshot)),
            next_generation: AtomicU64::new(2),
            reload_lock: Mutex::new(()),
            events,
        })
    }

    /// Store around an already compiled snapshot
    pub fn from_snapshot(snapshot: Snapshot, sources: ConfigSources, events: EventLog) -> Self {
        let next = snapshot.generation + 1;
        events.emit(snapshot.loaded_event());
        Self {
            sources,
            current: RwLock::new(Arc::new(snapshot)),
            next_generation: AtomicU64::new(next),
            reload_lock: Mutex::new(()),
            events,
        }
    }

    /// Active snapshot (cheap: one `Arc` clone)
    #[inline]
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn sources(&self) -> &ConfigSources {
        &self.sources
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Re-read the documents and swap in the result
    ///
    /// On error the active snapshot is unchanged and the error is returned.
    #[instrument(skip_all)]
    pub fn reload(&self) -> Result<Arc<Snapshot>> {
        let _guard = self.reload_lock.lock();
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);

        match Snapshot::load(&self.sources, generation) {
            Ok(snapshot) => {
                let unchanged = snapshot.fingerprint == self.current().fingerprint;
                info!(
                    generation,
                    fingerprint = %snapshot.fingerprint_hex(),
                    unchanged,
                    "Reloaded pipeline configuration"
                );
                self.swap(snapshot);
                Ok(self.current())
            }
            Err(err) => {
                let active = self.current().generation;
                warn!(
                    code = err.code(),
                    error = %err,
                    active_generation = active,
                    "Reload rejected, keeping active configuration"
                );
                self.events.emit(EventKind::ReloadRejected {
                    active_generation: active,
                    code: err.code().to_string(),
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Replace the active snapshot, returning the previous one
    pub fn swap(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        self.events.emit(snapshot.loaded_event());
        let next = Arc::new(snapshot);
        std::mem::replace(&mut *self.current.write(), next)
    }
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("generation", &self.current().generation)
            .field("sources", &self.sources)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MAPPING: &str = r#"
default_studio: main
studio_mappings:
  main:
    templates:
      shot_work_path: "/{PROJECT}/shots/{SHOT}/work/"
"#;

    const DEPS: &str = r#"
departments:
  - id: layout
  - id: animation
    requires: [{ department: layout }]
"#;

    const CYCLIC: &str = r#"
departments:
  - id: layout
    requires: [{ department: animation }]
  - id: animation
    requires: [{ department: layout }]
"#;

    fn write_config(dir: &Utf8Path, deps: &str) {
        fs::write(dir.join(FOLDER_MAPPING_FILE), MAPPING).unwrap();
        fs::write(dir.join(DEPENDENCIES_FILE), deps).unwrap();
    }

    fn setup() -> (TempDir, Utf8PathBuf) {
        let tmp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        write_config(&dir, DEPS);
        (tmp, dir)
    }

    #[test]
    fn load_reads_projects_dir() {
        let (_tmp, dir) = setup();
        fs::create_dir(dir.join(PROJECTS_DIR)).unwrap();
        fs::write(dir.join("projects/show_x_pipeline.yaml"), "workflow_type: lightweight\n").unwrap();
        fs::write(dir.join("projects/notes.txt"), "ignored").unwrap();

        let snapshot = Snapshot::load(&ConfigSources::from_dir(&dir), 1).unwrap();
        let names: Vec<String> = snapshot.engine().project_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["show_x"]);
        assert!(snapshot.registry().contains("main"));
    }

    #[test]
    fn duplicate_project_names_are_rejected() {
        let (_tmp, dir) = setup();
        fs::create_dir(dir.join(PROJECTS_DIR)).unwrap();
        fs::write(dir.join("projects/show_x.yaml"), "workflow_type: default\n").unwrap();
        fs::write(dir.join("projects/show_x_pipeline.yaml"), "workflow_type: lightweight\n").unwrap();

        let err = Snapshot::load(&ConfigSources::from_dir(&dir), 1).unwrap_err();
        assert_eq!(err.code(), "BIF-001");
        let message = err.to_string();
        assert!(message.contains("show_x.yaml"), "{}", message);
        assert!(message.contains("show_x_pipeline.yaml"), "{}", message);

        let err = Snapshot::from_documents(
            MAPPING,
            DEPS,
            &[("show_y", "{}"), ("show_y", "workflow_type: lightweight")],
            &ConfigVars::new(),
            1,
        )
        .unwrap_err();
        assert_eq!(err.code(), "BIF-001");
    }

    #[test]
    fn series_document_is_optional_and_fingerprinted() {
        let (_tmp, dir) = setup();
        let sources = ConfigSources::from_dir(&dir);
        let plain = Snapshot::load(&sources, 1).unwrap();
        assert!(plain.series().episodes().is_empty());

        fs::write(
            dir.join(SERIES_FILE),
            "series:\n  code: skp\n  episodes: [{ id: ep01, sequences: [{ id: seq001 }] }]\n",
        )
        .unwrap();
        let with_series = Snapshot::load(&sources, 2).unwrap();
        assert_eq!(with_series.series().code(), "skp");
        assert!(with_series.series().sequence("ep01", "seq001").is_some());
        assert_ne!(with_series.fingerprint(), plain.fingerprint());

        fs::write(dir.join(SERIES_FILE), "series: { numbering: { shot_pattern: SH } }\n").unwrap();
        let err = Snapshot::load(&sources, 3).unwrap_err();
        assert_eq!(err.code(), "BIF-001");
        assert!(err.to_string().contains(SERIES_FILE));
    }

    #[test]
    fn missing_document_is_config_load_error() {
        let tmp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        let err = Snapshot::load(&ConfigSources::from_dir(&dir), 1).unwrap_err();
        assert_eq!(err.code(), "BIF-001");
        assert!(err.to_string().contains("dependencies.yaml"));
    }

    #[test]
    fn yaml_error_names_document() {
        let err = Snapshot::from_documents("default_studio: [", DEPS, &[], &ConfigVars::new(), 1)
            .unwrap_err();
        assert!(err.to_string().contains(FOLDER_MAPPING_FILE));
    }

    #[test]
    fn reload_swaps_and_bumps_generation() {
        let (_tmp, dir) = setup();
        let store = SnapshotStore::load(ConfigSources::from_dir(&dir), EventLog::new()).unwrap();
        let before = store.current();
        assert_eq!(before.generation(), 1);

        fs::write(
            dir.join(DEPENDENCIES_FILE),
            format!("{}  - id: lighting\n", DEPS),
        )
        .unwrap();
        let after = store.reload().unwrap();
        assert_eq!(after.generation(), 2);
        assert_ne!(after.fingerprint(), before.fingerprint());
        // Readers holding the old Arc still see the old graph
        assert!(!before.engine().global_graph().contains("lighting"));
        assert!(store.current().engine().global_graph().contains("lighting"));
    }

    #[test]
    fn reload_keeps_last_good_on_cycle() {
        let (_tmp, dir) = setup();
        let events = EventLog::new();
        let store = SnapshotStore::load(ConfigSources::from_dir(&dir), events.clone()).unwrap();

        write_config(&dir, CYCLIC);
        let err = store.reload().unwrap_err();
        assert_eq!(err.code(), "BIF-050");
        assert_eq!(store.current().generation(), 1);
        assert!(store.current().engine().global_graph().contains("animation"));

        let last = events.events().pop().unwrap();
        assert!(matches!(last.kind, EventKind::ReloadRejected { active_generation: 1, .. }));
    }

    #[test]
    fn snapshot_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Snapshot>();
        assert_send_sync::<SnapshotStore>();
    }
}
