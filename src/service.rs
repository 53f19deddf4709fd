//! Bifrost - the pipeline service facade
//!
//! Every call works on the snapshot active when it started, applies the
//! configured context defaults, and records filesystem changes,
//! translations and gate decisions in the event log.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::ast::TaskTemplateOverride;
use crate::config::BifrostConfig;
use crate::context::{Context, ContextValue};
use crate::dag::{GateDecision, StatusSource};
use crate::error::Result;
use crate::event::{EventKind, EventLog};
use crate::resolve::{Platform, ResolvedPath, Resolver, Translation, Translator};
use crate::store::{ConfigSources, Snapshot, SnapshotStore};
use crate::sync::{
    self, DriftReport, DriftRequest, EnsureOutcome, PruneConfirmation, PruneOutcome, ScanOptions,
};
use crate::workflow::{EntityKind, Sequence};

#[derive(Clone)]
pub struct Bifrost {
    store: Arc<SnapshotStore>,
    platform: Platform,
    defaults: BTreeMap<String, ContextValue>,
}

impl Bifrost {
    /// Open the pipeline described by an operator config
    pub fn open(config: &BifrostConfig) -> Result<Self> {
        let sources = ConfigSources::from_dir(config.pipeline_dir())
            .with_template_vars(config.config_vars());
        let events = EventLog::with_capacity(config.event_capacity());
        let store = SnapshotStore::load(sources, events)?;
        Ok(Self::new(Arc::new(store))
            .with_platform(config.platform())
            .with_defaults(config.context_defaults()))
    }

    /// Service over an existing store, targeting the host platform
    pub fn new(store: Arc<SnapshotStore>) -> Self {
        Self {
            store,
            platform: Platform::host(),
            defaults: BTreeMap::new(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Context values used when a request omits them
    pub fn with_defaults(mut self, defaults: BTreeMap<String, ContextValue>) -> Self {
        self.defaults = defaults;
        self
    }

    #[inline]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.current()
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn events(&self) -> &EventLog {
        self.store.events()
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn reload(&self) -> Result<Arc<Snapshot>> {
        self.store.reload()
    }

    fn context(&self, ctx: &Context) -> Context {
        if self.defaults.is_empty() {
            ctx.clone()
        } else {
            ctx.with_defaults(&self.defaults)
        }
    }

    // ═══════════════════════════════════════════
    // PATHS
    // ═══════════════════════════════════════════

    pub fn resolve(&self, studio: &str, path_type: &str, ctx: &Context) -> Result<ResolvedPath> {
        let snapshot = self.snapshot();
        Resolver::new(snapshot.registry())
            .with_platform(self.platform)
            .resolve(studio, path_type, &self.context(ctx))
    }

    pub fn translate(
        &self,
        ctx: &Context,
        path_type: &str,
        from_studio: &str,
        to_studio: &str,
    ) -> Result<Translation> {
        let snapshot = self.snapshot();
        let resolver = Resolver::new(snapshot.registry()).with_platform(self.platform);
        let translation = Translator::new(resolver).translate_pair(
            &self.context(ctx),
            path_type,
            from_studio,
            to_studio,
        )?;
        self.events().emit(EventKind::PathTranslated {
            path_type: Arc::from(path_type),
            from_studio: Arc::from(from_studio),
            to_studio: Arc::from(to_studio),
            from: translation.from.to_string(),
            to: translation.to.to_string(),
        });
        Ok(translation)
    }

    // ═══════════════════════════════════════════
    // FILESYSTEM
    // ═══════════════════════════════════════════

    /// Resolve a path and create its missing directories
    ///
    /// For a file template only the containing directory is created.
    #[instrument(skip(self, ctx))]
    pub fn ensure(
        &self,
        studio: &str,
        path_type: &str,
        ctx: &Context,
    ) -> Result<(ResolvedPath, EnsureOutcome)> {
        let path = self.resolve(studio, path_type, ctx)?;
        let target = path.to_path_buf();
        let outcome = if path.is_directory() {
            sync::ensure(&target)?
        } else {
            match target.parent().filter(|p| !p.as_str().is_empty()) {
                Some(parent) => sync::ensure(parent)?,
                None => EnsureOutcome::default(),
            }
        };
        if !outcome.is_noop() {
            self.events().emit(EventKind::DirectoriesCreated {
                path: path.to_string(),
                created: outcome.created.iter().map(ToString::to_string).collect(),
            });
        }
        Ok((path, outcome))
    }

    pub fn scan_drift(
        &self,
        studio: &str,
        path_type: &str,
        contexts: &[Context],
        options: &ScanOptions,
    ) -> Result<DriftReport> {
        let snapshot = self.snapshot();
        let resolver = Resolver::new(snapshot.registry()).with_platform(self.platform);
        let contexts: Vec<Context> = contexts.iter().map(|c| self.context(c)).collect();
        let report = sync::scan_drift(&resolver, studio, path_type, &contexts, options)?;
        self.record_scan(&report);
        Ok(report)
    }

    /// Drift scan on a blocking thread, bounded by `timeout`
    pub async fn scan_drift_with_timeout(
        &self,
        studio: &str,
        path_type: &str,
        contexts: &[Context],
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<DriftReport> {
        let request = DriftRequest {
            studio: studio.to_string(),
            path_type: path_type.to_string(),
            contexts: contexts.iter().map(|c| self.context(c)).collect(),
        };
        let registry = self.snapshot().registry_arc();
        let report =
            sync::scan_drift_with_timeout(registry, self.platform, request, timeout, cancel)
                .await?;
        self.record_scan(&report);
        Ok(report)
    }

    fn record_scan(&self, report: &DriftReport) {
        self.events().emit(EventKind::DriftScanned {
            studio: Arc::from(report.studio.as_str()),
            path_type: Arc::from(report.path_type.as_str()),
            missing: report.missing.len(),
            extra: report.extra.len(),
            fingerprint: report.fingerprint_hex(),
        });
    }

    pub fn prune_extra(
        &self,
        report: &DriftReport,
        confirmation: PruneConfirmation,
    ) -> Result<PruneOutcome> {
        let outcome = sync::prune_extra(report, confirmation)?;
        self.events().emit(EventKind::ExtraPruned {
            studio: Arc::from(report.studio.as_str()),
            path_type: Arc::from(report.path_type.as_str()),
            removed: outcome.removed.iter().map(ToString::to_string).collect(),
        });
        Ok(outcome)
    }

    // ═══════════════════════════════════════════
    // WORKFLOW
    // ═══════════════════════════════════════════

    pub fn evaluate<S: StatusSource + ?Sized>(
        &self,
        project: Option<&str>,
        entity: &str,
        department: &str,
        statuses: &S,
    ) -> Result<GateDecision> {
        let decision = self
            .snapshot()
            .engine()
            .evaluate(project, entity, department, statuses)?;
        self.events().emit(EventKind::GateEvaluated {
            project: project.map(Arc::from),
            entity: entity.to_string(),
            department: Arc::clone(&decision.department),
            allowed: decision.allowed,
            unmet: decision.unmet.iter().map(|u| Arc::clone(&u.department)).collect(),
        });
        Ok(decision)
    }

    pub fn can_start<S: StatusSource + ?Sized>(
        &self,
        project: Option<&str>,
        entity: &str,
        department: &str,
        statuses: &S,
    ) -> Result<bool> {
        Ok(self.evaluate(project, entity, department, statuses)?.allowed)
    }

    pub fn workflow_sequence(
        &self,
        project: Option<&str>,
        kind: EntityKind,
        entity_type: &str,
    ) -> Result<Sequence> {
        self.snapshot()
            .engine()
            .workflow_sequence(project, kind, entity_type)
            .cloned()
    }

    pub fn next_departments<S: StatusSource + ?Sized>(
        &self,
        project: Option<&str>,
        kind: EntityKind,
        entity_type: &str,
        entity: &str,
        statuses: &S,
    ) -> Result<Vec<Arc<str>>> {
        self.snapshot()
            .engine()
            .next_departments(project, kind, entity_type, entity, statuses)
    }

    /// Project task defaults for a department
    pub fn task_template(&self, project: &str, department: &str) -> Option<TaskTemplateOverride> {
        self.snapshot()
            .engine()
            .task_template(project, department)
            .cloned()
    }

    // ═══════════════════════════════════════════
    // SERIES
    // ═══════════════════════════════════════════

    pub fn generate_shot_id(&self, episode: &str, sequence: &str, number: u32) -> String {
        self.snapshot().series().generate_shot_id(episode, sequence, number)
    }

    /// Series-derived shot context with the configured defaults applied
    pub fn shot_context(&self, episode: &str, sequence: &str, number: u32) -> Option<Context> {
        let ctx = self.snapshot().series().shot_context(episode, sequence, number)?;
        Some(self.context(&ctx))
    }
}
