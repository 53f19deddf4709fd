//! Drift scan - expected directories vs what is on disk
//!
//! ```text
//! template  /{PROJECT}/shots/{SEQUENCE}/{SHOT}/work/
//!           └── scan root ──┘└──── walked, depth 3 ────┘
//! ```
//!
//! The scan root is the leading run of segments built only from literals
//! and root variables (`ROOT`, `PROJECT`). Below it the walk is bounded by
//! the deepest expected path. A directory within that depth that is neither
//! expected nor an ancestor of an expected path is reported as extra, and
//! its subtree is not descended.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use walkdir::WalkDir;
use xxhash_rust::xxh3::Xxh3;

use crate::context::Context;
use crate::error::{BifrostError, Result};
use crate::mapping::MappingRegistry;
use crate::resolve::{Platform, Resolver};
use crate::template::PathToken;
use crate::util::constants::ROOT_VARIABLES;

/// Cancellation and deadline for one scan
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub cancel: CancellationToken,
    pub deadline: Option<Instant>,
}

impl ScanOptions {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    fn check(&self, root: &Utf8Path) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(BifrostError::ScanCancelled {
                root: root.to_string(),
                reason: "cancelled by caller".to_string(),
            });
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(BifrostError::ScanCancelled {
                root: root.to_string(),
                reason: "deadline exceeded".to_string(),
            });
        }
        Ok(())
    }
}

/// Result of a drift scan; never reflects any modification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub studio: String,
    pub path_type: String,
    pub roots: Vec<Utf8PathBuf>,
    pub expected: Vec<Utf8PathBuf>,
    /// Expected but absent on disk
    pub missing: Vec<Utf8PathBuf>,
    /// On disk within the expected depth, neither expected nor an ancestor
    pub extra: Vec<Utf8PathBuf>,
    fingerprint: u64,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }

    /// Fingerprint taken when the scan finished
    #[inline]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Hex form of the fingerprint, as shown to operators
    pub fn fingerprint_hex(&self) -> String {
        format!("{:016x}", self.fingerprint)
    }

    /// Confirmation token for pruning exactly this report's extras
    pub fn confirmation(&self) -> PruneConfirmation {
        PruneConfirmation {
            fingerprint: self.fingerprint,
        }
    }

    fn compute_fingerprint(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(self.studio.as_bytes());
        hasher.update(&[0]);
        hasher.update(self.path_type.as_bytes());
        for (tag, list) in [(b'm', &self.missing), (b'x', &self.extra)] {
            for path in list {
                hasher.update(&[tag]);
                hasher.update(path.as_str().as_bytes());
                hasher.update(&[0]);
            }
        }
        hasher.digest()
    }
}

/// Caller's explicit go-ahead to delete a report's extras
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneConfirmation {
    fingerprint: u64,
}

impl PruneConfirmation {
    pub fn new(fingerprint: u64) -> Self {
        Self { fingerprint }
    }

    /// Parse the hex form printed by `DriftReport::fingerprint_hex`
    pub fn from_hex(hex: &str) -> Result<Self> {
        u64::from_str_radix(hex.trim().trim_start_matches("0x"), 16)
            .map(Self::new)
            .map_err(|e| BifrostError::ConfirmationMismatch {
                expected: "16 hex digits".to_string(),
                actual: format!("'{}' ({})", hex, e),
            })
    }
}

/// Directories removed by `prune_extra`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneOutcome {
    pub removed: Vec<Utf8PathBuf>,
    /// Extras already gone when pruning ran
    pub skipped: Vec<Utf8PathBuf>,
}

/// Owned scan inputs, for running a scan off the async runtime
#[derive(Debug, Clone)]
pub struct DriftRequest {
    pub studio: String,
    pub path_type: String,
    pub contexts: Vec<Context>,
}

/// Canonical component form: no trailing separator, no `.` segments
fn canonical(path: &str) -> Utf8PathBuf {
    Utf8Path::new(path).components().collect()
}

/// Expected paths grouped under one scan root, stored relative to it
#[derive(Default)]
struct RootPlan {
    expected: BTreeSet<Utf8PathBuf>,
    ancestors: BTreeSet<Utf8PathBuf>,
    max_depth: usize,
}

/// Compare expected directories for `contexts` with the filesystem
#[instrument(skip(resolver, contexts, options), fields(count = contexts.len()))]
pub fn scan_drift(
    resolver: &Resolver<'_>,
    studio: &str,
    path_type: &str,
    contexts: &[Context],
    options: &ScanOptions,
) -> Result<DriftReport> {
    let template = resolver.registry().lookup(studio, path_type)?;
    let segments = template.segments();
    let root_len = segments
        .iter()
        .take_while(|segment| {
            segment.iter().all(|token| match token {
                PathToken::Literal(_) => true,
                PathToken::Variable(name) => ROOT_VARIABLES.contains(&name.as_ref()),
            })
        })
        .count();

    let mut plans: BTreeMap<Utf8PathBuf, RootPlan> = BTreeMap::new();
    let mut expected_abs: BTreeSet<Utf8PathBuf> = BTreeSet::new();
    let mut missing: BTreeSet<Utf8PathBuf> = BTreeSet::new();
    // Expected paths of a file template; they only need to exist
    let mut files: BTreeSet<Utf8PathBuf> = BTreeSet::new();

    for ctx in contexts {
        let resolved = resolver.render(studio, template, ctx)?;
        let full = canonical(resolved.as_str());
        if !resolved.is_directory() {
            files.insert(full.clone());
        }
        let root = resolver.render_prefix(studio, template, &segments[..root_len], ctx)?;
        let root = if root.is_empty() {
            Utf8PathBuf::from(".")
        } else {
            canonical(&root)
        };

        let plan = plans.entry(root.clone()).or_default();
        match full.strip_prefix(&root) {
            Ok(rel) if !rel.as_str().is_empty() => {
                let rel = rel.to_owned();
                plan.max_depth = plan.max_depth.max(rel.components().count());
                let mut parent = rel.parent();
                while let Some(p) = parent.filter(|p| !p.as_str().is_empty()) {
                    plan.ancestors.insert(p.to_owned());
                    parent = p.parent();
                }
                plan.expected.insert(rel);
            }
            Ok(_) => {}
            Err(_) if root.as_str() == "." => {
                plan.max_depth = plan.max_depth.max(full.components().count());
                plan.expected.insert(full.clone());
            }
            Err(_) => warn!(root = %root, path = %full, "Expected path outside its scan root"),
        }
        expected_abs.insert(full);
    }

    for path in &expected_abs {
        options.check(path)?;
        let present = if files.contains(path) {
            path.is_file()
        } else {
            path.is_dir()
        };
        if !present {
            missing.insert(path.clone());
        }
    }

    let mut extra: BTreeSet<Utf8PathBuf> = BTreeSet::new();
    for (root, plan) in &plans {
        if plan.max_depth == 0 || !root.is_dir() {
            continue;
        }
        walk_root(root, plan, options, &mut extra)?;
    }

    let mut report = DriftReport {
        studio: studio.to_string(),
        path_type: path_type.to_string(),
        roots: plans.keys().cloned().collect(),
        expected: expected_abs.into_iter().collect(),
        missing: missing.into_iter().collect(),
        extra: extra.into_iter().collect(),
        fingerprint: 0,
    };
    report.fingerprint = report.compute_fingerprint();

    info!(
        studio,
        path_type,
        missing = report.missing.len(),
        extra = report.extra.len(),
        "Drift scan complete"
    );
    Ok(report)
}

fn walk_root(
    root: &Utf8Path,
    plan: &RootPlan,
    options: &ScanOptions,
    extra: &mut BTreeSet<Utf8PathBuf>,
) -> Result<()> {
    let mut it = WalkDir::new(root)
        .min_depth(1)
        .max_depth(plan.max_depth)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = it.next() {
        options.check(root)?;

        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(root = %root, error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(path) = Utf8Path::from_path(entry.path()) else {
            warn!(path = %entry.path().display(), "Skipping non UTF-8 directory");
            it.skip_current_dir();
            continue;
        };
        let rel = match path.strip_prefix(root) {
            Ok(rel) => rel,
            Err(_) => continue,
        };

        if plan.ancestors.contains(rel) {
            continue;
        }
        if !plan.expected.contains(rel) {
            extra.insert(path.to_owned());
        }
        it.skip_current_dir();
    }
    Ok(())
}

/// Run `scan_drift` on a blocking thread, bounded by `timeout`
///
/// On timeout the scan's token is cancelled so the walk stops at its next
/// entry; the caller's own token is left untouched.
pub async fn scan_drift_with_timeout(
    registry: Arc<MappingRegistry>,
    platform: Platform,
    request: DriftRequest,
    timeout: Duration,
    cancel: CancellationToken,
) -> Result<DriftReport> {
    let scan_token = cancel.child_token();
    let options = ScanOptions::new(scan_token.clone()).with_timeout(timeout);
    let path_type = request.path_type.clone();

    let handle = tokio::task::spawn_blocking(move || {
        let resolver = Resolver::new(&registry).with_platform(platform);
        scan_drift(
            &resolver,
            &request.studio,
            &request.path_type,
            &request.contexts,
            &options,
        )
    });

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(BifrostError::ScanCancelled {
            root: path_type,
            reason: format!("scan task failed: {}", join_err),
        }),
        Err(_) => {
            scan_token.cancel();
            Err(BifrostError::ScanCancelled {
                root: path_type,
                reason: format!("timed out after {:?}", timeout),
            })
        }
    }
}

/// Delete the extras of `report`, given a matching confirmation
///
/// The report is re-fingerprinted first, so a report edited after the scan
/// is rejected the same way as a confirmation for a different report.
#[instrument(skip_all, fields(studio = %report.studio, path_type = %report.path_type))]
pub fn prune_extra(report: &DriftReport, confirmation: PruneConfirmation) -> Result<PruneOutcome> {
    let current = report.compute_fingerprint();
    if current != report.fingerprint || confirmation.fingerprint != report.fingerprint {
        return Err(BifrostError::ConfirmationMismatch {
            expected: format!("{:016x}", current),
            actual: format!("{:016x}", confirmation.fingerprint),
        });
    }

    let mut outcome = PruneOutcome::default();
    for path in &report.extra {
        if !path.is_dir() {
            outcome.skipped.push(path.clone());
            continue;
        }
        fs::remove_dir_all(path).map_err(|source| BifrostError::FilesystemSync {
            path: path.to_string(),
            source,
        })?;
        info!(path = %path, "Pruned extra directory");
        outcome.removed.push(path.clone());
    }
    Ok(outcome)
}
