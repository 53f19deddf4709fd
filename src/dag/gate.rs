//! Gate - may a department start for an entity?
//!
//! A department may start when every blocking requirement's department is
//! at the required status or later. Non-blocking requirements never close
//! the gate; when unmet they are returned as advisories.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::graph::DepartmentGraph;
use crate::error::Result;

/// Current status per department for one entity
///
/// A department the source knows nothing about is at its default status.
pub trait StatusSource {
    fn status_of(&self, department: &str) -> Option<&str>;
}

impl<S: AsRef<str>, H: BuildHasher> StatusSource for HashMap<String, S, H> {
    fn status_of(&self, department: &str) -> Option<&str> {
        self.get(department).map(AsRef::as_ref)
    }
}

impl<S: AsRef<str>> StatusSource for BTreeMap<String, S> {
    fn status_of(&self, department: &str) -> Option<&str> {
        self.get(department).map(AsRef::as_ref)
    }
}

impl<T: StatusSource + ?Sized> StatusSource for &T {
    fn status_of(&self, department: &str) -> Option<&str> {
        (**self).status_of(department)
    }
}

/// A requirement that is not met yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmetRequirement {
    pub department: Arc<str>,
    pub required_status: Arc<str>,
    pub current_status: Arc<str>,
    pub blocking: bool,
}

/// Outcome of a gate evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateDecision {
    pub entity: String,
    pub department: Arc<str>,
    pub allowed: bool,
    /// Blocking requirements not met
    pub unmet: Vec<UnmetRequirement>,
    /// Non-blocking requirements not met
    pub advisories: Vec<UnmetRequirement>,
}

impl DepartmentGraph {
    /// Full gate decision for `department` on `entity`
    pub fn evaluate<S: StatusSource + ?Sized>(
        &self,
        entity: &str,
        department: &str,
        statuses: &S,
    ) -> Result<GateDecision> {
        let dept = self.department(department)?;

        let mut unmet = Vec::new();
        let mut advisories = Vec::new();
        for dep in self.requirements(department) {
            let required = self.department(&dep.required)?;
            let current = statuses
                .status_of(&dep.required)
                .unwrap_or(required.default_status.as_ref());
            if required.satisfies(current, &dep.required_status)? {
                continue;
            }
            let entry = UnmetRequirement {
                department: Arc::clone(&dep.required),
                required_status: Arc::clone(&dep.required_status),
                current_status: required
                    .statuses
                    .iter()
                    .find(|s| s.as_ref() == current)
                    .cloned()
                    .unwrap_or_else(|| Arc::from(current)),
                blocking: dep.blocking,
            };
            if dep.blocking {
                unmet.push(entry);
            } else {
                advisories.push(entry);
            }
        }

        let allowed = unmet.is_empty();
        debug!(
            entity,
            department,
            allowed,
            unmet = unmet.len(),
            advisories = advisories.len(),
            project = self.project().unwrap_or("-"),
            "Evaluated department gate"
        );

        Ok(GateDecision {
            entity: entity.to_string(),
            department: Arc::clone(&dept.id),
            allowed,
            unmet,
            advisories,
        })
    }

    /// True when every blocking requirement of `department` is met
    pub fn can_start<S: StatusSource + ?Sized>(
        &self,
        entity: &str,
        department: &str,
        statuses: &S,
    ) -> Result<bool> {
        Ok(self.evaluate(entity, department, statuses)?.allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DependenciesDoc;
    use rustc_hash::FxHashMap;

    const DEPS: &str = r#"
departments:
  - id: layout
  - id: rigging
  - id: animation
    requires:
      - { department: layout }
  - id: lighting
    requires:
      - { department: animation, status: approved }
      - { department: rigging, status: review, blocking: false }
"#;

    fn graph() -> DepartmentGraph {
        DepartmentGraph::from_doc(&DependenciesDoc::parse(DEPS).unwrap()).unwrap()
    }

    #[test]
    fn lighting_waits_for_animation_approval() {
        let g = graph();
        let mut statuses: HashMap<String, String> = HashMap::new();
        statuses.insert("animation".to_string(), "in_progress".to_string());
        statuses.insert("rigging".to_string(), "approved".to_string());

        let decision = g.evaluate("shot010", "lighting", &statuses).unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.unmet.len(), 1);
        assert_eq!(decision.unmet[0].department.as_ref(), "animation");
        assert_eq!(decision.unmet[0].current_status.as_ref(), "in_progress");
        assert!(decision.advisories.is_empty());

        statuses.insert("animation".to_string(), "approved".to_string());
        assert!(g.can_start("shot010", "lighting", &statuses).unwrap());
    }

    #[test]
    fn non_blocking_only_annotates() {
        let g = graph();
        let statuses: BTreeMap<String, &str> =
            [("animation".to_string(), "approved")].into_iter().collect();
        let decision = g.evaluate("shot010", "lighting", &statuses).unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.advisories.len(), 1);
        assert_eq!(decision.advisories[0].current_status.as_ref(), "not_started");
    }

    #[test]
    fn absent_department_counts_as_default_status() {
        let g = graph();
        let statuses: FxHashMap<String, String> = FxHashMap::default();
        assert!(!g.can_start("a", "animation", &statuses).unwrap());
        assert!(g.can_start("a", "layout", &statuses).unwrap());
    }

    #[test]
    fn unknown_department_and_status() {
        let g = graph();
        let empty: BTreeMap<String, String> = BTreeMap::new();
        assert_eq!(g.evaluate("a", "comp", &empty).unwrap_err().code(), "BIF-051");

        let bad: BTreeMap<String, String> =
            [("layout".to_string(), "done".to_string())].into_iter().collect();
        assert_eq!(g.evaluate("a", "animation", &bad).unwrap_err().code(), "BIF-052");
    }
}
