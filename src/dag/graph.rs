//! DepartmentGraph - dependent → required edges (optimized)
//!
//! Same layout as the task graph it grew out of:
//! - Arc<str> department ids, interned once
//! - FxHashMap adjacency
//! - SmallVec requirement lists (most departments require 0-4 others)
//!
//! Validation on every build:
//! - referenced departments exist
//! - required statuses belong to the required department
//! - no cycles (DFS three-color)

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::debug;

use super::department::{Department, DepartmentDependency};
use crate::ast::{DependenciesDoc, DepartmentOverride};
use crate::error::{BifrostError, Result};
use crate::util::intern;

/// Stack-allocated requirement list: most departments have 0-4
pub type DepVec = SmallVec<[DepartmentDependency; 4]>;

#[derive(Debug, Clone)]
pub struct DepartmentGraph {
    /// Shared between the global graph and every project graph
    departments: Arc<FxHashMap<Arc<str>, Department>>,
    /// Department ids in declaration order
    order: Arc<[Arc<str>]>,
    /// dependent → its requirements
    requirements: FxHashMap<Arc<str>, DepVec>,
    /// Project whose overrides this graph carries
    project: Option<Arc<str>>,
}

impl DepartmentGraph {
    /// Global graph from `dependencies.yaml`
    pub fn from_doc(doc: &DependenciesDoc) -> Result<Self> {
        let mut departments = FxHashMap::with_capacity_and_hasher(doc.departments.len(), Default::default());
        let mut order = Vec::with_capacity(doc.departments.len());
        let mut requirements: FxHashMap<Arc<str>, DepVec> = FxHashMap::default();

        for (i, dept_doc) in doc.departments.iter().enumerate() {
            let dept = Department::from_doc(i, dept_doc)?;
            let id = Arc::clone(&dept.id);
            if departments.contains_key(&id) {
                return Err(BifrostError::ConfigLoad {
                    document: crate::util::constants::DEPENDENCIES_FILE.to_string(),
                    reason: format!("department '{}' is declared twice", id),
                });
            }
            let deps: DepVec = dept_doc
                .requires
                .iter()
                .map(|r| DepartmentDependency::from_doc(&dept_doc.id, r))
                .collect();
            requirements.insert(Arc::clone(&id), deps);
            order.push(Arc::clone(&id));
            departments.insert(id, dept);
        }

        let graph = Self {
            departments: Arc::new(departments),
            order: order.into(),
            requirements,
            project: None,
        };
        graph.validate()?;
        debug!(departments = graph.order.len(), edges = graph.edge_count(), "Built department graph");
        Ok(graph)
    }

    /// Project graph: each overridden department's requirement list is replaced
    pub fn with_overrides(
        &self,
        project: &str,
        overrides: &BTreeMap<String, DepartmentOverride>,
    ) -> Result<Self> {
        let mut requirements = self.requirements.clone();
        for (dept, over) in overrides {
            let Some(id) = self.departments.get_key_value(dept.as_str()).map(|(k, _)| Arc::clone(k)) else {
                return Err(BifrostError::DepartmentNotFound {
                    department: dept.clone(),
                    context: format!("custom_department_dependencies of project '{}'", project),
                });
            };
            let deps: DepVec = over
                .requires
                .iter()
                .map(|r| DepartmentDependency::from_doc(dept, r))
                .collect();
            requirements.insert(id, deps);
        }

        let graph = Self {
            departments: Arc::clone(&self.departments),
            order: Arc::clone(&self.order),
            requirements,
            project: Some(intern(project)),
        };
        graph.validate()?;
        debug!(project, overrides = overrides.len(), "Built project department graph");
        Ok(graph)
    }

    fn validate(&self) -> Result<()> {
        for id in self.order.iter() {
            for dep in self.requirements(id) {
                let required = self.departments.get(&dep.required).ok_or_else(|| {
                    BifrostError::DepartmentNotFound {
                        department: dep.required.to_string(),
                        context: format!("required by '{}'{}", id, self.project_suffix()),
                    }
                })?;
                if !required.has_status(&dep.required_status) {
                    return Err(BifrostError::UnknownStatus {
                        department: dep.required.to_string(),
                        status: dep.required_status.to_string(),
                    });
                }
            }
        }
        self.detect_cycles()
    }

    fn project_suffix(&self) -> String {
        self.project
            .as_ref()
            .map(|p| format!(" in project '{}'", p))
            .unwrap_or_default()
    }

    #[inline]
    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn department(&self, id: &str) -> Result<&Department> {
        self.departments
            .get(id)
            .ok_or_else(|| BifrostError::DepartmentNotFound {
                department: id.to_string(),
                context: format!("not declared in dependencies{}", self.project_suffix()),
            })
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.departments.contains_key(id)
    }

    /// Departments in declaration order
    pub fn departments(&self) -> impl Iterator<Item = &Department> {
        self.order.iter().filter_map(|id| self.departments.get(id))
    }

    /// Requirements of a department (empty for unknown ids)
    #[inline]
    pub fn requirements(&self, id: &str) -> &[DepartmentDependency] {
        static EMPTY: &[DepartmentDependency] = &[];
        self.requirements
            .get(id)
            .map_or(EMPTY, SmallVec::as_slice)
    }

    /// Departments that require `id` directly
    pub fn dependents(&self, id: &str) -> Vec<Arc<str>> {
        self.order
            .iter()
            .filter(|d| self.requirements(d).iter().any(|r| r.required.as_ref() == id))
            .cloned()
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.requirements.values().map(SmallVec::len).sum()
    }

    /// Check whether `from` requires `to`, directly or transitively (BFS)
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }

        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut queue: VecDeque<&str> = VecDeque::new();

        queue.push_back(from);
        visited.insert(from);

        while let Some(current) = queue.pop_front() {
            for dep in self.requirements(current) {
                let next = dep.required.as_ref();
                if next == to {
                    return true;
                }
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        false
    }

    /// Detect requirement cycles using DFS with three-color marking.
    ///
    /// - White: unvisited
    /// - Gray: on the current DFS path
    /// - Black: fully processed
    ///
    /// Reaching a Gray node closes a cycle, reported as `a → b → a`.
    pub fn detect_cycles(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut colors: FxHashMap<Arc<str>, Color> = self
            .order
            .iter()
            .map(|id| (Arc::clone(id), Color::White))
            .collect();
        let mut stack: Vec<Arc<str>> = Vec::new();

        fn dfs(
            node: Arc<str>,
            requirements: &FxHashMap<Arc<str>, DepVec>,
            colors: &mut FxHashMap<Arc<str>, Color>,
            stack: &mut Vec<Arc<str>>,
        ) -> std::result::Result<(), String> {
            colors.insert(Arc::clone(&node), Color::Gray);
            stack.push(Arc::clone(&node));

            if let Some(deps) = requirements.get(&node) {
                for dep in deps {
                    match colors.get(&dep.required) {
                        Some(Color::Gray) => {
                            let start = stack
                                .iter()
                                .position(|x| x.as_ref() == dep.required.as_ref())
                                .unwrap_or(0);
                            let cycle: Vec<&str> =
                                stack[start..].iter().map(|s| s.as_ref()).collect();
                            return Err(format!("{} → {}", cycle.join(" → "), dep.required));
                        }
                        Some(Color::White) | None => {
                            dfs(Arc::clone(&dep.required), requirements, colors, stack)?;
                        }
                        Some(Color::Black) => {}
                    }
                }
            }

            stack.pop();
            colors.insert(node, Color::Black);
            Ok(())
        }

        for id in self.order.iter() {
            if colors.get(id) == Some(&Color::White) {
                if let Err(cycle) = dfs(Arc::clone(id), &self.requirements, &mut colors, &mut stack) {
                    return Err(BifrostError::CyclicDependency {
                        cycle,
                        project: self.project.as_ref().map(|p| p.to_string()),
                    });
                }
            }
        }

        Ok(())
    }
}
