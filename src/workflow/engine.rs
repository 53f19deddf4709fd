//! WorkflowEngine - gating and sequencing across projects

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ast::{DependenciesDoc, ProjectDoc, SequenceDoc, TaskTemplateOverride, WorkflowType};
use crate::dag::{DepartmentGraph, GateDecision, StatusSource};
use crate::error::{BifrostError, Result};
use crate::util::constants::DEFAULT_WORKFLOW;
use crate::util::intern;

/// Ordered department ids
pub type Sequence = Arc<[Arc<str>]>;

/// Entity family a workflow applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Asset,
    Shot,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Asset => "asset",
            EntityKind::Shot => "shot",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = BifrostError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asset" | "assets" => Ok(EntityKind::Asset),
            "shot" | "shots" => Ok(EntityKind::Shot),
            other => Err(BifrostError::ConfigError {
                reason: format!("unknown entity kind '{}' (expected asset or shot)", other),
            }),
        }
    }
}

/// Sequences for one entity kind, keyed by entity type
#[derive(Debug, Clone, Default)]
struct SequenceSet {
    asset: FxHashMap<Arc<str>, Sequence>,
    shot: FxHashMap<Arc<str>, Sequence>,
}

impl SequenceSet {
    fn get(&self, kind: EntityKind, entity_type: &str) -> Option<&Sequence> {
        match kind {
            EntityKind::Asset => self.asset.get(entity_type),
            EntityKind::Shot => self.shot.get(entity_type),
        }
    }

    fn types(&self, kind: EntityKind) -> impl Iterator<Item = &Arc<str>> {
        match kind {
            EntityKind::Asset => self.asset.keys(),
            EntityKind::Shot => self.shot.keys(),
        }
    }
}

/// A project's merged graph and sequence overrides
#[derive(Debug, Clone)]
pub struct ProjectWorkflows {
    pub name: Arc<str>,
    pub workflow_type: WorkflowType,
    pub graph: DepartmentGraph,
    overrides: SequenceSet,
    task_templates: FxHashMap<Arc<str>, TaskTemplateOverride>,
}

impl ProjectWorkflows {
    pub fn task_template(&self, department: &str) -> Option<&TaskTemplateOverride> {
        self.task_templates.get(department)
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    global: DepartmentGraph,
    workflows: FxHashMap<Arc<str>, SequenceSet>,
    projects: FxHashMap<Arc<str>, ProjectWorkflows>,
}

impl WorkflowEngine {
    /// Build the global graph, every project graph and all sequences
    ///
    /// Fails on the first cycle, unknown department or unknown status.
    pub fn build(doc: &DependenciesDoc, projects: &[ProjectDoc]) -> Result<Self> {
        let global = DepartmentGraph::from_doc(doc)?;

        let mut workflows = FxHashMap::default();
        for (name, wf) in &doc.workflows {
            let context = format!("workflow '{}'", name);
            let set = SequenceSet {
                asset: compile_sequences(&global, &wf.asset_types, &context, EntityKind::Asset)?,
                shot: compile_sequences(&global, &wf.shot_types, &context, EntityKind::Shot)?,
            };
            workflows.insert(intern(name), set);
        }

        let mut engine = Self {
            global,
            workflows,
            projects: FxHashMap::default(),
        };

        for project in projects {
            let graph = engine
                .global
                .with_overrides(&project.name, &project.pipeline.custom_department_dependencies)?;
            let context = format!("project '{}'", project.name);
            let overrides = SequenceSet {
                asset: compile_sequences(
                    &graph,
                    &project.pipeline.asset_workflows,
                    &context,
                    EntityKind::Asset,
                )?,
                shot: compile_sequences(
                    &graph,
                    &project.pipeline.shot_workflows,
                    &context,
                    EntityKind::Shot,
                )?,
            };
            let task_templates = compile_task_templates(&graph, project)?;
            let name = intern(&project.name);
            if engine.projects.contains_key(&name) {
                return Err(BifrostError::ConfigLoad {
                    document: project.name.clone(),
                    reason: format!("project '{}' is defined more than once", name),
                });
            }
            debug!(
                project = %name,
                workflow_type = %project.pipeline.workflow_type,
                "Registered project workflows"
            );
            engine.projects.insert(
                Arc::clone(&name),
                ProjectWorkflows {
                    name,
                    workflow_type: project.pipeline.workflow_type,
                    graph,
                    overrides,
                    task_templates,
                },
            );
        }

        Ok(engine)
    }

    #[inline]
    pub fn global_graph(&self) -> &DepartmentGraph {
        &self.global
    }

    /// Merged graph for a project; the global graph when no overrides exist
    pub fn graph(&self, project: Option<&str>) -> &DepartmentGraph {
        project
            .and_then(|p| self.projects.get(p))
            .map_or(&self.global, |p| &p.graph)
    }

    pub fn project(&self, name: &str) -> Option<&ProjectWorkflows> {
        self.projects.get(name)
    }

    /// Task defaults a project sets for one department
    pub fn task_template(
        &self,
        project: &str,
        department: &str,
    ) -> Option<&TaskTemplateOverride> {
        self.projects.get(project)?.task_template(department)
    }

    /// Project names, sorted
    pub fn project_names(&self) -> Vec<Arc<str>> {
        let mut names: Vec<Arc<str>> = self.projects.keys().cloned().collect();
        names.sort();
        names
    }

    /// Workflow names, sorted
    pub fn workflow_names(&self) -> Vec<Arc<str>> {
        let mut names: Vec<Arc<str>> = self.workflows.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn workflow_type(&self, project: Option<&str>) -> WorkflowType {
        project
            .and_then(|p| self.projects.get(p))
            .map_or(WorkflowType::Default, |p| p.workflow_type)
    }

    pub fn evaluate<S: StatusSource + ?Sized>(
        &self,
        project: Option<&str>,
        entity: &str,
        department: &str,
        statuses: &S,
    ) -> Result<GateDecision> {
        self.graph(project).evaluate(entity, department, statuses)
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

    /// Department sequence for an entity type
    pub fn workflow_sequence(
        &self,
        project: Option<&str>,
        kind: EntityKind,
        entity_type: &str,
    ) -> Result<&Sequence> {
        let proj = project.and_then(|p| self.projects.get(p));
        if let Some(seq) = proj.and_then(|p| p.overrides.get(kind, entity_type)) {
            return Ok(seq);
        }

        let workflow_type = proj.map_or(WorkflowType::Default, |p| p.workflow_type);
        [workflow_type.as_str(), DEFAULT_WORKFLOW]
            .iter()
            .find_map(|name| {
                self.workflows
                    .get(*name)
                    .and_then(|set| set.get(kind, entity_type))
            })
            .ok_or_else(|| BifrostError::WorkflowNotFound {
                project: project.unwrap_or("-").to_string(),
                kind: kind.to_string(),
                entity_type: entity_type.to_string(),
            })
    }

    /// Entity types with a sequence for `kind`, sorted
    pub fn entity_types(&self, project: Option<&str>, kind: EntityKind) -> Vec<Arc<str>> {
        let proj = project.and_then(|p| self.projects.get(p));
        let workflow_type = proj.map_or(WorkflowType::Default, |p| p.workflow_type);

        let mut types: Vec<Arc<str>> = proj
            .into_iter()
            .flat_map(|p| p.overrides.types(kind))
            .chain(
                [workflow_type.as_str(), DEFAULT_WORKFLOW]
                    .into_iter()
                    .filter_map(|name| self.workflows.get(name))
                    .flat_map(|set| set.types(kind)),
            )
            .cloned()
            .collect();
        types.sort();
        types.dedup();
        types
    }

    /// Departments, in sequence order, that are not finished and may start
    pub fn next_departments<S: StatusSource + ?Sized>(
        &self,
        project: Option<&str>,
        kind: EntityKind,
        entity_type: &str,
        entity: &str,
        statuses: &S,
    ) -> Result<Vec<Arc<str>>> {
        let graph = self.graph(project);
        let sequence = self.workflow_sequence(project, kind, entity_type)?;

        let mut ready = Vec::new();
        for id in sequence.iter() {
            let dept = graph.department(id)?;
            let current = statuses
                .status_of(id)
                .unwrap_or(dept.default_status.as_ref());
            if current == dept.terminal_status() {
                continue;
            }
            if graph.can_start(entity, id, statuses)? {
                ready.push(Arc::clone(id));
            }
        }
        Ok(ready)
    }
}

fn compile_task_templates(
    graph: &DepartmentGraph,
    project: &ProjectDoc,
) -> Result<FxHashMap<Arc<str>, TaskTemplateOverride>> {
    let mut out = FxHashMap::default();
    for (dept, template) in &project.pipeline.task_templates {
        let department = graph
            .department(dept)
            .map_err(|_| BifrostError::DepartmentNotFound {
                department: dept.clone(),
                context: format!("task_templates of project '{}'", project.name),
            })?;
        out.insert(Arc::clone(&department.id), template.clone());
    }
    Ok(out)
}

fn compile_sequences(
    graph: &DepartmentGraph,
    docs: &std::collections::BTreeMap<String, SequenceDoc>,
    context: &str,
    kind: EntityKind,
) -> Result<FxHashMap<Arc<str>, Sequence>> {
    let mut out = FxHashMap::default();
    for (entity_type, doc) in docs {
        let mut seq = Vec::with_capacity(doc.sequence.len());
        for dept in &doc.sequence {
            if !graph.contains(dept) {
                return Err(BifrostError::DepartmentNotFound {
                    department: dept.clone(),
                    context: format!("{} {} type '{}'", context, kind, entity_type),
                });
            }
            seq.push(intern(dept));
        }

        // A department placed before something it requires is legal but suspicious
        for (i, earlier) in seq.iter().enumerate() {
            for later in &seq[i + 1..] {
                if graph.has_path(earlier, later) {
                    warn!(
                        context,
                        entity_type = %entity_type,
                        department = %earlier,
                        requires = %later,
                        "Sequence lists a department before one it requires"
                    );
                }
            }
        }

        out.insert(intern(entity_type), Sequence::from(seq));
    }
    Ok(out)
}
