//! MappingRegistry - studio id → templates, with parent-chain inheritance

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::ast::FolderMappingDoc;
use crate::error::{BifrostError, Result};
use crate::template::{ConfigVars, TemplateParser, TemplatePath, VariableTable};
use crate::util::intern;

/// One studio's compiled templates
#[derive(Debug, Clone)]
pub struct StudioMapping {
    pub id: Arc<str>,
    pub display_name: String,
    pub parent: Option<Arc<str>>,
    /// Effective declarations (document → ancestors → own)
    pub variables: VariableTable,
    templates: FxHashMap<Arc<str>, Arc<TemplatePath>>,
}

impl StudioMapping {
    /// Template defined directly on this studio (no inheritance)
    #[inline]
    pub fn own_template(&self, path_type: &str) -> Option<&Arc<TemplatePath>> {
        self.templates.get(path_type)
    }

    /// Path types defined directly on this studio, sorted
    pub fn own_path_types(&self) -> Vec<Arc<str>> {
        let mut keys: Vec<Arc<str>> = self.templates.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Read-only registry of every studio's mapping
#[derive(Debug, Clone)]
pub struct MappingRegistry {
    studios: FxHashMap<Arc<str>, StudioMapping>,
    default_studio: Arc<str>,
}

impl MappingRegistry {
    /// Compile a folder mapping document
    ///
    /// Rejects unknown parents, an unknown default studio, inheritance
    /// cycles, bad templates and missing required path types.
    pub fn build(doc: &FolderMappingDoc, config_vars: &ConfigVars) -> Result<Self> {
        if !doc.studio_mappings.contains_key(&doc.default_studio) {
            return Err(BifrostError::InvalidStudioMapping {
                studio: doc.default_studio.clone(),
                reason: "default_studio is not defined under 'studio_mappings'".to_string(),
            });
        }

        for (id, studio) in &doc.studio_mappings {
            if let Some(parent) = &studio.parent {
                if !doc.studio_mappings.contains_key(parent) {
                    return Err(BifrostError::InvalidStudioMapping {
                        studio: id.clone(),
                        reason: format!("unknown parent studio '{}'", parent),
                    });
                }
            }
        }

        // Parent chains, self first; fails on the first cycle found
        let mut chains: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
        for id in doc.studio_mappings.keys() {
            let mut chain = vec![id.as_str()];
            let mut seen: FxHashSet<&str> = FxHashSet::default();
            seen.insert(id.as_str());
            let mut current = id.as_str();
            while let Some(parent) = doc
                .studio_mappings
                .get(current)
                .and_then(|s| s.parent.as_deref())
            {
                if !seen.insert(parent) {
                    let start = chain.iter().position(|s| *s == parent).unwrap_or(0);
                    let mut cycle: Vec<&str> = chain[start..].to_vec();
                    cycle.push(parent);
                    return Err(BifrostError::InheritanceCycle {
                        chain: cycle.join(" → "),
                    });
                }
                chain.push(parent);
                current = parent;
            }
            chains.insert(id.as_str(), chain);
        }

        let doc_table = VariableTable::from_specs(&doc.variables)?;
        let mut studio_tables: FxHashMap<&str, VariableTable> = FxHashMap::default();
        for (id, studio) in &doc.studio_mappings {
            studio_tables.insert(id.as_str(), VariableTable::from_specs(&studio.variables)?);
        }

        let mut studios = FxHashMap::default();
        for (id, studio) in &doc.studio_mappings {
            // Root ancestor first so nearer declarations win
            let mut table = doc_table.clone();
            if let Some(chain) = chains.get(id.as_str()) {
                for ancestor in chain.iter().rev() {
                    if let Some(layer) = studio_tables.get(ancestor) {
                        table = table.overlay(layer);
                    }
                }
            }

            let parser = TemplateParser::new(&table, doc.implicit_variables, config_vars);
            let mut templates = FxHashMap::default();
            for (path_type, raw) in &studio.templates {
                let template = parser.parse(path_type, raw)?;
                templates.insert(intern(path_type), Arc::new(template));
            }

            debug!(
                studio = %id,
                templates = templates.len(),
                parent = studio.parent.as_deref().unwrap_or("-"),
                "Compiled studio mapping"
            );

            let id_arc = intern(id);
            studios.insert(
                Arc::clone(&id_arc),
                StudioMapping {
                    id: id_arc,
                    display_name: studio.display_name.clone().unwrap_or_else(|| id.clone()),
                    parent: studio.parent.as_deref().map(intern),
                    variables: table,
                    templates,
                },
            );
        }

        let registry = Self {
            studios,
            default_studio: intern(&doc.default_studio),
        };

        for (id, studio) in &doc.studio_mappings {
            for path_type in doc.required_path_types.iter().chain(&studio.required_path_types) {
                if registry.lookup(id, path_type).is_err() {
                    return Err(BifrostError::InvalidStudioMapping {
                        studio: id.clone(),
                        reason: format!("required path type '{}' is not defined", path_type),
                    });
                }
            }
        }

        Ok(registry)
    }

    /// Find the template for `path_type`: studio, its parents, then the default studio
    pub fn lookup(&self, studio: &str, path_type: &str) -> Result<&Arc<TemplatePath>> {
        let mapping = self.studio(studio)?;

        let mut current = Some(mapping);
        while let Some(m) = current {
            if let Some(template) = m.own_template(path_type) {
                return Ok(template);
            }
            current = m.parent.as_deref().and_then(|p| self.studios.get(p));
        }

        if let Some(template) = self
            .studios
            .get(&self.default_studio)
            .and_then(|d| d.own_template(path_type))
        {
            return Ok(template);
        }

        Err(BifrostError::PathTypeNotFound {
            studio: studio.to_string(),
            path_type: path_type.to_string(),
        })
    }

    pub fn studio(&self, studio: &str) -> Result<&StudioMapping> {
        self.studios
            .get(studio)
            .ok_or_else(|| BifrostError::StudioNotFound {
                studio: studio.to_string(),
            })
    }

    #[inline]
    pub fn contains(&self, studio: &str) -> bool {
        self.studios.contains_key(studio)
    }

    #[inline]
    pub fn default_studio(&self) -> &str {
        &self.default_studio
    }

    /// Studio ids, sorted
    pub fn studio_ids(&self) -> Vec<Arc<str>> {
        let mut ids: Vec<Arc<str>> = self.studios.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Inheritance chain of a studio, self first
    pub fn chain(&self, studio: &str) -> Result<Vec<Arc<str>>> {
        let mut chain = Vec::new();
        let mut current = Some(self.studio(studio)?);
        while let Some(m) = current {
            chain.push(Arc::clone(&m.id));
            current = m.parent.as_deref().and_then(|p| self.studios.get(p));
        }
        Ok(chain)
    }

    /// Every path type resolvable for a studio (own, inherited, default), sorted
    pub fn path_types(&self, studio: &str) -> Result<Vec<Arc<str>>> {
        let mut all: FxHashSet<Arc<str>> = FxHashSet::default();
        for id in self.chain(studio)? {
            if let Some(m) = self.studios.get(&id) {
                all.extend(m.templates.keys().cloned());
            }
        }
        if let Some(d) = self.studios.get(&self.default_studio) {
            all.extend(d.templates.keys().cloned());
        }
        let mut types: Vec<Arc<str>> = all.into_iter().collect();
        types.sort();
        Ok(types)
    }
}
