//! Department - a production step with an ordered status set

use std::sync::Arc;

use serde::Serialize;

use crate::ast::{DepartmentDoc, OutputDoc, RequirementDoc};
use crate::error::{BifrostError, Result};
use crate::util::{intern, DEFAULT_STATUSES};

/// Something a department hands downstream (`produces:`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Output {
    pub kind: String,
    pub formats: Vec<String>,
    /// Path type the output lands in
    pub location: Option<String>,
}

impl From<&OutputDoc> for Output {
    fn from(doc: &OutputDoc) -> Self {
        Self {
            kind: doc.kind.clone(),
            formats: doc.format.to_vec(),
            location: doc.location.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Department {
    pub id: Arc<str>,
    pub name: String,
    pub description: Option<String>,
    /// Position in the `departments:` list
    pub order: usize,
    /// Ordered: a later status satisfies a requirement on an earlier one
    pub statuses: Vec<Arc<str>>,
    pub default_status: Arc<str>,
    pub produces: Vec<Output>,
}

impl Department {
    pub fn from_doc(order: usize, doc: &DepartmentDoc) -> Result<Self> {
        let statuses: Vec<Arc<str>> = match &doc.statuses {
            Some(list) => list.iter().map(|s| intern(s)).collect(),
            None => DEFAULT_STATUSES.iter().map(|s| intern(s)).collect(),
        };
        if statuses.is_empty() {
            return Err(BifrostError::ConfigLoad {
                document: crate::util::constants::DEPENDENCIES_FILE.to_string(),
                reason: format!("department '{}' declares an empty status list", doc.id),
            });
        }
        for (i, status) in statuses.iter().enumerate() {
            if statuses[..i].contains(status) {
                return Err(BifrostError::ConfigLoad {
                    document: crate::util::constants::DEPENDENCIES_FILE.to_string(),
                    reason: format!("department '{}' repeats status '{}'", doc.id, status),
                });
            }
        }

        let default_status = match &doc.default_status {
            Some(s) if statuses.iter().any(|x| x.as_ref() == s) => intern(s),
            Some(s) => {
                return Err(BifrostError::UnknownStatus {
                    department: doc.id.clone(),
                    status: s.clone(),
                });
            }
            None => Arc::clone(&statuses[0]),
        };

        Ok(Self {
            id: intern(&doc.id),
            name: doc.name.clone().unwrap_or_else(|| doc.id.clone()),
            description: doc.description.clone(),
            order,
            statuses,
            default_status,
            produces: doc.produces.iter().map(Output::from).collect(),
        })
    }

    /// Position of `status` in the ordered set
    #[inline]
    pub fn status_rank(&self, status: &str) -> Option<usize> {
        self.statuses.iter().position(|s| s.as_ref() == status)
    }

    #[inline]
    pub fn has_status(&self, status: &str) -> bool {
        self.status_rank(status).is_some()
    }

    /// Last status of the ordered set
    pub fn terminal_status(&self) -> &str {
        self.statuses.last().map_or(&*self.default_status, |s| s.as_ref())
    }

    /// Whether `current` is `required` or later
    pub fn satisfies(&self, current: &str, required: &str) -> Result<bool> {
        let rank = |status: &str| {
            self.status_rank(status)
                .ok_or_else(|| BifrostError::UnknownStatus {
                    department: self.id.to_string(),
                    status: status.to_string(),
                })
        };
        Ok(rank(current)? >= rank(required)?)
    }
}

/// `dependent` may start once `required` is at `required_status` or later
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentDependency {
    pub dependent: Arc<str>,
    pub required: Arc<str>,
    pub required_status: Arc<str>,
    pub blocking: bool,
}

impl DepartmentDependency {
    pub fn from_doc(dependent: &str, doc: &RequirementDoc) -> Self {
        Self {
            dependent: intern(dependent),
            required: intern(&doc.department),
            required_status: intern(&doc.status),
            blocking: doc.blocking,
        }
    }
}
