//! Template variables - declarations, constraints and value checks

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use rustc_hash::FxHashMap;

use crate::ast::{VariableKind, VariableSpec};
use crate::context::ContextValue;
use crate::error::{BifrostError, Result};
use crate::util::{intern, STANDARD_VARIABLES};

/// Valid variable name: uppercase letters, digits, underscores
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").unwrap());

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Check a variable name against `^[A-Z_][A-Z0-9_]*$`
#[inline]
pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// Value constraint, compiled once at load
#[derive(Debug, Clone)]
pub enum Constraint {
    None,
    Pattern(Regex),
    OneOf(Vec<String>),
}

/// A declared (or implicitly declared) template variable
#[derive(Debug, Clone)]
pub struct TemplateVariable {
    pub name: Arc<str>,
    pub kind: VariableKind,
    pub required: bool,
    pub constraint: Constraint,
    pub default: Option<ContextValue>,
    pub description: Option<String>,
    /// Declared through the standard vocabulary rather than `variables:`
    pub implicit: bool,
}

impl TemplateVariable {
    /// Implicit declaration: required string, no constraint
    pub fn implicit(name: &str) -> Self {
        Self {
            name: intern(name),
            kind: VariableKind::String,
            required: true,
            constraint: Constraint::None,
            default: None,
            description: None,
            implicit: true,
        }
    }

    /// Compile a YAML declaration
    pub fn from_spec(name: &str, spec: &VariableSpec) -> Result<Self> {
        let invalid = |reason: String| BifrostError::InvalidVariableDeclaration {
            variable: name.to_string(),
            reason,
        };

        if !is_valid_name(name) {
            return Err(invalid(
                "name must match ^[A-Z_][A-Z0-9_]*$".to_string(),
            ));
        }

        let constraint = match (spec.kind, &spec.values, &spec.pattern) {
            (VariableKind::Enum, None, _) => {
                return Err(invalid("enum variable declares no 'values'".to_string()));
            }
            (VariableKind::Enum, Some(values), _) if values.is_empty() => {
                return Err(invalid("enum variable declares no 'values'".to_string()));
            }
            (_, Some(values), _) if !values.is_empty() => Constraint::OneOf(values.clone()),
            (_, _, Some(pattern)) => {
                let re = Regex::new(pattern)
                    .map_err(|e| invalid(format!("invalid pattern '{}': {}", pattern, e)))?;
                Constraint::Pattern(re)
            }
            _ => Constraint::None,
        };

        let var = Self {
            name: intern(name),
            kind: spec.kind,
            required: spec.required,
            constraint,
            default: spec.default.clone(),
            description: spec.description.clone(),
            implicit: false,
        };

        if let Some(default) = &var.default {
            var.check(default)
                .map_err(|reason| invalid(format!("default '{}' {}", default, reason)))?;
        }

        Ok(var)
    }

    /// Validate a supplied value and render it for substitution
    pub fn render(&self, value: &ContextValue) -> Result<String> {
        if value.is_empty() && self.required {
            return Err(BifrostError::InvalidVariableValue {
                variable: self.name.to_string(),
                value: String::new(),
                reason: "required value is empty".to_string(),
            });
        }
        if value.is_empty() {
            return Ok(String::new());
        }
        self.check(value)
            .map_err(|reason| BifrostError::InvalidVariableValue {
                variable: self.name.to_string(),
                value: value.to_string(),
                reason,
            })?;
        Ok(value.to_string())
    }

    /// Type + constraint check; `Err` carries the reason
    fn check(&self, value: &ContextValue) -> std::result::Result<(), String> {
        let rendered = value.to_string();

        match (self.kind, value) {
            (VariableKind::Integer, ContextValue::Integer(_)) => {}
            (VariableKind::Integer, ContextValue::String(s)) if s.parse::<i64>().is_ok() => {}
            (VariableKind::Integer, other) => {
                return Err(format!("expected integer, got {}", other.type_name()));
            }
            (VariableKind::Boolean, ContextValue::Bool(_)) => {}
            (VariableKind::Boolean, ContextValue::String(s)) if s == "true" || s == "false" => {}
            (VariableKind::Boolean, other) => {
                return Err(format!("expected boolean, got {}", other.type_name()));
            }
            (VariableKind::Date, ContextValue::String(s)) => {
                // A pattern overrides the ISO date check
                if !matches!(self.constraint, Constraint::Pattern(_))
                    && NaiveDate::parse_from_str(s, DATE_FORMAT).is_err()
                {
                    return Err("expected a date formatted YYYY-MM-DD".to_string());
                }
            }
            (VariableKind::Date, other) => {
                return Err(format!("expected date, got {}", other.type_name()));
            }
            (VariableKind::String | VariableKind::Enum, _) => {}
        }

        match &self.constraint {
            Constraint::None => Ok(()),
            Constraint::Pattern(re) if re.is_match(&rendered) => Ok(()),
            Constraint::Pattern(re) => Err(format!("does not match pattern '{}'", re.as_str())),
            Constraint::OneOf(values) if values.iter().any(|v| v == &rendered) => Ok(()),
            Constraint::OneOf(values) => Err(format!("must be one of: {}", values.join(", "))),
        }
    }
}

/// Declaration table: variable name → declaration
///
/// Layers merge with the later layer winning, so a studio table built as
/// `doc.overlay(parent).overlay(studio)` sees its own declarations first.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    vars: FxHashMap<Arc<str>, Arc<TemplateVariable>>,
}

impl VariableTable {
    pub fn from_specs(specs: &BTreeMap<String, VariableSpec>) -> Result<Self> {
        let mut vars = FxHashMap::with_capacity_and_hasher(specs.len(), Default::default());
        for (name, spec) in specs {
            let var = TemplateVariable::from_spec(name, spec)?;
            vars.insert(Arc::clone(&var.name), Arc::new(var));
        }
        Ok(Self { vars })
    }

    /// New table with `other`'s declarations layered on top
    pub fn overlay(&self, other: &VariableTable) -> Self {
        let mut vars = self.vars.clone();
        for (name, var) in &other.vars {
            vars.insert(Arc::clone(name), Arc::clone(var));
        }
        Self { vars }
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Arc<TemplateVariable>> {
        self.vars.get(name)
    }

    /// Bind a reference: declared, else implicit (standard vocabulary only)
    pub fn bind(&self, name: &str, implicit: bool) -> Option<Arc<TemplateVariable>> {
        if let Some(var) = self.vars.get(name) {
            return Some(Arc::clone(var));
        }
        if implicit && STANDARD_VARIABLES.contains(&name) {
            return Some(Arc::new(TemplateVariable::implicit(name)));
        }
        None
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Declared names, sorted
    pub fn names(&self) -> Vec<Arc<str>> {
        let mut names: Vec<Arc<str>> = self.vars.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(yaml: &str) -> VariableSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn name_validation() {
        assert!(is_valid_name("SHOT"));
        assert!(is_valid_name("_PRIVATE"));
        assert!(is_valid_name("LAYER_2"));
        assert!(!is_valid_name("shot"));
        assert!(!is_valid_name("2SHOT"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn pattern_constraint() {
        let var = TemplateVariable::from_spec("VERSION", &spec(r#"pattern: "^v[0-9]{3}$""#)).unwrap();
        assert_eq!(var.render(&"v002".into()).unwrap(), "v002");
        let err = var.render(&"2".into()).unwrap_err();
        assert_eq!(err.code(), "BIF-031");
        assert!(err.to_string().contains("VERSION"));
    }

    #[test]
    fn enum_requires_values() {
        let err = TemplateVariable::from_spec("ASSET_TYPE", &spec("type: enum")).unwrap_err();
        assert_eq!(err.code(), "BIF-012");

        let var = TemplateVariable::from_spec(
            "ASSET_TYPE",
            &spec("type: enum\nvalues: [character, prop]"),
        )
        .unwrap();
        assert!(var.render(&"prop".into()).is_ok());
        assert!(var.render(&"vehicle".into()).is_err());
    }

    #[test]
    fn integer_accepts_numeric_strings() {
        let var = TemplateVariable::from_spec("FRAME", &spec("type: integer")).unwrap();
        assert_eq!(var.render(&ContextValue::Integer(1001)).unwrap(), "1001");
        assert_eq!(var.render(&"1001".into()).unwrap(), "1001");
        assert!(var.render(&"ten".into()).is_err());
        assert!(var.render(&ContextValue::Bool(true)).is_err());
    }

    #[test]
    fn date_and_boolean_types() {
        let date = TemplateVariable::from_spec("DATE", &spec("type: date")).unwrap();
        assert!(date.render(&"2024-03-01".into()).is_ok());
        assert!(date.render(&"01/03/2024".into()).is_err());

        let flag = TemplateVariable::from_spec("STEREO", &spec("type: boolean")).unwrap();
        assert_eq!(flag.render(&ContextValue::Bool(false)).unwrap(), "false");
        assert!(flag.render(&"yes".into()).is_err());
    }

    #[test]
    fn invalid_pattern_fails_at_load() {
        let err = TemplateVariable::from_spec("SHOT", &spec(r#"pattern: "([a-z""#)).unwrap_err();
        assert!(err.to_string().contains("invalid pattern"));
    }

    #[test]
    fn default_must_satisfy_constraint() {
        let err = TemplateVariable::from_spec(
            "VERSION",
            &spec("pattern: \"^v[0-9]{3}$\"\ndefault: latest"),
        )
        .unwrap_err();
        assert_eq!(err.code(), "BIF-012");
    }

    #[test]
    fn empty_value_for_optional_renders_empty() {
        let var = TemplateVariable::from_spec("LAYER", &spec("required: false\npattern: \"^[a-z]+$\"")).unwrap();
        assert_eq!(var.render(&"".into()).unwrap(), "");

        let required = TemplateVariable::implicit("SHOT");
        assert!(required.render(&"".into()).is_err());
    }

    #[test]
    fn overlay_later_layer_wins() {
        let mut doc_specs = BTreeMap::new();
        doc_specs.insert("LAYER".to_string(), spec("required: true"));
        let mut studio_specs = BTreeMap::new();
        studio_specs.insert("LAYER".to_string(), spec("required: false"));

        let doc = VariableTable::from_specs(&doc_specs).unwrap();
        let studio = VariableTable::from_specs(&studio_specs).unwrap();
        let merged = doc.overlay(&studio);
        assert!(!merged.get("LAYER").unwrap().required);
        assert!(doc.get("LAYER").unwrap().required);
    }

    #[test]
    fn bind_falls_back_to_standard_vocabulary() {
        let table = VariableTable::default();
        let shot = table.bind("SHOT", true).unwrap();
        assert!(shot.implicit);
        assert!(shot.required);
        assert!(table.bind("SHOT", false).is_none());
        assert!(table.bind("CUSTOM_THING", true).is_none());
    }
}
