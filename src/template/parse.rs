//! Template parsing - `{VARIABLE}` tokenizer and binding
//!
//! Parsing is a load-time step. Every failure here is fatal for the whole
//! configuration snapshot:
//! - malformed braces → `TemplateParse` (with byte position)
//! - reference to an undeclared, non-standard name → `UndeclaredVariable`
//! - unknown `${section.key}` config reference → `TemplateParse`

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::variable::{is_valid_name, TemplateVariable, VariableTable};
use crate::error::{BifrostError, Result};
use crate::util::intern;

/// `${section.key}` config references, expanded before tokenizing
static CONFIG_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").unwrap());

/// Flattened `[template_vars]` table: `"section.key"` → value
pub type ConfigVars = BTreeMap<String, String>;

#[inline]
fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// One token of a path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathToken {
    Literal(String),
    Variable(Arc<str>),
}

/// Segment between separators; may mix literals and variables (`v{VERSION}`)
pub type Segment = SmallVec<[PathToken; 2]>;

/// Substitute `${section.key}` references
///
/// Returns `Cow::Borrowed` when the template has none.
pub fn expand_config_refs<'a>(template: &'a str, vars: &ConfigVars) -> Result<Cow<'a, str>> {
    if !template.contains("${") {
        return Ok(Cow::Borrowed(template));
    }

    let mut result = String::with_capacity(template.len() + 32);
    let mut last_end = 0;

    for cap in CONFIG_REF_RE.captures_iter(template) {
        let Some(m) = cap.get(0) else { continue };
        let key = cap[1].trim();
        let value = vars.get(key).ok_or_else(|| BifrostError::TemplateParse {
            template: template.to_string(),
            position: m.start(),
            details: format!("unknown config reference '${{{}}}'", key),
        })?;
        result.push_str(&template[last_end..m.start()]);
        result.push_str(value);
        last_end = m.end();
    }
    result.push_str(&template[last_end..]);

    Ok(Cow::Owned(result))
}

/// Split a template into literal and variable tokens
pub fn tokenize(template: &str) -> Result<Vec<PathToken>> {
    let parse_err = |position: usize, details: &str| BifrostError::TemplateParse {
        template: template.to_string(),
        position,
        details: details.to_string(),
    };

    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut open: Option<usize> = None;

    for (i, c) in template.char_indices() {
        match (c, open) {
            ('{', None) => {
                if !literal.is_empty() {
                    tokens.push(PathToken::Literal(std::mem::take(&mut literal)));
                }
                open = Some(i);
            }
            ('{', Some(_)) => return Err(parse_err(i, "nested '{'")),
            ('}', None) => return Err(parse_err(i, "'}' without matching '{'")),
            ('}', Some(start)) => {
                let name = &template[start + 1..i];
                if name.is_empty() {
                    return Err(parse_err(start, "empty placeholder '{}'"));
                }
                if !is_valid_name(name) {
                    return Err(parse_err(
                        start,
                        &format!("invalid variable name '{}'", name),
                    ));
                }
                tokens.push(PathToken::Variable(intern(name)));
                open = None;
            }
            (_, Some(_)) => {}
            (_, None) => literal.push(c),
        }
    }

    if let Some(start) = open {
        return Err(parse_err(start, "unclosed '{'"));
    }
    if !literal.is_empty() {
        tokens.push(PathToken::Literal(literal));
    }
    Ok(tokens)
}

/// Parsed template with every variable reference bound to a declaration
#[derive(Debug, Clone)]
pub struct TemplatePath {
    path_type: Arc<str>,
    raw: String,
    tokens: Vec<PathToken>,
    bindings: FxHashMap<Arc<str>, Arc<TemplateVariable>>,
}

impl TemplatePath {
    #[inline]
    pub fn path_type(&self) -> &str {
        &self.path_type
    }

    /// Shared id of the path type
    pub fn path_type_id(&self) -> Arc<str> {
        Arc::clone(&self.path_type)
    }

    /// Template text after `${...}` expansion
    #[inline]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[inline]
    pub fn tokens(&self) -> &[PathToken] {
        &self.tokens
    }

    /// Declaration bound to a referenced variable
    #[inline]
    pub fn binding(&self, name: &str) -> Option<&Arc<TemplateVariable>> {
        self.bindings.get(name)
    }

    /// Referenced variable names, sorted
    pub fn variables(&self) -> Vec<Arc<str>> {
        let mut names: Vec<Arc<str>> = self.bindings.keys().cloned().collect();
        names.sort();
        names
    }

    /// True when the template has no variables
    pub fn is_constant(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn has_leading_separator(&self) -> bool {
        self.raw.starts_with(is_separator)
    }

    pub fn has_trailing_separator(&self) -> bool {
        self.raw.ends_with(is_separator)
    }

    /// Split tokens into path segments, dropping empty ones
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut current = Segment::new();

        for token in &self.tokens {
            match token {
                PathToken::Variable(_) => current.push(token.clone()),
                PathToken::Literal(text) => {
                    let mut pieces = text.split(is_separator).peekable();
                    while let Some(piece) = pieces.next() {
                        if !piece.is_empty() {
                            current.push(PathToken::Literal(piece.to_string()));
                        }
                        if pieces.peek().is_some() && !current.is_empty() {
                            segments.push(std::mem::take(&mut current));
                        }
                    }
                }
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

/// Binds templates against one studio's declaration table
pub struct TemplateParser<'a> {
    table: &'a VariableTable,
    implicit: bool,
    config_vars: &'a ConfigVars,
}

impl<'a> TemplateParser<'a> {
    pub fn new(table: &'a VariableTable, implicit: bool, config_vars: &'a ConfigVars) -> Self {
        Self {
            table,
            implicit,
            config_vars,
        }
    }

    pub fn parse(&self, path_type: &str, template: &str) -> Result<TemplatePath> {
        let expanded = expand_config_refs(template, self.config_vars)?;
        let tokens = tokenize(&expanded)?;

        let mut bindings = FxHashMap::default();
        for token in &tokens {
            let PathToken::Variable(name) = token else {
                continue;
            };
            if bindings.contains_key(name) {
                continue;
            }
            let var = self.table.bind(name, self.implicit).ok_or_else(|| {
                BifrostError::UndeclaredVariable {
                    variable: name.to_string(),
                    template: template.to_string(),
                }
            })?;
            bindings.insert(Arc::clone(name), var);
        }

        Ok(TemplatePath {
            path_type: intern(path_type),
            raw: expanded.into_owned(),
            tokens,
            bindings,
        })
    }
}
