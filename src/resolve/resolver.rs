//! Resolver - substitutes a Context into a studio template

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::context::Context;
use crate::error::{BifrostError, Result};
use crate::mapping::MappingRegistry;
use crate::template::{PathToken, Segment, TemplatePath};

/// Target path flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    /// Platform of the running process
    pub fn host() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }

    #[inline]
    pub fn separator(self) -> char {
        match self {
            Platform::Posix => '/',
            Platform::Windows => '\\',
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::host()
    }
}

impl FromStr for Platform {
    type Err = BifrostError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "posix" | "linux" | "macos" | "unix" => Ok(Platform::Posix),
            "windows" | "win" => Ok(Platform::Windows),
            other => Err(BifrostError::ConfigError {
                reason: format!("unknown platform '{}' (expected posix or windows)", other),
            }),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Posix => f.write_str("posix"),
            Platform::Windows => f.write_str("windows"),
        }
    }
}

/// Concrete path produced by a resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedPath {
    path: String,
    directory: bool,
    platform: Platform,
    studio: Arc<str>,
    path_type: Arc<str>,
}

impl ResolvedPath {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// True when the template ends with a separator
    #[inline]
    pub fn is_directory(&self) -> bool {
        self.directory
    }

    pub fn to_path_buf(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(&self.path)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn studio(&self) -> &str {
        &self.studio
    }

    pub fn path_type(&self) -> &str {
        &self.path_type
    }

    pub fn into_string(self) -> String {
        self.path
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl AsRef<str> for ResolvedPath {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

/// Normalize separators for `platform`
///
/// - `/` and `\` both become the platform separator
/// - empty segments collapse, a leading root separator survives
/// - a Windows UNC prefix (`\\server`) keeps both separators
/// - `trailing` appends one separator to a non-empty path
pub fn normalize(raw: &str, platform: Platform, trailing: bool) -> String {
    let sep = platform.separator();
    let is_sep = |c: char| c == '/' || c == '\\';

    let mut out = String::with_capacity(raw.len());
    if raw.starts_with(is_sep) {
        out.push(sep);
        let mut chars = raw.chars();
        chars.next();
        if platform == Platform::Windows && chars.next().is_some_and(is_sep) {
            out.push(sep);
        }
    }

    let mut first = true;
    for segment in raw.split(is_sep).filter(|s| !s.is_empty()) {
        if !first {
            out.push(sep);
        }
        out.push_str(segment);
        first = false;
    }

    if trailing && !first {
        out.push(sep);
    }
    out
}

/// Resolves `(studio, path_type, context)` against a registry
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
    registry: &'r MappingRegistry,
    platform: Platform,
}

impl<'r> Resolver<'r> {
    /// Resolver targeting the host platform
    pub fn new(registry: &'r MappingRegistry) -> Self {
        Self {
            registry,
            platform: Platform::host(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    #[inline]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    #[inline]
    pub fn registry(&self) -> &'r MappingRegistry {
        self.registry
    }

    pub fn resolve(&self, studio: &str, path_type: &str, ctx: &Context) -> Result<ResolvedPath> {
        let template = self.registry.lookup(studio, path_type)?;
        self.render(studio, template, ctx)
    }

    /// Resolve an already looked-up template
    pub fn render(
        &self,
        studio: &str,
        template: &TemplatePath,
        ctx: &Context,
    ) -> Result<ResolvedPath> {
        let (raw, rooted) = self.substitute(studio, template, template.tokens(), ctx)?;
        let directory = template.has_trailing_separator();
        let path = normalize(unrooted(&raw, rooted), self.platform, directory);
        trace!(studio, path_type = template.path_type(), %path, "Resolved path");

        Ok(ResolvedPath {
            path,
            directory,
            platform: self.platform,
            studio: Arc::from(studio),
            path_type: template.path_type_id(),
        })
    }

    /// Resolve a leading run of template segments (no trailing separator)
    pub fn render_prefix(
        &self,
        studio: &str,
        template: &TemplatePath,
        segments: &[Segment],
        ctx: &Context,
    ) -> Result<String> {
        let mut raw = String::new();
        let mut rooted = template.has_leading_separator();
        if rooted {
            raw.push('/');
        }
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                raw.push('/');
            }
            let (text, segment_rooted) = self.substitute(studio, template, segment, ctx)?;
            if raw.trim_start_matches(['/', '\\']).is_empty() && !text.is_empty() {
                rooted |= segment_rooted;
            }
            raw.push_str(&text);
        }
        Ok(normalize(unrooted(&raw, rooted), self.platform, false))
    }

    /// Substituted text, and whether its leading separator is a real root
    ///
    /// A root comes from a literal opening the token run or from a variable
    /// value; a separator that only leads because an optional variable
    /// before it rendered empty is not one.
    fn substitute(
        &self,
        studio: &str,
        template: &TemplatePath,
        tokens: &[PathToken],
        ctx: &Context,
    ) -> Result<(String, bool)> {
        let mut out = String::with_capacity(template.raw().len() + 32);
        let mut rooted = None;

        for (i, token) in tokens.iter().enumerate() {
            let name = match token {
                PathToken::Literal(text) => {
                    if rooted.is_none() && !text.is_empty() {
                        rooted = Some(i == 0 && text.starts_with(['/', '\\']));
                    }
                    out.push_str(text);
                    continue;
                }
                PathToken::Variable(name) => name,
            };

            let Some(var) = template.binding(name) else {
                return Err(BifrostError::UndeclaredVariable {
                    variable: name.to_string(),
                    template: template.raw().to_string(),
                });
            };

            match ctx.get(name).or(var.default.as_ref()) {
                Some(value) => {
                    let text = var.render(value)?;
                    if rooted.is_none() && !text.is_empty() {
                        rooted = Some(text.starts_with(['/', '\\']));
                    }
                    out.push_str(&text);
                }
                None if var.required => {
                    return Err(BifrostError::MissingVariable {
                        variable: name.to_string(),
                        path_type: template.path_type().to_string(),
                        studio: studio.to_string(),
                    });
                }
                None => {}
            }
        }

        Ok((out, rooted.unwrap_or(false)))
    }
}

/// Drop leading separators that do not mark a root
fn unrooted(raw: &str, rooted: bool) -> &str {
    if rooted {
        raw
    } else {
        raw.trim_start_matches(['/', '\\'])
    }
}
