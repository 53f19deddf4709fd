//! Translator - the same context resolved under two studios
//!
//! Translation never parses a path string backwards: both sides are
//! resolved from the caller's context, so a translation is exactly as
//! deterministic as resolution.

use serde::Serialize;

use super::resolver::{ResolvedPath, Resolver};
use crate::context::Context;
use crate::error::Result;

/// Both sides of a cross-studio translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Translation {
    pub from: ResolvedPath,
    pub to: ResolvedPath,
}

#[derive(Debug, Clone, Copy)]
pub struct Translator<'r> {
    resolver: Resolver<'r>,
}

impl<'r> Translator<'r> {
    pub fn new(resolver: Resolver<'r>) -> Self {
        Self { resolver }
    }

    /// Path of `path_type` for `to_studio`, after checking `from_studio` resolves too
    pub fn translate(
        &self,
        ctx: &Context,
        path_type: &str,
        from_studio: &str,
        to_studio: &str,
    ) -> Result<ResolvedPath> {
        Ok(self.translate_pair(ctx, path_type, from_studio, to_studio)?.to)
    }

    pub fn translate_pair(
        &self,
        ctx: &Context,
        path_type: &str,
        from_studio: &str,
        to_studio: &str,
    ) -> Result<Translation> {
        // Destination first so a missing path type is reported even for a
        // context the source studio would reject
        let to_template = self.resolver.registry().lookup(to_studio, path_type)?;
        let from = self.resolver.resolve(from_studio, path_type, ctx)?;
        let to = self.resolver.render(to_studio, to_template, ctx)?;
        Ok(Translation { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FolderMappingDoc;
    use crate::mapping::MappingRegistry;
    use crate::resolve::Platform;
    use crate::template::ConfigVars;

    const MAPPING: &str = r#"
default_studio: main
studio_mappings:
  main:
    templates:
      shot_work_path: "/main/{PROJECT}/shots/{SEQUENCE}/{SHOT}/work/"
  partner:
    templates:
      shot_work_path: "/partner/{PROJECT}/{SEQUENCE}_{SHOT}/"
      partner_only: "/partner/only/"
"#;

    fn registry() -> MappingRegistry {
        let doc = FolderMappingDoc::parse(MAPPING).unwrap();
        MappingRegistry::build(&doc, &ConfigVars::new()).unwrap()
    }

    fn ctx() -> Context {
        Context::builder()
            .set("PROJECT", "show")
            .shot("sq010", "sh020")
            .build()
    }

    #[test]
    fn translate_between_studios() {
        let reg = registry();
        let translator = Translator::new(Resolver::new(&reg).with_platform(Platform::Posix));
        let pair = translator
            .translate_pair(&ctx(), "shot_work_path", "main", "partner")
            .unwrap();
        assert_eq!(pair.from.as_str(), "/main/show/shots/sq010/sh020/work/");
        assert_eq!(pair.to.as_str(), "/partner/show/sq010_sh020/");
        assert_eq!(pair.to.studio(), "partner");
    }

    #[test]
    fn round_trip_is_stable() {
        let reg = registry();
        let resolver = Resolver::new(&reg).with_platform(Platform::Posix);
        let translator = Translator::new(resolver);
        let there = translator.translate(&ctx(), "shot_work_path", "main", "partner").unwrap();
        let back = translator.translate(&ctx(), "shot_work_path", "partner", "main").unwrap();
        assert_eq!(back, resolver.resolve("main", "shot_work_path", &ctx()).unwrap());
        assert_ne!(there, back);
    }

    #[test]
    fn destination_without_path_type_fails() {
        let reg = registry();
        let translator = Translator::new(Resolver::new(&reg));
        // main falls back to itself as default studio, which lacks partner_only
        let err = translator
            .translate(&Context::default(), "partner_only", "partner", "main")
            .unwrap_err();
        assert_eq!(err.code(), "BIF-020");
    }
}
