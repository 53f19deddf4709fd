//! Template Module - declarative path templates
//!
//! - `variable`: TemplateVariable, VariableTable (declarations + constraints)
//! - `parse`: tokenizer, `${section.key}` expansion, TemplateParser, TemplatePath
//!
//! ```text
//! "{PROJECT}/shots/{SHOT}/v{VERSION}/"
//!        ↓ expand ${...}  →  tokenize
//! [Var(PROJECT), Lit("/shots/"), Var(SHOT), Lit("/v"), Var(VERSION), Lit("/")]
//!        ↓ bind against studio VariableTable
//! TemplatePath { tokens, bindings }
//! ```

mod parse;
mod variable;

pub use parse::{
    expand_config_refs, tokenize, ConfigVars, PathToken, Segment, TemplateParser, TemplatePath,
};
pub use variable::{is_valid_name, Constraint, TemplateVariable, VariableTable};
