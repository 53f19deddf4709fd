//! Mapping Module - studio template registry
//!
//! `MappingRegistry` is compiled once from `folder_mapping.yaml` and is
//! read-only afterwards. Lookup order for `(studio, path_type)`:
//!
//! ```text
//! studio → parent → grandparent → ... → default_studio → PathTypeNotFound
//! ```

mod registry;

pub use registry::{MappingRegistry, StudioMapping};
