//! # chart-core: Foundational Types for the Chart Data Service
//!
//! This crate is the leaf of the workspace DAG. It defines the data shapes
//! shared by the compliance engine, the HTTP service, and the CLI:
//!
//! 1. **`DocumentValue`**: a closed, recursively nested value type for
//!    arbitrary JSON-like data. Type checks are variant-tag comparisons via
//!    [`DocumentValue::kind`], never reflection.
//!
//! 2. **Template model**: [`Template`], [`RequiredKeySpec`] and
//!    [`Metadata`]: the required-key rules a dataset may declare compliance
//!    with.
//!
//! 3. **Dataset model**: [`Dataset`], an arbitrary document plus the ordered
//!    list of templates it claims to satisfy.
//!
//! 4. **Identifier newtypes**: [`DatasetId`] and [`TemplateId`]. No bare
//!    UUIDs cross crate boundaries.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `chart-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Wire names are camelCase to match the stored record format.

pub mod dataset;
pub mod error;
pub mod identity;
pub mod template;
pub mod value;

pub use dataset::Dataset;
pub use error::{ValidationError, ValueError};
pub use identity::{DatasetId, TemplateId};
pub use template::{Metadata, RequiredKeySpec, Template, DEFAULT_ITERATED_KEY};
pub use value::{DocumentValue, ObjectMap, ValueKind};
