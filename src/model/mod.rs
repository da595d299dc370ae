//! Domain model: composite types and their dependency analysis.

mod composite_type;
mod dependency;

pub use composite_type::{CompositeType, TypeAttribute};
pub use dependency::{resolve_creation_order, CircularDependency, DependencyAnalysis};
