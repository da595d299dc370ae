//! Semantic layer: context, node tree, and the parse-tree-to-semantic builder
//!
//! The pipeline is build-then-emit: [`SemanticTreeBuilder`] resolves names and
//! applies rewrite rules while walking the parse tree, and the resulting
//! [`SemanticNode`] tree emits target text as a pure fold over the
//! [`TransformationContext`].

mod builder;
mod context;
mod node;

pub use builder::SemanticTreeBuilder;
pub use context::{ColumnInfo, MetadataIndices, MetadataIndicesBuilder, TransformationContext};
pub use node::{CommonTableExpr, OrderItem, SemanticNode};
