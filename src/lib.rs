//! plsql2pg: an Oracle-to-PostgreSQL schema and code transformation engine
//!
//! The engine decomposes oversized procedural containers (package bodies,
//! type bodies) into callable units without parsing whole containers, parses
//! small stubs for cheap metadata extraction, rewrites SELECT fragments into
//! PostgreSQL through a semantic node tree, analyzes CONNECT BY clauses for
//! recursive-CTE generation, and orders composite types for creation.

pub mod error;
pub mod model;
pub mod parser;
pub mod segment;
pub mod semantic;

use rayon::prelude::*;

pub use error::TransformError;

use segment::{BoundaryScanner, ContainerSegments, UnitStub};
use semantic::{SemanticTreeBuilder, TransformationContext};

/// Everything produced by decomposing one container: cleaned source, unit
/// segments, per-unit stubs, and the reduced declarative skeleton.
#[derive(Debug)]
pub struct ContainerArtifacts {
    pub container: String,
    pub cleaned: String,
    pub segments: ContainerSegments,
    pub stubs: Vec<UnitStub>,
    pub reduced: String,
}

impl ContainerArtifacts {
    /// Percentage of the cleaned source removed by body reduction.
    pub fn reduction_percentage(&self) -> f64 {
        segment::reduction_percentage(self.cleaned.len(), self.reduced.len())
    }
}

/// Runs the full segmentation pipeline on one container:
/// comment removal, boundary scan, stub generation, body reduction.
pub fn decompose_container(
    container: &str,
    raw_source: &str,
) -> Result<ContainerArtifacts, TransformError> {
    let cleaned = segment::strip_comments(raw_source);
    let segments = BoundaryScanner::scan(container, &cleaned)?;
    let stubs = segment::generate_all_stubs(&cleaned, &segments);
    let reduced = segment::reduce_container(&cleaned, &segments);

    Ok(ContainerArtifacts {
        container: container.to_string(),
        cleaned,
        segments,
        stubs,
        reduced,
    })
}

/// Minimum number of containers to benefit from parallel processing.
/// Below this threshold, sequential processing is faster due to rayon overhead.
const PARALLEL_THRESHOLD: usize = 8;

/// Decomposes multiple containers, in parallel for larger batches.
///
/// Containers are independent, so a failure in one does not stop the others;
/// each result is reported separately.
pub fn decompose_containers(
    containers: &[(String, String)],
) -> Vec<Result<ContainerArtifacts, TransformError>> {
    if containers.len() >= PARALLEL_THRESHOLD {
        containers
            .par_iter()
            .map(|(name, source)| decompose_container(name, source))
            .collect()
    } else {
        containers
            .iter()
            .map(|(name, source)| decompose_container(name, source))
            .collect()
    }
}

/// Transforms one SELECT fragment into PostgreSQL text.
///
/// Parse errors surface as [`TransformError::SyntaxErrors`]; constructs
/// without a semantic mapping surface as
/// [`TransformError::UnsupportedConstruct`].
pub fn transform_select(
    sql: &str,
    ctx: &TransformationContext,
) -> Result<String, TransformError> {
    let parser = parser::GrammarParser::new();
    let outcome = parser.parse_select(sql)?;

    if outcome.has_errors() {
        return Err(TransformError::SyntaxErrors {
            count: outcome.errors().len(),
            detail: outcome.error_message().unwrap_or_default(),
        });
    }
    let statement = outcome.into_tree().ok_or_else(|| {
        TransformError::invalid_input("parser produced no tree and no errors")
    })?;

    let mut builder = SemanticTreeBuilder::new(ctx);
    let tree = builder.build(&statement)?;
    tree.emit(ctx)
}
