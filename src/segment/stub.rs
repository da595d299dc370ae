//! Stub generation for callable units
//!
//! A stub keeps a unit's signature byte-identical and replaces the body with a
//! minimal valid one, so the grammar parser can extract metadata (name,
//! parameters, return type) without parsing the full implementation. A
//! multi-hundred-line function becomes a four-line stub.

use crate::segment::segments::{ContainerSegments, UnitSegment};

/// Minimal body for value-returning units (functions, type functions, and
/// constructors — a constructor returns SELF, so it takes the value form).
const FUNCTION_STUB_BODY: &str = " IS\nBEGIN\n  RETURN NULL;\nEND;";

/// Minimal body for procedures.
const PROCEDURE_STUB_BODY: &str = " IS\nBEGIN\n  RETURN;\nEND;";

/// A generated stub, positionally aligned with its segment.
///
/// Stubs are positional rather than keyed by name because overloaded units
/// share a name.
#[derive(Debug, Clone)]
pub struct UnitStub {
    pub name: String,
    pub source: String,
}

/// Generates a stub for one unit: the signature up to `IS`/`AS`, byte
/// identical, followed by the minimal body for the unit's return category.
///
/// `full_source` is the unit's exact span `[start_offset, end_offset)` cut from
/// the cleaned container.
pub fn generate_stub(full_source: &str, segment: &UnitSegment) -> String {
    // Signature length relative to the unit start; falls back to the whole
    // span if the segment positions are inconsistent
    let signature_len = segment.signature_end_relative().min(full_source.len());
    let signature = full_source[..signature_len].trim_end();

    let body = if segment.kind.returns_value() {
        FUNCTION_STUB_BODY
    } else {
        PROCEDURE_STUB_BODY
    };

    let mut stub = String::with_capacity(signature.len() + body.len());
    stub.push_str(signature);
    stub.push_str(body);
    stub
}

/// Generates stubs for every unit in a container, in segment order.
pub fn generate_all_stubs(cleaned_source: &str, segments: &ContainerSegments) -> Vec<UnitStub> {
    segments
        .iter()
        .map(|segment| {
            let full_source = &cleaned_source[segment.start_offset..segment.end_offset];
            UnitStub {
                name: segment.name.clone(),
                source: generate_stub(full_source, segment),
            }
        })
        .collect()
}
