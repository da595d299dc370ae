//! Segment data model for scanned containers
//!
//! A container (package body or type body) holds multiple callable units. The
//! boundary scanner records one [`UnitSegment`] per unit with byte offsets into
//! the cleaned source, enabling extraction and stub generation without parsing
//! the whole container.

use std::fmt;

/// Kind of callable unit found inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Function,
    Procedure,
    MemberFunction,
    MemberProcedure,
    StaticFunction,
    StaticProcedure,
    MapFunction,
    OrderFunction,
    Constructor,
}

impl UnitKind {
    /// True for value-returning units. Constructors return SELF and count as
    /// value-returning for stub purposes.
    pub fn returns_value(self) -> bool {
        !matches!(
            self,
            UnitKind::Procedure | UnitKind::MemberProcedure | UnitKind::StaticProcedure
        )
    }

    pub fn is_type_method(self) -> bool {
        !matches!(self, UnitKind::Function | UnitKind::Procedure)
    }

    /// The keyword sequence that introduced this unit, as it appears in source.
    pub fn introducer(self) -> &'static str {
        match self {
            UnitKind::Function => "FUNCTION",
            UnitKind::Procedure => "PROCEDURE",
            UnitKind::MemberFunction => "MEMBER FUNCTION",
            UnitKind::MemberProcedure => "MEMBER PROCEDURE",
            UnitKind::StaticFunction => "STATIC FUNCTION",
            UnitKind::StaticProcedure => "STATIC PROCEDURE",
            UnitKind::MapFunction => "MAP MEMBER FUNCTION",
            UnitKind::OrderFunction => "ORDER MEMBER FUNCTION",
            UnitKind::Constructor => "CONSTRUCTOR FUNCTION",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.introducer())
    }
}

/// One callable unit inside a container.
///
/// Offsets are byte positions into the cleaned source. `start_offset` points at
/// the first keyword of the introducer, `end_offset` is one past the
/// terminating `;`. `body_start` is the first byte after `IS`/`AS` (and any
/// following whitespace), `body_end` points at the terminating `END` keyword.
/// Invariant: `start_offset < end_offset`, and segments of one container are
/// pairwise disjoint and ordered by `start_offset`.
#[derive(Debug, Clone)]
pub struct UnitSegment {
    pub name: String,
    pub kind: UnitKind,
    /// Signature text from the introducer keyword up to (not including) the
    /// terminating `IS`/`AS`, trailing whitespace trimmed.
    pub signature_text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    /// Offset of the `IS`/`AS` keyword terminating the signature.
    pub signature_end: usize,
    pub body_start: usize,
    pub body_end: usize,
}

impl UnitSegment {
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn body_len(&self) -> usize {
        self.body_end.saturating_sub(self.body_start)
    }

    /// Length of the signature region relative to the unit start.
    pub fn signature_end_relative(&self) -> usize {
        self.signature_end.saturating_sub(self.start_offset)
    }
}

impl fmt::Display for UnitSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}..{}, body: {}..{}]",
            self.kind, self.name, self.start_offset, self.end_offset, self.body_start, self.body_end
        )
    }
}

/// Ordered collection of unit segments for one container.
///
/// Overloaded units are positional: two segments may share a name and are kept
/// in source order.
#[derive(Debug, Clone, Default)]
pub struct ContainerSegments {
    units: Vec<UnitSegment>,
}

impl ContainerSegments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: UnitSegment) {
        debug_assert!(segment.start_offset < segment.end_offset);
        self.units.push(segment);
    }

    pub fn units(&self) -> &[UnitSegment] {
        &self.units
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UnitSegment> {
        self.units.iter()
    }
}

impl<'a> IntoIterator for &'a ContainerSegments {
    type Item = &'a UnitSegment;
    type IntoIter = std::slice::Iter<'a, UnitSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}
