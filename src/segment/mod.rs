//! Container segmentation pipeline
//!
//! Decomposes oversized procedural containers (package bodies, type bodies)
//! into manageable units without parsing the whole container: comment removal,
//! boundary scanning, stub generation, and body reduction. Designed for
//! streaming, one-container-at-a-time invocation so peak memory stays at
//! roughly one container's working set.

mod cleaner;
mod reducer;
mod scanner;
mod segments;
mod stub;

pub use cleaner::strip_comments;
pub use reducer::{estimate_reduced_len, reduce_container, reduction_percentage};
pub use scanner::BoundaryScanner;
pub use segments::{ContainerSegments, UnitKind, UnitSegment};
pub use stub::{generate_all_stubs, generate_stub, UnitStub};
