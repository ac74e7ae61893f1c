//! Shared primitive types used across the entire analysis.

/// Identifier of a single sale record. Assigned at creation, never reused.
pub type RecordId = u64;

/// Identifier of a customer in the roster.
pub type CustomerId = i64;

/// Product names are plain strings keyed by catalog label.
pub type ProductName = String;

/// The canonical analysis run identifier.
pub type RunId = String;
