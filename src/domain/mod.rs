// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what the
// system works with. No burn types, no file I/O, no ML code.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A (tags, description) pair and its augmented form
pub mod example;

// Fixed-length token id sequences
pub mod encoding;

// Typed errors for the data pipeline
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
