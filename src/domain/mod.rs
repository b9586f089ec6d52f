// Domain-specific error types
pub mod errors;

// Price history domain
pub mod market;

// Normalization and windowing
pub mod ml;

// Port interfaces
pub mod ports;
