// All processing lives in autocomply-core
// This CLI acts as a thin wrapper around the core library

// Re-export core types for convenience
pub use autocomply_core::*;
