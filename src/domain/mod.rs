// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain types shared by every other layer. No burn types,
// no file I/O.
//
//   mode.rs  — Train / Evaluate / Predict
//   error.rs — ConfigError and ModelError

/// Which estimator entry point is running
pub mod mode;

/// Typed configuration and model errors
pub mod error;
