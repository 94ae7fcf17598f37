//! Platform abstraction layer
//!
//! The browser build backs storage, drawing, messaging and score submission
//! with web APIs. Everything else in the crate only sees the traits.

#[cfg(target_arch = "wasm32")]
pub mod web;
