//! Utility types for lobulus.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - [`DataDomain`] - Point vs. cell data distinction

mod error;

pub use error::*;
