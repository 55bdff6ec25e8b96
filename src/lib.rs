//! Fixpoint Core Library
//!
//! Core functionality for Fixpoint - a single "current best position" query
//! over an asynchronous device location provider.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

pub mod location;

pub use location::{LocationCoordinator, LocationError, LocationProvider, Reading};
