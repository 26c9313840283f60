//! wlp-cleaner: prunes redundant data from Wonderland Engine project files
//!
//! A project (`.wlp`) stores every scene object with its components. Over
//! time it accumulates properties equal to their defaults, components whose
//! type no longer exists, and near-identity transforms. This crate removes
//! them while leaving the rest of the file byte-for-byte intact:
//! - [`document`] parses JSON with comments into an editable lossless tree
//! - [`bundle`] obtains the user component declarations from the editor bundle
//! - [`schema`] merges them with the engine-native components
//! - [`cleanup`] walks the project and applies the removal rules

pub mod bundle;
pub mod cleanup;
pub mod config;
pub mod document;
pub mod error;
pub mod schema;
