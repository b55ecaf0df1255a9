//! `sqlkit` packaged for foreign languages.
//!
//! This crate only re-exports [`sqlkit_core`] and its `UniFFI` scaffolding so
//! that the static and dynamic libraries built from it carry the full
//! exported surface.

pub use sqlkit_core::*;

sqlkit_core::uniffi_reexport_scaffolding!();
