//! BiteBox Core - Shared types library.
//!
//! This crate provides common types used across all BiteBox components:
//! - `cart` - Cart store, pricing policies and checkout flow
//! - `cli` - Command-line driver for the cart
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
