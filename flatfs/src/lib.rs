// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
extern crate alloc;

// Core Modules
pub mod core;
pub mod fs;

// Reusable types and traits
pub use self::core::traits::*;

// Utilities
pub use self::core::utils::{bitmap::BitmapOps, path_utils::*};

/// Flat-table volume implementation.
///
/// See [`flat::FlatFs`] for the facade, [`flat::FlatFormatter`],
/// [`flat::FlatAllocator`] and [`flat::FlatChecker`] for the parts.
pub mod flat {
    pub use super::fs::flat::prelude::*;
}
