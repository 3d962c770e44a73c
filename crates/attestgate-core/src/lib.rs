// SPDX-License-Identifier: PMPL-1.0-or-later
//
// attestgate — Core error and payload types shared across the bridge crates.

pub mod error;
pub mod types;

pub use error::{AttestgateError, PlatformError};
pub use types::*;
