#![no_std]

// Layouts shared between the classifier and the control plane that populates
// its tables and reads its counters. Everything here is plain data.

#[cfg(feature = "actions")]
pub mod action;
#[cfg(feature = "keys")]
pub mod keys;

#[cfg(feature = "actions")]
pub use action::*;
#[cfg(feature = "keys")]
pub use keys::*;
