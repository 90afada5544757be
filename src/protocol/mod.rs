//! Protocol headers read by the classifier
//!
//! Each header type is a zero-copy view over a slice that was already
//! proven in bounds by [`cursor::PacketView`].

pub mod cursor;
pub mod ethernet;
pub mod ipv4;
pub mod ipv6;
pub mod tcp;
pub mod types;
pub mod udp;

pub use cursor::{PacketView, ParseCursor};
pub use types::*;
