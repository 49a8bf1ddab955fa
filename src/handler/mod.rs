//! Handler module - packets and the tag registry.
//!
//! Provides:
//! - [`Packet`] - the words of one reply, addressed to a tag
//! - [`TagRegistry`] - maps tags to handlers and delivers packets
//!
//! # Example
//!
//! ```
//! use apiwire::handler::TagRegistry;
//!
//! let mut registry = TagRegistry::new();
//!
//! registry.register("7", |packet| {
//!     for (key, value) in packet.attributes() {
//!         println!("{key} = {value}");
//!     }
//!     Ok(())
//! });
//!
//! assert!(registry.contains("7"));
//! ```

mod packet;
mod registry;

pub use packet::Packet;
pub use registry::{BoxError, DispatchOutcome, HandlerResult, PacketHandler, TagRegistry};
