//! Tag registry for dispatching packets by tag.
//!
//! The registry maps a tag to the single handler currently waiting for its
//! replies. The connection layer adds and removes entries; the decoder only
//! looks them up when a packet is flushed.
//!
//! # Example
//!
//! ```
//! use apiwire::handler::{DispatchOutcome, TagRegistry};
//! use apiwire::Packet;
//!
//! let mut registry = TagRegistry::new();
//!
//! registry.register("1", |packet| {
//!     println!("{:?}", packet.words());
//!     Ok(())
//! });
//!
//! let outcome = registry.dispatch(Packet::new("1", vec!["!done".into()]));
//! assert_eq!(outcome, DispatchOutcome::Delivered);
//! ```

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use super::Packet;

/// Error type handlers may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for handler functions.
pub type HandlerResult = std::result::Result<(), BoxError>;

/// Trait for packet consumers.
pub trait PacketHandler: Send + 'static {
    /// Handle one packet addressed to the handler's tag.
    fn handle(&mut self, packet: Packet) -> HandlerResult;
}

impl<F> PacketHandler for F
where
    F: FnMut(Packet) -> HandlerResult + Send + 'static,
{
    fn handle(&mut self, packet: Packet) -> HandlerResult {
        self(packet)
    }
}

/// What happened to a dispatched packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handler ran and returned `Ok`.
    Delivered,
    /// No handler for the tag; packet dropped.
    Unregistered,
    /// Handler returned an error.
    Failed,
    /// Handler panicked.
    Panicked,
}

/// Registry mapping tags to handlers.
#[derive(Default)]
pub struct TagRegistry {
    handlers: HashMap<String, Box<dyn PacketHandler>>,
}

impl TagRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a closure as the handler for `tag`, replacing any previous one.
    ///
    /// Returns `true` if a handler was replaced.
    pub fn register<F>(&mut self, tag: impl Into<String>, handler: F) -> bool
    where
        F: FnMut(Packet) -> HandlerResult + Send + 'static,
    {
        self.register_handler(tag, handler)
    }

    /// Install any [`PacketHandler`] for `tag`.
    pub fn register_handler<H: PacketHandler>(&mut self, tag: impl Into<String>, handler: H) -> bool {
        self.handlers
            .insert(tag.into(), Box::new(handler))
            .is_some()
    }

    /// Install an already boxed handler.
    pub fn register_boxed(&mut self, tag: impl Into<String>, handler: Box<dyn PacketHandler>) -> bool {
        self.handlers.insert(tag.into(), handler).is_some()
    }

    /// Remove the handler for `tag`. Returns `true` if one was registered.
    pub fn unregister(&mut self, tag: &str) -> bool {
        self.handlers.remove(tag).is_some()
    }

    /// Whether `tag` has a handler.
    pub fn contains(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no tags are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Deliver a packet to the handler for its tag.
    ///
    /// Never fails: a missing handler drops the packet, and a handler error
    /// or panic is logged and reported through the outcome.
    pub fn dispatch(&mut self, packet: Packet) -> DispatchOutcome {
        let Some(handler) = self.handlers.get_mut(packet.tag()) else {
            tracing::warn!(
                tag = packet.tag(),
                words = packet.words().len(),
                "No handler registered for tag, dropping packet"
            );
            return DispatchOutcome::Unregistered;
        };

        let tag = packet.tag().to_owned();
        match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(packet))) {
            Ok(Ok(())) => DispatchOutcome::Delivered,
            Ok(Err(e)) => {
                tracing::error!(tag = %tag, "Handler error: {}", e);
                DispatchOutcome::Failed
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(tag = %tag, "Handler panicked: {}", message);
                DispatchOutcome::Panicked
            }
        }
    }
}
