//! # apiwire
//!
//! Streaming decoder for the tagged, length-prefixed management API wire
//! protocol.
//!
//! A connection carries replies for many requests at once. Each reply is a
//! sequence of sentences; each sentence is a list of length-prefixed words
//! closed by a zero-length word. A `.tag=<id>` word ties a sentence to the
//! request that caused it.
//!
//! ## Architecture
//!
//! - **Codec**: variable-width length descriptors and single-byte text
//! - **Protocol**: frame assembler turning arbitrary chunks into sentences
//! - **Decoder**: sentence pump grouping words into packets per tag
//! - **Handler**: tag registry delivering each packet to its consumer
//! - **Session**: tokio task feeding a decoder from an `AsyncRead`
//!
//! ## Example
//!
//! ```
//! use apiwire::codec::encode_sentence;
//! use apiwire::Decoder;
//!
//! let mut decoder = Decoder::new();
//! decoder.register_tag("1", |packet| {
//!     assert_eq!(packet.attribute("name"), Some("ether1"));
//!     Ok(())
//! });
//!
//! let bytes = encode_sentence(&["!re", "=name=ether1", ".tag=1"]).unwrap();
//! decoder.feed(&bytes).unwrap();
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod protocol;

mod decoder;
mod session;

pub use config::DecoderConfig;
pub use decoder::{Decoder, FatalSink};
pub use error::ApiwireError;
pub use handler::Packet;
pub use session::{Session, SessionEnd, SessionHandle};
