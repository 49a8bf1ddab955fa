//! Protocol module - sentence framing and classification.
//!
//! This module implements the receive side of the wire protocol:
//! - Frame assembler turning arbitrary chunks into sentences
//! - Sentence type with reply/tag classification

mod assembler;
mod sentence;

pub use assembler::FrameAssembler;
pub use sentence::{Reply, Sentence, Word, TAG_PREFIX};
