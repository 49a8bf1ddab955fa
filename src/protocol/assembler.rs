//! Frame assembler for turning raw chunks into sentences.
//!
//! Implements a state machine for handling words split at any byte:
//! - `AwaitingLength`: next bytes are a length descriptor (possibly partial)
//! - `AwaitingWord`: descriptor parsed, N more word bytes owed
//!
//! A partial descriptor is held in a small `BytesMut` and prepended to the
//! next chunk. Word bytes are decoded as they arrive, so a partial word is
//! kept as text rather than raw bytes.
//!
//! # Example
//!
//! ```
//! use apiwire::codec::encode_sentence;
//! use apiwire::protocol::FrameAssembler;
//!
//! let bytes = encode_sentence(&["!re", "=name=ether1", ".tag=1"]).unwrap();
//! let mut assembler = FrameAssembler::new();
//!
//! // Data arrives in arbitrary pieces from the socket
//! assert!(assembler.push(&bytes[..6]).unwrap().is_empty());
//! let sentences = assembler.push(&bytes[6..]).unwrap();
//!
//! assert_eq!(sentences.len(), 1);
//! assert_eq!(sentences[0].words(), &["!re", "=name=ether1", ".tag=1"]);
//! ```

use bytes::BytesMut;

use super::Sentence;
use crate::codec::{charset, decode_length, MAX_DESCRIPTOR_WIDTH};
use crate::config::DEFAULT_MAX_WORD_LENGTH;
use crate::error::{ApiwireError, Result};

/// State machine for word parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Waiting for a complete length descriptor.
    AwaitingLength,
    /// Descriptor parsed, waiting for word bytes.
    AwaitingWord { declared: u32, remaining: u32 },
}

/// Accumulates incoming bytes and extracts complete sentences.
pub struct FrameAssembler {
    /// Bytes of a descriptor cut off by the end of the previous chunk.
    descriptor: BytesMut,
    /// Decoded text of the word in progress.
    word: String,
    /// Completed words of the sentence in progress.
    words: Vec<String>,
    /// Current parsing state.
    state: State,
    /// Largest word a descriptor may declare.
    max_word_length: u32,
    /// Set once a malformed descriptor was seen.
    poisoned: bool,
    /// Fault held back so sentences completed before it could be returned.
    fault: Option<ApiwireError>,
}

impl FrameAssembler {
    /// Create a new assembler with the default word limit (64 MiB).
    pub fn new() -> Self {
        Self::with_max_word_length(DEFAULT_MAX_WORD_LENGTH)
    }

    /// Create a new assembler with a custom word limit.
    pub fn with_max_word_length(max_word_length: u32) -> Self {
        Self {
            descriptor: BytesMut::with_capacity(MAX_DESCRIPTOR_WIDTH * 2),
            word: String::new(),
            words: Vec::new(),
            state: State::AwaitingLength,
            max_word_length,
            poisoned: false,
            fault: None,
        }
    }

    /// Push a chunk and extract every sentence it completes.
    ///
    /// Partial descriptors, words and sentences are retained for the next
    /// push. Each returned sentence records whether bytes of this chunk
    /// followed its terminator.
    ///
    /// # Errors
    ///
    /// Returns [`ApiwireError::WordTooLong`] if a descriptor declares more
    /// than the configured maximum. The assembler is then poisoned and every
    /// later push fails with [`ApiwireError::Poisoned`] until [`reset`].
    ///
    /// Sentences completed earlier in the faulting chunk are still returned
    /// as `Ok`; the fault is then held for [`take_fault`] and reported by
    /// the next push.
    ///
    /// [`reset`]: FrameAssembler::reset
    /// [`take_fault`]: FrameAssembler::take_fault
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Sentence>> {
        if let Some(fault) = self.fault.take() {
            return Err(fault);
        }
        if self.poisoned {
            return Err(ApiwireError::Poisoned);
        }

        let joined;
        let data: &[u8] = if self.descriptor.is_empty() {
            chunk
        } else {
            self.descriptor.extend_from_slice(chunk);
            joined = self.descriptor.split();
            &joined
        };

        let mut sentences = Vec::new();
        let mut pos = 0;

        while pos < data.len() {
            match self.state {
                State::AwaitingWord {
                    declared,
                    remaining,
                } => {
                    let take = (remaining as usize).min(data.len() - pos);
                    let bytes = &data[pos..pos + take];
                    pos += take;

                    // Some peers terminate with a length-1 null word.
                    if declared == 1 && bytes == [0x00] {
                        self.state = State::AwaitingLength;
                        sentences.push(self.close_sentence(pos < data.len()));
                        continue;
                    }

                    charset::decode_into(bytes, &mut self.word);
                    let remaining = remaining - take as u32;
                    if remaining == 0 {
                        self.words.push(std::mem::take(&mut self.word));
                        self.state = State::AwaitingLength;
                    } else {
                        self.state = State::AwaitingWord {
                            declared,
                            remaining,
                        };
                    }
                }

                State::AwaitingLength => {
                    let Some(descriptor) = decode_length(&data[pos..]) else {
                        self.descriptor.extend_from_slice(&data[pos..]);
                        break;
                    };
                    pos += descriptor.width;

                    if descriptor.length > self.max_word_length {
                        self.poisoned = true;
                        self.words.clear();
                        let fault = ApiwireError::WordTooLong {
                            length: descriptor.length,
                            max: self.max_word_length,
                        };
                        if sentences.is_empty() {
                            return Err(fault);
                        }
                        self.fault = Some(fault);
                        return Ok(sentences);
                    }

                    if descriptor.length == 0 {
                        sentences.push(self.close_sentence(pos < data.len()));
                    } else {
                        self.state = State::AwaitingWord {
                            declared: descriptor.length,
                            remaining: descriptor.length,
                        };
                    }
                }
            }
        }

        Ok(sentences)
    }

    fn close_sentence(&mut self, had_more: bool) -> Sentence {
        Sentence::new(std::mem::take(&mut self.words), had_more)
    }

    /// Whether a descriptor or word is only partially received.
    pub fn has_partial_word(&self) -> bool {
        !self.descriptor.is_empty() || matches!(self.state, State::AwaitingWord { .. })
    }

    /// Whether nothing is buffered: no partial word and no open sentence.
    pub fn is_idle(&self) -> bool {
        !self.has_partial_word() && self.words.is_empty()
    }

    /// Whether a frame fault stopped the assembler.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Take a fault held back by the last push, if any.
    pub fn take_fault(&mut self) -> Option<ApiwireError> {
        self.fault.take()
    }

    /// Drop all partial state and clear a fault.
    pub fn reset(&mut self) {
        self.descriptor.clear();
        self.word.clear();
        self.words.clear();
        self.state = State::AwaitingLength;
        self.poisoned = false;
        self.fault = None;
    }

    /// Get the current state for debugging.
    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::AwaitingLength => "AwaitingLength",
            State::AwaitingWord { .. } => "AwaitingWord",
        }
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}
