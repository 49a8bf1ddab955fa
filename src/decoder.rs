//! Streaming decoder: sentence queue, pump and tag dispatch.
//!
//! The [`Decoder`] ties the pieces together:
//! 1. [`FrameAssembler`] turns each chunk into complete sentences
//! 2. Sentences are queued and drained one at a time, in arrival order
//! 3. Words are collected into the packet for the open tag
//! 4. Completed packets go to the [`TagRegistry`]
//!
//! A packet is flushed when the next reply marker arrives, when a sentence
//! for another tag interrupts it, or when a chunk ends exactly on a sentence
//! boundary.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use apiwire::codec::encode_sentence;
//! use apiwire::Decoder;
//!
//! let replies = Arc::new(Mutex::new(Vec::new()));
//! let sink = replies.clone();
//!
//! let mut decoder = Decoder::new();
//! decoder.register_tag("1", move |packet| {
//!     sink.lock().unwrap().push(packet.into_words());
//!     Ok(())
//! });
//!
//! let mut bytes = encode_sentence(&["!re", "=name=alice", ".tag=1"]).unwrap().to_vec();
//! bytes.extend_from_slice(&encode_sentence(&["!done", ".tag=1"]).unwrap());
//!
//! decoder.feed(&bytes[..9]).unwrap();
//! decoder.feed(&bytes[9..]).unwrap();
//!
//! assert_eq!(
//!     *replies.lock().unwrap(),
//!     vec![vec!["!re", "=name=alice"], vec!["!done"]]
//! );
//! ```

use std::collections::VecDeque;

use crate::config::DecoderConfig;
use crate::error::{ApiwireError, Result};
use crate::handler::{HandlerResult, Packet, PacketHandler, TagRegistry};
use crate::protocol::{FrameAssembler, Reply, Sentence, Word};

/// Callback fired when the remote end sends `!fatal`.
pub type FatalSink = Box<dyn FnMut() + Send>;

/// How a dequeued sentence is handled.
enum Step {
    /// `!fatal` closing the chunk: notify the connection layer.
    Fatal,
    /// `!empty`: stands in for `!done` on the given (or open) tag.
    Empty { tag: Option<String> },
    /// Anything else: words feed the packet state machine.
    Words {
        tag: Option<String>,
        opens_packet: bool,
        words: Vec<String>,
    },
}

impl Step {
    fn of(sentence: Sentence) -> Self {
        let tag = sentence.tag().map(str::to_owned);
        match sentence.reply() {
            Some(Reply::Fatal) if !sentence.had_more() => Step::Fatal,
            Some(Reply::Empty) => Step::Empty { tag },
            reply => Step::Words {
                tag,
                opens_packet: reply.is_some(),
                words: sentence.into_words(),
            },
        }
    }
}

/// Decoder for one connection's inbound byte stream.
///
/// All methods take `&mut self`: a handler cannot call back into the decoder
/// that is dispatching to it, and callers sharing a decoder across threads
/// must wrap it in a lock or drive it from one task (see
/// [`Session`](crate::Session)).
pub struct Decoder {
    assembler: FrameAssembler,
    queue: VecDeque<Sentence>,
    registry: TagRegistry,
    current_tag: Option<String>,
    current_reply: Option<Reply>,
    packet: Vec<String>,
    fatal_sink: Option<FatalSink>,
    fatal: bool,
}

impl Decoder {
    /// Create a decoder with default configuration.
    pub fn new() -> Self {
        Self::with_config(&DecoderConfig::default())
    }

    /// Create a decoder with custom configuration.
    pub fn with_config(config: &DecoderConfig) -> Self {
        Self {
            assembler: FrameAssembler::with_max_word_length(config.max_word_length),
            queue: VecDeque::new(),
            registry: TagRegistry::new(),
            current_tag: None,
            current_reply: None,
            packet: Vec::new(),
            fatal_sink: None,
            fatal: false,
        }
    }

    /// Feed the next chunk of bytes from the connection.
    ///
    /// Runs every handler the chunk completes before returning.
    ///
    /// # Errors
    ///
    /// Fails only on a malformed frame ([`ApiwireError::WordTooLong`]) and
    /// on every call after one ([`ApiwireError::Poisoned`]). Handler
    /// failures and unregistered tags are logged, not returned.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<()> {
        let sentences = match self.assembler.push(chunk) {
            Ok(sentences) => sentences,
            Err(ApiwireError::Poisoned) => return Err(ApiwireError::Poisoned),
            Err(e) => return Err(self.fault(e)),
        };

        self.queue.extend(sentences);
        self.pump();

        match self.assembler.take_fault() {
            Some(e) => Err(self.fault(e)),
            None => Ok(()),
        }
    }

    /// Stop at a frame fault, delivering the packet built from complete
    /// sentences so far.
    fn fault(&mut self, e: ApiwireError) -> ApiwireError {
        tracing::error!("Frame fault, refusing further input: {}", e);
        if self.current_tag.is_some() {
            self.flush();
        }
        e
    }

    /// Drain the queue, one sentence at a time.
    fn pump(&mut self) {
        let mut last_had_more = None;

        while let Some(sentence) = self.queue.pop_front() {
            last_had_more = Some(sentence.had_more());
            match Step::of(sentence) {
                Step::Fatal => self.fatal(),
                Step::Empty { tag } => self.empty(tag),
                Step::Words {
                    tag,
                    opens_packet,
                    words,
                } => self.words(tag, opens_packet, words),
            }
        }

        // Chunk ended on a sentence boundary: nothing more is coming for now.
        if last_had_more == Some(false)
            && !self.assembler.has_partial_word()
            && self.current_tag.is_some()
        {
            self.flush();
        }
    }

    fn words(&mut self, tag: Option<String>, opens_packet: bool, words: Vec<String>) {
        if !opens_packet {
            if let Some(tag) = tag.as_deref() {
                self.switch_tag(tag);
            }
        }

        for word in words {
            match Word::classify(&word) {
                Word::Tag(_) => {}
                Word::Reply(reply) => {
                    self.close_packet();
                    if let Some(tag) = tag.as_deref() {
                        self.switch_tag(tag);
                    }
                    self.current_reply = Some(reply);
                    self.packet.push(word);
                }
                Word::Attribute(_) => self.packet.push(word),
            }
        }
    }

    fn empty(&mut self, tag: Option<String>) {
        let Some(tag) = tag.or_else(|| self.current_tag.clone()) else {
            tracing::debug!("Ignoring !empty with no open tag");
            return;
        };

        self.close_packet();
        self.current_tag = Some(tag);
        self.current_reply = Some(Reply::Done);
        self.packet.push(Reply::Done.as_str().to_owned());
        self.flush();
    }

    fn fatal(&mut self) {
        self.close_packet();
        self.fatal = true;
        tracing::warn!("Remote end sent !fatal, session terminated");
        if let Some(sink) = self.fatal_sink.as_mut() {
            sink();
        }
    }

    /// Open `tag`, flushing a non-empty packet that belongs to another tag.
    fn switch_tag(&mut self, tag: &str) {
        match self.current_tag.as_deref() {
            Some(open) if open == tag => {}
            Some(_) => {
                if !self.packet.is_empty() {
                    self.flush();
                }
                self.current_tag = Some(tag.to_owned());
            }
            None => self.current_tag = Some(tag.to_owned()),
        }
    }

    /// End the packet in progress before a new one starts.
    fn close_packet(&mut self) {
        if self.current_tag.is_some() {
            if !self.packet.is_empty() {
                self.flush();
            }
        } else if !self.packet.is_empty() {
            tracing::debug!(words = self.packet.len(), "Dropping untagged words");
            self.packet.clear();
            self.current_reply = None;
        }
    }

    /// Hand the packet to its tag's handler and reset the packet state.
    fn flush(&mut self) {
        let words = std::mem::take(&mut self.packet);
        let tag = self.current_tag.take();
        self.current_reply = None;

        match tag {
            Some(tag) if !words.is_empty() => {
                self.registry.dispatch(Packet::new(tag, words));
            }
            Some(_) => {}
            None => {
                if !words.is_empty() {
                    tracing::debug!(words = words.len(), "Dropping untagged words");
                }
            }
        }
    }

    /// Install or replace the handler for `tag`.
    pub fn register_tag<F>(&mut self, tag: impl Into<String>, handler: F) -> bool
    where
        F: FnMut(Packet) -> HandlerResult + Send + 'static,
    {
        self.registry.register(tag, handler)
    }

    /// Install or replace the handler for `tag` with any [`PacketHandler`].
    pub fn register_handler<H: PacketHandler>(&mut self, tag: impl Into<String>, handler: H) -> bool {
        self.registry.register_handler(tag, handler)
    }

    /// Install an already boxed handler.
    pub fn register_boxed(&mut self, tag: impl Into<String>, handler: Box<dyn PacketHandler>) -> bool {
        self.registry.register_boxed(tag, handler)
    }

    /// Remove the handler for `tag`; later packets for it are dropped.
    pub fn unregister_tag(&mut self, tag: &str) -> bool {
        self.registry.unregister(tag)
    }

    /// Whether `tag` has a handler.
    pub fn is_registered(&self, tag: &str) -> bool {
        self.registry.contains(tag)
    }

    /// Set the callback fired on `!fatal`.
    pub fn on_fatal<F>(&mut self, sink: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.fatal_sink = Some(Box::new(sink));
    }

    /// Whether a `!fatal` has been received.
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    /// Whether a frame fault stopped the decoder.
    pub fn is_poisoned(&self) -> bool {
        self.assembler.is_poisoned()
    }

    /// Tag of the packet being collected.
    pub fn current_tag(&self) -> Option<&str> {
        self.current_tag.as_deref()
    }

    /// Reply marker of the packet being collected.
    pub fn current_reply(&self) -> Option<Reply> {
        self.current_reply
    }

    /// Words collected so far for the open packet.
    pub fn pending_words(&self) -> &[String] {
        &self.packet
    }

    /// Drop all partial input and packet state; registrations are kept.
    pub fn reset(&mut self) {
        self.assembler.reset();
        self.queue.clear();
        self.current_tag = None;
        self.current_reply = None;
        self.packet.clear();
        self.fatal = false;
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
