//! Sentences and word classification.
//!
//! A sentence is the list of words between two terminators. Each word is
//! one of:
//! - a tag line, `.tag=<id>`, naming the request the sentence answers
//! - a reply marker (`!re`, `!done`, `!trap`, `!fatal`, `!empty`)
//! - anything else, an attribute line kept verbatim
//!
//! # Example
//!
//! ```
//! use apiwire::protocol::{Reply, Sentence, Word};
//!
//! assert_eq!(Word::classify(".tag=7"), Word::Tag("7"));
//! assert_eq!(Word::classify("!re"), Word::Reply(Reply::Re));
//! assert_eq!(Word::classify("=name=ether1"), Word::Attribute("=name=ether1"));
//!
//! let sentence = Sentence::new(vec!["!re".into(), ".tag=7".into()], false);
//! assert_eq!(sentence.reply(), Some(Reply::Re));
//! assert_eq!(sentence.tag(), Some("7"));
//! ```

use std::fmt;

/// Prefix of a tag-assignment word.
pub const TAG_PREFIX: &str = ".tag=";

/// Reply marker opening a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reply {
    /// One row of data.
    Re,
    /// Command completed.
    Done,
    /// Command failed with an application error.
    Trap,
    /// Session is being terminated by the remote end.
    Fatal,
    /// Command completed with no rows (newer protocol revisions).
    Empty,
}

impl Reply {
    /// Parse a reply marker word.
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "!re" => Some(Reply::Re),
            "!done" => Some(Reply::Done),
            "!trap" => Some(Reply::Trap),
            "!fatal" => Some(Reply::Fatal),
            "!empty" => Some(Reply::Empty),
            _ => None,
        }
    }

    /// The marker as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Reply::Re => "!re",
            Reply::Done => "!done",
            Reply::Trap => "!trap",
            Reply::Fatal => "!fatal",
            Reply::Empty => "!empty",
        }
    }

    /// Whether no further replies follow for the same tag.
    #[inline]
    pub fn is_final(&self) -> bool {
        matches!(self, Reply::Done | Reply::Fatal | Reply::Empty)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified view of a single word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Word<'a> {
    /// `.tag=<id>`, carrying the id.
    Tag(&'a str),
    /// A reply marker.
    Reply(Reply),
    /// Any other word, verbatim.
    Attribute(&'a str),
}

impl<'a> Word<'a> {
    /// Classify a decoded word.
    pub fn classify(word: &'a str) -> Self {
        if let Some(tag) = word.strip_prefix(TAG_PREFIX) {
            return Word::Tag(tag);
        }
        match Reply::parse(word) {
            Some(reply) => Word::Reply(reply),
            None => Word::Attribute(word),
        }
    }
}

/// A complete sentence as produced by the frame assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    words: Vec<String>,
    had_more: bool,
}

impl Sentence {
    /// Create a sentence.
    ///
    /// `had_more` records whether bytes of the same chunk followed the
    /// terminator.
    pub fn new(words: Vec<String>, had_more: bool) -> Self {
        Self { words, had_more }
    }

    /// The words, in wire order.
    #[inline]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Consume the sentence, returning its words.
    pub fn into_words(self) -> Vec<String> {
        self.words
    }

    /// Whether the chunk carrying the terminator had bytes after it.
    #[inline]
    pub fn had_more(&self) -> bool {
        self.had_more
    }

    /// Number of words.
    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the sentence has no words.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// First reply marker in the sentence.
    pub fn reply(&self) -> Option<Reply> {
        self.words.iter().find_map(|w| match Word::classify(w) {
            Word::Reply(reply) => Some(reply),
            _ => None,
        })
    }

    /// Tag id carried by the sentence, if any.
    pub fn tag(&self) -> Option<&str> {
        self.words.iter().find_map(|w| w.strip_prefix(TAG_PREFIX))
    }
}
