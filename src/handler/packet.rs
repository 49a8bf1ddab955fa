//! Packet value handed to tag handlers.

use crate::protocol::{Reply, TAG_PREFIX};

/// The words of one reply for one tag, in arrival order.
///
/// The first word is normally the reply marker (`!re`, `!done`, `!trap`,
/// `!fatal`); `.tag=` words are not included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    tag: String,
    words: Vec<String>,
}

impl Packet {
    /// Create a packet for `tag`.
    pub fn new(tag: impl Into<String>, words: Vec<String>) -> Self {
        Self {
            tag: tag.into(),
            words,
        }
    }

    /// Tag the packet is addressed to.
    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Packet words.
    #[inline]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Consume the packet, returning its words.
    pub fn into_words(self) -> Vec<String> {
        self.words
    }

    /// Reply marker the packet starts with.
    pub fn reply(&self) -> Option<Reply> {
        self.words.first().and_then(|w| Reply::parse(w))
    }

    /// Whether this packet ends the request (`!done`, `!fatal`), so the
    /// handler can unregister its tag.
    pub fn is_final(&self) -> bool {
        self.reply().is_some_and(|reply| reply.is_final())
    }

    /// `=key=value` attribute words as `(key, value)` pairs.
    ///
    /// ```
    /// use apiwire::Packet;
    ///
    /// let packet = Packet::new("1", vec!["!re".into(), "=name=ether1".into(), "=mtu=1500".into()]);
    /// let attrs: Vec<_> = packet.attributes().collect();
    /// assert_eq!(attrs, [("name", "ether1"), ("mtu", "1500")]);
    /// assert_eq!(packet.attribute("mtu"), Some("1500"));
    /// ```
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.words.iter().filter_map(|w| {
            if w.starts_with(TAG_PREFIX) {
                return None;
            }
            w.strip_prefix('=')?.split_once('=')
        })
    }

    /// Value of the attribute named `key`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}
