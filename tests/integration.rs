//! Integration tests for apiwire.
//!
//! These tests drive the public decoder API with encoded byte streams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use apiwire::codec::{decode_length, encode_length, encode_sentence};
use apiwire::{Decoder, Packet};

type Log = Arc<Mutex<Vec<(String, Vec<String>)>>>;

/// Decoder with a recording handler for each tag.
fn recording_decoder(tags: &[&str]) -> (Decoder, Log) {
    let log = Log::default();
    let mut decoder = Decoder::new();
    for tag in tags {
        let sink = log.clone();
        decoder.register_tag(*tag, move |packet: Packet| {
            sink.lock()
                .unwrap()
                .push((packet.tag().to_string(), packet.into_words()));
            Ok(())
        });
    }
    (decoder, log)
}

fn stream(sentences: &[&[&str]]) -> Vec<u8> {
    let mut out = Vec::new();
    for words in sentences {
        out.extend_from_slice(&encode_sentence(*words).unwrap());
    }
    out
}

fn entry(tag: &str, words: &[&str]) -> (String, Vec<String>) {
    (tag.to_string(), words.iter().map(|w| w.to_string()).collect())
}

fn run_chunks(tags: &[&str], chunks: &[&[u8]]) -> Vec<(String, Vec<String>)> {
    let (mut decoder, log) = recording_decoder(tags);
    for chunk in chunks {
        decoder.feed(chunk).unwrap();
    }
    let result = log.lock().unwrap().clone();
    result
}

/// Example from the protocol description: two sentences in two fragments.
#[test]
fn test_two_fragment_example() {
    let bytes = stream(&[&[".tag=1", "!re", "=name=alice"], &[".tag=1", "!done"]]);
    let expected = vec![entry("1", &["!re", "=name=alice"]), entry("1", &["!done"])];

    for split in [1, 7, bytes.len() / 2, bytes.len() - 1] {
        let got = run_chunks(&["1"], &[&bytes[..split], &bytes[split..]]);
        assert_eq!(got, expected, "split at {}", split);
    }
}

/// Every split point yields the same dispatches as a single chunk.
#[test]
fn test_split_at_every_boundary() {
    let long_value = format!("=comment={}", "z".repeat(300));
    let bytes = stream(&[
        &["!re", "=name=ether1", ".tag=a"],
        &["!re", long_value.as_str(), ".tag=b"],
        &["!re", "=name=ether2", ".tag=a"],
        &["!trap", "=message=no such item", ".tag=b"],
        &["!done", ".tag=a"],
        &["!empty", ".tag=c"],
        &["!done", ".tag=b"],
    ]);
    let tags = ["a", "b", "c"];

    let whole = run_chunks(&tags, &[&bytes]);
    assert_eq!(whole.len(), 7);

    for split in 1..bytes.len() {
        let got = run_chunks(&tags, &[&bytes[..split], &bytes[split..]]);
        assert_eq!(got, whole, "split at {}", split);
    }

    let bytewise: Vec<&[u8]> = bytes.chunks(1).collect();
    assert_eq!(run_chunks(&tags, &bytewise), whole);
}

/// Interleaved tags keep their words apart.
#[test]
fn test_interleaved_tags_never_mix() {
    let bytes = stream(&[
        &[".tag=1", "!re", "=owner=one"],
        &[".tag=2", "!re", "=owner=two"],
        &[".tag=1", "!re", "=owner=one"],
        &[".tag=2", "!done"],
        &[".tag=1", "!done"],
    ]);

    let got = run_chunks(&["1", "2"], &[&bytes]);

    for (tag, words) in &got {
        for word in words.iter().filter(|w| w.starts_with("=owner=")) {
            let expected = if tag == "1" { "=owner=one" } else { "=owner=two" };
            assert_eq!(word, expected);
        }
    }
    assert_eq!(got.iter().filter(|(t, _)| t == "1").count(), 3);
    assert_eq!(got.iter().filter(|(t, _)| t == "2").count(), 2);
}

/// `!empty` on a registered tag arrives as a single `!done` packet.
#[test]
fn test_empty_dispatches_done() {
    let bytes = stream(&[&[".tag=7", "!empty"]]);
    let got = run_chunks(&["7"], &[&bytes]);
    assert_eq!(got, vec![entry("7", &["!done"])]);
}

/// `!fatal` ending a chunk raises the signal once and dispatches nothing.
#[test]
fn test_fatal_signal() {
    let (mut decoder, log) = recording_decoder(&["1"]);
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    decoder.on_fatal(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    decoder.feed(&stream(&[&["!fatal"]])).unwrap();

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(log.lock().unwrap().is_empty());
}

/// A packet for an unregistered tag is dropped without affecting others.
#[test]
fn test_unregistered_tag_is_harmless() {
    let first = stream(&[&[".tag=ghost", "!re", "=x=1"], &[".tag=ok", "!done"]]);
    let second = stream(&[&[".tag=ghost", "!done"], &[".tag=ok", "!re", "=y=2"]]);

    let got = run_chunks(&["ok"], &[&first, &second]);

    assert_eq!(
        got,
        vec![entry("ok", &["!done"]), entry("ok", &["!re", "=y=2"])]
    );
}

/// Words of every descriptor class survive framing.
#[test]
fn test_large_words_across_descriptor_classes() {
    let sizes = [0x7F, 0x80, 0x3FFF, 0x4000, 0x20_0000];
    let words: Vec<String> = sizes.iter().map(|&n| "w".repeat(n)).collect();

    let mut sentence = vec!["!re".to_string()];
    sentence.extend(words.iter().cloned());
    sentence.push(".tag=big".to_string());
    let bytes = encode_sentence(&sentence).unwrap();

    let chunks: Vec<&[u8]> = bytes.chunks(4096).collect();
    let got = run_chunks(&["big"], &chunks);

    assert_eq!(got.len(), 1);
    assert_eq!(got[0].1[0], "!re");
    assert_eq!(&got[0].1[1..], &words[..]);
}

/// Length codec roundtrip across the descriptor classes.
#[test]
fn test_length_codec_roundtrip() {
    for (n, width) in [(0u32, 1), (1, 1), (200, 2), (70_000, 3), (3_000_000, 4), (0x8000_0000, 5)] {
        let descriptor = decode_length(&encode_length(n)).unwrap();
        assert_eq!((descriptor.width, descriptor.length), (width, n));
    }
}
