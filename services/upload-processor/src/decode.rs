//! Best-effort text decoding.
//!
//! Bytes are decoded by an ordered chain of strategies: the first strategy
//! that produces text wins. Every chain ends with [`BytePreserving`], which
//! accepts any byte sequence, so decoding as a whole cannot fail.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use tracing::trace;

/// Text produced by a decoder together with the encoding that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static str,
}

/// A single way of turning bytes into text
pub trait DecodeStrategy: Send + Sync {
    /// Name of the strategy
    fn name(&self) -> &'static str;

    /// Decode the bytes, or `None` if they are not valid for this strategy
    fn decode(&self, bytes: &[u8]) -> Option<Decoded>;
}

/// Strict decoding with an `encoding_rs` encoding: malformed input is rejected
#[derive(Debug, Clone, Copy)]
pub struct Strict(pub &'static Encoding);

impl DecodeStrategy for Strict {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn decode(&self, bytes: &[u8]) -> Option<Decoded> {
        self.0
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| Decoded {
                text: text.into_owned(),
                encoding: self.0.name(),
            })
    }
}

/// 7-bit ASCII
#[derive(Debug, Clone, Copy)]
pub struct Ascii;

impl DecodeStrategy for Ascii {
    fn name(&self) -> &'static str {
        "US-ASCII"
    }

    fn decode(&self, bytes: &[u8]) -> Option<Decoded> {
        if !bytes.is_ascii() {
            return None;
        }
        std::str::from_utf8(bytes).ok().map(|text| Decoded {
            text: text.to_owned(),
            encoding: self.name(),
        })
    }
}

/// ISO-8859-1: every byte maps to the code point of the same value.
///
/// `encoding_rs` treats the `latin1` label as windows-1252, so this mapping
/// is done directly.
#[derive(Debug, Clone, Copy)]
pub struct BytePreserving;

impl BytePreserving {
    const NAME: &'static str = "ISO-8859-1";

    fn decode_all(bytes: &[u8]) -> Decoded {
        Decoded {
            text: bytes.iter().map(|&b| char::from(b)).collect(),
            encoding: Self::NAME,
        }
    }
}

impl DecodeStrategy for BytePreserving {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn decode(&self, bytes: &[u8]) -> Option<Decoded> {
        Some(Self::decode_all(bytes))
    }
}

/// Decodes with whatever encoding `chardetng` guesses for the input
#[cfg(feature = "detect")]
#[derive(Debug, Clone, Copy)]
pub struct Detected;

#[cfg(feature = "detect")]
impl DecodeStrategy for Detected {
    fn name(&self) -> &'static str {
        "detected"
    }

    fn decode(&self, bytes: &[u8]) -> Option<Decoded> {
        let mut detector = chardetng::EncodingDetector::new();
        detector.feed(bytes, true);
        let encoding = detector.guess(None, true);
        trace!(encoding = encoding.name(), "Encoding guessed");
        Strict(encoding).decode(bytes)
    }
}

/// Ordered chain of decode strategies
pub struct Decoder {
    strategies: Vec<Box<dyn DecodeStrategy>>,
}

impl Decoder {
    /// Candidate chain: UTF-8, Latin-1, Windows-1252, ASCII, then the
    /// byte-preserving fallback
    pub fn candidates() -> Self {
        Self::from_strategies(vec![
            Box::new(Strict(UTF_8)),
            Box::new(BytePreserving),
            Box::new(Strict(WINDOWS_1252)),
            Box::new(Ascii),
        ])
    }

    /// Detection chain: the detector's guess, then the byte-preserving
    /// fallback
    #[cfg(feature = "detect")]
    pub fn detecting() -> Self {
        Self::from_strategies(vec![Box::new(Detected)])
    }

    /// Build a chain from custom strategies. The byte-preserving fallback is
    /// always appended.
    pub fn from_strategies(mut strategies: Vec<Box<dyn DecodeStrategy>>) -> Self {
        strategies.push(Box::new(BytePreserving));
        Self { strategies }
    }

    /// Names of the strategies in the order they are tried
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Decode bytes into text. Never fails.
    ///
    /// A byte order mark decides the encoding and is stripped; otherwise the
    /// strategies are tried in order.
    pub fn decode(&self, bytes: &[u8]) -> Decoded {
        if let Some(decoded) = decode_with_bom(bytes) {
            return decoded;
        }

        self.strategies
            .iter()
            .find_map(|strategy| {
                let decoded = strategy.decode(bytes);
                if decoded.is_none() {
                    trace!(strategy = strategy.name(), "Decode strategy rejected input");
                }
                decoded
            })
            .unwrap_or_else(|| BytePreserving::decode_all(bytes))
    }
}

fn decode_with_bom(bytes: &[u8]) -> Option<Decoded> {
    let (encoding, bom_length) = Encoding::for_bom(bytes)?;
    Strict(encoding).decode(&bytes[bom_length..])
}

impl Default for Decoder {
    #[cfg(feature = "detect")]
    fn default() -> Self {
        Self::detecting()
    }

    #[cfg(not(feature = "detect"))]
    fn default() -> Self {
        Self::candidates()
    }
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}
