//! Star rating codec
//!
//! Listing pages encode the star rating as a CSS class word
//! (`<p class="star-rating Three">`). Decoding is lenient: an unknown
//! word is not an error, it is the unknown rating 0.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rating words in value order; the index is the decoded value.
pub const RATING_WORDS: [&str; 6] = ["Zero", "One", "Two", "Three", "Four", "Five"];

/// Word substituted when a class list carries no rating token.
pub const DEFAULT_RATING_WORD: &str = "Zero";

/// Decoded star rating in `0..=5`. 0 doubles as "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const UNKNOWN: Self = Self(0);
    pub const MAX: u8 = 5;

    /// Decode a rating word. Unrecognized input, including the empty string, yields 0.
    pub fn decode(word: &str) -> Self {
        let word = word.trim();
        RATING_WORDS
            .iter()
            .position(|candidate| *candidate == word)
            .map_or(Self::UNKNOWN, |value| Self(value as u8))
    }

    /// Build from a numeric value, clamping anything above 5 to unknown.
    pub const fn from_value(value: u8) -> Self {
        if value <= Self::MAX { Self(value) } else { Self::UNKNOWN }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub fn word(self) -> &'static str {
        RATING_WORDS[self.0 as usize]
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-function form of [`Rating::decode`] returning the bare integer.
pub fn decode(word: &str) -> u8 {
    Rating::decode(word).value()
}
