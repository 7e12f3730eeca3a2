use std::fmt;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

/// 128-bit opaque bearer credential, rendered as 32 lowercase hex characters.
///
/// Built from two independently seeded 64-bit generators rather than one
/// wider one, matching the scheme this crate's token format was modeled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerToken {
    part1: u64,
    part2: u64,
}

impl PlayerToken {
    pub fn generate() -> Self {
        let mut first = StdRng::from_entropy();
        let mut second = StdRng::from_entropy();
        Self {
            part1: first.next_u64(),
            part2: second.next_u64(),
        }
    }

    pub fn from_parts(part1: u64, part2: u64) -> Self {
        Self { part1, part2 }
    }

    /// Parses a 32-character lowercase hex string. Rejects anything else,
    /// including valid hex of the wrong length or with uppercase digits —
    /// the wire format is exact-match, not merely hex-decodable.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
            return None;
        }
        let part1 = u64::from_str_radix(&s[0..16], 16).ok()?;
        let part2 = u64::from_str_radix(&s[16..32], 16).ok()?;
        Some(Self { part1, part2 })
    }
}

impl fmt::Display for PlayerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.part1, self.part2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn round_trips_through_its_string_form() {
        let token = PlayerToken::generate();
        let rendered = token.to_string();
        assert_eq!(rendered.len(), 32);
        assert_eq!(PlayerToken::parse(&rendered), Some(token));
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!(PlayerToken::parse("").is_none());
        assert!(PlayerToken::parse("not-hex-at-all-not-hex-at-all-x").is_none());
        assert!(PlayerToken::parse(&"a".repeat(31)).is_none());
        assert!(PlayerToken::parse(&"A".repeat(32)).is_none());
    }

    #[test]
    fn generated_tokens_do_not_collide_at_scale() {
        let mut seen = HashSet::new();
        for _ in 0..100_000 {
            assert!(seen.insert(PlayerToken::generate()));
        }
    }
}
