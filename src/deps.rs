// This file is part of the retrograde library.
// Copyright (C) 2026 The retrograde developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

//! Futurebase dependency enumeration.
//!
//! Given a target material, lists every futurebase a build transitively
//! requires: all single-piece removals, and for each pawn all promotions,
//! each optionally combined with the capture of a single non-pawn enemy
//! piece. Filenames are `k<whitepieces>k<blackpieces>` with piece letters
//! drawn from `q r b n p` in that canonical order, and each material is
//! color-normalized so that the stronger side is written first.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use itertools::iproduct;

use crate::config::Config;
use crate::types::{Color, Kind};

const LETTERS: [char; 5] = ['q', 'r', 'b', 'n', 'p'];

/// Piece values in tenths of a pawn... of a tenth-scaled scale: Q=9, R=5,
/// B=3.1, N=3, P=1. The 0.1 bishop boost over the knight exists solely so
/// that a bishop-vs-knight material prefers to be stored bishop first.
const VALUES: [u32; 5] = [90, 50, 31, 30, 10];

/// Non-king piece counts of one side, indexed in canonical letter order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct SideCounts(pub [u8; 5]);

impl SideCounts {
    fn count(self) -> u32 {
        self.0.iter().map(|&c| u32::from(c)).sum()
    }

    fn value(self) -> u32 {
        self.0
            .iter()
            .zip(VALUES.iter())
            .map(|(&c, &v)| u32::from(c) * v)
            .sum()
    }

    fn strength(self) -> (u32, u32) {
        (self.count(), self.value())
    }

    fn without(mut self, letter: usize) -> SideCounts {
        self.0[letter] -= 1;
        self
    }

    fn with(mut self, letter: usize) -> SideCounts {
        self.0[letter] += 1;
        self
    }

    fn letters(self) -> String {
        let mut s = String::new();
        for (letter, &count) in LETTERS.iter().zip(self.0.iter()) {
            for _ in 0..count {
                s.push(*letter);
            }
        }
        s
    }
}

/// A color-normalized material, named like `kqkr`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct MatKey {
    pub white: SideCounts,
    pub black: SideCounts,
}

impl MatKey {
    pub fn new(white: SideCounts, black: SideCounts) -> MatKey {
        MatKey { white, black }
    }

    /// The material of a configuration, counting mobile and frozen pieces
    /// alike; an en-passant pawn counts as a pawn.
    pub fn from_config(config: &Config) -> MatKey {
        let mut counts = [SideCounts::default(); 2];
        let pieces = config
            .mobiles()
            .iter()
            .copied()
            .chain(config.frozen().iter().map(|f| f.piece));
        for piece in pieces {
            let letter = match piece.kind {
                Kind::King => continue,
                Kind::Queen => 0,
                Kind::Rook => 1,
                Kind::Bishop => 2,
                Kind::Knight => 3,
                Kind::Pawn | Kind::PawnEP => 4,
            };
            counts[piece.color as usize] = counts[piece.color as usize].with(letter);
        }
        MatKey::new(counts[Color::White as usize], counts[Color::Black as usize]).normalized()
    }

    /// Writes the side with more pieces first, breaking ties by the greater
    /// value sum.
    #[must_use]
    pub fn normalized(self) -> MatKey {
        if self.black.strength() > self.white.strength() {
            MatKey {
                white: self.black,
                black: self.white,
            }
        } else {
            self
        }
    }

    /// The direct dependencies: every single-piece removal, and every pawn
    /// promotion optionally combined with the capture of a single non-pawn
    /// piece of the other side.
    pub fn dependencies(self) -> BTreeSet<MatKey> {
        let mut deps = BTreeSet::new();

        for side in 0..2 {
            let (own, other) = if side == 0 {
                (self.white, self.black)
            } else {
                (self.black, self.white)
            };
            let rebuild = |own: SideCounts, other: SideCounts| {
                if side == 0 {
                    MatKey::new(own, other).normalized()
                } else {
                    MatKey::new(other, own).normalized()
                }
            };

            for letter in 0..LETTERS.len() {
                if own.0[letter] > 0 {
                    deps.insert(rebuild(own.without(letter), other));
                }
            }

            if own.0[4] > 0 {
                // Promotion letters are q r b n, optionally combined with
                // the capture of any single non-pawn piece.
                let remaining = own.without(4);
                for promotion in 0..4 {
                    deps.insert(rebuild(remaining.with(promotion), other));
                }
                for (promotion, victim) in iproduct!(0..4, 0..4) {
                    if other.0[victim] > 0 {
                        deps.insert(rebuild(remaining.with(promotion), other.without(victim)));
                    }
                }
            }
        }

        deps
    }

    /// The transitive closure of [`MatKey::dependencies`], not including
    /// the target itself.
    pub fn closure(self) -> BTreeSet<MatKey> {
        let mut seen = BTreeSet::new();
        let mut work: Vec<MatKey> = self.normalized().dependencies().into_iter().collect();
        while let Some(key) = work.pop() {
            if seen.insert(key) {
                work.extend(key.dependencies());
            }
        }
        seen
    }
}

impl fmt::Display for MatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k{}k{}", self.white.letters(), self.black.letters())
    }
}

/// Error when parsing an invalid material name.
#[derive(Clone, Debug)]
pub struct ParseMatKeyError;

impl fmt::Display for ParseMatKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid material name")
    }
}

impl std::error::Error for ParseMatKeyError {}

impl FromStr for MatKey {
    type Err = ParseMatKeyError;

    /// Parses a filename-style material like `kqkr`.
    fn from_str(s: &str) -> Result<MatKey, ParseMatKeyError> {
        let rest = s.strip_prefix('k').ok_or(ParseMatKeyError)?;
        let split = rest.find('k').ok_or(ParseMatKeyError)?;
        let (white, black) = rest.split_at(split);
        let black = &black[1..];

        let mut key = MatKey::new(SideCounts::default(), SideCounts::default());
        for (text, side) in [(white, &mut key.white), (black, &mut key.black)] {
            for ch in text.chars() {
                let letter = LETTERS
                    .iter()
                    .position(|&l| l == ch)
                    .ok_or(ParseMatKeyError)?;
                *side = side.with(letter);
            }
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> MatKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_filename_roundtrip() {
        for name in ["kk", "kqk", "kqkr", "kppkn"] {
            assert_eq!(key(name).to_string(), name);
        }
    }

    #[test]
    fn test_normalization_prefers_stronger_side() {
        assert_eq!(key("kkq").normalized().to_string(), "kqk");
        assert_eq!(key("krkq").normalized().to_string(), "kqkr");
    }

    #[test]
    fn test_bishop_beats_knight_in_tiebreak() {
        // Equal counts; the 0.1 bishop boost keeps the bishop side first.
        assert_eq!(key("knkb").normalized().to_string(), "kbkn");
        assert_eq!(key("kbkn").normalized().to_string(), "kbkn");
    }

    #[test]
    fn test_kqk_dependencies() {
        let deps = key("kqk").dependencies();
        let names: Vec<String> = deps.iter().map(MatKey::to_string).collect();
        assert_eq!(names, vec!["kk"]);
    }

    #[test]
    fn test_kpk_closure_includes_promotions() {
        let names: BTreeSet<String> = key("kpk").closure().iter().map(MatKey::to_string).collect();
        for expected in ["kk", "kqk", "krk", "kbk", "knk"] {
            assert!(names.contains(expected), "missing {}", expected);
        }
        // No capture targets exist, so nothing else shows up.
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn test_promotion_with_capture() {
        let deps = key("kpkr").dependencies();
        let names: BTreeSet<String> = deps.iter().map(MatKey::to_string).collect();
        // Queening while capturing the rook.
        assert!(names.contains("kqk"));
        // Queening without the capture, normalized.
        assert!(names.contains("kqkr"));
        // Plain removals.
        assert!(names.contains("krk"));
        assert!(names.contains("kpk"));
    }

    #[test]
    fn test_from_config() {
        let config: Config = "KQvK".parse().unwrap();
        assert_eq!(MatKey::from_config(&config).to_string(), "kqk");
    }
}
