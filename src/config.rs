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

//! Material configurations.
//!
//! A configuration is the ordered list of mobile pieces whose squares are
//! enumerated by the position codec, plus any frozen pieces pinned to fixed
//! squares. Frozen pieces do not take part in the enumeration but block
//! movement, give check and can be captured.

use std::fmt;
use std::str::FromStr;

use arrayvec::ArrayVec;

use crate::bitboard::Bitboard;
use crate::errors::BuildError;
use crate::square::Square;
use crate::types::{Color, Kind, Piece};

/// Maximum number of mobile pieces in a configuration.
pub const MAX_MOBILES: usize = 8;

/// A piece pinned to a fixed square.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Frozen {
    pub piece: Piece,
    pub square: Square,
}

/// A material configuration.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Config {
    mobiles: ArrayVec<Piece, MAX_MOBILES>,
    frozen: Vec<Frozen>,
    frozen_mask: Bitboard,
}

impl Config {
    /// Creates a configuration, checking the structural invariants: between
    /// one and [`MAX_MOBILES`] mobile pieces, exactly one king per color
    /// among mobile and frozen pieces, at most one en-passant pawn (mobile
    /// only), distinct frozen squares, and no frozen pawn on the first or
    /// last rank.
    pub fn new(mobiles: Vec<Piece>, frozen: Vec<Frozen>) -> Result<Config, BuildError> {
        if mobiles.is_empty() || mobiles.len() > MAX_MOBILES {
            return Err(BuildError::config(format!(
                "need 1 to {} mobile pieces, got {}",
                MAX_MOBILES,
                mobiles.len()
            )));
        }
        if mobiles.len() + frozen.len() > 32 {
            return Err(BuildError::config("more than 32 pieces on the board"));
        }

        for &color in &Color::ALL {
            let kings = mobiles
                .iter()
                .filter(|p| p.kind == Kind::King && p.color == color)
                .count()
                + frozen
                    .iter()
                    .filter(|f| f.piece.kind == Kind::King && f.piece.color == color)
                    .count();
            if kings != 1 {
                return Err(BuildError::config(format!("need exactly one {} king", color)));
            }
        }

        let ep_pawns = mobiles.iter().filter(|p| p.kind == Kind::PawnEP).count();
        if ep_pawns > 1 {
            return Err(BuildError::config("more than one en-passant pawn"));
        }
        if frozen.iter().any(|f| f.piece.kind == Kind::PawnEP) {
            return Err(BuildError::config("en-passant pawns cannot be frozen"));
        }

        let mut frozen_mask = Bitboard::EMPTY;
        for f in &frozen {
            if frozen_mask.contains(f.square) {
                return Err(BuildError::config(format!(
                    "two frozen pieces on {}",
                    f.square
                )));
            }
            if f.piece.kind.is_pawn() && (f.square.rank() == 0 || f.square.rank() == 7) {
                return Err(BuildError::config(format!(
                    "frozen pawn on rank {}",
                    f.square.rank() + 1
                )));
            }
            frozen_mask.add(f.square);
        }

        Ok(Config {
            mobiles: mobiles.into_iter().collect(),
            frozen,
            frozen_mask,
        })
    }

    /// Number of mobile pieces.
    #[inline]
    pub fn num_mobiles(&self) -> usize {
        self.mobiles.len()
    }

    #[inline]
    pub fn mobile(&self, slot: usize) -> Piece {
        self.mobiles[slot]
    }

    #[inline]
    pub fn mobiles(&self) -> &[Piece] {
        &self.mobiles
    }

    #[inline]
    pub fn frozen(&self) -> &[Frozen] {
        &self.frozen
    }

    /// Occupancy of the frozen pieces.
    #[inline]
    pub fn frozen_mask(&self) -> Bitboard {
        self.frozen_mask
    }

    /// The slot of the en-passant pawn, if the configuration has one.
    pub fn ep_slot(&self) -> Option<usize> {
        self.mobiles.iter().position(|p| p.kind == Kind::PawnEP)
    }

    pub fn has_ep(&self) -> bool {
        self.ep_slot().is_some()
    }

    /// The mobile slot of the king of `color`, or `None` if that king is
    /// frozen.
    pub fn king_slot(&self, color: Color) -> Option<usize> {
        self.mobiles
            .iter()
            .position(|p| p.kind == Kind::King && p.color == color)
    }

    /// The frozen square of the king of `color`, if it is frozen.
    pub fn frozen_king_square(&self, color: Color) -> Option<Square> {
        self.frozen
            .iter()
            .find(|f| f.piece.kind == Kind::King && f.piece.color == color)
            .map(|f| f.square)
    }

    /// Whether `other` is this configuration with the colors of all pieces
    /// swapped and the frozen squares mirrored vertically. This is the shape
    /// a `colors="invert"` futurebase must have.
    pub fn is_color_swap_of(&self, other: &Config) -> bool {
        if self.mobiles.len() != other.mobiles.len() || self.frozen.len() != other.frozen.len() {
            return false;
        }

        let mut counts = [[0i32; 7]; 2];
        for p in &self.mobiles {
            counts[p.color as usize][p.kind as usize] += 1;
        }
        for p in &other.mobiles {
            counts[!p.color as usize][p.kind as usize] -= 1;
        }
        if counts.iter().flatten().any(|&c| c != 0) {
            return false;
        }

        self.frozen.iter().all(|f| {
            other.frozen.contains(&Frozen {
                piece: f.piece.flipped(),
                square: f.square.flip_vertical(),
            })
        })
    }
}

impl fmt::Display for Config {
    /// Material notation like `KQvK`, mobile pieces only, en-passant pawns
    /// as `E`. Frozen pieces are appended like `+Pe3`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &color in &Color::ALL {
            if color == Color::Black {
                f.write_str("v")?;
            }
            for kind in Kind::ALL {
                for p in self.mobiles.iter().filter(|p| p.color == color && p.kind == kind) {
                    write!(f, "{}", p.kind.char().to_ascii_uppercase())?;
                }
            }
        }
        for frozen in &self.frozen {
            write!(
                f,
                "+{}{}",
                frozen.piece.kind.char().to_ascii_uppercase(),
                frozen.square
            )?;
        }
        Ok(())
    }
}

/// Error when parsing an invalid material notation.
#[derive(Clone, Debug)]
pub struct ParseConfigError;

impl fmt::Display for ParseConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid material notation")
    }
}

impl std::error::Error for ParseConfigError {}

impl FromStr for Config {
    type Err = ParseConfigError;

    /// Parses mobile-only material notation like `KQvK`: white pieces, a
    /// `v`, black pieces, in the declared slot order.
    fn from_str(s: &str) -> Result<Config, ParseConfigError> {
        let mut parts = s.splitn(2, 'v');
        let white = parts.next().ok_or(ParseConfigError)?;
        let black = parts.next().ok_or(ParseConfigError)?;

        let mut mobiles = Vec::new();
        for (text, color) in [(white, Color::White), (black, Color::Black)] {
            for ch in text.chars() {
                let kind = match ch.to_ascii_lowercase() {
                    'k' => Kind::King,
                    'q' => Kind::Queen,
                    'r' => Kind::Rook,
                    'b' => Kind::Bishop,
                    'n' => Kind::Knight,
                    'p' => Kind::Pawn,
                    'e' => Kind::PawnEP,
                    _ => return Err(ParseConfigError),
                };
                mobiles.push(kind.of(color));
            }
        }

        Config::new(mobiles, Vec::new()).map_err(|_| ParseConfigError)
    }
}
