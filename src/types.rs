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

//! Colors, piece kinds and pieces.

use std::fmt;
use std::ops;

use crate::square::Square;

/// `White` or `Black`.
///
/// `White` is the discriminant 0 so that the low bit of a position index is
/// the side to move.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub fn from_name(name: &str) -> Option<Color> {
        match name {
            "white" => Some(Color::White),
            "black" => Some(Color::Black),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        self.fold("white", "black")
    }

    #[inline]
    pub fn from_white(white: bool) -> Color {
        if white {
            Color::White
        } else {
            Color::Black
        }
    }

    #[inline]
    pub fn fold<T>(self, white: T, black: T) -> T {
        match self {
            Color::White => white,
            Color::Black => black,
        }
    }

    #[inline]
    pub fn is_white(self) -> bool {
        self == Color::White
    }

    /// The rank a pawn of this color starts on.
    #[inline]
    pub fn home_rank(self) -> u8 {
        self.fold(1, 6)
    }

    /// The rank a pawn of this color promotes on.
    #[inline]
    pub fn promotion_rank(self) -> u8 {
        self.fold(7, 0)
    }

    /// The rank a pawn of this color stands on immediately after advancing
    /// two squares.
    #[inline]
    pub fn double_advance_rank(self) -> u8 {
        self.fold(3, 4)
    }

    /// Index offset of a single pawn advance.
    #[inline]
    pub fn forward(self) -> i8 {
        self.fold(8, -8)
    }

    pub const ALL: [Color; 2] = [Color::White, Color::Black];
}

impl ops::Not for Color {
    type Output = Color;

    #[inline]
    fn not(self) -> Color {
        self.fold(Color::Black, Color::White)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Piece kinds.
///
/// `PawnEP` is a pawn that just advanced two squares and can be captured en
/// passant. It moves like a pawn but is encoded separately because the set of
/// positions it can have come from differs.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum Kind {
    King = 0,
    Queen = 1,
    Rook = 2,
    Bishop = 3,
    Knight = 4,
    Pawn = 5,
    PawnEP = 6,
}

impl Kind {
    pub fn from_name(name: &str) -> Option<Kind> {
        match name {
            "king" => Some(Kind::King),
            "queen" => Some(Kind::Queen),
            "rook" => Some(Kind::Rook),
            "bishop" => Some(Kind::Bishop),
            "knight" => Some(Kind::Knight),
            "pawn" => Some(Kind::Pawn),
            "pawn-ep" => Some(Kind::PawnEP),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::King => "king",
            Kind::Queen => "queen",
            Kind::Rook => "rook",
            Kind::Bishop => "bishop",
            Kind::Knight => "knight",
            Kind::Pawn => "pawn",
            Kind::PawnEP => "pawn-ep",
        }
    }

    pub fn char(self) -> char {
        match self {
            Kind::King => 'k',
            Kind::Queen => 'q',
            Kind::Rook => 'r',
            Kind::Bishop => 'b',
            Kind::Knight => 'n',
            Kind::Pawn => 'p',
            Kind::PawnEP => 'e',
        }
    }

    pub fn from_index(index: u8) -> Option<Kind> {
        Some(match index {
            0 => Kind::King,
            1 => Kind::Queen,
            2 => Kind::Rook,
            3 => Kind::Bishop,
            4 => Kind::Knight,
            5 => Kind::Pawn,
            6 => Kind::PawnEP,
            _ => return None,
        })
    }

    #[inline]
    pub fn of(self, color: Color) -> Piece {
        Piece { color, kind: self }
    }

    /// Whether this kind is a pawn for the purposes of movement and the
    /// rank restrictions of the data model.
    #[inline]
    pub fn is_pawn(self) -> bool {
        matches!(self, Kind::Pawn | Kind::PawnEP)
    }

    pub const ALL: [Kind; 7] = [
        Kind::King,
        Kind::Queen,
        Kind::Rook,
        Kind::Bishop,
        Kind::Knight,
        Kind::Pawn,
        Kind::PawnEP,
    ];

    /// The kinds a pawn may promote to.
    pub const PROMOTIONS: [Kind; 4] = [Kind::Queen, Kind::Rook, Kind::Bishop, Kind::Knight];
}

/// A piece with [`Color`] and [`Kind`].
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: Kind,
}

impl Piece {
    /// The same piece with its en-passant marker dropped, i.e. `PawnEP`
    /// demoted to a plain `Pawn`.
    #[must_use]
    pub fn without_ep(self) -> Piece {
        if self.kind == Kind::PawnEP {
            Kind::Pawn.of(self.color)
        } else {
            self
        }
    }

    /// The same piece in the other color.
    #[must_use]
    pub fn flipped(self) -> Piece {
        self.kind.of(!self.color)
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.kind.name())
    }
}

/// A placement of a piece on a square, used when handing positions across
/// configuration boundaries.
pub type Placement = (Piece, Square);
