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

//! Board positions of a configuration and their legality.

use arrayvec::ArrayVec;

use crate::bitboard::Bitboard;
use crate::config::Config;
use crate::rays::RAYS;
use crate::square::Square;
use crate::types::{Color, Kind, Piece, Placement};

/// Upper bound on pieces on the board, mobile and frozen together.
pub const MAX_PIECES: usize = 32;

/// A single position of a configuration: the side to move and one square
/// per mobile piece, with derived occupancy masks (frozen pieces included).
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Position {
    pub turn: Color,
    pub squares: ArrayVec<Square, { crate::config::MAX_MOBILES }>,
    pub occupied: Bitboard,
    pub white: Bitboard,
    pub black: Bitboard,
}

impl Position {
    /// Assembles a position from mobile piece squares. The squares are
    /// trusted to be collision free; the codec is responsible for rejecting
    /// indices that fold two pieces onto one square.
    pub fn new(config: &Config, turn: Color, squares: &[Square]) -> Position {
        debug_assert_eq!(squares.len(), config.num_mobiles());

        let mut occupied = config.frozen_mask();
        let mut white = Bitboard::EMPTY;
        let mut black = Bitboard::EMPTY;
        for f in config.frozen() {
            match f.piece.color {
                Color::White => white.add(f.square),
                Color::Black => black.add(f.square),
            }
        }

        for (slot, &sq) in squares.iter().enumerate() {
            occupied.add(sq);
            match config.mobile(slot).color {
                Color::White => white.add(sq),
                Color::Black => black.add(sq),
            }
        }

        Position {
            turn,
            squares: squares.iter().copied().collect(),
            occupied,
            white,
            black,
        }
    }

    #[inline]
    pub fn by_color(&self, color: Color) -> Bitboard {
        color.fold(self.white, self.black)
    }

    /// Every piece on the board with its square, mobile pieces first.
    pub fn placements(&self, config: &Config) -> ArrayVec<Placement, MAX_PIECES> {
        let mut placements = ArrayVec::new();
        for (slot, &sq) in self.squares.iter().enumerate() {
            placements.push((config.mobile(slot), sq));
        }
        for f in config.frozen() {
            placements.push((f.piece, f.square));
        }
        placements
    }

    /// The square of the king of `color`, mobile or frozen.
    pub fn king_square(&self, config: &Config, color: Color) -> Square {
        match config.king_slot(color) {
            Some(slot) => self.squares[slot],
            None => config
                .frozen_king_square(color)
                .expect("configuration has one king per color"),
        }
    }

    /// Whether the king of `color` is attacked.
    pub fn in_check(&self, config: &Config, color: Color) -> bool {
        let king = self.king_square(config, color);
        let placements = self.placements(config);
        square_attacked(king, !color, &placements, self.occupied)
    }

    /// Tests the legality invariants beyond square collisions: pawns stay
    /// off the first and last ranks, the side not to move is not in check,
    /// and an en-passant pawn sits on its double-advance rank with the
    /// capturing side to move and the two squares behind it empty.
    pub fn is_legal(&self, config: &Config) -> bool {
        for (slot, &sq) in self.squares.iter().enumerate() {
            let piece = config.mobile(slot);
            if piece.kind.is_pawn() && (sq.rank() == 0 || sq.rank() == 7) {
                return false;
            }
            if piece.kind == Kind::PawnEP {
                if sq.rank() != piece.color.double_advance_rank() {
                    return false;
                }
                if self.turn == piece.color {
                    return false;
                }
                let transit = sq.offset(-piece.color.forward());
                let origin = transit.and_then(|t| t.offset(-piece.color.forward()));
                match (transit, origin) {
                    (Some(t), Some(o)) => {
                        if self.occupied.contains(t) || self.occupied.contains(o) {
                            return false;
                        }
                    }
                    _ => return false,
                }
            }
        }

        !self.in_check(config, !self.turn)
    }
}

/// Whether `target` is attacked by a piece of color `by`, scanning the move
/// rays of every piece of that color against `occupied`.
pub fn square_attacked(
    target: Square,
    by: Color,
    placements: &[Placement],
    occupied: Bitboard,
) -> bool {
    for &(piece, sq) in placements {
        if piece.color != by || sq == target {
            continue;
        }
        if attacks_from(piece, sq, target, occupied) {
            return true;
        }
    }
    false
}

/// Whether `piece` standing on `from` attacks `target`.
fn attacks_from(piece: Piece, from: Square, target: Square, occupied: Bitboard) -> bool {
    if piece.kind.is_pawn() {
        // Only the diagonal rays of a pawn attack anything; an en-passant
        // pawn attacks like any other pawn.
        for ray in RAYS.pawn_captures(piece.color, from) {
            if ray[0].square() == Some(target) {
                return true;
            }
        }
        return false;
    }

    for ray in RAYS.piece(piece.kind, from) {
        for step in ray {
            if step.square() == Some(target) {
                return true;
            }
            if step.hits(occupied) {
                break;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kqk() -> Config {
        "KQvK".parse().unwrap()
    }

    #[test]
    fn test_attack_through_blocker() {
        let config = kqk();
        // Queen a1, white king a2 blocks the file towards a8.
        let pos = Position::new(
            &config,
            Color::Black,
            &[Square::A2, Square::A1, Square::A8],
        );
        let placements = pos.placements(&config);
        assert!(!square_attacked(
            Square::A8,
            Color::White,
            &placements,
            pos.occupied
        ));
        assert!(square_attacked(
            Square::B2,
            Color::White,
            &placements,
            pos.occupied
        ));
    }

    #[test]
    fn test_adjacent_kings_illegal() {
        let config: Config = "KvK".parse().unwrap();
        let pos = Position::new(&config, Color::White, &[Square::E4, Square::E5]);
        assert!(!pos.is_legal(&config));
    }

    #[test]
    fn test_side_not_to_move_in_check() {
        let config = kqk();
        // Queen e4 attacks the black king on e8; with white to move the
        // position cannot have arisen legally.
        let white_to_move = Position::new(
            &config,
            Color::White,
            &[Square::E1, Square::E4, Square::E8],
        );
        assert!(!white_to_move.is_legal(&config));

        let black_to_move = Position::new(
            &config,
            Color::Black,
            &[Square::E1, Square::E4, Square::E8],
        );
        assert!(black_to_move.is_legal(&config));
    }

    #[test]
    fn test_pawn_rank_restriction() {
        let config: Config = "KPvK".parse().unwrap();
        let pos = Position::new(&config, Color::White, &[Square::E1, Square::A8, Square::E8]);
        assert!(!pos.is_legal(&config));
    }

    #[test]
    fn test_ep_invariants() {
        let config: Config = "KEvKP".parse().unwrap();
        // White pawn just advanced e2-e4; black pawn on d4 could capture.
        let pos = Position::new(
            &config,
            Color::Black,
            &[Square::E1, Square::E4, Square::G8, Square::D4],
        );
        assert!(pos.is_legal(&config));

        // Wrong side to move.
        let pos = Position::new(
            &config,
            Color::White,
            &[Square::E1, Square::E4, Square::G8, Square::D4],
        );
        assert!(!pos.is_legal(&config));

        // Wrong rank for the en-passant pawn.
        let pos = Position::new(
            &config,
            Color::Black,
            &[Square::E1, Square::E5, Square::G8, Square::D4],
        );
        assert!(!pos.is_legal(&config));
    }
}
