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

//! The bijective position/index encoding.
//!
//! An index packs the side to move into bit 0 and six bits per mobile piece
//! square above it, in declared slot order. The packing is injective but not
//! surjective onto legal positions: indices that fold two pieces onto one
//! square (or onto a frozen square) are rejected here, and the deeper
//! legality conditions are left to the initializer.

use crate::config::Config;
use crate::position::Position;
use crate::square::Square;
use crate::types::Color;

/// Index into the entry store.
pub type Index = u64;

/// The exclusive upper bound of the index range: `2 * 64^k` for `k` mobile
/// pieces.
pub fn index_range(config: &Config) -> Index {
    2 << (6 * config.num_mobiles() as u64)
}

/// Packs a position into its index.
pub fn position_to_index(config: &Config, pos: &Position) -> Index {
    debug_assert_eq!(pos.squares.len(), config.num_mobiles());

    let mut index = pos.turn as Index;
    let mut shift = 1;
    for &sq in &pos.squares {
        index |= Index::from(sq.index()) << shift;
        shift += 6;
    }
    index
}

/// Packs a side to move and squares in slot order, without building a
/// `Position` first.
pub fn squares_to_index(turn: Color, squares: &[Square]) -> Index {
    let mut index = turn as Index;
    let mut shift = 1;
    for &sq in squares {
        index |= Index::from(sq.index()) << shift;
        shift += 6;
    }
    index
}

/// Unpacks an index, or `None` when two decoded squares collide with each
/// other or with a frozen piece.
pub fn index_to_position(config: &Config, index: Index) -> Option<Position> {
    let mut occupied = config.frozen_mask();
    let turn = if index & 1 == 0 {
        Color::White
    } else {
        Color::Black
    };

    let mut squares = [Square::A1; crate::config::MAX_MOBILES];
    let mut rest = index >> 1;
    for slot in 0..config.num_mobiles() {
        let sq = Square::new((rest & 63) as u32);
        if occupied.contains(sq) {
            return None;
        }
        occupied.add(sq);
        squares[slot] = sq;
        rest >>= 6;
    }

    Some(Position::new(config, turn, &squares[..config.num_mobiles()]))
}
