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

//! Intra-table retrograde propagation.
//!
//! A sweep visits every pending entry at the current mate distance and
//! updates all positions from which one legal move reaches it. Un-moves are
//! generated by running the move rays from the piece's current square for
//! the side that just moved; there are no captures moving backwards, since
//! pieces do not appear out of thin air, so a scan stops at the first
//! occupied square. Captures and the other configuration-changing moves
//! enter through the futurebase pass instead.

use log::debug;

use crate::codec::{squares_to_index, Index};
use crate::config::Config;
use crate::entry::{Outcome, CONVERSION_HORIZON};
use crate::moves::ep_relevant;
use crate::position::Position;
use crate::rays::RAYS;
use crate::square::Square;
use crate::table::Tablebase;

/// Propagates every pending entry whose mate distance equals `ply`.
/// Returns the number of entries propagated.
pub fn sweep(tb: &mut Tablebase, ply: u8) -> u64 {
    let config = tb.config().clone();
    let mut progressed = 0;

    for index in 0..tb.index_range() {
        if tb.store.needs_propagation(index) && tb.entry(index).mate_ply == ply {
            propagate_index(tb, &config, index, ply);
            progressed += 1;
        }
    }

    debug!("pass {}: {} positions propagated", ply, progressed);
    progressed
}

fn propagate_index(tb: &mut Tablebase, config: &Config, index: Index, ply: u8) {
    let entry = tb.entry(index);
    let outcome = entry.outcome();

    tb.store.mark_propagated(index);

    // Positions past the fifty-move horizon would be drawn before the mate
    // arrives; their predecessors get nothing from them.
    if entry.conv_ply >= CONVERSION_HORIZON {
        return;
    }

    // With an en-passant pawn on the board the previous move can only have
    // been the double advance that created it, and that move enters from
    // another table.
    if config.has_ep() {
        return;
    }

    let pos = match tb.position(index) {
        Some(pos) => pos,
        None => {
            tb.store.violation(index, "pending entry does not decode");
            return;
        }
    };

    let mate = ply.saturating_add(1);
    let conv = entry.conv_ply.saturating_add(1);

    // Moving backwards, so the mover is the side not to move here.
    for slot in 0..config.num_mobiles() {
        let piece = config.mobile(slot);
        if piece.color == pos.turn {
            continue;
        }
        let from = pos.squares[slot];

        if piece.kind.is_pawn() {
            for step in RAYS.retreat(piece.color, from) {
                if step.hits(pos.occupied) {
                    break;
                }
                let pred_sq = step.square().expect("unblocked step is not the sentinel");
                let double = (i16::from(from.index()) - i16::from(pred_sq.index())).abs() == 16;
                if double && ep_relevant(config, &pos, piece.color, from) {
                    // The double advance would have left the pawn
                    // capturable en passant; that edge belongs to the
                    // en-passant table, not this one.
                    continue;
                }
                fold_predecessor(tb, &pos, outcome, slot, pred_sq, mate, conv);
            }
        } else {
            for ray in RAYS.piece(piece.kind, from) {
                for step in ray {
                    if step.hits(pos.occupied) {
                        break;
                    }
                    let pred_sq = step.square().expect("unblocked step is not the sentinel");
                    fold_predecessor(tb, &pos, outcome, slot, pred_sq, mate, conv);
                }
            }
        }
    }
}

fn fold_predecessor(
    tb: &mut Tablebase,
    pos: &Position,
    outcome: Outcome,
    slot: usize,
    pred_sq: Square,
    mate: u8,
    conv: u8,
) {
    let mut squares = pos.squares.clone();
    squares[slot] = pred_sq;
    let pred = squares_to_index(!pos.turn, &squares);

    match outcome {
        // The player to move wins here, so the move into this position was
        // a losing one for the mover.
        Outcome::PtmWins { .. } => tb.store.add_one_to_wins(pos.turn, pred, mate, conv),
        // The player to move loses here, so the mover wins by moving in.
        Outcome::PntmWins { .. } => tb.store.wins(!pos.turn, pred, mate, conv),
        _ => tb.store.violation(pred, "propagating an entry that is not a win"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::squares_to_index;
    use crate::types::Color;

    #[test]
    fn test_mate_propagates_to_predecessor() {
        let config: Config = "KQvK".parse().unwrap();
        let mut tb = Tablebase::allocate(config).unwrap();
        tb.initialize();

        // Kb6, Qb7 mates Ka8. One predecessor: the queen came from b8
        // is impossible (occupied? no...), consider the queen arriving on
        // b7 from e.g. b8 or h7 etc. Take Qh7-b7 along the rank? h7 to b7
        // passes g7..c7, all empty, so Qh7 is a predecessor.
        let mated = squares_to_index(Color::Black, &[Square::B6, Square::B7, Square::A8]);
        assert_eq!(tb.entry(mated).mate_ply, 0);

        let progressed = sweep(&mut tb, 0);
        assert!(progressed > 0);

        let pred = squares_to_index(Color::White, &[Square::B6, Square::H7, Square::A8]);
        assert_eq!(
            tb.entry(pred).outcome(),
            Outcome::PtmWins { done: false }
        );
        assert_eq!(tb.entry(pred).mate_ply, 1);

        // The mated entry is settled.
        assert_eq!(
            tb.entry(mated).outcome(),
            Outcome::PntmWins { done: true }
        );
    }

    #[test]
    fn test_unmove_scan_stops_at_blocker() {
        let config: Config = "KQvK".parse().unwrap();
        let mut tb = Tablebase::allocate(config).unwrap();
        tb.initialize();
        sweep(&mut tb, 0);

        // In the Kb6/Qb7/Ka8 mate the queen cannot have come from below
        // b6: the backward scan down the b-file stops at the white king.
        // With no other mate in one available there, the position stays a
        // plain count after the first pass.
        let blocked = squares_to_index(Color::White, &[Square::B6, Square::B4, Square::A8]);
        assert!(matches!(tb.entry(blocked).outcome(), Outcome::Counting(_)));
    }
}
