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

//! Forward move enumeration.
//!
//! Moves are fully legal: a move that would leave the mover's own king
//! attacked is not generated and not counted. Every generated move either
//! stays within the configuration (an intra-table move) or leaves it (a
//! futuremove: captures, promotions, en-passant events and moves of frozen
//! pieces), and the classification here is what the futurebase pass
//! accounts against.

use arrayvec::ArrayVec;

use crate::config::Config;
use crate::position::{square_attacked, Position, MAX_PIECES};
use crate::rays::RAYS;
use crate::square::Square;
use crate::types::{Color, Kind, Piece, Placement};

/// A captured piece: a mobile slot or a frozen index.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Target {
    Mobile(usize),
    Frozen(usize),
}

/// The moving piece: a mobile slot or a frozen index.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Mover {
    Mobile(usize),
    Frozen(usize),
}

/// What a move does beyond relocating the mover.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Fate {
    /// Plain relocation.
    Stay,
    /// Capture of a piece on the destination square.
    Capture(Target),
    /// Pawn advance onto the promotion rank.
    Promote(Kind),
    /// Pawn capture onto the promotion rank.
    CapturePromote(Target, Kind),
    /// Pawn double advance that leaves the pawn capturable en passant
    /// (an enemy pawn stands beside the destination).
    DoubleAdvanceEp,
    /// En-passant capture of the mobile pawn in the given slot.
    EnPassant(usize),
}

/// A legal forward move.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Move {
    pub mover: Mover,
    pub from: Square,
    pub to: Square,
    pub fate: Fate,
    /// Set when the configuration holds an en-passant pawn: any move ends
    /// the en-passant state, so even a plain relocation changes the
    /// configuration.
    pub expires_ep: bool,
}

impl Move {
    /// Whether the resulting position is in the same tablebase.
    pub fn is_intra(&self) -> bool {
        self.fate == Fate::Stay && !self.expires_ep && matches!(self.mover, Mover::Mobile(_))
    }
}

/// Appends every legal move of the side to move to `out`.
pub fn legal_moves(config: &Config, pos: &Position, out: &mut Vec<Move>) {
    let us = pos.turn;
    let expires_ep = config.has_ep();

    let mut push = |out: &mut Vec<Move>, mover, from, to, fate| {
        let mv = Move {
            mover,
            from,
            to,
            fate,
            expires_ep,
        };
        if king_safe_after(config, pos, &mv) {
            out.push(mv);
        }
    };

    for slot in 0..config.num_mobiles() {
        let piece = config.mobile(slot);
        if piece.color != us {
            continue;
        }
        let from = pos.squares[slot];
        piece_moves(config, pos, piece, from, |to, fate| {
            push(out, Mover::Mobile(slot), from, to, fate)
        });
    }

    // Frozen pieces of the side to move enumerate separately; any move of a
    // frozen piece leaves the configuration.
    for (index, frozen) in config.frozen().iter().enumerate() {
        if frozen.piece.color != us {
            continue;
        }
        piece_moves(config, pos, frozen.piece, frozen.square, |to, fate| {
            push(out, Mover::Frozen(index), frozen.square, to, fate)
        });
    }
}

/// Enumerates the pseudo-legal moves of one piece via the ray tables,
/// classifying each destination.
fn piece_moves<F: FnMut(Square, Fate)>(
    config: &Config,
    pos: &Position,
    piece: Piece,
    from: Square,
    mut emit: F,
) {
    let us = piece.color;
    let them = pos.by_color(!us);

    if piece.kind.is_pawn() {
        // Forward advances block on any piece and never capture.
        for step in RAYS.advance(us, from) {
            if step.hits(pos.occupied) {
                break;
            }
            let to = step.square().expect("advance ray ends in sentinel");
            if to.rank() == us.promotion_rank() {
                for promotion in Kind::PROMOTIONS {
                    emit(to, Fate::Promote(promotion));
                }
            } else if (i16::from(to.index()) - i16::from(from.index())).abs() == 16
                && ep_relevant(config, pos, us, to)
            {
                emit(to, Fate::DoubleAdvanceEp);
            } else {
                emit(to, Fate::Stay);
            }
        }

        // Diagonals capture only.
        for ray in RAYS.pawn_captures(us, from) {
            let to = match ray[0].square() {
                Some(to) => to,
                None => continue,
            };
            if them.contains(to) {
                let victim = target_on(config, pos, to);
                if to.rank() == us.promotion_rank() {
                    for promotion in Kind::PROMOTIONS {
                        emit(to, Fate::CapturePromote(victim, promotion));
                    }
                } else {
                    emit(to, Fate::Capture(victim));
                }
            } else if let Some(ep_slot) = config.ep_slot() {
                let ep_pawn = config.mobile(ep_slot);
                if ep_pawn.color != us {
                    let transit = pos.squares[ep_slot]
                        .offset(-ep_pawn.color.forward())
                        .expect("en-passant pawn is on its double-advance rank");
                    if to == transit {
                        emit(to, Fate::EnPassant(ep_slot));
                    }
                }
            }
        }
        return;
    }

    for ray in RAYS.piece(piece.kind, from) {
        for step in ray {
            if !step.hits(pos.occupied) {
                emit(step.square().expect("unblocked step is not the sentinel"), Fate::Stay);
                continue;
            }
            // Blocked: a capture if the blocker is an enemy piece rather
            // than the board edge or one of ours.
            if let Some(to) = step.square() {
                if them.contains(to) {
                    emit(to, Fate::Capture(target_on(config, pos, to)));
                }
            }
            break;
        }
    }
}

/// Whether a pawn of `us` arriving on `to` by a double advance would be
/// capturable en passant, i.e. an enemy pawn stands directly beside `to`.
pub(crate) fn ep_relevant(config: &Config, pos: &Position, us: Color, to: Square) -> bool {
    let enemy_pawns = config
        .mobiles()
        .iter()
        .enumerate()
        .filter(|(_, p)| p.color != us && p.kind.is_pawn())
        .map(|(slot, _)| pos.squares[slot])
        .chain(
            config
                .frozen()
                .iter()
                .filter(|f| f.piece.color != us && f.piece.kind.is_pawn())
                .map(|f| f.square),
        );
    for sq in enemy_pawns {
        if sq.rank() == to.rank() && (i16::from(sq.file()) - i16::from(to.file())).abs() == 1 {
            return true;
        }
    }
    false
}

fn target_on(config: &Config, pos: &Position, to: Square) -> Target {
    if let Some(slot) = pos.squares.iter().position(|&sq| sq == to) {
        return Target::Mobile(slot);
    }
    let index = config
        .frozen()
        .iter()
        .position(|f| f.square == to)
        .expect("capture destination holds a piece");
    Target::Frozen(index)
}

/// The square a capture removes a piece from. Equal to the destination
/// except for en-passant captures.
fn victim_square(pos: &Position, mv: &Move) -> Option<Square> {
    match mv.fate {
        Fate::Capture(_) | Fate::CapturePromote(..) => Some(mv.to),
        Fate::EnPassant(slot) => Some(pos.squares[slot]),
        _ => None,
    }
}

fn king_safe_after(config: &Config, pos: &Position, mv: &Move) -> bool {
    let us = pos.turn;
    let victim = victim_square(pos, mv);

    let mut occupied = pos.occupied.without(mv.from).with(mv.to);
    if let Some(sq) = victim {
        if sq != mv.to {
            occupied.discard(sq);
        }
    }

    let mut placements: ArrayVec<Placement, MAX_PIECES> = ArrayVec::new();
    for (piece, sq) in pos.placements(config) {
        if Some(sq) == victim || sq == mv.from {
            continue;
        }
        placements.push((piece, sq));
    }
    let mover = match mv.mover {
        Mover::Mobile(slot) => config.mobile(slot),
        Mover::Frozen(index) => config.frozen()[index].piece,
    };
    placements.push((mover, mv.to));

    let king = if mover.kind == Kind::King {
        mv.to
    } else {
        // The king may sit on the moved-from square only if the mover is
        // the king itself, handled above.
        pos.king_square(config, us)
    };

    !square_attacked(king, !us, &placements, occupied)
}

/// The piece placements and side to move after `mv`, with configuration
/// transitions applied: the victim is removed, promotions change the
/// mover's kind, a double advance beside an enemy pawn marks the mover
/// en-passant capturable, and any previous en-passant marker expires.
pub fn successor(
    config: &Config,
    pos: &Position,
    mv: &Move,
) -> (ArrayVec<Placement, MAX_PIECES>, Color) {
    let victim = victim_square(pos, mv);

    let mut placements: ArrayVec<Placement, MAX_PIECES> = ArrayVec::new();
    for (piece, sq) in pos.placements(config) {
        if Some(sq) == victim || sq == mv.from {
            continue;
        }
        placements.push((piece.without_ep(), sq));
    }

    let mover = match mv.mover {
        Mover::Mobile(slot) => config.mobile(slot),
        Mover::Frozen(index) => config.frozen()[index].piece,
    }
    .without_ep();
    let mover = match mv.fate {
        Fate::Promote(kind) | Fate::CapturePromote(_, kind) => kind.of(mover.color),
        Fate::DoubleAdvanceEp => Kind::PawnEP.of(mover.color),
        _ => mover,
    };
    placements.push((mover, mv.to));

    (placements, !pos.turn)
}
