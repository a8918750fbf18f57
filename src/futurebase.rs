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

//! Futurebases and back-propagation from them.
//!
//! A futurebase is a finished table for a configuration reachable from the
//! current one by a single configuration-changing move: a capture, a pawn
//! promotion, an en-passant event, or a frozen-piece move. The import pass
//! walks every legal index of the table under construction, resolves each
//! such futuremove against the futurebase set or the pruning declarations,
//! and folds the outcome back through the entry-store mutators.

use std::io::Read;

use fxhash::FxHashMap;
use log::{error, info, warn};

use crate::codec::{squares_to_index, Index};
use crate::config::Config;
use crate::entry::{Entry, Outcome, UNKNOWN_PLY};
use crate::errors::{BuildError, BuildResult};
use crate::format::{read_table, TableFlags};
use crate::moves::{legal_moves, successor, Fate, Move, Mover};
use crate::position::Position;
use crate::square::Square;
use crate::table::Tablebase;
use crate::types::{Color, Kind, Piece, Placement};

/// A pruning declaration from the control file.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Prune {
    /// True for `prune-our-move`, false for `prune-his-move`.
    pub ours: bool,
    pub from: Square,
    pub to: Square,
}

/// The pruning policy of a build: which color the declarations speak for,
/// and the declared moves.
#[derive(Clone, Debug)]
pub struct Pruning {
    pub our_color: Color,
    pub prunes: Vec<Prune>,
}

impl Pruning {
    pub fn none(our_color: Color) -> Pruning {
        Pruning {
            our_color,
            prunes: Vec::new(),
        }
    }

    fn covers(&self, turn: Color, mv: &Move) -> Option<Prune> {
        self.prunes
            .iter()
            .find(|p| {
                p.from == mv.from && p.to == mv.to && (turn == self.our_color) == p.ours
            })
            .copied()
    }
}

/// The outcome of probing a position in a futurebase, in real colors.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Probe {
    Win {
        winner: Color,
        mate_ply: u8,
        conv_ply: u8,
    },
    Draw,
    Illegal,
}

/// A loaded futurebase.
pub struct Futurebase {
    config: Config,
    invert: bool,
    entries: Vec<Entry>,
}

impl std::fmt::Debug for Futurebase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Futurebase")
            .field("config", &self.config)
            .field("invert", &self.invert)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl Futurebase {
    /// Reads a futurebase from a byte stream.
    pub fn from_reader<R: Read>(reader: &mut R, invert: bool) -> BuildResult<Futurebase> {
        let (config, flags, entries) = read_table(reader)?;
        if flags.contains(TableFlags::SUSPECT) {
            warn!("futurebase {} was marked suspect by its build", config);
        }
        Ok(Futurebase {
            config,
            invert,
            entries,
        })
    }

    /// Wraps a table built in the same process.
    pub fn from_table(tb: &Tablebase, invert: bool) -> Futurebase {
        Futurebase {
            config: tb.config().clone(),
            invert,
            entries: tb.store().entries().to_vec(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn invert(&self) -> bool {
        self.invert
    }

    /// The material this futurebase answers for, in real colors.
    fn serves_key(&self) -> String {
        let pieces = self
            .config
            .mobiles()
            .iter()
            .copied()
            .chain(self.config.frozen().iter().map(|f| f.piece));
        if self.invert {
            material_key(pieces.map(Piece::flipped))
        } else {
            material_key(pieces)
        }
    }

    /// Tries to express `placements` with `stm` to move as a position of
    /// this futurebase and reads its entry. Color-inverted probing mirrors
    /// the board vertically and swaps all piece colors and the side to
    /// move, which leaves outcomes invariant under the rules of chess.
    fn probe(&self, placements: &[Placement], stm: Color) -> Option<Probe> {
        let mut pool: Vec<Placement> = if self.invert {
            placements
                .iter()
                .map(|&(piece, sq)| (piece.flipped(), sq.flip_vertical()))
                .collect()
        } else {
            placements.to_vec()
        };
        let stm = if self.invert { !stm } else { stm };

        if pool.len() != self.config.num_mobiles() + self.config.frozen().len() {
            return None;
        }

        for frozen in self.config.frozen() {
            let at = pool
                .iter()
                .position(|&(piece, sq)| piece == frozen.piece && sq == frozen.square)?;
            pool.swap_remove(at);
        }

        let mut squares = Vec::with_capacity(self.config.num_mobiles());
        for slot in 0..self.config.num_mobiles() {
            let wanted = self.config.mobile(slot);
            let at = pool.iter().position(|&(piece, _)| piece == wanted)?;
            squares.push(pool.swap_remove(at).1);
        }

        let index = squares_to_index(stm, &squares);
        let entry = self.entries[index as usize];
        Some(match entry.outcome() {
            Outcome::Illegal => Probe::Illegal,
            // The player to move at the probed position is the same player
            // whether or not the labels were inverted.
            Outcome::PtmWins { .. } => Probe::Win {
                winner: if self.invert { !stm } else { stm },
                mate_ply: entry.mate_ply,
                conv_ply: entry.conv_ply,
            },
            Outcome::PntmWins { .. } => Probe::Win {
                winner: if self.invert { stm } else { !stm },
                mate_ply: entry.mate_ply,
                conv_ply: entry.conv_ply,
            },
            Outcome::Stalemate | Outcome::Counting(_) => Probe::Draw,
        })
    }
}

/// The futurebases of a build, indexed by the material they serve.
#[derive(Debug)]
pub struct FuturebaseSet {
    tables: Vec<Futurebase>,
    by_material: FxHashMap<String, Vec<usize>>,
    uses: Vec<u64>,
}

impl Default for FuturebaseSet {
    fn default() -> FuturebaseSet {
        FuturebaseSet::new()
    }
}

impl FuturebaseSet {
    pub fn new() -> FuturebaseSet {
        FuturebaseSet {
            tables: Vec::new(),
            by_material: FxHashMap::default(),
            uses: Vec::new(),
        }
    }

    pub fn add(&mut self, fb: Futurebase) {
        let key = fb.serves_key();
        info!(
            "futurebase {} serves {}{}",
            fb.config(),
            key,
            if fb.invert() { " (inverted)" } else { "" }
        );
        self.by_material
            .entry(key)
            .or_insert_with(Vec::new)
            .push(self.tables.len());
        self.tables.push(fb);
        self.uses.push(0);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn probe(&mut self, placements: &[Placement], stm: Color) -> Option<Probe> {
        let key = material_key(placements.iter().map(|&(piece, _)| piece));
        let candidates = self.by_material.get(&key)?.clone();
        for at in candidates {
            if let Some(probe) = self.tables[at].probe(placements, stm) {
                self.uses[at] += 1;
                return Some(probe);
            }
        }
        None
    }

    fn warn_unused(&self) {
        for (fb, &uses) in self.tables.iter().zip(&self.uses) {
            if uses == 0 {
                warn!(
                    "futurebase {} was never probed; it does not match any futuremove",
                    fb.config()
                );
            }
        }
    }
}

/// Canonical material notation of a piece multiset, e.g. `KQvK`, with
/// en-passant pawns as `E`.
fn material_key<I: Iterator<Item = Piece>>(pieces: I) -> String {
    let mut counts = [[0u8; 7]; 2];
    for piece in pieces {
        counts[piece.color as usize][piece.kind as usize] += 1;
    }
    let mut key = String::new();
    for &color in &Color::ALL {
        if color == Color::Black {
            key.push('v');
        }
        for kind in Kind::ALL {
            for _ in 0..counts[color as usize][kind as usize] {
                key.push(kind.char().to_ascii_uppercase());
            }
        }
    }
    key
}

fn bump(ply: u8) -> u8 {
    std::cmp::min(ply.saturating_add(1), UNKNOWN_PLY - 1)
}

/// Whether a move resets the fifty-move counter.
fn is_conversion(config: &Config, mv: &Move) -> bool {
    if !matches!(mv.fate, Fate::Stay) {
        return true;
    }
    let mover = match mv.mover {
        Mover::Mobile(slot) => config.mobile(slot),
        Mover::Frozen(index) => config.frozen()[index].piece,
    };
    mover.kind.is_pawn()
}

/// The conversion counter one retrograde half-move before a probed
/// position: a capture or pawn move starts a fresh fifty-move window, any
/// other move carries the probed counter plus one.
fn conv_before(config: &Config, mv: &Move, probe: Probe) -> u8 {
    if is_conversion(config, mv) {
        1
    } else {
        bump(match probe {
            Probe::Win { conv_ply, .. } => conv_ply,
            _ => 0,
        })
    }
}

/// Runs the futurebase pass over every counting index. Returns the sweep
/// horizon: one more than the deepest mate folded in, and at least 1.
pub fn import(
    tb: &mut Tablebase,
    fbs: &mut FuturebaseSet,
    pruning: &Pruning,
) -> BuildResult<u8> {
    let config = tb.config().clone();
    let mut moves = Vec::with_capacity(128);
    let mut max_ply: u8 = 1;
    let mut folded: u64 = 0;

    for index in 0..tb.index_range() {
        if !matches!(tb.entry(index).outcome(), Outcome::Counting(_)) {
            continue;
        }
        let pos = tb
            .position(index)
            .expect("counting entries decode to legal positions");

        moves.clear();
        legal_moves(&config, &pos, &mut moves);

        for mv in &moves {
            if mv.is_intra() {
                continue;
            }

            let (placements, stm) = successor(&config, &pos, mv);
            if let Some(probe) = fbs.probe(&placements, stm) {
                let conv = conv_before(&config, mv, probe);
                fold(tb, index, pos.turn, probe, conv, &mut max_ply, &mut folded);
            } else if let Some(prune) = pruning.covers(pos.turn, mv) {
                if prune.ours {
                    tb.store.prune_one(index);
                } else {
                    let probe = resolve_his_prune(&config, &pos, mv, fbs);
                    let conv = conv_before(&config, mv, probe);
                    fold(tb, index, pos.turn, probe, conv, &mut max_ply, &mut folded);
                }
            } else {
                return Err(BuildError::UnresolvedFuturemove {
                    message: format!(
                        "{} {} to {} at index {} ({} to move) has no futurebase and no pruning",
                        config, mv.from, mv.to, index, pos.turn
                    ),
                });
            }
        }
    }

    fbs.warn_unused();
    info!("futurebase pass folded {} outcomes, horizon {}", folded, max_ply);
    Ok(max_ply)
}

fn fold(
    tb: &mut Tablebase,
    index: Index,
    mover: Color,
    probe: Probe,
    conv: u8,
    max_ply: &mut u8,
    folded: &mut u64,
) {
    match probe {
        Probe::Win {
            winner, mate_ply, ..
        } => {
            let mate = bump(mate_ply);
            if winner == mover {
                tb.store.wins(winner, index, mate, conv);
            } else {
                tb.store.add_one_to_wins(winner, index, mate, conv);
            }
            *max_ply = std::cmp::max(*max_ply, bump(mate));
            *folded += 1;
        }
        Probe::Draw => {}
        Probe::Illegal => {
            tb.store.violation(index, "futurebase reports a legal move reaching an illegal position");
        }
    }
}

/// Resolves an opponent futuremove covered by `prune-his-move`: the
/// position after the move is searched one reply deep against the
/// futurebase set, and the best reply outcome for our side is taken. With
/// no probeable reply the move counts as won for the opponent.
///
/// The returned probe describes the position after the pruned move, in the
/// same convention as a direct futurebase probe of it, so the caller folds
/// it back exactly like any other probed futuremove.
fn resolve_his_prune(
    config: &Config,
    pos: &Position,
    mv: &Move,
    fbs: &mut FuturebaseSet,
) -> Probe {
    let us = !pos.turn;
    let (placements, stm) = successor(config, pos, mv);
    debug_assert_eq!(stm, us);

    let (after_config, after_pos) = match reconstruct(config, &placements, stm) {
        Some(ok) => ok,
        None => {
            // The successor cannot be expressed as a configuration (both
            // kings must survive, so this does not happen for legal moves).
            return Probe::Win {
                winner: pos.turn,
                mate_ply: 1,
                conv_ply: 1,
            };
        }
    };

    let mut replies = Vec::with_capacity(64);
    legal_moves(&after_config, &after_pos, &mut replies);

    if replies.is_empty() {
        return if after_pos.in_check(&after_config, us) {
            // We are mated on the spot.
            Probe::Win {
                winner: pos.turn,
                mate_ply: 0,
                conv_ply: 0,
            }
        } else {
            Probe::Draw
        };
    }

    let mut best: Option<Probe> = None;
    for reply in &replies {
        let (next, next_stm) = successor(&after_config, &after_pos, reply);
        let probe = match fbs.probe(&next, next_stm) {
            Some(probe) => probe,
            None => continue,
        };
        // Express the reply's outcome at the position before it, so that
        // both the mate distance and the conversion counter stay honest.
        let before_reply = match probe {
            Probe::Win {
                winner, mate_ply, ..
            } => Probe::Win {
                winner,
                mate_ply: bump(mate_ply),
                conv_ply: conv_before(&after_config, reply, probe),
            },
            other => other,
        };
        best = Some(match best {
            None => before_reply,
            Some(b) => better_for(us, b, before_reply),
        });
    }

    match best {
        Some(probe) => probe,
        // Assumed lost: no reply reaches any table.
        None => Probe::Win {
            winner: pos.turn,
            mate_ply: 1,
            conv_ply: 1,
        },
    }
}

/// Ranks two probe outcomes from the point of view of `us`.
fn better_for(us: Color, a: Probe, b: Probe) -> Probe {
    let rank = |p: &Probe| match p {
        Probe::Win { winner, mate_ply, .. } if *winner == us => (2, i32::from(*mate_ply)),
        Probe::Draw => (1, 0),
        Probe::Illegal => (1, 0),
        Probe::Win { mate_ply, .. } => (0, -i32::from(*mate_ply)),
    };
    // Higher class wins; within a class prefer the shorter own mate or the
    // longer opposing one.
    let (ca, da) = rank(&a);
    let (cb, db) = rank(&b);
    if (cb, -db) > (ca, -da) {
        b
    } else {
        a
    }
}

/// Rebuilds a configuration and position from flattened placements, keeping
/// pieces frozen if they match a frozen piece of the parent configuration.
fn reconstruct(
    parent: &Config,
    placements: &[Placement],
    stm: Color,
) -> Option<(Config, Position)> {
    let mut frozen = Vec::new();
    let mut mobiles = Vec::new();
    let mut squares = Vec::new();

    for &(piece, sq) in placements {
        let was_frozen = parent
            .frozen()
            .iter()
            .any(|f| f.piece == piece && f.square == sq);
        if was_frozen {
            frozen.push(crate::config::Frozen { piece, square: sq });
        } else {
            mobiles.push(piece);
            squares.push(sq);
        }
    }

    let config = Config::new(mobiles, frozen).ok()?;
    let pos = Position::new(&config, stm, &squares);
    Some((config, pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::squares_to_index;

    fn built_kk() -> Tablebase {
        let config: Config = "KvK".parse().unwrap();
        let mut tb = Tablebase::allocate(config).unwrap();
        tb.initialize();
        tb
    }

    #[test]
    fn test_material_key() {
        let config: Config = "KQvK".parse().unwrap();
        let key = material_key(config.mobiles().iter().copied());
        assert_eq!(key, "KQvK");
    }

    #[test]
    fn test_probe_draw_from_kk() {
        let fb = Futurebase::from_table(&built_kk(), false);
        let placements = [
            (Kind::King.of(Color::White), Square::A1),
            (Kind::King.of(Color::Black), Square::H8),
        ];
        assert_eq!(fb.probe(&placements, Color::White), Some(Probe::Draw));
    }

    #[test]
    fn test_probe_rejects_wrong_material() {
        let fb = Futurebase::from_table(&built_kk(), false);
        let placements = [
            (Kind::King.of(Color::White), Square::A1),
            (Kind::Queen.of(Color::White), Square::B2),
            (Kind::King.of(Color::Black), Square::H8),
        ];
        assert_eq!(fb.probe(&placements, Color::Black), None);
    }

    #[test]
    fn test_inverted_probe_agrees_with_mirror() {
        let config: Config = "KQvK".parse().unwrap();
        let mut tb = Tablebase::allocate(config).unwrap();
        tb.initialize();

        let direct = Futurebase::from_table(&tb, false);
        let inverted = Futurebase::from_table(&tb, true);

        // A black-queen position probed through the inverted table...
        let black_queen = [
            (Kind::King.of(Color::Black), Square::E8),
            (Kind::Queen.of(Color::Black), Square::D8),
            (Kind::King.of(Color::White), Square::E1),
        ];
        // ...equals the mirrored white-queen position probed directly.
        let white_queen = [
            (Kind::King.of(Color::White), Square::E1),
            (Kind::Queen.of(Color::White), Square::D1),
            (Kind::King.of(Color::Black), Square::E8),
        ];

        let via_invert = inverted.probe(&black_queen, Color::White);
        let via_mirror = direct.probe(&white_queen, Color::Black);
        assert!(via_invert.is_some());
        assert_eq!(via_invert, via_mirror);
    }

    #[test]
    fn test_import_kqk_accounts_queen_captures() {
        let config: Config = "KQvK".parse().unwrap();
        let mut tb = Tablebase::allocate(config).unwrap();
        tb.initialize();

        let mut fbs = FuturebaseSet::new();
        fbs.add(Futurebase::from_table(&built_kk(), false));

        let pruning = Pruning::none(Color::White);
        let max_ply = import(&mut tb, &mut fbs, &pruning).unwrap();
        assert_eq!(max_ply, 1);

        // Black to move beside the undefended queen: the only legal move
        // captures into the drawn KvK table, so the count stays put and the
        // position later finalizes as a draw.
        let index = squares_to_index(Color::Black, &[Square::A1, Square::G7, Square::H8]);
        assert_eq!(tb.entry(index).outcome(), Outcome::Counting(1));
    }

    fn promotion_corner() -> (Config, Position) {
        // White Kh2 with a frozen pawn on h3, black Kf2 and a pawn on g2
        // about to promote.
        let config = Config::new(
            vec![
                Kind::King.of(Color::White),
                Kind::King.of(Color::Black),
                Kind::Pawn.of(Color::Black),
            ],
            vec![crate::config::Frozen {
                piece: Kind::Pawn.of(Color::White),
                square: Square::H3,
            }],
        )
        .unwrap();
        let pos = Position::new(
            &config,
            Color::Black,
            &[Square::H2, Square::F2, Square::G2],
        );
        assert!(pos.is_legal(&config));
        (config, pos)
    }

    #[test]
    fn test_his_prune_detects_mate_on_the_spot() {
        let (config, pos) = promotion_corner();
        let mut moves = Vec::new();
        legal_moves(&config, &pos, &mut moves);

        // Promoting to a queen mates the white king immediately: g1 is
        // defended by the black king and h3 is blocked by white's own pawn.
        let queening = moves
            .iter()
            .find(|m| m.fate == Fate::Promote(Kind::Queen))
            .unwrap();

        let mut fbs = FuturebaseSet::new();
        let probe = resolve_his_prune(&config, &pos, queening, &mut fbs);
        assert_eq!(
            probe,
            Probe::Win {
                winner: Color::Black,
                mate_ply: 0,
                conv_ply: 0,
            }
        );
    }

    #[test]
    fn test_his_prune_assumes_lost_without_replies_in_tables() {
        let (config, pos) = promotion_corner();
        let mut moves = Vec::new();
        legal_moves(&config, &pos, &mut moves);

        // Underpromoting to a knight leaves white replies (Kh1 among
        // them), but with no futurebase covering any of them the move
        // defaults to a loss.
        let knighting = moves
            .iter()
            .find(|m| m.fate == Fate::Promote(Kind::Knight))
            .unwrap();

        let mut fbs = FuturebaseSet::new();
        let probe = resolve_his_prune(&config, &pos, knighting, &mut fbs);
        assert_eq!(
            probe,
            Probe::Win {
                winner: Color::Black,
                mate_ply: 1,
                conv_ply: 1,
            }
        );
    }

    #[test]
    fn test_import_fails_without_futurebase() {
        let config: Config = "KQvK".parse().unwrap();
        let mut tb = Tablebase::allocate(config).unwrap();
        tb.initialize();

        let mut fbs = FuturebaseSet::new();
        let pruning = Pruning::none(Color::White);
        assert!(matches!(
            import(&mut tb, &mut fbs, &pruning),
            Err(BuildError::UnresolvedFuturemove { .. })
        ));
    }
}
