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

//! The entry store.
//!
//! One four-byte record per index. The `movecount` byte multiplexes the
//! outcome tag and the count of forward moves not yet shown to lose:
//!
//! ```text
//! 255        illegal position
//! 254        player to move wins, propagation done
//! 253        player not to move wins, propagation done
//! 252        player to move wins, propagation needed
//! 0          player not to move wins, propagation needed
//! 251        stalemate sentinel
//! 1..=250    moves not yet resolved; a draw once the build finishes
//! ```
//!
//! Mutators check their preconditions and log violations instead of
//! panicking: a build that runs to completion with diagnostics surfaces
//! more bugs per run than one that aborts, so violations only mark the
//! output suspect.

use log::error;

use crate::codec::Index;
use crate::types::Color;

pub const ILLEGAL: u8 = 255;
pub const PTM_WINS_DONE: u8 = 254;
pub const PNTM_WINS_DONE: u8 = 253;
pub const PTM_WINS_PENDING: u8 = 252;
pub const PNTM_WINS_PENDING: u8 = 0;
pub const STALEMATE: u8 = 251;
pub const MAX_MOVECOUNT: u8 = 250;

/// Marker for a mate or conversion distance not yet known.
pub const UNKNOWN_PLY: u8 = 255;

/// Half-moves without a capture or pawn move before the fifty-move rule
/// draws the game.
pub const CONVERSION_HORIZON: u8 = 100;

/// One table entry.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(C)]
pub struct Entry {
    pub movecount: u8,
    pub mate_ply: u8,
    pub conv_ply: u8,
    pub reserved: u8,
}

impl Entry {
    pub const ZERO: Entry = Entry {
        movecount: 0,
        mate_ply: 0,
        conv_ply: 0,
        reserved: 0,
    };

    pub fn to_bytes(self) -> [u8; 4] {
        [self.movecount, self.mate_ply, self.conv_ply, self.reserved]
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Entry {
        Entry {
            movecount: bytes[0],
            mate_ply: bytes[1],
            conv_ply: bytes[2],
            reserved: bytes[3],
        }
    }

    /// Decodes the `movecount` tag.
    pub fn outcome(self) -> Outcome {
        match self.movecount {
            ILLEGAL => Outcome::Illegal,
            PTM_WINS_DONE => Outcome::PtmWins { done: true },
            PTM_WINS_PENDING => Outcome::PtmWins { done: false },
            PNTM_WINS_DONE => Outcome::PntmWins { done: true },
            PNTM_WINS_PENDING => Outcome::PntmWins { done: false },
            STALEMATE => Outcome::Stalemate,
            n => Outcome::Counting(n),
        }
    }

    /// The outcome once the build has finished, when every unresolved count
    /// is read as a draw.
    pub fn final_outcome(self) -> FinalOutcome {
        match self.outcome() {
            Outcome::Illegal => FinalOutcome::Illegal,
            Outcome::PtmWins { .. } => FinalOutcome::PtmWins,
            Outcome::PntmWins { .. } => FinalOutcome::PntmWins,
            Outcome::Stalemate | Outcome::Counting(_) => FinalOutcome::Draw,
        }
    }
}

/// The build-time view of an entry.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Outcome {
    Illegal,
    PtmWins { done: bool },
    PntmWins { done: bool },
    Stalemate,
    Counting(u8),
}

/// The finished view of an entry.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FinalOutcome {
    Illegal,
    PtmWins,
    PntmWins,
    Draw,
}

fn turn_of(index: Index) -> Color {
    if index & 1 == 0 {
        Color::White
    } else {
        Color::Black
    }
}

/// The dense array of entries, with all mutation gated through the state
/// machine.
pub struct EntryStore {
    entries: Vec<Entry>,
    violations: u64,
}

impl std::fmt::Debug for EntryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStore")
            .field("len", &self.entries.len())
            .field("violations", &self.violations)
            .finish()
    }
}

impl EntryStore {
    /// Allocates a zeroed store, reporting failure instead of aborting.
    pub fn new(len: u64) -> Result<EntryStore, crate::errors::BuildError> {
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(len as usize)
            .map_err(|_| crate::errors::BuildError::Allocation { bytes: len * 4 })?;
        entries.resize(len as usize, Entry::ZERO);
        Ok(EntryStore {
            entries,
            violations: 0,
        })
    }

    pub fn from_entries(entries: Vec<Entry>) -> EntryStore {
        EntryStore {
            entries,
            violations: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, index: Index) -> Entry {
        self.entries[index as usize]
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of invariant violations observed by the mutators.
    pub fn violations(&self) -> u64 {
        self.violations
    }

    pub(crate) fn violation(&mut self, index: Index, what: &str) {
        self.violations += 1;
        error!(
            "invariant violation at index {}: {} (movecount {})",
            index, what, self.entries[index as usize].movecount
        );
    }

    // Initialization, used exactly once per index.

    pub fn init_illegal(&mut self, index: Index) {
        self.entries[index as usize] = Entry {
            movecount: ILLEGAL,
            mate_ply: UNKNOWN_PLY,
            conv_ply: UNKNOWN_PLY,
            reserved: 0,
        };
    }

    /// The side to move is checkmated: the other side has already won.
    pub fn init_mated(&mut self, index: Index) {
        self.entries[index as usize] = Entry {
            movecount: PNTM_WINS_PENDING,
            mate_ply: 0,
            conv_ply: 0,
            reserved: 0,
        };
    }

    pub fn init_stalemate(&mut self, index: Index) {
        self.entries[index as usize] = Entry {
            movecount: STALEMATE,
            mate_ply: UNKNOWN_PLY,
            conv_ply: 0,
            reserved: 0,
        };
    }

    pub fn init_movecount(&mut self, index: Index, movecount: usize) {
        let clamped = if movecount > usize::from(MAX_MOVECOUNT) {
            self.violation(index, "movecount exceeds representable range");
            MAX_MOVECOUNT
        } else {
            movecount as u8
        };
        self.entries[index as usize] = Entry {
            movecount: clamped,
            mate_ply: UNKNOWN_PLY,
            conv_ply: UNKNOWN_PLY,
            reserved: 0,
        };
    }

    // Propagation mutators.

    /// Records that `winner`, the player to move at `index`, has a winning
    /// move. Counting entries become wins pending propagation; an entry
    /// already won for the same side only ever lowers its mate distance.
    pub fn wins(&mut self, winner: Color, index: Index, mate_ply: u8, conv_ply: u8) {
        if turn_of(index) != winner {
            self.violation(index, "wins() for the side not to move");
            return;
        }

        let entry = &mut self.entries[index as usize];
        match entry.movecount {
            ILLEGAL => {}
            PTM_WINS_PENDING | PTM_WINS_DONE => {
                if mate_ply < entry.mate_ply {
                    entry.mate_ply = mate_ply;
                }
                if conv_ply < entry.conv_ply {
                    entry.conv_ply = conv_ply;
                }
            }
            PNTM_WINS_PENDING | PNTM_WINS_DONE => {
                self.violation(index, "wins() on a position already lost for that side");
            }
            STALEMATE => {
                self.violation(index, "wins() on a stalemate");
            }
            _ => {
                entry.movecount = PTM_WINS_PENDING;
                entry.mate_ply = mate_ply;
                entry.conv_ply = conv_ply;
            }
        }
    }

    pub fn white_wins(&mut self, index: Index, mate_ply: u8, conv_ply: u8) {
        self.wins(Color::White, index, mate_ply, conv_ply);
    }

    pub fn black_wins(&mut self, index: Index, mate_ply: u8, conv_ply: u8) {
        self.wins(Color::Black, index, mate_ply, conv_ply);
    }

    /// Records that one more forward move of `index` has been shown to lose
    /// for the side to move (`winner` is the player not to move). Reaching
    /// zero is the pending-loss state. The mate distance keeps the largest
    /// value seen, which under nondecreasing sweep order is the distance of
    /// the best defense.
    pub fn add_one_to_wins(&mut self, winner: Color, index: Index, mate_ply: u8, conv_ply: u8) {
        if turn_of(index) == winner {
            self.violation(index, "add_one_to_wins() for the side to move");
            return;
        }

        let entry = &mut self.entries[index as usize];
        match entry.movecount {
            ILLEGAL => {}
            // The side to move found its own win; a losing alternative
            // changes nothing.
            PTM_WINS_PENDING | PTM_WINS_DONE => {}
            PNTM_WINS_PENDING | PNTM_WINS_DONE => {
                self.violation(index, "add_one_to_wins() on an already lost position");
            }
            STALEMATE => {
                self.violation(index, "add_one_to_wins() on a stalemate");
            }
            _ => {
                entry.movecount -= 1;
                entry.mate_ply = if entry.mate_ply == UNKNOWN_PLY {
                    mate_ply
                } else {
                    std::cmp::max(entry.mate_ply, mate_ply)
                };
                if conv_ply < entry.conv_ply {
                    entry.conv_ply = conv_ply;
                }
            }
        }
    }

    pub fn add_one_to_white_wins(&mut self, index: Index, mate_ply: u8, conv_ply: u8) {
        self.add_one_to_wins(Color::White, index, mate_ply, conv_ply);
    }

    pub fn add_one_to_black_wins(&mut self, index: Index, mate_ply: u8, conv_ply: u8) {
        self.add_one_to_wins(Color::Black, index, mate_ply, conv_ply);
    }

    /// Accounts for a move pruned from the enumeration: decremented like a
    /// loss, with no distance information. If every move of the position
    /// was pruned away the entry becomes a pending loss with a nominal
    /// one-ply mate.
    pub fn prune_one(&mut self, index: Index) {
        let entry = &mut self.entries[index as usize];
        match entry.movecount {
            ILLEGAL => {}
            PTM_WINS_PENDING | PTM_WINS_DONE => {}
            PNTM_WINS_PENDING | PNTM_WINS_DONE => {
                self.violation(index, "prune_one() on an already lost position");
            }
            STALEMATE => {
                self.violation(index, "prune_one() on a stalemate");
            }
            _ => {
                entry.movecount -= 1;
                if entry.movecount == PNTM_WINS_PENDING && entry.mate_ply == UNKNOWN_PLY {
                    entry.mate_ply = 1;
                    entry.conv_ply = 1;
                }
            }
        }
    }

    #[inline]
    pub fn needs_propagation(&self, index: Index) -> bool {
        let movecount = self.entries[index as usize].movecount;
        movecount == PTM_WINS_PENDING || movecount == PNTM_WINS_PENDING
    }

    pub fn mark_propagated(&mut self, index: Index) {
        let entry = &mut self.entries[index as usize];
        match entry.movecount {
            PTM_WINS_PENDING => entry.movecount = PTM_WINS_DONE,
            PNTM_WINS_PENDING => entry.movecount = PNTM_WINS_DONE,
            _ => self.violation(index, "mark_propagated() on a settled or unresolved position"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // White to move at even indices with Color::White = 0.
    const WTM: Index = 2;
    const BTM: Index = 3;

    fn store() -> EntryStore {
        EntryStore::new(8).unwrap()
    }

    #[test]
    fn test_counting_to_win() {
        let mut store = store();
        store.init_movecount(WTM, 5);
        store.white_wins(WTM, 3, 1);
        assert_eq!(store.get(WTM).outcome(), Outcome::PtmWins { done: false });
        assert_eq!(store.get(WTM).mate_ply, 3);
        store.mark_propagated(WTM);
        assert_eq!(store.get(WTM).outcome(), Outcome::PtmWins { done: true });
        assert_eq!(store.violations(), 0);
    }

    #[test]
    fn test_win_never_raises_mate_ply() {
        let mut store = store();
        store.init_movecount(WTM, 5);
        store.white_wins(WTM, 3, 1);
        store.white_wins(WTM, 7, 1);
        assert_eq!(store.get(WTM).mate_ply, 3);
        store.white_wins(WTM, 1, 1);
        assert_eq!(store.get(WTM).mate_ply, 1);
        assert_eq!(store.violations(), 0);
    }

    #[test]
    fn test_decrement_to_loss() {
        let mut store = store();
        store.init_movecount(WTM, 2);
        store.add_one_to_black_wins(WTM, 2, 1);
        assert_eq!(store.get(WTM).outcome(), Outcome::Counting(1));
        store.add_one_to_black_wins(WTM, 4, 2);
        assert_eq!(store.get(WTM).outcome(), Outcome::PntmWins { done: false });
        // Best defense: the larger distance survives.
        assert_eq!(store.get(WTM).mate_ply, 4);
        assert_eq!(store.violations(), 0);
    }

    #[test]
    fn test_opposing_outcome_is_violation() {
        let mut store = store();
        store.init_movecount(BTM, 1);
        store.add_one_to_white_wins(BTM, 1, 1);
        assert_eq!(store.get(BTM).outcome(), Outcome::PntmWins { done: false });
        store.black_wins(BTM, 5, 1);
        assert_eq!(store.violations(), 1);
        assert_eq!(store.get(BTM).outcome(), Outcome::PntmWins { done: false });
    }

    #[test]
    fn test_add_one_after_win_is_noop() {
        let mut store = store();
        store.init_movecount(WTM, 3);
        store.white_wins(WTM, 1, 1);
        store.add_one_to_black_wins(WTM, 6, 2);
        assert_eq!(store.get(WTM).outcome(), Outcome::PtmWins { done: false });
        assert_eq!(store.get(WTM).mate_ply, 1);
        assert_eq!(store.violations(), 0);
    }

    #[test]
    fn test_illegal_is_silently_skipped() {
        let mut store = store();
        store.init_illegal(WTM);
        store.white_wins(WTM, 1, 1);
        store.add_one_to_black_wins(WTM, 1, 1);
        assert_eq!(store.get(WTM).outcome(), Outcome::Illegal);
        assert_eq!(store.violations(), 0);
    }

    #[test]
    fn test_mated_initialization() {
        let mut store = store();
        store.init_mated(BTM);
        assert_eq!(store.get(BTM).outcome(), Outcome::PntmWins { done: false });
        assert_eq!(store.get(BTM).mate_ply, 0);
        assert!(store.needs_propagation(BTM));
    }

    #[test]
    fn test_stalemate_is_terminal() {
        let mut store = store();
        store.init_stalemate(WTM);
        store.white_wins(WTM, 1, 1);
        assert_eq!(store.violations(), 1);
        assert_eq!(store.get(WTM).outcome(), Outcome::Stalemate);
        assert_eq!(store.get(WTM).final_outcome(), FinalOutcome::Draw);
    }

    #[test]
    fn test_entry_bytes_roundtrip() {
        let entry = Entry {
            movecount: 252,
            mate_ply: 9,
            conv_ply: 9,
            reserved: 0,
        };
        assert_eq!(Entry::from_bytes(entry.to_bytes()), entry);
    }
}
