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

//! A chess endgame tablebase builder.
//!
//! Given a material configuration of mobile pieces (optionally with frozen
//! pieces pinned to fixed squares), every legal position is enumerated,
//! labeled by exhaustive retrograde analysis as a win, loss or draw for the
//! side to move, and annotated with the distance to mate and the distance
//! to the fifty-move horizon. Captures, promotions and en-passant events
//! leave the configuration and are resolved against previously built
//! tables, the futurebases.
//!
//! # Examples
//!
//! Build the trivial two-king table and check that every legal position is
//! drawn:
//!
//! ```
//! use retrograde::{build, BuildOptions, Config, FinalOutcome, FuturebaseSet, Pruning};
//! use retrograde::Color;
//!
//! let config: Config = "KvK".parse()?;
//! let mut futurebases = FuturebaseSet::new();
//! let pruning = Pruning::none(Color::White);
//! let (tb, summary) = build(config, &mut futurebases, &pruning, &BuildOptions::default())?;
//!
//! assert_eq!(summary.ptm_wins + summary.pntm_wins, 0);
//! assert!(tb
//!     .store()
//!     .entries()
//!     .iter()
//!     .all(|e| matches!(e.final_outcome(), FinalOutcome::Draw | FinalOutcome::Illegal)));
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

mod builder;
mod codec;
mod config;
mod entry;
mod errors;
mod format;
mod futurebase;
mod moves;
mod position;
mod propagate;
mod table;

pub mod bitboard;
pub mod control;
pub mod deps;
pub mod rays;
pub mod square;
pub mod types;

pub use crate::bitboard::Bitboard;
pub use crate::builder::{build, BuildOptions, BuildSummary};
pub use crate::codec::{index_range, index_to_position, position_to_index, squares_to_index, Index};
pub use crate::config::{Config, Frozen, ParseConfigError, MAX_MOBILES};
pub use crate::control::{parse as parse_control, ControlFile, FuturebaseRef};
pub use crate::deps::MatKey;
pub use crate::entry::{Entry, EntryStore, FinalOutcome, Outcome, CONVERSION_HORIZON};
pub use crate::errors::{BuildError, BuildResult};
pub use crate::format::{read_table, write_table, TableFlags, MAGIC};
pub use crate::futurebase::{Futurebase, FuturebaseSet, Probe, Prune, Pruning};
pub use crate::moves::{legal_moves, successor, Fate, Move, Mover, Target};
pub use crate::position::{square_attacked, Position};
pub use crate::square::{ParseSquareError, Square};
pub use crate::table::Tablebase;
pub use crate::types::{Color, Kind, Piece, Placement};
