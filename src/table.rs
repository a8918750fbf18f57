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

//! The tablebase under construction and its initial labeling pass.

use log::{debug, info};

use crate::codec::{index_range, index_to_position, Index};
use crate::config::Config;
use crate::entry::{Entry, EntryStore};
use crate::errors::BuildResult;
use crate::moves::legal_moves;
use crate::position::Position;

/// A configuration together with its entry store.
#[derive(Debug)]
pub struct Tablebase {
    config: Config,
    pub(crate) store: EntryStore,
}

impl Tablebase {
    /// Allocates the entry store for the configuration's full index range.
    pub fn allocate(config: Config) -> BuildResult<Tablebase> {
        let range = index_range(&config);
        info!(
            "allocating {} entries ({} bytes) for {}",
            range,
            range * 4,
            config
        );
        Ok(Tablebase {
            store: EntryStore::new(range)?,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn index_range(&self) -> Index {
        self.store.len()
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    #[inline]
    pub fn entry(&self, index: Index) -> Entry {
        self.store.get(index)
    }

    /// Decodes an index, without legality analysis.
    pub fn position(&self, index: Index) -> Option<Position> {
        index_to_position(&self.config, index)
    }

    /// The first pass: classify every index as illegal, mated, stalemated,
    /// or counting its legal forward moves.
    ///
    /// A position where the side to move could capture the enemy king is
    /// one the opponent was never allowed to reach; it is labeled illegal
    /// here (as part of the side-not-to-move-in-check test) rather than
    /// treated as a mate. Mate versus stalemate at zero legal moves is
    /// decided by testing whether the side to move is itself in check.
    pub fn initialize(&mut self) {
        let mut moves = Vec::with_capacity(128);
        let mut illegal: u64 = 0;
        let mut mated: u64 = 0;
        let mut stalemate: u64 = 0;

        for index in 0..self.index_range() {
            let pos = match index_to_position(&self.config, index) {
                Some(pos) => pos,
                None => {
                    self.store.init_illegal(index);
                    illegal += 1;
                    continue;
                }
            };

            if !pos.is_legal(&self.config) {
                self.store.init_illegal(index);
                illegal += 1;
                continue;
            }

            moves.clear();
            legal_moves(&self.config, &pos, &mut moves);

            if moves.is_empty() {
                if pos.in_check(&self.config, pos.turn) {
                    self.store.init_mated(index);
                    mated += 1;
                } else {
                    self.store.init_stalemate(index);
                    stalemate += 1;
                }
            } else {
                self.store.init_movecount(index, moves.len());
            }
        }

        info!(
            "initialized {}: {} illegal, {} mated, {} stalemated",
            self.config,
            illegal,
            mated,
            stalemate
        );
        debug!(
            "{} legal indices",
            self.index_range() - illegal
        );
    }
}
