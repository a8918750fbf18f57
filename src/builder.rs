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

//! The build driver: initialize, import futurebases, sweep to a fixpoint,
//! finalize draws.

use std::fmt;

use log::{info, warn};

use crate::config::Config;
use crate::entry::FinalOutcome;
use crate::errors::{BuildError, BuildResult};
use crate::futurebase::{import, FuturebaseSet, Pruning};
use crate::propagate::sweep;
use crate::rays::RAYS;
use crate::table::Tablebase;

/// Driver knobs.
#[derive(Copy, Clone, Debug)]
pub struct BuildOptions {
    /// Run the ray-table verification pass before building.
    pub verify_rays: bool,
}

impl Default for BuildOptions {
    fn default() -> BuildOptions {
        BuildOptions { verify_rays: true }
    }
}

/// Statistics of a finished build.
#[derive(Clone, Debug, Default)]
pub struct BuildSummary {
    pub passes: u32,
    pub propagated: u64,
    pub ptm_wins: u64,
    pub pntm_wins: u64,
    pub draws: u64,
    pub illegal: u64,
    pub violations: u64,
}

impl BuildSummary {
    /// Whether invariant violations were observed; the output should be
    /// treated as suspect.
    pub fn suspect(&self) -> bool {
        self.violations > 0
    }
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passes, {} propagated; {} wins to move, {} losses to move, {} draws, {} illegal",
            self.passes,
            self.propagated,
            self.ptm_wins,
            self.pntm_wins,
            self.draws,
            self.illegal
        )?;
        if self.suspect() {
            write!(f, "; SUSPECT ({} invariant violations)", self.violations)?;
        }
        Ok(())
    }
}

/// Builds the tablebase for `config` end to end.
///
/// Remaining non-terminal entries after the final pass are draws by
/// construction; they are left as counts and reinterpreted on read, so the
/// serialized image is exactly the entry array the propagation produced.
pub fn build(
    config: Config,
    fbs: &mut FuturebaseSet,
    pruning: &Pruning,
    options: &BuildOptions,
) -> BuildResult<(Tablebase, BuildSummary)> {
    if options.verify_rays {
        let violations = RAYS.verify();
        if !violations.is_empty() {
            for v in &violations {
                log::error!("ray table: {}", v);
            }
            return Err(BuildError::config("move ray verification failed"));
        }
        info!("move ray tables verified");
    }

    let mut tb = Tablebase::allocate(config)?;
    tb.initialize();

    let max_ply = import(&mut tb, fbs, pruning)?;

    let mut summary = BuildSummary::default();
    let mut ply: u8 = 0;
    loop {
        let progressed = sweep(&mut tb, ply);
        summary.passes += 1;
        summary.propagated += progressed;
        if progressed > 0 {
            info!("pass {} complete; {} positions propagated", ply, progressed);
        }

        if progressed == 0 && ply >= max_ply {
            break;
        }
        if ply == u8::MAX - 1 {
            warn!("mate distance saturated the entry format; stopping sweeps");
            break;
        }
        ply += 1;
    }

    for entry in tb.store().entries() {
        match entry.final_outcome() {
            FinalOutcome::PtmWins => summary.ptm_wins += 1,
            FinalOutcome::PntmWins => summary.pntm_wins += 1,
            FinalOutcome::Draw => summary.draws += 1,
            FinalOutcome::Illegal => summary.illegal += 1,
        }
    }
    summary.violations = tb.store().violations();

    info!("build of {} finished: {}", tb.config(), summary);
    Ok((tb, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    #[test]
    fn test_build_kk_is_all_draws() {
        let config: Config = "KvK".parse().unwrap();
        let mut fbs = FuturebaseSet::new();
        let pruning = Pruning::none(Color::White);
        let (tb, summary) = build(config, &mut fbs, &pruning, &BuildOptions::default()).unwrap();

        assert_eq!(summary.ptm_wins, 0);
        assert_eq!(summary.pntm_wins, 0);
        assert!(summary.draws > 0);
        assert!(!summary.suspect());
        assert_eq!(
            summary.draws + summary.illegal,
            tb.index_range()
        );
    }
}
