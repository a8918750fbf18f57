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

//! Precomputed move rays.
//!
//! A ray is the ordered list of squares a piece can reach from an origin in
//! one direction, each paired with its bitmask, terminated by a sentinel
//! whose mask is all ones. Scanning a ray against an occupancy mask stops at
//! the first occupied square, and the sentinel stops the scan at the edge of
//! the board (every position holds at least the two kings, so the all-ones
//! mask always intersects the occupancy).
//!
//! These tables are the only source of piece movement in the crate; both
//! forward move generation and retrograde un-move generation walk them.

use lazy_static::lazy_static;

use crate::bitboard::Bitboard;
use crate::square::Square;
use crate::types::{Color, Kind};

/// One step along a ray.
#[derive(Copy, Clone, Debug)]
pub struct Step {
    to: i8,
    mask: u64,
}

impl Step {
    const SENTINEL: Step = Step { to: -1, mask: !0 };

    fn new(sq: Square) -> Step {
        Step {
            to: sq.index() as i8,
            mask: 1 << sq.index(),
        }
    }

    /// The destination square, or `None` for the sentinel.
    #[inline]
    pub fn square(self) -> Option<Square> {
        Square::from_index(self.to as u8)
    }

    #[inline]
    pub fn is_sentinel(self) -> bool {
        self.to < 0
    }

    /// Whether this step lands on an occupied square. Always true for the
    /// sentinel against a non-empty occupancy.
    #[inline]
    pub fn hits(self, occupied: Bitboard) -> bool {
        self.mask & occupied.0 != 0
    }
}

/// A sentinel-terminated sequence of steps.
pub type Ray = Vec<Step>;

const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];
const ALL_DIRECTIONS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];
const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

fn directions(kind: Kind) -> (&'static [(i8, i8)], usize) {
    match kind {
        Kind::King => (&ALL_DIRECTIONS, 1),
        Kind::Queen => (&ALL_DIRECTIONS, 7),
        Kind::Rook => (&ORTHOGONAL, 7),
        Kind::Bishop => (&DIAGONAL, 7),
        Kind::Knight => (&KNIGHT_JUMPS, 1),
        Kind::Pawn | Kind::PawnEP => (&[], 0),
    }
}

fn walk(sq: Square, df: i8, dr: i8, max_len: usize) -> Ray {
    let mut ray = Vec::with_capacity(max_len + 1);
    let mut file = sq.file() as i8;
    let mut rank = sq.rank() as i8;
    for _ in 0..max_len {
        file += df;
        rank += dr;
        match Square::from_coords(file as u8, rank as u8) {
            Some(dest) => ray.push(Step::new(dest)),
            None => break,
        }
    }
    ray.push(Step::SENTINEL);
    ray
}

/// The per-piece movement tables, built once at startup.
pub struct RayTable {
    // [kind][square][direction], kinds King..Knight
    pieces: Vec<Vec<Vec<Ray>>>,
    // [color][square], the forward advance ray (one, then two from the
    // home rank); non-capturing
    advances: Vec<Vec<Ray>>,
    // [color][square][direction], length-1 diagonal capture rays
    captures: Vec<Vec<Vec<Ray>>>,
    // [color][square], the backward ray used for retrograde un-moves
    retreats: Vec<Vec<Ray>>,
}

impl RayTable {
    fn new() -> RayTable {
        let pieces = [Kind::King, Kind::Queen, Kind::Rook, Kind::Bishop, Kind::Knight]
            .iter()
            .map(|&kind| {
                let (dirs, max_len) = directions(kind);
                Square::all()
                    .map(|sq| {
                        dirs.iter()
                            .map(|&(df, dr)| walk(sq, df, dr, max_len))
                            .collect()
                    })
                    .collect()
            })
            .collect();

        let advances = Color::ALL
            .iter()
            .map(|&color| Square::all().map(|sq| advance_ray(color, sq)).collect())
            .collect();

        let captures = Color::ALL
            .iter()
            .map(|&color| {
                Square::all()
                    .map(|sq| {
                        let dr = color.fold(1, -1);
                        [(-1, dr), (1, dr)]
                            .iter()
                            .map(|&(df, dr)| pawn_step_ray(sq, df, dr))
                            .collect()
                    })
                    .collect()
            })
            .collect();

        let retreats = Color::ALL
            .iter()
            .map(|&color| Square::all().map(|sq| retreat_ray(color, sq)).collect())
            .collect();

        RayTable {
            pieces,
            advances,
            captures,
            retreats,
        }
    }

    /// Movement rays of a non-pawn kind.
    ///
    /// # Panics
    ///
    /// Panics for pawn kinds; pawns split into [`RayTable::advance`] and
    /// [`RayTable::pawn_captures`].
    #[inline]
    pub fn piece(&self, kind: Kind, sq: Square) -> &[Ray] {
        assert!(!kind.is_pawn(), "pawns have no uniform movement rays");
        &self.pieces[kind as usize][usize::from(sq)]
    }

    /// The non-capturing advance ray of a pawn.
    #[inline]
    pub fn advance(&self, color: Color, sq: Square) -> &[Step] {
        &self.advances[color as usize][usize::from(sq)]
    }

    /// The capture-only diagonal rays of a pawn.
    #[inline]
    pub fn pawn_captures(&self, color: Color, sq: Square) -> &[Ray] {
        &self.captures[color as usize][usize::from(sq)]
    }

    /// The backward ray of a pawn, for retrograde un-moves. One step back,
    /// then a second when the pawn stands on its double-advance rank.
    #[inline]
    pub fn retreat(&self, color: Color, sq: Square) -> &[Step] {
        &self.retreats[color as usize][usize::from(sq)]
    }

    /// Consistency checks over the generated tables. Returns a description
    /// of every violation found; an empty list means the tables are sound.
    pub fn verify(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for &kind in &[Kind::King, Kind::Queen, Kind::Rook, Kind::Bishop, Kind::Knight] {
            for a in Square::all() {
                for ray in self.piece(kind, a) {
                    match ray.last() {
                        Some(last) if last.is_sentinel() => {}
                        _ => violations.push(format!("{:?} ray from {} lacks sentinel", kind, a)),
                    }
                    for step in &ray[..ray.len() - 1] {
                        if step.square().is_none() {
                            violations
                                .push(format!("{:?} ray from {} has bad destination", kind, a));
                        }
                    }
                }

                for b in Square::all() {
                    let hits = self
                        .piece(kind, a)
                        .iter()
                        .filter(|ray| ray.iter().any(|s| s.square() == Some(b)))
                        .count();
                    if a == b {
                        if hits != 0 {
                            violations.push(format!("{:?} self movement from {}", kind, a));
                        }
                        continue;
                    }
                    if hits > 1 {
                        violations.push(format!(
                            "{:?} reaches {} from {} in {} directions",
                            kind, b, a, hits
                        ));
                    }
                    let reverse = self
                        .piece(kind, b)
                        .iter()
                        .any(|ray| ray.iter().any(|s| s.square() == Some(a)));
                    if (hits > 0) != reverse {
                        violations.push(format!(
                            "{:?} movement {} -> {} is not symmetric",
                            kind, a, b
                        ));
                    }
                }
            }
        }

        for &color in &Color::ALL {
            for sq in Square::all() {
                for ray in std::iter::once(self.advance(color, sq))
                    .chain(self.pawn_captures(color, sq).iter().map(|r| r.as_slice()))
                    .chain(std::iter::once(self.retreat(color, sq)))
                {
                    match ray.last() {
                        Some(last) if last.is_sentinel() => {}
                        _ => violations.push(format!("pawn ray from {} lacks sentinel", sq)),
                    }
                }
            }
        }

        violations
    }
}

fn pawn_step_ray(sq: Square, df: i8, dr: i8) -> Ray {
    let mut ray = Vec::with_capacity(2);
    let file = sq.file() as i8 + df;
    let rank = sq.rank() as i8 + dr;
    if (0..8).contains(&file) && (0..8).contains(&rank) {
        ray.push(Step::new(Square::from_coords(file as u8, rank as u8).unwrap()));
    }
    ray.push(Step::SENTINEL);
    ray
}

fn advance_ray(color: Color, sq: Square) -> Ray {
    let mut ray = Vec::with_capacity(3);
    // Pawns on the first and last ranks are illegal placements; their rays
    // are just the sentinel.
    if sq.rank() >= 1 && sq.rank() <= 6 {
        if let Some(one) = sq.offset(color.forward()) {
            ray.push(Step::new(one));
            if sq.rank() == color.home_rank() {
                if let Some(two) = one.offset(color.forward()) {
                    ray.push(Step::new(two));
                }
            }
        }
    }
    ray.push(Step::SENTINEL);
    ray
}

fn retreat_ray(color: Color, sq: Square) -> Ray {
    let mut ray = Vec::with_capacity(3);
    // A pawn on its home rank has never moved; no retreat. Retreating onto
    // the first or last rank is likewise impossible.
    if sq.rank() >= 1 && sq.rank() <= 6 && sq.rank() != color.home_rank() {
        if let Some(one) = sq.offset(-color.forward()) {
            ray.push(Step::new(one));
            if sq.rank() == color.double_advance_rank() {
                if let Some(two) = one.offset(-color.forward()) {
                    ray.push(Step::new(two));
                }
            }
        }
    }
    ray.push(Step::SENTINEL);
    ray
}

lazy_static! {
    /// The shared ray tables.
    pub static ref RAYS: RayTable = RayTable::new();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_clean() {
        assert_eq!(RAYS.verify(), Vec::<String>::new());
    }

    #[test]
    fn test_rook_ray_order() {
        // Scanning outward: the first step right of a1 is b1.
        let rays = RAYS.piece(Kind::Rook, Square::A1);
        let right: Vec<_> = rays[0].iter().filter_map(|s| s.square()).collect();
        assert_eq!(
            right,
            vec![
                Square::B1,
                Square::C1,
                Square::D1,
                Square::E1,
                Square::F1,
                Square::G1,
                Square::H1
            ]
        );
    }

    #[test]
    fn test_knight_rays() {
        let rays = RAYS.piece(Kind::Knight, Square::A1);
        let dests: Vec<_> = rays
            .iter()
            .flat_map(|r| r.iter().filter_map(|s| s.square()))
            .collect();
        assert_eq!(dests.len(), 2);
        assert!(dests.contains(&Square::C2));
        assert!(dests.contains(&Square::B3));
    }

    #[test]
    fn test_pawn_advance() {
        let ray: Vec<_> = RAYS
            .advance(Color::White, Square::E2)
            .iter()
            .filter_map(|s| s.square())
            .collect();
        assert_eq!(ray, vec![Square::E3, Square::E4]);

        let ray: Vec<_> = RAYS
            .advance(Color::Black, Square::E4)
            .iter()
            .filter_map(|s| s.square())
            .collect();
        assert_eq!(ray, vec![Square::E3]);
    }

    #[test]
    fn test_pawn_captures() {
        let dests: Vec<_> = RAYS
            .pawn_captures(Color::White, Square::A2)
            .iter()
            .flat_map(|r| r.iter().filter_map(|s| s.square()))
            .collect();
        assert_eq!(dests, vec![Square::B3]);
    }

    #[test]
    fn test_pawn_retreat() {
        let ray: Vec<_> = RAYS
            .retreat(Color::White, Square::E4)
            .iter()
            .filter_map(|s| s.square())
            .collect();
        assert_eq!(ray, vec![Square::E3, Square::E2]);

        // Home rank: the pawn has never moved.
        assert!(RAYS.retreat(Color::White, Square::E2)[0].is_sentinel());
    }

    #[test]
    fn test_sentinel_hits_everything() {
        let occupied = Bitboard::from_square(Square::A1);
        let ray = RAYS.piece(Kind::King, Square::E4);
        assert!(ray[0].last().unwrap().is_sentinel());
        assert!(ray[0].last().unwrap().hits(occupied));
    }
}
