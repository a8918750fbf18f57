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

//! The on-disk table format.
//!
//! A fixed little-endian header describing the configuration, followed by
//! the raw entry array in index order. Reading is written against plain
//! [`std::io::Read`] so a futurebase can come from any byte stream.

use std::convert::TryFrom;
use std::io::{Read, Write};

use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::codec::index_range;
use crate::config::{Config, Frozen};
use crate::entry::Entry;
use crate::errors::{BuildError, BuildResult};
use crate::square::Square;
use crate::table::Tablebase;
use crate::types::{Color, Kind};

/// Magic initial bytes of a table file.
pub const MAGIC: [u8; 4] = *b"RTB1";

bitflags! {
    /// Header flags.
    pub struct TableFlags: u8 {
        /// The table carries distance-to-mate values.
        const DTM = 1;
        /// Invariant violations were observed while building; the table
        /// contents are suspect.
        const SUSPECT = 2;
    }
}

/// Serializes a finished table.
pub fn write_table<W: Write>(tb: &Tablebase, flags: TableFlags, w: &mut W) -> std::io::Result<()> {
    let config = tb.config();

    w.write_all(&MAGIC)?;
    w.write_u8(flags.bits())?;

    w.write_u8(config.num_mobiles() as u8)?;
    for piece in config.mobiles() {
        w.write_u8(piece.color as u8)?;
        w.write_u8(piece.kind as u8)?;
    }

    w.write_u8(config.frozen().len() as u8)?;
    for frozen in config.frozen() {
        w.write_u8(frozen.piece.color as u8)?;
        w.write_u8(frozen.piece.kind as u8)?;
        w.write_u8(frozen.square.index())?;
    }

    w.write_u64::<LittleEndian>(tb.index_range())?;

    for entry in tb.store().entries() {
        w.write_all(&entry.to_bytes())?;
    }

    Ok(())
}

fn read_color(byte: u8) -> BuildResult<Color> {
    match byte {
        0 => Ok(Color::White),
        1 => Ok(Color::Black),
        _ => Err(BuildError::format("invalid color byte")),
    }
}

fn read_kind(byte: u8) -> BuildResult<Kind> {
    Kind::from_index(byte).ok_or_else(|| BuildError::format("invalid piece kind byte"))
}

/// Deserializes a table, validating the header against the configuration
/// invariants and the entry count.
pub fn read_table<R: Read>(r: &mut R) -> BuildResult<(Config, TableFlags, Vec<Entry>)> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(BuildError::format("bad magic bytes"));
    }

    let flags = TableFlags::from_bits(r.read_u8()?)
        .ok_or_else(|| BuildError::format("unknown header flags"))?;

    let num_mobiles = r.read_u8()?;
    let mut mobiles = Vec::with_capacity(usize::from(num_mobiles));
    for _ in 0..num_mobiles {
        let color = read_color(r.read_u8()?)?;
        let kind = read_kind(r.read_u8()?)?;
        mobiles.push(kind.of(color));
    }

    let num_frozen = r.read_u8()?;
    let mut frozen = Vec::with_capacity(usize::from(num_frozen));
    for _ in 0..num_frozen {
        let color = read_color(r.read_u8()?)?;
        let kind = read_kind(r.read_u8()?)?;
        let square = Square::from_index(r.read_u8()?)
            .ok_or_else(|| BuildError::format("invalid frozen square"))?;
        frozen.push(Frozen {
            piece: kind.of(color),
            square,
        });
    }

    let config = Config::new(mobiles, frozen)?;

    let declared = r.read_u64::<LittleEndian>()?;
    if declared != index_range(&config) {
        return Err(BuildError::format("entry count does not match configuration"));
    }

    let len = usize::try_from(declared)
        .map_err(|_| BuildError::format("entry count overflows this platform"))?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len * 4)
        .map_err(|_| BuildError::Allocation { bytes: declared * 4 })?;
    buf.resize(len * 4, 0);
    r.read_exact(&mut buf)?;

    let entries = buf
        .chunks_exact(4)
        .map(|chunk| Entry::from_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    Ok((config, flags, entries))
}
