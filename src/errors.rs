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

//! Error types.

use std::fmt;
use std::io;

/// A [`Result`] type for tablebase builds.
pub type BuildResult<T> = Result<T, BuildError>;

/// Error while setting up or running a build.
///
/// Invariant violations observed by the entry-store mutators are not errors
/// of this kind: they are logged, counted and mark the output suspect, but
/// the build runs to completion so that one run can surface several bugs.
#[derive(Debug)]
pub enum BuildError {
    /// Malformed control file or an inconsistent configuration.
    Config { message: String },
    /// A futuremove matched no futurebase and no pruning declaration; the
    /// build cannot be sound.
    UnresolvedFuturemove { message: String },
    /// The entry store cannot be allocated.
    Allocation { bytes: u64 },
    /// I/O error reading or writing a table.
    Read { error: io::Error },
    /// A table file failed validation.
    Format { message: String },
}

impl BuildError {
    pub(crate) fn config<T: Into<String>>(message: T) -> BuildError {
        BuildError::Config {
            message: message.into(),
        }
    }

    pub(crate) fn format<T: Into<String>>(message: T) -> BuildError {
        BuildError::Format {
            message: message.into(),
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Config { message } => write!(f, "configuration error: {}", message),
            BuildError::UnresolvedFuturemove { message } => {
                write!(f, "unresolved futuremove: {}", message)
            }
            BuildError::Allocation { bytes } => {
                write!(f, "cannot allocate entry store of {} bytes", bytes)
            }
            BuildError::Read { error } => write!(f, "i/o error reading a table: {}", error),
            BuildError::Format { message } => write!(f, "invalid table file: {}", message),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Read { error } => Some(error),
            _ => None,
        }
    }
}

impl From<io::Error> for BuildError {
    fn from(error: io::Error) -> BuildError {
        match error.kind() {
            io::ErrorKind::UnexpectedEof => BuildError::format("unexpected end of file"),
            _ => BuildError::Read { error },
        }
    }
}
