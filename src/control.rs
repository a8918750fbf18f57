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

//! The XML control file.
//!
//! The control file names the output table, lists the mobile and frozen
//! pieces, references the futurebases the build may consult, and declares
//! the pruned moves. Parsing produces plain values; nothing else in the
//! crate touches XML.
//!
//! ```xml
//! <tablebase name="kqk" our-color="white" dtm="true">
//!   <piece color="white" type="king"/>
//!   <piece color="white" type="queen"/>
//!   <piece color="black" type="king"/>
//!   <futurebase filename="kk.rtb"/>
//! </tablebase>
//! ```

use std::path::PathBuf;

use crate::config::{Config, Frozen};
use crate::deps::MatKey;
use crate::errors::{BuildError, BuildResult};
use crate::futurebase::{Prune, Pruning};
use crate::square::Square;
use crate::types::{Color, Kind};

/// A futurebase reference from the control file.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FuturebaseRef {
    pub filename: PathBuf,
    pub invert: bool,
}

/// A parsed control file.
#[derive(Clone, Debug)]
pub struct ControlFile {
    pub name: String,
    pub config: Config,
    pub pruning: Pruning,
    pub futurebases: Vec<FuturebaseRef>,
    pub dtm: bool,
}

fn attr<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> BuildResult<&'a str> {
    node.attribute(name).ok_or_else(|| {
        BuildError::config(format!(
            "<{}> is missing the {} attribute",
            node.tag_name().name(),
            name
        ))
    })
}

fn parse_color(node: roxmltree::Node<'_, '_>) -> BuildResult<Color> {
    let value = attr(node, "color")?;
    Color::from_name(value)
        .ok_or_else(|| BuildError::config(format!("unknown color {:?}", value)))
}

fn parse_kind(node: roxmltree::Node<'_, '_>) -> BuildResult<Kind> {
    let value = attr(node, "type")?;
    Kind::from_name(value)
        .ok_or_else(|| BuildError::config(format!("unknown piece type {:?}", value)))
}

fn parse_square(node: roxmltree::Node<'_, '_>, name: &str) -> BuildResult<Square> {
    let value = attr(node, name)?;
    value
        .parse()
        .map_err(|_| BuildError::config(format!("invalid square {:?}", value)))
}

/// Parses a control file.
pub fn parse(text: &str) -> BuildResult<ControlFile> {
    let doc = roxmltree::Document::parse(text)
        .map_err(|err| BuildError::config(format!("malformed XML: {}", err)))?;
    let root = doc.root_element();
    if !root.has_tag_name("tablebase") {
        return Err(BuildError::config("root element must be <tablebase>"));
    }

    let mut mobiles = Vec::new();
    let mut frozen = Vec::new();
    let mut futurebases = Vec::new();
    let mut prunes = Vec::new();

    for node in root.children().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "piece" => {
                mobiles.push(parse_kind(node)?.of(parse_color(node)?));
            }
            "frozen" => {
                frozen.push(Frozen {
                    piece: parse_kind(node)?.of(parse_color(node)?),
                    square: parse_square(node, "square")?,
                });
            }
            "futurebase" => {
                let invert = match node.attribute("colors") {
                    None => false,
                    Some("invert") => true,
                    Some(other) => {
                        return Err(BuildError::config(format!(
                            "unknown colors attribute {:?}",
                            other
                        )))
                    }
                };
                futurebases.push(FuturebaseRef {
                    filename: PathBuf::from(attr(node, "filename")?),
                    invert,
                });
            }
            "prune-our-move" => prunes.push(Prune {
                ours: true,
                from: parse_square(node, "from")?,
                to: parse_square(node, "to")?,
            }),
            "prune-his-move" => prunes.push(Prune {
                ours: false,
                from: parse_square(node, "from")?,
                to: parse_square(node, "to")?,
            }),
            other => {
                return Err(BuildError::config(format!("unknown element <{}>", other)));
            }
        }
    }

    let config = Config::new(mobiles, frozen)?;

    let our_color = match root.attribute("our-color") {
        None => Color::White,
        Some(value) => Color::from_name(value)
            .ok_or_else(|| BuildError::config(format!("unknown our-color {:?}", value)))?,
    };

    let dtm = match root.attribute("dtm") {
        None | Some("true") => true,
        Some("false") => false,
        Some(other) => {
            return Err(BuildError::config(format!("invalid dtm attribute {:?}", other)));
        }
    };

    let name = match root.attribute("name") {
        Some(name) => name.to_owned(),
        None => MatKey::from_config(&config).to_string(),
    };

    Ok(ControlFile {
        name,
        config,
        pruning: Pruning { our_color, prunes },
        futurebases,
        dtm,
    })
}
