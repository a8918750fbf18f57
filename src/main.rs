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

use std::error::Error;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use structopt::StructOpt;

use retrograde::{
    build, parse_control, BuildOptions, Futurebase, FuturebaseSet, MatKey, TableFlags,
    write_table,
};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "retrograde",
    about = "Builds chess endgame tablebases by retrograde analysis."
)]
struct Opt {
    /// XML control file naming the configuration to build
    #[structopt(parse(from_os_str))]
    control: PathBuf,
    /// Additional futurebase files beyond those referenced by the control
    /// file
    #[structopt(long = "futurebase", parse(from_os_str))]
    futurebase: Vec<PathBuf>,
    /// Output path (default: <name>.rtb in the working directory)
    #[structopt(long = "output", parse(from_os_str))]
    output: Option<PathBuf>,
    /// Skip the move-ray verification pass
    #[structopt(long = "skip-verify")]
    skip_verify: bool,
    /// Print the futurebase dependency closure of the configuration and
    /// exit
    #[structopt(long = "deps")]
    deps: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let opt = Opt::from_args();

    let text = std::fs::read_to_string(&opt.control)?;
    let control = parse_control(&text)?;

    if opt.deps {
        for key in MatKey::from_config(&control.config).closure() {
            println!("{}", key);
        }
        return Ok(());
    }

    let mut futurebases = FuturebaseSet::new();
    let base_dir = opt.control.parent().map(PathBuf::from).unwrap_or_default();
    for fref in &control.futurebases {
        let path = if fref.filename.is_absolute() {
            fref.filename.clone()
        } else {
            base_dir.join(&fref.filename)
        };
        let mut reader = BufReader::new(File::open(&path)?);
        futurebases.add(Futurebase::from_reader(&mut reader, fref.invert)?);
    }
    for path in &opt.futurebase {
        let mut reader = BufReader::new(File::open(path)?);
        futurebases.add(Futurebase::from_reader(&mut reader, false)?);
    }

    let options = BuildOptions {
        verify_rays: !opt.skip_verify,
    };
    let (tb, summary) = build(
        control.config.clone(),
        &mut futurebases,
        &control.pruning,
        &options,
    )?;

    let mut flags = TableFlags::empty();
    if control.dtm {
        flags |= TableFlags::DTM;
    }
    if summary.suspect() {
        flags |= TableFlags::SUSPECT;
    }

    let output = opt
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.rtb", control.name)));
    let mut writer = BufWriter::new(File::create(&output)?);
    write_table(&tb, flags, &mut writer)?;
    writer.flush()?;

    println!("{}: {}", control.name, summary);
    println!("wrote {}", output.display());
    Ok(())
}
