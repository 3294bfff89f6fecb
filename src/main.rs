mod options;

use anyhow::{ensure, Context, Result};
use clap::{error::ErrorKind, Parser};
use cone::{Grid, Params, PassFilter};
use log::debug;
use options::Cli;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

fn main() -> Result<()> {
    env_logger::init();
    // Argument errors exit 1, like every other failure.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            std::process::exit(code);
        }
    };
    ensure!(cli.finesse >= 1, "finesse must be at least 1");

    let params = Params {
        home_x: cli.home_x,
        home_y: cli.home_y,
        finesse: cli.finesse,
        dist_sol: cli.dist_sol,
        securite: cli.securite,
        nodata_altitude: cli.nodata_altitude,
        export_passes: cli.export_passes.0,
    };

    let mut grid = Grid::load(&cli.topology_path, &params)
        .with_context(|| format!("reading {}", cli.topology_path.display()))?;
    grid.initialize_home(&params);
    grid.add_ground_clearance(&params);
    grid.propagate();

    // Ground pinned to 0 so adjacent tiles recombine cleanly.
    grid.update_altitude_for_ground_cells(0.0);
    write_to(&cli.output_path.join("output_sub.asc"), |out| {
        grid.write_altitudes(out, false).map_err(Into::into)
    })?;
    // Same field with ground written as nodata, i.e. transparent.
    write_to(&cli.output_path.join("local.asc"), |out| {
        grid.write_altitudes(out, true).map_err(Into::into)
    })?;

    if params.export_passes {
        grid.detect_passes();
        grid.weight_passes()?;
        let filter = PassFilter {
            min_weight: cli.min_pass_weight,
            ground_grand_origin: !cli.any_grand_origin,
        };
        write_to(&cli.output_path.join("mountain_passes.csv"), |out| {
            grid.write_passes(out, &filter).map_err(Into::into)
        })?;
    }

    Ok(())
}

fn write_to<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    debug!("writing {path:?}");
    let mut out = BufWriter::new(
        File::create(path).with_context(|| format!("creating {}", path.display()))?,
    );
    write(&mut out)?;
    out.flush()
        .with_context(|| format!("writing {}", path.display()))
}
