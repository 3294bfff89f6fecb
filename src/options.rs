use anyhow::{bail, Error as AnyError};
use clap::Parser;
use std::{path::PathBuf, str::FromStr};

/// Compute the safe-glide altitude cone around a departure point and
/// extract the weighted mountain passes it glides through.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Home (departure) X world coordinate.
    pub home_x: f64,

    /// Home (departure) Y world coordinate.
    pub home_y: f64,

    /// Glide ratio, meters forward per meter of altitude lost.
    pub finesse: i32,

    /// Vertical clearance kept above the terrain, meters.
    pub dist_sol: i32,

    /// Starting margin above the home cell's ground, meters.
    pub securite: i32,

    /// Unreachable-cell sentinel, also the maximum usable altitude.
    pub nodata_altitude: i32,

    /// Directory receiving output_sub.asc, local.asc and
    /// mountain_passes.csv.
    pub output_path: PathBuf,

    /// Input DEM, ESRI ASCII grid.
    pub topology_path: PathBuf,

    /// Whether to export mountain passes (true|false|0|1).
    pub export_passes: Truthy,

    /// Minimum number of transiting cells for an exported pass.
    #[arg(long, default_value_t = 100)]
    pub min_pass_weight: u32,

    /// Also export passes whose grand-origin is not a ground cell.
    #[arg(long, default_value_t = false)]
    pub any_grand_origin: bool,
}

/// Case-insensitive `true|false|0|1`.
#[derive(Debug, Clone, Copy)]
pub struct Truthy(pub bool);

impl FromStr for Truthy {
    type Err = AnyError;

    fn from_str(s: &str) -> Result<Self, AnyError> {
        match s.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Self(true)),
            "false" | "0" => Ok(Self(false)),
            _ => bail!("expected true, false, 0 or 1, got '{s}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Truthy;

    #[test]
    fn test_truthy() {
        assert!("TRUE".parse::<Truthy>().unwrap().0);
        assert!("1".parse::<Truthy>().unwrap().0);
        assert!(!"False".parse::<Truthy>().unwrap().0);
        assert!(!"0".parse::<Truthy>().unwrap().0);
        assert!("yes".parse::<Truthy>().is_err());
    }
}
