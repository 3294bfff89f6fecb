/// Geometric and policy scalars for one run, immutable after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    /// X world coordinate of the departure point.
    pub home_x: f64,

    /// Y world coordinate of the departure point.
    pub home_y: f64,

    /// Glide ratio: meters of horizontal travel per meter of altitude
    /// lost at best glide.
    pub finesse: i32,

    /// Vertical clearance added to every terrain elevation, meters.
    pub dist_sol: i32,

    /// Starting altitude margin above the home cell's ground, meters.
    pub securite: i32,

    /// Sentinel altitude for unreachable cells, doubling as the horizon
    /// beyond which propagation stops.
    pub nodata_altitude: i32,

    /// Whether the mountain-pass phase runs.
    pub export_passes: bool,
}
