use crate::{
    cell::{Cell, Origin},
    los, ConeError, Params,
};
use ascgrid::{AscError, Header, Window};
use log::{debug, warn};
use std::{
    collections::VecDeque,
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
    time::Instant,
};

/// A square DEM window around the home cell, plus the propagation state
/// that turns it into a safe-altitude field.
///
/// Row 0 is the northernmost row, as in the source grid. Cells are kept
/// in one flat row-major allocation.
pub struct Grid {
    cells: Vec<Cell>,

    /// Window dimensions.
    nrows: usize,
    ncols: usize,

    /// Home cell in window-local indices.
    home_i: usize,
    home_j: usize,

    /// The window in global grid coordinates.
    win: Window,

    /// Header fields retained for output reprojection.
    global_nrows: usize,
    xllcorner: f64,
    yllcorner: f64,
    cellsize: f64,

    /// Altitude cost of one cell of horizontal travel.
    cellsize_over_finesse: f32,

    /// Unreachable sentinel and propagation horizon.
    nodata_altitude: f32,
}

impl Grid {
    /// Reads the window of `path` reachable from the home point.
    pub fn load<P: AsRef<Path>>(path: P, params: &Params) -> Result<Self, ConeError> {
        debug!("loading topology {:?}", path.as_ref());
        let mut rdr = BufReader::new(File::open(path)?);
        let header = Header::parse(&mut rdr)?;
        Self::from_reader(&mut rdr, &header, params)
    }

    /// Builds the grid from a reader positioned at the first data row.
    ///
    /// The window has radius `nodata_altitude / (cellsize / finesse)`
    /// cells, centred on the home cell and clipped to the DEM.
    pub fn from_reader<R: BufRead>(
        rdr: &mut R,
        header: &Header,
        params: &Params,
    ) -> Result<Self, ConeError> {
        if let Some(nodata) = header.nodata_value {
            if nodata != params.nodata_altitude as f32 {
                warn!(
                    "DEM NODATA_value {nodata} differs from configured nodata \
                     altitude {}; keeping the configured value",
                    params.nodata_altitude
                );
            }
        }

        let cellsize_over_finesse = header.cellsize as f32 / params.finesse as f32;
        let radius = (params.nodata_altitude as f32 / cellsize_over_finesse) as usize;

        let home_off_x = (params.home_x - header.xllcorner) / header.cellsize;
        let home_off_y = (params.home_y - header.yllcorner) / header.cellsize;
        #[allow(clippy::cast_sign_loss)]
        if home_off_x < 0.0
            || home_off_y < 0.0
            || home_off_x as usize >= header.ncols
            || home_off_y as usize >= header.nrows
        {
            return Err(ConeError::HomeOutsideDem {
                x: params.home_x,
                y: params.home_y,
            });
        }
        let global_home_j = home_off_x as usize;
        let global_home_i = header.nrows - 1 - home_off_y as usize;

        let win = Window {
            start_row: global_home_i.saturating_sub(radius),
            end_row: global_home_i.saturating_add(radius).min(header.nrows - 1),
            start_col: global_home_j.saturating_sub(radius),
            end_col: global_home_j.saturating_add(radius).min(header.ncols - 1),
        };
        let home_i = global_home_i - win.start_row;
        let home_j = global_home_j - win.start_col;

        let nodata_altitude = params.nodata_altitude as f32;
        let cells = ascgrid::read_window(rdr, &win)?
            .into_iter()
            .map(|elevation| Cell::new(elevation, nodata_altitude))
            .collect();

        debug!(
            "windowed {}x{} cells, home at ({home_i}, {home_j}), global rows {}..={} cols {}..={}",
            win.nrows(),
            win.ncols(),
            win.start_row,
            win.end_row,
            win.start_col,
            win.end_col,
        );

        Ok(Self {
            cells,
            nrows: win.nrows(),
            ncols: win.ncols(),
            home_i,
            home_j,
            win,
            global_nrows: header.nrows,
            xllcorner: header.xllcorner,
            yllcorner: header.yllcorner,
            cellsize: header.cellsize,
            cellsize_over_finesse,
            nodata_altitude,
        })
    }

    /// Seeds the home cell: self-originated, `securite` meters above its
    /// terrain. Runs before the ground clearance is applied.
    pub fn initialize_home(&mut self, params: &Params) {
        let (i, j) = (self.home_i, self.home_j);
        let home = self.cell_mut(i, j);
        home.altitude = home.elevation + params.securite as f32;
        home.origin = Origin::At { i, j };
    }

    /// Raises every cell's effective ground by the clearance, once.
    pub fn add_ground_clearance(&mut self, params: &Params) {
        let clearance = params.dist_sol as f32;
        for cell in &mut self.cells {
            cell.elevation += clearance;
        }
    }

    /// Fills the altitude/origin fields from the home seed outward.
    ///
    /// Label-correcting: a cell may be re-examined whenever a neighbour
    /// acquires an origin it doesn't share, and its altitude only ever
    /// decreases. The list drains because improvements are bounded below
    /// by the terrain.
    pub fn propagate(&mut self) {
        let now = Instant::now();
        let mut worklist: VecDeque<(usize, usize, usize, usize)> = VecDeque::new();
        self.push_neighbours(&mut worklist, self.home_i, self.home_j);

        let mut steps: u64 = 0;
        let mut adoptions: u64 = 0;
        while let Some((i, j, pi, pj)) = worklist.pop_front() {
            steps += 1;
            let parent_origin = self.cell(pi, pj).origin;
            let cell = self.cell(i, j);
            if parent_origin == cell.origin {
                continue;
            }
            if cell.ground {
                continue;
            }
            let Origin::At { i: poi, j: poj } = parent_origin else {
                continue;
            };

            // Inherit the parent's origin when it is directly visible,
            // otherwise glide from the parent itself.
            let (oi, oj) = if self.is_in_view((i, j), (poi, poj)) {
                (poi, poj)
            } else {
                (pi, pj)
            };

            if self.cell(i, j).origin == (Origin::At { i: oi, j: oj }) {
                continue;
            }
            if self.try_adopt_origin(i, j, oi, oj) {
                adoptions += 1;
                self.push_neighbours(&mut worklist, i, j);
            }
        }

        debug!(
            "cone settled after {steps} steps ({adoptions} adoptions) in {:?}",
            now.elapsed()
        );
    }

    /// True when no ground cell lies on the raster between `a` and `b`,
    /// endpoint included.
    pub fn is_in_view(&self, a: (usize, usize), b: (usize, usize)) -> bool {
        los::is_in_view(a, b, |i, j| self.cell(i, j).ground)
    }

    /// Rewrites every ground cell's altitude, normalising the ground
    /// representation for output.
    pub fn update_altitude_for_ground_cells(&mut self, altitude: f32) {
        for cell in &mut self.cells {
            if cell.ground {
                cell.altitude = altitude;
            }
        }
    }

    /// Writes the altitude field as an `.asc` grid over the subregion.
    ///
    /// With `hide_zero`, cells at altitude 0 are written as the nodata
    /// sentinel instead, rendering ground transparent downstream.
    pub fn write_altitudes<W: Write>(&self, out: &mut W, hide_zero: bool) -> Result<(), AscError> {
        let header = self.subregion_header();
        let samples: Vec<f32> = self
            .cells
            .iter()
            .map(|cell| {
                if hide_zero && cell.altitude == 0.0 {
                    self.nodata_altitude
                } else {
                    cell.altitude
                }
            })
            .collect();
        ascgrid::write(out, &header, &samples)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Home cell in window-local indices.
    pub fn home(&self) -> (usize, usize) {
        (self.home_i, self.home_j)
    }

    /// The loaded window in global grid coordinates.
    pub fn window(&self) -> Window {
        self.win
    }

    pub fn cell(&self, i: usize, j: usize) -> &Cell {
        &self.cells[self.idx(i, j)]
    }
}

/// Private API.
impl Grid {
    fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.nrows && j < self.ncols);
        i * self.ncols + j
    }

    pub(crate) fn cell_mut(&mut self, i: usize, j: usize) -> &mut Cell {
        let idx = self.idx(i, j);
        &mut self.cells[idx]
    }

    pub(crate) fn global_nrows(&self) -> usize {
        self.global_nrows
    }

    pub(crate) fn xllcorner(&self) -> f64 {
        self.xllcorner
    }

    pub(crate) fn yllcorner(&self) -> f64 {
        self.yllcorner
    }

    pub(crate) fn cellsize(&self) -> f64 {
        self.cellsize
    }

    /// Altitude a glide departing `(oi, oj)` arrives with at `(i, j)`.
    fn required_altitude_from(&self, oi: usize, oj: usize, i: usize, j: usize) -> f32 {
        let di = i as f32 - oi as f32;
        let dj = j as f32 - oj as f32;
        di.hypot(dj) * self.cellsize_over_finesse + self.cell(oi, oj).altitude
    }

    /// Offers `(oi, oj)` to `(i, j)` as a new origin. Returns true when
    /// the cell improved and its neighbours should be rescheduled.
    fn try_adopt_origin(&mut self, i: usize, j: usize, oi: usize, oj: usize) -> bool {
        let required = self.required_altitude_from(oi, oj, i, j);
        let nodata = self.nodata_altitude;
        let cell = self.cell_mut(i, j);
        if cell.origin.is_assigned() && required >= cell.altitude {
            return false;
        }
        if required <= cell.elevation {
            // The glide ray sank to the terrain here.
            cell.altitude = cell.elevation;
            cell.origin = Origin::At { i, j };
            cell.ground = true;
        } else {
            cell.altitude = required;
            cell.origin = Origin::At { i: oi, j: oj };
        }
        // Past the horizon the altitude is recorded but not spread.
        required < nodata
    }

    /// Schedules the four-connected neighbours that do not already share
    /// this cell's origin.
    fn push_neighbours(
        &self,
        worklist: &mut VecDeque<(usize, usize, usize, usize)>,
        i: usize,
        j: usize,
    ) {
        const DIRECTIONS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        let origin = self.cell(i, j).origin;
        for (di, dj) in DIRECTIONS {
            let Some(ni) = i.checked_add_signed(di) else {
                continue;
            };
            let Some(nj) = j.checked_add_signed(dj) else {
                continue;
            };
            if ni >= self.nrows || nj >= self.ncols {
                continue;
            }
            if self.cell(ni, nj).origin != origin {
                worklist.push_back((ni, nj, i, j));
            }
        }
    }

    fn subregion_header(&self) -> Header {
        Header {
            ncols: self.ncols,
            nrows: self.nrows,
            xllcorner: self.xllcorner + self.win.start_col as f64 * self.cellsize,
            yllcorner: self.yllcorner
                + (self.global_nrows - 1 - self.win.end_row) as f64 * self.cellsize,
            cellsize: self.cellsize,
            nodata_value: Some(self.nodata_altitude),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Grid, Origin, Params};
    use ascgrid::Header;
    use std::io::Cursor;

    fn params(home_x: f64, home_y: f64, nodata_altitude: i32) -> Params {
        Params {
            home_x,
            home_y,
            finesse: 20,
            dist_sol: 0,
            securite: 100,
            nodata_altitude,
            export_passes: false,
        }
    }

    fn grid_from(dem: &str, params: &Params) -> Grid {
        let mut rdr = Cursor::new(dem);
        let header = Header::parse(&mut rdr).unwrap();
        Grid::from_reader(&mut rdr, &header, params).unwrap()
    }

    fn flat_dem(nrows: usize, ncols: usize, cellsize: f64) -> String {
        let mut dem = format!(
            "ncols {ncols}\nnrows {nrows}\nxllcorner 0\nyllcorner 0\ncellsize {cellsize}\n"
        );
        for _ in 0..nrows {
            let row = vec!["0"; ncols].join(" ");
            dem.push_str(&row);
            dem.push('\n');
        }
        dem
    }

    #[test]
    fn test_window_covers_reachable_radius() {
        // cellsize/finesse = 5, so 2000m of altitude spans 400 cells;
        // the 9x9 DEM is swallowed whole.
        let p = params(450.0, 450.0, 2000);
        let grid = grid_from(&flat_dem(9, 9, 100.0), &p);
        assert_eq!((grid.nrows(), grid.ncols()), (9, 9));
        assert_eq!(grid.home(), (4, 4));
    }

    #[test]
    fn test_window_clipped_at_boundary() {
        // radius 2: nodata 10 over cellsize/finesse 5.
        let p = params(50.0, 850.0, 10);
        let grid = grid_from(&flat_dem(9, 9, 100.0), &p);
        // Global home is row 0, col 0; the window only extends south
        // and east.
        let win = grid.window();
        assert_eq!((win.start_row, win.end_row), (0, 2));
        assert_eq!((win.start_col, win.end_col), (0, 2));
        assert_eq!(grid.home(), (0, 0));
    }

    #[test]
    fn test_degenerate_single_cell_window() {
        // nodata below one cell of glide cost: radius 0.
        let p = params(450.0, 450.0, 4);
        let mut grid = grid_from(&flat_dem(9, 9, 100.0), &p);
        assert_eq!((grid.nrows(), grid.ncols()), (1, 1));
        assert_eq!(grid.home(), (0, 0));
        grid.initialize_home(&p);
        grid.propagate();
        assert_eq!(grid.cell(0, 0).altitude, 100.0);
    }

    #[test]
    fn test_home_outside_dem() {
        let p = params(-50.0, 450.0, 2000);
        let mut rdr = Cursor::new(flat_dem(9, 9, 100.0));
        let header = Header::parse(&mut rdr).unwrap();
        assert!(Grid::from_reader(&mut rdr, &header, &p).is_err());

        let p = params(450.0, 2000.0, 2000);
        let mut rdr = Cursor::new(flat_dem(9, 9, 100.0));
        let header = Header::parse(&mut rdr).unwrap();
        assert!(Grid::from_reader(&mut rdr, &header, &p).is_err());
    }

    #[test]
    fn test_adoption_rules() {
        let p = params(250.0, 250.0, 2000);
        let mut grid = grid_from(&flat_dem(5, 5, 100.0), &p);
        grid.initialize_home(&p);

        // First offer is always taken.
        assert!(grid.try_adopt_origin(2, 3, 2, 2));
        assert_eq!(grid.cell(2, 3).altitude, 105.0);
        assert_eq!(grid.cell(2, 3).origin, Origin::At { i: 2, j: 2 });

        // A worse offer is refused once an origin is assigned.
        assert!(!grid.try_adopt_origin(2, 3, 2, 3));
        assert_eq!(grid.cell(2, 3).altitude, 105.0);

        // A ray sinking to the terrain grounds the cell.
        grid.cell_mut(2, 4).elevation = 500.0;
        assert!(grid.try_adopt_origin(2, 4, 2, 2));
        let spike = grid.cell(2, 4);
        assert!(spike.ground);
        assert_eq!(spike.altitude, 500.0);
        assert_eq!(spike.origin, Origin::At { i: 2, j: 4 });
    }

    #[test]
    fn test_adoption_past_horizon_does_not_spread() {
        let p = params(250.0, 250.0, 110);
        let mut grid = grid_from(&flat_dem(5, 5, 100.0), &p);
        grid.initialize_home(&p);

        // 100 + 2*5 >= 110: recorded, but not worth rescheduling.
        assert!(!grid.try_adopt_origin(2, 4, 2, 2));
        assert_eq!(grid.cell(2, 4).altitude, 110.0);
        assert_eq!(grid.cell(2, 4).origin, Origin::At { i: 2, j: 2 });
    }
}
