//! ESRI ASCII grid (`.asc`) file format.
//!
//! A six-line plain-text header (`ncols`, `nrows`, `xllcorner`,
//! `yllcorner`, `cellsize`, `NODATA_value`) followed by `nrows` rows of
//! whitespace-separated samples. Row 0 is the northernmost row; the
//! header corners name the lower-left of the grid.
//!
//! # References
//!
//! 1. [Esri ASCII raster format](https://desktop.arcgis.com/en/arcmap/latest/manage-data/raster-and-images/esri-ascii-raster-format.htm)
//! 1. [GDAL AAIGrid driver](https://gdal.org/drivers/raster/aaigrid.html)

mod error;

pub use crate::error::AscError;
use std::{io::BufRead, io::Write, str::FromStr};

/// Parsed `.asc` header.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Number of sample columns.
    pub ncols: usize,

    /// Number of sample rows.
    pub nrows: usize,

    /// X world coordinate of the lower-left corner.
    pub xllcorner: f64,

    /// Y world coordinate of the lower-left corner.
    pub yllcorner: f64,

    /// Cell edge length in world units.
    pub cellsize: f64,

    /// Sentinel for missing samples.
    ///
    /// The `NODATA_value` line is optional in the wild; `None` when the
    /// file goes straight from `cellsize` to data.
    pub nodata_value: Option<f32>,
}

impl Header {
    /// Parses the header, leaving `rdr` positioned at the first data row.
    pub fn parse<R: BufRead>(rdr: &mut R) -> Result<Self, AscError> {
        let ncols = read_field(rdr, "ncols")?;
        let nrows = read_field(rdr, "nrows")?;
        let xllcorner = read_field(rdr, "xllcorner")?;
        let yllcorner = read_field(rdr, "yllcorner")?;
        let cellsize = read_field(rdr, "cellsize")?;
        let nodata_value = if next_line_is_field(rdr)? {
            Some(read_field(rdr, "NODATA_value")?)
        } else {
            None
        };
        Ok(Self {
            ncols,
            nrows,
            xllcorner,
            yllcorner,
            cellsize,
            nodata_value,
        })
    }
}

/// Inclusive row/column window into a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl Window {
    /// Returns the window covering all of `header`.
    pub fn full(header: &Header) -> Self {
        Self {
            start_row: 0,
            end_row: header.nrows - 1,
            start_col: 0,
            end_col: header.ncols - 1,
        }
    }

    pub fn nrows(&self) -> usize {
        self.end_row - self.start_row + 1
    }

    pub fn ncols(&self) -> usize {
        self.end_col - self.start_col + 1
    }
}

/// Reads the samples of `win` from a reader positioned at the first data
/// row, returning them in row-major order.
///
/// Rows past `win.end_row` are left unread.
pub fn read_window<R: BufRead>(
    rdr: &mut R,
    win: &Window,
) -> Result<Vec<f32>, AscError> {
    let mut samples = Vec::with_capacity(win.nrows() * win.ncols());
    let mut line = String::new();
    for row in 0..=win.end_row {
        line.clear();
        if rdr.read_line(&mut line)? == 0 {
            return Err(AscError::ShortFile {
                expected: win.end_row + 1,
                found: row,
            });
        }
        if row < win.start_row {
            continue;
        }
        let mut found = 0;
        for (col, token) in line.split_whitespace().enumerate() {
            if col < win.start_col {
                continue;
            }
            if col > win.end_col {
                break;
            }
            let sample = token.parse().map_err(|_| AscError::BadSample {
                row,
                col,
                value: token.to_string(),
            })?;
            samples.push(sample);
            found += 1;
        }
        if found != win.ncols() {
            return Err(AscError::ShortRow {
                row,
                expected: win.ncols(),
                found,
            });
        }
    }
    Ok(samples)
}

/// Writes `samples` (row-major, `header.nrows × header.ncols`) as an
/// `.asc` grid.
pub fn write<W: Write>(out: &mut W, header: &Header, samples: &[f32]) -> Result<(), AscError> {
    assert_eq!(samples.len(), header.nrows * header.ncols);
    writeln!(out, "ncols {}", header.ncols)?;
    writeln!(out, "nrows {}", header.nrows)?;
    writeln!(out, "xllcorner {}", header.xllcorner)?;
    writeln!(out, "yllcorner {}", header.yllcorner)?;
    writeln!(out, "cellsize {}", header.cellsize)?;
    if let Some(nodata) = header.nodata_value {
        writeln!(out, "NODATA_value {nodata}")?;
    }
    for row in samples.chunks(header.ncols) {
        let mut sep = "";
        for sample in row {
            write!(out, "{sep}{sample}")?;
            sep = " ";
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Parses one `key value` header line, matching `key` case-insensitively.
fn read_field<R: BufRead, T: FromStr>(rdr: &mut R, key: &'static str) -> Result<T, AscError> {
    let mut line = String::new();
    if rdr.read_line(&mut line)? == 0 {
        return Err(AscError::MissingField(key));
    }
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some(k) if k.eq_ignore_ascii_case(key) => {}
        _ => return Err(AscError::MissingField(key)),
    }
    let value = tokens.next().ok_or(AscError::MissingField(key))?;
    value.parse().map_err(|_| AscError::BadHeaderValue {
        key,
        value: value.to_string(),
    })
}

/// Returns true when the next line starts with a letter, i.e. is another
/// header field rather than a data row.
fn next_line_is_field<R: BufRead>(rdr: &mut R) -> Result<bool, AscError> {
    let buf = rdr.fill_buf()?;
    Ok(buf.first().is_some_and(|b| b.is_ascii_alphabetic()))
}
