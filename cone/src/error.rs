use ascgrid::AscError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConeError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Asc(#[from] AscError),

    #[error("home point ({x}, {y}) is outside the DEM")]
    HomeOutsideDem { x: f64, y: f64 },

    #[error("origin chain from cell ({i}, {j}) exceeded {max} hops")]
    OriginChainTooDeep { i: usize, j: usize, max: usize },
}
