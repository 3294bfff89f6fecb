//! # Safe-glide altitude cones
//!
//! `cone` computes, for every cell of a DEM window around a departure
//! point, the minimum altitude a glider needs overhead to reach that cell
//! without sinking below a clearance over the terrain, and extracts the
//! weighted mountain passes the resulting glide field funnels through.

mod cell;
mod error;
mod grid;
pub mod los;
mod params;
mod passes;

pub use {
    crate::{
        cell::{Cell, Origin},
        error::ConeError,
        grid::Grid,
        params::Params,
        passes::{Pass, PassFilter, MAX_ORIGIN_CHAIN},
    },
    ascgrid,
};
