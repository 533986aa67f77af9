//! Terminal map viewer: geospatial raster and vector datasets drawn with
//! braille characters, with layer and overlay panels and a search box.

pub mod braille;
pub mod config;
pub mod data;
pub mod logging;
pub mod map;
