use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::Path;

use super::{extension, Dataset, Driver};
use crate::map::RasterBand;

const MAX_PREALLOCATED_CELLS: usize = 1 << 20;

/// ESRI ASCII grid (`.asc`), one band per file
pub struct AsciiGridDriver;

impl Driver for AsciiGridDriver {
    fn name(&self) -> &'static str {
        "ascii-grid"
    }

    fn can_open(&self, path: &Path) -> bool {
        extension(path).as_deref() == Some("asc")
    }

    fn open(&self, path: &Path) -> Result<Dataset> {
        let content = fs::read_to_string(path)?;
        let band = parse_ascii_grid(&content)?;
        Ok(Dataset::new(path).with_band(band))
    }
}

/// Parse an ESRI ASCII grid.
///
/// Header keys (case-insensitive): `ncols`, `nrows`, `xllcorner` or
/// `xllcenter`, `yllcorner` or `yllcenter`, `cellsize`, optional
/// `nodata_value`. Cell values follow row by row, top row first.
pub fn parse_ascii_grid(content: &str) -> Result<RasterBand> {
    let mut ncols: Option<usize> = None;
    let mut nrows: Option<usize> = None;
    let mut cellsize: Option<f64> = None;
    let mut has_x = false;
    let mut has_y = false;
    let mut no_data: Option<f32> = None;

    let mut lines = content.lines().peekable();
    while let Some(&line) = lines.peek() {
        let mut parts = line.split_whitespace();
        let Some(key) = parts.next() else {
            lines.next();
            continue;
        };
        let key = key.to_ascii_lowercase();
        if !matches!(
            key.as_str(),
            "ncols" | "nrows" | "xllcorner" | "xllcenter" | "yllcorner" | "yllcenter" | "cellsize" | "nodata_value"
        ) {
            break;
        }
        let value = parts
            .next()
            .ok_or_else(|| anyhow!("header key '{}' has no value", key))?;

        match key.as_str() {
            "ncols" => ncols = Some(value.parse().with_context(|| format!("bad ncols '{}'", value))?),
            "nrows" => nrows = Some(value.parse().with_context(|| format!("bad nrows '{}'", value))?),
            "cellsize" => {
                let size: f64 = value.parse().with_context(|| format!("bad cellsize '{}'", value))?;
                if size <= 0.0 {
                    bail!("cellsize must be positive, got {}", size);
                }
                cellsize = Some(size);
            }
            "xllcorner" | "xllcenter" => {
                value.parse::<f64>().with_context(|| format!("bad {} '{}'", key, value))?;
                has_x = true;
            }
            "yllcorner" | "yllcenter" => {
                value.parse::<f64>().with_context(|| format!("bad {} '{}'", key, value))?;
                has_y = true;
            }
            _ => {
                no_data = Some(value.parse().with_context(|| format!("bad nodata_value '{}'", value))?)
            }
        }
        lines.next();
    }

    let ncols = ncols.ok_or_else(|| anyhow!("missing ncols"))?;
    let nrows = nrows.ok_or_else(|| anyhow!("missing nrows"))?;
    if cellsize.is_none() || !has_x || !has_y {
        bail!("incomplete header: cellsize, xll* and yll* are required");
    }

    let cells = ncols
        .checked_mul(nrows)
        .ok_or_else(|| anyhow!("grid of {}x{} is too large", ncols, nrows))?;

    // The header is untrusted; grow with the data actually present
    let mut data = Vec::with_capacity(cells.min(MAX_PREALLOCATED_CELLS));
    for token in lines.flat_map(|l| l.split_whitespace()) {
        let value: f32 = token
            .parse()
            .with_context(|| format!("bad cell value '{}'", token))?;
        data.push(value);
    }
    if data.len() != cells {
        bail!(
            "expected {} cells for {}x{}, found {}",
            cells,
            ncols,
            nrows,
            data.len()
        );
    }

    Ok(RasterBand::new(ncols, nrows, data)?.with_no_data(no_data))
}
