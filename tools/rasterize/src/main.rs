//! Input preparation for `evaluate`.
//!
//! `rasterize tiff`  converts a single-band GeoTIFF into a Grid JSON file.
//! `rasterize sites` burns site points into a presence mask aligned to a grid.
//!
//! GeoTIFF rows run north → south; Grid rows run south → north, so rows are
//! flipped on the way in. The extent comes from `--extent`, else from the
//! ModelPixelScale/ModelTiepoint tags, else pixel space.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::{
    fs,
    io::BufReader,
    path::{Path, PathBuf},
};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::{info, warn};

use sensmap_core::{
    rasterize_points, trace_init::init_tracing, Extent, Grid, SitePoint, DEFAULT_NODATA,
};

const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_GDAL_NODATA: u16 = 42113;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rasterize", about = "Convert GeoTIFF layers and site points into grid JSON")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Single-band GeoTIFF → Grid JSON.
    Tiff {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// NoData sentinel; overrides the GDAL_NODATA tag.
        #[arg(long, allow_hyphen_values = true)]
        nodata: Option<f32>,

        /// Extent as MIN_X MAX_X MIN_Y MAX_Y; overrides the georeferencing tags.
        #[arg(long, num_args = 4, value_names = ["MIN_X", "MAX_X", "MIN_Y", "MAX_Y"], allow_hyphen_values = true)]
        extent: Option<Vec<f64>>,
    },
    /// Site points JSON (`[{"x":..,"y":..}]`) → presence mask aligned to a template grid.
    Sites {
        input: PathBuf,

        /// Grid JSON whose geometry the mask takes.
        #[arg(short, long)]
        template: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
}

// ── GeoTIFF ───────────────────────────────────────────────────────────────────

fn decoded_to_f32(img: DecodingResult) -> Result<Vec<f32>> {
    Ok(match img {
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        _ => bail!("unsupported pixel type"),
    })
}

/// Reorder north-up rows into south-up rows.
fn flip_rows(data: &[f32], width: usize, height: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(data.len());
    for r in (0..height).rev() {
        out.extend_from_slice(&data[r * width..(r + 1) * width]);
    }
    out
}

/// Extent from ModelPixelScale `[sx, sy, sz]` and ModelTiepoint `[i, j, k, X, Y, Z]`.
fn extent_from_georef(scale: &[f64], tiepoint: &[f64], width: usize, height: usize) -> Option<Extent> {
    if scale.len() < 2 || tiepoint.len() < 6 || scale[0] <= 0.0 || scale[1] <= 0.0 {
        return None;
    }
    let (sx, sy) = (scale[0], scale[1]);
    let min_x = tiepoint[3] - tiepoint[0] * sx;
    let max_y = tiepoint[4] + tiepoint[1] * sy;
    Some(Extent::new(min_x, min_x + width as f64 * sx, max_y - height as f64 * sy, max_y))
}

fn parse_nodata_tag(text: &str) -> Option<f32> {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\0').parse().ok()
}

fn read_tiff(path: &Path, nodata: Option<f32>, extent: Option<Extent>) -> Result<Grid> {
    let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .with_context(|| format!("{} is not a valid TIFF", path.display()))?;

    let (w, h) = decoder.dimensions()?;
    let (width, height) = (w as usize, h as usize);
    if width == 0 || height == 0 {
        bail!("{}: empty raster", path.display());
    }

    let nodata = match nodata {
        Some(v) => v,
        None => decoder
            .find_tag(Tag::from_u16_exhaustive(TAG_GDAL_NODATA))?
            .and_then(|v| v.into_string().ok())
            .and_then(|s| parse_nodata_tag(&s))
            .unwrap_or(DEFAULT_NODATA),
    };

    let extent = match extent {
        Some(e) => e,
        None => {
            let scale = decoder.find_tag(Tag::from_u16_exhaustive(TAG_MODEL_PIXEL_SCALE))?;
            let tie = decoder.find_tag(Tag::from_u16_exhaustive(TAG_MODEL_TIEPOINT))?;
            let georef = match (scale, tie) {
                (Some(s), Some(t)) => extent_from_georef(&s.into_f64_vec()?, &t.into_f64_vec()?, width, height),
                _ => None,
            };
            georef.unwrap_or_else(|| {
                warn!(path = %path.display(), "no georeferencing tags, using pixel extent");
                Extent::unit(width, height)
            })
        }
    };

    let data = decoded_to_f32(decoder.read_image()?)?;
    if data.len() != width * height {
        bail!(
            "{}: expected {} samples, found {} (multi-band rasters are not supported)",
            path.display(),
            width * height,
            data.len()
        );
    }

    Ok(Grid::from_vec(flip_rows(&data, width, height), width, height, extent, nodata)?)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn write_grid(path: &Path, grid: &Grid) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, serde_json::to_string(grid)?).with_context(|| format!("writing {}", path.display()))
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    match args.command {
        Command::Tiff { input, output, nodata, extent } => {
            let extent = extent.map(|e| Extent::new(e[0], e[1], e[2], e[3]));
            let grid = read_tiff(&input, nodata, extent)?;
            info!(
                input = %input.display(),
                width = grid.width,
                height = grid.height,
                valid = grid.valid_count(),
                "converted raster"
            );
            write_grid(&output, &grid)?;
        }
        Command::Sites { input, template, output } => {
            let text = fs::read_to_string(&template).with_context(|| format!("reading {}", template.display()))?;
            let template: Grid = serde_json::from_str(&text).context("parsing template grid")?;
            let text = fs::read_to_string(&input).with_context(|| format!("reading {}", input.display()))?;
            let points: Vec<SitePoint> = serde_json::from_str(&text).context("parsing site points")?;

            let burned = rasterize_points(&template, &points);
            if burned.cells == 0 {
                bail!("none of the {} site points fall inside the template grid", points.len());
            }
            info!(points = points.len(), cells = burned.cells, outside = burned.outside, "burned sites");
            write_grid(&output, &burned.mask)?;
        }
    }
    Ok(())
}

// ── Unit tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_puts_southern_row_first() {
        // north-up 3×2: top row [1,2,3], bottom row [4,5,6]
        let flipped = flip_rows(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
        assert_eq!(flipped, vec![4.0, 5.0, 6.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn georef_tags_give_extent() {
        // 30 m pixels, upper-left corner at (500000, 4100000)
        let e = extent_from_georef(&[30.0, 30.0, 0.0], &[0.0, 0.0, 0.0, 500_000.0, 4_100_000.0, 0.0], 100, 50)
            .unwrap();
        assert_eq!(e, Extent::new(500_000.0, 503_000.0, 4_098_500.0, 4_100_000.0));
    }

    #[test]
    fn tiepoint_off_origin_is_shifted_back() {
        let e = extent_from_georef(&[10.0, 10.0], &[2.0, 1.0, 0.0, 120.0, 490.0, 0.0], 4, 4).unwrap();
        assert_eq!(e, Extent::new(100.0, 140.0, 460.0, 500.0));
    }

    #[test]
    fn missing_or_bad_georef_is_none() {
        assert!(extent_from_georef(&[], &[0.0; 6], 2, 2).is_none());
        assert!(extent_from_georef(&[0.0, 1.0], &[0.0; 6], 2, 2).is_none());
    }

    #[test]
    fn gdal_nodata_tag_parses_with_padding() {
        assert_eq!(parse_nodata_tag("-9999\0"), Some(-9999.0));
        assert_eq!(parse_nodata_tag(" -3.4e38 "), Some(-3.4e38));
        assert_eq!(parse_nodata_tag("nan").map(f32::is_nan), Some(true));
        assert_eq!(parse_nodata_tag("none"), None);
    }
}
