///! Batch cutout builder
///!
///! Reads source positions from a CSV file, downloads g, r and z band FITS
///! cutouts for each and writes an RGB JPEG per source (z → R, r → G, g → B).
use anyhow::{Context, Result};
use ndarray::{stack, Array2, Axis};
use std::path::{Path, PathBuf};
use tokio::task;

use astrorank_core::config::render_template;
use astrorank_core::coords::Coordinates;
use astrorank_core::secondary::{
    composite, encode_jpeg, flip_vertical, parse_fits, Channel, LayerMapping, RasterSource,
};
use astrorank_core::AstroError;

pub const DEFAULT_PREFIX: &str = "download_";
pub const DEFAULT_OUTPUT_DIR: &str = "downloads";
pub const JPEG_QUALITY: u8 = 95;

/// Legacy Survey DR10 cutout, 512 px at the native pixel scale
pub const BAND_URL_TEMPLATE: &str = "https://www.legacysurvey.org/viewer/fits-cutout?ra={ra}&dec={dec}&layer=ls-dr10&size=512&pixscale=0.263672&bands={band}";

/// Download order; the stacked raster keeps it, so layer 0 is z
const BANDS: [&str; 3] = ["z", "r", "g"];

/// One CSV row
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    pub name: String,
    pub coords: Coordinates,
}

/// Rows read from a CSV file, plus the number that could not be parsed
#[derive(Debug, Default)]
pub struct SourceList {
    pub rows: Vec<SourceRow>,
    pub skipped: usize,
}

/// Read RA/Dec from columns 0 and 1, or 1 and 2 (name in column 0) when
/// `skip_first_column` is set. The header row is skipped; rows without a
/// name are called `source_<row>`.
pub fn read_sources(path: &Path, skip_first_column: bool) -> Result<SourceList> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file {:?}", path))?;

    let (ra_col, dec_col) = if skip_first_column { (1, 2) } else { (0, 1) };
    let mut list = SourceList::default();

    for (row_idx, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Could not read CSV row {}: {}", row_idx, e);
                list.skipped += 1;
                continue;
            }
        };

        let named = if skip_first_column {
            record.get(0).map(str::trim).filter(|s| !s.is_empty())
        } else {
            None
        };
        let name = named
            .map(str::to_string)
            .unwrap_or_else(|| format!("source_{}", row_idx));

        let field = |col: usize| record.get(col).and_then(|v| v.trim().parse::<f64>().ok());
        let coords = match (field(ra_col), field(dec_col)) {
            (Some(ra), Some(dec)) => Coordinates::new(ra, dec),
            _ => None,
        };

        match coords {
            Some(coords) => list.rows.push(SourceRow { name, coords }),
            None => {
                tracing::warn!("Could not parse RA/Dec in CSV row {} ({:?})", row_idx, record);
                list.skipped += 1;
            }
        }
    }

    tracing::info!(
        "Read {} sources from {:?} ({} skipped)",
        list.rows.len(),
        path,
        list.skipped
    );
    Ok(list)
}

/// `<prefix><name>_<ra:.4>_<dec:.4>.jpg`
pub fn output_name(prefix: &str, row: &SourceRow) -> String {
    format!(
        "{}{}_{:.4}_{:.4}.jpg",
        prefix, row.name, row.coords.ra, row.coords.dec
    )
}

fn band_url(coords: &Coordinates, band: &str) -> String {
    render_template(BAND_URL_TEMPLATE, coords).replace("{band}", band)
}

fn first_layer(bytes: &[u8]) -> astrorank_core::Result<Array2<f32>> {
    let raster = parse_fits(bytes)?;
    Ok(raster.index_axis(Axis(0), 0).to_owned())
}

/// Download the three bands of one source and encode the composite
pub async fn build_cutout(source: &dyn RasterSource, row: &SourceRow) -> Result<Vec<u8>> {
    let mut planes = Vec::with_capacity(BANDS.len());
    for band in BANDS {
        tracing::info!("  Downloading {}-band for {}", band, row.name);
        let bytes = source
            .fetch(&band_url(&row.coords, band))
            .await
            .with_context(|| format!("{}-band download failed", band))?;
        let plane = first_layer(&bytes).with_context(|| format!("{}-band is not a usable image", band))?;
        planes.push(plane);
    }

    task::spawn_blocking(move || -> astrorank_core::Result<Vec<u8>> {
        let views: Vec<_> = planes.iter().map(|p| p.view()).collect();
        let raster = stack(Axis(0), &views)
            .map_err(|e| AstroError::Format(format!("band shapes differ: {}", e)))?;
        let mapping = LayerMapping::default()
            .with(0, &[Channel::Red])
            .with(1, &[Channel::Green])
            .with(2, &[Channel::Blue]);
        let mut image = composite(&raster, &mapping)?;
        flip_vertical(&mut image);
        encode_jpeg(&image, JPEG_QUALITY)
    })
    .await
    .context("Compositing task failed")?
    .map_err(Into::into)
}

/// Outcome of a batch run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub written: usize,
    pub failed: usize,
}

/// Build every source in turn; failures are logged and skipped
pub async fn process_sources(
    source: &dyn RasterSource,
    rows: &[SourceRow],
    output_dir: &Path,
    prefix: &str,
) -> Result<BatchSummary> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let mut summary = BatchSummary::default();
    for row in rows {
        tracing::info!("Processing {} ({})", row.name, row.coords);
        let path: PathBuf = output_dir.join(output_name(prefix, row));

        match build_cutout(source, row).await {
            Ok(jpeg) => {
                tokio::fs::write(&path, jpeg)
                    .await
                    .with_context(|| format!("Failed to write {:?}", path))?;
                tracing::info!("  Saved {:?}", path);
                summary.written += 1;
            }
            Err(e) => {
                tracing::warn!("  Skipping {}: {:#}", row.name, e);
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    /// Serves a ramp per band, scaled differently for each
    struct BandSource {
        size: usize,
        missing: Option<&'static str>,
    }

    fn fits_plane(size: usize, scale: f32) -> Vec<u8> {
        let mut cards = String::new();
        for (key, value) in [
            ("SIMPLE", "T".to_string()),
            ("BITPIX", "-32".to_string()),
            ("NAXIS", "2".to_string()),
            ("NAXIS1", size.to_string()),
            ("NAXIS2", size.to_string()),
        ] {
            cards.push_str(&format!("{:<8}= {:>20}{:<50}", key, value, ""));
        }
        cards.push_str(&format!("{:<80}", "END"));
        let mut bytes = cards.into_bytes();
        bytes.resize(2880, b' ');
        for i in 0..size * size {
            bytes.extend_from_slice(&(scale * (i + 1) as f32).to_be_bytes());
        }
        bytes.resize(bytes.len().div_ceil(2880) * 2880, 0);
        bytes
    }

    #[async_trait]
    impl RasterSource for BandSource {
        async fn fetch(&self, url: &str) -> astrorank_core::Result<Vec<u8>> {
            let band = url.rsplit("bands=").next().unwrap_or_default();
            if Some(band) == self.missing {
                return Err(AstroError::FetchFailed("HTTP 404".to_string()));
            }
            let scale = match band {
                "z" => 3.0,
                "r" => 2.0,
                _ => 1.0,
            };
            Ok(fits_plane(self.size, scale))
        }
    }

    fn row(name: &str) -> SourceRow {
        SourceRow {
            name: name.to_string(),
            coords: Coordinates::new(150.1, 2.2).unwrap(),
        }
    }

    #[test]
    fn test_read_sources_default_columns() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("s.csv");
        fs::write(&path, "ra,dec,z\n150.1,2.2,0.5\nbad,1.0\n400.0,1.0\n10.5,-3.25\n").unwrap();

        let list = read_sources(&path, false).unwrap();
        assert_eq!(list.skipped, 2);
        assert_eq!(list.rows.len(), 2);
        assert_eq!(list.rows[0].name, "source_0");
        assert_eq!(list.rows[1].name, "source_3");
        assert_eq!(list.rows[1].coords, Coordinates::new(10.5, -3.25).unwrap());
    }

    #[test]
    fn test_read_sources_skip_first_column() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("s.csv");
        fs::write(&path, "id,ra,dec\nQSO-1, 150.1 ,2.2\n,20.0,30.0\n").unwrap();

        let list = read_sources(&path, true).unwrap();
        assert_eq!(list.rows[0].name, "QSO-1");
        assert_eq!(list.rows[1].name, "source_1");
    }

    #[test]
    fn test_missing_csv_is_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(read_sources(&temp_dir.path().join("none.csv"), false).is_err());
    }

    #[test]
    fn test_output_name_and_url() {
        let r = SourceRow {
            name: "J1".to_string(),
            coords: Coordinates::new(150.123456, -2.5).unwrap(),
        };
        assert_eq!(output_name("decals_", &r), "decals_J1_150.1235_-2.5000.jpg");
        assert!(band_url(&r.coords, "g").ends_with("ra=150.123456&dec=-2.5&layer=ls-dr10&size=512&pixscale=0.263672&bands=g"));
    }

    #[tokio::test]
    async fn test_build_cutout_dimensions() {
        let source = BandSource { size: 8, missing: None };
        let jpeg = build_cutout(&source, &row("a")).await.unwrap();
        let image = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (8, 8));
    }

    #[tokio::test]
    async fn test_process_sources_skips_failures() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("out");

        let ok = BandSource { size: 4, missing: None };
        let summary = process_sources(&ok, &[row("a"), row("b")], &out, DEFAULT_PREFIX)
            .await
            .unwrap();
        assert_eq!(summary, BatchSummary { written: 2, failed: 0 });
        assert!(out.join("download_a_150.1000_2.2000.jpg").exists());

        let broken = BandSource { size: 4, missing: Some("r") };
        let summary = process_sources(&broken, &[row("c")], &out, DEFAULT_PREFIX)
            .await
            .unwrap();
        assert_eq!(summary, BatchSummary { written: 0, failed: 1 });
        assert!(!out.join("download_c_150.1000_2.2000.jpg").exists());
    }
}
