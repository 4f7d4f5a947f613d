///! One secondary-image fetch: download → temp FITS → stretch → composite →
///! flip → JPEG
use std::fs;
use std::path::{Path, PathBuf};
use tokio::task;

use super::composite::{composite, encode_jpeg, flip_vertical, LayerMapping};
use super::fits::parse_fits;
use super::source::RasterSource;
use crate::coords::{CoordFormat, Coordinates};
use crate::error::{AstroError, Result};
use crate::store::write_replace;

/// Quality of generated secondary previews
pub const JPEG_QUALITY: u8 = 90;

/// Progress checkpoints, in the order they are reported
pub mod progress {
    pub const URL_READY: u8 = 10;
    pub const DOWNLOADED: u8 = 25;
    pub const SAVED: u8 = 40;
    pub const PARSED: u8 = 50;
    pub const STRETCHING: u8 = 60;
    pub const COMPOSITED: u8 = 75;
    pub const ENCODED: u8 = 90;
    pub const DONE: u8 = 100;
}

/// Everything a single fetch needs
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub coords: Coordinates,
    /// Encoding of the originating identifier, mirrored in the output name
    pub format: CoordFormat,
    pub survey: String,
    pub url: String,
    pub dest_dir: PathBuf,
    pub mapping: LayerMapping,
    pub quality: u8,
}

impl FetchRequest {
    /// `<survey>_<coords>.jpg` in the destination directory
    pub fn output_path(&self) -> PathBuf {
        self.dest_dir.join(output_file_name(
            &self.survey,
            &self.coords,
            self.format,
        ))
    }

    /// `temp_<survey>_<ra>_<dec>.fits` in the destination directory
    pub fn temp_path(&self) -> PathBuf {
        self.dest_dir.join(format!(
            "temp_{}_{}_{}.fits",
            self.survey, self.coords.ra, self.coords.dec
        ))
    }
}

/// File name of a generated secondary image
pub fn output_file_name(survey: &str, coords: &Coordinates, format: CoordFormat) -> String {
    format!("{}_{}.jpg", survey, coords.label(format))
}

/// Removes the downloaded raster on every exit path
struct TempFile(PathBuf);

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.0.exists() {
            if let Err(e) = fs::remove_file(&self.0) {
                tracing::warn!("Failed to remove temporary raster {:?}: {}", self.0, e);
            }
        }
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| AstroError::FetchFailed(format!("worker task failed: {}", e)))?
}

/// Run the whole pipeline for one request.
///
/// `on_progress` receives each checkpoint of [`progress`] in increasing
/// order. On failure no output file is left behind.
pub async fn run_fetch<F>(
    source: &dyn RasterSource,
    request: &FetchRequest,
    mut on_progress: F,
) -> Result<PathBuf>
where
    F: FnMut(u8) + Send,
{
    on_progress(progress::URL_READY);

    let bytes = source.fetch(&request.url).await?;
    on_progress(progress::DOWNLOADED);

    if !request.dest_dir.exists() {
        fs::create_dir_all(&request.dest_dir)?;
    }
    let temp = TempFile(request.temp_path());
    tokio::fs::write(&temp.0, &bytes).await?;
    drop(bytes);
    on_progress(progress::SAVED);

    let temp_path = temp.0.clone();
    let raster = blocking(move || parse_fits(&fs::read(&temp_path)?)).await?;
    tracing::debug!("Parsed raster {:?} from {}", raster.dim(), request.url);
    on_progress(progress::PARSED);

    on_progress(progress::STRETCHING);
    let mapping = request.mapping.clone();
    let mut image = blocking(move || composite(&raster, &mapping)).await?;
    on_progress(progress::COMPOSITED);

    let quality = request.quality;
    let jpeg = blocking(move || {
        flip_vertical(&mut image);
        encode_jpeg(&image, quality)
    })
    .await?;
    on_progress(progress::ENCODED);

    let output = request.output_path();
    write_output(&output, jpeg).await?;
    drop(temp);
    on_progress(progress::DONE);

    tracing::info!("Secondary image written to {:?}", output);
    Ok(output)
}

async fn write_output(path: &Path, jpeg: Vec<u8>) -> Result<()> {
    let path = path.to_path_buf();
    blocking(move || write_replace(&path, &jpeg)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::secondary::Channel;
    use crate::test_support::fits_f32;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct StaticSource(Result<Vec<u8>>);

    #[async_trait]
    impl RasterSource for StaticSource {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            match &self.0 {
                Ok(bytes) => Ok(bytes.clone()),
                Err(e) => Err(AstroError::FetchFailed(e.to_string())),
            }
        }
    }

    fn request(dir: &Path, format: CoordFormat) -> FetchRequest {
        FetchRequest {
            coords: Coordinates::new(134.856, 7.8136).unwrap(),
            format,
            survey: "WISE".to_string(),
            url: "mock://cutout".to_string(),
            dest_dir: dir.to_path_buf(),
            mapping: LayerMapping::default()
                .with(0, &[Channel::Red, Channel::Green])
                .with(1, &[Channel::Blue]),
            quality: JPEG_QUALITY,
        }
    }

    fn two_layer_fits() -> Vec<u8> {
        let values: Vec<f32> = (0..2 * 16 * 16).map(|v| (v % 97) as f32).collect();
        fits_f32(2, 16, 16, &values)
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_output_names() {
        let coords = Coordinates::new(134.856, 7.8136).unwrap();
        assert_eq!(
            output_file_name("WISE", &coords, CoordFormat::Decimal),
            "WISE_134.856_7.8136.jpg"
        );
        let req = request(Path::new("/out"), CoordFormat::Decimal);
        assert_eq!(
            req.temp_path(),
            PathBuf::from("/out/temp_WISE_134.856_7.8136.fits")
        );
    }

    #[tokio::test]
    async fn test_successful_fetch() {
        let temp_dir = TempDir::new().unwrap();
        let source = StaticSource(Ok(two_layer_fits()));
        let req = request(temp_dir.path(), CoordFormat::Decimal);

        let steps = Mutex::new(Vec::new());
        let path = run_fetch(&source, &req, |p| steps.lock().unwrap().push(p))
            .await
            .unwrap();

        assert_eq!(path, temp_dir.path().join("WISE_134.856_7.8136.jpg"));
        assert_eq!(
            *steps.lock().unwrap(),
            vec![10, 25, 40, 50, 60, 75, 90, 100]
        );
        assert_eq!(dir_entries(temp_dir.path()), vec!["WISE_134.856_7.8136.jpg"]);

        let decoded = image::load_from_memory(&fs::read(&path).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[tokio::test]
    async fn test_download_failure_leaves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let source = StaticSource(Err(AstroError::FetchFailed("timeout after 30s".into())));
        let req = request(temp_dir.path(), CoordFormat::Sexagesimal);

        let err = run_fetch(&source, &req, |_| {}).await.unwrap_err();
        assert!(matches!(err, AstroError::FetchFailed(_)));
        assert!(dir_entries(temp_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_bad_raster_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = StaticSource(Ok(b"<html>rate limited</html>".to_vec()));
        let req = request(temp_dir.path(), CoordFormat::Decimal);

        let steps = Mutex::new(Vec::new());
        let err = run_fetch(&source, &req, |p| steps.lock().unwrap().push(p))
            .await
            .unwrap_err();
        assert!(matches!(err, AstroError::Format(_)));
        assert_eq!(*steps.lock().unwrap(), vec![10, 25, 40]);
        assert!(dir_entries(temp_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_single_band_cutout_with_default_mapping() {
        let temp_dir = TempDir::new().unwrap();
        let values: Vec<f32> = (0..64).map(|v| v as f32).collect();
        let source = StaticSource(Ok(fits_f32(1, 8, 8, &values)));
        let mut req = request(temp_dir.path(), CoordFormat::Decimal);
        req.mapping = AppConfig::default().secondary_download.layer_mapping();

        let path = run_fetch(&source, &req, |_| {}).await.unwrap();
        assert_eq!(dir_entries(temp_dir.path()), vec!["WISE_134.856_7.8136.jpg"]);

        let decoded = image::load_from_memory(&fs::read(&path).unwrap())
            .unwrap()
            .to_rgb8();
        assert_eq!(decoded.dimensions(), (8, 8));
        // JPEG is lossy; blue stays near zero while red carries the ramp
        assert!(decoded.pixels().all(|p| p[2] < 40));
        assert!(decoded.pixels().any(|p| p[0] > 128));
    }
}
