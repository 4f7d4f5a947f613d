///! Secondary survey images
///!
///! Download a FITS cutout around an identifier's position, stretch each layer,
///! map layers to RGB and store a flipped JPEG next to the catalog. Fetches
///! run on tokio tasks and report through [`FetchEvent`]s.

mod composite;
mod fits;
mod manager;
mod pipeline;
mod source;
mod stretch;

pub use composite::{composite, encode_jpeg, flip_vertical, Channel, LayerMapping};
pub use fits::parse_fits;
pub use manager::{FetchEvent, FetchOutcome, FetchState, SecondaryManager, DEFAULT_SECONDARY_SUBDIR};
pub use pipeline::{output_file_name, progress, run_fetch, FetchRequest, JPEG_QUALITY};
pub use source::{HttpRasterSource, RasterSource};
pub use stretch::{asinh_stretch, ASINH_Q};
