///! Sky coordinates embedded in catalog identifiers
///!
///! Two encodings are recognised, tried in this order:
///! - sexagesimal: `HHMMSS.SS±DDMMSS.SS` anywhere in the name
///! - decimal degrees: `_<ra>_<dec>` anywhere in the name (last pair wins)
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use tracing::trace;

static SEXAGESIMAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2})(\d{2})(\d{2}(?:\.\d+)?)([+-])(\d{2})(\d{2})(\d{2}(?:\.\d+)?)")
        .expect("sexagesimal pattern is valid")
});

static DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_([+-]?\d+\.?\d*)_([+-]?\d+\.?\d*)").expect("decimal pattern is valid")
});

/// How an identifier spells its position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordFormat {
    Sexagesimal,
    Decimal,
}

/// A validated (right ascension, declination) pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub ra: f64,
    pub dec: f64,
}

impl Coordinates {
    /// Build a pair, rejecting anything outside ra ∈ [0, 360), dec ∈ [-90, 90]
    pub fn new(ra: f64, dec: f64) -> Option<Self> {
        if !ra.is_finite() || !dec.is_finite() {
            return None;
        }
        if !(0.0..360.0).contains(&ra) || !(-90.0..=90.0).contains(&dec) {
            return None;
        }
        Some(Self { ra, dec })
    }

    /// `HHMMSS.SS` right ascension
    pub fn ra_hms(&self) -> String {
        let hours = self.ra / 15.0;
        let (h, m, s) = split_sexagesimal(hours);
        format!("{:02}{:02}{:05.2}", h, m, s)
    }

    /// `±DDMMSS.SS` declination
    pub fn dec_dms(&self) -> String {
        let sign = if self.dec >= 0.0 { '+' } else { '-' };
        let (d, m, s) = split_sexagesimal(self.dec.abs());
        format!("{}{:02}{:02}{:05.2}", sign, d, m, s)
    }

    /// Coordinate label in the requested encoding, used for derived file names
    pub fn label(&self, format: CoordFormat) -> String {
        match format {
            CoordFormat::Sexagesimal => format!("{}{}", self.ra_hms(), self.dec_dms()),
            CoordFormat::Decimal => format!("{}_{}", self.ra, self.dec),
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RA={} Dec={}", self.ra, self.dec)
    }
}

fn split_sexagesimal(value: f64) -> (u32, u32, f64) {
    let whole = value.trunc();
    let minutes_decimal = (value - whole) * 60.0;
    let minutes = minutes_decimal.trunc();
    let seconds = (minutes_decimal - minutes) * 60.0;
    (whole as u32, minutes as u32, seconds)
}

/// Extract coordinates from an identifier, trying sexagesimal first.
///
/// Returns `None` when neither encoding yields an in-range pair; callers
/// disable position-dependent features for that identifier.
pub fn parse_coordinates(identifier: &str) -> Option<Coordinates> {
    parse_with_format(identifier).map(|(coords, _)| coords)
}

/// Like [`parse_coordinates`], also reporting which encoding matched
pub fn parse_with_format(identifier: &str) -> Option<(Coordinates, CoordFormat)> {
    let stem = Path::new(identifier)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(identifier);

    if let Some(coords) = parse_sexagesimal(stem) {
        return Some((coords, CoordFormat::Sexagesimal));
    }
    if let Some(coords) = parse_decimal(stem) {
        return Some((coords, CoordFormat::Decimal));
    }

    trace!("No coordinates in '{}'", identifier);
    None
}

fn parse_sexagesimal(stem: &str) -> Option<Coordinates> {
    let caps = SEXAGESIMAL_RE.captures(stem)?;

    let ra_h: f64 = caps[1].parse().ok()?;
    let ra_m: f64 = caps[2].parse().ok()?;
    let ra_s: f64 = caps[3].parse().ok()?;
    let sign = if &caps[4] == "-" { -1.0 } else { 1.0 };
    let dec_d: f64 = caps[5].parse().ok()?;
    let dec_m: f64 = caps[6].parse().ok()?;
    let dec_s: f64 = caps[7].parse().ok()?;

    let ra = (ra_h + ra_m / 60.0 + ra_s / 3600.0) * 15.0;
    let dec = sign * (dec_d + dec_m / 60.0 + dec_s / 3600.0);

    let coords = Coordinates::new(ra, dec);
    if coords.is_none() {
        trace!("Sexagesimal match out of range in '{}': ra={}, dec={}", stem, ra, dec);
    }
    coords
}

fn parse_decimal(stem: &str) -> Option<Coordinates> {
    let caps = DECIMAL_RE.captures_iter(stem).last()?;
    let ra: f64 = caps[1].parse().ok()?;
    let dec: f64 = caps[2].parse().ok()?;
    Coordinates::new(ra, dec)
}
