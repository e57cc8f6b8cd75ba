//! World Coordinate System transforms.
//!
//! Celestial transforms use the gnomonic (tangent plane) projection:
//!
//! 1. Pixel to intermediate: `(xi, eta) = CD x (x - crpix.x, y - crpix.y)`
//! 2. Intermediate to sky: de-project from the tangent plane
//!
//! Where CD is a 2x2 matrix encoding scale, rotation, and any shear.
//! All fallible call sites get a typed result instead of a caught panic:
//! [`WcsError::NotCelestial`] when a dataset's WCS cannot produce sky
//! coordinates at all, [`WcsError::Transform`] when the math degenerates
//! (singular CD matrix, projection pole).

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::units::{Quantity, SpectralBase, Unit};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WcsError {
    #[error("WCS is not celestial")]
    NotCelestial,
    #[error("WCS transform failed: {0}")]
    Transform(String),
}

/// A sky position in ICRS, degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkyCoord {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

impl SkyCoord {
    pub fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self { ra_deg, dec_deg }
    }

    /// Sexagesimal rendering, zero-padded fields: `12h30m45.1234s +45d10m20.5678s`.
    /// Non-finite components render as the literal token `nan`.
    pub fn to_hmsdms(&self, precision: usize) -> (String, String) {
        (
            fmt_sexagesimal(self.ra_deg, true, precision),
            fmt_sexagesimal(self.dec_deg, false, precision),
        )
    }

    /// Decimal-degree rendering: `187.7059304167 12.3911231083`.
    pub fn to_decimal(&self, precision: usize) -> (String, String) {
        (
            fmt_decimal(self.ra_deg, precision),
            fmt_decimal(self.dec_deg, precision),
        )
    }
}

fn fmt_decimal(value_deg: f64, precision: usize) -> String {
    if !value_deg.is_finite() {
        return "nan".to_string();
    }
    format!("{:.*}", precision, value_deg)
}

fn fmt_sexagesimal(value_deg: f64, is_ra: bool, precision: usize) -> String {
    if !value_deg.is_finite() {
        return "nan".to_string();
    }

    let (sign, total) = if is_ra {
        ("", value_deg.rem_euclid(360.0) / 15.0)
    } else if value_deg < 0.0 {
        ("-", -value_deg)
    } else {
        ("+", value_deg)
    };

    // Round at the seconds precision first so carries cascade cleanly.
    let factor = 10f64.powi(precision as i32);
    let total_sec = (total * 3600.0 * factor).round() / factor;
    let mut h = (total_sec / 3600.0).floor();
    let rem = total_sec - h * 3600.0;
    let mut m = (rem / 60.0).floor();
    let mut s = (rem - m * 60.0).max(0.0);
    s = (s * factor).round() / factor;
    if s >= 60.0 {
        s = 0.0;
        m += 1.0;
    }
    if m >= 60.0 {
        m = 0.0;
        h += 1.0;
    }

    let sec_width = precision + 3; // two integer digits, the point, fraction
    let (unit_a, unit_b) = if is_ra { ("h", "m") } else { ("d", "m") };
    format!(
        "{}{:02}{}{:02}{}{:0sec_width$.precision$}s",
        sign, h as u64, unit_a, m as u64, unit_b, s
    )
}

/// Pixel region over which a WCS is considered valid; transforms outside it
/// are extrapolations of unknown accuracy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn contains(&self, pos: DVec2) -> bool {
        pos.x >= self.x_min && pos.x <= self.x_max && pos.y >= self.y_min && pos.y <= self.y_max
    }
}

/// Celestial (tangent plane) WCS for a 2-D image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CelestialWcs {
    /// Reference pixel (CRPIX)
    pub crpix: DVec2,
    /// Reference sky position in degrees (CRVAL: RA, Dec)
    pub crval: DVec2,
    /// CD matrix, degrees per pixel: [[CD1_1, CD1_2], [CD2_1, CD2_2]]
    pub cd: [[f64; 2]; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl CelestialWcs {
    pub fn new(crpix: DVec2, crval: DVec2, cd: [[f64; 2]; 2]) -> Self {
        Self {
            crpix,
            crval,
            cd,
            bounding_box: None,
        }
    }

    /// Scale-and-rotation construction, no shear. `pixel_scale` in
    /// arcseconds per pixel, `rotation` in degrees North through East.
    pub fn from_scale_rotation(
        crpix: DVec2,
        crval: DVec2,
        pixel_scale: f64,
        rotation: f64,
    ) -> Self {
        let scale_deg = pixel_scale / 3600.0;
        let (sin_r, cos_r) = rotation.to_radians().sin_cos();
        let cd = [
            [scale_deg * cos_r, -scale_deg * sin_r],
            [scale_deg * sin_r, scale_deg * cos_r],
        ];
        Self::new(crpix, crval, cd)
    }

    pub fn with_bounding_box(mut self, bbox: BoundingBox) -> Self {
        self.bounding_box = Some(bbox);
        self
    }

    pub fn pixel_to_sky(&self, pos: DVec2) -> Result<SkyCoord, WcsError> {
        let d = pos - self.crpix;

        let xi = (self.cd[0][0] * d.x + self.cd[0][1] * d.y).to_radians();
        let eta = (self.cd[1][0] * d.x + self.cd[1][1] * d.y).to_radians();

        let ra0 = self.crval.x.to_radians();
        let dec0 = self.crval.y.to_radians();

        let (sin_dec0, cos_dec0) = dec0.sin_cos();
        let denom = cos_dec0 - eta * sin_dec0;

        let ra = ra0 + xi.atan2(denom);
        let dec = (sin_dec0 + eta * cos_dec0).atan2((xi * xi + denom * denom).sqrt());

        let mut ra_deg = ra.to_degrees();
        if ra_deg < 0.0 {
            ra_deg += 360.0;
        } else if ra_deg >= 360.0 {
            ra_deg -= 360.0;
        }

        Ok(SkyCoord::new(ra_deg, dec.to_degrees()))
    }

    pub fn sky_to_pixel(&self, sky: SkyCoord) -> Result<DVec2, WcsError> {
        let ra = sky.ra_deg.to_radians();
        let dec = sky.dec_deg.to_radians();
        let ra0 = self.crval.x.to_radians();
        let dec0 = self.crval.y.to_radians();

        let (sin_dec, cos_dec) = dec.sin_cos();
        let (sin_dec0, cos_dec0) = dec0.sin_cos();
        let (sin_dra, cos_dra) = (ra - ra0).sin_cos();

        let d = sin_dec * sin_dec0 + cos_dec * cos_dec0 * cos_dra;
        if d.abs() < 1e-12 {
            return Err(WcsError::Transform(
                "position is on the projection pole".to_string(),
            ));
        }

        let xi = (cos_dec * sin_dra / d).to_degrees();
        let eta = ((sin_dec * cos_dec0 - cos_dec * sin_dec0 * cos_dra) / d).to_degrees();

        let det = self.cd[0][0] * self.cd[1][1] - self.cd[0][1] * self.cd[1][0];
        if det.abs() < 1e-15 {
            return Err(WcsError::Transform(format!(
                "CD matrix is singular (det = {det})"
            )));
        }

        let dx = (self.cd[1][1] * xi - self.cd[0][1] * eta) / det;
        let dy = (-self.cd[1][0] * xi + self.cd[0][0] * eta) / det;

        Ok(self.crpix + DVec2::new(dx, dy))
    }
}

/// Maps a pixel position in `from`'s frame to the same sky position in
/// `to`'s frame.
pub fn pixel_to_pixel(
    from: &CelestialWcs,
    to: &CelestialWcs,
    pos: DVec2,
) -> Result<DVec2, WcsError> {
    to.sky_to_pixel(from.pixel_to_sky(pos)?)
}

/// Linear spectral axis of a cube or 2-D spectrum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpectralAxis {
    pub crpix: f64,
    pub crval: f64,
    pub cdelt: f64,
    pub unit: Unit,
}

impl SpectralAxis {
    pub fn linear(crval: f64, cdelt: f64, base: SpectralBase) -> Self {
        Self {
            crpix: 0.0,
            crval,
            cdelt,
            unit: Unit::Spectral(base),
        }
    }

    pub fn world_value(&self, pixel: f64) -> Quantity {
        Quantity::new(self.crval + (pixel - self.crpix) * self.cdelt, self.unit)
    }
}

/// 3-axis WCS of a spectral cube: celestial pair plus a linear spectral axis.
///
/// `spectral_axis_index` records where the spectral dimension sits in the
/// backing array (0 or 2); it decides how an ordered pixel triple is
/// interpreted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubeWcs {
    pub celestial: CelestialWcs,
    pub spectral: SpectralAxis,
    pub spectral_axis_index: usize,
}

impl CubeWcs {
    /// Resolves an ordered pixel triple to (sky, spectral value).
    ///
    /// Triples are built by the caller in axis order: spectral axis first
    /// means `(x, y, slice)`, spectral axis last means `(slice, y, x)`.
    pub fn world_from_ordered(&self, ordered: [f64; 3]) -> Result<(SkyCoord, Quantity), WcsError> {
        let (x, y, s) = if self.spectral_axis_index == 0 {
            (ordered[0], ordered[1], ordered[2])
        } else {
            (ordered[2], ordered[1], ordered[0])
        };
        let sky = self.celestial.pixel_to_sky(DVec2::new(x, y))?;
        Ok((sky, self.spectral.world_value(s)))
    }

    pub fn spectral_value(&self, slice: usize) -> Quantity {
        self.spectral.world_value(slice as f64)
    }
}

/// 2-D spectral WCS: wavelength along x, spatial pixel along y.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spectral2dWcs {
    pub spectral: SpectralAxis,
}

impl Spectral2dWcs {
    /// Wavelength and spatial pixel at an (x, y) pixel position.
    pub fn pixel_to_world(&self, pos: DVec2) -> (Quantity, f64) {
        (self.spectral.world_value(pos.x), pos.y)
    }
}

/// The coordinate transform a dataset carries, if any.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DataWcs {
    Celestial(CelestialWcs),
    Cube(CubeWcs),
    Spectral2d(Spectral2dWcs),
}

impl DataWcs {
    pub fn celestial(&self) -> Option<&CelestialWcs> {
        match self {
            DataWcs::Celestial(wcs) => Some(wcs),
            DataWcs::Cube(wcs) => Some(&wcs.celestial),
            DataWcs::Spectral2d(_) => None,
        }
    }

    pub fn as_cube(&self) -> Option<&CubeWcs> {
        match self {
            DataWcs::Cube(wcs) => Some(wcs),
            _ => None,
        }
    }

    pub fn as_spectral2d(&self) -> Option<&Spectral2dWcs> {
        match self {
            DataWcs::Spectral2d(wcs) => Some(wcs),
            _ => None,
        }
    }

    /// Sky position for a 2-D pixel position, [`WcsError::NotCelestial`]
    /// when this WCS has no celestial pair.
    pub fn pixel_to_sky(&self, pos: DVec2) -> Result<SkyCoord, WcsError> {
        self.celestial()
            .ok_or(WcsError::NotCelestial)?
            .pixel_to_sky(pos)
    }

    /// Whether `pos` falls outside this WCS's valid pixel region.
    /// A WCS without a bounding box is valid everywhere.
    pub fn outside_bounding_box(&self, pos: DVec2) -> bool {
        match self.celestial().and_then(|c| c.bounding_box) {
            Some(bbox) => !bbox.contains(pos),
            None => false,
        }
    }
}
