//! Physical units for flux, surface brightness and spectral axes, with the
//! equivalency-driven conversions needed for mouseover value display.
//!
//! The unit algebra is deliberately closed: the viewers only ever deal with
//! flux densities (per-frequency or per-wavelength), their surface-brightness
//! counterparts (per steradian or per square pixel), spectral axis units and
//! unitless counts. Conversions that need extra physics carry it in
//! [`Equivalencies`]: the pixel area on sky (`PIXAR_SR`) for flux <-> surface
//! brightness, and the sample wavelength for per-frequency <-> per-wavelength.

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;

/// Speed of light in Angstrom per second, for F_nu <-> F_lambda conversion.
pub const C_ANGSTROM_PER_S: f64 = 2.99792458e18;

/// 1 Jansky in erg s^-1 cm^-2 Hz^-1 (the internal canonical flux scale).
const JY_TO_CGS: f64 = 1e-23;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    #[error("cannot convert {from} to {to}")]
    Incompatible { from: Unit, to: Unit },
    #[error("conversion between {from} and {to} requires a wavelength equivalency")]
    MissingWavelength { from: Unit, to: Unit },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Prefix {
    Nano,
    Micro,
    Milli,
    None,
    Mega,
}

impl Prefix {
    pub fn factor(self) -> f64 {
        match self {
            Prefix::Nano => 1e-9,
            Prefix::Micro => 1e-6,
            Prefix::Milli => 1e-3,
            Prefix::None => 1.0,
            Prefix::Mega => 1e6,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Prefix::Nano => "n",
            Prefix::Micro => "u",
            Prefix::Milli => "m",
            Prefix::None => "",
            Prefix::Mega => "M",
        }
    }
}

/// Flux-density base: what the measured energy is normalized by.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum FluxBase {
    /// Jy = 1e-23 erg s^-1 cm^-2 Hz^-1
    Jansky,
    /// erg s^-1 cm^-2 Hz^-1 (per-frequency flux density)
    ErgPerSCm2Hz,
    /// erg s^-1 cm^-2 Angstrom^-1 (per-wavelength flux density)
    ErgPerSCm2Angstrom,
}

impl FluxBase {
    fn is_per_wavelength(self) -> bool {
        matches!(self, FluxBase::ErgPerSCm2Angstrom)
    }

    fn symbol(self) -> &'static str {
        match self {
            FluxBase::Jansky => "Jy",
            FluxBase::ErgPerSCm2Hz => "erg / (cm2 Hz s)",
            FluxBase::ErgPerSCm2Angstrom => "erg / (Angstrom cm2 s)",
        }
    }
}

/// The solid-angle denominator of a flux unit, if any.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize, Default)]
pub enum SolidAngle {
    #[default]
    None,
    Steradian,
    SquarePixel,
}

impl SolidAngle {
    fn symbol(self) -> &'static str {
        match self {
            SolidAngle::None => "",
            SolidAngle::Steradian => " / sr",
            SolidAngle::SquarePixel => " / pix2",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SpectralBase {
    Angstrom,
    Nanometer,
    Micron,
    Hertz,
}

impl SpectralBase {
    /// Scale factor to Angstrom for the wavelength bases; not meaningful
    /// for `Hertz` (callers go through [`spectral_to_angstrom`]).
    fn angstrom_factor(self) -> f64 {
        match self {
            SpectralBase::Angstrom => 1.0,
            SpectralBase::Nanometer => 10.0,
            SpectralBase::Micron => 1e4,
            SpectralBase::Hertz => f64::NAN,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            SpectralBase::Angstrom => "Angstrom",
            SpectralBase::Nanometer => "nm",
            SpectralBase::Micron => "um",
            SpectralBase::Hertz => "Hz",
        }
    }
}

/// A display/storage unit as the viewers understand them.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Unit {
    Flux {
        base: FluxBase,
        prefix: Prefix,
        #[serde(default)]
        per: SolidAngle,
    },
    Spectral(SpectralBase),
    Pixel,
    Count,
    Dimensionless,
}

/// Physical-type vocabulary used by the display-unit conversion rules.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum PhysicalType {
    #[strum(serialize = "spectral flux density")]
    SpectralFluxDensity,
    #[strum(serialize = "power density/spectral flux density wav")]
    SpectralFluxDensityWav,
    #[strum(serialize = "surface brightness")]
    SurfaceBrightness,
    #[strum(serialize = "surface brightness wav")]
    SurfaceBrightnessWav,
    #[strum(serialize = "wavelength")]
    Wavelength,
    #[strum(serialize = "frequency")]
    Frequency,
    #[strum(serialize = "dimensionless")]
    Dimensionless,
    #[strum(serialize = "unknown")]
    Unknown,
}

impl PhysicalType {
    /// Whether the type takes part in flux/surface-brightness display
    /// conversion (moment maps and the like are excluded).
    pub fn is_convertible_flux(self) -> bool {
        matches!(
            self,
            PhysicalType::SpectralFluxDensity
                | PhysicalType::SpectralFluxDensityWav
                | PhysicalType::SurfaceBrightness
                | PhysicalType::SurfaceBrightnessWav
        )
    }

    pub fn is_spectral(self) -> bool {
        matches!(self, PhysicalType::Wavelength | PhysicalType::Frequency)
    }
}

impl Unit {
    pub const NJY: Unit = Unit::Flux {
        base: FluxBase::Jansky,
        prefix: Prefix::Nano,
        per: SolidAngle::None,
    };
    pub const MJY_PER_SR: Unit = Unit::Flux {
        base: FluxBase::Jansky,
        prefix: Prefix::Mega,
        per: SolidAngle::Steradian,
    };

    pub fn jansky(prefix: Prefix) -> Unit {
        Unit::Flux {
            base: FluxBase::Jansky,
            prefix,
            per: SolidAngle::None,
        }
    }

    pub fn solid_angle(&self) -> SolidAngle {
        match self {
            Unit::Flux { per, .. } => *per,
            _ => SolidAngle::None,
        }
    }

    /// True for surface-brightness-like units (per sr or per pix2).
    pub fn is_per_solid_angle(&self) -> bool {
        self.solid_angle() != SolidAngle::None
    }

    pub fn physical_type(&self) -> PhysicalType {
        match self {
            Unit::Flux { base, per, .. } => match per {
                SolidAngle::None => {
                    if base.is_per_wavelength() {
                        PhysicalType::SpectralFluxDensityWav
                    } else {
                        PhysicalType::SpectralFluxDensity
                    }
                }
                SolidAngle::Steradian => {
                    if base.is_per_wavelength() {
                        PhysicalType::SurfaceBrightnessWav
                    } else {
                        PhysicalType::SurfaceBrightness
                    }
                }
                // per-pix2 flux does not classify on its own; see
                // effective_physical_type
                SolidAngle::SquarePixel => PhysicalType::Unknown,
            },
            Unit::Spectral(SpectralBase::Hertz) => PhysicalType::Frequency,
            Unit::Spectral(_) => PhysicalType::Wavelength,
            Unit::Pixel | Unit::Count => PhysicalType::Unknown,
            Unit::Dimensionless => PhysicalType::Dimensionless,
        }
    }

    /// Physical type with a per-pix2 denominator multiplied out, so that
    /// e.g. nJy / pix2 classifies as a spectral flux density.
    pub fn effective_physical_type(&self) -> PhysicalType {
        match self {
            Unit::Flux {
                base,
                prefix,
                per: SolidAngle::SquarePixel,
            } => Unit::Flux {
                base: *base,
                prefix: *prefix,
                per: SolidAngle::None,
            }
            .physical_type(),
            other => other.physical_type(),
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unit::Flux { base, prefix, per } => {
                write!(f, "{}{}{}", prefix.symbol(), base.symbol(), per.symbol())
            }
            Unit::Spectral(base) => write!(f, "{}", base.symbol()),
            Unit::Pixel => write!(f, "pix"),
            Unit::Count => write!(f, "ct"),
            Unit::Dimensionless => Ok(()),
        }
    }
}

/// Conversion context built once per lookup: the pixel area on sky and the
/// wavelength of the sample being converted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Equivalencies {
    /// Steradian per pixel (`PIXAR_SR`); defaults to 1.
    pub pixar_sr: f64,
    /// Sample wavelength in Angstrom, when known.
    pub wavelength_angstrom: Option<f64>,
}

impl Equivalencies {
    pub fn new(pixar_sr: f64, wavelength_angstrom: Option<f64>) -> Self {
        debug_assert!(pixar_sr > 0.0, "PIXAR_SR must be positive");
        Self {
            pixar_sr,
            wavelength_angstrom,
        }
    }
}

impl Default for Equivalencies {
    fn default() -> Self {
        Self {
            pixar_sr: 1.0,
            wavelength_angstrom: None,
        }
    }
}

/// A value paired with its unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn to(self, unit: Unit, eq: &Equivalencies) -> Result<Quantity, UnitError> {
        Ok(Quantity::new(convert(self.value, self.unit, unit, eq)?, unit))
    }

    pub fn to_value(self, unit: Unit, eq: &Equivalencies) -> Result<f64, UnitError> {
        convert(self.value, self.unit, unit, eq)
    }

    pub fn to_angstrom(self) -> Result<f64, UnitError> {
        self.to_value(
            Unit::Spectral(SpectralBase::Angstrom),
            &Equivalencies::default(),
        )
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

fn spectral_to_angstrom(value: f64, base: SpectralBase) -> f64 {
    match base {
        SpectralBase::Hertz => C_ANGSTROM_PER_S / value,
        wav => value * wav.angstrom_factor(),
    }
}

fn spectral_from_angstrom(angstrom: f64, base: SpectralBase) -> f64 {
    match base {
        SpectralBase::Hertz => C_ANGSTROM_PER_S / angstrom,
        wav => angstrom / wav.angstrom_factor(),
    }
}

/// Canonical flux scale: erg s^-1 cm^-2 Hz^-1 (per-ness handled separately).
fn flux_to_cgs_hz(
    value: f64,
    base: FluxBase,
    prefix: Prefix,
    from: Unit,
    to: Unit,
    eq: &Equivalencies,
) -> Result<f64, UnitError> {
    let scaled = value * prefix.factor();
    match base {
        FluxBase::Jansky => Ok(scaled * JY_TO_CGS),
        FluxBase::ErgPerSCm2Hz => Ok(scaled),
        FluxBase::ErgPerSCm2Angstrom => {
            let wave = eq
                .wavelength_angstrom
                .ok_or(UnitError::MissingWavelength { from, to })?;
            // F_nu = F_lambda * lambda^2 / c
            Ok(scaled * wave * wave / C_ANGSTROM_PER_S)
        }
    }
}

fn flux_from_cgs_hz(
    value: f64,
    base: FluxBase,
    prefix: Prefix,
    from: Unit,
    to: Unit,
    eq: &Equivalencies,
) -> Result<f64, UnitError> {
    let unscaled = match base {
        FluxBase::Jansky => value / JY_TO_CGS,
        FluxBase::ErgPerSCm2Hz => value,
        FluxBase::ErgPerSCm2Angstrom => {
            let wave = eq
                .wavelength_angstrom
                .ok_or(UnitError::MissingWavelength { from, to })?;
            value * C_ANGSTROM_PER_S / (wave * wave)
        }
    };
    Ok(unscaled / prefix.factor())
}

/// Factor applied when moving between solid-angle denominators.
///
/// Flux-per-pixel and flux-per-pix2 are the same number; steradian
/// conversions go through the pixel area on sky.
fn solid_angle_factor(from: SolidAngle, to: SolidAngle, pixar_sr: f64) -> f64 {
    use SolidAngle::*;
    match (from, to) {
        (a, b) if a == b => 1.0,
        (None, SquarePixel) | (SquarePixel, None) => 1.0,
        (None, Steradian) | (SquarePixel, Steradian) => 1.0 / pixar_sr,
        (Steradian, None) | (Steradian, SquarePixel) => pixar_sr,
        _ => unreachable!(),
    }
}

/// General value conversion honoring the supplied equivalencies.
pub fn convert(value: f64, from: Unit, to: Unit, eq: &Equivalencies) -> Result<f64, UnitError> {
    if from == to {
        return Ok(value);
    }
    match (from, to) {
        (Unit::Spectral(a), Unit::Spectral(b)) => {
            Ok(spectral_from_angstrom(spectral_to_angstrom(value, a), b))
        }
        (
            Unit::Flux {
                base: fb,
                prefix: fp,
                per: fper,
            },
            Unit::Flux {
                base: tb,
                prefix: tp,
                per: tper,
            },
        ) => {
            let canonical = flux_to_cgs_hz(value, fb, fp, from, to, eq)?;
            let canonical = canonical * solid_angle_factor(fper, tper, eq.pixar_sr);
            flux_from_cgs_hz(canonical, tb, tp, from, to, eq)
        }
        (Unit::Pixel, Unit::Pixel)
        | (Unit::Count, Unit::Count)
        | (Unit::Dimensionless, Unit::Dimensionless) => Ok(value),
        _ => Err(UnitError::Incompatible { from, to }),
    }
}

/// Converts a sampled array, using a per-sample wavelength when one is
/// available (per-frequency <-> per-wavelength flux conversion varies along
/// the spectral axis).
pub fn convert_array(
    values: &[f64],
    from: Unit,
    to: Unit,
    pixar_sr: f64,
    wavelengths_angstrom: Option<&[f64]>,
) -> Result<Vec<f64>, UnitError> {
    if from == to {
        return Ok(values.to_vec());
    }
    if let Some(waves) = wavelengths_angstrom {
        debug_assert_eq!(waves.len(), values.len());
        values
            .iter()
            .zip(waves.iter())
            .map(|(&v, &w)| convert(v, from, to, &Equivalencies::new(pixar_sr, Some(w))))
            .collect()
    } else {
        let eq = Equivalencies::new(pixar_sr, None);
        values.iter().map(|&v| convert(v, from, to, &eq)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::float_ext::FloatExt;

    #[test]
    fn jansky_prefix_rescale() -> anyhow::Result<()> {
        let njy = Unit::NJY;
        let mjy = Unit::jansky(Prefix::Milli);
        let v = convert(2.5e6, njy, mjy, &Equivalencies::default())?;
        assert!(v.approximately_eq(2.5e-3 * 1e3), "got {v}");

        // round trip
        let back = convert(v, mjy, njy, &Equivalencies::default())?;
        assert!(back.approximately_eq_eps(2.5e6, 1e-3));
        Ok(())
    }

    #[test]
    fn flux_to_surface_brightness_uses_pixar_sr() -> anyhow::Result<()> {
        let eq = Equivalencies::new(2e-13, None);
        let v = convert(1.0, Unit::jansky(Prefix::None), Unit::MJY_PER_SR, &eq)?;
        // 1 Jy per pixel over 2e-13 sr = 5e12 Jy/sr = 5e6 MJy/sr
        assert!(v.approximately_eq_eps(5e6, 1e-3), "got {v}");
        Ok(())
    }

    #[test]
    fn per_pix2_is_identity_with_plain_flux() -> anyhow::Result<()> {
        let per_pix2 = Unit::Flux {
            base: FluxBase::Jansky,
            prefix: Prefix::Nano,
            per: SolidAngle::SquarePixel,
        };
        let v = convert(42.0, per_pix2, Unit::NJY, &Equivalencies::default())?;
        assert!(v.approximately_eq(42.0));
        Ok(())
    }

    #[test]
    fn fnu_flambda_needs_wavelength() {
        let fnu = Unit::jansky(Prefix::None);
        let flam = Unit::Flux {
            base: FluxBase::ErgPerSCm2Angstrom,
            prefix: Prefix::None,
            per: SolidAngle::None,
        };
        let err = convert(1.0, fnu, flam, &Equivalencies::default()).unwrap_err();
        assert!(matches!(err, UnitError::MissingWavelength { .. }));

        let eq = Equivalencies::new(1.0, Some(5000.0));
        let v = convert(1.0, fnu, flam, &eq).unwrap();
        // F_lambda = F_nu * c / lambda^2 = 1e-23 * 2.998e18 / 2.5e7
        let expected = 1e-23 * C_ANGSTROM_PER_S / (5000.0_f64 * 5000.0);
        assert!(v.approximately_eq_eps(expected, expected.abs() * 1e-12));
    }

    #[test]
    fn spectral_conversions() -> anyhow::Result<()> {
        let um = Unit::Spectral(SpectralBase::Micron);
        let ang = Unit::Spectral(SpectralBase::Angstrom);
        let hz = Unit::Spectral(SpectralBase::Hertz);

        let v = convert(1.5, um, ang, &Equivalencies::default())?;
        assert!(v.approximately_eq_eps(15000.0, 1e-9));

        let f = convert(15000.0, ang, hz, &Equivalencies::default())?;
        assert!(f.approximately_eq_eps(C_ANGSTROM_PER_S / 15000.0, 1.0));

        let back = convert(f, hz, um, &Equivalencies::default())?;
        assert!(back.approximately_eq_eps(1.5, 1e-12));
        Ok(())
    }

    #[test]
    fn incompatible_units_error() {
        let err = convert(
            1.0,
            Unit::Pixel,
            Unit::jansky(Prefix::None),
            &Equivalencies::default(),
        )
        .unwrap_err();
        assert!(matches!(err, UnitError::Incompatible { .. }));
    }

    #[test]
    fn physical_type_classification() {
        assert_eq!(
            Unit::NJY.physical_type(),
            PhysicalType::SpectralFluxDensity
        );
        assert_eq!(
            Unit::MJY_PER_SR.physical_type(),
            PhysicalType::SurfaceBrightness
        );
        let per_pix2 = Unit::Flux {
            base: FluxBase::Jansky,
            prefix: Prefix::None,
            per: SolidAngle::SquarePixel,
        };
        assert_eq!(per_pix2.physical_type(), PhysicalType::Unknown);
        assert_eq!(
            per_pix2.effective_physical_type(),
            PhysicalType::SpectralFluxDensity
        );
        assert_eq!(
            Unit::Spectral(SpectralBase::Micron).physical_type(),
            PhysicalType::Wavelength
        );
        assert_eq!(
            Unit::Spectral(SpectralBase::Hertz).physical_type(),
            PhysicalType::Frequency
        );
    }

    #[test]
    fn unit_display() {
        assert_eq!(Unit::NJY.to_string(), "nJy");
        assert_eq!(Unit::MJY_PER_SR.to_string(), "MJy / sr");
        let per_pix2 = Unit::Flux {
            base: FluxBase::Jansky,
            prefix: Prefix::None,
            per: SolidAngle::SquarePixel,
        };
        assert_eq!(per_pix2.to_string(), "Jy / pix2");
        assert_eq!(Unit::Spectral(SpectralBase::Micron).to_string(), "um");
        assert_eq!(Unit::Pixel.to_string(), "pix");
    }

    #[test]
    fn quantity_to_angstrom() -> anyhow::Result<()> {
        let q = Quantity::new(2.0, Unit::Spectral(SpectralBase::Micron));
        assert!(q.to_angstrom()?.approximately_eq_eps(20000.0, 1e-9));
        Ok(())
    }
}
