//! Compass overlay state.
//!
//! The compass shows a downsampled preview of the active layer with the
//! current zoom box and north/east arrows. The engine recomputes this
//! state when the active layer or zoom changes and publishes it on the
//! hub; rendering is out of scope here.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::data::Dataset;
use crate::wcs::WcsError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompassState {
    pub data_label: String,
    /// Corners of the current zoom box in the reference frame, clockwise
    /// from lower-left.
    pub zoom_limits: [DVec2; 4],
    /// Stretch limits for the preview, a 95 percent percentile interval.
    pub vmin: f64,
    pub vmax: f64,
    /// (nx, ny) of the previewed plane.
    pub shape: (usize, usize),
    /// Decimation step used for the preview.
    pub stride: usize,
}

/// Preview decimation keeps the larger plane side near 400 samples.
pub fn preview_stride(nx: usize, ny: usize) -> usize {
    let largest = nx.max(ny) as f64;
    ((largest / 400.0).round() as usize).max(1)
}

/// Percentile interval of the finite samples, `fraction` centered.
/// Returns (0, 1) when no finite samples exist.
pub fn percentile_interval(values: &[f64], fraction: f64) -> (f64, f64) {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return (0.0, 1.0);
    }
    finite.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let tail = (1.0 - fraction) / 2.0;
    let n = finite.len();
    let idx = |q: f64| -> f64 {
        let pos = q * (n - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        if lo == hi {
            finite[lo]
        } else {
            finite[lo] + (pos - lo as f64) * (finite[hi] - finite[lo])
        }
    };
    (idx(tail), idx(1.0 - tail))
}

/// Builds compass state for a dataset's image plane.
pub fn compass_state(
    dataset: &Dataset,
    zoom_limits: [DVec2; 4],
) -> Result<CompassState, WcsError> {
    let (nx, ny) = dataset
        .plane_shape()
        .ok_or_else(|| WcsError::Transform("dataset has no image plane".to_string()))?;
    let values = dataset
        .main_component()
        .map(|c| c.values.as_slice())
        .unwrap_or(&[]);
    let (vmin, vmax) = percentile_interval(values, 0.95);
    Ok(CompassState {
        data_label: dataset.label.clone(),
        zoom_limits,
        vmin,
        vmax,
        shape: (nx, ny),
        stride: preview_stride(nx, ny),
    })
}
