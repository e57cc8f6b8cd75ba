//! Cursor readout state.
//!
//! The readout has two faces: [`DisplayRows`], the three user-visible text
//! rows, and [`CursorSnapshot`], the machine-readable record other plugins
//! consume. Snapshots are immutable and versioned; every processed cursor
//! event produces a fresh one, so a consumer holding version N can tell a
//! newer snapshot from a mutation it missed.

use serde::{Deserialize, Serialize};

/// Non-breaking space, keeps cleared rows from collapsing in the UI.
pub const NBSP: char = '\u{00A0}';

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayRow {
    pub title: String,
    pub text: String,
    /// The row's coordinates came from extrapolation outside a bounding box.
    #[serde(default)]
    pub unreliable: bool,
}

/// The three text rows of the readout.
///
/// Row 1 carries the pixel position and value, rows 2 and 3 the world
/// coordinates. A cleared row shows a single non-breaking space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplayRows {
    pub icon: String,
    pub row1a: DisplayRow,
    pub row1b: DisplayRow,
    pub row2: DisplayRow,
    pub row3: DisplayRow,
}

impl Default for DisplayRows {
    fn default() -> Self {
        let mut rows = Self {
            icon: String::new(),
            row1a: DisplayRow::default(),
            row1b: DisplayRow::default(),
            row2: DisplayRow::default(),
            row3: DisplayRow::default(),
        };
        rows.clear_all();
        rows
    }
}

impl DisplayRows {
    pub fn clear_all(&mut self) {
        self.icon = NBSP.to_string();
        for row in [
            &mut self.row1a,
            &mut self.row1b,
            &mut self.row2,
            &mut self.row3,
        ] {
            row.title = NBSP.to_string();
            row.text = NBSP.to_string();
            row.unreliable = false;
        }
    }

    /// Clears the world-coordinate rows only.
    pub fn clear_world(&mut self) {
        for row in [&mut self.row2, &mut self.row3] {
            row.title = NBSP.to_string();
            row.text = NBSP.to_string();
            row.unreliable = false;
        }
    }

    pub fn set_row1(&mut self, a_title: &str, a_text: String, b_title: &str, b_text: String) {
        self.row1a.title = a_title.to_string();
        self.row1a.text = a_text;
        self.row1b.title = b_title.to_string();
        self.row1b.text = b_text;
    }

    pub fn set_row2(&mut self, title: &str, text: String) {
        self.row2.title = title.to_string();
        self.row2.text = text;
    }

    pub fn set_row3(&mut self, title: &str, text: String) {
        self.row3.title = title.to_string();
        self.row3.text = text;
    }

    /// Plain-text rendering of the three rows, for logs and tests.
    pub fn as_text(&self) -> (String, String, String) {
        let join = |row: &DisplayRow| {
            if row.title.chars().all(|c| c == NBSP) {
                row.text.clone()
            } else {
                format!("{} {}", row.title, row.text)
            }
        };
        (
            format!("{} {}", join(&self.row1a), join(&self.row1b)),
            join(&self.row2),
            join(&self.row3),
        )
    }
}

/// Machine-readable cursor record. Field names follow the established
/// plugin-facing keys, colons included.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CursorSnapshot {
    /// Monotonic per-engine counter.
    pub version: u64,
    /// Label of the layer the readout resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axes_x: Option<f64>,
    #[serde(rename = "axes_x:unit", default, skip_serializing_if = "Option::is_none")]
    pub axes_x_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axes_y: Option<f64>,
    #[serde(rename = "axes_y:unit", default, skip_serializing_if = "Option::is_none")]
    pub axes_y_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_y: Option<f64>,
    #[serde(
        rename = "pixel:unreliable",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pixel_unreliable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_ra: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_dec: Option<f64>,
    #[serde(
        rename = "world:unreliable",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub world_unreliable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(rename = "value:unit", default, skip_serializing_if = "Option::is_none")]
    pub value_unit: Option<String>,
    #[serde(
        rename = "value:unreliable",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub value_unreliable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spectral_axis: Option<f64>,
    #[serde(
        rename = "spectral_axis:unit",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub spectral_axis_unit: Option<String>,
    /// Cube slice index under the cursor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice: Option<usize>,
    /// 1-D sample index of the closest spectral point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<f64>,
}

impl CursorSnapshot {
    pub fn empty(version: u64) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }
}

/// Python-style `%+10.5e` rendering: explicit sign, five fractional
/// digits, signed two-digit exponent, left-padded to ten columns.
/// Non-finite values render as a padded sign plus `nan`/`inf`.
pub fn fmt_sci_signed(value: f64) -> String {
    fmt_sci(value, 5, true)
}

pub fn fmt_sci(value: f64, precision: usize, explicit_sign: bool) -> String {
    let body = if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        "inf".to_string()
    } else {
        let formatted = format!("{:.*e}", precision, value.abs());
        // Rust writes `1.23457e5`; rewrite the exponent as `e+05`.
        let (mantissa, exp) = formatted
            .split_once('e')
            .unwrap_or((formatted.as_str(), "0"));
        let exp: i32 = exp.parse().unwrap_or(0);
        format!("{}e{:+03}", mantissa, exp)
    };
    let sign = if value.is_sign_negative() {
        "-"
    } else if explicit_sign {
        "+"
    } else {
        ""
    };
    format!("{:>10}", format!("{sign}{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sci_formatting_matches_established_readout() {
        assert_eq!(fmt_sci_signed(123456.789), "+1.23457e+05");
        assert_eq!(fmt_sci_signed(-0.00012), "-1.20000e-04");
        assert_eq!(fmt_sci_signed(0.0), "+0.00000e+00");
        assert_eq!(fmt_sci_signed(-0.0), "-0.00000e+00");
        assert_eq!(fmt_sci_signed(f64::NAN), "      +nan");
        assert_eq!(fmt_sci_signed(2.5e-11), "+2.50000e-11");
        assert_eq!(fmt_sci_signed(1e100), "+1.00000e+100");
    }

    #[test]
    fn sci_formatting_unsigned() {
        assert_eq!(fmt_sci(6563.2, 5, false), "6.56320e+03");
        assert_eq!(fmt_sci(f64::NAN, 5, false), "       nan");
    }

    #[test]
    fn rows_default_to_nbsp() {
        let rows = DisplayRows::default();
        assert_eq!(rows.row1a.text, NBSP.to_string());
        assert_eq!(rows.row3.title, NBSP.to_string());
    }

    #[test]
    fn clear_world_leaves_row1() {
        let mut rows = DisplayRows::default();
        rows.set_row1("Pixel", "x=1 y=2".to_string(), "Value", "3".to_string());
        rows.set_row2("World", "sexagesimal".to_string());
        rows.set_row3(NBSP.to_string().as_str(), "decimal".to_string());
        rows.row2.unreliable = true;
        rows.clear_world();
        assert_eq!(rows.row1a.text, "x=1 y=2");
        assert_eq!(rows.row2.text, NBSP.to_string());
        assert_eq!(rows.row3.text, NBSP.to_string());
        assert!(!rows.row2.unreliable);
    }

    #[test]
    fn as_text_joins_titled_rows() {
        let mut rows = DisplayRows::default();
        rows.set_row1("Pixel", "x=1 y=2".to_string(), "Value", "3 Jy".to_string());
        rows.set_row2("World", "sexagesimal".to_string());
        let (row1, row2, row3) = rows.as_text();
        assert_eq!(row1, "Pixel x=1 y=2 Value 3 Jy");
        assert_eq!(row2, "World sexagesimal");
        assert_eq!(row3, NBSP.to_string());
    }

    #[test]
    fn snapshot_serializes_plugin_keys() -> anyhow::Result<()> {
        let snapshot = CursorSnapshot {
            version: 3,
            pixel_unreliable: Some(true),
            value: Some(1.5),
            value_unit: Some("MJy / sr".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&snapshot)?;
        assert!(json.contains("\"pixel:unreliable\":true"));
        assert!(json.contains("\"value:unit\":\"MJy / sr\""));
        assert!(!json.contains("axes_x"));
        Ok(())
    }
}
