//! Datasets and the shared data collection.
//!
//! A [`Dataset`] is an n-dimensional array with named components, optional
//! WCS, and metadata. The [`DataCollection`] owns all loaded datasets,
//! tracks a version per label so downstream caches can tell replacements
//! apart, and records the pixel/WCS links between them.

use common::id_type;
use glam::DVec2;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::units::Unit;
use crate::wcs::DataWcs;

id_type!(DatasetId);

/// One named array of a dataset, for instance `flux` or `dq`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    pub values: Vec<f64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DatasetMeta {
    /// Pixel area in steradians, for flux <-> surface brightness conversion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixar_sr: Option<f64>,
    /// Which array axis is spectral for cubes (0 or 2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spectral_axis_index: Option<usize>,
    /// Label of the dataset this one was derived from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Set on plugin products whose cursor readout should use the parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by_plugin: Option<String>,
    /// WCS of the spectrum this cube was built from, preferred over the
    /// dataset's own WCS for sky lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig_spec_wcs: Option<DataWcs>,
    /// Carries no image data, only a coordinate frame.
    #[serde(default)]
    pub wcs_only: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default = "DatasetId::unique")]
    pub id: DatasetId,
    pub label: String,
    /// Array shape in storage order, e.g. `[ny, nx]` for an image.
    pub shape: Vec<usize>,
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wcs: Option<DataWcs>,
    #[serde(default)]
    pub meta: DatasetMeta,
}

impl Dataset {
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    /// The primary data component: first one that is not a data-quality array.
    pub fn main_component(&self) -> Option<&Component> {
        self.components.iter().find(|c| c.name != "dq")
    }

    pub fn unit_of(&self, name: &str) -> Option<Unit> {
        self.component(name).and_then(|c| c.unit)
    }

    /// Value of a 2-D component at integer pixel (x, y). Row-major `[ny, nx]`.
    pub fn value_2d(&self, name: &str, x: usize, y: usize) -> Option<f64> {
        if self.shape.len() != 2 {
            return None;
        }
        let (ny, nx) = (self.shape[0], self.shape[1]);
        if x >= nx || y >= ny {
            return None;
        }
        self.component(name).map(|c| c.values[y * nx + x])
    }

    /// Value of a 3-D component at (x, y, slice), honoring the cube's axis
    /// ordering: spectral axis 0 stores `[nz, ny, nx]`, spectral axis last
    /// stores `[nx, ny, nz]`.
    pub fn value_3d(&self, name: &str, x: usize, y: usize, slice: usize) -> Option<f64> {
        if self.shape.len() != 3 {
            return None;
        }
        let sai = self.meta.spectral_axis_index.unwrap_or(2);
        let idx = if sai == 0 {
            let (nz, ny, nx) = (self.shape[0], self.shape[1], self.shape[2]);
            if slice >= nz || y >= ny || x >= nx {
                return None;
            }
            (slice * ny + y) * nx + x
        } else {
            let (nx, ny, nz) = (self.shape[0], self.shape[1], self.shape[2]);
            if x >= nx || y >= ny || slice >= nz {
                return None;
            }
            (x * ny + y) * nz + slice
        };
        self.component(name).map(|c| c.values[idx])
    }

    /// Rounded pixel position clamped to validity: `None` when the cursor is
    /// outside the strict array interior `(-0.5, n - 0.5)`.
    pub fn rounded_interior(&self, pos: DVec2) -> Option<(usize, usize)> {
        let (ny, nx) = match self.shape.len() {
            2 => (self.shape[0], self.shape[1]),
            3 => {
                if self.meta.spectral_axis_index.unwrap_or(2) == 0 {
                    (self.shape[1], self.shape[2])
                } else {
                    (self.shape[1], self.shape[0])
                }
            }
            _ => return None,
        };
        let inside = |v: f64, n: usize| v > -0.5 && v < n as f64 - 0.5;
        if inside(pos.x, nx) && inside(pos.y, ny) {
            Some((pos.x.round() as usize, pos.y.round() as usize))
        } else {
            None
        }
    }

    /// (nx, ny) of the image plane, regardless of dimensionality.
    pub fn plane_shape(&self) -> Option<(usize, usize)> {
        match self.shape.len() {
            2 => Some((self.shape[1], self.shape[0])),
            3 => {
                if self.meta.spectral_axis_index.unwrap_or(2) == 0 {
                    Some((self.shape[2], self.shape[1]))
                } else {
                    Some((self.shape[0], self.shape[1]))
                }
            }
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Pixels,
    Wcs,
}

/// A recorded alignment between two datasets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExternalLink {
    pub data1: String,
    pub data2: String,
    pub kind: LinkKind,
}

#[derive(Default)]
pub struct DataCollection {
    datasets: Vec<Dataset>,
    by_label: HashMap<String, usize>,
    versions: HashMap<String, u64>,
    pub external_links: Vec<ExternalLink>,
}

impl DataCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a dataset, replacing any existing one with the same label.
    /// Replacement bumps the label's version so cached products keyed on
    /// the old version go stale.
    pub fn insert(&mut self, dataset: Dataset) {
        let label = dataset.label.clone();
        match self.by_label.get(&label) {
            Some(&idx) => {
                self.datasets[idx] = dataset;
                *self.versions.entry(label).or_insert(0) += 1;
            }
            None => {
                self.by_label.insert(label.clone(), self.datasets.len());
                self.versions.insert(label, 0);
                self.datasets.push(dataset);
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&Dataset> {
        self.by_label.get(label).map(|&idx| &self.datasets[idx])
    }

    pub fn version(&self, label: &str) -> u64 {
        self.versions.get(label).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dataset> {
        self.datasets.iter()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn link(&mut self, data1: &str, data2: &str, kind: LinkKind) {
        self.external_links.push(ExternalLink {
            data1: data1.to_string(),
            data2: data2.to_string(),
            kind,
        });
    }

    /// Finds the link joining `a` and `b`, in either direction.
    pub fn find_link(&self, a: &str, b: &str) -> Option<&ExternalLink> {
        self.external_links.iter().find(|l| {
            (l.data1 == a && l.data2 == b) || (l.data1 == b && l.data2 == a)
        })
    }

    /// Labels of datasets derived from `parent_label` by a plugin.
    pub fn assoc_children(&self, parent_label: &str) -> Vec<&Dataset> {
        self.datasets
            .iter()
            .filter(|d| d.meta.parent.as_deref() == Some(parent_label))
            .collect()
    }
}
