//! Extracted spectra and their cache.
//!
//! Profile viewers read one [`Spectrum`] per layer. Extracting one from a
//! cube collapses the spatial axes, which is expensive enough to cache.
//! Entries are keyed by `(dataset id, collection version)`, so replacing
//! a dataset under the same label naturally misses the stale entry.

use hashbrown::HashMap;
use tracing::debug;

use crate::data::{DataCollection, Dataset, DatasetId};
use crate::units::Unit;

#[derive(Clone, Debug, PartialEq)]
pub struct Spectrum {
    pub spectral: Vec<f64>,
    pub spectral_unit: Unit,
    pub flux: Vec<f64>,
    pub flux_unit: Unit,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.spectral.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectral.is_empty()
    }
}

/// Pulls a 1-D spectrum out of a dataset.
///
/// 1-D data passes through; 3-D cubes collapse to a mean over the spatial
/// plane per slice. Returns `None` when the dataset has no usable spectral
/// axis or flux component.
pub fn extract_profile(dataset: &Dataset) -> Option<Spectrum> {
    let cube_wcs = dataset.wcs.as_ref()?.as_cube()?;
    let component = dataset.main_component()?;
    let flux_unit = component.unit.unwrap_or(Unit::Dimensionless);

    match dataset.ndim() {
        1 => {
            let n = dataset.shape[0];
            let spectral = (0..n)
                .map(|i| cube_wcs.spectral.world_value(i as f64).value)
                .collect();
            Some(Spectrum {
                spectral,
                spectral_unit: cube_wcs.spectral.unit,
                flux: component.values.clone(),
                flux_unit,
            })
        }
        3 => {
            let sai = dataset.meta.spectral_axis_index.unwrap_or(2);
            let nz = if sai == 0 {
                dataset.shape[0]
            } else {
                dataset.shape[2]
            };
            let (nx, ny) = dataset.plane_shape()?;
            let mut flux = Vec::with_capacity(nz);
            for slice in 0..nz {
                let mut sum = 0.0;
                let mut count = 0usize;
                for y in 0..ny {
                    for x in 0..nx {
                        if let Some(v) = dataset.value_3d(&component.name, x, y, slice) {
                            if v.is_finite() {
                                sum += v;
                                count += 1;
                            }
                        }
                    }
                }
                flux.push(if count > 0 {
                    sum / count as f64
                } else {
                    f64::NAN
                });
            }
            let spectral = (0..nz)
                .map(|i| cube_wcs.spectral.world_value(i as f64).value)
                .collect();
            Some(Spectrum {
                spectral,
                spectral_unit: cube_wcs.spectral.unit,
                flux,
                flux_unit,
            })
        }
        _ => None,
    }
}

#[derive(Default)]
pub struct ExtractionCache {
    entries: HashMap<(DatasetId, u64), Spectrum>,
}

impl ExtractionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached spectrum for the dataset at its current collection version,
    /// extracting on miss.
    pub fn get_or_extract(
        &mut self,
        collection: &DataCollection,
        dataset: &Dataset,
    ) -> Option<&Spectrum> {
        let key = (dataset.id, collection.version(&dataset.label));
        if !self.entries.contains_key(&key) {
            let spectrum = extract_profile(dataset)?;
            debug!(label = %dataset.label, samples = spectrum.len(), "extracted profile");
            self.entries.insert(key, spectrum);
        }
        self.entries.get(&key)
    }

    /// Drops all cached products of a dataset, every version.
    pub fn invalidate(&mut self, id: DatasetId) {
        self.entries.retain(|(cached_id, _), _| *cached_id != id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Component, DatasetMeta};
    use crate::units::{Prefix, SpectralBase, Unit};
    use crate::wcs::{CelestialWcs, CubeWcs, DataWcs, SpectralAxis};
    use common::float_ext::FloatExt;
    use glam::DVec2;

    fn cube(label: &str) -> Dataset {
        // shape [nx=2, ny=2, nz=3], spectral axis last
        let celestial = CelestialWcs::from_scale_rotation(
            DVec2::ZERO,
            DVec2::new(150.0, 2.0),
            1.0,
            0.0,
        );
        Dataset {
            id: DatasetId::unique(),
            label: label.to_string(),
            shape: vec![2, 2, 3],
            components: vec![Component {
                name: "flux".to_string(),
                unit: Some(Unit::jansky(Prefix::Micro)),
                values: (0..12).map(|i| i as f64).collect(),
            }],
            wcs: Some(DataWcs::Cube(CubeWcs {
                celestial,
                spectral: SpectralAxis::linear(5000.0, 100.0, SpectralBase::Angstrom),
                spectral_axis_index: 2,
            })),
            meta: DatasetMeta {
                spectral_axis_index: Some(2),
                ..Default::default()
            },
        }
    }

    #[test]
    fn cube_collapses_to_spatial_mean() -> anyhow::Result<()> {
        let data = cube("c");
        let spectrum = extract_profile(&data).unwrap();
        assert_eq!(spectrum.len(), 3);
        // slice 0 gathers values at indices 0, 3, 6, 9 => mean 4.5
        assert!(spectrum.flux[0].approximately_eq(4.5));
        assert!(spectrum.flux[1].approximately_eq(5.5));
        assert!(spectrum.spectral[0].approximately_eq(5000.0));
        assert!(spectrum.spectral[2].approximately_eq(5200.0));
        assert_eq!(spectrum.flux_unit, Unit::jansky(Prefix::Micro));
        Ok(())
    }

    #[test]
    fn nan_samples_are_excluded_from_the_mean() {
        let mut data = cube("c");
        // poison one sample of slice 0
        data.components[0].values[0] = f64::NAN;
        let spectrum = extract_profile(&data).unwrap();
        // remaining slice-0 samples: 3, 6, 9 => mean 6
        assert!(spectrum.flux[0].approximately_eq(6.0));
    }

    #[test]
    fn cache_hits_same_version_misses_replacement() {
        let mut dc = DataCollection::new();
        let data = cube("c");
        let id = data.id;
        dc.insert(data.clone());

        let mut cache = ExtractionCache::new();
        assert!(cache.get_or_extract(&dc, dc.get("c").unwrap()).is_some());
        assert_eq!(cache.len(), 1);
        cache.get_or_extract(&dc, dc.get("c").unwrap());
        assert_eq!(cache.len(), 1);

        // replacing under the same label bumps the version, new entry
        dc.insert(data);
        cache.get_or_extract(&dc, dc.get("c").unwrap());
        assert_eq!(cache.len(), 2);

        cache.invalidate(id);
        assert!(cache.is_empty());
    }

    #[test]
    fn non_spectral_data_yields_none() {
        let data = Dataset {
            id: DatasetId::unique(),
            label: "img".to_string(),
            shape: vec![2, 2],
            components: vec![],
            wcs: None,
            meta: DatasetMeta::default(),
        };
        assert!(extract_profile(&data).is_none());
    }
}
