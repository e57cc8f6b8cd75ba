//! Viewers and their per-layer state.
//!
//! A viewer is a view onto some subset of the data collection: which
//! layers it draws, which dataset defines its coordinate frame, and the
//! current zoom box. Image viewers additionally support blinking (cycling
//! layer visibility) and resolve cursor positions through the alignment
//! between each layer and the reference frame.

use common::id_type;
use glam::DVec2;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;
use tracing::debug;

use crate::data::{DataCollection, Dataset, LinkKind};
use crate::events::Hub;
use crate::units::Unit;
use crate::wcs::{pixel_to_pixel, WcsError};

id_type!(ViewerId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViewerKind {
    /// 2-D image viewer whose layers may be aligned by pixels or WCS.
    AlignedImage,
    /// One slice of a spectral cube.
    CubeSlice,
    /// One slice of a ramp (group axis instead of spectral).
    RampSlice,
    /// Plain 2-D image viewer, single frame.
    SimpleImage,
    /// 2-D spectrum: wavelength along x, spatial pixel along y.
    Spectrum2d,
    /// 1-D extracted spectrum profile.
    SpectrumProfile,
    /// 1-D ramp profile, sample index along x.
    RampProfile,
}

impl ViewerKind {
    pub fn is_profile(&self) -> bool {
        matches!(self, ViewerKind::SpectrumProfile | ViewerKind::RampProfile)
    }

    pub fn is_image(&self) -> bool {
        !self.is_profile()
    }

    /// Whether this viewer shows a cursor marker of its own.
    pub fn has_marker(&self) -> bool {
        matches!(
            self,
            ViewerKind::Spectrum2d | ViewerKind::SpectrumProfile | ViewerKind::RampProfile
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayerState {
    pub label: String,
    pub visible: bool,
    /// Component drawn for this layer.
    pub attribute: String,
    #[serde(default)]
    pub is_subset: bool,
}

impl LayerState {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            visible: true,
            attribute: "flux".to_string(),
            is_subset: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ViewerState {
    /// Draw order, bottom first.
    pub layers: Vec<LayerState>,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    /// Label of the dataset defining the viewer's coordinate frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_data: Option<String>,
    /// Current cube slice, for slice viewers.
    #[serde(default)]
    pub slice: usize,
    /// Display units for profile and 2-D spectrum viewers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_display_unit: Option<Unit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_display_unit: Option<Unit>,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            x_min: 0.0,
            x_max: 1.0,
            y_min: 0.0,
            y_max: 1.0,
            reference_data: None,
            slice: 0,
            x_display_unit: None,
            y_display_unit: None,
        }
    }
}

/// How a layer is aligned to the viewer's reference frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum AlignBy {
    #[strum(serialize = "pixels")]
    Pixels,
    #[strum(serialize = "wcs")]
    Wcs,
    #[strum(serialize = "self")]
    SelfData,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlignError {
    #[error("viewer has no reference data")]
    NoReferenceData,
    #[error("no link found between {data} and reference {reference}")]
    LinkNotFound { data: String, reference: String },
}

/// A cursor position resolved into a layer's own pixel frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RealXy {
    pub pos: DVec2,
    /// World coordinates can be derived for this position.
    pub coords_status: bool,
    /// Position fell outside the reference WCS's valid region.
    pub unreliable_world: bool,
    /// Converted pixel fell outside the layer WCS's valid region.
    pub unreliable_pixel: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Viewer {
    pub id: ViewerId,
    /// Human-readable reference, e.g. `image-0`.
    pub reference: String,
    pub kind: ViewerKind,
    pub state: ViewerState,
    /// References of viewers whose cursor this viewer mirrors.
    #[serde(default)]
    pub matched: Vec<String>,
}

impl Viewer {
    pub fn new(reference: &str, kind: ViewerKind) -> Self {
        Self {
            id: ViewerId::unique(),
            reference: reference.to_string(),
            kind,
            state: ViewerState::default(),
            matched: Vec::new(),
        }
    }

    pub fn add_layer(&mut self, layer: LayerState) {
        if self.state.reference_data.is_none() && !layer.is_subset {
            self.state.reference_data = Some(layer.label.clone());
        }
        self.state.layers.push(layer);
    }

    pub fn layer(&self, label: &str) -> Option<&LayerState> {
        self.state.layers.iter().find(|l| l.label == label)
    }

    /// Topmost visible non-subset image layer backed by 2-D or 3-D data.
    pub fn active_image_layer<'a>(&'a self, dc: &DataCollection) -> Option<&'a LayerState> {
        self.state.layers.iter().rev().find(|layer| {
            if !layer.visible || layer.is_subset {
                return false;
            }
            dc.get(&layer.label)
                .is_some_and(|d| !d.meta.wcs_only && (2..=3).contains(&d.ndim()))
        })
    }

    fn blinkable_indices(&self, dc: &DataCollection) -> Vec<usize> {
        self.state
            .layers
            .iter()
            .enumerate()
            .filter(|(_, layer)| {
                !layer.is_subset
                    && dc
                        .get(&layer.label)
                        .is_some_and(|d| !d.meta.wcs_only && (2..=3).contains(&d.ndim()))
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Cycles layer visibility by one step, anchored on the topmost
    /// currently-visible blinkable layer. Warns without touching state
    /// when there is nothing to cycle.
    pub fn blink_once(&mut self, dc: &DataCollection, hub: &mut Hub, reversed: bool) {
        let blinkable = self.blinkable_indices(dc);
        if blinkable.len() <= 1 {
            hub.warn(format!(
                "Nothing to blink in viewer {}; only {} layer(s)",
                self.reference,
                blinkable.len()
            ));
            return;
        }

        let Some(anchor) = blinkable
            .iter()
            .rposition(|&i| self.state.layers[i].visible)
        else {
            hub.warn("No visible layer to blink");
            return;
        };
        let next_pos = if reversed {
            (anchor + blinkable.len() - 1) % blinkable.len()
        } else {
            (anchor + 1) % blinkable.len()
        };
        let next = blinkable[next_pos];

        for &i in &blinkable {
            self.state.layers[i].visible = i == next;
        }
        debug!(
            viewer = %self.reference,
            layer = %self.state.layers[next].label,
            "blinked"
        );
    }

    /// Key handling for image viewers: `b` blinks forward, `B` backward.
    pub fn handle_key(&mut self, dc: &DataCollection, hub: &mut Hub, key: char) {
        match key {
            'b' => self.blink_once(dc, hub, false),
            'B' => self.blink_once(dc, hub, true),
            _ => {}
        }
    }

    /// How `data_label` is aligned to this viewer's reference frame.
    pub fn get_alignment_method(
        &self,
        dc: &DataCollection,
        data_label: &str,
    ) -> Result<AlignBy, AlignError> {
        let reference = self
            .state
            .reference_data
            .as_deref()
            .ok_or(AlignError::NoReferenceData)?;
        if data_label == reference {
            return Ok(AlignBy::SelfData);
        }
        match dc.find_link(data_label, reference) {
            Some(link) => Ok(match link.kind {
                LinkKind::Pixels => AlignBy::Pixels,
                LinkKind::Wcs => AlignBy::Wcs,
            }),
            None => Err(AlignError::LinkNotFound {
                data: data_label.to_string(),
                reference: reference.to_string(),
            }),
        }
    }

    /// Resolves a cursor position, given in the viewer's reference frame,
    /// into `dataset`'s own pixel frame.
    ///
    /// WCS-aligned layers go through the sky: reference pixel to sky to
    /// layer pixel. A converted position outside the layer's bounding box
    /// sets both unreliability flags and keeps (x, y) in the reference
    /// frame, so the caller can extrapolate against the reference WCS.
    /// Pixel- and self-aligned layers share the reference frame; the
    /// position passes through and the layer's own bounding box decides
    /// the world flag.
    ///
    /// `reverse` converts an image-frame position back to the reference
    /// frame without any reliability computation.
    pub fn get_real_xy(
        &self,
        dc: &DataCollection,
        dataset: &Dataset,
        pos: DVec2,
        reverse: bool,
    ) -> Result<RealXy, WcsError> {
        let mut real = RealXy {
            pos,
            coords_status: false,
            unreliable_world: false,
            unreliable_pixel: false,
        };
        if dataset.wcs.as_ref().and_then(|w| w.celestial()).is_none() {
            return Ok(real);
        }
        // an unresolvable linkage shows no coordinates it cannot justify
        let Ok(align) = self.get_alignment_method(dc, &dataset.label) else {
            return Ok(real);
        };
        real.coords_status = true;

        if align == AlignBy::Wcs {
            let ref_wcs = self
                .state
                .reference_data
                .as_deref()
                .and_then(|label| dc.get(label))
                .and_then(|d| d.wcs.as_ref())
                .and_then(|w| w.celestial())
                .ok_or(WcsError::NotCelestial)?;
            let img_wcs = dataset
                .wcs
                .as_ref()
                .and_then(|w| w.celestial())
                .ok_or(WcsError::NotCelestial)?;

            if reverse {
                real.pos = pixel_to_pixel(img_wcs, ref_wcs, pos)?;
            } else {
                let converted = pixel_to_pixel(ref_wcs, img_wcs, pos)?;
                if dataset
                    .wcs
                    .as_ref()
                    .is_some_and(|w| w.outside_bounding_box(converted))
                {
                    real.unreliable_world = true;
                    real.unreliable_pixel = true;
                } else {
                    real.pos = converted;
                }
            }
        } else {
            real.unreliable_world = dataset
                .wcs
                .as_ref()
                .is_some_and(|w| w.outside_bounding_box(pos));
        }
        Ok(real)
    }

    /// Corners of the current zoom box in `dataset`'s pixel frame,
    /// clockwise from the lower-left.
    pub fn zoom_limits(
        &self,
        dc: &DataCollection,
        dataset: &Dataset,
    ) -> Result<[DVec2; 4], WcsError> {
        let s = &self.state;
        let corners = [
            DVec2::new(s.x_min, s.y_min),
            DVec2::new(s.x_min, s.y_max),
            DVec2::new(s.x_max, s.y_max),
            DVec2::new(s.x_max, s.y_min),
        ];
        if self.get_alignment_method(dc, &dataset.label) == Ok(AlignBy::Wcs) {
            let ref_wcs = self
                .state
                .reference_data
                .as_deref()
                .and_then(|label| dc.get(label))
                .and_then(|d| d.wcs.as_ref())
                .and_then(|w| w.celestial())
                .ok_or(WcsError::NotCelestial)?;
            let img_wcs = dataset
                .wcs
                .as_ref()
                .and_then(|w| w.celestial())
                .ok_or(WcsError::NotCelestial)?;
            let mut mapped = [DVec2::ZERO; 4];
            for (dst, src) in mapped.iter_mut().zip(corners) {
                *dst = pixel_to_pixel(ref_wcs, img_wcs, src)?;
            }
            Ok(mapped)
        } else {
            Ok(corners)
        }
    }
}

#[derive(Default)]
pub struct ViewerStore {
    viewers: Vec<Viewer>,
    by_reference: HashMap<String, usize>,
}

impl ViewerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, viewer: Viewer) {
        self.by_reference
            .insert(viewer.reference.clone(), self.viewers.len());
        self.viewers.push(viewer);
    }

    pub fn get(&self, reference: &str) -> Option<&Viewer> {
        self.by_reference.get(reference).map(|&i| &self.viewers[i])
    }

    pub fn get_mut(&mut self, reference: &str) -> Option<&mut Viewer> {
        self.by_reference
            .get(reference)
            .map(|&i| &mut self.viewers[i])
    }

    pub fn by_id(&self, id: ViewerId) -> Option<&Viewer> {
        self.viewers.iter().find(|v| v.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Viewer> {
        self.viewers.iter()
    }

    /// Registers `partner` as a matched viewer of `reference`.
    pub fn register_matched(&mut self, reference: &str, partner: &str) {
        if let Some(viewer) = self.get_mut(reference) {
            let partner = partner.to_string();
            if !viewer.matched.contains(&partner) {
                viewer.matched.push(partner);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Component, Dataset, DatasetId, DatasetMeta};
    use crate::events::HubEvent;
    use crate::wcs::{BoundingBox, CelestialWcs, DataWcs};
    use common::float_ext::FloatExt;

    fn image(label: &str, wcs: Option<CelestialWcs>) -> Dataset {
        Dataset {
            id: DatasetId::unique(),
            label: label.to_string(),
            shape: vec![8, 8],
            components: vec![Component {
                name: "flux".to_string(),
                unit: None,
                values: vec![0.0; 64],
            }],
            wcs: wcs.map(DataWcs::Celestial),
            meta: DatasetMeta::default(),
        }
    }

    fn wcs_at(crpix: DVec2) -> CelestialWcs {
        CelestialWcs::from_scale_rotation(crpix, DVec2::new(180.0, 0.0), 1.0, 0.0)
    }

    fn three_layer_viewer(dc: &mut DataCollection) -> Viewer {
        let mut viewer = Viewer::new("image-0", ViewerKind::AlignedImage);
        for label in ["a", "b", "c"] {
            dc.insert(image(label, None));
            viewer.add_layer(LayerState::new(label));
        }
        viewer
    }

    #[test]
    fn blink_cycles_forward_and_backward() {
        let mut dc = DataCollection::new();
        let mut hub = Hub::new();
        let mut viewer = three_layer_viewer(&mut dc);

        // only the middle layer visible
        viewer.state.layers[0].visible = false;
        viewer.state.layers[2].visible = false;

        viewer.blink_once(&dc, &mut hub, false);
        let visible: Vec<bool> = viewer.state.layers.iter().map(|l| l.visible).collect();
        assert_eq!(visible, vec![false, false, true]);

        viewer.blink_once(&dc, &mut hub, false);
        let visible: Vec<bool> = viewer.state.layers.iter().map(|l| l.visible).collect();
        assert_eq!(visible, vec![true, false, false]);

        viewer.blink_once(&dc, &mut hub, true);
        let visible: Vec<bool> = viewer.state.layers.iter().map(|l| l.visible).collect();
        assert_eq!(visible, vec![false, false, true]);

        assert!(hub.pending().is_empty());
    }

    #[test]
    fn blink_with_all_visible_anchors_on_topmost() {
        let mut dc = DataCollection::new();
        let mut hub = Hub::new();
        let mut viewer = three_layer_viewer(&mut dc);

        viewer.blink_once(&dc, &mut hub, false);
        let visible: Vec<bool> = viewer.state.layers.iter().map(|l| l.visible).collect();
        assert_eq!(visible, vec![true, false, false]);
    }

    #[test]
    fn blink_with_none_visible_warns_without_state_change() {
        let mut dc = DataCollection::new();
        let mut hub = Hub::new();
        let mut viewer = three_layer_viewer(&mut dc);
        for layer in &mut viewer.state.layers {
            layer.visible = false;
        }

        viewer.blink_once(&dc, &mut hub, false);
        let visible: Vec<bool> = viewer.state.layers.iter().map(|l| l.visible).collect();
        assert_eq!(visible, vec![false, false, false]);
        let events = hub.drain();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            HubEvent::Warning { text } if text == "No visible layer to blink"
        ));
    }

    #[test]
    fn blink_single_layer_warns() {
        let mut dc = DataCollection::new();
        let mut hub = Hub::new();
        dc.insert(image("only", None));
        let mut viewer = Viewer::new("image-0", ViewerKind::AlignedImage);
        viewer.add_layer(LayerState::new("only"));

        viewer.handle_key(&dc, &mut hub, 'b');
        assert!(viewer.state.layers[0].visible);
        let events = hub.drain();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            HubEvent::Warning { text } if text.contains("Nothing to blink")
        ));
    }

    #[test]
    fn alignment_method_lookup() {
        let mut dc = DataCollection::new();
        dc.insert(image("ref", None));
        dc.insert(image("other", None));
        dc.link("other", "ref", LinkKind::Pixels);

        let mut viewer = Viewer::new("image-0", ViewerKind::AlignedImage);
        viewer.add_layer(LayerState::new("ref"));
        viewer.add_layer(LayerState::new("other"));

        assert_eq!(
            viewer.get_alignment_method(&dc, "ref"),
            Ok(AlignBy::SelfData)
        );
        assert_eq!(
            viewer.get_alignment_method(&dc, "other"),
            Ok(AlignBy::Pixels)
        );
        assert!(matches!(
            viewer.get_alignment_method(&dc, "unlinked"),
            Err(AlignError::LinkNotFound { .. })
        ));
        assert_eq!(AlignBy::SelfData.to_string(), "self");
    }

    #[test]
    fn real_xy_identity_for_pixel_alignment() -> anyhow::Result<()> {
        let mut dc = DataCollection::new();
        dc.insert(image("ref", Some(wcs_at(DVec2::new(4.0, 4.0)))));
        dc.insert(image("other", None));
        dc.link("other", "ref", LinkKind::Pixels);

        let mut viewer = Viewer::new("image-0", ViewerKind::AlignedImage);
        viewer.add_layer(LayerState::new("ref"));
        viewer.add_layer(LayerState::new("other"));

        let pos = DVec2::new(3.0, 5.0);
        let with_wcs = viewer.get_real_xy(&dc, dc.get("ref").unwrap(), pos, false)?;
        assert_eq!(with_wcs.pos, pos);
        assert!(with_wcs.coords_status);
        assert!(!with_wcs.unreliable_pixel);

        // pixel-linked layer without its own WCS: identity, no world coords
        let no_wcs = viewer.get_real_xy(&dc, dc.get("other").unwrap(), pos, false)?;
        assert_eq!(no_wcs.pos, pos);
        assert!(!no_wcs.coords_status);
        Ok(())
    }

    #[test]
    fn real_xy_through_wcs_alignment() -> anyhow::Result<()> {
        let mut dc = DataCollection::new();
        // same pointing, reference pixel offset by (2, 1)
        dc.insert(image("ref", Some(wcs_at(DVec2::new(4.0, 4.0)))));
        dc.insert(image("img", Some(wcs_at(DVec2::new(6.0, 5.0)))));
        dc.link("img", "ref", LinkKind::Wcs);

        let mut viewer = Viewer::new("image-0", ViewerKind::AlignedImage);
        viewer.add_layer(LayerState::new("ref"));
        viewer.add_layer(LayerState::new("img"));

        let real = viewer.get_real_xy(&dc, dc.get("img").unwrap(), DVec2::new(4.0, 4.0), false)?;
        assert!(real.coords_status);
        assert!(real.pos.x.approximately_eq_eps(6.0, 1e-8));
        assert!(real.pos.y.approximately_eq_eps(5.0, 1e-8));
        assert!(!real.unreliable_world);
        assert!(!real.unreliable_pixel);
        Ok(())
    }

    #[test]
    fn real_xy_reverse_round_trips() -> anyhow::Result<()> {
        let mut dc = DataCollection::new();
        dc.insert(image("ref", Some(wcs_at(DVec2::new(4.0, 4.0)))));
        dc.insert(image("img", Some(wcs_at(DVec2::new(6.0, 5.0)))));
        dc.link("img", "ref", LinkKind::Wcs);

        let mut viewer = Viewer::new("image-0", ViewerKind::AlignedImage);
        viewer.add_layer(LayerState::new("ref"));
        viewer.add_layer(LayerState::new("img"));

        let pos = DVec2::new(3.0, 2.0);
        let img = dc.get("img").unwrap();
        let forward = viewer.get_real_xy(&dc, img, pos, false)?;
        let back = viewer.get_real_xy(&dc, img, forward.pos, true)?;
        assert!(back.pos.x.approximately_eq_eps(pos.x, 1e-8));
        assert!(back.pos.y.approximately_eq_eps(pos.y, 1e-8));
        assert!(!back.unreliable_world);
        assert!(!back.unreliable_pixel);
        Ok(())
    }

    #[test]
    fn real_xy_outside_bounding_box_keeps_reference_frame() -> anyhow::Result<()> {
        let bbox = BoundingBox {
            x_min: -0.5,
            x_max: 7.5,
            y_min: -0.5,
            y_max: 7.5,
        };
        let mut dc = DataCollection::new();
        dc.insert(image(
            "ref",
            Some(wcs_at(DVec2::new(4.0, 4.0)).with_bounding_box(bbox)),
        ));
        dc.insert(image(
            "img",
            Some(wcs_at(DVec2::new(50.0, 4.0)).with_bounding_box(bbox)),
        ));
        dc.link("img", "ref", LinkKind::Wcs);

        let mut viewer = Viewer::new("image-0", ViewerKind::AlignedImage);
        viewer.add_layer(LayerState::new("ref"));
        viewer.add_layer(LayerState::new("img"));

        // the converted pixel (~50, 4) falls outside img's box: both flags
        // set and the position stays in the reference frame
        let pos = DVec2::new(4.0, 4.0);
        let real = viewer.get_real_xy(&dc, dc.get("img").unwrap(), pos, false)?;
        assert!(real.coords_status);
        assert!(real.unreliable_world);
        assert!(real.unreliable_pixel);
        assert_eq!(real.pos, pos);

        // a self-aligned layer checks its own box for the world flag
        let outside = viewer.get_real_xy(&dc, dc.get("ref").unwrap(), DVec2::new(20.0, 4.0), false)?;
        assert!(outside.unreliable_world);
        assert!(!outside.unreliable_pixel);
        Ok(())
    }

    #[test]
    fn real_xy_unlinked_layer_reports_no_coords() -> anyhow::Result<()> {
        let mut dc = DataCollection::new();
        dc.insert(image("ref", Some(wcs_at(DVec2::new(4.0, 4.0)))));
        // celestial WCS, but no link to the reference
        dc.insert(image("stray", Some(wcs_at(DVec2::new(6.0, 5.0)))));

        let mut viewer = Viewer::new("image-0", ViewerKind::AlignedImage);
        viewer.add_layer(LayerState::new("ref"));
        viewer.add_layer(LayerState::new("stray"));

        let pos = DVec2::new(3.0, 3.0);
        let real = viewer.get_real_xy(&dc, dc.get("stray").unwrap(), pos, false)?;
        assert!(!real.coords_status);
        assert_eq!(real.pos, pos);
        Ok(())
    }

    #[test]
    fn active_layer_skips_hidden_and_subsets() {
        let mut dc = DataCollection::new();
        let mut viewer = three_layer_viewer(&mut dc);
        let mut subset = LayerState::new("a");
        subset.label = "subset 1".to_string();
        subset.is_subset = true;
        dc.insert(image("subset 1", None));
        viewer.add_layer(subset);

        assert_eq!(viewer.active_image_layer(&dc).unwrap().label, "c");
        viewer.state.layers[2].visible = false;
        assert_eq!(viewer.active_image_layer(&dc).unwrap().label, "b");
    }

    #[test]
    fn zoom_limits_pass_through_without_wcs_alignment() -> anyhow::Result<()> {
        let mut dc = DataCollection::new();
        dc.insert(image("ref", None));
        let mut viewer = Viewer::new("image-0", ViewerKind::SimpleImage);
        viewer.add_layer(LayerState::new("ref"));
        viewer.state.x_min = 1.0;
        viewer.state.x_max = 5.0;
        viewer.state.y_min = 2.0;
        viewer.state.y_max = 6.0;

        let corners = viewer.zoom_limits(&dc, dc.get("ref").unwrap())?;
        assert_eq!(corners[0], DVec2::new(1.0, 2.0));
        assert_eq!(corners[2], DVec2::new(5.0, 6.0));
        Ok(())
    }

    #[test]
    fn matched_registration_dedupes() {
        let mut store = ViewerStore::new();
        store.insert(Viewer::new("spectrum-0", ViewerKind::SpectrumProfile));
        store.register_matched("spectrum-0", "spectrum-2d-0");
        store.register_matched("spectrum-0", "spectrum-2d-0");
        assert_eq!(store.get("spectrum-0").unwrap().matched.len(), 1);
    }
}
