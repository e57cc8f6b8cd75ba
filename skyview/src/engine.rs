//! Cursor readout engine.
//!
//! [`CoordsInfo`] consumes cursor events from any viewer and maintains the
//! three-row text readout plus a versioned [`CursorSnapshot`] for plugin
//! consumers. Image viewers resolve the cursor through layer alignment and
//! WCS; profile viewers search the drawn spectra for the closest sample.

use glam::DVec2;
use tracing::debug;

use crate::cache::ExtractionCache;
use crate::compass::compass_state;
use crate::data::{DataCollection, Dataset};
use crate::events::{CursorEvent, CursorEventKind, Hub, HubEvent};
use crate::marks::{MarkRole, MarkShape, MarkStore};
use crate::snapshot::{fmt_sci, fmt_sci_signed, CursorSnapshot, DisplayRows, NBSP};
use crate::units::{convert, convert_array, Equivalencies, Quantity, Unit};
use crate::viewer::{LayerState, RealXy, Viewer, ViewerKind, ViewerStore};
use crate::wcs::DataWcs;

/// Which layer the readout resolves against.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DatasetSelect {
    /// Topmost visible layer wins.
    #[default]
    Auto,
    /// Readout disabled.
    NoneSelected,
    /// A specific layer by label; cleared readout when it is not visible.
    Manual(String),
}

/// Display-unit preferences, applied on top of each layer's native units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayUnits {
    pub spectral: Option<Unit>,
    pub flux: Option<Unit>,
    pub sb: Option<Unit>,
}

#[derive(Clone, Debug)]
struct Closest {
    label: String,
    idx: usize,
    sx: f64,
    sy: f64,
    x_unit: Unit,
    y_unit: Unit,
    parent_ndim: usize,
    dist: f64,
}

pub struct CoordsInfo {
    pub rows: DisplayRows,
    snapshot: CursorSnapshot,
    next_version: u64,
    pub dataset: DatasetSelect,
    pub display_units: DisplayUnits,
    pub marks: MarkStore,
    cache: ExtractionCache,
    last_cursor: Option<(String, DVec2)>,
    pub data_quality_enabled: bool,
}

impl Default for CoordsInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordsInfo {
    pub fn new() -> Self {
        Self {
            rows: DisplayRows::default(),
            snapshot: CursorSnapshot::empty(0),
            next_version: 1,
            dataset: DatasetSelect::Auto,
            display_units: DisplayUnits::default(),
            marks: MarkStore::new(),
            cache: ExtractionCache::new(),
            last_cursor: None,
            data_quality_enabled: false,
        }
    }

    pub fn snapshot(&self) -> &CursorSnapshot {
        &self.snapshot
    }

    pub fn invalidate_cache(&mut self, id: crate::data::DatasetId) {
        self.cache.invalidate(id);
    }

    /// Entry point for all viewer cursor events.
    pub fn handle_event(
        &mut self,
        dc: &DataCollection,
        viewers: &mut ViewerStore,
        hub: &mut Hub,
        viewer_ref: &str,
        event: &CursorEvent,
    ) {
        match event.kind {
            CursorEventKind::MouseLeave | CursorEventKind::MouseEnter => {
                self.clear_event(viewers, hub, viewer_ref);
            }
            CursorEventKind::MouseMove => {
                // out-of-bounds coordinates clear just like leaving
                let (Some(x), Some(y)) = (event.x, event.y) else {
                    self.clear_event(viewers, hub, viewer_ref);
                    return;
                };
                if let Some(viewer) = viewers.get(viewer_ref) {
                    hub.publish(HubEvent::ToolbarEnabled {
                        viewer: viewer.id,
                        enabled: false,
                    });
                }
                let pos = DVec2::new(x, y);
                self.last_cursor = Some((viewer_ref.to_string(), pos));
                self.update_display(dc, viewers, hub, viewer_ref, pos, true);
            }
            CursorEventKind::KeyPress => {
                let Some(key) = event.key else { return };
                let blinked = matches!(key, 'b' | 'B');
                if let Some(viewer) = viewers.get_mut(viewer_ref) {
                    if viewer.kind.is_image() {
                        viewer.handle_key(dc, hub, key);
                    }
                }
                if blinked {
                    if let Some(viewer) = viewers.get(viewer_ref) {
                        if viewer.kind.is_image() {
                            self.update_compass(dc, viewer, hub);
                        }
                    }
                }
                // the readout tracks the newly visible layer immediately
                if let Some((last_ref, pos)) = self.last_cursor.clone() {
                    if last_ref == viewer_ref {
                        self.update_display(dc, viewers, hub, viewer_ref, pos, false);
                    }
                }
            }
        }
    }

    /// Refreshes the readout after layer visibility or content changed,
    /// using the last known cursor position. Marker motion is suppressed,
    /// matching a refresh that no mouse event triggered.
    pub fn layers_updated(
        &mut self,
        dc: &DataCollection,
        viewers: &ViewerStore,
        hub: &mut Hub,
    ) {
        if let Some((viewer_ref, pos)) = self.last_cursor.clone() {
            self.update_display(dc, viewers, hub, &viewer_ref, pos, false);
        }
    }

    pub fn reset_coords_display(&mut self) {
        self.rows.clear_all();
        self.snapshot = CursorSnapshot::empty(self.bump_version());
    }

    /// Cursor left the viewer, or never produced valid coordinates. The
    /// readout clears, marks hide, and the toolbar buttons come back.
    fn clear_event(&mut self, viewers: &ViewerStore, hub: &mut Hub, viewer_ref: &str) {
        if let Some(viewer) = viewers.get(viewer_ref) {
            hub.publish(HubEvent::ToolbarEnabled {
                viewer: viewer.id,
                enabled: true,
            });
            self.hide_viewer_marks(viewers, viewer.id, &viewer.matched.clone());
        }
        self.last_cursor = None;
        self.reset_coords_display();
    }

    fn bump_version(&mut self) -> u64 {
        let v = self.next_version;
        self.next_version += 1;
        v
    }

    fn hide_viewer_marks(
        &mut self,
        viewers: &ViewerStore,
        id: crate::viewer::ViewerId,
        matched: &[String],
    ) {
        self.marks.hide(id, MarkRole::Primary);
        for partner_ref in matched {
            if let Some(partner) = viewers.get(partner_ref) {
                self.marks.hide(partner.id, MarkRole::Matched);
            }
        }
    }

    fn update_display(
        &mut self,
        dc: &DataCollection,
        viewers: &ViewerStore,
        hub: &mut Hub,
        viewer_ref: &str,
        pos: DVec2,
        is_mouse: bool,
    ) {
        let Some(viewer) = viewers.get(viewer_ref) else {
            self.reset_coords_display();
            return;
        };
        if viewer.kind.is_profile() {
            self.spectrum_viewer_update(dc, viewers, viewer, pos, is_mouse);
        } else {
            self.image_viewer_update(dc, viewers, hub, viewer, pos, is_mouse);
        }
    }

    /// Publishes compass state for the viewer's active layer, or a clear
    /// when it has none.
    pub fn update_compass(&self, dc: &DataCollection, viewer: &Viewer, hub: &mut Hub) {
        let active = viewer
            .active_image_layer(dc)
            .and_then(|layer| dc.get(&layer.label));
        let Some(dataset) = active else {
            hub.publish(HubEvent::CompassClear { viewer: viewer.id });
            return;
        };
        match viewer
            .zoom_limits(dc, dataset)
            .and_then(|zoom| compass_state(dataset, zoom))
        {
            Ok(state) => hub.publish(HubEvent::CompassUpdate {
                viewer: viewer.id,
                state,
            }),
            Err(err) => {
                debug!(viewer = %viewer.reference, %err, "compass update failed");
                hub.publish(HubEvent::CompassClear { viewer: viewer.id });
            }
        }
    }

    fn select_layer<'a>(&self, dc: &DataCollection, viewer: &'a Viewer) -> Option<&'a LayerState> {
        match &self.dataset {
            DatasetSelect::Auto => viewer.active_image_layer(dc),
            DatasetSelect::NoneSelected => None,
            DatasetSelect::Manual(label) => viewer
                .layer(label)
                .filter(|l| l.visible && !l.is_subset)
                .filter(|l| dc.get(&l.label).is_some_and(|d| !d.meta.wcs_only)),
        }
    }

    fn image_viewer_update(
        &mut self,
        dc: &DataCollection,
        viewers: &ViewerStore,
        hub: &mut Hub,
        viewer: &Viewer,
        pos: DVec2,
        is_mouse: bool,
    ) {
        self.rows.clear_all();
        let mut snap = CursorSnapshot::empty(self.bump_version());
        snap.axes_x = Some(pos.x);
        snap.axes_x_unit = Some("pix".to_string());
        snap.axes_y = Some(pos.y);
        snap.axes_y_unit = Some("pix".to_string());

        let Some(layer) = self.select_layer(dc, viewer).cloned() else {
            // Readout disabled or the selection is unresolvable: the pixel
            // row still reads out against the viewer's bottom layer frame.
            let frame = viewer
                .state
                .layers
                .first()
                .map(|l| l.label.as_str())
                .or(viewer.state.reference_data.as_deref())
                .and_then(|label| dc.get(label));
            if let Some(frame) = frame {
                self.set_pixel_row(frame, pos, false);
                snap.pixel_x = Some(pos.x);
                snap.pixel_y = Some(pos.y);
                snap.pixel_unreliable = Some(false);
            }
            self.snapshot = snap;
            return;
        };
        // layer existence was checked during selection
        let Some(image) = dc.get(&layer.label) else {
            self.snapshot = snap;
            return;
        };

        let real = match viewer.get_real_xy(dc, image, pos, false) {
            Ok(real) => real,
            Err(err) => {
                debug!(layer = %layer.label, %err, "cursor resolution failed");
                RealXy {
                    pos,
                    coords_status: false,
                    unreliable_world: false,
                    unreliable_pixel: false,
                }
            }
        };

        snap.data_label = Some(layer.label.clone());
        snap.pixel_x = Some(real.pos.x);
        snap.pixel_y = Some(real.pos.y);
        snap.pixel_unreliable = Some(real.unreliable_pixel);

        self.set_pixel_row(image, real.pos, real.unreliable_pixel);

        match viewer.kind {
            // ramp viewers show no sky coordinates
            ViewerKind::RampSlice => {
                if image.ndim() == 3 {
                    snap.slice = Some(viewer.state.slice);
                }
            }
            ViewerKind::CubeSlice => {
                if let Some(wcs) = Self::cube_world_wcs(dc, image) {
                    self.set_world_rows(wcs, viewer, real, &mut snap);
                }
                if image.ndim() == 3 {
                    snap.slice = Some(viewer.state.slice);
                    if let Some(cube) =
                        Self::cube_world_wcs(dc, image).and_then(|w| w.as_cube())
                    {
                        let q =
                            self.to_display_spectral(cube.spectral_value(viewer.state.slice));
                        snap.spectral_axis = Some(q.value);
                        snap.spectral_axis_unit = Some(q.unit.to_string());
                    }
                }
            }
            _ => {
                if real.coords_status {
                    // outside the image's bounding box, extrapolate with
                    // the reference layer's WCS instead
                    let wcs = if real.unreliable_world || real.unreliable_pixel {
                        viewer
                            .state
                            .reference_data
                            .as_deref()
                            .and_then(|label| dc.get(label))
                            .and_then(|d| d.wcs.as_ref())
                    } else {
                        image.wcs.as_ref()
                    };
                    if let Some(wcs) = wcs {
                        self.set_world_rows(wcs, viewer, real, &mut snap);
                    }
                }
            }
        }

        if viewer.kind == ViewerKind::Spectrum2d {
            snap.spectral_axis = snap.axes_x;
            snap.spectral_axis_unit = snap.axes_x_unit.clone();
            snap.value = snap.axes_y;
            snap.value_unit = snap.axes_y_unit.clone();
            self.spectrum2d_rows(viewers, viewer, image, real.pos, &mut snap, is_mouse);
        }

        self.set_value_row(dc, image, &layer, viewer, real, &mut snap);

        // fires for blink refreshes too, not just mouse motion
        hub.publish(HubEvent::LineProfileRefresh {
            viewer: viewer.id,
            x: real.pos.x,
            y: real.pos.y,
        });
        self.snapshot = snap;
    }

    /// The pixel row blanks when the position is extrapolated or not a
    /// number; the flag still records on the row either way.
    fn set_pixel_row(&mut self, image: &Dataset, pos: DVec2, unreliable: bool) {
        self.rows.row1a.unreliable = unreliable;
        if unreliable || pos.x.is_nan() || pos.y.is_nan() {
            return;
        }
        let (nx, ny) = image.plane_shape().unwrap_or((1, 1));
        // Pad pixel fields to the widest coordinate the image can produce,
        // plus room for the decimal point and one fractional digit.
        let width = (nx.max(ny) as f64).log10().ceil() as usize + 3;
        self.rows.row1a.title = "Pixel".to_string();
        self.rows.row1a.text = format!("x={:>width$.1} y={:>width$.1}", pos.x, pos.y);
    }

    /// Coordinate source for cube slices: plugin products without a WCS
    /// borrow the collection's reference cube, and a dataset carrying its
    /// original spectrum's WCS prefers that over its own.
    fn cube_world_wcs<'a>(dc: &'a DataCollection, image: &'a Dataset) -> Option<&'a DataWcs> {
        let coo_data = if image.meta.generated_by_plugin.is_some() && image.wcs.is_none() {
            dc.iter().next()?
        } else {
            image
        };
        coo_data.meta.orig_spec_wcs.as_ref().or(coo_data.wcs.as_ref())
    }

    fn set_world_rows(
        &mut self,
        wcs: &DataWcs,
        viewer: &Viewer,
        real: RealXy,
        snap: &mut CursorSnapshot,
    ) {
        let sky = match wcs {
            DataWcs::Cube(cube) => {
                let slice = viewer.state.slice as f64;
                let ordered = if cube.spectral_axis_index == 0 {
                    [real.pos.x, real.pos.y, slice]
                } else {
                    [slice, real.pos.y, real.pos.x]
                };
                cube.world_from_ordered(ordered).map(|(sky, _)| sky)
            }
            wcs => wcs.pixel_to_sky(real.pos),
        };
        let sky = match sky {
            Ok(sky) => sky,
            Err(err) => {
                debug!(%err, "world lookup failed");
                return;
            }
        };

        let (ra_hms, dec_dms) = sky.to_hmsdms(4);
        // A nan token anywhere leaves both world rows cleared.
        if ra_hms == "nan" || dec_dms == "nan" {
            self.rows.clear_world();
            return;
        }
        self.rows
            .set_row2("World", format!("{ra_hms} {dec_dms} (ICRS)"));
        let (ra_deg, dec_deg) = sky.to_decimal(10);
        self.rows
            .set_row3(&NBSP.to_string(), format!("{ra_deg} {dec_deg} (deg)"));
        self.rows.row2.unreliable = real.unreliable_world;
        self.rows.row3.unreliable = real.unreliable_world;
        snap.world_ra = Some(sky.ra_deg);
        snap.world_dec = Some(sky.dec_deg);
        snap.world_unreliable = Some(real.unreliable_world);
    }

    fn spectrum2d_rows(
        &mut self,
        viewers: &ViewerStore,
        viewer: &Viewer,
        image: &Dataset,
        pos: DVec2,
        snap: &mut CursorSnapshot,
        is_mouse: bool,
    ) {
        let Some(s2d) = image.wcs.as_ref().and_then(|w| w.as_spectral2d()) else {
            return;
        };
        let (wave, _spatial) = s2d.pixel_to_world(pos);
        let wave = self.to_display_spectral(wave);
        self.rows.set_row2(
            "Wave",
            format!("{} {}", fmt_sci(wave.value, 5, false), wave.unit),
        );
        snap.spectral_axis = Some(wave.value);
        snap.spectral_axis_unit = Some(wave.unit.to_string());

        if is_mouse {
            self.marks
                .show(viewer.id, MarkRole::Primary, MarkShape::VerticalLine { x: pos.x });
            self.sync_matched_marks(viewers, viewer, wave);
        }
    }

    /// Mirrors a spectral cursor position into each matched viewer's
    /// display space; partners whose unit the value cannot reach get their
    /// mark hidden instead of a wrong position.
    fn sync_matched_marks(&mut self, viewers: &ViewerStore, viewer: &Viewer, wave: Quantity) {
        for partner_ref in &viewer.matched {
            let Some(partner) = viewers.get(partner_ref) else {
                continue;
            };
            let target = partner.state.x_display_unit.unwrap_or(wave.unit);
            match wave.to_value(target, &Equivalencies::default()) {
                Ok(x) => {
                    self.marks
                        .show(partner.id, MarkRole::Matched, MarkShape::VerticalLine { x });
                }
                Err(err) => {
                    debug!(partner = %partner.reference, %err, "matched mark hidden");
                    self.marks.hide(partner.id, MarkRole::Matched);
                }
            }
        }
    }

    fn to_display_spectral(&self, q: Quantity) -> Quantity {
        match self.display_units.spectral {
            Some(target) => q.to(target, &Equivalencies::default()).unwrap_or(q),
            None => q,
        }
    }

    fn set_value_row(
        &mut self,
        dc: &DataCollection,
        image: &Dataset,
        layer: &LayerState,
        viewer: &Viewer,
        real: RealXy,
        snap: &mut CursorSnapshot,
    ) {
        if real.unreliable_world || real.unreliable_pixel {
            return;
        }
        let Some((px, py)) = image.rounded_interior(real.pos) else {
            return;
        };
        let raw = match image.ndim() {
            2 => image.value_2d(&layer.attribute, px, py),
            3 => image.value_3d(&layer.attribute, px, py, viewer.state.slice),
            _ => None,
        };
        let Some(raw) = raw else { return };

        let unit = image.unit_of(&layer.attribute).unwrap_or(Unit::Dimensionless);
        let (value, unit) = self.to_display_value(raw, unit, image, viewer);
        let dq = self.dq_suffix(dc, image, px, py, viewer.state.slice);

        self.rows.row1b.title = "Value".to_string();
        self.rows.row1b.text = format!("{} {}{}", fmt_sci_signed(value), unit, dq)
            .trim_end()
            .to_string();
        snap.value = Some(value);
        snap.value_unit = Some(unit.to_string());
        snap.value_unreliable = Some(real.unreliable_pixel);
    }

    /// Applies the flux/surface-brightness display-unit preference, with
    /// the dataset's pixel area and the current slice wavelength as
    /// equivalencies. Values that cannot reach the preferred unit display
    /// in their native one.
    fn to_display_value(
        &self,
        raw: f64,
        unit: Unit,
        image: &Dataset,
        viewer: &Viewer,
    ) -> (f64, Unit) {
        if !unit.effective_physical_type().is_convertible_flux() {
            return (raw, unit);
        }
        let target = if unit.is_per_solid_angle() {
            self.display_units.sb
        } else {
            self.display_units.flux
        };
        let Some(target) = target else { return (raw, unit) };
        if target == unit {
            return (raw, unit);
        }

        let pixar_sr = image.meta.pixar_sr.unwrap_or(1.0);
        let wavelength = image
            .wcs
            .as_ref()
            .and_then(|w| w.as_cube())
            .map(|cube| cube.spectral_value(viewer.state.slice))
            .and_then(|q| q.to_angstrom().ok());

        match convert(raw, unit, target, &Equivalencies::new(pixar_sr, wavelength)) {
            Ok(value) => (value, target),
            Err(err) => {
                debug!(%err, "value display conversion failed");
                (raw, unit)
            }
        }
    }

    fn dq_suffix(
        &self,
        dc: &DataCollection,
        image: &Dataset,
        px: usize,
        py: usize,
        slice: usize,
    ) -> String {
        if !self.data_quality_enabled {
            return String::new();
        }
        let lookup = |data: &Dataset, name: &str| match data.ndim() {
            2 => data.value_2d(name, px, py),
            3 => data.value_3d(name, px, py, slice),
            _ => None,
        };
        let dq = lookup(image, "dq").or_else(|| {
            dc.assoc_children(&image.label)
                .into_iter()
                .find(|d| d.meta.generated_by_plugin.as_deref() == Some("data-quality"))
                .and_then(|d| {
                    let name = d.main_component().map(|c| c.name.clone())?;
                    lookup(d, &name)
                })
        });
        match dq {
            // flagged-missing samples carry NaN and get no suffix
            Some(v) if v.is_finite() => format!(" (DQ: {:.0})", v),
            _ => String::new(),
        }
    }

    /// The structured record still carries the raw cursor in display units
    /// when no sample was snapped, with the axes mirrored into the
    /// spectral/value keys.
    fn profile_cursor_fallback(viewer: &Viewer, pos: DVec2, snap: &mut CursorSnapshot) {
        snap.data_label = None;
        snap.axes_x = Some(pos.x);
        snap.axes_x_unit = viewer.state.x_display_unit.map(|u| u.to_string());
        snap.axes_y = Some(pos.y);
        snap.axes_y_unit = viewer.state.y_display_unit.map(|u| u.to_string());
        snap.spectral_axis = snap.axes_x;
        snap.spectral_axis_unit = snap.axes_x_unit.clone();
        snap.value = snap.axes_y;
        snap.value_unit = snap.axes_y_unit.clone();
    }

    fn spectrum_viewer_update(
        &mut self,
        dc: &DataCollection,
        viewers: &ViewerStore,
        viewer: &Viewer,
        pos: DVec2,
        is_mouse: bool,
    ) {
        self.rows.clear_all();
        let mut snap = CursorSnapshot::empty(self.bump_version());
        self.rows.row1a.title = "Cursor".to_string();
        self.rows.row1a.text = format!(
            "{}, {}",
            fmt_sci(pos.x, 5, false),
            fmt_sci(pos.y, 5, false)
        );

        if self.dataset == DatasetSelect::NoneSelected {
            self.marks.hide(viewer.id, MarkRole::Primary);
            Self::profile_cursor_fallback(viewer, pos, &mut snap);
            self.snapshot = snap;
            return;
        }

        let mut best: Option<Closest> = None;
        for layer in &viewer.state.layers {
            if !layer.visible || layer.is_subset {
                continue;
            }
            let manually_selected =
                matches!(&self.dataset, DatasetSelect::Manual(label) if label == &layer.label);
            if matches!(self.dataset, DatasetSelect::Manual(_)) && !manually_selected {
                continue;
            }
            let Some(dataset) = dc.get(&layer.label) else {
                continue;
            };
            if dataset.meta.wcs_only {
                continue;
            }
            let parent_ndim = dataset.ndim();
            let pixar_sr = dataset.meta.pixar_sr.unwrap_or(1.0);
            let Some(spectrum) = self.cache.get_or_extract(dc, dataset) else {
                continue;
            };

            let waves_angstrom: Option<Vec<f64>> =
                if spectrum.spectral_unit.physical_type().is_spectral() {
                    spectrum
                        .spectral
                        .iter()
                        .map(|&v| Quantity::new(v, spectrum.spectral_unit).to_angstrom())
                        .collect::<Result<Vec<_>, _>>()
                        .ok()
                } else {
                    None
                };

            let x_unit = viewer.state.x_display_unit.unwrap_or(spectrum.spectral_unit);
            let y_unit = viewer.state.y_display_unit.unwrap_or(spectrum.flux_unit);
            let sx = match convert_array(
                &spectrum.spectral,
                spectrum.spectral_unit,
                x_unit,
                pixar_sr,
                waves_angstrom.as_deref(),
            ) {
                Ok(values) => values,
                Err(err) => {
                    debug!(layer = %layer.label, %err, "spectral axis conversion failed");
                    continue;
                }
            };
            let sy = match convert_array(
                &spectrum.flux,
                spectrum.flux_unit,
                y_unit,
                pixar_sr,
                waves_angstrom.as_deref(),
            ) {
                Ok(values) => values,
                Err(err) => {
                    debug!(layer = %layer.label, %err, "flux conversion failed");
                    continue;
                }
            };

            // A dataset whose displayed wavelength range excludes the
            // cursor does not compete, unless it was picked by hand.
            if !manually_selected {
                let (lo, hi) = sx
                    .iter()
                    .copied()
                    .filter(|v| v.is_finite())
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                        (lo.min(v), hi.max(v))
                    });
                if pos.x < lo || pos.x > hi {
                    continue;
                }
            }

            for i in 0..sx.len().min(sy.len()) {
                if !sx[i].is_finite() || !sy[i].is_finite() {
                    continue;
                }
                let dx = sx[i] - pos.x;
                let dy = sy[i] - pos.y;
                let dist = (dx * dx + dy * dy).sqrt();
                // strict comparison keeps the earlier layer on ties
                if best.as_ref().is_none_or(|b| dist < b.dist) {
                    best = Some(Closest {
                        label: layer.label.clone(),
                        idx: i,
                        sx: sx[i],
                        sy: sy[i],
                        x_unit,
                        y_unit,
                        parent_ndim,
                        dist,
                    });
                }
            }
        }

        let Some(best) = best else {
            if is_mouse {
                self.hide_viewer_marks(viewers, viewer.id, &viewer.matched);
            }
            Self::profile_cursor_fallback(viewer, pos, &mut snap);
            self.snapshot = snap;
            return;
        };

        snap.data_label = Some(best.label.clone());
        snap.axes_x = Some(best.sx);
        snap.axes_x_unit = Some(best.x_unit.to_string());
        snap.axes_y = Some(best.sy);
        snap.axes_y_unit = Some(best.y_unit.to_string());
        snap.value = Some(best.sy);
        snap.value_unit = Some(best.y_unit.to_string());
        snap.spectral_axis = Some(best.sx);
        snap.spectral_axis_unit = Some(best.x_unit.to_string());
        if best.parent_ndim == 3 {
            snap.slice = Some(best.idx);
        } else {
            snap.index = Some(best.idx as f64);
        }

        match viewer.kind {
            ViewerKind::RampProfile => {
                self.rows.set_row2("Index", format!("{}", best.idx));
            }
            _ => {
                let pix_suffix = if best.x_unit != Unit::Pixel {
                    format!(" ({} pix)", best.idx)
                } else {
                    String::new()
                };
                self.rows.set_row2(
                    "Wave",
                    format!(
                        "{} {}{}",
                        fmt_sci(best.sx, 5, false),
                        best.x_unit,
                        pix_suffix
                    ),
                );
            }
        }
        self.rows.set_row3(
            "Flux",
            format!("{} {}", fmt_sci(best.sy, 5, false), best.y_unit)
                .trim_end()
                .to_string(),
        );

        if is_mouse {
            self.marks.show(
                viewer.id,
                MarkRole::Primary,
                MarkShape::VerticalLine { x: best.sx },
            );
            self.sync_matched_marks(viewers, viewer, Quantity::new(best.sx, best.x_unit));
        }
        self.snapshot = snap;
    }
}
