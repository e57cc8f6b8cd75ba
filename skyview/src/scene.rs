//! Scene description files.
//!
//! A scene is the serializable form of a session: datasets, the links
//! between them, and the viewers looking at them. [`Scene::build`] turns a
//! loaded description into the live [`DataCollection`] and [`ViewerStore`].

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::{DataCollection, Dataset, ExternalLink};
use crate::viewer::{LayerState, Viewer, ViewerKind, ViewerStore};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneViewer {
    pub reference: String,
    pub kind: ViewerKind,
    /// Dataset labels drawn by this viewer, bottom first.
    #[serde(default)]
    pub layers: Vec<String>,
    /// References of viewers whose cursor this one mirrors.
    #[serde(default)]
    pub matched: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scene {
    pub datasets: Vec<Dataset>,
    #[serde(default)]
    pub links: Vec<ExternalLink>,
    #[serde(default)]
    pub viewers: Vec<SceneViewer>,
}

impl Scene {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Scene> {
        serde_yml::from_str(yaml).context("failed to parse scene yaml")
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Scene> {
        let yaml = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read {}", path.as_ref().display()))?;
        Self::from_yaml(&yaml)
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        serde_yml::to_string(self).context("failed to serialize scene")
    }

    /// Instantiates the scene.
    pub fn build(self) -> (DataCollection, ViewerStore) {
        let mut dc = DataCollection::new();
        for dataset in self.datasets {
            dc.insert(dataset);
        }
        dc.external_links = self.links;

        let mut store = ViewerStore::new();
        for desc in self.viewers {
            let mut viewer = Viewer::new(&desc.reference, desc.kind);
            for label in &desc.layers {
                viewer.add_layer(LayerState::new(label));
            }
            viewer.matched = desc.matched;
            store.insert(viewer);
        }
        info!(
            datasets = dc.len(),
            viewers = store.iter().count(),
            "scene built"
        );
        (dc, store)
    }
}
