//! Dataset consistency report: vendors per layer and vendors outside the boundary.

use hashbrown::HashMap;

use kedai::models::GeoBbox;
use kedai::{CandidatePoint, MapContext};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerCount {
    pub layer: String,
    pub total: usize,
    pub outside: usize,
}

#[derive(Debug, Default)]
pub struct Report {
    /// Layers in the order their first vendor was loaded
    pub layers: Vec<LayerCount>,
    pub outside: Vec<CandidatePoint>,
    pub boundary_rings: usize,
    pub boundary_bbox: Option<GeoBbox>,
}

impl Report {
    pub fn total(&self) -> usize {
        self.layers.iter().map(|l| l.total).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.outside.is_empty()
    }
}

pub fn build_report(context: &MapContext) -> Report {
    let candidates: Vec<&CandidatePoint> = context.candidates().iter().collect();
    let points: Vec<_> = candidates.iter().map(|c| c.point).collect();
    let inside = context.pip().classify_many(&points);

    let mut layers: Vec<LayerCount> = Vec::new();
    let mut by_layer: HashMap<&str, usize> = HashMap::new();
    let mut outside = Vec::new();

    for (candidate, inside) in candidates.iter().zip(inside) {
        let idx = *by_layer
            .entry(candidate.props.layer.as_str())
            .or_insert_with(|| {
                layers.push(LayerCount {
                    layer: candidate.props.layer.clone(),
                    ..Default::default()
                });
                layers.len() - 1
            });

        layers[idx].total += 1;
        if !inside {
            layers[idx].outside += 1;
            outside.push((*candidate).clone());
        }
    }

    Report {
        layers,
        outside,
        boundary_rings: context.boundary().map(|b| b.len()).unwrap_or(0),
        boundary_bbox: context.boundary().and_then(|b| b.bbox()),
    }
}
