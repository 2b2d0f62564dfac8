//! Глубина перемешанного слоя (MLD) по температурному порогу

use std::collections::BTreeMap;

use crate::config::PipelineConfig;
use crate::models::profiles::{Profile, ProfileGrouper};
use crate::types::{Observation, ProfileId};

/// MLD одного профиля по парам (глубина, температура).
///
/// Первая (по глубине) точка, где |T(z) - T(z_ref)| строго больше порога;
/// если такой нет, то самая глубокая точка профиля. Опорная точка это
/// ближайшая к `reference_depth` глубина, при равенстве более мелкая.
pub fn mixed_layer_depth(samples: &[(f64, f64)], threshold: f64, reference_depth: f64) -> Option<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    if sorted.is_empty() {
        return None;
    }

    let mut ref_idx = 0;
    let mut best = f64::INFINITY;
    for (i, (depth, _)) in sorted.iter().enumerate() {
        let distance = (depth - reference_depth).abs();
        if distance < best {
            best = distance;
            ref_idx = i;
        }
    }
    let t_ref = sorted[ref_idx].1;

    sorted
        .iter()
        .find(|(_, temp)| (temp - t_ref).abs() > threshold)
        .or_else(|| sorted.last())
        .map(|(depth, _)| *depth)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MldExtractor {
    pub threshold: f64,
    pub reference_depth: f64,
}

impl MldExtractor {
    pub fn new(threshold: f64, reference_depth: f64) -> Self {
        Self {
            threshold,
            reference_depth,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.threshold, config.reference_depth)
    }

    /// MLD профиля. Учитываются только точки, где есть и глубина, и температура.
    pub fn profile_mld(&self, profile: &Profile<'_>) -> Option<f64> {
        let samples: Vec<(f64, f64)> = profile
            .observations()
            .filter_map(|o| Some((o.depth?, o.temperature?)))
            .collect();

        mixed_layer_depth(&samples, self.threshold, self.reference_depth)
    }

    /// MLD по каждому профилю. Профили без пригодных точек получают `None`.
    pub fn per_profile<'a>(&self, observations: &'a [Observation]) -> BTreeMap<&'a ProfileId, Option<f64>> {
        ProfileGrouper::group(observations)
            .map(|profile| (profile.id, self.profile_mld(&profile)))
            .collect()
    }

    /// Копия наблюдений с `mixed_layer_depth`, одинаковой для всех строк профиля.
    pub fn annotate(&self, observations: &[Observation]) -> Vec<Observation> {
        let mld = self.per_profile(observations);
        tracing::info!(
            "Calculating MLD (dT>{}°C from {} m) for {} profiles",
            self.threshold,
            self.reference_depth,
            mld.len()
        );

        observations
            .iter()
            .map(|o| Observation {
                mixed_layer_depth: o
                    .profile_id
                    .as_ref()
                    .and_then(|id| mld.get(id).copied().flatten()),
                ..o.clone()
            })
            .collect()
    }
}

impl Default for MldExtractor {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}
