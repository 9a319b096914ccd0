// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scene fingerprints and the pixel-point matcher (spec §3, §4.3).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::frame::Frame;

/// Default average-channel-distance threshold (0-255 scale).
pub const DEFAULT_THRESHOLD: f64 = 5.0;

/// An expected color at a given point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub x: u32,
    pub y: u32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// A point referenced by a [`SceneAction`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenePoint {
    pub x: u32,
    pub y: u32,
}

/// A named action reachable from within a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub point: ScenePoint,
}

/// A visual fingerprint of a UI state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    pub category: String,
    pub points: Vec<Checkpoint>,
    #[serde(default)]
    pub actions: HashMap<String, SceneAction>,
}

/// Per-checkpoint sample diff plus the aggregate used against the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchDetails {
    pub per_point_diff: Vec<f64>,
    pub aggregate: f64,
    pub matched: bool,
}

/// Stateless pixel-point matcher.
#[derive(Debug, Clone, Copy)]
pub struct SceneMatcher {
    pub threshold: f64,
}

impl Default for SceneMatcher {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD }
    }
}

impl SceneMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// `true` iff the mean per-checkpoint channel distance is within threshold.
    /// Empty checkpoints never match (nothing was verified).
    pub fn is_match(&self, scene: &Scene, frame: &Frame) -> bool {
        if scene.points.is_empty() {
            return false;
        }
        self.match_with_details(scene, frame).matched
    }

    /// Like [`Self::is_match`] but returns the per-point diffs too.
    pub fn match_with_details(&self, scene: &Scene, frame: &Frame) -> MatchDetails {
        if scene.points.is_empty() {
            return MatchDetails { per_point_diff: Vec::new(), aggregate: f64::MAX, matched: false };
        }
        let mut diffs = Vec::with_capacity(scene.points.len());
        for cp in &scene.points {
            let diff = match frame.pixel_at(cp.x, cp.y) {
                Some((r, g, b, _a)) => {
                    let dr = (r as i32 - cp.r as i32).unsigned_abs() as f64;
                    let dg = (g as i32 - cp.g as i32).unsigned_abs() as f64;
                    let db = (b as i32 - cp.b as i32).unsigned_abs() as f64;
                    (dr + dg + db) / 3.0
                }
                // A checkpoint outside the frame counts as maximally different.
                None => 255.0,
            };
            diffs.push(diff);
        }
        let aggregate = diffs.iter().sum::<f64>() / diffs.len() as f64;
        MatchDetails { matched: aggregate <= self.threshold, per_point_diff: diffs, aggregate }
    }
}

/// Concurrent-safe name-keyed scene catalog.
#[derive(Default)]
pub struct SceneRegistry {
    scenes: RwLock<HashMap<String, Scene>>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, scene: Scene) {
        self.scenes.write().await.insert(scene.name.clone(), scene);
    }

    pub async fn get(&self, name: &str) -> Option<Scene> {
        self.scenes.read().await.get(name).cloned()
    }

    pub async fn exists(&self, name: &str) -> bool {
        self.scenes.read().await.contains_key(name)
    }

    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scenes.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn by_category(&self, category: &str) -> Vec<Scene> {
        self.scenes.read().await.values().filter(|s| s.category == category).cloned().collect()
    }

    /// Return the first scene among `names` that matches `frame`, if any.
    /// Order among matches is indeterminate when iterating all scenes.
    pub async fn find_match(
        &self,
        frame: &Frame,
        matcher: &SceneMatcher,
        names: &[String],
    ) -> Option<Scene> {
        let scenes = self.scenes.read().await;
        for name in names {
            if let Some(scene) = scenes.get(name) {
                if matcher.is_match(scene, frame) {
                    return Some(scene.clone());
                }
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
