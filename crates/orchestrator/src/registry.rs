// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent-safe script catalog and the declarative-bundle loader (spec §4.4, §6).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::scene::{Scene, SceneRegistry};
use crate::script::Script;

/// Concurrent-safe name -> [`Script`] catalog.
#[derive(Default)]
pub struct ScriptRegistry {
    scripts: RwLock<HashMap<String, Script>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry.
    pub async fn register(&self, script: Script) {
        self.scripts.write().await.insert(script.name.clone(), script);
    }

    pub async fn get(&self, name: &str) -> Option<Script> {
        self.scripts.read().await.get(name).cloned()
    }

    pub async fn exists(&self, name: &str) -> bool {
        self.scripts.read().await.contains_key(name)
    }

    /// Names sorted lexicographically for stable UI listing.
    pub async fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scripts.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

/// On-disk scene bundle: `{ category, scenes: [...] }` (spec §6).
#[derive(Debug, Deserialize)]
struct SceneBundleDoc {
    category: String,
    #[serde(default)]
    scenes: Vec<SceneDoc>,
}

#[derive(Debug, Deserialize)]
struct SceneDoc {
    name: String,
    #[serde(default)]
    points: Vec<PointColorDoc>,
    #[serde(default)]
    actions: HashMap<String, crate::scene::SceneAction>,
}

#[derive(Debug, Deserialize)]
struct PointColorDoc {
    x: u32,
    y: u32,
    color: ColorDoc,
}

#[derive(Debug, Deserialize, Serialize)]
struct ColorDoc {
    r: u8,
    g: u8,
    b: u8,
    #[serde(default = "default_alpha")]
    a: u8,
}

fn default_alpha() -> u8 {
    255
}

/// Parse a single scene-bundle JSON document into [`Scene`] values.
/// Unknown fields in the source document are ignored defensively.
pub fn parse_scene_bundle(json: &str) -> anyhow::Result<Vec<Scene>> {
    let doc: SceneBundleDoc = serde_json::from_str(json)?;
    Ok(doc
        .scenes
        .into_iter()
        .map(|s| Scene {
            name: s.name,
            category: doc.category.clone(),
            points: s
                .points
                .into_iter()
                .map(|p| crate::scene::Checkpoint {
                    x: p.x,
                    y: p.y,
                    r: p.color.r,
                    g: p.color.g,
                    b: p.color.b,
                    a: p.color.a,
                })
                .collect(),
            actions: s.actions,
        })
        .collect())
}

/// Load every `*.json` scene bundle in `dir` into `registry`.
pub async fn load_scene_bundles(registry: &SceneRegistry, dir: &Path) -> anyhow::Result<usize> {
    let mut count = 0;
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let contents = tokio::fs::read_to_string(&path).await?;
        for scene in parse_scene_bundle(&contents)? {
            count += 1;
            registry.register(scene).await;
        }
    }
    Ok(count)
}

/// Load every `*.json` script document in `dir` into `registry`.
pub async fn load_scripts(registry: &ScriptRegistry, dir: &Path) -> anyhow::Result<usize> {
    let mut count = 0;
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let contents = tokio::fs::read_to_string(&path).await?;
        let script: Script = serde_json::from_str(&contents)?;
        script.validate().map_err(|e| anyhow::anyhow!(e.to_string()))?;
        count += 1;
        registry.register(script).await;
    }
    Ok(count)
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
