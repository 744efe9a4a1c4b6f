//! Page file handling
//!
//! A page file is a scene plus the layout it runs against:
//!
//! ```toml
//! [page.viewport]
//! width = 1280
//! height = 800
//!
//! [[page.elements]]
//! groups = [".about"]
//! rect = { x = 0, y = 800, width = 1280, height = 800 }
//!
//! [[sections]]
//! scroll = { trigger = ".about", extend_by = "+=130%", pin = true }
//! ```

use anyhow::{Context, Result};
use scrubline_animation::Keyframe;
use scrubline_core::host::{Rect, Selector, Size};
use scrubline_scroll::headless::{HeadlessPage, HeadlessStore, HeadlessViewport};
use scrubline_scroll::{LandingPreset, RevealConfig, SceneConfig, SectionConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level page file
#[derive(Debug, Deserialize, Serialize)]
pub struct PageFile {
    pub page: PageLayout,
    #[serde(default)]
    pub entrance: Vec<Keyframe<Selector>>,
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
    #[serde(default)]
    pub reveals: Vec<RevealConfig>,
}

/// Fixed layout of the simulated document
#[derive(Debug, Deserialize, Serialize)]
pub struct PageLayout {
    #[serde(default = "default_viewport")]
    pub viewport: Size,
    #[serde(default)]
    pub elements: Vec<ElementLayout>,
}

fn default_viewport() -> Size {
    Size::new(1280.0, 800.0)
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ElementLayout {
    pub groups: Vec<String>,
    #[serde(default)]
    pub rect: Rect,
}

impl PageFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let file: PageFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(file)
    }

    /// The file's drivers, or the landing preset's when `preset` is set
    pub fn scene(&self, preset: bool) -> SceneConfig {
        if preset {
            return LandingPreset::scene();
        }
        SceneConfig {
            entrance: self.entrance.clone(),
            sections: self.sections.clone(),
            reveals: self.reveals.clone(),
        }
    }
}

impl PageLayout {
    /// Headless collaborators laid out like this page
    pub fn build(&self) -> (HeadlessViewport, HeadlessStore) {
        let mut page = HeadlessPage::new(self.viewport);
        for element in &self.elements {
            let groups: Vec<&str> = element.groups.iter().map(String::as_str).collect();
            page.add(&groups, element.rect);
        }
        page.into_parts()
    }

    /// Group keys in first-appearance order
    pub fn group_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for group in self.elements.iter().flat_map(|e| &e.groups) {
            if !keys.contains(&group.as_str()) {
                keys.push(group);
            }
        }
        keys
    }

    /// Bottom edge of the lowest element
    pub fn document_height(&self) -> f32 {
        self.elements
            .iter()
            .map(|e| e.rect.bottom())
            .fold(self.viewport.height, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrubline_scroll::headless::ManualClock;
    use scrubline_scroll::Orchestrator;

    const ABOUT: &str = include_str!("../scenes/about.toml");
    const LANDING: &str = include_str!("../scenes/landing.toml");

    #[test]
    fn test_about_scene_installs() {
        let file: PageFile = toml::from_str(ABOUT).unwrap();
        let scene = file.scene(false);
        assert!(scene.validate().is_ok());

        let (viewport, store) = file.page.build();
        assert_eq!(store.group(".reveal-section").len(), 2);

        let mut orchestrator = Orchestrator::new(viewport, store, ManualClock::new()).unwrap();
        let handles = scene.install(&mut orchestrator).unwrap();
        assert!(handles.entrance.is_some());

        let region = orchestrator.section_region(handles.sections[0]).unwrap();
        assert_eq!(region.start, 800.0);
        assert_eq!(region.end, 1840.0);
    }

    #[test]
    fn test_landing_layout_runs_preset() {
        let file: PageFile = toml::from_str(LANDING).unwrap();
        assert!(file.sections.is_empty());
        assert_eq!(file.page.document_height(), 4200.0);
        assert_eq!(file.page.group_keys().len(), 17);

        let (viewport, store) = file.page.build();
        let mut orchestrator = Orchestrator::new(viewport, store, ManualClock::new()).unwrap();
        let handles = file.scene(true).install(&mut orchestrator).unwrap();

        assert_eq!(handles.sections.len(), 3);
        assert_eq!(orchestrator.reveal_states(handles.reveals[0]).unwrap().len(), 3);
    }

    #[test]
    fn test_viewport_defaults() {
        let file: PageFile = toml::from_str("[page]").unwrap();
        assert_eq!(file.page.viewport, Size::new(1280.0, 800.0));
        assert_eq!(file.page.document_height(), 800.0);
    }
}
