//! Scene configuration
//!
//! A scene is everything an orchestrator runs for one page, loadable from
//! TOML:
//!
//! ```toml
//! [[entrance]]
//! target = ".hero-eyebrow"
//! from = { opacity = 0, x = "-40px" }
//! to = { opacity = 1, x = "0px" }
//! duration_ms = 800
//! easing = "power3.out"
//!
//! [[sections]]
//! scroll = { trigger = ".about", extend_by = "+=130%", pin = true }
//!
//! [[sections.tracks]]
//! target = ".about-body"
//! entrance.opacity = { from = 0, to = 1 }
//!
//! [[reveals]]
//! selector = ".reveal-section"
//! ```

use scrubline_animation::{Keyframe, TargetRegistry, Timeline};
use scrubline_core::error::ConfigError;
use scrubline_core::host::{ElementStore, FrameClock, Selector, Viewport};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::orchestrator::{DriverHandle, Orchestrator};
use crate::reveal::RevealConfig;
use crate::section::{ProgressCallback, SectionConfig};

/// Scene loading failures
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("failed to parse scene: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize scene: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Drivers of one page
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub entrance: Vec<Keyframe<Selector>>,
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
    #[serde(default)]
    pub reveals: Vec<RevealConfig>,
}

/// Handles of an installed scene, by driver kind
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneHandles {
    pub entrance: Option<DriverHandle>,
    pub sections: Vec<DriverHandle>,
    pub reveals: Vec<DriverHandle>,
}

impl SceneHandles {
    /// Every handle, in registration order
    pub fn all(&self) -> impl Iterator<Item = DriverHandle> + '_ {
        self.entrance
            .iter()
            .chain(&self.sections)
            .chain(&self.reveals)
            .copied()
    }
}

impl SceneConfig {
    /// Parse and validate
    pub fn from_toml(source: &str) -> Result<Self, SceneError> {
        let scene: SceneConfig = toml::from_str(source)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn to_toml(&self) -> Result<String, SceneError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks that need no host: phase bounds, scrub factors, reveal
    /// settings and timeline offsets. Trigger resolution and regions are
    /// checked when the scene is installed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_offsets(&self.entrance)?;
        for section in &self.sections {
            section.phases.validate()?;
            section.scroll.scrub.validate()?;
            check_offsets(&section.timeline)?;
        }
        for reveal in &self.reveals {
            reveal.validate()?;
        }
        Ok(())
    }

    /// Register every driver: entrance, then sections, then reveals.
    ///
    /// If any registration fails the ones already made are unbound again.
    pub fn install<V, S, C>(
        self,
        orchestrator: &mut Orchestrator<V, S, C>,
    ) -> Result<SceneHandles, ConfigError>
    where
        V: Viewport,
        S: ElementStore,
        C: FrameClock,
    {
        self.install_observed(orchestrator, |_| None)
    }

    /// [`install`](Self::install), asking `observe` for the progress callback
    /// of each section by its index in `sections`
    pub fn install_observed<V, S, C, F>(
        self,
        orchestrator: &mut Orchestrator<V, S, C>,
        observe: F,
    ) -> Result<SceneHandles, ConfigError>
    where
        V: Viewport,
        S: ElementStore,
        C: FrameClock,
        F: FnMut(usize) -> Option<ProgressCallback>,
    {
        let mut handles = SceneHandles::default();
        let result = self.install_into(orchestrator, observe, &mut handles);
        if let Err(err) = result {
            for handle in handles.all() {
                orchestrator.unbind(handle);
            }
            return Err(err);
        }
        Ok(handles)
    }

    fn install_into<V, S, C, F>(
        self,
        orchestrator: &mut Orchestrator<V, S, C>,
        mut observe: F,
        handles: &mut SceneHandles,
    ) -> Result<(), ConfigError>
    where
        V: Viewport,
        S: ElementStore,
        C: FrameClock,
        F: FnMut(usize) -> Option<ProgressCallback>,
    {
        if !self.entrance.is_empty() {
            handles.entrance = Some(orchestrator.register_entrance_timeline(self.entrance)?);
        }
        for (index, section) in self.sections.into_iter().enumerate() {
            handles
                .sections
                .push(orchestrator.register_scroll_section(section, observe(index))?);
        }
        for reveal in self.reveals {
            handles.reveals.push(orchestrator.register_reveal(reveal)?);
        }
        Ok(())
    }
}

fn check_offsets(steps: &[Keyframe<Selector>]) -> Result<(), ConfigError> {
    let mut targets = TargetRegistry::new();
    let mut timeline = Timeline::new();
    for step in steps {
        let step = step.clone().map_target(|selector| targets.ensure(&selector));
        timeline.add_step(step)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrubline_animation::{Easing, Offset};
    use scrubline_core::value::Value;

    const SCENE: &str = r#"
        [[entrance]]
        target = ".hero-eyebrow"
        from = { opacity = 0, x = "-40px" }
        to = { opacity = 1, x = "0px" }
        duration_ms = 800
        easing = "power3.out"

        [[entrance]]
        target = ".hero-headline"
        from = { opacity = 0, y = "24px" }
        to = { opacity = 1, y = "0px" }
        duration_ms = 800
        offset = "-=500"

        [[sections]]
        scroll = { trigger = ".about", extend_by = "+=130%", pin = true }

        [[sections.tracks]]
        target = ".about-body"
        entrance.opacity = { from = 0, to = 1 }
        exit.opacity = { from = 1, to = 0 }

        [[reveals]]
        selector = ".reveal-section"
    "#;

    #[test]
    fn test_load_scene() {
        let scene = SceneConfig::from_toml(SCENE).unwrap();

        assert_eq!(scene.entrance.len(), 2);
        assert_eq!(scene.entrance[0].easing, Easing::EaseOutQuart);
        assert_eq!(scene.entrance[1].offset, Offset::after_previous(-500));
        assert_eq!(scene.entrance[1].from.as_ref().unwrap()["y"], Value::px(24.0));
        assert_eq!(scene.sections[0].tracks[0].target, Selector::group(".about-body"));
        assert_eq!(scene.reveals[0].trigger_line, 0.8);
        assert_eq!(scene.reveals[0].duration_ms, 800);
    }

    #[test]
    fn test_rejects_dangling_tag() {
        let source = r#"
            [[entrance]]
            target = ".hero-cta"
            to = { opacity = 1 }
            duration_ms = 600
            offset = { anchor = { tag = "headline" }, delta_ms = -200 }
        "#;
        assert!(matches!(
            SceneConfig::from_toml(source),
            Err(SceneError::Config(ConfigError::DanglingAnchor(_)))
        ));
    }

    #[test]
    fn test_rejects_bad_phase_bounds() {
        let source = r#"
            [[sections]]
            scroll = { trigger = ".about", extend_by = "+=100%" }
            phases = { entrance_end = 0.8, exit_start = 0.2 }
        "#;
        assert!(matches!(
            SceneConfig::from_toml(source),
            Err(SceneError::Config(ConfigError::InvalidPhaseBounds { .. }))
        ));
    }

    #[test]
    fn test_toml_round_trip_keeps_meaning() {
        let scene = SceneConfig::from_toml(SCENE).unwrap();
        let reloaded = SceneConfig::from_toml(&scene.to_toml().unwrap()).unwrap();
        assert_eq!(reloaded, scene);
    }
}
