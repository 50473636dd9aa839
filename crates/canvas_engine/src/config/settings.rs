//! Serializable settings for gizmos and the camera post-effects pipeline

use serde::{Deserialize, Serialize};

use super::Config;
use crate::foundation::color::Color;
use crate::gizmo::CoordSpace;
use crate::render::passes::compose::ToneMapping;

/// Per-axis handle colors for a transform gizmo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GizmoColors {
    /// X axis handles
    pub x: Color,
    /// Y axis handles
    pub y: Color,
    /// Z axis handles
    pub z: Color,
    /// Camera-facing and all-axes handles
    pub face: Color,
    /// Any handle under the pointer
    pub hover: Color,
    /// Handles that cannot be picked
    pub disabled: Color,
}

impl Default for GizmoColors {
    fn default() -> Self {
        Self {
            x: Color::new(1.0, 0.3, 0.3, 1.0),
            y: Color::new(0.3, 1.0, 0.3, 1.0),
            z: Color::new(0.3, 0.3, 1.0, 1.0),
            face: Color::new(1.0, 1.0, 1.0, 0.5),
            hover: Color::new(1.0, 1.0, 0.3, 1.0),
            disabled: Color::new(0.5, 0.5, 0.5, 0.5),
        }
    }
}

/// Transform gizmo behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GizmoSettings {
    /// Screen-relative size multiplier
    pub size: f32,
    /// Whether drag deltas are quantized
    pub snap: bool,
    /// Quantization step: world units for translate, degrees for rotate
    pub snap_increment: f32,
    /// Interaction frame
    pub coord_space: CoordSpace,
    /// Handle colors
    pub colors: GizmoColors,
}

impl Default for GizmoSettings {
    fn default() -> Self {
        Self {
            size: 1.0,
            snap: false,
            snap_increment: 1.0,
            coord_space: CoordSpace::World,
            colors: GizmoColors::default(),
        }
    }
}

impl Config for GizmoSettings {}

/// Bloom parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    /// Whether the bloom chain runs
    pub enabled: bool,
    /// Strength of the bloom added in the compose pass
    pub intensity: f32,
    /// Smallest mip level the blur pyramid is allowed to reach (as a power of two)
    pub last_mip_level: u32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 0.01,
            last_mip_level: 1,
        }
    }
}

/// Color grading parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingSettings {
    /// Whether grading is applied
    pub enabled: bool,
    /// Brightness multiplier
    pub brightness: f32,
    /// Contrast around mid-gray
    pub contrast: f32,
    /// Saturation around luminance
    pub saturation: f32,
}

impl Default for GradingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
        }
    }
}

/// Vignette parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VignetteSettings {
    /// Whether vignetting is applied
    pub enabled: bool,
    /// Radius where darkening starts
    pub inner: f32,
    /// Radius where darkening is full
    pub outer: f32,
    /// Shape of the falloff distance metric
    pub curvature: f32,
    /// Darkening amount
    pub intensity: f32,
}

impl Default for VignetteSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            inner: 0.5,
            outer: 1.0,
            curvature: 0.5,
            intensity: 0.3,
        }
    }
}

/// Chromatic fringing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FringingSettings {
    /// Whether fringing is applied
    pub enabled: bool,
    /// Lateral offset strength in pixels at the screen corners
    pub intensity: f32,
}

impl Default for FringingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            intensity: 10.0,
        }
    }
}

/// Everything a camera frame exposes as live-tweakable quality settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostEffectsSettings {
    /// Scene render resolution relative to the output target
    pub render_target_scale: f32,
    /// Tone-mapping operator used by the compose pass
    pub tone_mapping: ToneMapping,
    /// Bloom
    pub bloom: BloomSettings,
    /// Color grading
    pub grading: GradingSettings,
    /// Vignette
    pub vignette: VignetteSettings,
    /// Chromatic fringing
    pub fringing: FringingSettings,
    /// Temporal anti-aliasing; only honored if the frame was built with TAA
    pub taa_enabled: bool,
}

impl Default for PostEffectsSettings {
    fn default() -> Self {
        Self {
            render_target_scale: 1.0,
            tone_mapping: ToneMapping::Linear,
            bloom: BloomSettings::default(),
            grading: GradingSettings::default(),
            vignette: VignetteSettings::default(),
            fringing: FringingSettings::default(),
            taa_enabled: false,
        }
    }
}

impl Config for PostEffectsSettings {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_effects_toml_partial() {
        let text = r#"
            render_target_scale = 0.5
            tone_mapping = "Aces"

            [bloom]
            intensity = 0.2

            [vignette]
            enabled = true
        "#;
        let settings = PostEffectsSettings::parse("post.toml", text).unwrap();

        assert_eq!(settings.render_target_scale, 0.5);
        assert_eq!(settings.tone_mapping, ToneMapping::Aces);
        assert_eq!(settings.bloom.intensity, 0.2);
        assert!(settings.bloom.enabled);
        assert!(settings.vignette.enabled);
        assert_eq!(settings.vignette.outer, 1.0);
    }

    #[test]
    fn test_gizmo_settings_ron() {
        let text = "(snap: true, snap_increment: 0.25, coord_space: local)";
        let settings = GizmoSettings::parse("gizmo.ron", text).unwrap();

        assert!(settings.snap);
        assert_eq!(settings.snap_increment, 0.25);
        assert_eq!(settings.coord_space, CoordSpace::Local);
        assert_eq!(settings.size, 1.0);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = GizmoSettings::parse("gizmo.json", "{}").unwrap_err();
        assert!(matches!(err, super::super::ConfigError::UnsupportedFormat(_)));
    }
}
