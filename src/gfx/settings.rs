//! Shared render settings driven by the debug panel
//!
//! One explicit struct instead of ad-hoc globals. The debug panel mutates it,
//! the material sync pass and the render engine read it.

use crate::gfx::rendering::tone_mapping::ToneMapping;

/// Slider range for environment intensity
pub const ENV_INTENSITY_MAX: f32 = 10.0;
/// Slider range for tone mapping exposure
pub const EXPOSURE_MAX: f32 = 10.0;
/// Slider range for light intensity
pub const LIGHT_INTENSITY_MAX: f32 = 10.0;
/// Slider range for the light position on each axis
pub const LIGHT_POSITION_RANGE: f32 = 5.0;

/// Live render settings shared between the debug panel and the renderer
///
/// All mutation happens on the UI thread; the most recent value wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    /// Environment map contribution applied to every PBR material by the
    /// material sync pass (0 to [`ENV_INTENSITY_MAX`])
    pub env_intensity: f32,
    /// Y rotation of the loaded model in radians (-PI to PI)
    pub model_rotation_y: f32,
    /// HDR to display transform selected in the panel
    pub tone_mapping: ToneMapping,
    /// Exposure applied before tone mapping (0 to [`EXPOSURE_MAX`])
    pub exposure: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            env_intensity: 2.0,
            model_rotation_y: std::f32::consts::FRAC_PI_2,
            tone_mapping: ToneMapping::Filmic,
            exposure: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_viewer_startup_state() {
        let settings = RenderSettings::default();
        assert_eq!(settings.env_intensity, 2.0);
        assert_eq!(settings.model_rotation_y, std::f32::consts::FRAC_PI_2);
        assert_eq!(settings.tone_mapping, ToneMapping::Filmic);
        assert_eq!(settings.exposure, 2.0);
    }
}
