// src/ui/panel.rs
//! Debug control panel
//!
//! Binds the render settings and the directional light to live sliders and
//! reports which bindings changed, so the application can re-run the
//! material sync pass only when a change requires it.

use crate::gfx::{
    rendering::tone_mapping::ToneMapping,
    scene::light::DirectionalLight,
    settings::{
        RenderSettings, ENV_INTENSITY_MAX, EXPOSURE_MAX, LIGHT_INTENSITY_MAX,
        LIGHT_POSITION_RANGE,
    },
};

/// Which panel bindings changed this frame
///
/// Slider callbacks fire synchronously while dragging; the tone mapping
/// combo only reports on commit (a click on an entry), never on hover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelResponse {
    pub env_intensity_changed: bool,
    pub model_rotation_changed: bool,
    pub light_changed: bool,
    pub tone_mapping_committed: bool,
    pub exposure_changed: bool,
}

impl PanelResponse {
    /// True when the change requires a material sync pass
    ///
    /// Environment intensity and tone mapping selection both touch material
    /// state; light and exposure changes only flow through the global
    /// uniform buffer.
    pub fn needs_material_sync(&self) -> bool {
        self.env_intensity_changed || self.tone_mapping_committed
    }

    pub fn any_changed(&self) -> bool {
        self.env_intensity_changed
            || self.model_rotation_changed
            || self.light_changed
            || self.tone_mapping_committed
            || self.exposure_changed
    }
}

/// Draws the debug control panel and mutates the bound state in place
pub fn environment_panel(
    ui: &imgui::Ui,
    settings: &mut RenderSettings,
    light: &mut DirectionalLight,
) -> PanelResponse {
    let mut response = PanelResponse::default();

    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return response;
    }

    ui.window("Environment")
        .size([360.0, 420.0], imgui::Condition::FirstUseEver)
        .position([20.0, 20.0], imgui::Condition::FirstUseEver)
        .resizable(true)
        .collapsible(true)
        .build(|| {
            response.env_intensity_changed = ui.slider(
                "envMapIntensity",
                0.0,
                ENV_INTENSITY_MAX,
                &mut settings.env_intensity,
            );

            response.model_rotation_changed = ui.slider(
                "rotation",
                -std::f32::consts::PI,
                std::f32::consts::PI,
                &mut settings.model_rotation_y,
            );

            ui.separator();

            response.light_changed |= ui.slider(
                "lightIntensity",
                0.0,
                LIGHT_INTENSITY_MAX,
                &mut light.intensity,
            );
            response.light_changed |= ui.slider(
                "lightX",
                -LIGHT_POSITION_RANGE,
                LIGHT_POSITION_RANGE,
                &mut light.position.x,
            );
            response.light_changed |= ui.slider(
                "lightY",
                -LIGHT_POSITION_RANGE,
                LIGHT_POSITION_RANGE,
                &mut light.position.y,
            );
            response.light_changed |= ui.slider(
                "lightZ",
                -LIGHT_POSITION_RANGE,
                LIGHT_POSITION_RANGE,
                &mut light.position.z,
            );

            ui.separator();

            let mut selected = ToneMapping::ALL
                .iter()
                .position(|t| *t == settings.tone_mapping)
                .unwrap_or(0);
            if ui.combo("toneMapping", &mut selected, &ToneMapping::ALL, |t| {
                std::borrow::Cow::from(t.label())
            }) {
                settings.tone_mapping = ToneMapping::ALL[selected];
                response.tone_mapping_committed = true;
            }

            response.exposure_changed = ui.slider(
                "toneMappingExposure",
                0.0,
                EXPOSURE_MAX,
                &mut settings.exposure,
            );
        });

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_sync_is_needed_for_intensity_and_tone_mapping_only() {
        let mut response = PanelResponse::default();
        assert!(!response.needs_material_sync());

        response.env_intensity_changed = true;
        assert!(response.needs_material_sync());

        let tone_only = PanelResponse {
            tone_mapping_committed: true,
            ..PanelResponse::default()
        };
        assert!(tone_only.needs_material_sync());

        let light_only = PanelResponse {
            light_changed: true,
            exposure_changed: true,
            ..PanelResponse::default()
        };
        assert!(!light_only.needs_material_sync());
        assert!(light_only.any_changed());
    }
}
