// src/ui/panel.rs
//! The lighting toggles panel

use crate::gfx::lighting::LightingMode;
use crate::performance::FpsHistory;

/// State edited by the lighting panel
///
/// Button presses and checkbox changes are recorded here and applied by the
/// app after the UI frame, once the scene and shaders are free to borrow.
#[derive(Debug, Clone, Default)]
pub struct LightingPanel {
    mode: LightingMode,
    pending_mode: Option<LightingMode>,
    simple_move_enabled: bool,
    simple_move_changed: bool,
}

impl LightingPanel {
    pub fn new(mode: LightingMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> LightingMode {
        self.mode
    }

    /// Selects a mode as if its button had been pressed
    pub fn select(&mut self, mode: LightingMode) {
        self.mode = mode;
        self.pending_mode = Some(mode);
    }

    /// Returns the mode chosen since the last call, if any
    pub fn take_mode_change(&mut self) -> Option<LightingMode> {
        self.pending_mode.take()
    }

    pub fn simple_move_enabled(&self) -> bool {
        self.simple_move_enabled
    }

    pub fn set_simple_move_enabled(&mut self, enabled: bool) {
        if self.simple_move_enabled != enabled {
            self.simple_move_enabled = enabled;
            self.simple_move_changed = true;
        }
    }

    /// Returns the new checkbox state if it changed since the last call
    pub fn take_simple_move_change(&mut self) -> Option<bool> {
        std::mem::take(&mut self.simple_move_changed).then_some(self.simple_move_enabled)
    }

    pub fn draw(&mut self, ui: &imgui::Ui, fps: &FpsHistory) {
        ui.window("Lighting Toggles")
            .size([420.0, 0.0], imgui::Condition::FirstUseEver)
            .position([10.0, 10.0], imgui::Condition::FirstUseEver)
            .always_auto_resize(true)
            .build(|| {
                for mode in LightingMode::ALL {
                    if ui.button(mode.button_label()) {
                        self.select(mode);
                    }
                }

                ui.text("Toggle Mode:");
                ui.same_line_with_spacing(0.0, 1.0);
                ui.text(self.mode.display_name());

                ui.separator();
                fps.render_ui(ui);

                ui.separator();
                let mut enabled = self.simple_move_enabled;
                if ui.checkbox("Move scenery with I/J/K/L/U/O", &mut enabled) {
                    self.set_simple_move_enabled(enabled);
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_change_is_reported_once() {
        let mut panel = LightingPanel::new(LightingMode::NoLighting);
        assert_eq!(panel.take_mode_change(), None);
        panel.select(LightingMode::Toon);
        assert_eq!(panel.mode(), LightingMode::Toon);
        assert_eq!(panel.take_mode_change(), Some(LightingMode::Toon));
        assert_eq!(panel.take_mode_change(), None);
    }

    #[test]
    fn test_checkbox_change_only_on_transition() {
        let mut panel = LightingPanel::default();
        panel.set_simple_move_enabled(false);
        assert_eq!(panel.take_simple_move_change(), None);
        panel.set_simple_move_enabled(true);
        assert_eq!(panel.take_simple_move_change(), Some(true));
        assert_eq!(panel.take_simple_move_change(), None);
    }
}
