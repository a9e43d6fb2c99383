use egui::{Color32, RichText};

use crate::garden_core::tool::ToolMode;
use crate::garden_runtime::GardenRuntime;

/// Requests the toolbar cannot carry out by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    Save,
    Load,
    ToggleEnvironment,
}

#[derive(Default)]
pub struct Toolbar {
    renaming: Option<(usize, String)>,
}

impl Toolbar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ui(&mut self, ctx: &egui::Context, runtime: &mut GardenRuntime) -> Option<ToolbarAction> {
        let mut action = None;
        self.shortcuts(ctx, runtime);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                for tool in ToolMode::ALL {
                    let label = format!("{} {}", tool.shortcut(), tool.label());
                    if ui.selectable_label(runtime.tool() == tool, label).clicked() {
                        runtime.set_tool(tool);
                    }
                }

                ui.separator();
                let mut snap = runtime.grid_snap();
                if ui.checkbox(&mut snap, "Snap").changed() {
                    runtime.set_grid_snap(snap);
                }
                let mut visible = runtime.grid_visible();
                if ui.checkbox(&mut visible, "Grid").changed() {
                    runtime.set_grid_visible(visible);
                }

                ui.separator();
                if ui.button("Environment").clicked() {
                    action = Some(ToolbarAction::ToggleEnvironment);
                }
                if ui.button("Save").clicked() {
                    action = Some(ToolbarAction::Save);
                }
                if ui.button("Load").clicked() {
                    action = Some(ToolbarAction::Load);
                }
            });

            ui.horizontal_wrapped(|ui| self.pages(ui, runtime));
        });

        action
    }

    fn pages(&mut self, ui: &mut egui::Ui, runtime: &mut GardenRuntime) {
        let active = runtime.project().active_index();
        let names: Vec<String> = runtime.project().pages().iter().map(|p| p.name.clone()).collect();

        for (index, name) in names.iter().enumerate() {
            if let Some((_, buffer)) = self.renaming.as_mut().filter(|r| r.0 == index) {
                let response = ui.text_edit_singleline(buffer);
                if response.lost_focus() {
                    let name = buffer.trim().to_string();
                    self.renaming = None;
                    if !name.is_empty() {
                        if let Err(e) = runtime.rename_page(index, name) {
                            log::warn!("rename failed: {e}");
                        }
                    }
                } else {
                    response.request_focus();
                }
                continue;
            }

            let text = RichText::new(name);
            let text = if index == active { text.color(Color32::WHITE).strong() } else { text };
            let response = ui.selectable_label(index == active, text);
            if response.clicked() && index != active {
                if let Err(e) = runtime.set_active_page(index) {
                    log::warn!("page switch failed: {e}");
                }
            }
            if response.double_clicked() {
                self.renaming = Some((index, name.clone()));
            }
        }

        ui.separator();
        if ui.small_button("+").on_hover_text("Add page").clicked() {
            let index = runtime.add_page(format!("Page {}", names.len() + 1));
            if let Err(e) = runtime.set_active_page(index) {
                log::warn!("page switch failed: {e}");
            }
        }
        if ui.small_button("Duplicate").clicked() {
            if let Err(e) = runtime.duplicate_page(active) {
                log::warn!("duplicate failed: {e}");
            }
        }
        let removable = names.len() > 1;
        if ui.add_enabled(removable, egui::Button::new("Remove").small()).clicked() {
            if let Err(e) = runtime.remove_page(active) {
                log::warn!("remove failed: {e}");
            }
        }
    }

    /// 1-6 pick tools, Delete removes the selection and Escape drops it.
    fn shortcuts(&self, ctx: &egui::Context, runtime: &mut GardenRuntime) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let keys = [
            (egui::Key::Num1, ToolMode::Select),
            (egui::Key::Num2, ToolMode::Move),
            (egui::Key::Num3, ToolMode::Add),
            (egui::Key::Num4, ToolMode::Delete),
            (egui::Key::Num5, ToolMode::Edit),
            (egui::Key::Num6, ToolMode::Terrain),
        ];
        for (key, tool) in keys {
            if ctx.input(|i| i.key_pressed(key)) {
                runtime.set_tool(tool);
            }
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Delete)) {
            runtime.delete_selected();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            if !runtime.cancel_drag() {
                runtime.clear_selection();
            }
        }
    }
}
