use crate::garden_core::instance::{Customization, InstanceId, Override, PlacedPlant};
use crate::garden_core::tool::ToolMode;
use crate::garden_runtime::GardenRuntime;
use crate::lookup::{LookupState, MediaLookup};

/// Working copy of the overrides for the plant being edited.
#[derive(Debug, Clone, PartialEq)]
struct Draft {
    id: InstanceId,
    height: Option<f32>,
    spread: Option<f32>,
    color: String,
}

impl Draft {
    fn of(plant: &PlacedPlant) -> Self {
        Self {
            id: plant.id,
            height: plant.customization.height.clone().into_option(),
            spread: plant.customization.spread.clone().into_option(),
            color: plant.customization.color.clone().into_option().unwrap_or_default(),
        }
    }

    fn customization(&self) -> Customization {
        let color = self.color.trim();
        Customization {
            color: (!color.is_empty()).then(|| color.to_string()).into(),
            height: self.height.into(),
            spread: self.spread.into(),
        }
    }
}

#[derive(Default)]
pub struct Inspector {
    draft: Option<Draft>,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows the plant being edited, or the only selected plant.
    pub fn ui(&mut self, ctx: &egui::Context, runtime: &mut GardenRuntime, lookup: &mut MediaLookup) {
        let Some(plant) = focused_plant(runtime).cloned() else {
            self.draft = None;
            return;
        };
        let editable = runtime.tool() == ToolMode::Edit;
        if self.draft.as_ref().is_none_or(|d| d.id != plant.id) {
            self.draft = Some(Draft::of(&plant));
        }

        let mut apply = None;
        egui::Window::new("Plant")
            .id(egui::Id::new("inspector"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -12.0])
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                ui.strong(&plant.definition.name);
                if let Some(scientific) = &plant.definition.scientific_name {
                    ui.label(egui::RichText::new(scientific).italics());
                }
                ui.label(format!(
                    "health {:.0} · growth {:.2}",
                    plant.health, plant.growth_rate
                ));
                ui.small(format!(
                    "at ({:.2}, {:.2}, {:.2}), scale {:.2}",
                    plant.position.x, plant.position.y, plant.position.z, plant.scale.y
                ));

                if let Some(draft) = self.draft.as_mut().filter(|_| editable) {
                    ui.separator();
                    override_slider(ui, "height", &mut draft.height, plant.definition.height, 0.05..=30.0);
                    override_slider(ui, "spread", &mut draft.spread, plant.definition.spread, 0.05..=20.0);
                    ui.horizontal(|ui| {
                        ui.label("colour");
                        ui.text_edit_singleline(&mut draft.color);
                    });
                    ui.horizontal(|ui| {
                        if ui.button("Apply").clicked() {
                            apply = Some(draft.customization());
                        }
                        if ui.button("Reset").clicked() {
                            apply = Some(Customization::default());
                        }
                    });
                }

                ui.separator();
                media_section(ui, &plant, lookup);
            });

        if let Some(customization) = apply {
            match runtime.customize(plant.id, customization) {
                Ok(()) => {
                    if let Some(edited) = runtime.active_page().get(plant.id) {
                        self.draft = Some(Draft::of(edited));
                    }
                }
                Err(e) => log::warn!("customize failed: {e}"),
            }
        }
    }
}

fn focused_plant(runtime: &GardenRuntime) -> Option<&PlacedPlant> {
    if let Some(plant) = runtime.editing() {
        return Some(plant);
    }
    let mut selected = runtime.selection().iter();
    match (selected.next(), selected.next()) {
        (Some(id), None) => runtime.active_page().get(id),
        _ => None,
    }
}

fn override_slider(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut Option<f32>,
    nominal: f32,
    range: std::ops::RangeInclusive<f32>,
) {
    ui.horizontal(|ui| {
        let mut set = value.is_some();
        ui.checkbox(&mut set, label);
        match (set, value.as_mut()) {
            (true, Some(v)) => {
                ui.add(egui::Slider::new(v, range));
            }
            (true, None) => *value = Some(nominal),
            (false, _) => {
                *value = None;
                ui.weak(format!("{nominal:.2} (catalogue)"));
            }
        }
    });
}

fn media_section(ui: &mut egui::Ui, plant: &PlacedPlant, lookup: &mut MediaLookup) {
    let key = plant.definition.lookup_key().to_string();
    match lookup.request(&key).clone() {
        LookupState::Pending => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("looking up media");
            });
        }
        LookupState::Ready(media) => {
            match &media.image_url {
                Some(url) => {
                    ui.hyperlink_to("Image", url);
                }
                None => {
                    ui.weak("no image found");
                }
            }
            for link in &media.links {
                ui.hyperlink_to(&link.title, &link.url);
            }
        }
        LookupState::Unavailable(reason) => {
            ui.weak(format!("media unavailable: {reason}"));
            if ui.small_button("Retry").clicked() {
                lookup.retry(&key);
            }
        }
    }
    if let Some(href) = &plant.definition.href {
        ui.hyperlink_to("Catalogue reference", href);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::garden_core::catalogue::Catalogue;

    #[test]
    fn draft_round_trips_overrides() {
        let def = Catalogue::builtin().first().cloned().unwrap();
        let mut plant = PlacedPlant::new(InstanceId(4), def, Vec3::ZERO, 0.0, Vec3::ONE);
        plant.customization.height = Override::Set(1.25);

        let mut draft = Draft::of(&plant);
        assert_eq!(draft.height, Some(1.25));
        assert_eq!(draft.spread, None);

        draft.color = "  ".to_string();
        let customization = draft.customization();
        assert_eq!(customization.height, Override::Set(1.25));
        assert_eq!(customization.color, Override::Unset);

        draft.color = " purple ".to_string();
        assert_eq!(draft.customization().color, Override::Set("purple".to_string()));
    }
}
