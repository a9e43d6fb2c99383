use crate::garden_core::catalogue::{PlantCategory, PlantId};
use crate::garden_runtime::GardenRuntime;

#[derive(Default)]
pub struct CataloguePanel {
    query: String,
    category: Option<PlantCategory>,
}

impl CataloguePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ui(&mut self, ctx: &egui::Context, runtime: &mut GardenRuntime) {
        if !runtime.catalogue_open() {
            return;
        }

        let mut picked: Option<PlantId> = None;
        let selected = runtime.selected_plant().map(|p| p.id);

        egui::SidePanel::left("catalogue_panel")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Plants");
                ui.text_edit_singleline(&mut self.query);

                let categories = runtime.catalogue().categories();
                egui::ComboBox::from_id_salt("catalogue_category")
                    .selected_text(self.category.map_or("All", PlantCategory::label))
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut self.category, None, "All");
                        for category in categories {
                            ui.selectable_value(&mut self.category, Some(category), category.label());
                        }
                    });
                ui.separator();

                egui::ScrollArea::vertical().show(ui, |ui| {
                    let mut shown = 0;
                    for plant in runtime.catalogue().search(&self.query, self.category) {
                        shown += 1;
                        let response = ui
                            .selectable_label(selected == Some(plant.id), &plant.name)
                            .on_hover_text(&plant.description);
                        if response.clicked() {
                            picked = Some(plant.id);
                        }
                        if let Some(scientific) = &plant.scientific_name {
                            ui.small(egui::RichText::new(scientific).italics());
                        }
                    }
                    if shown == 0 {
                        ui.label("No plants match.");
                    }
                });

                if let Some(plant) = runtime.selected_plant() {
                    ui.separator();
                    ui.strong(&plant.name);
                    ui.label(format!("{} · {:.1} m tall, {:.1} m wide", plant.category.label(), plant.height, plant.spread));
                    ui.label(&plant.description);
                    ui.small("Click the ground to place.");
                }
            });

        if let Some(id) = picked {
            if let Err(e) = runtime.select_catalogue_entry(Some(id)) {
                log::warn!("catalogue selection failed: {e}");
            }
        }
    }
}
