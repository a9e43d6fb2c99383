use crate::garden_core::environment::Season;
use crate::garden_runtime::GardenRuntime;

pub struct EnvironmentPanel {
    visible: bool,
}

impl EnvironmentPanel {
    pub fn new() -> Self {
        Self { visible: true }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Edits a copy of the weather and hands back only the fields that moved,
    /// so an unchanged frame does not bump the revision.
    pub fn ui(&mut self, ctx: &egui::Context, runtime: &mut GardenRuntime) {
        if !self.visible {
            return;
        }

        let env = runtime.environment().clone();
        let mut hour = env.time_of_day();
        let mut season = env.season();
        let mut rain = env.rain_intensity();
        let mut wind = env.wind_speed();
        let mut cloud = env.cloud_cover();
        let mut time_speed = env.time_speed();
        let mut day_speed = env.day_speed;

        egui::SidePanel::right("environment_panel")
            .default_width(240.0)
            .frame(
                egui::Frame::side_top_panel(ctx.style().as_ref())
                    .fill(egui::Color32::from_rgba_unmultiplied(30, 30, 30, 220)),
            )
            .show(ctx, |ui| {
                ui.heading("Environment");
                ui.separator();

                ui.add(egui::Slider::new(&mut hour, 0.0..=23.99).text("time of day"));
                egui::ComboBox::from_label("season")
                    .selected_text(season.as_str())
                    .show_ui(ui, |ui| {
                        for s in Season::ALL {
                            ui.selectable_value(&mut season, s, s.as_str());
                        }
                    });
                ui.add(egui::Slider::new(&mut rain, 0.0..=1.0).text("rain"));
                ui.add(egui::Slider::new(&mut wind, 0.0..=30.0).text("wind (m/s)"));
                ui.add(egui::Slider::new(&mut cloud, 0.0..=1.0).text("cloud cover"));

                ui.collapsing("Clock", |ui| {
                    ui.add(
                        egui::Slider::new(&mut time_speed, 0.0..=20.0)
                            .text("growth speed")
                            .logarithmic(true),
                    );
                    ui.add(egui::Slider::new(&mut day_speed, 0.0..=2.0).text("hours per second"));
                });

                ui.separator();
                let stats = runtime.stats();
                ui.small(format!("{} plants on this page, {} selected", stats.plants, stats.selected));
            });

        if hour != env.time_of_day() {
            runtime.set_time_of_day(hour);
        }
        if season != env.season() {
            runtime.set_season(season);
        }
        if rain != env.rain_intensity() {
            runtime.set_rain_intensity(rain);
        }
        if wind != env.wind_speed() {
            runtime.set_wind_speed(wind);
        }
        if cloud != env.cloud_cover() {
            runtime.set_cloud_cover(cloud);
        }
        if time_speed != env.time_speed() {
            runtime.set_time_speed(time_speed);
        }
        if day_speed != env.day_speed {
            runtime.set_day_speed(day_speed);
        }
    }
}

impl Default for EnvironmentPanel {
    fn default() -> Self {
        Self::new()
    }
}
