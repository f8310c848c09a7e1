use crate::app::PresenceApp;
use crate::config::Settings;
use crate::ui::theme;
use egui::{Color32, Context, RichText, Window};

/// Render the "Settings" dialog.
pub fn show_settings_dialog(app: &mut PresenceApp, ctx: &Context) {
    let mut apply = false;
    let mut save = false;
    let mut should_close = false;

    Window::new(RichText::new("Settings").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([380.0, 0.0])
        .show(ctx, |ui| {
            ui.visuals_mut().extreme_bg_color = theme::BG_FIELD;
            ui.add_space(4.0);

            let draft = &mut app.settings_draft;
            egui::Grid::new("settings_grid")
                .num_columns(2)
                .striped(false)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label(RichText::new("Server").color(theme::TEXT_SECONDARY));
                    ui.add_sized(
                        [240.0, 24.0],
                        egui::TextEdit::singleline(&mut draft.server)
                            .hint_text("http://host:5000"),
                    );
                    ui.end_row();

                    ui.label(RichText::new("Refresh every").color(theme::TEXT_SECONDARY));
                    ui.add(
                        egui::DragValue::new(&mut draft.refresh_secs)
                            .range(5..=3600)
                            .suffix(" s"),
                    );
                    ui.end_row();

                    ui.label(RichText::new("Time shift").color(theme::TEXT_SECONDARY));
                    ui.add(
                        egui::DragValue::new(&mut draft.time_shift_secs)
                            .range(-86_400..=86_400)
                            .speed(60)
                            .suffix(" s"),
                    );
                    ui.end_row();

                    ui.label(RichText::new("Request timeout").color(theme::TEXT_SECONDARY));
                    ui.add(
                        egui::DragValue::new(&mut draft.timeout_secs)
                            .range(1..=300)
                            .suffix(" s"),
                    );
                    ui.end_row();

                    ui.label(RichText::new("Database file").color(theme::TEXT_SECONDARY));
                    let file = draft
                        .db_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "(server)".to_string());
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(file).size(11.0).weak());
                        if draft.db_path.is_some() && ui.small_button("Clear").clicked() {
                            draft.db_path = None;
                        }
                    });
                    ui.end_row();
                });

            ui.add_space(6.0);
            ui.separator();
            ui.add_space(4.0);

            ui.horizontal(|ui| {
                let save_btn = egui::Button::new(RichText::new("Save").color(Color32::WHITE))
                    .fill(theme::ACCENT)
                    .rounding(egui::Rounding::same(4.0));
                if ui.add_sized([80.0, 28.0], save_btn).clicked() {
                    save = true;
                    should_close = true;
                }
                if ui.add_sized([80.0, 28.0], egui::Button::new("Apply")).clicked() {
                    apply = true;
                    should_close = true;
                }
                if ui.add_sized([80.0, 28.0], egui::Button::new("Cancel")).clicked() {
                    should_close = true;
                }
                if ui.button("Open Config Folder").clicked() {
                    match Settings::config_dir() {
                        Ok(dir) => {
                            if let Err(e) = std::fs::create_dir_all(&dir).and_then(|_| open::that(&dir)) {
                                tracing::warn!("could not open {}: {}", dir.display(), e);
                            }
                        }
                        Err(e) => tracing::warn!("{}", e),
                    }
                }
            });
            ui.add_space(2.0);
        });

    if save || apply {
        app.apply_settings(save);
    }
    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_settings = false;
    }
}

/// Render the "About" dialog.
pub fn show_about_dialog(app: &mut PresenceApp, ctx: &Context) {
    let mut should_close = false;
    Window::new("About")
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([300.0, 180.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading(RichText::new("Presence Gantt").strong());
                ui.add_space(2.0);
                ui.label(
                    RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
                        .color(theme::TEXT_SECONDARY),
                );
                ui.add_space(10.0);
                ui.label("A presence timeline viewer");
                ui.label("built with Rust and egui.");
                ui.add_space(14.0);
                if ui.add_sized([100.0, 28.0], egui::Button::new("Close")).clicked() {
                    should_close = true;
                }
            });
        });
    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_about = false;
    }
}
