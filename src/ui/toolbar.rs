use crate::app::PresenceApp;
use crate::ui::theme;
use egui::{menu, RichText, Ui};
use egui_phosphor::regular as icons;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut PresenceApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_menu()), |ui| {
            if ui
                .button(format!("{}  Open Database File...", icons::FOLDER_OPEN))
                .clicked()
            {
                app.open_database_file();
                ui.close_menu();
            }
            if ui
                .button(format!("{}  Use Server", icons::GLOBE))
                .clicked()
            {
                app.use_server();
                ui.close_menu();
            }
            ui.separator();
            if ui
                .button(format!("{}  Export CSV...", icons::EXPORT))
                .clicked()
            {
                app.export_csv();
                ui.close_menu();
            }
            ui.separator();
            if ui.button(format!("{}  Settings...", icons::GEAR)).clicked() {
                app.open_settings();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            if ui.button("  Zoom In        Ctrl+Scroll ↑").clicked() {
                app.viewport.zoom_in();
                ui.close_menu();
            }
            if ui.button("  Zoom Out      Ctrl+Scroll ↓").clicked() {
                app.viewport.zoom_out();
                ui.close_menu();
            }
            if ui.button("  Fit to Data").clicked() {
                app.request_fit();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  Help  ").font(theme::font_menu()), |ui| {
            if ui.button("About").clicked() {
                app.show_about = true;
                ui.close_menu();
            }
        });

        // Right-aligned data source
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(
                RichText::new(app.source.describe())
                    .size(11.0)
                    .weak(),
            );
        });
    });
}
