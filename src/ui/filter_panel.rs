use crate::model::{FilterForm, PresenceState, TickUnit};
use crate::ui::theme;
use egui::{Color32, RichText, Ui};
use egui_phosphor::regular as icons;

/// Actions the filter panel can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPanelAction {
    None,
    Apply,
    Reset,
    Refresh,
}

/// Render the left-side filter controls.
pub fn show_filter_panel(
    form: &mut FilterForm,
    update_caption: &str,
    loading: bool,
    auto_refresh: &mut bool,
    ui: &mut Ui,
) -> FilterPanelAction {
    let mut action = FilterPanelAction::None;

    ui.add_space(4.0);
    let update_btn = egui::Button::new(
        RichText::new(format!("{}  {}", icons::ARROWS_CLOCKWISE, update_caption))
            .color(Color32::WHITE),
    )
    .fill(theme::ACCENT)
    .rounding(egui::Rounding::same(5.0));
    ui.horizontal(|ui| {
        // Stays clickable while loading: a new request supersedes a stuck one
        if ui
            .add(update_btn)
            .on_hover_text("Fetch the presence log again")
            .clicked()
        {
            action = FilterPanelAction::Refresh;
        }
        if loading {
            ui.spinner();
        }
    });
    ui.checkbox(auto_refresh, "Auto refresh");

    section(ui, "States");
    ui.horizontal(|ui| {
        state_checkbox(ui, &mut form.online, PresenceState::Online, "Online");
        state_checkbox(ui, &mut form.active, PresenceState::Active, "Active");
        state_checkbox(ui, &mut form.mobile, PresenceState::Mobile, "Mobile");
    });
    hint(ui, "None checked shows every state.");

    section(ui, "Users");
    let pattern = ui.add(
        egui::TextEdit::singleline(&mut form.user_pattern)
            .hint_text("Regex, e.g. ^(alice|bob)")
            .desired_width(f32::INFINITY),
    );
    if pattern.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
        action = FilterPanelAction::Apply;
    }

    section(ui, "Time range (epoch seconds)");
    egui::Grid::new("range_grid")
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui| {
            ui.label(RichText::new("From").color(theme::TEXT_SECONDARY));
            ui.add(egui::TextEdit::singleline(&mut form.from).hint_text("start"));
            ui.end_row();
            ui.label(RichText::new("To").color(theme::TEXT_SECONDARY));
            ui.add(egui::TextEdit::singleline(&mut form.to).hint_text("end"));
            ui.end_row();
        });
    hint(ui, "Empty or 0 leaves the bound open.");

    section(ui, "Tick labels");
    ui.horizontal_wrapped(|ui| {
        ui.checkbox(&mut form.tick_year, "Year");
        ui.checkbox(&mut form.tick_month, "Month");
        ui.checkbox(&mut form.tick_day, "Day");
        ui.checkbox(&mut form.tick_weekday, "Weekday");
        ui.checkbox(&mut form.tick_hour, "Hour");
        ui.checkbox(&mut form.tick_minute, "Minute");
    });
    hint(ui, &format!("Format: {}", display_format(&form.tick_format())));

    section(ui, "Tick every");
    ui.horizontal(|ui| {
        ui.add(
            egui::TextEdit::singleline(&mut form.tick_frequency)
                .desired_width(40.0)
                .hint_text("1"),
        );
        ui.label(form.tick_unit.label().to_lowercase());
    });
    ui.horizontal_wrapped(|ui| {
        for unit in TickUnit::ALL {
            ui.radio_value(&mut form.tick_unit, unit, unit.label());
        }
    });

    ui.add_space(10.0);
    ui.separator();
    ui.horizontal(|ui| {
        let filter_btn = egui::Button::new(
            RichText::new(format!("{}  Filter", icons::FUNNEL)).color(Color32::WHITE),
        )
        .fill(theme::ACCENT)
        .rounding(egui::Rounding::same(4.0));
        if ui.add_sized([110.0, 28.0], filter_btn).clicked() {
            action = FilterPanelAction::Apply;
        }
        if ui
            .add_sized(
                [110.0, 28.0],
                egui::Button::new(format!("{}  Reset", icons::ARROW_COUNTER_CLOCKWISE)),
            )
            .clicked()
        {
            action = FilterPanelAction::Reset;
        }
    });

    action
}

fn section(ui: &mut Ui, title: &str) {
    ui.add_space(8.0);
    ui.label(RichText::new(title).strong().size(12.0).color(theme::TEXT_PRIMARY));
}

fn hint(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).size(10.0).color(theme::TEXT_DIM));
}

fn state_checkbox(ui: &mut Ui, value: &mut bool, state: PresenceState, text: &str) {
    let glyph = state.glyph();
    let caption = if glyph.is_empty() {
        RichText::new(text)
    } else {
        RichText::new(format!("{} {}", text, glyph))
    };
    ui.checkbox(value, caption.color(theme::state_color(state)));
}

fn display_format(format: &str) -> &str {
    if format.is_empty() {
        "(no labels)"
    } else {
        format
    }
}
