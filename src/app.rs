use std::time::{Duration, Instant};

use chrono::Utc;

use crate::config::Settings;
use crate::io::fetch::LoadOutcome;
use crate::io::{DataSource, Loader};
use crate::model::label::time_span;
use crate::model::refresh::TICK_INTERVAL;
use crate::model::{
    build_label_rows, Dataset, DisplayProperties, FilterForm, LabelRow, RefreshCountdown,
    TimelineViewport,
};
use crate::ui;

/// Message shown in the status bar.
#[derive(Debug, Clone)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
}

/// Main application state.
pub struct PresenceApp {
    pub settings: Settings,
    pub source: DataSource,
    pub dataset: Option<Dataset>,

    // Filter state: the form being edited and what is currently applied
    pub form: FilterForm,
    applied_form: FilterForm,
    pub properties: DisplayProperties,

    pub rows: Vec<LabelRow>,
    pub viewport: TimelineViewport,
    fit_pending: bool,
    hovered: Option<(usize, usize)>,

    loader: Loader,
    countdown: RefreshCountdown,
    ctx: egui::Context,

    pub status: Status,

    // Dialog state
    pub show_about: bool,
    pub show_settings: bool,
    pub settings_draft: Settings,
}

impl PresenceApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);
        egui_extras::install_image_loaders(&cc.egui_ctx);
        ui::theme::apply_theme(&cc.egui_ctx);

        let source = DataSource::from_settings(&settings);
        let countdown =
            RefreshCountdown::new(Duration::from_secs(settings.refresh_secs), Instant::now());

        let mut app = Self {
            settings_draft: settings.clone(),
            settings,
            source,
            dataset: None,
            form: FilterForm::default(),
            applied_form: FilterForm::default(),
            properties: DisplayProperties::default(),
            rows: Vec::new(),
            viewport: TimelineViewport::default(),
            fit_pending: true,
            hovered: None,
            loader: Loader::new(),
            countdown,
            ctx: cc.egui_ctx.clone(),
            status: Status {
                text: "Ready".to_string(),
                is_error: false,
            },
            show_about: false,
            show_settings: false,
        };
        app.refresh();
        app
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status = Status {
            text: text.into(),
            is_error: false,
        };
    }

    fn set_error(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::warn!("{}", text);
        self.status = Status {
            text,
            is_error: true,
        };
    }

    // --- Loading ---

    /// Refetch the presence log and restart the countdown.
    pub fn refresh(&mut self) {
        self.countdown.reset(Instant::now());
        let timeout = Duration::from_secs(self.settings.timeout_secs.max(1));
        let generation = self.loader.request(self.source.clone(), timeout, &self.ctx);
        tracing::debug!(generation, "refresh requested from {}", self.source.describe());
        self.set_status(format!("Loading {}...", self.source.describe()));
    }

    fn handle_load(&mut self, outcome: LoadOutcome) {
        match outcome.result {
            Ok(log) => {
                let dataset = Dataset::new(log, Utc::now());
                // Re-resolve the applied user pattern against the fresh user list
                match self.applied_form.build(Some(&dataset)) {
                    Ok(props) => self.properties = props,
                    Err(e) => tracing::warn!("keeping previous filter: {}", e),
                }
                let users = dataset.users.len();
                let intervals = dataset.interval_count();
                self.dataset = Some(dataset);
                self.rebuild_rows();
                self.set_status(format!(
                    "Loaded {} users, {} intervals from {}",
                    users,
                    intervals,
                    outcome.source.describe()
                ));
            }
            Err(e) => {
                // Previously loaded data stays on screen
                self.set_error(format!("Load failed: {}", e));
            }
        }
    }

    fn rebuild_rows(&mut self) {
        self.rows = match &self.dataset {
            Some(dataset) => {
                build_label_rows(dataset, &self.properties, self.settings.time_shift_secs)
            }
            None => Vec::new(),
        };
        self.hovered = None;
        tracing::debug!(rows = self.rows.len(), "rebuilt chart rows");
    }

    pub fn request_fit(&mut self) {
        self.fit_pending = true;
    }

    // --- Filtering ---

    pub fn apply_filter(&mut self) {
        match self.form.build(self.dataset.as_ref()) {
            Ok(props) => {
                self.properties = props;
                self.applied_form = self.form.clone();
                self.rebuild_rows();
                self.fit_pending = true;
                self.set_status(format!("Filter applied: {} rows", self.rows.len()));
            }
            Err(e) => self.set_error(format!("Filter rejected: {}", e)),
        }
    }

    pub fn reset_filter(&mut self) {
        self.form = FilterForm::default();
        self.applied_form = FilterForm::default();
        self.properties = DisplayProperties::default();
        self.rebuild_rows();
        self.fit_pending = true;
        self.set_status("Filter reset");
    }

    // --- Sources and files ---

    pub fn open_database_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Presence database", &["json"])
            .pick_file()
        {
            self.settings.db_path = Some(path.clone());
            self.source = DataSource::File(path);
            self.fit_pending = true;
            self.refresh();
        }
    }

    pub fn use_server(&mut self) {
        self.settings.db_path = None;
        self.source = DataSource::from_settings(&self.settings);
        self.fit_pending = true;
        self.refresh();
    }

    pub fn export_csv(&mut self) {
        if self.rows.is_empty() {
            self.set_status("Nothing to export: no rows are displayed");
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name("presence.csv")
            .save_file()
        {
            match crate::io::csv_export::export_csv(&self.rows, &path) {
                Ok(count) => self.set_status(format!("Exported {} intervals to CSV", count)),
                Err(e) => self.set_error(e.to_string()),
            }
        }
    }

    // --- Settings ---

    pub fn open_settings(&mut self) {
        self.settings_draft = self.settings.clone();
        self.show_settings = true;
    }

    pub fn apply_settings(&mut self, persist: bool) {
        let draft = self.settings_draft.clone();
        let source_changed =
            draft.server != self.settings.server || draft.db_path != self.settings.db_path;
        let shift_changed = draft.time_shift_secs != self.settings.time_shift_secs;

        self.countdown
            .set_period(Duration::from_secs(draft.refresh_secs), Instant::now());
        self.settings = draft;

        if persist {
            match self.settings.save() {
                Ok(path) => self.set_status(format!("Settings saved to {}", path.display())),
                Err(e) => self.set_error(format!("Could not save settings: {}", e)),
            }
        }
        if shift_changed {
            self.rebuild_rows();
            self.fit_pending = true;
        }
        if source_changed {
            self.source = DataSource::from_settings(&self.settings);
            self.fit_pending = true;
            self.refresh();
        }
    }
}

impl eframe::App for PresenceApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        if let Some(outcome) = self.loader.poll() {
            self.handle_load(outcome);
        }
        if self.countdown.is_due(now) {
            tracing::debug!("auto refresh");
            self.refresh();
        }
        // Keeps the countdown caption ticking
        ctx.request_repaint_after(TICK_INTERVAL);

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    let color = if self.status.is_error {
                        ui::theme::TEXT_ERROR
                    } else {
                        ui::theme::TEXT_SECONDARY
                    };
                    ui.label(egui::RichText::new(&self.status.text).size(11.0).color(color));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let loaded = self
                            .dataset
                            .as_ref()
                            .map(|d| {
                                d.loaded_at
                                    .with_timezone(&chrono::Local)
                                    .format("%H:%M:%S")
                                    .to_string()
                            })
                            .unwrap_or_else(|| "never".to_string());
                        let mut text = format!("Rows: {} · Loaded: {}", self.rows.len(), loaded);
                        if let Some((row, _)) = self.hovered {
                            if let Some(row) = self.rows.get(row) {
                                text = format!("{} · {}", row.label.trim(), text);
                            }
                        }
                        ui.label(
                            egui::RichText::new(text)
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        // Left panel: filters + update button
        let mut auto_refresh = !self.countdown.paused;
        let caption = self.countdown.caption("Update", now);
        let loading = self.loader.is_loading();
        let mut action = ui::filter_panel::FilterPanelAction::None;
        egui::SidePanel::left("filter_panel")
            .default_width(ui::theme::SIDE_PANEL_WIDTH)
            .resizable(true)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_PANEL)
                    .inner_margin(egui::Margin::same(10.0))
                    .stroke(egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE)),
            )
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    action = ui::filter_panel::show_filter_panel(
                        &mut self.form,
                        &caption,
                        loading,
                        &mut auto_refresh,
                        ui,
                    );
                });
            });

        if auto_refresh == self.countdown.paused {
            self.countdown.paused = !auto_refresh;
            self.countdown.reset(now);
        }
        match action {
            ui::filter_panel::FilterPanelAction::Apply => self.apply_filter(),
            ui::filter_panel::FilterPanelAction::Reset => self.reset_filter(),
            ui::filter_panel::FilterPanelAction::Refresh => self.refresh(),
            ui::filter_panel::FilterPanelAction::None => {}
        }

        // Central panel: presence chart
        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        egui::CentralPanel::default().frame(chart_frame).show(ctx, |ui| {
            if self.fit_pending {
                if let Some((start, end)) = time_span(&self.rows) {
                    let width = ui.available_width() - ui::theme::LABEL_WIDTH;
                    self.viewport.fit(start, end, width);
                    self.fit_pending = false;
                }
            }

            if self.rows.is_empty() {
                ui.centered_and_justified(|ui| {
                    let text = if self.dataset.is_none() {
                        if loading {
                            "Loading presence data..."
                        } else {
                            "No presence data loaded"
                        }
                    } else {
                        "No intervals match the current filter"
                    };
                    ui.label(
                        egui::RichText::new(text)
                            .size(14.0)
                            .color(ui::theme::TEXT_DIM),
                    );
                });
                return;
            }

            let now_ms = Utc::now()
                .timestamp_millis()
                .saturating_sub(self.settings.time_shift_secs.saturating_mul(1000));
            let interaction = ui::gantt_chart::show_presence_chart(
                &self.rows,
                &self.properties,
                &mut self.viewport,
                now_ms,
                ui,
            );
            self.hovered = interaction.hovered;
        });

        // Dialogs
        if self.show_settings {
            ui::dialogs::show_settings_dialog(self, ctx);
        }
        if self.show_about {
            ui::dialogs::show_about_dialog(self, ctx);
        }
    }
}
