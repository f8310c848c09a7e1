pub mod dialogs;
pub mod filter_panel;
pub mod gantt_chart;
pub mod theme;
pub mod toolbar;
