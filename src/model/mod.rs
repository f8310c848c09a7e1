pub mod filter;
pub mod label;
pub mod presence;
pub mod refresh;
pub mod timeline;

pub use filter::{DisplayProperties, FilterForm, TickUnit};
pub use label::{build_label_rows, LabelRow};
pub use presence::{Dataset, PresenceLog, PresenceState};
pub use refresh::RefreshCountdown;
pub use timeline::TimelineViewport;
