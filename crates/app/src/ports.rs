//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the control core and the outside world.
//! They are defined here (in `app`) so that both the core and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod broadcaster;
pub mod clock;
pub mod config_store;
pub mod history_log;
pub mod transport;

pub use broadcaster::Broadcaster;
pub use clock::{Clock, SystemClock};
pub use config_store::{ConfigKey, ConfigStore};
pub use history_log::{DEFAULT_HISTORY_LIMIT, HistoryCategory, HistoryLog, HistoryQuery, HistoryRecord};
pub use transport::Transport;
