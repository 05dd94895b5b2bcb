// Production Stats - Core Library
// Exposes all modules for use in the CLI, the terminal menu, and tests

pub mod resource;    // Item identity, quality tiers, stock entries
pub mod calendar;    // In-game dates and the date provider
pub mod tracker;     // Event log + windowed rollups
pub mod persistence; // Save-data store, tracker save/restore
pub mod holdings;    // Storage sources + stock snapshot
pub mod search;      // Live text filter
pub mod sort;        // Sort-order rotation
pub mod scroll;      // Scroll clamp
pub mod view;        // Per-page presentation model
pub mod session;     // Notification dispatcher + menu state
pub mod config;      // Key bindings and settings

// Re-export commonly used types
pub use resource::{ItemStack, Quality, Resource, ResourceKey, StockEntry};
pub use calendar::{CalendarDate, CalendarError, DateProvider, ManualCalendar, Season};
pub use tracker::{InventoryTracker, ProductionWindow, TrackedEvent};
pub use persistence::{
    load_tracker, save_tracker, read_json, write_json, write_csv,
    ExportRow, MemorySaveStore, PersistenceError, SaveDataStore, SqliteSaveStore, TrackerState,
};
pub use holdings::{
    build_snapshot, HoldingsSource, OwnerId,
    ChestContainer, FurnitureContainer, PlayerInventory, ShippingBinContainer, WorldHoldings,
};
pub use search::{filter, SearchQuery};
pub use sort::{SortCycle, SortOrder};
pub use scroll::ScrollState;
pub use view::{Page, Presentation, ProductionView};
pub use session::{sort_message, Notification, Session, SessionError};
pub use config::{ConfigError, ControlsConfig, KeyBinding, StatsConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
