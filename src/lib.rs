// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod clock;
pub mod data;
pub mod display;
pub mod documents;
pub mod i18n;
pub mod layout;
pub mod notes;
pub mod runtime;
pub mod settings;
pub mod sound;
pub mod storage;
pub mod theme;
pub mod timer;
