//! Core logic for the notelist browser.
//!
//! Owns the note store gateway, live filtering, field binding, category
//! aggregation and action resolution. FFI and CLI layers are thin shells
//! over the `NoteBrowser` facade.

pub mod action;
pub mod binding;
pub mod config;
pub mod db;
pub mod filter;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use action::descriptor::{
    ActionDescriptor, ActionVerb, HandlerRef, InvalidSelectorContext, NoteRef, ResolutionEnv,
    SelectorContext, SelectorShape, Shortcut, TargetSelector,
};
pub use action::registry::{
    CapabilityDiscovery, CapabilityProvider, CapabilityRegistry, DiscoveryError, MatchCriterion,
    RegistryError, StaticCapability,
};
pub use action::resolver::{
    ActionGroup, ActionResolver, ResolveWarning, ResolvedAction, ResolvedActions,
};
pub use binding::format::{Background, DisplayLocale, DisplayValue, NoteBinder, NoteRow};
pub use config::{ListConfig, PreferenceStore, BACKGROUND_PALETTE, DEFAULT_BACKGROUND_COLOR};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use filter::engine::{FilterEngine, FilterState, FilterTicket};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::note::{NewNote, Note, NoteColor, NoteField, NoteId, NotePatch};
pub use repo::note_repo::{
    BulkUpdateReport, CategoryFilter, NoteFilter, NoteQuery, NoteSort, NoteStore, RepoError,
    RepoResult, SqliteNoteStore,
};
pub use repo::preference_repo::SqlitePreferenceStore;
pub use service::browser::{
    ActionOutcome, BrowseMode, BrowserError, ContextError, NoteBrowser, NoteClip,
};
pub use service::category_service::{
    CategoryError, CategoryProjection, CategoryService, ReassignSummary,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
