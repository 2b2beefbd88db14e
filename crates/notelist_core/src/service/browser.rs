//! Note browser facade.
//!
//! # Responsibility
//! - Expose the presentation boundary: filter text, refresh, action
//!   resolution and execution, category listing/deletion, list background.
//! - Compose the filter engine, binder, resolver and category service over
//!   one note store.
//!
//! # Invariants
//! - Nothing refreshes implicitly; callers pull with `refresh()` after
//!   mutations.
//! - An action is only executed when it is currently offered for the given
//!   context.

use crate::action::builtin::{
    Eligibility, HANDLER_BACKGROUND_COLOR, HANDLER_COPY, HANDLER_DELETE, HANDLER_INSERT,
    HANDLER_OPEN, HANDLER_PASTE,
};
use crate::action::descriptor::{
    HandlerRef, InvalidSelectorContext, NoteRef, ResolutionEnv, SelectorContext, SelectorShape,
    TargetSelector,
};
use crate::action::registry::CapabilityDiscovery;
use crate::action::resolver::{ActionResolver, ResolveWarning, ResolvedActions};
use crate::binding::format::{DisplayLocale, NoteBinder, NoteRow};
use crate::config::{ListConfig, PreferenceStore};
use crate::filter::engine::{FilterEngine, FilterTicket};
use crate::model::note::{NewNote, Note, NoteId};
use crate::repo::note_repo::{NoteStore, RepoError, RepoResult};
use crate::service::category_service::{
    CategoryError, CategoryProjection, CategoryService, ReassignSummary,
};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Clipboard label used for copied notes.
pub const NOTE_CLIP_LABEL: &str = "Note";

/// Why the list is being browsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowseMode {
    /// Normal browsing; activating a note opens it.
    #[default]
    Edit,
    /// Picking a note for another component; the list is read-only and
    /// activating a note returns it.
    Pick,
}

/// Clipboard payload produced by the copy action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteClip {
    pub label: String,
    pub note_id: NoteId,
    pub uri: String,
}

impl NoteClip {
    pub fn for_note(note_id: NoteId) -> Self {
        Self {
            label: NOTE_CLIP_LABEL.to_string(),
            note_id,
            uri: note_uri(note_id),
        }
    }
}

/// What the presentation layer should do after an action ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Open the editor on this note.
    Edit(NoteId),
    /// A new empty note was inserted; open the editor on it.
    Created(NoteId),
    /// Open the editor in paste mode.
    PasteRequested,
    /// Show the background palette with this entry preselected.
    ChooseBackground { selected_index: usize },
    /// Put this clip on the clipboard.
    Copied(NoteClip),
    Deleted(NoteId),
    /// Hand the note back to the component that asked for a pick.
    Picked(NoteId),
    /// Alternative action: dispatch to its provider.
    Delegated {
        handler: HandlerRef,
        context: SelectorContext,
    },
}

/// Browser facade error.
#[derive(Debug)]
pub enum BrowserError {
    Repo(RepoError),
    Category(CategoryError),
    InvalidContext(InvalidSelectorContext),
    /// A built-in was invoked against the wrong kind of selection.
    ContextMismatch {
        handler: String,
        expected: TargetSelector,
    },
    /// A mutating built-in was invoked while picking.
    ReadOnly(String),
    /// The handler is not offered for this context right now.
    UnknownHandler(String),
}

impl Display for BrowserError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Category(err) => write!(f, "{err}"),
            Self::InvalidContext(err) => write!(f, "{err}"),
            Self::ContextMismatch { handler, expected } => {
                write!(f, "action `{handler}` expects a {expected:?} selection")
            }
            Self::ReadOnly(handler) => {
                write!(f, "action `{handler}` is not allowed while picking a note")
            }
            Self::UnknownHandler(handler) => {
                write!(f, "action `{handler}` is not available for this selection")
            }
        }
    }
}

impl Error for BrowserError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Category(err) => Some(err),
            Self::InvalidContext(err) => Some(err),
            Self::ContextMismatch { .. } | Self::ReadOnly(_) | Self::UnknownHandler(_) => None,
        }
    }
}

impl From<RepoError> for BrowserError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<CategoryError> for BrowserError {
    fn from(value: CategoryError) -> Self {
        Self::Category(value)
    }
}

impl From<InvalidSelectorContext> for BrowserError {
    fn from(value: InvalidSelectorContext) -> Self {
        Self::InvalidContext(value)
    }
}

/// Failure to turn a selection shape into a resolvable context.
#[derive(Debug)]
pub enum ContextError {
    Repo(RepoError),
    Invalid(InvalidSelectorContext),
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Invalid(err) => Some(err),
        }
    }
}

impl From<RepoError> for ContextError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<InvalidSelectorContext> for ContextError {
    fn from(value: InvalidSelectorContext) -> Self {
        Self::Invalid(value)
    }
}

impl From<ContextError> for BrowserError {
    fn from(value: ContextError) -> Self {
        match value {
            ContextError::Repo(err) => Self::Repo(err),
            ContextError::Invalid(err) => Self::InvalidContext(err),
        }
    }
}

/// Presentation-boundary facade over one note store.
pub struct NoteBrowser<S: NoteStore> {
    store: S,
    discovery: Arc<dyn CapabilityDiscovery>,
    filter: FilterEngine,
    resolver: ActionResolver,
    binder: NoteBinder,
    config: ListConfig,
    mode: BrowseMode,
    clipboard_has_note: bool,
}

impl<S: NoteStore> NoteBrowser<S> {
    pub fn new(store: S, discovery: Arc<dyn CapabilityDiscovery>) -> Self {
        Self {
            store,
            discovery,
            filter: FilterEngine::new(),
            resolver: ActionResolver::new(),
            binder: NoteBinder::default(),
            config: ListConfig::default(),
            mode: BrowseMode::default(),
            clipboard_has_note: false,
        }
    }

    pub fn with_locale(mut self, locale: DisplayLocale) -> Self {
        self.binder = NoteBinder::new(locale);
        self
    }

    pub fn with_config(mut self, config: ListConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_mode(mut self, mode: BrowseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn mode(&self) -> BrowseMode {
        self.mode
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    pub fn binder(&self) -> &NoteBinder {
        &self.binder
    }

    pub fn filter_text(&self) -> &str {
        &self.filter.state().query_text
    }

    /// Tells the resolver whether the system clipboard holds a note.
    pub fn set_clipboard_has_note(&mut self, has_note: bool) {
        self.clipboard_has_note = has_note;
    }

    /// Replaces the filter text and returns the freshly filtered list.
    pub fn set_filter_text(&mut self, text: &str) -> RepoResult<Vec<Note>> {
        self.filter.set_query(&self.store, text)
    }

    /// Re-reads the list for the current filter text.
    pub fn refresh(&mut self) -> RepoResult<Vec<Note>> {
        self.filter.refresh(&self.store)
    }

    /// Starts a filter run whose result may later be superseded.
    pub fn request_filter(&mut self, text: &str) -> FilterTicket {
        self.filter.request(text)
    }

    pub fn run_filter(&self, ticket: &FilterTicket) -> RepoResult<Vec<Note>> {
        self.filter.run(&self.store, ticket)
    }

    /// Returns `notes` only if `ticket` is still the latest filter request.
    pub fn accept_filter(&self, ticket: &FilterTicket, notes: Vec<Note>) -> Option<Vec<Note>> {
        self.filter.accept(ticket, notes)
    }

    /// Binds notes to list rows.
    pub fn rows(&self, notes: &[Note]) -> Vec<NoteRow> {
        notes.iter().map(|note| self.binder.bind_row(note)).collect()
    }

    /// Builds the selector context for a parsed shape, looking the note up.
    pub fn context_for(&self, shape: SelectorShape) -> Result<SelectorContext, ContextError> {
        match shape {
            SelectorShape::Collection => Ok(SelectorContext::NoSelection),
            SelectorShape::Note(id) => {
                let note = self
                    .store
                    .get(id)?
                    .ok_or(InvalidSelectorContext::UnknownNote(id))?;
                Ok(SelectorContext::Single(NoteRef {
                    id: note.id,
                    category: note.category,
                }))
            }
        }
    }

    fn env(&self) -> ResolutionEnv {
        ResolutionEnv {
            clipboard_has_note: self.clipboard_has_note,
            read_only: self.mode == BrowseMode::Pick,
        }
    }

    /// Ordered actions for `context`. Discovery runs on every call.
    pub fn resolve_actions(&self, context: &SelectorContext) -> ResolvedActions {
        self.resolver
            .resolve(context, &self.env(), self.discovery.as_ref())
    }

    /// Resolves actions for a raw context; shapes that match nothing yield
    /// an empty list with a warning.
    pub fn resolve_actions_for(
        &self,
        kind: &str,
        note_id: Option<i64>,
    ) -> RepoResult<ResolvedActions> {
        let context = match SelectorShape::parse(kind, note_id)
            .map_err(ContextError::from)
            .and_then(|shape| self.context_for(shape))
        {
            Ok(context) => context,
            Err(ContextError::Invalid(err)) => {
                warn!(
                    "event=action_resolve module=browser status=invalid_context error={}",
                    err
                );
                return Ok(ResolvedActions::rejected(ResolveWarning::InvalidContext(
                    err,
                )));
            }
            Err(ContextError::Repo(err)) => return Err(err),
        };
        Ok(self.resolve_actions(&context))
    }

    /// Runs the action `handler` for `context`.
    pub fn perform_action(
        &mut self,
        context: &SelectorContext,
        handler: &str,
    ) -> Result<ActionOutcome, BrowserError> {
        if let Some(builtin) = self.resolver.builtin(handler) {
            if builtin.descriptor.target != context.target() {
                return Err(BrowserError::ContextMismatch {
                    handler: handler.to_string(),
                    expected: builtin.descriptor.target,
                });
            }
            if self.mode == BrowseMode::Pick && builtin.eligibility != Eligibility::Always {
                return Err(BrowserError::ReadOnly(handler.to_string()));
            }
        }

        let offered = self.resolve_actions(context);
        let Some(action) = offered.find(handler) else {
            return Err(BrowserError::UnknownHandler(handler.to_string()));
        };
        let handler_ref = action.descriptor.handler.clone();

        let outcome = match (handler_ref.as_str(), context.note_id()) {
            (HANDLER_INSERT, _) => {
                let id = self.store.insert(&NewNote::default())?;
                ActionOutcome::Created(id)
            }
            (HANDLER_PASTE, _) => ActionOutcome::PasteRequested,
            (HANDLER_BACKGROUND_COLOR, _) => ActionOutcome::ChooseBackground {
                selected_index: self.config.palette_index(),
            },
            (HANDLER_OPEN, Some(id)) => ActionOutcome::Edit(id),
            (HANDLER_COPY, Some(id)) => {
                self.clipboard_has_note = true;
                ActionOutcome::Copied(NoteClip::for_note(id))
            }
            (HANDLER_DELETE, Some(id)) => {
                self.store.delete(id)?;
                ActionOutcome::Deleted(id)
            }
            (HANDLER_OPEN | HANDLER_COPY | HANDLER_DELETE, None) => {
                return Err(BrowserError::ContextMismatch {
                    handler: handler_ref.to_string(),
                    expected: TargetSelector::Single,
                });
            }
            _ => ActionOutcome::Delegated {
                handler: handler_ref.clone(),
                context: context.clone(),
            },
        };

        info!(
            "event=action_perform module=browser status=ok handler={}",
            handler_ref
        );
        Ok(outcome)
    }

    /// List item activation: opens the note, or returns it in pick mode.
    pub fn activate(&self, note_id: NoteId) -> Result<ActionOutcome, BrowserError> {
        if self.store.get(note_id)?.is_none() {
            return Err(InvalidSelectorContext::UnknownNote(note_id).into());
        }
        Ok(match self.mode {
            BrowseMode::Edit => ActionOutcome::Edit(note_id),
            BrowseMode::Pick => ActionOutcome::Picked(note_id),
        })
    }

    /// Current category projection.
    pub fn list_categories(&self) -> Result<CategoryProjection, CategoryError> {
        CategoryService::new(&self.store).list_categories()
    }

    /// Clears `name` from every note; notes themselves are kept.
    pub fn delete_category(&self, name: &str) -> Result<ReassignSummary, CategoryError> {
        CategoryService::new(&self.store).delete_category(name)
    }

    pub fn reassign_category(
        &self,
        category: &str,
        new_category: &str,
    ) -> Result<ReassignSummary, CategoryError> {
        CategoryService::new(&self.store).reassign(category, new_category)
    }

    pub fn background_color(&self) -> u32 {
        self.config.background_color
    }

    /// Applies and persists a new background color.
    pub fn set_background_color(
        &mut self,
        color: u32,
        preferences: &impl PreferenceStore,
    ) -> RepoResult<()> {
        let updated = ListConfig {
            background_color: color,
        };
        updated.save(preferences)?;
        self.config = updated;
        Ok(())
    }
}

/// Stable URI for a note, used as clipboard payload.
pub fn note_uri(note_id: NoteId) -> String {
    format!("content://notelist/notes/{note_id}")
}
