//! Built-in action table.
//!
//! # Invariants
//! - Declaration order is presentation order; it is never re-sorted.
//! - Built-in handlers live under the reserved `builtin.` prefix.

use crate::action::descriptor::{
    ActionDescriptor, ActionVerb, HandlerRef, ResolutionEnv, SelectorContext, TargetSelector,
};

pub const HANDLER_INSERT: &str = "builtin.note.insert";
pub const HANDLER_PASTE: &str = "builtin.note.paste";
pub const HANDLER_BACKGROUND_COLOR: &str = "builtin.list.background_color";
pub const HANDLER_OPEN: &str = "builtin.note.open";
pub const HANDLER_COPY: &str = "builtin.note.copy";
pub const HANDLER_DELETE: &str = "builtin.note.delete";

/// Reserved handler namespace for built-ins.
pub const BUILTIN_HANDLER_PREFIX: &str = "builtin.";

/// When a built-in may be offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Always,
    /// Hidden in read-only browsing.
    Writable,
    /// Needs clipboard content and a writable list.
    WritableWithClipboard,
}

impl Eligibility {
    pub fn allows(self, env: &ResolutionEnv) -> bool {
        match self {
            Self::Always => true,
            Self::Writable => !env.read_only,
            Self::WritableWithClipboard => !env.read_only && env.clipboard_has_note,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinAction {
    pub descriptor: ActionDescriptor,
    pub eligibility: Eligibility,
}

impl BuiltinAction {
    fn new(
        label: &str,
        target: TargetSelector,
        handler: &str,
        verb: ActionVerb,
        eligibility: Eligibility,
    ) -> Self {
        Self {
            descriptor: ActionDescriptor {
                label: label.to_string(),
                target,
                handler: HandlerRef::new(handler),
                verb,
                is_builtin: true,
                shortcut: None,
            },
            eligibility,
        }
    }

    pub fn is_eligible(&self, context: &SelectorContext, env: &ResolutionEnv) -> bool {
        self.descriptor.target == context.target() && self.eligibility.allows(env)
    }
}

/// Built-in actions in declaration order.
pub fn builtin_actions() -> Vec<BuiltinAction> {
    use TargetSelector::{Collection, Single};

    vec![
        BuiltinAction::new(
            "Add note",
            Collection,
            HANDLER_INSERT,
            ActionVerb::Insert,
            Eligibility::Writable,
        ),
        BuiltinAction::new(
            "Paste",
            Collection,
            HANDLER_PASTE,
            ActionVerb::Paste,
            Eligibility::WritableWithClipboard,
        ),
        BuiltinAction::new(
            "Background color",
            Collection,
            HANDLER_BACKGROUND_COLOR,
            ActionVerb::BackgroundColor,
            Eligibility::Always,
        ),
        BuiltinAction::new(
            "Open",
            Single,
            HANDLER_OPEN,
            ActionVerb::Open,
            Eligibility::Always,
        ),
        BuiltinAction::new(
            "Copy",
            Single,
            HANDLER_COPY,
            ActionVerb::Copy,
            Eligibility::Always,
        ),
        BuiltinAction::new(
            "Delete",
            Single,
            HANDLER_DELETE,
            ActionVerb::Delete,
            Eligibility::Writable,
        ),
    ]
}

/// Whether `handler` is in the reserved built-in namespace.
pub fn is_builtin_handler(handler: &HandlerRef) -> bool {
    handler.as_str().starts_with(BUILTIN_HANDLER_PREFIX)
}
