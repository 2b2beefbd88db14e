//! Action resolver.
//!
//! # Responsibility
//! - Merge eligible built-ins with actions discovered for a selector context
//!   into one ordered, deduplicated list.
//!
//! # Invariants
//! - Group order: built-ins (declaration order), specific (`Edit` verb on a
//!   single note), general alternatives. Both discovered groups are sorted by
//!   `(label, handler)`.
//! - No two entries share a handler reference.
//! - At most one shortcut is assigned, to the first specific action.
//! - Discovery failure degrades to built-ins plus a warning; it never fails
//!   the resolution.

use crate::action::builtin::{builtin_actions, is_builtin_handler, BuiltinAction};
use crate::action::descriptor::{
    ActionDescriptor, ActionVerb, HandlerRef, InvalidSelectorContext, ResolutionEnv,
    SelectorContext, Shortcut, TargetSelector,
};
use crate::action::registry::{CapabilityDiscovery, DiscoveryError};
use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Shortcut given to the first specific (edit) alternative.
pub const EDIT_SHORTCUT: Shortcut = Shortcut::new('1', 'e');

/// Presentation group of a resolved action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionGroup {
    Builtin,
    Specific,
    Alternative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAction {
    pub descriptor: ActionDescriptor,
    pub group: ActionGroup,
}

/// Recoverable problem met while resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveWarning {
    DiscoveryFailed(DiscoveryError),
    InvalidDescriptor { handler: HandlerRef, reason: String },
    InvalidContext(InvalidSelectorContext),
}

impl Display for ResolveWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DiscoveryFailed(err) => {
                write!(f, "alternative actions unavailable: {err}")
            }
            Self::InvalidDescriptor { handler, reason } => {
                write!(f, "ignored action `{handler}`: {reason}")
            }
            Self::InvalidContext(err) => write!(f, "no actions for selection: {err}"),
        }
    }
}

/// Ordered actions plus any recoverable warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedActions {
    pub actions: Vec<ResolvedAction>,
    pub warnings: Vec<ResolveWarning>,
}

impl ResolvedActions {
    /// Empty list carrying one warning.
    pub fn rejected(warning: ResolveWarning) -> Self {
        Self {
            actions: Vec::new(),
            warnings: vec![warning],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the presentation layer should render `group` at all.
    pub fn has_group(&self, group: ActionGroup) -> bool {
        self.actions.iter().any(|action| action.group == group)
    }

    pub fn group(&self, group: ActionGroup) -> impl Iterator<Item = &ActionDescriptor> {
        self.actions
            .iter()
            .filter(move |action| action.group == group)
            .map(|action| &action.descriptor)
    }

    pub fn handlers(&self) -> Vec<&str> {
        self.actions
            .iter()
            .map(|action| action.descriptor.handler.as_str())
            .collect()
    }

    pub fn find(&self, handler: &str) -> Option<&ResolvedAction> {
        self.actions
            .iter()
            .find(|action| action.descriptor.handler.as_str() == handler)
    }
}

/// Resolver holding the built-in table, constructed once at startup.
#[derive(Debug, Clone)]
pub struct ActionResolver {
    builtins: Vec<BuiltinAction>,
}

impl Default for ActionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionResolver {
    pub fn new() -> Self {
        Self::with_builtins(builtin_actions())
    }

    pub fn with_builtins(builtins: Vec<BuiltinAction>) -> Self {
        Self { builtins }
    }

    /// Built-ins eligible in `context`, in declaration order.
    pub fn builtins_for(
        &self,
        context: &SelectorContext,
        env: &ResolutionEnv,
    ) -> Vec<ActionDescriptor> {
        self.builtins
            .iter()
            .filter(|builtin| builtin.is_eligible(context, env))
            .map(|builtin| builtin.descriptor.clone())
            .collect()
    }

    /// Built-in registered under `handler`, eligible or not.
    pub fn builtin(&self, handler: &str) -> Option<&BuiltinAction> {
        self.builtins
            .iter()
            .find(|builtin| builtin.descriptor.handler.as_str() == handler)
    }

    pub fn is_builtin(&self, handler: &HandlerRef) -> bool {
        self.builtins
            .iter()
            .any(|builtin| &builtin.descriptor.handler == handler)
    }

    /// Produces the ordered action list for `context`.
    pub fn resolve(
        &self,
        context: &SelectorContext,
        env: &ResolutionEnv,
        discovery: &dyn CapabilityDiscovery,
    ) -> ResolvedActions {
        let mut resolved = ResolvedActions::default();
        let mut seen = BTreeSet::<HandlerRef>::new();

        for descriptor in self.builtins_for(context, env) {
            if seen.insert(descriptor.handler.clone()) {
                resolved.actions.push(ResolvedAction {
                    descriptor,
                    group: ActionGroup::Builtin,
                });
            }
        }

        let discovered = match discovery.discover(context) {
            Ok(descriptors) => descriptors,
            Err(err) => {
                warn!(
                    "event=action_discovery module=action status=degraded target={:?} error={}",
                    context.target(),
                    err
                );
                resolved.warnings.push(ResolveWarning::DiscoveryFailed(err));
                return resolved;
            }
        };

        let mut specific = Vec::new();
        let mut general = Vec::new();
        for mut descriptor in discovered {
            // Same capability as a built-in: the built-in wins, even when it
            // is not eligible right now.
            if self.is_builtin(&descriptor.handler) {
                continue;
            }
            if let Err(reason) = validate_discovered(&descriptor, context.target()) {
                warn!(
                    "event=action_descriptor_rejected module=action status=ignored handler={} reason={}",
                    descriptor.handler, reason
                );
                resolved.warnings.push(ResolveWarning::InvalidDescriptor {
                    handler: descriptor.handler,
                    reason,
                });
                continue;
            }

            descriptor.is_builtin = false;
            descriptor.shortcut = None;
            if descriptor.verb == ActionVerb::Edit && context.target() == TargetSelector::Single {
                specific.push(descriptor);
            } else {
                general.push(descriptor);
            }
        }

        specific.sort_by(|a, b| (&a.label, &a.handler).cmp(&(&b.label, &b.handler)));
        general.sort_by(|a, b| (&a.label, &a.handler).cmp(&(&b.label, &b.handler)));

        let mut shortcut_assigned = false;
        for mut descriptor in specific {
            if !seen.insert(descriptor.handler.clone()) {
                continue;
            }
            if !shortcut_assigned {
                descriptor.shortcut = Some(EDIT_SHORTCUT);
                shortcut_assigned = true;
            }
            resolved.actions.push(ResolvedAction {
                descriptor,
                group: ActionGroup::Specific,
            });
        }

        for descriptor in general {
            if seen.insert(descriptor.handler.clone()) {
                resolved.actions.push(ResolvedAction {
                    descriptor,
                    group: ActionGroup::Alternative,
                });
            }
        }

        debug!(
            "event=action_resolve module=action status=ok target={:?} actions={} warnings={}",
            context.target(),
            resolved.actions.len(),
            resolved.warnings.len()
        );
        resolved
    }
}

fn validate_discovered(
    descriptor: &ActionDescriptor,
    target: TargetSelector,
) -> Result<(), String> {
    if descriptor.label.trim().is_empty() {
        return Err("label must not be empty".to_string());
    }
    if descriptor.handler.as_str().trim().is_empty() {
        return Err("handler must not be empty".to_string());
    }
    if is_builtin_handler(&descriptor.handler) {
        return Err("handler uses the reserved builtin namespace".to_string());
    }
    if descriptor.target != target {
        return Err(format!(
            "declared target {:?} does not fit a {:?} context",
            descriptor.target, target
        ));
    }
    Ok(())
}
