use notelist_core::action::builtin::{
    HANDLER_BACKGROUND_COLOR, HANDLER_COPY, HANDLER_DELETE, HANDLER_INSERT, HANDLER_OPEN,
    HANDLER_PASTE,
};
use notelist_core::action::resolver::EDIT_SHORTCUT;
use notelist_core::{
    ActionDescriptor, ActionGroup, ActionResolver, ActionVerb, CapabilityDiscovery,
    CapabilityProvider, CapabilityRegistry, DiscoveryError, MatchCriterion, NoteRef,
    ResolutionEnv, ResolveWarning, SelectorContext, Shortcut, StaticCapability, TargetSelector,
};
use std::collections::HashSet;
use std::sync::Arc;

struct FixedDiscovery(Vec<ActionDescriptor>);

impl CapabilityDiscovery for FixedDiscovery {
    fn discover(&self, _context: &SelectorContext) -> Result<Vec<ActionDescriptor>, DiscoveryError> {
        Ok(self.0.clone())
    }
}

struct FailingDiscovery;

impl CapabilityDiscovery for FailingDiscovery {
    fn discover(&self, _context: &SelectorContext) -> Result<Vec<ActionDescriptor>, DiscoveryError> {
        Err(DiscoveryError::RegistryPoisoned)
    }
}

struct PanickingProvider;

impl CapabilityProvider for PanickingProvider {
    fn provider_id(&self) -> &str {
        "panicky"
    }

    fn matches(&self, _context: &SelectorContext) -> bool {
        panic!("provider exploded");
    }

    fn describe(&self) -> ActionDescriptor {
        single("never", "panicky.never", ActionVerb::Alternative)
    }
}

fn note(id: i64, category: Option<&str>) -> SelectorContext {
    SelectorContext::Single(NoteRef {
        id,
        category: category.map(str::to_string),
    })
}

fn single(label: &str, handler: &str, verb: ActionVerb) -> ActionDescriptor {
    ActionDescriptor::alternative(label, TargetSelector::Single, handler, verb)
}

fn writable() -> ResolutionEnv {
    ResolutionEnv::default()
}

#[test]
fn single_note_without_alternatives_gets_builtins_in_order() {
    let resolver = ActionResolver::new();
    let resolved = resolver.resolve(&note(1, None), &writable(), &FixedDiscovery(Vec::new()));

    assert_eq!(
        resolved.handlers(),
        vec![HANDLER_OPEN, HANDLER_COPY, HANDLER_DELETE]
    );
    assert!(resolved.warnings.is_empty());
    assert!(!resolved.has_group(ActionGroup::Specific));
    assert!(!resolved.has_group(ActionGroup::Alternative));
    assert!(resolved
        .actions
        .iter()
        .all(|action| action.descriptor.is_builtin && action.descriptor.shortcut.is_none()));
}

#[test]
fn collection_builtins_follow_environment() {
    let resolver = ActionResolver::new();
    let empty = FixedDiscovery(Vec::new());
    let context = SelectorContext::NoSelection;

    let plain = resolver.resolve(&context, &writable(), &empty);
    assert_eq!(
        plain.handlers(),
        vec![HANDLER_INSERT, HANDLER_BACKGROUND_COLOR]
    );

    let with_clip = ResolutionEnv {
        clipboard_has_note: true,
        read_only: false,
    };
    assert_eq!(
        resolver.resolve(&context, &with_clip, &empty).handlers(),
        vec![HANDLER_INSERT, HANDLER_PASTE, HANDLER_BACKGROUND_COLOR]
    );

    let picking = ResolutionEnv {
        clipboard_has_note: true,
        read_only: true,
    };
    assert_eq!(
        resolver.resolve(&context, &picking, &empty).handlers(),
        vec![HANDLER_BACKGROUND_COLOR]
    );
    assert_eq!(
        resolver.resolve(&note(1, None), &picking, &empty).handlers(),
        vec![HANDLER_OPEN, HANDLER_COPY]
    );
}

#[test]
fn handlers_are_never_duplicated() {
    let resolver = ActionResolver::new();
    let discovered = FixedDiscovery(vec![
        single("Open elsewhere", HANDLER_OPEN, ActionVerb::Open),
        single("Share", "share.mail", ActionVerb::Alternative),
        single("Share again", "share.mail", ActionVerb::Alternative),
        single("Annotate", "ink.annotate", ActionVerb::Edit),
        single("Annotate twice", "ink.annotate", ActionVerb::Edit),
        single("Delete too", HANDLER_DELETE, ActionVerb::Delete),
    ]);

    for env in [
        writable(),
        ResolutionEnv {
            clipboard_has_note: true,
            read_only: true,
        },
    ] {
        let resolved = resolver.resolve(&note(3, None), &env, &discovered);
        let handlers = resolved.handlers();
        let unique = handlers.iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), handlers.len(), "duplicates in {handlers:?}");
        assert!(resolved
            .find(HANDLER_OPEN)
            .is_some_and(|action| action.descriptor.is_builtin));
    }
}

#[test]
fn builtin_handler_offered_by_a_provider_is_dropped_even_when_ineligible() {
    let resolver = ActionResolver::new();
    let discovered = FixedDiscovery(vec![single("Delete", HANDLER_DELETE, ActionVerb::Delete)]);
    let picking = ResolutionEnv {
        clipboard_has_note: false,
        read_only: true,
    };

    let resolved = resolver.resolve(&note(1, None), &picking, &discovered);
    assert!(resolved.find(HANDLER_DELETE).is_none());
    assert!(resolved.warnings.is_empty());
}

#[test]
fn first_specific_action_gets_the_edit_shortcut() {
    let resolver = ActionResolver::new();
    let mut pinned = single("Zoom edit", "zoom.edit", ActionVerb::Edit);
    pinned.shortcut = Some(Shortcut::new('9', 'z'));
    let discovered = FixedDiscovery(vec![
        single("Translate", "lang.translate", ActionVerb::Alternative),
        pinned,
        single("Annotate", "ink.annotate", ActionVerb::Edit),
        single("Archive", "box.archive", ActionVerb::Alternative),
    ]);

    let resolved = resolver.resolve(&note(5, Some("Home")), &writable(), &discovered);
    assert_eq!(
        resolved.handlers(),
        vec![
            HANDLER_OPEN,
            HANDLER_COPY,
            HANDLER_DELETE,
            "ink.annotate",
            "zoom.edit",
            "box.archive",
            "lang.translate",
        ]
    );
    let specific = resolved
        .group(ActionGroup::Specific)
        .map(|descriptor| descriptor.shortcut)
        .collect::<Vec<_>>();
    assert_eq!(specific, vec![Some(EDIT_SHORTCUT), None]);
    assert!(resolved
        .group(ActionGroup::Alternative)
        .all(|descriptor| descriptor.shortcut.is_none() && !descriptor.is_builtin));
}

#[test]
fn invalid_descriptors_are_skipped_with_warnings() {
    let resolver = ActionResolver::new();
    let discovered = FixedDiscovery(vec![
        single("  ", "blank.label", ActionVerb::Alternative),
        ActionDescriptor::alternative(
            "Wrong target",
            TargetSelector::Collection,
            "wrong.target",
            ActionVerb::Alternative,
        ),
        single("Sneaky", "builtin.note.export", ActionVerb::Alternative),
        single("Share", "share.mail", ActionVerb::Alternative),
    ]);

    let resolved = resolver.resolve(&note(1, None), &writable(), &discovered);
    assert_eq!(
        resolved.handlers(),
        vec![HANDLER_OPEN, HANDLER_COPY, HANDLER_DELETE, "share.mail"]
    );
    assert_eq!(resolved.warnings.len(), 3);
    assert!(resolved
        .warnings
        .iter()
        .all(|warning| matches!(warning, ResolveWarning::InvalidDescriptor { .. })));
}

#[test]
fn discovery_failure_degrades_to_builtins() {
    let resolver = ActionResolver::new();
    let resolved = resolver.resolve(&note(1, None), &writable(), &FailingDiscovery);

    assert_eq!(
        resolved.handlers(),
        vec![HANDLER_OPEN, HANDLER_COPY, HANDLER_DELETE]
    );
    assert_eq!(
        resolved.warnings,
        vec![ResolveWarning::DiscoveryFailed(
            DiscoveryError::RegistryPoisoned
        )]
    );
}

#[test]
fn provider_panic_degrades_to_builtins() {
    let registry = CapabilityRegistry::new();
    registry.register(Arc::new(PanickingProvider)).unwrap();
    let resolver = ActionResolver::new();

    let resolved = resolver.resolve(&SelectorContext::NoSelection, &writable(), &registry);
    assert_eq!(
        resolved.handlers(),
        vec![HANDLER_INSERT, HANDLER_BACKGROUND_COLOR]
    );
    assert_eq!(
        resolved.warnings,
        vec![ResolveWarning::DiscoveryFailed(
            DiscoveryError::ProviderPanicked("panicky".to_string())
        )]
    );
}

#[test]
fn registry_changes_show_up_on_the_next_resolution() {
    let registry = CapabilityRegistry::new();
    let resolver = ActionResolver::new();
    let home_note = note(4, Some("Home"));

    registry
        .register(Arc::new(StaticCapability::new(
            "groceries",
            MatchCriterion::Category("Home".to_string()),
            single("Order groceries", "groceries.order", ActionVerb::Alternative),
        )))
        .unwrap();
    let first = resolver.resolve(&home_note, &writable(), &registry);
    assert!(first.find("groceries.order").is_some());
    assert!(resolver
        .resolve(&note(5, Some("Work")), &writable(), &registry)
        .find("groceries.order")
        .is_none());

    assert!(registry.unregister("groceries").unwrap());
    let second = resolver.resolve(&home_note, &writable(), &registry);
    assert!(second.find("groceries.order").is_none());
}
