//! Subcommand registry.
//!
//! A group registers command *types*. Each registration produces a
//! [`Descriptor`] holding everything resolution needs: canonical name,
//! aliases, kind, about text, a factory for fresh instances and, for group
//! kinds, the nested registry. Nested registries are built eagerly, so every
//! registration mistake in the whole tree surfaces when the application is
//! built, before any token is parsed.
//!
//! Names and aliases share one key space. Every insertion is checked against
//! both maps; the first collision is a [`RegistrationError`] and leaves the
//! registry untouched.
//!
//! ```rust
//! use cmdtree::{Command, CommandKind, Registration, Registry};
//!
//! #[derive(Default)]
//! struct List;
//! impl Command for List {
//!     fn default_name() -> Option<&'static str> { Some("list") }
//!     fn default_aliases() -> &'static [&'static str] { &["ls"] }
//! }
//!
//! let mut registry = Registry::new();
//! registry.register_with::<List>(Registration::new().as_default())?;
//!
//! assert_eq!(registry.lookup("ls").map(|d| d.name()), Some("list"));
//! assert_eq!(registry.default_command().map(|d| d.name()), Some("list"));
//! # Ok::<(), cmdtree::RegistrationError>(())
//! ```

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

use crate::command::{Command, CommandKind};
use crate::error::RegistrationError;

/// Creates a fresh boxed instance of a command type.
pub type Factory = fn() -> Box<dyn Command>;

fn instantiate<C: Command + Default + 'static>() -> Box<dyn Command> {
    Box::new(C::default())
}

/// Everything known about one registered command type.
#[derive(Debug)]
pub struct Descriptor {
    name: String,
    aliases: Vec<String>,
    about: Option<&'static str>,
    kind: CommandKind,
    type_id: TypeId,
    type_name: &'static str,
    factory: Factory,
    registry: Rc<Registry>,
    is_default: bool,
    is_fallback: bool,
}

impl Descriptor {
    fn build<C: Command + Default + 'static>(
        name: String,
        aliases: Vec<String>,
        is_default: bool,
        is_fallback: bool,
    ) -> Result<Self, RegistrationError> {
        let kind = C::kind();
        let registry = match kind {
            CommandKind::Group => {
                let mut nested = Registry::new();
                C::default().register_subcommands(&mut nested)?;
                nested
            }
            CommandKind::ChainedGroup => {
                let mut nested = Registry::chained();
                C::default().register_subcommands(&mut nested)?;
                nested
            }
            CommandKind::Command | CommandKind::ChainedCommand => Registry::new(),
        };

        Ok(Self {
            name,
            aliases,
            about: C::about(),
            kind,
            type_id: TypeId::of::<C>(),
            type_name: type_name::<C>(),
            factory: instantiate::<C>,
            registry: Rc::new(registry),
            is_default,
            is_fallback,
        })
    }

    /// Descriptor for the root of an application. The root has no owning
    /// registry, so it is never a default or a fallback and has no aliases.
    pub fn root<C: Command + Default + 'static>(
        name: Option<String>,
    ) -> Result<Rc<Self>, RegistrationError> {
        let name = name
            .or_else(|| C::default_name().map(String::from))
            .unwrap_or_default();
        Ok(Rc::new(Self::build::<C>(name, Vec::new(), false, false)?))
    }

    /// Canonical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn about(&self) -> Option<&'static str> {
        self.about
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Rust type name of the registered command, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if this descriptor was registered for type `C`.
    pub fn is<C: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<C>()
    }

    /// The nested registry. Empty for leaf kinds.
    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn is_fallback(&self) -> bool {
        self.is_fallback
    }

    /// Constructs a fresh instance.
    pub fn instantiate(&self) -> Box<dyn Command> {
        (self.factory)()
    }
}

/// Options for [`Registry::register_with`].
///
/// Unset name and aliases fall back to the type's
/// [`default_name`](Command::default_name) and
/// [`default_aliases`](Command::default_aliases).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    name: Option<String>,
    aliases: Option<Vec<String>>,
    is_default: bool,
    is_fallback: bool,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers under this name instead of the type's default name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the type's default aliases. An empty list means no aliases.
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = Some(aliases.into_iter().map(Into::into).collect());
        self
    }

    /// Runs this command when the group gets no subcommand name, or gets
    /// flags it does not know.
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Runs this command when the group gets a subcommand name it does not
    /// know. The typed token becomes the command's alias.
    pub fn as_fallback(mut self) -> Self {
        self.is_fallback = true;
        self
    }
}

/// Name and alias tables of one group.
#[derive(Debug, Default)]
pub struct Registry {
    chained: bool,
    entries: Vec<Rc<Descriptor>>,
    by_name: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
    default: Option<usize>,
    fallback: Option<usize>,
}

impl Registry {
    /// Creates a registry for a plain group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry for a chained group: chained commands only, no
    /// default or fallback.
    pub fn chained() -> Self {
        Self {
            chained: true,
            ..Self::default()
        }
    }

    /// Registers `C` under its default name and aliases.
    pub fn register<C: Command + Default + 'static>(&mut self) -> Result<(), RegistrationError> {
        self.register_with::<C>(Registration::new())
    }

    /// Registers `C` with explicit options.
    pub fn register_with<C: Command + Default + 'static>(
        &mut self,
        registration: Registration,
    ) -> Result<(), RegistrationError> {
        let name = registration
            .name
            .or_else(|| C::default_name().map(String::from))
            .ok_or(RegistrationError::MissingName {
                command: type_name::<C>(),
            })?;
        let aliases = registration.aliases.unwrap_or_else(|| {
            C::default_aliases()
                .iter()
                .map(|alias| alias.to_string())
                .collect()
        });

        if self.chained {
            if C::kind() != CommandKind::ChainedCommand {
                return Err(RegistrationError::NotChainable {
                    command: type_name::<C>(),
                });
            }
            if registration.is_default {
                return Err(RegistrationError::DefaultInChainedGroup(name));
            }
            if registration.is_fallback {
                return Err(RegistrationError::FallbackInChainedGroup(name));
            }
        }

        self.check_name(&name)?;
        self.check_aliases(&name, &aliases)?;
        if registration.is_default {
            if let Some(existing) = self.default_command() {
                return Err(RegistrationError::DuplicateDefault(existing.name.clone()));
            }
        }
        if registration.is_fallback {
            if let Some(existing) = self.fallback_command() {
                return Err(RegistrationError::DuplicateFallback(existing.name.clone()));
            }
        }

        let descriptor = Descriptor::build::<C>(
            name,
            aliases,
            registration.is_default,
            registration.is_fallback,
        )?;

        let index = self.entries.len();
        self.by_name.insert(descriptor.name.clone(), index);
        for alias in &descriptor.aliases {
            self.by_alias.insert(alias.clone(), index);
        }
        if descriptor.is_default {
            self.default = Some(index);
        }
        if descriptor.is_fallback {
            self.fallback = Some(index);
        }
        self.entries.push(Rc::new(descriptor));
        Ok(())
    }

    fn check_name(&self, name: &str) -> Result<(), RegistrationError> {
        if self.by_name.contains_key(name) {
            return Err(RegistrationError::DuplicateName(name.to_string()));
        }
        if self.by_alias.contains_key(name) {
            return Err(RegistrationError::NameRegisteredAsAlias(name.to_string()));
        }
        Ok(())
    }

    fn check_aliases(&self, name: &str, aliases: &[String]) -> Result<(), RegistrationError> {
        for (index, alias) in aliases.iter().enumerate() {
            if alias == name || self.by_name.contains_key(alias) {
                return Err(RegistrationError::AliasRegisteredAsName(alias.clone()));
            }
            if self.by_alias.contains_key(alias) || aliases[..index].contains(alias) {
                return Err(RegistrationError::DuplicateAlias(alias.clone()));
            }
        }
        Ok(())
    }

    /// Finds a descriptor by canonical name, then by alias.
    pub fn lookup(&self, token: &str) -> Option<&Rc<Descriptor>> {
        self.by_name
            .get(token)
            .or_else(|| self.by_alias.get(token))
            .map(|&index| &self.entries[index])
    }

    pub fn default_command(&self) -> Option<&Rc<Descriptor>> {
        self.default.map(|index| &self.entries[index])
    }

    pub fn fallback_command(&self) -> Option<&Rc<Descriptor>> {
        self.fallback.map(|index| &self.entries[index])
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Rc<Descriptor>> {
        self.entries.iter()
    }

    /// Canonical names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|d| d.name()).collect()
    }

    /// Every registered alias, in no particular order.
    pub fn aliases(&self) -> Vec<&str> {
        self.by_alias.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.lookup(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_chained(&self) -> bool {
        self.chained
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Rc<Descriptor>;
    type IntoIter = std::slice::Iter<'a, Rc<Descriptor>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct List;
    impl Command for List {
        fn default_name() -> Option<&'static str> {
            Some("list")
        }
        fn default_aliases() -> &'static [&'static str] {
            &["ls", "table"]
        }
    }

    #[derive(Default)]
    struct Unnamed;
    impl Command for Unnamed {}

    #[derive(Default)]
    struct Change;
    impl Command for Change {
        fn default_name() -> Option<&'static str> {
            Some("change")
        }
        fn kind() -> CommandKind {
            CommandKind::ChainedCommand
        }
    }

    #[derive(Default)]
    struct Items;
    impl Command for Items {
        fn default_name() -> Option<&'static str> {
            Some("items")
        }
        fn kind() -> CommandKind {
            CommandKind::Group
        }
        fn register_subcommands(&self, registry: &mut Registry) -> Result<(), RegistrationError> {
            registry.register::<List>()?;
            registry.register_with::<Change>(Registration::new().as_fallback())
        }
    }

    #[derive(Default)]
    struct Broken;
    impl Command for Broken {
        fn default_name() -> Option<&'static str> {
            Some("broken")
        }
        fn kind() -> CommandKind {
            CommandKind::Group
        }
        fn register_subcommands(&self, registry: &mut Registry) -> Result<(), RegistrationError> {
            registry.register::<List>()?;
            registry.register::<List>()
        }
    }

    #[test]
    fn test_register_defaults() {
        let mut registry = Registry::new();
        registry.register::<List>().unwrap();

        let list = registry.lookup("list").unwrap();
        assert_eq!(list.name(), "list");
        assert_eq!(list.aliases(), ["ls", "table"]);
        assert!(list.is::<List>());
        assert!(Rc::ptr_eq(list, registry.lookup("table").unwrap()));
        assert!(registry.lookup("nope").is_none());
    }

    #[test]
    fn test_explicit_name_and_aliases() {
        let mut registry = Registry::new();
        registry
            .register_with::<List>(Registration::new().name("show").aliases(["s"]))
            .unwrap();

        assert!(registry.lookup("list").is_none());
        assert!(registry.lookup("ls").is_none());
        assert_eq!(registry.lookup("s").unwrap().name(), "show");
    }

    #[test]
    fn test_missing_name() {
        let err = Registry::new().register::<Unnamed>().unwrap_err();
        assert!(matches!(err, RegistrationError::MissingName { .. }));
    }

    #[test]
    fn test_collisions_leave_registry_untouched() {
        let mut registry = Registry::new();
        registry.register::<List>().unwrap();

        let err = registry
            .register_with::<List>(Registration::new().name("other").aliases(["fresh", "ls"]))
            .unwrap_err();
        assert_eq!(err, RegistrationError::DuplicateAlias("ls".into()));
        assert!(registry.lookup("other").is_none());
        assert!(registry.lookup("fresh").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_alias_equal_to_own_name() {
        let err = Registry::new()
            .register_with::<List>(Registration::new().aliases(["list"]))
            .unwrap_err();
        assert_eq!(err, RegistrationError::AliasRegisteredAsName("list".into()));
    }

    #[test]
    fn test_second_default_fails() {
        let mut registry = Registry::new();
        registry
            .register_with::<List>(Registration::new().as_default())
            .unwrap();
        let err = registry
            .register_with::<List>(Registration::new().name("other").aliases(Vec::<String>::new()).as_default())
            .unwrap_err();
        assert_eq!(err, RegistrationError::DuplicateDefault("list".into()));
    }

    #[test]
    fn test_chained_registry_rules() {
        let mut registry = Registry::chained();
        assert!(matches!(
            registry.register::<List>().unwrap_err(),
            RegistrationError::NotChainable { .. }
        ));
        assert_eq!(
            registry
                .register_with::<Change>(Registration::new().as_default())
                .unwrap_err(),
            RegistrationError::DefaultInChainedGroup("change".into())
        );
        assert_eq!(
            registry
                .register_with::<Change>(Registration::new().as_fallback())
                .unwrap_err(),
            RegistrationError::FallbackInChainedGroup("change".into())
        );
        registry.register::<Change>().unwrap();
        assert!(registry.is_chained());
    }

    #[test]
    fn test_nested_registry_is_built_eagerly() {
        let mut registry = Registry::new();
        registry.register::<Items>().unwrap();

        let items = registry.lookup("items").unwrap();
        assert_eq!(items.registry().names(), vec!["list", "change"]);
        assert_eq!(items.registry().fallback_command().unwrap().name(), "change");
    }

    #[test]
    fn test_nested_registration_error_propagates() {
        let err = Registry::new().register::<Broken>().unwrap_err();
        assert_eq!(err, RegistrationError::DuplicateName("list".into()));
    }
}
