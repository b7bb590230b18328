//! Command identity: canonical name, invoked alias and the parent chain.
//!
//! Every [`CommandNode`](crate::CommandNode) owns an [`Identity`] behind an
//! `Rc`. A child links to its parent's identity record, never to the parent
//! node itself, so the owning direction stays strictly group → child while
//! name-chain walks (usage prefixes, alias-aware paths) remain possible from
//! any node, including from results that outlive the tree.

use std::fmt;
use std::rc::Rc;

/// Who a command is and how it was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    name: Option<String>,
    alias: Option<String>,
    parent: Option<Rc<Identity>>,
}

impl Identity {
    /// Creates the identity of a command that has no parent.
    pub fn root(name: Option<String>) -> Self {
        Self {
            name,
            alias: None,
            parent: None,
        }
    }

    /// Creates the identity of a subcommand resolved by `parent`.
    ///
    /// `alias` is the literal token the user typed, or `None` when the
    /// subcommand was substituted as a default.
    pub fn child(name: impl Into<String>, alias: Option<&str>, parent: Rc<Identity>) -> Self {
        Self {
            name: Some(name.into()),
            alias: alias.map(String::from),
            parent: Some(parent),
        }
    }

    /// The canonical registered name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The token this command was invoked with, if any.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The alias when one was used, the canonical name otherwise.
    pub fn invoked_as(&self) -> Option<&str> {
        self.alias().or_else(|| self.name())
    }

    /// The identity of the owning group.
    pub fn parent(&self) -> Option<&Identity> {
        self.parent.as_deref()
    }

    /// Returns ancestor names, youngest first.
    ///
    /// With `real_names` set, canonical names are returned. Otherwise the
    /// alias is substituted for every ancestor that was invoked through one.
    /// Unnamed ancestors are skipped.
    pub fn parent_names(&self, real_names: bool) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = self.parent();
        while let Some(parent) = current {
            let name = if real_names {
                parent.name()
            } else {
                parent.invoked_as()
            };
            if let Some(name) = name {
                names.push(name);
            }
            current = parent.parent();
        }
        names
    }

    /// The program name used in usage strings: canonical names from the root
    /// down to this command, space separated.
    ///
    /// Returns `None` when this command has no name of its own.
    pub fn usage_prefix(&self) -> Option<String> {
        let name = self.name()?;
        let mut names = vec![name];
        names.extend(self.parent_names(true));
        names.reverse();
        Some(names.join(" "))
    }

    /// Canonical names below the root, root-most first.
    ///
    /// For `myapp group create` this is `["group", "create"]`.
    pub fn command_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = Some(self);
        while let Some(identity) = current {
            if identity.parent.is_none() {
                break;
            }
            if let Some(name) = identity.name() {
                path.push(name);
            }
            current = identity.parent();
        }
        path.reverse();
        path
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.usage_prefix() {
            Some(prefix) => f.write_str(&prefix),
            None => f.write_str("<root>"),
        }
    }
}
