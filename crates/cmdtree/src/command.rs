//! Command capability trait and the context handed to its callbacks.
//!
//! A command type describes three things:
//!
//! - **Type-level metadata**: default name, default aliases, [`CommandKind`]
//!   and about text. These are associated functions (`Self: Sized`) read once
//!   when the type is registered into a [`Registry`].
//! - **Parser declaration**: [`Command::add_arguments`] adds flags and
//!   positionals to the clap command built for each instance.
//! - **Pipeline callbacks**: [`Command::preprocess`], [`Command::action`] and
//!   [`Command::results_callback`]. All have no-op defaults.
//!
//! Instances are never registered directly. Groups register types, and a fresh
//! instance is constructed through the type's `Default` impl each time the
//! dispatcher reaches that position in the command chain.
//!
//! # Pipeline
//!
//! ```text
//! parsed flags
//!   → preprocess   ← returns null (keep) or an object (replace, never merged)
//!   → action       ← receives the effective flags, returns the result value
//!   → results_callback (groups only, with the subcommand's outcome)
//! ```
//!
//! # Application state
//!
//! [`CommandContext::app_state`] is the [`Extensions`] container supplied once
//! when the application is built and shared by every node of one invocation
//! tree. Use interior mutability for state commands need to change.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::RegistrationError;
use crate::identity::Identity;
use crate::outcome::Outcome;
use crate::registry::Registry;

/// Parsed flags and positionals, keyed by clap argument id.
pub type ArgMap = serde_json::Map<String, Value>;

/// Result of a pipeline callback.
pub type CallbackResult<T> = Result<T, anyhow::Error>;

/// How the dispatcher treats a command type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandKind {
    /// A leaf: strict parse, then the pipeline.
    #[default]
    Command,
    /// Owns subcommands and resolves at most one per invocation.
    Group,
    /// Owns chained commands and runs any number of them back to back.
    ChainedGroup,
    /// A leaf that may only live in a chained group. Inside a chain it parses
    /// permissively so the next chained command can follow its arguments.
    ChainedCommand,
}

impl CommandKind {
    /// Returns true for kinds that own a registry.
    pub fn is_group(self) -> bool {
        matches!(self, CommandKind::Group | CommandKind::ChainedGroup)
    }
}

/// Type-safe container for application state.
///
/// Values are keyed by type; inserting a second value of the same type
/// replaces the first.
///
/// # Example
///
/// ```rust
/// use cmdtree::Extensions;
///
/// struct Config { verbose: bool }
///
/// let mut state = Extensions::new();
/// state.insert(Config { verbose: true });
///
/// let config = state.get_required::<Config>()?;
/// assert!(config.verbose);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Default)]
pub struct Extensions {
    map: HashMap<TypeId, Box<dyn Any>>,
}

impl Extensions {
    /// Creates a new empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous value of the same type.
    pub fn insert<T: 'static>(&mut self, val: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(val))
            .and_then(|boxed| boxed.downcast().ok().map(|b| *b))
    }

    /// Gets a reference to a value of the specified type.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    /// Gets a value of the specified type or fails with a descriptive error.
    pub fn get_required<T: 'static>(&self) -> Result<&T, anyhow::Error> {
        self.get::<T>().ok_or_else(|| {
            anyhow::anyhow!(
                "application state missing: type {} was not provided",
                std::any::type_name::<T>()
            )
        })
    }

    /// Returns `true` if a value of the specified type is stored.
    pub fn contains<T: 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of stored values.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish_non_exhaustive()
    }
}

/// Context passed to every pipeline callback.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// The command whose callback is running.
    pub command: Rc<Identity>,

    /// Application state shared by the whole invocation tree.
    pub app_state: Rc<Extensions>,

    /// Subcommands resolved by this command for the current invocation.
    ///
    /// Empty for leaves and for groups running their own action. Holds one
    /// entry for a group that resolved a subcommand and every queued member,
    /// in chain order, for a chained group.
    pub invoked: Vec<Rc<Identity>>,
}

impl CommandContext {
    /// Creates a context for `command` with no resolved subcommands.
    pub fn new(command: Rc<Identity>, app_state: Rc<Extensions>) -> Self {
        Self {
            command,
            app_state,
            invoked: Vec::new(),
        }
    }
}

/// A command type: metadata, parser declaration and pipeline callbacks.
///
/// # Example
///
/// ```rust
/// use cmdtree::{ArgMap, CallbackResult, Command, CommandContext};
/// use clap::Arg;
/// use serde_json::{json, Value};
///
/// #[derive(Default)]
/// struct Greet;
///
/// impl Command for Greet {
///     fn default_name() -> Option<&'static str> {
///         Some("greet")
///     }
///
///     fn default_aliases() -> &'static [&'static str] {
///         &["hello"]
///     }
///
///     fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
///         cmd.arg(Arg::new("who").long("who").default_value("world"))
///     }
///
///     fn action(&mut self, _ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
///         Ok(json!(format!("hello, {}", args["who"].as_str().unwrap_or_default())))
///     }
/// }
/// ```
pub trait Command {
    /// Name used when the type is registered without an explicit name.
    fn default_name() -> Option<&'static str>
    where
        Self: Sized,
    {
        None
    }

    /// Aliases used when the type is registered without explicit aliases.
    fn default_aliases() -> &'static [&'static str]
    where
        Self: Sized,
    {
        &[]
    }

    /// How the dispatcher treats this type.
    fn kind() -> CommandKind
    where
        Self: Sized,
    {
        CommandKind::Command
    }

    /// Help text. The first paragraph is the title shown in subcommand
    /// listings; anything after the first blank line is the description.
    fn about() -> Option<&'static str>
    where
        Self: Sized,
    {
        None
    }

    /// Declares this command's flags and positionals.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Registers subcommand types. Only called for group kinds, once per
    /// registration of the group type.
    fn register_subcommands(&self, _registry: &mut Registry) -> Result<(), RegistrationError> {
        Ok(())
    }

    /// Runs before the action (or, for groups, before the subcommand).
    ///
    /// Return `Value::Null` to hand the parsed flags to the action unchanged,
    /// or an object to replace them entirely. Any other value is a
    /// [`PipelineContractError`](crate::PipelineContractError).
    fn preprocess(&mut self, _ctx: &CommandContext, _args: &ArgMap) -> CallbackResult<Value> {
        Ok(Value::Null)
    }

    /// The command's own work. Its return value is the command's result.
    fn action(&mut self, _ctx: &CommandContext, _args: ArgMap) -> CallbackResult<Value> {
        Ok(Value::Null)
    }

    /// Receives the outcome of a resolved subcommand, or the ordered results
    /// of a chain. Not called when a default subcommand was substituted or
    /// when the group ran its own action.
    fn results_callback(&mut self, _ctx: &CommandContext, _outcome: &Outcome) -> CallbackResult<()> {
        Ok(())
    }
}
