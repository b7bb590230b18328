//! Command nodes: one constructed command within an invocation tree.
//!
//! A [`CommandNode`] pairs a fresh command instance with its identity, the
//! shared application state and a lazily built parser. Groups own the node of
//! the subcommand they resolved ([`Invoked`]), so after `invoke` returns the
//! whole invoked path can be walked from the root:
//!
//! ```text
//! myapp ──Subcommand──▶ group ──Subcommand──▶ ID ──Chain──▶ [move, move]
//! ```
//!
//! Group resolution lives in `dispatch`, chained execution in `chain`, and the
//! dry-run used for completion in `completion`.

use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;
use serde_json::Value;

use crate::command::{ArgMap, Command, CommandContext, CommandKind, Extensions};
use crate::error::{DispatchError, PipelineContractError};
use crate::help;
use crate::identity::Identity;
use crate::outcome::Outcome;
use crate::parser::ArgumentParser;
use crate::registry::{Descriptor, Registry};

/// Subcommands a node resolved during its last invocation.
#[derive(Debug, Default)]
pub enum Invoked {
    /// Nothing resolved: not invoked yet, a leaf, or a group that ran its own
    /// action.
    #[default]
    None,
    /// A plain group's resolved (or default-substituted) subcommand.
    Subcommand(Box<CommandNode>),
    /// A chained group's members, in chain order.
    Chain(Vec<CommandNode>),
}

/// A constructed command at one position of the command chain.
pub struct CommandNode {
    descriptor: Rc<Descriptor>,
    identity: Rc<Identity>,
    app_state: Rc<Extensions>,
    command: Box<dyn Command>,
    parser: OnceCell<ArgumentParser>,
    pub(crate) invoked: Invoked,
}

impl CommandNode {
    pub(crate) fn new(
        descriptor: Rc<Descriptor>,
        identity: Rc<Identity>,
        app_state: Rc<Extensions>,
    ) -> Self {
        let command = descriptor.instantiate();
        Self {
            descriptor,
            identity,
            app_state,
            command,
            parser: OnceCell::new(),
            invoked: Invoked::None,
        }
    }

    /// Creates the root node of an invocation tree.
    pub fn root(descriptor: Rc<Descriptor>, name: Option<String>, app_state: Rc<Extensions>) -> Self {
        let identity = Rc::new(Identity::root(name));
        Self::new(descriptor, identity, app_state)
    }

    /// Constructs a subcommand of this node. `alias` is the typed token, or
    /// `None` for default substitution and dry-run listings.
    pub(crate) fn child(&self, descriptor: &Rc<Descriptor>, alias: Option<&str>) -> Self {
        let identity = Identity::child(descriptor.name(), alias, self.identity.clone());
        Self::new(descriptor.clone(), Rc::new(identity), self.app_state.clone())
    }

    /// A fresh instance at the same position, with nothing invoked.
    pub(crate) fn respawn(&self) -> Self {
        Self::new(
            self.descriptor.clone(),
            self.identity.clone(),
            self.app_state.clone(),
        )
    }

    /// Canonical name.
    pub fn name(&self) -> Option<&str> {
        self.identity.name()
    }

    /// The token this node was invoked with.
    pub fn alias(&self) -> Option<&str> {
        self.identity.alias()
    }

    pub fn identity(&self) -> &Rc<Identity> {
        &self.identity
    }

    /// See [`Identity::parent_names`].
    pub fn parent_names(&self, real_names: bool) -> Vec<&str> {
        self.identity.parent_names(real_names)
    }

    /// See [`Identity::usage_prefix`].
    pub fn usage_prefix(&self) -> Option<String> {
        self.identity.usage_prefix()
    }

    pub fn kind(&self) -> CommandKind {
        self.descriptor.kind()
    }

    pub fn descriptor(&self) -> &Rc<Descriptor> {
        &self.descriptor
    }

    /// Subcommands registered under this node. Empty for leaves.
    pub fn registry(&self) -> &Rc<Registry> {
        self.descriptor.registry()
    }

    pub fn app_state(&self) -> &Rc<Extensions> {
        &self.app_state
    }

    /// Returns true if this node runs an instance of `C`.
    pub fn is<C: 'static>(&self) -> bool {
        self.descriptor.is::<C>()
    }

    pub fn invoked(&self) -> &Invoked {
        &self.invoked
    }

    /// The subcommand a plain group resolved, if any.
    pub fn invoked_subcommand(&self) -> Option<&CommandNode> {
        match &self.invoked {
            Invoked::Subcommand(sub) => Some(sub.as_ref()),
            _ => None,
        }
    }

    /// The members a chained group queued, in chain order.
    ///
    /// When the chain failed to parse, holds the members queued up to and
    /// including the failing one.
    pub fn invoked_subcommands(&self) -> &[CommandNode] {
        match &self.invoked {
            Invoked::Chain(members) => members,
            _ => &[],
        }
    }

    /// True when a subcommand (or a chain) was resolved.
    pub fn has_invoked_subcommand(&self) -> bool {
        !matches!(self.invoked, Invoked::None)
    }

    /// This node's parser, built on first use.
    pub fn parser(&self) -> &ArgumentParser {
        self.parser.get_or_init(|| self.build_parser())
    }

    /// Renders this node's help text.
    pub fn render_help(&self) -> String {
        self.parser().render_help()
    }

    fn build_parser(&self) -> ArgumentParser {
        let mut cmd = clap::Command::new(self.name().unwrap_or("command").to_string());
        if let Some(prefix) = self.usage_prefix() {
            cmd = cmd.bin_name(prefix);
        }

        let registry = self.kind().is_group().then(|| self.registry().as_ref());
        if registry.is_some() {
            let prog = self.usage_prefix().unwrap_or_default();
            let usage = match self.kind() {
                CommandKind::ChainedGroup => "[OPTIONS] [COMMAND [ARGS]...]...",
                _ => "[OPTIONS] [COMMAND] [ARGS]...",
            };
            cmd = cmd.override_usage(format!("{prog} {usage}").trim_start().to_string());
        }

        cmd = help::decorate(cmd, self.descriptor.about(), registry);
        ArgumentParser::new(self.command.add_arguments(cmd))
    }

    /// Invokes this node with `tokens` (program name excluded).
    ///
    /// Leaves parse strictly and run their pipeline. Groups resolve a
    /// subcommand and recurse; chained groups parse every member before
    /// running any.
    pub fn invoke<I, T>(&mut self, tokens: I) -> Result<Outcome, DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        self.dispatch(&tokens)
    }

    pub(crate) fn dispatch(&mut self, tokens: &[String]) -> Result<Outcome, DispatchError> {
        self.invoked = Invoked::None;
        match self.kind() {
            CommandKind::Command | CommandKind::ChainedCommand => {
                let values = self.parser().parse(tokens)?;
                self.run_pipeline(values).map(Outcome::Value)
            }
            CommandKind::Group => self.invoke_group(tokens),
            CommandKind::ChainedGroup => self.invoke_chain(tokens),
        }
    }

    pub(crate) fn context(&self) -> CommandContext {
        let invoked = match &self.invoked {
            Invoked::None => Vec::new(),
            Invoked::Subcommand(sub) => vec![sub.identity.clone()],
            Invoked::Chain(members) => members.iter().map(|m| m.identity.clone()).collect(),
        };
        self.context_with(invoked)
    }

    pub(crate) fn context_with(&self, invoked: Vec<Rc<Identity>>) -> CommandContext {
        CommandContext {
            command: self.identity.clone(),
            app_state: self.app_state.clone(),
            invoked,
        }
    }

    /// `preprocess` then `action`.
    pub(crate) fn run_pipeline(&mut self, parsed: ArgMap) -> Result<Value, DispatchError> {
        let ctx = self.context();
        let args = self.preprocess(&ctx, parsed)?;
        self.command
            .action(&ctx, args)
            .map_err(|err| DispatchError::command(&self.identity, err))
    }

    /// Runs `preprocess` and returns the flags the action should see.
    pub(crate) fn preprocess(
        &mut self,
        ctx: &CommandContext,
        parsed: ArgMap,
    ) -> Result<ArgMap, DispatchError> {
        let returned = self
            .command
            .preprocess(ctx, &parsed)
            .map_err(|err| DispatchError::command(&self.identity, err))?;
        match returned {
            Value::Null => Ok(parsed),
            Value::Object(replacement) => Ok(replacement),
            other => Err(PipelineContractError::new(self.identity.clone(), &other).into()),
        }
    }

    pub(crate) fn results_callback(
        &mut self,
        ctx: &CommandContext,
        outcome: &Outcome,
    ) -> Result<(), DispatchError> {
        self.command
            .results_callback(ctx, outcome)
            .map_err(|err| DispatchError::command(&self.identity, err))
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("identity", &self.identity)
            .field("kind", &self.kind())
            .field("type", &self.descriptor.type_name())
            .field("invoked", &self.invoked)
            .finish_non_exhaustive()
    }
}
