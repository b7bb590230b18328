//! Error types.
//!
//! Two families:
//!
//! - [`RegistrationError`]: programmer mistakes in how command types are
//!   registered. Raised while the application is built, never at invocation.
//! - [`DispatchError`]: everything that can go wrong while invoking a tree.
//!   Usage problems (unknown command, unrecognized arguments, parser errors)
//!   exit with status 2; broken command implementations exit with status 1.

use std::rc::Rc;

use clap::error::ErrorKind;
use serde_json::Value;
use thiserror::Error;

use crate::identity::Identity;
use crate::parser::ArgumentParser;

/// Exit status for usage errors, matching clap.
pub const USAGE_EXIT_CODE: i32 = 2;

/// Exit status for contract violations and failing commands.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// A command type was registered incorrectly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("no name specified for command type {command}")]
    MissingName { command: &'static str },

    #[error("command with name `{0}` is already registered")]
    DuplicateName(String),

    #[error("name `{0}` is already registered as an alias")]
    NameRegisteredAsAlias(String),

    #[error("alias `{0}` is already registered as a command")]
    AliasRegisteredAsName(String),

    #[error("alias `{0}` is already registered")]
    DuplicateAlias(String),

    #[error("a default subcommand is already registered: `{0}`")]
    DuplicateDefault(String),

    #[error("a fallback subcommand is already registered: `{0}`")]
    DuplicateFallback(String),

    #[error("chained groups do not support default subcommands (`{0}`)")]
    DefaultInChainedGroup(String),

    #[error("chained groups do not support fallback subcommands (`{0}`)")]
    FallbackInChainedGroup(String),

    #[error("only chained commands can be registered into a chained group, {command} is not one")]
    NotChainable { command: &'static str },
}

/// A subcommand name matched nothing and no fallback applied.
#[derive(Debug, Error)]
#[error("unknown command `{command_name}'")]
pub struct CommandNotFound {
    /// The unmatched token.
    pub command_name: String,
    /// The group that failed to resolve it.
    pub group: Rc<Identity>,
    parser: ArgumentParser,
}

impl CommandNotFound {
    pub(crate) fn new(command_name: String, group: Rc<Identity>, parser: ArgumentParser) -> Self {
        Self {
            command_name,
            group,
            parser,
        }
    }

    /// The parser of the group that failed to resolve the name.
    pub fn parser(&self) -> &ArgumentParser {
        &self.parser
    }

    /// Renders this error through the group's parser, with its usage line.
    pub fn to_usage_error(&self) -> clap::Error {
        self.parser.error(ErrorKind::InvalidSubcommand, self)
    }
}

/// Tokens nobody claimed.
#[derive(Debug, Error)]
#[error("unrecognized arguments: {}", .unknown_args.join(" "))]
pub struct UnrecognizedArguments {
    /// The command whose parser saw the tokens.
    pub command: Rc<Identity>,
    /// The offending tokens, in order.
    pub unknown_args: Vec<String>,
    parser: ArgumentParser,
}

impl UnrecognizedArguments {
    pub(crate) fn new(
        command: Rc<Identity>,
        parser: ArgumentParser,
        unknown_args: Vec<String>,
    ) -> Self {
        Self {
            command,
            unknown_args,
            parser,
        }
    }

    /// The parser of the command that saw the tokens.
    pub fn parser(&self) -> &ArgumentParser {
        &self.parser
    }

    /// Renders this error through the owning parser, with its usage line.
    pub fn to_usage_error(&self) -> clap::Error {
        self.parser.error(ErrorKind::UnknownArgument, self)
    }
}

/// `preprocess` returned something other than an object or null.
///
/// This is a defect in the command implementation, not a usage error.
#[derive(Debug, Error)]
#[error("preprocess of `{command}` must return an object or null, {found} returned instead")]
pub struct PipelineContractError {
    /// The command whose preprocess broke the contract.
    pub command: Rc<Identity>,
    /// JSON type of the returned value.
    pub found: &'static str,
}

impl PipelineContractError {
    pub(crate) fn new(command: Rc<Identity>, returned: &Value) -> Self {
        let found = match returned {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
            Value::Object(_) => "an object",
        };
        Self { command, found }
    }
}

/// Errors raised while invoking a command tree.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    CommandNotFound(#[from] CommandNotFound),

    #[error(transparent)]
    UnrecognizedArguments(#[from] UnrecognizedArguments),

    #[error(transparent)]
    PipelineContract(#[from] PipelineContractError),

    /// The parser rejected the tokens, or a help display was requested.
    #[error(transparent)]
    Usage(#[from] clap::Error),

    /// A callback returned an error.
    #[error("{command}: {source}")]
    Command {
        command: Rc<Identity>,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    pub(crate) fn command(command: &Rc<Identity>, source: anyhow::Error) -> Self {
        DispatchError::Command {
            command: command.clone(),
            source,
        }
    }

    /// Returns true for errors caused by what the user typed.
    pub fn is_usage(&self) -> bool {
        self.exit_code() == USAGE_EXIT_CODE
    }

    /// Process exit status for this error.
    ///
    /// Help and version displays surface as [`DispatchError::Usage`] with
    /// status 0.
    pub fn exit_code(&self) -> i32 {
        match self {
            DispatchError::Usage(err) => err.exit_code(),
            DispatchError::CommandNotFound(_) | DispatchError::UnrecognizedArguments(_) => {
                USAGE_EXIT_CODE
            }
            DispatchError::PipelineContract(_) | DispatchError::Command { .. } => {
                FAILURE_EXIT_CODE
            }
        }
    }

    /// Prints the diagnostic to stderr (help displays go to stdout).
    pub fn report(&self) {
        let printed = match self {
            DispatchError::Usage(err) => err.print(),
            DispatchError::CommandNotFound(err) => err.to_usage_error().print(),
            DispatchError::UnrecognizedArguments(err) => err.to_usage_error().print(),
            other => {
                eprintln!("error: {other}");
                Ok(())
            }
        };
        if let Err(err) = printed {
            eprintln!("error: {self} (failed to print diagnostic: {err})");
        }
    }
}
