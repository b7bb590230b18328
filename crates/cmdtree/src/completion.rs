//! Dry-run resolution for shell completion.
//!
//! Walks the same resolution steps as an invocation without running any
//! callback, and reports the command in effect plus the names that could
//! follow it.

use crate::command::CommandKind;
use crate::dispatch::Resolution;
use crate::error::{DispatchError, USAGE_EXIT_CODE};
use crate::node::CommandNode;

impl CommandNode {
    /// Returns the command in effect for `tokens` followed by fresh instances
    /// of every subcommand it could dispatch to next.
    ///
    /// Groups resolve with their help flag disabled, so `--help` counts as an
    /// unknown argument. Leaves do not parse at all.
    pub fn commands_for_args<I, T>(&self, tokens: I) -> Result<Vec<CommandNode>, DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        self.collect_commands(&tokens)
    }

    fn collect_commands(&self, tokens: &[String]) -> Result<Vec<CommandNode>, DispatchError> {
        if !self.kind().is_group() {
            return Ok(vec![self.respawn()]);
        }

        let parser = self.parser().without_help();
        match self.resolve(&parser, tokens)? {
            Resolution::Subcommand {
                descriptor,
                alias,
                rest,
                ..
            } => {
                let sub = self.child(&descriptor, Some(&alias));
                if descriptor.kind() == CommandKind::ChainedCommand {
                    let mut commands = vec![sub];
                    commands.extend(self.fresh_subcommands());
                    Ok(commands)
                } else {
                    sub.collect_commands(&rest)
                }
            }
            Resolution::Default(_) | Resolution::Own(_) => {
                let mut commands = vec![self.respawn()];
                commands.extend(self.fresh_subcommands());
                Ok(commands)
            }
        }
    }

    fn fresh_subcommands(&self) -> impl Iterator<Item = CommandNode> + '_ {
        self.registry()
            .iter()
            .map(move |descriptor| self.child(descriptor, None))
    }

    /// Sorted names of the subcommands that could follow `tokens`.
    ///
    /// Returns `Ok(None)` when the tokens are bad: an unknown command,
    /// unrecognized arguments or any other usage error. Other failures are
    /// returned as errors.
    pub fn possible_command_names<I, T>(&self, tokens: I) -> Result<Option<Vec<String>>, DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let commands = match self.commands_for_args(tokens) {
            Ok(commands) => commands,
            Err(DispatchError::CommandNotFound(_)) | Err(DispatchError::UnrecognizedArguments(_)) => {
                return Ok(None)
            }
            Err(err) if err.exit_code() == USAGE_EXIT_CODE => return Ok(None),
            Err(err) => return Err(err),
        };

        let mut names: Vec<String> = commands
            .iter()
            .skip(1)
            .filter_map(|command| command.name().map(String::from))
            .collect();
        names.sort();
        Ok(Some(names))
    }
}
