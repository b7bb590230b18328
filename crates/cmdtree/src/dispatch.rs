//! Plain group resolution.
//!
//! A group parses its own flags permissively, then decides, first match
//! wins:
//!
//! 1. Unknown flags: run the default subcommand with the original tokens,
//!    or fail with [`UnrecognizedArguments`].
//! 2. A remainder: the first token names the subcommand (name, then alias,
//!    then the fallback), which is invoked with the rest.
//! 3. No remainder but a default: run the default with the original tokens.
//! 4. Otherwise the group runs its own action.
//!
//! Default substitution bypasses the group's own `preprocess` and
//! `results_callback`; subcommand resolution runs both around the subcommand.

use std::rc::Rc;

use tracing::debug;

use crate::command::ArgMap;
use crate::error::{CommandNotFound, DispatchError, UnrecognizedArguments};
use crate::node::{CommandNode, Invoked};
use crate::outcome::Outcome;
use crate::parser::ArgumentParser;
use crate::registry::Descriptor;

/// What a group decided to do with its tokens.
#[derive(Debug)]
pub(crate) enum Resolution {
    /// Run the group's own pipeline.
    Own(ArgMap),
    /// Run the default subcommand with the group's original tokens.
    Default(Rc<Descriptor>),
    /// Run a named (or fallback) subcommand with the rest of the remainder.
    Subcommand {
        descriptor: Rc<Descriptor>,
        alias: String,
        values: ArgMap,
        rest: Vec<String>,
    },
}

impl CommandNode {
    /// Resolves `tokens` against this group's registry using `parser`.
    pub(crate) fn resolve(
        &self,
        parser: &ArgumentParser,
        tokens: &[String],
    ) -> Result<Resolution, DispatchError> {
        let parsed = parser.parse_known(tokens)?;
        let registry = self.registry();

        if !parsed.unknown.is_empty() {
            return match registry.default_command() {
                Some(default) => {
                    debug!(
                        group = %self.identity(),
                        default = default.name(),
                        unknown = ?parsed.unknown,
                        "unknown arguments, substituting default subcommand"
                    );
                    Ok(Resolution::Default(default.clone()))
                }
                None => Err(UnrecognizedArguments::new(
                    self.identity().clone(),
                    parser.clone(),
                    parsed.unknown,
                )
                .into()),
            };
        }

        let mut remainder = parsed.remainder.into_iter();
        if let Some(sub_name) = remainder.next() {
            let descriptor = match registry.lookup(&sub_name) {
                Some(found) => found.clone(),
                None => {
                    let fallback = registry.fallback_command().ok_or_else(|| {
                        CommandNotFound::new(sub_name.clone(), self.identity().clone(), parser.clone())
                    })?;
                    debug!(
                        group = %self.identity(),
                        token = %sub_name,
                        fallback = fallback.name(),
                        "unknown subcommand, using fallback"
                    );
                    fallback.clone()
                }
            };
            return Ok(Resolution::Subcommand {
                descriptor,
                alias: sub_name,
                values: parsed.values,
                rest: remainder.collect(),
            });
        }

        if let Some(default) = registry.default_command() {
            debug!(group = %self.identity(), default = default.name(), "substituting default subcommand");
            return Ok(Resolution::Default(default.clone()));
        }

        Ok(Resolution::Own(parsed.values))
    }

    pub(crate) fn invoke_group(&mut self, tokens: &[String]) -> Result<Outcome, DispatchError> {
        let resolution = self.resolve(self.parser(), tokens)?;

        match resolution {
            Resolution::Own(values) => {
                debug!(group = %self.identity(), "no subcommand, running group action");
                self.run_pipeline(values).map(Outcome::Value)
            }
            Resolution::Default(descriptor) => {
                let mut sub = Box::new(self.child(&descriptor, None));
                let result = sub.dispatch(tokens);
                self.invoked = Invoked::Subcommand(sub);
                result
            }
            Resolution::Subcommand {
                descriptor,
                alias,
                values,
                rest,
            } => {
                let mut sub = Box::new(self.child(&descriptor, Some(&alias)));
                debug!(
                    group = %self.identity(),
                    subcommand = descriptor.name(),
                    alias = %alias,
                    "resolved subcommand"
                );

                let ctx = self.context_with(vec![sub.identity().clone()]);
                let result = self
                    .preprocess(&ctx, values)
                    .and_then(|_| sub.dispatch(&rest));
                self.invoked = Invoked::Subcommand(sub);

                let outcome = result?;
                self.results_callback(&ctx, &outcome)?;
                Ok(outcome)
            }
        }
    }
}
