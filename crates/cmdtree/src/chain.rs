//! Chained group execution.
//!
//! A chained group runs several of its members back to back:
//!
//! ```text
//! myapp group 1234 move here move there
//!                  └─ member ┘└─ member ─┘
//! ```
//!
//! The whole chain is parsed before any member runs, so a typo in the last
//! member leaves every action untouched. Members are looked up by name and
//! alias only; a chained group has no default and no fallback.

use tracing::debug;

use crate::command::ArgMap;
use crate::error::{CommandNotFound, DispatchError, UnrecognizedArguments};
use crate::node::{CommandNode, Invoked};
use crate::outcome::{ChainedOutputResults, Outcome};

impl CommandNode {
    pub(crate) fn invoke_chain(&mut self, tokens: &[String]) -> Result<Outcome, DispatchError> {
        let parsed = self.parser().parse_with_remainder(tokens)?;
        if parsed.remainder.is_empty() {
            debug!(group = %self.identity(), "empty chain, running group action");
            return self.run_pipeline(parsed.values).map(Outcome::Value);
        }

        let mut members = Vec::new();
        let queued = self.parse_chain(parsed.remainder, &mut members);
        self.invoked = Invoked::Chain(members);
        let queued = queued?;

        let ctx = self.context();
        self.preprocess(&ctx, parsed.values)?;

        let mut results = ChainedOutputResults::new();
        if let Invoked::Chain(members) = &mut self.invoked {
            for (member, values) in members.iter_mut().zip(queued) {
                debug!(member = %member.identity(), "running chained command");
                let value = member.run_pipeline(values)?;
                results.add_result(member.identity().clone(), value);
            }
        }

        let outcome = Outcome::Chain(results);
        self.results_callback(&ctx, &outcome)?;
        Ok(outcome)
    }

    /// Splits `remaining` into members, pushing each constructed member onto
    /// `members` and returning their parsed flags in the same order.
    fn parse_chain(
        &self,
        mut remaining: Vec<String>,
        members: &mut Vec<CommandNode>,
    ) -> Result<Vec<ArgMap>, DispatchError> {
        let registry = self.registry().clone();
        let mut queued = Vec::new();

        while !remaining.is_empty() {
            let sub_name = remaining.remove(0);
            let descriptor = registry.lookup(&sub_name).ok_or_else(|| {
                CommandNotFound::new(sub_name.clone(), self.identity().clone(), self.parser().clone())
            })?;

            let member = self.child(descriptor, Some(&sub_name));
            let parsed = member
                .parser()
                .parse_known(&remaining)
                .map_err(DispatchError::from)
                .and_then(|parsed| {
                    if parsed.unknown.is_empty() {
                        Ok(parsed)
                    } else {
                        Err(UnrecognizedArguments::new(
                            member.identity().clone(),
                            member.parser().clone(),
                            parsed.unknown,
                        )
                        .into())
                    }
                });
            debug!(group = %self.identity(), member = descriptor.name(), alias = %sub_name, "queued chained command");
            members.push(member);

            let parsed = parsed?;
            queued.push(parsed.values);
            remaining = parsed.remainder;
        }

        Ok(queued)
    }
}
