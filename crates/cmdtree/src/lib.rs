//! Recursive command dispatch for nested command-line interfaces.
//!
//! `cmdtree` routes an argument vector through a tree of command types:
//! plain leaves, groups that resolve one subcommand per invocation, and
//! chained groups that run several sibling commands back to back. Every level
//! owns its flags; a group parses its own flags, resolves the next name and
//! hands the rest of the tokens to the subcommand it constructed.
//!
//! # Features
//!
//! - **Name and alias registry**: one shared key space, collisions rejected
//!   when the application is built
//! - **Default and fallback subcommands**: run a command when no name (or an
//!   unknown name) follows a group
//! - **Chained groups**: `item 12 move here tag urgent`, parsed as a whole
//!   before any member runs
//! - **Three-phase pipeline**: `preprocess` → `action` → `results_callback`
//! - **Completion listing**: the names that could follow a partial command
//!   line
//! - **Structured output**: results serialize to JSON or YAML
//!
//! # Example
//!
//! ```rust
//! use cmdtree::{
//!     App, ArgMap, CallbackResult, Command, CommandContext, CommandKind, Registration,
//!     Registry, RegistrationError,
//! };
//! use serde_json::{json, Value};
//!
//! #[derive(Default)]
//! struct Tasks;
//!
//! impl Command for Tasks {
//!     fn default_name() -> Option<&'static str> {
//!         Some("tasks")
//!     }
//!
//!     fn kind() -> CommandKind {
//!         CommandKind::Group
//!     }
//!
//!     fn register_subcommands(&self, registry: &mut Registry) -> Result<(), RegistrationError> {
//!         registry.register_with::<List>(Registration::new().as_default())
//!     }
//! }
//!
//! #[derive(Default)]
//! struct List;
//!
//! impl Command for List {
//!     fn default_name() -> Option<&'static str> {
//!         Some("list")
//!     }
//!
//!     fn default_aliases() -> &'static [&'static str] {
//!         &["ls"]
//!     }
//!
//!     fn action(&mut self, _ctx: &CommandContext, _args: ArgMap) -> CallbackResult<Value> {
//!         Ok(json!(["write docs"]))
//!     }
//! }
//!
//! let app = App::builder::<Tasks>().build()?;
//!
//! // `tasks`, `tasks list` and `tasks ls` all run `list`.
//! for tokens in [vec![], vec!["list"], vec!["ls"]] {
//!     let outcome = app.invoke(tokens).unwrap();
//!     assert_eq!(outcome.value(), Some(&json!(["write docs"])));
//! }
//! # Ok::<(), RegistrationError>(())
//! ```
//!
//! # Exit statuses
//!
//! | Failure | Status |
//! |---------|--------|
//! | help display | 0 |
//! | unknown command, unrecognized or invalid arguments | 2 |
//! | `preprocess` contract violation, failing callback | 1 |

mod app;
mod chain;
mod command;
mod completion;
mod dispatch;
mod error;
mod help;
mod identity;
mod node;
mod outcome;
mod parser;
mod registry;
mod serialize;
mod values;

pub use app::{exit_code, App, AppBuilder};
pub use command::{ArgMap, CallbackResult, Command, CommandContext, CommandKind, Extensions};
pub use error::{
    CommandNotFound, DispatchError, PipelineContractError, RegistrationError,
    UnrecognizedArguments, FAILURE_EXIT_CODE, USAGE_EXIT_CODE,
};
pub use help::{split_about, subcommands_section};
pub use identity::Identity;
pub use node::{CommandNode, Invoked};
pub use outcome::{ChainedOutputResults, ChainedResult, Outcome};
pub use parser::{ArgumentParser, ParsedArgs};
pub use registry::{Descriptor, Factory, Registration, Registry};
pub use serialize::{serialize, to_json, to_yaml, OutputFormat, SerializeError};

// Re-export clap so commands can declare arguments against the same version.
pub use clap;
