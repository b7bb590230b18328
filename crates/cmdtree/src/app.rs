//! Application setup and the process boundary.
//!
//! [`App::builder`] takes the root command type, runs every registration in
//! the tree once at [`build`](AppBuilder::build) time and freezes the shared
//! application state. Each [`App::invoke`] builds a fresh node tree.
//!
//! ```rust
//! use cmdtree::{App, ArgMap, CallbackResult, Command, CommandContext};
//! use serde_json::{json, Value};
//!
//! struct Greeting(&'static str);
//!
//! #[derive(Default)]
//! struct Hello;
//!
//! impl Command for Hello {
//!     fn action(&mut self, ctx: &CommandContext, _args: ArgMap) -> CallbackResult<Value> {
//!         let greeting = ctx.app_state.get_required::<Greeting>()?;
//!         Ok(json!(greeting.0))
//!     }
//! }
//!
//! let app = App::builder::<Hello>()
//!     .name("hello")
//!     .app_state(Greeting("hi there"))
//!     .build()?;
//!
//! let outcome = app.invoke(Vec::<String>::new()).unwrap();
//! assert_eq!(outcome.value(), Some(&json!("hi there")));
//! # Ok::<(), cmdtree::RegistrationError>(())
//! ```

use std::ffi::OsString;
use std::marker::PhantomData;
use std::path::Path;
use std::process::ExitCode;
use std::rc::Rc;

use tracing::debug;

use crate::command::{Command, Extensions};
use crate::error::{DispatchError, RegistrationError};
use crate::node::CommandNode;
use crate::outcome::Outcome;
use crate::registry::Descriptor;

/// Builder for [`App`].
pub struct AppBuilder<C> {
    name: Option<String>,
    app_state: Extensions,
    root: PhantomData<fn() -> C>,
}

impl<C: Command + Default + 'static> AppBuilder<C> {
    pub fn new() -> Self {
        Self {
            name: None,
            app_state: Extensions::new(),
            root: PhantomData,
        }
    }

    /// Overrides the root command's name. Defaults to the root type's
    /// default name, then to the program's file name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds application state, available to every command through
    /// [`CommandContext::app_state`](crate::CommandContext::app_state).
    /// A second value of the same type replaces the first.
    pub fn app_state<T: 'static>(mut self, value: T) -> Self {
        self.app_state.insert(value);
        self
    }

    /// Runs every registration in the command tree.
    pub fn build(self) -> Result<App, RegistrationError> {
        let name = self.name.or_else(|| C::default_name().map(String::from));
        let root = Descriptor::root::<C>(name.clone())?;
        debug!(root = ?name, subcommands = root.registry().len(), "application built");
        Ok(App {
            root,
            name,
            app_state: Rc::new(self.app_state),
        })
    }
}

impl<C: Command + Default + 'static> Default for AppBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// A built command tree plus its shared application state.
#[derive(Debug)]
pub struct App {
    root: Rc<Descriptor>,
    name: Option<String>,
    app_state: Rc<Extensions>,
}

impl App {
    /// Creates a builder for an application rooted at `C`.
    pub fn builder<C: Command + Default + 'static>() -> AppBuilder<C> {
        AppBuilder::new()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn app_state(&self) -> &Rc<Extensions> {
        &self.app_state
    }

    /// A fresh root node. Invoke it directly to inspect the invoked path
    /// afterwards.
    pub fn root(&self) -> CommandNode {
        CommandNode::root(self.root.clone(), self.name.clone(), self.app_state.clone())
    }

    /// Invokes a fresh tree with `tokens` (program name excluded).
    pub fn invoke<I, T>(&self, tokens: I) -> Result<Outcome, DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.root().invoke(tokens)
    }

    /// Invokes a fresh tree with a full argument vector. The first element is
    /// the program name; it names the root when nothing else did.
    pub fn try_run_from<I, T>(&self, args: I) -> Result<Outcome, DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut args = args.into_iter().map(Into::into);
        let program = args.next();
        let tokens: Vec<String> = args.map(|arg| arg.to_string_lossy().into_owned()).collect();

        let name = self.name.clone().or_else(|| {
            program.as_deref().and_then(|program| {
                Path::new(program)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
        });
        debug!(program = ?name, ?tokens, "dispatching");

        CommandNode::root(self.root.clone(), name, self.app_state.clone()).invoke(tokens)
    }

    /// Like [`try_run_from`](Self::try_run_from), reporting failures and
    /// mapping them to an exit status. The outcome itself is discarded.
    pub fn run_from<I, T>(&self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        exit_code(self.try_run_from(args))
    }

    /// Runs with the process arguments.
    pub fn run(&self) -> ExitCode {
        self.run_from(std::env::args_os())
    }
}

/// Maps a dispatch result to a process exit status, reporting any error.
pub fn exit_code<T>(result: Result<T, DispatchError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            err.report();
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}
