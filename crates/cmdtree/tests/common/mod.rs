//! Command tree shared by the integration tests.
//!
//! ```text
//! myapp [--appopt]
//! ├── help (docs) [--helpopt]
//! ├── group (task) [--groupopt]
//! │   ├── list (table) [--listopt]
//! │   ├── create (new) [--createopt]
//! │   └── ID (fallback, chained) [--vieweditopt]
//! │       ├── change (edit) [--changeopt]
//! │       └── move (relocate) [--moveopt] <where>
//! ├── listdefault [--groupopt]      same as group, with list as default
//! ├── empty (chained, no members)
//! ├── override [--toreplace]        preprocess replaces the flags
//! └── badoverride                   preprocess returns `false`
//! ```
//!
//! Every callback appends a [`Call`] to the [`Recorder`] stored in the
//! application state.

#![allow(dead_code)]

use std::cell::RefCell;

use cmdtree::clap::Arg;
use cmdtree::{
    App, ArgMap, CallbackResult, Command, CommandContext, CommandKind, Outcome, Registration,
    Registry, RegistrationError,
};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Preprocess,
    Action,
    Results,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Canonical name of the command.
    pub command: String,
    /// The token it was invoked with.
    pub alias: Option<String>,
    pub phase: Phase,
    /// Flags for `Preprocess`/`Action`, the serialized outcome for `Results`.
    pub args: Value,
}

#[derive(Debug, Default)]
pub struct Recorder {
    calls: RefCell<Vec<Call>>,
}

impl Recorder {
    fn record(&self, ctx: &CommandContext, phase: Phase, args: Value) {
        self.calls.borrow_mut().push(Call {
            command: ctx.command.name().unwrap_or_default().to_string(),
            alias: ctx.command.alias().map(String::from),
            phase,
            args,
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Arguments of every `phase` call made by `command`, in order.
    pub fn args(&self, command: &str, phase: Phase) -> Vec<Value> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.command == command && call.phase == phase)
            .map(|call| call.args.clone())
            .collect()
    }

    pub fn assert_called_once_with(&self, command: &str, phase: Phase, expected: Value) {
        assert_eq!(
            self.args(command, phase),
            vec![expected],
            "{command} {phase:?} calls"
        );
    }

    pub fn assert_not_called(&self, command: &str, phase: Phase) {
        assert!(
            self.args(command, phase).is_empty(),
            "{command} {phase:?} was called: {:?}",
            self.args(command, phase)
        );
    }
}

fn record(ctx: &CommandContext, phase: Phase, args: Value) -> CallbackResult<()> {
    ctx.app_state.get_required::<Recorder>()?.record(ctx, phase, args);
    Ok(())
}

fn record_args(ctx: &CommandContext, phase: Phase, args: &ArgMap) -> CallbackResult<()> {
    record(ctx, phase, Value::Object(args.clone()))
}

fn record_results(ctx: &CommandContext, outcome: &Outcome) -> CallbackResult<()> {
    record(ctx, Phase::Results, serde_json::to_value(outcome)?)
}

fn opt(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

#[derive(Default)]
pub struct MyApplication;

impl Command for MyApplication {
    fn default_name() -> Option<&'static str> {
        Some("myapp")
    }

    fn kind() -> CommandKind {
        CommandKind::Group
    }

    fn add_arguments(&self, cmd: cmdtree::clap::Command) -> cmdtree::clap::Command {
        cmd.arg(opt("appopt"))
    }

    fn register_subcommands(&self, registry: &mut Registry) -> Result<(), RegistrationError> {
        registry.register::<SimpleCommand>()?;
        registry.register::<ItemGroupCommand>()?;
        registry.register::<ItemGroupCommandDefault>()?;
        registry.register::<EmptyChainedGroup>()?;
        registry.register::<PreprocessingCommand>()?;
        registry.register::<BadPreprocessingCommand>()?;
        Ok(())
    }

    fn preprocess(&mut self, ctx: &CommandContext, args: &ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Preprocess, args)?;
        Ok(Value::Null)
    }

    fn action(&mut self, ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Action, &args)?;
        Ok(Value::Null)
    }

    fn results_callback(&mut self, ctx: &CommandContext, outcome: &Outcome) -> CallbackResult<()> {
        record_results(ctx, outcome)
    }
}

/// Print help
#[derive(Default)]
pub struct SimpleCommand;

impl Command for SimpleCommand {
    fn default_name() -> Option<&'static str> {
        Some("help")
    }

    fn default_aliases() -> &'static [&'static str] {
        &["docs"]
    }

    fn about() -> Option<&'static str> {
        Some("Print help")
    }

    fn add_arguments(&self, cmd: cmdtree::clap::Command) -> cmdtree::clap::Command {
        cmd.arg(opt("helpopt"))
    }

    fn preprocess(&mut self, ctx: &CommandContext, args: &ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Preprocess, args)?;
        Ok(Value::Null)
    }

    fn action(&mut self, ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Action, &args)?;
        Ok(Value::Null)
    }
}

#[derive(Default)]
pub struct BadPreprocessingCommand;

impl Command for BadPreprocessingCommand {
    fn default_name() -> Option<&'static str> {
        Some("badoverride")
    }

    fn preprocess(&mut self, ctx: &CommandContext, args: &ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Preprocess, args)?;
        Ok(Value::Bool(false))
    }

    fn action(&mut self, ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Action, &args)?;
        Ok(Value::Null)
    }
}

#[derive(Default)]
pub struct PreprocessingCommand;

impl Command for PreprocessingCommand {
    fn default_name() -> Option<&'static str> {
        Some("override")
    }

    fn add_arguments(&self, cmd: cmdtree::clap::Command) -> cmdtree::clap::Command {
        cmd.arg(opt("toreplace"))
    }

    fn preprocess(&mut self, ctx: &CommandContext, args: &ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Preprocess, args)?;
        Ok(json!({"replaced": "othervalue"}))
    }

    fn action(&mut self, ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Action, &args)?;
        Ok(Value::Null)
    }
}

fn register_items(registry: &mut Registry, list_is_default: bool) -> Result<(), RegistrationError> {
    if list_is_default {
        registry.register_with::<ListCommand>(Registration::new().as_default())?;
    } else {
        registry.register::<ListCommand>()?;
    }
    registry.register::<CreateCommand>()?;
    registry.register_with::<ViewEditCommand>(Registration::new().as_fallback())
}

#[derive(Default)]
pub struct ItemGroupCommand;

impl Command for ItemGroupCommand {
    fn default_name() -> Option<&'static str> {
        Some("group")
    }

    fn default_aliases() -> &'static [&'static str] {
        &["task"]
    }

    fn kind() -> CommandKind {
        CommandKind::Group
    }

    fn about() -> Option<&'static str> {
        Some("Print help")
    }

    fn add_arguments(&self, cmd: cmdtree::clap::Command) -> cmdtree::clap::Command {
        cmd.arg(opt("groupopt"))
    }

    fn register_subcommands(&self, registry: &mut Registry) -> Result<(), RegistrationError> {
        register_items(registry, false)
    }

    fn preprocess(&mut self, ctx: &CommandContext, args: &ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Preprocess, args)?;
        Ok(Value::Null)
    }

    fn action(&mut self, ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Action, &args)?;
        Ok(Value::Null)
    }

    fn results_callback(&mut self, ctx: &CommandContext, outcome: &Outcome) -> CallbackResult<()> {
        record_results(ctx, outcome)
    }
}

#[derive(Default)]
pub struct ItemGroupCommandDefault;

impl Command for ItemGroupCommandDefault {
    fn default_name() -> Option<&'static str> {
        Some("listdefault")
    }

    fn kind() -> CommandKind {
        CommandKind::Group
    }

    fn about() -> Option<&'static str> {
        Some("Item Group with List command as default")
    }

    fn add_arguments(&self, cmd: cmdtree::clap::Command) -> cmdtree::clap::Command {
        cmd.arg(opt("groupopt"))
    }

    fn register_subcommands(&self, registry: &mut Registry) -> Result<(), RegistrationError> {
        register_items(registry, true)
    }

    fn preprocess(&mut self, ctx: &CommandContext, args: &ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Preprocess, args)?;
        Ok(Value::Null)
    }

    fn action(&mut self, ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Action, &args)?;
        Ok(Value::Null)
    }

    fn results_callback(&mut self, ctx: &CommandContext, outcome: &Outcome) -> CallbackResult<()> {
        record_results(ctx, outcome)
    }
}

#[derive(Default)]
pub struct ListCommand;

impl Command for ListCommand {
    fn default_name() -> Option<&'static str> {
        Some("list")
    }

    fn default_aliases() -> &'static [&'static str] {
        &["table"]
    }

    fn add_arguments(&self, cmd: cmdtree::clap::Command) -> cmdtree::clap::Command {
        cmd.arg(opt("listopt"))
    }

    fn preprocess(&mut self, ctx: &CommandContext, args: &ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Preprocess, args)?;
        Ok(Value::Null)
    }

    fn action(&mut self, ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Action, &args)?;
        Ok(json!("rv-from-list"))
    }
}

#[derive(Default)]
pub struct CreateCommand;

impl Command for CreateCommand {
    fn default_name() -> Option<&'static str> {
        Some("create")
    }

    fn default_aliases() -> &'static [&'static str] {
        &["new"]
    }

    fn add_arguments(&self, cmd: cmdtree::clap::Command) -> cmdtree::clap::Command {
        cmd.arg(opt("createopt"))
    }

    fn preprocess(&mut self, ctx: &CommandContext, args: &ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Preprocess, args)?;
        Ok(Value::Null)
    }

    fn action(&mut self, ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Action, &args)?;
        Ok(json!("rv-from-create"))
    }
}

#[derive(Default)]
pub struct ViewEditCommand;

impl Command for ViewEditCommand {
    fn default_name() -> Option<&'static str> {
        Some("ID")
    }

    fn kind() -> CommandKind {
        CommandKind::ChainedGroup
    }

    fn add_arguments(&self, cmd: cmdtree::clap::Command) -> cmdtree::clap::Command {
        cmd.arg(opt("vieweditopt"))
    }

    fn register_subcommands(&self, registry: &mut Registry) -> Result<(), RegistrationError> {
        registry.register::<ItemChange>()?;
        registry.register::<ItemMove>()
    }

    fn preprocess(&mut self, ctx: &CommandContext, args: &ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Preprocess, args)?;
        Ok(Value::Null)
    }

    fn action(&mut self, ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Action, &args)?;
        Ok(Value::Null)
    }

    fn results_callback(&mut self, ctx: &CommandContext, outcome: &Outcome) -> CallbackResult<()> {
        anyhow::ensure!(outcome.chain().is_some(), "expected chained results");
        record_results(ctx, outcome)
    }
}

#[derive(Default)]
pub struct ItemChange;

impl Command for ItemChange {
    fn default_name() -> Option<&'static str> {
        Some("change")
    }

    fn default_aliases() -> &'static [&'static str] {
        &["edit"]
    }

    fn kind() -> CommandKind {
        CommandKind::ChainedCommand
    }

    fn add_arguments(&self, cmd: cmdtree::clap::Command) -> cmdtree::clap::Command {
        cmd.arg(opt("changeopt"))
    }

    fn preprocess(&mut self, ctx: &CommandContext, args: &ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Preprocess, args)?;
        Ok(Value::Null)
    }

    fn action(&mut self, ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Action, &args)?;
        Ok(json!("rv-from-change"))
    }
}

#[derive(Default)]
pub struct ItemMove;

impl Command for ItemMove {
    fn default_name() -> Option<&'static str> {
        Some("move")
    }

    fn default_aliases() -> &'static [&'static str] {
        &["relocate"]
    }

    fn kind() -> CommandKind {
        CommandKind::ChainedCommand
    }

    fn add_arguments(&self, cmd: cmdtree::clap::Command) -> cmdtree::clap::Command {
        cmd.arg(opt("moveopt")).arg(Arg::new("where").required(true))
    }

    fn preprocess(&mut self, ctx: &CommandContext, args: &ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Preprocess, args)?;
        Ok(Value::Null)
    }

    fn action(&mut self, ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
        record_args(ctx, Phase::Action, &args)?;
        Ok(json!("rv-from-move"))
    }
}

#[derive(Default)]
pub struct EmptyChainedGroup;

impl Command for EmptyChainedGroup {
    fn default_name() -> Option<&'static str> {
        Some("empty")
    }

    fn kind() -> CommandKind {
        CommandKind::ChainedGroup
    }
}

/// Builds the test application with a fresh recorder.
pub fn myapp() -> App {
    App::builder::<MyApplication>()
        .app_state(Recorder::default())
        .build()
        .expect("test tree registers cleanly")
}

pub fn recorder(app: &App) -> &Recorder {
    app.app_state()
        .get::<Recorder>()
        .expect("recorder installed")
}

/// Splits a command line on single spaces; the empty line has no tokens.
pub fn split(cmdargs: &str) -> Vec<String> {
    if cmdargs.is_empty() {
        Vec::new()
    } else {
        cmdargs.split(' ').map(String::from).collect()
    }
}
