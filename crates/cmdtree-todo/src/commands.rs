//! The `tdoo` command tree.
//!
//! ```text
//! tdoo [--format json|yaml] [--debug]     lists open tasks
//! ├── list (ls) [--all]
//! ├── add (new) <title> [--tag TAG]...
//! ├── tags                                default: list
//! │   ├── list
//! │   └── rename <old> <new>
//! └── <ID> (fallback, chained)
//!     ├── done (finish)
//!     ├── rename <title>
//!     └── tag <tag>
//! ```

use anyhow::{anyhow, Context};
use clap::{value_parser, Arg, ArgAction, ValueEnum};
use cmdtree::{
    ArgMap, CallbackResult, Command, CommandContext, CommandKind, Identity, OutputFormat, Outcome,
    Registration, Registry, RegistrationError,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::store::{Settings, TaskStore};

fn store(ctx: &CommandContext) -> anyhow::Result<&TaskStore> {
    ctx.app_state.get_required::<TaskStore>()
}

fn string_arg<'a>(args: &'a ArgMap, id: &str) -> anyhow::Result<&'a str> {
    args.get(id)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("missing argument `{id}`"))
}

fn tasks_json(tasks: Vec<crate::store::Task>) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(tasks)?)
}

#[derive(Default)]
pub struct Tdoo;

impl Command for Tdoo {
    fn default_name() -> Option<&'static str> {
        Some("tdoo")
    }

    fn kind() -> CommandKind {
        CommandKind::Group
    }

    fn about() -> Option<&'static str> {
        Some("A small task manager\n\nWithout a subcommand, lists the open tasks.")
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            Arg::new("format")
                .long("format")
                .value_parser(value_parser!(OutputFormat))
                .default_value("json")
                .help("Output format"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Log dispatch decisions to stderr"),
        )
    }

    fn register_subcommands(&self, registry: &mut Registry) -> Result<(), RegistrationError> {
        registry.register::<ListTasks>()?;
        registry.register::<AddTask>()?;
        registry.register::<Tags>()?;
        registry.register_with::<TaskEdit>(Registration::new().as_fallback())
    }

    fn preprocess(&mut self, ctx: &CommandContext, args: &ArgMap) -> CallbackResult<Value> {
        let format = args.get("format").and_then(Value::as_str).unwrap_or("json");
        let format = OutputFormat::from_str(format, true).map_err(|err| anyhow!(err))?;
        ctx.app_state.get_required::<Settings>()?.format.set(format);
        Ok(Value::Null)
    }

    fn action(&mut self, ctx: &CommandContext, _args: ArgMap) -> CallbackResult<Value> {
        tasks_json(store(ctx)?.list(false))
    }
}

#[derive(Default)]
pub struct ListTasks;

impl Command for ListTasks {
    fn default_name() -> Option<&'static str> {
        Some("list")
    }

    fn default_aliases() -> &'static [&'static str] {
        &["ls"]
    }

    fn about() -> Option<&'static str> {
        Some("List tasks")
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            Arg::new("all")
                .long("all")
                .short('a')
                .action(ArgAction::SetTrue)
                .help("Include finished tasks"),
        )
    }

    fn action(&mut self, ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
        let all = args.get("all").and_then(Value::as_bool).unwrap_or(false);
        tasks_json(store(ctx)?.list(all))
    }
}

#[derive(Default)]
pub struct AddTask;

impl Command for AddTask {
    fn default_name() -> Option<&'static str> {
        Some("add")
    }

    fn default_aliases() -> &'static [&'static str] {
        &["new"]
    }

    fn about() -> Option<&'static str> {
        Some("Add a task")
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(Arg::new("title").required(true).help("What needs doing"))
            .arg(
                Arg::new("tag")
                    .long("tag")
                    .short('t')
                    .action(ArgAction::Append)
                    .help("Tag the task, repeatable"),
            )
    }

    fn action(&mut self, ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
        let title = string_arg(&args, "title")?;
        let tags: Vec<String> = args
            .get("tag")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default();
        let task = store(ctx)?.add(title, &tags);
        debug!(id = task.id, "task added");
        Ok(serde_json::to_value(task)?)
    }
}

#[derive(Default)]
pub struct Tags;

impl Command for Tags {
    fn default_name() -> Option<&'static str> {
        Some("tags")
    }

    fn kind() -> CommandKind {
        CommandKind::Group
    }

    fn about() -> Option<&'static str> {
        Some("Inspect and rename tags")
    }

    fn register_subcommands(&self, registry: &mut Registry) -> Result<(), RegistrationError> {
        registry.register_with::<ListTags>(Registration::new().as_default())?;
        registry.register::<RenameTag>()
    }
}

#[derive(Default)]
pub struct ListTags;

impl Command for ListTags {
    fn default_name() -> Option<&'static str> {
        Some("list")
    }

    fn about() -> Option<&'static str> {
        Some("List tags with their task counts")
    }

    fn action(&mut self, ctx: &CommandContext, _args: ArgMap) -> CallbackResult<Value> {
        let tags: serde_json::Map<String, Value> = store(ctx)?
            .tags()
            .into_iter()
            .map(|(tag, count)| (tag, json!(count)))
            .collect();
        Ok(Value::Object(tags))
    }
}

#[derive(Default)]
pub struct RenameTag;

impl Command for RenameTag {
    fn default_name() -> Option<&'static str> {
        Some("rename")
    }

    fn about() -> Option<&'static str> {
        Some("Rename a tag on every task")
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(Arg::new("old").required(true))
            .arg(Arg::new("new").required(true))
    }

    fn action(&mut self, ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
        let touched = store(ctx)?.rename_tag(string_arg(&args, "old")?, string_arg(&args, "new")?);
        Ok(json!({ "renamed": touched }))
    }
}

/// Edits the task whose id was typed in place of a subcommand name.
#[derive(Default)]
pub struct TaskEdit;

/// The task id a chain member operates on: the token its group was invoked
/// with.
fn task_id(command: &Identity) -> anyhow::Result<u32> {
    let token = command
        .parent()
        .and_then(Identity::alias)
        .context("task edits need a task id")?;
    token
        .parse()
        .with_context(|| format!("`{token}` is not a task id"))
}

impl Command for TaskEdit {
    fn default_name() -> Option<&'static str> {
        Some("ID")
    }

    fn kind() -> CommandKind {
        CommandKind::ChainedGroup
    }

    fn about() -> Option<&'static str> {
        Some("Edit a task\n\nType the task id, then any number of edits: `tdoo 3 rename \"Call Bob\" done`.")
    }

    fn register_subcommands(&self, registry: &mut Registry) -> Result<(), RegistrationError> {
        registry.register::<Done>()?;
        registry.register::<RenameTask>()?;
        registry.register::<TagTask>()
    }

    fn preprocess(&mut self, ctx: &CommandContext, _args: &ArgMap) -> CallbackResult<Value> {
        let id: u32 = match ctx.command.alias() {
            Some(token) => token
                .parse()
                .with_context(|| format!("`{token}` is not a task id"))?,
            None => return Ok(Value::Null),
        };
        store(ctx)?.get(id)?;
        Ok(Value::Null)
    }

    fn action(&mut self, ctx: &CommandContext, _args: ArgMap) -> CallbackResult<Value> {
        let id: u32 = ctx
            .command
            .alias()
            .context("task edits need a task id")?
            .parse()?;
        Ok(serde_json::to_value(store(ctx)?.get(id)?)?)
    }

    fn results_callback(&mut self, ctx: &CommandContext, outcome: &Outcome) -> CallbackResult<()> {
        let edits = outcome.chain().map(|chain| chain.len()).unwrap_or(0);
        debug!(
            task = ctx.command.alias(),
            path = ?ctx.command.command_path(),
            edits,
            "task edited"
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct Done;

impl Command for Done {
    fn default_name() -> Option<&'static str> {
        Some("done")
    }

    fn default_aliases() -> &'static [&'static str] {
        &["finish"]
    }

    fn kind() -> CommandKind {
        CommandKind::ChainedCommand
    }

    fn about() -> Option<&'static str> {
        Some("Mark the task finished")
    }

    fn action(&mut self, ctx: &CommandContext, _args: ArgMap) -> CallbackResult<Value> {
        let task = store(ctx)?.update(task_id(&ctx.command)?, |task| task.done = true)?;
        Ok(serde_json::to_value(task)?)
    }
}

#[derive(Default)]
pub struct RenameTask;

impl Command for RenameTask {
    fn default_name() -> Option<&'static str> {
        Some("rename")
    }

    fn kind() -> CommandKind {
        CommandKind::ChainedCommand
    }

    fn about() -> Option<&'static str> {
        Some("Change the task title")
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(Arg::new("title").required(true))
    }

    fn action(&mut self, ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
        let title = string_arg(&args, "title")?.to_string();
        let task = store(ctx)?.update(task_id(&ctx.command)?, |task| task.title = title)?;
        Ok(serde_json::to_value(task)?)
    }
}

#[derive(Default)]
pub struct TagTask;

impl Command for TagTask {
    fn default_name() -> Option<&'static str> {
        Some("tag")
    }

    fn kind() -> CommandKind {
        CommandKind::ChainedCommand
    }

    fn about() -> Option<&'static str> {
        Some("Add a tag to the task")
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(Arg::new("tag").required(true))
    }

    fn action(&mut self, ctx: &CommandContext, args: ArgMap) -> CallbackResult<Value> {
        let tag = string_arg(&args, "tag")?.to_string();
        let task = store(ctx)?.update(task_id(&ctx.command)?, |task| {
            if !task.tags.contains(&tag) {
                task.tags.push(tag);
            }
        })?;
        Ok(serde_json::to_value(task)?)
    }
}
