//! `tdoo`: a task manager built on cmdtree.

mod commands;
mod store;

use std::process::ExitCode;

use cmdtree::{exit_code, serialize, App, RegistrationError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::Tdoo;
use crate::store::{Settings, TaskStore};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is WARN
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("cmdtree=debug,tdoo=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn build_app(store: TaskStore) -> Result<App, RegistrationError> {
    App::builder::<Tdoo>()
        .app_state(store)
        .app_state(Settings::default())
        .build()
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    // Logging has to be up before dispatch parses the flag.
    init_tracing(args.iter().skip(1).any(|arg| arg == "--debug"));

    let app = match build_app(TaskStore::with_samples()) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match app.try_run_from(args) {
        Ok(outcome) => outcome,
        failed => return exit_code(failed),
    };

    let format = app
        .app_state()
        .get::<Settings>()
        .map(|settings| settings.format.get())
        .unwrap_or_default();
    match serialize(&outcome, format) {
        Ok(rendered) => {
            println!("{}", rendered.trim_end());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdtree::OutputFormat;
    use serde_json::{json, Value};

    fn app() -> App {
        build_app(TaskStore::with_samples()).unwrap()
    }

    fn run(app: &App, cmdline: &str) -> Value {
        let args = std::iter::once("tdoo").chain(cmdline.split_whitespace());
        app.try_run_from(args).unwrap().into_value().unwrap()
    }

    fn store(app: &App) -> &TaskStore {
        app.app_state().get::<TaskStore>().unwrap()
    }

    #[test]
    fn test_bare_invocation_lists_open_tasks() {
        let app = app();
        store(&app).update(1, |task| task.done = true).unwrap();

        let tasks = run(&app, "");
        assert_eq!(tasks.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_list_alias_and_all_flag() {
        let app = app();
        store(&app).update(1, |task| task.done = true).unwrap();

        assert_eq!(run(&app, "ls").as_array().unwrap().len(), 2);
        assert_eq!(run(&app, "ls --all").as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_add_with_tags() {
        let app = app();
        let task = run(&app, "new Groceries --tag home -t errands");
        assert_eq!(
            task,
            json!({"id": 4, "title": "Groceries", "done": false, "tags": ["home", "errands"]})
        );
    }

    #[test]
    fn test_add_requires_title() {
        let err = app().try_run_from(["tdoo", "add"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_tags_defaults_to_list() {
        let app = app();
        assert_eq!(run(&app, "tags"), json!({"bug": 1, "ci": 1, "docs": 1}));
        assert_eq!(run(&app, "tags rename bug defect"), json!({"renamed": 1}));
        assert_eq!(run(&app, "tags list"), json!({"ci": 1, "defect": 1, "docs": 1}));
    }

    #[test]
    fn test_task_id_shows_task() {
        let task = run(&app(), "3");
        assert_eq!(task["title"], "Book flights");
    }

    #[test]
    fn test_chained_edits_run_in_order() {
        let app = app();
        let outcome = app
            .try_run_from(["tdoo", "3", "rename", "Book trains", "finish", "tag", "travel"])
            .unwrap();
        let chain = outcome.chain().unwrap();
        let commands: Vec<_> = chain.iter().map(|result| result.command.name()).collect();
        assert_eq!(commands, vec![Some("rename"), Some("done"), Some("tag")]);

        assert_eq!(
            store(&app).get(3).unwrap(),
            crate::store::Task {
                id: 3,
                title: "Book trains".into(),
                done: true,
                tags: vec!["travel".into()],
            }
        );
    }

    #[test]
    fn test_unknown_task_fails_before_edits() {
        let app = app();
        let err = app.try_run_from(["tdoo", "42", "done"]).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("no task with id 42"));
    }

    #[test]
    fn test_format_flag_is_recorded() {
        let app = app();
        run(&app, "--format yaml ls");
        let settings = app.app_state().get::<Settings>().unwrap();
        assert_eq!(settings.format.get(), OutputFormat::Yaml);
    }

    #[test]
    fn test_unknown_chain_member() {
        let err = app().try_run_from(["tdoo", "1", "archive"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
