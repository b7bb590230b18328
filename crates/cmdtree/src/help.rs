//! Help text extras: about splitting and the subcommand listing.
//!
//! clap renders the usage line, about text and arguments. Groups additionally
//! get a section listing their registered subcommands, appended after the
//! arguments, followed by the long description:
//!
//! ```text
//! Usage: myapp group [OPTIONS] [COMMAND] [ARGS]...
//!
//! Options:
//!       --groupopt <groupopt>
//!   -h, --help                 Print help
//!
//! Subcommands:
//!   list    List items
//!   create  Create an item
//! ```

use crate::registry::Registry;

const DEFAULT_WIDTH: usize = 80;
const INDENT: usize = 2;
const MAX_HELP_POSITION: usize = 24;
const MIN_HELP_WIDTH: usize = 11;

/// Gets the current terminal width, or None if not available.
pub(crate) fn get_terminal_width() -> Option<usize> {
    terminal_size::terminal_size().map(|(w, _)| w.0 as usize)
}

/// Splits about text into a title and a description at the first blank line.
///
/// Without a blank line the whole text is the title. Both parts are trimmed;
/// empty parts are `None`.
pub fn split_about(text: &str) -> (Option<String>, Option<String>) {
    let lines: Vec<&str> = text.lines().collect();
    let blank = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.trim().is_empty())
        .map(|(index, _)| index);

    let (title, description) = match blank {
        Some(index) => (lines[..index].join("\n"), Some(lines[index + 1..].join("\n"))),
        None => (text.to_string(), None),
    };
    (non_empty(&title), description.as_deref().and_then(non_empty))
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Applies about text and, for groups, the subcommand listing to `cmd`.
pub(crate) fn decorate(
    mut cmd: clap::Command,
    about: Option<&str>,
    registry: Option<&Registry>,
) -> clap::Command {
    let (title, description) = about.map(split_about).unwrap_or((None, None));
    if let Some(title) = title {
        cmd = cmd.about(title);
    }

    let listing = registry.and_then(|registry| {
        subcommands_section(registry, get_terminal_width().unwrap_or(DEFAULT_WIDTH))
    });
    let after_help = match (listing, description) {
        (Some(listing), Some(description)) => Some(format!("{listing}\n\n{description}")),
        (listing, description) => listing.or(description),
    };
    if let Some(after_help) = after_help {
        cmd = cmd.after_help(after_help);
    }
    cmd
}

/// Renders the subcommand listing of a registry for a terminal `width`
/// columns wide. Titles that do not fit are cut and end with `...`.
///
/// Returns `None` for an empty registry.
pub fn subcommands_section(registry: &Registry, width: usize) -> Option<String> {
    if registry.is_empty() {
        return None;
    }

    let longest = registry.iter().map(|d| d.name().len()).max().unwrap_or(0);
    let help_position = (longest + INDENT * 2).min(MAX_HELP_POSITION);
    let help_width = width.saturating_sub(help_position).max(MIN_HELP_WIDTH);
    let name_width = help_position - INDENT * 2;

    let heading = if registry.is_chained() {
        "Chained subcommands:"
    } else {
        "Subcommands:"
    };
    let indent = " ".repeat(INDENT);
    let mut out = vec![heading.to_string()];

    for descriptor in registry {
        let name = descriptor.name();
        let title = descriptor
            .about()
            .and_then(|about| split_about(about).0)
            .map(|title| truncate(&title, help_width));

        match title {
            None => out.push(format!("{indent}{name}")),
            Some(title) if name.len() <= name_width => {
                out.push(format!("{indent}{name:name_width$}  {title}"));
            }
            Some(title) => {
                out.push(format!("{indent}{name}"));
                out.push(format!("{}{title}", " ".repeat(help_position)));
            }
        }
    }

    Some(out.join("\n"))
}

fn truncate(title: &str, width: usize) -> String {
    if title.chars().count() <= width {
        return title.to_string();
    }
    let kept: String = title.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}
