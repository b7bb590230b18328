//! Argument parser adapter over clap.
//!
//! Each command node owns one [`ArgumentParser`] built from the clap command
//! its type declares. The adapter offers three parse modes:
//!
//! | Mode | Used by | Leftover tokens |
//! |------|---------|-----------------|
//! | [`parse`](ArgumentParser::parse) | leaves | usage error |
//! | [`parse_known`](ArgumentParser::parse_known) | groups, chained members | returned as remainder + unknown |
//! | [`parse_with_remainder`](ArgumentParser::parse_with_remainder) | chained groups | remainder returned, unknown is a usage error |
//!
//! # Boundary detection
//!
//! Permissive modes split the tokens before clap sees them. Options are
//! matched against the declared longs/shorts (with their value counts); the
//! command's declared positionals are filled in order; the remainder starts at
//! the first positional token once every declared positional is filled, and
//! everything from there on belongs to the next command, flags included.
//! Unrecognized options seen before that point are reported as unknown.
//!
//! ```text
//! --appopt A group --groupopt G create
//! └─ own ──┘ └──────── remainder ─────┘
//! ```
//!
//! The tokens kept for this command are then parsed by clap, which performs
//! validation, type coercion and help/usage generation.

use std::fmt;

use clap::error::ErrorKind;
use clap::{Arg, ArgAction};
use tracing::trace;

use crate::command::ArgMap;
use crate::values;

/// Result of a permissive parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    /// This command's flags and positionals.
    pub values: ArgMap,
    /// Tokens handed to the next level of resolution.
    pub remainder: Vec<String>,
    /// Options nobody declared, seen before the remainder started.
    pub unknown: Vec<String>,
}

/// A declared option, as far as token splitting is concerned.
#[derive(Debug, Clone)]
struct OptionSpec {
    longs: Vec<String>,
    shorts: Vec<char>,
    max_values: usize,
    allow_hyphen_values: bool,
}

impl OptionSpec {
    fn from_arg(arg: &Arg) -> Self {
        let max_values = if arg.get_action().takes_values() {
            arg.get_num_args().map(|range| range.max_values()).unwrap_or(1)
        } else {
            0
        };
        Self {
            longs: arg
                .get_long()
                .into_iter()
                .chain(arg.get_all_aliases().unwrap_or_default())
                .map(String::from)
                .collect(),
            shorts: arg
                .get_short()
                .into_iter()
                .chain(arg.get_all_short_aliases().unwrap_or_default())
                .collect(),
            max_values,
            allow_hyphen_values: arg.is_allow_hyphen_values_set(),
        }
    }
}

/// How an option token matched.
enum OptionMatch<'a> {
    /// Known option; `inline` is true when its value is part of the token.
    Known { spec: &'a OptionSpec, inline: bool },
    Unknown,
}

#[derive(Debug, Default)]
struct Split {
    own: Vec<String>,
    remainder: Vec<String>,
    unknown: Vec<String>,
}

/// Parser for one command node.
#[derive(Clone)]
pub struct ArgumentParser {
    source: clap::Command,
    command: clap::Command,
    options: Vec<OptionSpec>,
    positionals: Vec<usize>,
}

impl ArgumentParser {
    /// Wraps a clap command. Tokens are never preceded by a binary name, and
    /// negative numbers are values, as the split treats them.
    pub fn new(command: clap::Command) -> Self {
        let source = command.no_binary_name(true).mut_args(|arg| {
            if arg.get_action().takes_values() {
                arg.allow_negative_numbers(true)
            } else {
                arg
            }
        });
        let mut command = source.clone();
        command.build();

        let options = command
            .get_arguments()
            .filter(|arg| !arg.is_positional())
            .map(OptionSpec::from_arg)
            .collect();

        let mut positionals: Vec<&Arg> = command.get_positionals().collect();
        positionals.sort_by_key(|arg| arg.get_index().unwrap_or(usize::MAX));
        let positionals = positionals
            .into_iter()
            .map(|arg| arg.get_num_args().map(|range| range.max_values()).unwrap_or(1))
            .collect();

        Self {
            source,
            command,
            options,
            positionals,
        }
    }

    /// A copy of this parser without the `-h/--help` flag, so a help request
    /// surfaces as an unknown option instead of a help display.
    pub fn without_help(&self) -> Self {
        Self::new(self.source.clone().disable_help_flag(true))
    }

    /// Parses every token as this command's own. Leftovers are a usage error.
    pub fn parse(&self, tokens: &[String]) -> Result<ArgMap, clap::Error> {
        let matches = self.command.clone().try_get_matches_from(tokens)?;
        Ok(values::collect(&self.command, &matches))
    }

    /// Parses this command's tokens and returns the rest as remainder and
    /// unknown options.
    pub fn parse_known(&self, tokens: &[String]) -> Result<ParsedArgs, clap::Error> {
        let split = self.split(tokens);
        trace!(
            prog = self.command.get_bin_name().unwrap_or_default(),
            own = ?split.own,
            remainder = ?split.remainder,
            unknown = ?split.unknown,
            "split tokens"
        );
        let values = self.parse(&split.own)?;
        Ok(ParsedArgs {
            values,
            remainder: split.remainder,
            unknown: split.unknown,
        })
    }

    /// Like [`parse_known`](Self::parse_known), but unknown options are a
    /// usage error.
    pub fn parse_with_remainder(&self, tokens: &[String]) -> Result<ParsedArgs, clap::Error> {
        let parsed = self.parse_known(tokens)?;
        if !parsed.unknown.is_empty() {
            return Err(self.unrecognized(&parsed.unknown));
        }
        Ok(parsed)
    }

    /// Builds a usage error rendered with this command's usage line.
    pub fn error(&self, kind: ErrorKind, message: impl fmt::Display) -> clap::Error {
        self.command.clone().error(kind, message)
    }

    /// Usage error for tokens nobody claimed.
    pub fn unrecognized(&self, unknown: &[String]) -> clap::Error {
        self.error(
            ErrorKind::UnknownArgument,
            format!("unrecognized arguments: {}", unknown.join(" ")),
        )
    }

    /// Renders the full help text.
    pub fn render_help(&self) -> String {
        self.command.clone().render_help().to_string()
    }

    /// Renders the usage line.
    pub fn render_usage(&self) -> String {
        self.command.clone().render_usage().to_string()
    }

    fn split(&self, tokens: &[String]) -> Split {
        let mut split = Split::default();
        let mut slots = self.positionals.iter().copied();
        let mut slot: Option<(usize, usize)> = None;
        let mut escaped = false;
        let mut escape_forwarded = false;
        let mut i = 0;

        while i < tokens.len() {
            let token = &tokens[i];

            if !escaped && token == "--" {
                escaped = true;
                i += 1;
                continue;
            }

            if !escaped && is_option(token) {
                i += 1;
                match self.match_option(token) {
                    OptionMatch::Known { spec, inline } => {
                        split.own.push(token.clone());
                        if !inline {
                            let mut taken = 0;
                            while taken < spec.max_values && i < tokens.len() {
                                let value = &tokens[i];
                                if value == "--" || (is_option(value) && !spec.allow_hyphen_values) {
                                    break;
                                }
                                split.own.push(value.clone());
                                taken += 1;
                                i += 1;
                            }
                        }
                    }
                    OptionMatch::Unknown => split.unknown.push(token.clone()),
                }
                continue;
            }

            if slot.is_none() {
                slot = slots.next().map(|max| (max, 0));
            }
            let Some((max, taken)) = slot else {
                split.remainder = tokens[i..].to_vec();
                break;
            };

            if escaped && !escape_forwarded {
                split.own.push("--".to_string());
                escape_forwarded = true;
            }
            split.own.push(token.clone());
            i += 1;

            if taken + 1 < max {
                slot = Some((max, taken + 1));
                continue;
            }
            slot = slots.next().map(|max| (max, 0));
            if slot.is_none() {
                split.remainder = tokens[i..].to_vec();
                break;
            }
        }

        split
    }

    fn match_option(&self, token: &str) -> OptionMatch<'_> {
        if let Some(body) = token.strip_prefix("--") {
            let (name, inline) = match body.split_once('=') {
                Some((name, _)) => (name, true),
                None => (body, false),
            };
            return match self.options.iter().find(|spec| spec.longs.iter().any(|l| l == name)) {
                Some(spec) => OptionMatch::Known { spec, inline },
                None => OptionMatch::Unknown,
            };
        }

        let cluster: Vec<char> = token.chars().skip(1).collect();
        for (index, short) in cluster.iter().enumerate() {
            let Some(spec) = self.options.iter().find(|spec| spec.shorts.contains(short)) else {
                return OptionMatch::Unknown;
            };
            if spec.max_values > 0 || index + 1 == cluster.len() {
                return OptionMatch::Known {
                    spec,
                    inline: index + 1 < cluster.len(),
                };
            }
        }
        OptionMatch::Unknown
    }
}

impl fmt::Debug for ArgumentParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentParser")
            .field("prog", &self.command.get_bin_name())
            .field("options", &self.options.len())
            .field("positionals", &self.positionals)
            .finish_non_exhaustive()
    }
}

/// Option-looking tokens start with `-`, are longer than one character and
/// are not negative numbers.
fn is_option(token: &str) -> bool {
    match token.strip_prefix('-') {
        Some(rest) => !rest.is_empty() && !is_number(rest),
        None => false,
    }
}

/// Digits with at most one `.` and an optional exponent, the same shape clap
/// accepts as a negative number. `inf` and `nan` are not numbers here.
fn is_number(text: &str) -> bool {
    let mut seen_dot = false;
    let mut exponent_at = None;
    for (i, byte) in text.bytes().enumerate() {
        match byte {
            b'0'..=b'9' => {}
            b'.' if i > 0 && !seen_dot && exponent_at.is_none() => seen_dot = true,
            b'e' | b'E' if i > 0 && exponent_at.is_none() => exponent_at = Some(i),
            _ => return false,
        }
    }
    !text.is_empty() && exponent_at != Some(text.len() - 1)
}

/// Returns true when `arg` is clap's generated help or version flag.
pub(crate) fn is_generated(arg: &Arg) -> bool {
    matches!(
        arg.get_action(),
        ArgAction::Help | ArgAction::HelpShort | ArgAction::HelpLong | ArgAction::Version
    )
}
