//! Console front end: turns typed lines into [`Command`]s and prints the resulting UI state.

pub mod outputformatter;

use crate::app::Command;
use crate::view::UiState;

pub use outputformatter::{print_ui, render_ui};

/// What a console line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleAction {
    Dispatch(Command),
    /// Unregister via the n-th visible delete affordance (1-based).
    Remove(usize),
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "Commands:\n  login <username> <password>        log in (opens the login dialog)\n  logout                             log out\n  signup <email> <activity name>     register a student for an activity\n  unregister <email> <activity name> remove a student from an activity\n  rm <n>                             remove the participant shown as [n]\n  refresh                            reload the activity list\n  menu                               toggle the user menu\n  close                              close the login dialog\n  show                               print the current view\n  help                               show this help\n  quit | exit                        leave\n";

pub fn parse_line(line: &str) -> Result<ConsoleAction, String> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((h, r)) => (h, r.trim()),
        None => (line, ""),
    };
    match head.to_ascii_lowercase().as_str() {
        "" | "show" => Ok(ConsoleAction::Show),
        "help" | "?" => Ok(ConsoleAction::Help),
        "quit" | "exit" => Ok(ConsoleAction::Quit),
        "logout" => Ok(ConsoleAction::Dispatch(Command::Logout)),
        "refresh" => Ok(ConsoleAction::Dispatch(Command::Refresh)),
        "menu" => Ok(ConsoleAction::Dispatch(Command::ToggleUserMenu)),
        "close" => Ok(ConsoleAction::Dispatch(Command::CloseLogin)),
        "login" => {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            match parts.as_slice() {
                [] => Ok(ConsoleAction::Dispatch(Command::OpenLogin)),
                [u, p] => Ok(ConsoleAction::Dispatch(Command::Login { username: u.to_string(), password: p.to_string() })),
                _ => Err("usage: login <username> <password>".to_string()),
            }
        }
        verb @ ("signup" | "unregister") => {
            let Some((email, activity)) = rest.split_once(char::is_whitespace) else {
                return Err(format!("usage: {} <email> <activity name>", verb));
            };
            let (email, activity) = (email.to_string(), activity.trim().to_string());
            if activity.is_empty() { return Err(format!("usage: {} <email> <activity name>", verb)); }
            if verb == "signup" {
                Ok(ConsoleAction::Dispatch(Command::Register { activity, email }))
            } else {
                Ok(ConsoleAction::Dispatch(Command::Unregister { activity, email }))
            }
        }
        "rm" => rest
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map(ConsoleAction::Remove)
            .ok_or_else(|| "usage: rm <n>".to_string()),
        other => Err(format!("unknown command '{}'; type 'help'", other)),
    }
}

/// Split argv into the program name and its flags. An empty argv is tolerated.
pub fn split_program<I: IntoIterator<Item = String>>(argv: I) -> (String, Vec<String>) {
    let mut it = argv.into_iter();
    let program = it.next().unwrap_or_else(|| "signup_client".to_string());
    (program, it.collect())
}

/// Resolve `rm <n>` against the affordances currently visible.
pub fn affordance_command(ui: &UiState, n: usize) -> Option<Command> {
    ui.roster.affordances().filter(|d| d.visible).nth(n.checked_sub(1)?).map(|d| d.command())
}
