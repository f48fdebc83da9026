use std::io::{self, BufRead, Write};

use chrono::Utc;

use crate::app::App;
use crate::cli::output::{format_stats, format_view};
use crate::io::storage::Storage;
use crate::model::ParseEnumError;
use crate::model::todo::{Priority, TodoId};
use crate::model::view::{Filter, SortKey};
use crate::ops::edit::EditTrigger;
use crate::ops::stats::count_label;

const HELP: &str = "\
commands:
  add <text> [!low|!medium|!high]   add a todo
  toggle <id>                       flip completed
  rm <id>                           delete
  edit <id>                         start renaming
  draft <text>                      replace the draft
  save | blur                       save the draft
  cancel                            drop the draft
  clear                             delete completed todos
  all                               toggle every todo
  filter all|active|completed
  search [text]                     empty text clears the search
  sort newest|oldest|alphabetical|priority
  list | stats | help | quit";

/// One line of shell input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Add {
        text: String,
        priority: Option<Priority>,
    },
    Toggle(TodoId),
    Remove(TodoId),
    Edit(TodoId),
    Draft(String),
    Edited(EditTrigger),
    Clear,
    ToggleAll,
    Filter(Filter),
    Search(String),
    Sort(SortKey),
    List,
    Stats,
    Help,
    Quit,
}

/// Error for a shell line that does not parse
#[derive(Debug, thiserror::Error)]
pub enum ShellParseError {
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
    #[error(transparent)]
    Invalid(#[from] ParseEnumError),
}

/// Parse a shell line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, ShellParseError> {
    let line = line.trim_start();
    let (word, rest) = match line.split_once(' ') {
        Some((word, rest)) => (word, rest),
        None => (line.trim_end(), ""),
    };
    let arg = rest.trim();
    let required = |name: &'static str| {
        if arg.is_empty() {
            Err(ShellParseError::MissingArgument(name))
        } else {
            Ok(arg)
        }
    };

    let cmd = match word {
        "" => return Ok(None),
        "add" => {
            let (text, priority) = split_priority(required("add")?);
            ShellCommand::Add {
                text: text.to_string(),
                priority,
            }
        }
        "toggle" => ShellCommand::Toggle(required("toggle")?.parse()?),
        "rm" => ShellCommand::Remove(required("rm")?.parse()?),
        "edit" => ShellCommand::Edit(required("edit")?.parse()?),
        // The draft is kept verbatim; trimming happens on save.
        "draft" => ShellCommand::Draft(rest.to_string()),
        "save" => ShellCommand::Edited(EditTrigger::Enter),
        "cancel" => ShellCommand::Edited(EditTrigger::Escape),
        "blur" => ShellCommand::Edited(EditTrigger::Blur),
        "clear" => ShellCommand::Clear,
        "all" => ShellCommand::ToggleAll,
        "filter" => ShellCommand::Filter(required("filter")?.parse()?),
        "search" => ShellCommand::Search(arg.to_string()),
        "sort" => ShellCommand::Sort(required("sort")?.parse()?),
        "list" | "ls" => ShellCommand::List,
        "stats" => ShellCommand::Stats,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(ShellParseError::Unknown(other.to_string())),
    };
    Ok(Some(cmd))
}

/// Split a trailing `!priority` marker off the text of `add`.
fn split_priority(text: &str) -> (&str, Option<Priority>) {
    if let Some((head, last)) = text.rsplit_once(' ')
        && let Some(name) = last.strip_prefix('!')
        && let Ok(priority) = name.parse::<Priority>()
    {
        return (head, Some(priority));
    }
    (text, None)
}

/// Run the shell until `quit` or end of input.
///
/// Subscribes to external changes first and applies any that arrived before
/// each command. The view is printed after every command that changes what
/// would be shown.
pub fn run<S: Storage>(
    app: &mut App<S>,
    input: impl BufRead,
    out: &mut impl Write,
    width: usize,
) -> io::Result<()> {
    app.store.subscribe();
    print_view(app, out, width)?;

    for line in input.lines() {
        let line = line?;
        let applied = app.store.sync_external();
        if applied > 0 {
            tracing::info!(applied, "reloaded external changes");
            writeln!(out, "(reloaded changes made elsewhere)")?;
        }

        let cmd = match parse_command(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "error: {}", e)?;
                continue;
            }
        };
        match execute(app, cmd, out)? {
            Outcome::Quit => break,
            Outcome::Redraw => print_view(app, out, width)?,
            Outcome::Quiet => {}
        }
    }
    Ok(())
}

enum Outcome {
    Redraw,
    Quiet,
    Quit,
}

fn execute<S: Storage>(
    app: &mut App<S>,
    cmd: ShellCommand,
    out: &mut impl Write,
) -> io::Result<Outcome> {
    let store = &mut app.store;
    let outcome = match cmd {
        ShellCommand::Add { text, priority } => match store.add(&text, priority) {
            Some(_) => Outcome::Redraw,
            None => {
                writeln!(out, "error: todo text cannot be empty")?;
                Outcome::Quiet
            }
        },
        ShellCommand::Toggle(id) => {
            if store.edit_session().is_editing(id) {
                writeln!(out, "todo {} is being edited; save or cancel first", id)?;
                Outcome::Quiet
            } else if store.toggle(id) {
                Outcome::Redraw
            } else {
                not_found(out, id)?
            }
        }
        ShellCommand::Remove(id) => {
            if store.delete(id) {
                Outcome::Redraw
            } else {
                not_found(out, id)?
            }
        }
        ShellCommand::Edit(id) => {
            if store.start_edit(id) {
                Outcome::Redraw
            } else {
                not_found(out, id)?
            }
        }
        ShellCommand::Draft(text) => {
            if store.update_draft(&text) {
                Outcome::Redraw
            } else {
                writeln!(out, "not editing; use `edit <id>` first")?;
                Outcome::Quiet
            }
        }
        ShellCommand::Edited(trigger) => {
            let Some(target) = store.edit_session().target() else {
                writeln!(out, "not editing")?;
                return Ok(Outcome::Quiet);
            };
            let saving = trigger != EditTrigger::Escape;
            let before = store.get(target).map(|t| t.text.clone());
            let accepted = store.handle_edit_trigger(trigger);
            if saving
                && !accepted
                && let Some(text) = before
            {
                writeln!(out, "empty text; kept \"{}\"", text)?;
            }
            Outcome::Redraw
        }
        ShellCommand::Clear => {
            let removed = store.clear_completed();
            match count_label(removed) {
                Some(label) => writeln!(out, "removed {}", label)?,
                None => writeln!(out, "nothing to clear")?,
            }
            Outcome::Redraw
        }
        ShellCommand::ToggleAll => {
            if store.toggle_all() {
                Outcome::Redraw
            } else {
                Outcome::Quiet
            }
        }
        ShellCommand::Filter(filter) => {
            app.set_filter(filter);
            Outcome::Redraw
        }
        ShellCommand::Search(term) => {
            app.set_search(&term);
            Outcome::Redraw
        }
        ShellCommand::Sort(sort) => {
            app.set_sort(sort);
            Outcome::Redraw
        }
        ShellCommand::List => Outcome::Redraw,
        ShellCommand::Stats => {
            let lines = format_stats(&app.stats());
            if lines.is_empty() {
                writeln!(out, "{}", app.empty_message())?;
            }
            for line in lines {
                writeln!(out, "{}", line)?;
            }
            Outcome::Quiet
        }
        ShellCommand::Help => {
            writeln!(out, "{}", HELP)?;
            Outcome::Quiet
        }
        ShellCommand::Quit => Outcome::Quit,
    };
    Ok(outcome)
}

fn not_found(out: &mut impl Write, id: TodoId) -> io::Result<Outcome> {
    writeln!(out, "error: no todo with id {}", id)?;
    Ok(Outcome::Quiet)
}

fn print_view<S: Storage>(app: &App<S>, out: &mut impl Write, width: usize) -> io::Result<()> {
    let view = app.view();
    let lines = format_view(
        &view,
        app.store.edit_session(),
        app.empty_message(),
        &app.stats(),
        &Utc::now(),
        width,
    );
    writeln!(
        out,
        "-- {} | search: {:?} | sort: {} --",
        app.prefs.filter, app.prefs.search, app.prefs.sort
    )?;
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}
