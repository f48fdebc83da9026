mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::app::App;
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::cli::shell;
use crate::io::file_storage::FileStorage;
use crate::io::project_io::{self, ProjectError, Workspace};
use crate::model::todo::{TodoId, normalize_text};
use crate::ops::stats::count_label;
use crate::ops::store::TodoStore;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let start = resolve_start(cli.dir.as_deref())?;

    match cli.command {
        Commands::Init(args) => cmd_init(&start, args, json),
        Commands::Add(args) => cmd_add(&start, args, json),
        Commands::List(args) => cmd_list(&start, args, json),
        Commands::Toggle(args) => cmd_toggle(&start, args.id, json),
        Commands::Rm(args) => cmd_rm(&start, args.id, json),
        Commands::Rename(args) => cmd_rename(&start, args, json),
        Commands::Clear => cmd_clear(&start, json),
        Commands::ToggleAll => cmd_toggle_all(&start, json),
        Commands::Stats => cmd_stats(&start, json),
        Commands::Shell => cmd_shell(&start),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Directory to start workspace discovery from (`-C` or the cwd)
fn resolve_start(dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match dir {
        Some(dir) => std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e).into()),
        None => Ok(std::env::current_dir()?),
    }
}

fn open_app(start: &Path) -> Result<(Workspace, App<FileStorage>), ProjectError> {
    let root = project_io::discover_root(start)?;
    let workspace = project_io::load_workspace(&root)?;
    let store = TodoStore::open(workspace.storage(), workspace.config.store.key.clone());
    let app = App::new(store, workspace.config.view.prefs());
    Ok((workspace, app))
}

fn no_such_todo(id: TodoId) -> Box<dyn std::error::Error> {
    format!("no todo with id {}", id).into()
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a single todo after a change, as JSON or a listing row.
fn print_todo(app: &App<FileStorage>, id: TodoId, width: usize, json: bool) -> CmdResult {
    let Some(todo) = app.store.get(id) else {
        return Err(no_such_todo(id));
    };
    let now = Utc::now();
    if json {
        return print_json(&todo_to_json(todo, &now));
    }
    let lines = format_listing(&[todo], app.store.edit_session(), "", &now, width);
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

fn print_stats(app: &App<FileStorage>, json: bool) -> CmdResult {
    let stats = app.stats();
    if json {
        return print_json(&stats_to_json(&stats));
    }
    let lines = format_stats(&stats);
    if lines.is_empty() {
        println!("{}", app.empty_message());
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_add(start: &Path, args: AddArgs, json: bool) -> CmdResult {
    if normalize_text(&args.text).is_none() {
        return Err("todo text cannot be empty".into());
    }
    let (_, mut app) = open_app(start)?;
    let todo = app
        .store
        .add(&args.text, args.priority)
        .ok_or("todo text cannot be empty")?;
    if json {
        print_json(&todo_to_json(&todo, &Utc::now()))
    } else {
        println!("{}", todo.id);
        Ok(())
    }
}

fn cmd_list(start: &Path, args: ListArgs, json: bool) -> CmdResult {
    let (workspace, mut app) = open_app(start)?;
    if let Some(filter) = args.filter {
        app.set_filter(filter);
    }
    if let Some(ref search) = args.search {
        app.set_search(search);
    }
    if let Some(sort) = args.sort {
        app.set_sort(sort);
    }

    let now = Utc::now();
    let view = app.view();
    let stats = app.stats();
    if json {
        let list = ListJson {
            todos: view.iter().map(|t| todo_to_json(t, &now)).collect(),
            stats: stats_to_json(&stats),
            message: view.is_empty().then(|| app.empty_message().to_string()),
        };
        return print_json(&list);
    }

    let lines = format_view(
        &view,
        app.store.edit_session(),
        app.empty_message(),
        &stats,
        &now,
        workspace.config.ui.width,
    );
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_toggle(start: &Path, id: TodoId, json: bool) -> CmdResult {
    let (workspace, mut app) = open_app(start)?;
    if !app.store.toggle(id) {
        return Err(no_such_todo(id));
    }
    print_todo(&app, id, workspace.config.ui.width, json)
}

fn cmd_rm(start: &Path, id: TodoId, json: bool) -> CmdResult {
    let (_, mut app) = open_app(start)?;
    if !app.store.delete(id) {
        return Err(no_such_todo(id));
    }
    if json {
        print_json(&serde_json::json!({ "deleted": id }))
    } else {
        println!("Deleted {}", id);
        Ok(())
    }
}

/// Rename through a full edit session: start, replace the draft, commit.
fn cmd_rename(start: &Path, args: RenameArgs, json: bool) -> CmdResult {
    if normalize_text(&args.text).is_none() {
        return Err("todo text cannot be empty".into());
    }
    let (workspace, mut app) = open_app(start)?;
    if !app.store.start_edit(args.id) {
        return Err(no_such_todo(args.id));
    }
    app.store.update_draft(&args.text);
    if !app.store.commit_edit() {
        return Err(format!("could not rename {}", args.id).into());
    }
    print_todo(&app, args.id, workspace.config.ui.width, json)
}

fn cmd_clear(start: &Path, json: bool) -> CmdResult {
    let (_, mut app) = open_app(start)?;
    let removed = app.store.clear_completed();
    if json {
        return print_json(&serde_json::json!({ "removed": removed }));
    }
    match count_label(removed) {
        Some(label) => println!("Removed {}", label),
        None => println!("Nothing to clear"),
    }
    Ok(())
}

fn cmd_toggle_all(start: &Path, json: bool) -> CmdResult {
    let (_, mut app) = open_app(start)?;
    if !app.store.toggle_all() && !json {
        println!("{}", app.empty_message());
        return Ok(());
    }
    print_stats(&app, json)
}

fn cmd_stats(start: &Path, json: bool) -> CmdResult {
    let (_, app) = open_app(start)?;
    print_stats(&app, json)
}

fn cmd_shell(start: &Path) -> CmdResult {
    let (workspace, mut app) = open_app(start)?;
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    shell::run(&mut app, stdin.lock(), &mut stdout, workspace.config.ui.width)?;
    Ok(())
}
