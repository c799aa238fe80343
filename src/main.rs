use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use taskflow::analytics::Summary;
use taskflow::config::{init_local_data_dir, Config};
use taskflow::domain::{
    filter_tasks, find_project, group_by_project, sort_for_display, status_badge, Priority,
    SettingsPatch, StatusFilter, Task, TaskFilter, TaskInput, TaskPatch, TaskStatus,
};
use taskflow::persistence::{FileStore, Gateway};
use taskflow::{App, SystemClock};

type Session = App<FileStore, SystemClock>;

#[derive(Parser)]
#[command(name = "taskflow")]
#[command(about = "A local task manager with streaks, analytics and undo", long_about = None)]
struct Cli {
    /// Directory holding the state file. Defaults to the nearest .taskflow or ~/.taskflow
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

/// Commands accepted on the command line and inside `shell`
#[derive(Parser)]
#[command(name = "taskflow", no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .taskflow directory in the current directory
    Init,
    /// Add a task
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<Priority>,
        /// Project ID (defaults to the configured default project)
        #[arg(long)]
        project: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_due)]
        due: Option<DateTime<Utc>>,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
    /// List tasks
    List {
        /// all, active, done, archived, todo or in-progress
        #[arg(short, long, value_parser = parse_status_filter, default_value = "all")]
        status: StatusFilter,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        search: Option<String>,
        /// Group tasks by project
        #[arg(long)]
        group: bool,
    },
    /// Mark a task as in progress
    Start { id: String },
    /// Mark one or more tasks as done
    Done {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Toggle a task between done and todo
    Toggle { id: String },
    /// Pin or unpin a task
    Pin { id: String },
    /// Edit task fields
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(long, value_parser = parse_due)]
        due: Option<DateTime<Utc>>,
    },
    /// Delete a task
    Rm { id: String },
    /// Restore the last deleted task (within a shell session)
    Undo,
    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },
    /// Show or change settings
    Settings {
        #[arg(long)]
        confirm_before_delete: Option<bool>,
        #[arg(long)]
        sounds: Option<bool>,
        #[arg(long)]
        onboarding: Option<bool>,
        /// Project ID for new tasks, or "none"
        #[arg(long)]
        default_project: Option<String>,
    },
    /// Show completion statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Interactive session; keeps the undo slot between commands
    Shell,
}

#[derive(Subcommand)]
enum ProjectCommands {
    Add {
        name: String,
        #[arg(long, default_value = "")]
        color: String,
    },
    List,
    Rm { id: String },
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::from_name(s).ok_or_else(|| format!("unknown priority: {s} (low, medium, high)"))
}

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    TaskStatus::from_name(s)
        .ok_or_else(|| format!("unknown status: {s} (todo, in-progress, done, archived)"))
}

fn parse_status_filter(s: &str) -> Result<StatusFilter, String> {
    StatusFilter::from_name(s).ok_or_else(|| format!("unknown status filter: {s}"))
}

fn parse_due(s: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("invalid date {s}, use YYYY-MM-DD: {e}"))?;
    Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Commands::Init = cli.command {
        let current_dir = std::env::current_dir().context("Could not determine current directory")?;
        let data_dir = init_local_data_dir(&current_dir)?;
        println!("Initialized taskflow directory: {}", data_dir.display());
        return Ok(());
    }

    let config = Config::resolve(cli.data_dir)?;
    log::debug!("using data directory {}", config.data_dir.display());

    let gateway = Gateway::with_key(FileStore::new(&config.data_dir), config.storage_key.clone());
    let mut app = App::new(gateway, SystemClock);
    app.hydrate();

    match cli.command {
        Commands::Shell => run_shell(&mut app),
        Commands::Undo => {
            println!(
                "Nothing to undo: deleted tasks can only be restored inside `taskflow shell`."
            );
            Ok(())
        }
        command => run_command(&mut app, command),
    }
}

fn run_shell(app: &mut Session) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "taskflow> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }

        let words = split_words(&line);
        match words.first().map(String::as_str) {
            None => continue,
            Some("exit") | Some("quit") => return Ok(()),
            _ => {}
        }

        match ShellLine::try_parse_from(words) {
            Ok(parsed) => match parsed.command {
                Commands::Shell | Commands::Init => println!("Not available inside the shell."),
                command => {
                    if let Err(e) = run_command(app, command) {
                        eprintln!("Error: {:#}", e);
                    }
                }
            },
            Err(e) => {
                e.print().ok();
            }
        }
    }
}

/// Split a shell line on whitespace, honoring double quotes
fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_word = false;

    for c in line.trim().chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_word = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_word {
                    words.push(std::mem::take(&mut current));
                    has_word = false;
                }
            }
            c => {
                current.push(c);
                has_word = true;
            }
        }
    }
    if has_word {
        words.push(current);
    }
    words
}

fn run_command(app: &mut Session, command: Commands) -> Result<()> {
    match command {
        Commands::Add {
            title,
            description,
            priority,
            project,
            due,
            tags,
        } => {
            let input = TaskInput {
                title,
                description,
                priority,
                project_id: project,
                due_date: due,
                tags,
            };
            match app.create_task(input) {
                Some(id) => println!("Added {}", short_id(&id)),
                None => anyhow::bail!("Task title cannot be empty"),
            }
        }
        Commands::List {
            status,
            project,
            tag,
            search,
            group,
        } => {
            let filter = TaskFilter {
                status,
                project_id: project,
                tag,
                query: search,
            };
            print_tasks(app, &filter, group);
        }
        Commands::Start { id } => {
            let id = resolve_task_id(app, &id)?;
            app.update_task(&id, TaskPatch::status(TaskStatus::InProgress));
        }
        Commands::Done { ids } => {
            let session: &Session = app;
            let ids = ids
                .iter()
                .map(|id| resolve_task_id(session, id))
                .collect::<Result<Vec<_>>>()?;
            app.bulk_update_status(ids, TaskStatus::Done);
        }
        Commands::Toggle { id } => {
            let id = resolve_task_id(app, &id)?;
            app.toggle_complete(&id);
        }
        Commands::Pin { id } => {
            let id = resolve_task_id(app, &id)?;
            app.toggle_pin(&id);
        }
        Commands::Edit {
            id,
            title,
            description,
            status,
            priority,
            due,
        } => {
            let id = resolve_task_id(app, &id)?;
            let patch = TaskPatch {
                title,
                description: description.map(Some),
                status,
                priority,
                due_date: due.map(Some),
                ..TaskPatch::default()
            };
            app.update_task(&id, patch);
        }
        Commands::Rm { id } => {
            let id = resolve_task_id(app, &id)?;
            app.delete_task(&id);
            println!("Deleted {} (type `undo` to restore)", short_id(&id));
        }
        Commands::Undo => {
            if app.can_undo() {
                app.restore_last_deleted();
                println!("Restored last deleted task");
            } else {
                println!("Nothing to undo");
            }
        }
        Commands::Project { action } => run_project_command(app, action)?,
        Commands::Settings {
            confirm_before_delete,
            sounds,
            onboarding,
            default_project,
        } => {
            let patch = SettingsPatch {
                confirm_before_delete,
                enable_sounds: sounds,
                show_onboarding: onboarding,
                default_project_id: default_project
                    .map(|p| if p.eq_ignore_ascii_case("none") { None } else { Some(p) }),
            };
            if !patch.is_empty() {
                app.update_settings(patch);
            }
            println!("{}", serde_json::to_string_pretty(&app.state().settings)?);
        }
        Commands::Stats { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(app.analytics())?);
            } else {
                print_summary(app.analytics());
            }
        }
        Commands::Init | Commands::Shell => {}
    }

    if let Some(warning) = app.last_warning() {
        eprintln!("Warning: {}", warning);
    }
    Ok(())
}

fn run_project_command(app: &mut Session, action: ProjectCommands) -> Result<()> {
    match action {
        ProjectCommands::Add { name, color } => match app.create_project(&name, &color) {
            Some(id) => println!("Added project {}", id),
            None => anyhow::bail!("Project name cannot be empty"),
        },
        ProjectCommands::List => {
            let default_id = app.state().settings.default_project_id.as_deref();
            for project in &app.state().projects {
                let marker = if Some(project.id.as_str()) == default_id { "*" } else { " " };
                println!("{} {:<38} {} ({})", marker, project.id, project.name, project.color);
            }
        }
        ProjectCommands::Rm { id } => {
            if find_project(&app.state().projects, Some(id.as_str())).is_none() {
                anyhow::bail!("No project with id {}", id);
            }
            app.delete_project(&id);
        }
    }
    Ok(())
}

/// Resolve a full task ID or a unique prefix of one
fn resolve_task_id(app: &Session, id_or_prefix: &str) -> Result<String> {
    let matches: Vec<&Task> = app
        .state()
        .tasks
        .iter()
        .filter(|t| t.id.starts_with(id_or_prefix))
        .collect();

    match matches.as_slice() {
        [task] => Ok(task.id.clone()),
        [] => anyhow::bail!("No task matches {}", id_or_prefix),
        _ if matches.iter().any(|t| t.id == id_or_prefix) => Ok(id_or_prefix.to_string()),
        _ => anyhow::bail!("{} matches {} tasks, use a longer prefix", id_or_prefix, matches.len()),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn print_tasks(app: &Session, filter: &TaskFilter, group: bool) {
    let state = app.state();
    let mut tasks = filter_tasks(&state.tasks, filter);
    sort_for_display(&mut tasks);

    if tasks.is_empty() {
        println!("No tasks");
        return;
    }

    if group {
        let owned: Vec<Task> = tasks.into_iter().cloned().collect();
        for (project, members) in group_by_project(&owned, &state.projects) {
            println!("{}", project.map(|p| p.name.as_str()).unwrap_or("No project"));
            for task in members {
                println!("  {}", format_task(task));
            }
        }
    } else {
        for task in tasks {
            println!("{}", format_task(task));
        }
    }
}

fn format_task(task: &Task) -> String {
    let mut line = format!(
        "{} {} {:<2} {}",
        short_id(&task.id),
        status_badge(task.status),
        task.priority.badge(),
        task.title
    );
    if task.is_pinned {
        line.push_str(" (pinned)");
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due {}", due.format("%Y-%m-%d")));
    }
    if !task.tags.is_empty() {
        let tags: Vec<String> = task.tags.iter().map(|t| format!("#{}", t)).collect();
        line.push(' ');
        line.push_str(&tags.join(" "));
    }
    line
}

fn print_summary(summary: &Summary) {
    println!("Total tasks:      {}", summary.total_tasks);
    println!("Active:           {}", summary.active_tasks);
    println!("Completed:        {}", summary.completed_tasks);
    println!("Completion rate:  {:.0}%", summary.completion_rate * 100.0);
    println!("Completed today:  {}", summary.tasks_completed_today);
    println!("Streak:           {} day(s)", summary.streak_days);
}
