use std::path::{Path, PathBuf};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::FileLock;
use crate::io::persist::PersistenceAdapter;
use crate::io::storage::FileStore;
use crate::model::config::Config;
use crate::model::state::{DateRange, SortBy, SortDirection, TaskFilters};
use crate::model::task::{Priority, Task, TaskPatch};
use crate::model::user::{Role, User, UserStatus};
use crate::ops::{auth, import, view};
use crate::store::{AppState, Store, SystemClock};
use crate::util::time::{format_duration, parse_timestamp};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Resolved per-invocation settings
struct Context {
    data_dir: PathBuf,
    config: Config,
    json: bool,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let data_dir = config_io::resolve_data_dir(cli.data_dir.as_deref().map(Path::new));
    let config = config_io::read_config(&data_dir)?;
    tracing::debug!(data_dir = %data_dir.display(), key = %config.storage.key, "resolved data dir");
    let ctx = Context {
        data_dir,
        config,
        json: cli.json,
    };

    match cli.command {
        // Read commands
        Commands::List(args) => cmd_list(&ctx, args),
        Commands::Show(args) => cmd_show(&ctx, args),
        Commands::History => cmd_history(&ctx),
        Commands::Stats => cmd_stats(&ctx),
        Commands::Export(args) => cmd_export(&ctx, args),

        // Task mutations
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::Edit(args) => cmd_edit(&ctx, args),
        Commands::Toggle(args) => cmd_toggle(&ctx, args),
        Commands::Complete(args) => cmd_complete(&ctx, args),
        Commands::Delete(args) => cmd_delete(&ctx, args),
        Commands::Move(args) => cmd_move(&ctx, args),
        Commands::Undo => cmd_undo(&ctx, false),
        Commands::Redo => cmd_undo(&ctx, true),
        Commands::Import(args) => cmd_import(&ctx, args),

        // Everything else
        Commands::Select(args) => cmd_select(&ctx, args),
        Commands::Timer(args) => cmd_timer(&ctx, args),
        Commands::Status(args) => cmd_status(&ctx, args),
        Commands::Category(args) => cmd_category(&ctx, args),
        Commands::Notifications(args) => cmd_notifications(&ctx, args),
        Commands::User(args) => cmd_user(&ctx, args),
        Commands::Reset => cmd_reset(&ctx),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn adapter(ctx: &Context) -> PersistenceAdapter {
    PersistenceAdapter::new(
        FileStore::new(&ctx.data_dir),
        ctx.config.storage.key.clone(),
    )
}

fn open_store(ctx: &Context) -> Store {
    Store::open(
        adapter(ctx),
        SystemClock::new(),
        AppState::from_config(&ctx.config),
    )
}

/// Open the store while holding the data directory lock
fn open_store_locked(ctx: &Context) -> Result<(Store, FileLock), Box<dyn std::error::Error>> {
    let lock = FileLock::acquire_default(&ctx.data_dir)?;
    Ok((open_store(ctx), lock))
}

/// Writing commands fail when their change did not reach disk
fn ensure_saved(store: &Store) -> CmdResult {
    if store.last_save_ok() {
        Ok(())
    } else {
        Err("could not save state".into())
    }
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::parse(s).ok_or_else(|| format!("invalid priority '{}': expected High, Medium or Low", s))
}

fn parse_sort(s: &str) -> Result<SortBy, String> {
    SortBy::parse(s).ok_or_else(|| {
        format!(
            "invalid sort '{}': expected none, dueDate, priority, title or created",
            s
        )
    })
}

fn parse_status_filter(s: &str) -> Result<String, String> {
    match s.to_ascii_lowercase().as_str() {
        "completed" | "done" => Ok("Completed".to_string()),
        "active" | "open" => Ok("Active".to_string()),
        "all" | "" => Ok(String::new()),
        _ => Err(format!("invalid status '{}': expected completed or active", s)),
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn task_json<'a>(store: &Store, task: &'a Task) -> TaskJson<'a> {
    TaskJson {
        task,
        elapsed: store.elapsed_for(task.id).unwrap_or(task.timer),
        timing: store.state().active_timer.task_id == Some(task.id),
    }
}

fn print_task_list(ctx: &Context, store: &Store, tasks: &[&Task]) -> CmdResult {
    if ctx.json {
        let out: Vec<TaskJson> = tasks.iter().map(|t| task_json(store, t)).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if tasks.is_empty() {
        println!("no tasks");
    } else {
        for task in tasks {
            let elapsed = store.elapsed_for(task.id).unwrap_or(task.timer);
            println!("{}", format_task_line(task, elapsed));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context, args: ListArgs) -> CmdResult {
    let _lock = if args.save {
        Some(FileLock::acquire_default(&ctx.data_dir)?)
    } else {
        None
    };
    let mut store = open_store(ctx);

    let mut filters = if args.clear {
        TaskFilters::default()
    } else {
        store.state().filters.clone()
    };
    if let Some(search) = args.search {
        filters.search = search;
    }
    if let Some(category) = args.category {
        filters.category = category;
    }
    if let Some(ref p) = args.priority {
        filters.priority = if p.eq_ignore_ascii_case("all") {
            String::new()
        } else {
            parse_priority(p)?.as_str().to_string()
        };
    }
    if let Some(ref status) = args.status {
        filters.status = parse_status_filter(status)?;
    }
    for date in [&args.from, &args.to].into_iter().flatten() {
        if parse_timestamp(date).is_none() {
            return Err(format!("invalid date '{}': expected YYYY-MM-DD", date).into());
        }
    }
    if args.from.is_some() || args.to.is_some() {
        filters.date_range = DateRange {
            start: args.from.or(filters.date_range.start),
            end: args.to.or(filters.date_range.end),
        };
    }

    let mut sort = store.state().sort;
    if let Some(ref by) = args.sort {
        sort.by = parse_sort(by)?;
    }
    if args.desc {
        sort.direction = SortDirection::Desc;
    } else if args.asc {
        sort.direction = SortDirection::Asc;
    }

    if args.save {
        store.set_filters(filters.clone());
        store.set_sort(Some(sort.by), Some(sort.direction));
        ensure_saved(&store)?;
    }

    let tasks = view::sorted_tasks(
        view::filtered_tasks(store.tasks().as_slice(), &filters),
        &sort,
    );
    print_task_list(ctx, &store, &tasks)
}

fn cmd_show(ctx: &Context, args: IdArg) -> CmdResult {
    let store = open_store(ctx);
    let task = store
        .task(args.id)
        .ok_or_else(|| format!("task not found: {}", args.id))?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&task_json(&store, task))?);
    } else {
        let elapsed = store.elapsed_for(task.id).unwrap_or(task.timer);
        print_lines(&format_task_detail(task, elapsed));
    }
    Ok(())
}

fn cmd_history(ctx: &Context) -> CmdResult {
    let store = open_store(ctx);
    if ctx.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&history_to_json(store.history()))?
        );
    } else {
        print_lines(&format_history(store.history()));
    }
    Ok(())
}

fn cmd_stats(ctx: &Context) -> CmdResult {
    let store = open_store(ctx);
    let stats = store.stats();
    let productivity = store.productivity();
    let work_time = store.work_time();
    if ctx.json {
        let out = StatsJson {
            stats,
            productivity,
            work_time,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_lines(&format_stats(&stats, productivity, work_time));
    }
    Ok(())
}

fn cmd_export(ctx: &Context, args: ExportArgs) -> CmdResult {
    let format = import::Format::parse(&args.format)
        .ok_or_else(|| format!("invalid format '{}': expected json or csv", args.format))?;
    let store = open_store(ctx);
    let tasks = store.tasks().as_slice();
    let text = match format {
        import::Format::Json => import::export_json(tasks)?,
        import::Format::Csv => import::export_csv(tasks),
    };
    match args.output {
        Some(path) => {
            std::fs::write(&path, format!("{}\n", text))
                .map_err(|e| format!("could not write {}: {}", path, e))?;
            println!("exported {} tasks to {}", tasks.len(), path);
        }
        None => println!("{}", text),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Task mutations
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> CmdResult {
    let priority = match args.priority.as_deref() {
        Some(p) => parse_priority(p)?,
        None => ctx.config.defaults.priority,
    };
    let (mut store, _lock) = open_store_locked(ctx)?;

    let mut task = Task::new(args.title).with_priority(priority);
    task.description = args.description.unwrap_or_default();
    task.category = args.category.unwrap_or_default();
    task.due_date = args.due.unwrap_or_default();
    task.assigned_to = args.assign.unwrap_or(0);
    task.subtasks = args.subtasks;
    task.notes = args.notes;

    let id = store.add_task(task);
    ensure_saved(&store)?;
    if ctx.json {
        if let Some(task) = store.task(id) {
            println!("{}", serde_json::to_string_pretty(&task_json(&store, task))?);
        }
    } else {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_edit(ctx: &Context, args: EditArgs) -> CmdResult {
    let patch = TaskPatch {
        title: args.title,
        description: args.description,
        category: args.category,
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
        due_date: args.due,
        completed: None,
        assigned_to: args.assign,
        subtasks: if args.subtasks.is_empty() {
            None
        } else {
            Some(args.subtasks)
        },
        notes: args.notes,
        timer: None,
    };
    if patch.is_empty() {
        return Err("nothing to change: pass at least one field flag".into());
    }
    let (mut store, _lock) = open_store_locked(ctx)?;
    if !store.edit_task(args.id, &patch) {
        return Err(format!("task not found: {}", args.id).into());
    }
    ensure_saved(&store)?;
    println!("updated {}", args.id);
    Ok(())
}

fn cmd_toggle(ctx: &Context, args: IdArg) -> CmdResult {
    let (mut store, _lock) = open_store_locked(ctx)?;
    if !store.toggle_task_completion(args.id) {
        return Err(format!("task not found: {}", args.id).into());
    }
    ensure_saved(&store)?;
    let done = store.task(args.id).is_some_and(|t| t.completed);
    println!(
        "{} {}",
        args.id,
        if done { "completed" } else { "active" }
    );
    Ok(())
}

/// Explicit ids, or the stored selection when none are given
fn target_ids(store: &Store, ids: Vec<u64>) -> Result<Vec<u64>, String> {
    if !ids.is_empty() {
        return Ok(ids);
    }
    let selected = store.state().selected_tasks.clone();
    if selected.is_empty() {
        return Err("no task IDs given and nothing selected".to_string());
    }
    Ok(selected)
}

fn cmd_complete(ctx: &Context, args: IdsArgs) -> CmdResult {
    let (mut store, _lock) = open_store_locked(ctx)?;
    let ids = target_ids(&store, args.ids)?;
    let count = store.toggle_multiple_tasks_completion(&ids);
    ensure_saved(&store)?;
    println!("completed {} tasks", count);
    Ok(())
}

fn cmd_delete(ctx: &Context, args: IdsArgs) -> CmdResult {
    let (mut store, _lock) = open_store_locked(ctx)?;
    let explicit = !args.ids.is_empty();
    let ids = target_ids(&store, args.ids)?;
    // Selection-driven deletes always go through the bulk path, which
    // clears the selection
    let count = match ids.as_slice() {
        &[id] if explicit => usize::from(store.delete_task(id)),
        _ => store.delete_multiple_tasks(&ids),
    };
    if count == 0 {
        return Err("no matching tasks".into());
    }
    ensure_saved(&store)?;
    println!("deleted {} tasks", count);
    Ok(())
}

fn cmd_move(ctx: &Context, args: MoveArgs) -> CmdResult {
    let (mut store, _lock) = open_store_locked(ctx)?;
    for id in [args.source, args.target] {
        if store.task(id).is_none() {
            return Err(format!("task not found: {}", id).into());
        }
    }
    if !store.reorder_tasks(args.source, args.target) {
        return Err("source and target must differ".into());
    }
    ensure_saved(&store)?;
    println!("swapped {} and {}", args.source, args.target);
    Ok(())
}

fn cmd_undo(ctx: &Context, redo: bool) -> CmdResult {
    let (mut store, _lock) = open_store_locked(ctx)?;
    let action = if redo { "redo" } else { "undo" };
    let record = if redo { store.redo() } else { store.undo() };
    ensure_saved(&store)?;
    if ctx.json {
        let out = ChangeJson {
            action,
            record: record.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", format_change(action, record.as_ref()));
    }
    Ok(())
}

fn cmd_import(ctx: &Context, args: ImportArgs) -> CmdResult {
    let path = PathBuf::from(&args.file);
    let format = match args.format.as_deref() {
        Some(f) => import::Format::parse(f)
            .ok_or_else(|| format!("invalid format '{}': expected json or csv", f))?,
        None => import::Format::from_path(&path)?,
    };
    let text = std::fs::read_to_string(&path)
        .map_err(|e| format!("could not read {}: {}", args.file, e))?;
    let tasks = import::import_tasks(&text, format)?;

    let (mut store, _lock) = open_store_locked(ctx)?;
    let ids = store.import_tasks(tasks);
    ensure_saved(&store)?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&ids)?);
    } else {
        println!("imported {} tasks", ids.len());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Selection, timer, status
// ---------------------------------------------------------------------------

fn cmd_select(ctx: &Context, args: SelectArgs) -> CmdResult {
    let (mut store, _lock) = open_store_locked(ctx)?;
    if args.clear {
        store.clear_task_selection();
        ensure_saved(&store)?;
        println!("selection cleared");
        return Ok(());
    }
    if let Some(id) = args.id {
        if store.task(id).is_none() {
            return Err(format!("task not found: {}", id).into());
        }
        let selected = store.toggle_task_selection(id);
        ensure_saved(&store)?;
        println!("{} {}", id, if selected { "selected" } else { "deselected" });
        return Ok(());
    }
    let selected = store.selected_tasks();
    print_task_list(ctx, &store, &selected)
}

fn cmd_timer(ctx: &Context, args: TimerCmd) -> CmdResult {
    let (mut store, _lock) = open_store_locked(ctx)?;
    match args.action {
        TimerAction::Start(IdArg { id }) => {
            if !store.start_task_timer(id) {
                return Err(format!("task not found: {}", id).into());
            }
        }
        TimerAction::Pause => {
            if !store.pause_task_timer() {
                return Err("no running timer".into());
            }
        }
        TimerAction::Resume => {
            if !store.resume_task_timer() {
                return Err("no paused timer".into());
            }
        }
        TimerAction::Stop => {
            let id = store.state().active_timer.task_id;
            if !store.stop_task_timer() {
                return Err("no timer".into());
            }
            ensure_saved(&store)?;
            let total = id.and_then(|id| store.task(id)).map_or(0, |t| t.timer);
            if ctx.json {
                let out = timer_to_json(&store.state().active_timer, total);
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("stopped: {}", format_duration(total));
            }
            return Ok(());
        }
        TimerAction::Status => {}
    }
    ensure_saved(&store)?;

    let timer = &store.state().active_timer;
    let elapsed = timer
        .task_id
        .and_then(|id| store.elapsed_for(id))
        .unwrap_or(0);
    if ctx.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&timer_to_json(timer, elapsed))?
        );
    } else {
        let title = timer
            .task_id
            .and_then(|id| store.task(id))
            .map(|t| t.title.as_str());
        println!("{}", format_timer(timer, elapsed, title));
    }
    Ok(())
}

fn cmd_status(ctx: &Context, args: StatusArgs) -> CmdResult {
    let (mut store, _lock) = open_store_locked(ctx)?;
    if let Some(ref s) = args.status {
        let status = UserStatus::parse(s).ok_or_else(|| {
            format!(
                "invalid status '{}': expected online, break, shadow or offline",
                s
            )
        })?;
        store.set_status(status);
        ensure_saved(&store)?;
    }
    let status = store.state().status;
    let work_time = store.work_time();
    if ctx.json {
        let out = serde_json::json!({ "status": status, "workTime": work_time });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "{} {}",
            status,
            format_duration(work_time)
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Categories, notifications, users
// ---------------------------------------------------------------------------

fn cmd_category(ctx: &Context, args: CategoryCmd) -> CmdResult {
    match args.action.unwrap_or(CategoryAction::List) {
        CategoryAction::List => {
            let store = open_store(ctx);
            let categories = &store.state().categories;
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(categories)?);
            } else {
                print_lines(categories);
            }
        }
        CategoryAction::Add(NameArg { name }) => {
            let (mut store, _lock) = open_store_locked(ctx)?;
            if !store.add_category(name.clone()) {
                return Err(format!("category already exists or is blank: {}", name).into());
            }
            ensure_saved(&store)?;
            println!("added {}", name.trim());
        }
        CategoryAction::Remove(NameArg { name }) => {
            let (mut store, _lock) = open_store_locked(ctx)?;
            if !store.remove_category(&name) {
                return Err(format!("category not found: {}", name).into());
            }
            ensure_saved(&store)?;
            println!("removed {}", name);
        }
    }
    Ok(())
}

fn cmd_notifications(ctx: &Context, args: NotificationsArgs) -> CmdResult {
    let (mut store, _lock) = open_store_locked(ctx)?;
    if let Some(id) = args.read {
        if !store.mark_notification_as_read(id) {
            return Err(format!("notification not found: {}", id).into());
        }
    } else if args.read_all {
        store.mark_all_notifications_as_read();
    }
    ensure_saved(&store)?;
    let notifications = &store.state().notifications;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(notifications)?);
    } else if notifications.is_empty() {
        println!("no notifications");
    } else {
        for n in notifications {
            println!("{}", format_notification(n));
        }
    }
    Ok(())
}

fn cmd_user(ctx: &Context, args: UserCmd) -> CmdResult {
    let (mut store, _lock) = open_store_locked(ctx)?;
    let user = match args.action {
        UserAction::Register(a) => {
            let role = Role::parse(&a.role).ok_or_else(|| {
                format!(
                    "invalid role '{}': expected Customer, Staff, Manager or Admin",
                    a.role
                )
            })?;
            let user = User {
                id: 0,
                name: a.name,
                email: a.email,
                password: a.password,
                phone: a.phone,
                country: a.country,
                role,
                avatar: String::new(),
                bio: None,
            };
            Some(auth::register(&mut store, user)?)
        }
        UserAction::Login(a) => Some(auth::login(&mut store, &a.email, &a.password)?),
        UserAction::Logout => {
            auth::logout(&mut store);
            None
        }
        UserAction::Whoami => store.state().current_user.clone(),
    };
    ensure_saved(&store)?;
    match (user, ctx.json) {
        (Some(u), true) => println!("{}", serde_json::to_string_pretty(&user_to_json(&u))?),
        (Some(u), false) => println!("{} <{}> {}", u.name, u.email, u.role.as_str()),
        (None, true) => println!("null"),
        (None, false) => println!("not logged in"),
    }
    Ok(())
}

fn cmd_reset(ctx: &Context) -> CmdResult {
    let _lock = FileLock::acquire_default(&ctx.data_dir)?;
    adapter(ctx).clear()?;
    println!("state cleared");
    Ok(())
}
