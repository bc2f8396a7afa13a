use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tm", about = concat!("tm v", env!("CARGO_PKG_VERSION"), " - tasks with undo, redo and timers"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task
    Add(AddArgs),
    /// List tasks (stored filters and sort, overridden by flags)
    List(ListArgs),
    /// Show task details
    Show(IdArg),
    /// Change task fields
    Edit(EditArgs),
    /// Flip a task between completed and active
    Toggle(IdArg),
    /// Mark tasks completed (default: the selection)
    Complete(IdsArgs),
    /// Delete tasks (default: the selection)
    Delete(IdsArgs),
    /// Swap the positions of two tasks
    Move(MoveArgs),
    /// Select or deselect a task
    Select(SelectArgs),
    /// Undo the last change
    Undo,
    /// Redo the last undone change
    Redo,
    /// Show the undo history
    History,
    /// Task timer
    Timer(TimerCmd),
    /// Show or set presence (online, break, shadow, offline)
    Status(StatusArgs),
    /// Show task statistics
    Stats,
    /// Import tasks from a JSON or CSV file
    Import(ImportArgs),
    /// Export tasks as JSON or CSV
    Export(ExportArgs),
    /// Category management
    Category(CategoryCmd),
    /// List notifications
    Notifications(NotificationsArgs),
    /// Account management
    User(UserCmd),
    /// Delete all stored state
    Reset,
}

// ---------------------------------------------------------------------------
// Task args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct IdArg {
    /// Task ID
    pub id: u64,
}

#[derive(Args)]
pub struct IdsArgs {
    /// Task IDs
    pub ids: Vec<u64>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(short, long)]
    pub category: Option<String>,
    /// High, Medium or Low (default from config)
    #[arg(short, long)]
    pub priority: Option<String>,
    /// Due date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub due: Option<String>,
    /// Assigned user ID
    #[arg(long)]
    pub assign: Option<u64>,
    /// Subtask (repeatable)
    #[arg(long = "subtask")]
    pub subtasks: Vec<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: u64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(short, long)]
    pub category: Option<String>,
    #[arg(short, long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long)]
    pub assign: Option<u64>,
    /// Replace the subtask list (repeatable)
    #[arg(long = "subtask")]
    pub subtasks: Vec<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Substring of title or description
    #[arg(short, long)]
    pub search: Option<String>,
    #[arg(short, long)]
    pub category: Option<String>,
    #[arg(short, long)]
    pub priority: Option<String>,
    /// completed or active
    #[arg(long)]
    pub status: Option<String>,
    /// Due on or after this date
    #[arg(long)]
    pub from: Option<String>,
    /// Due on or before this date
    #[arg(long)]
    pub to: Option<String>,
    /// none, dueDate, priority, title or created
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort descending
    #[arg(long)]
    pub desc: bool,
    /// Sort ascending
    #[arg(long, conflicts_with = "desc")]
    pub asc: bool,
    /// Remember these filters and sort
    #[arg(long)]
    pub save: bool,
    /// Drop stored filters first
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args)]
pub struct MoveArgs {
    /// Task to move
    pub source: u64,
    /// Task to swap places with
    pub target: u64,
}

#[derive(Args)]
pub struct SelectArgs {
    /// Task ID to toggle (omit to show the selection)
    pub id: Option<u64>,
    /// Clear the selection
    #[arg(long, conflicts_with = "id")]
    pub clear: bool,
}

// ---------------------------------------------------------------------------
// Timer / status
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TimerCmd {
    #[command(subcommand)]
    pub action: TimerAction,
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start timing a task
    Start(IdArg),
    /// Pause the running timer
    Pause,
    /// Resume the paused timer
    Resume,
    /// Stop the timer and keep the time on the task
    Stop,
    /// Show the timer
    Status,
}

#[derive(Args)]
pub struct StatusArgs {
    /// New status (omit to show the current one)
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Import / export
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ImportArgs {
    /// File to import
    pub file: String,
    /// json or csv (default: from the file extension)
    #[arg(long)]
    pub format: Option<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// json or csv
    #[arg(long, default_value = "json")]
    pub format: String,
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

// ---------------------------------------------------------------------------
// Categories / notifications / users
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct CategoryCmd {
    #[command(subcommand)]
    pub action: Option<CategoryAction>,
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// List categories
    List,
    /// Add a category
    Add(NameArg),
    /// Remove a category
    Remove(NameArg),
}

#[derive(Args)]
pub struct NameArg {
    pub name: String,
}

#[derive(Args)]
pub struct NotificationsArgs {
    /// Mark one notification read
    #[arg(long)]
    pub read: Option<u64>,
    /// Mark all notifications read
    #[arg(long, conflicts_with = "read")]
    pub read_all: bool,
}

#[derive(Args)]
pub struct UserCmd {
    #[command(subcommand)]
    pub action: UserAction,
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Create an account and log in
    Register(RegisterArgs),
    /// Log in
    Login(LoginArgs),
    /// Log out
    Logout,
    /// Show the logged-in account
    Whoami,
}

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
    #[arg(long, default_value = "")]
    pub phone: String,
    #[arg(long, default_value = "")]
    pub country: String,
    /// Customer, Staff, Manager or Admin
    #[arg(long, default_value = "Customer")]
    pub role: String,
}

#[derive(Args)]
pub struct LoginArgs {
    pub email: String,
    pub password: String,
}
