use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ct", about = concat!("chronotask v", env!("CARGO_PKG_VERSION"), " - plan the day, map the ideas"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different workspace directory
    #[arg(short = 'C', long = "workspace-dir", global = true)]
    pub workspace_dir: Option<String>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a .chronotask/ workspace in the current directory
    Init(InitArgs),
    /// Manage tasks
    Task(TaskCmd),
    /// Manage task types
    Type(TypeCmd),
    /// Place tasks on the day planner
    Plan(PlanCmd),
    /// Manage the idea mind map
    Idea(IdeaCmd),
    /// Re-run the idea layout whenever the stored collections change
    Watch(WatchArgs),
    /// Read or change config.toml values
    Config(ConfigCmd),
    /// View or manage the recovery log
    Recovery(RecoveryCmd),
}

#[derive(Args)]
pub struct InitArgs {
    /// Reinitialize even if .chronotask/ already exists
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TaskCmd {
    #[command(subcommand)]
    pub action: TaskAction,
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task (prints its id)
    Add(TaskAddArgs),
    /// List tasks
    List(TaskListArgs),
    /// Show task details
    Show(IdArg),
    /// Change task fields
    Edit(TaskEditArgs),
    /// Toggle completion
    Done(IdArg),
    /// Delete a task permanently
    Rm(IdArg),
}

#[derive(Args)]
pub struct IdArg {
    /// Id or unique id prefix
    pub id: String,
}

#[derive(Args)]
pub struct TaskAddArgs {
    pub title: String,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    /// Task type name
    #[arg(short = 't', long = "type")]
    pub task_type: Option<String>,
    /// Tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Estimate in minutes
    #[arg(short, long, allow_negative_numbers = true)]
    pub estimate: Option<i64>,
}

#[derive(Args)]
pub struct TaskListArgs {
    /// Show only completed tasks
    #[arg(long, conflicts_with = "all")]
    pub done: bool,
    /// Show open and completed tasks
    #[arg(long)]
    pub all: bool,
    /// Only tasks of this type
    #[arg(short = 't', long = "type")]
    pub task_type: Option<String>,
    /// Only tasks not yet on the planner
    #[arg(long)]
    pub unscheduled: bool,
}

#[derive(Args)]
pub struct TaskEditArgs {
    /// Id or unique id prefix
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    #[arg(short = 't', long = "type")]
    pub task_type: Option<String>,
    /// Replace all tags (comma-separated; empty clears)
    #[arg(long)]
    pub tags: Option<String>,
    #[arg(short, long, allow_negative_numbers = true)]
    pub estimate: Option<i64>,
}

// ---------------------------------------------------------------------------
// Task types
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TypeCmd {
    #[command(subcommand)]
    pub action: TypeAction,
}

#[derive(Subcommand)]
pub enum TypeAction {
    /// List task types
    List,
    /// Add a task type
    Add(TypeAddArgs),
    /// Rename or recolor a task type
    Edit(TypeEditArgs),
    /// Delete a task type
    Rm(TypeRef),
}

#[derive(Args)]
pub struct TypeAddArgs {
    pub name: String,
    /// Hex color (#RRGGBB)
    pub color: String,
}

#[derive(Args)]
pub struct TypeEditArgs {
    /// Type name or id
    pub name: String,
    #[arg(long = "name")]
    pub new_name: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args)]
pub struct TypeRef {
    /// Type name or id
    pub name: String,
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct PlanCmd {
    #[command(subcommand)]
    pub action: PlanAction,
}

#[derive(Subcommand)]
pub enum PlanAction {
    /// Show the planner column for a day
    Day(DateArg),
    /// Show where a task would land if dropped at a pixel offset
    Preview(DropArgs),
    /// Schedule a task at a pixel offset
    Drop(DropArgs),
    /// Schedule a task at a wall-clock time
    At(AtArgs),
    /// Move a task back to the backlog
    Unschedule(IdArg),
    /// Break the day down by task type
    Eval(DateArg),
}

#[derive(Args)]
pub struct DateArg {
    /// Day (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args)]
pub struct DropArgs {
    /// Id or unique id prefix
    pub id: String,
    /// Pointer offset from the top of the day column, in pixels
    #[arg(allow_negative_numbers = true)]
    pub y: f64,
    /// Day (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args)]
pub struct AtArgs {
    /// Id or unique id prefix
    pub id: String,
    /// Start time (HH:MM), snapped to the quarter hour
    pub time: String,
    /// Day (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub date: Option<String>,
}

// ---------------------------------------------------------------------------
// Ideas
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct IdeaCmd {
    #[command(subcommand)]
    pub action: IdeaAction,
}

#[derive(Subcommand)]
pub enum IdeaAction {
    /// Add an idea (prints its id)
    Add(IdeaAddArgs),
    /// List ideas as an indented tree
    List(IdeaListArgs),
    /// Rename or retopic an idea
    Edit(IdeaEditArgs),
    /// Reparent an idea
    Mv(IdeaMvArgs),
    /// Pin an idea at an explicit position
    Pin(IdeaPinArgs),
    /// Return an idea to automatic placement
    Unpin(IdArg),
    /// Delete an idea and everything below it
    Rm(IdArg),
    /// Print computed node positions
    Layout,
    /// Write ideas in the portable export format
    Export(ExportArgs),
    /// Import ideas from an export file
    Import(ImportArgs),
}

#[derive(Args)]
pub struct IdeaAddArgs {
    pub name: String,
    /// Parent idea id or prefix
    #[arg(long)]
    pub parent: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(long)]
    pub topic: Option<String>,
}

#[derive(Args)]
pub struct IdeaListArgs {
    /// Only ideas with this topic
    #[arg(long)]
    pub topic: Option<String>,
}

#[derive(Args)]
pub struct IdeaEditArgs {
    /// Id or unique id prefix
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    /// New description (empty clears)
    #[arg(short, long)]
    pub description: Option<String>,
    /// New topic (empty clears)
    #[arg(long)]
    pub topic: Option<String>,
}

#[derive(Args)]
pub struct IdeaMvArgs {
    /// Id or unique id prefix
    pub id: String,
    /// New parent id or prefix
    #[arg(long, required_unless_present = "root", conflicts_with = "root")]
    pub to: Option<String>,
    /// Make the idea a root
    #[arg(long)]
    pub root: bool,
}

#[derive(Args)]
pub struct IdeaPinArgs {
    /// Id or unique id prefix
    pub id: String,
    #[arg(allow_negative_numbers = true)]
    pub x: f64,
    #[arg(allow_negative_numbers = true)]
    pub y: f64,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Export file to read
    pub file: String,
}

// ---------------------------------------------------------------------------
// Watch / config / recovery
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct WatchArgs {
    /// Exit after this many change notifications
    #[arg(long)]
    pub max_events: Option<usize>,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a value (e.g. planner.work_start)
    Get(ConfigGetArgs),
    /// Set a value, keeping the rest of config.toml as written
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigGetArgs {
    pub key: String,
}

#[derive(Args)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove entries older than 30 days
    Prune(RecoveryPruneArgs),
    /// Print the absolute path to the recovery log
    Path,
}

#[derive(Args)]
pub struct RecoveryPruneArgs {
    /// Remove every entry
    #[arg(long)]
    pub all: bool,
}
