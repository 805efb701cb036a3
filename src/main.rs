use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing_subscriber::EnvFilter;

use peergate_config::GuardConfig;
use peergate_sensor::{FsDefinitionLoader, PokeContext, Sensor, SingleRunGuard};
use peergate_store::{
  RunState, SqliteStore, Store, TaskExecution, TaskState, WorkflowRecord, WorkflowRun,
};

/// Peergate - single-run guards for workflow orchestration
#[derive(Parser)]
#[command(name = "peergate")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the SQLite database (default: ~/.peergate/peergate.db)
  #[arg(long, global = true)]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Create or upgrade the database schema
  Migrate,

  /// Register a workflow and the definition file it is loaded from
  Register {
    workflow_id: String,
    source_path: String,
  },

  /// Record workflow runs
  Run {
    #[command(subcommand)]
    action: RunAction,
  },

  /// Record task executions
  Task {
    #[command(subcommand)]
    action: TaskAction,
  },

  /// Poke a single-run guard once and report whether it is ready
  Check {
    /// Path to the guard config file (JSON)
    config_file: PathBuf,

    /// Workflow the waiting run belongs to
    #[arg(long)]
    workflow: String,

    /// ID of the waiting run
    #[arg(long)]
    run: String,

    /// ID of the waiting task
    #[arg(long)]
    task: String,

    /// Directory relative definition source paths are resolved against
    #[arg(long)]
    definitions_root: Option<PathBuf>,
  },
}

#[derive(Subcommand)]
enum RunAction {
  /// Start a new run of a workflow and print its ID
  Start { workflow_id: String },

  /// Set the state of a run
  SetState {
    run_id: String,
    #[arg(value_parser = parse_run_state)]
    state: RunState,
  },
}

#[derive(Subcommand)]
enum TaskAction {
  /// Set the state of a task within a run
  SetState {
    run_id: String,
    task_id: String,
    #[arg(value_parser = parse_task_state)]
    state: TaskState,
  },
}

fn parse_run_state(s: &str) -> Result<RunState, String> {
  s.parse()
}

fn parse_task_state(s: &str) -> Result<TaskState, String> {
  s.parse()
}

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  match run(cli) {
    Ok(code) => code,
    Err(e) => {
      eprintln!("error: {e:#}");
      ExitCode::from(2)
    }
  }
}

fn run(cli: Cli) -> Result<ExitCode> {
  let Some(command) = cli.command else {
    println!("peergate - use --help to see available commands");
    return Ok(ExitCode::SUCCESS);
  };

  let database = match cli.database {
    Some(path) => path,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".peergate")
      .join("peergate.db"),
  };

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async {
    let store = open_store(&database).await?;

    match command {
      Commands::Migrate => {
        store
          .migrate()
          .await
          .context("failed to run migrations")?;
        eprintln!("Database ready: {}", database.display());
      }
      Commands::Register {
        workflow_id,
        source_path,
      } => {
        store
          .register_workflow(&WorkflowRecord {
            workflow_id: workflow_id.clone(),
            source_path,
            registered_at: Utc::now(),
          })
          .await
          .with_context(|| format!("failed to register workflow '{workflow_id}'"))?;
        eprintln!("Registered workflow: {workflow_id}");
      }
      Commands::Run { action } => run_action(&store, action).await?,
      Commands::Task { action } => task_action(&store, action).await?,
      Commands::Check {
        config_file,
        workflow,
        run,
        task,
        definitions_root,
      } => {
        let ctx = PokeContext::new(workflow, run, task);
        return check(&store, &config_file, definitions_root, &ctx).await;
      }
    }

    Ok(ExitCode::SUCCESS)
  })
}

async fn open_store(database: &Path) -> Result<SqliteStore> {
  if let Some(parent) = database.parent() {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create directory: {}", parent.display()))?;
  }

  let options = SqliteConnectOptions::new()
    .filename(database)
    .create_if_missing(true);
  let pool = SqlitePoolOptions::new()
    .connect_with(options)
    .await
    .with_context(|| format!("failed to open database: {}", database.display()))?;

  Ok(SqliteStore::new(pool))
}

async fn run_action(store: &SqliteStore, action: RunAction) -> Result<()> {
  match action {
    RunAction::Start { workflow_id } => {
      let run_id = uuid::Uuid::new_v4().to_string();
      store
        .create_run(&WorkflowRun {
          run_id: run_id.clone(),
          workflow_id,
          state: RunState::Running,
          started_at: Utc::now(),
          completed_at: None,
        })
        .await
        .context("failed to create run")?;
      println!("{run_id}");
    }
    RunAction::SetState { run_id, state } => {
      store
        .update_run_state(&run_id, state)
        .await
        .with_context(|| format!("failed to update run '{run_id}'"))?;
      eprintln!("Run {run_id} is now {state}");
    }
  }

  Ok(())
}

async fn task_action(store: &SqliteStore, action: TaskAction) -> Result<()> {
  match action {
    TaskAction::SetState {
      run_id,
      task_id,
      state,
    } => {
      let now = Utc::now();
      store
        .upsert_task_execution(&TaskExecution {
          run_id: run_id.clone(),
          task_id: task_id.clone(),
          state,
          attempt: 1,
          started_at: now,
          completed_at: state.is_terminal().then_some(now),
        })
        .await
        .with_context(|| format!("failed to record task '{task_id}' in run '{run_id}'"))?;
      eprintln!("Task {task_id} in run {run_id} is now {state}");
    }
  }

  Ok(())
}

async fn check(
  store: &SqliteStore,
  config_file: &Path,
  definitions_root: Option<PathBuf>,
  ctx: &PokeContext,
) -> Result<ExitCode> {
  let content = tokio::fs::read_to_string(config_file)
    .await
    .with_context(|| format!("failed to read config file: {}", config_file.display()))?;

  let config = GuardConfig::from_json(&content)
    .with_context(|| format!("failed to parse config file: {}", config_file.display()))?;

  let loader = match definitions_root {
    Some(root) => FsDefinitionLoader::with_root(root),
    None => FsDefinitionLoader::new(),
  };
  let mut guard = SingleRunGuard::with_loader(config, loader);

  let ready = guard
    .poke(ctx, store)
    .await
    .with_context(|| format!("{} failed", guard.name()))?;

  if ready {
    println!("ready");
    Ok(ExitCode::SUCCESS)
  } else {
    println!("waiting");
    Ok(ExitCode::from(1))
  }
}
