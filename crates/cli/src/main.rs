//! Agentic CLI - browse the platform hierarchy and sync task status.

use std::path::PathBuf;
use std::time::Duration;

use agentic_client::{ClientConfig, PlatformClient};
use agentic_core::{
    mask_api_key, ProductId, ProjectId, QueuedUpdate, SessionState, SpecId, SubTaskId, TaskId,
    TaskStatus,
};
use agentic_sync::{PlatformService, SyncConfig};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agentic")]
#[command(about = "Sync local agent sessions with the Agentic platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Platform base URL (overrides AGENTIC_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Offline queue file
    #[arg(long, global = true, default_value = ".agentic/queue.json")]
    queue: PathBuf,

    /// Cache max age in seconds
    #[arg(long, global = true, default_value = "300")]
    cache_secs: u64,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check connectivity and show the signed-in user
    Status {
        /// Re-probe instead of using a recent result
        #[arg(long)]
        refresh: bool,
    },
    /// List projects
    Projects,
    /// List products of a project
    Products {
        /// Project ID
        project: String,
    },
    /// List specs of a product
    Specs {
        /// Product ID
        product: String,
    },
    /// List tasks of a spec
    Tasks {
        /// Spec ID
        spec: String,
    },
    /// Show task details
    Task {
        /// Task ID
        id: String,
    },
    /// List sub-tasks of a task
    Subtasks {
        /// Task ID
        task: String,
    },
    /// Queue a task status and flush
    SetStatus {
        /// Task ID
        task: String,
        /// New status
        status: String,
        /// Queue only; do not flush
        #[arg(long)]
        no_flush: bool,
    },
    /// Queue a sub-task status and flush
    SetSubtaskStatus {
        /// Sub-task ID
        subtask: String,
        /// New status
        status: String,
    },
    /// Report a local session state for a task
    Session {
        /// Task ID
        task: String,
        /// started, running, idle, error, completed or stopped
        state: String,
    },
    /// Check whether a local status disagrees with the platform
    Conflict {
        /// Task ID
        task: String,
        /// Status the local session believes
        local: String,
    },
    /// Send queued status updates
    Flush,
    /// Show queue and sync health
    SyncStatus,
    /// Show updates dropped after exhausting retries
    DeadLetters {
        /// Remove them after printing
        #[arg(long)]
        discard: bool,
    },
    /// Discard all pending updates
    Clear,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = ClientConfig::from_env().context("Failed to load client configuration")?;
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }
    debug!("Using {} with key {}", config.base_url, mask_api_key(&config.api_key));

    if let Some(parent) = cli.queue.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let client = PlatformClient::new(config)?;
    let service = PlatformService::new(
        client,
        SyncConfig::default()
            .with_queue_path(&cli.queue)
            .with_cache_max_age(Duration::from_secs(cli.cache_secs)),
    )
    .await?;

    match cli.command {
        Commands::Status { refresh } => {
            let status = if refresh {
                service.reconnect().await
            } else {
                service.connection_status().await
            };
            println!("Platform: {}", status.base_url);
            if status.connected {
                println!("  Connected");
            } else {
                println!("  Offline: {}", status.error.as_deref().unwrap_or("unreachable"));
            }
            if let Some(user) = status.user {
                println!("  User: {} <{}>", user.name, user.email);
            }
        }
        Commands::Projects => {
            let projects = service.projects().await?;
            println!("Projects ({})", projects.len());
            for project in projects {
                println!("  {} | {}", project.id, project.name);
            }
        }
        Commands::Products { project } => {
            let products = service.products(&ProjectId::parse(project)?).await?;
            println!("Products ({})", products.len());
            for product in products {
                println!("  {} | {}", product.id, product.name);
            }
        }
        Commands::Specs { product } => {
            let specs = service.specs(&ProductId::parse(product)?).await?;
            println!("Specs ({})", specs.len());
            for spec in specs {
                println!("  {} | {}", spec.id, spec.name);
            }
        }
        Commands::Tasks { spec } => {
            let tasks = service.tasks(&SpecId::parse(spec)?).await?;
            println!("Tasks ({})", tasks.len());
            for task in tasks {
                println!("  {} | {} | {}", task.id, format_status(task.status), task.title);
            }
        }
        Commands::Task { id } => {
            let task = service.task(&TaskId::parse(id)?).await?;
            println!("Task: {}", task.id);
            println!("  Title: {}", task.title);
            println!("  Spec: {}", task.spec_id);
            println!("  Status: {}", format_status(task.status));
            if let Some(checkpoint) = task.checkpoint_mode {
                println!("  Checkpoint mode: {}", checkpoint);
            }
            if !task.description.is_empty() {
                println!("  Description: {}", task.description);
            }
        }
        Commands::Subtasks { task } => {
            let subtasks = service.subtasks(&TaskId::parse(task)?).await?;
            println!("Sub-tasks ({})", subtasks.len());
            for subtask in subtasks {
                println!(
                    "  {} | {} | {}",
                    subtask.id,
                    format_status(subtask.status),
                    subtask.title
                );
            }
        }
        Commands::SetStatus { task, status, no_flush } => {
            service.push_status_update(&task, &status).await?;
            println!("Queued {} for task {}", status, task);
            if !no_flush {
                flush(&service).await?;
            }
        }
        Commands::SetSubtaskStatus { subtask, status } => {
            let status: TaskStatus = status.parse()?;
            service
                .syncer()
                .push_subtask_status(&SubTaskId::parse(subtask.as_str())?, status)
                .await?;
            println!("Queued {} for sub-task {}", status, subtask);
            flush(&service).await?;
        }
        Commands::Session { task, state } => {
            let state: SessionState = state.parse()?;
            match service.report_session_state(&TaskId::parse(task.as_str())?, state).await? {
                Some(status) => {
                    println!("Session {} -> task {} is {}", state, task, status);
                    flush(&service).await?;
                }
                None => println!("Session {} does not change task {}", state, task),
            }
        }
        Commands::Conflict { task, local } => {
            let local: TaskStatus = local.parse()?;
            let task_id = TaskId::parse(task)?;
            if service.check_task_conflict(&task_id, local).await? {
                println!("Conflict: platform status differs from {}", local);
            } else {
                println!("No conflict");
            }
        }
        Commands::Flush => flush(&service).await?,
        Commands::SyncStatus => {
            let status = service.sync_status().await;
            println!("Sync Status");
            println!("  Pending: {}", status.pending_updates);
            println!("  Dead letters: {}", status.dead_letters);
            println!("  Offline: {}", status.is_offline);
            if let Some(last) = status.last_sync_time {
                println!("  Last sync: {}", last);
            }
            if let Some(err) = status.last_error {
                println!("  Last error: {}", err);
            }
            for update in service.syncer().pending_updates().await {
                print_update(&update);
            }
        }
        Commands::DeadLetters { discard } => {
            let dead = if discard {
                service.syncer().discard_dead_letters().await?
            } else {
                service.syncer().dead_letters().await
            };
            println!("Dead letters ({})", dead.len());
            for update in &dead {
                print_update(update);
            }
        }
        Commands::Clear => {
            let count = service.syncer().pending_count().await;
            service.syncer().clear_pending().await?;
            println!("Discarded {} pending updates", count);
        }
    }

    Ok(())
}

async fn flush(service: &PlatformService) -> Result<()> {
    match service.flush_updates().await {
        Ok(report) if report.skipped => println!("Flush already in progress"),
        Ok(report) => {
            info!("Flushed {} updates", report.delivered);
            println!("Delivered {} of {} updates", report.delivered, report.attempted);
        }
        Err(err) => {
            let status = service.sync_status().await;
            println!("Sync failed, {} updates still queued", status.pending_updates);
            return Err(err).context("Failed to flush status updates");
        }
    }
    Ok(())
}

fn print_update(update: &QueuedUpdate) {
    println!(
        "  {} {} | {}={} | retries {} | {}",
        update.entity_kind,
        update.entity_id,
        update.field,
        update.value,
        update.retry_count,
        update.timestamp
    );
}

fn format_status(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Planned => "PLANNED",
        TaskStatus::Pending => "PENDING",
        TaskStatus::Initializing => "INITIALIZING",
        TaskStatus::Processing => "PROCESSING",
        TaskStatus::Completed => "COMPLETED",
        TaskStatus::Error => "ERROR",
        TaskStatus::TimedOut => "TIMED_OUT",
        TaskStatus::Stopped => "STOPPED",
        TaskStatus::AwaitingFeedback => "AWAITING_FEEDBACK",
    }
}
