use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::sync::Arc;

use po_pilot::backend::{BackendApi, HttpBackend, PoStatus};
use po_pilot::config::config;
use po_pilot::telemetry::init_telemetry;
use po_pilot::workflow::{
    find_by_operation, undo_target, BusyTable, ExecuteError, InputShape, NotificationSink,
    Reconciler, Severity, TransitionExecutor, TransitionInputs, TransitionKind, CATALOG,
};

#[derive(Parser)]
#[command(name = "po-pilot")]
#[command(about = "Tracks purchase orders through the fulfillment pipeline")]
#[command(long_about = "po-pilot drives purchase orders through a multi-step fulfillment \
                        pipeline. Each order exposes exactly the operations legal for its \
                        current status; 'po-pilot list' shows them, 'po-pilot run' executes one.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List purchase orders with their currently available operations
    List,
    /// Create a new purchase order draft
    Create {
        /// Name for the new purchase order
        name: String,
        /// Create an ATS order (skips the breakdown and net-sales stages)
        #[arg(long)]
        ats: bool,
        #[arg(long, default_value = "USD")]
        currency: String,
    },
    /// Execute a workflow operation for a purchase order
    Run {
        id: u64,
        /// Operation name as shown by 'list', e.g. create-breakdown
        operation: String,
        /// Shipping fees in USD (calculate-net-sales)
        #[arg(long, default_value_t = 0.0)]
        shipping_fees: f64,
        /// Customs fees in USD (calculate-net-sales)
        #[arg(long, default_value_t = 0.0)]
        customs_fees: f64,
        /// Other fees in USD (calculate-net-sales)
        #[arg(long, default_value_t = 0.0)]
        other_fees: f64,
        /// Purchase order id in the external fulfillment system
        /// (create-skus-and-po-non-ats)
        #[arg(long)]
        po_id: Option<u64>,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Delete a purchase order draft
    Delete {
        id: u64,
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Undo the most recent pipeline step
    Undo {
        id: u64,
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Force a status from the restricted menu (developer escape hatch)
    SetStatus {
        id: u64,
        /// Target status, e.g. "PO Received"
        status: String,
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Show the backend log trail for a purchase order
    Logs { id: u64 },
    /// Keep the table in sync with the backend until interrupted
    Watch,
}

/// Prints notifications the way a snackbar would show them.
struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success => println!("✅ {message}"),
            Severity::Error => eprintln!("❌ {message}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config()?;
    init_telemetry(&cfg.observability.log_level)?;

    let backend: Arc<dyn BackendApi> = Arc::new(HttpBackend::new(
        &cfg.backend.base_url,
        cfg.backend.request_timeout(),
    )?);
    let sink: Arc<dyn NotificationSink> = Arc::new(ConsoleSink);
    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&backend),
        Arc::clone(&sink),
        BusyTable::new(),
        cfg.reconciler.poll_interval(),
    ));
    let executor = TransitionExecutor::new(backend, sink, Arc::clone(&reconciler));

    match cli.command {
        Commands::List => {
            reconciler.refresh(false).await;
            render_rows(&reconciler);
            Ok(())
        }
        Commands::Create {
            name,
            ats,
            currency,
        } => {
            if executor.create(name, ats, currency).await.is_err() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Run {
            id,
            operation,
            shipping_fees,
            customs_fees,
            other_fees,
            po_id,
            yes,
        } => {
            let Some(spec) = find_by_operation(&operation) else {
                let known: Vec<_> = CATALOG.iter().map(|spec| spec.operation).collect();
                bail!("unknown operation '{operation}'; expected one of: {}", known.join(", "));
            };
            let inputs = match spec.input {
                InputShape::None => TransitionInputs::None,
                InputShape::Fees => TransitionInputs::Fees {
                    shipping_fees,
                    customs_fees,
                    other_fees,
                },
                InputShape::ExternalPoId => TransitionInputs::ExternalPoId(po_id.unwrap_or(0)),
            };
            run_transition(&reconciler, &executor, id, spec.kind, inputs, yes).await
        }
        Commands::Delete { id, yes } => {
            run_transition(
                &reconciler,
                &executor,
                id,
                TransitionKind::Delete,
                TransitionInputs::None,
                yes,
            )
            .await
        }
        Commands::Undo { id, yes } => {
            run_transition(
                &reconciler,
                &executor,
                id,
                TransitionKind::Undo,
                TransitionInputs::None,
                yes,
            )
            .await
        }
        Commands::SetStatus { id, status, yes } => {
            reconciler.refresh(false).await;
            let target = PoStatus::from(status);
            let prompt = format!("Apply status '{target}' to purchase order #{id}?");
            if !confirm(&prompt, yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            report(executor.override_status(id, target).await)
        }
        Commands::Logs { id } => {
            reconciler.refresh(false).await;
            let Some(po) = reconciler.get(id) else {
                bail!("purchase order #{id} is not in the current snapshot");
            };
            if po.logs.is_empty() {
                println!("No logs for {}.", po.name);
                return Ok(());
            }
            println!("Logs for {}:", po.name);
            for log in &po.logs {
                println!("  [{}] {} ({}): {}", log.date, log.user, log.kind, log.message);
            }
            Ok(())
        }
        Commands::Watch => {
            let mut snapshots = reconciler.subscribe();
            let poll_loop = reconciler.spawn_poll_loop();
            println!("Watching purchase orders (Ctrl-C to stop)...");
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    changed = snapshots.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        render_rows(&reconciler);
                    }
                }
            }
            poll_loop.stop().await;
            Ok(())
        }
    }
}

/// The generic confirm-then-invoke flow shared by every transition command.
async fn run_transition(
    reconciler: &Reconciler,
    executor: &TransitionExecutor,
    id: u64,
    kind: TransitionKind,
    inputs: TransitionInputs,
    assume_yes: bool,
) -> Result<()> {
    reconciler.refresh(false).await;
    let spec = po_pilot::workflow::spec_for(kind);

    if let Some(prompt) = spec.confirm {
        let prompt = match (kind, reconciler.get(id)) {
            (TransitionKind::Undo, Some(po)) => {
                let target = undo_target(&po.status)
                    .map(|status| format!(" back to '{status}'"))
                    .unwrap_or_default();
                format!(
                    "Are you sure you want to undo the latest process ({}){target}?",
                    po.status
                )
            }
            _ => prompt.to_string(),
        };
        if !confirm(&prompt, assume_yes)? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    report(executor.execute(id, kind, inputs).await)
}

fn report(result: Result<String, ExecuteError>) -> Result<()> {
    match result {
        // The sink already showed the success message.
        Ok(_) => Ok(()),
        // Backend rejections were surfaced through the sink as well.
        Err(ExecuteError::Backend(_)) => std::process::exit(1),
        // Validation and guard failures surface inline, never via the sink.
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

fn render_rows(reconciler: &Reconciler) {
    let rows = reconciler.rows();
    if rows.is_empty() {
        println!("No purchase orders.");
        return;
    }
    println!(
        "{:<6} {:<5} {:<28} {:<42} OPERATIONS",
        "ID", "TYPE", "NAME", "STATUS"
    );
    for row in rows {
        let operations = if row.busy {
            "(busy)".to_string()
        } else if row.actions.is_empty() {
            "-".to_string()
        } else {
            row.actions
                .iter()
                .map(|spec| spec.operation)
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!(
            "{:<6} {:<5} {:<28} {:<42} {}",
            row.po.id,
            row.po.kind_label(),
            row.po.name,
            row.po.status.to_string(),
            operations
        );
    }
}
