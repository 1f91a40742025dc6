//! tripgraph binary: plan a trip, resume a suspended session, list, prune or delete sessions.

use std::time::Duration;

use clap::{Parser, Subcommand};
use tripgraph::state::BudgetRange;
use tripgraph_cli::{
    delete_session, demo_kind, list_sessions, prune_sessions, render_json, render_text,
    resume_with_config, run_with_config, Error, RunConfig, RunOptions, TravelQuery,
};

#[derive(Parser, Debug)]
#[command(name = "tripgraph")]
#[command(about = "Travel planner: analyze → research → parallel search → activities → budget → plan")]
struct Args {
    /// Show debug logs (stage transitions, retries, checkpoints) and the config summary
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// SQLite database for checkpoints (overrides DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<String>,

    /// Keep checkpoints in memory only
    #[arg(long, global = true, conflicts_with = "db")]
    in_memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan a trip from a free-text request
    Plan {
        /// The request, e.g. "Visit Kyoto in November"
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,
        #[arg(long)]
        origin: Option<String>,
        /// Explicit destination; skips destination research
        #[arg(long)]
        destination: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD", requires = "return_date")]
        depart: Option<String>,
        #[arg(long = "return", value_name = "YYYY-MM-DD", requires = "depart")]
        return_date: Option<String>,
        #[arg(long, default_value_t = 1)]
        travelers: u32,
        /// Upper budget bound
        #[arg(long)]
        budget_max: Option<f64>,
        #[arg(long, default_value = "USD")]
        currency: String,
        /// Suspend for confirmation of the proposed budget tier
        #[arg(long)]
        confirm_budget: bool,
        #[arg(long)]
        max_attempts: Option<u32>,
        #[arg(long)]
        concurrency: Option<usize>,
        #[arg(long, value_name = "MS")]
        join_timeout_ms: Option<u64>,
        /// Make a demo worker always fail (repeatable): research, flights, accommodation, ...
        #[arg(long = "fail", value_name = "WORKER")]
        fail: Vec<String>,
    },
    /// Resume a suspended session with the answer to its question
    Resume {
        session: String,
        /// Answer as JSON, e.g. '{"approved": true}'
        #[arg(long, default_value = "{}")]
        input: String,
    },
    /// List stored sessions, newest first
    Sessions {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Delete sessions whose last checkpoint is older than this many days, then list
        #[arg(long, value_name = "DAYS")]
        prune_days: Option<u64>,
    },
    /// Delete a stored session
    Delete { session: String },
}

/// Initializes tracing on stderr so stdout carries only the report.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,tripgraph=debug,tripgraph_cli=debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn base_options(args: &Args) -> RunOptions {
    RunOptions {
        db_path: args.db.clone(),
        in_memory: args.in_memory,
        verbose: args.verbose,
        ..Default::default()
    }
}

async fn execute(args: Args) -> Result<(), Error> {
    dotenv::dotenv().ok();
    let mut config = RunConfig::from_env()?;
    let mut options = base_options(&args);

    let handle = match args.command {
        Command::Plan {
            query,
            origin,
            destination,
            depart,
            return_date,
            travelers,
            budget_max,
            currency,
            confirm_budget,
            max_attempts,
            concurrency,
            join_timeout_ms,
            fail,
        } => {
            options.confirm_budget = confirm_budget;
            options.max_attempts = max_attempts;
            options.max_concurrency = concurrency;
            options.join_timeout_ms = join_timeout_ms;
            for name in &fail {
                let kind = demo_kind(name)
                    .ok_or_else(|| format!("unknown worker for --fail: {}", name))?;
                options.failing_workers.push(kind);
            }
            config.apply_options(&options);

            let mut request = TravelQuery::new(query.join(" ").trim()).with_travelers(travelers);
            if let Some(o) = origin {
                request = request.with_origin(o);
            }
            if let Some(d) = destination {
                request = request.with_destination(d);
            }
            if let (Some(d), Some(r)) = (depart, return_date) {
                request = request.with_dates(d, r);
            }
            if let Some(max) = budget_max {
                request = request.with_budget(BudgetRange {
                    min: None,
                    max: Some(max),
                    currency,
                });
            }
            run_with_config(&config, request, None).await?
        }
        Command::Resume { session, input } => {
            config.apply_options(&options);
            let input: serde_json::Value = serde_json::from_str(&input)
                .map_err(|e| format!("--input is not valid JSON: {}", e))?;
            resume_with_config(&config, &session, input, None).await?
        }
        Command::Sessions { limit, prune_days } => {
            config.apply_options(&options);
            if let Some(days) = prune_days {
                let removed =
                    prune_sessions(&config, Duration::from_secs(days * 24 * 60 * 60)).await?;
                eprintln!("pruned {} session(s) older than {} day(s)", removed, days);
            }
            for item in list_sessions(&config, limit).await? {
                println!(
                    "{}  {}  {}",
                    item.session_id,
                    item.stage.as_str(),
                    item.metadata.created_at_ms
                );
            }
            return Ok(());
        }
        Command::Delete { session } => {
            config.apply_options(&options);
            if !delete_session(&config, &session).await? {
                return Err(format!("no stored session: {}", session).into());
            }
            println!("deleted {}", session);
            return Ok(());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&render_json(&handle))?);
    } else {
        print!("{}", render_text(&handle));
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);
    if let Err(e) = execute(args).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
