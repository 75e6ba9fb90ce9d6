// Render the recent-activity feed from a repairs snapshot.
//
// Usage: activity --snapshot repairs.json [--actor UID] [--limit N] [--payments]
//                 [--toggle KEY]... [--json] [--stats] [--now RFC3339] [--debug-log]

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

use repairdesk_activity::{
    config::Config,
    db,
    services::{
        activity::{ActivityCollector, ActivityScope},
        activity_groups::group_events,
        dashboard::DashboardStats,
        debug_log::{self, DebugLog},
        expansion::{ExpansionState, NodeKey},
        render::{feed_document, render_feed},
    },
};

#[derive(Parser)]
#[command(name = "activity", about = "Render the repair-shop activity feed from a snapshot")]
struct Args {
    /// Repairs snapshot exported from the database (JSON)
    #[arg(long)]
    snapshot: PathBuf,

    /// Only show activity involving this user uid
    #[arg(long)]
    actor: Option<String>,

    /// Maximum number of events (default: ACTIVITY_LIMIT)
    #[arg(long)]
    limit: Option<usize>,

    /// Include recorded payments in the feed
    #[arg(long)]
    payments: bool,

    /// Flip a node after defaults are applied, e.g. `completed` or `created:2024-01-02`
    #[arg(long = "toggle", value_name = "KEY")]
    toggles: Vec<String>,

    /// Print the render tree as JSON instead of an outline
    #[arg(long)]
    json: bool,

    /// Also print dashboard counters
    #[arg(long)]
    stats: bool,

    /// Render as of this instant instead of the current time
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Print the captured log lines at the end
    #[arg(long)]
    debug_log: bool,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = Config::from_env()?;
    let log_buffer = DebugLog::new(config.debug_log_capacity);
    debug_log::subscriber(&log_buffer, EnvFilter::from_default_env()).init();

    let offset = config.offset()?;
    let now = args.now.unwrap_or_else(Utc::now);
    let today = now.with_timezone(&offset).date_naive();
    let limit = args.limit.unwrap_or(config.activity_limit);
    let scope = match args.actor {
        Some(uid) => ActivityScope::Actor(uid),
        None => ActivityScope::Shop,
    };

    let records = db::load_snapshot(&args.snapshot)?;

    let mut events = ActivityCollector::collect(&records, &scope, limit);
    if args.payments {
        let payments = ActivityCollector::collect_payments(&records, &scope, limit);
        events = ActivityCollector::merge_recent(events, payments, limit);
    }
    info!(
        "Collected {} event(s) for {}",
        events.len(),
        scope.actor().unwrap_or("the whole shop")
    );

    let groups = group_events(&events, offset);
    let mut state = ExpansionState::defaults_for(&groups, today);
    for raw in &args.toggles {
        match raw.parse::<NodeKey>() {
            Ok(key) => {
                state.toggle(key);
            }
            Err(e) => warn!("Ignoring toggle {raw}: {e}"),
        }
    }

    let feed = render_feed(&groups, &state, now, offset, &config.render_options());
    let stats = args
        .stats
        .then(|| DashboardStats::compose(&records, &scope, today, offset));

    if args.json {
        let document = feed_document(&feed, stats.as_ref())?;
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        print!("{}", feed.to_text());
        if let Some(stats) = &stats {
            println!();
            println!("Repairs:          {}", stats.total);
            println!("  pending:        {}", stats.pending);
            println!("  in progress:    {}", stats.in_progress);
            println!("  completed:      {}", stats.completed);
            println!("Received today:   {}", stats.received_today);
            println!("Completed today:  {}", stats.completed_today);
            println!("Payments:         {:.2}", stats.payments_total);
            println!("Unverified:       {}", stats.unverified_remittances);
            println!("Outstanding:      {:.2}", stats.outstanding_balance);
        }
    }

    if args.debug_log {
        eprintln!();
        for entry in log_buffer.entries() {
            eprintln!(
                "{} {:5} {} {}",
                entry.at.format("%H:%M:%S"),
                entry.level,
                entry.target,
                entry.message
            );
        }
    }

    Ok(())
}
