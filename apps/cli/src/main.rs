#![deny(warnings)]

//! Headless CLI for running simulations and managing saved scenarios.

use anyhow::{anyhow, bail, Context, Result};
use persistence::{default_sqlite_url, SqlitePool};
use sim_core::{Config, ConfigDraft, Delta, Outputs, Preset};
use sim_runtime::{SimulationSession, DEFAULT_SEED};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: pilot [run|save NAME|list|load ID|delete ID|compare ID...|presets] \
[--preset KEY] [--config FILE] [--seed N] [--json] [--db URL]";

#[derive(Debug, PartialEq)]
enum Command {
    Run,
    Save(String),
    List,
    Load(i64),
    Delete(i64),
    Compare(Vec<i64>),
    Presets,
}

#[derive(Debug, PartialEq)]
struct Args {
    command: Command,
    preset: Option<Preset>,
    config: Option<PathBuf>,
    seed: u64,
    json: bool,
    db: Option<String>,
}

fn next_value(it: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    it.next().ok_or_else(|| anyhow!("{flag} expects a value"))
}

fn parse_id(arg: Option<String>) -> Result<i64> {
    let arg = arg.ok_or_else(|| anyhow!("missing scenario ID\n{USAGE}"))?;
    arg.parse()
        .with_context(|| format!("scenario ID must be an integer, got {arg:?}"))
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut it = args.into_iter();
    let mut positional = Vec::new();
    let mut preset = None;
    let mut config = None;
    let mut seed = DEFAULT_SEED;
    let mut json = false;
    let mut db = None;
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--preset" => preset = Some(next_value(&mut it, "--preset")?.parse::<Preset>()?),
            "--config" => config = Some(PathBuf::from(next_value(&mut it, "--config")?)),
            "--seed" => {
                seed = next_value(&mut it, "--seed")?
                    .parse()
                    .context("--seed expects an unsigned integer")?
            }
            "--json" => json = true,
            "--db" => db = Some(next_value(&mut it, "--db")?),
            "-h" | "--help" => bail!("{USAGE}"),
            flag if flag.starts_with("--") => bail!("unknown flag {flag}\n{USAGE}"),
            _ => positional.push(arg),
        }
    }

    let mut pos = positional.into_iter();
    let command = match pos.next().as_deref() {
        None | Some("run") => Command::Run,
        Some("save") => Command::Save(
            pos.next()
                .ok_or_else(|| anyhow!("save expects a NAME\n{USAGE}"))?,
        ),
        Some("list") => Command::List,
        Some("load") => Command::Load(parse_id(pos.next())?),
        Some("delete") => Command::Delete(parse_id(pos.next())?),
        Some("compare") => {
            let ids = pos
                .by_ref()
                .map(|a| parse_id(Some(a)))
                .collect::<Result<Vec<_>>>()?;
            if ids.is_empty() {
                bail!("compare expects at least one scenario ID\n{USAGE}");
            }
            Command::Compare(ids)
        }
        Some("presets") => Command::Presets,
        Some(other) => bail!("unknown command {other}\n{USAGE}"),
    };
    if let Some(extra) = pos.next() {
        bail!("unexpected argument {extra}\n{USAGE}");
    }

    Ok(Args {
        command,
        preset,
        config,
        seed,
        json,
        db,
    })
}

/// Read a partial config from YAML, or JSON when the extension says so.
fn read_draft(path: &Path) -> Result<ConfigDraft> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let draft: ConfigDraft = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text)?,
        _ => serde_yaml::from_str(&text)?,
    };
    Ok(draft)
}

/// Defaults, then the preset, then the file's fields on top.
fn build_config(preset: Option<Preset>, file: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();
    if let Some(p) = preset {
        config = p.apply(&config)?;
    }
    if let Some(path) = file {
        config = read_draft(path)?.overlay(&config)?;
    }
    Ok(config)
}

fn print_sensitivity(out: &Outputs) {
    println!("Sensitivity: month-1 net (rows margin, cols demand)");
    print!("  {:>8}", "");
    for d in Delta::ALL {
        print!(" {:>12}", format!("{}%", d.label()));
    }
    println!();
    for m in Delta::ALL {
        print!("  {:>8}", format!("{}%", m.label()));
        for d in Delta::ALL {
            print!(" {:>12.2}", out.sensitivity.get(m, d));
        }
        println!();
    }
}

fn print_report(config: &Config, out: &Outputs) {
    println!(
        "Config | investment: {:.2} | margin: {:.1}% | demand: {:.1}% | growth: {:.1}% | seasonality: {} | seed: {}",
        config.investment, config.margin, config.demand, config.growth, config.seasonality, out.seed
    );
    let m = &out.month_one_snapshot;
    println!(
        "Month 1 | revenue: {:.2} | cogs: {:.2} | opex: {:.2} | interest+tax: {:.2} | net: {:.2}",
        m.revenue, m.cogs, m.opex, m.interest_and_tax, m.net
    );

    println!("\nKPIs");
    for (kind, value) in out.kpis.iter() {
        println!("  {:<20} {}", kind.label(), value);
    }

    println!("\nLedger");
    println!(
        "  {:>5} {:>14} {:>14} {:>14} {:>14}",
        "month", "revenue", "cost", "net", "cash"
    );
    for e in &out.ledger {
        println!(
            "  {:>5} {:>14.2} {:>14.2} {:>14.2} {:>14.2}",
            e.month_index, e.revenue, e.total_cost, e.net_profit, e.cash_balance
        );
    }

    println!();
    print_sensitivity(out);

    println!("\nInsights");
    for tip in &out.insights {
        println!("  [{:?}] {}: {}", tip.tone, tip.kind.title(), tip.message);
    }

    let join = |factors: &[sim_core::SwotFactor]| {
        factors
            .iter()
            .map(|f| f.label())
            .collect::<Vec<_>>()
            .join("; ")
    };
    println!("\nSWOT");
    println!("  Strengths:     {}", join(&out.swot.strengths));
    println!("  Weaknesses:    {}", join(&out.swot.weaknesses));
    println!("  Opportunities: {}", join(&out.swot.opportunities));
    println!("  Threats:       {}", join(&out.swot.threats));

    println!("\nAlert | {}: {}", out.alert.level, out.alert.message);
}

fn emit(config: &Config, out: &Outputs, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(out)?);
    } else {
        print_report(config, out);
    }
    Ok(())
}

async fn open_store(args: &Args) -> Result<SqlitePool> {
    let url = args
        .db
        .clone()
        .or_else(|| std::env::var("PILOT_DB_URL").ok())
        .unwrap_or_else(|| default_sqlite_url().to_string());
    persistence::init_db(&url)
        .await
        .with_context(|| format!("opening scenario store at {url}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging setup; logs go to stderr so --json output stays clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    info!(command = ?args.command, seed = args.seed, "starting CLI");

    match &args.command {
        Command::Presets => {
            for p in Preset::ALL {
                let c = p.apply(&Config::default())?;
                println!(
                    "{:<14} investment {:>10.0} | margin {:>5.1}% | demand {:>5.1}% | growth {:>4.1}% | {}",
                    p.key(),
                    c.investment,
                    c.margin,
                    c.demand,
                    c.growth,
                    c.seasonality
                );
            }
        }
        Command::Run => {
            let config = build_config(args.preset, args.config.as_deref())?;
            let out = sim_runtime::run_with_seed(&config, args.seed)?;
            emit(&config, &out, args.json)?;
        }
        Command::Save(name) => {
            let config = build_config(args.preset, args.config.as_deref())?;
            let pool = open_store(&args).await?;
            let s = persistence::save_scenario(&pool, name, &config).await?;
            println!("Saved scenario {} ({}) at {}", s.id, s.name, s.saved_at.to_rfc3339());
        }
        Command::List => {
            let pool = open_store(&args).await?;
            let scenarios = persistence::list_scenarios(&pool).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&scenarios)?);
            } else if scenarios.is_empty() {
                println!("No saved scenarios");
            } else {
                for s in &scenarios {
                    println!(
                        "{:>4}  {:<24} {}  {}",
                        s.id,
                        s.name,
                        s.saved_at.format("%Y-%m-%d %H:%M:%S"),
                        s.config.seasonality
                    );
                }
            }
        }
        Command::Load(id) => {
            let pool = open_store(&args).await?;
            let config = persistence::load_scenario(&pool, *id).await?;
            let mut session = SimulationSession::with_seed(config, args.seed)?;
            if let Some(p) = args.preset {
                session.apply_preset(p)?;
            }
            emit(session.config(), session.outputs(), args.json)?;
        }
        Command::Delete(id) => {
            let pool = open_store(&args).await?;
            persistence::delete_scenario(&pool, *id).await?;
            println!("Deleted scenario {id}");
        }
        Command::Compare(ids) => {
            let pool = open_store(&args).await?;
            let mut named = Vec::with_capacity(ids.len());
            for id in ids {
                let s = persistence::get_scenario(&pool, *id).await?;
                named.push((s.name, s.config));
            }
            let summaries = sim_runtime::compare(&named, args.seed)
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                println!(
                    "{:<24} {:>14} {:>14} {:>10} {:>14} {:>9}",
                    "scenario", "revenue", "net", "roi %", "cash floor", "alert"
                );
                for s in &summaries {
                    println!(
                        "{:<24} {:>14.2} {:>14.2} {:>10.1} {:>14.2} {:>9}",
                        s.name, s.total_revenue, s.total_net, s.roi_pct, s.cash_floor, s.alert
                    );
                }
            }
        }
    }

    Ok(())
}
