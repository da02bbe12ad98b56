//! covpool CLI
//!
//! Inspect pricing curves, replay fills against an in-memory pool and manage
//! the orchestrator configuration file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::{style, Term};

use covpool::prelude::*;

/// covpool CLI - declining-price auctions for coverage pools
#[derive(Parser)]
#[command(name = "covpool")]
#[command(version = covpool::VERSION)]
#[command(about = "Command-line interface for covpool auctions", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "COVPOOL_CONFIG", default_value = "covpool.json")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the share of the reserve on offer over time
    Curve {
        /// Amount desired
        #[arg(short, long)]
        amount: u64,

        /// Auction duration in seconds (defaults to the configured one)
        #[arg(short, long)]
        duration: Option<u64>,

        /// Seconds between samples
        #[arg(short, long, default_value = "3600")]
        step: u64,

        /// Last sample time (defaults to the end of the auction)
        #[arg(short, long)]
        until: Option<u64>,
    },

    /// Replay fills against an in-memory auction
    Simulate {
        /// Obligation of the simulated subject
        #[arg(short, long)]
        amount: u64,

        /// Auction duration in seconds (defaults to the configured one)
        #[arg(short, long)]
        duration: Option<u64>,

        /// Reserve balance in base units
        #[arg(short, long, default_value = "1000000")]
        reserve: u64,

        /// Fill as `<seconds>:<amount>`, repeatable
        #[arg(short, long = "fill", value_parser = parse_fill)]
        fills: Vec<(u64, u64)>,
    },

    /// Configuration file operations
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Check the configuration file
    Validate,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let term = Term::stdout();

    if let Err(e) = run_command(&cli, &term) {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn run_command(cli: &Cli, term: &Term) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Curve {
            amount,
            duration,
            step,
            until,
        } => cmd_curve(cli, *amount, *duration, *step, *until, term),
        Commands::Simulate {
            amount,
            duration,
            reserve,
            fills,
        } => cmd_simulate(cli, *amount, *duration, *reserve, fills, term),
        Commands::Config(cmd) => cmd_config(cli, cmd, term),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMMAND HANDLERS
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_curve(
    cli: &Cli,
    amount: u64,
    duration: Option<u64>,
    step: u64,
    until: Option<u64>,
    term: &Term,
) -> anyhow::Result<()> {
    anyhow::ensure!(step > 0, "step must be greater than 0");
    let config = load_config(&cli.config)?;
    let duration = duration.unwrap_or(config.auction_duration_secs);

    let mut registry = AuctionRegistry::new();
    let subject = SubjectId::from_label("curve");
    let id = registry.create_auction(
        subject,
        config.settlement_token.clone(),
        TokenAmount::from_units(amount),
        duration,
        0,
    )?;
    let auction = registry
        .auction(id)
        .context("auction missing after creation")?;

    let _ = term.write_line(&format!(
        "{} Curve for {} {} over {}s",
        style("→").cyan(),
        style(amount).green(),
        config.settlement_token,
        duration
    ));

    let end = until.unwrap_or(duration);
    let mut now = 0;
    loop {
        let percent = auction.on_offer(now);
        let _ = term.write_line(&format!(
            "  t={:>10}s  on offer {}",
            now,
            style(format_percent(percent)).yellow()
        ));
        if now >= end {
            break;
        }
        now = now.saturating_add(step).min(end);
    }
    Ok(())
}

fn cmd_simulate(
    cli: &Cli,
    amount: u64,
    duration: Option<u64>,
    reserve_balance: u64,
    fills: &[(u64, u64)],
    term: &Term,
) -> anyhow::Result<()> {
    let mut config = load_config(&cli.config)?;
    if let Some(duration) = duration {
        config.auction_duration_secs = duration;
    }

    let mut orchestrator = LiquidationOrchestrator::new(config)?;
    let mut registry = orchestrator.new_registry();
    let mut reserve = InMemoryReserve::new(reserve_balance);
    let mut escrow = ProceedsEscrow::new();
    let mut subject = StubSubject::new("simulated", 100, TokenAmount::from_units(amount))
        .with_bonded(CollateralAmount::from_units(amount));

    let decision = orchestrator.notify_liquidation(&mut registry, &mut subject, &mut escrow, 0)?;
    let LiquidationDecision::AuctionOpened(id) = decision else {
        anyhow::bail!("subject was bought out without an auction");
    };
    let _ = term.write_line(&format!(
        "{} Opened {} for {}",
        style("✓").green(),
        style(id).yellow(),
        amount
    ));

    for (index, &(at, payment)) in fills.iter().enumerate() {
        let bidder = AccountId::from_label(&format!("bidder-{}", index));
        let order = OfferOrder::new(id, bidder, TokenAmount::from_units(payment));

        match orchestrator.take_offer(&mut registry, &order, &mut subject, &mut escrow, &mut reserve, at) {
            Ok(fill) => {
                let _ = term.write_line(&format!(
                    "  t={:>10}s  paid {:>12}  on offer {}  received {} ({} units)",
                    at,
                    payment,
                    format_percent(fill.percent_on_offer),
                    style(format_percent(fill.reserve_fraction)).green(),
                    reserve.seized_by(&bidder)
                ));
                if cli.verbose {
                    if let Some(auction) = registry.auction(id) {
                        let curve = auction.curve();
                        let _ = term.write_line(&format!(
                            "                 reference start {}s  velocity {}",
                            curve.reference_start_time(),
                            format_ratio(curve.velocity())
                        ));
                    }
                }
            }
            Err(e) => {
                let _ = term.write_line(&format!(
                    "  t={:>10}s  {} {}",
                    at,
                    style("rejected:").red(),
                    e
                ));
            }
        }
    }

    let status = orchestrator.status(&subject.id());
    let _ = term.write_line(&format!("\n{} Subject status: {:?}", style("ℹ").blue(), status));
    let _ = term.write_line(&format!("  Reserve left: {}", style(reserve.balance()).cyan()));
    let _ = term.write_line(&format!("  Proceeds routed: {}", style(escrow.total()).cyan()));
    Ok(())
}

fn cmd_config(cli: &Cli, cmd: &ConfigCommands, term: &Term) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Init { force } => {
            if cli.config.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    cli.config.display()
                );
            }
            OrchestratorConfig::default().save(&cli.config)?;
            let _ = term.write_line(&format!(
                "{} Wrote {}",
                style("✓").green(),
                cli.config.display()
            ));
        }
        ConfigCommands::Show => {
            let config = load_config(&cli.config)?;
            let _ = term.write_line(&serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Validate => {
            let config = OrchestratorConfig::load(&cli.config)
                .with_context(|| format!("loading {}", cli.config.display()))?;
            config.with_env_overrides()?.validate()?;
            let _ = term.write_line(&format!("{} Configuration is valid", style("✓").green()));
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// File if present, defaults otherwise, then environment overrides
fn load_config(path: &Path) -> anyhow::Result<OrchestratorConfig> {
    let config = if path.exists() {
        OrchestratorConfig::load(path).with_context(|| format!("loading {}", path.display()))?
    } else {
        OrchestratorConfig::default()
    };
    let config = config.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

fn parse_fill(s: &str) -> std::result::Result<(u64, u64), String> {
    let (at, amount) = s
        .split_once(':')
        .ok_or_else(|| format!("expected <seconds>:<amount>, got '{}'", s))?;
    let at = at.trim().parse().map_err(|e| format!("bad time '{}': {}", at, e))?;
    let amount = amount
        .trim()
        .parse()
        .map_err(|e| format!("bad amount '{}': {}", amount, e))?;
    Ok((at, amount))
}

fn format_percent(ratio: Ratio) -> String {
    match ratio.to_decimal() {
        Some(value) => format!("{:.4}%", value * rust_decimal::Decimal::ONE_HUNDRED),
        None => ratio.to_string(),
    }
}

fn format_ratio(ratio: Ratio) -> String {
    match ratio.to_decimal() {
        Some(value) => format!("{:.6}", value),
        None => ratio.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fill() {
        assert_eq!(parse_fill("3600:500"), Ok((3_600, 500)));
        assert_eq!(parse_fill(" 0 : 1 "), Ok((0, 1)));
        assert!(parse_fill("3600").unwrap_err().contains("<seconds>:<amount>"));
        assert!(parse_fill("soon:500").unwrap_err().contains("bad time"));
        assert!(parse_fill("3600:-1").unwrap_err().contains("bad amount"));
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(Ratio::ONE), "100.0000%");
        assert_eq!(format_percent(Ratio::new(1, 4).unwrap()), "25.0000%");
        assert_eq!(format_ratio(Ratio::new(1, 2).unwrap()), "0.500000");
    }

    #[test]
    fn test_cli_parses_repeated_fills() {
        let cli = Cli::try_parse_from([
            "covpool", "simulate", "--amount", "1000", "--fill", "3600:400", "--fill", "7200:600",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate { amount, fills, .. } => {
                assert_eq!(amount, 1_000);
                assert_eq!(fills, vec![(3_600, 400), (7_200, 600)]);
            }
            _ => panic!("expected simulate"),
        }
        assert!(Cli::try_parse_from(["covpool", "simulate", "--amount", "1", "--fill", "x"]).is_err());
    }
}
