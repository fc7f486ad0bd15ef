//! CLI commands and handlers

use clap::{Parser, Subcommand};
use tracing::info;

use super::services::RouterService;
use crate::domain::execution::{min_amount_out, SwapRequest};
use crate::infrastructure::InMemoryPoolService;
use crate::report::{SimulationReport, SwapReport};
use crate::shared::config::EngineConfig;
use crate::shared::errors::AppError;
use crate::shared::types::{Address, DEFAULT_HOP_FEE_BPS, MAX_SLIPPAGE};
use crate::shared::utils::{format_address, parse_address, parse_address_list, parse_amount, parse_fee_list};

#[derive(Parser)]
#[command(name = "bofh-router")]
#[command(version, about = "Cyclic multi-hop swap router for constant-product pools")]
pub struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show base asset, risk parameters, MEV settings and pause state
    Info,

    /// Evaluate a path without touching any pool
    Simulate {
        /// Comma-separated asset addresses, base asset first and last
        #[arg(short, long)]
        path: String,

        /// Comma-separated per-hop fees in bps (default 30 each)
        #[arg(short, long)]
        fees: Option<String>,

        /// Input amount in base units
        #[arg(short, long)]
        amount: String,

        /// Extra candidate amounts; the best-scoring one is reported
        #[arg(long)]
        candidates: Option<String>,
    },

    /// Execute a swap against the configured pools
    Swap {
        #[arg(short, long)]
        path: String,

        #[arg(short, long)]
        fees: Option<String>,

        #[arg(short, long)]
        amount: String,

        /// Minimum acceptable output (default: expected output less 1%)
        #[arg(long)]
        min_out: Option<String>,

        /// Seconds from now after which the swap may no longer apply
        #[arg(long, default_value_t = 300)]
        deadline_secs: u64,

        /// Caller address (default: configured owner)
        #[arg(long)]
        caller: Option<String>,
    },

    /// Golden-ratio distribution of an amount across legs
    Split {
        #[arg(short, long)]
        total: String,

        #[arg(short, long, default_value_t = 3)]
        legs: usize,
    },
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(command: Commands, config: EngineConfig) -> Result<(), AppError> {
        let service = RouterService::from_config(&config)?;
        match command {
            Commands::Info => Self::execute_info_command(&service).await,
            Commands::Simulate {
                path,
                fees,
                amount,
                candidates,
            } => Self::execute_simulate_command(&service, &path, fees.as_deref(), &amount, candidates.as_deref()).await,
            Commands::Swap {
                path,
                fees,
                amount,
                min_out,
                deadline_secs,
                caller,
            } => {
                let caller = match caller {
                    Some(raw) => parse_address(&raw)?,
                    None => config.engine.owner,
                };
                Self::execute_swap_command(&service, caller, &path, fees.as_deref(), &amount, min_out.as_deref(), deadline_secs).await
            }
            Commands::Split { total, legs } => Self::execute_split_command(&service, &total, legs),
        }
    }

    async fn execute_info_command(service: &RouterService<InMemoryPoolService>) -> Result<(), AppError> {
        let status = service.status().await;
        let pools = service
            .with_orchestrator(|o| o.pools().pool_addresses())
            .await;
        info!("📊 Router status ({} pools)", pools.len());
        println!("{}", serde_json::to_string_pretty(&status)?);
        for pool in pools {
            println!("  pool {}", format_address(&pool));
        }
        Ok(())
    }

    async fn execute_simulate_command(
        service: &RouterService<InMemoryPoolService>,
        path: &str,
        fees: Option<&str>,
        amount: &str,
        candidates: Option<&str>,
    ) -> Result<(), AppError> {
        let path = parse_address_list(path)?;
        let amount_in = parse_amount(amount)?;

        let metrics = match candidates {
            Some(raw) => {
                let mut amounts = vec![amount_in];
                for candidate in raw.split(',').filter(|s| !s.trim().is_empty()) {
                    amounts.push(parse_amount(candidate.trim())?);
                }
                info!("🔍 Evaluating {} candidate amounts", amounts.len());
                service.get_optimal_path_metrics(&path, &amounts).await?
            }
            None => {
                let fees = hop_fees(fees, &path)?;
                service.simulate_path(&path, &fees, amount_in).await?
            }
        };

        let suggested = min_amount_out(metrics.expected_output, MAX_SLIPPAGE)?;
        let report = SimulationReport::from_metrics(&path, metrics, suggested);
        println!("{}", report.to_json()?);
        Ok(())
    }

    async fn execute_swap_command(
        service: &RouterService<InMemoryPoolService>,
        caller: Address,
        path: &str,
        fees: Option<&str>,
        amount: &str,
        min_out: Option<&str>,
        deadline_secs: u64,
    ) -> Result<(), AppError> {
        let path = parse_address_list(path)?;
        let fees = hop_fees(fees, &path)?;
        let amount_in = parse_amount(amount)?;

        // CLI value first, then the simulated output less the default slippage
        let floor = match min_out {
            Some(raw) => parse_amount(raw)?,
            None => {
                let metrics = service.simulate_path(&path, &fees, amount_in).await?;
                min_amount_out(metrics.expected_output, MAX_SLIPPAGE)?
            }
        };

        let ctx = service.context(caller);
        let request = SwapRequest {
            path: path.clone(),
            fees,
            amount_in,
            min_amount_out: floor,
            deadline: ctx.timestamp.saturating_add(deadline_secs),
        };

        info!("🚀 Executing swap of {} over {} hops", amount_in, request.hop_count());
        let outcome = service.execute_swap_at(&ctx, request).await?;
        let events = service.take_events().await;
        let report = SwapReport::from_outcome(&caller, &path, floor, outcome, events);
        info!("✅ Swap completed: {} -> {}", report.amount_in, report.amount_out);
        println!("{}", report.to_json()?);
        Ok(())
    }

    fn execute_split_command(
        service: &RouterService<InMemoryPoolService>,
        total: &str,
        legs: usize,
    ) -> Result<(), AppError> {
        let total = parse_amount(total)?;
        let shares = service.split_amount(total, legs)?;
        let shares: Vec<String> = shares.iter().map(|s| s.to_string()).collect();
        println!("{}", serde_json::to_string_pretty(&shares)?);
        Ok(())
    }
}

/// Fees from the CLI, or the standard fee on every hop
fn hop_fees(raw: Option<&str>, path: &[Address]) -> Result<Vec<u32>, AppError> {
    match raw {
        Some(raw) => parse_fee_list(raw),
        None => Ok(vec![DEFAULT_HOP_FEE_BPS; path.len().saturating_sub(1)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_swap() {
        let cli = Cli::parse_from([
            "bofh-router",
            "--config",
            "router.toml",
            "swap",
            "--path",
            "0x01,0x02,0x01",
            "--amount",
            "100",
            "--min-out",
            "90",
        ]);
        assert_eq!(cli.config.as_deref(), Some("router.toml"));
        match cli.command {
            Commands::Swap {
                amount,
                min_out,
                deadline_secs,
                ..
            } => {
                assert_eq!(amount, "100");
                assert_eq!(min_out.as_deref(), Some("90"));
                assert_eq!(deadline_secs, 300);
            }
            _ => panic!("expected swap command"),
        }
    }

    #[test]
    fn test_default_hop_fees() {
        let path = vec![Address::from_low_u64_be(1); 4];
        assert_eq!(hop_fees(None, &path).unwrap(), vec![30, 30, 30]);
        assert_eq!(hop_fees(Some("5,10"), &path).unwrap(), vec![5, 10]);
    }
}
