use chrono::Duration;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use ttk_faucet::ids::abbreviate;
use ttk_faucet::{FaucetSnapshot, TxStatus};

/// Faucet simulator CLI
#[derive(Parser, Debug)]
#[command(name = "faucet", author, version, about = "TTK testnet faucet simulator", long_about = None)]
pub struct Args {
    /// Config file path (TOML, YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seed the demonstration balances on connect
    #[arg(long)]
    pub demo: bool,

    /// Freeze time; use `advance <hours>` to move it
    #[arg(long)]
    pub manual_clock: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Connect,
    Disconnect,
    Claim,
    Status { json: bool },
    History,
    Advance { by: Duration },
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or_else(|| "empty command".to_string())?;
        let arg = words.next();
        if words.next().is_some() {
            return Err(format!("too many arguments for `{}`", name));
        }

        let command = match (name.to_lowercase().as_str(), arg) {
            ("connect", None) => Command::Connect,
            ("disconnect", None) => Command::Disconnect,
            ("claim", None) => Command::Claim,
            ("status", None) => Command::Status { json: false },
            ("status", Some("--json")) => Command::Status { json: true },
            ("history", None) => Command::History,
            ("advance", Some(hours)) => Command::Advance {
                by: parse_hours(hours)?,
            },
            ("advance", None) => return Err("usage: advance <hours>".to_string()),
            ("help" | "?", None) => Command::Help,
            ("quit" | "exit", None) => Command::Quit,
            (other, _) => return Err(format!("unknown command `{}`, try `help`", other)),
        };
        Ok(command)
    }
}

fn parse_hours(hours: &str) -> Result<Duration, String> {
    let whole: i64 = hours
        .parse()
        .map_err(|_| format!("`{}` is not a whole number of hours", hours))?;
    if whole < 0 {
        return Err("the clock only moves forward".to_string());
    }
    Duration::try_hours(whole).ok_or_else(|| format!("{} hours is too far ahead", whole))
}

pub const HELP: &str = "\
commands:
  connect          connect the mock wallet
  disconnect       disconnect and reset session balances
  claim            claim tokens (once per cooldown)
  status [--json]  show balances and cooldown
  history          list claim transactions, newest first
  advance <hours>  move the manual clock forward
  help             show this message
  quit             exit";

pub fn render_status(snapshot: &FaucetSnapshot) -> String {
    let wallet = match &snapshot.address {
        Some(address) => format!("connected to {}", abbreviate(address, 6, 4)),
        None => "not connected".to_string(),
    };
    let next_claim = if snapshot.claim_in_progress {
        "processing transaction...".to_string()
    } else if snapshot.hours_until_next_claim > 0 {
        format!("{}h", snapshot.hours_until_next_claim)
    } else {
        "available".to_string()
    };

    format!(
        "wallet:         {}\n\
         your balance:   {} TTK\n\
         faucet balance: {} TTK\n\
         total claimed:  {} TTK\n\
         next claim:     {}",
        wallet, snapshot.user_balance, snapshot.faucet_reserve, snapshot.total_claimed, next_claim
    )
}

pub fn render_history(snapshot: &FaucetSnapshot) -> String {
    if snapshot.transaction_log.is_empty() {
        return "no transactions yet".to_string();
    }

    snapshot
        .transaction_log
        .iter()
        .map(|tx| {
            let marker = match tx.status {
                TxStatus::Success => "✓",
                TxStatus::Pending => "…",
                TxStatus::Failed => "✗",
            };
            format!(
                "{} #{:<4} +{} TTK  {}  {}  {}",
                marker,
                tx.id,
                tx.amount,
                tx.timestamp.format("%Y-%m-%d %H:%M:%S"),
                tx.short_reference(),
                tx.status
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
