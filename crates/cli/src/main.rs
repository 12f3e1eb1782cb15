use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use ecode_core::{
    lifecycle, CodeManager, CodeRecord, CodeStatus, CodeUpdate, Field, LifecycleConfig, NewCode,
    DEFAULT_EXPIRY_HOURS,
};

#[derive(Parser, Debug)]
#[command(name = "ecode")]
#[command(about = "Issue, inspect and redeem exchange codes against the record store")]
struct Args {
    /// Record document URL
    #[arg(long, env = "STORE_ENDPOINT")]
    endpoint: String,

    #[arg(long, env = "STORE_CREDENTIAL", hide_env_values = true)]
    credential: String,

    /// Lifetime of generated codes without --expires-at
    #[arg(long, env = "CODE_EXPIRY_HOURS", default_value_t = DEFAULT_EXPIRY_HOURS)]
    expiry_hours: i64,

    /// Print raw JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Issue a new code
    Generate {
        #[arg(long)]
        crypto: String,
        #[arg(long)]
        usd: f64,
        #[arg(long)]
        amount: f64,
        /// RFC 3339 instant, e.g. 2030-01-01T00:00:00Z
        #[arg(long)]
        expires_at: Option<DateTime<Utc>>,
    },
    /// Validate a code without consuming it
    Check { code: String },
    /// Consume a code
    Redeem { code: String },
    /// Show every issued code
    List,
    /// Overwrite fields of an issued code
    Update {
        code: String,
        #[arg(long)]
        crypto: Option<String>,
        #[arg(long)]
        usd: Option<f64>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        expires_at: Option<DateTime<Utc>>,
    },
    /// Invalidate a code
    Revoke { code: String },
}

fn status_label(record: &CodeRecord, now: DateTime<Utc>) -> colored::ColoredString {
    match lifecycle::status(record, now) {
        CodeStatus::Active => "ACTIVE  ".green(),
        CodeStatus::Expired => "EXPIRED ".yellow(),
        CodeStatus::Redeemed => "REDEEMED".blue(),
        CodeStatus::Revoked => "REVOKED ".red(),
    }
}

fn print_record(record: &CodeRecord, now: DateTime<Utc>) {
    println!(
        "{} {} | {} {} | ${:.2} | expires {}",
        record.code.bold(),
        status_label(record, now),
        record.amount,
        record.crypto,
        record.usd,
        record.expires_at.format("%Y-%m-%d %H:%M"),
    );
    if let Some(at) = record.redeemed_at {
        println!("    redeemed {}", at.format("%Y-%m-%d %H:%M:%S"));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = LifecycleConfig::new(&args.endpoint, &args.credential)
        .with_default_expiry_hours(args.expiry_hours);
    let manager = CodeManager::connect(config)?;
    let now = Utc::now();

    match args.command {
        Command::Generate {
            crypto,
            usd,
            amount,
            expires_at,
        } => {
            let code = manager
                .generate(NewCode {
                    crypto: Field::Given(crypto),
                    usd: Field::Given(usd),
                    amount: Field::Given(amount),
                    expires_at: expires_at.into(),
                })
                .await?;
            if args.json {
                println!("{}", serde_json::json!({ "success": true, "code": code }));
            } else {
                println!("{} {}", "Issued".green(), code.bold());
            }
        }
        Command::Check { code } => {
            let summary = manager.check(&code).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "{} {} | {} {} | ${:.2} | expires {}",
                    "Valid".green(),
                    summary.code.bold(),
                    summary.amount,
                    summary.crypto,
                    summary.usd,
                    summary.expires_at.format("%Y-%m-%d %H:%M"),
                );
            }
        }
        Command::Redeem { code } => {
            let receipt = manager.redeem(&code).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&receipt)?);
            } else {
                println!("{}", "Redeemed".green());
                print_record(&receipt, now);
            }
        }
        Command::List => {
            let records = manager.list().await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No codes issued");
            } else {
                for record in &records {
                    print_record(record, now);
                }
                println!("\n{} code(s)", records.len());
            }
        }
        Command::Update {
            code,
            crypto,
            usd,
            amount,
            expires_at,
        } => {
            let changes = CodeUpdate {
                crypto: crypto.into(),
                usd: usd.into(),
                amount: amount.into(),
                expires_at: expires_at.into(),
            };
            manager.update(&code, changes).await?;
            println!("{} {}", "Updated".green(), code);
        }
        Command::Revoke { code } => {
            manager.revoke(&code).await?;
            println!("{} {}", "Revoked".red(), code);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parses_update_with_partial_fields() {
        let args = Args::try_parse_from([
            "ecode",
            "--endpoint",
            "http://store",
            "--credential",
            "key",
            "update",
            "AAAA-BBBB-CCCC-DDDD",
            "--usd",
            "150",
        ])
        .unwrap();

        match args.command {
            Command::Update {
                code,
                crypto,
                usd,
                amount,
                expires_at,
            } => {
                assert_eq!(code, "AAAA-BBBB-CCCC-DDDD");
                assert_eq!(usd, Some(150.0));
                assert!(crypto.is_none() && amount.is_none() && expires_at.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parses_generate_expiry() {
        let args = Args::try_parse_from([
            "ecode",
            "--endpoint",
            "http://store",
            "--credential",
            "key",
            "generate",
            "--crypto",
            "BTC",
            "--usd",
            "100",
            "--amount",
            "0.002",
            "--expires-at",
            "2030-01-01T00:00:00Z",
        ])
        .unwrap();

        match args.command {
            Command::Generate { expires_at, .. } => {
                assert_eq!(expires_at.unwrap().to_rfc3339(), "2030-01-01T00:00:00+00:00");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
