use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings, load_settings_from, DEFAULT_SETTINGS_FILE},
    validation::{ListVehicleForm, LoanApplicationForm, LoanOfferForm, RepaymentForm},
    LendingClient, StatusLevel, StatusReport,
};
use shared::domain::Vehicle;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Vehicle lending marketplace client")]
struct Args {
    /// Settings file; defaults to lending.toml in the working directory.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    ledger_url: Option<String>,
    /// Base URL of the wallet bridge that signs transactions.
    #[arg(long)]
    agent_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect the wallet and register the coin store if needed.
    Connect,
    /// One-time contract setup, signed by the contract owner.
    Initialize,
    ListVehicle {
        #[arg(long, default_value = "1")]
        vehicle_id: String,
        #[arg(long, default_value = "100")]
        price: String,
    },
    CreateLoanOffer {
        #[arg(long, default_value = "1")]
        loan_id: String,
        #[arg(long, default_value = "50")]
        amount: String,
        /// 500 is 5%.
        #[arg(long, default_value = "500")]
        rate: String,
        /// Loan duration in seconds.
        #[arg(long, default_value = "3600")]
        duration: String,
    },
    ApplyForLoan {
        #[arg(long)]
        lender: String,
        #[arg(long, default_value = "1")]
        offer_id: String,
        #[arg(long, default_value = "1")]
        vehicle_id: String,
    },
    RepayLoan {
        #[arg(long)]
        lender: String,
        #[arg(long, default_value = "10")]
        amount: String,
    },
    CheckDefault {
        #[arg(long)]
        customer: String,
    },
    /// Show the vehicle listed by a dealer account.
    Vehicles {
        #[arg(long)]
        dealer: String,
    },
}

impl Command {
    /// Signed commands pick up or open a wallet session first.
    fn needs_session(&self) -> bool {
        !matches!(self, Command::Connect | Command::Vehicles { .. })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();

    let config = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
    let mut settings = if args.config.is_some() {
        load_settings_from(&config, |name| std::env::var(name).ok())
    } else {
        load_settings()
    };
    if let Some(ledger_url) = args.ledger_url {
        settings.ledger_url = ledger_url;
    }
    if let Some(agent_url) = args.agent_url {
        settings.agent_url = Some(agent_url);
    }
    debug!(
        settings_file = %config.display(),
        ledger_url = %settings.ledger_url,
        module = %settings.module_address,
        "console: settings loaded"
    );

    let client = LendingClient::new(&settings)?;

    if args.command.needs_session() {
        let session = open_session(&client).await;
        print_report(&session);
        if session.is_failure() {
            return Ok(ExitCode::FAILURE);
        }
    }

    let report = match args.command {
        Command::Connect => client.connect().await,
        Command::Initialize => client.initialize_module().await,
        Command::ListVehicle { vehicle_id, price } => {
            client
                .list_vehicle(&ListVehicleForm { vehicle_id, price })
                .await
        }
        Command::CreateLoanOffer {
            loan_id,
            amount,
            rate,
            duration,
        } => {
            client
                .create_loan_offer(&LoanOfferForm {
                    loan_id,
                    amount,
                    rate_basis_points: rate,
                    duration_seconds: duration,
                })
                .await
        }
        Command::ApplyForLoan {
            lender,
            offer_id,
            vehicle_id,
        } => {
            client
                .apply_for_loan(&LoanApplicationForm {
                    lender,
                    offer_id,
                    vehicle_id,
                })
                .await
        }
        Command::RepayLoan { lender, amount } => {
            client.repay_loan(&RepaymentForm { lender, amount }).await
        }
        Command::CheckDefault { customer } => client.check_default(&customer).await,
        Command::Vehicles { dealer } => {
            let report = client.fetch_vehicles(&dealer).await;
            print_vehicles(&client.vehicles().await);
            report
        }
    };

    print_report(&report);
    Ok(if report.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Restores the agent's session, or connects when there is none. The returned
/// report carries any funding warning or registration hash from that step.
async fn open_session(client: &LendingClient) -> StatusReport {
    let restored = client.restore_session().await;
    if client.account().await.is_some() {
        return restored;
    }
    info!("console: no existing wallet session, connecting");
    client.connect().await
}

fn print_report(report: &StatusReport) {
    let tag = match report.level {
        StatusLevel::Info => "info",
        StatusLevel::Success => "ok",
        StatusLevel::Warning => "warn",
        StatusLevel::Failure => "error",
    };
    println!("[{tag}] {}", report.message);
    if let Some(hash) = &report.hash {
        println!("       tx {hash}");
    }
}

fn print_vehicles(vehicles: &[Vehicle]) {
    for vehicle in vehicles {
        println!(
            "vehicle {} dealer={} price={} {}",
            vehicle.id,
            vehicle.dealer.short(),
            vehicle.price,
            if vehicle.is_sold { "sold" } else { "available" }
        );
    }
}
