use clap::{Parser, Subcommand};
use reqwest::Client;
use std::error::Error;

mod actions;
mod doctor;
mod http;
mod insights;
mod members;

use actions::ActionArg;
use members::NewMember;

#[derive(clap::Parser, Debug)]
#[clap(version, about = "Caregiver client for the Health Guardian daemon")]
struct Args {
    /// Base URL of the guardiand service
    #[clap(long, default_value = "http://127.0.0.1:3000")]
    url: String,

    /// Disable colorized output
    #[clap(long)]
    no_color: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// List family members with their live vitals
    Members,
    /// Show one member, including any active alert
    Show {
        /// Member ID
        id: String,
    },
    /// Add a family member, pairing a wearable first if no device is given
    Add {
        #[clap(long)]
        name: String,
        #[clap(long)]
        age: u32,
        /// e.g. Mother, Father, Grandparent
        #[clap(long)]
        relationship: String,
        /// Medical conditions, medications, allergies
        #[clap(long)]
        history: String,
        /// Already paired device ID
        #[clap(long)]
        device: Option<String>,
    },
    /// Ask for AI health insights on a member
    Insights {
        /// Member ID
        id: String,
    },
    /// Respond to a member's alert
    Act {
        /// Member ID
        id: String,
        #[clap(value_enum)]
        action: ActionArg,
    },
    /// List recent alert responses
    Actions {
        #[clap(long, default_value_t = 20)]
        limit: usize,
    },
    /// Check daemon health and connectivity
    Doctor,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(args).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let client = Client::new();
    let url = args.url.trim_end_matches('/');

    match args.command {
        Command::Members => members::run_members(&client, url).await,
        Command::Show { id } => members::run_show(&client, url, &id).await,
        Command::Add {
            name,
            age,
            relationship,
            history,
            device,
        } => {
            let new = NewMember {
                name,
                age,
                relationship,
                health_history: history,
                device_id: device,
            };
            members::run_add(&client, url, new).await
        }
        Command::Insights { id } => insights::run_insights(&client, url, &id).await,
        Command::Act { id, action } => actions::run_act(&client, url, &id, action).await,
        Command::Actions { limit } => actions::run_actions(&client, url, limit).await,
        Command::Doctor => doctor::run_doctor(url).await,
    }
}
