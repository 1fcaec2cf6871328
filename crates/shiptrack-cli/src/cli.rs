//! Command line definition.

use clap::{Args, Parser, Subcommand};
use shiptrack_core::{Config, NewShipment, ShipmentStatus, ShipmentUpdate};

#[derive(Debug, Parser)]
#[command(name = "shiptrack", version, about = "Package tracking lookup and administration")]
pub struct Cli {
    /// Store endpoint URL (overrides SHIPTRACK_BASE_URL and the config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Spreadsheet tab holding shipment rows
    #[arg(long, global = true)]
    pub tab: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Flags take precedence over environment and config file.
    pub fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.base_url {
            config.base_url = Some(url.clone());
        }
        if let Some(tab) = &self.tab {
            config.tab = Some(tab.clone());
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up a tracking number
    Track {
        tracking_id: String,
    },
    /// Drop the cache and fetch every shipment again
    Refresh,
    /// Refresh on an interval and report each run
    Watch {
        /// Print the latest status of this tracking number after each refresh
        tracking_id: Option<String>,
        /// Stop after this many refreshes
        #[arg(long)]
        ticks: Option<usize>,
        /// Poll the admin listing instead of the lookup cache
        #[arg(long)]
        admin: bool,
    },
    /// Manage shipment rows
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// List every shipment with its row number
    List,
    /// Add a shipment
    Add(AddArgs),
    /// Edit the shipment at a row
    Update(UpdateArgs),
    /// Delete the shipment at a row
    Delete {
        row: usize,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub tracking_id: String,
    #[arg(long)]
    pub from_zip: String,
    #[arg(long)]
    pub to_zip: String,
    #[arg(long, value_parser = parse_status)]
    pub status: String,
    /// Transit days (default 3)
    #[arg(long)]
    pub days: Option<u32>,
    /// Estimated delivery, ISO-8601 (default now + days)
    #[arg(long)]
    pub eta: Option<String>,
}

impl From<AddArgs> for NewShipment {
    fn from(args: AddArgs) -> Self {
        NewShipment {
            tracking_id: args.tracking_id,
            from_zip: args.from_zip,
            to_zip: args.to_zip,
            status: args.status,
            days: args.days,
            eta: args.eta,
        }
    }
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub row: usize,
    #[arg(long)]
    pub from_zip: Option<String>,
    #[arg(long)]
    pub to_zip: Option<String>,
    #[arg(long, value_parser = parse_status)]
    pub status: Option<String>,
    #[arg(long)]
    pub days: Option<u32>,
    #[arg(long)]
    pub eta: Option<String>,
}

impl UpdateArgs {
    pub fn into_update(self) -> (usize, ShipmentUpdate) {
        (
            self.row,
            ShipmentUpdate {
                from_zip: self.from_zip,
                to_zip: self.to_zip,
                status: self.status,
                days: self.days,
                eta: self.eta,
            },
        )
    }
}

/// Accept any catalog status, case-insensitively; store the canonical id.
fn parse_status(raw: &str) -> Result<String, String> {
    ShipmentStatus::parse(raw)
        .map(|s| s.id().to_string())
        .ok_or_else(|| {
            let known: Vec<&str> = ShipmentStatus::ALL.iter().map(|s| s.id()).collect();
            format!("unknown status '{}', expected one of: {}", raw, known.join(", "))
        })
}
