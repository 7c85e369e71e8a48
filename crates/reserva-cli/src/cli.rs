//! Command-line definitions.

use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use common::types::{ReservationId, ResourceId, ResourceTypeId};
use std::path::PathBuf;

/// Reserva resource-reservation client
#[derive(Parser, Debug)]
#[command(name = "reserva")]
#[command(about = "Book rooms, equipment and vehicles from the command line")]
#[command(version)]
pub struct Cli {
    /// Backend base URL (overrides RESERVA_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Credentials file (overrides RESERVA_CREDENTIALS_PATH)
    #[arg(long, global = true)]
    pub credentials: Option<PathBuf>,

    /// Log filter directive, e.g. `reserva=debug`
    #[arg(long = "log", env = "RESERVA_LOG", global = true)]
    pub log: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account and sign in
    Register(RegisterArgs),
    /// Sign in
    Login(LoginArgs),
    /// Sign out and forget stored credentials
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Browse and manage resources
    #[command(subcommand)]
    Resources(ResourcesCommand),
    /// Browse and manage resource types
    #[command(subcommand)]
    Types(TypesCommand),
    /// Book, inspect and cancel reservations
    #[command(subcommand)]
    Reservations(ReservationsCommand),
    /// Keep the session alive and print your active reservations periodically
    Watch {
        /// Seconds between listings
        #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "RESERVA_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "RESERVA_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,
}

#[derive(Subcommand, Debug)]
pub enum ResourcesCommand {
    /// List resources
    List {
        /// Only active (`true`) or inactive (`false`) resources
        #[arg(long)]
        active: Option<bool>,
        /// Only resources of this type
        #[arg(long)]
        type_id: Option<ResourceTypeId>,
    },
    /// Show one resource
    Show { id: ResourceId },
    /// Create a resource (admin)
    Create(ResourceArgs),
    /// Replace a resource (admin)
    Update {
        id: ResourceId,
        #[command(flatten)]
        resource: ResourceArgs,
    },
    /// Delete a resource (admin)
    Delete { id: ResourceId },
}

#[derive(Args, Debug)]
pub struct ResourceArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub type_id: ResourceTypeId,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub location: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum TypesCommand {
    /// List resource types
    List,
    /// Show one resource type
    Show { id: ResourceTypeId },
    /// Create a resource type (admin)
    Create(ResourceTypeArgs),
    /// Replace a resource type (admin)
    Update {
        id: ResourceTypeId,
        #[command(flatten)]
        resource_type: ResourceTypeArgs,
    },
    /// Delete a resource type (admin)
    Delete { id: ResourceTypeId },
}

#[derive(Args, Debug)]
pub struct ResourceTypeArgs {
    /// SNAKE_CASE name, e.g. `CONFERENCE_ROOM`
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ReservationsCommand {
    /// Book a resource
    Create(CreateReservationArgs),
    /// Show one reservation
    Show { id: ReservationId },
    /// Cancel a reservation
    Cancel { id: ReservationId },
    /// Your active reservations
    Mine,
    /// Your reservations, cancelled included
    History,
    /// All active reservations (admin)
    Active,
    /// Every reservation of a resource
    ResourceHistory { id: ResourceId },
    /// Booked and free slots of a resource
    Availability {
        id: ResourceId,
        /// First day (YYYY-MM-DD), today when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Number of days to cover
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=31))]
        days: u32,
    },
}

#[derive(Args, Debug)]
pub struct CreateReservationArgs {
    #[arg(long)]
    pub resource: ResourceId,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// Start time (HH:MM)
    #[arg(long, value_parser = parse_clock_time)]
    pub start: NaiveTime,

    /// End time (HH:MM)
    #[arg(long, value_parser = parse_clock_time)]
    pub end: NaiveTime,

    /// End date for multi-day bookings, defaults to --date
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    #[arg(long, default_value = "")]
    pub notes: String,
}

/// `HH:MM` or `HH:MM:SS`.
fn parse_clock_time(value: &str) -> Result<NaiveTime, String> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| format!("expected HH:MM, got '{value}'"))
}
