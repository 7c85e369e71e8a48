//! Command execution.

use crate::cli::{
    Cli, Command, CreateReservationArgs, LoginArgs, RegisterArgs, ReservationsCommand,
    ResourceArgs, ResourceTypeArgs, ResourcesCommand, TypesCommand,
};
use crate::output;
use anyhow::{anyhow, Context};
use chrono::Local;
use reserva_client::config::ClientConfig;
use reserva_client::errors::ClientError;
use reserva_client::format::{add_days, end_of_day, start_of_day};
use reserva_client::models::{
    LoginRequest, RegisterRequest, ResourceFilters, ResourceRequest, ResourceTypeRequest,
};
use reserva_client::token_store::FileCredentialStore;
use reserva_client::validation::{
    validate_email, validate_password, validate_required, ReservationDraft,
};
use reserva_client::ReservaClient;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Resolve configuration, restore the session and run `cli.command`.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    debug!(
        target: "reserva.cli",
        api_url = %config.api_url,
        credentials = %config.credentials_path.display(),
        "Configuration loaded"
    );

    let store = Arc::new(FileCredentialStore::new(&config.credentials_path));
    let client = ReservaClient::new(&config, store)?;

    // A corrupt credentials file leaves the session signed out; login overwrites it
    if let Err(e) = client.bootstrap().await {
        warn!(target: "reserva.cli", error = %e, "Could not restore stored session");
    }

    match cli.command {
        Command::Register(args) => register(&client, args).await,
        Command::Login(args) => login(&client, args).await,
        Command::Logout => logout(&client).await,
        Command::Whoami => {
            println!("{}", output::session(&client.state()));
            Ok(())
        }
        Command::Resources(command) => {
            require_session(&client)?;
            resources(&client, command).await
        }
        Command::Types(command) => {
            require_session(&client)?;
            types(&client, command).await
        }
        Command::Reservations(command) => {
            require_session(&client)?;
            reservations(&client, command).await
        }
        Command::Watch { interval } => {
            require_session(&client)?;
            watch(&client, Duration::from_secs(interval)).await
        }
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("Invalid environment configuration")?;
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_url(api_url)?;
    }
    if let Some(path) = &cli.credentials {
        config = config.with_credentials_path(path);
    }
    Ok(config)
}

fn require_session(client: &ReservaClient) -> anyhow::Result<()> {
    if client.state().is_authenticated() {
        Ok(())
    } else {
        Err(anyhow!("Not signed in. Run `reserva login` first"))
    }
}

// =============================================================================
// Auth
// =============================================================================

async fn register(client: &ReservaClient, args: RegisterArgs) -> anyhow::Result<()> {
    validate_email(&args.email)?;
    validate_password(&args.password)?;
    validate_required(&args.first_name, "First name")?;
    validate_required(&args.last_name, "Last name")?;

    let auth = client
        .auth()
        .register(&RegisterRequest {
            email: args.email.trim().to_string(),
            password: args.password,
            first_name: args.first_name.trim().to_string(),
            last_name: args.last_name.trim().to_string(),
        })
        .await?;

    println!("Registered and signed in as {}", auth.email);
    Ok(())
}

async fn login(client: &ReservaClient, args: LoginArgs) -> anyhow::Result<()> {
    validate_email(&args.email)?;
    validate_password(&args.password)?;

    client
        .auth()
        .login(&LoginRequest {
            email: args.email.trim().to_string(),
            password: args.password,
        })
        .await?;

    println!("{}", output::session(&client.state()));
    Ok(())
}

async fn logout(client: &ReservaClient) -> anyhow::Result<()> {
    if !client.state().is_authenticated() {
        println!("Not signed in");
        return Ok(());
    }

    match client.auth().logout().await {
        Ok(()) => println!("Signed out"),
        Err(e) => {
            warn!(target: "reserva.cli", error = %e, "Backend logout failed");
            println!("Signed out locally ({})", e.user_message());
        }
    }
    Ok(())
}

// =============================================================================
// Resources
// =============================================================================

fn resource_request(args: ResourceArgs) -> anyhow::Result<ResourceRequest> {
    validate_required(&args.name, "Name")?;
    Ok(ResourceRequest {
        name: args.name.trim().to_string(),
        description: args.description,
        resource_type_id: args.type_id,
        location: args.location,
    })
}

async fn resources(client: &ReservaClient, command: ResourcesCommand) -> anyhow::Result<()> {
    let service = client.resources();
    match command {
        ResourcesCommand::List { active, type_id } => {
            let found = service.list(&ResourceFilters { active, type_id }).await?;
            println!("{}", output::resources(&found));
        }
        ResourcesCommand::Show { id } => {
            println!("{}", output::resource(&service.get(id).await?));
        }
        ResourcesCommand::Create(args) => {
            let created = service.create(&resource_request(args)?).await?;
            println!("Created\n{}", output::resource(&created));
        }
        ResourcesCommand::Update { id, resource } => {
            let updated = service.update(id, &resource_request(resource)?).await?;
            println!("Updated\n{}", output::resource(&updated));
        }
        ResourcesCommand::Delete { id } => {
            service.delete(id).await?;
            println!("Deleted resource {id}");
        }
    }
    Ok(())
}

// =============================================================================
// Resource types
// =============================================================================

fn resource_type_request(args: ResourceTypeArgs) -> anyhow::Result<ResourceTypeRequest> {
    validate_required(&args.name, "Name")?;
    Ok(ResourceTypeRequest {
        name: args.name.trim().to_uppercase(),
        description: args.description,
    })
}

async fn types(client: &ReservaClient, command: TypesCommand) -> anyhow::Result<()> {
    let service = client.resource_types();
    match command {
        TypesCommand::List => {
            println!("{}", output::resource_types(&service.list().await?));
        }
        TypesCommand::Show { id } => {
            println!("{}", output::resource_type(&service.get(id).await?));
        }
        TypesCommand::Create(args) => {
            let created = service.create(&resource_type_request(args)?).await?;
            println!("Created\n{}", output::resource_type(&created));
        }
        TypesCommand::Update { id, resource_type } => {
            let updated = service
                .update(id, &resource_type_request(resource_type)?)
                .await?;
            println!("Updated\n{}", output::resource_type(&updated));
        }
        TypesCommand::Delete { id } => {
            service.delete(id).await?;
            println!("Deleted resource type {id}");
        }
    }
    Ok(())
}

// =============================================================================
// Reservations
// =============================================================================

fn reservation_draft(args: CreateReservationArgs) -> ReservationDraft {
    ReservationDraft {
        resource_id: Some(args.resource),
        start_date: Some(args.date),
        start_time: Some(args.start),
        end_date: args.end_date,
        end_time: Some(args.end),
        notes: args.notes,
    }
}

async fn reservations(client: &ReservaClient, command: ReservationsCommand) -> anyhow::Result<()> {
    let service = client.reservations();
    match command {
        ReservationsCommand::Create(args) => {
            let request = reservation_draft(args)
                .into_request()
                .map_err(|errors| anyhow!(errors.messages().join("; ")))?;
            let created = service.create(&request).await?;
            println!("Booked\n{}", output::reservation(&created));
        }
        ReservationsCommand::Show { id } => {
            println!("{}", output::reservation(&service.get(id).await?));
        }
        ReservationsCommand::Cancel { id } => {
            let cancelled = service.cancel(id).await?;
            println!("Cancelled\n{}", output::reservation(&cancelled));
        }
        ReservationsCommand::Mine => {
            println!("{}", output::reservations(&service.my_active().await?));
        }
        ReservationsCommand::History => {
            println!("{}", output::reservations(&service.my_history().await?));
        }
        ReservationsCommand::Active => {
            println!("{}", output::reservations(&service.active().await?));
        }
        ReservationsCommand::ResourceHistory { id } => {
            println!("{}", output::reservations(&service.resource_history(id).await?));
        }
        ReservationsCommand::Availability { id, date, days } => {
            let first = date.unwrap_or_else(|| Local::now().date_naive());
            let start = start_of_day(first);
            let end = add_days(end_of_day(first), i64::from(days) - 1)
                .ok_or_else(|| anyhow!("Date range out of bounds"))?;

            let slots = service.resource_availability(id, start, end).await?;
            println!("{}", output::availability(&slots));
        }
    }
    Ok(())
}

// =============================================================================
// Watch
// =============================================================================

/// List active reservations every `interval` until Ctrl-C or sign-out,
/// refreshing the session proactively in the background.
async fn watch(client: &ReservaClient, interval: Duration) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let scheduler = client.spawn_refresh_scheduler(cancel.clone());
    let mut session = client.subscribe();
    let mut ticker = tokio::time::interval(interval);

    info!(target: "reserva.cli", interval_secs = interval.as_secs(), "Watching reservations");

    let result = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(target: "reserva.cli", error = %e, "Failed to listen for Ctrl-C");
                }
                break Ok(());
            }
            changed = session.changed() => {
                if changed.is_err() || !session.state().is_authenticated() {
                    break Err(anyhow!("Session ended. Please log in again"));
                }
            }
            _ = ticker.tick() => {
                match client.reservations().my_active().await {
                    Ok(found) => {
                        println!("{}\n", output::reservations(&found));
                    }
                    Err(e @ ClientError::SessionExpired(_)) => break Err(e.into()),
                    Err(e) => {
                        warn!(target: "reserva.cli", error = %e, "Listing failed, will retry");
                    }
                }
            }
        }
    };

    cancel.cancel();
    if let Err(e) = scheduler.await {
        warn!(target: "reserva.cli", error = %e, "Refresh scheduler task failed");
    }
    result
}
