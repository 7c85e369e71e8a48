//! Text rendering for command output.

use reserva_client::errors::ClientError;
use reserva_client::format::{format_date, format_date_range, format_resource_type, format_time};
use reserva_client::models::{
    AvailabilitySlot, ReservationResponse, ResourceResponse, ResourceTypeResponse,
};
use reserva_client::session::SessionState;
use std::fmt::Write;

const OVERLAP_HINT: &str =
    "hint: that slot is taken; see `reserva reservations availability <resource-id>`";

/// User-facing text for a failed command.
pub fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ClientError>() {
        Some(client_err) if client_err.is_overlap() => {
            format!("{}\n{OVERLAP_HINT}", client_err.user_message())
        }
        Some(client_err) => client_err.user_message(),
        None => format!("{err:#}"),
    }
}

pub fn session(state: &SessionState) -> String {
    match state {
        SessionState::SignedIn { email, is_admin } => {
            let role = if *is_admin { " (admin)" } else { "" };
            format!("Signed in as {email}{role}")
        }
        SessionState::SignedOut | SessionState::Loading => "Not signed in".to_string(),
    }
}

pub fn resource(resource: &ResourceResponse) -> String {
    let mut line = format!(
        "{}  [{}]",
        resource.name,
        format_resource_type(&resource.resource_type.name),
    );
    if let Some(location) = resource.location.as_deref().filter(|l| !l.is_empty()) {
        let _ = write!(line, "  @ {location}");
    }
    if !resource.active {
        line.push_str("  (inactive)");
    }
    let _ = write!(line, "\n    id: {}", resource.id);
    if let Some(description) = resource.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = write!(line, "\n    {description}");
    }
    line
}

pub fn resources(resources: &[ResourceResponse]) -> String {
    list(resources, "No resources found", resource)
}

pub fn resource_type(resource_type: &ResourceTypeResponse) -> String {
    let mut line = format!(
        "{:>4}  {}",
        resource_type.id,
        format_resource_type(&resource_type.name)
    );
    if let Some(description) = resource_type.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = write!(line, "  {description}");
    }
    line
}

pub fn resource_types(resource_types: &[ResourceTypeResponse]) -> String {
    list(resource_types, "No resource types found", resource_type)
}

pub fn reservation(reservation: &ReservationResponse) -> String {
    let mut line = format!(
        "{}  {}  [{}]\n    id: {}  by {}",
        reservation.resource_name,
        format_date_range(reservation.start_time, reservation.end_time),
        reservation.status,
        reservation.id,
        reservation.user_email,
    );
    if let Some(notes) = reservation.notes.as_deref().filter(|n| !n.is_empty()) {
        let _ = write!(line, "\n    {notes}");
    }
    if let Some(cancelled_at) = reservation.cancelled_at {
        let _ = write!(
            line,
            "\n    cancelled {} {}",
            format_date(cancelled_at),
            format_time(cancelled_at)
        );
    }
    line
}

pub fn reservations(reservations: &[ReservationResponse]) -> String {
    list(reservations, "No reservations found", reservation)
}

pub fn availability(slots: &[AvailabilitySlot]) -> String {
    list(slots, "No availability information", |slot| {
        let status = if slot.available { "free" } else { "booked" };
        format!("{}  {status}", format_date_range(slot.start, slot.end))
    })
}

fn list<T>(items: &[T], empty: &str, render: impl Fn(&T) -> String) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    items.iter().map(render).collect::<Vec<_>>().join("\n")
}
