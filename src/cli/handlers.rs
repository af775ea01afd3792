use chrono::NaiveDate;

use crate::{
    cli::{
        context::{short_id, CliContext},
        help,
        output::{self, due_status, progress_bar},
        registry::{CommandEntry, CommandRegistry},
    },
    core::{
        seed::seed_mechanics,
        services::{MechanicQuery, MechanicService},
    },
    currency::format_distance,
    domain::{Displayable, ServiceEntry, Vehicle},
    errors::{AutoServeError, Result},
    pricing::{deposit_amount, CostBreakdown},
    service_due::ServiceDueResult,
    storage::StorageBackend,
    time::{Clock, FixedClock, SystemClock},
    utils::build_info,
};

pub fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for entry in [
        CommandEntry::new(
            "add-vehicle",
            "Register a vehicle",
            "add-vehicle <make> <model> <year> <odometer> [plate]",
            cmd_add_vehicle,
        ),
        CommandEntry::new("vehicles", "List registered vehicles", "vehicles", cmd_vehicles),
        CommandEntry::new(
            "log-service",
            "Record a completed service",
            "log-service <vehicle-id> <YYYY-MM-DD> <odometer> <type> <cost>",
            cmd_log_service,
        ),
        CommandEntry::new(
            "history",
            "Show a vehicle's logbook, newest first",
            "history <vehicle-id>",
            cmd_history,
        ),
        CommandEntry::new(
            "due",
            "Show when each vehicle is next due for service",
            "due [vehicle-id] [--on YYYY-MM-DD]",
            cmd_due,
        ),
        CommandEntry::new(
            "quote",
            "Price a job with GST and deposit",
            "quote <parts> <labor> <fees>",
            cmd_quote,
        ),
        CommandEntry::new(
            "mechanics",
            "Browse mechanics, optionally by specialty",
            "mechanics [specialty]",
            cmd_mechanics,
        ),
        CommandEntry::new("backup", "Back up the garage snapshot", "backup [note]", cmd_backup),
        CommandEntry::new("version", "Show build information", "version", cmd_version),
        CommandEntry::new("help", "Show available commands", "help [command]", cmd_help),
    ] {
        registry.register(entry);
    }
    registry
}

fn usage(registry: &CommandRegistry, name: &str) -> AutoServeError {
    let usage = registry.get(name).map(|entry| entry.usage).unwrap_or(name);
    AutoServeError::InvalidInput(format!("usage: autoserve_cli {usage}"))
}

fn parse<T: std::str::FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AutoServeError::InvalidInput(format!("invalid {what}: `{value}`")))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AutoServeError::InvalidInput(format!("invalid date `{value}`, expected YYYY-MM-DD"))
    })
}

fn parse_amount(value: &str, what: &str) -> Result<f64> {
    let amount: f64 = parse(value, what)?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(AutoServeError::InvalidInput(format!(
            "{what} must be a non-negative amount"
        )));
    }
    Ok(amount)
}

fn cmd_add_vehicle(registry: &CommandRegistry, args: &[&str]) -> Result<()> {
    let [make, model, year, odometer, rest @ ..] = args else {
        return Err(usage(registry, "add-vehicle"));
    };
    if rest.len() > 1 {
        return Err(usage(registry, "add-vehicle"));
    }
    let mut vehicle = Vehicle::new(
        *make,
        *model,
        parse(year, "year")?,
        parse(odometer, "odometer")?,
    );
    if let Some(plate) = rest.first() {
        vehicle = vehicle.with_plate(plate.to_uppercase());
    }
    let ctx = CliContext::from_env()?;
    let label = vehicle.display_label();
    let id = ctx.vehicles(SystemClock).register(vehicle)?;
    output::success(format!("Registered {label} as {}", short_id(id)));
    Ok(())
}

fn cmd_vehicles(_: &CommandRegistry, _: &[&str]) -> Result<()> {
    let ctx = CliContext::from_env()?;
    let vehicles = ctx.vehicles(SystemClock).list()?;
    if vehicles.is_empty() {
        output::info("No vehicles registered. Use `add-vehicle` to add one.");
        return Ok(());
    }
    output::section("Vehicles");
    for vehicle in vehicles {
        output::info(format!(
            "{}  {:<32} {:>12}  {} services",
            short_id(vehicle.id),
            vehicle.display_label(),
            format_distance(i64::from(vehicle.odometer)),
            vehicle.service_history.len()
        ));
    }
    Ok(())
}

fn cmd_log_service(registry: &CommandRegistry, args: &[&str]) -> Result<()> {
    let [vehicle, date, odometer, service_type, cost] = args else {
        return Err(usage(registry, "log-service"));
    };
    let ctx = CliContext::from_env()?;
    let vehicle = ctx.find_vehicle(vehicle)?;
    let entry = ServiceEntry::new(parse_date(date)?, *service_type, parse(odometer, "odometer")?)
        .with_total_cost(parse_amount(cost, "cost")?);
    let service = ctx.vehicles(SystemClock);
    service.log_service(vehicle.id, entry)?;
    let due = service.service_due(vehicle.id)?;
    output::success(format!(
        "Logged {service_type} for {}",
        vehicle.display_label()
    ));
    output::info(format!("{}: {}", due_status(due.status), due.message));
    Ok(())
}

fn cmd_history(registry: &CommandRegistry, args: &[&str]) -> Result<()> {
    let [vehicle] = args else {
        return Err(usage(registry, "history"));
    };
    let ctx = CliContext::from_env()?;
    let vehicle = ctx.find_vehicle(vehicle)?;
    let entries = ctx.vehicles(SystemClock).history(vehicle.id)?;
    output::section(format!("Service history: {}", vehicle.display_label()));
    if entries.is_empty() {
        output::info("No services recorded.");
        return Ok(());
    }
    for entry in entries {
        let mechanic = if entry.mechanic.name.is_empty() {
            String::new()
        } else {
            format!("  @ {}", entry.mechanic.name)
        };
        output::info(format!(
            "{:<12} {:<20} {:>12} {:>12}  {}{mechanic}",
            ctx.date(entry.date),
            entry.service_type,
            format_distance(i64::from(entry.odometer)),
            ctx.money(entry.total_cost),
            entry.status
        ));
    }
    Ok(())
}

fn cmd_due(registry: &CommandRegistry, args: &[&str]) -> Result<()> {
    let mut vehicle_token = None;
    let mut on = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match *arg {
            "--on" => {
                let value = iter.next().ok_or_else(|| usage(registry, "due"))?;
                on = Some(parse_date(value)?);
            }
            token if vehicle_token.is_none() && !token.starts_with("--") => {
                vehicle_token = Some(token)
            }
            _ => return Err(usage(registry, "due")),
        }
    }

    let ctx = CliContext::from_env()?;
    match on {
        Some(date) => print_due(&ctx, vehicle_token, FixedClock::on(date)),
        None => print_due(&ctx, vehicle_token, SystemClock),
    }
}

fn print_due<C: Clock>(ctx: &CliContext, vehicle: Option<&str>, clock: C) -> Result<()> {
    let today = clock.today();
    let service = ctx.vehicles(clock);
    let rows: Vec<(Vehicle, ServiceDueResult)> = match vehicle {
        Some(token) => {
            let vehicle = ctx.find_vehicle(token)?;
            let due = service.service_due(vehicle.id)?;
            vec![(vehicle, due)]
        }
        None => service.fleet_due()?,
    };
    if rows.is_empty() {
        output::info("No vehicles registered. Use `add-vehicle` to add one.");
        return Ok(());
    }
    output::section(format!("Service status as of {}", ctx.date(today)));
    for (vehicle, due) in rows {
        output::info(format!(
            "{}  {:<32} {:<10} {} {:>3.0}%  {}",
            short_id(vehicle.id),
            vehicle.display_label(),
            due_status(due.status),
            progress_bar(due.progress_percentage),
            due.progress_percentage,
            due.message
        ));
    }
    Ok(())
}

fn cmd_quote(registry: &CommandRegistry, args: &[&str]) -> Result<()> {
    let [parts, labor, fees] = args else {
        return Err(usage(registry, "quote"));
    };
    let ctx = CliContext::from_env()?;
    let config = ctx.config();
    let breakdown = CostBreakdown::from_amounts(
        parse_amount(parts, "parts")?,
        parse_amount(labor, "labor")?,
        parse_amount(fees, "fees")?,
        config.gst_rate,
    );
    let deposit = deposit_amount(breakdown.total, config.deposit_rate);
    output::section("Quote");
    for (label, amount) in [
        ("Parts", breakdown.parts),
        ("Labor", breakdown.labor),
        ("Fees", breakdown.fees),
        ("Subtotal", breakdown.subtotal),
        ("GST", breakdown.gst),
        ("Total", breakdown.total),
    ] {
        output::info(format!("{label:<10} {:>14}", ctx.money(amount)));
    }
    output::info(format!(
        "Deposit ({:.0}%) {:>10}",
        config.deposit_rate * 100.0,
        ctx.money(deposit)
    ));
    Ok(())
}

fn cmd_mechanics(registry: &CommandRegistry, args: &[&str]) -> Result<()> {
    if args.len() > 1 {
        return Err(usage(registry, "mechanics"));
    }
    let ctx = CliContext::from_env()?;
    let mut garage = ctx.repo().garage()?;
    if garage.mechanics.is_empty() {
        garage = ctx.repo().update(|garage| {
            seed_mechanics(garage);
            Ok(garage.clone())
        })?;
    }
    let query = MechanicQuery {
        specialty: args.first().map(|s| s.to_string()),
        ..MechanicQuery::default()
    };
    let matches = MechanicService::search(&garage, &query);
    if matches.is_empty() {
        output::info("No mechanics match.");
        return Ok(());
    }
    output::section("Mechanics");
    for found in matches {
        let mechanic = found.mechanic;
        let badge = if mechanic.verified { " [verified]" } else { "" };
        output::info(format!(
            "{:<18} {:<28} {:>10}/hr  {:.1} ({} reviews){badge}",
            mechanic.name,
            mechanic.business_name.as_deref().unwrap_or("-"),
            ctx.money(mechanic.hourly_rate),
            mechanic.rating,
            mechanic.review_count
        ));
        output::info(format!("    {}", mechanic.specialties.join(", ")));
    }
    Ok(())
}

fn cmd_backup(_: &CommandRegistry, args: &[&str]) -> Result<()> {
    let note = (!args.is_empty()).then(|| args.join(" "));
    let ctx = CliContext::from_env()?;
    let repo = ctx.repo();
    let garage = repo.garage()?;
    let name = repo.backend().backup(&garage, repo.name(), note.as_deref())?;
    output::success(format!("Backup created: {name}"));
    Ok(())
}

fn cmd_version(_: &CommandRegistry, _: &[&str]) -> Result<()> {
    output::info(build_info::current().summary());
    Ok(())
}

fn cmd_help(registry: &CommandRegistry, args: &[&str]) -> Result<()> {
    match args.first() {
        Some(name) => {
            let entry = registry.get(&name.to_lowercase()).ok_or_else(|| {
                AutoServeError::InvalidInput(format!("unknown command `{name}`"))
            })?;
            help::print_command(entry);
        }
        None => help::print_overview(registry),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_every_command() {
        let names: Vec<_> = registry().list().iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            [
                "add-vehicle",
                "vehicles",
                "log-service",
                "history",
                "due",
                "quote",
                "mechanics",
                "backup",
                "version",
                "help"
            ]
        );
    }

    #[test]
    fn amounts_must_be_non_negative() {
        assert!(parse_amount("12.50", "cost").is_ok());
        assert!(parse_amount("-1", "cost").is_err());
        assert!(parse_amount("NaN", "cost").is_err());
    }

    #[test]
    fn dates_are_iso() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("29/02/2024").is_err());
    }

    #[test]
    fn due_rejects_unknown_flags() {
        let registry = registry();
        let err = cmd_due(&registry, &["--soon"]).unwrap_err();
        assert!(err.to_string().contains("usage"));
    }
}
