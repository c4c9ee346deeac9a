mod cli;

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use weatherdash_core::{AppError, Config};
use weatherdash_dashboard::{render_table, BoardView, CityDetail, Dashboard};
use weatherdash_store::{KeyValueStore, SqliteStore};
use weatherdash_weather::Coordinates;

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
    weatherdash_core::init()?;
    let args = CliArgs::parse();

    let (config, validation) =
        Config::load_validated(args.config.as_deref()).map_err(|e| describe(e.into()))?;
    tracing::debug!(warnings = validation.warnings.len(), "Configuration loaded");

    let store: Arc<dyn KeyValueStore> = Arc::new(
        SqliteStore::open(config.database_path()).context("Failed to open local store")?,
    );
    let dashboard = Dashboard::from_config(&config, store).map_err(describe)?;

    let output = run(&dashboard, args.command.unwrap_or_default(), args.json)
        .await
        .map_err(describe)?;
    print!("{}", output);

    dashboard.persist_cache()?;
    Ok(())
}

async fn run(dashboard: &Dashboard, command: Command, json: bool) -> Result<String, AppError> {
    let output = match command {
        Command::Show => board(&dashboard.refresh().await, json)?,
        Command::NewCities => board(&dashboard.fetch_new_cities().await?, json)?,
        Command::Remove { city } => {
            // Load the current board first so removal sees what is shown
            dashboard.refresh().await;
            board(&dashboard.remove_city(&city).await?, json)?
        }
        Command::Restore { city } => {
            dashboard.refresh().await;
            board(&dashboard.restore_city(&city).await?, json)?
        }
        Command::Favorite { city } => {
            let record = dashboard.toggle_favorite(&city)?;
            if json {
                to_json(&record)?
            } else {
                let state = if record.is_favorite { "favorite" } else { "not a favorite" };
                format!("{} is {}\n", record.city_id, state)
            }
        }
        Command::Notes { city, text } => {
            let record = dashboard.save_notes(&city, &text)?;
            if json {
                to_json(&record)?
            } else {
                format!("Notes for {}: {}\n", record.city_id, record.notes)
            }
        }
        Command::DeleteNotes { city } => {
            let record = dashboard.delete_notes(&city)?;
            if json {
                to_json(&record)?
            } else {
                format!("Notes for {} deleted\n", record.city_id)
            }
        }
        Command::Detail { city } => detail(&dashboard.city_detail(&city).await?, json)?,
        Command::Search { text } => {
            let cities = dashboard.search(&text).await?;
            if json {
                to_json(&cities)?
            } else {
                cities
                    .iter()
                    .map(|c| format!("{}\t{}\n", c.id, c.display_name))
                    .collect()
            }
        }
        Command::Removed => {
            let removed = dashboard.removed_cities();
            if json {
                to_json(&removed)?
            } else {
                removed.iter().map(|c| format!("{}\n", c)).collect()
            }
        }
        Command::Here { lat, lon } => {
            let coords = Coordinates {
                latitude: lat,
                longitude: lon,
            };
            match dashboard.local_weather(coords).await? {
                Some(found) => detail(&found, json)?,
                None if !dashboard.is_location_granted() => {
                    "Location access is off. Run `weatherdash location` to allow it.\n".to_string()
                }
                None => "No city found at that position.\n".to_string(),
            }
        }
        Command::Location { revoke } => {
            dashboard.set_location_granted(!revoke)?;
            if revoke {
                "Location access revoked\n".to_string()
            } else {
                "Location access granted\n".to_string()
            }
        }
    };

    Ok(output)
}

fn board(view: &BoardView, json: bool) -> Result<String, AppError> {
    if json {
        return to_json(view);
    }

    let mut out = render_table(&view.rows);
    for failure in &view.failures {
        let _ = writeln!(out, "! {}: {}", failure.city_id, failure.message);
    }
    if let Some(error) = &view.city_error {
        let _ = writeln!(out, "! Could not load cities: {}", error);
    }
    Ok(out)
}

fn detail(detail: &CityDetail, json: bool) -> Result<String, AppError> {
    if json {
        return to_json(detail);
    }

    let w = &detail.weather;
    let mut out = format!(
        "{}{}\n  {}°C / {}°F, precipitation {}mm, humidity {}%, wind {}km/h\n",
        w.location_name,
        if detail.is_favorite { " (favorite)" } else { "" },
        w.temperature,
        w.fahrenheit(),
        w.precipitation,
        w.humidity,
        w.wind_speed,
    );
    if !detail.notes.is_empty() {
        let _ = writeln!(out, "  Notes: {}", detail.notes);
    }
    Ok(out)
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    let mut text = serde_json::to_string_pretty(value).map_err(anyhow::Error::from)?;
    text.push('\n');
    Ok(text)
}

fn describe(e: AppError) -> anyhow::Error {
    anyhow::anyhow!("{} ({})", e.user_message(), e)
}
