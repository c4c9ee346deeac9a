use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, PartialEq)]
#[command(name = "weatherdash")]
#[command(about = "Weather for the world's biggest cities, plus the ones you care about")]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Default)]
pub enum Command {
    /// Show the dashboard (default)
    #[default]
    Show,
    /// Hide removed cities from the listing and fetch a new page
    NewCities,
    /// Remove a city from the dashboard
    Remove { city: String },
    /// Bring back a removed city
    Restore { city: String },
    /// Toggle a city's favorite flag
    Favorite { city: String },
    /// Save notes for a city
    Notes { city: String, text: String },
    /// Delete a city's notes
    DeleteNotes { city: String },
    /// Weather and notes for one city
    Detail { city: String },
    /// Search cities by name
    Search { text: String },
    /// List removed cities
    Removed,
    /// Weather at a position (requires location access)
    Here {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Allow or forbid location lookups
    Location {
        #[arg(long)]
        revoke: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let args = CliArgs::parse_from(["weatherdash"]);
        assert_eq!(args.config, None);
        assert!(!args.json);
        assert_eq!(args.command.unwrap_or_default(), Command::Show);
    }

    #[test]
    fn test_cli_parse_remove() {
        let args = CliArgs::parse_from(["weatherdash", "--json", "remove", "new york"]);
        assert!(args.json);
        assert_eq!(
            args.command,
            Some(Command::Remove {
                city: "new york".to_string()
            })
        );
    }

    #[test]
    fn test_cli_parse_notes_with_config() {
        let args = CliArgs::parse_from([
            "weatherdash",
            "--config",
            "/custom/config.toml",
            "notes",
            "goa",
            "beach trip",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("/custom/config.toml")));
        assert_eq!(
            args.command,
            Some(Command::Notes {
                city: "goa".to_string(),
                text: "beach trip".to_string()
            })
        );
    }

    #[test]
    fn test_cli_parse_negative_coordinates() {
        let args = CliArgs::parse_from(["weatherdash", "here", "--lat", "47.6", "--lon", "-122.3"]);
        assert_eq!(
            args.command,
            Some(Command::Here {
                lat: 47.6,
                lon: -122.3
            })
        );
    }
}
