//! Profiles command - inspect and export vendor profiles.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use porder_core::VendorProfile;

/// Arguments for the profiles command.
#[derive(Args)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    command: ProfilesCommand,
}

#[derive(Subcommand)]
enum ProfilesCommand {
    /// List built-in vendor profiles
    List,

    /// Print a profile as JSON
    Show(ShowArgs),

    /// Export a profile to a JSON file, as a starting point for a custom one
    Export(ExportArgs),
}

#[derive(Args)]
struct ShowArgs {
    /// Profile name
    name: String,
}

#[derive(Args)]
struct ExportArgs {
    /// Profile name
    name: String,

    /// Destination file
    #[arg(short, long)]
    output: PathBuf,
}

pub fn run(args: ProfilesArgs) -> anyhow::Result<()> {
    match args.command {
        ProfilesCommand::List => {
            for name in VendorProfile::builtin_names() {
                println!("{}", name);
            }
            Ok(())
        }
        ProfilesCommand::Show(show) => {
            let profile = lookup(&show.name)?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(())
        }
        ProfilesCommand::Export(export) => {
            let profile = lookup(&export.name)?;
            profile.save(&export.output)?;
            println!("Exported '{}' to {}", export.name, export.output.display());
            Ok(())
        }
    }
}

fn lookup(name: &str) -> anyhow::Result<VendorProfile> {
    VendorProfile::builtin(name).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown profile '{}' (available: {})",
            name,
            VendorProfile::builtin_names().join(", ")
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_and_unknown() {
        assert!(lookup("blinkit").is_ok());
        assert!(lookup("nope").is_err());
    }

    #[test]
    fn test_export_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("amazon.json");

        lookup("amazon").unwrap().save(&path).unwrap();
        let loaded = VendorProfile::from_file(&path).unwrap();
        assert_eq!(loaded.name, "amazon");
    }
}
