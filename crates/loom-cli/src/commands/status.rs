//! Status command handler

use anyhow::Result;

use loom_core::{HydrationReport, Library};

use crate::output::{Output, OutputFormat};

/// Show counts, load results and storage location
pub fn show(library: &Library, output: &Output) -> Result<()> {
    let status = library.status();
    let config = library.config();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "write_policy": config.write_policy.to_string(),
                    "counts": {
                        "favorites": status.favorites,
                        "diary_entries": status.diary_entries
                    },
                    "load": {
                        "favorites": describe(&status.favorites_report),
                        "diary": describe(&status.diary_report)
                    },
                    "recovered": status.has_recovered()
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{} {}", status.favorites, status.diary_entries);
        }
        OutputFormat::Human => {
            println!("Loom Status");
            println!("===========");
            println!();
            println!("Storage:");
            println!("  Location:     {}", config.data_dir.display());
            println!("  Write policy: {}", config.write_policy);
            println!();
            println!("Contents:");
            println!(
                "  Favorites:     {} ({})",
                status.favorites,
                describe(&status.favorites_report)
            );
            println!(
                "  Diary entries: {} ({})",
                status.diary_entries,
                describe(&status.diary_report)
            );

            for report in [&status.favorites_report, &status.diary_report] {
                if let HydrationReport::Recovered {
                    details,
                    backup_key,
                } = report
                {
                    println!();
                    println!("⚠ Unreadable data was set aside: {}", details);
                    if let Some(key) = backup_key {
                        println!("  Backup saved under {}", key);
                    }
                }
            }
        }
    }

    Ok(())
}

fn describe(report: &HydrationReport) -> String {
    match report {
        HydrationReport::NotHydrated => "not loaded".to_string(),
        HydrationReport::Empty => "empty".to_string(),
        HydrationReport::Loaded { count } => format!("loaded {}", count),
        HydrationReport::Recovered { .. } => "recovered".to_string(),
    }
}
