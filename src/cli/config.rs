use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_file_exists, settings_path, Settings};

pub fn run(init: bool) -> Result<()> {
    if init {
        if settings_file_exists() {
            println!("Settings already exist at {}", settings_path().display());
        } else {
            save_settings(&Settings::default())?;
            println!("Wrote default settings to {}", settings_path().display());
        }
    }

    let settings = load_settings();
    println!("Settings:     {}", settings_path().display());
    println!("Provider:     {}", settings.provider);
    println!("Season:       {}", settings.season);
    println!("Season dir:   {}", settings.season_dir().display());
    println!("Phone fixups: {}", settings.phone_fixups.len());
    if settings.age_groups.is_empty() {
        println!("Age groups:   (not set)");
    } else {
        println!("Age groups:");
        for (name, (start, end)) in &settings.age_groups {
            println!("  {name:<10} {start} - {}", end.as_deref().unwrap_or("open"));
        }
    }
    Ok(())
}
