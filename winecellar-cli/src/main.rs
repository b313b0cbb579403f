//! Winecellar CLI

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use winecellar_lib::bottle::program_icon_path;
use winecellar_lib::{
    AudioDriver, Bit, Bottle, BottleManager, BottleMetadata, BottleSummary, Config, Error,
    LoadOrder, NewBottle, Result, Windows, Wine, Winetricks,
};

#[derive(Parser)]
#[command(name = "winecellar")]
#[command(about = "Inspect, create and manage Wine bottles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print machine readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Don't ask any questions
    #[arg(short = 'q', long, global = true)]
    unattended: bool,

    /// More output (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// List all bottles
    List,

    /// Show the configuration of a bottle
    Info {
        /// Bottle name or prefix path
        bottle: String,
    },

    /// Check whether a bottle is usable
    Status { bottle: String },

    /// List Start Menu entries of a bottle
    Menu { bottle: String },

    /// List DLL overrides of a bottle
    Overrides { bottle: String },

    /// Check whether a DLL is overridden with a load order
    Dll {
        bottle: String,
        dll: String,
        /// builtin, native, builtin,native, native,builtin or disabled
        #[arg(default_value = "native,builtin")]
        load_order: LoadOrder,
    },

    /// Look up the display name of an installed program
    Uninstaller {
        bottle: String,
        /// Uninstall key, usually a {GUID}
        key: String,
    },

    /// Look up the GUID of an installed program by name
    Guid { bottle: String, application: String },

    /// Look up the file registered for a font
    Font {
        bottle: String,
        name: String,
        #[arg(long, default_value = "win32")]
        bit: Bit,
    },

    /// Create a new bottle
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "win64")]
        bit: Bit,
        /// Version tag, e.g. win7, winxp, win10
        #[arg(long, default_value = "win7")]
        windows: Windows,
        /// Virtual desktop resolution, e.g. 1024x768
        #[arg(long)]
        desktop: Option<String>,
        #[arg(long, default_value = "pulse")]
        audio: AudioDriver,
        /// Don't install Gecko and Mono
        #[arg(long)]
        disable_gecko_mono: bool,
    },

    /// Delete a bottle
    Remove { bottle: String },

    /// Rename a bottle folder
    Rename { bottle: String, new_name: String },

    /// Change the emulated Windows version
    SetWindows { bottle: String, windows: Windows },

    /// Change the audio driver
    SetAudio { bottle: String, audio: AudioDriver },

    /// Set a virtual desktop resolution, or `off` to disable it
    SetDesktop { bottle: String, resolution: String },

    /// Run a Windows program inside a bottle
    Run {
        bottle: String,
        program: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Install winetricks, or update it when already installed
    WinetricksUpdate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("winecellar={}", log_level))
        .with_writer(io::stderr)
        .init();

    let mut config = Config::load()?;
    config.verbosity = cli.verbose;
    debug!("Using data directory {:?}", config.data_dir);

    let manager = BottleManager::new(config.clone());
    let winetricks = Winetricks::new(&config.winetricks_bin);

    match cli.command {
        Command::List => {
            let summaries = manager.list(&wine_version_or_unknown(&config))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else if summaries.is_empty() {
                println!("No bottles found in {}", config.prefixes_root().display());
            } else {
                for summary in &summaries {
                    print_summary_line(summary);
                }
            }
        }

        Command::Info { bottle } => {
            let prefix = existing_prefix(&config, &bottle)?;
            let summary = manager.summary(&prefix, &wine_version_or_unknown(&config));
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }

        Command::Status { bottle } => {
            let prefix = config.resolve_prefix(&bottle);
            let status = Bottle::new(&prefix).status();
            if cli.json {
                println!("{}", serde_json::json!({ "prefix": prefix, "status": status }));
            } else {
                println!("{}", if status { "Ready" } else { "Not ready" });
            }
        }

        Command::Menu { bottle } => {
            let prefix = existing_prefix(&config, &bottle)?;
            let items = Bottle::new(&prefix).menu_items()?;
            let entries: Vec<serde_json::Value> = items
                .iter()
                .map(|item| {
                    let icon = program_icon_path(item, &config.applications_dir, &config.icons_dir)
                        .unwrap_or_else(|e| {
                            debug!("No icon for {}: {}", item, e);
                            None
                        });
                    serde_json::json!({ "shortcut": item, "icon": icon })
                })
                .collect();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for item in &items {
                    println!("{}", item);
                }
            }
        }

        Command::Overrides { bottle } => {
            let prefix = existing_prefix(&config, &bottle)?;
            let overrides = Bottle::new(&prefix).dll_overrides()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&overrides)?);
            } else {
                for o in &overrides {
                    println!("{:<24} {}", o.dll_name, o.load_order);
                }
            }
        }

        Command::Dll {
            bottle,
            dll,
            load_order,
        } => {
            let prefix = existing_prefix(&config, &bottle)?;
            let overridden = Bottle::new(&prefix).dll_override(&dll, load_order)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "dll": dll, "load_order": load_order, "overridden": overridden })
                );
            } else {
                println!("{}", if overridden { "yes" } else { "no" });
            }
        }

        Command::Uninstaller { bottle, key } => {
            let prefix = existing_prefix(&config, &bottle)?;
            print_optional(Bottle::new(&prefix).uninstaller(&key)?, cli.json)?;
        }

        Command::Guid {
            bottle,
            application,
        } => {
            let prefix = existing_prefix(&config, &bottle)?;
            let wine = Wine::detect(config.settings.prefer_wine64)?;
            let guid = blocking(move || wine.guid(&prefix, &application)).await?;
            print_optional(guid, cli.json)?;
        }

        Command::Font { bottle, name, bit } => {
            let prefix = existing_prefix(&config, &bottle)?;
            print_optional(Bottle::new(&prefix).font_filename(bit, &name)?, cli.json)?;
        }

        Command::Create {
            name,
            description,
            bit,
            windows,
            desktop,
            audio,
            disable_gecko_mono,
        } => {
            let wine = Wine::detect(config.settings.prefer_wine64)?;
            if windows != winecellar_lib::windows::DEFAULT_WINDOWS
                || desktop.is_some()
                || audio != winecellar_lib::windows::DEFAULT_AUDIO_DRIVER
            {
                ensure_winetricks(&winetricks).await?;
            }

            let options = NewBottle {
                description,
                bit,
                windows,
                virtual_desktop: desktop,
                audio_driver: audio,
                disable_gecko_mono,
                ..NewBottle::new(name)
            };
            let prefix = blocking(move || manager.create(&wine, &winetricks, &options)).await?;
            println!("Created {}", prefix.display());
        }

        Command::Remove { bottle } => {
            let prefix = existing_prefix(&config, &bottle)?;
            if !cli.unattended && !confirm(&prefix)? {
                println!("Cancelled.");
                return Ok(());
            }
            manager.remove(&prefix)?;
            println!("Removed {}", prefix.display());
        }

        Command::Rename { bottle, new_name } => {
            let prefix = existing_prefix(&config, &bottle)?;
            let target = manager.rename(&prefix, &new_name)?;
            println!("Renamed to {}", target.display());
        }

        Command::SetWindows { bottle, windows } => {
            let prefix = existing_prefix(&config, &bottle)?;
            ensure_winetricks(&winetricks).await?;
            blocking(move || winetricks.set_windows_version(&prefix, windows)).await?;
            println!("Windows version set to {}", windows);
        }

        Command::SetAudio { bottle, audio } => {
            let prefix = existing_prefix(&config, &bottle)?;
            ensure_winetricks(&winetricks).await?;
            blocking(move || winetricks.set_audio_driver(&prefix, audio)).await?;
            println!("Audio driver set to {}", audio);
        }

        Command::SetDesktop { bottle, resolution } => {
            let prefix = existing_prefix(&config, &bottle)?;
            ensure_winetricks(&winetricks).await?;
            if resolution == "off" {
                blocking(move || winetricks.disable_virtual_desktop(&prefix)).await?;
                println!("Virtual desktop disabled");
            } else {
                blocking(move || winetricks.set_virtual_desktop(&prefix, &resolution)).await?;
                println!("Virtual desktop enabled");
            }
        }

        Command::Run {
            bottle,
            program,
            args,
        } => {
            let prefix = existing_prefix(&config, &bottle)?;
            let wine = Wine::detect(config.settings.prefer_wine64)?;
            let metadata = BottleMetadata::load(&prefix)?;
            let stderr_output = config.settings.enable_logging_stderr;
            let debug_level = if metadata.logging_enabled {
                metadata.debug_log_level
            } else {
                0
            };

            let output = blocking(move || {
                let output = wine.run_program(&prefix, debug_level, &program, &args, stderr_output)?;
                Wine::wait_for_wineserver(&prefix)?;
                Ok(output)
            })
            .await?;
            print!("{}", output);
        }

        Command::WinetricksUpdate => {
            if winetricks.is_installed() {
                let updater = winetricks.clone();
                blocking(move || updater.self_update()).await?;
            } else {
                winetricks.install(true).await?;
            }
            println!("Winetricks version {}", winetricks.version()?);
        }
    }

    Ok(())
}

/// Run bridge work on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::CommandExecution {
            command: "background task".into(),
            error: e.to_string(),
        })?
}

async fn ensure_winetricks(winetricks: &Winetricks) -> Result<()> {
    if !winetricks.is_installed() {
        info!("Winetricks not found, installing to {}", winetricks.bin().display());
        winetricks.install(true).await?;
    }
    Ok(())
}

fn existing_prefix(config: &Config, bottle: &str) -> Result<PathBuf> {
    let prefix = config.resolve_prefix(bottle);
    if prefix.is_dir() {
        Ok(prefix)
    } else {
        Err(Error::Config(format!(
            "Wine machine not found: {}",
            prefix.display()
        )))
    }
}

fn wine_version_or_unknown(config: &Config) -> String {
    Wine::detect(config.settings.prefer_wine64)
        .map(|wine| wine.version_stripped)
        .unwrap_or_else(|e| {
            warn!("{}", e);
            "- Unknown -".to_string()
        })
}

fn confirm(prefix: &Path) -> Result<bool> {
    eprintln!("WARNING: This will DELETE ALL DATA AND APPLICATIONS inside:");
    eprintln!("  {}", prefix.display());
    eprintln!("This action cannot be undone!");
    print!("Are you sure you want to continue? [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().to_lowercase().starts_with('y'))
}

fn print_optional(value: Option<String>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(&value)?);
    } else {
        println!("{}", value.as_deref().unwrap_or("- Not found -"));
    }
    Ok(())
}

fn print_summary_line(summary: &BottleSummary) {
    let marker = if summary.is_default { "*" } else { " " };
    println!(
        "{} {:<24} {:<16} {}-bit  {}",
        marker,
        summary.name,
        summary.windows,
        summary.bit,
        if summary.status { "Ready" } else { "Not ready" }
    );
}

fn print_summary(summary: &BottleSummary) {
    println!("Name:            {}", summary.name);
    if !summary.description.is_empty() {
        println!("Description:     {}", summary.description);
    }
    println!("Status:          {}", if summary.status { "Ready" } else { "Not ready" });
    println!("Windows:         {} ({}-bit)", summary.windows, summary.bit);
    println!("Wine version:    {}", summary.wine_version);
    println!("Prefix:          {}", summary.prefix.display());
    println!("C:\\ drive:       {}", summary.c_drive);
    println!("Last updated:    {}", summary.last_updated);
    println!("Audio driver:    {}", summary.audio_driver);
    println!(
        "Virtual desktop: {}",
        summary.virtual_desktop.as_deref().unwrap_or("Disabled")
    );
    if let Some(error) = &summary.error {
        println!("\n{}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_create_defaults() {
        let cli = Cli::try_parse_from(["winecellar", "create", "Office"]).unwrap();
        match cli.command {
            Command::Create {
                name,
                bit,
                windows,
                audio,
                desktop,
                ..
            } => {
                assert_eq!(name, "Office");
                assert_eq!(bit, Bit::Win64);
                assert_eq!(windows, Windows::Windows7);
                assert_eq!(audio, AudioDriver::PulseAudio);
                assert_eq!(desktop, None);
            }
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn parse_enums_and_verbosity() {
        let cli = Cli::try_parse_from([
            "winecellar", "-vv", "--json", "set-windows", "Steam", "winxp",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Command::SetWindows {
                windows: Windows::WindowsXP,
                ..
            }
        ));

        assert!(Cli::try_parse_from(["winecellar", "set-audio", "Steam", "jack"]).is_err());
    }

    #[test]
    fn run_takes_program_arguments() {
        let cli =
            Cli::try_parse_from(["winecellar", "run", "Steam", "notepad", "-f", "readme.txt"])
                .unwrap();
        match cli.command {
            Command::Run { program, args, .. } => {
                assert_eq!(program, "notepad");
                assert_eq!(args, vec!["-f", "readme.txt"]);
            }
            _ => panic!("expected run"),
        }
    }
}
