mod pulseaudio;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use phonon_rs_config::PhononConfig;
use phonon_rs_devices::{
    AdvancedDevices, BackendCapabilities, Category, DeviceBackend, DeviceCapabilities, DeviceId,
    DeviceKind, GlobalConfig, ListOptions, StaticBackend,
};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::pulseaudio::PulseAudioBackend;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use a built-in device table instead of PulseAudio
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List devices in preference order
    List {
        #[arg(long, default_value = "output")]
        kind: DeviceKind,
        #[arg(long, default_value = "none")]
        category: Category,
        /// Include advanced devices regardless of the setting
        #[arg(long)]
        show_advanced: bool,
        /// Include devices that are currently unplugged
        #[arg(long)]
        show_unavailable: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the preferred device
    Default {
        #[arg(long, default_value = "output")]
        kind: DeviceKind,
        #[arg(long, default_value = "none")]
        category: Category,
    },
    /// Set the priority order of the visible devices
    Prefer {
        #[arg(long, default_value = "output")]
        kind: DeviceKind,
        #[arg(long, default_value = "none")]
        category: Category,
        #[arg(required = true)]
        devices: Vec<DeviceId>,
    },
    /// Show or change whether advanced devices are hidden
    HideAdvanced { hide: Option<bool> },
}

#[derive(Debug, Serialize)]
struct DeviceEntry {
    id: DeviceId,
    description: Option<String>,
    #[serde(flatten)]
    capabilities: DeviceCapabilities,
}

fn demo_backend() -> StaticBackend {
    use DeviceKind::{AudioCapture, AudioOutput, VideoCapture};

    StaticBackend::new()
        .with_named_device(
            AudioOutput,
            0,
            "Built-in Audio Analog Stereo",
            DeviceCapabilities::hardware(),
        )
        .with_named_device(AudioOutput, 1, "HDMI / DisplayPort", DeviceCapabilities::hardware())
        .with_named_device(AudioOutput, 2, "Raw ALSA hw:0,0", DeviceCapabilities::advanced())
        .with_named_device(AudioOutput, 3, "USB Headset", DeviceCapabilities::unavailable())
        .with_named_device(
            AudioCapture,
            0,
            "Built-in Microphone",
            DeviceCapabilities::hardware(),
        )
        .with_named_device(
            AudioCapture,
            1,
            "Monitor of Built-in Audio",
            DeviceCapabilities::advanced(),
        )
        .with_named_device(VideoCapture, 0, "Integrated Camera", DeviceCapabilities::hardware())
}

async fn open_backend(demo: bool) -> anyhow::Result<Arc<dyn DeviceBackend>> {
    if demo {
        debug!("Using demo device table");
        return Ok(Arc::new(demo_backend()));
    }

    let backend = PulseAudioBackend::new();
    backend.connect().await.context("Failed to enumerate PulseAudio devices")?;
    Ok(Arc::new(backend))
}

async fn print_list(
    caps: &BackendCapabilities,
    kind: DeviceKind,
    category: Category,
    options: ListOptions,
    json: bool,
) -> anyhow::Result<()> {
    let config = caps.config();
    let devices = config.device_list_for(kind, category, options).await;
    let entries: Vec<DeviceEntry> = devices
        .iter()
        .map(|&id| DeviceEntry {
            id,
            description: config.backend().and_then(|b| b.device_description(kind, id)),
            capabilities: config.capabilities(kind, id),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No {} devices for category {}", kind, category);
    }
    for entry in entries {
        let mut flags = Vec::new();
        if entry.capabilities.is_advanced {
            flags.push("advanced");
        }
        if entry.capabilities.is_hardware_device {
            flags.push("hardware");
        }
        if !entry.capabilities.available {
            flags.push("unavailable");
        }
        println!(
            "{:>4}  {}  {}",
            entry.id,
            entry.description.as_deref().unwrap_or("-"),
            flags.join(",")
        );
    }
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    let settings = match &args.config {
        Some(path) => PhononConfig::new(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => PhononConfig::open_default().with_context(|| {
            let path = PhononConfig::default_path();
            format!("Failed to load settings from {}", path.display())
        })?,
    };
    let backend = open_backend(args.demo).await?;
    let config = GlobalConfig::new(Arc::new(settings)).with_backend(backend);
    let caps = BackendCapabilities::new(config);

    match args.command {
        Command::List {
            kind,
            category,
            show_advanced,
            show_unavailable,
            json,
        } => {
            let options = ListOptions {
                advanced: if show_advanced {
                    AdvancedDevices::Show
                } else {
                    AdvancedDevices::FromSettings
                },
                hide_unavailable: !show_unavailable,
            };
            print_list(&caps, kind, category, options, json).await?;
        }
        Command::Default { kind, category } => {
            match caps.config().device_for(kind, category, ListOptions::default()).await {
                Some(id) => println!("{}", id),
                None => println!("No {} device available", kind),
            }
        }
        Command::Prefer {
            kind,
            category,
            devices,
        } => {
            let stored = caps
                .set_device_priority_list_for_category(kind, category, &devices)
                .await
                .context("Failed to store device priority")?;
            info!("Stored order: {:?}", stored);
            print_list(&caps, kind, category, ListOptions::default(), false).await?;
        }
        Command::HideAdvanced { hide: None } => {
            println!("{}", caps.hide_advanced_devices().await);
        }
        Command::HideAdvanced { hide: Some(hide) } => {
            caps.set_hide_advanced_devices(hide)
                .await
                .context("Failed to store setting")?;
            println!("{}", hide);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    debug!("{:?}", args);
    run(args).await
}
