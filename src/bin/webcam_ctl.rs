//! webcam_ctl - operate a remote webcam-capture service from the shell
//!
//! Subcommands:
//! 1. `devices`: print the advertised device list, one JSON object per line
//! 2. `frame`: capture one still into the save directory
//! 3. `record`: start a recording, wait, stop and (optionally) save it

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use webcam_client::{
    list_devices, CameraClient, CameraIndex, ClientConfig, UreqTransport, DEFAULT_FRAME_NAME,
    DEFAULT_VIDEO_NAME,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Drive a remote webcam-capture HTTP service")]
struct Args {
    /// JSON config file (service_url, camera_index, save_dir, timeouts).
    #[arg(long, env = "WEBCAM_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the capture service (overrides config).
    #[arg(long)]
    service_url: Option<String>,

    /// Camera identifier as advertised by /available_webcams (overrides config).
    #[arg(long)]
    camera_index: Option<String>,

    /// Directory for captured files (overrides config).
    #[arg(long)]
    save_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List devices advertised by the service.
    Devices,
    /// Capture one still frame.
    Frame {
        #[arg(long, default_value = DEFAULT_FRAME_NAME)]
        name: String,
    },
    /// Record a clip of fixed length.
    Record {
        /// Seconds to record before stopping.
        #[arg(long, default_value_t = 5)]
        seconds: u64,
        #[arg(long, default_value = DEFAULT_VIDEO_NAME)]
        name: String,
        /// Stop without saving the video.
        #[arg(long)]
        discard: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = ClientConfig::load_from(args.config.as_deref())?;
    if let Some(url) = args.service_url {
        cfg.service_url = url;
    }
    if let Some(index) = args.camera_index.as_deref() {
        cfg.camera_index = CameraIndex::parse(index);
    }
    if let Some(dir) = args.save_dir {
        cfg.save_dir = dir;
    }

    let transport = UreqTransport::new(cfg.connect_timeout, cfg.request_timeout);
    match args.command {
        Command::Devices => {
            for device in list_devices(&transport, &cfg.service_url)? {
                println!("{}", serde_json::to_string(&device)?);
            }
        }
        Command::Frame { name } => {
            let client = connect(transport, &cfg)?;
            match client.get_frame(&cfg.save_dir, &name)? {
                Some(path) => println!("{}", path.display()),
                None => return Err(anyhow!("no frame captured from {}", cfg.service_url)),
            }
        }
        Command::Record {
            seconds,
            name,
            discard,
        } => {
            let mut client = connect(transport, &cfg)?;
            if !client.start_video_recording()? {
                log::warn!("service did not confirm recording start");
            }
            log::info!("recording for {}s", seconds);
            std::thread::sleep(Duration::from_secs(seconds));

            let save_dir = (!discard).then_some(cfg.save_dir.as_path());
            match client.stop_video_recording(save_dir, &name)? {
                Some(path) => println!("{}", path.display()),
                None if discard => log::info!("recording stopped; video discarded"),
                None => return Err(anyhow!("recording was not stopped cleanly")),
            }
        }
    }

    Ok(())
}

fn connect(transport: UreqTransport, cfg: &ClientConfig) -> Result<CameraClient> {
    CameraClient::with_transport(transport, &cfg.service_url, cfg.camera_index.clone())
        .with_context(|| format!("camera {} unavailable", cfg.camera_index))
}
