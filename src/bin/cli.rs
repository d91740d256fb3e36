use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::{error, warn};
use spotigrab::error::Error;
use spotigrab::{AudioCodec, Bitrate, Credentials, DownloadOptions, download_spotify};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Clone)]
#[command(name = "spotigrab", version, about)]
pub struct Cli {
    /// Spotify track, album or playlist link to download
    pub link: String,

    /// Save directory (is created if it doesn't exist)
    #[arg(long = "dir", short = 'd', default_value = "./dl")]
    pub dir: PathBuf,

    /// Download type of the given link. Can be track, album or playlist
    #[arg(long = "type", short = 't', default_value = "track")]
    pub download_type: String,

    /// Makes the downloader non-verbose/quiet
    #[arg(long = "quiet", short = 'q', action = clap::ArgAction::SetTrue)]
    pub quiet: bool,

    /// Audio format to download the file as: mp3, flac, m4a or opus
    #[arg(long = "codec", short = 'c', default_value = "mp3")]
    pub codec: String,

    /// Audio quality of the file: best, 320, 256, 192, 128, 96, 32 or worst
    #[arg(long = "bitrate", short = 'b', default_value = "320")]
    pub bitrate: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    let logger = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.quiet { "error" } else { "info" }),
    )
    .build();
    let progress = MultiProgress::new();
    if LogWrapper::new(progress.clone(), logger).try_init().is_err() {
        eprintln!("Failed to initialize the logger.");
    }

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<bool, Error> {
    let credentials = Credentials::from_env()?;

    if !spotigrab::youtube::check_ffmpeg_installed() {
        return Err(Error::Transcode(
            "ffmpeg was not found on PATH; install it and try again".to_string(),
        ));
    }

    let detected = spotigrab::link::link_type(&args.link);
    if !detected.is_empty() && detected != args.download_type {
        warn!(
            "Link looks like a {detected}, ignoring download type '{}'.",
            args.download_type
        );
    }

    let options = DownloadOptions {
        save_dir: args.dir,
        codec: AudioCodec::from_arg(&args.codec),
        bitrate: Bitrate::from_arg(&args.bitrate),
        quiet: args.quiet,
    };

    let summary = download_spotify(&args.link, &credentials, &options).await?;
    Ok(summary.all_succeeded())
}
