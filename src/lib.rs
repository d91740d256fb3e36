use {
    crate::error::{Error, Result},
    crate::link::{LinkType, SpotifyLink, check_spotify_link, link_type, resource_id},
    crate::song::Song,
    crate::spotify::{SongSource, SpotifyFetcher, fetch_songs},
    log::{error, info, warn},
    std::fmt,
    std::path::{Path, PathBuf},
    std::str::FromStr,
};

pub mod error;
pub mod link;
pub mod metadata;
pub mod song;
pub mod spotify;
pub mod youtube;

/// Accepted audio codecs. Anything else falls back to mp3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioCodec {
    #[default]
    Mp3,
    Flac,
    M4a,
    Opus,
}

impl AudioCodec {
    /// Parses a user-entered codec, falling back to the default with a
    /// warning instead of failing.
    pub fn from_arg(value: &str) -> AudioCodec {
        match value {
            "mp3" => AudioCodec::Mp3,
            "flac" => AudioCodec::Flac,
            "m4a" => AudioCodec::M4a,
            "opus" => AudioCodec::Opus,
            other => {
                warn!("Invalid codec '{other}' entered! Using default value.");
                AudioCodec::default()
            }
        }
    }

    /// The ffmpeg encoder matching this codec.
    pub(crate) fn encoder(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "libmp3lame",
            AudioCodec::Flac => "flac",
            AudioCodec::M4a => "aac",
            AudioCodec::Opus => "libopus",
        }
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioCodec::Mp3 => write!(f, "mp3"),
            AudioCodec::Flac => write!(f, "flac"),
            AudioCodec::M4a => write!(f, "m4a"),
            AudioCodec::Opus => write!(f, "opus"),
        }
    }
}

/// Accepted audio qualities. Anything else falls back to 320 kbps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bitrate {
    Best,
    Worst,
    Kbps(u32),
}

impl Default for Bitrate {
    fn default() -> Bitrate {
        Bitrate::Kbps(320)
    }
}

impl Bitrate {
    const ACCEPTED_KBPS: [u32; 6] = [320, 256, 192, 128, 96, 32];

    /// Parses a user-entered bitrate, falling back to the default with a
    /// warning instead of failing.
    pub fn from_arg(value: &str) -> Bitrate {
        match value {
            "best" => Bitrate::Best,
            "worst" => Bitrate::Worst,
            other => match other.parse::<u32>() {
                Ok(kbps) if Bitrate::ACCEPTED_KBPS.contains(&kbps) => Bitrate::Kbps(kbps),
                _ => {
                    warn!("Invalid bitrate '{other}' entered! Using default value.");
                    Bitrate::default()
                }
            },
        }
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bitrate::Best => write!(f, "best"),
            Bitrate::Worst => write!(f, "worst"),
            Bitrate::Kbps(kbps) => write!(f, "{kbps}"),
        }
    }
}

/// Spotify API credentials, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl Credentials {
    /// Reads the three required variables; a missing or blank one is fatal.
    pub fn from_env() -> Result<Credentials> {
        Ok(Credentials {
            client_id: require_env("SPOTIPY_CLIENT_ID")?,
            client_secret: require_env("SPOTIPY_CLIENT_SECRET")?,
            redirect_uri: require_env("SPOTIPY_REDIRECT_URI")?,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    check_env_value(name, std::env::var(name).ok())
}

fn check_env_value(name: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::EnvVariables(format!("{name} not configured!"))),
    }
}

/// Everything the download pipeline needs besides the songs themselves.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub save_dir: PathBuf,
    pub codec: AudioCodec,
    pub bitrate: Bitrate,
    pub quiet: bool,
}

/// What happened to each song of a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub downloaded: Vec<String>,
    pub failed: Vec<(String, Error)>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Creates `path` (and its parents) when it does not exist yet.
pub fn directory_maker(path: &Path) -> Result<()> {
    if !path.is_dir() {
        std::fs::create_dir_all(path)?;
        info!("Successfully created '{}' directory.", path.display());
    }
    Ok(())
}

/// Entry point: classifies the link, fetches the song metadata and downloads
/// every song it resolves to.
pub async fn download_spotify(
    url: &str,
    credentials: &Credentials,
    options: &DownloadOptions,
) -> Result<RunSummary> {
    if !check_spotify_link(url) {
        return Err(Error::Link("Invalid Spotify link entered!".to_string()));
    }

    // The classifier only vets the URL shape; the resource-type allow-list
    // is enforced here.
    let kind = LinkType::from_str(link_type(url))?;
    let spotify_link = SpotifyLink {
        kind,
        id: resource_id(url).to_string(),
    };
    info!("Detected {kind} link.");

    let fetcher = SpotifyFetcher::new(credentials.clone());
    run_with_source(&fetcher, &YoutubeDownloader, &spotify_link, options).await
}

/// Performs the download-and-tag step for one song. A trait for the same
/// reason as `SongSource`: tests substitute an in-memory downloader.
pub trait SongDownloader {
    async fn download(
        &self,
        song: &Song,
        save_dir: &Path,
        options: &DownloadOptions,
    ) -> Result<PathBuf>;
}

/// The real downloader: YouTube audio plus tag writing.
pub struct YoutubeDownloader;

impl SongDownloader for YoutubeDownloader {
    async fn download(
        &self,
        song: &Song,
        save_dir: &Path,
        options: &DownloadOptions,
    ) -> Result<PathBuf> {
        let path = save_dir.join(song.file_name(options.codec));
        youtube::download_song(song, &path, options).await?;
        metadata::write_metadata(&path, song, save_dir, options.codec).await?;
        Ok(path)
    }
}

/// Downloads every song the link resolves to, isolating per-song failures
/// and reporting them all at the end of the run.
pub async fn run_with_source<S: SongSource, D: SongDownloader>(
    source: &S,
    downloader: &D,
    link: &SpotifyLink,
    options: &DownloadOptions,
) -> Result<RunSummary> {
    let fetched = fetch_songs(source, link).await?;

    // Albums get their own folder, named after the sanitized album name.
    let save_dir = match &fetched.collection_name {
        Some(name) => options.save_dir.join(name),
        None => options.save_dir.clone(),
    };
    directory_maker(&save_dir)?;

    let mut summary = RunSummary::default();
    for song in &fetched.songs {
        let label = song.display_title();
        info!("Downloading '{label}'...");

        match downloader.download(song, &save_dir, options).await {
            Ok(path) => {
                info!("Saved '{}'.", path.display());
                summary.downloaded.push(label);
            }
            Err(cause) => {
                error!("Failed to download '{label}': {cause}");
                summary.failed.push((label, cause));
            }
        }
    }

    if !summary.failed.is_empty() {
        error!(
            "{} of {} songs failed:",
            summary.failed.len(),
            fetched.songs.len()
        );
        for (label, cause) in &summary.failed {
            error!("  {label}: {cause}");
        }
    }

    Ok(summary)
}
