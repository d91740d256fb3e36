//! Locating and downloading the audio source for a song.
//!
//! The flow per song: search YouTube Music for the display title, fetch the
//! player data of the top result, download the audio stream closest to the
//! requested bitrate, then hand the raw stream to ffmpeg for transcoding.

use {
    crate::error::{Error, Result},
    crate::song::Song,
    crate::{Bitrate, DownloadOptions},
    indicatif::{ProgressBar, ProgressStyle},
    log::{debug, info},
    rustypipe::client::RustyPipe,
    std::path::{Path, PathBuf},
    tokio::{fs, io::AsyncWriteExt, process::Command},
};

/// Downloads and transcodes the audio for one song into `destination`.
pub async fn download_song(song: &Song, destination: &Path, options: &DownloadOptions) -> Result<()> {
    let query = song.display_title();
    let video_id = search(&query).await?;
    debug!("'{query}' matched video {video_id}");

    let source_path = download_audio(&video_id, destination, options).await?;
    transcode(&source_path, destination, options).await?;
    fs::remove_file(&source_path).await?;
    Ok(())
}

/// Returns the video id of the top YouTube Music result for `query`.
async fn search(query: &str) -> Result<String> {
    let rp = RustyPipe::new();
    let results = rp
        .query()
        .music_search_tracks(query)
        .await
        .map_err(|e| Error::Youtube(Box::new(e)))?;

    let track = results
        .items
        .items
        .into_iter()
        .next()
        .ok_or_else(|| Error::NoAudioSource(query.to_string()))?;
    Ok(track.id)
}

/// Index of the stream whose bitrate best satisfies the requested quality.
fn pick_stream_index(bitrates: &[u32], bitrate: Bitrate) -> Option<usize> {
    match bitrate {
        Bitrate::Best => bitrates
            .iter()
            .enumerate()
            .max_by_key(|(_, rate)| **rate)
            .map(|(index, _)| index),
        Bitrate::Worst => bitrates
            .iter()
            .enumerate()
            .min_by_key(|(_, rate)| **rate)
            .map(|(index, _)| index),
        Bitrate::Kbps(kbps) => {
            let target = kbps * 1000;
            bitrates
                .iter()
                .enumerate()
                .min_by_key(|(_, rate)| rate.abs_diff(target))
                .map(|(index, _)| index)
        }
    }
}

/// Downloads the selected audio stream next to `destination`, returning the
/// path of the raw stream file.
async fn download_audio(
    video_id: &str,
    destination: &Path,
    options: &DownloadOptions,
) -> Result<PathBuf> {
    let rp = RustyPipe::new();
    let player = rp
        .query()
        .player(video_id)
        .await
        .map_err(|e| Error::Youtube(Box::new(e)))?;

    let bitrates: Vec<u32> = player.audio_streams.iter().map(|stream| stream.bitrate).collect();
    let index = pick_stream_index(&bitrates, options.bitrate)
        .ok_or_else(|| Error::NoAudioSource(video_id.to_string()))?;
    let stream = &player.audio_streams[index];

    let source_path = destination.with_extension("source");
    let mut response = reqwest::get(&stream.url).await?;

    let bar = if options.quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(response.content_length().unwrap_or(0));
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {bytes}/{total_bytes} {bytes_per_sec}")
                .unwrap(),
        );
        bar
    };

    let mut file = fs::File::create(&source_path).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        bar.inc(chunk.len() as u64);
    }
    file.flush().await?;
    bar.finish_and_clear();

    Ok(source_path)
}

/// Transcodes the raw stream into the requested codec and bitrate.
async fn transcode(source: &Path, destination: &Path, options: &DownloadOptions) -> Result<()> {
    info!(
        "Transcoding to {} at {} quality.",
        options.codec, options.bitrate
    );

    let mut command = Command::new("ffmpeg");
    command.arg("-y").arg("-i").arg(source).arg("-vn");
    command.arg("-acodec").arg(options.codec.encoder());
    // best/worst keep whatever the source stream carries.
    if let Bitrate::Kbps(kbps) = options.bitrate {
        command.arg("-b:a").arg(format!("{kbps}k"));
    }
    command.arg(destination);

    let output = command.output().await?;
    if !output.status.success() {
        return Err(Error::Transcode(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(())
}

/// Checks whether an ffmpeg binary is reachable on PATH, so the user gets one
/// clear startup error instead of a transcode failure per song.
pub fn check_ffmpeg_installed() -> bool {
    let finder = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };

    std::process::Command::new(finder)
        .arg("ffmpeg")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_picks_the_highest_bitrate() {
        assert_eq!(pick_stream_index(&[64_000, 160_000, 128_000], Bitrate::Best), Some(1));
    }

    #[test]
    fn worst_picks_the_lowest_bitrate() {
        assert_eq!(pick_stream_index(&[64_000, 160_000, 128_000], Bitrate::Worst), Some(0));
    }

    #[test]
    fn numeric_bitrate_picks_the_closest_stream() {
        assert_eq!(
            pick_stream_index(&[64_000, 160_000, 128_000], Bitrate::Kbps(128)),
            Some(2)
        );
        assert_eq!(
            pick_stream_index(&[64_000, 160_000, 128_000], Bitrate::Kbps(320)),
            Some(1)
        );
    }

    #[test]
    fn no_streams_means_no_pick() {
        assert_eq!(pick_stream_index(&[], Bitrate::Best), None);
    }
}
