//! Writing tags and embedded cover art to downloaded files.

use {
    crate::AudioCodec,
    crate::error::Result,
    crate::song::Song,
    lofty::{
        config::WriteOptions,
        file::{AudioFile, TaggedFileExt},
        picture::{MimeType, Picture, PictureType},
        read_from_path,
        tag::{Accessor, Tag},
    },
    log::{info, warn},
    std::path::{Path, PathBuf},
};

fn detect_image_mime_type(bytes: &[u8]) -> MimeType {
    if bytes.len() < 4 {
        return MimeType::Jpeg;
    }

    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return MimeType::Jpeg;
    }

    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return MimeType::Png;
    }

    MimeType::Jpeg
}

/// Downloads cover art into `<save_dir>/album-art/<title>.jpeg` and returns
/// the cache path. When the file already exists no request is made and the
/// existing path is returned as-is.
pub async fn download_album_art(save_dir: &Path, link: &str, title: &str) -> Result<PathBuf> {
    let folder = save_dir.join("album-art");
    crate::directory_maker(&folder)?;

    let download_path = folder.join(format!("{title}.jpeg"));
    if download_path.is_file() {
        info!("Using cached album art for '{title}'.");
        return Ok(download_path);
    }

    let bytes = reqwest::get(link).await?.bytes().await?;
    tokio::fs::write(&download_path, &bytes).await?;
    Ok(download_path)
}

/// Writes title, artists, album, disc/track numbers and the front cover
/// picture to the file at `path`.
pub async fn write_metadata(
    path: &Path,
    song: &Song,
    save_dir: &Path,
    codec: AudioCodec,
) -> Result<()> {
    let mut tagged_file = read_from_path(path)?;

    let tag = match tagged_file.primary_tag_mut() {
        Some(primary_tag) => primary_tag,
        None => {
            if let Some(first_tag) = tagged_file.first_tag_mut() {
                first_tag
            } else {
                let tag_type = tagged_file.primary_tag_type();

                warn!("No tags found, creating a new tag of type `{tag_type:?}`");
                tagged_file.insert_tag(Tag::new(tag_type));

                tagged_file.primary_tag_mut().unwrap()
            }
        }
    };

    tag.set_title(song.title.clone());
    tag.set_artist(song.artists.join(", "));
    tag.set_album(song.album_name.clone());
    tag.set_disk(song.disc_number);
    tag.set_track(song.track_number);

    let art_path = download_album_art(save_dir, &song.cover_art_url, &song.title).await?;
    let image_bytes = tokio::fs::read(&art_path).await?;
    let mime_type = detect_image_mime_type(&image_bytes);

    let front_cover = Picture::new_unchecked(
        PictureType::CoverFront,
        Some(mime_type),
        Some("Cover".to_string()),
        image_bytes,
    );
    tag.push_picture(front_cover);

    let write_options = WriteOptions::new()
        .use_id3v23(matches!(codec, AudioCodec::Mp3))
        .remove_others(false)
        .respect_read_only(false);

    tagged_file.save_to_path(path, write_options)?;

    Ok(())
}
