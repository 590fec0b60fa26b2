//! Image Command
//!
//! Generate an illustration for a word and save it to disk.
//!
//! Usage:
//!   wordwise image <WORD> [-o PATH]

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::cli::{CommandContext, require};
use crate::cli::ui::Output;
use crate::types::{GeneratedImage, Result, ServiceError};

pub async fn run(ctx: &CommandContext, word: &str, output: Option<PathBuf>) -> Result<()> {
    let image = require(
        ctx.assistant.word_image(word).await,
        format!("Illustration for \"{}\"", word.trim()),
    )?;

    let path = output.unwrap_or_else(|| default_path(word, &image));
    write_image(&image, &path)?;

    Output::new().success(&format!("Saved illustration to {}", path.display()));
    Ok(())
}

/// Decode the base64 payload and write it to `path`
pub fn write_image(image: &GeneratedImage, path: &Path) -> Result<()> {
    let bytes = STANDARD
        .decode(image.data_base64.trim())
        .map_err(|e| ServiceError::new(format!("Image payload is not valid base64: {}", e)))?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

fn default_path(word: &str, image: &GeneratedImage) -> PathBuf {
    let extension = match image.mime_type.as_str() {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    };
    let stem: String = word
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    PathBuf::from(format!("{}.{}", stem, extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn image(mime: &str, data: &str) -> GeneratedImage {
        GeneratedImage {
            mime_type: mime.to_string(),
            data_base64: data.to_string(),
        }
    }

    #[test]
    fn test_default_path() {
        assert_eq!(
            default_path("Ice Cream", &image("image/jpeg", "")),
            PathBuf::from("ice-cream.jpg")
        );
        assert_eq!(
            default_path("wry", &image("image/png", "")),
            PathBuf::from("wry.png")
        );
    }

    #[test]
    fn test_write_image_decodes_payload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/hello.png");

        write_image(&image("image/png", "aGVsbG8="), &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[tokio::test(start_paused = true)]
    async fn test_refused_illustration_is_an_error() {
        let mut config = crate::config::Config::default();
        config.gemini.api_key = Some("test-key".to_string());
        let ctx = CommandContext::from_config(config).unwrap();
        ctx.assistant.gateway().cooldown().trip(None);

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wry.png");
        let err = run(&ctx, "wry", Some(path.clone())).await.unwrap_err();
        assert!(matches!(err, crate::types::WordwiseError::Unavailable(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_image_rejects_bad_base64() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.png");
        assert!(write_image(&image("image/png", "@@not base64@@"), &path).is_err());
        assert!(!path.exists());
    }
}
