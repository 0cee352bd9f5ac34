use chrono::{DateTime, Local};
use image::DynamicImage;
use std::collections::HashMap;

use crate::error::{Result, VaultError};
use crate::models::image::GenerationRequest;

pub const MODEL_LABEL: &str = "stable-diffusion-3.5-large";
pub const GENERATOR: &str = "replicate-client";

/// Generation parameters captured once and stamped into every record of the
/// artifact: the PNG text chunks, the S3 object metadata, and the final
/// upload summary all carry this same snapshot.
#[derive(Debug, Clone)]
pub struct ImageMetadata {
    pub prompt: String,
    pub steps: u32,
    pub guidance: f32,
    pub seed: Option<i64>,
    pub generated_at: DateTime<Local>,
}

impl ImageMetadata {
    pub fn new(request: &GenerationRequest) -> Self {
        ImageMetadata {
            prompt: request.prompt.clone(),
            steps: request.steps,
            guidance: request.guidance,
            seed: request.seed,
            generated_at: Local::now(),
        }
    }

    /// PNG text chunks, in write order. The prompt is carried verbatim here;
    /// only the S3 mirror truncates it. A seed of 0 is treated as unset.
    pub fn text_chunks(&self) -> Vec<(String, String)> {
        let mut chunks = vec![
            ("prompt".to_string(), self.prompt.clone()),
            ("steps".to_string(), self.steps.to_string()),
            ("guidance_scale".to_string(), self.guidance.to_string()),
        ];

        if let Some(seed) = self.seed.filter(|s| *s != 0) {
            chunks.push(("seed".to_string(), seed.to_string()));
        }

        chunks.push(("generated_at".to_string(), self.generated_at.to_rfc3339()));
        chunks.push(("model".to_string(), MODEL_LABEL.to_string()));
        chunks.push(("generator".to_string(), GENERATOR.to_string()));
        chunks
    }

    /// String-only mirror for S3 object metadata. Key spellings differ from
    /// the PNG chunks (`guidance`, `generated-at`) and the prompt is capped
    /// at 1024 characters to stay under the S3 metadata size limit.
    pub fn s3_metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert("prompt".to_string(), truncate_chars(&self.prompt, 1024));
        metadata.insert("steps".to_string(), self.steps.to_string());
        metadata.insert("guidance".to_string(), self.guidance.to_string());
        metadata.insert("model".to_string(), MODEL_LABEL.to_string());
        metadata.insert("generator".to_string(), GENERATOR.to_string());
        metadata.insert(
            "generated-at".to_string(),
            self.generated_at.to_rfc3339(),
        );

        if let Some(seed) = self.seed.filter(|s| *s != 0) {
            metadata.insert("seed".to_string(), seed.to_string());
        }

        metadata
    }

    /// Encode the image as PNG with the metadata embedded as text chunks.
    /// Pixel data is passed through untouched.
    pub fn encode_png(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut out = Vec::new();
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        for (key, value) in self.text_chunks() {
            // tEXt is Latin-1 only; anything wider goes into an iTXt chunk.
            if value.chars().all(|c| (c as u32) <= 0xFF) {
                encoder.add_text_chunk(key, value).map_err(|e| {
                    VaultError::ImageEncode(format!("Failed to add text chunk: {}", e))
                })?;
            } else {
                encoder.add_itxt_chunk(key, value).map_err(|e| {
                    VaultError::ImageEncode(format!("Failed to add iTXt chunk: {}", e))
                })?;
            }
        }

        let mut writer = encoder
            .write_header()
            .map_err(|e| VaultError::ImageEncode(format!("Failed to write PNG header: {}", e)))?;
        writer
            .write_image_data(&rgba.into_raw())
            .map_err(|e| VaultError::ImageEncode(format!("Failed to write PNG data: {}", e)))?;
        writer
            .finish()
            .map_err(|e| VaultError::ImageEncode(format!("Failed to finish PNG: {}", e)))?;

        Ok(out)
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn metadata_for(prompt: &str, seed: Option<i64>) -> ImageMetadata {
        ImageMetadata {
            prompt: prompt.to_string(),
            steps: 28,
            guidance: 3.5,
            seed,
            generated_at: Local::now(),
        }
    }

    fn chunk_value(chunks: &[(String, String)], key: &str) -> Option<String> {
        chunks
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    #[test]
    fn test_key_spellings_differ_between_mirrors() {
        let metadata = metadata_for("a fox", None);

        let chunks = metadata.text_chunks();
        assert!(chunk_value(&chunks, "guidance_scale").is_some());
        assert!(chunk_value(&chunks, "generated_at").is_some());
        assert_eq!(chunk_value(&chunks, "model").unwrap(), MODEL_LABEL);
        assert_eq!(chunk_value(&chunks, "generator").unwrap(), GENERATOR);

        let mirror = metadata.s3_metadata();
        assert_eq!(mirror.get("guidance").unwrap(), "3.5");
        assert!(mirror.contains_key("generated-at"));
        assert!(!mirror.contains_key("guidance_scale"));
        assert!(!mirror.contains_key("generated_at"));
    }

    #[test]
    fn test_seed_zero_is_treated_as_unset() {
        let metadata = metadata_for("x", Some(0));
        assert!(chunk_value(&metadata.text_chunks(), "seed").is_none());
        assert!(!metadata.s3_metadata().contains_key("seed"));

        let metadata = metadata_for("x", Some(42));
        assert_eq!(chunk_value(&metadata.text_chunks(), "seed").unwrap(), "42");
        assert_eq!(metadata.s3_metadata().get("seed").unwrap(), "42");
    }

    #[test]
    fn test_prompt_truncated_only_in_mirror() {
        let long_prompt = "é".repeat(2000);
        let metadata = metadata_for(&long_prompt, None);

        let png_prompt = chunk_value(&metadata.text_chunks(), "prompt").unwrap();
        assert_eq!(png_prompt.chars().count(), 2000);

        let mirror_prompt = metadata.s3_metadata().remove("prompt").unwrap();
        assert_eq!(mirror_prompt.chars().count(), 1024);
        assert!(long_prompt.starts_with(&mirror_prompt));
    }

    #[test]
    fn test_encode_png_embeds_readable_chunks() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            2,
            2,
            Rgba([10, 20, 30, 255]),
        ));
        let metadata = metadata_for("a quiet harbor", Some(7));
        let bytes = metadata.encode_png(&image).unwrap();

        let decoder = png::Decoder::new(&bytes[..]);
        let reader = decoder.read_info().unwrap();
        let info = reader.info();

        let text = |key: &str| {
            info.uncompressed_latin1_text
                .iter()
                .find(|c| c.keyword == key)
                .map(|c| c.text.clone())
        };
        assert_eq!(text("prompt").unwrap(), "a quiet harbor");
        assert_eq!(text("steps").unwrap(), "28");
        assert_eq!(text("guidance_scale").unwrap(), "3.5");
        assert_eq!(text("seed").unwrap(), "7");
        assert_eq!(text("model").unwrap(), MODEL_LABEL);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 2);
        assert_eq!(decoded.height(), 2);
    }

    #[test]
    fn test_encode_png_routes_wide_text_to_itxt() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255])));
        let metadata = metadata_for("桜の下のキツネ", None);
        let bytes = metadata.encode_png(&image).unwrap();

        let decoder = png::Decoder::new(&bytes[..]);
        let reader = decoder.read_info().unwrap();
        let info = reader.info();

        assert!(info.utf8_text.iter().any(|c| c.keyword == "prompt"));
        assert!(info
            .uncompressed_latin1_text
            .iter()
            .all(|c| c.keyword != "prompt"));
    }
}
