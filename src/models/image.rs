use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{Result, VaultError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpg,
    Webp,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Png
    }
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Webp => "webp",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub steps: u32,
    pub guidance: f32,
    pub seed: Option<i64>,
    pub width: u32,
    pub height: u32,
    pub output_format: OutputFormat,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        GenerationRequest {
            prompt: String::new(),
            steps: 28,
            guidance: 3.5,
            seed: None,
            width: 1024,
            height: 1024,
            output_format: OutputFormat::Png,
        }
    }
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VaultError::InvalidArgument(
                "width and height must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Aspect ratio in lowest terms, e.g. 1920x1080 -> "16:9"
    pub fn aspect_ratio(&self) -> String {
        let g = gcd(self.width, self.height);
        format!("{}:{}", self.width / g, self.height / g)
    }

    /// Input payload for the prediction request. `steps` is deliberately
    /// absent: the hosted model does not accept it. The square aspect ratio
    /// is the provider default and is left implicit.
    pub fn job_input(&self) -> Value {
        let mut input = json!({
            "prompt": self.prompt,
            "cfg": self.guidance,
            "output_format": self.output_format.as_str(),
        });

        if let Some(seed) = self.seed {
            input["seed"] = json!(seed);
        }

        let ratio = self.aspect_ratio();
        if ratio != "1:1" {
            input["aspect_ratio"] = json!(ratio);
        }

        input
    }
}

#[derive(Debug)]
pub struct GeneratedImage {
    pub image: image::DynamicImage,
    pub model: String,
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_reduction() {
        let mut request = GenerationRequest::default();
        assert_eq!(request.aspect_ratio(), "1:1");

        request.width = 1920;
        request.height = 1080;
        assert_eq!(request.aspect_ratio(), "16:9");

        request.width = 1024;
        request.height = 768;
        assert_eq!(request.aspect_ratio(), "4:3");

        request.width = 832;
        request.height = 1216;
        assert_eq!(request.aspect_ratio(), "13:19");

        // Scaling both dimensions by a common factor changes nothing
        request.width = 832 * 3;
        request.height = 1216 * 3;
        assert_eq!(request.aspect_ratio(), "13:19");
    }

    #[test]
    fn test_job_input_square_omits_aspect_ratio() {
        let request = GenerationRequest {
            prompt: "a lighthouse at dusk".to_string(),
            ..Default::default()
        };
        let input = request.job_input();

        assert_eq!(input["prompt"], "a lighthouse at dusk");
        assert_eq!(input["cfg"], json!(3.5));
        assert_eq!(input["output_format"], "png");
        assert!(input.get("aspect_ratio").is_none());
        assert!(input.get("seed").is_none());
    }

    #[test]
    fn test_job_input_includes_reduced_aspect_ratio() {
        let request = GenerationRequest {
            prompt: "wide".to_string(),
            width: 1920,
            height: 1080,
            ..Default::default()
        };
        assert_eq!(request.job_input()["aspect_ratio"], "16:9");
    }

    #[test]
    fn test_job_input_never_carries_steps() {
        let request = GenerationRequest {
            prompt: "x".to_string(),
            steps: 50,
            ..Default::default()
        };
        assert!(request.job_input().get("steps").is_none());
    }

    #[test]
    fn test_job_input_sends_seed_zero() {
        let request = GenerationRequest {
            prompt: "x".to_string(),
            seed: Some(0),
            ..Default::default()
        };
        assert_eq!(request.job_input()["seed"], json!(0));
    }

    #[test]
    fn test_validate_rejects_zero_dimensions() {
        let request = GenerationRequest {
            prompt: "x".to_string(),
            width: 0,
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_default_parameters() {
        let request = GenerationRequest::default();
        assert_eq!(request.steps, 28);
        assert_eq!(request.guidance, 3.5);
        assert_eq!(request.width, 1024);
        assert_eq!(request.height, 1024);
        assert_eq!(request.output_format, OutputFormat::Png);
    }
}
