use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const BASE_PATH: &str = "images";
const FILE_PREFIX: &str = "sd3";

/// How the object key is derived. An explicit key always wins, even when the
/// organized flag is also set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStyle {
    Explicit(String),
    Organized,
    FlatDated,
}

impl KeyStyle {
    pub fn from_flags(explicit: Option<String>, organized: bool) -> Self {
        match explicit {
            Some(key) => KeyStyle::Explicit(key),
            None if organized => KeyStyle::Organized,
            None => KeyStyle::FlatDated,
        }
    }

    /// Render the key against the local wall clock.
    pub fn storage_key(&self) -> String {
        self.render_at(Local::now().date_naive())
    }

    fn render_at(&self, date: NaiveDate) -> String {
        match self {
            KeyStyle::Explicit(key) => key.clone(),
            KeyStyle::Organized => format!(
                "{}/{}/{}_{}.png",
                BASE_PATH,
                date.format("%Y/%m/%d"),
                FILE_PREFIX,
                date.format("%Y-%m-%d")
            ),
            KeyStyle::FlatDated => {
                format!("{}_{}.png", FILE_PREFIX, date.format("%Y-%m-%d"))
            }
        }
    }
}

pub fn filename_of(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

// Upload operation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResult {
    pub s3_uri: String,
    pub public_url: String,
    pub key: String,
    pub filename: String,
    pub bucket: String,
    pub region: String,
    pub is_public: bool,
    pub generated_at: DateTime<Local>,
    pub prompt: String,
    pub metadata: HashMap<String, String>,
}
