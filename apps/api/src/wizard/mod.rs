//! Wizard form state: the single source of truth collected across the
//! resume → timeframe → jobs steps, submitted as one JSON document.
//!
//! Validation mirrors what each step enforces before letting the user
//! advance, so a direct API caller gets the same rejections the UI gives.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_JOB_URLS: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Provide a resume or describe your skills before generating a roadmap")]
    NoBackground,

    #[error("At least one job posting URL is required")]
    NoJobUrls,

    #[error("At most {MAX_JOB_URLS} job posting URLs are supported, got {0}")]
    TooManyJobUrls(usize),

    #[error("Job URL {0} must start with http:// or https://")]
    BadJobUrl(usize),

    #[error("Time frame must be between 1 and 12 months, got {0}")]
    BadTimeFrame(u32),

    #[error("Study days per week must be between 1 and 7, got {0}")]
    BadDaysPerWeek(u32),

    #[error("Resume payload is not valid base64")]
    BadResumeEncoding,

    #[error("Resume payload is not a PDF document")]
    NotAPdf,
}

/// How many hours per day the user wants to study.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyIntensity {
    Light,
    #[default]
    Moderate,
    Intensive,
}

impl StudyIntensity {
    /// The hour range quoted to the model when sizing daily plans.
    pub fn hours_per_day(self) -> &'static str {
        match self {
            StudyIntensity::Light => "1-2 hours",
            StudyIntensity::Moderate => "2-3 hours",
            StudyIntensity::Intensive => "3-4 hours",
        }
    }
}

/// Everything the wizard collects. Optional fields default to what the UI
/// pre-selects so a minimal submission behaves like an untouched form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapForm {
    /// Base64-encoded PDF resume, if uploaded.
    #[serde(default)]
    pub file_data: Option<String>,
    /// Free-text skills, if entered.
    #[serde(default)]
    pub skills: Option<String>,
    /// Target job posting URLs, 1 to [`MAX_JOB_URLS`]. Blank entries are
    /// tolerated (the UI always renders five input boxes).
    #[serde(default)]
    pub job_urls: Vec<String>,
    #[serde(default = "default_time_frame")]
    pub time_frame_months: u32,
    #[serde(default = "default_days_per_week")]
    pub days_per_week: u32,
    #[serde(default)]
    pub study_intensity: StudyIntensity,
}

fn default_time_frame() -> u32 {
    3
}

fn default_days_per_week() -> u32 {
    5
}

impl RoadmapForm {
    /// Skills text with surrounding whitespace removed, `None` when blank.
    pub fn skills_trimmed(&self) -> Option<&str> {
        self.skills
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The non-blank job URLs, in submission order.
    pub fn filled_urls(&self) -> Vec<&str> {
        self.job_urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .collect()
    }

    pub fn has_resume(&self) -> bool {
        self.file_data.as_deref().is_some_and(|d| !d.is_empty())
    }

    /// Applies every step-level rule. Returns the validated URL list so
    /// callers cannot forget to drop blank entries.
    pub fn validate(&self) -> Result<Vec<&str>, FormError> {
        if !self.has_resume() && self.skills_trimmed().is_none() {
            return Err(FormError::NoBackground);
        }

        let urls = self.filled_urls();
        if urls.is_empty() {
            return Err(FormError::NoJobUrls);
        }
        if urls.len() > MAX_JOB_URLS {
            return Err(FormError::TooManyJobUrls(urls.len()));
        }
        for (i, url) in urls.iter().enumerate() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(FormError::BadJobUrl(i + 1));
            }
        }

        if !(1..=12).contains(&self.time_frame_months) {
            return Err(FormError::BadTimeFrame(self.time_frame_months));
        }
        if !(1..=7).contains(&self.days_per_week) {
            return Err(FormError::BadDaysPerWeek(self.days_per_week));
        }

        if let Some(data) = self.file_data.as_deref().filter(|d| !d.is_empty()) {
            let bytes = BASE64
                .decode(data.trim())
                .map_err(|_| FormError::BadResumeEncoding)?;
            // The relay tags the payload application/pdf, so reject anything
            // that is not actually a PDF before it reaches the model.
            if !bytes.starts_with(b"%PDF") {
                return Err(FormError::NotAPdf);
            }
        }

        Ok(urls)
    }
}
