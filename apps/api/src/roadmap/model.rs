//! Typed roadmap document: the parsed shape of the model's JSON reply.
//!
//! Two generations of the wire format exist. The current one is an object
//! carrying multi-job aggregation metadata next to its `modules` array; the
//! older one is a bare array of modules. Both deserialize into
//! [`RoadmapDocument`], and everything downstream (rendering, calendar
//! export) works off these types instead of re-probing loose JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A parsed roadmap in either wire generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoadmapDocument {
    Aggregated(AggregatedRoadmap),
    Legacy(Vec<Module>),
}

impl RoadmapDocument {
    pub fn modules(&self) -> &[Module] {
        match self {
            RoadmapDocument::Aggregated(doc) => &doc.modules,
            RoadmapDocument::Legacy(modules) => modules,
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        match self {
            RoadmapDocument::Aggregated(doc) => doc.start_date,
            RoadmapDocument::Legacy(_) => None,
        }
    }

    pub fn days_per_week(&self) -> Option<u32> {
        match self {
            RoadmapDocument::Aggregated(doc) => doc.days_per_week,
            RoadmapDocument::Legacy(_) => None,
        }
    }

    /// Stamps schedule metadata onto the document after a successful parse.
    /// Legacy arrays have nowhere to carry it and are left untouched.
    pub fn set_schedule(&mut self, start_date: NaiveDate, days_per_week: u32) {
        if let RoadmapDocument::Aggregated(doc) = self {
            doc.start_date = Some(start_date);
            doc.days_per_week = Some(days_per_week);
        }
    }
}

/// Multi-job aggregated roadmap. All analysis metadata is optional; only the
/// module list is required. The single-job fields (`job_requirements`,
/// `job_posting_preview`, flat `missing_skills`) survive for documents
/// produced before the multi-job format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRoadmap {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similar_jobs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_jobs_analyzed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technology_frequency: Option<TechnologyFrequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_skills: Option<SkillGaps>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_requirements: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_posting_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_per_week: Option<u32>,
    pub modules: Vec<Module>,
}

/// How often each technology appeared across the analyzed postings.
/// critical = all jobs, high = 50%+, medium = 2+, low = 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnologyFrequency {
    #[serde(default)]
    pub critical: Vec<String>,
    #[serde(default)]
    pub high: Vec<String>,
    #[serde(default)]
    pub medium: Vec<String>,
    #[serde(default)]
    pub low: Vec<String>,
}

/// Skill gaps, either bucketed by priority (current format) or as a flat
/// list (single-job era).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SkillGaps {
    Buckets(SkillGapBuckets),
    Flat(Vec<String>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillGapBuckets {
    #[serde(default)]
    pub critical: Vec<String>,
    #[serde(default)]
    pub high: Vec<String>,
    #[serde(default)]
    pub medium: Vec<String>,
    #[serde(default)]
    pub low: Vec<String>,
}

/// One technology to learn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_breakdown: Option<Vec<WeekPlan>>,
}

/// Module priority from the frequency aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

// Models occasionally capitalize the priority value, so matching is
// case-insensitive even though we always serialize lowercase.
impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        match value.to_ascii_lowercase().as_str() {
            "critical" => Ok(Priority::Critical),
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["critical", "high", "medium", "low"],
            )),
        }
    }
}

/// One week inside a module, in either wire generation. Ordering matters:
/// a week with a `dailyPlan` is a [`DailyWeek`]; anything else falls back to
/// the legacy topics/goals shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeekPlan {
    Daily(DailyWeek),
    Legacy(LegacyWeek),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWeek {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_goal: Option<String>,
    pub daily_plan: Vec<DayPlan>,
}

/// Week shape from before day-granular plans existed. Carries no schedule
/// information beyond a coarse hour estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyWeek {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week: Option<u32>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_opt_hours",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_hours: Option<String>,
}

/// One study day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    pub day: u32,
    pub topic: String,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(
        default,
        deserialize_with = "de_opt_hours",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_hours: Option<String>,
}

/// `estimatedHours` arrives as "2 hours", "2-3", or sometimes a bare number.
fn de_opt_hours<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Hours {
        Text(String),
        Number(f64),
    }

    Ok(Option::<Hours>::deserialize(deserializer)?.map(|h| match h {
        Hours::Text(t) => t,
        Hours::Number(n) => n.to_string(),
    }))
}
