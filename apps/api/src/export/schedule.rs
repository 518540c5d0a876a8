//! Study-session scheduling: maps every `dailyPlan` entry to a concrete
//! calendar date by walking a cursor over the user's selected weekdays.
//!
//! The cursor is continuous across week and module boundaries, so module 2
//! picks up on the first selected weekday after module 1's last session.
//! Legacy weeks carry no day granularity and contribute no sessions.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::Deserialize;
use thiserror::Error;

use crate::roadmap::model::{RoadmapDocument, WeekPlan};

const DEFAULT_SESSION_HOURS: f64 = 2.0;
/// Upper bound on a single session. The document is client-supplied JSON,
/// so `estimatedHours` can carry any number at all.
const MAX_SESSION_HOURS: f64 = 24.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("At least one study day must be selected")]
    NoStudyDays,

    #[error("Unknown study day: {0}")]
    UnknownDay(String),

    #[error("Session time must be HH:MM, got {0}")]
    BadSessionTime(String),
}

/// Wire shape of the export request's schedule half.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub start_date: NaiveDate,
    /// Lowercase weekday names, e.g. `["monday", "wednesday", "friday"]`.
    pub study_days: Vec<String>,
    /// 24h clock, e.g. `"18:00"`.
    pub session_time: String,
}

#[derive(Debug, Clone)]
pub struct ScheduleOptions {
    pub start_date: NaiveDate,
    pub study_days: Vec<Weekday>,
    pub session_time: NaiveTime,
}

impl ScheduleOptions {
    pub fn from_request(request: &ScheduleRequest) -> Result<Self, ScheduleError> {
        if request.study_days.is_empty() {
            return Err(ScheduleError::NoStudyDays);
        }

        let mut study_days = Vec::with_capacity(request.study_days.len());
        for name in &request.study_days {
            let day = parse_weekday(name).ok_or_else(|| ScheduleError::UnknownDay(name.clone()))?;
            if !study_days.contains(&day) {
                study_days.push(day);
            }
        }

        let session_time = NaiveTime::parse_from_str(&request.session_time, "%H:%M")
            .map_err(|_| ScheduleError::BadSessionTime(request.session_time.clone()))?;

        Ok(Self {
            start_date: request.start_date,
            study_days,
            session_time,
        })
    }
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name.to_ascii_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// One scheduled study session, ready to serialize as a calendar event.
#[derive(Debug, Clone)]
pub struct StudyEvent {
    pub module_title: String,
    pub topic: String,
    pub tasks: Vec<String>,
    pub weekly_goal: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_hours: f64,
}

/// Walks modules in document order and assigns each daily-plan entry the
/// next selected weekday. Events come back grouped module-by-module.
pub fn build_events(document: &RoadmapDocument, options: &ScheduleOptions) -> Vec<StudyEvent> {
    let mut events = Vec::new();
    let mut cursor = options.start_date;

    'modules: for module in document.modules() {
        let Some(weeks) = module.weekly_breakdown.as_ref() else {
            continue;
        };
        for week in weeks {
            let WeekPlan::Daily(week) = week else {
                continue;
            };
            for day in &week.daily_plan {
                // A start date near the end of chrono's calendar can run out
                // of selectable days; stop emitting instead of spinning.
                let Some(date) = next_study_day(cursor, &options.study_days) else {
                    break 'modules;
                };

                events.push(StudyEvent {
                    module_title: module.title.clone(),
                    topic: day.topic.clone(),
                    tasks: day.tasks.clone(),
                    weekly_goal: week.weekly_goal.clone(),
                    date,
                    start_time: options.session_time,
                    duration_hours: parse_hours(day.estimated_hours.as_deref()),
                });

                let Some(next) = date.succ_opt() else {
                    break 'modules;
                };
                cursor = next;
            }
        }
    }

    events
}

/// First date at or after `from` whose weekday is selected, or `None` when
/// the calendar ends first.
fn next_study_day(from: NaiveDate, study_days: &[Weekday]) -> Option<NaiveDate> {
    let mut date = from;
    while !study_days.contains(&date.weekday()) {
        date = date.succ_opt()?;
    }
    Some(date)
}

/// Pulls the first number out of strings like "2 hours", "1.5", or "2-3
/// hours". Anything unparseable, zero, or outside a plausible session
/// length gets the default instead.
pub fn parse_hours(estimated: Option<&str>) -> f64 {
    let Some(text) = estimated else {
        return DEFAULT_SESSION_HOURS;
    };

    let number: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    number
        .parse()
        .ok()
        .filter(|h: &f64| *h > 0.0 && *h <= MAX_SESSION_HOURS)
        .unwrap_or(DEFAULT_SESSION_HOURS)
}
