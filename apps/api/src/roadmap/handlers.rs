//! Axum route handlers for the roadmap pipeline.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::export::{build_events, render_calendar, ScheduleOptions};
use crate::export::schedule::ScheduleRequest;
use crate::roadmap::model::RoadmapDocument;
use crate::roadmap::parse::{self, Extraction};
use crate::roadmap::prompts;
use crate::scrape::{FailedJob, ScrapedJob};
use crate::state::AppState;
use crate::wizard::{RoadmapForm, MAX_JOB_URLS};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Relay request: the caller assembled its own prompt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub file_data: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub job_urls: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub text: String,
    pub scraped_jobs: Vec<ScrapedJob>,
    pub failed_jobs: Vec<FailedJob>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapResponse {
    /// Present when the model's reply parsed into a roadmap document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roadmap: Option<RoadmapDocument>,
    /// Fallback when extraction failed: the model's reply verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    pub scraped_jobs: Vec<ScrapedJob>,
    pub failed_jobs: Vec<FailedJob>,
}

#[derive(Debug, Deserialize)]
pub struct IcsRequest {
    pub roadmap: RoadmapDocument,
    pub schedule: ScheduleRequest,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/generate
///
/// The literal relay contract: scrape the job URLs, append the scraped
/// content and optional skills to the caller's prompt, make exactly one
/// model call, and return the reply text untouched.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    if request.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }

    let urls: Vec<&str> = request
        .job_urls
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .collect();
    if urls.is_empty() {
        return Err(AppError::Validation(
            "At least one job posting URL is required".to_string(),
        ));
    }
    if urls.len() > MAX_JOB_URLS {
        return Err(AppError::Validation(format!(
            "At most {MAX_JOB_URLS} job posting URLs are supported, got {}",
            urls.len()
        )));
    }

    let (scraped, failed) = scrape_or_fail(&state, &urls).await?;

    let mut prompt = request.prompt.clone();
    prompt.push_str(&prompts::scraped_content_section(&scraped, &failed));
    if let Some(skills) = request.skills.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        prompt.push_str(&prompts::skills_suffix(skills));
    }

    let text = state
        .llm
        .generate(&prompt, request.file_data.as_deref())
        .await?;

    Ok(Json(GenerateResponse {
        text,
        scraped_jobs: scraped,
        failed_jobs: failed,
    }))
}

/// POST /api/v1/roadmap
///
/// Full wizard submission: validate the form, scrape, assemble the
/// aggregation prompt server-side, call the model once, and best-effort
/// parse the reply. A reply that defeats extraction degrades to `rawText`
/// instead of failing.
pub async fn handle_roadmap(
    State(state): State<AppState>,
    Json(form): Json<RoadmapForm>,
) -> Result<Json<RoadmapResponse>, AppError> {
    let urls = form
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (scraped, failed) = scrape_or_fail(&state, &urls).await?;

    let mut prompt = prompts::build_roadmap_prompt(&prompts::RoadmapPromptParams {
        job_count: scraped.len(),
        skills: form.skills_trimmed(),
        has_resume: form.has_resume(),
        months: form.time_frame_months,
        days_per_week: form.days_per_week,
        intensity: form.study_intensity,
    });
    prompt.push_str(&prompts::scraped_content_section(&scraped, &failed));

    let text = state
        .llm
        .generate(&prompt, form.file_data.as_deref())
        .await?;

    let response = match parse::extract(&text) {
        Extraction::Roadmap(mut roadmap) => {
            roadmap.set_schedule(Utc::now().date_naive(), form.days_per_week);
            info!(modules = roadmap.modules().len(), "Roadmap generated");
            RoadmapResponse {
                roadmap: Some(*roadmap),
                raw_text: None,
                scraped_jobs: scraped,
                failed_jobs: failed,
            }
        }
        Extraction::Raw(raw) => {
            info!("Model reply did not parse as a roadmap, returning raw text");
            RoadmapResponse {
                roadmap: None,
                raw_text: Some(raw),
                scraped_jobs: scraped,
                failed_jobs: failed,
            }
        }
    };

    Ok(Json(response))
}

/// POST /api/v1/roadmap/ics
///
/// Schedules every daily-plan entry onto the user's selected weekdays and
/// returns the calendar as a downloadable attachment.
pub async fn handle_roadmap_ics(
    Json(request): Json<IcsRequest>,
) -> Result<Response, AppError> {
    let options = ScheduleOptions::from_request(&request.schedule)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let events = build_events(&request.roadmap, &options);
    info!(events = events.len(), "Calendar export generated");
    let calendar = render_calendar(&events);

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"career-roadmap.ics\"",
            ),
        ],
        calendar,
    )
        .into_response())
}

/// Scrapes all URLs; an empty success set aborts before any model call.
async fn scrape_or_fail(
    state: &AppState,
    urls: &[&str],
) -> Result<(Vec<ScrapedJob>, Vec<FailedJob>), AppError> {
    let (scraped, failed) = state.scraper.scrape_all(urls).await;

    if scraped.is_empty() {
        let reasons = failed
            .iter()
            .map(|f| format!("job {} ({}): {}", f.job_number, f.url, f.reason))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AppError::Scrape(format!(
            "None of the job posting URLs could be read ({reasons}). Check the links and try again."
        )));
    }

    Ok((scraped, failed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::GeminiClient;
    use crate::scrape::{FetchError, JobScraper, PageFetcher};
    use crate::wizard::StudyIntensity;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use std::collections::HashMap;
    use std::io::Read;
    use std::sync::{mpsc, Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    const PROXY: &str = "https://reader.test";

    // ── In-process Gemini stub ──────────────────────────────────────────────

    enum StubReply {
        Text(String),
        Status(u16, String),
    }

    struct GeminiStub {
        base_url: String,
        bodies: Arc<Mutex<Vec<String>>>,
        shutdown_tx: Option<mpsc::Sender<()>>,
        handle: Option<thread::JoinHandle<()>>,
    }

    impl GeminiStub {
        fn spawn(reply: StubReply) -> Self {
            let server = tiny_http::Server::http("127.0.0.1:0").expect("start gemini stub");
            let addr = server.server_addr();
            let base_url = format!("http://{addr}/v1beta");

            let bodies = Arc::new(Mutex::new(Vec::new()));
            let seen = bodies.clone();
            let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

            let handle = thread::spawn(move || loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }
                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                seen.lock().unwrap().push(body);

                let response = match &reply {
                    StubReply::Text(text) => {
                        let payload = serde_json::json!({
                            "candidates": [
                                {"content": {"parts": [{"text": text}]}}
                            ]
                        });
                        tiny_http::Response::from_string(payload.to_string())
                    }
                    StubReply::Status(code, message) => {
                        let payload = serde_json::json!({
                            "error": {"code": code, "message": message}
                        });
                        tiny_http::Response::from_string(payload.to_string())
                            .with_status_code(*code)
                    }
                };
                let _ = request.respond(response);
            });

            Self {
                base_url,
                bodies,
                shutdown_tx: Some(shutdown_tx),
                handle: Some(handle),
            }
        }

        fn request_bodies(&self) -> Vec<String> {
            self.bodies.lock().unwrap().clone()
        }
    }

    impl Drop for GeminiStub {
        fn drop(&mut self) {
            if let Some(tx) = self.shutdown_tx.take() {
                let _ = tx.send(());
            }
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
    }

    // ── Canned page fetcher ─────────────────────────────────────────────────

    struct StubFetcher {
        responses: HashMap<String, Result<String, u16>>,
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            match self.responses.get(url) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(FetchError::Status(*status)),
                None => Err(FetchError::Status(404)),
            }
        }
    }

    fn posting(tech: &str) -> String {
        format!(
            "<html><body><div class='description'>{tech} engineer wanted. {}</div></body></html>",
            "Build and operate production systems with us. ".repeat(10)
        )
    }

    fn test_state(stub: &GeminiStub, pages: Vec<(&str, Result<String, u16>)>) -> AppState {
        let fetcher = Arc::new(StubFetcher {
            responses: pages
                .into_iter()
                .map(|(url, r)| (url.to_string(), r))
                .collect(),
        });
        AppState {
            llm: GeminiClient::new(stub.base_url.clone(), "test-key".to_string()),
            scraper: JobScraper::new(fetcher, PROXY.to_string(), 8000),
        }
    }

    fn wizard_form(urls: Vec<&str>) -> RoadmapForm {
        RoadmapForm {
            file_data: None,
            skills: Some("Python, React".to_string()),
            job_urls: urls.into_iter().map(str::to_string).collect(),
            time_frame_months: 3,
            days_per_week: 5,
            study_intensity: StudyIntensity::Moderate,
        }
    }

    const ROADMAP_REPLY: &str = r#"```json
{
  "similarJobs": true,
  "totalJobsAnalyzed": 2,
  "jobSummary": "2 backend roles",
  "modules": [
    {
      "title": "Learn Docker",
      "priority": "critical",
      "weeklyBreakdown": [
        {
          "week": 1,
          "weeklyGoal": "Basics",
          "dailyPlan": [
            {"day": 1, "topic": "Intro", "tasks": ["watch", "install"], "estimatedHours": "2 hours"}
          ]
        }
      ]
    }
  ]
}
```"#;

    // ── Relay endpoint ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_generate_makes_exactly_one_llm_call() {
        let stub = GeminiStub::spawn(StubReply::Text("model reply".to_string()));
        let state = test_state(
            &stub,
            vec![
                ("https://jobs.test/1", Ok(posting("Python"))),
                ("https://jobs.test/2", Ok(posting("Go"))),
            ],
        );

        let request = GenerateRequest {
            prompt: "analyze these postings".to_string(),
            file_data: None,
            skills: Some("Rust".to_string()),
            job_urls: vec!["https://jobs.test/1".to_string(), "https://jobs.test/2".to_string()],
        };

        let Json(response) = handle_generate(State(state), Json(request)).await.unwrap();
        assert_eq!(response.text, "model reply");
        assert_eq!(response.scraped_jobs.len(), 2);
        assert!(response.failed_jobs.is_empty());

        let bodies = stub.request_bodies();
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].contains("analyze these postings"));
        assert!(bodies[0].contains("Additional Skills: Rust"));
        assert!(bodies[0].contains("JOB 1: https://jobs.test/1"));
    }

    #[tokio::test]
    async fn test_generate_rejects_missing_urls_before_any_call() {
        let stub = GeminiStub::spawn(StubReply::Text("unused".to_string()));
        let state = test_state(&stub, vec![]);

        let request = GenerateRequest {
            prompt: "analyze".to_string(),
            file_data: None,
            skills: None,
            job_urls: vec!["  ".to_string()],
        };

        let err = handle_generate(State(state), Json(request)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(stub.request_bodies().is_empty());
    }

    #[tokio::test]
    async fn test_all_scrapes_failing_never_calls_llm() {
        let stub = GeminiStub::spawn(StubReply::Text("unused".to_string()));
        let state = test_state(
            &stub,
            vec![
                ("https://jobs.test/1", Err(524)),
                (&format!("{PROXY}/https://jobs.test/1"), Err(524)),
            ],
        );

        let request = GenerateRequest {
            prompt: "analyze".to_string(),
            file_data: None,
            skills: None,
            job_urls: vec!["https://jobs.test/1".to_string()],
        };

        let err = handle_generate(State(state), Json(request)).await.unwrap_err();
        let AppError::Scrape(message) = err else {
            panic!("expected scrape error");
        };
        assert!(message.contains("https://jobs.test/1"));
        assert!(stub.request_bodies().is_empty());
    }

    #[tokio::test]
    async fn test_partial_scrape_failure_proceeds_with_subset() {
        let stub = GeminiStub::spawn(StubReply::Text("model reply".to_string()));
        let state = test_state(
            &stub,
            vec![
                ("https://jobs.test/1", Ok(posting("Python"))),
                ("https://jobs.test/2", Err(524)),
                (&format!("{PROXY}/https://jobs.test/2"), Err(524)),
                ("https://jobs.test/3", Ok(posting("Terraform"))),
            ],
        );

        let request = GenerateRequest {
            prompt: "analyze".to_string(),
            file_data: None,
            skills: None,
            job_urls: vec![
                "https://jobs.test/1".to_string(),
                "https://jobs.test/2".to_string(),
                "https://jobs.test/3".to_string(),
            ],
        };

        let Json(response) = handle_generate(State(state), Json(request)).await.unwrap();
        assert_eq!(response.scraped_jobs.len(), 2);
        assert_eq!(response.failed_jobs.len(), 1);
        assert_eq!(response.failed_jobs[0].job_number, 2);

        // The prompt tells the model to aggregate over 2 postings, not 3.
        let bodies = stub.request_bodies();
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].contains("Job 2 (https://jobs.test/2) could not be retrieved"));
        assert!(bodies[0].contains("2 posting(s) that were retrieved, not 3"));
    }

    #[tokio::test]
    async fn test_upstream_error_surfaces_verbatim() {
        let stub = GeminiStub::spawn(StubReply::Status(429, "Quota exceeded".to_string()));
        let state = test_state(&stub, vec![("https://jobs.test/1", Ok(posting("Python")))]);

        let request = GenerateRequest {
            prompt: "analyze".to_string(),
            file_data: None,
            skills: None,
            job_urls: vec!["https://jobs.test/1".to_string()],
        };

        let err = handle_generate(State(state), Json(request)).await.unwrap_err();
        let AppError::Llm(message) = err else {
            panic!("expected llm error");
        };
        assert!(message.contains("429"));
        assert!(message.contains("Quota exceeded"));
    }

    // ── Wizard endpoint ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_roadmap_parses_and_stamps_schedule() {
        let stub = GeminiStub::spawn(StubReply::Text(ROADMAP_REPLY.to_string()));
        let state = test_state(
            &stub,
            vec![
                ("https://jobs.test/1", Ok(posting("Docker"))),
                ("https://jobs.test/2", Ok(posting("Docker"))),
            ],
        );

        let mut form = wizard_form(vec!["https://jobs.test/1", "https://jobs.test/2"]);
        form.days_per_week = 4;

        let Json(response) = handle_roadmap(State(state), Json(form)).await.unwrap();
        let roadmap = response.roadmap.expect("expected parsed roadmap");
        assert!(response.raw_text.is_none());
        assert_eq!(roadmap.modules().len(), 1);
        assert_eq!(roadmap.start_date(), Some(Utc::now().date_naive()));
        assert_eq!(roadmap.days_per_week(), Some(4));

        // Prompt was assembled server-side from the form.
        let bodies = stub.request_bodies();
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].contains("YOU WILL RECEIVE 2 JOB POSTING(S)"));
        assert!(bodies[0].contains("Skills: Python, React"));
    }

    #[tokio::test]
    async fn test_roadmap_degrades_to_raw_text() {
        let stub = GeminiStub::spawn(StubReply::Text(
            "I could not find a roadmap in these postings.".to_string(),
        ));
        let state = test_state(&stub, vec![("https://jobs.test/1", Ok(posting("Python")))]);

        let form = wizard_form(vec!["https://jobs.test/1"]);
        let Json(response) = handle_roadmap(State(state), Json(form)).await.unwrap();
        assert!(response.roadmap.is_none());
        assert_eq!(
            response.raw_text.as_deref(),
            Some("I could not find a roadmap in these postings.")
        );
    }

    #[tokio::test]
    async fn test_roadmap_rejects_invalid_form_before_any_work() {
        let stub = GeminiStub::spawn(StubReply::Text("unused".to_string()));
        let state = test_state(&stub, vec![]);

        let mut form = wizard_form(vec!["https://jobs.test/1"]);
        form.skills = None; // no resume either

        let err = handle_roadmap(State(state), Json(form)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(stub.request_bodies().is_empty());
    }

    // ── Calendar export ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_ics_response_headers_and_body() {
        let roadmap: RoadmapDocument = serde_json::from_str(
            r#"{
                "modules": [{
                    "title": "Learn Docker",
                    "weeklyBreakdown": [{
                        "week": 1,
                        "dailyPlan": [
                            {"day": 1, "topic": "Intro", "tasks": ["watch"], "estimatedHours": "2 hours"},
                            {"day": 2, "topic": "Images", "tasks": ["build"], "estimatedHours": "2 hours"}
                        ]
                    }]
                }]
            }"#,
        )
        .unwrap();

        let request = IcsRequest {
            roadmap,
            schedule: ScheduleRequest {
                start_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
                study_days: vec!["monday".to_string(), "wednesday".to_string()],
                session_time: "18:00".to_string(),
            },
        };

        let response = handle_roadmap_ics(Json(request)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/calendar; charset=utf-8"
        );
        assert!(response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("career-roadmap.ics"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(text.matches("BEGIN:VEVENT").count(), 2);
        assert!(text.contains("DTSTART:20260105T180000"));
        assert!(text.contains("DTSTART:20260107T180000"));
    }

    #[tokio::test]
    async fn test_ics_rejects_empty_study_days() {
        let request = IcsRequest {
            roadmap: serde_json::from_str(r#"{"modules": []}"#).unwrap(),
            schedule: ScheduleRequest {
                start_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
                study_days: vec![],
                session_time: "18:00".to_string(),
            },
        };

        let err = handle_roadmap_ics(Json(request)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
