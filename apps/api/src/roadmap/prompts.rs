// All LLM prompt constants for the roadmap pipeline.
// Templates use {placeholder} substitution; builders below fill them in.

use crate::scrape::{FailedJob, ScrapedJob};
use crate::wizard::StudyIntensity;

/// Multi-job aggregation prompt. Replace: {job_count}, {skills_line},
/// {resume_line}, {months}, {days_per_week}, {intensity}, {intensity_hours},
/// {total_weeks}.
pub const ROADMAP_PROMPT_TEMPLATE: &str = r#"You are a career advisor analyzing MULTIPLE job postings to create a PERSONALIZED learning roadmap.

CRITICAL RULES:
1. IGNORE ALL SOFT SKILLS (communication, teamwork, problem-solving, leadership, troubleshooting, debugging)
2. ONLY extract TECHNICAL skills and technologies
3. ONLY extract specific, named technologies (Python, Java, React, AWS, Docker, Kubernetes, etc.)
4. IGNORE vague terms like "web development", "distributed systems", "machine learning" unless they name specific tools

YOU WILL RECEIVE {job_count} JOB POSTING(S). Your task:

STEP 0: ANALYZE JOB SIMILARITY
- Compare the job postings to see if they are similar career paths
- If jobs are VERY DIFFERENT (e.g., Frontend Developer vs Data Scientist), set "similarJobs": false
- If jobs are SIMILAR or OVERLAPPING (e.g., multiple Backend roles, or Full Stack roles), set "similarJobs": true

STEP 1: EXTRACT TECHNOLOGIES FROM EACH JOB
For each job posting, extract ALL specific technologies mentioned (programming languages, frameworks, databases, cloud platforms, tools, etc.)

STEP 2: AGGREGATE AND PRIORITIZE BY FREQUENCY
Count how many jobs mention each technology:
- Technologies appearing in ALL {job_count} jobs = CRITICAL
- Technologies appearing in 50%+ of jobs = HIGH PRIORITY
- Technologies appearing in 2+ jobs = MEDIUM PRIORITY
- Technologies appearing in 1 job = LOW PRIORITY

STEP 3: IDENTIFY USER'S CURRENT SKILLS
USER'S CURRENT SKILLS/EXPERIENCE:
{skills_line}
{resume_line}

STEP 4: FIND THE GAPS
Compare aggregated job requirements to user skills. What specific technologies does the user NOT have?

STEP 5: CREATE PRIORITIZED ROADMAP (MAX 7 TECHNOLOGIES)
CRITICAL RULE: Include a MAXIMUM of 7 technologies in the roadmap.
TIME CONSTRAINT: The user has {months} months and will study {days_per_week} days per week.
STUDY INTENSITY: {intensity} - {intensity_hours}/day
Structure the learning plan to fit within approximately {total_weeks} weeks total.

Priority order:
1. Include ALL CRITICAL technologies (appearing in all jobs) - these are non-negotiable
2. Include HIGH PRIORITY technologies (50%+ jobs) - focus on most industry-relevant
3. If still under 7, add MEDIUM PRIORITY - choose the most widely-used/industry-standard ones
4. SKIP LOW PRIORITY unless there's room and they're highly relevant

If you have more than 7 technologies:
- Keep all CRITICAL
- Prioritize by industry relevance and market demand
- Choose technologies that are most commonly used in the industry, have strong job market demand, and are foundational skills

Create modules starting with CRITICAL, then HIGH, then MEDIUM.

Return your response as valid JSON in this exact format:
{
"similarJobs": true,
"totalJobsAnalyzed": {job_count},
"jobSummary": "Brief description of the {job_count} jobs (e.g., '3 Backend Engineering roles focusing on distributed systems')",
"technologyFrequency": {
    "critical": ["Python", "Docker"],
    "high": ["Kubernetes", "PostgreSQL"],
    "medium": ["Redis"],
    "low": ["GraphQL"]
},
"currentSkills": ["Python", "React"],
"missingSkills": {
    "critical": ["Docker"],
    "high": ["Kubernetes", "PostgreSQL"],
    "medium": ["Redis"],
    "low": ["GraphQL"]
},
"modules": [
    {
    "title": "Learn Docker Fundamentals",
    "priority": "critical",
    "duration": "3 weeks",
    "skills": ["Docker"],
    "description": "Essential for all 3 jobs - containerization is a must-have",
    "weeklyBreakdown": [
        {
        "week": 1,
        "dailyPlan": [
            {
            "day": 1,
            "topic": "Introduction to Docker & Containers",
            "tasks": ["Watch Docker intro video", "Install Docker Desktop", "Understand containers vs VMs"],
            "estimatedHours": "2 hours"
            },
            {
            "day": 2,
            "topic": "Basic Docker Commands",
            "tasks": ["Learn docker run, ps, stop", "Pull and run official images", "Practice with nginx container"],
            "estimatedHours": "2 hours"
            }
        ],
        "weeklyGoal": "Understand containerization basics and run your first containers"
        }
    ],
    "resources": ["Docker Official Tutorial", "FreeCodeCamp Docker Course", "Docker Practice Labs"]
    }
]
}

CRITICAL REQUIREMENTS:
- MAXIMUM 7 MODULES (technologies) - Be selective! Choose the most industry-relevant technologies
- TIME FRAME: {months} months, {days_per_week} days/week - Total ~{total_weeks} weeks
- Each module = ONE technology with a "weeklyBreakdown" array
- Each week in weeklyBreakdown should have:
  * "week": number (1, 2, 3, etc. within that module)
  * "dailyPlan": array with {days_per_week} study days (Day 1, Day 2, etc.)
  * "weeklyGoal": what the learner achieves by week end
- Each day in dailyPlan should have:
  * "day": number (1-{days_per_week})
  * "topic": specific topic for that day
  * "tasks": array of 2-4 concrete tasks to complete
  * "estimatedHours": realistic hours matching {intensity} intensity ({intensity_hours})
- If jobs are TOO DIFFERENT (unrelated career paths), set "similarJobs": false and mention this in jobSummary
- ONLY create modules for technologies in "missingSkills"
- Include "priority" field in each module (critical/high/medium/low)
- Start with CRITICAL priority modules first, then HIGH, then MEDIUM
- Provide 3+ FREE resources per module
- Set realistic "duration" (in weeks) based on {months} months constraint"#;

/// Appended when the caller supplies free-text skills alongside a prompt.
pub const SKILLS_SUFFIX_TEMPLATE: &str = "\n\nAdditional Skills: {skills}";

pub struct RoadmapPromptParams<'a> {
    pub job_count: usize,
    pub skills: Option<&'a str>,
    pub has_resume: bool,
    pub months: u32,
    pub days_per_week: u32,
    pub intensity: StudyIntensity,
}

/// Fills the aggregation template from the wizard form values.
pub fn build_roadmap_prompt(params: &RoadmapPromptParams) -> String {
    let skills_line = match params.skills {
        Some(skills) => format!("Skills: {skills}"),
        None => "No skills provided".to_string(),
    };
    let resume_line = if params.has_resume {
        "Resume: (PDF provided with work history)"
    } else {
        "No resume provided"
    };
    let intensity = match params.intensity {
        StudyIntensity::Light => "light",
        StudyIntensity::Moderate => "moderate",
        StudyIntensity::Intensive => "intensive",
    };

    ROADMAP_PROMPT_TEMPLATE
        .replace("{job_count}", &params.job_count.to_string())
        .replace("{skills_line}", &skills_line)
        .replace("{resume_line}", resume_line)
        .replace("{months}", &params.months.to_string())
        .replace("{days_per_week}", &params.days_per_week.to_string())
        .replace("{intensity}", intensity)
        .replace("{intensity_hours}", params.intensity.hours_per_day())
        .replace("{total_weeks}", &(params.months * 4).to_string())
}

pub fn skills_suffix(skills: &str) -> String {
    SKILLS_SUFFIX_TEMPLATE.replace("{skills}", skills)
}

/// Renders the scraped postings into the block appended after the main
/// prompt. Failed URLs get an explicit note so the model aggregates over
/// the successful count only.
pub fn scraped_content_section(scraped: &[ScrapedJob], failed: &[FailedJob]) -> String {
    let mut section = format!(
        "\n\nSCRAPED JOB POSTING CONTENT ({} posting(s)):\n",
        scraped.len()
    );

    for job in scraped {
        section.push_str(&format!(
            "\n--- JOB {}: {} ---\n{}\n",
            job.job_number, job.url, job.content
        ));
    }

    for job in failed {
        section.push_str(&format!(
            "\nNOTE: Job {} ({}) could not be retrieved ({}). Do NOT invent content for it.\n",
            job.job_number, job.url, job.reason
        ));
    }

    if !failed.is_empty() {
        section.push_str(&format!(
            "\nAnalyze and aggregate technology frequency across the {} posting(s) that were retrieved, not {}.\n",
            scraped.len(),
            scraped.len() + failed.len()
        ));
    }

    section
}
