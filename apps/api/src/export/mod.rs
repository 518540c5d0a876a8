// Calendar export: turns a parsed roadmap into study sessions on the
// user's chosen weekdays, then serializes them as an ICS file.

pub mod ics;
pub mod schedule;

pub use ics::render_calendar;
pub use schedule::{build_events, ScheduleOptions, StudyEvent};
