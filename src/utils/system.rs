// src/utils/system.rs: System functions

use chrono::{DateTime, Local, TimeZone};

/// Run timestamp used in output folder names, as YYMMDD-HHMM.
pub fn run_datetime() -> String {
    format_run_datetime(&Local::now())
}

pub fn format_run_datetime<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%y%m%d-%H%M").to_string()
}
