use chrono::{Datelike, Duration, NaiveDate, Weekday};
use anyhow::{anyhow, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses deadline text typed into the task form.
///
/// Empty input means "no deadline". `today` anchors the relative forms:
/// `today`/`tod`, `tomorrow`/`tom`, `eow`, `eom`, `+3d`, `+2w`, `+1m`,
/// weekday names (`fri`, `2:fri`) and plain `YYYY-MM-DD`.
pub fn parse_deadline(input: &str, today: NaiveDate) -> Result<Option<NaiveDate>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    // 1. Reserved keywords
    match input.to_lowercase().as_str() {
        "today" | "tod" => return Ok(Some(today)),
        "tomorrow" | "tom" => return shift_days(today, Duration::try_days(1), input).map(Some),
        "eow" => {
            // Coming Sunday, today included
            let days_to_sunday = (7 - today.weekday().num_days_from_sunday() as i64) % 7;
            return shift_days(today, Duration::try_days(days_to_sunday), input).map(Some);
        }
        "eom" => return end_of_month(today.year(), today.month()).map(Some),
        _ => {}
    }

    // 2. Relative format (+Nd, +Nw, +Nm), N is unsigned
    if let Some(relative) = input.strip_prefix('+') {
        let invalid = || anyhow!("Invalid relative format: {}", input);
        let (split, unit) = relative.char_indices().last().ok_or_else(invalid)?;
        let num_str = &relative[..split];
        if num_str.is_empty() || !num_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let count: i64 = num_str.parse().map_err(|_| out_of_range(input))?;

        let target = match unit {
            'd' => shift_days(today, Duration::try_days(count), input)?,
            'w' => shift_days(today, Duration::try_weeks(count), input)?,
            'm' => add_months(today, count)?,
            _ => return Err(anyhow!("Unknown unit in relative time: {}", unit)),
        };
        return Ok(Some(target));
    }

    // 3. Plain date
    if let Ok(date) = NaiveDate::parse_from_str(input, DATE_FORMAT) {
        return Ok(Some(date));
    }

    // 4. Weekday format (fri, 2:fri)
    if let Some((count, day_str)) = parse_weekday_token(input) {
        if let Ok(target_weekday) = parse_weekday_str(day_str) {
            let mut days_needed = target_weekday.num_days_from_sunday() as i64
                - today.weekday().num_days_from_sunday() as i64;
            if days_needed <= 0 {
                days_needed += 7;
            }
            // 1:fri is the next Friday, 2:fri the one after that.
            let days_needed = (count - 1)
                .checked_mul(7)
                .and_then(|extra| extra.checked_add(days_needed))
                .ok_or_else(|| out_of_range(input))?;
            return shift_days(today, Duration::try_days(days_needed), input).map(Some);
        }
    }

    Err(anyhow!("Could not parse date: {}", input))
}

pub fn format_deadline(deadline: Option<NaiveDate>) -> String {
    deadline
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn add_months(date: NaiveDate, count: i64) -> Result<NaiveDate> {
    let months = (date.year() as i64 * 12 + date.month0() as i64)
        .checked_add(count)
        .ok_or_else(|| out_of_range(&format!("+{}m", count)))?;
    let year = i32::try_from(months.div_euclid(12))
        .map_err(|_| out_of_range(&format!("+{}m", count)))?;
    let month = months.rem_euclid(12) as u32 + 1;
    match NaiveDate::from_ymd_opt(year, month, date.day()) {
        Some(d) => Ok(d),
        // Jan 31 + 1m lands on the last day of February
        None => end_of_month(year, month),
    }
}

fn shift_days(date: NaiveDate, delta: Option<Duration>, input: &str) -> Result<NaiveDate> {
    delta
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| out_of_range(input))
}

fn out_of_range(input: &str) -> anyhow::Error {
    anyhow!("Date out of range: {}", input)
}

fn end_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .ok_or_else(|| anyhow!("Date out of range: {}-{}", year, month))
}

fn parse_weekday_token(input: &str) -> Option<(i64, &str)> {
    match input.split_once(':') {
        Some((count, day)) if count.bytes().all(|b| b.is_ascii_digit()) => {
            count.parse::<i64>().ok().filter(|c| *c > 0).map(|c| (c, day))
        }
        Some(_) => None,
        // Just "fri" means 1:fri
        None => Some((1, input)),
    }
}

fn parse_weekday_str(s: &str) -> Result<Weekday> {
    match s.to_lowercase().as_str() {
        "mon" | "monday" => Ok(Weekday::Mon),
        "tue" | "tuesday" => Ok(Weekday::Tue),
        "wed" | "wednesday" => Ok(Weekday::Wed),
        "thu" | "thursday" => Ok(Weekday::Thu),
        "fri" | "friday" => Ok(Weekday::Fri),
        "sat" | "saturday" => Ok(Weekday::Sat),
        "sun" | "sunday" => Ok(Weekday::Sun),
        _ => Err(anyhow!("Invalid weekday")),
    }
}
