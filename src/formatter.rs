use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use teloxide::utils::html;

use crate::dates::{display_date, DateRange};
use crate::models::ScheduleEntry;

const WEEKDAYS: [&str; 7] = ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб", "Вс"];

fn parse_entry_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y.%m.%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Группировка пар по дням в порядке первого появления.
/// Пары с нераспознанной датой отбрасываются.
pub fn group_by_date<'a>(
    entries: &'a [ScheduleEntry],
    range: Option<DateRange>,
) -> Vec<(NaiveDate, Vec<&'a ScheduleEntry>)> {
    let mut groups: Vec<(NaiveDate, Vec<&ScheduleEntry>)> = Vec::new();
    let mut positions: HashMap<NaiveDate, usize> = HashMap::new();

    for entry in entries {
        let Some(date) = parse_entry_date(&entry.date) else {
            log::debug!("Skipping lesson with unparsable date {:?}", entry.date);
            continue;
        };
        if range.is_some_and(|r| !r.contains(date)) {
            continue;
        }
        match positions.get(&date) {
            Some(&index) => groups[index].1.push(entry),
            None => {
                positions.insert(date, groups.len());
                groups.push((date, vec![entry]));
            }
        }
    }

    groups
}


pub fn format_schedule(entries: &[ScheduleEntry], range: Option<DateRange>) -> String {
    let mut out = String::new();

    for (date, lessons) in group_by_date(entries, range) {
        out.push_str(&format!(
            "<b>{}, {}</b>\n",
            WEEKDAYS[date.weekday().num_days_from_monday() as usize],
            display_date(date)
        ));
        for lesson in lessons {
            out.push_str(&format!(
                "  <u>{}</u> <b>{}</b>\n  {} ({})\n",
                html::escape(&lesson.begin_time),
                html::escape(&lesson.discipline),
                html::escape(&lesson.lecturer),
                html::escape(&lesson.room)
            ));
        }
        out.push('\n');
    }

    out
}
