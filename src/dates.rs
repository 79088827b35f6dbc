use chrono::{Datelike, Duration, NaiveDate};

/// Диапазон дат включительно
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn single_day(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Неделя (пн-вс), содержащая `day`
pub fn week_from_date(day: NaiveDate) -> DateRange {
    let start = day - Duration::days(day.weekday().num_days_from_monday() as i64);
    DateRange {
        start,
        end: start + Duration::days(6),
    }
}

// %Y принимает и две цифры, поэтому форматы с днём в начале идут первыми
const FULL_DATE_FORMATS: [&str; 5] = ["%d.%m.%y", "%d.%m.%Y", "%d/%m/%Y", "%Y-%m-%d", "%Y.%m.%d"];

/// Дата от пользователя; без года берётся текущий
pub fn parse_user_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    for format in FULL_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }

    let (day, month) = text.split_once('.')?;
    NaiveDate::from_ymd_opt(today.year(), month.parse().ok()?, day.parse().ok()?)
}

pub fn display_date(day: NaiveDate) -> String {
    day.format("%d.%m.%Y").to_string()
}
