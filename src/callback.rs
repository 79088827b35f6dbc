//! Данные кнопок: `prefix:payload` или `prefix@suffix[~modifier]`.

use std::fmt;
use std::str::FromStr;

use crate::error::PayloadError;
use crate::models::{EntityKind, Selection};

const MENU: &str = "menu";
const PROFILE: &str = "profile";
const SEARCH: &str = "search";
const MY: &str = "my";
const NAV: &str = "nav";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleTarget {
    /// Группа из профиля
    Mine,
    /// Выбранная в поиске группа или преподаватель
    Selected(EntityKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    Today,
    Tomorrow,
    Week,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekShift {
    Current,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    ShowMenu,
    Cancel,
    ProfileSetup,
    /// Группа из списка при настройке профиля
    ProfileGroup(i64),
    Search(EntityKind),
    /// Выбор из списка результатов поиска
    Select(Selection),
    Schedule { target: ScheduleTarget, span: Span },
    Week(WeekShift),
}

impl Span {
    fn as_str(&self) -> &'static str {
        match self {
            Span::Today => "today",
            Span::Tomorrow => "tomorrow",
            Span::Week => "week",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "today" => Some(Span::Today),
            "tomorrow" => Some(Span::Tomorrow),
            "week" => Some(Span::Week),
            _ => None,
        }
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::ShowMenu => write!(f, "{MENU}:home"),
            Callback::Cancel => write!(f, "{MENU}:cancel"),
            Callback::ProfileSetup => write!(f, "{PROFILE}:setup"),
            Callback::ProfileGroup(id) => write!(f, "{PROFILE}:{id}"),
            Callback::Search(kind) => write!(f, "{SEARCH}:{}", kind.as_str()),
            Callback::Select(selection) => write!(f, "{}:{}", selection.kind.as_str(), selection.id),
            Callback::Schedule { target, span } => {
                let prefix = match target {
                    ScheduleTarget::Mine => MY,
                    ScheduleTarget::Selected(kind) => kind.as_str(),
                };
                write!(f, "{prefix}@{}", span.as_str())
            }
            Callback::Week(WeekShift::Current) => write!(f, "{NAV}@week~current"),
            Callback::Week(WeekShift::Next) => write!(f, "{NAV}@week~next"),
        }
    }
}

impl FromStr for Callback {
    type Err = PayloadError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let malformed = || PayloadError::Malformed(data.to_string());
        let unknown = || PayloadError::UnknownPrefix(data.to_string());

        if let Some((prefix, payload)) = data.split_once(':') {
            return match prefix {
                MENU => match payload {
                    "home" => Ok(Callback::ShowMenu),
                    "cancel" => Ok(Callback::Cancel),
                    _ => Err(malformed()),
                },
                PROFILE => match payload {
                    "setup" => Ok(Callback::ProfileSetup),
                    id => id.parse().map(Callback::ProfileGroup).map_err(|_| malformed()),
                },
                SEARCH => EntityKind::parse(payload)
                    .map(Callback::Search)
                    .ok_or_else(malformed),
                _ => {
                    let kind = EntityKind::parse(prefix).ok_or_else(unknown)?;
                    let id = payload.parse().map_err(|_| malformed())?;
                    Ok(Callback::Select(Selection { kind, id }))
                }
            };
        }

        if let Some((prefix, rest)) = data.split_once('@') {
            let (suffix, modifier) = match rest.split_once('~') {
                Some((suffix, modifier)) => (suffix, Some(modifier)),
                None => (rest, None),
            };

            if prefix == NAV {
                return match (suffix, modifier) {
                    ("week", Some("current")) => Ok(Callback::Week(WeekShift::Current)),
                    ("week", Some("next")) => Ok(Callback::Week(WeekShift::Next)),
                    _ => Err(malformed()),
                };
            }

            let target = match prefix {
                MY => ScheduleTarget::Mine,
                other => ScheduleTarget::Selected(EntityKind::parse(other).ok_or_else(unknown)?),
            };
            if modifier.is_some() {
                return Err(malformed());
            }
            let span = Span::parse(suffix).ok_or_else(malformed)?;
            return Ok(Callback::Schedule { target, span });
        }

        Err(unknown())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_button_payload_decodes_back() {
        let callbacks = [
            Callback::ShowMenu,
            Callback::Cancel,
            Callback::ProfileSetup,
            Callback::ProfileGroup(546),
            Callback::Search(EntityKind::Teacher),
            Callback::Select(Selection { kind: EntityKind::Group, id: 12 }),
            Callback::Schedule { target: ScheduleTarget::Mine, span: Span::Week },
            Callback::Schedule {
                target: ScheduleTarget::Selected(EntityKind::Teacher),
                span: Span::Tomorrow,
            },
            Callback::Week(WeekShift::Next),
        ];
        for callback in callbacks {
            let encoded = callback.to_string();
            assert!(encoded.len() <= 64, "{encoded} exceeds Telegram's limit");
            assert_eq!(encoded.parse::<Callback>(), Ok(callback));
        }
    }

    #[test]
    fn known_wire_forms() {
        assert_eq!(
            "group@today".parse::<Callback>(),
            Ok(Callback::Schedule {
                target: ScheduleTarget::Selected(EntityKind::Group),
                span: Span::Today
            })
        );
        assert_eq!("nav@week~current".parse::<Callback>(), Ok(Callback::Week(WeekShift::Current)));
        assert_eq!(
            "teacher:77".parse::<Callback>(),
            Ok(Callback::Select(Selection { kind: EntityKind::Teacher, id: 77 }))
        );
    }

    #[test]
    fn unknown_prefixes_are_reported() {
        assert!(matches!("handler:group@week".parse::<Callback>(), Err(PayloadError::UnknownPrefix(_))));
        assert!(matches!("cancel_all".parse::<Callback>(), Err(PayloadError::UnknownPrefix(_))));
        assert!(matches!("room@today".parse::<Callback>(), Err(PayloadError::UnknownPrefix(_))));
    }

    #[test]
    fn malformed_payloads_are_reported() {
        assert!(matches!("group:abc".parse::<Callback>(), Err(PayloadError::Malformed(_))));
        assert!(matches!("my@yesterday".parse::<Callback>(), Err(PayloadError::Malformed(_))));
        assert!(matches!("nav@week~later".parse::<Callback>(), Err(PayloadError::Malformed(_))));
        assert!(matches!("search:room".parse::<Callback>(), Err(PayloadError::Malformed(_))));
    }
}
