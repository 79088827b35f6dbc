//! Тексты и клавиатуры диалога.

use teloxide::utils::html;

use crate::callback::{Callback, ScheduleTarget, Span, WeekShift};
use crate::dates::{display_date, DateRange};
use crate::models::{Entity, EntityKind};
use crate::transport::{Button, Keyboard};

fn genitive(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Group => "группы",
        EntityKind::Teacher => "преподавателя",
    }
}

fn cancel_row() -> Vec<Button> {
    vec![Button::new("Отмена", Callback::Cancel)]
}

pub fn greeting(user_name: &str) -> String {
    format!(
        "Привет, <b>{}!\nЗдесь ты можешь узнать расписание.</b>",
        html::escape(user_name)
    )
}

pub fn main_menu() -> Keyboard {
    let schedule = |span| Callback::Schedule { target: ScheduleTarget::Mine, span };
    vec![
        vec![Button::new("Настройки", Callback::ProfileSetup)],
        vec![Button::new("Мое расписание на сегодня", schedule(Span::Today))],
        vec![Button::new("Мое расписание на завтра", schedule(Span::Tomorrow))],
        vec![Button::new("Мое расписание на неделю", schedule(Span::Week))],
        vec![Button::new("Поиск расписания по группе", Callback::Search(EntityKind::Group))],
        vec![Button::new(
            "Поиск расписания по преподавателю",
            Callback::Search(EntityKind::Teacher),
        )],
    ]
}

pub fn cancel_keyboard() -> Keyboard {
    vec![cancel_row()]
}

pub fn search_prompt(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Group => "Введите группу:",
        EntityKind::Teacher => "Введите имя преподавателя:",
    }
}

pub fn not_found(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Group => {
            "Мы не смогли найти ни одной подходящей группы, попробуйте ввести другой запрос."
        }
        EntityKind::Teacher => {
            "Мы не смогли найти ни одного подходящего преподавателя, попробуйте ввести другой запрос."
        }
    }
}

pub fn choice_prompt(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Group => "По вашему запросу есть вот такие группы:",
        EntityKind::Teacher => "По вашему запросу есть вот такие преподаватели:",
    }
}

/// Кнопка на каждого кандидата и кнопка отмены
pub fn choice_list(entities: &[Entity], pick: impl Fn(&Entity) -> Callback) -> Keyboard {
    let mut keyboard: Keyboard = entities
        .iter()
        .map(|entity| vec![Button::new(entity.label.clone(), pick(entity))])
        .collect();
    keyboard.push(cancel_row());
    keyboard
}

pub fn entity_menu_text(entity: &Entity) -> String {
    format!("Что показать для {} <b>{}</b>", genitive(entity.kind), html::escape(&entity.label))
}

pub fn entity_menu(kind: EntityKind) -> Keyboard {
    let schedule = |span| Callback::Schedule { target: ScheduleTarget::Selected(kind), span };
    vec![
        vec![Button::new("Расписание на сегодня", schedule(Span::Today))],
        vec![Button::new("Расписание на завтра", schedule(Span::Tomorrow))],
        vec![Button::new("Расписание на неделю", schedule(Span::Week))],
        cancel_row(),
    ]
}

pub const WEEK_PROMPT: &str = "Введите дату (любую дату в промежутке нужной недели)";

pub const WEEK_DATE_ERROR: &str =
    "Ошибка при считывании даты. Попробуйте еще раз. Пример даты: 2023-04-22";

pub fn weeks_keyboard() -> Keyboard {
    vec![
        vec![Button::new("Текущая неделя", Callback::Week(WeekShift::Current))],
        vec![Button::new("Следующая неделя", Callback::Week(WeekShift::Next))],
        cancel_row(),
    ]
}

pub const PROFILE_PROMPT: &str = "Введите свою группу (будет показываться по умолчанию):";

pub const PROFILE_NOT_FOUND: &str = "Группа не найдена, попробуйте еще раз:";

pub const PROFILE_SAVE_FAILED: &str = "Не удалось сохранить группу, попробуйте позже.";

pub fn profile_saved(group: &Entity) -> String {
    format!(
        "Группа сохранена. Теперь по умолчанию бот считает, что вы в группе <b>{}</b>",
        html::escape(&group.label)
    )
}

pub const NO_PROFILE: &str = "Мы не знаем вашу группу, чтобы показать ваше расписание. \
Задайте группу в настройках или просмотрите расписание конкретной группы.";

fn when(span: Span, range: DateRange) -> String {
    match span {
        Span::Today => format!("сегодня ({})", display_date(range.start)),
        Span::Tomorrow => format!("завтра ({})", display_date(range.start)),
        Span::Week => format!("{} - {}", display_date(range.start), display_date(range.end)),
    }
}

/// Пустой `body` означает, что пар нет
pub fn schedule_text(entity: &Entity, span: Span, range: DateRange, body: &str) -> String {
    let label = html::escape(&entity.label);
    if body.is_empty() {
        format!(
            "На {} для {} <b>{}</b> пар не найдено",
            when(span, range),
            genitive(entity.kind),
            label
        )
    } else {
        format!(
            "Расписание {} <b>{}</b> на {}\n\n{}",
            genitive(entity.kind),
            label,
            when(span, range),
            body
        )
    }
}
