//! Конечный автомат диалога.
//! Событие обрабатывается под блокировкой диалога: загрузка состояния,
//! переход, сохранение.

pub mod views;


use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use teloxide::types::MessageId;

use crate::api::ScheduleApi;
use crate::bot_state::BotState;
use crate::callback::{Callback, ScheduleTarget, Span, WeekShift};
use crate::database::ProfileStore;
use crate::dates::{parse_user_date, week_from_date, DateRange};
use crate::error::DialogError;
use crate::formatter::format_schedule;
use crate::lifecycle::MessageLifecycle;
use crate::models::{ConversationKey, ConversationState, DialogState, Entity, EntityKind, Selection};
use crate::resolver::{EntityResolver, Resolution};
use crate::transport::ChatTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// /start
    ShowMenu,
    /// /cancel
    Cancel,
    Text { text: String, message_id: MessageId },
    Button(Callback),
    /// Нераспознанные данные кнопки
    InvalidButton(String),
}

pub struct DialogContext<'a> {
    pub key: ConversationKey,
    pub transport: &'a dyn ChatTransport,
    pub today: NaiveDate,
    pub user_name: String,
    /// Сообщение с нажатой кнопкой
    pub origin: Option<MessageId>,
}

type Step = Result<(), DialogError>;

fn week_state(target: ScheduleTarget) -> DialogState {
    match target {
        ScheduleTarget::Mine => DialogState::AwaitWeekDate,
        ScheduleTarget::Selected(EntityKind::Group) => DialogState::AwaitWeekDateGroup,
        ScheduleTarget::Selected(EntityKind::Teacher) => DialogState::AwaitWeekDateTeacher,
    }
}

fn week_target(state: DialogState) -> Option<ScheduleTarget> {
    match state {
        DialogState::AwaitWeekDate => Some(ScheduleTarget::Mine),
        DialogState::AwaitWeekDateGroup => Some(ScheduleTarget::Selected(EntityKind::Group)),
        DialogState::AwaitWeekDateTeacher => Some(ScheduleTarget::Selected(EntityKind::Teacher)),
        _ => None,
    }
}

fn placeholder(id: i64, kind: EntityKind) -> Entity {
    Entity {
        id,
        kind,
        label: format!("№{id}"),
        description: None,
    }
}

#[derive(Clone)]
pub struct DialogEngine {
    state: BotState,
    resolver: EntityResolver,
    api: Arc<dyn ScheduleApi>,
    profiles: Arc<dyn ProfileStore>,
}

impl DialogEngine {
    pub fn new(
        state: BotState,
        resolver: EntityResolver,
        api: Arc<dyn ScheduleApi>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self { state, resolver, api, profiles }
    }

    /// Ошибки только логируются, при нарушении протокола возвращаемся в главное меню
    pub async fn handle(&self, ctx: &DialogContext<'_>, event: Event) {
        let _guard = self.state.lock(ctx.key).await;

        let mut conversation = match self.state.load(ctx.key).await {
            Ok(conversation) => conversation,
            Err(e) => {
                log::error!("Error loading state for {}: {}", ctx.key, e);
                ConversationState::default()
            }
        };
        let before = conversation.dialog_state;

        match self.dispatch(ctx, &mut conversation, event).await {
            Ok(()) => log::debug!(
                "{}: {:?} -> {:?}",
                ctx.key,
                before,
                conversation.dialog_state
            ),
            Err(DialogError::Protocol(reason)) => {
                log::warn!("⚠️ {} in {:?}: {}; resetting to menu", ctx.key, before, reason);
                conversation.selection = None;
                if let Err(e) = self.show_menu(ctx, &mut conversation).await {
                    log::error!("Error resetting {}: {}", ctx.key, e);
                }
            }
            Err(e) => log::error!("Error handling event for {}: {}", ctx.key, e),
        }

        if let Err(e) = self.state.save(ctx.key, conversation).await {
            log::error!("Error saving state for {}: {}", ctx.key, e);
        }
    }

    async fn dispatch(&self, ctx: &DialogContext<'_>, conv: &mut ConversationState, event: Event) -> Step {
        match (conv.dialog_state, event) {
            (_, Event::ShowMenu | Event::Button(Callback::ShowMenu)) => self.show_menu(ctx, conv).await,

            (_, Event::Cancel | Event::Button(Callback::Cancel)) => {
                conv.selection = None;
                self.show_menu(ctx, conv).await
            }

            (_, Event::InvalidButton(data)) => {
                Err(DialogError::Protocol(format!("unknown button payload {data:?}")))
            }

            (state, Event::Text { text, message_id }) => {
                let result = self.on_text(ctx, conv, state, &text).await;
                lifecycle(ctx).remove_incoming(message_id).await;
                result
            }

            (DialogState::Idle, Event::Button(Callback::ProfileSetup)) => {
                lifecycle(ctx)
                    .step(conv, ctx.origin, views::PROFILE_PROMPT, Some(&views::cancel_keyboard()))
                    .await?;
                conv.dialog_state = DialogState::AwaitProfileGroup;
                Ok(())
            }

            (DialogState::Idle, Event::Button(Callback::Search(kind))) => {
                lifecycle(ctx)
                    .step(conv, ctx.origin, views::search_prompt(kind), Some(&views::cancel_keyboard()))
                    .await?;
                conv.dialog_state = DialogState::awaiting_name(kind);
                Ok(())
            }

            (
                DialogState::Idle | DialogState::AwaitGroupName | DialogState::AwaitTeacherName,
                Event::Button(Callback::Select(selection)),
            ) => {
                let entity = self
                    .resolver
                    .cached(selection.id, selection.kind)
                    .await
                    .unwrap_or_else(|| placeholder(selection.id, selection.kind));
                self.select(ctx, conv, entity, ctx.origin).await
            }

            (DialogState::AwaitProfileGroup, Event::Button(Callback::ProfileGroup(id))) => {
                let group = self
                    .resolver
                    .cached(id, EntityKind::Group)
                    .await
                    .unwrap_or_else(|| placeholder(id, EntityKind::Group));
                self.save_profile(ctx, conv, group, ctx.origin).await
            }

            (DialogState::Idle, Event::Button(Callback::Schedule { target, span })) => {
                self.on_schedule_button(ctx, conv, target, span).await
            }

            (state, Event::Button(Callback::Week(shift))) if state.is_awaiting_week() => {
                let anchor = match shift {
                    WeekShift::Current => ctx.today,
                    WeekShift::Next => ctx.today + Duration::days(7),
                };
                self.show_week(ctx, conv, state, anchor, ctx.origin).await
            }

            (state, event) => Err(DialogError::Protocol(format!(
                "{event:?} has no transition from {state:?}"
            ))),
        }
    }

    async fn on_text(&self, ctx: &DialogContext<'_>, conv: &mut ConversationState, state: DialogState, text: &str) -> Step {
        match state {
            DialogState::Idle => self.show_menu(ctx, conv).await,
            DialogState::AwaitGroupName | DialogState::AwaitTeacherName => {
                let kind = state.searched_kind().unwrap_or(EntityKind::Group);
                self.search(ctx, conv, kind, text).await
            }
            DialogState::AwaitProfileGroup => self.search_profile_group(ctx, conv, text).await,
            DialogState::AwaitWeekDate | DialogState::AwaitWeekDateGroup | DialogState::AwaitWeekDateTeacher => {
                match parse_user_date(text, ctx.today) {
                    Some(anchor) => self.show_week(ctx, conv, state, anchor, None).await,
                    None => {
                        lifecycle(ctx)
                            .step(conv, None, views::WEEK_DATE_ERROR, Some(&views::weeks_keyboard()))
                            .await?;
                        Ok(())
                    }
                }
            }
        }
    }

    async fn show_menu(&self, ctx: &DialogContext<'_>, conv: &mut ConversationState) -> Step {
        conv.dialog_state = DialogState::Idle;
        lifecycle(ctx)
            .step(conv, ctx.origin, &views::greeting(&ctx.user_name), Some(&views::main_menu()))
            .await?;
        Ok(())
    }

    async fn search(&self, ctx: &DialogContext<'_>, conv: &mut ConversationState, kind: EntityKind, text: &str) -> Step {
        let lifecycle = lifecycle(ctx);
        if text.trim().is_empty() {
            lifecycle
                .step(conv, None, views::search_prompt(kind), Some(&views::cancel_keyboard()))
                .await?;
            return Ok(());
        }

        match self.resolver.resolve(text, kind).await {
            Resolution::None => {
                lifecycle
                    .step(conv, None, views::not_found(kind), Some(&views::cancel_keyboard()))
                    .await?;
            }
            Resolution::Single(entity) => {
                self.select(ctx, conv, entity, None).await?;
            }
            Resolution::Many(entities) => {
                conv.dialog_state = DialogState::Idle;
                let keyboard = views::choice_list(&entities, |entity| {
                    Callback::Select(Selection { kind, id: entity.id })
                });
                lifecycle
                    .step(conv, None, views::choice_prompt(kind), Some(&keyboard))
                    .await?;
            }
        }
        Ok(())
    }

    async fn select(&self, ctx: &DialogContext<'_>, conv: &mut ConversationState, entity: Entity, origin: Option<MessageId>) -> Step {
        conv.selection = Some(Selection { kind: entity.kind, id: entity.id });
        conv.dialog_state = DialogState::Idle;
        lifecycle(ctx)
            .step(conv, origin, &views::entity_menu_text(&entity), Some(&views::entity_menu(entity.kind)))
            .await?;
        Ok(())
    }

    async fn search_profile_group(&self, ctx: &DialogContext<'_>, conv: &mut ConversationState, text: &str) -> Step {
        let lifecycle = lifecycle(ctx);
        let resolution = if text.trim().is_empty() {
            Resolution::None
        } else {
            self.resolver.resolve(text, EntityKind::Group).await
        };

        match resolution {
            Resolution::None => {
                lifecycle
                    .step(conv, None, views::PROFILE_NOT_FOUND, Some(&views::cancel_keyboard()))
                    .await?;
                Ok(())
            }
            Resolution::Single(group) => self.save_profile(ctx, conv, group, None).await,
            Resolution::Many(groups) => {
                let keyboard = views::choice_list(&groups, |group| Callback::ProfileGroup(group.id));
                lifecycle
                    .step(conv, None, views::choice_prompt(EntityKind::Group), Some(&keyboard))
                    .await?;
                Ok(())
            }
        }
    }

    async fn save_profile(&self, ctx: &DialogContext<'_>, conv: &mut ConversationState, group: Entity, origin: Option<MessageId>) -> Step {
        conv.dialog_state = DialogState::Idle;
        let text = match self
            .profiles
            .upsert(ctx.key.chat_id.0, group.id, Some(&ctx.user_name))
            .await
        {
            Ok(profile) => {
                log::info!("👤 Profile of chat {} set to group {}", profile.chat_id, profile.group_id);
                format!("{}\n\n{}", views::profile_saved(&group), views::greeting(&ctx.user_name))
            }
            Err(e) => {
                log::error!("Error saving profile for chat {}: {}", ctx.key.chat_id, e);
                format!("{}\n\n{}", views::PROFILE_SAVE_FAILED, views::greeting(&ctx.user_name))
            }
        };
        lifecycle(ctx)
            .step(conv, origin, &text, Some(&views::main_menu()))
            .await?;
        Ok(())
    }

    // None, если для "моего" расписания не задана группа
    async fn target_entity(&self, ctx: &DialogContext<'_>, conv: &ConversationState, target: ScheduleTarget) -> Result<Option<Entity>, DialogError> {
        match target {
            ScheduleTarget::Mine => {
                let profile = match self.profiles.get(ctx.key.chat_id.0).await {
                    Ok(profile) => profile,
                    Err(e) => {
                        log::error!("Error loading profile for chat {}: {}", ctx.key.chat_id, e);
                        None
                    }
                };
                let Some(profile) = profile else {
                    return Ok(None);
                };
                let group = self
                    .resolver
                    .cached(profile.group_id, EntityKind::Group)
                    .await
                    .unwrap_or_else(|| placeholder(profile.group_id, EntityKind::Group));
                Ok(Some(group))
            }
            ScheduleTarget::Selected(kind) => match conv.selection {
                Some(selection) if selection.kind == kind => Ok(Some(
                    self.resolver
                        .cached(selection.id, kind)
                        .await
                        .unwrap_or_else(|| placeholder(selection.id, kind)),
                )),
                other => Err(DialogError::Protocol(format!(
                    "{} schedule requested with selection {other:?}",
                    kind.as_str()
                ))),
            },
        }
    }

    async fn on_schedule_button(&self, ctx: &DialogContext<'_>, conv: &mut ConversationState, target: ScheduleTarget, span: Span) -> Step {
        let Some(entity) = self.target_entity(ctx, conv, target).await? else {
            return self.explain_missing_profile(ctx, conv).await;
        };

        let day = match span {
            Span::Today => ctx.today,
            Span::Tomorrow => ctx.today + Duration::days(1),
            Span::Week => {
                lifecycle(ctx)
                    .step(conv, ctx.origin, views::WEEK_PROMPT, Some(&views::weeks_keyboard()))
                    .await?;
                conv.dialog_state = week_state(target);
                return Ok(());
            }
        };

        self.show_schedule(ctx, conv, &entity, span, DateRange::single_day(day), ctx.origin)
            .await
    }

    async fn show_week(&self, ctx: &DialogContext<'_>, conv: &mut ConversationState, state: DialogState, anchor: NaiveDate, origin: Option<MessageId>) -> Step {
        let target = week_target(state)
            .ok_or_else(|| DialogError::Protocol(format!("{state:?} is not a week state")))?;
        let Some(entity) = self.target_entity(ctx, conv, target).await? else {
            return self.explain_missing_profile(ctx, conv).await;
        };
        self.show_schedule(ctx, conv, &entity, Span::Week, week_from_date(anchor), origin)
            .await
    }

    async fn explain_missing_profile(&self, ctx: &DialogContext<'_>, conv: &mut ConversationState) -> Step {
        conv.dialog_state = DialogState::Idle;
        lifecycle(ctx)
            .step(conv, ctx.origin, views::NO_PROFILE, Some(&views::main_menu()))
            .await?;
        Ok(())
    }

    // Расписание становится текущим видом, под ним новое главное меню
    async fn show_schedule(
        &self,
        ctx: &DialogContext<'_>,
        conv: &mut ConversationState,
        entity: &Entity,
        span: Span,
        range: DateRange,
        origin: Option<MessageId>,
    ) -> Step {
        conv.dialog_state = DialogState::Idle;

        let entries = match self.api.schedule(entity.id, entity.kind, Some(range)).await {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Schedule of {} {} unavailable: {}", entity.kind.as_str(), entity.id, e);
                Vec::new()
            }
        };
        let body = format_schedule(&entries, Some(range));
        let text = views::schedule_text(entity, span, range, &body);

        let lifecycle = lifecycle(ctx);
        lifecycle.replace_view(conv, origin, &text).await?;
        lifecycle.advance(conv).await;

        let menu = ctx
            .transport
            .send(ctx.key.chat_id, &views::greeting(&ctx.user_name), Some(&views::main_menu()))
            .await?;
        lifecycle.track_transient(conv, menu);
        Ok(())
    }
}

fn lifecycle<'a>(ctx: &DialogContext<'a>) -> MessageLifecycle<'a> {
    MessageLifecycle::new(ctx.transport, ctx.key.chat_id)
}
