//! Telegram update handling.
//!
//! Every update loads the chat's [`Session`] from dialogue storage, runs one
//! intake operation and stores the session back before replying, so failed
//! operations keep whatever state the machine left for a retry.

use std::fmt::Display;
use std::sync::Arc;

use roster_core::audit::AuditStamp;
use roster_intake::{IntakeError, IntakeState, Outcome, Session};
use roster_schema::templates;
use roster_search::SearchMode;
use teloxide::dispatching::dialogue::{self, InMemStorage};
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::types::{Chat, InlineKeyboardMarkup, User};
use teloxide::utils::command::BotCommands;

use crate::app::App;
use crate::callback::CallbackAction;
use crate::commands::{Command, Lookup, UpdateArgs};
use crate::keyboards;
use crate::messages;

pub type RosterDialogue = Dialogue<Session, InMemStorage<Session>>;
type HandlerResult = anyhow::Result<()>;

/// Serve updates until Ctrl-C.
pub async fn run(bot: Bot, app: Arc<App>) {
    if let Err(error) = bot.set_my_commands(Command::bot_commands()).await {
        tracing::warn!(%error, "could not publish the command list");
    }
    tracing::info!("roster bot started");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![InMemStorage::<Session>::new(), app])
        .error_handler(LoggingErrorHandler::with_custom_text(
            "an error occurred while handling an update",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn schema() -> UpdateHandler<anyhow::Error> {
    let commands = teloxide::filter_command::<Command, _>().endpoint(on_command);
    let messages = Update::filter_message()
        .branch(commands)
        .branch(dptree::endpoint(on_message));
    let callbacks = Update::filter_callback_query().endpoint(on_callback);

    dialogue::enter::<Update, InMemStorage<Session>, Session, _>()
        .branch(messages)
        .branch(callbacks)
}

/// Text and optional keyboard of one bot reply.
struct Reply {
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    fn with_keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    fn outcome(outcome: Outcome) -> Self {
        Self {
            text: messages::outcome(&outcome),
            keyboard: keyboards::for_outcome(&outcome),
        }
    }

    async fn send(self, bot: &Bot, chat_id: ChatId) -> HandlerResult {
        let request = bot.send_message(chat_id, self.text);
        match self.keyboard {
            Some(keyboard) => request.reply_markup(keyboard).await?,
            None => request.await?,
        };
        Ok(())
    }
}

/// Whether the session holds a finished record whose commit failed.
fn can_retry(session: &Session) -> bool {
    match &session.state {
        IntakeState::NegotiatingColumn(negotiation) => negotiation.pending.is_empty(),
        IntakeState::AwaitingFieldValue(cursor) => cursor.is_complete(),
        _ => false,
    }
}

fn settle(result: Result<Reply, IntakeError>, session: &Session, chat_id: ChatId) -> Reply {
    let err = match result {
        Ok(reply) => return reply,
        Err(err) => err,
    };
    if err.is_user_error() {
        tracing::debug!(%chat_id, error = %err, "rejected input");
        return Reply::text(messages::error(&err));
    }
    tracing::error!(%chat_id, error = %err, state = %session.state, "intake operation failed");
    let reply = Reply::text(messages::error(&err));
    if can_retry(session) {
        reply.with_keyboard(keyboards::retry())
    } else {
        reply
    }
}

/// Audit name: `@username`, else the first name, else the numeric id.
fn actor_name(username: Option<&str>, first_name: Option<&str>, id: impl Display) -> String {
    username
        .map(|u| format!("@{u}"))
        .or_else(|| first_name.map(String::from))
        .unwrap_or_else(|| id.to_string())
}

fn chat_actor(chat: &Chat) -> AuditStamp {
    AuditStamp::now(actor_name(chat.username(), chat.first_name(), chat.id))
}

fn user_actor(user: &User) -> AuditStamp {
    AuditStamp::now(actor_name(
        user.username.as_deref(),
        Some(user.first_name.as_str()),
        user.id,
    ))
}

async fn on_command(
    bot: Bot,
    dialogue: RosterDialogue,
    msg: Message,
    cmd: Command,
    app: Arc<App>,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    tracing::debug!(%chat_id, command = ?cmd, "command");
    let mut session = dialogue.get_or_default().await?;

    // Commands never continue an open question.
    let cancelled = app.intake.cancel(&mut session);
    let result = run_command(&app, &mut session, cmd, &msg.chat, cancelled).await;
    let reply = settle(result, &session, chat_id);

    dialogue.update(session).await?;
    reply.send(&bot, chat_id).await
}

async fn run_command(
    app: &App,
    session: &mut Session,
    cmd: Command,
    chat: &Chat,
    cancelled: Outcome,
) -> Result<Reply, IntakeError> {
    let intake = &app.intake;
    match cmd {
        Command::Start => {
            let tables = intake.list_tables().await?;
            Ok(
                Reply::text(messages::welcome(chat.first_name(), !tables.is_empty()))
                    .with_keyboard(keyboards::table_menu(&tables)),
            )
        }
        Command::Help => Ok(Reply::text(messages::help(
            &Command::descriptions().to_string(),
        ))),
        Command::Tables => {
            let tables = intake.list_tables().await?;
            Ok(Reply::text(messages::table_list(&tables))
                .with_keyboard(keyboards::table_menu(&tables)))
        }
        Command::Columns => {
            let table = session.table.clone().ok_or(IntakeError::NoTableSelected)?;
            let columns = intake.list_columns(&table).await?;
            Ok(Reply::text(messages::columns(&table, &columns)))
        }
        Command::Add => intake.begin_guided(session).await.map(Reply::outcome),
        Command::Search(args) => {
            let Some(lookup) = Lookup::parse(&args) else {
                return Ok(Reply::text(messages::SEARCH_USAGE));
            };
            let table = session.table.clone().ok_or(IntakeError::NoTableSelected)?;
            let rows = intake
                .search_table(&table, &lookup.column, &lookup.value, SearchMode::Exact)
                .await?;
            Ok(Reply::text(messages::search_results(
                &table,
                &lookup.column,
                &lookup.value,
                &rows,
                app.result_limit,
            )))
        }
        Command::Fuzzy(args) => {
            let Some(lookup) = Lookup::parse(&args) else {
                return Ok(Reply::text(messages::FUZZY_USAGE));
            };
            let table = session.table.clone().ok_or(IntakeError::NoTableSelected)?;
            let ranked = intake
                .search_ranked(
                    &table,
                    &lookup.column,
                    &lookup.value,
                    app.fuzzy_max_distance,
                )
                .await?;
            Ok(Reply::text(messages::ranked_results(
                &table,
                &lookup.column,
                &lookup.value,
                &ranked,
                app.result_limit,
            )))
        }
        Command::Update(args) => {
            let Some(update) = UpdateArgs::parse(&args) else {
                return Ok(Reply::text(messages::UPDATE_USAGE));
            };
            intake
                .update_record(
                    session,
                    &update.lookup.column,
                    &update.lookup.value,
                    &update.changes,
                    &chat_actor(chat),
                )
                .await
                .map(Reply::outcome)
        }
        Command::Cancel => Ok(Reply::outcome(cancelled)),
        Command::Students => open_template(app, session, &templates::STUDENTS).await,
        Command::Teachers => open_template(app, session, &templates::TEACHERS).await,
        Command::Progress => open_template(app, session, &templates::STUDENT_PROGRESS).await,
    }
}

async fn open_template(
    app: &App,
    session: &mut Session,
    template: &templates::TableTemplate,
) -> Result<Reply, IntakeError> {
    app.intake
        .open_template(session, template)
        .await
        .map(Reply::outcome)
}

async fn on_message(
    bot: Bot,
    dialogue: RosterDialogue,
    msg: Message,
    app: Arc<App>,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let Some(text) = msg.text() else {
        return Reply::text(messages::NOT_TEXT).send(&bot, chat_id).await;
    };
    let mut session = dialogue.get_or_default().await?;
    tracing::debug!(%chat_id, state = %session.state, "text message");

    let result = app
        .intake
        .handle_text(&mut session, text, &chat_actor(&msg.chat))
        .await
        .map(Reply::outcome);
    let reply = settle(result, &session, chat_id);

    dialogue.update(session).await?;
    reply.send(&bot, chat_id).await
}

async fn on_callback(
    bot: Bot,
    dialogue: RosterDialogue,
    q: CallbackQuery,
    app: Arc<App>,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    let chat_id = dialogue.chat_id();
    let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
        tracing::debug!(%chat_id, data = ?q.data, "unknown callback");
        return Reply::text(messages::UNKNOWN_BUTTON).send(&bot, chat_id).await;
    };
    let mut session = dialogue.get_or_default().await?;
    tracing::debug!(%chat_id, action = %action, "callback");

    let intake = &app.intake;
    let result = match action {
        CallbackAction::SelectTable(name) => {
            intake.cancel(&mut session);
            intake.select_or_create_table(&mut session, &name).await
        }
        CallbackAction::NewTable => {
            intake.cancel(&mut session);
            Ok(intake.begin_table_creation(&mut session))
        }
        CallbackAction::Decide { step, accept } => {
            intake
                .submit_column_decision(&mut session, step, accept)
                .await
        }
        CallbackAction::Retry => intake.resume_commit(&mut session, &user_actor(&q.from)).await,
    };
    let reply = settle(result.map(Reply::outcome), &session, chat_id);

    dialogue.update(session).await?;
    reply.send(&bot, chat_id).await
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use roster_core::record::Record;
    use roster_intake::{FieldCursor, PendingNegotiation};
    use roster_sheets::SheetsError;

    use super::*;

    #[test]
    fn actor_prefers_username_then_first_name() {
        assert_eq!(actor_name(Some("ali"), Some("Ali"), 7), "@ali");
        assert_eq!(actor_name(None, Some("Ali"), 7), "Ali");
        assert_eq!(actor_name(None, None, 7), "7");
    }

    #[test]
    fn retry_is_offered_only_for_finished_records() {
        let mut session = Session::default();
        assert!(!can_retry(&session));

        session.state = IntakeState::NegotiatingColumn(PendingNegotiation {
            table: "T".into(),
            record: Record::new(),
            pending: vec!["phone".into()],
            step: 0,
        });
        assert!(!can_retry(&session));

        session.state = IntakeState::NegotiatingColumn(PendingNegotiation {
            table: "T".into(),
            record: Record::new(),
            pending: Vec::new(),
            step: 1,
        });
        assert!(can_retry(&session));

        session.state = IntakeState::AwaitingFieldValue(FieldCursor {
            table: "T".into(),
            columns: vec!["name".into()],
            position: 1,
            record: Record::new(),
        });
        assert!(can_retry(&session));
    }

    #[test]
    fn store_failure_with_finished_record_offers_retry() {
        let mut session = Session::default();
        session.state = IntakeState::NegotiatingColumn(PendingNegotiation {
            table: "T".into(),
            record: Record::new(),
            pending: Vec::new(),
            step: 1,
        });
        let err = IntakeError::Sheets(SheetsError::Api {
            status: 503,
            message: "unavailable".into(),
        });

        let reply = settle(Err(err), &session, ChatId(1));
        assert!(reply.keyboard.is_some());

        let reply = settle(Err(IntakeError::StaleDecision), &session, ChatId(1));
        assert!(reply.keyboard.is_none());
        assert_eq!(reply.text, "❌ that question was already answered");
    }
}
