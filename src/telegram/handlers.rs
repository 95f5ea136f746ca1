//! Transport-free command dispatcher.
//!
//! `dispatch` turns one inbound text into one [`Reply`]. It never talks to
//! Telegram, so the whole command surface is testable against a temporary
//! database.

use std::future::Future;

use super::commands::{self, CommandKind, CommandSpec, Parsed};
use super::render::{self, Reply};
use crate::core::config::limits;
use crate::core::retry::{retry, RetryConfig};
use crate::core::types::{Category, Priority, Role};
use crate::storage::users::{User, UserProfile};
use crate::tickets::{Action, TicketEngine, TicketError, TicketOptions, TicketRef, TicketResult};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub engine: TicketEngine,
    /// Backoff for transient store failures
    pub store_retry: RetryConfig,
}

impl HandlerDeps {
    pub fn new(engine: TicketEngine) -> Self {
        Self {
            engine,
            store_retry: RetryConfig::store(),
        }
    }

    #[must_use]
    pub fn with_store_retry(mut self, config: RetryConfig) -> Self {
        self.store_retry = config;
        self
    }
}

/// Runs an engine call, retrying while the store reports itself unavailable.
async fn with_retry<T, F, Fut>(deps: &HandlerDeps, op: F) -> TicketResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TicketResult<T>>,
{
    retry(&deps.store_retry, op).await
}

/// Registers (or refreshes) the sender before their message is handled.
pub async fn ensure_user_exists(deps: &HandlerDeps, profile: UserProfile) -> TicketResult<User> {
    with_retry(deps, || deps.engine.register_user(profile.clone())).await
}

/// Handles one message from `user`.
pub async fn dispatch(deps: &HandlerDeps, user: &User, text: &str) -> Reply {
    match commands::parse(text) {
        Parsed::Command { spec, args } => {
            if !spec.allowed_for(user.role) {
                log::info!("User {} ({}) tried /{}", user.telegram_id, user.role, spec.name);
                return Reply::text(render::forbidden_command());
            }
            run_command(deps, user, spec, args).await
        }
        Parsed::Unknown(name) => Reply::text(render::unknown_command(name)),
        Parsed::PlainText(body) => submit(deps, user, Category::Other, body, TicketOptions::default()).await,
    }
}

async fn run_command(deps: &HandlerDeps, user: &User, spec: &'static CommandSpec, args: &str) -> Reply {
    let uid = user.telegram_id;
    let engine = &deps.engine;

    match spec.kind {
        CommandKind::Start => Reply::with_menu(render::welcome(user), user.role),
        CommandKind::Help => Reply::with_menu(render::help(user.role), user.role),
        CommandKind::Categories => Reply::text(render::categories()),

        CommandKind::New => {
            let (raw_category, rest) = commands::split_first(args);
            let (options, body) = ticket_options(rest);
            if raw_category.is_empty() || body.is_empty() {
                return Reply::text(format!("{}\n\n{}", render::usage(spec), render::categories()));
            }
            match raw_category.parse::<Category>() {
                Ok(category) => submit(deps, user, category, body, options).await,
                Err(_) => Reply::text(render::unknown_category(raw_category)),
            }
        }

        CommandKind::My => {
            let result = with_retry(deps, || engine.list_own(uid, limits::LIST_LIMIT)).await;
            render_result(result, |tickets| {
                render::ticket_list(
                    "📋 Ваши обращения:",
                    &tickets,
                    "У вас пока нет обращений. Просто напишите свой вопрос.",
                )
            })
        }

        CommandKind::Queue => {
            let result = with_retry(deps, || engine.list_queue(uid, limits::LIST_LIMIT)).await;
            render_result(result, |tickets| {
                render::ticket_list("📥 Очередь обращений:", &tickets, "📭 Очередь пуста.")
            })
        }

        CommandKind::Stats => {
            let result = with_retry(deps, || engine.stats(uid)).await;
            render_result(result, |stats| render::stats(&stats))
        }

        CommandKind::Ticket => match ticket_id(spec, args) {
            Ok((id, _)) => {
                let result = with_retry(deps, || engine.get_ticket(id.clone(), uid)).await;
                render_result(result, |view| render::ticket_card(&view))
            }
            Err(reply) => reply,
        },

        CommandKind::Take => transition(deps, spec, args, Action::Assign, |id| engine.assign(id, uid)).await,
        CommandKind::Close => transition(deps, spec, args, Action::Close, |id| engine.close(id, uid)).await,
        CommandKind::Reopen => transition(deps, spec, args, Action::Reopen, |id| engine.reopen(id, uid)).await,

        CommandKind::Reply => match ticket_id_with_text(spec, args) {
            Ok((id, body)) => {
                let result = with_retry(deps, || engine.add_message(id.clone(), uid, body)).await;
                render_result(result, |ticket| render::transitioned(Action::AddMessage, &ticket))
            }
            Err(reply) => reply,
        },

        CommandKind::Answer => match ticket_id_with_text(spec, args) {
            Ok((id, body)) => {
                let result = with_retry(deps, || engine.respond(id.clone(), uid, body)).await;
                render_result(result, |ticket| render::transitioned(Action::Respond, &ticket))
            }
            Err(reply) => reply,
        },

        CommandKind::Note => match ticket_id_with_text(spec, args) {
            Ok((id, body)) => {
                let result = with_retry(deps, || engine.add_note(id.clone(), uid, body)).await;
                render_result(result, |ticket| render::transitioned(Action::AddNote, &ticket))
            }
            Err(reply) => reply,
        },

        CommandKind::SetRole => {
            let (raw_target, raw_role) = commands::split_first(args);
            let (Ok(target), Ok(role)) = (raw_target.parse::<i64>(), raw_role.parse::<Role>()) else {
                return Reply::text(render::usage(spec));
            };
            let result = with_retry(deps, || engine.set_role(uid, target, role)).await;
            render_result(result, |updated| render::role_changed(&updated))
        }

        CommandKind::Delete => match ticket_id(spec, args) {
            Ok((id, rest)) => {
                let force = rest.eq_ignore_ascii_case("force");
                if !rest.is_empty() && !force {
                    return Reply::text(render::usage(spec));
                }
                let result = with_retry(deps, || engine.delete(id.clone(), uid, force)).await;
                render_result(result, |ticket| render::deleted(&ticket))
            }
            Err(reply) => reply,
        },
    }
}

async fn submit(deps: &HandlerDeps, user: &User, category: Category, body: &str, options: TicketOptions) -> Reply {
    let result = with_retry(deps, || deps.engine.submit_with(user.telegram_id, category, body, options)).await;
    render_result(result, |submission| render::submitted(&submission))
}

/// Takes the leading `low|medium|high` and `anon` words off a `/new` body.
fn ticket_options(args: &str) -> (TicketOptions, &str) {
    let mut options = TicketOptions::default();
    let mut rest = args.trim();
    let (mut seen_priority, mut seen_anon) = (false, false);

    loop {
        let (word, tail) = commands::split_first(rest);
        if !seen_priority {
            if let Some(priority) = Priority::ALL.into_iter().find(|p| p.as_str().eq_ignore_ascii_case(word)) {
                options.priority = priority;
                seen_priority = true;
                rest = tail;
                continue;
            }
        }
        if !seen_anon && matches!(word.to_lowercase().as_str(), "anon" | "аноним") {
            options.anonymous = true;
            seen_anon = true;
            rest = tail;
            continue;
        }
        return (options, rest);
    }
}

/// Shared path for the single-id transitions (`/take`, `/close`, `/reopen`).
async fn transition<F, Fut>(deps: &HandlerDeps, spec: &CommandSpec, args: &str, action: Action, op: F) -> Reply
where
    F: Fn(TicketRef) -> Fut,
    Fut: Future<Output = TicketResult<crate::storage::Ticket>>,
{
    let id = match ticket_id(spec, args) {
        Ok((id, _)) => id,
        Err(reply) => return reply,
    };
    let result = with_retry(deps, || op(id.clone())).await;
    render_result(result, |ticket| render::transitioned(action, &ticket))
}

fn render_result<T>(result: TicketResult<T>, ok: impl FnOnce(T) -> String) -> Reply {
    match result {
        Ok(value) => Reply::text(ok(value)),
        Err(err) => {
            match &err {
                TicketError::Store(_) | TicketError::StoreUnavailable(_) => log::error!("Ticket operation failed: {}", err),
                _ => log::debug!("Ticket operation refused: {}", err),
            }
            Reply::text(render::error(&err))
        }
    }
}

/// Parses `<id> [rest]`. Accepts `12`, `#12` and `T202409-0001`.
fn ticket_id<'a>(spec: &CommandSpec, args: &'a str) -> Result<(TicketRef, &'a str), Reply> {
    let (raw, rest) = commands::split_first(args);
    if raw.is_empty() {
        return Err(Reply::text(render::usage(spec)));
    }
    raw.parse::<TicketRef>()
        .map(|id| (id, rest))
        .map_err(|_| Reply::text(render::invalid_id(raw)))
}

fn ticket_id_with_text<'a>(spec: &CommandSpec, args: &'a str) -> Result<(TicketRef, &'a str), Reply> {
    let (id, body) = ticket_id(spec, args)?;
    if body.is_empty() {
        return Err(Reply::text(render::usage(spec)));
    }
    Ok((id, body))
}
