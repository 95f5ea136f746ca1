//! User-facing texts: replies, ticket cards, error messages and notifications.

use chrono::{DateTime, Utc};

use super::commands::{self, CommandSpec};
use crate::core::config::limits;
use crate::core::types::{Category, Role, TicketStatus};
use crate::storage::tickets::{Ticket, TicketStats};
use crate::storage::users::User;
use crate::tickets::engine::truncate_chars;
use crate::tickets::{Action, EventKind, Submission, TicketError, TicketEvent, TicketView};

/// Keyboard to attach to a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    /// Leave whatever keyboard the user has
    Keep,
    /// Main menu for the given role
    Main(Role),
}

/// Transport-free answer to an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub menu: Menu,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            menu: Menu::Keep,
        }
    }

    pub fn with_menu(text: impl Into<String>, role: Role) -> Self {
        Self {
            text: text.into(),
            menu: Menu::Main(role),
        }
    }
}

/// Button rows of the main menu for `role`, two per row.
pub fn menu_rows(role: Role) -> Vec<Vec<&'static str>> {
    let labels: Vec<&'static str> = commands::available_for(role).filter_map(|c| c.button).collect();
    labels.chunks(2).map(|row| row.to_vec()).collect()
}

/// Cuts `text` so Telegram accepts it as one message.
pub fn fit_message(text: String) -> String {
    if text.chars().count() <= limits::MAX_MESSAGE_CHARS {
        text
    } else {
        truncate_chars(&text, limits::MAX_MESSAGE_CHARS)
    }
}

fn format_time(ts: DateTime<Utc>) -> String {
    ts.format("%d.%m.%Y %H:%M").to_string()
}

fn action_label(action: Action) -> &'static str {
    match action {
        Action::Submit => "создать обращение",
        Action::AddMessage => "дополнить обращение",
        Action::AddNote => "добавить заметку",
        Action::Assign => "взять в работу",
        Action::Respond => "ответить",
        Action::Close => "закрыть",
        Action::Reopen => "переоткрыть",
        Action::View => "просмотреть",
        Action::Delete => "удалить",
        Action::SetRole => "изменить роль",
        Action::Stats => "посмотреть статистику",
    }
}

pub fn welcome(user: &User) -> String {
    let name = user.first_name.clone().unwrap_or_else(|| user.display_name());
    let mut text = format!(
        "👋 Здравствуйте, {}!\n\nЯ бот поддержки университета. Ваша роль: {} {}.\n\n",
        name,
        user.role.emoji(),
        user.role.display_name()
    );
    if user.role.is_responder() {
        text.push_str("📥 Очередь обращений: /queue\n");
    }
    text.push_str("Задайте вопрос обычным сообщением или выберите категорию: /categories\nСписок команд: /help");
    text
}

pub fn help(role: Role) -> String {
    let mut text = String::from("📖 Доступные команды:\n\n");
    for command in commands::available_for(role) {
        text.push_str(&format!("{} — {}\n", command.usage, command.description));
    }
    text.push_str("\nЛюбое сообщение без команды создаёт обращение в категории «Другое».");
    text
}

pub fn categories() -> String {
    let mut text = String::from("📂 Категории обращений:\n\n");
    for category in Category::ALL {
        text.push_str(&format!("{} — {}\n", category.display_name(), category.as_str()));
    }
    text.push_str("\nПример: /new debts Как пересдать экзамен по физике?");
    text
}

pub fn usage(spec: &CommandSpec) -> String {
    format!("ℹ️ Использование: {}", spec.usage)
}

pub fn unknown_command(name: &str) -> String {
    format!("❓ Неизвестная команда /{}. Список команд: /help", name)
}

pub fn unknown_category(raw: &str) -> String {
    let slugs: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    format!("⚠️ Неизвестная категория «{}». Доступны: {}", raw, slugs.join(", "))
}

pub fn invalid_id(raw: &str) -> String {
    format!(
        "⚠️ «{}» не похоже на номер обращения. Укажите число или номер, например /ticket 12 или /ticket T202409-0001",
        raw
    )
}

pub fn forbidden_command() -> String {
    "⛔ Эта команда вам недоступна.".to_string()
}

fn ticket_label(ticket: &Ticket) -> String {
    format!("#{} ({})", ticket.id, ticket.ticket_number)
}

pub fn submitted(submission: &Submission) -> String {
    let ticket = &submission.ticket;
    if submission.appended {
        format!(
            "📨 Сообщение добавлено к открытому обращению {} в категории {}.\nСтатус: {}",
            ticket_label(ticket),
            ticket.category.display_name(),
            ticket.status.display_name()
        )
    } else {
        format!(
            "✅ Обращение {} создано.\nКатегория: {}\nПриоритет: {}\nТема: {}{}\n\nМы уведомим вас, когда появится ответ.",
            ticket_label(ticket),
            ticket.category.display_name(),
            ticket.priority.display_name(),
            ticket.subject,
            if ticket.anonymous { "\n🎭 Анонимно: сотрудники не увидят ваше имя" } else { "" }
        )
    }
}

/// Confirmation after a successful transition.
pub fn transitioned(action: Action, ticket: &Ticket) -> String {
    let head = match action {
        Action::AddMessage => "📨 Сообщение добавлено к обращению",
        Action::AddNote => "🔒 Заметка добавлена к обращению",
        Action::Assign => "🔄 Вы взяли в работу обращение",
        Action::Respond => "✅ Ответ отправлен по обращению",
        Action::Close => "🔒 Закрыто обращение",
        Action::Reopen => "🔓 Переоткрыто обращение",
        _ => "Обращение",
    };
    format!("{} {}.\nСтатус: {}", head, ticket_label(ticket), ticket.status.display_name())
}

pub fn deleted(ticket: &Ticket) -> String {
    format!("🗑 Обращение {} удалено.", ticket_label(ticket))
}

pub fn role_changed(user: &User) -> String {
    format!(
        "👤 Пользователь {} ({}) теперь: {} {}",
        user.display_name(),
        user.telegram_id,
        user.role.emoji(),
        user.role.display_name()
    )
}

pub fn ticket_list(title: &str, tickets: &[Ticket], empty: &str) -> String {
    if tickets.is_empty() {
        return empty.to_string();
    }
    let mut text = format!("{}\n\n", title);
    for ticket in tickets {
        let assignee = if ticket.assigned_to.is_none() && ticket.status == TicketStatus::Open {
            " · свободно"
        } else {
            ""
        };
        text.push_str(&format!(
            "{} {} · {} · {}{}\n   {}\n",
            ticket_label(ticket),
            ticket.status.display_name(),
            ticket.category.as_str(),
            ticket.priority.display_name(),
            assignee,
            ticket.subject
        ));
    }
    text.push_str("\nПодробнее: /ticket <id>");
    text
}

/// Full card: header plus the latest messages, each cut to
/// `CARD_BODY_CHARS`. The whole card always fits one Telegram message.
pub fn ticket_card(view: &TicketView) -> String {
    let ticket = &view.ticket;
    let author = match &view.owner {
        Some(owner) => owner.display_name(),
        None => "🎭 Аноним".to_string(),
    };
    let mut text = format!(
        "🎫 Обращение {}\nКатегория: {}\nСтатус: {}\nПриоритет: {}\nАвтор: {}\nСоздано: {}\nОбновлено: {}\n",
        ticket_label(ticket),
        ticket.category.display_name(),
        ticket.status.display_name(),
        ticket.priority.display_name(),
        author,
        format_time(ticket.created_at),
        format_time(ticket.updated_at)
    );
    if let Some(group) = view.owner.as_ref().and_then(|o| o.group_name.as_ref()) {
        text.push_str(&format!("Группа: {}\n", group));
    }
    if ticket.anonymous && view.owner.is_some() {
        text.push_str("🎭 Анонимное обращение\n");
    }
    if let Some(closed_at) = ticket.closed_at {
        text.push_str(&format!("Закрыто: {}\n", format_time(closed_at)));
    }

    let skipped = view.messages.len().saturating_sub(limits::CARD_MESSAGES);
    if skipped > 0 {
        text.push_str(&format!("\n… ещё {} сообщений выше\n", skipped));
    }
    for message in view.messages.iter().skip(skipped) {
        let who = if message.internal {
            "🔒 Заметка"
        } else if message.from_staff {
            "👨‍💼 Поддержка"
        } else {
            "👤 Автор"
        };
        text.push_str(&format!(
            "\n{} · {}\n{}\n",
            who,
            format_time(message.created_at),
            truncate_chars(&message.body, limits::CARD_BODY_CHARS)
        ));
    }
    fit_message(text)
}

pub fn stats(stats: &TicketStats) -> String {
    let avg = stats
        .avg_resolution_hours
        .map_or_else(|| "—".to_string(), |hours| format!("{:.1} ч", hours));
    format!(
        "📊 Статистика обращений\n\nВсего: {}\n{}: {}\n{}: {}\n{}: {}\n{}: {}\n\nБез исполнителя: {}\nСреднее время решения: {}",
        stats.total,
        TicketStatus::Open.display_name(),
        stats.open,
        TicketStatus::InProgress.display_name(),
        stats.in_progress,
        TicketStatus::Answered.display_name(),
        stats.answered,
        TicketStatus::Closed.display_name(),
        stats.closed,
        stats.unassigned,
        avg
    )
}

/// Every engine failure gets a message; nothing is swallowed.
pub fn error(err: &TicketError) -> String {
    match err {
        TicketError::Unauthorized { action } => {
            format!("⛔ У вас нет прав, чтобы {}.", action_label(*action))
        }
        TicketError::InvalidTransition { from, action } => format!(
            "⚠️ Нельзя {}: обращение в статусе {}.",
            action_label(*action),
            from.display_name()
        ),
        TicketError::DuplicateOpenTicket { ticket_number } => format!(
            "⚠️ У вас уже есть открытое обращение {} в этой категории. Дополните его командой /reply.",
            ticket_number
        ),
        TicketError::WindowExpired => {
            "⌛ Срок для повторного открытия истёк. Создайте новое обращение.".to_string()
        }
        TicketError::NotFound { entity: "ticket", key } => format!("🔍 Обращение {} не найдено.", key),
        TicketError::NotFound { key, .. } => format!("🔍 Пользователь {} не найден.", key),
        TicketError::StoreUnavailable(_) => {
            "⏳ Сервис временно перегружен. Попробуйте ещё раз через минуту.".to_string()
        }
        TicketError::Store(_) => "❌ Внутренняя ошибка. Мы уже разбираемся.".to_string(),
        TicketError::Validation(reason) => format!("⚠️ Некорректный запрос: {}", reason),
    }
}

/// Text delivered to the recipient of an engine event.
pub fn notification(event: &TicketEvent) -> String {
    let label = format!("#{} ({})", event.ticket_id, event.ticket_number);
    let mut text = match event.kind {
        EventKind::Created => format!("🆕 Новое обращение {}. Взять в работу: /take {}", label, event.ticket_id),
        EventKind::OwnerMessage => format!("📨 Новое сообщение в обращении {}", label),
        EventKind::Assigned => format!("🔄 Ваше обращение {} взято в работу.", label),
        EventKind::Answered => format!("✅ Получен ответ на обращение {}", label),
        EventKind::Closed { forced: true } => format!("🔒 Обращение {} закрыто администратором.", label),
        EventKind::Closed { forced: false } => format!("🔒 Обращение {} закрыто.", label),
        EventKind::Reopened => format!("🔓 Обращение {} переоткрыто.", label),
    };
    if let Some(preview) = &event.preview {
        text.push_str("\n\n");
        text.push_str(preview);
    }
    text.push_str(&format!("\n\nПодробнее: /ticket {}", event.ticket_id));
    text
}
