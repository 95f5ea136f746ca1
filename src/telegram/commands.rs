//! Command table and inbound text parsing.
//!
//! The table is built once on first use and never mutated. Each entry
//! carries the minimal role that sees the command in menus and help; the
//! engine still performs its own authorization.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::core::types::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Start,
    Help,
    Categories,
    New,
    My,
    Ticket,
    Reply,
    Close,
    Reopen,
    Queue,
    Take,
    Answer,
    Note,
    Stats,
    SetRole,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Command name without the slash
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub min_role: Role,
    pub kind: CommandKind,
    /// Reply-keyboard label that triggers the command without arguments
    pub button: Option<&'static str>,
}

impl CommandSpec {
    pub fn allowed_for(&self, role: Role) -> bool {
        rank(role) >= rank(self.min_role)
    }
}

fn rank(role: Role) -> u8 {
    match role {
        Role::Student => 0,
        Role::Teacher => 1,
        Role::Moderator => 2,
        Role::Admin => 3,
    }
}

const fn spec(
    name: &'static str,
    usage: &'static str,
    description: &'static str,
    min_role: Role,
    kind: CommandKind,
    button: Option<&'static str>,
) -> CommandSpec {
    CommandSpec {
        name,
        usage,
        description,
        min_role,
        kind,
        button,
    }
}

/// Commands in the order they appear in help and in the Telegram menu.
static COMMANDS: [CommandSpec; 16] = [
    spec("start", "/start", "главное меню", Role::Student, CommandKind::Start, None),
    spec("help", "/help", "список команд", Role::Student, CommandKind::Help, Some("❓ Помощь")),
    spec(
        "categories",
        "/categories",
        "категории обращений",
        Role::Student,
        CommandKind::Categories,
        Some("📝 Новое обращение"),
    ),
    spec(
        "new",
        "/new <категория> [low|medium|high] [anon] <текст>",
        "создать обращение",
        Role::Student,
        CommandKind::New,
        None,
    ),
    spec("my", "/my", "мои обращения", Role::Student, CommandKind::My, Some("📋 Мои обращения")),
    spec("ticket", "/ticket <id>", "открыть обращение", Role::Student, CommandKind::Ticket, None),
    spec(
        "reply",
        "/reply <id> <текст>",
        "дополнить своё обращение",
        Role::Student,
        CommandKind::Reply,
        None,
    ),
    spec("close", "/close <id>", "закрыть обращение", Role::Student, CommandKind::Close, None),
    spec(
        "reopen",
        "/reopen <id>",
        "переоткрыть закрытое обращение",
        Role::Student,
        CommandKind::Reopen,
        None,
    ),
    spec("queue", "/queue", "очередь обращений", Role::Teacher, CommandKind::Queue, Some("📥 Очередь")),
    spec("take", "/take <id>", "взять обращение в работу", Role::Teacher, CommandKind::Take, None),
    spec(
        "answer",
        "/answer <id> <текст>",
        "ответить на обращение",
        Role::Teacher,
        CommandKind::Answer,
        None,
    ),
    spec(
        "note",
        "/note <id> <текст>",
        "внутренняя заметка, автор её не увидит",
        Role::Teacher,
        CommandKind::Note,
        None,
    ),
    spec("stats", "/stats", "статистика обращений", Role::Teacher, CommandKind::Stats, Some("📊 Статистика")),
    spec(
        "setrole",
        "/setrole <user_id> <роль>",
        "изменить роль пользователя",
        Role::Admin,
        CommandKind::SetRole,
        None,
    ),
    spec(
        "delete",
        "/delete <id> [force]",
        "удалить обращение",
        Role::Admin,
        CommandKind::Delete,
        None,
    ),
];

/// Lookup by command name and by button label.
static COMMAND_TABLE: Lazy<HashMap<&'static str, &'static CommandSpec>> = Lazy::new(|| {
    let mut table = HashMap::with_capacity(COMMANDS.len() * 2);
    for command in COMMANDS.iter() {
        table.insert(command.name, command);
        if let Some(label) = command.button {
            table.insert(label, command);
        }
    }
    table
});

pub fn all() -> &'static [CommandSpec] {
    &COMMANDS
}

pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMAND_TABLE.get(name).copied()
}

/// Commands `role` may see, in table order.
pub fn available_for(role: Role) -> impl Iterator<Item = &'static CommandSpec> {
    COMMANDS.iter().filter(move |c| c.allowed_for(role))
}

/// Inbound text after classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed<'a> {
    Command { spec: &'static CommandSpec, args: &'a str },
    /// Slash command that is not in the table
    Unknown(&'a str),
    /// Free text, filed as a new ticket in the "other" category
    PlainText(&'a str),
}

/// Classifies a message. `/cmd@botname args` is accepted in group chats.
pub fn parse(text: &str) -> Parsed<'_> {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix('/') {
        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        return match lookup(&name) {
            Some(spec) => Parsed::Command { spec, args },
            None => Parsed::Unknown(head),
        };
    }

    match lookup(text) {
        Some(spec) if spec.button == Some(text) => Parsed::Command { spec, args: "" },
        _ => Parsed::PlainText(text),
    }
}

/// Splits off the first whitespace-separated word.
pub fn split_first(args: &str) -> (&str, &str) {
    match args.trim().split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (args.trim(), ""),
    }
}
