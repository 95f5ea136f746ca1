use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a user inside the help desk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Student,
    Teacher,
    Moderator,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Student, Role::Teacher, Role::Moderator, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    /// Teachers, moderators and admins may take and answer tickets.
    pub fn is_responder(&self) -> bool {
        matches!(self, Role::Teacher | Role::Moderator | Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Role::Student => "🎓",
            Role::Teacher => "👨‍🏫",
            Role::Moderator => "🛡",
            Role::Admin => "👑",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Student => "Студент",
            Role::Teacher => "Преподаватель",
            Role::Moderator => "Модератор",
            Role::Admin => "Администратор",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Ticket lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Answered,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Answered,
        TicketStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Answered => "answered",
            TicketStatus::Closed => "closed",
        }
    }

    /// Statuses a new owner message can be attached to.
    pub fn accepts_owner_messages(&self) -> bool {
        matches!(self, TicketStatus::Open | TicketStatus::InProgress)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TicketStatus::Open => "🆕 Открыт",
            TicketStatus::InProgress => "🔄 В работе",
            TicketStatus::Answered => "✅ Отвечен",
            TicketStatus::Closed => "🔒 Закрыт",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TicketStatus::Open),
            "in_progress" => Ok(TicketStatus::InProgress),
            "answered" => Ok(TicketStatus::Answered),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(format!("Unknown ticket status: {}", s)),
        }
    }
}

/// Subject area a ticket is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Schedule,
    Scholarship,
    Enrollment,
    Debts,
    Practice,
    Documents,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Schedule,
        Category::Scholarship,
        Category::Enrollment,
        Category::Debts,
        Category::Practice,
        Category::Documents,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Schedule => "schedule",
            Category::Scholarship => "scholarship",
            Category::Enrollment => "enrollment",
            Category::Debts => "debts",
            Category::Practice => "practice",
            Category::Documents => "documents",
            Category::Other => "other",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Schedule => "📅 Расписание",
            Category::Scholarship => "💰 Стипендии",
            Category::Enrollment => "📝 Зачисление/Отчисление",
            Category::Debts => "📚 Задолженности",
            Category::Practice => "🏢 Практика",
            Category::Documents => "📄 Документы",
            Category::Other => "❓ Другое",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Urgency of a ticket; the responder queue serves higher levels first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Stored level, 1 to 3.
    pub fn level(&self) -> i64 {
        *self as i64
    }

    pub fn from_level(level: i64) -> Option<Self> {
        Priority::ALL.into_iter().find(|p| p.level() == level)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Priority::Low => "🟢 Низкий",
            Priority::Medium => "🟡 Средний",
            Priority::High => "🔴 Высокий",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    /// Accepts the slug or the numeric level.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s) || p.level().to_string() == s)
            .ok_or_else(|| format!("Unknown priority: {}", s))
    }
}

impl rusqlite::types::FromSql for Priority {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let level = value.as_i64()?;
        Priority::from_level(level).ok_or(rusqlite::types::FromSqlError::OutOfRange(level))
    }
}

impl rusqlite::types::ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::from(self.level()))
    }
}

// rusqlite FromSql/ToSql: the enums above are stored as their text slug.
macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl rusqlite::types::FromSql for $ty {
            fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
                let s = value.as_str()?;
                <$ty>::from_str(s)
                    .map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(std::io::Error::other(e))))
            }
        }

        impl rusqlite::types::ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::Borrowed(rusqlite::types::ValueRef::Text(
                    self.as_str().as_bytes(),
                )))
            }
        }
    };
}

sql_text_enum!(Role);
sql_text_enum!(TicketStatus);
sql_text_enum!(Category);
