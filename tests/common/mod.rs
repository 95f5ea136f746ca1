//! Common test utilities
//!
//! This module is shared across all integration tests

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use unidesk::core::types::Role;
use unidesk::storage::{create_pool, StoreSettings, User, UserProfile};
use unidesk::tickets::{Clock, Notifier, TicketEngine, TicketEvent, TicketPolicy};

/// Admin configured through `ADMIN_IDS` in every test desk
pub const ADMIN: i64 = 1;

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Keeps every event the engine publishes
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<TicketEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<TicketEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Returns and forgets the events recorded so far.
    pub fn take(&self) -> Vec<TicketEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: TicketEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Engine over a fresh database in a temporary directory
pub struct TestDesk {
    pub engine: TicketEngine,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
    _dir: TempDir,
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 10, 0, 0).unwrap()
}

impl TestDesk {
    pub async fn new() -> Self {
        Self::with_policy(TicketPolicy::default()).await
    }

    pub async fn with_policy(policy: TicketPolicy) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("desk.sqlite");
        let pool = create_pool(path.to_str().unwrap(), &StoreSettings::default()).unwrap();

        let clock = Arc::new(ManualClock::new(start_time()));
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = TicketEngine::new(pool, policy, notifier.clone())
            .with_clock(clock.clone())
            .with_admin_ids(&[ADMIN]);

        let desk = Self {
            engine,
            clock,
            notifier,
            _dir: dir,
        };
        desk.engine.register_user(profile(ADMIN, "Admin")).await.unwrap();
        desk
    }

    /// Registers `id` and gives them `role`.
    pub async fn user(&self, id: i64, role: Role) -> User {
        let user = self.engine.register_user(profile(id, &format!("User{}", id))).await.unwrap();
        if role == user.role {
            return user;
        }
        self.engine.set_role(ADMIN, id, role).await.unwrap()
    }
}

pub fn profile(id: i64, first_name: &str) -> UserProfile {
    UserProfile {
        telegram_id: id,
        username: None,
        first_name: Some(first_name.to_string()),
        last_name: None,
    }
}
