//! End-to-end ticket lifecycle against a real SQLite database
//!
//! Run with: cargo test --test ticket_workflow_test

mod common;

use chrono::Duration;
use pretty_assertions::assert_eq;

use common::{TestDesk, ADMIN};
use unidesk::core::types::{Category, Priority, Role, TicketStatus};
use unidesk::tickets::{
    Action, DuplicatePolicy, EventKind, Recipient, TicketError, TicketOptions, TicketPolicy, TicketRef,
};

const STUDENT: i64 = 100;
const OTHER_STUDENT: i64 = 101;
const MODERATOR: i64 = 200;
const SECOND_MODERATOR: i64 = 201;
const TEACHER: i64 = 300;

async fn full_scenario(clears_assignee: bool) {
    let desk = TestDesk::with_policy(TicketPolicy::default().reopen_clears_assignee(clears_assignee)).await;
    desk.user(STUDENT, Role::Student).await;
    desk.user(MODERATOR, Role::Moderator).await;
    desk.notifier.take();

    let submission = desk
        .engine
        .submit(STUDENT, Category::Debts, "Как пересдать экзамен?\nПодробности внутри")
        .await
        .unwrap();
    assert!(!submission.appended);
    let ticket = submission.ticket;
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.subject, "Как пересдать экзамен?");
    assert!(ticket.ticket_number.starts_with("T202409-"));

    let ticket = desk.engine.assign(ticket.id, MODERATOR).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::InProgress);
    assert_eq!(ticket.assigned_to, Some(MODERATOR));

    let ticket = desk.engine.respond(ticket.id, MODERATOR, "Пересдача в четверг").await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Answered);

    // an admin closing an answered ticket is a regular close, reported to the owner
    desk.clock.advance(Duration::hours(1));
    let ticket = desk.engine.close(ticket.id, ADMIN).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Closed);
    assert_eq!(ticket.closed_at, Some(common::start_time() + Duration::hours(1)));

    desk.clock.advance(Duration::days(2));
    let ticket = desk.engine.reopen(ticket.id, STUDENT).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.closed_at, None);
    let expected_assignee = if clears_assignee { None } else { Some(MODERATOR) };
    assert_eq!(ticket.assigned_to, expected_assignee);

    // the reopened ticket is open again, so this close is forced
    let ticket = desk.engine.close(ticket.id, ADMIN).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Closed);
    assert!(ticket.closed_at.is_some());

    let kinds: Vec<(EventKind, Recipient)> = desk.notifier.take().into_iter().map(|e| (e.kind, e.recipient)).collect();
    let reopen_recipient = if clears_assignee {
        Recipient::Responders
    } else {
        Recipient::User(MODERATOR)
    };
    assert_eq!(
        kinds,
        vec![
            (EventKind::Created, Recipient::Responders),
            (EventKind::Assigned, Recipient::User(STUDENT)),
            (EventKind::Answered, Recipient::User(STUDENT)),
            (EventKind::Closed { forced: false }, Recipient::User(STUDENT)),
            (EventKind::Reopened, reopen_recipient),
            (EventKind::Closed { forced: true }, Recipient::User(STUDENT)),
        ]
    );

    let view = desk.engine.get_ticket(ticket.id, STUDENT).await.unwrap();
    let bodies: Vec<(&str, bool)> = view.messages.iter().map(|m| (m.body.as_str(), m.from_staff)).collect();
    assert_eq!(
        bodies,
        vec![
            ("Как пересдать экзамен?\nПодробности внутри", false),
            ("Пересдача в четверг", true)
        ]
    );
}

#[tokio::test]
async fn test_full_scenario_keeping_assignee() {
    full_scenario(false).await;
}

#[tokio::test]
async fn test_full_scenario_clearing_assignee() {
    full_scenario(true).await;
}

#[tokio::test]
async fn test_unauthorized_respond_changes_nothing() {
    let desk = TestDesk::new().await;
    desk.user(STUDENT, Role::Student).await;
    desk.user(MODERATOR, Role::Moderator).await;
    desk.user(SECOND_MODERATOR, Role::Moderator).await;

    let ticket = desk.engine.submit(STUDENT, Category::Other, "Вопрос").await.unwrap().ticket;
    let ticket = desk.engine.assign(ticket.id, MODERATOR).await.unwrap();
    desk.notifier.take();

    for intruder in [STUDENT, SECOND_MODERATOR] {
        let err = desk.engine.respond(ticket.id, intruder, "Не мой ответ").await.unwrap_err();
        assert!(
            matches!(err, TicketError::Unauthorized { action: Action::Respond }),
            "{:?}",
            err
        );
    }

    let view = desk.engine.get_ticket(ticket.id, ADMIN).await.unwrap();
    assert_eq!(view.ticket, ticket);
    assert_eq!(view.messages.len(), 1);
    assert!(desk.notifier.events().is_empty());

    // an admin may answer a ticket assigned to someone else
    let answered = desk.engine.respond(ticket.id, ADMIN, "Ответ администратора").await.unwrap();
    assert_eq!(answered.status, TicketStatus::Answered);
    assert_eq!(answered.assigned_to, Some(MODERATOR));
}

#[tokio::test]
async fn test_reopen_window() {
    let policy = TicketPolicy::default().reopen_window(Duration::hours(48));
    let desk = TestDesk::with_policy(policy).await;
    desk.user(STUDENT, Role::Student).await;
    desk.user(MODERATOR, Role::Moderator).await;

    let first = desk.engine.submit(STUDENT, Category::Documents, "Справка").await.unwrap().ticket;
    let err = desk.engine.reopen(first.id, STUDENT).await.unwrap_err();
    assert!(matches!(
        err,
        TicketError::InvalidTransition {
            from: TicketStatus::Open,
            action: Action::Reopen
        }
    ));

    desk.engine.close(first.id, ADMIN).await.unwrap();
    desk.clock.advance(Duration::hours(48));
    let reopened = desk.engine.reopen(first.id, STUDENT).await.unwrap();
    assert_eq!(reopened.status, TicketStatus::Open);

    desk.engine.close(first.id, ADMIN).await.unwrap();
    desk.clock.advance(Duration::hours(48) + Duration::seconds(1));
    let err = desk.engine.reopen(first.id, STUDENT).await.unwrap_err();
    assert!(matches!(err, TicketError::WindowExpired), "{:?}", err);
    // admins are bound by the same window
    let err = desk.engine.reopen(first.id, ADMIN).await.unwrap_err();
    assert!(matches!(err, TicketError::WindowExpired), "{:?}", err);

    let stored = desk.engine.get_ticket(first.id, STUDENT).await.unwrap().ticket;
    assert_eq!(stored.status, TicketStatus::Closed);
}

#[tokio::test]
async fn test_only_owner_or_admin_reopens() {
    let desk = TestDesk::new().await;
    desk.user(STUDENT, Role::Student).await;
    desk.user(MODERATOR, Role::Moderator).await;

    let ticket = desk.engine.submit(STUDENT, Category::Other, "Вопрос").await.unwrap().ticket;
    desk.engine.close(ticket.id, ADMIN).await.unwrap();

    let err = desk.engine.reopen(ticket.id, MODERATOR).await.unwrap_err();
    assert!(matches!(err, TicketError::Unauthorized { action: Action::Reopen }));

    let reopened = desk.engine.reopen(ticket.id, ADMIN).await.unwrap();
    assert_eq!(reopened.status, TicketStatus::Open);
}

#[tokio::test]
async fn test_invalid_transitions() {
    let desk = TestDesk::new().await;
    desk.user(STUDENT, Role::Student).await;
    desk.user(MODERATOR, Role::Moderator).await;
    desk.user(TEACHER, Role::Teacher).await;

    let ticket = desk.engine.submit(STUDENT, Category::Schedule, "Где расписание?").await.unwrap().ticket;

    // respond before anyone took it
    let err = desk.engine.respond(ticket.id, ADMIN, "Ответ").await.unwrap_err();
    assert!(matches!(
        err,
        TicketError::InvalidTransition {
            from: TicketStatus::Open,
            action: Action::Respond
        }
    ));

    // owner may not close an unanswered ticket
    let err = desk.engine.close(ticket.id, STUDENT).await.unwrap_err();
    assert!(matches!(
        err,
        TicketError::InvalidTransition {
            from: TicketStatus::Open,
            action: Action::Close
        }
    ));

    // students cannot take tickets
    let err = desk.engine.assign(ticket.id, STUDENT).await.unwrap_err();
    assert!(matches!(err, TicketError::Unauthorized { action: Action::Assign }));

    // teachers can
    desk.engine.assign(ticket.id, TEACHER).await.unwrap();
    let err = desk.engine.assign(ticket.id, MODERATOR).await.unwrap_err();
    assert!(matches!(
        err,
        TicketError::InvalidTransition {
            from: TicketStatus::InProgress,
            action: Action::Assign
        }
    ));

    // owner follow-ups are fine while in progress
    desk.engine.add_message(ticket.id, STUDENT, "Уточнение").await.unwrap();
    desk.engine.respond(ticket.id, TEACHER, "Расписание на сайте").await.unwrap();
    let err = desk.engine.add_message(ticket.id, STUDENT, "Ещё вопрос").await.unwrap_err();
    assert!(matches!(
        err,
        TicketError::InvalidTransition {
            from: TicketStatus::Answered,
            action: Action::AddMessage
        }
    ));

    // someone else's ticket
    desk.user(OTHER_STUDENT, Role::Student).await;
    let err = desk.engine.close(ticket.id, OTHER_STUDENT).await.unwrap_err();
    assert!(matches!(err, TicketError::Unauthorized { action: Action::Close }));

    desk.engine.close(ticket.id, TEACHER).await.unwrap();
    let err = desk.engine.close(ticket.id, ADMIN).await.unwrap_err();
    assert!(matches!(
        err,
        TicketError::InvalidTransition {
            from: TicketStatus::Closed,
            action: Action::Close
        }
    ));
}

#[tokio::test]
async fn test_duplicate_policy_append() {
    let desk = TestDesk::new().await;
    desk.user(STUDENT, Role::Student).await;
    desk.user(MODERATOR, Role::Moderator).await;

    let first = desk.engine.submit(STUDENT, Category::Debts, "Первый").await.unwrap();
    desk.engine.assign(first.ticket.id, MODERATOR).await.unwrap();
    desk.notifier.take();

    let second = desk.engine.submit(STUDENT, Category::Debts, "Второй").await.unwrap();
    assert!(second.appended);
    assert_eq!(second.ticket.id, first.ticket.id);
    assert_eq!(second.ticket.status, TicketStatus::InProgress);

    let events = desk.notifier.take();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::OwnerMessage);
    assert_eq!(events[0].recipient, Recipient::User(MODERATOR));

    // another category is a separate ticket
    let other = desk.engine.submit(STUDENT, Category::Practice, "Практика").await.unwrap();
    assert!(!other.appended);
    assert_ne!(other.ticket.id, first.ticket.id);

    // once answered, the ticket no longer counts as open
    desk.engine.respond(first.ticket.id, MODERATOR, "Ответ").await.unwrap();
    let third = desk.engine.submit(STUDENT, Category::Debts, "Третий").await.unwrap();
    assert!(!third.appended);

    let view = desk.engine.get_ticket(first.ticket.id, STUDENT).await.unwrap();
    assert_eq!(view.messages.len(), 3);
}

#[tokio::test]
async fn test_duplicate_policy_reject_and_allow() {
    let desk = TestDesk::with_policy(TicketPolicy::default().duplicate(DuplicatePolicy::Reject)).await;
    desk.user(STUDENT, Role::Student).await;
    let first = desk.engine.submit(STUDENT, Category::Debts, "Первый").await.unwrap().ticket;
    let err = desk.engine.submit(STUDENT, Category::Debts, "Второй").await.unwrap_err();
    match err {
        TicketError::DuplicateOpenTicket { ticket_number } => assert_eq!(ticket_number, first.ticket_number),
        other => panic!("unexpected {:?}", other),
    }

    let desk = TestDesk::with_policy(TicketPolicy::default().duplicate(DuplicatePolicy::Allow)).await;
    desk.user(STUDENT, Role::Student).await;
    let a = desk.engine.submit(STUDENT, Category::Debts, "Первый").await.unwrap();
    let b = desk.engine.submit(STUDENT, Category::Debts, "Второй").await.unwrap();
    assert!(!b.appended);
    assert_ne!(a.ticket.id, b.ticket.id);
}

#[tokio::test]
async fn test_validation_and_unknown_entities() {
    let desk = TestDesk::new().await;
    desk.user(STUDENT, Role::Student).await;

    let err = desk.engine.submit(STUDENT, Category::Other, "   ").await.unwrap_err();
    assert!(matches!(err, TicketError::Validation(_)));

    let err = desk.engine.submit(999, Category::Other, "Кто я?").await.unwrap_err();
    assert!(matches!(&err, TicketError::NotFound { entity: "user", key } if key == "999"), "{:?}", err);

    let err = desk.engine.get_ticket(42, STUDENT).await.unwrap_err();
    assert!(matches!(&err, TicketError::NotFound { entity: "ticket", key } if key == "#42"), "{:?}", err);

    let number = TicketRef::Number("T202409-9999".to_string());
    let err = desk.engine.get_ticket(number, STUDENT).await.unwrap_err();
    assert!(matches!(&err, TicketError::NotFound { entity: "ticket", key } if key == "T202409-9999"), "{:?}", err);
    assert!(desk.notifier.events().is_empty());
}

#[tokio::test]
async fn test_visibility_and_lists() {
    let desk = TestDesk::new().await;
    desk.user(STUDENT, Role::Student).await;
    desk.user(OTHER_STUDENT, Role::Student).await;
    desk.user(TEACHER, Role::Teacher).await;

    let mine = desk.engine.submit(STUDENT, Category::Other, "Мой вопрос").await.unwrap().ticket;
    desk.engine.submit(OTHER_STUDENT, Category::Other, "Чужой вопрос").await.unwrap();

    let err = desk.engine.get_ticket(mine.id, OTHER_STUDENT).await.unwrap_err();
    assert!(matches!(err, TicketError::Unauthorized { action: Action::View }));
    assert!(desk.engine.get_ticket(mine.id, TEACHER).await.is_ok());

    let own = desk.engine.list_own(STUDENT, 10).await.unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].id, mine.id);

    let err = desk.engine.list_queue(STUDENT, 10).await.unwrap_err();
    assert!(matches!(err, TicketError::Unauthorized { .. }));
    assert_eq!(desk.engine.list_queue(TEACHER, 10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_admin_operations() {
    let desk = TestDesk::new().await;
    desk.user(STUDENT, Role::Student).await;
    desk.user(MODERATOR, Role::Moderator).await;

    let err = desk.engine.set_role(MODERATOR, STUDENT, Role::Admin).await.unwrap_err();
    assert!(matches!(err, TicketError::Unauthorized { action: Action::SetRole }));

    let err = desk.engine.set_role(ADMIN, ADMIN, Role::Student).await.unwrap_err();
    assert!(matches!(err, TicketError::Validation(_)));

    let promoted = desk.engine.set_role(ADMIN, STUDENT, Role::Teacher).await.unwrap();
    assert_eq!(promoted.role, Role::Teacher);
    assert_eq!(desk.engine.get_user(STUDENT).await.unwrap().role, Role::Teacher);
    desk.engine.set_role(ADMIN, STUDENT, Role::Student).await.unwrap();

    let ticket = desk.engine.submit(STUDENT, Category::Other, "Удалить меня").await.unwrap().ticket;

    let err = desk.engine.delete(ticket.id, MODERATOR, true).await.unwrap_err();
    assert!(matches!(err, TicketError::Unauthorized { action: Action::Delete }));

    let err = desk.engine.delete(ticket.id, ADMIN, false).await.unwrap_err();
    assert!(matches!(
        err,
        TicketError::InvalidTransition {
            from: TicketStatus::Open,
            action: Action::Delete
        }
    ));

    let deleted = desk.engine.delete(ticket.id, ADMIN, true).await.unwrap();
    assert_eq!(deleted.id, ticket.id);
    assert!(matches!(
        desk.engine.get_ticket(ticket.id, ADMIN).await.unwrap_err(),
        TicketError::NotFound { .. }
    ));

    let closed = desk.engine.submit(STUDENT, Category::Other, "Закрытое").await.unwrap().ticket;
    desk.engine.close(closed.id, ADMIN).await.unwrap();
    assert!(desk.engine.delete(closed.id, ADMIN, false).await.is_ok());
}

#[tokio::test]
async fn test_stats() {
    let desk = TestDesk::new().await;
    desk.user(STUDENT, Role::Student).await;
    desk.user(MODERATOR, Role::Moderator).await;

    let a = desk.engine.submit(STUDENT, Category::Other, "A").await.unwrap().ticket;
    desk.engine.submit(STUDENT, Category::Debts, "B").await.unwrap();
    desk.engine.assign(a.id, MODERATOR).await.unwrap();
    desk.engine.respond(a.id, MODERATOR, "Готово").await.unwrap();
    desk.clock.advance(Duration::hours(3));
    desk.engine.close(a.id, STUDENT).await.unwrap();

    let stats = desk.engine.stats(MODERATOR).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.open, 1);
    assert_eq!(stats.closed, 1);
    assert_eq!(stats.unassigned, 1);
    let avg = stats.avg_resolution_hours.unwrap();
    assert!((avg - 3.0).abs() < 0.01, "{}", avg);

    let err = desk.engine.stats(STUDENT).await.unwrap_err();
    assert!(matches!(err, TicketError::Unauthorized { action: Action::Stats }));
}

#[tokio::test]
async fn test_configured_admin_and_reactivation() {
    let desk = TestDesk::new().await;
    assert_eq!(desk.engine.get_user(ADMIN).await.unwrap().role, Role::Admin);

    desk.user(MODERATOR, Role::Moderator).await;
    assert_eq!(desk.engine.responder_ids().await.unwrap(), vec![ADMIN, MODERATOR]);

    desk.engine.deactivate_user(MODERATOR).await.unwrap();
    assert_eq!(desk.engine.responder_ids().await.unwrap(), vec![ADMIN]);

    // writing to the bot again makes them reachable
    desk.engine.register_user(common::profile(MODERATOR, "Back")).await.unwrap();
    assert_eq!(desk.engine.responder_ids().await.unwrap(), vec![ADMIN, MODERATOR]);
}

#[tokio::test]
async fn test_queue_orders_by_priority_then_age() {
    let desk = TestDesk::new().await;
    desk.user(MODERATOR, Role::Moderator).await;
    for id in [100, 101, 102, 103] {
        desk.user(id, Role::Student).await;
    }

    let submit = |owner: i64, priority: Priority| {
        let engine = desk.engine.clone();
        async move {
            let options = TicketOptions { priority, anonymous: false };
            engine.submit_with(owner, Category::Other, "Вопрос", options).await.unwrap().ticket
        }
    };
    let low = submit(100, Priority::Low).await;
    desk.clock.advance(Duration::minutes(1));
    let high_old = submit(101, Priority::High).await;
    desk.clock.advance(Duration::minutes(1));
    let medium = submit(102, Priority::Medium).await;
    desk.clock.advance(Duration::minutes(1));
    let high_new = submit(103, Priority::High).await;
    assert_eq!(high_old.priority, Priority::High);

    let order: Vec<i64> = desk.engine.list_queue(MODERATOR, 10).await.unwrap().iter().map(|t| t.id).collect();
    assert_eq!(order, vec![high_old.id, high_new.id, medium.id, low.id]);

    // taken tickets drop behind everything still waiting
    desk.engine.assign(high_old.id, MODERATOR).await.unwrap();
    let order: Vec<i64> = desk.engine.list_queue(MODERATOR, 10).await.unwrap().iter().map(|t| t.id).collect();
    assert_eq!(order, vec![high_new.id, medium.id, low.id, high_old.id]);
}

#[tokio::test]
async fn test_appending_keeps_original_options() {
    let desk = TestDesk::new().await;
    desk.user(STUDENT, Role::Student).await;

    let first = desk.engine.submit(STUDENT, Category::Debts, "Первый").await.unwrap();
    let options = TicketOptions {
        priority: Priority::High,
        anonymous: true,
    };
    let second = desk.engine.submit_with(STUDENT, Category::Debts, "Второй", options).await.unwrap();
    assert!(second.appended);
    assert_eq!(second.ticket.id, first.ticket.id);
    assert_eq!(second.ticket.priority, Priority::Low);
    assert!(!second.ticket.anonymous);
}

#[tokio::test]
async fn test_anonymous_ticket_hides_author_from_staff() {
    let desk = TestDesk::new().await;
    desk.user(STUDENT, Role::Student).await;
    desk.user(MODERATOR, Role::Moderator).await;

    let options = TicketOptions {
        priority: Priority::Medium,
        anonymous: true,
    };
    let ticket = desk
        .engine
        .submit_with(STUDENT, Category::Other, "Неудобный вопрос", options)
        .await
        .unwrap()
        .ticket;
    assert!(ticket.anonymous);
    assert_eq!(ticket.priority, Priority::Medium);

    for staff in [MODERATOR, ADMIN] {
        let view = desk.engine.get_ticket(ticket.id, staff).await.unwrap();
        assert_eq!(view.owner, None);
    }
    let own = desk.engine.get_ticket(ticket.id, STUDENT).await.unwrap();
    assert_eq!(own.owner.map(|u| u.telegram_id), Some(STUDENT));

    // routing still works: the owner gets the answer
    desk.engine.assign(ticket.id, MODERATOR).await.unwrap();
    desk.notifier.take();
    desk.engine.respond(ticket.id, MODERATOR, "Ответ").await.unwrap();
    assert_eq!(desk.notifier.take()[0].recipient, Recipient::User(STUDENT));
}

#[tokio::test]
async fn test_internal_notes_are_staff_only() {
    let desk = TestDesk::new().await;
    desk.user(STUDENT, Role::Student).await;
    desk.user(TEACHER, Role::Teacher).await;
    desk.user(MODERATOR, Role::Moderator).await;

    let ticket = desk.engine.submit(STUDENT, Category::Practice, "Где практика?").await.unwrap().ticket;
    desk.notifier.take();

    let err = desk.engine.add_note(ticket.id, STUDENT, "Моя заметка").await.unwrap_err();
    assert!(matches!(err, TicketError::Unauthorized { action: Action::AddNote }), "{:?}", err);

    let noted = desk.engine.add_note(ticket.id, TEACHER, "Уточнить у деканата").await.unwrap();
    assert_eq!(noted.status, TicketStatus::Open);
    assert_eq!(noted.version, ticket.version + 1);
    assert!(desk.notifier.events().is_empty());

    let staff_view = desk.engine.get_ticket(ticket.id, MODERATOR).await.unwrap();
    let notes: Vec<&str> = staff_view
        .messages
        .iter()
        .filter(|m| m.internal)
        .map(|m| m.body.as_str())
        .collect();
    assert_eq!(notes, vec!["Уточнить у деканата"]);

    let owner_view = desk.engine.get_ticket(ticket.id, STUDENT).await.unwrap();
    assert_eq!(owner_view.messages.len(), 1);
    assert!(owner_view.messages.iter().all(|m| !m.internal));

    // notes are allowed on closed tickets too
    desk.engine.close(ticket.id, ADMIN).await.unwrap();
    desk.engine.add_note(ticket.id, MODERATOR, "Закрыто по звонку").await.unwrap();
    let view = desk.engine.get_ticket(ticket.id, ADMIN).await.unwrap();
    assert_eq!(view.messages.iter().filter(|m| m.internal).count(), 2);
}

#[tokio::test]
async fn test_operations_by_ticket_number() {
    let desk = TestDesk::new().await;
    desk.user(STUDENT, Role::Student).await;
    desk.user(MODERATOR, Role::Moderator).await;

    let ticket = desk.engine.submit(STUDENT, Category::Documents, "Справка").await.unwrap().ticket;
    let number: TicketRef = ticket.ticket_number.to_lowercase().parse().unwrap();

    let view = desk.engine.get_ticket(number.clone(), STUDENT).await.unwrap();
    assert_eq!(view.ticket.id, ticket.id);

    let taken = desk.engine.assign(number.clone(), MODERATOR).await.unwrap();
    assert_eq!(taken.id, ticket.id);
    assert_eq!(taken.status, TicketStatus::InProgress);

    let answered = desk.engine.respond(number, MODERATOR, "Готова").await.unwrap();
    assert_eq!(answered.status, TicketStatus::Answered);
}
