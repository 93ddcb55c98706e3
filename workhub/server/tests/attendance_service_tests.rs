use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait};
use workhub_core::{AttendanceStatus, Presence, Role};
use workhub_server::attendance::{AttendanceService, AttendanceServiceError};
use workhub_server::entities::employee;

mod common;

use common::{FixedClock, create_employee, ist, policy, setup_db};

const REJECT_PRESENCE_WRITES: &str = "CREATE TRIGGER reject_presence BEFORE UPDATE OF presence ON employee \
     BEGIN SELECT RAISE(ABORT, 'presence is locked'); END;";

/// Presence as stored on the employee row.
async fn stored_presence(db: &DatabaseConnection, employee_id: i32) -> Presence {
    employee::Entity::find_by_id(employee_id)
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .presence
        .parse()
        .unwrap()
}

#[tokio::test]
async fn can_punch_in_before_threshold_as_present() {
    let db = setup_db().await.unwrap();
    let employee = create_employee(&db, "asha", Role::Developer, None).await;
    let clock = FixedClock::at(ist(2025, 9, 2, 8, 55));
    let policy = policy();
    let service = AttendanceService::new(&db, clock.as_ref(), &policy);

    let record = service.punch_in(employee.id()).await.unwrap();

    assert_eq!(record.status, AttendanceStatus::Present);
    assert_eq!(record.day, NaiveDate::from_ymd_opt(2025, 9, 2).unwrap());
    assert_eq!(record.punch_out, None);
    assert_eq!(record.hours_worked, 0.0);
}

#[tokio::test]
async fn can_punch_in_after_threshold_as_late() {
    let db = setup_db().await.unwrap();
    let employee = create_employee(&db, "ravi", Role::Designer, None).await;
    let clock = FixedClock::at(ist(2025, 9, 2, 9, 5));
    let policy = policy();
    let service = AttendanceService::new(&db, clock.as_ref(), &policy);

    let record = service.punch_in(employee.id()).await.unwrap();

    assert_eq!(record.status, AttendanceStatus::Late);
}

#[tokio::test]
async fn can_punch_out_and_record_hours_worked() {
    let db = setup_db().await.unwrap();
    let employee = create_employee(&db, "meera", Role::Employee, None).await;
    let clock = FixedClock::at(ist(2025, 9, 2, 10, 0));
    let policy = policy();
    let service = AttendanceService::new(&db, clock.as_ref(), &policy);

    service.punch_in(employee.id()).await.unwrap();
    clock.set(ist(2025, 9, 2, 13, 30));
    let record = service.punch_out(employee.id()).await.unwrap();

    assert_eq!(record.punch_out, Some(ist(2025, 9, 2, 13, 30)));
    assert_eq!(record.hours_worked, 3.5);

    let summary = service.get_attendance(employee.id(), 1).await.unwrap();
    assert_eq!(summary.today, Some(record));
}

#[tokio::test]
async fn can_reject_second_punch_in_on_same_day() {
    let db = setup_db().await.unwrap();
    let employee = create_employee(&db, "kiran", Role::Developer, None).await;
    let clock = FixedClock::at(ist(2025, 9, 2, 9, 0));
    let policy = policy();
    let service = AttendanceService::new(&db, clock.as_ref(), &policy);

    service.punch_in(employee.id()).await.unwrap();
    let while_on_shift = service.punch_in(employee.id()).await;
    assert!(matches!(
        while_on_shift,
        Err(AttendanceServiceError::AlreadyPunchedIn)
    ));

    clock.set(ist(2025, 9, 2, 17, 0));
    service.punch_out(employee.id()).await.unwrap();
    clock.set(ist(2025, 9, 2, 18, 0));
    let after_shift = service.punch_in(employee.id()).await;
    assert!(matches!(
        after_shift,
        Err(AttendanceServiceError::AlreadyPunchedIn)
    ));
}

#[tokio::test]
async fn can_reject_punch_out_without_active_punch() {
    let db = setup_db().await.unwrap();
    let employee = create_employee(&db, "divya", Role::Developer, None).await;
    let clock = FixedClock::at(ist(2025, 9, 2, 9, 30));
    let policy = policy();
    let service = AttendanceService::new(&db, clock.as_ref(), &policy);

    let before_punch_in = service.punch_out(employee.id()).await;
    assert!(matches!(
        before_punch_in,
        Err(AttendanceServiceError::NoActivePunch)
    ));

    service.punch_in(employee.id()).await.unwrap();
    clock.set(ist(2025, 9, 2, 18, 30));
    service.punch_out(employee.id()).await.unwrap();

    clock.set(ist(2025, 9, 2, 19, 0));
    let second_punch_out = service.punch_out(employee.id()).await;
    assert!(matches!(
        second_punch_out,
        Err(AttendanceServiceError::NoActivePunch)
    ));

    let summary = service.get_attendance(employee.id(), 1).await.unwrap();
    let today = summary.today.unwrap();
    assert_eq!(today.punch_out, Some(ist(2025, 9, 2, 18, 30)));
    assert_eq!(today.hours_worked, 9.0);
}

#[tokio::test]
async fn can_start_new_business_day_at_local_midnight() {
    let db = setup_db().await.unwrap();
    let employee = create_employee(&db, "arjun", Role::Developer, None).await;
    let clock = FixedClock::at(ist(2025, 9, 2, 23, 50));
    let policy = policy();
    let service = AttendanceService::new(&db, clock.as_ref(), &policy);

    let late_evening = service.punch_in(employee.id()).await.unwrap();

    // 00:10 IST is still the previous UTC date.
    clock.set(ist(2025, 9, 3, 0, 10));
    let next_day = service.punch_in(employee.id()).await.unwrap();

    assert_eq!(late_evening.day, NaiveDate::from_ymd_opt(2025, 9, 2).unwrap());
    assert_eq!(next_day.day, NaiveDate::from_ymd_opt(2025, 9, 3).unwrap());
    assert_eq!(next_day.status, AttendanceStatus::Present);
}

#[tokio::test]
async fn can_derive_presence_from_todays_record() {
    let db = setup_db().await.unwrap();
    let employee = create_employee(&db, "nisha", Role::Employee, None).await;
    let clock = FixedClock::at(ist(2025, 9, 2, 8, 30));
    let policy = policy();
    let service = AttendanceService::new(&db, clock.as_ref(), &policy);

    assert_eq!(service.presence(employee.id()).await.unwrap(), Presence::Offline);

    service.punch_in(employee.id()).await.unwrap();
    assert_eq!(service.presence(employee.id()).await.unwrap(), Presence::Online);
    assert!(service.on_shift_today().await.unwrap().contains(&employee.id()));

    // A shift left open yesterday does not keep the employee online today.
    clock.set(ist(2025, 9, 3, 8, 30));
    assert_eq!(service.presence(employee.id()).await.unwrap(), Presence::Offline);
    assert!(service.on_shift_today().await.unwrap().is_empty());

    service.punch_in(employee.id()).await.unwrap();
    clock.set(ist(2025, 9, 3, 17, 30));
    service.punch_out(employee.id()).await.unwrap();
    assert_eq!(service.presence(employee.id()).await.unwrap(), Presence::Offline);
}

#[tokio::test]
async fn can_return_history_newest_first_within_window() {
    let db = setup_db().await.unwrap();
    let employee = create_employee(&db, "farah", Role::Developer, None).await;
    let clock = FixedClock::at(ist(2025, 9, 1, 9, 0));
    let policy = policy();
    let service = AttendanceService::new(&db, clock.as_ref(), &policy);

    for day in 1..=4 {
        clock.set(ist(2025, 9, day, 8, 45));
        service.punch_in(employee.id()).await.unwrap();
        clock.set(ist(2025, 9, day, 17, 45));
        service.punch_out(employee.id()).await.unwrap();
    }
    clock.set(ist(2025, 9, 5, 8, 0));

    let summary = service.get_attendance(employee.id(), 3).await.unwrap();

    let days: Vec<NaiveDate> = summary.history.iter().map(|record| record.day).collect();
    assert_eq!(
        days,
        vec![
            NaiveDate::from_ymd_opt(2025, 9, 4).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 3).unwrap(),
        ]
    );
    assert_eq!(summary.today, None);
    assert!(summary.history.iter().all(|record| record.hours_worked == 9.0));
}

#[tokio::test]
async fn can_clamp_history_window_to_at_least_today() {
    let db = setup_db().await.unwrap();
    let employee = create_employee(&db, "omar", Role::Developer, None).await;
    let clock = FixedClock::at(ist(2025, 9, 1, 9, 30));
    let policy = policy();
    let service = AttendanceService::new(&db, clock.as_ref(), &policy);

    service.punch_in(employee.id()).await.unwrap();
    clock.set(ist(2025, 9, 2, 9, 30));
    service.punch_in(employee.id()).await.unwrap();

    let summary = service.get_attendance(employee.id(), 0).await.unwrap();

    assert_eq!(summary.history.len(), 1);
    assert_eq!(summary.history[0].day, NaiveDate::from_ymd_opt(2025, 9, 2).unwrap());
    assert_eq!(summary.today.map(|record| record.status), Some(AttendanceStatus::Late));
}

#[tokio::test]
async fn can_accept_only_one_of_concurrent_punch_ins() {
    let db = setup_db().await.unwrap();
    let employee = create_employee(&db, "lena", Role::Developer, None).await;
    let clock = FixedClock::at(ist(2025, 9, 2, 8, 50));
    let policy = policy();
    let service = AttendanceService::new(&db, clock.as_ref(), &policy);

    let (first, second) = tokio::join!(
        service.punch_in(employee.id()),
        service.punch_in(employee.id())
    );

    let successes = [first.is_ok(), second.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(successes, 1);
    assert!(
        matches!(first, Err(AttendanceServiceError::AlreadyPunchedIn))
            || matches!(second, Err(AttendanceServiceError::AlreadyPunchedIn))
    );
    let summary = service.get_attendance(employee.id(), 1).await.unwrap();
    assert_eq!(summary.history.len(), 1);
}

#[tokio::test]
async fn can_reject_punch_in_for_unknown_employee() {
    let db = setup_db().await.unwrap();
    let clock = FixedClock::at(ist(2025, 9, 2, 8, 50));
    let policy = policy();
    let service = AttendanceService::new(&db, clock.as_ref(), &policy);

    let result = service.punch_in(999).await;

    assert!(matches!(
        result,
        Err(AttendanceServiceError::EmployeeNotFound(999))
    ));
}

#[tokio::test]
async fn can_store_presence_on_each_punch_transition() {
    let db = setup_db().await.unwrap();
    let employee = create_employee(&db, "kiran", Role::Developer, None).await;
    let clock = FixedClock::at(ist(2025, 9, 2, 8, 45));
    let policy = policy();
    let service = AttendanceService::new(&db, clock.as_ref(), &policy);
    assert_eq!(stored_presence(&db, employee.id()).await, Presence::Offline);

    service.punch_in(employee.id()).await.unwrap();
    assert_eq!(stored_presence(&db, employee.id()).await, Presence::Online);

    clock.set(ist(2025, 9, 2, 17, 15));
    service.punch_out(employee.id()).await.unwrap();
    assert_eq!(stored_presence(&db, employee.id()).await, Presence::Offline);
}

#[tokio::test]
async fn can_roll_back_punch_in_when_presence_write_fails() {
    let db = setup_db().await.unwrap();
    let employee = create_employee(&db, "leela", Role::Designer, None).await;
    let clock = FixedClock::at(ist(2025, 9, 2, 8, 50));
    let policy = policy();
    let service = AttendanceService::new(&db, clock.as_ref(), &policy);
    db.execute_unprepared(REJECT_PRESENCE_WRITES).await.unwrap();

    let failed = service.punch_in(employee.id()).await;

    assert!(matches!(failed, Err(AttendanceServiceError::Database(_))));
    let summary = service.get_attendance(employee.id(), 1).await.unwrap();
    assert_eq!(summary.today, None);
    assert_eq!(stored_presence(&db, employee.id()).await, Presence::Offline);

    db.execute_unprepared("DROP TRIGGER reject_presence;")
        .await
        .unwrap();
    let retried = service.punch_in(employee.id()).await.unwrap();
    assert_eq!(retried.status, AttendanceStatus::Present);
    assert_eq!(stored_presence(&db, employee.id()).await, Presence::Online);
}

#[tokio::test]
async fn can_roll_back_punch_out_when_presence_write_fails() {
    let db = setup_db().await.unwrap();
    let employee = create_employee(&db, "manoj", Role::Developer, None).await;
    let clock = FixedClock::at(ist(2025, 9, 2, 9, 0));
    let policy = policy();
    let service = AttendanceService::new(&db, clock.as_ref(), &policy);
    service.punch_in(employee.id()).await.unwrap();
    clock.set(ist(2025, 9, 2, 17, 0));
    db.execute_unprepared(REJECT_PRESENCE_WRITES).await.unwrap();

    let failed = service.punch_out(employee.id()).await;

    assert!(matches!(failed, Err(AttendanceServiceError::Database(_))));
    let today = service
        .get_attendance(employee.id(), 1)
        .await
        .unwrap()
        .today
        .unwrap();
    assert_eq!(today.punch_out, None);
    assert_eq!(today.hours_worked, 0.0);
    assert_eq!(stored_presence(&db, employee.id()).await, Presence::Online);

    db.execute_unprepared("DROP TRIGGER reject_presence;")
        .await
        .unwrap();
    let retried = service.punch_out(employee.id()).await.unwrap();
    assert_eq!(retried.hours_worked, 8.0);
    assert_eq!(stored_presence(&db, employee.id()).await, Presence::Offline);
}
