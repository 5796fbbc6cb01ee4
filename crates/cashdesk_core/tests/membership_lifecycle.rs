use cashdesk_core::{CashDesk, NewMember, ServiceError};
use chrono::{NaiveDate, Utc};

fn new_member(last_name: &str) -> NewMember {
    NewMember::new(
        "Test",
        last_name,
        NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
    )
}

#[test]
fn operations_require_initialization() {
    let desk = CashDesk::new();

    assert!(matches!(
        desk.add_member(&new_member("Uninitialized")),
        Err(ServiceError::NotInitialized)
    ));
    assert!(matches!(
        desk.delete_member(1),
        Err(ServiceError::NotInitialized)
    ));
    assert!(matches!(
        desk.join_member(1),
        Err(ServiceError::NotInitialized)
    ));
    assert!(matches!(
        desk.cancel_membership(1),
        Err(ServiceError::NotInitialized)
    ));
    assert!(matches!(
        desk.deposit(1, 100),
        Err(ServiceError::NotInitialized)
    ));
    assert!(matches!(
        desk.deposit_statistics(),
        Err(ServiceError::NotInitialized)
    ));
}

#[test]
fn double_initialize_is_rejected() {
    let mut desk = CashDesk::new();
    desk.initialize_in_memory().unwrap();

    assert!(matches!(
        desk.initialize_in_memory(),
        Err(ServiceError::AlreadyInitialized)
    ));
}

#[test]
fn shutdown_is_idempotent_and_allows_reinitialization() {
    let mut desk = CashDesk::new();

    // Safe before any session exists.
    desk.shutdown();
    assert!(!desk.is_initialized());

    desk.initialize_in_memory().unwrap();
    assert!(desk.is_initialized());

    desk.shutdown();
    desk.shutdown();
    assert!(!desk.is_initialized());
    assert!(matches!(
        desk.deposit_statistics(),
        Err(ServiceError::NotInitialized)
    ));

    desk.initialize_in_memory().unwrap();
    assert!(desk.is_initialized());
}

#[test]
fn join_creates_open_membership_beginning_now() {
    let mut desk = CashDesk::new();
    desk.initialize_in_memory().unwrap();
    let number = desk.add_member(&new_member("Joiner")).unwrap();

    let before_ms = Utc::now().timestamp_millis();
    let membership = desk.join_member(number).unwrap();
    let after_ms = Utc::now().timestamp_millis();

    assert_eq!(membership.member_number, number);
    assert!(membership.is_open());
    assert!(membership.begin_ms >= before_ms);
    assert!(membership.begin_ms <= after_ms);
}

#[test]
fn joining_twice_without_cancel_is_rejected() {
    let mut desk = CashDesk::new();
    desk.initialize_in_memory().unwrap();
    let number = desk.add_member(&new_member("Twice")).unwrap();

    desk.join_member(number).unwrap();
    let err = desk.join_member(number).unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyMember(n) if n == number));
}

#[test]
fn cancel_closes_the_open_membership() {
    let mut desk = CashDesk::new();
    desk.initialize_in_memory().unwrap();
    let number = desk.add_member(&new_member("Leaver")).unwrap();

    let opened = desk.join_member(number).unwrap();
    let closed = desk.cancel_membership(number).unwrap();
    let after_ms = Utc::now().timestamp_millis();

    assert_eq!(closed.membership_id, opened.membership_id);
    assert!(!closed.is_open());
    assert!(closed.end_ms >= closed.begin_ms);
    assert!(closed.end_ms <= after_ms);

    let err = desk.cancel_membership(number).unwrap_err();
    assert!(matches!(err, ServiceError::NoActiveMembership(n) if n == number));
}

#[test]
fn member_can_rejoin_after_cancel_and_accumulates_history() {
    let mut desk = CashDesk::new();
    desk.initialize_in_memory().unwrap();
    let number = desk.add_member(&new_member("Returner")).unwrap();

    let first = desk.join_member(number).unwrap();
    desk.cancel_membership(number).unwrap();
    let second = desk.join_member(number).unwrap();

    assert_ne!(first.membership_id, second.membership_id);
    assert!(second.is_open());
}

#[test]
fn unknown_member_numbers_fail_appropriately() {
    let mut desk = CashDesk::new();
    desk.initialize_in_memory().unwrap();

    assert!(matches!(
        desk.join_member(404),
        Err(ServiceError::MemberNotFound(404))
    ));
    assert!(matches!(
        desk.cancel_membership(404),
        Err(ServiceError::NoActiveMembership(404))
    ));
    assert!(matches!(
        desk.delete_member(404),
        Err(ServiceError::MemberNotFound(404))
    ));
}

#[test]
fn deleted_member_no_longer_joins_or_deposits() {
    let mut desk = CashDesk::new();
    desk.initialize_in_memory().unwrap();
    let number = desk.add_member(&new_member("Gone")).unwrap();
    desk.join_member(number).unwrap();
    desk.deposit(number, 1_000).unwrap();

    desk.delete_member(number).unwrap();

    assert!(desk.deposit_statistics().unwrap().is_empty());
    assert!(matches!(
        desk.join_member(number),
        Err(ServiceError::MemberNotFound(n)) if n == number
    ));
    assert!(matches!(
        desk.cancel_membership(number),
        Err(ServiceError::NoActiveMembership(n)) if n == number
    ));
    assert!(matches!(
        desk.deposit(number, 100),
        Err(ServiceError::NoActiveMembership(n)) if n == number
    ));
}
