//! SupportLedger tests: toggling, the explicit set form, eligibility and
//! the support-count invariant.

use complaint_desk_core::{
    complaint_store::Complaint, support_ledger::SupportState, Actor, ComplaintDesk,
    ComplaintStatus, ErrorKind,
};

fn build() -> ComplaintDesk {
    let _ = env_logger::builder().is_test(true).try_init();
    ComplaintDesk::build_test().expect("build test desk")
}

/// One Pending complaint by citizen 10 against the first seeded municipality.
fn filed(desk: &ComplaintDesk) -> Complaint {
    let kadikoy = desk.store().municipality_by_name("Kadıköy").unwrap().unwrap().id;
    desk.complaints()
        .create(&Actor::Citizen(10), kadikoy, "Sidewalk blocked by scaffolding")
        .unwrap()
}

fn staff(c: &Complaint) -> Actor {
    Actor::Municipality(c.municipality_id)
}

/// Two distinct supporters count twice; one withdrawing leaves one.
#[test]
fn two_supporters_then_one_withdraws() {
    let desk = build();
    let c = filed(&desk);

    let a = desk.supports().toggle(c.id, &Actor::Citizen(1)).unwrap();
    assert_eq!(a, SupportState { supporting: true, support_count: 1 });
    let b = desk.supports().toggle(c.id, &Actor::Citizen(2)).unwrap();
    assert_eq!(b, SupportState { supporting: true, support_count: 2 });
    assert_eq!(desk.supports().support_count(c.id).unwrap(), 2);

    let a2 = desk.supports().toggle(c.id, &Actor::Citizen(1)).unwrap();
    assert_eq!(a2, SupportState { supporting: false, support_count: 1 });
    assert_eq!(desk.complaints().get(c.id).unwrap().support_count, 1);
}

/// toggle; toggle returns the ledger to where it started.
#[test]
fn double_toggle_restores_state() {
    let desk = build();
    let c = filed(&desk);
    desk.supports().toggle(c.id, &Actor::Citizen(3)).unwrap();
    let before = desk.supports().list_supported_by_user(4).unwrap();
    let count_before = desk.supports().support_count(c.id).unwrap();

    desk.supports().toggle(c.id, &Actor::Citizen(4)).unwrap();
    desk.supports().toggle(c.id, &Actor::Citizen(4)).unwrap();

    assert_eq!(desk.supports().list_supported_by_user(4).unwrap(), before);
    assert_eq!(desk.supports().support_count(c.id).unwrap(), count_before);
}

/// The stored counter matches the live relation rows after an arbitrary mix
/// of toggles and explicit sets.
#[test]
fn support_count_tracks_relation_rows() {
    let desk = build();
    let c = filed(&desk);
    let ops: [(i64, Option<bool>); 10] = [
        (1, None),
        (2, None),
        (3, Some(true)),
        (3, Some(true)),
        (1, None),
        (4, Some(false)),
        (2, Some(false)),
        (5, None),
        (5, Some(true)),
        (1, None),
    ];
    for (user, desired) in ops {
        let actor = Actor::Citizen(user);
        match desired {
            None => desk.supports().toggle(c.id, &actor).unwrap(),
            Some(d) => desk.supports().set_support(c.id, &actor, d).unwrap(),
        };
        let stored = desk.supports().support_count(c.id).unwrap();
        let live = desk.store().support_row_count(c.id).unwrap();
        assert_eq!(stored, live, "after user {user} {desired:?}");
    }
    // Users 1, 3 and 5 end up supporting.
    assert_eq!(desk.supports().support_count(c.id).unwrap(), 3);
    assert!(desk.audit().unwrap().is_consistent());
}

#[test]
fn set_support_is_idempotent() {
    let desk = build();
    let c = filed(&desk);
    let user = Actor::Citizen(7);

    let first = desk.supports().set_support(c.id, &user, true).unwrap();
    let second = desk.supports().set_support(c.id, &user, true).unwrap();
    assert_eq!(first, second);
    assert_eq!(second.support_count, 1);

    let off = desk.supports().set_support(c.id, &user, false).unwrap();
    let off_again = desk.supports().set_support(c.id, &user, false).unwrap();
    assert_eq!(off, off_again);
    assert_eq!(off_again, SupportState { supporting: false, support_count: 0 });
}

/// New support on a Completed or Cancelled complaint is a conflict.
#[test]
fn cannot_support_resolved_complaint() {
    let desk = build();
    for terminal in [ComplaintStatus::Completed, ComplaintStatus::Cancelled] {
        let c = filed(&desk);
        desk.complaints().set_status(c.id, &staff(&c), terminal, None).unwrap();

        let err = desk.supports().toggle(c.id, &Actor::Citizen(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.to_string(), "cannot support a resolved complaint");

        let err = desk.supports().set_support(c.id, &Actor::Citizen(1), true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(desk.supports().support_count(c.id).unwrap(), 0);
    }
}

/// Existing support may still be withdrawn after resolution.
#[test]
fn withdraw_allowed_after_resolution() {
    let desk = build();
    let c = filed(&desk);
    desk.supports().toggle(c.id, &Actor::Citizen(1)).unwrap();
    desk.complaints().set_status(c.id, &staff(&c), ComplaintStatus::Completed, None).unwrap();

    // Already supporting: the explicit form is a no-op even when resolved.
    let kept = desk.supports().set_support(c.id, &Actor::Citizen(1), true).unwrap();
    assert_eq!(kept, SupportState { supporting: true, support_count: 1 });

    let state = desk.supports().toggle(c.id, &Actor::Citizen(1)).unwrap();
    assert_eq!(state, SupportState { supporting: false, support_count: 0 });
}

/// Moving out of a terminal state reopens support.
#[test]
fn reopening_restores_support() {
    let desk = build();
    let c = filed(&desk);
    desk.complaints().set_status(c.id, &staff(&c), ComplaintStatus::Completed, None).unwrap();
    assert!(desk.supports().toggle(c.id, &Actor::Citizen(1)).is_err());

    desk.complaints().set_status(c.id, &staff(&c), ComplaintStatus::InProgress, None).unwrap();
    let state = desk.supports().toggle(c.id, &Actor::Citizen(1)).unwrap();
    assert_eq!(state, SupportState { supporting: true, support_count: 1 });
}

#[test]
fn author_cannot_support_own_complaint() {
    let desk = build();
    let c = filed(&desk);

    let err = desk.supports().toggle(c.id, &Actor::Citizen(c.author_id)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(desk.supports().support_count(c.id).unwrap(), 0);
}

#[test]
fn support_requires_citizen_and_existing_complaint() {
    let desk = build();
    let c = filed(&desk);

    let err = desk.supports().toggle(c.id, &staff(&c)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);

    let err = desk.supports().toggle(12_345, &Actor::Citizen(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

/// The supported-ids list reflects each committed toggle immediately.
#[test]
fn supported_ids_read_after_write() {
    let desk = build();
    let c1 = filed(&desk);
    let c2 = filed(&desk);
    let me = Actor::Citizen(42);

    desk.supports().toggle(c2.id, &me).unwrap();
    assert_eq!(desk.supports().list_supported_by_user(42).unwrap(), vec![c2.id]);
    desk.supports().toggle(c1.id, &me).unwrap();
    assert_eq!(desk.supports().list_supported_by_user(42).unwrap(), vec![c1.id, c2.id]);
    desk.supports().toggle(c2.id, &me).unwrap();
    assert_eq!(desk.supports().list_supported_by_user(42).unwrap(), vec![c1.id]);
    assert!(desk.supports().is_supporting(c1.id, 42).unwrap());
    assert!(!desk.supports().is_supporting(c2.id, 42).unwrap());
}
