//! End-to-end lifecycle: file → support → resolve → rate → reopen.

use complaint_desk_core::{Actor, ComplaintDesk, ComplaintStatus, ErrorKind};

#[test]
fn complaint_lifecycle_end_to_end() {
    let _ = env_logger::builder().is_test(true).try_init();
    let desk = ComplaintDesk::build_test().expect("build test desk");
    let kadikoy = desk.store().municipality_by_name("Kadıköy").unwrap().unwrap().id;
    let author = Actor::Citizen(1);
    let staff = Actor::Municipality(kadikoy);

    // Filing.
    let c = desk.complaints().create(&author, kadikoy, "Park fountain leaking").unwrap();
    assert_eq!((c.status, c.support_count), (ComplaintStatus::Pending, 0));

    // Two supporters, one changes their mind.
    desk.supports().toggle(c.id, &Actor::Citizen(2)).unwrap();
    desk.supports().toggle(c.id, &Actor::Citizen(3)).unwrap();
    assert_eq!(desk.supports().support_count(c.id).unwrap(), 2);
    desk.supports().toggle(c.id, &Actor::Citizen(3)).unwrap();
    assert_eq!(desk.supports().support_count(c.id).unwrap(), 1);

    // Staff resolve with feedback; only the author may now rate.
    let done = desk
        .complaints()
        .set_status(c.id, &staff, ComplaintStatus::Completed, Some("Resolved"))
        .unwrap();
    assert_eq!(done.feedback.as_deref(), Some("Resolved"));
    let err = desk.ratings().submit(c.id, &Actor::Citizen(2), 5, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let rating = desk.ratings().submit(c.id, &author, 4, Some("Good")).unwrap();
    assert_eq!(desk.ratings().get(c.id, 1).unwrap(), Some(rating.clone()));
    assert_eq!(
        desk.ratings().submit(c.id, &author, 4, Some("Good")).unwrap_err().kind(),
        ErrorKind::Conflict
    );

    // Reopened: support is available again, the rating stays.
    desk.complaints().set_status(c.id, &staff, ComplaintStatus::InProgress, None).unwrap();
    let state = desk.supports().toggle(c.id, &Actor::Citizen(3)).unwrap();
    assert!(state.supporting);
    assert_eq!(state.support_count, 2);
    assert_eq!(desk.ratings().get_by_complaint(c.id).unwrap(), Some(rating));

    let agg = desk.aggregates().get(kadikoy).unwrap();
    assert_eq!((agg.average, agg.count), (4.0, 1));
    assert!(desk.audit().unwrap().is_consistent());
}
