//! Multi-session tests against one file-backed database.
//!
//! Each thread owns its own desk (its own SQLite connection), the way
//! independent client sessions do. A barrier lines the calls up so they
//! genuinely race for the write lock.

use complaint_desk_core::{
    api::Response, complaint_store::Complaint, config::DeskConfig, Actor, ComplaintDesk,
    ComplaintStatus, DeskError, ErrorKind,
};
use std::sync::{Arc, Barrier};
use std::thread;

fn build_file() -> (tempfile::TempDir, ComplaintDesk) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("desk.db");
    let desk = ComplaintDesk::open(path.to_str().unwrap(), DeskConfig::default_test())
        .expect("open file desk");
    (dir, desk)
}

fn filed(desk: &ComplaintDesk) -> Complaint {
    let kadikoy = desk.store().municipality_by_name("Kadıköy").unwrap().unwrap().id;
    desk.complaints()
        .create(&Actor::Citizen(1), kadikoy, "Bus stop shelter broken")
        .unwrap()
}

/// Run `f` once per session on its own thread, all released together.
fn race<T, F>(desk: &ComplaintDesk, sessions: usize, f: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(usize, &ComplaintDesk) -> T + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(sessions));
    let f = Arc::new(f);
    let handles: Vec<_> = (0..sessions)
        .map(|i| {
            let session = desk.session().expect("open session");
            let barrier = Arc::clone(&barrier);
            let f = Arc::clone(&f);
            thread::spawn(move || {
                barrier.wait();
                f(i, &session)
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().expect("session thread")).collect()
}

/// Many citizens supporting at once: every one is counted exactly once.
#[test]
fn concurrent_supporters_are_all_counted() {
    let (_dir, desk) = build_file();
    let c = filed(&desk);
    let id = c.id;

    let results = race(&desk, 8, move |i, session| {
        session.supports().toggle(id, &Actor::Citizen(100 + i as i64))
    });

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(desk.supports().support_count(id).unwrap(), 8);
    assert_eq!(desk.store().support_row_count(id).unwrap(), 8);
    assert!(desk.audit().unwrap().is_consistent());
}

/// The same citizen double-tapping toggle from two sessions: the calls
/// serialize, so the pair nets out and nothing is double-counted.
#[test]
fn concurrent_double_toggle_nets_out() {
    let (_dir, desk) = build_file();
    let c = filed(&desk);
    let id = c.id;

    let results = race(&desk, 2, move |_, session| {
        session.supports().toggle(id, &Actor::Citizen(50))
    });

    let states: Vec<_> = results.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(states.iter().filter(|s| s.supporting).count(), 1);
    assert_eq!(desk.supports().support_count(id).unwrap(), 0);
    assert!(!desk.supports().is_supporting(id, 50).unwrap());
    assert!(desk.audit().unwrap().is_consistent());
}

/// Racing explicit "support" calls from the same citizen converge on one row.
#[test]
fn concurrent_set_support_converges() {
    let (_dir, desk) = build_file();
    let c = filed(&desk);
    let id = c.id;

    let results = race(&desk, 4, move |_, session| {
        session.supports().set_support(id, &Actor::Citizen(60), true)
    });

    assert!(results.iter().all(|r| matches!(r, Ok(s) if s.supporting)));
    assert_eq!(desk.supports().support_count(id).unwrap(), 1);
}

/// Racing rating submissions for one complaint admit exactly one winner;
/// every loser gets Conflict.
#[test]
fn concurrent_rating_has_one_winner() {
    let (_dir, desk) = build_file();
    let c = filed(&desk);
    desk.complaints()
        .set_status(c.id, &Actor::Municipality(c.municipality_id), ComplaintStatus::Completed, None)
        .unwrap();
    let id = c.id;

    let results = race(&desk, 6, move |i, session| {
        session.ratings().submit(id, &Actor::Citizen(1), 1 + (i as i64 % 5), None)
    });

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    for r in &results {
        if let Err(e) = r {
            assert!(matches!(e, DeskError::Conflict(_)), "unexpected error: {e}");
            assert_eq!(e.kind(), ErrorKind::Conflict);
        }
    }

    let stored = desk.ratings().get(id, 1).unwrap().unwrap();
    assert_eq!(&stored, winners[0]);
    let agg = desk.aggregates().get(c.municipality_id).unwrap();
    assert_eq!(agg.count, 1);
    assert_eq!(agg.average, stored.score as f64);
}

/// Concurrent staff edits are last-committed-wins: the final status is one
/// of the written values and the complaint is never left half-updated.
#[test]
fn concurrent_status_updates_last_wins() {
    let (_dir, desk) = build_file();
    let c = filed(&desk);
    let id = c.id;
    let staff = Actor::Municipality(c.municipality_id);
    let targets = [ComplaintStatus::InProgress, ComplaintStatus::Completed, ComplaintStatus::Cancelled];

    let results = race(&desk, targets.len(), move |i, session| {
        session
            .complaints()
            .set_status(id, &staff, targets[i], Some(targets[i].label()))
    });
    assert!(results.iter().all(|r| r.is_ok()));

    let final_state = desk.complaints().get(id).unwrap();
    assert!(targets.contains(&final_state.status));
    assert_eq!(final_state.feedback.as_deref(), Some(final_state.status.label()));
}

/// A writer that cannot get the lock within busy_timeout fails as a
/// retryable 503 and leaves nothing behind.
#[test]
fn write_lock_timeout_is_transient() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("desk.db");
    let config = DeskConfig {
        busy_timeout_ms: 50,
        ..DeskConfig::default_test()
    };
    let a = ComplaintDesk::open(path.to_str().unwrap(), config).expect("open file desk");
    let b = a.session().expect("open session");
    let kadikoy = a.store().municipality_by_name("Kadıköy").unwrap().unwrap().id;

    let err = a
        .store()
        .write_tx(|_| Ok(b.complaints().create(&Actor::Citizen(1), kadikoy, "Blocked").unwrap_err()))
        .unwrap();

    assert_eq!(err.kind(), ErrorKind::Transient);
    assert_eq!(err.status_code(), 503);
    assert!(err.is_retryable());
    let resp = Response::from(err);
    assert_eq!(resp.status, 503);
    assert_eq!(resp.body["error"], "internal error, please retry");

    assert!(b.complaints().list_by_author(1).unwrap().is_empty());
    assert!(b.complaints().create(&Actor::Citizen(1), kadikoy, "Retried").is_ok());
}

/// File sessions see each other's commits; an in-memory desk's session is
/// a separate, empty database.
#[test]
fn sessions_share_files_but_not_memory() {
    let (_dir, desk) = build_file();
    let c = filed(&desk);
    let session = desk.session().unwrap();
    assert_eq!(session.complaints().get(c.id).unwrap().text, c.text);

    let memory = ComplaintDesk::build_test().unwrap();
    let isolated = memory.session().unwrap();
    assert_eq!(memory.municipalities().list().unwrap().len(), 2);
    assert!(isolated.municipalities().list().unwrap().is_empty());
}
