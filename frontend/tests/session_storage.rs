//! Session persistence through the directory-backed storage adapter.
#![cfg(not(target_arch = "wasm32"))]
#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clear failure messages"
)]

use camino::Utf8Path;
use frontend::domain::ports::{KeyValueStore, SessionStore};
use frontend::domain::{
    GuardOutcome, Location, Role, RouteGuard, Session, StoredSessionStore,
};
use frontend::outbound::storage::DirKeyValueStore;
use rstest::{fixture, rstest};
use tempfile::TempDir;

#[fixture]
fn tmp() -> TempDir {
    tempfile::tempdir().expect("tempdir")
}

fn open(tmp: &TempDir) -> StoredSessionStore<DirKeyValueStore> {
    let path = Utf8Path::from_path(tmp.path()).expect("utf-8 temp path");
    StoredSessionStore::new(DirKeyValueStore::open(path).expect("open storage"))
}

#[rstest]
fn session_survives_reopening(tmp: TempDir) {
    let session = Session::new("7", "casey", Role::Doctor)
        .with_email("casey@clinic.test")
        .with_token("abc");
    open(&tmp).set_session(&session).expect("set session");

    let reopened = open(&tmp);
    assert_eq!(reopened.get_session(), Some(session));
    assert!(reopened.is_authenticated());
}

#[rstest]
fn record_written_by_another_process_is_honoured(tmp: TempDir) {
    std::fs::write(
        tmp.path().join("loginResponse"),
        r#"{"id":"3","username":"nadia","email":null,"role":"therapist","token":"t"}"#,
    )
    .expect("write record");

    let guard = RouteGuard::new(open(&tmp));
    guard.hydrate();
    let outcome = guard.evaluate(&Location::parse("/analysis").expect("location"));
    assert!(matches!(outcome, GuardOutcome::Render { .. }));
}

#[rstest]
fn corrupted_file_reads_as_signed_out(tmp: TempDir) {
    std::fs::write(tmp.path().join("loginResponse"), "not-json").expect("write record");

    let store = open(&tmp);
    assert!(store.get_session().is_none());
    assert!(!store.is_authenticated());
}

#[rstest]
fn clearing_removes_the_file(tmp: TempDir) {
    let store = open(&tmp);
    store
        .set_session(&Session::new("1", "ada", Role::Admin).with_token("abc"))
        .expect("set session");
    store.clear_session().expect("clear");
    store.clear_session().expect("clearing twice succeeds");

    assert!(!tmp.path().join("loginResponse").exists());
    assert_eq!(
        store.storage().get_item("loginResponse").expect("read"),
        None
    );
}

#[rstest]
fn custom_keys_are_isolated(tmp: TempDir) {
    let path = Utf8Path::from_path(tmp.path()).expect("utf-8 temp path");
    let staff = StoredSessionStore::with_key(
        DirKeyValueStore::open(path).expect("open storage"),
        "staffSession",
    );
    staff
        .set_session(&Session::new("1", "ada", Role::Admin).with_token("abc"))
        .expect("set session");

    assert!(open(&tmp).get_session().is_none());
    assert!(staff.is_authenticated());
}
