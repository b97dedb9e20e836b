//! Unit tests for the session holder.

use super::*;
use crate::policy::Role;

fn identity(role: Role) -> Identity {
    Identity {
        id: 7,
        username: "operator".to_string(),
        role,
    }
}

#[test]
fn test_starts_unauthenticated_without_store() {
    let session = Session::new(None);
    assert!(!session.is_authenticated());
    assert!(session.get().is_none());
    assert!(session.credential().is_none());
}

#[test]
fn test_set_stores_pair_atomically() {
    let session = Session::new(None);
    session.set("tok-123".to_string(), identity(Role::Admin));

    let (credential, id) = session.get().expect("authenticated");
    assert_eq!(credential, "tok-123");
    assert_eq!(id.username, "operator");
    assert_eq!(id.role, Role::Admin);
}

#[test]
fn test_clear_is_idempotent() {
    let session = Session::new(None);
    session.set("tok".to_string(), identity(Role::Monitoring));

    session.clear();
    assert!(!session.is_authenticated());
    // Second clear of an already-cleared session is a no-op.
    session.clear();
    assert!(!session.is_authenticated());
}

#[test]
fn test_watch_sees_single_transition_for_repeated_clears() {
    let session = Session::new(None);
    session.set("tok".to_string(), identity(Role::Service));

    let rx = session.subscribe();
    assert!(*rx.borrow());

    session.clear();
    session.clear();
    session.clear();

    // Exactly one transition to false, no flapping back.
    assert!(!*rx.borrow());
}

#[test]
fn test_persistence_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    {
        let session = Session::new(Some(path.clone()));
        session.set("persisted-token".to_string(), identity(Role::Infrastructure));
    }

    let restored = Session::new(Some(path.clone()));
    let (credential, id) = restored.get().expect("restored from disk");
    assert_eq!(credential, "persisted-token");
    assert_eq!(id.role, Role::Infrastructure);

    restored.clear();
    assert!(!path.exists());

    let after_logout = Session::new(Some(path));
    assert!(!after_logout.is_authenticated());
}

#[test]
fn test_corrupt_store_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "not json").unwrap();

    let session = Session::new(Some(path));
    assert!(!session.is_authenticated());
}
