//! Store-level scenarios through the public library API.

use std::fs;

use tempfile::TempDir;

use whawty_groups::core::verify::VerifyIssue;
use whawty_groups::{EntityKind, EntityName, Member, Store, StoreError};

fn new_store() -> (TempDir, Store) {
    let temp = TempDir::new().expect("create temp dir");
    let store = Store::new(temp.path());
    store.init().expect("init store");
    (temp, store)
}

fn name(s: &str) -> EntityName {
    EntityName::new(s).unwrap()
}

fn direct_members(store: &Store, group: &str) -> Vec<String> {
    store
        .members(group)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn init_requires_empty_directory() {
    let temp = TempDir::new().unwrap();
    let foo = temp.path().join("foo");
    fs::write(&foo, b"").unwrap();

    let store = Store::new(temp.path());
    assert!(matches!(store.init(), Err(StoreError::NotEmpty(_))));
    assert!(!temp.path().join("users").exists());

    fs::remove_file(&foo).unwrap();
    store.init().unwrap();
    store.check().unwrap();
}

#[test]
fn check_rejects_foreign_entries() {
    let (temp, store) = new_store();
    fs::create_dir(temp.path().join("extra")).unwrap();
    assert!(matches!(store.check(), Err(StoreError::CorruptLayout(_))));
    assert!(Store::open(temp.path()).is_err());
}

#[test]
fn add_exists_remove() {
    let (_temp, store) = new_store();
    for n in ["test-addremove-user", "hugo@example.com"] {
        store.add_user(n).unwrap();
        assert!(store.user_exists(n).unwrap());
        store.remove_user(n).unwrap();
        assert!(!store.user_exists(n).unwrap());
    }

    store.add_group("test-addremove-group").unwrap();
    assert!(store.group_exists("test-addremove-group").unwrap());
    store.remove_group("test-addremove-group").unwrap();
    assert!(!store.group_exists("test-addremove-group").unwrap());
}

#[test]
fn second_add_fails_and_changes_nothing() {
    let (_temp, store) = new_store();
    store.add_group("staff").unwrap();
    store.add_user("alice").unwrap();
    store.add_user_member("staff", "alice").unwrap();

    assert!(matches!(
        store.add_group("staff"),
        Err(StoreError::AlreadyExists { kind: EntityKind::Group, .. })
    ));
    assert!(matches!(
        store.add_user("alice"),
        Err(StoreError::AlreadyExists { kind: EntityKind::User, .. })
    ));
    assert_eq!(direct_members(&store, "staff"), vec!["user:alice"]);
}

#[test]
fn user_and_group_namespaces_are_separate() {
    let (_temp, store) = new_store();
    store.add_user("ops").unwrap();
    store.add_group("ops").unwrap();
    assert!(store.user_exists("ops").unwrap());
    assert!(store.group_exists("ops").unwrap());
}

#[test]
fn naming_rule() {
    let (_temp, store) = new_store();
    assert!(matches!(store.add_user("@hugo"), Err(StoreError::InvalidName { .. })));
    assert!(matches!(store.add_group("@hugo"), Err(StoreError::InvalidName { .. })));
    assert!(matches!(store.add_user("a/b"), Err(StoreError::InvalidName { .. })));
    store.add_user("hugo@example.com").unwrap();
    assert_eq!(store.users().unwrap(), vec![name("hugo@example.com")]);
}

#[test]
fn cycle_law() {
    let (_temp, store) = new_store();
    for g in ["A", "B", "C"] {
        store.add_group(g).unwrap();
    }
    store.add_group_member("A", "B").unwrap();
    store.add_group_member("B", "C").unwrap();

    assert!(matches!(
        store.add_group_member("C", "A"),
        Err(StoreError::CycleDetected { .. })
    ));
    assert!(matches!(
        store.add_group_member("A", "A"),
        Err(StoreError::CycleDetected { .. })
    ));

    assert_eq!(direct_members(&store, "A"), vec!["group:B"]);
    assert_eq!(direct_members(&store, "B"), vec!["group:C"]);
    assert!(direct_members(&store, "C").is_empty());
    assert!(store.verify().unwrap().is_ok());
}

#[test]
fn removing_missing_edge_is_noop() {
    let (_temp, store) = new_store();
    store.add_group("g").unwrap();
    store.add_user("u").unwrap();

    assert!(!store.remove_user_member("g", "u").unwrap());
    assert!(!store.remove_group_member("g", "other").unwrap());
    assert!(!store.remove_user_member("nogroup", "u").unwrap());
    assert!(direct_members(&store, "g").is_empty());
}

#[test]
fn adding_edge_twice_is_noop() {
    let (_temp, store) = new_store();
    store.add_group("g").unwrap();
    store.add_user("u").unwrap();
    assert!(store.add_user_member("g", "u").unwrap());
    assert!(!store.add_user_member("g", "u").unwrap());
    assert_eq!(direct_members(&store, "g"), vec!["user:u"]);
}

#[test]
fn cascade_law() {
    let (_temp, store) = new_store();
    store.add_user("u").unwrap();
    store.add_group("g").unwrap();
    store.add_group("h").unwrap();
    store.add_user_member("g", "u").unwrap();
    store.add_user_member("h", "u").unwrap();

    store.remove_user("u").unwrap();
    assert!(!store.user_exists("u").unwrap());
    assert!(direct_members(&store, "g").is_empty());
    assert!(direct_members(&store, "h").is_empty());
}

#[test]
fn removing_nested_group_cascades() {
    let (_temp, store) = new_store();
    store.add_user("alice").unwrap();
    for g in ["all", "devs"] {
        store.add_group(g).unwrap();
    }
    store.add_user_member("devs", "alice").unwrap();
    store.add_group_member("all", "devs").unwrap();
    assert_eq!(store.effective_users("all").unwrap(), vec![name("alice")]);

    store.remove_group("devs").unwrap();
    assert!(direct_members(&store, "all").is_empty());
    assert!(store.effective_users("all").unwrap().is_empty());
    assert!(store
        .memberships("alice", EntityKind::User)
        .unwrap()
        .is_empty());
}

#[test]
fn members_of_unknown_group() {
    let (_temp, store) = new_store();
    assert!(matches!(store.members("ghost"), Err(StoreError::UnknownGroup(_))));
    assert!(matches!(
        store.effective_users("ghost"),
        Err(StoreError::UnknownGroup(_))
    ));
    assert!(matches!(store.group_info("ghost"), Err(StoreError::UnknownGroup(_))));
    assert!(matches!(store.user_info("ghost"), Err(StoreError::UnknownUser(_))));
}

#[test]
fn group_info_lists_groups_first() {
    let (_temp, store) = new_store();
    store.add_user("zed").unwrap();
    store.add_group("team").unwrap();
    store.add_group("sub").unwrap();
    store.add_user_member("team", "zed").unwrap();
    store.add_group_member("team", "sub").unwrap();

    let info = store.group_info("team").unwrap();
    assert_eq!(
        info.members,
        vec![Member::group(name("sub")), Member::user(name("zed"))]
    );
}

#[test]
fn verify_finds_hand_edited_problems() {
    let (temp, store) = new_store();
    store.add_group("a").unwrap();
    store.add_group("b").unwrap();
    store.add_group_member("a", "b").unwrap();
    fs::write(
        temp.path().join("groups/b/members"),
        "members:\n- kind: group\n  name: a\n- kind: user\n  name: ghost\n",
    )
    .unwrap();

    let report = store.verify().unwrap();
    assert!(report
        .issues
        .iter()
        .any(|i| matches!(i, VerifyIssue::Cycle { .. })));
    assert!(report.issues.contains(&VerifyIssue::DanglingMember {
        group: name("b"),
        member: Member::user(name("ghost")),
    }));
}

#[test]
fn stale_staging_files_are_ignored_and_collected() {
    let (temp, store) = new_store();
    store.add_user("alice").unwrap();
    store.add_group("staff").unwrap();
    let before = fs::read(temp.path().join("groups/staff/members")).unwrap();

    // Left behind by a writer in another process that died after staging.
    fs::write(temp.path().join(".tmp/dead.staged"), b"members: [").unwrap();

    assert_eq!(fs::read(temp.path().join("groups/staff/members")).unwrap(), before);
    store.check().unwrap();
    assert!(store.verify().unwrap().is_ok());
    assert_eq!(store.collect_garbage(std::time::Duration::ZERO).unwrap(), 1);
    assert!(!temp.path().join(".tmp/dead.staged").exists());
}

#[test]
fn writes_outside_a_store_touch_nothing() {
    let temp = TempDir::new().unwrap();
    let store = Store::new(temp.path());

    assert!(matches!(store.add_user("alice"), Err(StoreError::CorruptLayout(_))));
    assert!(store.remove_user_member("g", "u").is_err());
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);

    store.init().unwrap();
    store.add_user("alice").unwrap();
    assert!(store.user_exists("alice").unwrap());
}
