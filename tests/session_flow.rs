use rust_decimal_macros::dec;
use tally::{TallyError, TallySession};
use tally_config::Config;
use tally_core::{CoreError, MemoryBookStore, NewUser, Notification, Notifier};
use tally_domain::{MovementFilter, MovementKind, Role, RowOrder};
use tempfile::tempdir;

struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _notification: &Notification) -> Result<(), CoreError> {
        Err(CoreError::Notification("mail relay unreachable".into()))
    }
}

fn admin_session(notifier: Box<dyn Notifier>) -> TallySession {
    let mut session = TallySession::new(
        Box::new(MemoryBookStore::new()),
        Config::default(),
        notifier,
    );
    session
        .bootstrap("admin", "admin@example.com", "correct horse")
        .expect("bootstrap");
    session
}

fn staff(username: &str) -> NewUser {
    NewUser {
        username: username.into(),
        email: format!("{username}@example.com"),
        password: "battery staple".into(),
        role: Role::Staff,
        display_name: None,
    }
}

fn denied(err: &TallyError) -> bool {
    matches!(err, TallyError::Core(CoreError::PermissionDenied(_)))
}

#[test]
fn user_creation_survives_a_failed_welcome_notification() {
    let session = admin_session(Box::new(FailingNotifier));

    let creation = session.create_user(staff("maria")).expect("create");
    let warning = creation.warning.expect("warning");
    assert!(warning.contains("maria"));
    assert!(warning.contains("mail relay unreachable"));

    let names: Vec<String> = session
        .users()
        .expect("users")
        .into_iter()
        .map(|user| user.username)
        .collect();
    assert_eq!(names, vec!["admin", "maria"]);
}

#[test]
fn staff_can_record_but_only_admins_reverse() {
    let mut session = admin_session(Box::new(tally_core::LogNotifier));
    session.create_user(staff("maria")).expect("create");
    session.logout();
    session.login("maria", "battery staple").expect("login");

    session
        .apply_delta("Jan-25", "sanciones", dec!(100))
        .expect("add");
    let movement = session
        .movements(&MovementFilter::default())
        .expect("movements")[0]
        .id;
    let err = session.reverse_movement(movement).unwrap_err();
    assert!(denied(&err));

    session.logout();
    session.login("admin", "correct horse").expect("login");
    let reversal = session.reverse_movement(movement).expect("reverse");
    assert_eq!(reversal.record.expect("record").sanctions, dec!(0));
    let adds = session
        .movements(&MovementFilter {
            period: Some("Jan-25".into()),
            kind: Some(MovementKind::Add),
        })
        .expect("movements");
    assert!(adds.is_empty());
}

#[test]
fn deactivated_users_lose_access_immediately() {
    let mut session = admin_session(Box::new(tally_core::LogNotifier));
    session.create_user(staff("maria")).expect("create");
    session.logout();
    session.login("maria", "battery staple").expect("login");

    session
        .apply_delta("Jan-25", "sanciones", dec!(5))
        .expect("add as staff");

    session.logout();
    session.login("admin", "correct horse").expect("login");
    session.deactivate("maria").expect("deactivate");
    assert!(denied(&session.login("maria", "battery staple").unwrap_err()));
    assert_eq!(session.record("Jan-25").expect("record").sanctions, dec!(5));
}

#[test]
fn json_book_persists_across_sessions_and_keeps_backups() {
    let dir = tempdir().expect("tempdir");
    let config = Config {
        data_root: Some(dir.path().to_path_buf()),
        ..Config::default()
    };

    {
        let mut session = TallySession::open(config.clone()).expect("open");
        session
            .bootstrap("admin", "admin@example.com", "correct horse")
            .expect("bootstrap");
        session
            .apply_delta("Jan-25", "ingresos_mantenimiento", dec!(1000))
            .expect("add");
        session.apply_delta("Jan-25", "dppp", dec!(50)).expect("add");
    }

    let mut session = TallySession::open(config).expect("reopen");
    assert!(!session.needs_bootstrap().expect("users"));
    session.login("admin", "correct horse").expect("login");

    let record = session.record("Jan-25").expect("record");
    assert_eq!(record.net_maintenance_income, dec!(950));
    assert_eq!(record.total(), dec!(950));
    assert!(!session.backups().expect("backups").is_empty());
    assert!(session.warnings().expect("warnings").is_empty());
}

#[test]
fn restoring_a_backup_rolls_the_book_back() {
    let dir = tempdir().expect("tempdir");
    let config = Config {
        data_root: Some(dir.path().to_path_buf()),
        ..Config::default()
    };
    let mut session = TallySession::open(config).expect("open");
    session
        .bootstrap("admin", "admin@example.com", "correct horse")
        .expect("bootstrap");
    session
        .apply_delta("Jan-25", "sanciones", dec!(10))
        .expect("add");
    let backup = session.backup(Some("before february")).expect("backup");

    session
        .apply_delta("Feb-25", "sanciones", dec!(20))
        .expect("add");
    assert_eq!(session.periods().expect("periods"), vec!["Jan-25", "Feb-25"]);

    session.restore_backup(&backup.id).expect("restore");
    assert_eq!(session.periods().expect("periods"), vec!["Jan-25"]);
    let log = session.system_log().expect("log");
    assert_eq!(log[0].action, "restore_backup");
}

#[test]
fn records_follow_the_requested_order() {
    let session = admin_session(Box::new(tally_core::LogNotifier));
    for period in ["Mar-25", "Jan-25", "Feb-25"] {
        session
            .apply_delta(period, "sanciones", dec!(1))
            .expect("add");
    }

    let inserted: Vec<String> = session
        .records(RowOrder::Insertion)
        .expect("records")
        .into_iter()
        .map(|record| record.period)
        .collect();
    assert_eq!(inserted, vec!["Mar-25", "Jan-25", "Feb-25"]);
    assert_eq!(
        session.periods().expect("periods"),
        vec!["Jan-25", "Feb-25", "Mar-25"]
    );
}
