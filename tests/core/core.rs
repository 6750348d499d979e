use timetable::core::broker::DbBroker;
use timetable::core::config::{self, Settings};
use timetable::core::db;
use timetable::core::error::TimetableError;
use timetable::core::model::Weekday;
use timetable::core::schemas;
use timetable::core::store::Store;
use timetable::initialize_all_dbs;
use std::fs;
use tempfile::tempdir;

#[test]
fn initialize_creates_all_tables_and_is_idempotent() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("data");

    initialize_all_dbs(&root).expect("first init");
    initialize_all_dbs(&root).expect("second init");

    let conn = db::db_connect(&db::timetable_db_path(&root).to_string_lossy()).expect("connect");
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .expect("prepare");
    let tables: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .expect("query")
        .collect::<Result<_, _>>()
        .expect("rows");
    for expected in [
        "settings",
        "subject_colors",
        "subjects",
        "teacher_busy_periods",
        "teachers",
    ] {
        assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
    }

    let fk_on: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .expect("pragma foreign_keys");
    assert_eq!(fk_on, 1);
}

#[test]
fn broker_records_success_and_error_in_audit_log() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    initialize_all_dbs(root).expect("init");
    let db_path = db::timetable_db_path(root);

    let broker = DbBroker::new(root);
    broker
        .with_conn(&db_path, "tester", "settings.write", |conn| {
            conn.execute(
                "INSERT INTO settings(key, value) VALUES('probe', '1')",
                [],
            )?;
            Ok(())
        })
        .expect("broker success path");

    let result: Result<(), TimetableError> = broker.with_conn(&db_path, "tester", "probe.fail", |_| {
        Err(TimetableError::ValidationError("intentional".to_string()))
    });
    assert!(result.is_err());

    assert_eq!(broker.audit_log_path(), root.join(schemas::TIMETABLE_EVENTS_NAME).as_path());
    assert!(broker.audit_log_path().exists());
    let events = broker.read_events().expect("read audit");
    let write = events
        .iter()
        .find(|ev| ev.op == "settings.write")
        .expect("write event");
    assert_eq!(write.status, "success");
    assert_eq!(write.actor, "tester");
    assert_eq!(write.db_id, schemas::TIMETABLE_DB_NAME);
    let fail = events
        .iter()
        .find(|ev| ev.op == "probe.fail")
        .expect("fail event");
    assert_eq!(fail.status, "error");
    assert!(events.iter().all(|ev| !ev.event_id.is_empty()));
}

#[test]
fn settings_default_when_nothing_is_persisted() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::new(tmp.path());
    initialize_all_dbs(&store.root).expect("init");

    assert_eq!(config::get_setting(&store, config::PERIODS_PER_DAY_KEY).unwrap(), None);
    let settings = Settings::resolve(&store).expect("resolve");
    assert_eq!(settings, Settings::default());
}

#[test]
fn persisted_periods_per_day_overrides_config_file() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::new(tmp.path());
    initialize_all_dbs(&store.root).expect("init");
    fs::write(
        store.root.join(schemas::TIMETABLE_CONFIG_NAME),
        "periods_per_day = 6\nweekdays = [\"Monday\", \"Tuesday\", \"Wednesday\", \"Thursday\", \"Friday\", \"Saturday\"]\n",
    )
    .expect("write config");

    let settings = Settings::resolve(&store).expect("resolve from file");
    assert_eq!(settings.periods_per_day, 6);
    assert_eq!(settings.weekdays.len(), 6);
    assert_eq!(settings.weekdays[5], Weekday::Saturday);

    config::set_periods_per_day(&store, 4).expect("persist");
    assert_eq!(config::get_setting(&store, config::PERIODS_PER_DAY_KEY).unwrap(), Some(4));
    let settings = Settings::resolve(&store).expect("resolve with override");
    assert_eq!(settings.periods_per_day, 4);
    assert_eq!(settings.weekdays.len(), 6);

    config::set_periods_per_day(&store, 9).expect("overwrite");
    assert_eq!(Settings::resolve(&store).unwrap().periods_per_day, 9);
}

#[test]
fn out_of_range_periods_are_refused() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::new(tmp.path());
    initialize_all_dbs(&store.root).expect("init");

    assert!(matches!(
        config::set_periods_per_day(&store, 0),
        Err(TimetableError::ConfigError(_))
    ));
    assert!(config::set_periods_per_day(&store, 13).is_err());
    assert_eq!(config::get_setting(&store, config::PERIODS_PER_DAY_KEY).unwrap(), None);
}

#[test]
fn malformed_config_file_is_a_config_error() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::new(tmp.path());
    initialize_all_dbs(&store.root).expect("init");
    fs::write(
        store.root.join(schemas::TIMETABLE_CONFIG_NAME),
        "weekdays = [\"Funday\"]\n",
    )
    .expect("write config");

    assert!(matches!(
        Settings::resolve(&store),
        Err(TimetableError::ConfigError(_))
    ));
}
