use timetable::core::config::Settings;
use timetable::core::model::{Grade, GradeSet, Section, SubjectName, Weekday, parse_sections};
use timetable::core::store::Store;
use timetable::initialize_all_dbs;
use timetable::plugins::assignments::{count, get_assignment, save};
use timetable::plugins::coverage::{Placement, ensure_coverage_all, ensure_games, has_coverage};
use timetable::plugins::roster::{Teacher, add_subject, add_teacher, list_teachers};
use tempfile::{TempDir, tempdir};

fn setup() -> (TempDir, Store) {
    let tmp = tempdir().unwrap();
    initialize_all_dbs(tmp.path()).unwrap();
    let store = Store::new(tmp.path());
    (tmp, store)
}

fn grade(s: &str) -> Grade {
    Grade::new(s).unwrap()
}

fn section(s: &str) -> Section {
    Section::new(s).unwrap()
}

fn teacher(store: &Store, name: &str, subject: &str, grades: &str) -> Teacher {
    let grades: GradeSet = grades.parse().unwrap();
    add_teacher(store, name, &SubjectName::new(subject).unwrap(), &grades).unwrap()
}

fn games_teachers(store: &Store) -> Vec<Teacher> {
    list_teachers(store)
        .unwrap()
        .into_iter()
        .filter(|t| t.subject.as_str() == "Games")
        .collect()
}

#[test]
fn first_free_slot_follows_week_order() {
    let (_tmp, store) = setup();
    let settings = Settings {
        periods_per_day: 2,
        ..Settings::default()
    };
    let rao = teacher(&store, "Ms. Rao", "Math", "5");
    save(&store, None, rao.id, &grade("5"), &section("A"), 1, Weekday::Monday).unwrap();
    save(&store, None, rao.id, &grade("5"), &section("A"), 2, Weekday::Monday).unwrap();

    let placement = ensure_games(&store, &settings, &grade("5"), &section("A")).unwrap();
    match placement {
        Placement::Placed {
            day,
            period,
            created_teacher,
            ..
        } => {
            assert_eq!(day, Weekday::Tuesday);
            assert_eq!(period, 1);
            assert!(created_teacher);
        }
        other => panic!("expected placement, got {other:?}"),
    }

    let occupant = get_assignment(&store, Weekday::Tuesday, 1, &grade("5"), &section("A"))
        .unwrap()
        .expect("games placed");
    assert_eq!(occupant.subject.as_str(), "Games");
    assert_eq!(occupant.teacher_name, "Games Teacher");

    let fallback = games_teachers(&store);
    assert_eq!(fallback.len(), 1);
    assert!(fallback[0].grades.contains(&grade("5")));
}

#[test]
fn ensure_games_is_idempotent() {
    let (_tmp, store) = setup();
    let settings = Settings::default();

    assert!(!has_coverage(&store, &settings, &grade("7"), &section("B")).unwrap());
    ensure_games(&store, &settings, &grade("7"), &section("B")).unwrap();
    assert!(has_coverage(&store, &settings, &grade("7"), &section("B")).unwrap());
    let after_first = count(&store).unwrap();

    let again = ensure_games(&store, &settings, &grade("7"), &section("B")).unwrap();
    assert_eq!(again, Placement::AlreadyCovered { periods: 1 });
    assert_eq!(count(&store).unwrap(), after_first);
    assert_eq!(games_teachers(&store).len(), 1);
}

#[test]
fn existing_games_teacher_is_reused() {
    let (_tmp, store) = setup();
    let settings = Settings::default();
    let coach = teacher(&store, "Coach Patel", "Games", "4,5");

    let placement = ensure_games(&store, &settings, &grade("5"), &section("A")).unwrap();
    match placement {
        Placement::Placed {
            teacher_id,
            created_teacher,
            day,
            period,
            ..
        } => {
            assert_eq!(teacher_id, coach.id);
            assert!(!created_teacher);
            assert_eq!((day, period), (Weekday::Monday, 1));
        }
        other => panic!("expected placement, got {other:?}"),
    }
    assert_eq!(games_teachers(&store).len(), 1);
}

#[test]
fn games_teacher_grade_match_is_exact() {
    let (_tmp, store) = setup();
    let settings = Settings::default();
    let coach = teacher(&store, "Coach Patel", "Games", "10");

    let placement = ensure_games(&store, &settings, &grade("1"), &section("A")).unwrap();
    match placement {
        Placement::Placed {
            teacher_id,
            created_teacher,
            ..
        } => {
            assert_ne!(teacher_id, coach.id);
            assert!(created_teacher);
        }
        other => panic!("expected placement, got {other:?}"),
    }
    assert_eq!(games_teachers(&store).len(), 2);
}

#[test]
fn full_week_reports_no_free_slot_and_writes_nothing() {
    let (_tmp, store) = setup();
    let settings = Settings {
        periods_per_day: 1,
        ..Settings::default()
    };
    let rao = teacher(&store, "Ms. Rao", "Math", "5");
    for day in [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ] {
        save(&store, None, rao.id, &grade("5"), &section("A"), 1, day).unwrap();
    }

    let placement = ensure_games(&store, &settings, &grade("5"), &section("A")).unwrap();
    assert_eq!(placement, Placement::NoFreeSlot);
    assert_eq!(count(&store).unwrap(), 5);
    assert!(games_teachers(&store).is_empty());
}

#[test]
fn coverage_pass_visits_each_grade_section_once() {
    let (_tmp, store) = setup();
    let settings = Settings::default();
    let math = SubjectName::new("Math").unwrap();
    let art = SubjectName::new("Art").unwrap();
    add_subject(&store, &math, &grade("5"), 6, &parse_sections("A,B")).unwrap();
    add_subject(&store, &art, &grade("5"), 2, &parse_sections("B")).unwrap();
    add_subject(&store, &math, &grade("6"), 6, &parse_sections("A")).unwrap();

    let report = ensure_coverage_all(&store, &settings).unwrap();
    let visited: Vec<(String, String)> = report
        .outcomes
        .iter()
        .map(|o| (o.grade.to_string(), o.section.to_string()))
        .collect();
    assert_eq!(
        visited,
        vec![
            ("5".to_string(), "A".to_string()),
            ("5".to_string(), "B".to_string()),
            ("6".to_string(), "A".to_string()),
        ]
    );
    assert_eq!(report.placed(), 3);
    assert_eq!(report.exhausted(), 0);

    // One fallback teacher per grade; the second section of grade 5 reuses it.
    assert_eq!(games_teachers(&store).len(), 2);

    let rerun = ensure_coverage_all(&store, &settings).unwrap();
    assert_eq!(rerun.placed(), 0);
    assert!(rerun
        .outcomes
        .iter()
        .all(|o| o.placement == Placement::AlreadyCovered { periods: 1 }));
    assert_eq!(count(&store).unwrap(), 3);
}

#[test]
fn coverage_pass_with_no_subjects_is_empty() {
    let (_tmp, store) = setup();
    let report = ensure_coverage_all(&store, &Settings::default()).unwrap();
    assert!(report.outcomes.is_empty());
    assert_eq!(count(&store).unwrap(), 0);
}

#[test]
fn fallback_teacher_for_multi_word_grade_is_reused() {
    let (_tmp, store) = setup();
    let settings = Settings::default();

    let first = ensure_games(&store, &settings, &grade("Grade 5"), &section("A")).unwrap();
    let second = ensure_games(&store, &settings, &grade("Grade 5"), &section("B")).unwrap();
    match (first, second) {
        (
            Placement::Placed {
                teacher_id: a,
                created_teacher: true,
                ..
            },
            Placement::Placed {
                teacher_id: b,
                created_teacher: false,
                ..
            },
        ) => assert_eq!(a, b),
        other => panic!("unexpected placements: {other:?}"),
    }
    assert_eq!(games_teachers(&store).len(), 1);
}

#[test]
fn failed_coverage_pass_rolls_back_earlier_placements() {
    let (_tmp, store) = setup();
    // A blank fallback name makes teacher creation fail for grade 6.
    let settings = Settings {
        fallback_teacher_name: "  ".to_string(),
        ..Settings::default()
    };
    teacher(&store, "Coach Patel", "Games", "5");
    let math = SubjectName::new("Math").unwrap();
    add_subject(&store, &math, &grade("5"), 6, &parse_sections("A")).unwrap();
    add_subject(&store, &math, &grade("6"), 6, &parse_sections("A")).unwrap();

    assert!(ensure_coverage_all(&store, &settings).is_err());
    assert_eq!(count(&store).unwrap(), 0);
    assert!(!has_coverage(&store, &settings, &grade("5"), &section("A")).unwrap());
    assert_eq!(games_teachers(&store).len(), 1);
}
