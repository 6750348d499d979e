use timetable::core::error::TimetableError;
use timetable::core::model::{Grade, GradeSet, Section, SubjectName, parse_sections};
use timetable::core::store::Store;
use timetable::initialize_all_dbs;
use timetable::plugins::queries;
use timetable::plugins::roster::{
    SubjectImport, TeacherImport, add_subject, add_teacher, ensure_subject_color, get_teacher,
    import_subjects, import_teachers, list_subjects, list_teachers,
};
use tempfile::{TempDir, tempdir};

fn setup() -> (TempDir, Store) {
    let tmp = tempdir().unwrap();
    initialize_all_dbs(tmp.path()).unwrap();
    let store = Store::new(tmp.path());
    (tmp, store)
}

fn subject(name: &str) -> SubjectName {
    SubjectName::new(name).unwrap()
}

#[test]
fn subject_color_is_assigned_once() {
    let (_tmp, store) = setup();

    let first = ensure_subject_color(&store, &subject("Math")).unwrap();
    let second = ensure_subject_color(&store, &subject("Math")).unwrap();
    assert_eq!(first, second);
    assert!(first.starts_with('#'));
    assert_eq!(first.len(), 7);

    let colors = queries::subject_colors(&store).unwrap();
    assert_eq!(colors.len(), 1);
    assert_eq!(colors.get(&subject("Math")), Some(&first));
}

#[test]
fn adding_a_teacher_registers_the_subject() {
    let (_tmp, store) = setup();

    let grades: GradeSet = "5,6".parse().unwrap();
    let teacher = add_teacher(&store, " Ms. Rao ", &subject("Science"), &grades).unwrap();
    assert_eq!(teacher.name, "Ms. Rao");

    let stored = get_teacher(&store, teacher.id).unwrap().expect("teacher");
    assert_eq!(stored, teacher);
    assert!(queries::subject_colors(&store).unwrap().contains_key(&subject("Science")));
}

#[test]
fn teacher_without_grades_is_rejected() {
    let (_tmp, store) = setup();
    let err = add_teacher(&store, "Mr. Lee", &subject("Art"), &GradeSet::default()).unwrap_err();
    assert!(matches!(err, TimetableError::ValidationError(_)));
    assert!(list_teachers(&store).unwrap().is_empty());
}

#[test]
fn subject_rows_keep_canonical_sections() {
    let (_tmp, store) = setup();

    add_subject(
        &store,
        &subject("Math"),
        &Grade::new("5").unwrap(),
        6,
        &parse_sections("A, B"),
    )
    .unwrap();
    let subjects = list_subjects(&store).unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].periods_per_week, 6);
    assert_eq!(
        subjects[0].sections,
        vec![Section::new("A").unwrap(), Section::new("B").unwrap()]
    );
}

#[test]
fn import_is_all_or_nothing() {
    let (_tmp, store) = setup();

    let rows = vec![
        TeacherImport {
            teacher_name: "Ms. Rao".to_string(),
            subject: "Math".to_string(),
            grades: "5".to_string(),
        },
        TeacherImport {
            teacher_name: "Mr. Blank".to_string(),
            subject: "   ".to_string(),
            grades: "5".to_string(),
        },
    ];
    assert!(import_teachers(&store, &rows).is_err());
    assert!(list_teachers(&store).unwrap().is_empty());
    assert!(queries::subject_colors(&store).unwrap().is_empty());

    let ids = import_teachers(&store, &rows[..1]).unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(list_teachers(&store).unwrap()[0].id, ids[0]);
}

#[test]
fn subject_import_defaults_to_section_a() {
    let (_tmp, store) = setup();

    let rows: Vec<SubjectImport> = serde_json::from_str(
        r#"[
            {"subject_name": "Math", "grade": "5", "periods_per_week": 6},
            {"subject_name": "Games", "grade": "5", "periods_per_week": 1, "sections": "A,B"}
        ]"#,
    )
    .unwrap();
    assert_eq!(import_subjects(&store, &rows).unwrap(), 2);

    let subjects = list_subjects(&store).unwrap();
    assert_eq!(subjects[0].sections, vec![Section::new("A").unwrap()]);
    assert_eq!(subjects[1].sections.len(), 2);
    assert_eq!(queries::subject_colors(&store).unwrap().len(), 2);
}
