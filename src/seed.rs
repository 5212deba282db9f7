use crate::classes::ClassRecord;
use crate::fees;
use crate::store::{Store, CLASSES_KEY, STUDENTS_KEY};
use crate::students::Student;

pub struct SeedSummary {
    pub classes_seeded: usize,
    pub students_seeded: usize,
}

/// Installs the development sample data. Each collection is seeded only
/// while empty, so repeated calls (or calls against a live workspace) leave
/// existing records alone.
pub fn seed_sample_data(store: &Store) -> anyhow::Result<SeedSummary> {
    let mut summary = SeedSummary {
        classes_seeded: 0,
        students_seeded: 0,
    };

    let classes: Vec<ClassRecord> = store.load_collection(CLASSES_KEY)?;
    if classes.is_empty() {
        let samples = sample_classes();
        store.save_collection(CLASSES_KEY, &samples)?;
        summary.classes_seeded = samples.len();
    }

    let students: Vec<Student> = store.load_collection(STUDENTS_KEY)?;
    if students.is_empty() {
        let samples = sample_students();
        store.save_collection(STUDENTS_KEY, &samples)?;
        for s in &samples {
            fees::initialize_entry(store, &s.id)?;
        }
        summary.students_seeded = samples.len();
    }

    Ok(summary)
}

fn sample_classes() -> Vec<ClassRecord> {
    vec![
        ClassRecord {
            id: "c001".into(),
            name: "Sunflower".into(),
            capacity: 20,
            teacher: Some("Ms. Johnson".into()),
            description: Some("Ages 3-4, focus on early development".into()),
        },
        ClassRecord {
            id: "c002".into(),
            name: "Daisy".into(),
            capacity: 15,
            teacher: Some("Mr. Roberts".into()),
            description: Some("Ages 4-5, pre-kindergarten preparation".into()),
        },
        ClassRecord {
            id: "c003".into(),
            name: "Tulip".into(),
            capacity: 18,
            teacher: Some("Ms. Garcia".into()),
            description: Some("Ages 3-4, bilingual program".into()),
        },
    ]
}

fn sample_students() -> Vec<Student> {
    vec![
        Student {
            id: "lp001".into(),
            name: "Ethan Parker".into(),
            contact_number: "555-123-4567".into(),
            date_of_birth: "2019-03-15".into(),
            address: Some("123 Pine Avenue".into()),
            father_name: Some("James Parker".into()),
            mother_name: Some("Sarah Parker".into()),
            emergency_contact: Some("555-987-6543".into()),
            enrollment_date: Some("2022-08-25".into()),
            class_id: Some("c001".into()),
            notes: Some("Allergic to peanuts".into()),
        },
        Student {
            id: "lp002".into(),
            name: "Sophia Rodriguez".into(),
            contact_number: "555-234-5678".into(),
            date_of_birth: "2018-11-22".into(),
            address: Some("456 Elm Street".into()),
            father_name: Some("Miguel Rodriguez".into()),
            mother_name: Some("Isabella Rodriguez".into()),
            emergency_contact: Some("555-876-5432".into()),
            enrollment_date: Some("2021-09-10".into()),
            class_id: Some("c002".into()),
            notes: Some("Loves art activities".into()),
        },
        Student {
            id: "lp003".into(),
            name: "Noah Johnson".into(),
            contact_number: "555-345-6789".into(),
            date_of_birth: "2019-07-03".into(),
            address: Some("789 Oak Road".into()),
            father_name: Some("Michael Johnson".into()),
            mother_name: Some("Lisa Johnson".into()),
            emergency_contact: Some("555-765-4321".into()),
            enrollment_date: Some("2022-01-15".into()),
            class_id: Some("c001".into()),
            notes: None,
        },
        Student {
            id: "lp004".into(),
            name: "Olivia Williams".into(),
            contact_number: "555-456-7890".into(),
            date_of_birth: "2019-01-29".into(),
            address: Some("101 Maple Drive".into()),
            father_name: Some("David Williams".into()),
            mother_name: Some("Emma Williams".into()),
            emergency_contact: Some("555-654-3210".into()),
            enrollment_date: Some("2022-09-01".into()),
            class_id: Some("c003".into()),
            notes: Some("Needs assistance with speech development".into()),
        },
        Student {
            id: "lp005".into(),
            name: "Liam Brown".into(),
            contact_number: "555-567-8901".into(),
            date_of_birth: "2018-09-12".into(),
            address: Some("202 Cedar Lane".into()),
            father_name: Some("Robert Brown".into()),
            mother_name: Some("Jennifer Brown".into()),
            emergency_contact: Some("555-543-2109".into()),
            enrollment_date: Some("2021-08-20".into()),
            class_id: Some("c002".into()),
            notes: Some("Excels in physical activities".into()),
        },
    ]
}
