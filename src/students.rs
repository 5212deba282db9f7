use serde::{Deserialize, Serialize};

use crate::classes;
use crate::fees;
use crate::ids;
use crate::store::{merge_record, Store, STUDENTS_KEY};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub contact_number: String,
    pub date_of_birth: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Creation payload: a `Student` minus the assigned id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub name: String,
    pub contact_number: String,
    pub date_of_birth: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub father_name: Option<String>,
    #[serde(default)]
    pub mother_name: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub enrollment_date: Option<String>,
    #[serde(default)]
    pub class_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

pub fn all_students(store: &Store) -> anyhow::Result<Vec<Student>> {
    store.load_collection(STUDENTS_KEY)
}

/// Appends the new record and initializes its fee entry (reusing one if a
/// previous record with the same id left one behind).
pub fn add_student(store: &Store, new: NewStudent) -> anyhow::Result<Student> {
    let student = Student {
        id: ids::new_id(),
        name: new.name,
        contact_number: new.contact_number,
        date_of_birth: new.date_of_birth,
        address: new.address,
        father_name: new.father_name,
        mother_name: new.mother_name,
        emergency_contact: new.emergency_contact,
        enrollment_date: new.enrollment_date,
        class_id: new.class_id,
        notes: new.notes,
    };

    let mut students = all_students(store)?;
    students.push(student.clone());
    store.save_collection(STUDENTS_KEY, &students)?;

    fees::initialize_entry(store, &student.id)?;
    Ok(student)
}

pub fn get_student_by_id(store: &Store, id: &str) -> anyhow::Result<Option<Student>> {
    Ok(all_students(store)?.into_iter().find(|s| s.id == id))
}

pub fn update_student(
    store: &Store,
    id: &str,
    patch: &serde_json::Value,
) -> anyhow::Result<Option<Student>> {
    let mut students = all_students(store)?;
    let Some(idx) = students.iter().position(|s| s.id == id) else {
        return Ok(None);
    };

    let mut updated: Student = merge_record(&students[idx], patch)?;
    updated.id = id.to_string();
    students[idx] = updated.clone();
    store.save_collection(STUDENTS_KEY, &students)?;
    Ok(Some(updated))
}

/// Cascade delete. The fee entry goes first: a crash between the two writes
/// leaves a student without an entry, never an entry without a student that
/// the startup sweep would have to guess about.
pub fn delete_student(store: &Store, id: &str) -> anyhow::Result<bool> {
    let students = all_students(store)?;
    if !students.iter().any(|s| s.id == id) {
        return Ok(false);
    }

    fees::delete_entry_for_student(store, id)?;

    let remaining: Vec<Student> = students.into_iter().filter(|s| s.id != id).collect();
    store.save_collection(STUDENTS_KEY, &remaining)?;
    Ok(true)
}

/// Case-insensitive substring match on id, name, parent names and the
/// resolved class name; contact numbers match case-sensitively. A blank
/// query returns the whole directory.
pub fn search_students(store: &Store, query: &str) -> anyhow::Result<Vec<Student>> {
    let students = all_students(store)?;
    let query = query.trim();
    if query.is_empty() {
        return Ok(students);
    }

    let class_list = classes::all_classes(store)?;
    let class_name = |class_id: &Option<String>| -> Option<&str> {
        let id = class_id.as_deref()?;
        class_list
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    };

    let lq = query.to_lowercase();
    let opt_matches =
        |field: &Option<String>| field.as_deref().is_some_and(|v| v.to_lowercase().contains(&lq));

    Ok(students
        .into_iter()
        .filter(|s| {
            s.id.to_lowercase().contains(&lq)
                || s.name.to_lowercase().contains(&lq)
                || s.contact_number.contains(query)
                || opt_matches(&s.father_name)
                || opt_matches(&s.mother_name)
                || class_name(&s.class_id).is_some_and(|n| n.to_lowercase().contains(&lq))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::{self, NewClass};

    fn sample(name: &str, contact: &str) -> NewStudent {
        NewStudent {
            name: name.to_string(),
            contact_number: contact.to_string(),
            date_of_birth: "2019-03-15".to_string(),
            address: None,
            father_name: None,
            mother_name: None,
            emergency_contact: None,
            enrollment_date: None,
            class_id: None,
            notes: None,
        }
    }

    #[test]
    fn add_assigns_id_and_initializes_fee_entry() {
        let store = Store::open_in_memory().expect("store");
        let student = add_student(&store, sample("Ethan Parker", "555-123-4567")).expect("add");
        assert_eq!(student.id.len(), 7);
        let entry = fees::get_entry_by_student(&store, &student.id).expect("load entry");
        assert!(entry.is_some());
    }

    #[test]
    fn update_merges_partial_fields_and_pins_id() {
        let store = Store::open_in_memory().expect("store");
        let student = add_student(&store, sample("Ethan Parker", "555-123-4567")).expect("add");

        let updated = update_student(
            &store,
            &student.id,
            &serde_json::json!({ "notes": "allergic to peanuts", "id": "hijack!" }),
        )
        .expect("update")
        .expect("found");

        assert_eq!(updated.id, student.id);
        assert_eq!(updated.name, "Ethan Parker");
        assert_eq!(updated.notes.as_deref(), Some("allergic to peanuts"));

        let missing = update_student(&store, "zzzzzzz", &serde_json::json!({ "notes": "x" }))
            .expect("update");
        assert!(missing.is_none());
    }

    #[test]
    fn delete_cascades_to_fee_entry() {
        let store = Store::open_in_memory().expect("store");
        let student = add_student(&store, sample("Ethan Parker", "555-123-4567")).expect("add");
        let other = add_student(&store, sample("Sophia Rodriguez", "555-234-5678")).expect("add");

        assert!(delete_student(&store, &student.id).expect("delete"));
        assert!(get_student_by_id(&store, &student.id).expect("get").is_none());
        assert!(fees::get_entry_by_student(&store, &student.id)
            .expect("entry")
            .is_none());

        // Unrelated records untouched.
        assert!(get_student_by_id(&store, &other.id).expect("get").is_some());
        assert!(fees::get_entry_by_student(&store, &other.id)
            .expect("entry")
            .is_some());

        assert!(!delete_student(&store, &student.id).expect("second delete"));
    }

    #[test]
    fn search_matches_names_parents_and_class() {
        let store = Store::open_in_memory().expect("store");
        let class = classes::add_class(
            &store,
            NewClass {
                name: "Sunflower".into(),
                capacity: 20,
                teacher: None,
                description: None,
            },
        )
        .expect("class");

        let mut a = sample("Ethan Parker", "555-123-4567");
        a.father_name = Some("James Parker".into());
        a.class_id = Some(class.id.clone());
        let a = add_student(&store, a).expect("add");
        let b = add_student(&store, sample("Sophia Rodriguez", "555-234-5678")).expect("add");

        assert!(search_students(&store, "  ").expect("all").len() == 2);

        let by_parent = search_students(&store, "james").expect("search");
        assert_eq!(by_parent.len(), 1);
        assert_eq!(by_parent[0].id, a.id);

        let by_class = search_students(&store, "sunflower").expect("search");
        assert_eq!(by_class.len(), 1);
        assert_eq!(by_class[0].id, a.id);

        let by_contact = search_students(&store, "234-5678").expect("search");
        assert_eq!(by_contact.len(), 1);
        assert_eq!(by_contact[0].id, b.id);

        assert!(search_students(&store, "no such person").expect("search").is_empty());
    }
}
