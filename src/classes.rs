use serde::{Deserialize, Serialize};

use crate::ids;
use crate::store::{merge_record, Store, CLASSES_KEY};
use crate::students;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub id: String,
    pub name: String,
    pub capacity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClass {
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub teacher: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

pub fn all_classes(store: &Store) -> anyhow::Result<Vec<ClassRecord>> {
    store.load_collection(CLASSES_KEY)
}

pub fn add_class(store: &Store, new: NewClass) -> anyhow::Result<ClassRecord> {
    let class = ClassRecord {
        id: ids::new_id(),
        name: new.name,
        capacity: new.capacity,
        teacher: new.teacher,
        description: new.description,
    };
    let mut classes = all_classes(store)?;
    classes.push(class.clone());
    store.save_collection(CLASSES_KEY, &classes)?;
    Ok(class)
}

pub fn get_class_by_id(store: &Store, id: &str) -> anyhow::Result<Option<ClassRecord>> {
    Ok(all_classes(store)?.into_iter().find(|c| c.id == id))
}

pub fn update_class(
    store: &Store,
    id: &str,
    patch: &serde_json::Value,
) -> anyhow::Result<Option<ClassRecord>> {
    let mut classes = all_classes(store)?;
    let Some(idx) = classes.iter().position(|c| c.id == id) else {
        return Ok(None);
    };

    let mut updated: ClassRecord = merge_record(&classes[idx], patch)?;
    updated.id = id.to_string();
    classes[idx] = updated.clone();
    store.save_collection(CLASSES_KEY, &classes)?;
    Ok(Some(updated))
}

/// Plain removal. The in-use guard (refuse while students are enrolled) is
/// the caller's responsibility, see the classes IPC handler.
pub fn delete_class(store: &Store, id: &str) -> anyhow::Result<bool> {
    let classes = all_classes(store)?;
    if !classes.iter().any(|c| c.id == id) {
        return Ok(false);
    }
    let remaining: Vec<ClassRecord> = classes.into_iter().filter(|c| c.id != id).collect();
    store.save_collection(CLASSES_KEY, &remaining)?;
    Ok(true)
}

/// Enrollment count: exact id match scan of the student directory.
pub fn count_students_by_class(store: &Store, class_id: &str) -> anyhow::Result<usize> {
    Ok(students::all_students(store)?
        .iter()
        .filter(|s| s.class_id.as_deref() == Some(class_id))
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::students::{add_student, NewStudent};

    fn new_class(name: &str) -> NewClass {
        NewClass {
            name: name.to_string(),
            capacity: 20,
            teacher: Some("Ms. Johnson".to_string()),
            description: None,
        }
    }

    fn enrolled(name: &str, class_id: &str) -> NewStudent {
        NewStudent {
            name: name.to_string(),
            contact_number: "555-000-0000".to_string(),
            date_of_birth: "2019-01-01".to_string(),
            address: None,
            father_name: None,
            mother_name: None,
            emergency_contact: None,
            enrollment_date: None,
            class_id: Some(class_id.to_string()),
            notes: None,
        }
    }

    #[test]
    fn crud_round_trip() {
        let store = Store::open_in_memory().expect("store");
        let class = add_class(&store, new_class("Sunflower")).expect("add");

        let loaded = get_class_by_id(&store, &class.id).expect("get").expect("found");
        assert_eq!(loaded.name, "Sunflower");
        assert_eq!(loaded.capacity, 20);

        let updated = update_class(&store, &class.id, &serde_json::json!({ "capacity": 25 }))
            .expect("update")
            .expect("found");
        assert_eq!(updated.capacity, 25);
        assert_eq!(updated.name, "Sunflower");

        assert!(delete_class(&store, &class.id).expect("delete"));
        assert!(!delete_class(&store, &class.id).expect("second delete"));
    }

    #[test]
    fn counts_exact_class_id_matches() {
        let store = Store::open_in_memory().expect("store");
        let sunflower = add_class(&store, new_class("Sunflower")).expect("add");
        let daisy = add_class(&store, new_class("Daisy")).expect("add");

        add_student(&store, enrolled("Ethan Parker", &sunflower.id)).expect("add");
        add_student(&store, enrolled("Noah Johnson", &sunflower.id)).expect("add");
        add_student(&store, enrolled("Sophia Rodriguez", &daisy.id)).expect("add");

        assert_eq!(count_students_by_class(&store, &sunflower.id).expect("count"), 2);
        assert_eq!(count_students_by_class(&store, &daisy.id).expect("count"), 1);
        assert_eq!(count_students_by_class(&store, "zzzzzzz").expect("count"), 0);
    }
}
