//! First-run demo data.
//!
//! Seeding is keyed on the `Course` collection: if its key is absent the
//! substrate is treated as fresh and the demo courses, circulars and an empty
//! badge collection are written. Once the key exists seeding never runs
//! again, even if every course is later deleted.

use log::info;
use serde_json::json;

use crate::error::StoreResult;
use crate::record::{now_iso, Record, CREATED_DATE_FIELD, ID_FIELD};
use crate::store::DataStore;

pub const COURSE_ENTITY: &str = "Course";
pub const CIRCULAR_ENTITY: &str = "Circular";
pub const BADGE_ENTITY: &str = "Badge";

/// Seeds demo data if the substrate is fresh. Returns whether it did.
pub fn seed_if_empty(store: &DataStore) -> StoreResult<bool> {
    let course_key = store.config().collection_key(COURSE_ENTITY);
    let lock = store.write_lock(&course_key);
    let _guard = lock.lock();

    if store.contains(&course_key)? {
        return Ok(false);
    }

    let created = now_iso();
    let courses = with_identity(demo_courses(), "course", &created);
    let circulars = with_identity(demo_circulars(), "circular", &created);

    store.write_json(&store.config().collection_key(CIRCULAR_ENTITY), &circulars)?;
    store.write_json(&store.config().collection_key(BADGE_ENTITY), &Vec::<Record>::new())?;
    // Course goes last: its presence is what marks the substrate as seeded.
    store.write_json(&course_key, &courses)?;

    info!(
        "Seeded {} courses and {} circulars",
        courses.len(),
        circulars.len()
    );
    Ok(true)
}

fn with_identity(items: Vec<serde_json::Value>, prefix: &str, created: &str) -> Vec<Record> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            serde_json::Value::Object(mut record) => {
                record.insert(ID_FIELD.to_string(), json!(format!("{prefix}_{}", index + 1)));
                record.insert(CREATED_DATE_FIELD.to_string(), json!(created));
                Some(record)
            }
            _ => None,
        })
        .collect()
}

fn demo_courses() -> Vec<serde_json::Value> {
    vec![
        json!({
            "title": "Data Structures and Algorithms",
            "code": "CSE201",
            "description": "Arrays, linked lists, trees, graphs and the algorithms that work on them.",
            "department": "Computer Science",
            "instructor_name": "Demo Teacher",
            "instructor_email": "teacher@vignanhub.com",
            "credits": 4,
            "level": "intermediate",
            "status": "published",
            "enrolled_count": 42
        }),
        json!({
            "title": "Digital Electronics",
            "code": "ECE204",
            "description": "Number systems, logic gates, combinational and sequential circuits.",
            "department": "Electronics and Communication",
            "instructor_name": "Demo Teacher",
            "instructor_email": "teacher@vignanhub.com",
            "credits": 3,
            "level": "beginner",
            "status": "published",
            "enrolled_count": 35
        }),
        json!({
            "title": "Engineering Mathematics II",
            "code": "MAT102",
            "description": "Differential equations, Laplace transforms and vector calculus.",
            "department": "Mathematics",
            "instructor_name": "Demo Teacher",
            "instructor_email": "teacher@vignanhub.com",
            "credits": 4,
            "level": "beginner",
            "status": "published",
            "enrolled_count": 58
        }),
        json!({
            "title": "Python Programming",
            "code": "CSE105",
            "description": "Programming fundamentals, data handling and small projects in Python.",
            "department": "Computer Science",
            "instructor_name": "Demo Teacher",
            "instructor_email": "teacher@vignanhub.com",
            "credits": 3,
            "level": "beginner",
            "status": "published",
            "enrolled_count": 64
        }),
    ]
}

fn demo_circulars() -> Vec<serde_json::Value> {
    vec![
        json!({
            "title": "Mid-semester examination schedule",
            "content": "Mid-semester examinations begin next Monday. Timetables are posted on the notice board.",
            "category": "examination",
            "priority": "high",
            "published_by": "Office of the Controller of Examinations"
        }),
        json!({
            "title": "Library timings extended",
            "content": "The central library stays open until 10 PM on weekdays during the examination period.",
            "category": "general",
            "priority": "normal",
            "published_by": "Central Library"
        }),
        json!({
            "title": "Annual technical fest registrations",
            "content": "Registrations for project expo and hackathon events are open through the student portal.",
            "category": "events",
            "priority": "normal",
            "published_by": "Student Affairs"
        }),
    ]
}
