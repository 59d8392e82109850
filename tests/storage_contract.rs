use portal::db::{MEETINGS, POSTS, TASKS};
use portal::{Config, Database, Meeting, NewPost, Post, Task, TaskStatus};
use std::fs;
use tempfile::TempDir;

fn open() -> (TempDir, Database) {
    let dir = TempDir::new().unwrap();
    let db = Database::open(&Config::new(dir.path())).unwrap();
    (dir, db)
}

fn new_post(title: &str, author: &str) -> NewPost {
    NewPost {
        title: title.to_string(),
        content: format!("{title} body"),
        author: author.to_string(),
        department: "All".to_string(),
        ..Default::default()
    }
}

#[test]
fn missing_document_loads_empty_and_is_created() {
    let (_dir, db) = open();
    assert!(!db.document_path(TASKS).exists());

    let first: Vec<Task> = db.load(TASKS);
    assert!(first.is_empty());
    assert!(db.document_path(TASKS).exists());

    let second: Vec<Task> = db.load(TASKS);
    assert!(second.is_empty());
}

#[test]
fn post_ids_are_unique_and_increasing() {
    let (_dir, db) = open();
    let ids: Vec<i64> = (0..5)
        .map(|i| db.create_post(new_post(&format!("post {i}"), "Alice")).unwrap().id)
        .collect();

    assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids not increasing: {ids:?}");
    assert_eq!(ids[0], 1);
}

#[test]
fn save_then_load_preserves_records_and_order() {
    let (_dir, db) = open();
    let records: Vec<Post> = ["gamma", "alpha", "beta"]
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let ts = format!("2025-01-0{}T10:00:00", i + 1);
            new_post(t, "Ravi").into_post(i as i64 + 1, ts)
        })
        .collect();

    assert!(db.save(POSTS, &records));
    let loaded: Vec<Post> = db.load(POSTS);
    assert_eq!(loaded, records);
}

#[test]
fn anonymous_post_hides_author_for_display_only() {
    let (_dir, db) = open();
    let mut draft = new_post("Salary bands", "Alice");
    draft.is_anonymous = true;
    let post = db.create_post(draft).unwrap();

    assert_eq!(post.author, "Alice");
    assert_eq!(post.display_author, "Anonymous Executive");

    let stored: Vec<Post> = db.load(POSTS);
    assert_eq!(stored[0].author, "Alice");
    assert_eq!(stored[0].display_author, "Anonymous Executive");
}

#[test]
fn corrupted_document_loads_empty() {
    let (_dir, db) = open();
    fs::write(db.document_path(POSTS), b"{ this is not json").unwrap();

    let posts: Vec<Post> = db.load(POSTS);
    assert!(posts.is_empty());

    // The bad bytes are kept aside and the store keeps working.
    let kept = fs::read_dir(db.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().starts_with("posts.json.backup_"));
    assert!(kept);

    let post = db.create_post(new_post("fresh start", "Meera")).unwrap();
    assert_eq!(post.id, 1);
}

#[test]
fn legacy_meetings_without_ids_still_load() {
    let (_dir, db) = open();
    fs::write(
        db.document_path(MEETINGS),
        r#"[{"host": "Ravi", "department": "HR", "topic": "Sync",
             "datetime": "2025-01-10 10:00:00", "agenda": "", "link": ""}]"#,
    )
    .unwrap();

    let meetings: Vec<Meeting> = db.load(MEETINGS);
    assert_eq!(meetings.len(), 1);

    let added = db
        .create_meeting(portal::NewMeeting {
            title: "Retro".to_string(),
            organizer: "Ravi".to_string(),
            datetime: "2025-01-11 10:00".to_string(),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(added.id, Some(2));
    assert_eq!(db.list_meetings().len(), 2);
}

#[test]
fn collaboration_meetings_keyed_by_time_survive_new_meeting() {
    let (_dir, db) = open();
    fs::write(
        db.document_path(MEETINGS),
        r#"[{"title": "Design review", "description": "walk through mocks",
             "organizer": "Meera", "participants": ["Ravi"],
             "time": "2025-02-03 15:00:00"}]"#,
    )
    .unwrap();

    let meetings: Vec<Meeting> = db.load(MEETINGS);
    assert_eq!(meetings.len(), 1);
    assert_eq!(meetings[0].datetime, "2025-02-03 15:00:00");

    db.create_meeting(portal::NewMeeting {
        title: "Retro".to_string(),
        organizer: "Ravi".to_string(),
        datetime: "2025-02-04 10:00".to_string(),
        ..Default::default()
    })
    .unwrap();

    let titles: Vec<String> = db.list_meetings().into_iter().map(|m| m.title).collect();
    assert_eq!(titles, ["Design review", "Retro"]);
}

#[test]
fn task_rewrite_keeps_fields_it_does_not_model() {
    let (_dir, db) = open();
    fs::write(
        db.document_path(TASKS),
        r#"[{"id": 1, "title": "Audit vendors", "description": "",
             "expected_outcomes": "shortlist of three", "kras": "cost",
             "assigned_to": "Ravi", "employee_id": "EMP-7",
             "department": "Finance", "deadline": "2025-03-01", "status": "Pending"}]"#,
    )
    .unwrap();

    assert!(db.update_task_status(1, TaskStatus::Completed).unwrap());

    let text = fs::read_to_string(db.document_path(TASKS)).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&text).unwrap();
    let task = &stored[0];
    assert_eq!(task["status"], "Completed");
    assert_eq!(task["expected_outcomes"], "shortlist of three");
    assert_eq!(task["kras"], "cost");
    assert_eq!(task["employee_id"], "EMP-7");
}

#[test]
fn tasks_without_ids_are_not_updated_by_id_zero() {
    let (_dir, db) = open();
    fs::write(
        db.document_path(TASKS),
        r#"[{"title": "First", "assigned_to": "Ravi", "status": "Pending"},
            {"title": "Second", "assigned_to": "Meera", "status": "Pending"}]"#,
    )
    .unwrap();

    assert!(!db.update_task_status(0, TaskStatus::Completed).unwrap());
    assert!(db.list_tasks().iter().all(|t| t.status == TaskStatus::Pending));
}

#[test]
fn init_creates_every_document() {
    let (_dir, db) = open();
    db.init().unwrap();
    for name in portal::db::DOCUMENTS {
        let text = fs::read_to_string(db.document_path(name)).unwrap();
        assert_eq!(text.trim(), "[]", "{name} should start empty");
    }
}
