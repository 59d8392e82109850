use portal::{Config, Database, NewPost, Viewer};
use tempfile::TempDir;

fn open() -> (TempDir, Database) {
    let dir = TempDir::new().unwrap();
    let db = Database::open(&Config::new(dir.path())).unwrap();
    (dir, db)
}

fn publish(db: &Database, title: &str, department: &str, vip: bool, recipients: &[&str]) {
    db.create_post(NewPost {
        title: title.to_string(),
        content: "content".to_string(),
        author: "Alice".to_string(),
        department: department.to_string(),
        tags: vec!["update".to_string()],
        is_vip: vip,
        vip_recipients: recipients.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    })
    .unwrap();
}

fn titles(posts: Vec<portal::Post>) -> Vec<String> {
    posts.into_iter().map(|p| p.title).collect()
}

#[test]
fn vip_post_reaches_elevated_role_and_author_only() {
    let (_dir, db) = open();
    publish(&db, "board memo", "C-Suite", true, &["CEO"]);

    let ceo = Viewer::new("Carol", "Finance", "CEO");
    let alice = Viewer::new("Alice", "Engineering", "Employee");
    let bob = Viewer::new("Bob", "Engineering", "Employee");

    assert_eq!(titles(db.visible_posts(&ceo)), vec!["board memo"]);
    assert_eq!(titles(db.visible_posts(&alice)), vec!["board memo"]);
    assert!(db.visible_posts(&bob).is_empty());
}

#[test]
fn vip_gate_beats_company_wide_department() {
    let (_dir, db) = open();
    publish(&db, "restricted", "All", true, &[]);

    let bob = Viewer::new("Bob", "Engineering", "Employee");
    assert!(db.visible_posts(&bob).is_empty());
}

#[test]
fn department_posts_stay_in_department() {
    let (_dir, db) = open();
    publish(&db, "sprint notes", "Engineering", false, &[]);

    let engineer = Viewer::new("Bob", "Engineering", "Employee");
    let marketer = Viewer::new("Bob", "Marketing", "Employee");
    assert_eq!(titles(db.visible_posts(&engineer)), vec!["sprint notes"]);
    assert!(db.visible_posts(&marketer).is_empty());
}

#[test]
fn search_only_covers_visible_posts() {
    let (_dir, db) = open();
    publish(&db, "Launch plan", "All", false, &[]);
    publish(&db, "Launch budget", "Finance", false, &[]);
    publish(&db, "Launch secrets", "All", true, &["Meera"]);

    let meera = Viewer::new("Meera", "Marketing", "Manager");
    let mut found = titles(db.search_posts("launch", &meera));
    found.sort();
    assert_eq!(found, vec!["Launch plan", "Launch secrets"]);

    assert_eq!(db.search_posts("", &meera).len(), 2);
    assert_eq!(db.search_posts("UPDATE", &meera).len(), 2);
}

#[test]
fn vip_messages_ignore_department() {
    let (_dir, db) = open();
    publish(&db, "open", "All", false, &[]);
    publish(&db, "for meera", "Engineering", true, &["Meera"]);
    publish(&db, "for ravi", "HR", true, &["Ravi"]);

    assert_eq!(titles(db.vip_messages_for("Meera", "Manager")), vec!["for meera"]);
    assert_eq!(db.vip_messages_for("Dana", "Chairman").len(), 2);
}
