use crate::models::{Post, Viewer};
use crate::roles::{ALL_DEPARTMENTS, is_elevated_role};

/// Whether `viewer` may see `post`.
///
/// The VIP gate is checked first and is final: a VIP post tagged "All" is
/// still limited to elevated roles, named recipients and its author.
pub fn is_visible_to(post: &Post, viewer: &Viewer) -> bool {
    if post.is_vip {
        return is_elevated_role(&viewer.role)
            || post.vip_recipients.iter().any(|r| r == &viewer.name)
            || post.author == viewer.name;
    }

    post.department == ALL_DEPARTMENTS || post.department == viewer.department
}

/// Keep the posts `viewer` may see, newest first.
pub fn filter_visible(posts: Vec<Post>, viewer: &Viewer) -> Vec<Post> {
    let mut visible: Vec<Post> = posts
        .into_iter()
        .filter(|post| is_visible_to(post, viewer))
        .collect();
    // Stable, so equal timestamps keep document order.
    visible.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    visible
}

/// Case-insensitive match against title, content and tags.
pub fn matches_query(post: &Post, query: &str) -> bool {
    let query = query.to_lowercase();
    post.title.to_lowercase().contains(&query)
        || post.content.to_lowercase().contains(&query)
        || post.tags.iter().any(|tag| tag.to_lowercase().contains(&query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPost;

    fn post(id: i64, department: &str, ts: &str) -> Post {
        NewPost {
            title: format!("post {id}"),
            content: "body".to_string(),
            author: "Alice".to_string(),
            department: department.to_string(),
            ..Default::default()
        }
        .into_post(id, ts.to_string())
    }

    fn vip(department: &str, recipients: &[&str]) -> Post {
        let mut p = post(1, department, "2025-01-01T00:00:00");
        p.is_vip = true;
        p.vip_recipients = recipients.iter().map(|s| s.to_string()).collect();
        p
    }

    #[test]
    fn vip_post_gate() {
        let p = vip("C-Suite", &["CEO"]);
        assert!(is_visible_to(&p, &Viewer::new("Zed", "Finance", "CEO")));
        assert!(is_visible_to(&p, &Viewer::new("Alice", "Finance", "Employee")));
        assert!(!is_visible_to(&p, &Viewer::new("Bob", "Finance", "Employee")));
    }

    #[test]
    fn vip_recipient_by_name() {
        let p = vip("Engineering", &["Meera"]);
        assert!(is_visible_to(&p, &Viewer::new("Meera", "Marketing", "Manager")));
        // Department match alone does not open a VIP post.
        assert!(!is_visible_to(&p, &Viewer::new("Bob", "Engineering", "Employee")));
    }

    #[test]
    fn vip_gate_overrides_company_wide() {
        let p = vip("All", &[]);
        assert!(!is_visible_to(&p, &Viewer::new("Bob", "Engineering", "Employee")));
        assert!(is_visible_to(&p, &Viewer::new("Bob", "Engineering", "Group President")));
    }

    #[test]
    fn department_scoping() {
        let p = post(1, "Engineering", "2025-01-01T00:00:00");
        assert!(is_visible_to(&p, &Viewer::new("Bob", "Engineering", "Employee")));
        assert!(!is_visible_to(&p, &Viewer::new("Bob", "Marketing", "Employee")));

        let all = post(2, "All", "2025-01-01T00:00:00");
        assert!(is_visible_to(&all, &Viewer::new("Bob", "Marketing", "Employee")));
    }

    #[test]
    fn elevated_role_does_not_widen_department_posts() {
        let p = post(1, "HR", "2025-01-01T00:00:00");
        assert!(!is_visible_to(&p, &Viewer::new("Boss", "Engineering", "CEO")));
    }

    #[test]
    fn filter_orders_newest_first() {
        let posts = vec![
            post(1, "All", "2025-01-01T08:00:00"),
            post(2, "All", "2025-03-01T08:00:00"),
            post(3, "HR", "2025-04-01T08:00:00"),
            post(4, "All", "2025-02-01T08:00:00"),
        ];
        let viewer = Viewer::new("Bob", "Ops", "Employee");
        let ids: Vec<i64> = filter_visible(posts, &viewer).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 4, 1]);
    }

    #[test]
    fn query_matches_tags_case_insensitively() {
        let mut p = post(1, "All", "2025-01-01T00:00:00");
        p.tags = vec!["Launch".to_string()];
        assert!(matches_query(&p, "launch"));
        assert!(matches_query(&p, "POST 1"));
        assert!(!matches_query(&p, "budget"));
    }
}
