use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Feedback, FeedbackStatus, Meeting, Post, Task, TaskStatus};

/// Dashboard counters across every document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analytics {
    pub total_posts: usize,
    pub total_tasks: usize,
    pub total_feedback: usize,
    pub total_meetings: usize,
    pub posts_by_department: BTreeMap<String, usize>,
    pub tasks_by_status: BTreeMap<String, usize>,
    pub feedback_by_route: BTreeMap<String, usize>,
    pub unread_feedback: usize,
    /// Percent of tasks marked Completed; 0 with no tasks.
    pub completion_rate: f64,
    pub active_assignees: usize,
}

impl Analytics {
    pub fn compute(
        posts: &[Post],
        tasks: &[Task],
        feedback: &[Feedback],
        meetings: &[Meeting],
    ) -> Self {
        let mut posts_by_department = BTreeMap::new();
        for post in posts {
            *posts_by_department.entry(post.department.clone()).or_insert(0) += 1;
        }

        let mut tasks_by_status = BTreeMap::new();
        for task in tasks {
            *tasks_by_status.entry(task.status.to_string()).or_insert(0) += 1;
        }

        let mut feedback_by_route = BTreeMap::new();
        for fb in feedback {
            *feedback_by_route.entry(fb.route_to.clone()).or_insert(0) += 1;
        }

        let completed = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count();
        let completion_rate = if tasks.is_empty() {
            0.0
        } else {
            completed as f64 / tasks.len() as f64 * 100.0
        };

        let active_assignees = tasks
            .iter()
            .filter(|t| !t.assigned_to.is_empty())
            .map(|t| t.assigned_to.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        Self {
            total_posts: posts.len(),
            total_tasks: tasks.len(),
            total_feedback: feedback.len(),
            total_meetings: meetings.len(),
            posts_by_department,
            tasks_by_status,
            feedback_by_route,
            unread_feedback: feedback
                .iter()
                .filter(|f| f.status == FeedbackStatus::Unread)
                .count(),
            completion_rate,
            active_assignees,
        }
    }
}
