use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::roles::ALL_DEPARTMENTS;

/// Shown in place of the author on anonymised posts.
pub const ANONYMOUS_DISPLAY_NAME: &str = "Anonymous Executive";

/// Records that carry a sequential id within their document.
pub trait Record {
    fn id(&self) -> Option<i64>;
}

// --- Posts ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub display_author: String,
    pub department: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub timestamp: String,
    #[serde(default)]
    pub privacy: String, // "company" or "department"
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub is_vip: bool,
    #[serde(default)]
    pub vip_recipients: Vec<String>,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub views: u32,
}

impl Post {
    /// Name to render for this post. Older documents may lack `display_author`.
    pub fn shown_author(&self) -> &str {
        if self.display_author.is_empty() {
            &self.author
        } else {
            &self.display_author
        }
    }
}

impl Record for Post {
    fn id(&self) -> Option<i64> {
        Some(self.id)
    }
}

/// Input for `Database::create_post`.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: String,
    pub department: String,
    pub tags: Vec<String>,
    pub is_anonymous: bool,
    pub is_vip: bool,
    pub vip_recipients: Vec<String>,
}

impl NewPost {
    /// Build the stored record. `display_author` is fixed here and never recomputed.
    pub fn into_post(self, id: i64, timestamp: String) -> Post {
        let display_author = if self.is_anonymous {
            ANONYMOUS_DISPLAY_NAME.to_string()
        } else {
            self.author.clone()
        };
        let privacy = if self.department == ALL_DEPARTMENTS {
            "company"
        } else {
            "department"
        };

        Post {
            id,
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            author: self.author,
            display_author,
            department: self.department,
            tags: self.tags,
            timestamp,
            privacy: privacy.to_string(),
            is_anonymous: self.is_anonymous,
            is_vip: self.is_vip,
            vip_recipients: self.vip_recipients,
            likes: 0,
            views: 0,
        }
    }
}

// --- Tasks ---

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
    Overdue,
    Other(String),
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => TaskStatus::Pending,
            "completed" => TaskStatus::Completed,
            "overdue" => TaskStatus::Overdue,
            _ => TaskStatus::Other(s),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => f.write_str("Pending"),
            TaskStatus::Completed => f.write_str("Completed"),
            TaskStatus::Overdue => f.write_str("Overdue"),
            TaskStatus::Other(s) => f.write_str(s),
        }
    }
}

/// Task priority. Unrecognised values read as `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Sort rank, most urgent first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

impl From<String> for Priority {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Priority::Low,
            "high" => Priority::High,
            _ => Priority::Medium,
        }
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        priority.to_string()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskComment {
    pub author: String,
    pub text: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub assigned_to: String,
    #[serde(default)]
    pub assigned_by: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub deadline: Option<String>, // YYYY-MM-DD
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub comments: Vec<TaskComment>,
    /// Fields this model does not know, kept so a rewrite does not drop them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Ordering key for a personal task list: earliest deadline, then priority.
    pub fn sort_key(&self) -> (&str, u8) {
        (
            self.deadline.as_deref().unwrap_or("9999-12-31"),
            self.priority.rank(),
        )
    }
}

impl Record for Task {
    fn id(&self) -> Option<i64> {
        Some(self.id)
    }
}

/// Input for `Database::create_task`.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub assigned_by: String,
    pub department: String,
    pub deadline: Option<String>,
    pub priority: Priority,
}

impl NewTask {
    pub fn into_task(self, id: i64, timestamp: String) -> Task {
        Task {
            id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            assigned_to: self.assigned_to,
            assigned_by: self.assigned_by,
            department: self.department,
            status: TaskStatus::Pending,
            priority: self.priority,
            deadline: self.deadline,
            created_at: timestamp.clone(),
            updated_at: timestamp,
            comments: Vec::new(),
            extra: Map::new(),
        }
    }
}

// --- Feedback ---

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeedbackStatus {
    #[default]
    Unread,
    Read,
    Other(String),
}

impl From<String> for FeedbackStatus {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "unread" => FeedbackStatus::Unread,
            "read" => FeedbackStatus::Read,
            _ => FeedbackStatus::Other(s),
        }
    }
}

impl From<FeedbackStatus> for String {
    fn from(status: FeedbackStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackStatus::Unread => f.write_str("unread"),
            FeedbackStatus::Read => f.write_str("read"),
            FeedbackStatus::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub id: i64,
    #[serde(alias = "message", alias = "text")]
    pub content: String,
    pub route_to: String,
    #[serde(default)]
    pub status: FeedbackStatus,
    pub timestamp: String,
    #[serde(default = "default_feedback_priority")]
    pub priority: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_feedback_priority() -> String {
    "normal".to_string()
}

impl Record for Feedback {
    fn id(&self) -> Option<i64> {
        Some(self.id)
    }
}

// --- Meetings ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(alias = "topic")]
    pub title: String,
    #[serde(alias = "host")]
    pub organizer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(alias = "time")]
    pub datetime: String,
    #[serde(default, alias = "description")]
    pub agenda: String,
    #[serde(default)]
    pub link: String,
    #[serde(default = "default_meeting_status")]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_meeting_status() -> String {
    "scheduled".to_string()
}

impl Meeting {
    pub fn involves(&self, name: &str) -> bool {
        self.organizer == name || self.participants.iter().any(|p| p == name)
    }
}

impl Record for Meeting {
    fn id(&self) -> Option<i64> {
        self.id
    }
}

/// Input for `Database::create_meeting`.
#[derive(Debug, Clone, Default)]
pub struct NewMeeting {
    pub title: String,
    pub organizer: String,
    pub participants: Vec<String>,
    pub datetime: String,
    pub agenda: String,
    pub link: String,
}

impl NewMeeting {
    pub fn into_meeting(self, id: i64, timestamp: String) -> Meeting {
        Meeting {
            id: Some(id),
            title: self.title.trim().to_string(),
            organizer: self.organizer,
            department: None,
            participants: self.participants,
            datetime: self.datetime,
            agenda: self.agenda.trim().to_string(),
            link: self.link,
            status: default_meeting_status(),
            created_at: timestamp,
            extra: Map::new(),
        }
    }
}

// --- Roster ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub department: String,
    pub role: String,
}

/// Identity of whoever is looking at the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub name: String,
    pub department: String,
    pub role: String,
}

impl Viewer {
    pub fn new(name: &str, department: &str, role: &str) -> Self {
        Self {
            name: name.to_string(),
            department: department.to_string(),
            role: role.to_string(),
        }
    }
}

impl From<&Employee> for Viewer {
    fn from(emp: &Employee) -> Self {
        Self::new(&emp.name, &emp.department, &emp.role)
    }
}

// --- Chat ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub sender: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub room: String,
    pub sender: String,
    pub message: String,
    pub timestamp: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub replies: Vec<ChatReply>,
}

/// Per-document id high-water mark, stored in `counters.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdCounter {
    pub document: String,
    pub last_id: i64,
}
