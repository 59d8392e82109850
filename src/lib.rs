//! Data layer for the corporate portal.
//!
//! Posts, tasks, anonymous feedback, meetings and chat live in flat JSON
//! documents under one data directory. Reads go through [`Database::load`],
//! writes through the record factories, and post feeds are filtered by
//! [`visibility::is_visible_to`].

pub mod analytics;
pub mod config;
pub mod db;
pub mod models;
pub mod roles;
pub mod util;
pub mod visibility;

pub use analytics::Analytics;
pub use config::Config;
pub use db::{Database, StoreError};
pub use models::{
    ChatMessage, Employee, Feedback, FeedbackStatus, Meeting, NewMeeting, NewPost, NewTask, Post,
    Priority, Task, TaskStatus, Viewer,
};
pub use roles::is_elevated_role;
