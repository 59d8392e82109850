use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::analytics::Analytics;
use crate::config::Config;
use crate::models::{
    ChatMessage, ChatReply, Employee, Feedback, FeedbackStatus, IdCounter, Meeting, NewMeeting,
    NewPost, NewTask, Post, Record, Task, TaskStatus, Viewer,
};
use crate::util::{chat_timestamp, now_timestamp};
use crate::visibility::{filter_visible, matches_query};

pub const POSTS: &str = "posts.json";
pub const TASKS: &str = "tasks.json";
pub const FEEDBACK: &str = "feedback.json";
pub const MEETINGS: &str = "scheduled_meetings.json";
pub const EMPLOYEES: &str = "employees.json";
pub const CHAT: &str = "chat.json";
pub const COUNTERS: &str = "counters.json";

/// Documents created by `Database::init`.
pub const DOCUMENTS: [&str; 7] = [POSTS, TASKS, FEEDBACK, MEETINGS, EMPLOYEES, CHAT, COUNTERS];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Flat-file store: one pretty-printed JSON array per record type.
///
/// Every mutation is a full load-modify-save of one document. There is no
/// locking, so two processes writing the same document race and the last
/// write wins.
pub struct Database {
    data_dir: PathBuf,
}

impl Database {
    pub fn open(config: &Config) -> Result<Self> {
        let data_dir = config.data_dir.clone();
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).with_context(|| {
                format!("Failed to create data directory {}", data_dir.display())
            })?;
            info!(path = %data_dir.display(), "created data directory");
        }
        Ok(Self { data_dir })
    }

    pub fn path(&self) -> &Path {
        &self.data_dir
    }

    pub fn document_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Create any missing document as an empty array.
    pub fn init(&self) -> Result<()> {
        for name in DOCUMENTS {
            let path = self.document_path(name);
            if !path.exists() {
                write_document(&path, &Vec::<serde_json::Value>::new())
                    .with_context(|| format!("Failed to create {}", name))?;
                info!(document = name, "created empty document");
            }
        }
        Ok(())
    }

    // --- Storage accessor ---

    /// Read every record in `name`.
    ///
    /// A missing document is created empty. A document that cannot be read as
    /// a list of `T` is renamed to `<name>.backup_<timestamp>` and treated as
    /// empty.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Vec<T> {
        let path = self.document_path(name);

        if !path.exists() {
            info!(document = name, "document not found, creating empty document");
            if let Err(e) = write_document(&path, &Vec::<serde_json::Value>::new()) {
                error!(document = name, error = %e, "failed to create document");
            }
            return Vec::new();
        }

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(document = name, error = %e, "failed to read document");
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<T>>(&bytes) {
            Ok(records) => {
                debug!(document = name, count = records.len(), "loaded records");
                records
            }
            Err(e) => {
                error!(document = name, error = %e, "document is malformed");
                self.quarantine(&path);
                Vec::new()
            }
        }
    }

    /// Replace `name` with `records`. Returns false (and logs) on failure, in
    /// which case the previous document is left as it was.
    pub fn save<T: Serialize>(&self, name: &str, records: &[T]) -> bool {
        match self.try_save(name, records) {
            Ok(()) => true,
            Err(e) => {
                error!(document = name, error = %e, "failed to save document");
                false
            }
        }
    }

    pub fn try_save<T: Serialize>(&self, name: &str, records: &[T]) -> Result<(), StoreError> {
        let path = self.document_path(name);

        if path.exists() {
            let backup = sibling(&path, ".bak");
            if let Err(e) = fs::copy(&path, &backup) {
                warn!(document = name, error = %e, "could not refresh .bak copy");
            }
        }

        write_document(&path, records)?;
        info!(document = name, count = records.len(), "saved records");
        Ok(())
    }

    fn quarantine(&self, path: &Path) {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let backup = sibling(path, &format!(".backup_{}", stamp));
        match fs::rename(path, &backup) {
            Ok(()) => info!(backup = %backup.display(), "corrupted document backed up"),
            Err(e) => warn!(error = %e, "could not back up corrupted document"),
        }
    }

    // --- Id allocation ---

    /// Next id for `name`: above the persisted counter, every id present, and
    /// the record count.
    fn next_id<T: Record>(&self, name: &str, records: &[T]) -> i64 {
        let counters: Vec<IdCounter> = self.load(COUNTERS);
        let last = counters
            .iter()
            .find(|c| c.document == name)
            .map(|c| c.last_id)
            .unwrap_or(0);
        let highest = records.iter().filter_map(Record::id).max().unwrap_or(0);

        last.max(highest).max(records.len() as i64) + 1
    }

    fn record_id(&self, name: &str, id: i64) {
        let mut counters: Vec<IdCounter> = self.load(COUNTERS);
        match counters.iter_mut().find(|c| c.document == name) {
            Some(counter) => counter.last_id = counter.last_id.max(id),
            None => counters.push(IdCounter {
                document: name.to_string(),
                last_id: id,
            }),
        }
        // The document itself still carries the id, so a lost counter only
        // costs the gap protection.
        self.save(COUNTERS, &counters);
    }

    /// Reload `name`, append the record `build` makes from a fresh id, persist.
    fn append<T, F>(&self, name: &str, build: F) -> Result<T>
    where
        T: Record + Serialize + DeserializeOwned + Clone,
        F: FnOnce(i64, String) -> T,
    {
        let mut records: Vec<T> = self.load(name);
        let id = self.next_id(name, &records);
        let record = build(id, now_timestamp());
        records.push(record.clone());

        self.try_save(name, &records)
            .with_context(|| format!("Failed to save {}", name))?;
        self.record_id(name, id);
        Ok(record)
    }

    // --- Post operations ---

    pub fn create_post(&self, draft: NewPost) -> Result<Post> {
        let post = self.append(POSTS, |id, ts| draft.into_post(id, ts))?;
        info!(id = post.id, author = %post.author, department = %post.department, "added post");
        Ok(post)
    }

    pub fn visible_posts(&self, viewer: &Viewer) -> Vec<Post> {
        filter_visible(self.load(POSTS), viewer)
    }

    /// Visible posts matching `query`; an empty query returns them all.
    pub fn search_posts(&self, query: &str, viewer: &Viewer) -> Vec<Post> {
        let visible = self.visible_posts(viewer);
        if query.trim().is_empty() {
            return visible;
        }
        visible
            .into_iter()
            .filter(|post| matches_query(post, query.trim()))
            .collect()
    }

    /// VIP posts `name` may open, independent of any department.
    pub fn vip_messages_for(&self, name: &str, role: &str) -> Vec<Post> {
        let viewer = Viewer::new(name, "", role);
        self.visible_posts(&viewer)
            .into_iter()
            .filter(|post| post.is_vip)
            .collect()
    }

    // --- Task operations ---

    pub fn create_task(&self, draft: NewTask) -> Result<Task> {
        let task = self.append(TASKS, |id, ts| draft.into_task(id, ts))?;
        info!(id = task.id, assigned_to = %task.assigned_to, "added task");
        Ok(task)
    }

    pub fn list_tasks(&self) -> Vec<Task> {
        self.load(TASKS)
    }

    /// Tasks assigned to `name`, earliest deadline then highest priority first.
    pub fn tasks_for(&self, name: &str) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .list_tasks()
            .into_iter()
            .filter(|t| t.assigned_to == name)
            .collect();
        tasks.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        tasks
    }

    /// Returns `Ok(false)` when no task has `id`.
    /// Set the status of task `id`. Tasks stored without an id all read as 0
    /// and cannot be told apart, so id 0 never matches.
    pub fn update_task_status(&self, id: i64, status: TaskStatus) -> Result<bool> {
        if id <= 0 {
            warn!(id, "refusing to update task without a usable id");
            return Ok(false);
        }
        let mut tasks = self.list_tasks();
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        task.status = status.clone();
        task.updated_at = now_timestamp();

        self.try_save(TASKS, &tasks)
            .with_context(|| format!("Failed to update task #{}", id))?;
        info!(id, status = %status, "updated task status");
        Ok(true)
    }

    // --- Feedback operations ---

    pub fn create_feedback(&self, content: &str, route_to: &str) -> Result<Feedback> {
        let feedback = self.append(FEEDBACK, |id, ts| Feedback {
            id,
            content: content.trim().to_string(),
            route_to: route_to.to_string(),
            status: FeedbackStatus::Unread,
            timestamp: ts,
            priority: "normal".to_string(),
            extra: Default::default(),
        })?;
        info!(route_to, "added anonymous feedback");
        Ok(feedback)
    }

    pub fn list_feedback(&self) -> Vec<Feedback> {
        self.load(FEEDBACK)
    }

    pub fn feedback_routed_to(&self, route: &str) -> Vec<Feedback> {
        self.list_feedback()
            .into_iter()
            .filter(|fb| fb.route_to == route)
            .collect()
    }

    /// Returns `Ok(false)` when no feedback has `id`.
    pub fn update_feedback_status(&self, id: i64, status: FeedbackStatus) -> Result<bool> {
        let mut feedback = self.list_feedback();
        let Some(fb) = feedback.iter_mut().find(|f| f.id == id) else {
            return Ok(false);
        };
        fb.status = status.clone();

        self.try_save(FEEDBACK, &feedback)
            .with_context(|| format!("Failed to update feedback #{}", id))?;
        info!(id, status = %status, "updated feedback status");
        Ok(true)
    }

    // --- Meeting operations ---

    pub fn create_meeting(&self, draft: NewMeeting) -> Result<Meeting> {
        let meeting = self.append(MEETINGS, |id, ts| draft.into_meeting(id, ts))?;
        info!(title = %meeting.title, organizer = %meeting.organizer, "added meeting");
        Ok(meeting)
    }

    pub fn list_meetings(&self) -> Vec<Meeting> {
        self.load(MEETINGS)
    }

    /// Meetings `name` organises or attends, in schedule order.
    pub fn meetings_for(&self, name: &str) -> Vec<Meeting> {
        let mut meetings: Vec<Meeting> = self
            .list_meetings()
            .into_iter()
            .filter(|m| m.involves(name))
            .collect();
        meetings.sort_by(|a, b| a.datetime.cmp(&b.datetime));
        meetings
    }

    // --- Roster ---

    pub fn employees(&self) -> Vec<Employee> {
        self.load(EMPLOYEES)
    }

    /// Case-insensitive lookup by name or employee id.
    pub fn find_employee(&self, key: &str) -> Option<Employee> {
        let key = key.trim();
        self.employees()
            .into_iter()
            .find(|e| e.name.eq_ignore_ascii_case(key) || e.id.eq_ignore_ascii_case(key))
    }

    /// Closest roster name to `key`, if any is reasonably close.
    pub fn suggest_employee(&self, key: &str) -> Option<String> {
        let key = key.to_lowercase();
        self.employees()
            .into_iter()
            .map(|e| {
                let score = strsim::jaro_winkler(&key, &e.name.to_lowercase());
                (e.name, score)
            })
            .filter(|(_, score)| *score >= 0.8)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(name, _)| name)
    }

    // --- Chat ---

    pub fn post_message(
        &self,
        room: &str,
        sender: &str,
        message: &str,
        file: Option<String>,
    ) -> Result<ChatMessage> {
        let mut chat: Vec<ChatMessage> = self.load(CHAT);
        let msg = ChatMessage {
            room: room.to_string(),
            sender: sender.to_string(),
            message: message.trim().to_string(),
            timestamp: chat_timestamp(),
            file,
            replies: Vec::new(),
        };
        chat.push(msg.clone());

        self.try_save(CHAT, &chat).context("Failed to save chat")?;
        debug!(room, sender, "posted chat message");
        Ok(msg)
    }

    /// Reply to the message at `index` in the chat document. Returns
    /// `Ok(false)` without writing when the index is out of range.
    pub fn reply_to(&self, index: usize, sender: &str, reply: &str) -> Result<bool> {
        let mut chat: Vec<ChatMessage> = self.load(CHAT);
        let Some(parent) = chat.get_mut(index) else {
            return Ok(false);
        };
        parent.replies.push(ChatReply {
            sender: sender.to_string(),
            message: reply.trim().to_string(),
            timestamp: chat_timestamp(),
        });

        self.try_save(CHAT, &chat).context("Failed to save chat")?;
        Ok(true)
    }

    /// Messages in `room` with their document index, for replying.
    pub fn messages_in(&self, room: &str) -> Vec<(usize, ChatMessage)> {
        self.load::<ChatMessage>(CHAT)
            .into_iter()
            .enumerate()
            .filter(|(_, m)| m.room == room)
            .collect()
    }

    // --- Dashboard ---

    pub fn analytics(&self) -> Analytics {
        let posts: Vec<Post> = self.load(POSTS);
        let tasks = self.list_tasks();
        let feedback = self.list_feedback();
        let meetings = self.list_meetings();
        Analytics::compute(&posts, &tasks, &feedback, &meetings)
    }
}

/// `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Pretty-print `value` to a temp file beside `path`, then rename it over
/// `path`.
fn write_document<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let tmp_path = sibling(path, ".tmp");
    let result = write_pretty(&tmp_path, value)
        .and_then(|()| {
            fs::rename(&tmp_path, path).map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        });
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value.serialize(&mut ser).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    writer.get_ref().sync_all().map_err(io_err)?;
    Ok(())
}
