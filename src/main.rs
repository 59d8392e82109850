use anyhow::{Result, anyhow, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use portal::db::{DOCUMENTS, EMPLOYEES};
use portal::roles::{ALL_DEPARTMENTS, DEPARTMENTS, FEEDBACK_ROUTES, is_known_department};
use portal::util::{format_timestamp, meeting_link, sanitize_input, time_ago, truncate};
use portal::{
    Config, Database, FeedbackStatus, NewMeeting, NewPost, NewTask, Post, Priority, TaskStatus,
    Viewer,
};

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Corporate portal - department feeds, tasks, feedback and meetings")]
struct Cli {
    /// Directory holding the JSON documents
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Who is acting. Missing department/role are taken from the roster.
#[derive(Args)]
struct Identity {
    /// Roster name or employee ID
    #[arg(long = "as", value_name = "NAME")]
    name: String,

    /// Override the roster department
    #[arg(long)]
    department: Option<String>,

    /// Override the roster role
    #[arg(long)]
    role: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and empty documents
    Init,

    /// Publish a post
    Post {
        #[command(flatten)]
        who: Identity,

        title: String,

        content: String,

        /// Target department, "All" for company-wide (defaults to your department)
        #[arg(long = "to")]
        target: Option<String>,

        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Show the author as "Anonymous Executive"
        #[arg(long)]
        anonymous: bool,

        /// Restrict to elevated roles and the listed recipients
        #[arg(long)]
        vip: bool,

        /// Name allowed to read a VIP post (repeatable)
        #[arg(long = "recipient")]
        recipients: Vec<String>,
    },

    /// Show the posts you are allowed to see
    Feed {
        #[command(flatten)]
        who: Identity,

        /// Only posts matching this text
        #[arg(short, long)]
        search: Option<String>,

        /// Only VIP posts
        #[arg(long)]
        vip_only: bool,

        /// Number of posts to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Anonymous feedback
    Feedback {
        #[command(subcommand)]
        command: FeedbackCommands,
    },

    /// Schedule and list meetings
    Meeting {
        #[command(subcommand)]
        command: MeetingCommands,
    },

    /// Team chat rooms
    Chat {
        #[command(subcommand)]
        command: ChatCommands,
    },

    /// List the employee roster
    Employees,

    /// Dashboard counters
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Assign a task
    Add {
        #[command(flatten)]
        who: Identity,

        title: String,

        /// Employee the task is assigned to
        #[arg(long)]
        assignee: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,

        /// Low, Medium or High
        #[arg(short, long, default_value = "Medium")]
        priority: String,
    },

    /// List tasks
    List {
        /// Only tasks assigned to this person
        #[arg(long = "for")]
        name: Option<String>,
    },

    /// Set a task's status (Pending, Completed, Overdue, ...).
    /// Tasks saved without an id show as #0 and cannot be updated here.
    Status { id: i64, status: String },
}

#[derive(Subcommand)]
enum FeedbackCommands {
    /// Send feedback without a name attached
    Send {
        message: String,

        /// Department Head, Specific Person, C-Suite or Admin
        #[arg(short, long, default_value = "Admin")]
        route: String,
    },

    /// List received feedback
    List {
        #[arg(short, long)]
        route: Option<String>,
    },

    /// Set a feedback item's status
    Mark {
        id: i64,

        #[arg(default_value = "read")]
        status: String,
    },
}

#[derive(Subcommand)]
enum MeetingCommands {
    /// Schedule a meeting
    Add {
        #[command(flatten)]
        who: Identity,

        title: String,

        /// Date and time, e.g. "2025-01-10 09:30"
        #[arg(long)]
        when: String,

        /// Participant (repeatable)
        #[arg(long = "with")]
        participants: Vec<String>,

        #[arg(long, default_value = "")]
        agenda: String,

        /// Video link (defaults to your personal room)
        #[arg(long)]
        link: Option<String>,
    },

    /// List meetings
    List {
        /// Only meetings this person organises or attends
        #[arg(long = "for")]
        name: Option<String>,
    },

    /// Print your personal video room link
    Link {
        #[command(flatten)]
        who: Identity,
    },
}

#[derive(Subcommand)]
enum ChatCommands {
    /// Post a message to a room
    Send {
        #[command(flatten)]
        who: Identity,

        message: String,

        #[arg(long, default_value = "General")]
        room: String,

        /// Path or URL of an attachment
        #[arg(long)]
        file: Option<String>,
    },

    /// Reply to a message by its number
    Reply {
        #[command(flatten)]
        who: Identity,

        index: usize,

        message: String,
    },

    /// Show a room
    List {
        #[arg(long, default_value = "General")]
        room: String,
    },
}

fn resolve_viewer(db: &Database, who: &Identity) -> Result<Viewer> {
    if let Some(emp) = db.find_employee(&who.name) {
        return Ok(Viewer {
            name: emp.name,
            department: who.department.clone().unwrap_or(emp.department),
            role: who.role.clone().unwrap_or(emp.role),
        });
    }

    match (&who.department, &who.role) {
        (Some(department), Some(role)) => Ok(Viewer::new(&who.name, department, role)),
        _ => {
            let hint = db
                .suggest_employee(&who.name)
                .map(|name| format!(" Did you mean '{}'?", name))
                .unwrap_or_default();
            Err(anyhow!(
                "'{}' is not in the roster; pass --department and --role.{}",
                who.name,
                hint
            ))
        }
    }
}

fn print_post(post: &Post) {
    let marker = if post.is_vip { " [VIP]" } else { "" };
    println!("#{} [{}]{} {}", post.id, post.department, marker, post.title);
    println!(
        "  by {} - {} ({})",
        post.shown_author(),
        format_timestamp(&post.timestamp),
        time_ago(&post.timestamp)
    );
    if !post.tags.is_empty() {
        println!("  tags: {}", post.tags.join(", "));
    }
    for line in textwrap::fill(&post.content, 76).lines() {
        println!("  {}", line);
    }
    println!();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("portal={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::resolve(cli.data_dir);
    let db = Database::open(&config)?;

    match cli.command {
        Commands::Init => {
            db.init()?;
            println!("Data directory initialized at {}", db.path().display());
            println!("Documents: {}", DOCUMENTS.join(", "));
        }

        Commands::Post {
            who,
            title,
            content,
            target,
            tags,
            anonymous,
            vip,
            recipients,
        } => {
            let viewer = resolve_viewer(&db, &who)?;
            let department = target.unwrap_or_else(|| viewer.department.clone());
            if !is_known_department(&department) {
                bail!(
                    "Unknown department '{}'. Use one of: {}, {}",
                    department,
                    ALL_DEPARTMENTS,
                    DEPARTMENTS.join(", ")
                );
            }
            let title = sanitize_input(&title);
            if title.is_empty() {
                bail!("Post title cannot be empty");
            }

            let post = db.create_post(NewPost {
                title,
                content: sanitize_input(&content),
                author: viewer.name,
                department,
                tags,
                is_anonymous: anonymous,
                is_vip: vip,
                vip_recipients: recipients,
            })?;
            println!("Published post #{} to {}", post.id, post.department);
        }

        Commands::Feed {
            who,
            search,
            vip_only,
            limit,
        } => {
            let viewer = resolve_viewer(&db, &who)?;
            let posts: Vec<Post> = match search.as_deref() {
                Some(query) => db.search_posts(query, &viewer),
                None => db.visible_posts(&viewer),
            }
            .into_iter()
            .filter(|p| !vip_only || p.is_vip)
            .take(limit)
            .collect();

            if posts.is_empty() {
                println!("No posts found.");
            } else {
                for post in &posts {
                    print_post(post);
                }
            }
        }

        Commands::Task { command } => match command {
            TaskCommands::Add {
                who,
                title,
                assignee,
                description,
                deadline,
                priority,
            } => {
                let assigner = resolve_viewer(&db, &who)?;
                if let Some(d) = &deadline {
                    NaiveDate::parse_from_str(d, "%Y-%m-%d")
                        .map_err(|_| anyhow!("Deadline must be YYYY-MM-DD, got '{}'", d))?;
                }
                let (assigned_to, department) = match db.find_employee(&assignee) {
                    Some(emp) => (emp.name, emp.department),
                    None => (assignee, assigner.department.clone()),
                };

                let task = db.create_task(NewTask {
                    title: sanitize_input(&title),
                    description: sanitize_input(&description),
                    assigned_to,
                    assigned_by: assigner.name,
                    department,
                    deadline,
                    priority: Priority::from(priority),
                })?;
                println!("Assigned task #{} to {}", task.id, task.assigned_to);
            }

            TaskCommands::List { name } => {
                let tasks = match name.as_deref() {
                    Some(n) => db.tasks_for(n),
                    None => db.list_tasks(),
                };
                if tasks.is_empty() {
                    println!("No tasks found.");
                } else {
                    println!(
                        "{:<6} {:<10} {:<8} {:<12} {:<28} {:<16}",
                        "ID", "STATUS", "PRIORITY", "DEADLINE", "TITLE", "ASSIGNED TO"
                    );
                    println!("{}", "-".repeat(84));
                    for task in tasks {
                        println!(
                            "{:<6} {:<10} {:<8} {:<12} {:<28} {:<16}",
                            task.id,
                            truncate(&task.status.to_string(), 10),
                            task.priority,
                            task.deadline.as_deref().unwrap_or("-"),
                            truncate(&task.title, 28),
                            truncate(&task.assigned_to, 16)
                        );
                    }
                }
            }

            TaskCommands::Status { id, status } => {
                let status = TaskStatus::from(status);
                if db.update_task_status(id, status.clone())? {
                    println!("Task #{} is now {}", id, status);
                } else {
                    println!("Task #{} not found.", id);
                }
            }
        },

        Commands::Feedback { command } => match command {
            FeedbackCommands::Send { message, route } => {
                let message = sanitize_input(&message);
                if message.is_empty() {
                    bail!("Feedback cannot be empty");
                }
                if !FEEDBACK_ROUTES.contains(&route.as_str()) && !is_known_department(&route) {
                    bail!(
                        "Unknown route '{}'. Use a department or one of: {}",
                        route,
                        FEEDBACK_ROUTES.join(", ")
                    );
                }
                db.create_feedback(&message, &route)?;
                println!("Feedback sent anonymously to {}.", route);
            }

            FeedbackCommands::List { route } => {
                let feedback = match route.as_deref() {
                    Some(r) => db.feedback_routed_to(r),
                    None => db.list_feedback(),
                };
                if feedback.is_empty() {
                    println!("No feedback found.");
                }
                for fb in feedback {
                    println!(
                        "#{} to {} [{}] - {}",
                        fb.id,
                        fb.route_to,
                        fb.status,
                        format_timestamp(&fb.timestamp)
                    );
                    for line in textwrap::fill(&fb.content, 76).lines() {
                        println!("  {}", line);
                    }
                }
            }

            FeedbackCommands::Mark { id, status } => {
                let status = FeedbackStatus::from(status);
                if db.update_feedback_status(id, status.clone())? {
                    println!("Feedback #{} marked {}", id, status);
                } else {
                    println!("Feedback #{} not found.", id);
                }
            }
        },

        Commands::Meeting { command } => match command {
            MeetingCommands::Add {
                who,
                title,
                when,
                participants,
                agenda,
                link,
            } => {
                let organizer = resolve_viewer(&db, &who)?;
                let link =
                    link.unwrap_or_else(|| meeting_link(&organizer.department, &organizer.name));
                let meeting = db.create_meeting(NewMeeting {
                    title: sanitize_input(&title),
                    organizer: organizer.name,
                    participants,
                    datetime: when,
                    agenda: sanitize_input(&agenda),
                    link,
                })?;
                println!("Scheduled '{}' at {}", meeting.title, meeting.datetime);
                println!("Join: {}", meeting.link);
            }

            MeetingCommands::List { name } => {
                let meetings = match name.as_deref() {
                    Some(n) => db.meetings_for(n),
                    None => db.list_meetings(),
                };
                if meetings.is_empty() {
                    println!("No meetings found.");
                }
                for m in meetings {
                    println!("{} - hosted by {}", m.title, m.organizer);
                    println!("  When: {}", m.datetime);
                    if !m.participants.is_empty() {
                        println!("  With: {}", m.participants.join(", "));
                    }
                    if !m.agenda.is_empty() {
                        println!("  Agenda: {}", m.agenda);
                    }
                    if !m.link.is_empty() {
                        println!("  Join: {}", m.link);
                    }
                }
            }

            MeetingCommands::Link { who } => {
                let viewer = resolve_viewer(&db, &who)?;
                println!("{}", meeting_link(&viewer.department, &viewer.name));
            }
        },

        Commands::Chat { command } => match command {
            ChatCommands::Send {
                who,
                message,
                room,
                file,
            } => {
                let sender = resolve_viewer(&db, &who)?;
                let message = sanitize_input(&message);
                if message.is_empty() {
                    bail!("Message cannot be empty");
                }
                db.post_message(&room, &sender.name, &message, file)?;
                println!("Message sent to {}.", room);
            }

            ChatCommands::Reply {
                who,
                index,
                message,
            } => {
                let sender = resolve_viewer(&db, &who)?;
                if db.reply_to(index, &sender.name, &sanitize_input(&message))? {
                    println!("Replied to message {}.", index);
                } else {
                    println!("Message {} not found.", index);
                }
            }

            ChatCommands::List { room } => {
                let messages = db.messages_in(&room);
                if messages.is_empty() {
                    println!("No messages in {}.", room);
                }
                for (index, msg) in messages {
                    println!("[{}] {} ({}): {}", index, msg.sender, msg.timestamp, msg.message);
                    if let Some(file) = &msg.file {
                        println!("    attachment: {}", file);
                    }
                    for reply in &msg.replies {
                        println!("    -> {} ({}): {}", reply.sender, reply.timestamp, reply.message);
                    }
                }
            }
        },

        Commands::Employees => {
            let employees = db.employees();
            if employees.is_empty() {
                println!(
                    "No employees found. Add them to {}.",
                    db.document_path(EMPLOYEES).display()
                );
            } else {
                println!("{:<8} {:<20} {:<14} {:<20}", "ID", "NAME", "DEPARTMENT", "ROLE");
                println!("{}", "-".repeat(62));
                for emp in employees {
                    println!(
                        "{:<8} {:<20} {:<14} {:<20}",
                        emp.id,
                        truncate(&emp.name, 20),
                        emp.department,
                        emp.role
                    );
                }
            }
        }

        Commands::Stats { json } => {
            let stats = db.analytics();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Posts:     {}", stats.total_posts);
                println!("Tasks:     {} ({:.1}% completed)", stats.total_tasks, stats.completion_rate);
                println!("Feedback:  {} ({} unread)", stats.total_feedback, stats.unread_feedback);
                println!("Meetings:  {}", stats.total_meetings);
                println!("Assignees: {}", stats.active_assignees);
                for (title, counts) in [
                    ("Posts by department", &stats.posts_by_department),
                    ("Tasks by status", &stats.tasks_by_status),
                    ("Feedback by route", &stats.feedback_by_route),
                ] {
                    if !counts.is_empty() {
                        println!("\n{}:", title);
                        for (key, count) in counts {
                            println!("  {:<20} {}", key, count);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
