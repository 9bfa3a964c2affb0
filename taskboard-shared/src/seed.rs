//! Demo data set
//!
//! Five users, three projects and twelve tasks, created through the regular
//! `Board` operations so the data obeys every validation and relationship
//! rule. Seeding is skipped when the store already has users.

use tracing::info;

use crate::auth::middleware::{AuthContext, Caller};
use crate::board::Board;
use crate::error::CoreResult;
use crate::models::{NewProject, NewTask, RegisterUser, Role};

const USERS: [(&str, Role); 5] = [
    ("admin", Role::Admin),
    ("ivan", Role::User),
    ("maria", Role::User),
    ("petr", Role::User),
    ("anna", Role::User),
];

/// (name, description, member logins)
const PROJECTS: [(&str, &str, &[&str]); 3] = [
    (
        "Corporate web portal",
        "Internal employee portal with HR, document workflow and communication modules",
        &["ivan", "maria", "petr"],
    ),
    (
        "Delivery mobile app",
        "iOS and Android app for ordering and tracking food delivery",
        &["maria", "anna"],
    ),
    (
        "Analytics platform",
        "Dashboards for business metrics and real-time reporting",
        &["ivan", "petr", "anna"],
    ),
];

/// (project index, title, description, owner login, status)
const TASKS: [(usize, &str, &str, &str, &str); 12] = [
    (0, "Design mockups", "Create mockups of every main portal page", "ivan", "done"),
    (0, "Backend API", "Implement the REST API for the HR and document modules", "maria", "in_progress"),
    (0, "Active Directory integration", "Set up SSO through the corporate directory", "petr", "todo"),
    (0, "Chat module", "Build an internal messenger with group chats", "maria", "todo"),
    (1, "Mobile UI/UX design", "Responsive design for iOS and Android", "anna", "done"),
    (1, "Maps and geolocation", "Track the courier on a live map", "maria", "in_progress"),
    (1, "Push notifications", "Notify customers about order status changes", "anna", "in_progress"),
    (1, "Payment integration", "Accept cards and e-wallets", "maria", "todo"),
    (2, "ETL pipelines", "Load data from the upstream sources", "petr", "done"),
    (2, "Dashboards", "Interactive charts and tables for the metrics", "ivan", "in_progress"),
    (2, "Query optimization", "Speed up the heavy analytical queries", "petr", "in_progress"),
    (2, "Report export", "Export reports to spreadsheet and PDF", "anna", "todo"),
];

/// Counts of seeded records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub projects: usize,
    pub tasks: usize,
    pub skipped: bool,
}

/// Seeds the demo data set, giving every user `password`
pub async fn seed_demo_data(board: &Board, password: &str) -> CoreResult<SeedReport> {
    if board.has_users().await? {
        info!("Store already has users, skipping seed");
        return Ok(SeedReport {
            skipped: true,
            ..Default::default()
        });
    }

    let mut admin = None;
    for (login, role) in USERS {
        let profile = board
            .register(RegisterUser {
                login: login.to_string(),
                password: password.to_string(),
                role: Some(role.as_str().to_string()),
            })
            .await?;
        if role.is_admin() && admin.is_none() {
            admin = Some(AuthContext {
                user_id: profile.id,
                login: profile.login,
                role,
            });
        }
    }
    let caller = admin.map(Caller::from).unwrap_or(Caller::Anonymous);

    let mut project_ids = Vec::with_capacity(PROJECTS.len());
    for (name, description, members) in PROJECTS {
        let project = board
            .create_project(
                &caller,
                NewProject {
                    name: name.to_string(),
                    description: Some(description.to_string()),
                    users: Some(members.iter().map(|m| m.to_string()).collect()),
                },
            )
            .await?;
        project_ids.push(project.id);
    }

    for (project, title, description, owner, status) in TASKS {
        board
            .create_task(
                &caller,
                NewTask {
                    title: title.to_string(),
                    description: Some(description.to_string()),
                    user: owner.to_string(),
                    status: Some(status.to_string()),
                    project_id: project_ids[project].to_string(),
                    attachments: None,
                },
            )
            .await?;
    }

    let report = SeedReport {
        users: USERS.len(),
        projects: PROJECTS.len(),
        tasks: TASKS.len(),
        skipped: false,
    };
    info!(
        users = report.users,
        projects = report.projects,
        tasks = report.tasks,
        "Demo data seeded"
    );
    Ok(report)
}
