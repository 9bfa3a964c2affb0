/// API route handlers
///
/// Handlers are thin: they extract the caller and input, call the matching
/// `Board` operation and shape the JSON response.
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, refresh and the current user
/// - `users`: User listing
/// - `projects`: Project CRUD
/// - `tasks`: Task CRUD with filters
pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;
