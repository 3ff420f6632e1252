/// Router Module Index
///
/// Organizes the application's routing into the three groups the application
/// is made of. Access control is not a property of the group: protected
/// handlers take the `AuthUser` extractor, so the guard travels with the
/// handler rather than the mount point.

/// Content routes accessible to everyone: listing, static pages, health.
pub mod public;

/// Post management: creation form, creation, single view, deletion.
pub mod posts;

/// Account routes: registration, login, logout.
pub mod users;
