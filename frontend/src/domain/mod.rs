//! Domain primitives and services.
//!
//! Purpose: model the signed-in user, the role permission matrix, and the
//! decisions built on them (route protection and menu filtering). Nothing in
//! here performs I/O directly; storage and HTTP sit behind the traits in
//! [`ports`].
//!
//! Public surface:
//! - `Session`, `AuthToken`: persisted identity record.
//! - `Role`, `RoleClaim`, `RoleSet`: roles and role predicates.
//! - `Capability`, `capabilities_for`: the permission matrix.
//! - `Access`, `Requirement`: requirements shared by routes and menus.
//! - `RouteTable`, `RouteGuard`, `GuardOutcome`: route protection.
//! - `NavigationProvider` and the static menus.
//! - `complete_login`, `logout` and friends: session lifecycle.

pub mod access;
pub mod auth;
pub mod error;
pub mod location;
pub mod navigation;
pub mod permissions;
pub mod ports;
pub mod role;
pub mod route_guard;
pub mod routes;
pub mod session;
pub mod session_flows;
pub mod stored_session;

pub use self::access::{Access, AccessDecision, Requirement};
pub use self::auth::{
    AuthResponse, LoginCredentials, LoginValidationError, MIN_NEW_PASSWORD_LEN, PasswordChange,
    Registration,
};
pub use self::error::{Error, ErrorCode};
pub use self::location::{
    FROM_PARAM, HOME_PATH, LOGIN_PATH, Location, LocationError, UNAUTHORIZED_PATH,
};
pub use self::navigation::{
    MACHINE_ACTIONS, MenuEntry, MenuKind, NavigationProvider, REPORT_ACTIONS, SETTINGS_TABS,
    SIDEBAR, visible_entries, visible_for_role,
};
pub use self::permissions::{
    Capability, CapabilitySet, capabilities_for, has_any_role, has_role, role_satisfies,
};
pub use self::role::{Role, RoleClaim, RoleSet, UnknownRole};
pub use self::route_guard::{GuardOutcome, RouteGuard, decide};
pub use self::routes::{ResolvedRoute, RouteNode, RouteParams, RouteSummary, RouteTable, View, ViewSpec};
pub use self::session::{AuthToken, ProfileUpdate, Session, SessionRecordError};
pub use self::session_flows::{
    ADMIN_LANDING, DEFAULT_LANDING, apply_profile_update, complete_login, handle_auth_failure,
    logout, post_login_destination,
};
pub use self::stored_session::{DEFAULT_SESSION_KEY, StoredSessionStore};
