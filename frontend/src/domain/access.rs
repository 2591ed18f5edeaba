//! Access requirements shared by route guards and menus.
//!
//! Both the route tree and every menu entry carry an [`Access`] value. The
//! guard folds the values along a route branch into a [`Requirement`]; the
//! navigation provider evaluates a single entry's value the same way.

use serde::Serialize;

use super::permissions::{Capability, role_satisfies};
use super::role::{RoleClaim, RoleSet};
use super::session::Session;

/// Requirement attached to a route node or menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Access {
    /// Anyone, signed in or not.
    Public,
    /// Any signed-in user.
    Authenticated,
    /// Signed-in users holding one of the roles.
    Roles(RoleSet),
    /// Signed-in users whose role is granted the capability.
    Capability(Capability),
}

impl Access {
    /// Role predicate access; an empty predicate means public.
    pub const fn roles(allowed: RoleSet) -> Self {
        if allowed.is_empty() {
            Self::Public
        } else {
            Self::Roles(allowed)
        }
    }

    /// Roles admitted by this access level, or `None` when any role will do.
    pub const fn allowed_roles(self) -> Option<RoleSet> {
        match self {
            Self::Public | Self::Authenticated => None,
            Self::Roles(allowed) => Some(allowed),
            Self::Capability(capability) => Some(capability.granted_to()),
        }
    }

    /// Whether a signed-in user is needed.
    pub const fn requires_authentication(self) -> bool {
        !matches!(self, Self::Public)
    }
}

/// Outcome of checking a [`Requirement`] against a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The session may proceed.
    Granted,
    /// The caller is not signed in (or has no token).
    NeedsLogin,
    /// The caller is signed in but their role is not admitted.
    Forbidden,
}

/// Effective requirement of a route branch.
///
/// Requirements compose by intersection: authentication is required if any
/// level requires it, and role predicates narrow to their common members.
///
/// # Examples
/// ```
/// use frontend::domain::{Access, Requirement, Role, RoleSet};
///
/// let requirement = Requirement::PUBLIC
///     .and(Access::Authenticated)
///     .and(Access::Roles(RoleSet::MEDICAL_STAFF))
///     .and(Access::Roles(RoleSet::DOCTOR));
/// assert_eq!(requirement.allowed_roles(), Some(RoleSet::DOCTOR));
/// assert!(!requirement.is_public());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    authenticated: bool,
    roles: Option<RoleSet>,
}

impl Requirement {
    /// No requirement at all.
    pub const PUBLIC: Self = Self {
        authenticated: false,
        roles: None,
    };

    /// Requirement of a single access level.
    pub const fn of(access: Access) -> Self {
        Self::PUBLIC.and(access)
    }

    /// Narrow this requirement by a nested access level.
    #[must_use]
    pub const fn and(self, access: Access) -> Self {
        let roles = match (self.roles, access.allowed_roles()) {
            (Some(outer), Some(inner)) => Some(outer.intersection(inner)),
            (Some(outer), None) => Some(outer),
            (None, inner) => inner,
        };
        Self {
            authenticated: self.authenticated || access.requires_authentication(),
            roles,
        }
    }

    /// Whether anyone may pass.
    pub const fn is_public(self) -> bool {
        !self.authenticated
    }

    /// Whether a signed-in user is needed.
    pub const fn requires_authentication(self) -> bool {
        self.authenticated
    }

    /// Composed role predicate, or `None` when any role will do.
    pub const fn allowed_roles(self) -> Option<RoleSet> {
        self.roles
    }

    /// Whether a role passes the role part of the requirement.
    pub fn admits_role(self, role: Option<&RoleClaim>) -> bool {
        match self.roles {
            None => true,
            Some(allowed) => role_satisfies(role, allowed),
        }
    }

    /// Check a session, testing authentication before role.
    pub fn check(self, session: Option<&Session>) -> AccessDecision {
        if self.is_public() {
            return AccessDecision::Granted;
        }
        let Some(session) = session.filter(|session| session.is_authenticated()) else {
            return AccessDecision::NeedsLogin;
        };
        if self.admits_role(Some(session.role())) {
            AccessDecision::Granted
        } else {
            AccessDecision::Forbidden
        }
    }
}

impl From<Access> for Requirement {
    fn from(access: Access) -> Self {
        Self::of(access)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::Role;
    use rstest::rstest;

    fn session(role: &str, token: &str) -> Session {
        Session::new("1", "ada", RoleClaim::from_raw(role)).with_token(token)
    }

    #[test]
    fn empty_role_predicate_is_public() {
        assert_eq!(Access::roles(RoleSet::EMPTY), Access::Public);
        assert_eq!(Access::roles(RoleSet::ADMIN), Access::Roles(RoleSet::ADMIN));
    }

    #[test]
    fn capability_access_uses_the_matrix_column() {
        assert_eq!(
            Access::Capability(Capability::CanEditReports).allowed_roles(),
            Some(RoleSet::DOCTOR)
        );
    }

    #[test]
    fn disjoint_predicates_admit_nobody() {
        let requirement = Requirement::of(Access::Roles(RoleSet::ADMIN))
            .and(Access::Roles(RoleSet::of(&[Role::User])));
        assert_eq!(requirement.allowed_roles(), Some(RoleSet::EMPTY));
        for role in Role::ALL {
            assert!(!requirement.admits_role(Some(&RoleClaim::from(role))));
        }
    }

    #[test]
    fn public_child_under_authenticated_parent_still_needs_login() {
        let requirement = Requirement::of(Access::Authenticated).and(Access::Public);
        assert!(requirement.requires_authentication());
        assert_eq!(requirement.check(None), AccessDecision::NeedsLogin);
    }

    #[rstest]
    #[case(None, AccessDecision::Granted)]
    #[case(Some(("user", "")), AccessDecision::Granted)]
    fn public_requirement_ignores_session(
        #[case] raw: Option<(&str, &str)>,
        #[case] expected: AccessDecision,
    ) {
        let session = raw.map(|(role, token)| session(role, token));
        assert_eq!(Requirement::PUBLIC.check(session.as_ref()), expected);
    }

    #[rstest]
    #[case("admin", "", AccessDecision::NeedsLogin)]
    #[case("user", "abc", AccessDecision::Forbidden)]
    #[case("therapist", "abc", AccessDecision::Granted)]
    #[case("root", "abc", AccessDecision::Forbidden)]
    fn checks_authentication_before_role(
        #[case] role: &str,
        #[case] token: &str,
        #[case] expected: AccessDecision,
    ) {
        let requirement = Requirement::of(Access::Roles(RoleSet::MEDICAL_STAFF));
        assert_eq!(requirement.check(Some(&session(role, token))), expected);
    }

    #[test]
    fn unrecognized_role_passes_authentication_only_requirements() {
        let requirement = Requirement::of(Access::Authenticated);
        assert_eq!(
            requirement.check(Some(&session("root", "abc"))),
            AccessDecision::Granted
        );
    }
}
