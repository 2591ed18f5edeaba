//! Role to capability permission matrix.
//!
//! The matrix is stored column-wise: each [`Capability`] names the roles it is
//! granted to. Route requirements and menu filters read the same column, so
//! the two can never disagree.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use super::role::{Role, RoleClaim, RoleSet};

/// Named permission derived from a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// Browse the report list.
    CanViewReports,
    /// Fill in a new report.
    CanCreateReports,
    /// Amend an existing report.
    CanEditReports,
    /// Remove reports.
    CanDeleteReports,
    /// Open the analysis views.
    CanViewAnalysis,
    /// Create, edit and delete user accounts.
    CanManageUsers,
    /// Create machines and change their status.
    CanManageMachines,
    /// Open the administrator dashboard.
    CanViewAdminDashboard,
    /// Use the assistant chat.
    CanChat,
    /// See reports about oneself.
    CanViewOwnReports,
}

impl Capability {
    /// Every capability in table order.
    pub const ALL: [Self; 10] = [
        Self::CanViewReports,
        Self::CanCreateReports,
        Self::CanEditReports,
        Self::CanDeleteReports,
        Self::CanViewAnalysis,
        Self::CanManageUsers,
        Self::CanManageMachines,
        Self::CanViewAdminDashboard,
        Self::CanChat,
        Self::CanViewOwnReports,
    ];

    /// Roles this capability is granted to.
    pub const fn granted_to(self) -> RoleSet {
        match self {
            Self::CanViewReports | Self::CanCreateReports | Self::CanViewAnalysis => {
                RoleSet::MEDICAL_STAFF
            }
            Self::CanEditReports | Self::CanManageMachines => RoleSet::DOCTOR,
            Self::CanDeleteReports | Self::CanManageUsers | Self::CanViewAdminDashboard => {
                RoleSet::ADMIN
            }
            Self::CanChat | Self::CanViewOwnReports => RoleSet::ANY_ROLE,
        }
    }

    /// Wire name, e.g. `canViewReports`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::CanViewReports => "canViewReports",
            Self::CanCreateReports => "canCreateReports",
            Self::CanEditReports => "canEditReports",
            Self::CanDeleteReports => "canDeleteReports",
            Self::CanViewAnalysis => "canViewAnalysis",
            Self::CanManageUsers => "canManageUsers",
            Self::CanManageMachines => "canManageMachines",
            Self::CanViewAdminDashboard => "canViewAdminDashboard",
            Self::CanChat => "canChat",
            Self::CanViewOwnReports => "canViewOwnReports",
        }
    }

    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of capabilities held by a role.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    /// No capabilities.
    pub const EMPTY: Self = Self(0);

    /// Whether `capability` is held.
    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    /// Whether nothing is held.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of capabilities held.
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Held capabilities in table order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |capability| self.contains(*capability))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().fold(0, |bits, cap| bits | cap.bit()))
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Serialize for CapabilitySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Capabilities granted to `role`.
///
/// Anonymous callers and unrecognized roles get [`CapabilitySet::EMPTY`].
///
/// # Examples
/// ```
/// use frontend::domain::{Capability, Role, RoleClaim, capabilities_for};
///
/// let therapist = RoleClaim::from(Role::Therapist);
/// let caps = capabilities_for(Some(&therapist));
/// assert!(caps.contains(Capability::CanCreateReports));
/// assert!(!caps.contains(Capability::CanEditReports));
/// assert!(capabilities_for(None).is_empty());
/// ```
pub fn capabilities_for(role: Option<&RoleClaim>) -> CapabilitySet {
    let Some(role) = role.and_then(RoleClaim::known) else {
        return CapabilitySet::EMPTY;
    };
    Capability::ALL
        .into_iter()
        .filter(|capability| capability.granted_to().contains(role))
        .collect()
}

/// Whether `role` is one of `allowed`.
///
/// `None` and unrecognized roles never satisfy a predicate.
pub fn role_satisfies(role: Option<&RoleClaim>, allowed: RoleSet) -> bool {
    role.and_then(RoleClaim::known)
        .is_some_and(|role| allowed.contains(role))
}

/// Whether `role` is exactly `expected`.
pub fn has_role(role: Option<&RoleClaim>, expected: Role) -> bool {
    role.and_then(RoleClaim::known) == Some(expected)
}

/// Whether `role` is any of `roles`.
pub fn has_any_role(role: Option<&RoleClaim>, roles: &[Role]) -> bool {
    role_satisfies(role, RoleSet::of(roles))
}
