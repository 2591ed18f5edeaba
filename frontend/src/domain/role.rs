//! Roles and role predicates.
//!
//! The backend hands out role strings. The client maps the four it knows to
//! [`Role`] and keeps anything else as an unrecognized [`RoleClaim`], which
//! is granted nothing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

/// Closed set of roles understood by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Clinician with report editing and machine management rights.
    Doctor,
    /// Clinician with read and create rights on reports.
    Therapist,
    /// Patient-facing account.
    User,
}

impl Role {
    /// Every role, in privilege order.
    pub const ALL: [Self; 4] = [Self::Admin, Self::Doctor, Self::Therapist, Self::User];

    /// Wire name of the role as stored in the session record.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Doctor => "doctor",
            Self::Therapist => "therapist",
            Self::User => "user",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Admin => 1,
            Self::Doctor => 1 << 1,
            Self::Therapist => 1 << 2,
            Self::User => 1 << 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the known role names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == raw)
            .ok_or_else(|| UnknownRole(raw.to_owned()))
    }
}

/// Role as claimed by a persisted session record.
///
/// Matching is exact: `"Admin"` or `" admin"` are unrecognized claims. A
/// claim can only be built through [`RoleClaim::from_raw`] or from a
/// [`Role`], so a known role name is always classified as known.
///
/// # Examples
/// ```
/// use frontend::domain::{Role, RoleClaim};
///
/// assert_eq!(RoleClaim::from_raw("doctor").known(), Some(Role::Doctor));
/// assert_eq!(RoleClaim::from_raw("doctor"), RoleClaim::from(Role::Doctor));
/// assert_eq!(RoleClaim::from_raw("superuser").known(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoleClaim(Claim);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Claim {
    Known(Role),
    // Never holds one of the known role names.
    Unrecognized(String),
}

impl RoleClaim {
    /// Classify a raw role string.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match raw.parse::<Role>() {
            Ok(role) => Self(Claim::Known(role)),
            Err(_) => Self(Claim::Unrecognized(raw)),
        }
    }

    /// The known role, if any.
    pub fn known(&self) -> Option<Role> {
        match &self.0 {
            Claim::Known(role) => Some(*role),
            Claim::Unrecognized(_) => None,
        }
    }

    /// Whether the claim names one of the four known roles.
    pub fn is_recognized(&self) -> bool {
        self.known().is_some()
    }

    /// Raw role string.
    pub fn as_str(&self) -> &str {
        match &self.0 {
            Claim::Known(role) => role.as_str(),
            Claim::Unrecognized(raw) => raw.as_str(),
        }
    }
}

impl From<Role> for RoleClaim {
    fn from(role: Role) -> Self {
        Self(Claim::Known(role))
    }
}

impl From<String> for RoleClaim {
    fn from(raw: String) -> Self {
        Self::from_raw(raw)
    }
}

impl From<RoleClaim> for String {
    fn from(claim: RoleClaim) -> Self {
        match claim.0 {
            Claim::Known(role) => role.as_str().to_owned(),
            Claim::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for RoleClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of roles allowed through a route or menu entry.
///
/// ## Invariants
/// - Only the four [`Role`] bits are ever set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    /// No role at all.
    pub const EMPTY: Self = Self(0);
    /// Administrators only.
    pub const ADMIN: Self = Self::of(&[Role::Admin]);
    /// Administrators and doctors.
    pub const DOCTOR: Self = Self::of(&[Role::Admin, Role::Doctor]);
    /// Every clinical role.
    pub const MEDICAL_STAFF: Self = Self::of(&[Role::Admin, Role::Doctor, Role::Therapist]);
    /// Every known role.
    pub const ANY_ROLE: Self = Self::of(&Role::ALL);

    /// Build a set from a slice of roles.
    pub const fn of(roles: &[Role]) -> Self {
        let mut bits = 0;
        let mut index = 0;
        while index < roles.len() {
            bits |= roles[index].bit();
            index += 1;
        }
        Self(bits)
    }

    /// Whether `role` is a member.
    pub const fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// Roles present in both sets.
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Roles present in either set.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether the set has no members.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in privilege order.
    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |role| self.contains(*role))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::EMPTY, |set, role| set.union(Self(role.bit())))
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Serialize for RoleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("admin", Some(Role::Admin))]
    #[case("doctor", Some(Role::Doctor))]
    #[case("therapist", Some(Role::Therapist))]
    #[case("user", Some(Role::User))]
    #[case("Admin", None)]
    #[case(" admin", None)]
    #[case("", None)]
    #[case("nurse", None)]
    fn claims_match_role_names_exactly(#[case] raw: &str, #[case] expected: Option<Role>) {
        let claim = RoleClaim::from_raw(raw);
        assert_eq!(claim.known(), expected);
        assert_eq!(claim.as_str(), raw);
    }

    #[test]
    fn claims_serialise_as_plain_strings() {
        let json = serde_json::to_string(&RoleClaim::from_raw("superuser")).expect("serialise");
        assert_eq!(json, "\"superuser\"");
        let claim: RoleClaim = serde_json::from_str("\"therapist\"").expect("deserialise");
        assert_eq!(claim, RoleClaim::from(Role::Therapist));
    }

    #[rstest]
    #[case("admin")]
    #[case("doctor")]
    #[case("therapist")]
    #[case("user")]
    fn known_names_always_classify_as_known(#[case] raw: &str) {
        let claim = RoleClaim::from_raw(raw);
        assert!(claim.is_recognized());
        assert_eq!(claim, RoleClaim::from(raw.to_owned()));
        assert_eq!(
            serde_json::from_value::<RoleClaim>(serde_json::json!(raw)).expect("deserialise"),
            claim
        );
    }

    #[test]
    fn named_sets_have_expected_members() {
        assert_eq!(RoleSet::ADMIN.iter().collect::<Vec<_>>(), vec![Role::Admin]);
        assert_eq!(
            RoleSet::DOCTOR.iter().collect::<Vec<_>>(),
            vec![Role::Admin, Role::Doctor]
        );
        assert!(!RoleSet::MEDICAL_STAFF.contains(Role::User));
        assert!(Role::ALL.into_iter().all(|role| RoleSet::ANY_ROLE.contains(role)));
        assert!(RoleSet::EMPTY.is_empty());
    }

    #[test]
    fn intersection_narrows_to_common_roles() {
        let narrowed = RoleSet::MEDICAL_STAFF.intersection(RoleSet::DOCTOR);
        assert_eq!(narrowed, RoleSet::DOCTOR);
        assert!(RoleSet::ADMIN
            .intersection(RoleSet::of(&[Role::User]))
            .is_empty());
    }

    #[test]
    fn collects_from_iterator() {
        let set: RoleSet = [Role::Therapist, Role::Admin, Role::Therapist]
            .into_iter()
            .collect();
        assert_eq!(set, RoleSet::of(&[Role::Admin, Role::Therapist]));
        assert_eq!(
            serde_json::to_value(set).expect("serialise"),
            serde_json::json!(["admin", "therapist"])
        );
    }
}
