//! Role-filtered menus.
//!
//! Menus are static tables of [`MenuEntry`] values. Filtering uses the same
//! [`Requirement`] evaluation as the route guard, so an entry is shown
//! exactly when its route would render.

use serde::Serialize;

use super::access::{Access, AccessDecision, Requirement};
use super::permissions::{Capability, CapabilitySet, capabilities_for};
use super::ports::SessionStore;
use super::role::{RoleClaim, RoleSet};
use super::session::Session;

/// One menu item or action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuEntry {
    /// Stable identifier.
    pub id: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Route the entry navigates to; actions have none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<&'static str>,
    /// Who may see the entry.
    pub access: Access,
}

impl MenuEntry {
    const fn link(id: &'static str, label: &'static str, route: &'static str, access: Access) -> Self {
        Self {
            id,
            label,
            route: Some(route),
            access,
        }
    }

    const fn action(id: &'static str, label: &'static str, access: Access) -> Self {
        Self {
            id,
            label,
            route: None,
            access,
        }
    }
}

const fn cap(capability: Capability) -> Access {
    Access::Capability(capability)
}

/// Main navigation.
pub const SIDEBAR: &[MenuEntry] = &[
    MenuEntry::link("chat", "Chat", "/chat", cap(Capability::CanChat)),
    MenuEntry::link("reports", "Reports", "/reports", cap(Capability::CanViewReports)),
    MenuEntry::link("analysis", "Analysis", "/analysis", cap(Capability::CanViewAnalysis)),
    MenuEntry::link("machine", "Machine Status", "/machine", Access::Authenticated),
    MenuEntry::link(
        "admin-dashboard",
        "Admin Dashboard",
        "/adminDashboard",
        cap(Capability::CanViewAdminDashboard),
    ),
    MenuEntry::link(
        "user-management",
        "User Management",
        "/user-management",
        cap(Capability::CanManageUsers),
    ),
    MenuEntry::link("settings", "Settings", "/settings", Access::Authenticated),
];

/// Tabs of the settings page.
pub const SETTINGS_TABS: &[MenuEntry] = &[
    MenuEntry::action("profile", "Profile", Access::Roles(RoleSet::ANY_ROLE)),
    MenuEntry::action("security", "Security", Access::Roles(RoleSet::ANY_ROLE)),
    MenuEntry::action("system", "System", Access::Roles(RoleSet::ADMIN)),
];

/// Buttons on the report pages.
pub const REPORT_ACTIONS: &[MenuEntry] = &[
    MenuEntry::link("create-report", "New Report", "/report", cap(Capability::CanCreateReports)),
    MenuEntry::action("edit-report", "Edit", cap(Capability::CanEditReports)),
    MenuEntry::action("delete-report", "Delete", cap(Capability::CanDeleteReports)),
];

/// Buttons on the machine status page.
pub const MACHINE_ACTIONS: &[MenuEntry] = &[
    MenuEntry::action("create-machine", "Add Machine", cap(Capability::CanManageMachines)),
    MenuEntry::action("update-machine-status", "Update Status", cap(Capability::CanManageMachines)),
    MenuEntry::action("delete-machine", "Delete", cap(Capability::CanManageMachines)),
];

/// Named menu tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuKind {
    /// [`SIDEBAR`].
    Sidebar,
    /// [`SETTINGS_TABS`].
    SettingsTabs,
    /// [`REPORT_ACTIONS`].
    ReportActions,
    /// [`MACHINE_ACTIONS`].
    MachineActions,
}

impl MenuKind {
    /// Every menu.
    pub const ALL: [Self; 4] = [
        Self::Sidebar,
        Self::SettingsTabs,
        Self::ReportActions,
        Self::MachineActions,
    ];

    /// Static entries of the menu.
    pub const fn entries(self) -> &'static [MenuEntry] {
        match self {
            Self::Sidebar => SIDEBAR,
            Self::SettingsTabs => SETTINGS_TABS,
            Self::ReportActions => REPORT_ACTIONS,
            Self::MachineActions => MACHINE_ACTIONS,
        }
    }
}

/// Entries visible to `session`, in menu order.
///
/// # Examples
/// ```
/// use frontend::domain::{Role, Session, SIDEBAR, visible_entries};
///
/// let user = Session::new("1", "bob", Role::User).with_token("t");
/// let ids: Vec<_> = visible_entries(SIDEBAR, Some(&user)).iter().map(|e| e.id).collect();
/// assert_eq!(ids, ["chat", "machine", "settings"]);
/// assert!(visible_entries(SIDEBAR, None).is_empty());
/// ```
pub fn visible_entries<'a>(entries: &'a [MenuEntry], session: Option<&Session>) -> Vec<&'a MenuEntry> {
    entries
        .iter()
        .filter(|entry| Requirement::of(entry.access).check(session) == AccessDecision::Granted)
        .collect()
}

/// Entries visible to a signed-in user holding `role`.
///
/// `None` stands for "no role": only public entries remain.
pub fn visible_for_role<'a>(entries: &'a [MenuEntry], role: Option<&RoleClaim>) -> Vec<&'a MenuEntry> {
    entries
        .iter()
        .filter(|entry| {
            let requirement = Requirement::of(entry.access);
            requirement.is_public() || (role.is_some() && requirement.admits_role(role))
        })
        .collect()
}

/// Menus for the session currently in the store.
///
/// Every call re-reads the store; nothing is cached between calls.
#[derive(Debug)]
pub struct NavigationProvider<S> {
    store: S,
}

impl<S: SessionStore> NavigationProvider<S> {
    /// Provider over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Visible entries of one menu.
    pub fn menu(&self, kind: MenuKind) -> Vec<MenuEntry> {
        let session = self.store.get_session();
        visible_entries(kind.entries(), session.as_ref())
            .into_iter()
            .copied()
            .collect()
    }

    /// Visible sidebar entries.
    pub fn sidebar(&self) -> Vec<MenuEntry> {
        self.menu(MenuKind::Sidebar)
    }

    /// Capabilities of the stored session; empty when signed out.
    pub fn capabilities(&self) -> CapabilitySet {
        self.store
            .get_session()
            .filter(Session::is_authenticated)
            .map_or(CapabilitySet::EMPTY, |session| {
                capabilities_for(Some(session.role()))
            })
    }

    /// Whether the stored session holds `capability`.
    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(capability)
    }
}
