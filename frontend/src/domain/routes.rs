//! Application route tree.
//!
//! Each node carries an [`Access`] level. Resolving a path walks the tree,
//! folding every level passed on the way into one [`Requirement`], so a child
//! can only narrow what its ancestors allow.

use std::fmt;

use serde::{Serialize, Serializer};
use serde::ser::SerializeMap;

use super::access::{Access, Requirement};
use super::permissions::{Capability, capabilities_for};
use super::role::RoleClaim;

/// Views the renderer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum View {
    /// Landing page.
    Home,
    /// Login and registration form.
    Login,
    /// Access-denied page.
    Unauthorized,
    /// Assistant chat.
    Chat,
    /// New report form.
    ReportForm,
    /// Report list.
    Reports,
    /// Single report.
    ReportDetail,
    /// Report editor.
    ReportEdit,
    /// Analysis dashboard.
    Analysis,
    /// Machine list with management controls.
    MachineStatus,
    /// Machine list without management controls.
    MachineStatusViewOnly,
    /// Administrator dashboard.
    AdminDashboard,
    /// User administration.
    UserManagement,
    /// Account settings.
    Settings,
}

/// How a route picks its view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViewSpec {
    /// Always the same view.
    Fixed {
        /// View to render.
        view: View,
    },
    /// One view for holders of a capability, another for everyone else.
    ByCapability {
        /// Capability deciding the variant.
        capability: Capability,
        /// View for holders.
        granted: View,
        /// View for everyone else.
        otherwise: View,
    },
}

impl ViewSpec {
    /// View to render for `role`.
    pub fn select(self, role: Option<&RoleClaim>) -> View {
        match self {
            Self::Fixed { view } => view,
            Self::ByCapability {
                capability,
                granted,
                otherwise,
            } => {
                if capabilities_for(role).contains(capability) {
                    granted
                } else {
                    otherwise
                }
            }
        }
    }
}

impl From<View> for ViewSpec {
    fn from(view: View) -> Self {
        Self::Fixed { view }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Matches the empty remainder of the parent's path.
    Index,
    /// Groups children under an access level without consuming a segment.
    Layout,
    /// Matches one segment, ignoring ASCII case.
    Literal(&'static str),
    /// Matches any one segment and captures it.
    Param(&'static str),
}

/// Node of the route tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteNode {
    segment: Segment,
    access: Access,
    view: Option<ViewSpec>,
    children: Vec<RouteNode>,
}

impl RouteNode {
    /// Route rendering `view` at its parent's path.
    pub fn index(access: Access, view: impl Into<ViewSpec>) -> Self {
        Self::new(Segment::Index, access, Some(view.into()))
    }

    /// Pathless grouping applying `access` to every child.
    pub fn layout(access: Access, children: impl IntoIterator<Item = RouteNode>) -> Self {
        Self::new(Segment::Layout, access, None).with_children(children)
    }

    /// Route for one literal path segment.
    pub fn literal(segment: &'static str, access: Access, view: impl Into<ViewSpec>) -> Self {
        Self::new(Segment::Literal(segment), access, Some(view.into()))
    }

    /// Route capturing one path segment as parameter `name`.
    pub fn param(name: &'static str, access: Access, view: impl Into<ViewSpec>) -> Self {
        Self::new(Segment::Param(name), access, Some(view.into()))
    }

    /// Attach nested routes.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = RouteNode>) -> Self {
        self.children.extend(children);
        self
    }

    fn new(segment: Segment, access: Access, view: Option<ViewSpec>) -> Self {
        Self {
            segment,
            access,
            view,
            children: Vec::new(),
        }
    }
}

/// Path parameters captured while resolving a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(Vec<(&'static str, String)>);

impl RouteParams {
    /// Value captured for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for RouteParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Result of matching a path against the route tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    /// Route pattern, e.g. `/reports/:reportId/edit`.
    pub pattern: String,
    /// Composed requirement of every level on the branch.
    pub requirement: Requirement,
    /// View selection of the matched leaf.
    pub view: ViewSpec,
    /// Captured path parameters.
    pub params: RouteParams,
}

/// Routable leaf listed by [`RouteTable::routes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    /// Route pattern.
    pub pattern: String,
    /// Composed requirement.
    pub requirement: Requirement,
    /// View selection.
    pub view: ViewSpec,
}

/// Ordered route tree; the first matching branch wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    roots: Vec<RouteNode>,
}

impl RouteTable {
    /// Build a table from top-level nodes.
    pub fn new(roots: impl IntoIterator<Item = RouteNode>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
        }
    }

    /// Routes of the medical assistant client.
    pub fn application() -> Self {
        use Capability::*;
        let cap = Access::Capability;

        Self::new([
            RouteNode::index(Access::Public, View::Home),
            RouteNode::literal("login", Access::Public, View::Login),
            RouteNode::literal("unauthorized", Access::Public, View::Unauthorized),
            RouteNode::layout(
                Access::Authenticated,
                [
                    RouteNode::literal("chat", cap(CanChat), View::Chat),
                    RouteNode::literal("report", cap(CanCreateReports), View::ReportForm),
                    RouteNode::literal("reports", cap(CanViewReports), View::Reports).with_children([
                        RouteNode::param("reportId", Access::Authenticated, View::ReportDetail)
                            .with_children([RouteNode::literal(
                                "edit",
                                cap(CanEditReports),
                                View::ReportEdit,
                            )]),
                    ]),
                    RouteNode::literal("analyze", cap(CanViewAnalysis), View::Analysis),
                    RouteNode::literal("analysis", cap(CanViewAnalysis), View::Analysis),
                    RouteNode::literal(
                        "machine",
                        Access::Authenticated,
                        ViewSpec::ByCapability {
                            capability: CanManageMachines,
                            granted: View::MachineStatus,
                            otherwise: View::MachineStatusViewOnly,
                        },
                    ),
                    RouteNode::literal(
                        "adminDashboard",
                        cap(CanViewAdminDashboard),
                        View::AdminDashboard,
                    ),
                    RouteNode::literal("user-management", cap(CanManageUsers), View::UserManagement),
                    RouteNode::literal("settings", Access::Authenticated, View::Settings),
                ],
            ),
        ])
    }

    /// Match `path` (without query) against the tree.
    ///
    /// Empty segments are ignored, so `/reports/` and `/reports` are the
    /// same route.
    ///
    /// # Examples
    /// ```
    /// use frontend::domain::{RoleSet, RouteTable};
    ///
    /// let table = RouteTable::application();
    /// let route = table.resolve("/reports/42/edit").unwrap();
    /// assert_eq!(route.params.get("reportId"), Some("42"));
    /// assert_eq!(route.requirement.allowed_roles(), Some(RoleSet::DOCTOR));
    /// assert!(table.resolve("/nowhere").is_none());
    /// ```
    pub fn resolve(&self, path: &str) -> Option<ResolvedRoute> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut walk = Walk::default();
        walk.nodes(&self.roots, &segments, Requirement::PUBLIC)
    }

    /// Every routable leaf in tree order.
    pub fn routes(&self) -> Vec<RouteSummary> {
        let mut out = Vec::new();
        collect(&self.roots, "", Requirement::PUBLIC, &mut out);
        out
    }
}

#[derive(Default)]
struct Walk {
    pattern: Vec<String>,
    params: Vec<(&'static str, String)>,
}

impl Walk {
    fn nodes(
        &mut self,
        nodes: &[RouteNode],
        segments: &[&str],
        requirement: Requirement,
    ) -> Option<ResolvedRoute> {
        nodes
            .iter()
            .find_map(|node| self.node(node, segments, requirement.and(node.access)))
    }

    fn node(
        &mut self,
        node: &RouteNode,
        segments: &[&str],
        requirement: Requirement,
    ) -> Option<ResolvedRoute> {
        match &node.segment {
            Segment::Index => {
                if segments.is_empty() {
                    self.leaf(node, requirement)
                } else {
                    None
                }
            }
            Segment::Layout => self.nodes(&node.children, segments, requirement),
            Segment::Literal(name) => {
                let (first, rest) = segments.split_first()?;
                if !first.eq_ignore_ascii_case(name) {
                    return None;
                }
                self.descend(node, format!("/{name}"), None, rest, requirement)
            }
            Segment::Param(name) => {
                let (first, rest) = segments.split_first()?;
                self.descend(
                    node,
                    format!("/:{name}"),
                    Some((*name, (*first).to_owned())),
                    rest,
                    requirement,
                )
            }
        }
    }

    fn descend(
        &mut self,
        node: &RouteNode,
        pattern: String,
        param: Option<(&'static str, String)>,
        rest: &[&str],
        requirement: Requirement,
    ) -> Option<ResolvedRoute> {
        self.pattern.push(pattern);
        let captured = param.is_some();
        self.params.extend(param);

        let found = if rest.is_empty() {
            self.leaf(node, requirement)
                .or_else(|| self.nodes(&node.children, rest, requirement))
        } else {
            self.nodes(&node.children, rest, requirement)
        };

        if found.is_none() {
            self.pattern.pop();
            if captured {
                self.params.pop();
            }
        }
        found
    }

    fn leaf(&self, node: &RouteNode, requirement: Requirement) -> Option<ResolvedRoute> {
        let view = node.view?;
        let pattern = if self.pattern.is_empty() {
            "/".to_owned()
        } else {
            self.pattern.concat()
        };
        Some(ResolvedRoute {
            pattern,
            requirement,
            view,
            params: RouteParams(self.params.clone()),
        })
    }
}

fn collect(nodes: &[RouteNode], prefix: &str, requirement: Requirement, out: &mut Vec<RouteSummary>) {
    for node in nodes {
        let requirement = requirement.and(node.access);
        let pattern = match &node.segment {
            Segment::Index | Segment::Layout => prefix.to_owned(),
            Segment::Literal(name) => format!("{prefix}/{name}"),
            Segment::Param(name) => format!("{prefix}/:{name}"),
        };
        if let Some(view) = node.view {
            out.push(RouteSummary {
                pattern: if pattern.is_empty() { "/".to_owned() } else { pattern.clone() },
                requirement,
                view,
            });
        }
        collect(&node.children, &pattern, requirement, out);
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
