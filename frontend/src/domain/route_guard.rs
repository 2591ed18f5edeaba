//! Per-navigation route protection.
//!
//! [`decide`] is the pure decision; [`RouteGuard`] wires it to a session
//! store and holds the hydration flag. The guard reads the store on every
//! evaluation, so a login or logout in another tab is honoured at the next
//! navigation.

use std::cell::Cell;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::access::AccessDecision;
use super::location::Location;
use super::ports::SessionStore;
use super::routes::{RouteParams, RouteTable, View};
use super::session::Session;

/// Outcome of evaluating one navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum GuardOutcome {
    /// The session has not been read yet; render nothing protected.
    Pending,
    /// Render the view.
    Render {
        /// View to render.
        view: View,
        /// Captured path parameters.
        params: RouteParams,
    },
    /// Send the visitor to the login view, remembering where they were going.
    RedirectToLogin {
        /// Requested location to resume after login.
        from: Location,
    },
    /// Signed in but not allowed here.
    RedirectToUnauthorized,
    /// No route matches the path.
    NotFound,
}

impl GuardOutcome {
    /// Location to navigate to instead of rendering, if any.
    ///
    /// # Examples
    /// ```
    /// use frontend::domain::{GuardOutcome, Location};
    ///
    /// let from = Location::parse("/reports").unwrap();
    /// let outcome = GuardOutcome::RedirectToLogin { from };
    /// assert_eq!(
    ///     outcome.redirect_target().unwrap().to_string(),
    ///     "/login?from=%2Freports"
    /// );
    /// assert_eq!(GuardOutcome::Pending.redirect_target(), None);
    /// ```
    pub fn redirect_target(&self) -> Option<Location> {
        match self {
            Self::RedirectToLogin { from } => Some(Location::login_resuming(from)),
            Self::RedirectToUnauthorized => Some(Location::unauthorized()),
            Self::Pending | Self::Render { .. } | Self::NotFound => None,
        }
    }

    /// View to render, if the outcome renders.
    pub fn view(&self) -> Option<View> {
        match self {
            Self::Render { view, .. } => Some(*view),
            _ => None,
        }
    }
}

/// Decide the outcome of navigating to `location` with `session`.
///
/// Authentication is checked before role, so a visitor without a token is
/// always sent to login even when their stored role would be denied.
pub fn decide(table: &RouteTable, location: &Location, session: Option<&Session>) -> GuardOutcome {
    let Some(route) = table.resolve(location.path()) else {
        return GuardOutcome::NotFound;
    };
    match route.requirement.check(session) {
        AccessDecision::Granted => GuardOutcome::Render {
            view: route.view.select(session.map(Session::role)),
            params: route.params,
        },
        AccessDecision::NeedsLogin => GuardOutcome::RedirectToLogin {
            from: location.clone(),
        },
        AccessDecision::Forbidden => GuardOutcome::RedirectToUnauthorized,
    }
}

/// Route guard bound to a session store.
///
/// # Examples
/// ```
/// use frontend::domain::ports::FixtureSessionStore;
/// use frontend::domain::{GuardOutcome, Location, Role, RouteGuard, Session, View};
///
/// let store = FixtureSessionStore::with_session(
///     Session::new("1", "ada", Role::Therapist).with_token("abc"),
/// );
/// let guard = RouteGuard::new(store);
/// let chat = Location::parse("/chat").unwrap();
/// assert_eq!(guard.evaluate(&chat), GuardOutcome::Pending);
///
/// guard.hydrate();
/// assert_eq!(guard.evaluate(&chat).view(), Some(View::Chat));
/// ```
#[derive(Debug)]
pub struct RouteGuard<S> {
    store: S,
    table: RouteTable,
    hydrated: Cell<bool>,
}

impl<S: SessionStore> RouteGuard<S> {
    /// Guard over the application route table.
    pub fn new(store: S) -> Self {
        Self::with_table(store, RouteTable::application())
    }

    /// Guard over a custom route table.
    pub fn with_table(store: S, table: RouteTable) -> Self {
        Self {
            store,
            table,
            hydrated: Cell::new(false),
        }
    }

    /// Complete the initial session read. Until this runs every evaluation
    /// is [`GuardOutcome::Pending`].
    pub fn hydrate(&self) -> Option<Session> {
        let session = self.store.get_session();
        self.hydrated.set(true);
        info!(
            authenticated = session.as_ref().is_some_and(Session::is_authenticated),
            "session hydrated"
        );
        session
    }

    /// Whether [`Self::hydrate`] has run.
    pub fn is_hydrated(&self) -> bool {
        self.hydrated.get()
    }

    /// Evaluate a navigation against the current stored session.
    pub fn evaluate(&self, location: &Location) -> GuardOutcome {
        if !self.is_hydrated() {
            return GuardOutcome::Pending;
        }
        let session = self.store.get_session();
        let unrecognized = session
            .as_ref()
            .map(Session::role)
            .filter(|role| !role.is_recognized());
        if let Some(role) = unrecognized {
            warn!(%role, "unrecognized role claim; role-gated routes are denied");
        }
        let outcome = decide(&self.table, location, session.as_ref());
        debug!(location = %location, ?outcome, "route evaluated");
        outcome
    }

    /// Session store backing the guard.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Route table in use.
    pub fn table(&self) -> &RouteTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{FixtureSessionStore, MockSessionStore, SessionStore};
    use crate::domain::{Role, RoleClaim};
    use rstest::rstest;

    fn at(raw: &str) -> Location {
        Location::parse(raw).expect("valid location")
    }

    fn signed_in(role: &str) -> Session {
        Session::new("1", "ada", RoleClaim::from_raw(role)).with_token("abc")
    }

    fn hydrated(session: Option<Session>) -> RouteGuard<FixtureSessionStore> {
        let store = session.map_or_else(FixtureSessionStore::anonymous, FixtureSessionStore::with_session);
        let guard = RouteGuard::new(store);
        guard.hydrate();
        guard
    }

    #[rstest]
    #[case("/")]
    #[case("/login")]
    #[case("/unauthorized")]
    fn public_routes_render_without_session(#[case] path: &str) {
        let guard = hydrated(None);
        assert!(guard.evaluate(&at(path)).view().is_some());
    }

    #[rstest]
    #[case("admin", "/adminDashboard", Some(View::AdminDashboard))]
    #[case("doctor", "/adminDashboard", None)]
    #[case("therapist", "/reports/9/edit", None)]
    #[case("doctor", "/reports/9/edit", Some(View::ReportEdit))]
    #[case("user", "/reports", None)]
    #[case("user", "/chat", Some(View::Chat))]
    #[case("superuser", "/chat", None)]
    #[case("superuser", "/settings", Some(View::Settings))]
    fn role_gated_routes(#[case] role: &str, #[case] path: &str, #[case] view: Option<View>) {
        let outcome = hydrated(Some(signed_in(role))).evaluate(&at(path));
        match view {
            Some(view) => assert_eq!(outcome.view(), Some(view)),
            None => assert_eq!(outcome, GuardOutcome::RedirectToUnauthorized),
        }
    }

    #[test]
    fn missing_token_redirects_to_login_before_role_check() {
        let session = Session::new("1", "bob", Role::User);
        let outcome = hydrated(Some(session)).evaluate(&at("/adminDashboard"));
        assert_eq!(
            outcome,
            GuardOutcome::RedirectToLogin {
                from: at("/adminDashboard")
            }
        );
    }

    #[test]
    fn login_redirect_keeps_the_query() {
        let outcome = hydrated(None).evaluate(&at("/reports?status=open"));
        assert_eq!(
            outcome.redirect_target().map(|target| target.to_string()),
            Some("/login?from=%2Freports%3Fstatus%3Dopen".to_owned())
        );
    }

    #[test]
    fn unknown_paths_are_not_found() {
        assert_eq!(hydrated(None).evaluate(&at("/nope")), GuardOutcome::NotFound);
    }

    #[test]
    fn pending_until_hydrated() {
        let mut store = MockSessionStore::new();
        store.expect_get_session().times(1).returning(|| None);
        let guard = RouteGuard::new(store);
        assert_eq!(guard.evaluate(&at("/chat")), GuardOutcome::Pending);
        assert_eq!(guard.evaluate(&at("/")), GuardOutcome::Pending);
        assert!(!guard.is_hydrated());
        guard.hydrate();
        assert!(guard.is_hydrated());
    }

    #[test]
    fn every_evaluation_reads_the_store() {
        let mut store = MockSessionStore::new();
        store.expect_get_session().times(3).returning(|| None);
        let guard = RouteGuard::new(store);
        guard.hydrate();
        guard.evaluate(&at("/chat"));
        guard.evaluate(&at("/chat"));
    }

    #[rstest]
    #[case(None, "/chat")]
    #[case(None, "/login")]
    #[case(Some(signed_in("admin")), "/adminDashboard")]
    #[case(Some(signed_in("user")), "/reports")]
    #[case(Some(signed_in("therapist")), "/reports/4?tab=notes")]
    #[case(Some(signed_in("superuser")), "/machine")]
    #[case(Some(Session::new("1", "bob", Role::Doctor)), "/analysis")]
    #[case(Some(signed_in("doctor")), "/nope")]
    fn repeated_evaluations_agree(#[case] session: Option<Session>, #[case] path: &str) {
        let location = at(path);
        let table = RouteTable::application();
        let first = decide(&table, &location, session.as_ref());
        let guard = hydrated(session.clone());
        for _ in 0..3 {
            assert_eq!(decide(&table, &location, session.as_ref()), first);
            assert_eq!(guard.evaluate(&location), first);
        }
    }

    #[test]
    fn logout_is_seen_on_the_next_navigation() {
        let guard = hydrated(Some(signed_in("doctor")));
        assert_eq!(guard.evaluate(&at("/chat")).view(), Some(View::Chat));
        guard.store().clear_session().expect("clear");
        assert!(matches!(
            guard.evaluate(&at("/chat")),
            GuardOutcome::RedirectToLogin { .. }
        ));
    }

    #[test]
    fn render_carries_params() {
        let outcome = hydrated(Some(signed_in("therapist"))).evaluate(&at("/reports/r-17"));
        let GuardOutcome::Render { view, params } = outcome else {
            panic!("expected render");
        };
        assert_eq!(view, View::ReportDetail);
        assert_eq!(params.get("reportId"), Some("r-17"));
    }
}
