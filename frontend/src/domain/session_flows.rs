//! Session lifecycle: login, logout, profile edits and forced sign-out.

use tracing::{info, warn};

use super::auth::AuthResponse;
use super::error::Error;
use super::location::Location;
use super::permissions::has_role;
use super::ports::SessionStore;
use super::role::{Role, RoleClaim};
use super::session::{ProfileUpdate, Session};

/// Landing page for administrators without a resume target.
pub const ADMIN_LANDING: &str = "/adminDashboard";
/// Landing page for everyone else without a resume target.
pub const DEFAULT_LANDING: &str = "/chat";

/// Where to go after a successful login.
///
/// A `from` location is honoured unless it points back at the login or
/// access-denied views.
///
/// # Examples
/// ```
/// use frontend::domain::{Location, Role, RoleClaim, post_login_destination};
///
/// let admin = RoleClaim::from(Role::Admin);
/// assert_eq!(post_login_destination(None, &admin).path(), "/adminDashboard");
///
/// let from = Location::parse("/reports/7").unwrap();
/// assert_eq!(post_login_destination(Some(&from), &admin), from);
/// ```
pub fn post_login_destination(from: Option<&Location>, role: &RoleClaim) -> Location {
    if let Some(from) = from.filter(|from| !from.is_auth_view()) {
        return from.clone();
    }
    let landing = if has_role(Some(role), Role::Admin) {
        ADMIN_LANDING
    } else {
        DEFAULT_LANDING
    };
    Location::parse(landing).unwrap_or_else(|_| Location::home())
}

/// Persist the session from an auth response and pick the next location.
///
/// Responses without a token are rejected; storing them would leave the
/// user signed out on the next navigation.
pub fn complete_login<S: SessionStore>(
    store: &S,
    response: AuthResponse,
    from: Option<&Location>,
) -> Result<Location, Error> {
    let session = response.into_session();
    if !session.is_authenticated() {
        return Err(Error::unauthorized("authentication response carried no token"));
    }
    store
        .set_session(&session)
        .map_err(|error| Error::internal(format!("could not store session: {error}")))?;
    info!(user = session.username(), role = %session.role(), "signed in");
    Ok(post_login_destination(from, session.role()))
}

/// Clear the session and return the login location.
///
/// A failed clear is logged; the user is still sent to login.
pub fn logout<S: SessionStore>(store: &S) -> Location {
    match store.clear_session() {
        Ok(()) => info!("signed out"),
        Err(error) => warn!(%error, "failed to clear session on logout"),
    }
    Location::login()
}

/// Merge a profile update into the stored session.
pub fn apply_profile_update<S: SessionStore>(
    store: &S,
    update: &ProfileUpdate,
) -> Result<Session, Error> {
    let Some(current) = store.get_session() else {
        return Err(Error::unauthorized("no active session"));
    };
    let updated = current.with_profile(update);
    store
        .set_session(&updated)
        .map_err(|error| Error::internal(format!("could not store session: {error}")))?;
    Ok(updated)
}

/// React to the backend rejecting the session token.
pub fn handle_auth_failure<S: SessionStore>(store: &S) -> Location {
    if let Err(error) = store.clear_session() {
        warn!(%error, "failed to clear rejected session");
    } else {
        info!("session rejected by backend; signed out");
    }
    Location::login()
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{FixtureSessionStore, MockSessionStore, SessionStoreError};
    use rstest::rstest;

    fn response(role: &str, token: Option<&str>) -> AuthResponse {
        AuthResponse {
            id: "1".to_owned(),
            username: "ada".to_owned(),
            email: None,
            role: RoleClaim::from_raw(role),
            token: token.map(str::to_owned),
        }
    }

    #[rstest]
    #[case(None, "admin", "/adminDashboard")]
    #[case(None, "doctor", "/chat")]
    #[case(None, "superuser", "/chat")]
    #[case(Some("/reports?status=open"), "therapist", "/reports?status=open")]
    #[case(Some("/login"), "user", "/chat")]
    #[case(Some("/Unauthorized"), "admin", "/adminDashboard")]
    fn destination_after_login(
        #[case] from: Option<&str>,
        #[case] role: &str,
        #[case] expected: &str,
    ) {
        let from = from.map(|raw| Location::parse(raw).expect("valid location"));
        let target = post_login_destination(from.as_ref(), &RoleClaim::from_raw(role));
        assert_eq!(target.to_string(), expected);
    }

    #[test]
    fn login_stores_the_session() {
        let store = FixtureSessionStore::anonymous();
        let target = complete_login(&store, response("doctor", Some("abc")), None).expect("login");
        assert_eq!(target.path(), "/chat");
        assert!(store.is_authenticated());
    }

    #[test]
    fn login_without_token_is_rejected() {
        let store = FixtureSessionStore::anonymous();
        let error = complete_login(&store, response("doctor", None), None).expect_err("no token");
        assert_eq!(error.code(), ErrorCode::Unauthorized);
        assert!(store.get_session().is_none());
    }

    #[test]
    fn login_storage_failure_is_internal() {
        let mut store = MockSessionStore::new();
        store
            .expect_set_session()
            .returning(|_| Err(SessionStoreError::storage("quota exceeded")));
        let error = complete_login(&store, response("admin", Some("t")), None).expect_err("fails");
        assert_eq!(error.code(), ErrorCode::InternalError);
    }

    #[test]
    fn logout_goes_to_login_even_when_clear_fails() {
        let mut store = MockSessionStore::new();
        store
            .expect_clear_session()
            .times(1)
            .returning(|| Err(SessionStoreError::storage("locked")));
        assert_eq!(logout(&store), Location::login());
    }

    #[test]
    fn logout_clears_the_session() {
        let store =
            FixtureSessionStore::with_session(Session::new("1", "ada", Role::User).with_token("t"));
        assert_eq!(logout(&store), Location::login());
        assert!(store.get_session().is_none());
    }

    #[test]
    fn profile_update_merges_into_stored_session() {
        let store = FixtureSessionStore::with_session(
            Session::new("1", "ada", Role::Therapist).with_token("t"),
        );
        let update = ProfileUpdate {
            username: None,
            email: Some("ada@example.org".to_owned()),
        };
        let updated = apply_profile_update(&store, &update).expect("update");
        assert_eq!(updated.email(), "ada@example.org");
        assert_eq!(store.get_session(), Some(updated));
        assert!(store.is_authenticated());
    }

    #[test]
    fn profile_update_without_session_is_unauthorized() {
        let store = FixtureSessionStore::anonymous();
        let error = apply_profile_update(&store, &ProfileUpdate::default()).expect_err("no session");
        assert_eq!(error.code(), ErrorCode::Unauthorized);
    }

    #[test]
    fn auth_failure_signs_out() {
        let store =
            FixtureSessionStore::with_session(Session::new("1", "ada", Role::Admin).with_token("t"));
        assert_eq!(handle_auth_failure(&store), Location::login());
        assert!(!store.is_authenticated());
    }
}
