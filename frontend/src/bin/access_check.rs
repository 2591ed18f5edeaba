//! Inspect the client's access decisions from the command line.
//!
//! Reads the same session record the web client would, using a directory of
//! files in place of `localStorage`, and prints JSON to stdout. Failures are
//! printed to stderr as a JSON [`Error`](frontend::domain::Error).
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::ffi::OsString;
    use std::io::{self, Write};
    use std::process::ExitCode;

    use clap::{Parser, Subcommand, ValueEnum};
    use frontend::config::ClientSettings;
    use frontend::domain::ports::SessionStore;
    use frontend::domain::{
        Capability, Error, Location, LoginCredentials, MenuEntry, MenuKind, NavigationProvider,
        Role, RoleClaim, RouteGuard, RouteTable, StoredSessionStore, capabilities_for, logout,
        visible_for_role,
    };
    use frontend::outbound::api::HttpBackendClient;
    use frontend::outbound::storage::DirKeyValueStore;
    use ortho_config::OrthoConfig;
    use serde_json::{Value, json};
    use tokio::runtime::Builder;
    use tracing::warn;
    use tracing_subscriber::{EnvFilter, fmt};

    type Store = StoredSessionStore<DirKeyValueStore>;

    /// `access-check` command arguments.
    #[derive(Debug, Parser)]
    #[command(
        name = "access-check",
        about = "Inspect role permissions, menus and route decisions",
        version
    )]
    struct CliArgs {
        #[command(subcommand)]
        command: Command,
    }

    #[derive(Debug, Subcommand)]
    enum Command {
        /// Print the permission matrix and the route table.
        Matrix,
        /// Print a menu as seen by a role or by the stored session.
        Menu {
            /// Menu to print.
            #[arg(value_enum, default_value_t = MenuArg::Sidebar)]
            menu: MenuArg,
            /// Evaluate for this role instead of the stored session.
            #[arg(long)]
            role: Option<String>,
        },
        /// Evaluate a navigation against the stored session.
        Guard {
            /// Location such as `/reports/42?tab=summary`.
            location: String,
        },
        /// Print the stored session.
        Whoami,
        /// Sign in against the backend and store the session.
        Login {
            /// Account name.
            #[arg(long)]
            username: String,
            /// Account password.
            #[arg(long)]
            password: String,
            /// Location to resume after login.
            #[arg(long)]
            from: Option<String>,
        },
        /// Clear the stored session.
        Logout,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    enum MenuArg {
        Sidebar,
        SettingsTabs,
        ReportActions,
        MachineActions,
    }

    impl From<MenuArg> for MenuKind {
        fn from(value: MenuArg) -> Self {
            match value {
                MenuArg::Sidebar => Self::Sidebar,
                MenuArg::SettingsTabs => Self::SettingsTabs,
                MenuArg::ReportActions => Self::ReportActions,
                MenuArg::MachineActions => Self::MachineActions,
            }
        }
    }

    pub fn main() -> ExitCode {
        if let Err(e) = fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .json()
            .with_writer(io::stderr)
            .try_init()
        {
            warn!(error = %e, "tracing init failed");
        }

        // Help, version and usage errors are reported by clap itself.
        let args = CliArgs::parse();
        match run(args) {
            Ok(output) => {
                write_line(io::stdout().lock(), &output);
                ExitCode::SUCCESS
            }
            Err(error) => {
                write_line(io::stderr().lock(), &error_json(&error));
                ExitCode::FAILURE
            }
        }
    }

    fn write_line(mut out: impl Write, message: &str) {
        if let Err(err) = writeln!(out, "{message}") {
            drop(err);
        }
    }

    fn error_json(error: &Error) -> String {
        serde_json::to_string(error).unwrap_or_else(|_| error.to_string())
    }

    fn run(args: CliArgs) -> Result<String, Error> {
        let settings = ClientSettings::load_from_iter([OsString::from("access-check")])
            .map_err(|error| Error::internal(format!("load configuration: {error}")))?;
        let value = execute(args.command, &settings)?;
        serde_json::to_string_pretty(&value).map_err(|error| Error::internal(error.to_string()))
    }

    fn open_store(settings: &ClientSettings) -> Result<Store, Error> {
        let storage = DirKeyValueStore::open(&settings.storage_dir())
            .map_err(|error| Error::internal(format!("open session storage: {error}")))?;
        Ok(StoredSessionStore::with_key(storage, settings.session_key()))
    }

    fn execute(command: Command, settings: &ClientSettings) -> Result<Value, Error> {
        match command {
            Command::Matrix => Ok(matrix()),
            Command::Menu { menu, role: Some(role) } => Ok(menu_json(
                menu.into(),
                visible_for_role(MenuKind::from(menu).entries(), Some(&RoleClaim::from_raw(role)))
                    .into_iter()
                    .copied()
                    .collect(),
            )),
            Command::Menu { menu, role: None } => {
                let provider = NavigationProvider::new(open_store(settings)?);
                Ok(menu_json(menu.into(), provider.menu(menu.into())))
            }
            Command::Guard { location } => {
                let location = Location::parse(&location)?;
                Ok(guard(open_store(settings)?, &location))
            }
            Command::Whoami => Ok(whoami(&open_store(settings)?)),
            Command::Login {
                username,
                password,
                from,
            } => login(settings, &username, &password, from.as_deref()),
            Command::Logout => {
                let redirect = logout(&open_store(settings)?);
                Ok(json!({ "redirect": redirect }))
            }
        }
    }

    fn matrix() -> Value {
        let roles: serde_json::Map<String, Value> = Role::ALL
            .into_iter()
            .map(|role| {
                let caps = capabilities_for(Some(&RoleClaim::from(role)));
                (role.as_str().to_owned(), json!(caps))
            })
            .collect();
        let capabilities: Vec<Value> = Capability::ALL
            .into_iter()
            .map(|capability| json!({ "capability": capability, "grantedTo": capability.granted_to() }))
            .collect();
        json!({
            "roles": roles,
            "capabilities": capabilities,
            "routes": RouteTable::application().routes(),
        })
    }

    fn menu_json(kind: MenuKind, entries: Vec<MenuEntry>) -> Value {
        json!({ "menu": kind, "entries": entries })
    }

    fn guard(store: Store, location: &Location) -> Value {
        let guard = RouteGuard::new(store);
        guard.hydrate();
        let outcome = guard.evaluate(location);
        let redirect = outcome.redirect_target();
        json!({
            "location": location,
            "decision": outcome,
            "redirect": redirect,
        })
    }

    fn whoami(store: &impl SessionStore) -> Value {
        match store.get_session() {
            Some(session) => json!({
                "id": session.id(),
                "username": session.username(),
                "email": session.email(),
                "role": session.role(),
                "recognizedRole": session.role().known().is_some(),
                "authenticated": session.is_authenticated(),
                "capabilities": capabilities_for(Some(session.role())),
            }),
            None => json!({ "authenticated": false }),
        }
    }

    fn login(
        settings: &ClientSettings,
        username: &str,
        password: &str,
        from: Option<&str>,
    ) -> Result<Value, Error> {
        let credentials = LoginCredentials::try_from_parts(username, password)?;
        let from = from.map(Location::parse).transpose()?;
        let client = HttpBackendClient::from_settings(settings, open_store(settings)?)?;

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| Error::internal(format!("create Tokio runtime: {error}")))?;
        let redirect = runtime.block_on(client.sign_in(&credentials, from.as_ref()))?;
        Ok(json!({ "redirect": redirect }))
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    native::main()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
