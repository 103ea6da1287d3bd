//! Application root for the nocli-auth front-end.
//!
//! Owns the configuration and the one `AuthSession` for the process, and maps
//! each command onto a session operation.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use nocli_auth_core::auth::{self, AuthSession, FileTokenStore, SessionState, SessionStatus};
use nocli_auth_core::{ApiClient, Config};

use crate::commands::{Command, USAGE};

pub struct App {
    pub config: Config,
    pub session: Arc<AuthSession>,
}

impl App {
    /// Build the session and start its initialization in the background.
    pub fn new(config: Config) -> Result<Self> {
        let base_url = config.api_base_url();
        let data_dir = config.data_dir();
        debug!(%base_url, data_dir = %data_dir.display(), "Config resolved");

        let api = ApiClient::new(base_url).context("Failed to build HTTP client")?;
        let store = Arc::new(FileTokenStore::new(&data_dir, config.storage_key()?));
        let session = AuthSession::start(api, store);

        Ok(Self { config, session })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Help => {
                println!("{}", USAGE);
                Ok(())
            }
            Command::Status => self.status().await,
            Command::Login { username } => self.login(username).await,
            Command::Setup { username } => self.setup(username).await,
            Command::Logout => self.logout().await,
            Command::Token => self.token().await,
            Command::Health => self.health().await,
        }
    }

    async fn status(&self) -> Result<()> {
        let state = self.session.ready().await;
        print_state(&state);
        Ok(())
    }

    async fn login(&mut self, username: Option<String>) -> Result<()> {
        let state = self.session.ready().await;
        check_can_login(state.status())?;

        let username = match username {
            Some(u) => u,
            None => prompt_username(self.config.last_username.as_deref())?,
        };
        let password = rpassword::prompt_password("Password: ")?;

        println!("Authenticating...");
        self.session
            .login_with_password(&username, &password)
            .await
            .context("Login failed")?;

        self.remember_username(username);
        println!("Login successful");
        Ok(())
    }

    async fn setup(&mut self, username: Option<String>) -> Result<()> {
        let state = self.session.ready().await;
        check_can_setup(state.status())?;

        let username = match username {
            Some(u) => u,
            None => prompt_username(None)?,
        };
        let password = rpassword::prompt_password("New password: ")?;
        let confirm = rpassword::prompt_password("Confirm password: ")?;
        check_new_credentials(&username, &password, &confirm)?;

        println!("Creating admin account...");
        self.session
            .setup_and_login(&username, &password)
            .await
            .context("Setup failed")?;

        self.remember_username(username);
        println!("Admin account created and logged in");
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        settle_and_logout(&self.session).await;
        println!("Logged out");
        Ok(())
    }

    async fn token(&self) -> Result<()> {
        let state = self.session.ready().await;
        match state.token() {
            Some(token) => {
                println!("{}", token);
                Ok(())
            }
            None => bail!("Not logged in"),
        }
    }

    async fn health(&self) -> Result<()> {
        self.session.ready().await;
        let client = auth::current().api();
        let health = client
            .health()
            .await
            .with_context(|| format!("Could not reach {}", client.base_url()))?;

        match health.error {
            Some(ref error) => println!("{} ({})", health.status, error),
            None => println!("{}", health.status),
        }
        if !health.is_ok() {
            bail!("Server is {}", health.status);
        }
        Ok(())
    }

    fn remember_username(&mut self, username: String) {
        self.config.last_username = Some(username);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }
}

/// Login makes no sense before the first admin exists.
fn check_can_login(status: SessionStatus) -> Result<()> {
    if status == SessionStatus::SetupRequired {
        bail!("No admin account exists yet; run `nocli-auth setup` first");
    }
    Ok(())
}

fn check_can_setup(status: SessionStatus) -> Result<()> {
    if status == SessionStatus::Authenticated {
        bail!("Already logged in; run `nocli-auth logout` first");
    }
    Ok(())
}

fn check_new_credentials(username: &str, password: &str, confirm: &str) -> Result<()> {
    if username.is_empty() {
        bail!("Username required");
    }
    if password != confirm {
        bail!("Passwords do not match");
    }
    if password.is_empty() {
        bail!("Password required");
    }
    Ok(())
}

/// Wait for initialization before clearing, so it cannot restore the stored
/// token afterwards.
async fn settle_and_logout(session: &AuthSession) {
    session.ready().await;
    session.logout();
}

fn print_state(state: &SessionState) {
    let base_url = auth::current().api().base_url().to_string();
    println!("Server: {}", base_url);
    println!("Status: {}", state.status());
    match state.status() {
        SessionStatus::SetupRequired => println!("No admin account yet; run `nocli-auth setup`"),
        SessionStatus::Unauthenticated => println!("Run `nocli-auth login` to sign in"),
        _ => {}
    }
}

fn prompt_username(default: Option<&str>) -> Result<String> {
    match default {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    match default {
        Some(last) if input.is_empty() => Ok(last.to_string()),
        _ => Ok(input.to_string()),
    }
}
