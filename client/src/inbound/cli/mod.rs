//! Command-line driver for the session store, route guard, and category catalogue.
//!
//! Commands run against whatever port implementations they are given, so the
//! same [`App`] drives the Supabase adapters in the binary and the in-memory
//! fixtures in tests. Output goes to the supplied writer, as plain text or
//! JSON.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::ports::{
    AuthGateway, CategoryRepository, ConnectionProbe, ConnectionStatus, SignUpOutcome,
};
use crate::domain::routes::{Breadcrumb, breadcrumbs};
use crate::domain::{
    AppRoute, AuthFailure, BusinessId, BusinessKind, Category, CategoryCatalogue, CategoryId,
    DomainError, GuardDecision, ListenerStopped, NavigationTarget, SessionStore, guard,
};

/// How long a sign-in may take to become visible in the session store.
pub const SIGN_IN_WAIT: Duration = Duration::from_secs(10);

/// `storefront` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "storefront",
    about = "Session, navigation and category tooling for the storefront admin",
    version
)]
pub struct Cli {
    /// Emit JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,
    #[command(flatten)]
    pub login: LoginArgs,
    #[command(subcommand)]
    pub command: Command,
}

/// Optional credentials used to sign in before the command runs.
#[derive(Debug, Clone, Default, Args)]
pub struct LoginArgs {
    /// Account email.
    #[arg(long, global = true, requires = "password")]
    pub email: Option<String>,
    /// Account password.
    #[arg(long, global = true, requires = "email")]
    pub password: Option<String>,
}

/// Top-level commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Check that the service is configured and answering.
    CheckConnection,
    /// Show who is signed in.
    Whoami,
    /// Register a new account.
    SignUp {
        /// Email to register.
        #[arg(long)]
        new_email: String,
        /// Chosen password.
        #[arg(long)]
        new_password: String,
        /// Password typed again.
        #[arg(long)]
        confirm: String,
    },
    /// Email a password reset link.
    ResetPassword {
        /// Account email.
        address: String,
    },
    /// End the current session.
    SignOut,
    /// Show what the router does for `path` in the current session.
    Navigate {
        /// Requested path, query and fragment allowed.
        path: String,
    },
    /// Manage the categories of one business.
    Categories(CategoryArgs),
}

/// Category command arguments.
#[derive(Debug, Clone, Args)]
pub struct CategoryArgs {
    /// Owning business.
    #[arg(long, value_name = "uuid")]
    pub business: BusinessId,
    #[command(subcommand)]
    pub action: CategoryCommand,
}

/// Category operations.
#[derive(Debug, Clone, Subcommand)]
pub enum CategoryCommand {
    /// List all categories.
    List,
    /// List categories whose name contains `term`.
    Search {
        /// Case-insensitive name fragment.
        term: String,
    },
    /// Show one category.
    Get {
        /// Category id.
        id: CategoryId,
    },
    /// Create one category.
    Create {
        /// Category name.
        name: String,
        /// Optional description.
        #[arg(long)]
        description: Option<String>,
    },
    /// Change one category.
    Update {
        /// Category id.
        id: CategoryId,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New description.
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        /// Remove the description.
        #[arg(long)]
        clear_description: bool,
    },
    /// Delete one category.
    Delete {
        /// Category id.
        id: CategoryId,
    },
    /// Count categories.
    Count,
    /// Create the starter set for a kind of business.
    Defaults {
        /// restaurant, retail, service or general.
        #[arg(long, default_value_t = BusinessKind::General)]
        kind: BusinessKind,
    },
}

/// Failures reported to the user.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Sign-in, sign-up, sign-out or reset failed.
    #[error("{}", .0.user_message())]
    Auth(#[from] AuthFailure),
    /// The session store listener is gone.
    #[error(transparent)]
    Listener(#[from] ListenerStopped),
    /// Credentials were accepted but the session never appeared.
    #[error("sign-in was accepted but no session arrived within {0:?}")]
    SignInTimedOut(Duration),
    /// The command needs a signed-in user.
    #[error("sign in first: pass --email and --password")]
    SignInRequired,
    /// A category operation failed.
    #[error("{0}")]
    Category(DomainError),
    /// The service is not usable.
    #[error("connection check failed: {0}")]
    Connection(String),
    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
    /// Output could not be encoded.
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What a command produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    /// Connectivity check result.
    Connection {
        /// Probe outcome.
        status: ConnectionStatus,
    },
    /// Current principal.
    Identity {
        /// Signed-in email, when known.
        email: Option<String>,
        /// Signed-in account id.
        user_id: Option<String>,
    },
    /// An auth action completed.
    Done {
        /// Human-readable confirmation.
        message: String,
    },
    /// Router outcome for one path.
    Navigation {
        /// Guard outcome.
        decision: GuardDecision,
        /// Where the router goes next, if it redirects.
        redirect: Option<String>,
        /// Title of the resolved page.
        title: &'static str,
        /// Trail shown above the page.
        breadcrumbs: Vec<Breadcrumb>,
    },
    /// Category rows.
    Categories {
        /// Rows in display order.
        items: Vec<Category>,
    },
    /// One category.
    Category {
        /// The row.
        item: Category,
    },
    /// Category total.
    Count {
        /// Number of rows.
        total: u64,
    },
}

/// Bound set of ports one invocation runs against.
pub struct App<G, R, P> {
    store: SessionStore<G>,
    repository: Arc<R>,
    probe: P,
}

impl<G, R, P> App<G, R, P>
where
    G: AuthGateway + 'static,
    R: CategoryRepository + 'static,
    P: ConnectionProbe,
{
    /// Start the session store over `gateway`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(gateway: Arc<G>, repository: Arc<R>, probe: P) -> Self {
        Self {
            store: SessionStore::start(gateway),
            repository,
            probe,
        }
    }

    /// Session store driving this invocation.
    pub fn store(&self) -> &SessionStore<G> {
        &self.store
    }

    /// Run `cli` and write its report to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] when sign-in or the command fails, or when the
    /// report cannot be written.
    pub async fn run<W: Write>(&self, cli: &Cli, out: &mut W) -> Result<Report, CliError> {
        self.store.wait_until_initialized().await?;
        self.sign_in_if_requested(&cli.login).await?;
        let report = self.execute(&cli.command).await?;
        write_report(out, &report, cli.json)?;
        Ok(report)
    }

    /// Stop the session listener.
    pub async fn shutdown(self) {
        self.store.shutdown().await;
    }

    async fn sign_in_if_requested(&self, login: &LoginArgs) -> Result<(), CliError> {
        let (Some(email), Some(password)) = (&login.email, &login.password) else {
            return Ok(());
        };
        self.store.sign_in(email, password).await?;
        tokio::time::timeout(
            SIGN_IN_WAIT,
            self.store.wait_for(|state| state.is_authenticated()),
        )
        .await
        .map_err(|_| CliError::SignInTimedOut(SIGN_IN_WAIT))??;
        info!("signed in");
        Ok(())
    }

    async fn execute(&self, command: &Command) -> Result<Report, CliError> {
        match command {
            Command::CheckConnection => self.check_connection().await,
            Command::Whoami => Ok(self.identity()),
            Command::SignUp {
                new_email,
                new_password,
                confirm,
            } => {
                let outcome = self.store.sign_up(new_email, new_password, confirm).await?;
                let message = match outcome {
                    SignUpOutcome::ConfirmationPending => {
                        "Cuenta creada. Revisa tu email para confirmarla."
                    }
                    SignUpOutcome::SignedIn => "Cuenta creada. Sesión iniciada.",
                };
                Ok(done(message))
            }
            Command::ResetPassword { address } => {
                self.store.reset_password(address).await?;
                Ok(done("Te enviamos un email para restablecer tu contraseña."))
            }
            Command::SignOut => {
                self.store.sign_out().await?;
                Ok(done("Sesión cerrada."))
            }
            Command::Navigate { path } => Ok(self.navigate(path)),
            Command::Categories(args) => self.categories(args).await,
        }
    }

    async fn check_connection(&self) -> Result<Report, CliError> {
        let status = self.probe.check_connection().await;
        match status {
            ConnectionStatus::Unreachable { message } => Err(CliError::Connection(message)),
            status => Ok(Report::Connection { status }),
        }
    }

    fn identity(&self) -> Report {
        let principal = self.store.principal();
        Report::Identity {
            email: principal.as_ref().and_then(|p| p.email.clone()),
            user_id: principal.map(|p| p.id.to_string()),
        }
    }

    fn navigate(&self, path: &str) -> Report {
        let target = NavigationTarget::parse(path);
        let decision = guard(&self.store.current(), &target);
        debug!(path, ?decision, "navigation guarded");
        let landing = match &decision {
            GuardDecision::RedirectToLogin { .. } => AppRoute::Login,
            GuardDecision::RedirectToHome => AppRoute::Home,
            GuardDecision::Allow | GuardDecision::ShowLoading => target.route(),
        };
        let landing_path = landing.path().unwrap_or(target.requested());
        Report::Navigation {
            redirect: decision.redirect_path().map(str::to_owned),
            title: landing.title(),
            breadcrumbs: breadcrumbs(landing_path),
            decision,
        }
    }

    async fn categories(&self, args: &CategoryArgs) -> Result<Report, CliError> {
        let target = NavigationTarget::parse(AppRoute::Categories.path().unwrap_or_default());
        if matches!(
            guard(&self.store.current(), &target),
            GuardDecision::RedirectToLogin { .. }
        ) {
            return Err(CliError::SignInRequired);
        }

        let catalogue = CategoryCatalogue::new(Arc::clone(&self.repository), args.business);
        let report = match &args.action {
            CategoryCommand::List => {
                catalogue.load().await;
                listing(&catalogue)?
            }
            CategoryCommand::Search { term } => {
                catalogue.search(term).await;
                listing(&catalogue)?
            }
            CategoryCommand::Get { id } => {
                let item = self
                    .repository
                    .get(*id)
                    .await
                    .map_err(|error| CliError::Category(error.into()))?;
                Report::Category { item }
            }
            CategoryCommand::Create { name, description } => {
                let created = catalogue.create(name, description.as_deref()).await;
                settle(&catalogue, created)?
            }
            CategoryCommand::Update {
                id,
                name,
                description,
                clear_description,
            } => {
                let description = if *clear_description {
                    Some(None)
                } else {
                    description.as_deref().map(Some)
                };
                let updated = catalogue.update(*id, name.as_deref(), description).await;
                settle(&catalogue, updated)?
            }
            CategoryCommand::Delete { id } => {
                let deleted = catalogue.delete(*id).await;
                settle(&catalogue, deleted)?
            }
            CategoryCommand::Count => {
                let total = self
                    .repository
                    .count(args.business)
                    .await
                    .map_err(|error| CliError::Category(error.into()))?;
                Report::Count { total }
            }
            CategoryCommand::Defaults { kind } => {
                let created = catalogue.create_defaults(*kind).await;
                settle(&catalogue, created)?
            }
        };
        catalogue.unmount();
        Ok(report)
    }
}

fn done(message: &str) -> Report {
    Report::Done {
        message: message.to_owned(),
    }
}

fn listing<R>(catalogue: &CategoryCatalogue<R>) -> Result<Report, CliError>
where
    R: CategoryRepository + 'static,
{
    let snapshot = catalogue.snapshot();
    match snapshot.error {
        Some(error) => Err(CliError::Category(error)),
        None => Ok(Report::Categories {
            items: snapshot.categories,
        }),
    }
}

/// A mutation reloads on success; report the reloaded rows.
fn settle<R>(catalogue: &CategoryCatalogue<R>, succeeded: bool) -> Result<Report, CliError>
where
    R: CategoryRepository + 'static,
{
    if succeeded {
        return listing(catalogue);
    }
    let error = catalogue
        .snapshot()
        .error
        .unwrap_or_else(|| DomainError::service("operation failed"));
    Err(CliError::Category(error))
}

/// Render `report` as pretty JSON or as plain lines.
///
/// # Errors
///
/// Returns [`CliError::Output`] or [`CliError::Encode`] on write failures.
pub fn write_report<W: Write>(out: &mut W, report: &Report, json: bool) -> Result<(), CliError> {
    if json {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)?;
        return Ok(());
    }
    match report {
        Report::Connection { status } => match status {
            ConnectionStatus::Connected => writeln!(out, "connected")?,
            ConnectionStatus::NotConfigured => writeln!(out, "not configured")?,
            ConnectionStatus::Unreachable { message } => writeln!(out, "unreachable: {message}")?,
        },
        Report::Identity { email, user_id } => match (email, user_id) {
            (_, None) => writeln!(out, "anonymous")?,
            (email, Some(id)) => {
                writeln!(out, "{} ({id})", email.as_deref().unwrap_or("<no email>"))?;
            }
        },
        Report::Done { message } => writeln!(out, "{message}")?,
        Report::Navigation {
            decision,
            redirect,
            title,
            breadcrumbs,
        } => {
            match (decision, redirect) {
                (GuardDecision::RedirectToLogin { return_to }, Some(to)) => {
                    writeln!(out, "redirect {to} (return to {return_to})")?;
                }
                (_, Some(to)) => writeln!(out, "redirect {to}")?,
                (GuardDecision::ShowLoading, None) => writeln!(out, "loading")?,
                (_, None) => writeln!(out, "allow")?,
            }
            let trail: Vec<&str> = breadcrumbs.iter().map(|crumb| crumb.title).collect();
            writeln!(out, "{title}: {}", trail.join(" > "))?;
        }
        Report::Categories { items } => {
            for item in items {
                write_category(out, item)?;
            }
            writeln!(out, "{} categories", items.len())?;
        }
        Report::Category { item } => write_category(out, item)?,
        Report::Count { total } => writeln!(out, "{total}")?,
    }
    Ok(())
}

fn write_category<W: Write>(out: &mut W, item: &Category) -> std::io::Result<()> {
    match &item.description {
        Some(description) => writeln!(out, "{}\t{}\t{description}", item.id, item.name),
        None => writeln!(out, "{}\t{}", item.id, item.name),
    }
}

#[cfg(test)]
mod tests;
