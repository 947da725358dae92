use std::error::Error;
use std::io::IsTerminal;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[macro_use]
mod log;
mod render;

use cli::{parse_args, AuthAction, Cli, Commands};
use models::{GraphData, ScanId, ScanSession, ScanStatus, VulnerabilityType};
use workflow::{
    fetch_history, validate_url, AuthEvent, ConfigDir, EventBus, HttpBackend, PollUpdate, Report, ScanBackend,
    ScriptedBackend, SessionContext, Settings, StatusPoller, SubmissionGate, Subscription, WorkflowError,
};

type CliResult<T = ()> = std::result::Result<T, Box<dyn Error>>;

/// Token used for `--demo` runs when none is configured.
const DEMO_TOKEN: &str = "demo";

/// Output options shared by `scan` and `watch`.
struct Presentation {
    plain: bool,
    export: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("{e}");
        process::exit(1);
    }
}

async fn run() -> CliResult {
    let Cli { api_url, token, verbose, command } = parse_args();
    log::init_tracing(verbose);

    let dir = ConfigDir::init()?;
    let settings = || Settings::resolve(api_url.as_deref(), token.as_deref(), &dir);

    match command {
        Commands::Auth { action } => handle_auth_action(action, &dir, settings),

        Commands::Remediation { kind } => {
            for line in render::remediation_lines(&VulnerabilityType::from(kind.as_str())) {
                println!("{line}");
            }
            Ok(())
        }

        Commands::Show { file, plain } => {
            let report = Report::load(Path::new(&file))?;
            present(&report, plain)
        }

        Commands::History { page, size } => {
            let settings = settings()?;
            let backend = http_backend(&settings)?;
            let events = EventBus::new();
            let mut auth = events.subscribe();

            let result = fetch_history(backend.as_ref(), &events, settings.token.as_deref(), page, size).await;
            forget_expired_token(&mut auth, &dir);
            let listing = result?;

            if listing.items.is_empty() {
                info!("No scans on page {}", page);
            }
            for record in &listing.items {
                println!("{}", render::history_line(record));
            }
            info!("Page {} of {}", page + 1, listing.total_pages.max(1));
            Ok(())
        }

        Commands::Scan { url, interval, plain, export, demo } => {
            let mut settings = settings()?;
            settings.poll_interval = Duration::from_secs(interval);

            let (backend, token): (Arc<dyn ScanBackend>, Option<String>) = if demo {
                info!("Demo mode: no backend is contacted");
                let token = settings.token.clone().or_else(|| Some(DEMO_TOKEN.to_string()));
                (Arc::new(ScriptedBackend::demo()), token)
            } else {
                (http_backend(&settings)?, settings.token.clone())
            };

            let events = EventBus::new();
            let mut auth = events.subscribe();
            let outcome = scan(backend, &events, &settings, &url, token.as_deref()).await;
            forget_expired_token(&mut auth, &dir);
            conclude(outcome?, Presentation { plain, export })
        }

        Commands::Watch { id, url, interval, plain, export } => {
            let mut settings = settings()?;
            settings.poll_interval = Duration::from_secs(interval);
            let backend = http_backend(&settings)?;
            let token = settings.token.clone().ok_or(WorkflowError::AuthRequired)?;

            // Without --url the header shows the backend the scan lives on.
            let target = match url {
                Some(raw) => validate_url(&raw)?,
                None => settings.require_api_url()?.clone(),
            };
            let session = ScanSession::pending(ScanId::parse(&id), target);

            let events = EventBus::new();
            let mut auth = events.subscribe();
            let poller = StatusPoller::new(backend, events.clone()).with_interval(settings.poll_interval);
            let outcome = follow(&poller, session, &token).await;
            forget_expired_token(&mut auth, &dir);
            conclude(outcome?, Presentation { plain, export })
        }
    }
}

fn http_backend(settings: &Settings) -> CliResult<Arc<dyn ScanBackend>> {
    let backend = HttpBackend::new(settings.require_api_url()?.clone(), settings.timeout)?;
    tracing::debug!(api_url = %backend.base_url(), "using HTTP backend");
    Ok(Arc::new(backend))
}

/// Submit `url` and poll until the scan ends. `None` means the user stopped
/// watching.
async fn scan(
    backend: Arc<dyn ScanBackend>,
    events: &EventBus,
    settings: &Settings,
    url: &str,
    token: Option<&str>,
) -> workflow::Result<Option<SessionContext>> {
    let gate = SubmissionGate::new(backend.clone(), events.clone());
    let handle = gate.submit(url, token).await?;

    if handle.is_ready() {
        info!("The backend answered synchronously");
        return follow_ready(handle.into_session());
    }

    let poller = StatusPoller::new(backend, events.clone()).with_interval(settings.poll_interval);
    follow(&poller, handle.into_session(), token.unwrap_or_default()).await
}

fn follow_ready(session: ScanSession) -> workflow::Result<Option<SessionContext>> {
    let mut ctx = SessionContext::new();
    ctx.store(session);
    Ok(Some(ctx))
}

/// Drive `session` to a terminal state, printing progress as it goes.
/// Ctrl-C stops the poller and leaves the scan running on the backend.
async fn follow(poller: &StatusPoller, session: ScanSession, token: &str) -> workflow::Result<Option<SessionContext>> {
    let id = session.id().clone();
    info!("Watching scan {}, checking every {}s (Ctrl-C to stop)", id, poller.interval().as_secs());

    let mut handle = poller.watch(session, token);
    let cancel = handle.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut last: Option<ScanStatus> = None;
    while let Some(update) = handle.next().await {
        match update {
            PollUpdate::Progress { status, message } => {
                if last != Some(status) {
                    info!("Status: {status}");
                    last = Some(status);
                }
                info!("{message}");
            }
            PollUpdate::Finished(_) => break,
        }
    }
    interrupt.abort();

    let stopped = handle.is_cancelled() && !handle.is_finished();
    let session = handle.finish().await?;
    if stopped {
        warn!("Stopped watching scan {id}; it keeps running on the backend");
        info!("Resume with `siteward watch {id}`");
        return Ok(None);
    }
    follow_ready(session)
}

/// Report a finished scan, or fail with the backend's reason.
fn conclude(outcome: Option<SessionContext>, presentation: Presentation) -> CliResult {
    let Some(session) = outcome.as_ref().and_then(|ctx| ctx.resolve(&ScanId::Latest)) else {
        return Ok(());
    };

    if session.status() == ScanStatus::Failed {
        let reason = session.error_message().unwrap_or(models::DEFAULT_FAILURE_MESSAGE);
        return Err(WorkflowError::ScanFailed(reason.to_string()).into());
    }

    let report = Report::from_session(session.clone())?;
    success!("Scan completed: {} vulnerabilities found", report.session().vulnerabilities().len());

    if let Some(dir) = presentation.export.as_deref() {
        let path = report.export(Path::new(dir))?;
        success!("Report saved to {}", path.display());
    }

    present(&report, presentation.plain)
}

fn present(report: &Report, plain: bool) -> CliResult {
    if plain || !std::io::stdout().is_terminal() {
        for line in render::report_lines(report) {
            println!("{line}");
        }
        return Ok(());
    }

    let findings = report.ordered_findings().into_iter().cloned().collect();
    tui::run_report(GraphData::from_summary(report.summary()), report.session(), findings)?;
    Ok(())
}

/// A rejected token is removed so the next run asks for a fresh one.
fn forget_expired_token(auth: &mut Subscription, dir: &ConfigDir) {
    if !std::iter::from_fn(|| auth.try_next()).any(|e| e == AuthEvent::SessionExpired) {
        return;
    }
    tracing::warn!("backend rejected the token");
    match dir.clear_token() {
        Ok(true) => warn!("Session expired: the stored token was removed, set a new one with `siteward auth set-token`"),
        Ok(false) => warn!("Session expired: provide a valid token with --token or SITEWARD_TOKEN"),
        Err(e) => error!("Could not remove the stored token: {e}"),
    }
}

/// Handle `siteward auth <action>`.
///
/// Settings are only resolved for `status`, so a broken stored URL can still
/// be replaced.
fn handle_auth_action(
    action: AuthAction,
    dir: &ConfigDir,
    settings: impl FnOnce() -> workflow::Result<Settings>,
) -> CliResult {
    match action {
        AuthAction::SetToken { token } => {
            if token.trim().is_empty() {
                return Err(WorkflowError::AuthRequired.into());
            }
            dir.store_token(&token)?;
            success!("Token stored in {}", dir.root().display());
        }
        AuthAction::SetUrl { url } => {
            let url = dir.store_api_url(&url)?;
            success!("API URL set to {url}");
        }
        AuthAction::Clear => {
            if dir.clear_token()? {
                success!("Stored token removed");
            } else {
                info!("No stored token");
            }
        }
        AuthAction::Status => {
            let settings = settings()?;
            info!("Config directory: {}", dir.root().display());
            match &settings.api_url {
                Some(url) => info!("API URL: {url}"),
                None => warn!("No API URL configured"),
            }
            match &settings.token {
                Some(token) => info!("Token: set ({} characters)", token.len()),
                None => warn!("No token configured"),
            }
        }
    }
    Ok(())
}
