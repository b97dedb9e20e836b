//! `tpops connect` - the console runtime.
//!
//! One cooperative loop owns the terminal: it drains completed async work,
//! fires the search debounce, redraws, and polls for key events on a fixed
//! tick. Network calls run as spawned tasks that report back over a
//! channel; the loop itself never blocks on the backend.

use crate::api::ApiClient;
use crate::cli::ConnectArgs;
use crate::config::ConsoleConfig;
use crate::poller::{Poller, PollerEvent, RefreshSnapshot};
use crate::search::{SearchMode, SearchRequest, SearchResponse};
use crate::session::Session;
use crate::ui::app::{Action, AppState, DetailView, Overlay, UiMsg, View};
use crate::ui::{draw_ui, handle_key_event, restore_terminal, setup_terminal};
use anyhow::Context;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use crossterm::event::{self, Event};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type PollerHandle = (CancellationToken, JoinHandle<()>);

pub async fn run_connect(args: ConnectArgs) -> anyhow::Result<()> {
    let mut config = if args.config.exists() {
        ConsoleConfig::load(Some(&args.config))
            .with_context(|| format!("failed to load config {}", args.config.display()))?
    } else {
        ConsoleConfig::default()
    };
    config = config.with_env_overrides();
    if let Some(server) = args.server {
        config.server.base_url = server;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate().context("invalid configuration")?;

    let _log_guard = crate::logging::init_file_logging(&data_dir().join("logs"), &config.logging)
        .context("failed to initialize logging")?;

    let store_path = if args.ephemeral {
        None
    } else {
        Session::default_store_path()
    };
    let session = Arc::new(Session::new(store_path));
    let client = Arc::new(ApiClient::new(&config.server, session.clone()));

    run_console(config, session, client).await
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("tpops"))
        .unwrap_or_else(|| PathBuf::from(".tpops"))
}

async fn run_console(
    config: ConsoleConfig,
    session: Arc<Session>,
    client: Arc<ApiClient>,
) -> anyhow::Result<()> {
    let (msg_tx, mut msg_rx) = mpsc::channel::<UiMsg>(128);
    let (action_tx, mut action_rx) = mpsc::channel::<Action>(64);
    let mut auth_rx = session.subscribe();

    let mut terminal = setup_terminal()?;
    let mut app = AppState::new(&config);
    let mut poller: Option<PollerHandle> = None;

    // A restored session goes straight to the authenticated view; trust is
    // established by whether the first refresh succeeds.
    if let Some(identity) = session.identity() {
        app.login_succeeded(identity);
        poller = start_poller(&config, &client, &msg_tx);
    }

    let tick_rate = Duration::from_millis(100);
    let result = loop {
        // Forced session clears (401 on any call) surface here.
        if auth_rx.has_changed().unwrap_or(false) {
            let authenticated = *auth_rx.borrow_and_update();
            if !authenticated && app.view == View::Main {
                stop_poller(&mut poller);
                app.force_logout(Some("Session expired. Sign in again."));
            }
        }

        while let Ok(msg) = msg_rx.try_recv() {
            handle_msg(msg, &mut app, &session, &config, &client, &msg_tx, &mut poller);
        }

        while let Ok(action) = action_rx.try_recv() {
            dispatch_action(action, &session, &client, &msg_tx);
        }

        // Debounce window closed: issue exactly one call for the settled
        // (mode, text) pair.
        if let Some(request) = app.search.due(Instant::now()) {
            spawn_search(&client, &msg_tx, request);
        }

        terminal.draw(|frame| draw_ui(frame, &mut app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if handle_key_event(key, &mut app, &action_tx) {
                    break Ok(());
                }
            }
        }
    };

    stop_poller(&mut poller);
    restore_terminal(&mut terminal)?;
    result
}

#[allow(clippy::too_many_arguments)]
fn handle_msg(
    msg: UiMsg,
    app: &mut AppState,
    session: &Arc<Session>,
    config: &ConsoleConfig,
    client: &Arc<ApiClient>,
    msg_tx: &mpsc::Sender<UiMsg>,
    poller: &mut Option<PollerHandle>,
) {
    // Work completed for a previous identity must not mutate the login
    // view after a forced logout.
    if app.view != View::Main && !matches!(msg, UiMsg::Login(_)) {
        return;
    }
    match msg {
        UiMsg::Login(result) => match *result {
            Ok(auth) => {
                session.set(auth.access_token, auth.user.clone());
                app.login_succeeded(auth.user);
                if poller.is_none() {
                    *poller = start_poller(config, client, msg_tx);
                }
            }
            Err(e) => app.login_failed(e.to_string()),
        },
        UiMsg::Poller(PollerEvent::Snapshot(snapshot)) => app.apply_refresh(*snapshot),
        UiMsg::Poller(PollerEvent::Failed(message)) => app.banner = Some(message),
        UiMsg::Search { generation, result } => match result {
            Ok(response) => {
                app.search.apply_success(generation, response);
                app.search_selected = 0;
                app.clamp_selections();
            }
            // The session watch already drives the return to login.
            Err(e) if e.is_session_expired() => {}
            Err(e) => app.search.apply_error(generation, e.to_string()),
        },
        UiMsg::Perf(result) => {
            app.perf_loading = false;
            match result {
                Ok(rows) => {
                    app.perf.replace_snapshot(rows);
                    app.perf_loaded_once = true;
                    app.perf_error = None;
                    app.perf_selected = 0;
                    app.clamp_selections();
                }
                Err(e) if e.is_session_expired() => {}
                Err(e) => app.perf_error = Some(e.to_string()),
            }
        }
        UiMsg::Detail(result) => {
            app.detail_loading = false;
            match result {
                Ok(view) => {
                    app.overlay = Overlay::Detail(view);
                    app.detail_error = None;
                }
                Err(e) if e.is_session_expired() => {}
                Err(e) => app.detail_error = Some(e.to_string()),
            }
        }
        UiMsg::Export(result) => {
            app.exporting = false;
            match result {
                Ok(path) => app.export_notice = Some(format!("saved {}", path.display())),
                Err(message) => app.detail_error = Some(format!("export failed: {}", message)),
            }
        }
    }
}

fn dispatch_action(
    action: Action,
    session: &Arc<Session>,
    client: &Arc<ApiClient>,
    msg_tx: &mpsc::Sender<UiMsg>,
) {
    match action {
        Action::Login { username, password } => {
            let client = client.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let result = client.login(&username, &password).await;
                let _ = tx.send(UiMsg::Login(Box::new(result))).await;
            });
        }
        Action::Logout => session.clear(),
        Action::OpenProcess(name) => {
            let client = client.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let result = client.fetch_process(&name).await.map(DetailView::Process);
                let _ = tx.send(UiMsg::Detail(result)).await;
            });
        }
        Action::OpenService(name) => {
            let client = client.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let result = client.fetch_service(&name).await.map(DetailView::Service);
                let _ = tx.send(UiMsg::Detail(result)).await;
            });
        }
        Action::OpenNode(name) => {
            let client = client.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let result = client.fetch_node(&name).await.map(DetailView::Node);
                let _ = tx.send(UiMsg::Detail(result)).await;
            });
        }
        Action::OpenServerGroup(name) => {
            let client = client.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let result = client
                    .fetch_server_group(&name)
                    .await
                    .map(DetailView::ServerGroup);
                let _ = tx.send(UiMsg::Detail(result)).await;
            });
        }
        Action::OpenPerformance(service) => {
            let client = client.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let end = Utc::now();
                let start = end - ChronoDuration::hours(24);
                let result = client
                    .fetch_performance_detail(
                        &service,
                        &start.to_rfc3339_opts(SecondsFormat::Secs, true),
                        &end.to_rfc3339_opts(SecondsFormat::Secs, true),
                    )
                    .await
                    .map(|detail| DetailView::Performance {
                        service: service.clone(),
                        detail,
                    });
                let _ = tx.send(UiMsg::Detail(result)).await;
            });
        }
        Action::RefreshPerf => {
            let client = client.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let result = client.fetch_performance_summary().await;
                let _ = tx.send(UiMsg::Perf(result)).await;
            });
        }
        Action::Export(mode) => {
            let client = client.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let exported = match mode {
                    SearchMode::Process => client.export_processes_file().await,
                    SearchMode::Service => client.export_services_file().await,
                };
                let result = match exported {
                    Ok(file) => {
                        let path = PathBuf::from(&file.filename);
                        tokio::fs::write(&path, &file.bytes)
                            .await
                            .map(|_| path)
                            .map_err(|e| e.to_string())
                    }
                    Err(e) => Err(e.to_string()),
                };
                let _ = tx.send(UiMsg::Export(result)).await;
            });
        }
    }
}

fn spawn_search(client: &Arc<ApiClient>, msg_tx: &mpsc::Sender<UiMsg>, request: SearchRequest) {
    let client = client.clone();
    let tx = msg_tx.clone();
    tokio::spawn(async move {
        let result = match request.mode {
            SearchMode::Process => client
                .search_processes(Some(&request.query))
                .await
                .map(SearchResponse::Processes),
            SearchMode::Service => client
                .search_services(Some(&request.query))
                .await
                .map(SearchResponse::Services),
        };
        let _ = tx
            .send(UiMsg::Search {
                generation: request.generation,
                result,
            })
            .await;
    });
}

/// Start the background refresh; with refresh disabled, still load the
/// summary once so the header and domain tab have data.
fn start_poller(
    config: &ConsoleConfig,
    client: &Arc<ApiClient>,
    msg_tx: &mpsc::Sender<UiMsg>,
) -> Option<PollerHandle> {
    if !config.refresh.enabled {
        let client = client.clone();
        let tx = msg_tx.clone();
        tokio::spawn(async move {
            let config = client.fetch_config_summary().await;
            let gateways = client.fetch_gateways().await;
            let event = match (config, gateways) {
                (Ok(config), Ok(gateways)) => {
                    PollerEvent::Snapshot(Box::new(RefreshSnapshot { config, gateways }))
                }
                (Err(e), _) | (_, Err(e)) => PollerEvent::Failed(e.to_string()),
            };
            let _ = tx.send(UiMsg::Poller(event)).await;
        });
        return None;
    }

    let (poll_tx, mut poll_rx) = mpsc::channel::<PollerEvent>(8);
    let token = CancellationToken::new();
    let handle = Poller::new(
        client.clone(),
        Duration::from_secs(config.refresh.interval_seconds),
        poll_tx,
    )
    .start(token.clone());

    let tx = msg_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = poll_rx.recv().await {
            if tx.send(UiMsg::Poller(event)).await.is_err() {
                break;
            }
        }
    });

    Some((token, handle))
}

/// Tear the refresh task down; the token makes the shutdown deterministic.
fn stop_poller(poller: &mut Option<PollerHandle>) {
    if let Some((token, _handle)) = poller.take() {
        token.cancel();
    }
}
