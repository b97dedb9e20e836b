use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;
use tokio::sync::mpsc;

use super::app::{Action, AppState, DetailView, DomainPane, LoginField, Overlay, View};
use crate::policy::Tab;
use crate::search::SearchMode;

/// Dispatch one key event. Returns true when the console should exit.
pub(crate) fn handle_key_event(
    key: KeyEvent,
    app: &mut AppState,
    actions: &mpsc::Sender<Action>,
) -> bool {
    if app.confirm_quit {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => return true,
            _ => {
                app.confirm_quit = false;
                return false;
            }
        }
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.confirm_quit = true;
        return false;
    }

    if app.view == View::Login {
        handle_login_key(key, app, actions);
        return false;
    }

    match &app.overlay {
        Overlay::ExportConfirm => {
            handle_export_confirm_key(key, app, actions);
            return false;
        }
        Overlay::Detail(_) => {
            handle_detail_key(key, app, actions);
            return false;
        }
        Overlay::None => {}
    }

    handle_main_key(key, app, actions);
    false
}

fn handle_login_key(key: KeyEvent, app: &mut AppState, actions: &mpsc::Sender<Action>) {
    match key.code {
        KeyCode::Tab | KeyCode::Down | KeyCode::Up => {
            app.login.focus = match app.login.focus {
                LoginField::Username => LoginField::Password,
                LoginField::Password => LoginField::Username,
            };
        }
        KeyCode::Backspace => {
            match app.login.focus {
                LoginField::Username => app.login.username.pop(),
                LoginField::Password => app.login.password.pop(),
            };
        }
        KeyCode::Enter => {
            if !app.login.submitting
                && !app.login.username.is_empty()
                && !app.login.password.is_empty()
            {
                app.login.submitting = true;
                app.login.error = None;
                let _ = actions.try_send(Action::Login {
                    username: app.login.username.clone(),
                    password: app.login.password.clone(),
                });
            }
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            match app.login.focus {
                LoginField::Username => app.login.username.push(c),
                LoginField::Password => app.login.password.push(c),
            }
        }
        _ => {}
    }
}

fn handle_export_confirm_key(key: KeyEvent, app: &mut AppState, actions: &mpsc::Sender<Action>) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            app.overlay = Overlay::None;
            app.exporting = true;
            app.export_notice = None;
            let _ = actions.try_send(Action::Export(app.search.mode()));
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.overlay = Overlay::None;
        }
        _ => {}
    }
}

fn handle_detail_key(key: KeyEvent, app: &mut AppState, actions: &mpsc::Sender<Action>) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Enter => {
            // A service detail jumps to its owning process: switch the
            // active view, then fetch the process detail.
            if let Overlay::Detail(DetailView::Service(service)) = &app.overlay {
                let owner = service.server_name.clone();
                if !owner.is_empty() {
                    app.overlay = Overlay::None;
                    app.select_tab(Tab::Processes);
                    app.search.set_mode(SearchMode::Process);
                    app.detail_loading = true;
                    app.detail_error = None;
                    let _ = actions.try_send(Action::OpenProcess(owner));
                }
            }
        }
        _ => {}
    }
}

fn handle_main_key(key: KeyEvent, app: &mut AppState, actions: &mpsc::Sender<Action>) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let now = Instant::now();

    match key.code {
        KeyCode::Char('l') if ctrl => {
            let _ = actions.try_send(Action::Logout);
        }
        KeyCode::Char('e') if ctrl => {
            if app.capabilities().can_export
                && matches!(app.active_tab, Tab::Processes | Tab::Services)
                && !app.exporting
            {
                app.overlay = Overlay::ExportConfirm;
            }
        }
        KeyCode::Char('r') if ctrl => {
            if app.active_tab == Tab::ResponseTime && !app.perf_loading {
                app.perf_loading = true;
                app.perf_error = None;
                let _ = actions.try_send(Action::RefreshPerf);
            }
        }
        KeyCode::Char('a') if ctrl => {
            if app.active_tab == Tab::ResponseTime {
                app.perf.toggle_sort(crate::perf::SortKey::AvgTime);
                app.clamp_selections();
            }
        }
        KeyCode::Char('m') if ctrl => {
            if app.active_tab == Tab::ResponseTime {
                app.perf.toggle_sort(crate::perf::SortKey::MaxTime);
                app.clamp_selections();
            }
        }
        KeyCode::Char('n') if ctrl => {
            if app.active_tab == Tab::ResponseTime {
                app.perf.toggle_sort(crate::perf::SortKey::Count);
                app.clamp_selections();
            }
        }
        KeyCode::Left => {
            app.prev_tab();
            after_tab_change(app, actions);
        }
        KeyCode::Right => {
            app.next_tab();
            after_tab_change(app, actions);
        }
        KeyCode::Up => app.select_prev(),
        KeyCode::Down => app.select_next(),
        KeyCode::Tab => {
            if app.active_tab == Tab::DomainConfig {
                app.domain_pane = match app.domain_pane {
                    DomainPane::Nodes => DomainPane::Groups,
                    DomainPane::Groups => DomainPane::Nodes,
                };
                app.sync_selections();
            }
        }
        KeyCode::Enter => open_selected(app, actions),
        KeyCode::Backspace => match app.active_tab {
            Tab::Processes | Tab::Services => {
                app.search.pop_char(now);
                app.search_selected = 0;
                app.sync_selections();
            }
            Tab::ResponseTime => {
                app.perf.pop_filter_char();
                app.clamp_selections();
            }
            _ => {}
        },
        KeyCode::Esc => match app.active_tab {
            Tab::Processes | Tab::Services => {
                app.search.set_query("", now);
                app.search_selected = 0;
                app.sync_selections();
            }
            Tab::ResponseTime => {
                app.perf.clear_filter();
                app.clamp_selections();
            }
            _ => {}
        },
        KeyCode::Char(c) if !ctrl => match app.active_tab {
            Tab::Processes | Tab::Services => {
                app.search.push_char(c, now);
                app.search_selected = 0;
                app.sync_selections();
            }
            Tab::ResponseTime => {
                app.perf.push_filter_char(c);
                app.perf_selected = 0;
                app.clamp_selections();
            }
            _ => {}
        },
        _ => {}
    }
}

/// Keep the search engine's mode in lockstep with the active tab and
/// lazy-load the telemetry snapshot the first time its tab opens.
fn after_tab_change(app: &mut AppState, actions: &mpsc::Sender<Action>) {
    match app.active_tab {
        Tab::Processes => app.search.set_mode(SearchMode::Process),
        Tab::Services => app.search.set_mode(SearchMode::Service),
        Tab::ResponseTime => {
            if !app.perf_loaded_once && !app.perf_loading {
                app.perf_loading = true;
                let _ = actions.try_send(Action::RefreshPerf);
            }
        }
        _ => {}
    }
    app.search_selected = 0;
    app.sync_selections();
}

fn open_selected(app: &mut AppState, actions: &mpsc::Sender<Action>) {
    let action = match app.active_tab {
        Tab::Processes => app.selected_search_name().map(Action::OpenProcess),
        Tab::Services => app.selected_search_name().map(Action::OpenService),
        Tab::ResponseTime => app.selected_perf_service().map(Action::OpenPerformance),
        Tab::DomainConfig => match app.domain_pane {
            DomainPane::Nodes => app.selected_node().map(Action::OpenNode),
            DomainPane::Groups => app.selected_group().map(Action::OpenServerGroup),
        },
        Tab::Gateways => None,
    };
    if let Some(action) = action {
        app.detail_loading = true;
        app.detail_error = None;
        let _ = actions.try_send(action);
    }
}
