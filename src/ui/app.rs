use crate::api::types::{
    AuthResponse, DomainSummary, Gateway, NodeInfo, PerformanceDetail, ProcessDetail,
    ServerGroupInfo, ServiceDetail,
};
use crate::api::ApiError;
use crate::config::ConsoleConfig;
use crate::perf::{PerfTable, ServicePerformance};
use crate::policy::{self, Capabilities, Tab};
use crate::poller::{PollerEvent, RefreshSnapshot};
use crate::search::{SearchEngine, SearchMode, SearchResponse};
use crate::session::Identity;
use ratatui::widgets::{ListState, TableState};
use std::path::PathBuf;
use std::time::Duration;

/// Which top-level surface is showing.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum View {
    #[default]
    Login,
    Main,
}

#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum LoginField {
    #[default]
    Username,
    Password,
}

#[derive(Default)]
pub(crate) struct LoginForm {
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) focus: LoginField,
    pub(crate) error: Option<String>,
    pub(crate) submitting: bool,
}

/// Fetched detail shown in the overlay pane.
pub(crate) enum DetailView {
    Process(ProcessDetail),
    Service(ServiceDetail),
    Node(NodeInfo),
    ServerGroup(ServerGroupInfo),
    Performance {
        service: String,
        detail: PerformanceDetail,
    },
}

pub(crate) enum Overlay {
    None,
    Detail(DetailView),
    ExportConfirm,
}

/// Pane focus inside the domain-config tab.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum DomainPane {
    #[default]
    Nodes,
    Groups,
}

/// Requests the input layer hands to the console runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    Login { username: String, password: String },
    Logout,
    OpenProcess(String),
    OpenService(String),
    OpenNode(String),
    OpenServerGroup(String),
    OpenPerformance(String),
    RefreshPerf,
    Export(SearchMode),
}

/// Completed async work delivered back to the console runtime.
pub(crate) enum UiMsg {
    Poller(PollerEvent),
    Search {
        generation: u64,
        result: Result<SearchResponse, ApiError>,
    },
    Perf(Result<Vec<ServicePerformance>, ApiError>),
    Detail(Result<DetailView, ApiError>),
    Login(Box<Result<AuthResponse, ApiError>>),
    /// Path the payload was written to, or a displayable failure message.
    Export(Result<PathBuf, String>),
}

pub(crate) struct AppState {
    pub(crate) view: View,
    pub(crate) login: LoginForm,
    pub(crate) identity: Option<Identity>,
    pub(crate) active_tab: Tab,
    pub(crate) summary: Option<DomainSummary>,
    pub(crate) last_update: String,
    pub(crate) gateways: Vec<Gateway>,
    /// Scoped banner for background-refresh failures.
    pub(crate) banner: Option<String>,
    pub(crate) search: SearchEngine,
    pub(crate) search_selected: usize,
    pub(crate) search_table_state: TableState,
    pub(crate) perf: PerfTable,
    pub(crate) perf_selected: usize,
    pub(crate) perf_table_state: TableState,
    pub(crate) perf_error: Option<String>,
    pub(crate) perf_loading: bool,
    pub(crate) perf_loaded_once: bool,
    pub(crate) domain_pane: DomainPane,
    pub(crate) node_selected: usize,
    pub(crate) node_list_state: ListState,
    pub(crate) group_selected: usize,
    pub(crate) group_list_state: ListState,
    pub(crate) gateway_selected: usize,
    pub(crate) gateway_table_state: TableState,
    pub(crate) overlay: Overlay,
    pub(crate) detail_loading: bool,
    pub(crate) detail_error: Option<String>,
    pub(crate) exporting: bool,
    pub(crate) export_notice: Option<String>,
    pub(crate) confirm_quit: bool,
    debounce: Duration,
}

impl AppState {
    pub(crate) fn new(config: &ConsoleConfig) -> Self {
        let debounce = Duration::from_millis(config.search.debounce_ms);
        Self {
            view: View::Login,
            login: LoginForm::default(),
            identity: None,
            active_tab: Tab::Processes,
            summary: None,
            last_update: String::new(),
            gateways: Vec::new(),
            banner: None,
            search: SearchEngine::new(debounce),
            search_selected: 0,
            search_table_state: TableState::default(),
            perf: PerfTable::new(),
            perf_selected: 0,
            perf_table_state: TableState::default(),
            perf_error: None,
            perf_loading: false,
            perf_loaded_once: false,
            domain_pane: DomainPane::default(),
            node_selected: 0,
            node_list_state: ListState::default(),
            group_selected: 0,
            group_list_state: ListState::default(),
            gateway_selected: 0,
            gateway_table_state: TableState::default(),
            overlay: Overlay::None,
            detail_loading: false,
            detail_error: None,
            exporting: false,
            export_notice: None,
            confirm_quit: false,
            debounce,
        }
    }

    /// Visible tabs, recomputed from the current identity on every call.
    /// Policy is never cached across identity changes.
    pub(crate) fn tabs(&self) -> Vec<Tab> {
        match &self.identity {
            Some(identity) => policy::tabs_for(identity.role),
            None => Vec::new(),
        }
    }

    /// Capability flags, likewise recomputed every call.
    pub(crate) fn capabilities(&self) -> Capabilities {
        match &self.identity {
            Some(identity) => policy::capabilities_for(identity.role),
            None => Capabilities {
                can_export: false,
                can_see_restricted_fields: false,
            },
        }
    }

    pub(crate) fn active_tab_index(&self) -> usize {
        self.tabs()
            .iter()
            .position(|t| *t == self.active_tab)
            .unwrap_or(0)
    }

    pub(crate) fn login_succeeded(&mut self, identity: Identity) {
        self.login = LoginForm::default();
        self.identity = Some(identity);
        self.view = View::Main;
        self.active_tab = self.tabs().first().copied().unwrap_or(Tab::Processes);
        self.sync_selections();
    }

    pub(crate) fn login_failed(&mut self, message: String) {
        self.login.submitting = false;
        self.login.error = Some(message);
    }

    /// Return to the login view, dropping everything derived from the
    /// previous identity.
    pub(crate) fn force_logout(&mut self, notice: Option<&str>) {
        let debounce = self.debounce;
        self.view = View::Login;
        self.login = LoginForm {
            error: notice.map(str::to_string),
            ..LoginForm::default()
        };
        self.identity = None;
        self.summary = None;
        self.last_update = String::new();
        self.gateways = Vec::new();
        self.banner = None;
        self.search = SearchEngine::new(debounce);
        self.perf = PerfTable::new();
        self.perf_error = None;
        self.perf_loading = false;
        self.perf_loaded_once = false;
        self.overlay = Overlay::None;
        self.detail_loading = false;
        self.detail_error = None;
        self.exporting = false;
        self.export_notice = None;
        self.sync_selections();
    }

    pub(crate) fn apply_refresh(&mut self, snapshot: RefreshSnapshot) {
        self.summary = Some(snapshot.config.summary);
        self.last_update = snapshot.config.last_update;
        self.gateways = snapshot.gateways;
        self.banner = None;
        self.clamp_selections();
    }

    pub(crate) fn select_tab(&mut self, tab: Tab) {
        if self.tabs().contains(&tab) {
            self.active_tab = tab;
        }
    }

    pub(crate) fn next_tab(&mut self) {
        let tabs = self.tabs();
        if tabs.is_empty() {
            return;
        }
        let idx = self.active_tab_index();
        self.active_tab = tabs[(idx + 1) % tabs.len()];
    }

    pub(crate) fn prev_tab(&mut self) {
        let tabs = self.tabs();
        if tabs.is_empty() {
            return;
        }
        let idx = self.active_tab_index();
        self.active_tab = tabs[(idx + tabs.len() - 1) % tabs.len()];
    }

    /// Length of the selectable list on the active tab.
    pub(crate) fn selection_len(&self) -> usize {
        match self.active_tab {
            Tab::Processes | Tab::Services => self.search.result_len(),
            Tab::ResponseTime => self.perf.view().len(),
            Tab::Gateways => self.gateways.len(),
            Tab::DomainConfig => match (&self.summary, self.domain_pane) {
                (Some(summary), DomainPane::Nodes) => summary.nodes.len(),
                (Some(summary), DomainPane::Groups) => summary.server_groups.len(),
                (None, _) => 0,
            },
        }
    }

    pub(crate) fn select_next(&mut self) {
        let len = self.selection_len();
        if len == 0 {
            return;
        }
        let slot = self.selection_slot();
        *slot = (*slot + 1) % len;
        self.sync_selections();
    }

    pub(crate) fn select_prev(&mut self) {
        let len = self.selection_len();
        if len == 0 {
            return;
        }
        let slot = self.selection_slot();
        *slot = if *slot == 0 { len - 1 } else { *slot - 1 };
        self.sync_selections();
    }

    fn selection_slot(&mut self) -> &mut usize {
        match self.active_tab {
            Tab::Processes | Tab::Services => &mut self.search_selected,
            Tab::ResponseTime => &mut self.perf_selected,
            Tab::Gateways => &mut self.gateway_selected,
            Tab::DomainConfig => match self.domain_pane {
                DomainPane::Nodes => &mut self.node_selected,
                DomainPane::Groups => &mut self.group_selected,
            },
        }
    }

    /// Keep selections inside their lists after data changes.
    pub(crate) fn clamp_selections(&mut self) {
        let clamp = |selected: &mut usize, len: usize| {
            if len == 0 {
                *selected = 0;
            } else if *selected >= len {
                *selected = len - 1;
            }
        };
        clamp(&mut self.search_selected, self.search.result_len());
        clamp(&mut self.perf_selected, self.perf.view().len());
        clamp(&mut self.gateway_selected, self.gateways.len());
        if let Some(summary) = &self.summary {
            clamp(&mut self.node_selected, summary.nodes.len());
            clamp(&mut self.group_selected, summary.server_groups.len());
        }
        self.sync_selections();
    }

    pub(crate) fn sync_selections(&mut self) {
        let sync = |state: &mut ListState, selected: usize, len: usize| {
            state.select((len > 0).then_some(selected.min(len.saturating_sub(1))));
        };
        let search_len = self.search.result_len();
        self.search_table_state
            .select((search_len > 0).then_some(self.search_selected.min(search_len.saturating_sub(1))));
        let perf_len = self.perf.view().len();
        self.perf_table_state
            .select((perf_len > 0).then_some(self.perf_selected.min(perf_len.saturating_sub(1))));
        self.gateway_table_state.select(
            (!self.gateways.is_empty())
                .then_some(self.gateway_selected.min(self.gateways.len().saturating_sub(1))),
        );
        let (nodes_len, groups_len) = match &self.summary {
            Some(summary) => (summary.nodes.len(), summary.server_groups.len()),
            None => (0, 0),
        };
        sync(&mut self.node_list_state, self.node_selected, nodes_len);
        sync(&mut self.group_list_state, self.group_selected, groups_len);
    }

    /// Name of the perf row currently selected in the derived view.
    pub(crate) fn selected_perf_service(&self) -> Option<String> {
        self.perf
            .view()
            .get(self.perf_selected)
            .map(|row| row.service_name.clone())
    }

    pub(crate) fn selected_search_name(&self) -> Option<String> {
        match self.search.mode() {
            SearchMode::Process => self
                .search
                .processes()
                .get(self.search_selected)
                .map(|r| r.name.clone()),
            SearchMode::Service => self
                .search
                .services()
                .get(self.search_selected)
                .map(|r| r.name.clone()),
        }
    }

    pub(crate) fn selected_node(&self) -> Option<String> {
        self.summary
            .as_ref()
            .and_then(|s| s.nodes.get(self.node_selected).cloned())
    }

    pub(crate) fn selected_group(&self) -> Option<String> {
        self.summary
            .as_ref()
            .and_then(|s| s.server_groups.get(self.group_selected).cloned())
    }
}
