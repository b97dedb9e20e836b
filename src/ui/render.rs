use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Clear, List, ListItem, Paragraph, Row, Table, Tabs, Wrap};

use super::app::{AppState, DetailView, DomainPane, LoginField, Overlay, View};
use super::format::{
    domain_summary_rows, format_last_update, gateway_backup, gateway_remote, group_detail_rows,
    node_detail_rows, opt_str, performance_detail_rows, process_detail_rows, service_detail_rows,
    stat_badges,
};
use super::theme::{Theme, ValueStyle};
use crate::perf::{band, format_duration, EmptyReason, SortDirection, SortKey};
use crate::policy::Tab;
use crate::search::{SearchMode, SearchPhase};

pub(crate) fn draw_ui(frame: &mut ratatui::Frame, app: &mut AppState) {
    let theme = Theme::dark();
    match app.view {
        View::Login => draw_login(frame, app, &theme),
        View::Main => draw_main(frame, app, &theme),
    }
}

fn draw_login(frame: &mut ratatui::Frame, app: &AppState, theme: &Theme) {
    let area = centered_rect(frame.area(), 46, 11);
    frame.render_widget(Clear, area);

    let focus_marker = |field: LoginField| {
        if app.login.focus == field {
            "> "
        } else {
            "  "
        }
    };
    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(focus_marker(LoginField::Username), theme.accent_style()),
            Span::styled("Username: ", theme.value_style(ValueStyle::Dim)),
            Span::styled(app.login.username.clone(), theme.value_style(ValueStyle::Normal)),
        ]),
        Line::from(vec![
            Span::styled(focus_marker(LoginField::Password), theme.accent_style()),
            Span::styled("Password: ", theme.value_style(ValueStyle::Dim)),
            Span::styled(
                "*".repeat(app.login.password.len()),
                theme.value_style(ValueStyle::Normal),
            ),
        ]),
        Line::from(""),
    ];
    if app.login.submitting {
        lines.push(Line::styled("Signing in...", theme.value_style(ValueStyle::Dim)));
    } else if let Some(error) = &app.login.error {
        lines.push(Line::styled(error.clone(), theme.error_style()));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(""));
    lines.push(Line::styled(
        "tab switch field - enter sign in - ctrl+c quit",
        theme.help_style(),
    ));

    let login = Paragraph::new(lines)
        .block(theme.block("TPOps Console - Sign In"))
        .wrap(Wrap { trim: false });
    frame.render_widget(login, area);

    if app.confirm_quit {
        draw_quit_confirm(frame, theme);
    }
}

fn draw_main(frame: &mut ratatui::Frame, app: &mut AppState, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, app, theme, chunks[0]);
    draw_tab_bar(frame, app, theme, chunks[1]);

    match app.active_tab {
        Tab::DomainConfig => draw_domain_tab(frame, app, theme, chunks[2]),
        Tab::Gateways => draw_gateways_tab(frame, app, theme, chunks[2]),
        Tab::Processes | Tab::Services => draw_search_tab(frame, app, theme, chunks[2]),
        Tab::ResponseTime => draw_perf_tab(frame, app, theme, chunks[2]),
    }

    draw_status_line(frame, app, theme, chunks[3]);
    draw_help_line(frame, app, theme, chunks[4]);

    match &app.overlay {
        Overlay::Detail(detail) => draw_detail_overlay(frame, app, theme, detail),
        Overlay::ExportConfirm => draw_export_confirm(frame, theme),
        Overlay::None => {}
    }

    if app.confirm_quit {
        draw_quit_confirm(frame, theme);
    }
}

fn draw_header(frame: &mut ratatui::Frame, app: &AppState, theme: &Theme, area: Rect) {
    let user = match &app.identity {
        Some(identity) => format!("{} [{}]", identity.username, identity.role),
        None => String::new(),
    };
    let stats = match &app.summary {
        Some(summary) => stat_badges(summary),
        None => "loading domain summary...".to_string(),
    };
    let line = Line::from(vec![
        Span::styled(user, theme.value_style(ValueStyle::Important)),
        Span::raw("   "),
        Span::styled(stats, theme.value_style(ValueStyle::Dim)),
    ]);
    let header = Paragraph::new(line).block(theme.block("TPOps Console"));
    frame.render_widget(header, area);
}

fn draw_tab_bar(frame: &mut ratatui::Frame, app: &AppState, theme: &Theme, area: Rect) {
    // Tabs come from the policy on every draw; a role change can never
    // leave a stale tab bar behind.
    let titles: Vec<Line> = app
        .tabs()
        .iter()
        .map(|tab| Line::from(tab.title()))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.active_tab_index())
        .style(theme.value_style(ValueStyle::Dim))
        .highlight_style(theme.accent_style());
    frame.render_widget(tabs, area);
}

fn draw_domain_tab(frame: &mut ratatui::Frame, app: &mut AppState, theme: &Theme, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(area);

    let lines: Vec<Line> = match &app.summary {
        Some(summary) => domain_summary_rows(summary)
            .into_iter()
            .map(|(key, value)| {
                Line::from(vec![
                    Span::styled(format!("{:<14}", key), theme.value_style(ValueStyle::Dim)),
                    Span::styled(value, theme.value_style(ValueStyle::Normal)),
                ])
            })
            .collect(),
        None => vec![Line::styled(
            "waiting for first refresh",
            theme.value_style(ValueStyle::Dim),
        )],
    };
    let domain = Paragraph::new(lines).block(theme.block("Domain"));
    frame.render_widget(domain, chunks[0]);

    let (nodes, groups) = match &app.summary {
        Some(summary) => (summary.nodes.clone(), summary.server_groups.clone()),
        None => (Vec::new(), Vec::new()),
    };

    let nodes_title = if app.domain_pane == DomainPane::Nodes {
        "Nodes *"
    } else {
        "Nodes"
    };
    let node_items: Vec<ListItem> = nodes.iter().map(|n| ListItem::new(n.clone())).collect();
    let node_list = List::new(node_items)
        .block(theme.block(nodes_title))
        .style(theme.value_style(ValueStyle::Normal))
        .highlight_style(if app.domain_pane == DomainPane::Nodes {
            theme.highlight_style()
        } else {
            theme.value_style(ValueStyle::Dim)
        })
        .highlight_symbol(">> ");
    frame.render_stateful_widget(node_list, chunks[1], &mut app.node_list_state);

    let groups_title = if app.domain_pane == DomainPane::Groups {
        "Server Groups *"
    } else {
        "Server Groups"
    };
    let group_items: Vec<ListItem> = groups.iter().map(|g| ListItem::new(g.clone())).collect();
    let group_list = List::new(group_items)
        .block(theme.block(groups_title))
        .style(theme.value_style(ValueStyle::Normal))
        .highlight_style(if app.domain_pane == DomainPane::Groups {
            theme.highlight_style()
        } else {
            theme.value_style(ValueStyle::Dim)
        })
        .highlight_symbol(">> ");
    frame.render_stateful_widget(group_list, chunks[2], &mut app.group_list_state);
}

fn draw_gateways_tab(frame: &mut ratatui::Frame, app: &mut AppState, theme: &Theme, area: Rect) {
    if app.gateways.is_empty() {
        let empty = Paragraph::new(Line::styled(
            "no gateways configured",
            theme.value_style(ValueStyle::Dim),
        ))
        .block(theme.block("Gateways"));
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec!["Name", "Node", "Port", "Remote", "Backup", "Dir", "Type"])
        .style(theme.accent_style());
    let rows: Vec<Row> = app
        .gateways
        .iter()
        .map(|gw| {
            Row::new(vec![
                gw.name.clone(),
                gw.node.clone(),
                opt_str(&gw.port).to_string(),
                gateway_remote(gw),
                gateway_backup(gw),
                opt_str(&gw.direction).to_string(),
                opt_str(&gw.gw_type).to_string(),
            ])
        })
        .collect();
    let widths = [
        Constraint::Percentage(20),
        Constraint::Percentage(12),
        Constraint::Percentage(8),
        Constraint::Percentage(22),
        Constraint::Percentage(22),
        Constraint::Percentage(8),
        Constraint::Percentage(8),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(theme.block("Gateways"))
        .row_highlight_style(theme.highlight_style());
    frame.render_stateful_widget(table, area, &mut app.gateway_table_state);
}

fn draw_search_tab(frame: &mut ratatui::Frame, app: &mut AppState, theme: &Theme, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let label = match app.search.mode() {
        SearchMode::Process => "process",
        SearchMode::Service => "service",
    };
    let mut input_spans = vec![
        Span::styled(format!("{} name: ", label), theme.value_style(ValueStyle::Dim)),
        Span::styled(
            app.search.query().to_string(),
            theme.value_style(ValueStyle::Normal),
        ),
    ];
    if matches!(
        app.search.phase(),
        SearchPhase::Pending | SearchPhase::Loading
    ) {
        input_spans.push(Span::styled("  searching...", theme.warn_style()));
    }
    let export_hint = if app.capabilities().can_export {
        if app.exporting {
            "Search  [exporting...]"
        } else {
            "Search  [ctrl+e export all]"
        }
    } else {
        "Search"
    };
    let input = Paragraph::new(Line::from(input_spans)).block(theme.block(export_hint));
    frame.render_widget(input, chunks[0]);

    match app.search.phase() {
        SearchPhase::Idle => {
            let hint = format!("type a {} name to search", label);
            let empty = Paragraph::new(Line::styled(hint, theme.value_style(ValueStyle::Dim)))
                .block(theme.block("Results"));
            frame.render_widget(empty, chunks[1]);
        }
        SearchPhase::Errored => {
            let message = app.search.error().unwrap_or("search failed").to_string();
            let error =
                Paragraph::new(Line::styled(message, theme.error_style())).block(theme.block("Results"));
            frame.render_widget(error, chunks[1]);
        }
        SearchPhase::Settled if app.search.result_len() == 0 => {
            // Distinct from Idle: a search ran and matched nothing.
            let empty = Paragraph::new(Line::styled(
                format!("no {} matches \"{}\"", label, app.search.query().trim()),
                theme.value_style(ValueStyle::Dim),
            ))
            .block(theme.block("Results"));
            frame.render_widget(empty, chunks[1]);
        }
        _ => match app.search.mode() {
            SearchMode::Process => draw_process_results(frame, app, theme, chunks[1]),
            SearchMode::Service => draw_service_results(frame, app, theme, chunks[1]),
        },
    }
}

fn draw_process_results(frame: &mut ratatui::Frame, app: &mut AppState, theme: &Theme, area: Rect) {
    let caps = app.capabilities();
    let title = format!("Results ({})", app.search.processes().len());

    let mut header_cells = vec!["Name", "Group", "Node", "Procs", "Restart"];
    if caps.can_see_restricted_fields {
        header_cells.extend(["MAXQ", "ASQ", "DB"]);
    }
    let header = Row::new(header_cells).style(theme.accent_style());

    let rows: Vec<Row> = app
        .search
        .processes()
        .iter()
        .map(|p| {
            let mut cells = vec![
                p.name.clone(),
                p.svg.clone(),
                p.node.clone(),
                format!("{}-{}", p.min, p.max),
                p.restart.clone(),
            ];
            if caps.can_see_restricted_fields {
                // Absent means withheld by the backend; render the gap,
                // never a made-up value.
                cells.push(opt_str(&p.maxqcount).to_string());
                cells.push(opt_str(&p.asqcount).to_string());
                cells.push(opt_str(&p.db_info).to_string());
            }
            Row::new(cells)
        })
        .collect();

    let widths: Vec<Constraint> = if caps.can_see_restricted_fields {
        vec![
            Constraint::Percentage(22),
            Constraint::Percentage(14),
            Constraint::Percentage(12),
            Constraint::Percentage(10),
            Constraint::Percentage(10),
            Constraint::Percentage(10),
            Constraint::Percentage(10),
            Constraint::Percentage(12),
        ]
    } else {
        vec![
            Constraint::Percentage(30),
            Constraint::Percentage(22),
            Constraint::Percentage(18),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
        ]
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(theme.block(&title))
        .row_highlight_style(theme.highlight_style());
    frame.render_stateful_widget(table, area, &mut app.search_table_state);
}

fn draw_service_results(frame: &mut ratatui::Frame, app: &mut AppState, theme: &Theme, area: Rect) {
    let title = format!("Results ({})", app.search.services().len());
    let header =
        Row::new(vec!["Name", "Process", "Timeout", "AutoTran", "Export"]).style(theme.accent_style());
    let rows: Vec<Row> = app
        .search
        .services()
        .iter()
        .map(|s| {
            Row::new(vec![
                s.name.clone(),
                s.server.clone(),
                s.timeout.clone(),
                s.autotran.clone(),
                s.export.clone(),
            ])
        })
        .collect();
    let widths = [
        Constraint::Percentage(32),
        Constraint::Percentage(28),
        Constraint::Percentage(14),
        Constraint::Percentage(13),
        Constraint::Percentage(13),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(theme.block(&title))
        .row_highlight_style(theme.highlight_style());
    frame.render_stateful_widget(table, area, &mut app.search_table_state);
}

fn sort_marker(app: &AppState, key: SortKey) -> &'static str {
    let spec = app.perf.sort();
    if spec.key != key {
        return "";
    }
    match spec.direction {
        SortDirection::Asc => " ^",
        SortDirection::Desc => " v",
    }
}

fn draw_perf_tab(frame: &mut ratatui::Frame, app: &mut AppState, theme: &Theme, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let totals = app.perf.totals();
    let mut control_spans = vec![
        Span::styled("filter: ", theme.value_style(ValueStyle::Dim)),
        Span::styled(
            app.perf.filter().to_string(),
            theme.value_style(ValueStyle::Normal),
        ),
        Span::raw("   "),
        Span::styled(
            format!(
                "services {}  avg {}  requests {}",
                totals.services,
                format_duration(totals.overall_avg),
                totals.total_count
            ),
            theme.value_style(ValueStyle::Dim),
        ),
    ];
    if app.perf_loading {
        control_spans.push(Span::styled("  refreshing...", theme.warn_style()));
    }
    let controls =
        Paragraph::new(Line::from(control_spans)).block(theme.block("Service Response Time"));
    frame.render_widget(controls, chunks[0]);

    if let Some(error) = &app.perf_error {
        let banner = Paragraph::new(Line::styled(error.clone(), theme.error_style()))
            .block(theme.block("Response Times"));
        frame.render_widget(banner, chunks[1]);
        return;
    }

    match app.perf.empty_reason() {
        Some(EmptyReason::NoData) => {
            let empty = Paragraph::new(Line::styled(
                "no response-time data in the current window",
                theme.value_style(ValueStyle::Dim),
            ))
            .block(theme.block("Response Times"));
            frame.render_widget(empty, chunks[1]);
            return;
        }
        Some(EmptyReason::NoMatch) => {
            let empty = Paragraph::new(Line::styled(
                format!("no services match \"{}\"", app.perf.filter()),
                theme.value_style(ValueStyle::Dim),
            ))
            .block(theme.block("Response Times"));
            frame.render_widget(empty, chunks[1]);
            return;
        }
        None => {}
    }

    let header = Row::new(vec![
        Cell::from("Service"),
        Cell::from(format!("Avg{}", sort_marker(app, SortKey::AvgTime))),
        Cell::from("Min"),
        Cell::from(format!("Max{}", sort_marker(app, SortKey::MaxTime))),
        Cell::from(format!("Count{}", sort_marker(app, SortKey::Count))),
        Cell::from("Status"),
    ])
    .style(theme.accent_style());

    let rows: Vec<Row> = app
        .perf
        .view()
        .iter()
        .map(|item| {
            let item_band = band(item.avg_time);
            Row::new(vec![
                Cell::from(item.service_name.clone()),
                Cell::from(Span::styled(
                    format_duration(item.avg_time),
                    theme.band_style(item_band),
                )),
                Cell::from(format_duration(item.min_time)),
                Cell::from(format_duration(item.max_time)),
                Cell::from(item.count.map(|c| c.to_string()).unwrap_or_else(|| "0".to_string())),
                Cell::from(Span::styled(item_band.label(), theme.band_style(item_band))),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(30),
        Constraint::Percentage(14),
        Constraint::Percentage(14),
        Constraint::Percentage(14),
        Constraint::Percentage(14),
        Constraint::Percentage(14),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(theme.block("Response Times"))
        .row_highlight_style(theme.highlight_style());
    frame.render_stateful_widget(table, chunks[1], &mut app.perf_table_state);
}

fn draw_status_line(frame: &mut ratatui::Frame, app: &AppState, theme: &Theme, area: Rect) {
    let line = if let Some(banner) = &app.banner {
        Line::styled(format!("refresh failed: {}", banner), theme.error_style())
    } else if let Some(error) = &app.detail_error {
        Line::styled(error.clone(), theme.error_style())
    } else if let Some(notice) = &app.export_notice {
        Line::styled(notice.clone(), theme.ok_style())
    } else if app.detail_loading {
        Line::styled("loading detail...", theme.value_style(ValueStyle::Dim))
    } else {
        Line::styled(
            format!("last update: {}", format_last_update(&app.last_update)),
            theme.value_style(ValueStyle::Dim),
        )
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_help_line(frame: &mut ratatui::Frame, app: &AppState, theme: &Theme, area: Rect) {
    let help = match app.active_tab {
        Tab::ResponseTime => {
            "arrows navigate - enter detail - ctrl+a/m/n sort - ctrl+r refresh - ctrl+l logout - ctrl+c quit"
        }
        Tab::Processes | Tab::Services => {
            "type to search - arrows navigate - enter detail - ctrl+l logout - ctrl+c quit"
        }
        Tab::DomainConfig => {
            "tab switch pane - arrows navigate - enter detail - ctrl+l logout - ctrl+c quit"
        }
        Tab::Gateways => "arrows navigate - ctrl+l logout - ctrl+c quit",
    };
    frame.render_widget(
        Paragraph::new(Line::styled(help, theme.help_style())),
        area,
    );
}

fn draw_detail_overlay(frame: &mut ratatui::Frame, app: &AppState, theme: &Theme, detail: &DetailView) {
    let caps = app.capabilities();
    let (title, rows) = match detail {
        DetailView::Process(p) => ("Process Detail".to_string(), process_detail_rows(p, caps)),
        DetailView::Service(s) => ("Service Detail".to_string(), service_detail_rows(s)),
        DetailView::Node(n) => ("Node Detail".to_string(), node_detail_rows(n)),
        DetailView::ServerGroup(g) => ("Server Group Detail".to_string(), group_detail_rows(g)),
        DetailView::Performance { service, detail } => (
            format!("Response Time - {} (24h)", service),
            performance_detail_rows(detail),
        ),
    };

    let height = (rows.len() as u16 + 5).min(frame.area().height.saturating_sub(2));
    let area = centered_rect(frame.area(), 64, height);
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = rows
        .into_iter()
        .map(|(key, value)| {
            Line::from(vec![
                Span::styled(format!("{:<14}", key), theme.value_style(ValueStyle::Dim)),
                Span::styled(value, theme.value_style(ValueStyle::Normal)),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    let footer = match detail {
        DetailView::Service(_) => "enter open owning process - esc close",
        _ => "esc close",
    };
    lines.push(Line::styled(footer, theme.help_style()));

    let paragraph = Paragraph::new(lines)
        .block(theme.block(&title))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_export_confirm(frame: &mut ratatui::Frame, theme: &Theme) {
    let area = centered_rect(frame.area(), 56, 7);
    frame.render_widget(Clear, area);
    let lines = vec![
        Line::from(""),
        Line::styled(
            "Exporting the full list puts load on the backend.",
            theme.warn_style(),
        ),
        Line::from("Download everything as a spreadsheet?"),
        Line::from(""),
        Line::styled("y confirm - n cancel", theme.help_style()),
    ];
    let confirm = Paragraph::new(lines)
        .block(theme.block("Confirm Export"))
        .wrap(Wrap { trim: false });
    frame.render_widget(confirm, area);
}

fn draw_quit_confirm(frame: &mut ratatui::Frame, theme: &Theme) {
    let area = centered_rect(frame.area(), 40, 5);
    frame.render_widget(Clear, area);
    let lines = vec![
        Line::from("Quit the console?"),
        Line::from(""),
        Line::styled("y quit - any other key stays", theme.help_style()),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(theme.block("Quit")),
        area,
    );
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}
