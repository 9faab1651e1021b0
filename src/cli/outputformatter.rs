use terminal_size::{terminal_size, Width};

use crate::notifier::{Kind, Notification};
use crate::view::{RosterView, UiState, LOADING_TEXT, NO_PARTICIPANTS_TEXT};

/// Print the whole UI state, fitted to the terminal.
pub fn print_ui(ui: &UiState) {
    print!("{}", render_ui(ui, get_terminal_width()));
}

/// Render the UI state as text: auth bar, message slots, activity table, participant lists.
/// Visible delete affordances are numbered in roster order for `rm <n>`.
pub fn render_ui(ui: &UiState, termw: usize) -> String {
    let mut out = String::new();

    // Auth bar
    if ui.auth.logged_in {
        let who = ui.auth.username_display.as_deref().unwrap_or("");
        out.push_str(&format!("[logged in as {}]  signup: enabled\n", who));
    } else {
        out.push_str("[logged out]  signup: disabled (login to register students)\n");
    }
    if ui.user_menu_open {
        out.push_str(if ui.auth.logged_in { "  menu: logout\n" } else { "  menu: login\n" });
    }
    if ui.login_modal.open {
        out.push_str("  login: enter `login <username> <password>` or `close`\n");
        if let Some(m) = &ui.login_message { out.push_str(&format!("  {}\n", message_line(m))); }
    }
    if let Some(m) = &ui.main_message { out.push_str(&format!("{}\n", message_line(m))); }

    let cards = match &ui.roster {
        RosterView::Loading => { out.push_str(LOADING_TEXT); out.push('\n'); return out; }
        RosterView::Failed(text) => { out.push_str(text); out.push('\n'); return out; }
        RosterView::Loaded(cards) => cards,
    };
    if cards.is_empty() {
        out.push_str("(no activities)\n");
        return out;
    }

    let cols: Vec<String> = ["activity", "schedule", "spots left", "participants"].iter().map(|s| s.to_string()).collect();
    let rows: Vec<Vec<String>> = cards
        .iter()
        .map(|c| vec![c.name.clone(), c.schedule.clone(), c.spots_left.to_string(), c.participants.len().to_string()])
        .collect();

    let mut widths: Vec<usize> = cols.iter().map(|s| display_len(s).min(termw)).collect();
    for r in &rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            let w = display_len(cell);
            if w > widths[i] { widths[i] = w.min(termw); }
        }
    }
    let sep = build_separator(&widths);
    out.push_str(&fit_line_to_width(&sep, termw));
    out.push('\n');
    out.push_str(&fit_line_to_width(&build_row(&cols, &widths), termw));
    out.push('\n');
    out.push_str(&fit_line_to_width(&sep, termw));
    out.push('\n');
    for r in &rows {
        out.push_str(&fit_line_to_width(&build_row(r, &widths), termw));
        out.push('\n');
    }
    out.push_str(&fit_line_to_width(&sep, termw));
    out.push('\n');

    // Details per card
    let mut idx = 0usize;
    for c in cards {
        out.push_str(&format!("\n{}\n", c.name));
        out.push_str(&fit_line_to_width(&format!("  {}", c.description), termw));
        out.push('\n');
        out.push_str(&format!("  Schedule: {}\n  Availability: {} spots left\n", c.schedule, c.spots_left));
        if c.participants.is_empty() {
            out.push_str(&format!("  {}\n", NO_PARTICIPANTS_TEXT));
            continue;
        }
        out.push_str("  Participants:\n");
        for p in &c.participants {
            if p.delete.visible {
                idx += 1;
                out.push_str(&format!("    [{}] {}\n", idx, p.email));
            } else {
                out.push_str(&format!("    - {}\n", p.email));
            }
        }
    }

    out
}

fn message_line(m: &Notification) -> String {
    match m.kind {
        Kind::Success => format!("[ok] {}", m.text),
        Kind::Error => format!("[error] {}", m.text),
    }
}

fn display_len(s: &str) -> usize { s.chars().count() }

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('+');
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let (text, align_right) = (truncate(&cell, *w), is_numeric_like(&cell));
        let pad = w.saturating_sub(display_len(&text));
        s.push(' ');
        if align_right {
            s.push_str(&" ".repeat(pad));
            s.push_str(&text);
        } else {
            s.push_str(&text);
            s.push_str(&" ".repeat(pad));
        }
        s.push(' ');
        s.push('|');
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

// numbers align right
fn is_numeric_like(s: &str) -> bool {
    let st = s.trim();
    !st.is_empty() && st.chars().all(|c| c.is_ascii_digit() || c == '-') && st.chars().any(|c| c.is_ascii_digit())
}

fn get_terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), _)) if w > 4 => (w - 4) as usize,
        _ => 80,
    }
}

fn fit_line_to_width(s: &str, maxw: usize) -> String {
    if display_len(s) <= maxw { return s.to_string(); }
    truncate(s, maxw)
}
