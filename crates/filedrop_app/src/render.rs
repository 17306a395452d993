use filedrop_core::{AppViewModel, ChannelStatus, ItemResult, ItemRowView, ItemState, Origin};

const BAR_WIDTH: usize = 20;

/// Remembers what was printed so only changed rows are printed again.
#[derive(Debug, Default)]
pub struct Renderer {
    last: Vec<String>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changed_rows(&mut self, view: &AppViewModel) -> Vec<String> {
        let rows = render(view);
        let changed = rows
            .iter()
            .enumerate()
            .filter(|(index, row)| self.last.get(*index) != Some(*row))
            .map(|(_, row)| row.clone())
            .collect();
        self.last = rows;
        changed
    }
}

pub fn render(view: &AppViewModel) -> Vec<String> {
    view.items.iter().map(format_row).collect()
}

pub fn status_line(view: &AppViewModel) -> String {
    let done = view
        .items
        .iter()
        .filter(|row| row.state.is_terminal())
        .count();
    let channel = match view.channel {
        ChannelStatus::NotOpened => "not opened",
        ChannelStatus::Open => "open",
        ChannelStatus::Lost => "lost",
    };
    match view.uploading {
        Some(item_id) => format!(
            "{done}/{} done | uploading #{item_id} | channel {channel}",
            view.item_count
        ),
        None => format!("{done}/{} done | channel {channel}", view.item_count),
    }
}

fn format_row(row: &ItemRowView) -> String {
    let origin = match row.origin {
        Origin::Local => "file",
        Origin::Remote => "url ",
    };
    let label = match &row.size_label {
        Some(size) => format!("{} {}", row.name, size),
        None => row.name.clone(),
    };
    let status = match (&row.state, &row.result) {
        (ItemState::Pending, _) => "queued".to_string(),
        (ItemState::InProgress, _) => progress_bar(row.progress_percent),
        (ItemState::Succeeded, Some(ItemResult::Link(link))) => link.clone(),
        (ItemState::Failed, Some(ItemResult::Error(error))) => format!("error: {error}"),
        (ItemState::Succeeded, _) => "done".to_string(),
        (ItemState::Failed, _) => "error".to_string(),
    };
    format!("#{} {origin} {label}  {status}", row.item_id)
}

fn progress_bar(percent: f64) -> String {
    let percent = percent.clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        " ".repeat(BAR_WIDTH - filled),
        percent
    )
}
