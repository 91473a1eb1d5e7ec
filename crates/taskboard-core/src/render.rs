use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::app::{Screen, empty_message};
use crate::config::Config;
use crate::counters::Counters;
use crate::datetime::{format_display_date, format_iso_date};
use crate::prefs::{ONBOARDING_STEPS, Onboarding, OnboardingStep, Theme};
use crate::task::{Priority, Task};
use crate::view::FilterMode;

/// Turns view-filter output into text. Holds no task state.
#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    theme: Theme,
}

impl Renderer {
    pub fn new(cfg: &Config, theme: Theme) -> anyhow::Result<Self> {
        let color = cfg
            .get_bool("color")
            .map_err(|e| anyhow!("invalid color setting: {e}"))?
            .unwrap_or(true);

        Ok(Self {
            color: color && io::stdout().is_terminal(),
            theme,
        })
    }

    pub fn plain(theme: Theme) -> Self {
        Self {
            color: false,
            theme,
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    #[tracing::instrument(skip_all, fields(visible = screen.visible.len()))]
    pub fn print_screen<W: Write>(&self, out: &mut W, screen: &Screen) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&screen.title, self.heading_code()))?;
        self.print_counts(out, &screen.counters, screen.view.current_filter)?;
        writeln!(out)?;

        if screen.visible.is_empty() {
            return self.print_empty_state(out, screen);
        }

        self.print_task_table(out, &screen.visible)
    }

    pub fn print_counts<W: Write>(
        &self,
        out: &mut W,
        counters: &Counters,
        active: FilterMode,
    ) -> anyhow::Result<()> {
        let cells: Vec<String> = FilterMode::SIDEBAR
            .iter()
            .map(|mode| {
                let count = counters.count_for(*mode).unwrap_or_default();
                let cell = format!("{mode} {count}");
                if *mode == active {
                    format!("[{cell}]")
                } else {
                    cell
                }
            })
            .collect();
        writeln!(out, "{}", cells.join("  "))?;
        Ok(())
    }

    pub fn print_task_table<W: Write>(&self, out: &mut W, tasks: &[Task]) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "".to_string(),
            "Title".to_string(),
            "Due".to_string(),
            "Priority".to_string(),
            "Tag".to_string(),
        ];

        let rows = tasks
            .iter()
            .map(|task| {
                vec![
                    task.id.to_string(),
                    if task.completed { "[x]" } else { "[ ]" }.to_string(),
                    task.title.clone(),
                    task.due_date.map(format_display_date).unwrap_or_default(),
                    self.paint(task.priority.as_str(), self.priority_code(task.priority)),
                    task.tags.first().cloned().unwrap_or_default(),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    fn print_empty_state<W: Write>(&self, out: &mut W, screen: &Screen) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint("Nothing to do!", self.heading_code()))?;
        writeln!(out, "{}", empty_message(&screen.view))?;
        if screen.view.current_filter == FilterMode::All {
            writeln!(out, "Add your first task: taskboard add \"Title\"")?;
        }
        Ok(())
    }

    pub fn print_task_info<W: Write>(&self, out: &mut W, task: &Task) -> anyhow::Result<()> {
        writeln!(out, "id        {}", task.id)?;
        writeln!(out, "title     {}", task.title)?;
        writeln!(out, "status    {}", if task.completed { "completed" } else { "active" })?;
        writeln!(
            out,
            "priority  {}",
            self.paint(task.priority.as_str(), self.priority_code(task.priority))
        )?;
        if let Some(due) = task.due_date {
            writeln!(out, "due       {} ({})", format_display_date(due), format_iso_date(due))?;
        }
        writeln!(out, "tags      {}", task.tags.join(", "))?;
        Ok(())
    }

    pub fn print_onboarding_step<W: Write>(
        &self,
        out: &mut W,
        tour: &Onboarding,
        step: &OnboardingStep,
    ) -> anyhow::Result<()> {
        let dots: String = ONBOARDING_STEPS
            .iter()
            .map(|s| if s.number == step.number { '●' } else { '○' })
            .collect();
        writeln!(out, "{}  {}", dots, self.paint(step.title, self.heading_code()))?;
        writeln!(out, "{}", step.description)?;
        writeln!(out, "[{}]", tour.button_label())?;
        Ok(())
    }

    fn heading_code(&self) -> &'static str {
        match self.theme {
            Theme::Light => "1;34",
            Theme::Dark => "1;96",
        }
    }

    fn priority_code(&self, priority: Priority) -> &'static str {
        match (self.theme, priority) {
            (Theme::Light, Priority::High) => "31",
            (Theme::Light, Priority::Medium) => "33",
            (Theme::Light, Priority::Low) => "32",
            (Theme::Dark, Priority::High) => "91",
            (Theme::Dark, Priority::Medium) => "93",
            (Theme::Dark, Priority::Low) => "92",
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|h| UnicodeWidthStr::width(h.as_str()))
        .collect();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(visible_width(cell));
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(h, *w))
        .collect();
    writeln!(writer, "{}", header_line.join(" ").trim_end())?;

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(writer, "{}", rule.join(" "))?;

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| pad(cell, *w))
            .collect();
        writeln!(writer, "{}", line.join(" ").trim_end())?;
    }

    Ok(())
}

fn pad(cell: &str, width: usize) -> String {
    let padding = width.saturating_sub(visible_width(cell));
    format!("{cell}{}", " ".repeat(padding))
}

fn visible_width(s: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(s).as_str())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
