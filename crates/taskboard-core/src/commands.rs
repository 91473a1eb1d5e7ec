use std::io::{self, BufRead, Write};

use anyhow::{Context, anyhow};
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::app::App;
use crate::cli::{AddArgs, Command, ListArgs};
use crate::config::Config;
use crate::datetime::parse_due_date;
use crate::kv::KvStore;
use crate::prefs::{Onboarding, Theme};
use crate::render::Renderer;
use crate::task::{NewTask, Priority};
use crate::view::{FilterMode, SortMode};

#[instrument(skip(app, cfg, renderer, command))]
pub fn dispatch<S: KvStore>(
    app: &mut App<S>,
    cfg: &Config,
    renderer: &mut Renderer,
    command: Command,
) -> anyhow::Result<()> {
    debug!(?command, "dispatching command");
    let mut out = io::stdout().lock();

    match command {
        Command::List(args) => cmd_list(app, cfg, renderer, &mut out, &args),
        Command::Add(args) => cmd_add(app, cfg, &mut out, &args),
        Command::Toggle { id } => cmd_toggle(app, &mut out, id),
        Command::Delete { id } => cmd_delete(app, &mut out, id),
        Command::Info { id } => {
            let task = app
                .store
                .get(id)
                .ok_or_else(|| anyhow!("no task with id {id}"))?;
            renderer.print_task_info(&mut out, task)
        }
        Command::Counts => {
            let screen = app.screen(Utc::now());
            renderer.print_counts(&mut out, &screen.counters, screen.view.current_filter)
        }
        Command::Tags => {
            for tag in app.store.distinct_tags() {
                writeln!(out, "{tag}")?;
            }
            Ok(())
        }
        Command::Export => {
            let json = serde_json::to_string_pretty(app.store.tasks())
                .context("failed to serialize tasks")?;
            writeln!(out, "{json}")?;
            Ok(())
        }
        Command::Theme { value } => cmd_theme(app, renderer, &mut out, value.as_deref()),
        Command::Tour { skip } => cmd_tour(app, renderer, &mut out, skip),
        Command::Shell => {
            let stdin = io::stdin();
            run_shell(app, cfg, renderer, stdin.lock(), &mut out)
        }
    }
}

#[instrument(skip_all)]
fn cmd_list<S: KvStore, W: Write>(
    app: &mut App<S>,
    cfg: &Config,
    renderer: &Renderer,
    out: &mut W,
    args: &ListArgs,
) -> anyhow::Result<()> {
    app.set_sort_by(cfg.default_sort()?);
    apply_list_args(app, args)?;

    show_onboarding_hint(app, renderer, out)?;
    renderer.print_screen(out, &app.screen(Utc::now()))
}

fn apply_list_args<S: KvStore>(app: &mut App<S>, args: &ListArgs) -> anyhow::Result<()> {
    if let Some(filter) = &args.filter {
        app.set_filter(filter.parse()?);
    }
    if let Some(tag) = &args.tag {
        app.set_tag_filter(tag);
    }
    if let Some(search) = &args.search {
        app.set_search_query(search);
    }
    if let Some(sort) = &args.sort {
        app.set_sort_by(sort.parse()?);
    }
    Ok(())
}

#[instrument(skip_all)]
fn cmd_add<S: KvStore, W: Write>(
    app: &mut App<S>,
    cfg: &Config,
    out: &mut W,
    args: &AddArgs,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let title = args.title.join(" ");
    if title.trim().is_empty() {
        return Err(anyhow!("task title cannot be empty"));
    }

    let priority = match &args.priority {
        Some(raw) => raw.parse::<Priority>()?,
        None => cfg.default_priority()?,
    };
    let due_date = match &args.due {
        Some(raw) => parse_due_date(raw, app.today(now))?,
        None => None,
    };

    let new = NewTask::new(title, priority)
        .with_due_date(due_date)
        .with_tag(args.tag.clone());
    let id = app.add(new, now)?;
    info!(id, "command add");
    writeln!(out, "Created task {id}.")?;
    Ok(())
}

fn cmd_toggle<S: KvStore, W: Write>(app: &mut App<S>, out: &mut W, id: u64) -> anyhow::Result<()> {
    if app.toggle(id)? {
        let done = app.store.get(id).is_some_and(|t| t.completed);
        let state = if done { "completed" } else { "active" };
        writeln!(out, "Task {id} is now {state}.")?;
    } else {
        warn!(id, "no task matched");
    }
    Ok(())
}

fn cmd_delete<S: KvStore, W: Write>(app: &mut App<S>, out: &mut W, id: u64) -> anyhow::Result<()> {
    if app.delete(id)? {
        writeln!(out, "Deleted task {id}.")?;
    } else {
        warn!(id, "no task matched");
    }
    Ok(())
}

fn cmd_theme<S: KvStore, W: Write>(
    app: &mut App<S>,
    renderer: &mut Renderer,
    out: &mut W,
    value: Option<&str>,
) -> anyhow::Result<()> {
    match value {
        None => {}
        Some("toggle") => {
            app.toggle_theme()?;
        }
        Some(raw) => app.set_theme(raw.parse::<Theme>()?)?,
    }
    renderer.set_theme(app.theme);
    writeln!(out, "theme: {}", app.theme)?;
    Ok(())
}

fn cmd_tour<S: KvStore, W: Write>(
    app: &mut App<S>,
    renderer: &Renderer,
    out: &mut W,
    skip: bool,
) -> anyhow::Result<()> {
    let mut tour = Onboarding::new();
    if !skip {
        while let Some(step) = tour.current() {
            renderer.print_onboarding_step(out, &tour, step)?;
            writeln!(out)?;
            tour.next_step(app.store.kv_mut())?;
        }
    }
    tour.complete(app.store.kv_mut())
}

/// First-run hint: the first tour step, until the tour is taken or skipped.
fn show_onboarding_hint<S: KvStore, W: Write>(
    app: &App<S>,
    renderer: &Renderer,
    out: &mut W,
) -> anyhow::Result<()> {
    if !Onboarding::should_show(app.store.kv()) {
        return Ok(());
    }
    let tour = Onboarding::new();
    if let Some(step) = tour.current() {
        renderer.print_onboarding_step(out, &tour, step)?;
        writeln!(out, "(run `taskboard tour` for the rest, or `taskboard tour --skip`)")?;
        writeln!(out)?;
    }
    Ok(())
}

const SHELL_HELP: &str = "\
commands:
  add TITLE [!high|!medium|!low] [@YYYY-MM-DD] [#tag]
  toggle ID | delete ID | info ID
  filter all|active|completed|today|high
  tag NAME | search TEXT | sort newest|oldest|dueDate|priority
  theme [light|dark] | tags | help | quit";

/// Line-oriented session over one [`App`]. View state persists between
/// lines; every line is followed by a re-render.
#[instrument(skip_all)]
pub fn run_shell<S: KvStore, R: BufRead, W: Write>(
    app: &mut App<S>,
    cfg: &Config,
    renderer: &mut Renderer,
    input: R,
    out: &mut W,
) -> anyhow::Result<()> {
    app.set_sort_by(cfg.default_sort()?);
    show_onboarding_hint(app, renderer, out)?;
    renderer.print_screen(out, &app.screen(Utc::now()))?;

    for line in input.lines() {
        let line = line.context("failed reading input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match verb {
            "quit" | "exit" | "q" => break,
            "help" | "?" => {
                writeln!(out, "{SHELL_HELP}")?;
                continue;
            }
            _ => {}
        }

        if let Err(err) = shell_line(app, cfg, renderer, out, verb, rest) {
            writeln!(out, "error: {err:#}")?;
            continue;
        }
        writeln!(out)?;
        renderer.print_screen(out, &app.screen(Utc::now()))?;
    }

    Ok(())
}

fn shell_line<S: KvStore, W: Write>(
    app: &mut App<S>,
    cfg: &Config,
    renderer: &mut Renderer,
    out: &mut W,
    verb: &str,
    rest: &str,
) -> anyhow::Result<()> {
    match verb {
        "add" => {
            let now = Utc::now();
            let today = app.today(now);
            let new = parse_shell_add(rest, cfg.default_priority()?, |raw| {
                parse_due_date(raw, today)
            })?;
            let id = app.add(new, now)?;
            writeln!(out, "Created task {id}.")?;
        }
        "toggle" | "done" => cmd_toggle(app, out, parse_id(rest)?)?,
        "delete" | "rm" => cmd_delete(app, out, parse_id(rest)?)?,
        "info" => {
            let id = parse_id(rest)?;
            let task = app
                .store
                .get(id)
                .ok_or_else(|| anyhow!("no task with id {id}"))?;
            renderer.print_task_info(out, task)?;
        }
        "filter" => app.set_filter(rest.parse::<FilterMode>()?),
        "tag" => {
            if rest.is_empty() {
                return Err(anyhow!("tag needs a name"));
            }
            app.set_tag_filter(rest);
        }
        "search" => app.set_search_query(rest),
        "sort" => app.set_sort_by(rest.parse::<SortMode>()?),
        "theme" => cmd_theme(app, renderer, out, Some(if rest.is_empty() { "toggle" } else { rest }))?,
        "tags" => {
            writeln!(out, "{}", app.store.distinct_tags().join(", "))?;
        }
        other => return Err(anyhow!("unknown command: {other} (try `help`)")),
    }
    Ok(())
}

fn parse_id(raw: &str) -> anyhow::Result<u64> {
    raw.trim()
        .parse()
        .with_context(|| format!("expected a task id, got {raw:?}"))
}

/// `Buy milk !high @tomorrow #Home`: words starting with `!`, `@` and `#`
/// set priority, due date and tag; everything else is the title.
fn parse_shell_add<F>(rest: &str, default_priority: Priority, parse_due: F) -> anyhow::Result<NewTask>
where
    F: Fn(&str) -> anyhow::Result<Option<chrono::NaiveDate>>,
{
    let mut words = vec![];
    let mut priority = default_priority;
    let mut due_date = None;
    let mut tag = None;

    for word in rest.split_whitespace() {
        if let Some(p) = word.strip_prefix('!') {
            priority = p.parse()?;
        } else if let Some(d) = word.strip_prefix('@') {
            due_date = parse_due(d)?;
        } else if let Some(t) = word.strip_prefix('#') {
            tag = Some(t.to_string());
        } else {
            words.push(word);
        }
    }

    if words.is_empty() {
        return Err(anyhow!("task title cannot be empty"));
    }

    Ok(NewTask::new(words.join(" "), priority)
        .with_due_date(due_date)
        .with_tag(tag))
}
