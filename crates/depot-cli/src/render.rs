use std::io::IsTerminal;
use std::time::Duration;

use anstyle::{AnsiColor, Effects, Style};
use depot_core::{ActionLists, Candidate, CandidateSet};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputStyle {
    Plain,
    Rich,
}

pub fn current_output_style() -> OutputStyle {
    if std::io::stdout().is_terminal() {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

fn section_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightBlue.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

pub fn render_section(style: OutputStyle, title: &str) -> String {
    match style {
        OutputStyle::Plain => title.to_string(),
        OutputStyle::Rich => colorize(section_style(), title),
    }
}

// The progress meter handle carried (or not) by the session configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressMeter;

impl ProgressMeter {
    pub fn new() -> Self {
        Self
    }

    pub fn start(&self, label: &str, total: u64) -> ProgressHandle {
        let progress_bar = if current_output_style() == OutputStyle::Rich {
            let progress_bar = ProgressBar::new(total.max(1));
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.cyan.bold} {msg:<10} [{bar:20.cyan/blue}] {pos:>3}/{len:3}",
            ) {
                progress_bar.set_style(style.progress_chars("=>-"));
            }
            progress_bar.set_message(label.to_string());
            progress_bar.enable_steady_tick(Duration::from_millis(80));
            Some(progress_bar)
        } else {
            None
        };

        ProgressHandle { progress_bar }
    }
}

pub struct ProgressHandle {
    progress_bar: Option<ProgressBar>,
}

impl ProgressHandle {
    pub fn advance(&mut self) {
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.inc(1);
        }
    }

    pub fn finish(mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }
}

// The classified action lists, exactly as shown at the confirmation gate
// and written to the logs afterwards.
pub fn render_action_lists(lists: &ActionLists) -> Vec<String> {
    let style = current_output_style();
    let mut lines = Vec::new();

    let sections: [(&str, &Vec<(depot_core::PackageId, depot_core::Evr)>); 3] = [
        ("Installing:", &lists.install),
        ("Updating:", &lists.update),
        ("Removing:", &lists.erase),
    ];
    for (title, entries) in sections {
        if entries.is_empty() {
            continue;
        }
        lines.push(render_section(style, title));
        for (id, evr) in entries {
            lines.push(format!("  {id} {evr}"));
        }
    }

    if !lists.update_displaced.is_empty() {
        lines.push(render_section(style, "Displaced by updates:"));
        for id in &lists.update_displaced {
            lines.push(format!("  {id}"));
        }
    }
    if !lists.erase_displaced.is_empty() {
        lines.push(render_section(style, "Displaced by removals:"));
        for id in &lists.erase_displaced {
            lines.push(format!("  {id}"));
        }
    }

    lines
}

fn candidate_line(candidate: &Candidate) -> String {
    format!(
        "  {} {} ({})",
        candidate.id(),
        candidate.evr(),
        candidate.package.repo
    )
}

pub fn render_candidate_listing(set: &CandidateSet, verbose: bool) -> Vec<String> {
    let style = current_output_style();
    let mut lines = Vec::new();

    let installed: Vec<&Candidate> = set
        .available
        .iter()
        .filter(|candidate| candidate.installed)
        .collect();
    if !installed.is_empty() {
        lines.push(render_section(style, "Installed packages:"));
        for candidate in installed {
            lines.push(candidate_line(candidate));
            if verbose && !candidate.package.summary.is_empty() {
                lines.push(format!("    {}", candidate.package.summary));
            }
        }
    }

    if !set.updates.is_empty() {
        lines.push(render_section(style, "Available updates:"));
        for candidate in &set.updates {
            lines.push(candidate_line(candidate));
            if verbose && !candidate.package.summary.is_empty() {
                lines.push(format!("    {}", candidate.package.summary));
            }
        }
    }

    if !set.fresh.is_empty() {
        lines.push(render_section(style, "Available packages:"));
        for candidate in &set.fresh {
            lines.push(candidate_line(candidate));
            if verbose && !candidate.package.summary.is_empty() {
                lines.push(format!("    {}", candidate.package.summary));
            }
        }
    }

    lines
}
