use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use tracing::{debug, warn};

use crate::kv::{KvStore, ONBOARDING_KEY, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn storage_value(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_value())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(anyhow!("unknown theme: {other} (expected light or dark)")),
        }
    }
}

pub fn load_theme<S: KvStore>(kv: &S) -> Theme {
    match kv.get(THEME_KEY) {
        Ok(Some(raw)) => raw.parse().unwrap_or_else(|_| {
            warn!(value = %raw, "unknown saved theme; using light");
            Theme::Light
        }),
        Ok(None) => Theme::Light,
        Err(err) => {
            warn!(error = %err, "failed reading saved theme");
            Theme::Light
        }
    }
}

pub fn save_theme<S: KvStore>(kv: &mut S, theme: Theme) -> anyhow::Result<()> {
    kv.set(THEME_KEY, theme.storage_value())
}

/// Flips the saved theme and returns the new one.
pub fn toggle_theme<S: KvStore>(kv: &mut S) -> anyhow::Result<Theme> {
    let next = load_theme(&*kv).toggled();
    save_theme(kv, next)?;
    debug!(theme = %next, "theme toggled");
    Ok(next)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnboardingStep {
    pub number: u8,
    pub title: &'static str,
    pub description: &'static str,
}

pub static ONBOARDING_STEPS: [OnboardingStep; 4] = [
    OnboardingStep {
        number: 1,
        title: "Welcome to Taskboard",
        description: "A simple place to keep track of everything you need to get done.",
    },
    OnboardingStep {
        number: 2,
        title: "Add and Organize Tasks",
        description: "Create tasks, set due dates, priorities, and tags to keep everything organized.",
    },
    OnboardingStep {
        number: 3,
        title: "Filter and Search",
        description: "Easily find what you're looking for with filters and search functionality.",
    },
    OnboardingStep {
        number: 4,
        title: "Dark Mode",
        description: "Switch between light and dark mode based on your preference or time of day.",
    },
];

/// One-time tour. Starts at step 1; finishing or skipping records the
/// seen flag so it never shows again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Onboarding {
    step: usize,
    finished: bool,
}

impl Default for Onboarding {
    fn default() -> Self {
        Self {
            step: 1,
            finished: false,
        }
    }
}

impl Onboarding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_show<S: KvStore>(kv: &S) -> bool {
        !matches!(kv.get(ONBOARDING_KEY), Ok(Some(ref v)) if v == "true")
    }

    pub fn current(&self) -> Option<&'static OnboardingStep> {
        if self.finished {
            return None;
        }
        ONBOARDING_STEPS.get(self.step - 1)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn button_label(&self) -> &'static str {
        if self.step == ONBOARDING_STEPS.len() {
            "Get Started"
        } else {
            "Next"
        }
    }

    /// Advances one step; going past the last step completes the tour.
    pub fn next_step<S: KvStore>(&mut self, kv: &mut S) -> anyhow::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.step += 1;
        if self.step > ONBOARDING_STEPS.len() {
            self.step = ONBOARDING_STEPS.len();
            return self.complete(kv);
        }
        Ok(())
    }

    /// Skip or finish.
    pub fn complete<S: KvStore>(&mut self, kv: &mut S) -> anyhow::Result<()> {
        self.finished = true;
        kv.set(ONBOARDING_KEY, "true")
    }
}

#[cfg(test)]
mod tests {
    use super::{ONBOARDING_STEPS, Onboarding, Theme, load_theme, toggle_theme};
    use crate::kv::{KvStore, MemoryStore, THEME_KEY};

    #[test]
    fn theme_defaults_to_light_and_toggles() {
        let mut kv = MemoryStore::new();
        assert_eq!(load_theme(&kv), Theme::Light);

        assert_eq!(toggle_theme(&mut kv).unwrap(), Theme::Dark);
        assert_eq!(kv.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert_eq!(toggle_theme(&mut kv).unwrap(), Theme::Light);
    }

    #[test]
    fn garbage_theme_reads_as_light() {
        let mut kv = MemoryStore::new();
        kv.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(load_theme(&kv), Theme::Light);
    }

    #[test]
    fn walking_all_steps_marks_seen() {
        let mut kv = MemoryStore::new();
        assert!(Onboarding::should_show(&kv));

        let mut tour = Onboarding::new();
        let mut titles = vec![];
        while let Some(step) = tour.current() {
            titles.push(step.title);
            if step.number == 4 {
                assert_eq!(tour.button_label(), "Get Started");
            } else {
                assert_eq!(tour.button_label(), "Next");
            }
            tour.next_step(&mut kv).unwrap();
        }

        assert_eq!(titles.len(), 4);
        assert_eq!(titles[1], "Add and Organize Tasks");
        assert!(tour.is_finished());
        assert!(!Onboarding::should_show(&kv));
    }

    #[test]
    fn next_after_finish_stays_on_last_step() {
        let mut kv = MemoryStore::new();
        let mut tour = Onboarding::new();
        for _ in 0..ONBOARDING_STEPS.len() {
            tour.next_step(&mut kv).unwrap();
        }
        assert!(tour.is_finished());
        assert_eq!(tour.button_label(), "Get Started");

        tour.next_step(&mut kv).unwrap();
        tour.next_step(&mut kv).unwrap();
        assert!(tour.is_finished());
        assert!(tour.current().is_none());
        assert_eq!(tour.button_label(), "Get Started");
    }

    #[test]
    fn skipping_marks_seen_immediately() {
        let mut kv = MemoryStore::new();
        let mut tour = Onboarding::new();
        tour.complete(&mut kv).unwrap();
        assert!(tour.current().is_none());
        assert!(!Onboarding::should_show(&kv));
    }
}
