//! Services the status bar provides to a checker, and the standard
//! implementation used by the command line.

use crate::app::models::{Palette, Threshold};
use crate::app::scanner::Scanner;
use crate::app::template::{Bindings, Composite, FormatError, Template};
use std::collections::BTreeSet;
use std::time::{Duration, SystemTime};

pub trait Filesystem {
    /// Substitutes a leading `~`/`~user`. Never expands wildcards.
    fn expand_user(&self, path: &str) -> String;
    /// Concrete paths matching `pattern`, in no particular order.
    fn glob(&self, pattern: &str) -> Vec<String>;
}

pub trait Formatter {
    fn contains(&self, template: &str, placeholder: &str) -> bool;
    fn placeholder_keys(&self, template: &str) -> BTreeSet<String>;
    fn render(&self, template: &str, bindings: &Bindings) -> Result<Composite, FormatError>;
    fn join(&self, separator: &Composite, items: &[Composite]) -> Composite;
}

pub trait ThresholdEngine {
    /// Tags `name` in `bindings` with the label picked for `value`.
    fn assign(&self, value: f64, name: &str, thresholds: &[Threshold], bindings: &mut Bindings);
}

pub trait Clock {
    fn now_plus(&self, timeout: Duration) -> SystemTime;
}

pub trait Logger {
    fn log(&self, message: &str);
}

/// Everything a [`PathChecker`](crate::app::checker::PathChecker) needs.
pub trait Host: Filesystem + Formatter + ThresholdEngine + Clock + Logger {}

impl<T: Filesystem + Formatter + ThresholdEngine + Clock + Logger> Host for T {}

/// Label of the highest bound not above `value`.
pub fn pick_threshold(value: f64, thresholds: &[Threshold]) -> Option<&str> {
    let mut sorted: Vec<&Threshold> = thresholds.iter().collect();
    sorted.sort_by(|a, b| a.bound().total_cmp(&b.bound()));
    sorted
        .into_iter()
        .take_while(|threshold| threshold.bound() <= value)
        .last()
        .map(Threshold::label)
}

/// Real filesystem, the built-in template engine, `log` and the system clock.
pub struct StandardHost {
    scanner: Scanner,
    palette: Palette,
}

impl StandardHost {
    pub fn new(palette: Palette) -> Self {
        Self {
            scanner: Scanner::new(),
            palette,
        }
    }
}

impl Filesystem for StandardHost {
    fn expand_user(&self, path: &str) -> String {
        self.scanner.expand_user(path)
    }

    fn glob(&self, pattern: &str) -> Vec<String> {
        self.scanner.glob(pattern)
    }
}

impl Formatter for StandardHost {
    fn contains(&self, template: &str, placeholder: &str) -> bool {
        Template::parse(template).is_ok_and(|parsed| parsed.contains(placeholder))
    }

    fn placeholder_keys(&self, template: &str) -> BTreeSet<String> {
        Template::parse(template)
            .map(|parsed| parsed.placeholders())
            .unwrap_or_default()
    }

    fn render(&self, template: &str, bindings: &Bindings) -> Result<Composite, FormatError> {
        Ok(Template::parse(template)?.render(bindings, &self.palette))
    }

    fn join(&self, separator: &Composite, items: &[Composite]) -> Composite {
        Composite::join(separator, items)
    }
}

impl ThresholdEngine for StandardHost {
    fn assign(&self, value: f64, name: &str, thresholds: &[Threshold], bindings: &mut Bindings) {
        if let Some(label) = pick_threshold(value, thresholds) {
            bindings.set_color(name, label);
        }
    }
}

impl Clock for StandardHost {
    fn now_plus(&self, timeout: Duration) -> SystemTime {
        SystemTime::now() + timeout
    }
}

impl Logger for StandardHost {
    fn log(&self, message: &str) {
        log::warn!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::default_thresholds;

    #[test]
    fn test_threshold_boundaries() {
        let thresholds = default_thresholds();
        assert_eq!(pick_threshold(0.0, &thresholds), Some("bad"));
        assert_eq!(pick_threshold(1.0, &thresholds), Some("good"));
        assert_eq!(pick_threshold(5.0, &thresholds), Some("good"));
    }

    #[test]
    fn test_threshold_order_does_not_matter() {
        let thresholds = vec![
            Threshold::new(10.0, "bad"),
            Threshold::new(1.0, "good"),
            Threshold::new(5.0, "degraded"),
        ];
        assert_eq!(pick_threshold(3.0, &thresholds), Some("good"));
        assert_eq!(pick_threshold(7.0, &thresholds), Some("degraded"));
        assert_eq!(pick_threshold(10.0, &thresholds), Some("bad"));
    }

    #[test]
    fn test_below_lowest_threshold_is_untagged() {
        let host = StandardHost::new(Palette::default());
        let mut bindings = Bindings::new();
        host.assign(0.0, "paths", &[Threshold::new(1.0, "good")], &mut bindings);
        assert_eq!(bindings.color("paths"), None);

        host.assign(2.0, "paths", &[Threshold::new(1.0, "good")], &mut bindings);
        assert_eq!(bindings.color("paths"), Some("good"));
    }

    #[test]
    fn test_formatter_introspection() {
        let host = StandardHost::new(Palette::default());
        assert!(host.contains("{paths} [{format_path}]", "format_path"));
        assert!(!host.contains("{paths}", "icon"));
        assert!(!host.contains("[{icon}", "icon"));

        let keys: Vec<_> = host
            .placeholder_keys("{basename} ({pathname})")
            .into_iter()
            .collect();
        assert_eq!(keys, vec!["basename", "pathname"]);
    }

    #[test]
    fn test_render_error_propagates() {
        let host = StandardHost::new(Palette::default());
        assert!(host.render("[{paths}", &Bindings::new()).is_err());
    }
}
