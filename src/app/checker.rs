//! Reports whether configured files or directories exist.

use crate::app::error::Error;
use crate::app::host::Host;
use crate::app::models::{
    default_thresholds, ExpandedPath, ModuleConfig, PathKey, Threshold, DEFAULT_CACHE_TIMEOUT,
    DEFAULT_FORMAT, DEFAULT_FORMAT_PATH, DEFAULT_FORMAT_PATH_SEPARATOR, DEFAULT_ICON_AVAILABLE,
    DEFAULT_ICON_UNAVAILABLE,
};
use crate::app::template::{Bindings, Composite};
use std::time::{Duration, SystemTime};

const DEPRECATION_NOTICE: &str = "DEPRECATION: you are using old style configuration \
                                  parameters you should update to use the new format.";

/// The outcome of one poll.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub count: usize,
    pub paths: Vec<ExpandedPath>,
    /// One rendered `format_path` per match, in `paths` order.
    pub format_paths: Vec<Composite>,
    pub icon: Option<String>,
    pub output: Composite,
    /// The host should not poll again before this instant.
    pub valid_until: SystemTime,
}

impl Evaluation {
    pub fn text(&self) -> String {
        self.output.to_string()
    }
}

#[derive(Debug, Clone)]
struct Icons {
    available: String,
    unavailable: String,
}

impl Icons {
    fn select(&self, count: usize) -> &str {
        if count > 0 {
            &self.available
        } else {
            &self.unavailable
        }
    }
}

pub struct PathChecker<H> {
    host: H,
    patterns: Vec<String>,
    format: String,
    format_path: String,
    separator: String,
    cache_timeout: Duration,
    thresholds: Vec<Threshold>,
    icons: Icons,
    wants_icon: bool,
    /// `Some` when `format` uses `{format_path}`; lists the keys it needs.
    path_keys: Option<Vec<PathKey>>,
}

impl<H: Host> PathChecker<H> {
    pub fn new(config: ModuleConfig, host: H) -> Result<Self, Error> {
        let patterns = match config.path {
            Some(path) if !path.is_empty() => path.into_vec(),
            _ => return Err(Error::MissingPath),
        };
        let patterns: Vec<String> = patterns.iter().map(|p| host.expand_user(p)).collect();

        let on = renamed(&host, config.icon_available, config.format_available, "icon_available");
        let off = renamed(
            &host,
            config.icon_unavailable,
            config.format_unavailable,
            "icon_unavailable",
        );
        let icons = Icons {
            available: on.clone().unwrap_or_else(|| DEFAULT_ICON_AVAILABLE.to_string()),
            unavailable: off.clone().unwrap_or_else(|| DEFAULT_ICON_UNAVAILABLE.to_string()),
        };

        let mut format = config.format.unwrap_or_else(|| DEFAULT_FORMAT.to_string());
        if format == DEFAULT_FORMAT && (on.is_some() || off.is_some()) {
            format = format!(
                "\\?color=paths [\\?if=paths {}|{}]",
                icons.available, icons.unavailable
            );
            host.log(DEPRECATION_NOTICE);
        }

        let format_path = config
            .format_path
            .unwrap_or_else(|| DEFAULT_FORMAT_PATH.to_string());
        let path_keys = host.contains(&format, "format_path").then(|| {
            host.placeholder_keys(&format_path)
                .iter()
                .filter_map(|key| PathKey::from_key(key))
                .collect()
        });
        let wants_icon = host.contains(&format, "icon");

        Ok(Self {
            patterns,
            format,
            format_path,
            separator: config
                .format_path_separator
                .unwrap_or_else(|| DEFAULT_FORMAT_PATH_SEPARATOR.to_string()),
            cache_timeout: Duration::from_secs(
                config.cache_timeout.unwrap_or(DEFAULT_CACHE_TIMEOUT),
            ),
            thresholds: config.thresholds.unwrap_or_else(default_thresholds),
            icons,
            wants_icon,
            path_keys,
            host,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// Re-expands every pattern and renders the result.
    pub fn evaluate(&self) -> Result<Evaluation, Error> {
        let mut paths: Vec<ExpandedPath> = self
            .patterns
            .iter()
            .flat_map(|pattern| self.host.glob(pattern))
            .map(ExpandedPath::new)
            .collect();
        paths.sort();
        let count = paths.len();

        let icon = self
            .wants_icon
            .then(|| self.icons.select(count).to_string());

        let (format_paths, joined) = match &self.path_keys {
            Some(keys) => {
                let rendered = self.render_paths(&paths, keys)?;
                let separator = self.host.render(&self.separator, &Bindings::new())?;
                let joined = self.host.join(&separator, &rendered);
                (rendered, Some(joined))
            }
            None => (Vec::new(), None),
        };

        let mut bindings = Bindings::new();
        if !self.thresholds.is_empty() {
            self.host
                .assign(count as f64, "paths", &self.thresholds, &mut bindings);
        }
        bindings.insert("paths", count as i64);
        if let Some(joined) = joined {
            bindings.insert("format_path", joined);
        }
        if let Some(icon) = &icon {
            bindings.insert("icon", icon.as_str());
        }

        let output = self.host.render(&self.format, &bindings)?;

        Ok(Evaluation {
            count,
            paths,
            format_paths,
            icon,
            output,
            valid_until: self.host.now_plus(self.cache_timeout),
        })
    }

    fn render_paths(
        &self,
        paths: &[ExpandedPath],
        keys: &[PathKey],
    ) -> Result<Vec<Composite>, Error> {
        paths
            .iter()
            .map(|path| {
                let mut bindings = Bindings::new();
                for key in keys {
                    bindings.insert(key.as_str(), key.value(path));
                }
                self.host
                    .render(&self.format_path, &bindings)
                    .map_err(Error::from)
            })
            .collect()
    }
}

/// Prefers `current`; falls back to the obsolete parameter with a notice.
fn renamed<H: Host>(
    host: &H,
    current: Option<String>,
    obsolete: Option<String>,
    name: &str,
) -> Option<String> {
    if current.is_some() {
        return current;
    }
    if obsolete.is_some() {
        host.log(&format!("obsolete parameter use `{}`", name));
    }
    obsolete
}
