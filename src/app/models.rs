use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_FORMAT: &str = "\\?color=paths [\\?if=paths ●|■]";
pub const DEFAULT_FORMAT_PATH: &str = "{basename}";
pub const DEFAULT_FORMAT_PATH_SEPARATOR: &str = " ";
pub const DEFAULT_CACHE_TIMEOUT: u64 = 10;
pub const DEFAULT_ICON_AVAILABLE: &str = "●";
pub const DEFAULT_ICON_UNAVAILABLE: &str = "■";

/// `path` may be written as a single string or as a list.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum PathSpec {
    One(String),
    Many(Vec<String>),
}

impl PathSpec {
    pub fn is_empty(&self) -> bool {
        match self {
            PathSpec::One(path) => path.is_empty(),
            PathSpec::Many(paths) => paths.is_empty(),
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            PathSpec::One(path) => vec![path],
            PathSpec::Many(paths) => paths,
        }
    }
}

/// A `(lower bound, label)` pair, written as `[0, "bad"]`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Threshold(pub f64, pub String);

impl Threshold {
    pub fn new(bound: f64, label: impl Into<String>) -> Self {
        Self(bound, label.into())
    }

    pub fn bound(&self) -> f64 {
        self.0
    }

    pub fn label(&self) -> &str {
        &self.1
    }
}

pub fn default_thresholds() -> Vec<Threshold> {
    vec![Threshold::new(0.0, "bad"), Threshold::new(1.0, "good")]
}

/// Raw settings of one module instance, as read from the config file and CLI.
/// Every field is optional so that layers can be merged before defaults apply.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ModuleConfig {
    pub path: Option<PathSpec>,
    pub format: Option<String>,
    pub format_path: Option<String>,
    pub format_path_separator: Option<String>,
    pub cache_timeout: Option<u64>,
    pub thresholds: Option<Vec<Threshold>>,
    pub icon_available: Option<String>,
    pub icon_unavailable: Option<String>,
    /// Obsolete name of `icon_available`.
    pub format_available: Option<String>,
    /// Obsolete name of `icon_unavailable`.
    pub format_unavailable: Option<String>,
}

/// Named colors used by threshold labels and `\?color=` commands.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Palette {
    pub good: String,
    pub bad: String,
    pub degraded: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            good: "#00FF00".to_string(),
            bad: "#FF0000".to_string(),
            degraded: "#FFFF00".to_string(),
        }
    }
}

impl Palette {
    /// Resolves a palette name or a literal `#rrggbb` color.
    pub fn resolve<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        match name {
            "good" => Some(&self.good),
            "bad" => Some(&self.bad),
            "degraded" => Some(&self.degraded),
            _ if name.starts_with('#') => Some(name),
            _ => None,
        }
    }
}

/// A concrete path produced by expanding one pattern.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExpandedPath {
    pathname: String,
}

impl ExpandedPath {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
        }
    }

    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    pub fn basename(&self) -> String {
        Path::new(&self.pathname)
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    }
}

/// Keys understood by the `format_path` template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PathKey {
    Basename,
    Pathname,
}

impl PathKey {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "basename" => Some(PathKey::Basename),
            "pathname" => Some(PathKey::Pathname),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PathKey::Basename => "basename",
            PathKey::Pathname => "pathname",
        }
    }

    pub fn value(self, path: &ExpandedPath) -> String {
        match self {
            PathKey::Basename => path.basename(),
            PathKey::Pathname => path.pathname().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_spec_accepts_string_or_list() {
        let one: ModuleConfig = toml::from_str(r#"path = "/tmp/a*""#).unwrap();
        assert_eq!(one.path, Some(PathSpec::One("/tmp/a*".into())));

        let many: ModuleConfig = toml::from_str(r#"path = ["/tmp/a", "~/b"]"#).unwrap();
        assert_eq!(
            many.path.unwrap().into_vec(),
            vec!["/tmp/a".to_string(), "~/b".to_string()]
        );
    }

    #[test]
    fn test_thresholds_from_pairs() {
        let config: ModuleConfig =
            toml::from_str(r#"thresholds = [[0, "bad"], [2.5, "good"]]"#).unwrap();
        assert_eq!(
            config.thresholds.unwrap(),
            vec![Threshold::new(0.0, "bad"), Threshold::new(2.5, "good")]
        );
    }

    #[test]
    fn test_basename() {
        assert_eq!(ExpandedPath::new("/tmp/b.txt").basename(), "b.txt");
        assert_eq!(ExpandedPath::new("relative").basename(), "relative");
        assert_eq!(ExpandedPath::new("/").basename(), "");
    }

    #[test]
    fn test_palette_resolve() {
        let palette = Palette::default();
        assert_eq!(palette.resolve("bad"), Some("#FF0000"));
        assert_eq!(palette.resolve("#123456"), Some("#123456"));
        assert_eq!(palette.resolve("paths"), None);
    }
}
