use glob::{glob_with, MatchOptions};
use nix::unistd::User;
use std::path::PathBuf;

/// Expands path patterns against the live filesystem.
pub struct Scanner {
    options: MatchOptions,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            // `*` must not cross directories or pick up dotfiles.
            options: MatchOptions {
                case_sensitive: true,
                require_literal_separator: true,
                require_literal_leading_dot: true,
            },
        }
    }

    /// Replaces a leading `~` or `~user`; everything else is left untouched.
    pub fn expand_user(&self, path: &str) -> String {
        let Some(rest) = path.strip_prefix('~') else {
            return path.to_string();
        };
        let (user, tail) = match rest.find('/') {
            Some(index) => rest.split_at(index),
            None => (rest, ""),
        };

        let home = if user.is_empty() {
            dirs::home_dir()
        } else {
            user_home(user)
        };

        match home {
            Some(home) => {
                let expanded = format!("{}{}", home.to_string_lossy().trim_end_matches('/'), tail);
                if expanded.is_empty() {
                    "/".to_string()
                } else {
                    expanded
                }
            }
            None => path.to_string(),
        }
    }

    /// Matches `pattern` against the filesystem. A malformed pattern or an
    /// unreadable entry contributes nothing. `**` is not recursive.
    pub fn glob(&self, pattern: &str) -> Vec<String> {
        let paths = match glob_with(&normalize_pattern(pattern), self.options) {
            Ok(paths) => paths,
            Err(err) => {
                log::debug!("Invalid glob pattern {:?}: {}", pattern, err);
                return Vec::new();
            }
        };

        paths
            .filter_map(|entry| match entry {
                Ok(path) => Some(path.to_string_lossy().into_owned()),
                Err(err) => {
                    log::debug!("Skipping unreadable path: {}", err);
                    None
                }
            })
            .collect()
    }
}

/// Home directory from the passwd database; `None` for unknown users.
fn user_home(user: &str) -> Option<PathBuf> {
    match User::from_name(user) {
        Ok(found) => found.map(|user| user.dir),
        Err(err) => {
            log::debug!("Failed to look up user {:?}: {}", user, err);
            None
        }
    }
}

/// Collapses runs of `*` so that `**` matches like a single `*`.
fn normalize_pattern(pattern: &str) -> String {
    let mut normalized = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == '*' && normalized.ends_with('*') {
            continue;
        }
        normalized.push(c);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_expand_user_home() {
        let scanner = Scanner::new();
        let home = dirs::home_dir().unwrap();
        let home = home.to_string_lossy();
        let home = home.trim_end_matches('/');

        assert_eq!(scanner.expand_user("~/Videos/*.mp4"), format!("{}/Videos/*.mp4", home));
        assert_eq!(scanner.expand_user("/tmp/~x"), "/tmp/~x");
        assert_eq!(scanner.expand_user("relative/*"), "relative/*");
    }

    #[test]
    fn test_expand_user_unknown_user() {
        let scanner = Scanner::new();
        assert_eq!(
            scanner.expand_user("~no-such-user-for-tests/a"),
            "~no-such-user-for-tests/a"
        );
    }

    #[test]
    fn test_expand_user_system_account() {
        let root = User::from_name("root").unwrap().unwrap();
        let home = root.dir.to_string_lossy();
        let home = home.trim_end_matches('/');

        assert_eq!(Scanner::new().expand_user("~root/x"), format!("{}/x", home));
        let bare = Scanner::new().expand_user("~root");
        assert_eq!(bare, if home.is_empty() { "/" } else { home });
    }

    #[test]
    fn test_normalize_pattern() {
        assert_eq!(normalize_pattern("/d/**/f"), "/d/*/f");
        assert_eq!(normalize_pattern("/d/a***"), "/d/a*");
        assert_eq!(normalize_pattern("/d/*.txt"), "/d/*.txt");
    }

    #[test]
    fn test_double_star_is_not_recursive() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a").join("b")).unwrap();
        for file in ["f", "a/f", "a/b/f", "ab"] {
            fs::write(dir.path().join(file), "").unwrap();
        }
        let root = dir.path().to_string_lossy();
        let scanner = Scanner::new();

        assert_eq!(
            scanner.glob(&format!("{}/**/f", root)),
            vec![format!("{}/a/f", root)]
        );

        let mut found = scanner.glob(&format!("{}/a**", root));
        found.sort();
        assert_eq!(found, vec![format!("{}/a", root), format!("{}/ab", root)]);
    }

    #[test]
    fn test_glob_matches_wildcards_and_literals() {
        let dir = tempdir().unwrap();
        for name in ["a1", "a2", "b.txt", ".a3"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let root = dir.path().to_string_lossy();
        let scanner = Scanner::new();

        let mut found = scanner.glob(&format!("{}/a*", root));
        found.sort();
        assert_eq!(found, vec![format!("{}/a1", root), format!("{}/a2", root)]);

        assert_eq!(
            scanner.glob(&format!("{}/b.txt", root)),
            vec![format!("{}/b.txt", root)]
        );
        assert!(scanner.glob(&format!("{}/missing", root)).is_empty());
    }

    #[test]
    fn test_glob_star_stays_in_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("nested"), "").unwrap();
        let root = dir.path().to_string_lossy();

        let found = Scanner::new().glob(&format!("{}/*", root));
        assert_eq!(found, vec![format!("{}/sub", root)]);
    }

    #[test]
    fn test_invalid_pattern_is_empty() {
        assert!(Scanner::new().glob("/tmp/[").is_empty());
    }
}
