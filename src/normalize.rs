use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Internal slot asset paths, e.g. `/syn33/<token>/slots/games/<leaf>`.
static SLOT_GAMES_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/syn33/[^/]+/slots/games/[^/]+").expect("slot games pattern"));

static REPEATED_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"/{2,}").expect("separator pattern"));

const ENVIRONMENT_PREFIX: &str = "/asia-ig7/";
const GROUP_WILDCARD_PREFIXES: &[&str] = &["/syn33/*/", "/games/*/"];
const GAMES_WILDCARD_SEGMENT: &str = "/games/*/";
const INDEX_SUFFIX: &str = "/*/index.html";

/// Turn a raw transaction path into a display label.
///
/// An empty result means the path must be excluded from the report. The
/// function never fails and `normalize_path(&normalize_path(p))` equals
/// `normalize_path(p)`.
pub fn normalize_path(raw: &str) -> String {
    if SLOT_GAMES_PATH.is_match(raw) {
        return String::new();
    }

    let mut path = raw.strip_prefix(ENVIRONMENT_PREFIX).unwrap_or(raw);
    for prefix in GROUP_WILDCARD_PREFIXES {
        path = path.strip_prefix(*prefix).unwrap_or(path);
    }

    // Stripping can expose another strippable segment; settle on a fixed point.
    let mut current = path.to_string();
    loop {
        let next = tidy(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn tidy(path: &str) -> String {
    let path = path.replace(GAMES_WILDCARD_SEGMENT, "/");
    let path = path.strip_suffix(INDEX_SUFFIX).unwrap_or(path.as_str());
    let path = REPEATED_SEPARATORS.replace_all(path, "/");
    path.trim_matches('/').to_string()
}

/// Normalize a JSON value; anything other than a string is excluded.
pub fn normalize_value(raw: Option<&Value>) -> String {
    match raw {
        Some(Value::String(s)) => normalize_path(s),
        _ => String::new(),
    }
}

/// Rejects aggregate rollups: empty labels, the bare wildcard and `prod/` paths.
pub fn is_reportable(label: &str) -> bool {
    let trimmed = label.trim();
    !(trimmed.is_empty() || trimmed == "*" || label.starts_with("prod/"))
}

/// Normalize and post-filter in one step.
pub fn display_label(raw: Option<&Value>) -> Option<String> {
    let label = normalize_value(raw);
    is_reportable(&label).then_some(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strips_environment_prefix() {
        assert_eq!(normalize_path("/asia-ig7/plinko"), "plinko");
        assert_eq!(normalize_path("/asia-ig7/lobby/home"), "lobby/home");
    }

    #[test]
    fn test_strips_group_wildcards() {
        assert_eq!(normalize_path("/syn33/*/crash"), "crash");
        assert_eq!(normalize_path("/games/*/mines"), "mines");
        // a mid-path `/games/*/` leaves one separator behind, never `lobbydice`
        assert_eq!(normalize_path("/lobby/games/*/dice"), "lobby/dice");
        assert_eq!(normalize_path("/a/games/*/b/games/*/c"), "a/b/c");
    }

    #[test]
    fn test_strips_index_suffix() {
        assert_eq!(normalize_path("/keno/*/index.html"), "keno");
        assert_eq!(normalize_path("/keno/*/index.html/*/index.html"), "keno");
        // only a trailing occurrence is removed
        assert_eq!(normalize_path("/keno/*/index.html/x"), "keno/*/index.html/x");
    }

    #[test]
    fn test_collapses_separators() {
        assert_eq!(normalize_path("//a///b//"), "a/b");
        assert_eq!(normalize_path("/"), "");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn test_slot_games_excluded() {
        let paths = [
            "/syn33/x/slots/games/foo",
            "/syn33/abc123/slots/games/bar/",
            "/syn33/t/slots/games/baz/*/index.html",
            "/syn33/t/slots/games/leaf/deeper/path",
        ];
        for p in paths {
            assert_eq!(normalize_path(p), "", "expected exclusion for {}", p);
        }
        // the wildcard group prefix alone is not an exclusion
        assert_eq!(normalize_path("/syn33/*/slots"), "slots");
    }

    #[test]
    fn test_idempotent() {
        let paths = [
            "/asia-ig7/plinko",
            "/asia-ig7/asia-ig7/x",
            "/syn33/*/games/*/aviator",
            "/a/games/games/*/*/b",
            "//x//*/index.html",
            "games/*/x",
            "/prod/total",
            "*",
            "lobby",
        ];
        for p in paths {
            let once = normalize_path(p);
            assert_eq!(normalize_path(&once), once, "not idempotent for {}", p);
        }
    }

    #[test]
    fn test_non_string_excluded() {
        assert_eq!(normalize_value(None), "");
        assert_eq!(normalize_value(Some(&Value::Null)), "");
        assert_eq!(normalize_value(Some(&json!(42))), "");
        assert_eq!(normalize_value(Some(&json!(["/a"]))), "");
        assert_eq!(normalize_value(Some(&json!("/asia-ig7/plinko"))), "plinko");
    }

    #[test]
    fn test_post_filter() {
        assert!(!is_reportable(""));
        assert!(!is_reportable("   "));
        assert!(!is_reportable("*"));
        assert!(!is_reportable("prod/summary"));
        assert!(is_reportable("production"));
        assert!(is_reportable("plinko"));
    }

    #[test]
    fn test_display_label() {
        assert_eq!(display_label(Some(&json!("/prod/x"))), None);
        assert_eq!(display_label(Some(&json!("/games/*/*"))), None);
        assert_eq!(display_label(Some(&json!("/asia-ig7/plinko"))), Some("plinko".to_string()));
    }
}
