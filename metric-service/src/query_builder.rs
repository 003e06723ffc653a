//! Query template rewriting.
//!
//! Turns a raw metric template plus request parameters into an executable
//! statement and a positional parameter list. Two token kinds exist:
//!
//! - inline `#name`: the parameter value is stripped down to
//!   `[A-Za-z0-9_.$]` and spliced directly into the SQL text (every
//!   occurrence). This supports dynamic identifiers that standard SQL
//!   cannot bind positionally.
//! - bound `$name`: the raw value goes on the positional parameter list
//!   and only the first occurrence of the token becomes the driver's
//!   placeholder marker. Repeated `$name` tokens keep their literal text
//!   after the first; that asymmetry is long-standing observable behavior
//!   and is kept as-is (see the tests).
//!
//! Values of 64 or more characters are never substituted for either token
//! kind; the cap is a defensive limit against pathological input.

use crate::drivers::Driver;

/// Substitution values at or above this length are ignored.
const MAX_VALUE_LEN: usize = 64;

/// Query-string keys that steer output format rather than substitution.
const CONTROL_KEYS: [&str; 2] = ["json", "text"];

/// Rewrites `template` using `params`, returning the executable SQL and
/// the positional parameters to bind.
///
/// Only the first value per key is considered. Placeholders with no
/// matching parameter are left verbatim; the driver rejects them at
/// execution time, which is an accepted failure mode.
pub fn build(
    template: &str,
    params: &[(String, String)],
    driver: &dyn Driver,
) -> (String, Vec<String>) {
    let mut query = template.to_string();
    let mut bound: Vec<String> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for (key, value) in params {
        if CONTROL_KEYS.contains(&key.as_str()) || seen.contains(&key.as_str()) {
            continue;
        }
        seen.push(key.as_str());

        if value.len() >= MAX_VALUE_LEN {
            continue;
        }

        let inline_token = format!("#{}", key);
        if query.contains(&inline_token) {
            query = query.replace(&inline_token, &sanitize(value));
        }

        let bound_token = format!("${}", key);
        if query.contains(&bound_token) {
            let marker = driver.placeholder(bound.len() + 1);
            query = query.replacen(&bound_token, &marker, 1);
            bound.push(value.clone());
        }
    }

    (query, bound)
}

/// Strips every character outside `[A-Za-z0-9_.$]`. This is sanitization,
/// not escaping: the residue lands directly in SQL text.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{PostgresDriver, SqliteDriver};

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn inline_sanitizes_and_replaces_every_occurrence() {
        let (sql, bound) = build(
            "SELECT * FROM #t JOIN #t_audit ON #t.id = #t_audit.id",
            &pairs(&[("t", "orders;DROP")]),
            &SqliteDriver,
        );
        // The semicolon is stripped, and both `#t` occurrences go; note the
        // textual `#t` prefix match inside `#t_audit` is also rewritten.
        assert_eq!(
            sql,
            "SELECT * FROM ordersDROP JOIN ordersDROP_audit ON ordersDROP.id = ordersDROP_audit.id"
        );
        assert!(bound.is_empty());
    }

    #[test]
    fn bound_replaces_only_the_first_occurrence() {
        // Documented, reproduced behavior: a template naming the same bound
        // parameter twice gets one marker and one literal leftover token.
        let (sql, bound) = build(
            "WHERE a=$x OR b=$x",
            &pairs(&[("x", "5")]),
            &SqliteDriver,
        );
        assert_eq!(sql, "WHERE a=? OR b=$x");
        assert_eq!(bound, vec!["5".to_string()]);
    }

    #[test]
    fn bound_value_is_passed_raw() {
        let (sql, bound) = build(
            "WHERE name=$name",
            &pairs(&[("name", "Rob'; DROP TABLE t--")]),
            &SqliteDriver,
        );
        assert_eq!(sql, "WHERE name=?");
        assert_eq!(bound, vec!["Rob'; DROP TABLE t--".to_string()]);
    }

    #[test]
    fn long_values_are_never_substituted() {
        let long = "x".repeat(64);
        let (sql, bound) = build(
            "SELECT * FROM #t WHERE id=$t",
            &pairs(&[("t", &long)]),
            &SqliteDriver,
        );
        assert_eq!(sql, "SELECT * FROM #t WHERE id=$t");
        assert!(bound.is_empty());
    }

    #[test]
    fn sixty_three_characters_still_substitute() {
        let value = "y".repeat(63);
        let (sql, bound) = build("WHERE id=$v", &pairs(&[("v", &value)]), &SqliteDriver);
        assert_eq!(sql, "WHERE id=?");
        assert_eq!(bound, vec![value]);
    }

    #[test]
    fn unmatched_placeholders_stay_verbatim() {
        let (sql, bound) = build(
            "SELECT #a FROM t WHERE id=$b",
            &pairs(&[("other", "1")]),
            &SqliteDriver,
        );
        assert_eq!(sql, "SELECT #a FROM t WHERE id=$b");
        assert!(bound.is_empty());
    }

    #[test]
    fn control_keys_do_not_substitute() {
        let (sql, bound) = build(
            "SELECT #json FROM t WHERE id=$text",
            &pairs(&[("json", "1"), ("text", "2")]),
            &SqliteDriver,
        );
        assert_eq!(sql, "SELECT #json FROM t WHERE id=$text");
        assert!(bound.is_empty());
    }

    #[test]
    fn only_the_first_value_per_key_is_used() {
        let (sql, bound) = build(
            "WHERE id=$id",
            &pairs(&[("id", "1"), ("id", "2")]),
            &SqliteDriver,
        );
        assert_eq!(sql, "WHERE id=?");
        assert_eq!(bound, vec!["1".to_string()]);
    }

    #[test]
    fn postgres_markers_are_numbered_in_bind_order() {
        let (sql, bound) = build(
            "WHERE a=$a AND b=$b",
            &pairs(&[("a", "1"), ("b", "2")]),
            &PostgresDriver,
        );
        assert_eq!(sql, "WHERE a=$1 AND b=$2");
        assert_eq!(bound, vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn inline_then_bound_applies_to_the_rewritten_text() {
        let (sql, bound) = build(
            "SELECT COUNT(*) AS n FROM #table WHERE id=$id",
            &pairs(&[("table", "orders"), ("id", "42")]),
            &SqliteDriver,
        );
        assert_eq!(sql, "SELECT COUNT(*) AS n FROM orders WHERE id=?");
        assert_eq!(bound, vec!["42".to_string()]);
    }
}
