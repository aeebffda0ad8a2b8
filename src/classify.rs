//! Service name classification: spatial group keys and role colors.
//!
//! [`RULES`] is the only color table in the crate. Node fills and the legend
//! panel both read it, so they cannot disagree.

/// A prefix → color rule, shown in the legend under `label`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRule {
    pub prefix: &'static str,
    pub color: &'static str,
    pub label: &'static str,
}

/// Evaluated in order; the first matching prefix wins.
pub const RULES: &[ColorRule] = &[
    ColorRule {
        prefix: "api",
        color: "#FF6B6B",
        label: "API Services",
    },
    ColorRule {
        prefix: "db",
        color: "#FFBE76",
        label: "Database Services",
    },
    ColorRule {
        prefix: "cache",
        color: "#45B7D1",
        label: "Cache Services",
    },
    ColorRule {
        prefix: "queue",
        color: "#FFA07A",
        label: "Queue Services",
    },
    ColorRule {
        prefix: "web",
        color: "#98D8C8",
        label: "Web Services",
    },
    ColorRule {
        prefix: "auth",
        color: "#4ECDC4",
        label: "Auth Services",
    },
    ColorRule {
        prefix: "util",
        color: "#45B7D1",
        label: "Utility Services",
    },
];

/// Used when no rule matches.
pub const FALLBACK: ColorRule = ColorRule {
    prefix: "other",
    color: "#A9A9A9",
    label: "Other Services",
};

/// Grouping key: everything before the first `-`, or the whole name.
pub fn group_key(name: &str) -> &str {
    name.split_once('-').map_or(name, |(head, _)| head)
}

/// The rule that colors `name`.
pub fn rule_for(name: &str) -> &'static ColorRule {
    first_match(RULES, name).unwrap_or(&FALLBACK)
}

fn first_match<'a>(rules: &'a [ColorRule], name: &str) -> Option<&'a ColorRule> {
    rules
        .iter()
        .find(|rule| starts_with_ignore_ascii_case(name, rule.prefix))
}

/// Display color for a service name.
pub fn classify(name: &str) -> &'static str {
    rule_for(name).color
}

/// Legend entries in table order, fallback last.
pub fn legend() -> impl Iterator<Item = &'static ColorRule> {
    RULES.iter().chain(std::iter::once(&FALLBACK))
}

fn starts_with_ignore_ascii_case(name: &str, prefix: &str) -> bool {
    name.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_key_splits_on_first_dash() {
        assert_eq!(group_key("api-gateway"), "api");
        assert_eq!(group_key("api-gateway-v2"), "api");
        assert_eq!(group_key("redis"), "redis");
        assert_eq!(group_key("-leading"), "");
        assert_eq!(group_key("trailing-"), "trailing");
        assert_eq!(group_key(""), "");
    }

    #[test]
    fn classify_is_case_insensitive_prefix_match() {
        assert_eq!(classify("api-gateway"), "#FF6B6B");
        assert_eq!(classify("API_v1"), "#FF6B6B");
        assert_eq!(classify("DbPrimary"), "#FFBE76");
        assert_eq!(classify("cache"), "#45B7D1");
        assert_eq!(classify("webapp"), "#98D8C8");
        assert_eq!(classify("utility"), "#45B7D1");
    }

    #[test]
    fn classify_does_not_look_at_group_key() {
        // "database" is not the "db" prefix; "queue-x" is
        assert_eq!(classify("database"), FALLBACK.color);
        assert_eq!(classify("queue-x"), "#FFA07A");
    }

    #[test]
    fn unmatched_names_get_fallback() {
        assert_eq!(classify("nginx"), "#A9A9A9");
        assert_eq!(classify(""), "#A9A9A9");
        assert_eq!(classify("ap"), "#A9A9A9");
        // multi-byte characters must not split a char boundary
        assert_eq!(classify("é"), "#A9A9A9");
        assert_eq!(classify("dé"), "#A9A9A9");
    }

    #[test]
    fn first_matching_rule_wins() {
        let rule = |prefix, color| ColorRule {
            prefix,
            color,
            label: "",
        };
        let overlapping = [rule("ca", "#111111"), rule("cache", "#222222")];
        assert_eq!(first_match(&overlapping, "CACHE-redis").unwrap().color, "#111111");

        let reversed = [rule("cache", "#222222"), rule("ca", "#111111")];
        assert_eq!(first_match(&reversed, "cache-redis").unwrap().color, "#222222");
        assert_eq!(first_match(&reversed, "cart").unwrap().color, "#111111");
        assert!(first_match(&reversed, "db").is_none());
    }

    #[test]
    fn every_rule_is_reachable() {
        for (index, rule) in RULES.iter().enumerate() {
            let name = format!("{}-service", rule.prefix.to_ascii_uppercase());
            let matched = first_match(RULES, &name).unwrap();
            assert_eq!(matched, &RULES[index]);
        }
    }

    #[test]
    fn legend_lists_rules_then_fallback() {
        let entries: Vec<_> = legend().collect();
        assert_eq!(entries.len(), RULES.len() + 1);
        assert_eq!(entries[0].prefix, "api");
        assert_eq!(entries.last().unwrap().label, "Other Services");
        for entry in &entries {
            assert!(entry.color.starts_with('#'));
        }
    }
}
