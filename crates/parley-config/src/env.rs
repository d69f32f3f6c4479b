use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Substitute `{{ env.NAME }}` placeholders in raw config text
///
/// `{{ env.NAME | default("value") }}` falls back to `value` when `NAME` is
/// unset. Comment lines are copied through untouched so commented-out
/// secrets never have to exist in the environment.
pub(crate) fn expand_env(input: &str) -> anyhow::Result<String> {
    let mut lines = Vec::new();

    for line in input.split('\n') {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_owned());
        } else {
            lines.push(expand_line(line)?);
        }
    }

    Ok(lines.join("\n"))
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r#"\{\{\s*([A-Za-z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\)\s*)?\}\}"#)
            .expect("placeholder pattern is valid")
    })
}

fn expand_line(line: &str) -> anyhow::Result<String> {
    let mut expanded = String::with_capacity(line.len());
    let mut cursor = 0;

    for captures in placeholder().captures_iter(line) {
        let Some(whole) = captures.get(0) else {
            continue;
        };

        expanded.push_str(&line[cursor..whole.start()]);
        expanded.push_str(&resolve(&captures)?);
        cursor = whole.end();
    }

    expanded.push_str(&line[cursor..]);
    Ok(expanded)
}

fn resolve(captures: &Captures<'_>) -> anyhow::Result<String> {
    let key = captures.get(1).map_or("", |m| m.as_str());
    let fallback = captures.get(2).map(|m| m.as_str());

    let Some(name) = key.strip_prefix("env.").filter(|name| !name.contains('.')) else {
        anyhow::bail!("unsupported placeholder `{key}`: only `env.NAME` is allowed");
    };

    match (std::env::var(name), fallback) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(fallback)) => Ok(fallback.to_owned()),
        (Err(_), None) => anyhow::bail!("environment variable `{name}` is not set"),
    }
}
