//! Build status message formatting.

use crate::payload::BuildPayload;

/// Human-readable build duration, e.g. `in 2 min 5 sec` or `in 45 seconds`.
pub fn format_duration(duration: Option<u64>) -> String {
    let total = duration.unwrap_or(0);
    let minutes = total / 60;
    let seconds = total % 60;

    match (minutes, seconds) {
        (0, s) => format!("in {} seconds", s),
        (m, 0) => format!("in {} min", m),
        (m, s) => format!("in {} min {} sec", m, s),
    }
}

/// Render the chat message for a build.
///
/// Pull request builds additionally link the PR with its number and title.
pub fn format_message(payload: &BuildPayload, repository_slug: &str) -> String {
    let color = payload.build_state().color();

    let mut message = format!(
        r#"<b><font color="{color}">Build <a href="{build_url}">#{number}</a></font></b> (<a href="{compare_url}">{commit}</a>) of <b>{slug}@{branch}</b>"#,
        color = color,
        build_url = payload.build_url,
        number = payload.number,
        compare_url = payload.compare_url,
        commit = payload.short_commit(),
        slug = repository_slug,
        branch = payload.branch,
    );

    if payload.is_pull_request() {
        let pr_number = payload
            .pull_request_number
            .map(|n| n.to_string())
            .unwrap_or_default();
        message.push_str(&format!(
            r#" in <b>PR <a href="{}">#{} {}</a></b>"#,
            payload.compare_url,
            pr_number,
            payload.pull_request_title.as_deref().unwrap_or_default(),
        ));
    }

    message.push_str(&format!(
        " by {} {} {}",
        payload.author_name,
        payload.state,
        format_duration(payload.duration)
    ));

    message
}
