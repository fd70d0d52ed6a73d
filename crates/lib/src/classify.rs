//! Entry classification: one normalized payload to zero or more timeline emissions.
//!
//! Rules are checked in a fixed order and are not exclusive; a payload that matches
//! several rules produces one emission per rule, in rule order:
//!
//! 1. result notice
//! 2. similar issues (one per issue, deduplicated) / 3. explicit "no similar issues"
//! 4. knowledge article (deduplicated)
//! 5. status, with ticket details when present
//! 6. generic message, unless status, article or non-empty similar issues are present
//!
//! Rule 6 does not look at the result notice, so a payload carrying both emits both.

use crate::payload::{Article, InboundPayload, SimilarIssue, TicketDetails, RESULTS_RETRIEVED};
use crate::sanitize::sanitize;
use crate::timeline::{Emission, TimelineEntry};

pub const RESULTS_CONFIRMATION: &str = "Results retrieved successfully.";
pub const NO_SIMILAR_ISSUES: &str = "❌ No similar issues found.";
pub const NO_ARTICLE_DETAILS: &str = "No details available";

/// Rendered in place of an issue key, ticket key or ticket id the service did not send.
const MISSING_FIELD: &str = "undefined";

pub fn classify(payload: &InboundPayload) -> Vec<Emission> {
    let mut out = Vec::new();

    if payload.result_notice.as_deref() == Some(RESULTS_RETRIEVED) {
        out.push(Emission::always(TimelineEntry::bot(RESULTS_CONFIRMATION)));
    }

    match payload.similar_issues.as_deref() {
        Some(issues) if !issues.is_empty() => {
            out.extend(
                issues
                    .iter()
                    .map(|issue| Emission::if_absent(TimelineEntry::bot(render_issue(issue)))),
            );
        }
        Some(_) => out.push(Emission::always(TimelineEntry::bot(NO_SIMILAR_ISSUES))),
        None => {}
    }

    if let Some(article) = &payload.article {
        out.push(Emission::if_absent(TimelineEntry::bot(render_article(article))));
    }

    if let Some(status) = &payload.status {
        let status = sanitize(status);
        let text = match &payload.ticket_details {
            Some(ticket) => render_ticket(&status, ticket),
            None => status.into_owned(),
        };
        out.push(Emission::always(TimelineEntry::bot(text)));
    }

    if let Some(message) = &payload.generic_message {
        let has_issues = payload
            .similar_issues
            .as_ref()
            .is_some_and(|issues| !issues.is_empty());
        if payload.status.is_none() && payload.article.is_none() && !has_issues {
            out.push(Emission::always(TimelineEntry::bot(message.clone())));
        }
    }

    out
}

pub fn render_issue(issue: &SimilarIssue) -> String {
    format!(
        "🔍 Similar Issue Found:\n\
         🔹 Issue Key: {}\n\
         🔹 Summary: {}\n\
         🔹 Status: {}\n\
         🛠 Solution: {}",
        issue.key.as_deref().unwrap_or(MISSING_FIELD),
        issue.summary.as_deref().unwrap_or("N/A"),
        issue.status.as_deref().unwrap_or("Unknown"),
        issue.solution.as_deref().unwrap_or("Not provided"),
    )
}

pub fn render_article(article: &Article) -> String {
    let points = article
        .excerpt
        .as_deref()
        .map(numbered_points)
        .filter(|p| !p.is_empty());
    format!(
        "📘 Knowledge Article:\n\
         🔹 Title: {}\n\
         🔹 Points:\n\
         {}\n\
         🔹 Read more: {}",
        article.title.as_deref().unwrap_or("N/A"),
        points.as_deref().unwrap_or(NO_ARTICLE_DETAILS),
        article.view_link.as_deref().unwrap_or("#"),
    )
}

/// Sanitize, split on newlines, drop blank lines, number the rest from 1.
fn numbered_points(excerpt: &str) -> String {
    sanitize(excerpt)
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| format!("{}) {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_ticket(status: &str, ticket: &TicketDetails) -> String {
    format!(
        "🎫 {}\n🔹 Ticket Key: {}\n🔹 Ticket ID: {}",
        status,
        ticket.ticket_key.as_deref().unwrap_or(MISSING_FIELD),
        ticket.ticket_id.as_deref().unwrap_or(MISSING_FIELD),
    )
}
