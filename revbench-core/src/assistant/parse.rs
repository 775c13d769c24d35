//! Lenient parsing of model replies.
//!
//! Models wrap code in markdown fences, quote numbers, invent severities and
//! sometimes talk before the JSON. Everything here narrows that into the
//! closed types of [`crate::types`].

use serde::Deserialize;
use serde_json::Value;

use crate::error::AssistantError;
use crate::types::{Analysis, Issue, ProjectAnalysis, SafetyStatus, Severity};

/// Returns the body of the first fenced block, or the trimmed text when there
/// is no fence. An unterminated fence runs to the end of the text.
pub fn strip_code_fences(text: &str) -> String {
    let Some(open) = text.find("```") else {
        return text.trim().to_owned();
    };
    let after_open = &text[open + 3..];
    // Skip the info string (```rust).
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(after_open.len());
    let body = &after_open[body_start..];
    let body = match body.find("\n```") {
        Some(close) => &body[..close],
        None => body.strip_suffix("```").unwrap_or(body),
    };
    let mut out = body.trim_end_matches(['\n', '\r']).to_owned();
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Slices from the first `{` to the last `}`; leaves the text alone otherwise.
fn json_object(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawIssue {
    title: String,
    description: String,
    severity: Option<String>,
    line: Option<Value>,
    suggestion: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAnalysis {
    status: Option<String>,
    #[serde(alias = "qualityScore")]
    quality_score: Option<Value>,
    #[serde(alias = "securityScore")]
    security_score: Option<Value>,
    #[serde(alias = "performanceScore")]
    performance_score: Option<Value>,
    summary: String,
    issues: Vec<RawIssue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProjectAnalysis {
    summary: String,
    #[serde(alias = "architectureScore")]
    architecture_score: Option<Value>,
    highlights: Vec<String>,
    issues: Vec<RawIssue>,
}

/// A 0-100 score from a number or numeric string; anything else is 0.
fn score(value: Option<&Value>) -> u8 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse().unwrap_or(0.0),
        _ => 0.0,
    };
    n.round().clamp(0.0, 100.0) as u8
}

fn line(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn issue(raw: RawIssue) -> Issue {
    Issue {
        title: raw.title,
        description: raw.description,
        severity: raw.severity.as_deref().map(Severity::parse_lenient).unwrap_or(Severity::Info),
        line: line(raw.line.as_ref()),
        suggestion: raw.suggestion.filter(|s| !s.trim().is_empty()),
    }
}

/// Status implied by the worst issue: critical/high is danger, medium is a
/// warning, anything milder is safe.
pub fn derive_status(issues: &[Issue]) -> SafetyStatus {
    match issues.iter().map(|i| i.severity).min() {
        Some(Severity::Critical | Severity::High) => SafetyStatus::Danger,
        Some(Severity::Medium) => SafetyStatus::Warning,
        _ => SafetyStatus::Safe,
    }
}

fn status(raw: Option<&str>, issues: &[Issue]) -> SafetyStatus {
    match raw.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
        Some("SAFE") => SafetyStatus::Safe,
        Some("WARNING") => SafetyStatus::Warning,
        Some("DANGER") => SafetyStatus::Danger,
        _ => derive_status(issues),
    }
}

/// Parses a file analysis reply.
///
/// # Errors
///
/// `MalformedAnalysis` when no JSON object can be read from the reply.
pub fn parse_analysis(reply: &str) -> Result<Analysis, AssistantError> {
    let stripped = strip_code_fences(reply);
    let raw: RawAnalysis = serde_json::from_str(json_object(&stripped))?;
    let issues: Vec<Issue> = raw.issues.into_iter().map(issue).collect();
    Ok(Analysis {
        status: status(raw.status.as_deref(), &issues),
        quality_score: score(raw.quality_score.as_ref()),
        security_score: score(raw.security_score.as_ref()),
        performance_score: score(raw.performance_score.as_ref()),
        summary: raw.summary,
        issues,
    })
}

/// Parses a whole-project analysis reply.
///
/// # Errors
///
/// `MalformedAnalysis` when no JSON object can be read from the reply.
pub fn parse_project_analysis(reply: &str) -> Result<ProjectAnalysis, AssistantError> {
    let stripped = strip_code_fences(reply);
    let raw: RawProjectAnalysis = serde_json::from_str(json_object(&stripped))?;
    Ok(ProjectAnalysis {
        summary: raw.summary,
        architecture_score: score(raw.architecture_score.as_ref()),
        highlights: raw.highlights,
        issues: raw.issues.into_iter().map(issue).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fences("```rust\nfn a() {}\n```"), "fn a() {}\n");
        assert_eq!(strip_code_fences("Here you go:\n```\nx = 1\n```\nDone."), "x = 1\n");
        assert_eq!(strip_code_fences("  plain text \n"), "plain text");
        assert_eq!(strip_code_fences("```py\nprint(1)\n"), "print(1)\n");
    }

    #[test]
    fn analysis_is_parsed_leniently() {
        let reply = r#"Sure!
```json
{
  "status": "warning",
  "qualityScore": "85",
  "security_score": 120,
  "performance_score": 70.4,
  "summary": "Mostly fine.",
  "issues": [
    {"title": "SQL built by format!", "description": "injection", "severity": "CRITICAL", "line": "12"},
    {"title": "Naming", "description": "style", "severity": "nit", "suggestion": ""}
  ]
}
```"#;
        let a = parse_analysis(reply).unwrap();
        assert_eq!(a.status, SafetyStatus::Warning);
        assert_eq!((a.quality_score, a.security_score, a.performance_score), (85, 100, 70));
        assert_eq!(a.issues[0].severity, Severity::Critical);
        assert_eq!(a.issues[0].line, Some(12));
        assert_eq!(a.issues[1].severity, Severity::Info);
        assert_eq!(a.issues[1].suggestion, None);
    }

    #[test]
    fn unknown_status_falls_back_to_worst_issue() {
        let a = parse_analysis(r#"{"status": "meh", "issues": [{"title": "t", "severity": "high"}]}"#).unwrap();
        assert_eq!(a.status, SafetyStatus::Danger);
        let a = parse_analysis(r#"{"summary": "clean"}"#).unwrap();
        assert_eq!(a.status, SafetyStatus::Safe);
        assert_eq!(a.quality_score, 0);
    }

    #[test]
    fn non_json_reply_is_malformed() {
        assert!(matches!(parse_analysis("I cannot help with that."), Err(AssistantError::MalformedAnalysis(_))));
    }

    #[test]
    fn project_analysis_parses() {
        let p = parse_project_analysis(
            r#"{"summary": "Layered", "architectureScore": 77, "highlights": ["clear modules"], "issues": []}"#,
        )
        .unwrap();
        assert_eq!(p.architecture_score, 77);
        assert_eq!(p.highlights, vec!["clear modules".to_owned()]);
    }
}
