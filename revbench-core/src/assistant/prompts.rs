//! Prompt construction. Each builder returns the full message list for one
//! chat-completions call.

use super::{AnalysisRequest, ChatRequest, FixRequest, ProjectAnalysisRequest, TestsRequest, WireMessage};
use crate::language::display_name;
use crate::types::ChatRole;

/// Characters of the active file included with a chat question.
const CHAT_FILE_CHARS: usize = 12_000;

const ANALYSIS_SYSTEM: &str = "You are a senior code reviewer. Reply with a single JSON object and nothing else:
{\"status\": \"SAFE\" | \"WARNING\" | \"DANGER\",
 \"quality_score\": 0-100, \"security_score\": 0-100, \"performance_score\": 0-100,
 \"summary\": string,
 \"issues\": [{\"title\": string, \"description\": string,
             \"severity\": \"critical\" | \"high\" | \"medium\" | \"low\" | \"info\",
             \"line\": number | null, \"suggestion\": string | null}]}";

const PROJECT_SYSTEM: &str = "You are a software architect reviewing a whole repository. Reply with a single JSON object and nothing else:
{\"summary\": string, \"architecture_score\": 0-100, \"highlights\": [string],
 \"issues\": [{\"title\": string, \"description\": string,
             \"severity\": \"critical\" | \"high\" | \"medium\" | \"low\" | \"info\",
             \"line\": null, \"suggestion\": string | null}]}";

const FIX_SYSTEM: &str = "You are an expert programmer. Apply the requested change to the file. \
Return the complete updated file in one fenced code block, with no explanation.";

const TESTS_SYSTEM: &str = "You are an expert in software testing. Write a complete, runnable test file \
for the given source file using the idiomatic test framework for its language. \
Return only the test file in one fenced code block.";

const CHAT_SYSTEM: &str = "You are a helpful assistant embedded in a code-review workbench. \
Answer questions about the user's project concisely. Use fenced code blocks for code.";

fn system(content: impl Into<String>) -> WireMessage {
    WireMessage { role: "system", content: content.into() }
}

fn user(content: impl Into<String>) -> WireMessage {
    WireMessage { role: "user", content: content.into() }
}

fn fenced(language: &str, content: &str) -> String {
    format!("```{language}\n{content}\n```")
}

pub fn analysis(req: &AnalysisRequest) -> Vec<WireMessage> {
    vec![
        system(ANALYSIS_SYSTEM),
        user(format!(
            "Project files:\n{}\n\nAnalyze `{}` ({}):\n{}",
            req.context,
            req.path,
            display_name(&req.language),
            fenced(&req.language, &req.content),
        )),
    ]
}

pub fn project_analysis(req: &ProjectAnalysisRequest) -> Vec<WireMessage> {
    let mut body = format!("Repository: {}\n", req.name);
    for (path, excerpt) in &req.files {
        body.push_str(&format!("\n--- {path} ---\n{excerpt}\n"));
    }
    vec![system(PROJECT_SYSTEM), user(body)]
}

pub fn fix(req: &FixRequest) -> Vec<WireMessage> {
    vec![
        system(FIX_SYSTEM),
        user(format!(
            "Project files:\n{}\n\nFile `{}`:\n{}\n\nInstruction:\n{}",
            req.context,
            req.path,
            fenced(&req.language, &req.content),
            req.instruction,
        )),
    ]
}

pub fn tests(req: &TestsRequest) -> Vec<WireMessage> {
    vec![
        system(TESTS_SYSTEM),
        user(format!(
            "Write tests for `{}` ({}):\n{}",
            req.path,
            display_name(&req.language),
            fenced(&req.language, &req.content),
        )),
    ]
}

pub fn chat(req: &ChatRequest) -> Vec<WireMessage> {
    let mut context = format!("{CHAT_SYSTEM}\n\nProject files:\n{}", req.context);
    if let Some((path, content)) = &req.active_file {
        let excerpt: String = content.chars().take(CHAT_FILE_CHARS).collect();
        context.push_str(&format!("\n\nThe user is looking at `{path}`:\n```\n{excerpt}\n```"));
    }

    let mut messages = vec![system(context)];
    messages.extend(req.transcript.iter().map(|m| WireMessage {
        role: match m.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        },
        content: m.text.clone(),
    }));
    messages.push(user(req.question.clone()));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;

    #[test]
    fn chat_replays_transcript_before_question() {
        let req = ChatRequest {
            token: 1,
            project_id: "p".into(),
            question: "and now?".into(),
            transcript: vec![
                ChatMessage::new(ChatRole::User, "hi"),
                ChatMessage::new(ChatRole::Assistant, "hello"),
            ],
            active_file: Some(("src/a.rs".into(), "fn a() {}".into())),
            context: "src/a.rs".into(),
        };
        let msgs = chat(&req);
        let roles: Vec<&str> = msgs.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert!(msgs[0].content.contains("fn a() {}"));
        assert_eq!(msgs[3].content, "and now?");
    }

    #[test]
    fn fix_prompt_carries_instruction_and_content() {
        let req = FixRequest {
            token: 1,
            project_id: "p".into(),
            file_id: "f".into(),
            path: "main.py".into(),
            content: "print(1)".into(),
            instruction: "use logging".into(),
            language: "py".into(),
            context: "main.py".into(),
        };
        let user_msg = &fix(&req)[1].content;
        assert!(user_msg.contains("```py\nprint(1)\n```"));
        assert!(user_msg.ends_with("use logging"));
    }
}
