// prompt.rs — Builds the text part of every generation request.
//
// Layout: persona block, optional previous response, user prompt, then
// numbered instructions telling the model to treat the attached file as its
// primary input. The file itself travels as a separate `fileData` part.

use serde::{Deserialize, Serialize};

/// Assistant identity and closed capability set. Lives in settings so that
/// product variants differ by data, not code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
    /// Sentence the model must answer with for out-of-scope requests.
    pub refusal: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "AI Summarizer".into(),
            description: "an accessibility assistant integrated with a screen reader to help \
                          blind and visually impaired users"
                .into(),
            capabilities: vec![
                "Summarizing videos, audios, codes, images, and documents.".into(),
                "Transcribing videos and audios.".into(),
                "Extracting text from images.".into(),
            ],
            refusal: "I can't do that right now. I am designed for summarization and \
                      transcription."
                .into(),
        }
    }
}

const SUMMARY_INSTRUCTIONS: &[&str] = &[
    "Analyze the provided file content thoroughly. The attached file is your primary input.",
    "If summarizing, provide a concise summary (200-500 words) tailored to the user's prompt.",
    "If transcribing, provide a full transcription of audio or video content.",
    "For images, extract and describe text or summarize visual content if no text is present.",
    "Ensure the response is accessible, clear, and formatted for screen reader compatibility.",
    "Avoid technical jargon unless relevant to the file content.",
];

const FOLLOW_UP_INSTRUCTIONS: &[&str] = &[
    "Analyze the provided file content and previous summary thoroughly. The attached file is your primary input.",
    "Provide a clear and concise answer to the follow-up question, referencing the file content and previous summary where relevant.",
    "Ensure the response is accessible, formatted for screen reader compatibility, and avoids technical jargon unless relevant.",
    "If the question is unrelated to the file, politely indicate that the response is based on the file content.",
];

fn persona_block(persona: &Persona, goal: &str) -> String {
    let mut block = format!(
        "**System Prompt for {name}**\nYou are {name}, {description}. Your capabilities include:\n",
        name = persona.name,
        description = persona.description,
    );
    for cap in &persona.capabilities {
        block.push_str("- ");
        block.push_str(cap);
        block.push('\n');
    }
    block.push_str(&format!(
        "Your goal is to provide clear, concise, and accurate {goal} based on the user's prompt. \
         If the user requests something outside your capabilities, respond: \"{}\"\n",
        persona.refusal
    ));
    block
}

fn push_instructions(prompt: &mut String, instructions: &[&str]) {
    prompt.push_str("**Instructions**:\n");
    for (i, line) in instructions.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, line));
    }
}

/// Text for the initial summarize call.
pub fn build_summary_prompt(persona: &Persona, user_prompt: &str) -> String {
    let mut prompt = persona_block(persona, "summaries or transcriptions");
    prompt.push_str("**User Prompt**: ");
    prompt.push_str(user_prompt);
    prompt.push('\n');
    push_instructions(&mut prompt, SUMMARY_INSTRUCTIONS);
    prompt
}

/// Text for a follow-up call; embeds the previous response as context.
pub fn build_follow_up_prompt(
    persona: &Persona,
    previous_response: &str,
    follow_up: &str,
) -> String {
    let mut prompt = persona_block(persona, "responses to follow-up questions");
    prompt.push_str("**Previous Summary**: ");
    prompt.push_str(previous_response);
    prompt.push('\n');
    prompt.push_str("**User Prompt**: ");
    prompt.push_str(follow_up);
    prompt.push('\n');
    push_instructions(&mut prompt, FOLLOW_UP_INSTRUCTIONS);
    prompt
}
