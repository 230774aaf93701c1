use std::fmt::Write as _;

pub const SYSTEM_PROMPT: &str = "You are ANYPLAN, an assistant that helps people explore a topic step by step. \
Break topics into short, concrete keywords (one to four words each). \
When asked for structured output, answer with a single JSON object and nothing else.";

// Everything the model needs to extend one node
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChildContext {
    pub topic: String,
    pub node_content: String,
    // From the level-1 ancestor down to the direct parent
    pub path: Vec<String>,
    pub siblings: Vec<String>,
    pub existing_children: Vec<String>,
    pub target_level: u32,
    pub level_label: Option<String>,
    pub level_description: Option<String>,
}

pub fn plan_prompt(topic: &str) -> String {
    format!(
        "Topic: \"{topic}\"\n\n\
Design a progressive exploration of this topic in 3 to 6 levels, from broad to specific. \
Then propose 3 to 5 starting keywords for level 1.\n\n\
Answer with JSON of exactly this shape:\n\
{{\"levelCount\": <number>, \
\"levels\": [{{\"level\": 1, \"label\": \"<short name>\", \"description\": \"<one sentence>\"}}], \
\"initialNodes\": [{{\"level\": 1, \"content\": \"<keyword>\", \"hasChildren\": true}}]}}"
    )
}

pub fn children_prompt(ctx: &ChildContext) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "Topic: \"{}\"", ctx.topic);
    if !ctx.path.is_empty() {
        let _ = writeln!(s, "Path so far: {}", ctx.path.join(" > "));
    }
    let _ = writeln!(s, "Expand the keyword \"{}\" into level {}.", ctx.node_content, ctx.target_level);
    if let Some(label) = &ctx.level_label {
        let _ = write!(s, "Level {} is \"{}\"", ctx.target_level, label);
        match &ctx.level_description {
            Some(desc) if !desc.is_empty() => {
                let _ = writeln!(s, ": {desc}");
            }
            _ => s.push('\n'),
        }
    }
    if !ctx.siblings.is_empty() {
        let _ = writeln!(s, "Sibling keywords (for context, do not repeat): {}", ctx.siblings.join(", "));
    }
    if !ctx.existing_children.is_empty() {
        let _ = writeln!(s, "Avoid these existing keywords: {}", ctx.existing_children.join(", "));
    }
    let _ = write!(
        s,
        "\nPropose 3 to 5 keywords. Answer with JSON of exactly this shape:\n\
{{\"children\": [{{\"content\": \"<keyword>\", \"level\": {}, \"hasChildren\": true}}]}}",
        ctx.target_level
    );
    s
}

pub fn report_prompt(topic: &str, chain: &[(String, String)]) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "Topic: \"{topic}\"");
    let _ = writeln!(s, "The user followed this path through the levels:");
    for (label, content) in chain {
        let _ = writeln!(s, "- {label}: {content}");
    }
    s.push_str("\nWrite a short plan (a few paragraphs of plain text) that turns this path into concrete next steps.");
    s
}
