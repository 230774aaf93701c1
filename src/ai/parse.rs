use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::error::AiError;
use crate::mindmap::model::LevelNo;
use crate::store::levels::MAX_LEVELS;

// Shape returned for a fresh topic
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelPlan {
    pub level_count: u32,
    pub levels: Vec<PlannedLevel>,
    pub initial_nodes: Vec<PlannedNode>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PlannedLevel {
    pub level: LevelNo,
    pub label: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedNode {
    pub content: String,
    #[serde(default = "PlannedNode::default_level")]
    pub level: LevelNo,
    #[serde(default)]
    pub has_children: bool,
}

impl PlannedNode {
    fn default_level() -> LevelNo {
        1
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChildrenReply {
    pub children: Vec<PlannedNode>,
}

/// Strip a markdown code fence (```json ... ```) around the model's answer.
/// Text without a fence is returned trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let t = text.trim();
    let Some(start) = t.find("```") else { return t };
    let after = &t[start + 3..];
    // language tag, e.g. `json`
    let tag_len = after.chars().take_while(|c| c.is_ascii_alphanumeric()).count();
    let body = &after[tag_len..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, AiError> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return Err(AiError::EmptyResponse);
    }
    match serde_json::from_str::<T>(body) {
        Ok(v) => Ok(v),
        Err(first) => {
            // Models sometimes wrap the object in prose; retry on the outermost braces
            if let (Some(open), Some(close)) = (body.find('{'), body.rfind('}')) {
                if open < close && (open > 0 || close + 1 < body.len()) {
                    if let Ok(v) = serde_json::from_str::<T>(&body[open..=close]) {
                        return Ok(v);
                    }
                }
            }
            Err(AiError::Parse(first.to_string()))
        }
    }
}

pub fn parse_level_plan(text: &str) -> Result<LevelPlan, AiError> {
    let mut plan: LevelPlan = parse_json(text)?;
    if plan.levels.is_empty() {
        return Err(AiError::Parse("plan contains no levels".into()));
    }
    if plan.levels.len() > MAX_LEVELS {
        log::warn!("model proposed {} levels; keeping the first {}", plan.levels.len(), MAX_LEVELS);
        plan.levels.sort_by_key(|l| l.level);
        plan.levels.truncate(MAX_LEVELS);
    }
    if plan.level_count as usize != plan.levels.len() {
        log::warn!("levelCount {} disagrees with {} listed levels", plan.level_count, plan.levels.len());
        plan.level_count = plan.levels.len() as u32;
    }
    plan.initial_nodes.retain(|n| !n.content.trim().is_empty());
    if plan.initial_nodes.is_empty() {
        return Err(AiError::Parse("plan contains no initial nodes".into()));
    }
    Ok(plan)
}

pub fn parse_children(text: &str) -> Result<Vec<PlannedNode>, AiError> {
    let reply: ChildrenReply = parse_json(text)?;
    let children: Vec<PlannedNode> = reply
        .children
        .into_iter()
        .filter(|c| !c.content.trim().is_empty())
        .collect();
    if children.is_empty() {
        return Err(AiError::Parse("reply contains no children".into()));
    }
    Ok(children)
}
