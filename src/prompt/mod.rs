use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::OnceLock;

use crate::model::MarketingRequest;

fn brand_values() -> &'static str {
r#"Brand: Macdonald Hotels & Resorts.
Brand values: Luxury, Heritage, Scottish Roots, Sophistication, Relaxation.
Voice: warm, understated, confident. Never brash, never discount-led, no slang.
Imagery: natural light, highland landscapes, crafted interiors, real guests enjoying
unhurried moments. Avoid stock-photo clichés, neon palettes and crowded scenes."#
}

/// System instruction shared by idea brainstorm and chat.
pub fn system_creative_partner() -> String {
    format!(
r#"You are the Macdonald Hotels Creative Workbench Engine (MH-CWE).
Your role is to act as a creative partner for high-end luxury hotel marketing.
{}
Generate specific, high-impact marketing campaign ideas based on the user's input."#,
        brand_values()
    )
}

/// System instruction for Agent Kim, the prompt optimizer.
pub fn system_kim(guidelines: bool) -> String {
    let mut s = String::from(
r#"You are Kim, a senior creative director and prompt engineer.
Rewrite the marketer's brief as ONE production-ready prompt for an image/video model.
Describe subject, setting, lighting, composition, lens and mood in a single paragraph.
Return only the prompt text, no preamble, no quotes, no markdown."#,
    );
    if guidelines {
        s.push_str("\n\nApply these brand guidelines strictly:\n");
        s.push_str(brand_values());
    }
    s
}

pub fn user_prompt_optimize(brief: &str, context: Option<&str>) -> String {
    match context.filter(|c| !c.trim().is_empty()) {
        Some(ctx) => format!("Brief:\n{brief}\n\nAdditional context:\n{ctx}"),
        None => format!("Brief:\n{brief}"),
    }
}

/// Stylistic qualifiers appended to a brief when Kim cannot be reached.
pub const FALLBACK_QUALIFIERS: &str =
    "cinematic lighting, luxury hotel photography, Scottish highland atmosphere, 8k, photorealistic";

pub fn fallback_prompt(brief: &str) -> String {
    let brief = brief.trim();
    if brief.is_empty() {
        format!("Luxury hotel campaign visual, {FALLBACK_QUALIFIERS}")
    } else {
        format!("{brief}, {FALLBACK_QUALIFIERS}")
    }
}

pub fn system_concepts() -> String {
    format!(
r#"You are the creative strategist of the Macdonald Hotels Creative Workbench.
Think through audience, channel and offer before writing.
{}
Every concept must be distinct in angle, not just wording."#,
        brand_values()
    )
}

pub fn user_prompt_concepts(req: &MarketingRequest, master_prompt: Option<&str>, count: usize) -> String {
    let mut s = format!(
r#"Campaign: {name}
Department: {dept}
Location: {loc}
Type: {kind}
Impact level: {impact}/100
Business reason: {reason}
Brief: {desc}
"#,
        name = req.name,
        dept = req.department,
        loc = req.location,
        kind = req.kind,
        impact = req.impact_level(),
        reason = req.business_reason,
        desc = req.description,
    );
    if let Some(mp) = master_prompt.filter(|p| !p.trim().is_empty()) {
        s.push_str(&format!("Approved master prompt: {mp}\n"));
    }
    s.push_str(&format!(
        "\nGenerate {count} creative concepts. Each description must be usable directly as an image prompt."
    ));
    s
}

pub fn concepts_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING", "description": "Short headline for the variation" },
                "description": { "type": "STRING", "description": "Visual description / ad copy usable as an image prompt" },
                "predictedCtr": { "type": "STRING", "description": "Estimated click-through rate, e.g. '3.4%'" }
            },
            "required": ["title", "description"]
        }
    })
}

pub fn user_prompt_ideas(context: &str, goal: Option<&str>, count: usize) -> String {
    let mut s = format!("User Context: {context}\n");
    if let Some(g) = goal.filter(|g| !g.trim().is_empty()) {
        s.push_str(&format!("Target Goal: {g}\n"));
    }
    s.push_str(&format!("\nPlease generate {count} distinct creative ideas."));
    s
}

pub fn ideas_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING", "description": "A catchy title for the campaign" },
                "pitch": { "type": "STRING", "description": "A 2-sentence elevator pitch" },
                "visuals": { "type": "STRING", "description": "Description of the visual imagery (e.g. 'Couple walking in highlands')" }
            },
            "required": ["title", "pitch", "visuals"]
        }
    })
}

pub fn transcribe_instruction() -> &'static str {
    "Transcribe this voice note verbatim. Return only the spoken words."
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("static regex"))
}

/// Parse model JSON output, tolerating code fences and leading chatter.
pub fn parse_model_json<T: DeserializeOwned>(content: &str) -> Option<T> {
    if let Ok(v) = serde_json::from_str::<T>(content.trim()) {
        return Some(v);
    }
    if let Some(inner) = fence_re().captures(content).and_then(|c| c.get(1)) {
        if let Ok(v) = serde_json::from_str::<T>(inner.as_str()) {
            return Some(v);
        }
    }
    extract_first_json_value(content).and_then(|s| serde_json::from_str::<T>(&s).ok())
}

/// Extracts the first top-level JSON object or array substring from a string.
/// Handles nesting; returns None if not found.
fn extract_first_json_value(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let start = bytes.iter().position(|&b| b == b'{' || b == b'[')?;
    let (open, close) = if bytes[start] == b'{' { (b'{', b'}') } else { (b'[', b']') };
    let mut depth = 0usize;
    let mut in_str = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_str {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_str = false,
                _ => {}
            }
            continue;
        }
        if b == b'"' {
            in_str = true;
        } else if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(s[start..=i].to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Item {
        title: String,
    }

    #[test]
    fn fallback_always_contains_brief_and_qualifiers() {
        let p = fallback_prompt("Winter golf break");
        assert!(p.starts_with("Winter golf break"));
        assert!(p.contains(FALLBACK_QUALIFIERS));
        assert!(!fallback_prompt("   ").is_empty());
    }

    #[test]
    fn kim_guidelines_toggle() {
        assert!(system_kim(true).contains("Scottish Roots"));
        assert!(!system_kim(false).contains("Scottish Roots"));
    }

    #[test]
    fn parses_fenced_and_chatty_json() {
        let fenced = "```json\n[{\"title\":\"a\"}]\n```";
        let v: Vec<Item> = parse_model_json(fenced).unwrap();
        assert_eq!(v[0].title, "a");

        let chatty = "Sure! Here you go: [{\"title\":\"b ] tricky\"}] hope that helps";
        let v: Vec<Item> = parse_model_json(chatty).unwrap();
        assert_eq!(v[0].title, "b ] tricky");

        assert!(parse_model_json::<Vec<Item>>("no json here").is_none());
    }

    #[test]
    fn concepts_prompt_includes_master_prompt_only_when_set() {
        let mut req = MarketingRequest::default();
        req.description = "spa".into();
        assert!(user_prompt_concepts(&req, Some("golden hour"), 20).contains("golden hour"));
        assert!(!user_prompt_concepts(&req, Some("  "), 20).contains("master prompt"));
        assert!(user_prompt_concepts(&req, None, 20).contains("Generate 20"));
    }
}
