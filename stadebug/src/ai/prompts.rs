use crate::parser::schema::TimingPath;

/// Build the single-path classification prompt.
pub fn build_path_prompt(path: &TimingPath) -> String {
    let path_json = serde_json::to_string_pretty(path).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"You are a timing closure expert debugging static timing analysis results for a digital design.
You receive exactly one STA path as JSON.

Path:
{}

Instructions:
1. If "status" is "VIOLATED":
   - Identify the root cause from path_type, slack and logic_chain
   - Give a precise technical explanation
   - Suggest up to 3 specific, actionable fixes, each with a priority
2. If "status" is "MET":
   - Confirm briefly that timing is met and return an empty suggestions list

Respond ONLY with valid JSON in this exact format (no markdown, no code blocks, just pure JSON):
{{
  "root_cause": "Combinational path delay exceeds the clock period due to several logic levels and high fanout",
  "severity": "critical | high | medium | low",
  "suggestions": [
    {{
      "fix": "Insert a pipeline register",
      "priority": "high | medium | low",
      "explanation": "Split the long combinational path across two clock cycles"
    }}
  ],
  "estimated_effort": "low | medium | high"
}}

Important: Return ONLY the JSON object, nothing else."#,
        path_json
    )
}

/// Pull the JSON object out of a model reply that may wrap it in prose or
/// markdown fences.
pub fn extract_json_from_text(text: &str) -> Option<String> {
    let text = text.trim();

    if let Some(start) = text.find("```json") {
        if let Some(end) = text.rfind("```") {
            if end > start + 7 {
                return Some(text[start + 7..end].trim().to_string());
            }
        }
    }

    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }

    None
}
