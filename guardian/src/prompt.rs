//! Review prompt assembly.
//!
//! The instruction template is embedded at compile time so the binary is
//! self-contained; the template fixes the four category headings and the
//! labeled field layout the extractor recognizes — changing one side means
//! changing the other.

/// Fixed instruction template sent ahead of every code snippet.
pub const INSTRUCTIONS: &str = include_str!("../prompt.txt");

/// Builds the full prompt for one review request.
///
/// Layout: instruction template, then (when non-empty) the custom rules
/// section verbatim, then the code fenced as python. The rules text is user
/// content appended as-is — no escaping or reformatting.
pub fn build_prompt(code: &str, custom_rules: &str) -> String {
    let mut prompt = String::with_capacity(INSTRUCTIONS.len() + code.len() + 256);
    prompt.push_str(INSTRUCTIONS);

    if !custom_rules.trim().is_empty() {
        prompt.push_str(
            "\n---\nADDITIONAL CUSTOM RULES:\nThe following rules are critical for our team.\n\
             Please enforce them with high priority:\n",
        );
        prompt.push_str(custom_rules);
        prompt.push_str("\n---\n");
    }

    prompt.push_str("\nBegin analysis on the following code snippet:\n---\n```python\n");
    prompt.push_str(code);
    if !code.ends_with('\n') {
        prompt.push('\n');
    }
    prompt.push_str("```\n---\n");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_template_and_fenced_code() {
        let p = build_prompt("print('hi')", "");
        assert!(p.starts_with(INSTRUCTIONS));
        assert!(p.contains("```python\nprint('hi')\n```"));
        assert!(!p.contains("ADDITIONAL CUSTOM RULES"));
    }

    #[test]
    fn custom_rules_are_appended_verbatim() {
        let p = build_prompt("x = 1", "No TODO comments.\nMax line length 100.");
        assert!(p.contains("ADDITIONAL CUSTOM RULES"));
        assert!(p.contains("No TODO comments.\nMax line length 100."));
        // Rules come before the code snippet.
        assert!(p.find("ADDITIONAL CUSTOM RULES").unwrap() < p.find("```python").unwrap());
    }

    #[test]
    fn template_names_the_extractor_fields() {
        // The extractor keys off these labels; keep template and parser in sync.
        for label in ["[Issue]", "[Explanation]", "[Remediation Effort]", "[Suggested Fix"] {
            assert!(INSTRUCTIONS.contains(label), "template must mention {label}");
        }
    }
}
