//! Instruction templates for the two review agents.

pub const SEARCH_AGENT_NAME: &str = "search_agent";

pub const SEARCH_AGENT_DESCRIPTION: &str = "Crafts arXiv queries and retrieves candidate papers.";

/// `{factor}` is replaced with the over-fetch factor in words or digits.
const SEARCH_AGENT_TEMPLATE: &str = "Given a user topic, think of the best arXiv query and call the provided tool. Always fetch {factor}-times the papers requested so that you can down-select the most relevant ones. When the tool returns, choose exactly the number of papers requested and pass them as concise JSON to the summarizer.";

pub const SUMMARIZER_AGENT_NAME: &str = "summarizer_agent";

pub const SUMMARIZER_AGENT_DESCRIPTION: &str =
    "Produces a short Markdown review from provided papers.";

pub const SUMMARIZER_PROMPT: &str = r#"You are a research expert. Given a JSON list of papers, write a short literature review in Markdown:

1. Start with a 2-3 sentence intro about the topic.
2. For each paper, add a bullet with:
     - Title (as a Markdown link)
     - Authors
     - The problem it addresses
     - Its main contribution
3. End with one sentence that sums up the key takeaway.
"#;

/// Retriever instructions for a given over-fetch factor.
pub fn search_agent_prompt(over_fetch_factor: u32) -> String {
    let factor = match over_fetch_factor {
        2 => "two".to_string(),
        3 => "three".to_string(),
        4 => "four".to_string(),
        5 => "five".to_string(),
        n => n.to_string(),
    };
    SEARCH_AGENT_TEMPLATE.replace("{factor}", &factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_search_prompt_asks_for_five_times() {
        let prompt = search_agent_prompt(5);
        assert!(prompt.contains("fetch five-times the papers requested"));
        assert!(!prompt.contains("{factor}"));
    }

    #[test]
    fn test_search_prompt_uses_digits_for_large_factors() {
        assert!(search_agent_prompt(8).contains("fetch 8-times"));
    }

    #[test]
    fn test_summarizer_prompt_structure() {
        assert!(SUMMARIZER_PROMPT.contains("2-3 sentence intro"));
        assert!(SUMMARIZER_PROMPT.contains("Title (as a Markdown link)"));
        assert!(SUMMARIZER_PROMPT.contains("key takeaway"));
    }
}
