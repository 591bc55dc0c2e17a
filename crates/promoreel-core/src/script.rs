use regex::RegexBuilder;

use crate::error::Result;
use crate::llm::ChatModel;
use crate::research::SourceSummary;

/// One narration/image-prompt pair; the basis for one video scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePair {
    pub narration: String,
    pub image_prompt: String,
}

/// Ask the model for the two-pair tagged video script.
pub async fn generate_script(
    chat: &dyn ChatModel,
    topic: &str,
    summaries: &[SourceSummary],
) -> Result<String> {
    let summary_block = summaries
        .iter()
        .map(|s| format!("- {}: {}", s.url, s.summary))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "Generate a video script with two narration and image prompt pairs for the following \
         topic, focusing on the company's expertise related to the topic. \
         The script should contain around 200 words total. Start by explaining the topic and \
         then highlight the company's role or expertise in relation to it. \
         The Narration must start with topic name. \
         Ensure that the image prompts do not include any text, names, logos, or other \
         identifying features. \
         Provide a descriptive image prompt that clearly defines elements, colors, and \
         subjects. For instance, 'The sky was a crisp blue with green hues' is more \
         descriptive than just 'blue sky'.\
         \n\n**Topic:** \n{}\n\n**Summary:** \n{}\n\n\
         Expected Output: Two pairs of sentences. Enclose narration in \
         <narration> narration here </narration> tags and image prompts in \
         <image> image prompt here </image> tags.",
        topic, summary_block
    );

    chat.invoke(&prompt).await
}

fn extract_tagged(script: &str, tag: &str) -> Vec<String> {
    let re = RegexBuilder::new(&format!("<{tag}>(.*?)</{tag}>"))
        .dot_matches_new_line(true)
        .build()
        .unwrap();
    re.captures_iter(script)
        .map(|cap| cap[1].trim().to_string())
        .collect()
}

/// Parse a tagged script into ordered narration/image pairs. The pair
/// count is the minimum of the two tag lists; a malformed script
/// simply yields fewer (possibly zero) pairs.
pub fn parse_script(script: &str) -> Vec<ScenePair> {
    let narrations = extract_tagged(script, "narration");
    let image_prompts = extract_tagged(script, "image");
    narrations
        .into_iter()
        .zip(image_prompts)
        .map(|(narration, image_prompt)| ScenePair {
            narration,
            image_prompt,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedChat;

    const TAGGED: &str = "<narration>Solar energy is...</narration><image>a bright sun...</image>\
         <narration>Our company...</narration><image>a team of engineers...</image>";

    #[test]
    fn parse_script_extracts_ordered_pairs() {
        let pairs = parse_script(TAGGED);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].narration, "Solar energy is...");
        assert_eq!(pairs[0].image_prompt, "a bright sun...");
        assert_eq!(pairs[1].narration, "Our company...");
        assert_eq!(pairs[1].image_prompt, "a team of engineers...");
    }

    #[test]
    fn parse_script_spans_newlines() {
        let script = "<narration>line one\nline two</narration>\n<image>a field\nof panels</image>";
        let pairs = parse_script(script);
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].narration.contains("line two"));
    }

    #[test]
    fn parse_script_takes_min_of_unbalanced_tags() {
        let script = "<narration>one</narration><narration>two</narration><image>only</image>";
        let pairs = parse_script(script);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].narration, "one");
    }

    #[test]
    fn parse_script_yields_nothing_for_untagged_text() {
        assert!(parse_script("no tags here at all").is_empty());
    }

    #[tokio::test]
    async fn script_prompt_embeds_topic_and_summaries() {
        let chat = ScriptedChat::new([TAGGED]);
        let summaries = vec![SourceSummary {
            url: "https://example.com/solar".into(),
            summary: "They build panels.".into(),
        }];
        let script = generate_script(&chat, "solar energy", &summaries)
            .await
            .unwrap();
        assert_eq!(parse_script(&script).len(), 2);

        let prompts = chat.prompts.lock().unwrap();
        assert!(prompts[0].contains("solar energy"));
        assert!(prompts[0].contains("https://example.com/solar"));
        assert!(prompts[0].contains("<narration>"));
    }
}
