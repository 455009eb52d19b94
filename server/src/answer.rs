use ragcore::ScoredDocument;

pub const DEFAULT_MAX_SNIPPETS: usize = 2;

const NO_ANSWER: &str = "No relevant information found for your query.";

/// Naive answer: the text of the top `max_snippets` documents, best first.
pub fn synthesize(documents: &[ScoredDocument], max_snippets: usize) -> String {
    let mut texts = documents.iter().take(max_snippets).map(|d| d.document.text());
    let Some(first) = texts.next() else {
        return NO_ANSWER.to_string();
    };
    let mut answer = format!("Based on available information: {first}");
    for text in texts {
        answer.push_str(" Additionally, ");
        answer.push_str(text);
    }
    answer
}
