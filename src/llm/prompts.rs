//! Prompt templates for extraction and answer synthesis.

use crate::llm::answer::AnswerContext;

pub fn extraction_prompt(text: &str) -> String {
    format!(
        r#"Extract the nouns (entities) and the relationships between them from the text below.

Return a single JSON object with exactly this structure:
{{
  "nouns": [{{"text": "surface text", "type": "PERSON|PLACE|THING|OTHER", "baseForm": "canonical form"}}],
  "relationships": [{{"source": "subject noun", "action": "verb as written", "target": "object noun", "baseAction": "base form of the verb"}}]
}}

Rules:
- Every relationship source and target must be one of the extracted nouns.
- Split compound statements into several atomic subject-verb-object relationships.
  "Leo participated in ETH Global in Bangkok with Fabian" becomes:
  Leo -> participated in -> ETH Global, ETH Global -> took place in -> Bangkok,
  Leo -> collaborated with -> Fabian, Fabian -> participated in -> ETH Global.
- Use the singular, unabbreviated name as baseForm.

Text: "{text}""#
    )
}

pub fn answer_prompt(query: &str, context: &AnswerContext) -> String {
    let context_json = serde_json::json!({
        "transcripts": context.transcripts.iter().map(|t| serde_json::json!({
            "overview": t.overview,
            "similarity": t.similarity,
        })).collect::<Vec<_>>(),
        "relationships": context.relationships.iter().map(|r| serde_json::json!({
            "statement": r.statement(),
            "types": {
                "source": r.source_noun.noun_type,
                "target": r.target_noun.noun_type,
            },
            "entities": {
                "source": {
                    "name": r.source_noun.name,
                    "type": r.source_noun.noun_type,
                    "baseForm": r.source_noun.base_form,
                },
                "target": {
                    "name": r.target_noun.name,
                    "type": r.target_noun.noun_type,
                    "baseForm": r.target_noun.base_form,
                },
            },
            "action": r.relationship.action,
            "baseAction": r.relationship.base_action,
        })).collect::<Vec<_>>(),
    });
    let context_text =
        serde_json::to_string_pretty(&context_json).unwrap_or_else(|_| context_json.to_string());

    format!(
        r#"You answer questions about a person's past conversations, meetings and events, using only the context below.
If the context does not contain the answer, say so.

Question: "{query}"

Context:
{context_text}

Guidelines:
1. Use the most relevant relationships and transcripts.
2. Group related facts together, for example everything that happened at one event.
3. When several people took part in the same event, mention them together.
4. Name the people, places and things involved exactly as they appear in the context.
5. Mention each fact once, even if it appears several times in the context.
6. Reply in natural, conversational language.

Example: for "Who did I meet at ETH Global?" a good reply is
"At ETH Global, you collaborated with Alice and Bob. You worked with Alice on a DeFi project, and Bob helped with smart contract development."

Answer the question directly from the context. Do not ask the user any questions."#
    )
}
