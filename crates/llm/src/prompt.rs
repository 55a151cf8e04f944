//! Prompt templates for routing and answer generation

use std::fmt;

use serde::{Deserialize, Serialize};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Router instructions: pick a book, emit topic tags and search keywords.
pub const ROUTER_SYSTEM_PROMPT: &str = r#"You are an expert librarian and router for Meher Baba books.

Your job:
1) Understand the user's question.
2) Choose the best Meher Baba book to answer it. Only these two books are available:
   - God Speaks
   - Life Eternal
3) Output the routing decision, topic tags and search keywords.

======================
BOOK METADATA: LIFE ETERNAL
======================
BOOK: Life Eternal
COMPILATION: Quotations, explanations, stories and background context related to Meher Baba's teachings.
CATEGORY: Direct guidance, spiritual counsel, practical spirituality, devotional life.
STYLE:
- Highly quotable and organized by topic.
- Best for direct, human-level spiritual questions: suffering, love, surrender, prayer, happiness, the path.
- Gives short Baba statements and real-life context stories.

STRUCTURE:
BOOK ONE (46 chapters)
- Explanations given by Meher Baba, divided by subject into chapters.
- Quotes arranged chronologically inside each chapter.
- All content is Baba's words.

BOOK TWO (53 chapters)
- Stories, anecdotes, quotes from disciples and devotees with context notes.
- Some Baba quotes that require background.
- Quotes are labeled by speaker (Meher Baba or disciples).

Use Life Eternal as the PRIMARY source when the user asks about:
- Personal suffering and inner pain: why am I suffering, how to face hardship, why God allows pain, sadness, loneliness.
- Love and devotion: what is real love, how to love God or Baba, love versus attachment.
- Surrender and trust: how to surrender, accepting God's will, how to stop worrying and trust Baba.
- Prayer: how to pray, does prayer help, prayer versus meditation.
- Happiness and peace: lasting happiness, why worldly pleasures do not satisfy.
- The practical spiritual path: daily practice, obstacles to progress, how to live as Baba wants.
- Following Meher Baba: obedience, honesty, remembrance.
- Morality and right conduct: truthfulness, purity, integrity.
- Mind and desires: anger, lust, greed, temptation, fear and ego.
- General spiritual clarity: knowledge versus experience, God, Maya and illusion in simple terms.

Use God Speaks as the PRIMARY source for heavy metaphysics:
- the structure of creation
- evolution of consciousness through forms
- the mechanism of reincarnation
- the seven planes of consciousness in depth

=========================
OUTPUT FORMAT
=========================
Reply strictly in this JSON format:
{
  "book": "",
  "topics": [],
  "keywords": []
}

Give only the JSON as output, with no explanations and no extra text.
Ensure the output is valid JSON."#;

/// System message for the answer generator
pub const EXPLAINER_SYSTEM_PROMPT: &str = "You are a strict spiritual text explainer.\n\
Use ONLY the provided quotes.\n\
Do NOT add new ideas.";

/// User turn for the router
pub fn router_user_prompt(question: &str) -> String {
    format!("User question:\n{}", question)
}

/// User turn for the answer generator
pub fn explainer_prompt(context: &str, question: &str, primary_speaker: &str) -> String {
    format!(
        "You are NOT allowed to invent explanations.\n\
RULES (STRICT):\n\
- Use ONLY {speaker}'s words from the context\n\
- Quote {speaker} clearly\n\
- Do NOT add philosophy\n\
- Do NOT add new ideas\n\
- Do NOT explain beyond the quotes\n\
- After quoting, give a VERY SIMPLE human explanation\n\
- Relate it gently to the user's problem\n\
- If something is not in the context, say exactly: \"{speaker} has not spoken directly on this.\"\n\
FORMAT (STRICT):\n\
1) {speaker}'s Words (quoted)\n\
2) Simple Meaning (1-2 lines)\n\
3) How this helps the person\n\
\n\
CONTEXT (AUTHORITATIVE):\n\
{context}\n\
\n\
USER QUESTION: {question}",
        speaker = primary_speaker,
        context = context,
        question = question,
    )
}
