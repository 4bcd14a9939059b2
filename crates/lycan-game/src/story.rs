//! The narrator's lines.
//!
//! A story is a two-level book: chapters (one per role, plus `everyone`)
//! hold pages, and each page holds one or more interchangeable lines. A
//! render picks one line at random and fills its `<key>` placeholders.
//! A `*` in a line stands for the command prefix, which is only known to
//! the session rendering it.
//!
//! ```json
//! { "seeker": { "see_role": ["The crystal ball shows that <target> is a <role>."] } }
//! ```

use std::collections::HashMap;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Deserialize;

use crate::StoryError;

const BUNDLED: &str = include_str!("../data/story.json");

/// Chapters → pages → candidate lines.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct StoryBook {
    chapters: HashMap<String, HashMap<String, Vec<String>>>,
}

impl StoryBook {
    /// Loads a story from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, StoryError> {
        serde_json::from_str(json).map_err(|e| StoryError::Parse(e.to_string()))
    }

    /// The English story shipped with the crate.
    pub fn bundled() -> Result<Self, StoryError> {
        Self::from_json(BUNDLED)
    }

    pub fn has_page(&self, chapter: &str, page: &str) -> bool {
        self.chapters
            .get(chapter)
            .and_then(|pages| pages.get(page))
            .is_some_and(|lines| !lines.is_empty())
    }

    /// Picks one line of `chapter.page` and fills its placeholders from
    /// `values`. Extra values are ignored.
    ///
    /// # Errors
    /// `UnknownPage` if the page is missing or empty, `MissingPlaceholder`
    /// if the chosen line uses a key absent from `values`.
    pub fn render<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        chapter: &str,
        page: &str,
        values: &[(&str, &str)],
    ) -> Result<String, StoryError> {
        let line = self
            .chapters
            .get(chapter)
            .and_then(|pages| pages.get(page))
            .and_then(|lines| lines.choose(rng))
            .ok_or_else(|| StoryError::UnknownPage {
                chapter: chapter.to_string(),
                page: page.to_string(),
            })?;

        fill(line, values).map_err(|key| StoryError::MissingPlaceholder {
            chapter: chapter.to_string(),
            page: page.to_string(),
            key,
        })
    }
}

impl Default for StoryBook {
    fn default() -> Self {
        Self::bundled().unwrap_or_else(|e| {
            tracing::error!(error = %e, "bundled story failed to load, narration disabled");
            Self {
                chapters: HashMap::new(),
            }
        })
    }
}

/// Replaces every `<key>` in `line`. A `<` not followed by a key and `>`
/// is kept as is. Returns the first missing key on failure.
fn fill(line: &str, values: &[(&str, &str)]) -> Result<String, String> {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('>') {
            Some(close) if is_key(&after[..close]) => {
                let key = &after[..close];
                let (_, value) = values
                    .iter()
                    .find(|(k, _)| *k == key)
                    .ok_or_else(|| key.to_string())?;
                out.push_str(value);
                rest = &after[close + 1..];
            }
            _ => {
                out.push('<');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

fn is_key(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
