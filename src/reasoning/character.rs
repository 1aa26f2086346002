use serde::Serialize;

use crate::prompts::persona_prompt;

/// A named thinking style used to frame one independent analysis.
///
/// Characters are plain configuration: every persona runs through the same
/// code path and differs only in the text it contributes to the prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhilosophicalCharacter {
    name: String,
    description: String,
    thinking_style: String,
    expertise: Vec<String>,
    #[serde(skip)]
    persona_prompt: String,
}

impl PhilosophicalCharacter {
    /// Create a character. Duplicate expertise tags are dropped, keeping first-seen order.
    pub fn new<I, S>(
        name: impl Into<String>,
        description: impl Into<String>,
        thinking_style: impl Into<String>,
        expertise: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let description = description.into();
        let thinking_style = thinking_style.into();

        let mut tags: Vec<String> = Vec::new();
        for tag in expertise {
            let tag = tag.into();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let persona_prompt = persona_prompt(&name, &description, &thinking_style, &tags);

        Self {
            name,
            description,
            thinking_style,
            expertise: tags,
            persona_prompt,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn thinking_style(&self) -> &str {
        &self.thinking_style
    }

    pub fn expertise(&self) -> &[String] {
        &self.expertise
    }

    /// Persona framing, derived once at construction.
    pub fn persona_prompt(&self) -> &str {
        &self.persona_prompt
    }
}

/// Ordered set of characters consulted in the perspectives stage.
///
/// Registration order is the order perspectives are reported and fed to
/// later stages.
#[derive(Debug, Clone)]
pub struct CharacterRegistry {
    entries: Vec<(String, PhilosophicalCharacter)>,
}

impl Default for CharacterRegistry {
    fn default() -> Self {
        Self::philosophers()
    }
}

impl CharacterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The five reference philosophers.
    pub fn philosophers() -> Self {
        Self {
            entries: builtin_philosophers()
                .into_iter()
                .map(|(key, character)| (key.to_string(), character))
                .collect(),
        }
    }

    /// Register a character under `key`.
    ///
    /// # Errors
    /// Returns error if the key is empty or already registered.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        character: PhilosophicalCharacter,
    ) -> Result<(), String> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err("Character key is required".to_string());
        }
        if self.get(&key).is_some() {
            return Err(format!("Character '{}' already exists", key));
        }
        self.entries.push((key, character));
        Ok(())
    }

    /// Builder form of [`CharacterRegistry::register`].
    pub fn with_character(
        mut self,
        key: impl Into<String>,
        character: PhilosophicalCharacter,
    ) -> Result<Self, String> {
        self.register(key, character)?;
        Ok(self)
    }

    /// Get a character by key.
    pub fn get(&self, key: &str) -> Option<&PhilosophicalCharacter> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, character)| character)
    }

    /// Iterate `(key, character)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PhilosophicalCharacter)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), c))
    }

    /// Keys in registration order.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn builtin_philosophers() -> Vec<(&'static str, PhilosophicalCharacter)> {
    vec![
        (
            "socrates",
            PhilosophicalCharacter::new(
                "Socrates",
                "Ancient Greek philosopher known for the Socratic method",
                "Questioning, dialectical, seeking definitions and clarity through systematic inquiry",
                ["logic", "ethics", "epistemology", "critical thinking", "questioning assumptions"],
            ),
        ),
        (
            "aristotle",
            PhilosophicalCharacter::new(
                "Aristotle",
                "Ancient Greek philosopher and scientist, student of Plato",
                "Systematic, empirical, categorizing, seeking causes and principles",
                ["logic", "metaphysics", "ethics", "politics", "natural sciences", "categorization"],
            ),
        ),
        (
            "descartes",
            PhilosophicalCharacter::new(
                "René Descartes",
                "French philosopher and mathematician, father of modern philosophy",
                "Analytical, mathematical, systematic doubt, seeking certainty",
                ["mathematics", "metaphysics", "epistemology", "methodology", "systematic reasoning"],
            ),
        ),
        (
            "kant",
            PhilosophicalCharacter::new(
                "Immanuel Kant",
                "German philosopher, central figure in modern philosophy",
                "Critical, systematic, seeking universal principles and conditions of possibility",
                ["epistemology", "ethics", "metaphysics", "aesthetics", "transcendental philosophy"],
            ),
        ),
        (
            "nietzsche",
            PhilosophicalCharacter::new(
                "Friedrich Nietzsche",
                "German philosopher, critic of traditional morality and religion",
                "Perspectival, genealogical, questioning traditional values, creative destruction",
                ["ethics", "aesthetics", "philosophy of history", "critique of morality", "creative thinking"],
            ),
        ),
    ]
}
