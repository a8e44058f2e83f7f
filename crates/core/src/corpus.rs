use std::collections::{HashMap, HashSet};

use crate::error::{CpdError, Result};

/// Run-scoped identifier of a distinct token text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextId(u32);

impl TextId {
    /// Reserved id of the end-of-unit marker. Interned texts start at 1.
    pub const END_OF_UNIT: TextId = TextId(0);

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_end_of_unit(self) -> bool {
        self == Self::END_OF_UNIT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitIndex(usize);

impl UnitIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

/// One entry of the global token stream. Its `sequence_index` is its
/// position in [`TokenCorpus::tokens`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub text_id: TextId,
    /// `None` only for end-of-unit markers.
    pub unit: Option<UnitIndex>,
    pub line: u32,
}

impl Token {
    pub fn is_end_of_unit(&self) -> bool {
        self.text_id.is_end_of_unit()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub id: String,
    /// Sequence index of the unit's first token (equal to `marker` when empty).
    pub first: usize,
    /// Sequence index of the unit's end-of-unit marker.
    pub marker: usize,
}

impl SourceUnit {
    pub fn token_count(&self) -> usize {
        self.marker - self.first
    }
}

#[derive(Debug)]
struct TextInterner {
    ids: HashMap<String, TextId>,
    texts: Vec<String>,
}

impl TextInterner {
    fn new() -> Self {
        Self {
            ids: HashMap::new(),
            texts: vec![String::new()],
        }
    }

    fn intern(&mut self, text: &str) -> TextId {
        if let Some(&id) = self.ids.get(text) {
            return id;
        }
        let id = TextId(self.texts.len() as u32);
        self.texts.push(text.to_string());
        self.ids.insert(text.to_string(), id);
        id
    }
}

#[derive(Debug)]
struct OpenUnit {
    index: UnitIndex,
    last_line: u32,
}

/// Builds a [`TokenCorpus`] from `(text, line)` pairs, one source unit at a
/// time. Owns the text interner for the duration of one run.
#[derive(Debug)]
pub struct CorpusBuilder {
    interner: TextInterner,
    tokens: Vec<Token>,
    units: Vec<SourceUnit>,
    unit_ids: HashSet<String>,
    open: Option<OpenUnit>,
}

impl Default for CorpusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self {
            interner: TextInterner::new(),
            tokens: Vec::new(),
            units: Vec::new(),
            unit_ids: HashSet::new(),
            open: None,
        }
    }

    pub fn begin_unit(&mut self, id: impl Into<String>) -> Result<UnitIndex> {
        let id = id.into();
        if let Some(open) = &self.open {
            return Err(CpdError::UnitAlreadyOpen {
                open: self.units[open.index.0].id.clone(),
                requested: id,
            });
        }
        if !self.unit_ids.insert(id.clone()) {
            return Err(CpdError::DuplicateUnit(id));
        }

        let index = UnitIndex(self.units.len());
        let first = self.tokens.len();
        self.units.push(SourceUnit {
            id,
            first,
            marker: first,
        });
        self.open = Some(OpenUnit {
            index,
            last_line: 1,
        });
        Ok(index)
    }

    pub fn push_token(&mut self, text: &str, line: u32) -> Result<TextId> {
        let Some(open) = self.open.as_mut() else {
            return Err(CpdError::UnitNotOpen);
        };
        let unit = &self.units[open.index.0];
        if line == 0 {
            return Err(CpdError::InvalidLine {
                unit: unit.id.clone(),
            });
        }
        if line < open.last_line {
            return Err(CpdError::NonMonotonicLine {
                unit: unit.id.clone(),
                previous: open.last_line,
                line,
            });
        }
        open.last_line = line;

        let text_id = self.interner.intern(text);
        self.tokens.push(Token {
            text_id,
            unit: Some(open.index),
            line,
        });
        Ok(text_id)
    }

    /// Closes the open unit by appending its end-of-unit marker.
    pub fn end_unit(&mut self) -> Result<UnitIndex> {
        let Some(open) = self.open.take() else {
            return Err(CpdError::UnitNotOpen);
        };
        let marker = self.tokens.len();
        self.tokens.push(Token {
            text_id: TextId::END_OF_UNIT,
            unit: None,
            line: open.last_line,
        });
        self.units[open.index.0].marker = marker;
        Ok(open.index)
    }

    pub fn add_unit<I, S>(&mut self, id: impl Into<String>, tokens: I) -> Result<UnitIndex>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        self.begin_unit(id)?;
        for (text, line) in tokens {
            self.push_token(text.as_ref(), line)?;
        }
        self.end_unit()
    }

    pub fn freeze(self) -> Result<TokenCorpus> {
        if let Some(open) = self.open {
            return Err(CpdError::UnterminatedUnit(
                self.units[open.index.0].id.clone(),
            ));
        }
        Ok(TokenCorpus {
            tokens: self.tokens,
            units: self.units,
            texts: self.interner.texts,
        })
    }
}

/// The frozen, line-indexed token stream of every source unit of one run.
#[derive(Debug)]
pub struct TokenCorpus {
    tokens: Vec<Token>,
    units: Vec<SourceUnit>,
    texts: Vec<String>,
}

impl TokenCorpus {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> &Token {
        &self.tokens[index]
    }

    pub fn text_id(&self, index: usize) -> TextId {
        self.tokens[index].text_id
    }

    pub fn line(&self, index: usize) -> u32 {
        self.tokens[index].line
    }

    pub fn is_end_of_unit(&self, index: usize) -> bool {
        self.tokens[index].is_end_of_unit()
    }

    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    pub fn unit(&self, index: UnitIndex) -> &SourceUnit {
        &self.units[index.0]
    }

    /// Unit owning the real token at `index`; `None` for markers.
    pub fn unit_of(&self, index: usize) -> Option<UnitIndex> {
        self.tokens[index].unit
    }

    /// Text of an interned id; the marker maps to the empty string.
    pub fn text(&self, id: TextId) -> &str {
        &self.texts[id.0 as usize]
    }

    pub fn distinct_texts(&self) -> usize {
        self.texts.len() - 1
    }

    pub fn real_token_count(&self) -> usize {
        self.tokens.len() - self.units.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interns_texts_in_first_seen_order() -> Result<()> {
        let mut builder = CorpusBuilder::new();
        builder.add_unit("a", [("x", 1), ("y", 1), ("x", 2)])?;
        builder.add_unit("b", [("y", 1), ("z", 3)])?;
        let corpus = builder.freeze()?;

        let ids: Vec<u32> = corpus.tokens().iter().map(|t| t.text_id.get()).collect();
        assert_eq!(ids, vec![1, 2, 1, 0, 2, 3, 0]);
        assert_eq!(corpus.text(TextId(3)), "z");
        assert_eq!(corpus.distinct_texts(), 3);
        assert_eq!(corpus.real_token_count(), 5);
        Ok(())
    }

    #[test]
    fn places_one_marker_after_each_unit() -> Result<()> {
        let mut builder = CorpusBuilder::new();
        builder.add_unit("a", [("x", 1), ("y", 2)])?;
        builder.add_unit("empty", Vec::<(&str, u32)>::new())?;
        builder.add_unit("b", [("z", 4)])?;
        let corpus = builder.freeze()?;

        let markers: Vec<usize> = (0..corpus.len())
            .filter(|&i| corpus.is_end_of_unit(i))
            .collect();
        assert_eq!(markers, vec![2, 3, 5]);
        assert_eq!(corpus.units()[1].token_count(), 0);
        assert_eq!(corpus.unit_of(4).map(|u| corpus.unit(u).id.as_str()), Some("b"));
        assert_eq!(corpus.unit_of(2), None);
        Ok(())
    }

    #[test]
    fn rejects_inconsistent_lines() {
        let mut builder = CorpusBuilder::new();
        let result = builder.add_unit("a", [("x", 3), ("y", 2)]);
        assert!(matches!(
            result,
            Err(CpdError::NonMonotonicLine {
                previous: 3,
                line: 2,
                ..
            })
        ));

        let mut builder = CorpusBuilder::new();
        let result = builder.add_unit("a", [("x", 0)]);
        assert!(matches!(result, Err(CpdError::InvalidLine { .. })));
    }

    #[test]
    fn rejects_unterminated_and_duplicate_units() -> Result<()> {
        let mut builder = CorpusBuilder::new();
        builder.begin_unit("a")?;
        builder.push_token("x", 1)?;
        assert!(matches!(
            builder.begin_unit("b"),
            Err(CpdError::UnitAlreadyOpen { .. })
        ));
        assert!(matches!(builder.freeze(), Err(CpdError::UnterminatedUnit(id)) if id == "a"));

        let mut builder = CorpusBuilder::new();
        builder.add_unit("a", [("x", 1)])?;
        assert!(matches!(
            builder.add_unit("a", [("x", 1)]),
            Err(CpdError::DuplicateUnit(_))
        ));
        assert!(matches!(
            builder.push_token("x", 1),
            Err(CpdError::UnitNotOpen)
        ));
        Ok(())
    }
}
