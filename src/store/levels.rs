use std::fmt;

use crate::mindmap::model::{Level, LevelNo};

pub const MAX_LEVELS: usize = 6;
pub const MIN_LEVELS: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    Full { max: usize },
    LastLevel,
    NotFound(LevelNo),
    OutOfRange(LevelNo),
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full { max } => write!(f, "cannot add more than {max} levels"),
            Self::LastLevel => f.write_str("at least one level must remain"),
            Self::NotFound(level) => write!(f, "level {level} does not exist"),
            Self::OutOfRange(level) => write!(f, "cannot insert after level {level}"),
        }
    }
}

impl std::error::Error for LevelError {}

/// Ordered level list, always numbered 1..=len.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LevelTable {
    levels: Vec<Level>,
}

impl LevelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_levels(levels: Vec<Level>) -> Self {
        let mut table = Self { levels };
        table.normalize();
        table
    }

    pub fn as_slice(&self) -> &[Level] {
        &self.levels
    }

    pub fn to_vec(&self) -> Vec<Level> {
        self.levels.clone()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, level: LevelNo) -> Option<&Level> {
        self.levels.iter().find(|l| l.level == level)
    }

    pub fn last_level(&self) -> LevelNo {
        self.levels.len() as LevelNo
    }

    pub fn can_add(&self) -> bool {
        self.levels.len() < MAX_LEVELS
    }

    pub fn can_delete(&self) -> bool {
        self.levels.len() > MIN_LEVELS
    }

    // Sort, cap at MAX_LEVELS and renumber contiguously from 1
    fn normalize(&mut self) {
        self.levels.sort_by_key(|l| l.level);
        if self.levels.len() > MAX_LEVELS {
            log::warn!("dropping {} levels beyond the maximum of {}", self.levels.len() - MAX_LEVELS, MAX_LEVELS);
            self.levels.truncate(MAX_LEVELS);
        }
        for (i, level) in self.levels.iter_mut().enumerate() {
            level.level = i as LevelNo + 1;
        }
    }

    /// Insert a new level directly after `after` (0 inserts in front).
    /// Every level numbered above `after` moves up by one. Returns the new
    /// level's number.
    pub fn insert_after(&mut self, after: LevelNo, label: String, description: String) -> Result<LevelNo, LevelError> {
        if !self.can_add() {
            return Err(LevelError::Full { max: MAX_LEVELS });
        }
        if after as usize > self.levels.len() {
            return Err(LevelError::OutOfRange(after));
        }
        for level in self.levels.iter_mut().filter(|l| l.level > after) {
            level.level += 1;
        }
        let number = after + 1;
        self.levels.insert(after as usize, Level::new(number, label, description));
        Ok(number)
    }

    pub fn delete(&mut self, level: LevelNo) -> Result<(), LevelError> {
        if !self.can_delete() {
            return Err(LevelError::LastLevel);
        }
        let idx = self
            .levels
            .iter()
            .position(|l| l.level == level)
            .ok_or(LevelError::NotFound(level))?;
        self.levels.remove(idx);
        for l in self.levels.iter_mut().filter(|l| l.level > level) {
            l.level -= 1;
        }
        Ok(())
    }

    pub fn edit(&mut self, level: LevelNo, label: String, description: String) -> bool {
        match self.levels.iter_mut().find(|l| l.level == level) {
            Some(l) => {
                l.label = label;
                l.description = description;
                true
            }
            None => false,
        }
    }

    pub fn set_active(&mut self, level: LevelNo) -> bool {
        if self.get(level).is_none() {
            return false;
        }
        for l in self.levels.iter_mut() {
            l.is_active = l.level == level;
        }
        true
    }

    pub fn active(&self) -> Option<LevelNo> {
        self.levels.iter().find(|l| l.is_active).map(|l| l.level)
    }

    pub fn update_counts(&mut self, count_at: impl Fn(LevelNo) -> usize) {
        for l in self.levels.iter_mut() {
            l.node_count = count_at(l.level);
        }
    }
}
