//! Per-pathology probabilities produced by one inference pass

use crate::io::error::{Result, invalid_parameter};
use crate::math::probability::descending_order;

/// Independent probability per pathology, in vocabulary order
#[derive(Debug, Clone, PartialEq)]
pub struct PathologyScores {
    names: Vec<String>,
    probabilities: Vec<f32>,
}

impl PathologyScores {
    /// Pair a vocabulary with its probabilities
    ///
    /// # Errors
    ///
    /// Returns an error if the lengths differ, a name repeats, or a
    /// probability lies outside [0, 1]
    pub fn new(names: Vec<String>, probabilities: Vec<f32>) -> Result<Self> {
        if names.len() != probabilities.len() {
            return Err(invalid_parameter(
                "probabilities",
                &probabilities.len(),
                &format!("expected {} entries", names.len()),
            ));
        }
        for (i, name) in names.iter().enumerate() {
            if names.iter().skip(i + 1).any(|other| other == name) {
                return Err(invalid_parameter(
                    "names",
                    name,
                    &"pathology names must be unique",
                ));
            }
        }
        if let Some(bad) = probabilities
            .iter()
            .find(|p| !(0.0..=1.0).contains(*p))
        {
            return Err(invalid_parameter(
                "probabilities",
                bad,
                &"probabilities must be within [0, 1]",
            ));
        }
        Ok(Self {
            names,
            probabilities,
        })
    }

    /// Probability of one pathology, `None` if it is not in the vocabulary
    pub fn get(&self, pathology: &str) -> Option<f32> {
        self.position(pathology)
            .and_then(|i| self.probabilities.get(i).copied())
    }

    /// Index of a pathology in the vocabulary
    pub fn position(&self, pathology: &str) -> Option<usize> {
        self.names.iter().position(|name| name == pathology)
    }

    /// Vocabulary in output order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Probabilities in vocabulary order
    pub fn probabilities(&self) -> &[f32] {
        &self.probabilities
    }

    /// Iterate `(name, probability)` pairs in vocabulary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.probabilities.iter().copied())
    }

    /// Number of pathologies
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the vocabulary is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether every probability is exactly zero
    pub fn all_zero(&self) -> bool {
        self.probabilities.iter().all(|&p| p == 0.0)
    }

    /// Names ordered by descending probability, ties keep vocabulary order
    pub fn sorted_descending(&self) -> Vec<String> {
        descending_order(&self.probabilities)
            .into_iter()
            .filter_map(|i| self.names.get(i).cloned())
            .collect()
    }

    /// Pathologies scoring at or above `threshold`, strongest first
    pub fn findings(&self, threshold: f32) -> Vec<(&str, f32)> {
        descending_order(&self.probabilities)
            .into_iter()
            .filter_map(|i| {
                let name = self.names.get(i)?;
                let p = self.probabilities.get(i).copied()?;
                (p >= threshold).then_some((name.as_str(), p))
            })
            .collect()
    }
}
