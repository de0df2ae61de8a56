//! Result types for epoch-conditioned spike counts.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// An epoch condition: a single marker or a conjunction of markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Condition {
    /// Trial marker active.
    #[serde(rename = "t")]
    Trial,
    /// Reward marker active.
    #[serde(rename = "r")]
    Reward,
    /// Light marker active.
    #[serde(rename = "l")]
    Light,
    /// Trial and reward both active.
    #[serde(rename = "tr")]
    TrialReward,
    /// Trial and light both active.
    #[serde(rename = "tl")]
    TrialLight,
    /// Reward and light both active.
    #[serde(rename = "rl")]
    RewardLight,
    /// All three markers active.
    #[serde(rename = "trl")]
    TrialRewardLight,
}

impl Condition {
    /// Every condition, in key order t, r, l, tr, tl, rl, trl.
    pub const ALL: [Condition; 7] = [
        Condition::Trial,
        Condition::Reward,
        Condition::Light,
        Condition::TrialReward,
        Condition::TrialLight,
        Condition::RewardLight,
        Condition::TrialRewardLight,
    ];

    /// The short result key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Trial => "t",
            Self::Reward => "r",
            Self::Light => "l",
            Self::TrialReward => "tr",
            Self::TrialLight => "tl",
            Self::RewardLight => "rl",
            Self::TrialRewardLight => "trl",
        }
    }

    /// Look up a condition by its short key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Whether the condition holds for one sample's marker values.
    pub fn is_active(&self, trial: bool, reward: bool, light: bool) -> bool {
        match self {
            Self::Trial => trial,
            Self::Reward => reward,
            Self::Light => light,
            Self::TrialReward => trial && reward,
            Self::TrialLight => trial && light,
            Self::RewardLight => reward && light,
            Self::TrialRewardLight => trial && reward && light,
        }
    }

    /// The single-marker conditions this condition is a conjunction of.
    pub fn components(&self) -> &'static [Condition] {
        match self {
            Self::Trial => &[Self::Trial],
            Self::Reward => &[Self::Reward],
            Self::Light => &[Self::Light],
            Self::TrialReward => &[Self::Trial, Self::Reward],
            Self::TrialLight => &[Self::Trial, Self::Light],
            Self::RewardLight => &[Self::Reward, Self::Light],
            Self::TrialRewardLight => &[Self::Trial, Self::Reward, Self::Light],
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Spike counts per epoch condition.
///
/// Either empty, when the input was rejected, or holding exactly one count
/// for each of the seven conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpikeCounts {
    counts: BTreeMap<Condition, u64>,
}

impl SpikeCounts {
    /// The empty result returned for rejected input.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a complete result from one count per condition.
    pub fn from_fn(mut count: impl FnMut(Condition) -> u64) -> Self {
        Self {
            counts: Condition::ALL.into_iter().map(|c| (c, count(c))).collect(),
        }
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of conditions present (0 or 7).
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Count for a condition.
    pub fn get(&self, condition: Condition) -> Option<u64> {
        self.counts.get(&condition).copied()
    }

    /// Count for a short key such as `"tr"`.
    pub fn get_key(&self, key: &str) -> Option<u64> {
        Condition::from_key(key).and_then(|c| self.get(c))
    }

    /// Iterate over `(condition, count)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (Condition, u64)> + '_ {
        self.counts.iter().map(|(c, n)| (*c, *n))
    }

    /// Serialize as a JSON object keyed by short condition keys.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write counts to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "condition\tspike_count")?;
        for (condition, count) in self.iter() {
            writeln!(writer, "{}\t{}", condition.key(), count)?;
        }
        writer.flush()?;

        Ok(())
    }
}

impl fmt::Display for SpikeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "(no result: input rejected)");
        }
        for (condition, count) in self.iter() {
            writeln!(f, "{:<4}{}", condition.key(), count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_keys() {
        let keys: Vec<&str> = Condition::ALL.iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["t", "r", "l", "tr", "tl", "rl", "trl"]);
        for c in Condition::ALL {
            assert_eq!(Condition::from_key(c.key()), Some(c));
        }
        assert_eq!(Condition::from_key("x"), None);
    }

    #[test]
    fn test_is_active_matches_components() {
        for bits in 0u8..8 {
            let (t, r, l) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
            for c in Condition::ALL {
                let expected = c.components().iter().all(|single| single.is_active(t, r, l));
                assert_eq!(c.is_active(t, r, l), expected, "{} at {:03b}", c, bits);
            }
        }
    }

    #[test]
    fn test_json_shape() {
        let counts = SpikeCounts::from_fn(|c| c.key().len() as u64);
        let json = counts.to_json_string().unwrap();
        let parsed: BTreeMap<String, u64> = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.len(), 7);
        assert_eq!(parsed["trl"], 3);
        assert_eq!(parsed["t"], 1);
    }

    #[test]
    fn test_empty() {
        let counts = SpikeCounts::empty();
        assert!(counts.is_empty());
        assert_eq!(counts.get(Condition::Trial), None);
        assert_eq!(counts.to_json_string().unwrap(), "{}");
    }

    #[test]
    fn test_tsv_output() {
        let counts = SpikeCounts::from_fn(|_| 2);
        let file = tempfile::NamedTempFile::new().unwrap();
        counts.to_tsv(file.path()).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.starts_with("condition\tspike_count\n"));
        assert!(content.contains("trl\t2"));
        assert_eq!(content.lines().count(), 8);
    }
}
