use std::collections::BTreeMap;

use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::ed25519::PublicKey;
use serde::{Deserialize, Serialize};

use super::MAX_LEADERBOARD_SIZE;

/// Game modes, each with its own bounded leaderboard.
#[repr(u8)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum GameMode {
    #[default]
    Classic = 0,
    Blitz = 1,
    Marathon = 2,
}

impl GameMode {
    pub const COUNT: usize = 3;

    pub const ALL: [GameMode; Self::COUNT] = [GameMode::Classic, GameMode::Blitz, GameMode::Marathon];
}

impl TryFrom<u8> for GameMode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Classic),
            1 => Ok(Self::Blitz),
            2 => Ok(Self::Marathon),
            _ => Err(()),
        }
    }
}

impl Write for GameMode {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for GameMode {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        GameMode::try_from(value).map_err(|_| Error::InvalidEnum(value))
    }
}

impl EncodeSize for GameMode {
    fn encode_size(&self) -> usize {
        u8::SIZE
    }
}

/// One ranked slot within a mode's leaderboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub player: PublicKey,
    pub score: u64,
    pub timestamp: u64,
    pub round: u32,
    pub game_mode: GameMode,
    pub game_id: u64,
}

impl Write for LeaderboardEntry {
    fn write(&self, writer: &mut impl BufMut) {
        self.player.write(writer);
        self.score.write(writer);
        self.timestamp.write(writer);
        self.round.write(writer);
        self.game_mode.write(writer);
        self.game_id.write(writer);
    }
}

impl Read for LeaderboardEntry {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            player: PublicKey::read(reader)?,
            score: u64::read(reader)?,
            timestamp: u64::read(reader)?,
            round: u32::read(reader)?,
            game_mode: GameMode::read(reader)?,
            game_id: u64::read(reader)?,
        })
    }
}

impl EncodeSize for LeaderboardEntry {
    fn encode_size(&self) -> usize {
        self.player.encode_size()
            + self.score.encode_size()
            + self.timestamp.encode_size()
            + self.round.encode_size()
            + self.game_mode.encode_size()
            + self.game_id.encode_size()
    }
}

/// Outcome of recording a score against a mode's leaderboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScorePlacement {
    /// New slot created at `rank` (0-based).
    Inserted { rank: usize },
    /// Existing slot moved up to `rank` (0-based).
    Improved { rank: usize },
    /// Player already holds a slot with an equal or better score.
    NotImproved,
    /// Table is full and the score does not beat the current minimum.
    BelowCutoff,
}

/// Bounded, score-sorted table with at most one slot per player.
///
/// Entries are kept strictly sorted by score descending (ties ordered by
/// insertion). A parallel player-to-position index gives O(1) membership; it
/// is not encoded and is rebuilt whenever entries change or are decoded.
#[derive(Clone, Debug, Default)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
    index: BTreeMap<PublicKey, usize>,
}

impl PartialEq for Leaderboard {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Leaderboard {}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// 0-based position of a player's slot, if any.
    pub fn position_of(&self, player: &PublicKey) -> Option<usize> {
        self.index.get(player).copied()
    }

    /// Lowest score currently holding a slot.
    pub fn min_score(&self) -> Option<u64> {
        self.entries.last().map(|entry| entry.score)
    }

    pub fn top(&self, n: usize) -> &[LeaderboardEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn page(&self, offset: usize, limit: usize) -> &[LeaderboardEntry] {
        let start = offset.min(self.entries.len());
        let end = offset.saturating_add(limit).min(self.entries.len());
        &self.entries[start..end]
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (pos, entry) in self.entries.iter().enumerate() {
            self.index.insert(entry.player.clone(), pos);
        }
    }

    /// First position whose score is strictly below `score`, so equal scores
    /// keep their earlier rank.
    fn insert_position(&self, score: u64) -> usize {
        self.entries.partition_point(|entry| entry.score >= score)
    }

    pub fn record(&mut self, entry: LeaderboardEntry) -> ScorePlacement {
        if let Some(pos) = self.position_of(&entry.player) {
            if entry.score <= self.entries[pos].score {
                return ScorePlacement::NotImproved;
            }
            self.entries.remove(pos);
            let rank = self.insert_position(entry.score);
            self.entries.insert(rank, entry);
            self.rebuild_index();
            return ScorePlacement::Improved { rank };
        }

        if self.entries.len() >= MAX_LEADERBOARD_SIZE {
            match self.min_score() {
                Some(min) if entry.score > min => {
                    if let Some(evicted) = self.entries.pop() {
                        self.index.remove(&evicted.player);
                    }
                }
                _ => return ScorePlacement::BelowCutoff,
            }
        }

        let rank = self.insert_position(entry.score);
        self.entries.insert(rank, entry);
        self.rebuild_index();
        ScorePlacement::Inserted { rank }
    }

    /// Replace the table wholesale (owner seeding). Input is sorted, deduped
    /// per player keeping the best score, and truncated to the cap.
    pub fn seed(&mut self, mut entries: Vec<LeaderboardEntry>) {
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        let mut seen = BTreeMap::new();
        entries.retain(|entry| seen.insert(entry.player.clone(), ()).is_none());
        entries.truncate(MAX_LEADERBOARD_SIZE);
        self.entries = entries;
        self.rebuild_index();
    }
}

impl Write for Leaderboard {
    fn write(&self, writer: &mut impl BufMut) {
        self.entries.write(writer);
    }
}

impl Read for Leaderboard {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let entries =
            Vec::<LeaderboardEntry>::read_range(reader, 0..=MAX_LEADERBOARD_SIZE)?;
        if !entries.windows(2).all(|w| w[0].score >= w[1].score) {
            return Err(Error::Invalid("Leaderboard", "entries not sorted"));
        }
        let mut board = Self {
            entries,
            index: BTreeMap::new(),
        };
        board.rebuild_index();
        if board.index.len() != board.entries.len() {
            return Err(Error::Invalid("Leaderboard", "duplicate player"));
        }
        Ok(board)
    }
}

impl EncodeSize for Leaderboard {
    fn encode_size(&self) -> usize {
        self.entries.encode_size()
    }
}
