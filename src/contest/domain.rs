use serde::{Deserialize, Serialize};

/// Closed set of dimensions a submission is scored on. Votes outside this set
/// are rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteCategory {
    Creatividad,
    Mensaje,
    Equipo,
}

impl VoteCategory {
    pub const fn ordered() -> [Self; 3] {
        [Self::Creatividad, Self::Mensaje, Self::Equipo]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Creatividad => "creatividad",
            Self::Mensaje => "mensaje",
            Self::Equipo => "equipo",
        }
    }

    /// Column name carried by the durable file and the exports.
    pub const fn column(self) -> &'static str {
        match self {
            Self::Creatividad => "votes_creatividad",
            Self::Mensaje => "votes_mensaje",
            Self::Equipo => "votes_equipo",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "creatividad" => Some(Self::Creatividad),
            "mensaje" => Some(Self::Mensaje),
            "equipo" => Some(Self::Equipo),
            _ => None,
        }
    }
}

/// Per-category vote counters. Counts only ever grow, one increment at a
/// time; the total is always derived, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub creatividad: u64,
    pub mensaje: u64,
    pub equipo: u64,
}

impl VoteTally {
    pub const fn zero() -> Self {
        Self {
            creatividad: 0,
            mensaje: 0,
            equipo: 0,
        }
    }

    pub const fn count(self, category: VoteCategory) -> u64 {
        match category {
            VoteCategory::Creatividad => self.creatividad,
            VoteCategory::Mensaje => self.mensaje,
            VoteCategory::Equipo => self.equipo,
        }
    }

    pub const fn total(self) -> u64 {
        self.creatividad + self.mensaje + self.equipo
    }

    /// Copy with exactly the named category incremented by one.
    #[must_use]
    pub const fn incremented(self, category: VoteCategory) -> Self {
        match category {
            VoteCategory::Creatividad => Self {
                creatividad: self.creatividad + 1,
                ..self
            },
            VoteCategory::Mensaje => Self {
                mensaje: self.mensaje + 1,
                ..self
            },
            VoteCategory::Equipo => Self {
                equipo: self.equipo + 1,
                ..self
            },
        }
    }
}

/// One accepted submission with its vote counters.
///
/// `submitted_at` is a `YYYYMMDD_HHMMSS` string, so lexicographic order is
/// chronological order. `filename` is the unique stored name derived from the
/// timestamp and the sanitized team name; it never changes once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub submitted_at: String,
    pub team: String,
    pub participants: String,
    pub department: String,
    pub hashtag: String,
    pub slogan: String,
    pub fact: String,
    pub filename: String,
    pub origin: String,
    pub votes: VoteTally,
}

impl SubmissionRecord {
    pub fn total_votes(&self) -> u64 {
        self.votes.total()
    }
}
