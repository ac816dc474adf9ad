use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreKind {
    Fitness,
    DesignPosition { position: u32 },
    /// One replicate estimate feeding the ensemble; several per set.
    Replicate,
    /// The aggregate written after ranking; exactly one per ranked set.
    Ensemble,
}

/// One immutable score produced during a run. `replicate` carries the index of
/// a [`ScoreKind::Replicate`] record and is `None` for every other kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub mutation_set_id: String,
    pub kind: ScoreKind,
    pub value: f64,
    pub replicate: Option<usize>,
}

impl ScoreRecord {
    pub fn fitness(mutation_set_id: &str, value: f64) -> Self {
        Self {
            mutation_set_id: mutation_set_id.to_string(),
            kind: ScoreKind::Fitness,
            value,
            replicate: None,
        }
    }

    pub fn design(mutation_set_id: &str, position: u32, value: f64) -> Self {
        Self {
            mutation_set_id: mutation_set_id.to_string(),
            kind: ScoreKind::DesignPosition { position },
            value,
            replicate: None,
        }
    }

    pub fn replicate(mutation_set_id: &str, index: usize, value: f64) -> Self {
        Self {
            mutation_set_id: mutation_set_id.to_string(),
            kind: ScoreKind::Replicate,
            value,
            replicate: Some(index),
        }
    }

    pub fn ensemble(mutation_set_id: &str, value: f64) -> Self {
        Self {
            mutation_set_id: mutation_set_id.to_string(),
            kind: ScoreKind::Ensemble,
            value,
            replicate: None,
        }
    }
}

/// Stage-scoped, append-only accumulator of [`ScoreRecord`]s.
///
/// Records are never modified or removed once pushed; concurrent scoring tasks
/// fill their own ledgers which are then merged in a fixed order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreLedger {
    records: Vec<ScoreRecord>,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ScoreRecord) {
        self.records.push(record);
    }

    pub fn append(&mut self, other: ScoreLedger) {
        self.records.extend(other.records);
    }

    pub fn records(&self) -> &[ScoreRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn for_set<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ScoreRecord> + 'a {
        self.records.iter().filter(move |r| r.mutation_set_id == id)
    }

    pub fn fitness(&self, id: &str) -> Option<f64> {
        self.for_set(id)
            .find(|r| r.kind == ScoreKind::Fitness)
            .map(|r| r.value)
    }

    pub fn design_scores(&self, id: &str) -> Vec<(u32, f64)> {
        self.for_set(id)
            .filter_map(|r| match r.kind {
                ScoreKind::DesignPosition { position } => Some((position, r.value)),
                _ => None,
            })
            .collect()
    }

    pub fn replicates(&self, id: &str) -> Vec<f64> {
        self.for_set(id)
            .filter(|r| r.kind == ScoreKind::Replicate)
            .map(|r| r.value)
            .collect()
    }

    pub fn ensemble(&self, id: &str) -> Option<f64> {
        self.for_set(id)
            .find(|r| r.kind == ScoreKind::Ensemble)
            .map(|r| r.value)
    }
}
