//! SeriesCatalog - compiled series metadata

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use tracing::{debug, warn};

use super::numbering::ShotNumbering;
use crate::ast::{EpisodeDoc, SeriesDoc};
use crate::context::Context;
use crate::error::{BifrostError, Result};
use crate::util::constants::SERIES_FILE;
use crate::util::intern;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSequence {
    pub id: Arc<str>,
    pub name: String,
    pub shots: Vec<String>,
    /// Keys the document carries beyond id/name/shots
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Episode {
    pub id: Arc<str>,
    pub name: String,
    pub code: String,
    pub sequences: Vec<SeriesSequence>,
}

impl Episode {
    pub fn sequence(&self, id: &str) -> Option<&SeriesSequence> {
        self.sequences.iter().find(|s| s.id.as_ref() == id)
    }
}

/// Character, prop or set reused across episodes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedElement {
    pub kind: String,
    pub name: String,
    pub id: Arc<str>,
    pub applies_to: Vec<Arc<str>>,
}

impl SharedElement {
    pub fn applies_to_episode(&self, episode: &str) -> bool {
        self.applies_to.iter().any(|e| e.as_ref() == episode)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deliverable {
    pub name: String,
    pub format: String,
    pub resolution: String,
    pub frame_rate: f64,
}

/// Episodes, sequences and shot numbering of one series
#[derive(Debug, Clone, Default)]
pub struct SeriesCatalog {
    name: String,
    code: String,
    numbering: ShotNumbering,
    episodes: Vec<Episode>,
    index: FxHashMap<Arc<str>, usize>,
    shared_elements: Vec<SharedElement>,
    deliverables: Vec<Deliverable>,
}

impl SeriesCatalog {
    /// Compile a parsed document
    ///
    /// Fails on an invalid shot pattern or a duplicated episode or sequence id.
    pub fn build(doc: &SeriesDoc) -> Result<Self> {
        let numbering = match &doc.numbering.shot_pattern {
            Some(pattern) => ShotNumbering::parse(pattern)?,
            None => ShotNumbering::default(),
        };

        let mut episodes = Vec::with_capacity(doc.episodes.len());
        let mut index = FxHashMap::default();
        for ep in &doc.episodes {
            let episode = compile_episode(ep)?;
            if index.insert(Arc::clone(&episode.id), episodes.len()).is_some() {
                return Err(invalid(format!("episode '{}' is listed twice", episode.id)));
            }
            episodes.push(episode);
        }

        let shared_elements: Vec<SharedElement> = doc
            .shared_elements
            .iter()
            .map(|elem| SharedElement {
                kind: elem.kind.clone(),
                name: elem.name.clone(),
                id: intern(&elem.id),
                applies_to: elem.applies_to.iter().map(|e| intern(e)).collect(),
            })
            .collect();
        for elem in &shared_elements {
            for ep in elem.applies_to.iter().filter(|ep| !index.contains_key(*ep)) {
                warn!(element = %elem.id, episode = %ep, "Shared element names an unknown episode");
            }
        }

        let deliverables = doc
            .deliverables
            .iter()
            .map(|d| Deliverable {
                name: d.name.clone(),
                format: d.format.clone(),
                resolution: d.resolution.clone(),
                frame_rate: d.frame_rate,
            })
            .collect();

        debug!(
            series = %doc.code,
            episodes = episodes.len(),
            shared = shared_elements.len(),
            "Compiled series catalog"
        );
        Ok(Self {
            name: doc.name.clone(),
            code: doc.code.clone(),
            numbering,
            episodes,
            index,
            shared_elements,
            deliverables,
        })
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        Self::build(&SeriesDoc::parse(yaml)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Series code, the value of `SERIES`
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn numbering(&self) -> &ShotNumbering {
        &self.numbering
    }

    /// Episodes in document order
    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn episode(&self, id: &str) -> Option<&Episode> {
        self.index.get(id).map(|&i| &self.episodes[i])
    }

    pub fn sequence(&self, episode: &str, sequence: &str) -> Option<&SeriesSequence> {
        self.episode(episode)?.sequence(sequence)
    }

    /// Shot id for `number` following `numbering.shot_pattern`
    pub fn generate_shot_id(&self, episode: &str, sequence: &str, number: u32) -> String {
        self.numbering.format(episode, sequence, number)
    }

    /// Shared elements of one episode, or all of them
    pub fn shared_elements(&self, episode: Option<&str>) -> Vec<&SharedElement> {
        match episode {
            Some(ep) => self
                .shared_elements
                .iter()
                .filter(|e| e.applies_to_episode(ep))
                .collect(),
            None => self.shared_elements.iter().collect(),
        }
    }

    pub fn deliverables(&self) -> &[Deliverable] {
        &self.deliverables
    }

    /// `SERIES`/`EPISODE`/`SEQUENCE`/`SHOT` for a numbered shot
    ///
    /// `None` when the episode or the sequence is not in the catalog.
    pub fn shot_context(&self, episode: &str, sequence: &str, number: u32) -> Option<Context> {
        let ep = self.episode(episode)?;
        let seq = ep.sequence(sequence)?;
        let shot = self.generate_shot_id(episode, sequence, number);
        let series = Some(self.code.as_str()).filter(|c| !c.is_empty());
        Some(
            Context::builder()
                .set_opt("SERIES", series)
                .set("EPISODE", ep.id.as_ref())
                .shot(&seq.id, &shot)
                .build(),
        )
    }
}

fn compile_episode(doc: &EpisodeDoc) -> Result<Episode> {
    if doc.id.trim().is_empty() {
        return Err(invalid("episode with an empty id".to_string()));
    }
    let mut seen = FxHashSet::default();
    let mut sequences = Vec::with_capacity(doc.sequences.len());
    for seq in &doc.sequences {
        if !seen.insert(seq.id.as_str()) {
            return Err(invalid(format!(
                "sequence '{}' is listed twice in episode '{}'",
                seq.id, doc.id
            )));
        }
        sequences.push(SeriesSequence {
            id: intern(&seq.id),
            name: seq.name.clone(),
            shots: seq.shots.clone(),
            extra: seq.extra.clone(),
        });
    }
    Ok(Episode {
        id: intern(&doc.id),
        name: doc.name.clone(),
        code: doc.code.clone(),
        sequences,
    })
}

fn invalid(reason: String) -> BifrostError {
    BifrostError::ConfigLoad {
        document: SERIES_FILE.to_string(),
        reason,
    }
}
