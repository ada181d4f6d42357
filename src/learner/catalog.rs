use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use super::types::{BktParams, Skill};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate skill id: {0}")]
    DuplicateSkill(String),
    #[error("skill {skill_id}: BKT parameter `{field}` must be within [0, 1]")]
    InvalidBktParams {
        skill_id: String,
        field: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Ordered, id-indexed skill registry. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct SkillCatalog {
    skills: Vec<Skill>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDiagnostics {
    /// `(skill_id, prerequisite_id)` pairs whose prerequisite is not in the catalog.
    pub unknown_prerequisites: Vec<(String, String)>,
    /// Each entry lists the skill ids of one prerequisite cycle, in traversal order.
    pub cycles: Vec<Vec<String>>,
}

impl CatalogDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.unknown_prerequisites.is_empty() && self.cycles.is_empty()
    }
}

impl SkillCatalog {
    pub fn new(skills: Vec<Skill>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(skills.len());
        for (pos, skill) in skills.iter().enumerate() {
            if index.insert(skill.id.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateSkill(skill.id.clone()));
            }
            if let Some(field) = skill.bkt_params.and_then(|o| o.out_of_range()) {
                return Err(CatalogError::InvalidBktParams {
                    skill_id: skill.id.clone(),
                    field,
                });
            }
        }
        Ok(Self { skills, index })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let skills: Vec<Skill> = serde_json::from_str(json)?;
        Self::new(skills)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json_str(&raw)?;
        tracing::info!(
            path = %path.as_ref().display(),
            skills = catalog.len(),
            "skill catalog loaded"
        );
        Ok(catalog)
    }

    pub fn get(&self, skill_id: &str) -> Option<&Skill> {
        self.index.get(skill_id).map(|&pos| &self.skills[pos])
    }

    pub fn contains(&self, skill_id: &str) -> bool {
        self.index.contains_key(skill_id)
    }

    /// BKT parameters for a skill; unknown ids resolve to the defaults.
    pub fn bkt_params(&self, skill_id: &str) -> BktParams {
        self.get(skill_id)
            .map(Skill::bkt)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Skill> {
        self.skills.iter()
    }

    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Reports dangling prerequisites and prerequisite cycles. The scheduler
    /// tolerates both; this only surfaces them.
    pub fn diagnostics(&self) -> CatalogDiagnostics {
        let mut report = CatalogDiagnostics::default();

        for skill in &self.skills {
            for prereq in &skill.prerequisites {
                if !self.contains(prereq) {
                    report
                        .unknown_prerequisites
                        .push((skill.id.clone(), prereq.clone()));
                }
            }
        }

        report.cycles = self.find_cycles();

        for (skill, prereq) in &report.unknown_prerequisites {
            tracing::warn!(skill_id = %skill, prerequisite = %prereq, "prerequisite not in catalog");
        }
        for cycle in &report.cycles {
            tracing::warn!(cycle = ?cycle, "prerequisite cycle in skill catalog");
        }

        report
    }

    /// Iterative DFS over prerequisite edges; each back edge yields one cycle.
    fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        let mut marks = vec![Mark::Unvisited; self.skills.len()];
        // (skill position, next prerequisite to inspect)
        let mut path: Vec<(usize, usize)> = Vec::new();

        for start in 0..self.skills.len() {
            if marks[start] != Mark::Unvisited {
                continue;
            }
            marks[start] = Mark::OnPath;
            path.push((start, 0));

            while let Some(frame) = path.last_mut() {
                let (node, cursor) = *frame;
                let prerequisites = &self.skills[node].prerequisites;
                if cursor == prerequisites.len() {
                    marks[node] = Mark::Done;
                    path.pop();
                    continue;
                }
                frame.1 += 1;

                let Some(&next) = self.index.get(&prerequisites[cursor]) else {
                    continue;
                };
                match marks[next] {
                    Mark::Unvisited => {
                        marks[next] = Mark::OnPath;
                        path.push((next, 0));
                    }
                    Mark::OnPath => {
                        if let Some(pos) = path.iter().position(|&(n, _)| n == next) {
                            cycles.push(
                                path[pos..]
                                    .iter()
                                    .map(|&(n, _)| self.skills[n].id.clone())
                                    .collect(),
                            );
                        }
                    }
                    Mark::Done => {}
                }
            }
        }

        cycles
    }
}
