use std::collections::BTreeMap;

use serde_json::{json, Map};

use crate::content::generator::{check_difficulty, GenerateError, Generator};
use crate::content::item::{
    ItemMeta, ItemMisconception, ItemStatus, MathProblemItem, ProblemContent, SolutionLogic,
    SolutionStep,
};
use crate::rng::UnitRng;

pub const SKILL_ID: &str = "arith.add_whole";
const DEFAULT_MAX_OPERAND: u32 = 999;
const MIN_OPERAND_CEILING: u32 = 9;

/// Two-operand whole-number addition. Difficulty scales the operand ceiling
/// from single digits up to `max_operand`.
#[derive(Debug, Clone)]
pub struct AdditionGenerator {
    skill_id: String,
    max_operand: u32,
}

impl AdditionGenerator {
    pub fn new(skill_id: impl Into<String>, max_operand: u32) -> Self {
        Self {
            skill_id: skill_id.into(),
            max_operand: max_operand.max(MIN_OPERAND_CEILING),
        }
    }

    fn ceiling(&self, difficulty: f64) -> u32 {
        let span = (self.max_operand - MIN_OPERAND_CEILING) as f64;
        MIN_OPERAND_CEILING + (span * difficulty * difficulty).round() as u32
    }
}

impl Default for AdditionGenerator {
    fn default() -> Self {
        Self::new(SKILL_ID, DEFAULT_MAX_OPERAND)
    }
}

fn draw_operand(rng: &mut dyn UnitRng, ceiling: u32) -> u32 {
    1 + crate::rng::pick_index(rng, ceiling as usize) as u32
}

impl Generator for AdditionGenerator {
    fn skill_id(&self) -> &str {
        &self.skill_id
    }

    fn generate(
        &self,
        difficulty: f64,
        rng: &mut dyn UnitRng,
    ) -> Result<MathProblemItem, GenerateError> {
        let difficulty = check_difficulty(difficulty)?;
        let ceiling = self.ceiling(difficulty);
        let a = draw_operand(rng, ceiling);
        let b = draw_operand(rng, ceiling);
        let sum = a + b;

        let ones = a % 10 + b % 10;
        let mut steps = vec![SolutionStep {
            step_index: 1,
            explanation: "Add the ones digits.".into(),
            math: Some(format!("{} + {} = {}", a % 10, b % 10, ones)),
            answer: Some(ones.to_string()),
        }];
        if a >= 10 || b >= 10 {
            steps.push(SolutionStep {
                step_index: 2,
                explanation: if ones >= 10 {
                    "Carry the ten and add the remaining place values.".into()
                } else {
                    "Add the remaining place values.".into()
                },
                math: Some(format!("{a} + {b} = {sum}")),
                answer: Some(sum.to_string()),
            });
        }

        let misconceptions = if ones >= 10 {
            vec![ItemMisconception {
                id: "forgot_carry".into(),
                trigger: (sum - 10).to_string(),
                hint: "Did you carry the ten to the next place?".into(),
            }]
        } else {
            Vec::new()
        };

        let mut variables = BTreeMap::new();
        variables.insert("a".to_string(), json!(a));
        variables.insert("b".to_string(), json!(b));

        Ok(MathProblemItem {
            meta: ItemMeta {
                id: uuid::Uuid::new_v4().to_string(),
                version: 1,
                skill_id: self.skill_id.clone(),
                difficulty,
                created_at: Some(chrono::Utc::now().to_rfc3339()),
                verified: false,
                status: ItemStatus::Draft,
                extra: Map::new(),
            },
            problem_content: ProblemContent {
                stem: format!("What is {a} + {b}?"),
                variables,
            },
            answer_spec: json!({
                "answer_mode": "final_only",
                "input_type": "integer",
            }),
            solution_logic: SolutionLogic {
                final_answer_canonical: sum.to_string(),
                final_answer_type: "integer".into(),
                steps,
            },
            misconceptions,
            extra: Map::new(),
        })
    }
}
