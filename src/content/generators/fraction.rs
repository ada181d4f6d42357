use std::collections::BTreeMap;

use serde_json::{json, Map};

use crate::content::generator::{check_difficulty, GenerateError, Generator};
use crate::content::item::{
    ItemMeta, ItemMisconception, ItemStatus, MathProblemItem, ProblemContent, SolutionLogic,
    SolutionStep,
};
use crate::rng::{pick_index, UnitRng};

pub const SKILL_ID: &str = "frac.of_quantity";

// Ordered easiest first; difficulty widens the pool.
const DENOMINATORS: [u32; 8] = [2, 4, 3, 5, 10, 6, 8, 12];

/// "What is n/d of q?" with q a multiple of d, so the answer is whole.
#[derive(Debug, Clone, Default)]
pub struct FractionOfQuantityGenerator;

impl FractionOfQuantityGenerator {
    fn denominator_pool(difficulty: f64) -> &'static [u32] {
        let len = 2 + ((DENOMINATORS.len() - 2) as f64 * difficulty).round() as usize;
        &DENOMINATORS[..len.min(DENOMINATORS.len())]
    }
}

impl Generator for FractionOfQuantityGenerator {
    fn skill_id(&self) -> &str {
        SKILL_ID
    }

    fn generate(
        &self,
        difficulty: f64,
        rng: &mut dyn UnitRng,
    ) -> Result<MathProblemItem, GenerateError> {
        let difficulty = check_difficulty(difficulty)?;
        let pool = Self::denominator_pool(difficulty);
        let d = pool[pick_index(rng, pool.len())];
        let n = 1 + pick_index(rng, (d - 1) as usize) as u32;
        let max_groups = 2 + (10.0 * difficulty).round() as usize;
        let groups = 1 + pick_index(rng, max_groups) as u32;
        let quantity = d * groups;
        let answer = n * groups;

        let mut variables = BTreeMap::new();
        variables.insert("numerator".to_string(), json!(n));
        variables.insert("denominator".to_string(), json!(d));
        variables.insert("quantity".to_string(), json!(quantity));

        let misconceptions = vec![ItemMisconception {
            id: "divide_only".into(),
            trigger: groups.to_string(),
            hint: format!("You found 1/{d}. How many of those parts do you need?"),
        }];

        Ok(MathProblemItem {
            meta: ItemMeta {
                id: uuid::Uuid::new_v4().to_string(),
                version: 1,
                skill_id: SKILL_ID.to_string(),
                difficulty,
                created_at: Some(chrono::Utc::now().to_rfc3339()),
                verified: false,
                status: ItemStatus::Draft,
                extra: Map::new(),
            },
            problem_content: ProblemContent {
                stem: format!("What is {n}/{d} of {quantity}?"),
                variables,
            },
            answer_spec: json!({
                "answer_mode": "final_only",
                "input_type": "integer",
            }),
            solution_logic: SolutionLogic {
                final_answer_canonical: answer.to_string(),
                final_answer_type: "integer".into(),
                steps: vec![
                    SolutionStep {
                        step_index: 1,
                        explanation: format!("Split {quantity} into {d} equal parts."),
                        math: Some(format!("{quantity} ÷ {d} = {groups}")),
                        answer: Some(groups.to_string()),
                    },
                    SolutionStep {
                        step_index: 2,
                        explanation: format!("Take {n} of those parts."),
                        math: Some(format!("{n} × {groups} = {answer}")),
                        answer: Some(answer.to_string()),
                    },
                ],
            },
            misconceptions,
            extra: Map::new(),
        })
    }
}
