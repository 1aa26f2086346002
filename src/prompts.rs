//! Centralized prompt definitions for the reasoning pipeline and evaluator
//!
//! Every prompt sent to the completion service is built here, so wording
//! changes never touch pipeline control flow.

use crate::grid::Grid;
use crate::reasoning::{CharacterThought, PhilosophicalCharacter};

/// System message for plain grid prediction.
pub const ARC_SYSTEM_PROMPT: &str = "You are an ARC-AGI grid transformer. Given training input/output \
pairs and one test input grid, you must output the test output grid as a JSON array of arrays of \
integers. Do not include any text or explanations. Output only the JSON array.";

/// System message for rule-inferring grid prediction.
pub const ARC_META_SYSTEM_PROMPT: &str = "You are an ARC-AGI meta-reasoner. Infer abstract rules from \
training input/output pairs, hypothesize general transformations, then apply them to the test input. \
Think through hypotheses internally. Do not reveal any intermediate reasoning. Output only the final \
test output grid as a JSON array of arrays of integers.";

/// Persona framing derived from a character's configuration.
pub fn persona_prompt(name: &str, description: &str, thinking_style: &str, expertise: &[String]) -> String {
    format!(
        r#"You are {name}, {description}.
Your thinking style: {thinking_style}
Areas of expertise: {expertise}

When approaching problems, you should:
1. Think like {name} would naturally think
2. Apply your unique perspective and expertise
3. Consider problems through your philosophical lens
4. Generate hypotheses based on your worldview
5. Express your thoughts in your characteristic manner

Remember: you are not simulating {name}, you are {name} in this moment."#,
        expertise = expertise.join(", "),
    )
}

/// Stage 1: one character analyses the problem.
pub fn perspective_prompt(character: &PhilosophicalCharacter, problem: &str, context: &str) -> String {
    format!(
        r#"{persona}

PROBLEM TO ANALYZE:
{problem}

CONTEXT (if any):
{context}

Based on your philosophical perspective and expertise, analyze this problem.
Think step by step, generate hypotheses, and express your reasoning.

Your analysis:"#,
        persona = character.persona_prompt(),
    )
}

/// Stage 2: synthesize hypotheses from every perspective.
pub fn hypotheses_prompt(problem: &str, thoughts: &[CharacterThought]) -> String {
    format!(
        r#"Based on the following philosophical perspectives on the problem, generate 3-5 specific hypotheses:

PROBLEM: {problem}

PHILOSOPHICAL PERSPECTIVES:
{perspectives}

Generate hypotheses that:
1. Are specific and testable
2. Consider multiple perspectives
3. Build on the philosophical insights
4. Could explain the observed patterns

Your hypotheses:"#,
        perspectives = perspective_lines(thoughts),
    )
}

/// Stage 3: two contrasting approaches.
pub fn dual_approach_prompt(problem: &str, hypotheses: &str, thoughts: &[CharacterThought]) -> String {
    format!(
        r#"PROBLEM: {problem}

HYPOTHESES: {hypotheses}

PHILOSOPHICAL INSIGHTS:
{perspectives}

Generate TWO different approaches to solving this problem:

APPROACH 1: Use a systematic, analytical method
APPROACH 2: Use a creative, intuitive method

For each approach, provide:
- Your reasoning process
- The solution you arrive at
- Your confidence level (0-1)
- Why this approach might be better than the other

Start the second approach on its own line beginning with "APPROACH 2"."#,
        perspectives = perspective_lines(thoughts),
    )
}

/// Stage 4: reconcile both approaches into labelled dual answers.
pub fn dual_answer_prompt(
    problem: &str,
    approach_one: &str,
    approach_two: &str,
    thoughts: &[CharacterThought],
) -> String {
    format!(
        r#"Based on the two approaches below, provide the final dual answers:

PROBLEM: {problem}

APPROACH 1: {approach_one}

APPROACH 2: {approach_two}

PHILOSOPHICAL INSIGHTS:
{perspectives}

Answer using exactly these labels, one per line:
Primary answer: the most likely correct solution
Alternative answer: a different but plausible solution
Primary confidence: a number between 0 and 1
Alternative confidence: a number between 0 and 1
Reasoning comparison: why you chose these answers
Recommended answer: the answer to use, repeated verbatim"#,
        perspectives = perspective_lines(thoughts),
    )
}

/// Stage 5: abstract reusable rules.
pub fn rule_abstraction_prompt(problem: &str, solution: &str, thoughts: &[CharacterThought]) -> String {
    format!(
        r#"Based on this problem-solving session, identify 2-4 general rules or patterns that could be applied to similar problems in the future.

PROBLEM: {problem}
SOLUTION: {solution}
THOUGHT PROCESS:
{perspectives}

Number the rules 1. to 4. For each rule, provide on separate lines:
Description: a clear description of the pattern
Pattern: the specific pattern or rule
Confidence: your confidence in this rule (0-1)
Applicability: when this rule would apply"#,
        perspectives = perspective_lines(thoughts),
    )
}

/// User prompt listing training pairs and the test input.
pub fn arc_user_prompt(task_id: &str, train_pairs: &[(Grid, Grid)], test_input: &Grid) -> String {
    let mut lines = vec![format!("Task: {}", task_id), "Training examples:".to_string()];
    for (i, (input, output)) in train_pairs.iter().enumerate() {
        lines.push(format!("- Example {} input: {}", i + 1, input));
        lines.push(format!("- Example {} output: {}", i + 1, output));
    }
    lines.push("Test input:".to_string());
    lines.push(test_input.to_string());
    lines.push("Return only the JSON array of the test output grid.".to_string());
    lines.join("\n")
}

/// Context passed with every grid puzzle solved by the reasoning pipeline.
pub const ARC_PIPELINE_CONTEXT: &str = "ARC pattern recognition task";

/// Problem statement for solving a grid puzzle through the reasoning pipeline.
pub fn arc_pipeline_problem(
    task_id: &str,
    train_pairs: &[(Grid, Grid)],
    test_input: &Grid,
) -> String {
    format!(
        "Identify the transformation that maps each training input to its output, \
then apply it to the test input. State your primary answer as the output grid.\n\n{}",
        arc_user_prompt(task_id, train_pairs, test_input)
    )
}

/// User prompt asking for an inferred rule before answering.
pub fn arc_meta_user_prompt(task_id: &str, train_pairs: &[(Grid, Grid)], test_input: &Grid) -> String {
    let mut lines = vec![
        format!("Task: {}", task_id),
        "Goal: infer a general rule from the training pairs that maps input to output, then apply it to the test input."
            .to_string(),
        "Training pairs (input then output):".to_string(),
    ];
    for (i, (input, output)) in train_pairs.iter().enumerate() {
        lines.push(format!("- Input {}: {}", i + 1, input));
        lines.push(format!("- Output {}: {}", i + 1, output));
    }
    lines.push("Test input:".to_string());
    lines.push(test_input.to_string());
    lines.push("Think silently. Return only the JSON array of the test output grid.".to_string());
    lines.join("\n")
}

/// `key: thought` lines in registry order.
fn perspective_lines(thoughts: &[CharacterThought]) -> String {
    thoughts
        .iter()
        .map(|t| format!("{}: {}", t.character, t.thought))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thoughts() -> Vec<CharacterThought> {
        vec![
            CharacterThought {
                character: "socrates".to_string(),
                thought: "What is a pattern?".to_string(),
            },
            CharacterThought {
                character: "kant".to_string(),
                thought: "Seek the universal rule.".to_string(),
            },
        ]
    }

    #[test]
    fn test_persona_prompt_lists_expertise() {
        let prompt = persona_prompt(
            "Socrates",
            "a questioner",
            "Dialectical",
            &["logic".to_string(), "ethics".to_string()],
        );
        assert!(prompt.starts_with("You are Socrates, a questioner."));
        assert!(prompt.contains("Areas of expertise: logic, ethics"));
    }

    #[test]
    fn test_hypotheses_prompt_keeps_registry_order() {
        let prompt = hypotheses_prompt("P", &thoughts());
        let socrates = prompt.find("socrates: What is a pattern?").unwrap();
        let kant = prompt.find("kant: Seek the universal rule.").unwrap();
        assert!(socrates < kant);
    }

    #[test]
    fn test_dual_answer_prompt_names_labels() {
        let prompt = dual_answer_prompt("P", "one", "two", &thoughts());
        for label in [
            "Primary answer:",
            "Alternative answer:",
            "Primary confidence:",
            "Alternative confidence:",
            "Reasoning comparison:",
            "Recommended answer:",
        ] {
            assert!(prompt.contains(label), "missing {}", label);
        }
    }

    #[test]
    fn test_arc_user_prompt_layout() {
        let input = Grid::new(vec![vec![1, 0]]).unwrap();
        let output = Grid::new(vec![vec![0, 1]]).unwrap();
        let prompt = arc_user_prompt("abc123", &[(input.clone(), output)], &input);
        let lines: Vec<&str> = prompt.lines().collect();
        assert_eq!(lines[0], "Task: abc123");
        assert_eq!(lines[2], "- Example 1 input: [[1, 0]]");
        assert_eq!(lines[3], "- Example 1 output: [[0, 1]]");
        assert_eq!(lines[5], "[[1, 0]]");
    }

    #[test]
    fn test_arc_meta_user_prompt_layout() {
        let input = Grid::new(vec![vec![3]]).unwrap();
        let prompt = arc_meta_user_prompt("t", &[(input.clone(), input.clone())], &input);
        assert!(prompt.contains("- Input 1: [[3]]"));
        assert!(prompt.ends_with("Think silently. Return only the JSON array of the test output grid."));
    }
}
