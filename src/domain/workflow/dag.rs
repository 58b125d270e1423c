//! Step dependency ordering (Kahn's algorithm)

use std::collections::{HashMap, VecDeque};

use super::entity::WorkflowStep;
use super::error::WorkflowError;

/// Order steps so every step comes after all of its dependencies.
///
/// Steps with no pending dependencies are released in declaration order.
/// Fails with `CycleDetected` when some steps can never be released, and with
/// `StepNotFound` when a dependency names a step that is not declared.
pub fn topological_order(steps: &[WorkflowStep]) -> Result<Vec<&WorkflowStep>, WorkflowError> {
    let index: HashMap<&str, usize> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| (step.id(), i))
        .collect();

    if index.len() != steps.len() {
        return Err(WorkflowError::validation("Duplicate step IDs in workflow"));
    }

    let mut in_degree = vec![0usize; steps.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); steps.len()];

    for (i, step) in steps.iter().enumerate() {
        for dependency in step.dependencies() {
            let &d = index.get(dependency.as_str()).ok_or_else(|| {
                WorkflowError::step_not_found(format!(
                    "'{}' (dependency of step '{}')",
                    dependency,
                    step.id()
                ))
            })?;
            dependents[d].push(i);
            in_degree[i] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..steps.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut ordered = Vec::with_capacity(steps.len());

    while let Some(i) = queue.pop_front() {
        ordered.push(&steps[i]);

        for &dependent in &dependents[i] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if ordered.len() < steps.len() {
        let blocked: Vec<&str> = steps
            .iter()
            .enumerate()
            .filter(|(i, _)| in_degree[*i] > 0)
            .map(|(_, step)| step.id())
            .collect();

        return Err(WorkflowError::cycle_detected(blocked.join(", ")));
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<'a>(ordered: &[&'a WorkflowStep]) -> Vec<&'a str> {
        ordered.iter().map(|s| s.id()).collect()
    }

    #[test]
    fn test_independent_steps_keep_declaration_order() {
        let steps = vec![
            WorkflowStep::new("a", "p"),
            WorkflowStep::new("b", "p"),
            WorkflowStep::new("c", "p"),
        ];

        assert_eq!(ids(&topological_order(&steps).unwrap()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dependencies_come_first() {
        let steps = vec![
            WorkflowStep::new("report", "p").depends_on("analyze"),
            WorkflowStep::new("analyze", "p").depends_on("fetch"),
            WorkflowStep::new("fetch", "p"),
        ];

        assert_eq!(
            ids(&topological_order(&steps).unwrap()),
            vec!["fetch", "analyze", "report"]
        );
    }

    #[test]
    fn test_diamond() {
        let steps = vec![
            WorkflowStep::new("join", "p").depends_on("left").depends_on("right"),
            WorkflowStep::new("left", "p").depends_on("root"),
            WorkflowStep::new("right", "p").depends_on("root"),
            WorkflowStep::new("root", "p"),
        ];

        assert_eq!(
            ids(&topological_order(&steps).unwrap()),
            vec!["root", "left", "right", "join"]
        );
    }

    #[test]
    fn test_two_step_cycle() {
        let steps = vec![
            WorkflowStep::new("a", "p").depends_on("b"),
            WorkflowStep::new("b", "p").depends_on("a"),
        ];

        assert_eq!(
            topological_order(&steps).unwrap_err(),
            WorkflowError::cycle_detected("a, b")
        );
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let steps = vec![
            WorkflowStep::new("ok", "p"),
            WorkflowStep::new("loop", "p").depends_on("loop"),
        ];

        assert!(matches!(
            topological_order(&steps),
            Err(WorkflowError::CycleDetected(_))
        ));
    }

    #[test]
    fn test_unknown_dependency() {
        let steps = vec![WorkflowStep::new("a", "p").depends_on("ghost")];

        assert!(matches!(
            topological_order(&steps),
            Err(WorkflowError::StepNotFound(_))
        ));
    }

    #[test]
    fn test_empty() {
        assert!(topological_order(&[]).unwrap().is_empty());
    }
}
