//! Structural checks on finished scenarios.
//!
//! Used by the `check` subcommand to audit dataset files and by tests to
//! assert generator invariants on built maps.

use std::fmt;

use crate::grid::Coord;
use crate::scenario::Scenario;
use crate::types::{recipe, treasure, CellKind, WORKSHOPS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    AgentCount(usize),
    WorkshopCount { kind: CellKind, count: usize },
    UnknownGoal(CellKind),
    MissingIngredient { kind: CellKind, required: u32, found: usize },
    TreasureCount { kind: CellKind, count: usize },
    UnguardedTreasure { at: Coord, guard: CellKind },
    StrayTreasure(CellKind),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::AgentCount(n) => write!(f, "expected exactly one agent, found {n}"),
            Violation::WorkshopCount { kind, count } => {
                write!(f, "expected exactly one {kind}, found {count}")
            }
            Violation::UnknownGoal(goal) => write!(f, "goal {goal} has no recipe"),
            Violation::MissingIngredient { kind, required, found } => {
                write!(f, "recipe needs {required} {kind}, map has {found}")
            }
            Violation::TreasureCount { kind, count } => {
                write!(f, "expected exactly one {kind}, found {count}")
            }
            Violation::UnguardedTreasure { at, guard } => write!(
                f,
                "treasure at {at:?} is not walled in by {guard} on all four sides"
            ),
            Violation::StrayTreasure(kind) => {
                write!(f, "{kind} present although the goal needs no treasure")
            }
        }
    }
}

/// Everything wrong with `scenario`. Empty when it is well formed.
pub fn check_scenario(scenario: &Scenario) -> Vec<Violation> {
    let grid = &scenario.grid;
    let mut out = Vec::new();

    let agents = grid.count(CellKind::Agent);
    if agents != 1 {
        out.push(Violation::AgentCount(agents));
    }

    for kind in WORKSHOPS {
        let count = grid.count(kind);
        if count != 1 {
            out.push(Violation::WorkshopCount { kind, count });
        }
    }

    match recipe(scenario.goal) {
        Some(ingredients) => {
            for &(kind, required) in ingredients {
                let found = grid.count(kind);
                if found < required as usize {
                    out.push(Violation::MissingIngredient { kind, required, found });
                }
            }
        }
        None => out.push(Violation::UnknownGoal(scenario.goal)),
    }

    match treasure(scenario.goal) {
        Some(t) => {
            let spots = grid.positions(t.item);
            if spots.len() != 1 {
                out.push(Violation::TreasureCount { kind: t.item, count: spots.len() });
            }
            for at in spots {
                let walls = grid.cardinal_neighbours(at);
                if walls.len() != 4 || walls.iter().any(|&w| grid.get(w) != t.guard) {
                    out.push(Violation::UnguardedTreasure { at, guard: t.guard });
                }
            }
        }
        None => {
            for kind in [CellKind::Gold, CellKind::Gem] {
                if grid.count(kind) > 0 {
                    out.push(Violation::StrayTreasure(kind));
                }
            }
        }
    }

    out
}
