//! Scenario construction.
//!
//! One build runs a fixed sequence of phases against a fresh grid. Large,
//! order-sensitive structures (moat, treasure) go down first; the
//! single-tile clearance placements that eat the remaining space come last.

use tracing::debug;

use crate::error::{Error, PlacementQuery, Result};
use crate::grid::{self, BlockedSet, Coord, Grid};
use crate::prng::Pcg32;
use crate::scenario::Scenario;
use crate::types::{
    recipe, treasure, CellKind, GoalWeights, ScenarioParams, GOALS, PRIMITIVES, WORKSHOPS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Obstacles,
    Treasure,
    Ingredients,
    Distractors,
    Workshops,
    Agent,
    Decoration,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Obstacles => "obstacles",
            Phase::Treasure => "treasure",
            Phase::Ingredients => "ingredients",
            Phase::Distractors => "distractors",
            Phase::Workshops => "workshops",
            Phase::Agent => "agent",
            Phase::Decoration => "decoration",
        }
    }
}

/// One cell written during a build, in write order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub phase: Phase,
    pub at: Coord,
    pub kind: CellKind,
}

impl Placement {
    /// Whether the cell was chosen by the clearance query (as opposed to
    /// being structural terrain or the treasure itself).
    pub fn used_clearance(&self) -> bool {
        !matches!(self.phase, Phase::Obstacles | Phase::Treasure)
    }
}

/// Select index with probability proportional to weights.
/// Returns None if all weights are 0.
fn weighted_choice(rng: &mut Pcg32, weights: &[f64]) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let r = rng.next_float() * total;
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if r < cumulative {
            return Some(i);
        }
    }
    // Float round-off: fall back to the last index that carries weight.
    weights.iter().rposition(|&w| w > 0.0)
}

pub fn sample_goal(rng: &mut Pcg32, weights: &GoalWeights) -> Result<CellKind> {
    weights.validate()?;
    weighted_choice(rng, &weights.0)
        .map(|i| GOALS[i])
        .ok_or_else(|| Error::Config("goal weights have no mass".into()))
}

struct Builder {
    grid: Grid,
    blocked: BlockedSet,
    rng: Pcg32,
    log: Vec<Placement>,
}

impl Builder {
    fn new(seed: u64, size: usize) -> Self {
        Builder {
            grid: Grid::new(size),
            blocked: BlockedSet::new(),
            rng: Pcg32::for_scenario(seed),
            log: Vec::new(),
        }
    }

    fn write(&mut self, phase: Phase, at: Coord, kind: CellKind) {
        self.grid.set(at, kind);
        self.log.push(Placement { phase, at, kind });
    }

    /// Cross of water along the middle row and column, stopping two tiles
    /// short of the centre on each arm.
    fn carve_moat(&mut self) {
        let size = self.grid.size();
        let mid = size / 2;
        let arm = mid.saturating_sub(2);
        for i in 0..arm {
            for at in [(mid, i), (i, mid), (mid, size - i - 1), (size - i - 1, mid)] {
                self.blocked.insert(at);
                self.write(Phase::Obstacles, at, CellKind::Water);
            }
        }
    }

    fn place_treasure(&mut self, goal: CellKind) -> Result<()> {
        let Some(t) = treasure(goal) else {
            return Ok(());
        };
        let at = grid::find_interior_free(&self.grid, &mut self.rng).ok_or(
            Error::PlacementExhausted {
                phase: Phase::Treasure.name(),
                query: PlacementQuery::InteriorFree,
            },
        )?;
        self.write(Phase::Treasure, at, t.item);
        // Interior cells always have four in-bounds cardinal neighbours.
        let (r, c) = at;
        for wall in [(r - 1, c), (r + 1, c), (r, c - 1), (r, c + 1)] {
            self.write(Phase::Treasure, wall, t.guard);
        }
        Ok(())
    }

    fn clear_spot(&mut self, phase: Phase) -> Result<Coord> {
        grid::find_free_with_clearance(&self.grid, &self.blocked, &mut self.rng).ok_or(
            Error::PlacementExhausted {
                phase: phase.name(),
                query: PlacementQuery::FreeWithClearance,
            },
        )
    }

    fn place_with_clearance(&mut self, phase: Phase, kind: CellKind) -> Result<()> {
        let at = self.clear_spot(phase)?;
        self.write(phase, at, kind);
        Ok(())
    }

    fn place_distractor(&mut self) -> Result<()> {
        // Location is drawn before the kind.
        let at = self.clear_spot(Phase::Distractors)?;
        let kind = *self
            .rng
            .choose(&PRIMITIVES)
            .ok_or_else(|| Error::Config("no distractor kinds".into()))?;
        self.write(Phase::Distractors, at, kind);
        Ok(())
    }
}

/// Build one scenario and return the ordered list of cells written.
pub fn build_scenario_traced(
    seed: u64,
    params: &ScenarioParams,
    weights: &GoalWeights,
) -> Result<(Scenario, Vec<Placement>)> {
    params.validate()?;
    let mut b = Builder::new(seed, params.map_size);

    let goal = sample_goal(&mut b.rng, weights)?;
    let ingredients = recipe(goal)
        .ok_or_else(|| Error::Config(format!("{goal} has no recipe")))?;

    if params.hard {
        b.carve_moat();
    }

    b.place_treasure(goal)?;

    for &(ingredient, count) in ingredients {
        for _ in 0..count {
            b.place_with_clearance(Phase::Ingredients, ingredient)?;
        }
    }

    for _ in 0..params.num_primitive {
        b.place_distractor()?;
    }

    for workshop in WORKSHOPS {
        b.place_with_clearance(Phase::Workshops, workshop)?;
    }

    b.place_with_clearance(Phase::Agent, CellKind::Agent)?;

    for _ in 0..params.num_grass {
        b.place_with_clearance(Phase::Decoration, CellKind::Grass)?;
    }

    debug!(seed, goal = %goal, placements = b.log.len(), "built scenario");
    Ok((Scenario { goal, grid: b.grid }, b.log))
}

pub fn build_scenario(seed: u64, params: &ScenarioParams, weights: &GoalWeights) -> Result<Scenario> {
    build_scenario_traced(seed, params, weights).map(|(scenario, _)| scenario)
}

// -----------------------------------------------------------------
// Tests
// -----------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GoalDistributions;

    fn params(map_size: usize, hard: bool) -> ScenarioParams {
        ScenarioParams {
            map_size,
            hard,
            num_primitive: 0,
            num_grass: 0,
        }
    }

    fn only(goal: CellKind) -> GoalWeights {
        let mut w = [0.0; 3];
        w[GOALS.iter().position(|&g| g == goal).unwrap()] = 1.0;
        GoalWeights(w)
    }

    #[test]
    fn deterministic() {
        let w = GoalDistributions::default().train;
        let p = ScenarioParams { num_primitive: 2, num_grass: 2, ..params(12, false) };
        let a = build_scenario(123, &p, &w).unwrap().to_line();
        let b = build_scenario(123, &p, &w).unwrap().to_line();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds() {
        let w = GoalDistributions::default().train;
        let lines: std::collections::HashSet<String> = (0..10)
            .map(|s| build_scenario(s, &params(10, false), &w).unwrap().to_line())
            .collect();
        assert!(lines.len() > 1);
    }

    #[test]
    fn seed_zero_size_ten_example() {
        let w = GoalDistributions::default().train;
        let s = build_scenario(0, &params(10, false), &w).unwrap();
        let g = &s.grid;
        assert_eq!(g.size(), 10);
        assert_eq!(g.count(CellKind::Agent), 1);
        for ws in WORKSHOPS {
            assert_eq!(g.count(ws), 1);
        }
        for &(ingredient, count) in recipe(s.goal).unwrap() {
            assert!(g.count(ingredient) >= count as usize);
        }
        assert_eq!(g.count(CellKind::Gold), 0);
        if s.goal == CellKind::GemRing {
            assert_eq!(g.count(CellKind::Gem), 1);
            let gem = g.positions(CellKind::Gem)[0];
            for n in g.cardinal_neighbours(gem) {
                assert_eq!(g.get(n), CellKind::Stone);
            }
        } else {
            assert_eq!(g.count(CellKind::Gem), 0);
        }
    }

    #[test]
    fn seed_zero_golden() {
        let w = GoalDistributions::default().train;
        let s = build_scenario(0, &params(10, false), &w).unwrap();
        assert_eq!(s.goal, CellKind::GemRing);
        assert_eq!(s.grid.positions(CellKind::Gem), vec![(3, 7)]);
        assert_eq!(s.grid.positions(CellKind::Agent), vec![(1, 2)]);
        assert_eq!(s.grid.positions(CellKind::Workshop1), vec![(7, 0)]);
        assert_eq!(s.grid.positions(CellKind::Furnace), vec![(7, 9)]);
        assert_eq!(s.grid.positions(CellKind::Wood), vec![(4, 4), (7, 3)]);
    }

    #[test]
    fn gem_ring_builds_cave() {
        for seed in 0..20 {
            let s = build_scenario(seed, &params(10, false), &only(CellKind::GemRing)).unwrap();
            assert_eq!(s.goal, CellKind::GemRing);
            let gems = s.grid.positions(CellKind::Gem);
            assert_eq!(gems.len(), 1);
            let (r, c) = gems[0];
            assert!(r >= 1 && r <= 8 && c >= 1 && c <= 8);
            let walls = s.grid.cardinal_neighbours(gems[0]);
            assert_eq!(walls.len(), 4);
            assert!(walls.iter().all(|&w| s.grid.get(w) == CellKind::Stone));
        }
    }

    #[test]
    fn island_walls_treasure_in_water() {
        let mut b = Builder::new(5, 9);
        b.place_treasure(CellKind::GoldBar).unwrap();
        let gold = b.grid.positions(CellKind::Gold);
        assert_eq!(gold.len(), 1);
        for n in b.grid.cardinal_neighbours(gold[0]) {
            assert_eq!(b.grid.get(n), CellKind::Water);
        }
        assert_eq!(b.grid.count(CellKind::Water), 4);
        assert_eq!(b.log.len(), 5);
    }

    #[test]
    fn no_treasure_for_plain_goals() {
        let mut b = Builder::new(5, 9);
        b.place_treasure(CellKind::BronzePick).unwrap();
        assert!(b.log.is_empty());
    }

    #[test]
    fn moat_shape() {
        let mut b = Builder::new(0, 10);
        b.carve_moat();
        // mid = 5, arm = 3: columns/rows 0..3 and 7..10 along row/col 5.
        let water = b.grid.positions(CellKind::Water);
        assert_eq!(water.len(), 12);
        for at in &water {
            assert!(at.0 == 5 || at.1 == 5);
            assert!(b.blocked.contains(at));
        }
        for i in [0, 1, 2, 7, 8, 9] {
            assert_eq!(b.grid.get((5, i)), CellKind::Water);
            assert_eq!(b.grid.get((i, 5)), CellKind::Water);
        }
        for i in 3..7 {
            assert_eq!(b.grid.get((5, i)), CellKind::Empty);
        }
    }

    #[test]
    fn moat_empty_on_small_grids() {
        let mut b = Builder::new(0, 4);
        b.carve_moat();
        assert!(b.log.is_empty());
    }

    #[test]
    fn hard_mode_keeps_moat() {
        let w = GoalDistributions::default().train_hard;
        let s = build_scenario(3, &params(12, true), &w).unwrap();
        let mid = 6;
        for i in 0..4 {
            assert_eq!(s.grid.get((mid, i)), CellKind::Water);
            assert_eq!(s.grid.get((mid, 11 - i)), CellKind::Water);
        }
        assert_ne!(s.goal, CellKind::GemRing);
    }

    #[test]
    fn clearance_holds_at_placement_time() {
        let w = GoalDistributions::default().train;
        let p = ScenarioParams { num_primitive: 2, num_grass: 3, ..params(14, true) };
        for seed in 0..10 {
            let (scenario, log) = build_scenario_traced(seed, &p, &w).unwrap();
            let mut replay = Grid::new(p.map_size);
            for placement in &log {
                if placement.used_clearance() {
                    assert!(replay.is_empty_at(placement.at));
                    assert!(grid::has_clearance(&replay, placement.at));
                }
                replay.set(placement.at, placement.kind);
            }
            assert_eq!(replay, scenario.grid);
        }
    }

    #[test]
    fn occupied_cells_match_placements() {
        let w = GoalDistributions::default().train;
        let p = ScenarioParams { num_primitive: 1, num_grass: 1, ..params(12, false) };
        for seed in 0..10 {
            let (scenario, log) = build_scenario_traced(seed, &p, &w).unwrap();
            let occupied = scenario
                .grid
                .cells()
                .iter()
                .filter(|&&k| k != CellKind::Empty)
                .count();
            let mut distinct: Vec<Coord> = log.iter().map(|p| p.at).collect();
            distinct.sort();
            distinct.dedup();
            assert_eq!(occupied, distinct.len());
        }
    }

    #[test]
    fn distractors_and_grass_are_added() {
        let w = only(CellKind::BronzePick);
        let p = ScenarioParams { num_primitive: 3, num_grass: 2, ..params(14, false) };
        let (scenario, log) = build_scenario_traced(1, &p, &w).unwrap();
        let distractors: Vec<_> = log.iter().filter(|p| p.phase == Phase::Distractors).collect();
        assert_eq!(distractors.len(), 3);
        assert!(distractors.iter().all(|p| PRIMITIVES.contains(&p.kind)));
        let grass = log.iter().filter(|p| p.phase == Phase::Decoration).count();
        assert_eq!(grass, 2);
        assert!(scenario.grid.count(CellKind::Grass) >= 2);
    }

    #[test]
    fn tiny_hard_grid_exhausts() {
        let w = only(CellKind::IronPick);
        let err = build_scenario(0, &params(3, true), &w).unwrap_err();
        assert!(err.is_placement_exhausted(), "unexpected error: {err}");
    }

    #[test]
    fn tiny_grid_exhausts_for_every_goal() {
        for goal in GOALS {
            for seed in 0..5 {
                let err = build_scenario(seed, &params(3, true), &only(goal)).unwrap_err();
                assert!(err.is_placement_exhausted());
            }
        }
    }

    #[test]
    fn rejects_bad_config() {
        let err = build_scenario(0, &params(2, false), &only(CellKind::IronPick)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = build_scenario(0, &params(10, false), &GoalWeights([0.0; 3])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn weighted_choice_skips_zero_weights() {
        let mut rng = Pcg32::for_scenario(42);
        for _ in 0..200 {
            assert_eq!(weighted_choice(&mut rng, &[0.0, 0.0, 1.0]), Some(2));
            assert_ne!(weighted_choice(&mut rng, &[0.3, 0.7, 0.0]), Some(2));
        }
        assert_eq!(weighted_choice(&mut rng, &[0.0, 0.0]), None);
    }
}
