//! Steady-state niche genetic algorithm over action sets

use rand::Rng;

use xcsr_core::{
    ActionSpace, Classifier, ClassifierId, Condition, Interval, Situation, SituationSpace, XcsConfig,
};

use crate::population::{ActionSet, Population};
use crate::utils::{roulette, weighted_mean};

/// Everything the GA needs to know about the step that triggered it
pub struct GaContext<'a> {
    /// Situation the action set matched
    pub situation: &'a Situation,
    /// Bounds used to clip mutated intervals
    pub space: &'a SituationSpace,
    /// Legal actions for action mutation
    pub actions: ActionSpace,
    /// Current time step
    pub time: u64,
}

/// Whether the numerosity-weighted mean time since the last GA in `set`
/// exceeds `theta_ga`
#[must_use]
pub fn should_run(population: &Population, set: &ActionSet, time: u64) -> bool {
    let mean_last = weighted_mean(
        population
            .members(set.ids())
            .map(|cl| (cl.last_ga_time as f64, f64::from(cl.numerosity))),
    );
    match mean_last {
        Some(mean) => time as f64 - mean > population.config().theta_ga,
        None => false,
    }
}

/// Run one GA invocation on `set` if it is due. Returns whether it ran.
pub fn run<R: Rng + ?Sized>(
    population: &mut Population,
    set: &mut ActionSet,
    ctx: &GaContext<'_>,
    rng: &mut R,
) -> bool {
    set.retain_live(population);
    if !should_run(population, set, ctx.time) {
        return false;
    }
    for &id in set.ids() {
        if let Some(cl) = population.get_mut(id) {
            cl.last_ga_time = ctx.time;
        }
    }

    let (Some(p1), Some(p2)) = (select_parent(population, set, rng), select_parent(population, set, rng))
    else {
        return false;
    };
    let (Some(parent1), Some(parent2)) = (population.get(p1).cloned(), population.get(p2).cloned()) else {
        return false;
    };
    let config = population.config().clone();

    let mut child1 = offspring(&parent1, population.next_id());
    let mut child2 = offspring(&parent2, population.next_id());

    if rng.gen::<f64>() < config.chi {
        crossover(&mut child1, &mut child2, rng);
        let prediction = (parent1.prediction + parent2.prediction) / 2.0;
        let error = (parent1.error + parent2.error) / 2.0;
        let fitness = (parent1.fitness + parent2.fitness) / 2.0;
        for child in [&mut child1, &mut child2] {
            child.prediction = prediction;
            child.error = error;
            child.fitness = fitness;
        }
    }

    for mut child in [child1, child2] {
        child.fitness *= config.fitness_reduction;
        mutate(&mut child, ctx, &config, rng);

        let subsumer = if config.do_ga_subsumption {
            [&parent1, &parent2]
                .into_iter()
                .find(|parent| population.contains(parent.id) && parent.does_subsume(&child, &config))
                .map(|parent| parent.id)
        } else {
            None
        };
        match subsumer {
            Some(id) => {
                population.increment_numerosity(id, 1);
                tracing::trace!(parent = %id, "offspring subsumed");
            }
            None => {
                tracing::trace!(classifier = %child, "offspring inserted");
                population.insert(child);
            }
        }
        population.delete_one(rng);
    }
    true
}

/// Fitness-proportionate choice of a parent from `set`
pub fn select_parent<R: Rng + ?Sized>(
    population: &Population,
    set: &ActionSet,
    rng: &mut R,
) -> Option<ClassifierId> {
    let members: Vec<&Classifier> = population.members(set.ids()).collect();
    let fitness: Vec<f64> = members.iter().map(|cl| cl.fitness).collect();
    roulette(&fitness, rng).map(|i| members[i].id)
}

fn offspring(parent: &Classifier, id: ClassifierId) -> Classifier {
    Classifier {
        id,
        numerosity: 1,
        experience: 0,
        ..parent.clone()
    }
}

/// Two-point crossover with random cut points
pub fn crossover<R: Rng + ?Sized>(a: &mut Classifier, b: &mut Classifier, rng: &mut R) {
    let len = a.predicate.len().min(b.predicate.len());
    let x = rng.gen_range(0..=len);
    let y = rng.gen_range(0..=len);
    crossover_at(a, b, x.min(y), x.max(y));
}

/// Swap the conditions in `[from, to)` between two classifiers
pub fn crossover_at(a: &mut Classifier, b: &mut Classifier, from: usize, to: usize) {
    a.predicate.swap_segment(&mut b.predicate, from, to);
}

/// Per-allele mutation: each condition toggles, with probability `mu`,
/// between the wildcard and an interval anchored on the current situation.
/// The action changes to a different legal one with probability `mu`.
pub fn mutate<R: Rng + ?Sized>(
    child: &mut Classifier,
    ctx: &GaContext<'_>,
    config: &XcsConfig,
    rng: &mut R,
) {
    for (i, condition) in child.predicate.conditions_mut().iter_mut().enumerate() {
        if rng.gen::<f64>() >= config.mu {
            continue;
        }
        *condition = match condition {
            Condition::Wildcard => Condition::Range(Interval::around(
                ctx.situation[i],
                config.mutation_half_width,
                ctx.space.bounds(i),
                rng,
            )),
            Condition::Range(_) => Condition::Wildcard,
        };
    }
    if rng.gen::<f64>() < config.mu {
        child.action = ctx.actions.sample_other(child.action, rng);
    }
}
