//! Reinforcement component: parameter updates and action-set subsumption

use xcsr_core::{ClassifierId, XcsConfig};

use crate::population::{ActionSet, Population};

/// Update prediction, error, action-set size and fitness of every live member
/// of `set` toward `payoff`, then run action-set subsumption when enabled.
///
/// The size estimate moves by the mean gap between each member's numerosity
/// and the estimate.
///
/// Early updates use the running average `1/exp`; once experience reaches
/// `1/beta` the fixed rate `beta` takes over.
pub fn update_set(population: &mut Population, set: &mut ActionSet, payoff: f64, config: &XcsConfig) {
    set.retain_live(population);
    if set.is_empty() {
        return;
    }
    let numerosities: Vec<f64> = population
        .members(set.ids())
        .map(|cl| f64::from(cl.numerosity))
        .collect();
    let members = numerosities.len() as f64;

    for &id in set.ids() {
        let Some(cl) = population.get_mut(id) else { continue };
        cl.experience += 1;
        let exp = cl.experience as f64;
        let rate = if exp < 1.0 / config.beta { 1.0 / exp } else { config.beta };

        cl.prediction += (payoff - cl.prediction) * rate;
        cl.error += ((payoff - cl.prediction).abs() - cl.error) * rate;
        let gap = numerosities.iter().map(|n| n - cl.action_set_size).sum::<f64>() / members;
        cl.action_set_size += gap * rate;
    }

    update_fitness(population, set, config);

    if config.do_action_set_subsumption {
        action_set_subsumption(population, set, config);
    }
}

/// Accuracy-based fitness sharing inside an action set
pub fn update_fitness(population: &mut Population, set: &ActionSet, config: &XcsConfig) {
    let accuracies: Vec<(ClassifierId, f64)> = population
        .members(set.ids())
        .map(|cl| (cl.id, cl.accuracy(config) * f64::from(cl.numerosity)))
        .collect();
    let total: f64 = accuracies.iter().map(|(_, k)| k).sum();
    if !(total > 0.0 && total.is_finite()) {
        tracing::warn!(total, "skipping fitness update, accuracy sum unusable");
        return;
    }

    for (id, k) in accuracies {
        if let Some(cl) = population.get_mut(id) {
            cl.fitness += config.beta * (k / total - cl.fitness);
            cl.fitness = cl.fitness.max(0.0);
        }
    }
}

/// Fold every strictly less general member of `set` into its most general
/// subsumption-capable member.
///
/// The subsumer is the capable member with the most wildcards, then the
/// widest total interval width, then the earliest position in the set.
/// Returns the number of macro-classifiers absorbed.
pub fn action_set_subsumption(population: &mut Population, set: &mut ActionSet, config: &XcsConfig) -> usize {
    let mut best: Option<(ClassifierId, usize, f64)> = None;
    for cl in population.members(set.ids()) {
        if !cl.could_subsume(config) {
            continue;
        }
        let wildcards = cl.predicate.wildcards();
        let width = cl.predicate.interval_width();
        let better = match best {
            None => true,
            Some((_, w, iw)) => wildcards > w || (wildcards == w && width > iw),
        };
        if better {
            best = Some((cl.id, wildcards, width));
        }
    }
    let Some((subsumer_id, _, _)) = best else { return 0 };
    let Some(subsumer) = population.get(subsumer_id).cloned() else { return 0 };

    let absorbed: Vec<ClassifierId> = population
        .members(set.ids())
        .filter(|cl| cl.id != subsumer_id && subsumer.is_more_general(cl) && !cl.is_more_general(&subsumer))
        .map(|cl| cl.id)
        .collect();

    for &id in &absorbed {
        if let Some(cl) = population.remove(id) {
            population.increment_numerosity(subsumer_id, cl.numerosity);
            tracing::debug!(subsumer = %subsumer_id, absorbed = %id, "action-set subsumption");
        }
    }
    set.0.retain(|id| !absorbed.contains(id));
    absorbed.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::Arc;
    use xcsr_core::{Action, Classifier, Condition, Interval, Predicate};

    fn setup(config: &XcsConfig, rules: Vec<(Predicate, usize)>) -> (Population, ActionSet) {
        let mut pop = Population::new(Arc::new(config.clone()));
        let mut ids = Vec::new();
        for (predicate, action) in rules {
            let id = pop.next_id();
            let cl = Classifier::new(id, predicate, Action(action), 0, config);
            ids.push(pop.insert(cl));
        }
        (pop, ActionSet(ids))
    }

    fn range(lo: f64, hi: f64) -> Predicate {
        Predicate(vec![Condition::Range(Interval::new(lo, hi))])
    }

    #[test]
    fn test_first_update_jumps_to_payoff() {
        let config = XcsConfig::default();
        let (mut pop, mut set) = setup(&config, vec![(Predicate::general(1), 0)]);
        update_set(&mut pop, &mut set, 1000.0, &config);

        let cl = pop.get(set.ids()[0]).unwrap();
        assert_eq!(cl.experience, 1);
        assert_relative_eq!(cl.prediction, 1000.0);
        assert_relative_eq!(cl.error, 0.0);
        assert_relative_eq!(cl.action_set_size, 1.0);
    }

    #[test]
    fn test_set_size_estimate_follows_mean_numerosity() {
        let config = XcsConfig::default();
        let (mut pop, mut set) = setup(&config, vec![(range(0.0, 0.5), 0), (range(0.0, 0.6), 0)]);
        pop.increment_numerosity(set.ids()[1], 2);
        update_set(&mut pop, &mut set, 1.0, &config);

        // Gaps are 1 - 1 and 3 - 1 for both fresh rules
        for cl in pop.members(set.ids()) {
            assert_eq!(cl.experience, 1);
            assert_relative_eq!(cl.action_set_size, 2.0);
        }

        // Saturated rules move by beta times the mean gap
        for &id in set.ids() {
            let cl = pop.get_mut(id).unwrap();
            cl.experience = 100;
            cl.action_set_size = 4.0;
        }
        update_set(&mut pop, &mut set, 1.0, &config);
        let expected = 4.0 + config.beta * ((1.0 - 4.0) + (3.0 - 4.0)) / 2.0;
        for cl in pop.members(set.ids()) {
            assert_relative_eq!(cl.action_set_size, expected);
        }
    }

    #[test]
    fn test_rate_switches_to_beta() {
        let config = XcsConfig::default();
        let (mut pop, mut set) = setup(&config, vec![(Predicate::general(1), 0)]);
        for _ in 0..5 {
            update_set(&mut pop, &mut set, 0.0, &config);
        }
        let before = pop.get(set.ids()[0]).unwrap().prediction;
        update_set(&mut pop, &mut set, 100.0, &config);
        let after = pop.get(set.ids()[0]).unwrap().prediction;
        assert_relative_eq!(after, before + config.beta * (100.0 - before));
    }

    #[test]
    fn test_fitness_shares_by_accuracy() {
        let config = XcsConfig::default();
        let (mut pop, set) = setup(&config, vec![(range(0.0, 0.5), 0), (range(0.0, 0.6), 0)]);
        pop.get_mut(set.ids()[0]).unwrap().error = 0.0;
        pop.get_mut(set.ids()[1]).unwrap().error = 10.0;
        update_fitness(&mut pop, &set, &config);

        let accurate = pop.get(set.ids()[0]).unwrap().fitness;
        let inaccurate = pop.get(set.ids()[1]).unwrap().fitness;
        assert!(accurate > inaccurate);
        assert!(inaccurate >= 0.0);
    }

    #[test]
    fn test_fitness_update_skipped_on_zero_accuracy() {
        let config = XcsConfig { alpha: 0.0, ..XcsConfig::default() };
        let (mut pop, set) = setup(&config, vec![(Predicate::general(1), 0)]);
        pop.get_mut(set.ids()[0]).unwrap().error = 50.0;
        update_fitness(&mut pop, &set, &config);
        assert_relative_eq!(pop.get(set.ids()[0]).unwrap().fitness, config.f_1);
    }

    #[test]
    fn test_update_ignores_deleted_members() {
        let config = XcsConfig::default();
        let (mut pop, mut set) = setup(&config, vec![(range(0.0, 0.5), 0), (range(0.0, 0.6), 0)]);
        let kept = set.ids()[0];
        pop.remove(set.ids()[1]);
        update_set(&mut pop, &mut set, 10.0, &config);
        assert_eq!(set.ids(), &[kept]);
        assert_relative_eq!(pop.get(kept).unwrap().prediction, 10.0);
    }

    #[test]
    fn test_action_set_subsumption_absorbs_specific_rules() {
        let config = XcsConfig::default();
        let (mut pop, mut set) = setup(
            &config,
            vec![
                (range(0.2, 0.4), 0),
                (Predicate::general(1), 0),
                (range(0.0, 0.9), 0),
            ],
        );
        let general = set.ids()[1];
        let wide = set.ids()[2];
        for &id in set.ids() {
            let cl = pop.get_mut(id).unwrap();
            cl.experience = config.theta_sub + 1;
            cl.error = 0.0;
        }

        let absorbed = action_set_subsumption(&mut pop, &mut set, &config);
        assert_eq!(absorbed, 2);
        assert_eq!(set.ids(), &[general]);
        assert!(!pop.contains(wide));
        assert_eq!(pop.get(general).unwrap().numerosity, 3);
        assert_eq!(pop.micro_count(), 3);
    }

    #[test]
    fn test_action_set_subsumption_needs_capable_member() {
        let config = XcsConfig::default();
        let (mut pop, mut set) = setup(&config, vec![(Predicate::general(1), 0), (range(0.2, 0.4), 0)]);
        assert_eq!(action_set_subsumption(&mut pop, &mut set, &config), 0);
        assert_eq!(pop.len(), 2);
    }
}
