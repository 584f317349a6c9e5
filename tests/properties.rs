mod support;

use proptest::prelude::*;
use stratos::State;
use support::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A task with period P driven through N cycles of P ticks plus one loop
    /// pass runs exactly N times.
    #[test]
    fn invocation_count_matches_cycles(period in 1u64..200, cycles in 1u32..40) {
        let (task, count) = counting("periodic", period);
        let (sched, timer) = booted::<2>(&[task]);

        for _ in 0..cycles {
            timer.advance(period);
            sched.run_for(1);
        }

        prop_assert_eq!(load(count), cycles);
        prop_assert_eq!(sched.overrun_count(), 0);
        prop_assert_eq!(sched.state(), Ok(State::Idle));
    }

    /// Whatever the task mix, at most one task is ever marked scheduled and
    /// the current selection is always that task.
    #[test]
    fn single_active_task(periods in prop::collection::vec(1u64..20, 1..8), steps in 1usize..200) {
        let defs: Vec<_> = periods
            .iter()
            .map(|period| counting("t", *period).0)
            .collect();
        let (sched, timer) = booted::<8>(&defs);

        for step in 0..steps {
            timer.advance(1);
            if step % 3 != 0 {
                sched.run_for(1);
            }

            let mut scheduled = Vec::new();
            sched.for_each_task(|t| {
                if t.scheduled {
                    scheduled.push(t.id);
                }
            });
            prop_assert!(scheduled.len() <= 1);
            prop_assert_eq!(scheduled.first().copied(), sched.current());
        }
    }

    /// A killed task is never invoked again, however long the clock runs.
    #[test]
    fn kill_is_permanent(kill_after in 0u64..50, period in 1u64..10, more in 1u64..300) {
        let (victim, victim_count) = counting("victim", period);
        let (sched, timer) = booted::<2>(&[victim]);

        for _ in 0..kill_after {
            timer.advance(1);
            sched.run_for(1);
        }
        let id = sched.task_by_name("victim").unwrap().id;
        sched.kill_task(id).unwrap();
        let frozen = load(victim_count);

        for _ in 0..more {
            timer.advance(1);
            sched.run_for(1);
        }
        prop_assert_eq!(load(victim_count), frozen);
        prop_assert!(!sched.task(id).unwrap().alive);
    }

    /// Once a task has waited out its period it is selected on the next tick,
    /// provided nothing earlier in the registry is ready too.
    #[test]
    fn ready_task_selected_on_next_tick(period in 1u64..100) {
        let (first, _) = counting("first", 10_000);
        let (second, _) = counting("second", period);
        let (sched, timer) = booted::<2>(&[first, second]);

        // boot runs `first`; from then on only `second` can become ready
        timer.advance(1);
        sched.run_for(1);

        let second_id = sched.task_by_name("second").unwrap().id;
        let due = if period <= 2 { 1 } else { period - 1 };
        for _ in 1..due {
            timer.advance(1);
            sched.run_for(1);
            prop_assert_eq!(sched.task(second_id).unwrap().runs, 0);
        }
        timer.advance(1);
        prop_assert_eq!(sched.current(), Some(second_id));
    }
}
