//! Property tests for fixed-timestep accounting and scheduler ordering.

use std::cell::RefCell;
use std::rc::Rc;

use kestrel_engine::prelude::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Frame times in eighths of a second keep the arithmetic exact, so the
    /// tick count must equal the whole number of quarter-second steps.
    #[test]
    fn advance_runs_every_whole_tick(frames in prop::collection::vec(0u32..40, 1..50)) {
        let config = TickConfig { fixed_dt: 0.25, max_steps_per_frame: u32::MAX };
        let mut tick_loop = TickLoop::new(World::new(), config).unwrap();

        let mut total = 0.0;
        for eighths in frames {
            let frame = f64::from(eighths) * 0.125;
            total += frame;
            tick_loop.advance(frame).unwrap();
        }

        prop_assert_eq!(tick_loop.tick_count(), (total / 0.25).floor() as u64);
        prop_assert!((0.0..1.0).contains(&tick_loop.alpha()));
        prop_assert_eq!(tick_loop.sim_time(), tick_loop.tick_count() as f64 * 0.25);
    }

    #[test]
    fn capped_advance_never_exceeds_max_steps(
        frames in prop::collection::vec(0u32..100, 1..30),
        max_steps in 1u32..6,
    ) {
        let config = TickConfig { fixed_dt: 0.25, max_steps_per_frame: max_steps };
        let mut tick_loop = TickLoop::new(World::new(), config).unwrap();

        for eighths in frames {
            let steps = tick_loop.advance(f64::from(eighths) * 0.125).unwrap();
            prop_assert!(steps <= max_steps);
            prop_assert!(tick_loop.alpha() < 1.0);
        }
    }

    /// Systems run sorted by priority, ties broken by insertion order.
    #[test]
    fn scheduler_order_is_stable_sort_by_priority(priorities in prop::collection::vec(-5i32..5, 1..20)) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        for (i, priority) in priorities.iter().copied().enumerate() {
            let log = log.clone();
            scheduler
                .add(FnSystem::new(format!("s{i}"), priority, move |_w, _dt| {
                    log.borrow_mut().push(i);
                    Ok(())
                }))
                .unwrap();
        }

        scheduler.update(&mut World::new(), 1.0).unwrap();

        let mut expected: Vec<usize> = (0..priorities.len()).collect();
        expected.sort_by_key(|&i| priorities[i]);
        prop_assert_eq!(&*log.borrow(), &expected);
    }
}
