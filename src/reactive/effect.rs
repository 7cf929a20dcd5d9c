//! Effects layered on the signal runtime.
//!
//! Re-exports the effect API from [`super::signal`] and adds [`watch`], the
//! primitive hooks use to turn state writes into re-render requests:
//!
//! ```ignore
//! let (count, set_count) = create_signal(0);
//! let id = watch(move || { count.get(); }, move || queue.schedule(element));
//! set_count.set(1); // schedules `element`, does not run on creation
//! ```

use std::cell::Cell;

pub use super::signal::{batch, create_effect, dispose_effect, EffectId};

/// Create an effect that tracks whatever `track` reads and calls `on_change`
/// after each later change. Unlike [`create_effect`], nothing fires on
/// creation.
pub fn watch(track: impl Fn() + 'static, mut on_change: impl FnMut() + 'static) -> EffectId {
    let primed = Cell::new(false);
    create_effect(move || {
        track();
        if primed.replace(true) {
            on_change();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::signal::{create_signal, reset_runtime};
    use std::rc::Rc;

    fn setup() {
        reset_runtime();
    }

    #[test]
    fn watch_skips_initial_run() {
        setup();
        let (r, _w) = create_signal(0_i32);
        let hits = Rc::new(Cell::new(0));
        let hits_c = hits.clone();
        watch(
            move || {
                r.get();
            },
            move || hits_c.set(hits_c.get() + 1),
        );
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn watch_fires_per_write() {
        setup();
        let (r, w) = create_signal(0_i32);
        let hits = Rc::new(Cell::new(0));
        let hits_c = hits.clone();
        watch(
            move || {
                r.get();
            },
            move || hits_c.set(hits_c.get() + 1),
        );
        w.set(1);
        w.set(2);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn watch_coalesces_inside_batch() {
        setup();
        let (a, set_a) = create_signal(0_i32);
        let (b, set_b) = create_signal(0_i32);
        let hits = Rc::new(Cell::new(0));
        let hits_c = hits.clone();
        watch(
            move || {
                a.get();
                b.get();
            },
            move || hits_c.set(hits_c.get() + 1),
        );
        batch(|| {
            set_a.set(1);
            set_b.set(1);
        });
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn disposed_watch_is_silent() {
        setup();
        let (r, w) = create_signal(0_i32);
        let hits = Rc::new(Cell::new(0));
        let hits_c = hits.clone();
        let id = watch(
            move || {
                r.get();
            },
            move || hits_c.set(hits_c.get() + 1),
        );
        dispose_effect(id);
        w.set(1);
        assert_eq!(hits.get(), 0);
    }
}
