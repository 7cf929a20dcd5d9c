//! Reactive state: signals and effects.
//!
//! Leptos-style fine-grained reactivity backing every hook's state slot.
//!
//! - [`create_signal`]: create a read/write signal pair.
//! - [`create_effect`]: auto-tracking side effect.
//! - [`watch`]: change-only effect used for re-render scheduling.
//! - [`batch`]: coalesce multiple writes into one notification pass.

pub mod effect;
pub mod signal;

pub use effect::{batch, create_effect, dispose_effect, watch, EffectId};
pub use signal::{
    create_signal, dispose_signal, runtime_stats, signal_exists, ReadSignal, SignalId,
    WriteSignal,
};
