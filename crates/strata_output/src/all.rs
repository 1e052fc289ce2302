//! Joining several outputs into one.
//!
//! [`All`] is implemented for tuples of up to eight outputs of any types and
//! yields a single output of the tuple of their values. [`all_vec`] joins any
//! number of outputs of the same type.
//!
//! Settlement rules:
//!
//! 1. If any input failed, the result fails with the error of the first
//!    failed input in declared order, no matter which input settled last.
//! 2. Otherwise, if any input is unknown, the result is unknown.
//! 3. Otherwise the result is known and holds every value in input order.

use tokio_util::sync::CancellationToken;
use variadics_please::all_tuples;

use crate::id::Dependencies;
use crate::output::{Output, OutputState, OutputValue};

/// A group of outputs that can be joined into a single output.
pub trait All {
    /// The joined value type.
    type Joined: OutputValue;

    /// Joins the outputs, settling once every input has settled.
    fn all(self) -> Output<Self::Joined>;
}

/// Joins a tuple of outputs.
///
/// # Example
///
/// ```
/// use strata_output::{Output, OutputState, all};
///
/// # futures::executor::block_on(async {
/// let host = Output::known("db.internal".to_string());
/// let port = Output::known(5432_u16);
///
/// let addr = all((host, port)).apply(|(host, port)| format!("{host}:{port}"));
/// assert!(matches!(addr.state().await, OutputState::Known(a) if a == "db.internal:5432"));
/// # });
/// ```
pub fn all<A: All>(outputs: A) -> Output<A::Joined> {
    outputs.all()
}

/// Joins a list of outputs of the same type.
///
/// An empty list resolves to a known empty vector.
pub fn all_vec<T: OutputValue>(outputs: Vec<Output<T>>) -> Output<Vec<T>> {
    let deps = outputs
        .iter()
        .fold(Dependencies::new(), |acc, o| acc.union(o.dependencies()));
    let cancel = outputs.iter().find_map(|o| o.cancellation().cloned());
    let states: Vec<_> = outputs.into_iter().map(|o| o.state).collect();

    let future = async move {
        let settled = futures::future::join_all(states).await;
        let mut values = Vec::with_capacity(settled.len());
        let mut unknown = false;
        for state in settled {
            match state {
                OutputState::Known(value) => values.push(value),
                OutputState::Unknown => unknown = true,
                OutputState::Failed(err) => return OutputState::Failed(err),
            }
        }
        if unknown {
            OutputState::Unknown
        } else {
            OutputState::Known(values)
        }
    };

    Output::from_parts(future, deps, cancel)
}

macro_rules! impl_all_tuple {
    ($(($T:ident, $o:ident)),*) => {
        impl<$($T: OutputValue),*> All for ($(Output<$T>,)*) {
            type Joined = ($($T,)*);

            fn all(self) -> Output<Self::Joined> {
                let ($($o,)*) = self;
                let deps = Dependencies::new()$(.union($o.dependencies()))*;
                let cancel: Option<CancellationToken> =
                    None$(.or_else(|| $o.cancellation().cloned()))*;
                $(let $o = $o.state;)*

                let future = async move {
                    let ($($o,)*) = futures::join!($($o),*);
                    let mut unknown = false;
                    // Inspect in declared order so the first failure wins.
                    $(
                        let $o = match $o {
                            OutputState::Known(value) => Some(value),
                            OutputState::Unknown => {
                                unknown = true;
                                None
                            }
                            OutputState::Failed(err) => return OutputState::Failed(err),
                        };
                    )*
                    if unknown {
                        return OutputState::Unknown;
                    }
                    match ($($o,)*) {
                        ($(Some($o),)*) => OutputState::Known(($($o,)*)),
                        _ => OutputState::Unknown,
                    }
                };

                Output::from_parts(future, deps, cancel)
            }
        }
    };
}

// Generate impls for tuples of size 1 to 8
all_tuples!(impl_all_tuple, 1, 8, T, o);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OutputError;
    use futures::executor::block_on;

    #[test]
    fn joins_heterogeneous_values_in_order() {
        let joined = all((
            Output::known(1_u8),
            Output::known("two".to_string()),
            Output::known(3.0_f64),
        ));
        let OutputState::Known((a, b, c)) = block_on(joined.state()) else {
            panic!("expected known");
        };
        assert_eq!((a, b.as_str(), c), (1, "two", 3.0));
    }

    #[test]
    fn failure_dominates_unknown() {
        let joined = all((
            Output::<i32>::unknown(),
            Output::<i32>::failed(OutputError::msg("late failure")),
        ));
        let state = block_on(joined.state());
        assert_eq!(
            state.error().map(ToString::to_string).as_deref(),
            Some("late failure")
        );
    }

    #[test]
    fn empty_vec_is_known_and_empty() {
        let joined = all_vec::<i32>(Vec::new());
        assert!(matches!(block_on(joined.state()), OutputState::Known(v) if v.is_empty()));
    }
}
