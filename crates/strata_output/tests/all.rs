//! Tests for joining outputs with `all` and `all_vec`.


use proptest::prelude::*;
use strata_output::{Dependencies, Output, OutputError, OutputState, Urn, all, all_vec};
use test_utils::{deferred, error_message, failing};

// ═══════════════════════════════════════════════════════════════════════════════
// SETTLEMENT ORDER
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that the first failed input in declared order wins, even when it settles last.
#[tokio::test]
async fn first_declared_failure_wins_regardless_of_timing() {
    let (first_tx, first) = deferred::<i32>();
    let (second_tx, second) = deferred::<String>();
    let joined = all((first, second));

    let waiter = tokio::spawn({
        let joined = joined.clone();
        async move { joined.state().await }
    });

    second_tx
        .send(OutputState::Failed(OutputError::msg("second")))
        .unwrap();
    tokio::task::yield_now().await;
    first_tx
        .send(OutputState::Failed(OutputError::msg("first")))
        .unwrap();

    let state = waiter.await.unwrap();
    assert_eq!(error_message(&state), "first");
}

/// Verifies that the joined output waits for every input to settle.
#[tokio::test]
async fn waits_for_every_input() {
    let (tx, pending) = deferred::<u16>();
    let joined = all((Output::known("host".to_string()), pending));

    let waiter = tokio::spawn({
        let joined = joined.clone();
        async move { joined.state().await }
    });
    tokio::task::yield_now().await;
    assert!(!waiter.is_finished());

    tx.send(OutputState::Known(80)).unwrap();
    let OutputState::Known((host, port)) = waiter.await.unwrap() else {
        panic!("expected known");
    };
    assert_eq!((host.as_str(), port), ("host", 80));
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATE COMBINATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that any unknown input makes the joined output unknown.
#[tokio::test]
async fn unknown_input_makes_result_unknown() {
    let joined = all((Output::known(1), Output::<bool>::unknown(), Output::known(3.5)));
    assert!(joined.state().await.is_unknown());
}

/// Verifies that a failure takes precedence over an unknown declared before it.
#[tokio::test]
async fn failure_takes_precedence_over_unknown() {
    let joined = all((Output::<i32>::unknown(), failing::<i32>("broken")));
    assert_eq!(error_message(&joined.state().await), "broken");
}

/// Verifies that the widest supported tuple joins all of its values.
#[tokio::test]
async fn joins_eight_outputs() {
    let joined = all((
        Output::known(1_u8),
        Output::known(2_u16),
        Output::known(3_u32),
        Output::known(4_u64),
        Output::known(5_i8),
        Output::known(6_i16),
        Output::known(7_i32),
        Output::known(8_i64),
    ));
    let OutputState::Known((a, b, c, d, e, f, g, h)) = joined.state().await else {
        panic!("expected known");
    };
    assert_eq!(
        (a, b, c, d, e, f, g, h),
        (1, 2, 3, 4, 5, 6, 7, 8)
    );
}

/// Verifies that the joined output depends on the union of its inputs' resources.
#[tokio::test]
async fn dependencies_are_unioned() {
    let bucket = Urn::from_string("urn:strata:dev::app::pkg:mod:Bucket::a");
    let queue = Urn::from_string("urn:strata:dev::app::pkg:mod:Queue::b");

    let joined = all((
        Output::known(1).with_dependencies(&Dependencies::single(bucket.clone())),
        Output::known(2).with_dependencies(&Dependencies::single(queue.clone())),
    ));

    assert_eq!(joined.dependencies().to_sorted_vec(), vec![bucket, queue]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOMOGENEOUS LISTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that a list of known outputs joins into a vector in input order.
#[tokio::test]
async fn all_vec_preserves_order() {
    let joined = all_vec((1..=4).map(Output::known).collect());
    assert!(matches!(joined.state().await, OutputState::Known(v) if v == vec![1, 2, 3, 4]));
}

/// Verifies that the first failed element of a list wins.
#[tokio::test]
async fn all_vec_reports_first_failure() {
    let joined = all_vec(vec![
        Output::known(1),
        Output::unknown(),
        failing("element two"),
        failing("element three"),
    ]);
    assert_eq!(error_message(&joined.state().await), "element two");
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROPERTY TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
enum Input {
    Known(i32),
    Unknown,
    Failed(usize),
}

fn input_strategy() -> impl Strategy<Value = Input> {
    prop_oneof![
        any::<i32>().prop_map(Input::Known),
        Just(Input::Unknown),
        (0usize..100).prop_map(Input::Failed),
    ]
}

fn to_output(input: &Input) -> Output<i32> {
    match input {
        Input::Known(n) => Output::known(*n),
        Input::Unknown => Output::unknown(),
        Input::Failed(tag) => Output::failed(OutputError::msg(format!("failure {tag}"))),
    }
}

/// Reference model of the join rules.
fn expected(inputs: &[Input]) -> Result<Option<Vec<i32>>, String> {
    if let Some(tag) = inputs.iter().find_map(|i| match i {
        Input::Failed(tag) => Some(*tag),
        _ => None,
    }) {
        return Err(format!("failure {tag}"));
    }
    if inputs.iter().any(|i| matches!(i, Input::Unknown)) {
        return Ok(None);
    }
    Ok(Some(
        inputs
            .iter()
            .filter_map(|i| match i {
                Input::Known(n) => Some(*n),
                _ => None,
            })
            .collect(),
    ))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Verifies that `all_vec` matches the reference join model for arbitrary inputs.
    #[test]
    fn all_vec_matches_model(inputs in prop::collection::vec(input_strategy(), 0..12)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let outputs = inputs.iter().map(to_output).collect();
        let state = rt.block_on(all_vec(outputs).state());

        let actual = state.into_result().map_err(|e| e.to_string());
        prop_assert_eq!(actual, expected(&inputs));
    }

    /// Verifies that a pair join agrees with the list join on the same inputs.
    #[test]
    fn tuple_join_matches_model(a in input_strategy(), b in input_strategy()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let state = rt.block_on(all((to_output(&a), to_output(&b))).state());

        let actual = state
            .into_result()
            .map(|joined| joined.map(|(x, y)| vec![x, y]))
            .map_err(|e| e.to_string());
        prop_assert_eq!(actual, expected(&[a, b]));
    }
}
