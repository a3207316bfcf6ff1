use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use poker_bridge::{
    game::{
        ActionRequest, Card, DecisionPolicy, DecisionRequest, GameEngine, HoldemEngine,
        LegalActions, NoopObserver, PolicyError, RaiseBounds, policy_fn,
    },
    game::eval::best_hand,
    session::{Observation, SnapshotBuilder, TurnSignal, detect},
};

fn calling_policies(n: usize) -> Vec<Box<dyn DecisionPolicy>> {
    (0..n)
        .map(|_| -> Box<dyn DecisionPolicy> {
            Box::new(policy_fn(
                |req: &DecisionRequest<'_>| -> Result<ActionRequest, PolicyError> {
                    Ok(ActionRequest::call(req.seat, req.legal.call))
                },
            ))
        })
        .collect()
}

fn engine_with_players(n: usize) -> HoldemEngine {
    let names = (0..n).map(|i| format!("player{i}")).collect();
    HoldemEngine::new(names, 1_000_000, 5, 10).unwrap()
}

/// Benchmark hand evaluation with 7 cards (full hand + board)
fn bench_hand_eval_7_cards(c: &mut Criterion) {
    let cards: Vec<Card> = ["As", "Ks", "Qs", "Js", "Ts", "2h", "3d"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();

    c.bench_function("hand_eval_7_cards", |b| {
        b.iter(|| best_hand(&cards));
    });
}

/// Benchmark a full round to showdown with different player counts
fn bench_play_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("play_round");

    for n_players in [2, 6, 10].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_players", n_players)),
            n_players,
            |b, &n| {
                let mut engine = engine_with_players(n);
                let mut policies = calling_policies(n);
                b.iter(|| engine.play_round(&mut policies, &mut NoopObserver));
            },
        );
    }

    group.finish();
}

/// Benchmark building the human's view of a ten seat table
fn bench_snapshot_build(c: &mut Criterion) {
    let mut engine = engine_with_players(10);
    let mut policies = calling_policies(10);
    engine.play_round(&mut policies, &mut NoopObserver).unwrap();
    let view = engine.view();
    let builder = SnapshotBuilder::new(0);

    c.bench_function("snapshot_build_10_seats", |b| {
        b.iter(|| builder.build(&view, None));
    });
}

/// Benchmark one open/submit/await handoff without contention
fn bench_turn_signal_handoff(c: &mut Criterion) {
    let signal = TurnSignal::new();
    let legal = LegalActions {
        fold: true,
        call: 10,
        raise: Some(RaiseBounds { min: 20, max: 100 }),
    };

    c.bench_function("turn_signal_handoff", |b| {
        b.iter(|| {
            let id = signal.open(0, legal).unwrap();
            signal.submit(ActionRequest::raise(0, 40), Some(id)).unwrap();
            signal.await_one(id, std::time::Duration::from_secs(1))
        });
    });
}

/// Benchmark round boundary detection
fn bench_detect(c: &mut Criterion) {
    let previous = Observation {
        round_seq: 7,
        terminal_round: Some(7),
        live_seats: false,
    };
    let current = Observation {
        round_seq: 8,
        terminal_round: Some(7),
        live_seats: true,
    };

    c.bench_function("detect", |b| {
        b.iter(|| detect(Some(&previous), &current));
    });
}

criterion_group!(game_operations, bench_hand_eval_7_cards, bench_play_round, bench_snapshot_build);

criterion_group!(bridge_operations, bench_turn_signal_handoff, bench_detect);

criterion_main!(game_operations, bridge_operations);
