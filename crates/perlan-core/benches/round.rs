use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use perlan_core::engine::{QuizSession, SessionSettings};
use perlan_core::model::{Category, Difficulty, GameConfig, PlayerAnswer, Question};
use perlan_core::random::select_round;
use perlan_core::scoring::{finalize, longest_streak};
use perlan_core::stats::StatsBook;

fn pool(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| Question {
            id: format!("q{i}"),
            category: Category::ALL[i % Category::ALL.len()],
            difficulty: Difficulty::Medium,
            text: format!("Question {i}?"),
            options: ["a".into(), "b".into(), "c".into()],
            correct_index: i % 3,
            fact: "fact".into(),
        })
        .collect()
}

fn config(category: Category) -> GameConfig {
    GameConfig {
        username: "bench".into(),
        category,
        difficulty: Difficulty::Medium,
        is_challenge_mode: true,
    }
}

fn bench_round_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("round");
    let small = pool(20);
    let large = pool(5_000);
    let mut rng = StdRng::seed_from_u64(1);

    group.bench_function("select_general_5000", |b| {
        b.iter(|| select_round(black_box(&large), Category::General, 10, &mut rng))
    });

    group.bench_function("select_fallback_20", |b| {
        b.iter(|| select_round(black_box(&small), Category::Christmas, 10, &mut rng))
    });

    group.bench_function("session_from_pool_5000", |b| {
        b.iter(|| {
            QuizSession::from_pool(
                config(Category::Volcanoes),
                black_box(&large),
                SessionSettings::default(),
                &mut rng,
            )
        })
    });

    group.finish();
}

fn bench_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring");
    let answers: Vec<PlayerAnswer> = (0..1_000)
        .map(|i| PlayerAnswer {
            question_id: format!("q{i}"),
            selected_option_index: Some(i % 3),
            is_correct: i % 7 != 0,
            time_taken: 3,
        })
        .collect();

    group.bench_function("finalize_1000", |b| b.iter(|| finalize(black_box(&answers))));
    group.bench_function("longest_streak_1000", |b| {
        b.iter(|| longest_streak(black_box(&answers)))
    });

    group.bench_function("stats_apply_100_rounds", |b| {
        let mut rng = StdRng::seed_from_u64(2);
        let questions = pool(50);
        let result = {
            let mut session = QuizSession::from_pool(
                config(Category::General),
                &questions,
                SessionSettings {
                    countdown_ticks: 0,
                    ..SessionSettings::default()
                },
                &mut rng,
            )
            .unwrap();
            loop {
                session.select(0).unwrap();
                if let perlan_core::engine::Advance::Completed(r) = session.advance().unwrap() {
                    break r;
                }
            }
        };
        b.iter(|| {
            let mut book = StatsBook::new();
            for _ in 0..100 {
                book.apply(black_box(&result), chrono::Utc::now());
            }
            book
        })
    });

    group.finish();
}

criterion_group!(benches, bench_round_construction, bench_scoring);
criterion_main!(benches);
