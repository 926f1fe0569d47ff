use pigroll::defs::standard;
use pigroll::stats::Verdict;
use pigroll::{MonteCarlo, OutcomeModel, Predictor};
use tracing_subscriber::EnvFilter;

fn main() -> pigroll::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let model = OutcomeModel::new(standard())?;
    let predictor = Predictor::from(&model);

    println!("Pig out odds per roll = {:.3}", model.p_bust());
    println!("Expected score from one roll = {:.2}", model.e_roll());
    println!(
        "Expected score from one roll without a pig out = {:.2}",
        model.e_roll_given_survive()
    );
    println!(
        "  fixed-count: stop after {:.2} rolls, about {:.2} points per turn",
        predictor.break_even_rolls(),
        predictor.break_even_score()
    );
    println!(
        "  target-score: stop at {:.2} points, about {:.2} rolls per turn",
        predictor.break_even_target(),
        predictor.expected_rolls()
    );

    let cmp = MonteCarlo::default().compare_break_even(&model)?;
    for batch in [&cmp.fixed_count, &cmp.target_score] {
        println!(
            "{:>12}: {:.2} turns to 100 points, {:.2} points / {:.2} rolls per turn",
            batch.strategy.name(),
            batch.mean().unwrap_or(f64::NAN),
            batch.turn_score_mean,
            batch.turn_rolls_mean
        );
    }
    println!(
        "t = {:.3}, p = {:.4} (one-sided {:.4})",
        cmp.test.t, cmp.test.p_two_sided, cmp.test.p_one_sided
    );
    if cmp.verdict == Verdict::FirstFewer {
        println!("target-score needs fewer turns than fixed-count on average");
    }
    Ok(())
}
