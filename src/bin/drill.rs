//! Automated drill: plays N rounds against the engine, answering every count
//! and strategy prompt with the engine's own advice, then reports the session
//! tallies. Useful as a smoke run and as a quick expected-value sanity check.

use std::error::Error;

use clap::Parser;

use blackjack_trainer::game::session::Phase;
use blackjack_trainer::game::strategy::Action;
use blackjack_trainer::{TrainerConfig, TrainerSession};

#[derive(Parser, Debug)]
#[command(version, about = "Self-playing blackjack counting drill")]
struct Args {
    /// Rounds to play.
    #[arg(short, long, default_value_t = 100)]
    rounds: u32,

    /// Decks in the shoe.
    #[arg(short, long, default_value_t = 6)]
    decks: usize,

    /// Reshuffle when the shoe falls below this fraction of its cards.
    #[arg(short, long, default_value_t = 0.25)]
    penetration: f64,

    /// Emit the final report as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = TrainerConfig::new()
        .num_decks(args.decks)
        .penetration(args.penetration)
        .build();
    let mut session = TrainerSession::new(config)?;

    let mut deviations_seen = 0u32;
    let mut insurance_offers = 0u32;

    for _ in 0..args.rounds {
        session.start_new_round()?;
        if session.insurance().is_some() {
            insurance_offers += 1;
        }
        while matches!(session.phase(), Phase::InputGuesses | Phase::PlayerAction) {
            if session.phase() == Phase::InputGuesses {
                let rec = session.recommendation()?;
                let fb = session.submit_guesses(
                    Some(session.running_count()),
                    &rec.action.letter().to_string(),
                )?;
                if fb.is_deviation {
                    deviations_seen += 1;
                }
            }
            match session.recommendation()?.action {
                Action::Hit => session.player_hit()?,
                Action::Stand => session.player_stand()?,
                Action::Double => session.player_double()?,
                Action::Split => session.player_split()?,
            }
        }
    }

    let snapshot = session.stats().snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("{:-^44}", " drill results ");
        println!("{:<28}{:>16}", "rounds played", args.rounds);
        println!("{:<28}{:>16}", "hands played", snapshot.hands_played);
        println!(
            "{:<28}{:>15.1}%",
            "wins",
            snapshot.win_pct
        );
        println!(
            "{:<28}{:>15.1}%",
            "losses",
            snapshot.loss_pct
        );
        println!(
            "{:<28}{:>15.1}%",
            "pushes",
            snapshot.push_pct
        );
        println!("{:<28}{:>16}", "blackjacks", snapshot.blackjacks);
        println!("{:<28}{:>16}", "deviation spots", deviations_seen);
        println!("{:<28}{:>16}", "insurance offers", insurance_offers);
        println!("{:<28}{:>16}", "units wagered", snapshot.units_wagered);
        println!("{:<28}{:>+16.1}", "units net", snapshot.units_net);
    }
    Ok(())
}
