#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Candy Match level with an automatic player.

mod level_transfer;

use anyhow::{Context, Result};
use candy_match_core::{Command, Event, LevelDefinition, ObjectiveGoal, PassTrigger};
use candy_match_system_deadlock::find_valid_move;
use candy_match_system_progression::Campaign;
use candy_match_world::{self as world, query, TileIdAllocator, World};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Command-line arguments accepted by the Candy Match CLI.
#[derive(Debug, Parser)]
#[command(name = "candy-match", about = "Plays a Candy Match level with an automatic player")]
struct CliArgs {
    /// Campaign seed; also seeds the refills of an imported level.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// One-based campaign level to play.
    #[arg(long, default_value_t = 1)]
    level: u32,
    /// Level transfer string to play instead of a campaign level.
    #[arg(long, value_name = "LEVEL")]
    layout: Option<String>,
    /// Stop the automatic player after this many swaps.
    #[arg(long, value_name = "COUNT")]
    max_moves: Option<u32>,
    /// Print the level transfer string and exit without playing.
    #[arg(long)]
    export: bool,
}

/// Entry point for the Candy Match command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    let (definition, seed) = resolve_level(&args)?;

    if args.export {
        let encoded =
            level_transfer::encode(&definition).context("failed to encode level definition")?;
        println!("{encoded}");
        return Ok(());
    }

    let mut world = World::new_level(
        definition,
        ChaCha8Rng::seed_from_u64(seed),
        TileIdAllocator::new(),
    )
    .context("level definition was rejected")?;
    play(&mut world, args.max_moves);
    Ok(())
}

fn resolve_level(args: &CliArgs) -> Result<(LevelDefinition, u64)> {
    if let Some(layout) = &args.layout {
        let definition = level_transfer::decode(layout).context("failed to decode --layout")?;
        return Ok((definition, args.seed));
    }

    let level = Campaign::new(args.seed)
        .level(args.level)
        .with_context(|| format!("campaign has no level {}", args.level))?;
    Ok((level.definition, level.seed))
}

fn play(world: &mut World, max_moves: Option<u32>) {
    println!("{}", describe_objectives(query::definition(world)));
    print!("{}", query::grid(world));

    let mut swaps = 0;
    while !query::status(world).is_finished() && max_moves.map_or(true, |limit| swaps < limit) {
        let command = match find_valid_move(query::grid(world)) {
            Some(swap) => Command::Swap {
                from: swap.from,
                to: swap.to,
            },
            None => Command::Reshuffle,
        };
        if matches!(command, Command::Swap { .. }) {
            swaps += 1;
        }

        let mut events = Vec::new();
        world::apply(world, command, &mut events);
        for event in &events {
            println!("{}", describe_event(event));
        }
        print!("{}", query::grid(world));
    }

    println!(
        "status: {:?}, score: {}, moves left: {}",
        query::status(world),
        query::score(world),
        query::moves_remaining(world)
    );
}

fn describe_objectives(definition: &LevelDefinition) -> String {
    let goals: Vec<String> = definition
        .objectives
        .iter()
        .map(|goal| match goal {
            ObjectiveGoal::Score { target } => format!("score {target}"),
            other => format!("{other:?}"),
        })
        .collect();
    format!(
        "{}x{} board, {} colors, {} moves, goals: {}",
        definition.columns,
        definition.rows,
        definition.colors,
        definition.move_budget,
        goals.join(", ")
    )
}

fn describe_event(event: &Event) -> String {
    match event {
        Event::SwapRejected { from, to, reason } => format!(
            "swap ({}, {}) -> ({}, {}) rejected: {reason:?}",
            from.column(),
            from.row(),
            to.column(),
            to.row()
        ),
        Event::ActivationRejected { cell, reason } => format!(
            "activation at ({}, {}) rejected: {reason:?}",
            cell.column(),
            cell.row()
        ),
        Event::SwapReverted { from, to } => format!(
            "swap ({}, {}) -> ({}, {}) reverted",
            from.column(),
            from.row(),
            to.column(),
            to.row()
        ),
        Event::ComboTriggered { kind, bonus } => format!("combo {kind:?} (+{bonus})"),
        Event::CascadeResolved { pass } => {
            let trigger = match pass.trigger {
                PassTrigger::Match => format!("match x{}", pass.chain),
                PassTrigger::Combo(kind) => format!("{kind:?}"),
                PassTrigger::Activation => "activation".to_owned(),
            };
            format!(
                "  pass {}: {trigger}, {} cleared, {} spawned, +{}",
                pass.index,
                pass.removed.len(),
                pass.spawned.len(),
                pass.score
            )
        }
        Event::MoveCommitted {
            moves_remaining,
            score,
            score_delta,
        } => format!("move scored {score_delta}, total {score}, {moves_remaining} moves left"),
        Event::BoardReshuffled { report } => format!(
            "board reshuffled after {} attempt(s){}",
            report.attempts,
            if report.valid_move_found {
                ""
            } else {
                ", still deadlocked"
            }
        ),
        Event::ObjectiveProgressed { delta } => format!(
            "objective {}: {} -> {} of {}",
            delta.index, delta.before, delta.after, delta.target
        ),
        Event::LevelFinished { status } => format!("level finished: {status:?}"),
        Event::LevelRestarted { moves_remaining } => {
            format!("level restarted with {moves_remaining} moves")
        }
    }
}
