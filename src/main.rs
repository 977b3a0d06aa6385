//! DuelSim - Bouncing Sword Duel Simulator
//!
//! Two autonomous fighters carom around a shrinking arena and fence whenever
//! their paths cross. Runs graphically by default, or headless with
//! `--headless config.json`.

use bevy::prelude::*;
use bevy_egui::EguiPlugin;

mod cli;
mod combat;
mod headless;
mod states;

use combat::CombatPlugin;
use headless::{run_headless_round, HeadlessRoundConfig};
use states::play_round::{
    insert_round_resources, PlayRoundPlugin, TuningPlugin,
};
use states::{GameState, StatesPlugin};

fn main() {
    let args = cli::parse_args();

    if let Some(config_path) = &args.headless {
        let mut config = match HeadlessRoundConfig::load_from_file(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading headless config: {}", e);
                std::process::exit(1);
            }
        };

        // CLI flags override the config file.
        if let Some(output) = &args.output {
            config.output_path = Some(output.display().to_string());
        }
        if let Some(max_duration) = args.max_duration {
            config.max_duration_secs = max_duration;
        }
        if let Some(seed) = args.seed {
            config.random_seed = Some(seed);
        }

        if let Err(e) = run_headless_round(config) {
            eprintln!("Headless round failed: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let mut app = App::new();
    app
        // Bevy default plugins with custom window settings
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "DuelSim".to_string(),
                resolution: (1280.0, 720.0).into(),
                resizable: true,
                ..default()
            }),
            ..default()
        }))
        // Tuning first: PlayRoundPlugin resources need the loaded values
        .add_plugins(TuningPlugin);

    {
        let tuning = app
            .world()
            .resource::<states::play_round::CombatTuning>()
            .clone();
        insert_round_resources(&mut app, &tuning, args.seed);
    }

    app.add_plugins((EguiPlugin, StatesPlugin, CombatPlugin, PlayRoundPlugin))
        // Start on the title screen
        .init_state::<GameState>()
        .run();
}
