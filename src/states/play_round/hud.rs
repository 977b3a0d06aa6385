//! Round HUD (egui)
//!
//! Health bars, combo pips and the held skill for each fighter, the round
//! timer, the escalation readout, the countdown overlay, and the round-end
//! overlay with a tail of the round log.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::combat::log::RoundLog;

use super::components::{
    AttackState, DefenseState, DefensiveStance, EscalationController, EscalationState, Fighter,
    FighterSide, OutcomeSlot, PacingState, RoundClock, RoundPhase, RoundStats, SkillState,
};
use super::constants::TICK_RATE;
use super::match_flow::countdown_label;
use super::tuning::CombatTuning;

fn side_color32(side: FighterSide) -> egui::Color32 {
    match side {
        FighterSide::Red => egui::Color32::from_rgb(230, 80, 80),
        FighterSide::Blue => egui::Color32::from_rgb(90, 115, 255),
    }
}

pub fn round_hud(
    mut contexts: EguiContexts,
    tuning: Res<CombatTuning>,
    clock: Res<RoundClock>,
    controller: Res<EscalationController>,
    pacing: Res<PacingState>,
    outcome_slot: Res<OutcomeSlot>,
    stats: Res<RoundStats>,
    log: Res<RoundLog>,
    fighters: Query<(&Fighter, &AttackState, &DefenseState, &SkillState)>,
) {
    let ctx = contexts.ctx_mut();

    egui::TopBottomPanel::top("round_hud")
        .frame(egui::Frame::none().fill(egui::Color32::from_rgba_premultiplied(10, 10, 16, 200)))
        .show(ctx, |ui| {
            ui.add_space(6.0);
            ui.columns(3, |columns| {
                let mut red = None;
                let mut blue = None;
                for entry in fighters.iter() {
                    match entry.0.side {
                        FighterSide::Red => red = Some(entry),
                        FighterSide::Blue => blue = Some(entry),
                    }
                }
                if let Some(fighter) = red {
                    fighter_panel(&mut columns[0], fighter, egui::Align::LEFT);
                }
                center_panel(&mut columns[1], &tuning, &clock, &controller, &pacing);
                if let Some(fighter) = blue {
                    fighter_panel(&mut columns[2], fighter, egui::Align::RIGHT);
                }
            });
            ui.add_space(6.0);
        });

    match clock.phase {
        RoundPhase::Countdown => {
            countdown_overlay(ctx, countdown_label(&tuning, clock.countdown_left));
        }
        RoundPhase::Ended => {
            round_end_overlay(ctx, &outcome_slot, &stats, &log);
        }
        _ => {}
    }
}

fn fighter_panel(
    ui: &mut egui::Ui,
    (fighter, attack, defense, skills): (&Fighter, &AttackState, &DefenseState, &SkillState),
    align: egui::Align,
) {
    let color = side_color32(fighter.side);
    ui.with_layout(egui::Layout::top_down(align), |ui| {
        ui.label(
            egui::RichText::new(fighter.side.label())
                .size(18.0)
                .color(color),
        );

        let fraction = fighter.health.max(0) as f32 / fighter.max_health.max(1) as f32;
        let bar = egui::ProgressBar::new(fraction)
            .desired_width(220.0)
            .fill(color)
            .text(
                egui::RichText::new(format!("{}/{}", fighter.health.max(0), fighter.max_health))
                    .color(egui::Color32::WHITE),
            );
        ui.add(bar);

        // Combo pips: filled up to the stage reached in the live chain.
        let pips: String = (1..=3)
            .map(|stage| if attack.stage >= stage { '●' } else { '○' })
            .collect();
        let stance = match defense.stance {
            DefensiveStance::Shielding => "  [SHIELD]",
            DefensiveStance::Parrying => "  [PARRY]",
            DefensiveStance::None => "",
        };
        ui.label(
            egui::RichText::new(format!("{}{}", pips, stance))
                .size(14.0)
                .color(egui::Color32::from_rgb(210, 210, 210)),
        );

        let skill_text = if let Some(active) = skills.active.as_ref() {
            format!("using {:?}", active.kind)
        } else if let Some(held) = skills.held() {
            format!("holding {:?}", held)
        } else {
            "no skill".to_string()
        };
        ui.label(
            egui::RichText::new(skill_text)
                .size(13.0)
                .color(egui::Color32::from_rgb(160, 160, 170)),
        );
    });
}

fn center_panel(
    ui: &mut egui::Ui,
    tuning: &CombatTuning,
    clock: &RoundClock,
    controller: &EscalationController,
    pacing: &PacingState,
) {
    ui.vertical_centered(|ui| {
        let remaining = tuning
            .round_time_limit_ticks
            .saturating_sub(clock.fight_ticks);
        let seconds = remaining / TICK_RATE;
        let timer_color = if seconds <= 10 {
            egui::Color32::from_rgb(255, 120, 80)
        } else {
            egui::Color32::from_rgb(230, 217, 191)
        };
        ui.label(
            egui::RichText::new(format!("{}:{:02}", seconds / 60, seconds % 60))
                .size(30.0)
                .color(timer_color),
        );

        let (escalation_text, escalation_color) = match controller.state {
            EscalationState::Stable => ("", egui::Color32::TRANSPARENT),
            EscalationState::Pulsing => ("PULSE", egui::Color32::from_rgb(230, 180, 80)),
            EscalationState::Warning => ("WARNING", egui::Color32::from_rgb(255, 140, 60)),
            EscalationState::RapidShrink => ("ARENA SHRINKING", egui::Color32::from_rgb(255, 70, 50)),
        };
        if clock.phase == RoundPhase::SuddenDeath {
            ui.label(
                egui::RichText::new("SUDDEN DEATH")
                    .size(16.0)
                    .color(egui::Color32::from_rgb(255, 60, 60)),
            );
        } else if !escalation_text.is_empty() {
            ui.label(
                egui::RichText::new(escalation_text)
                    .size(14.0)
                    .color(escalation_color),
            );
        }

        if pacing.paused {
            ui.label(
                egui::RichText::new("PAUSED  (Space)")
                    .size(14.0)
                    .color(egui::Color32::from_rgb(180, 180, 180)),
            );
        }
    });
}

fn countdown_overlay(ctx: &egui::Context, label: &str) {
    egui::Area::new(egui::Id::new("countdown_overlay"))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, -40.0])
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(label)
                    .size(if label == "FIGHT" { 64.0 } else { 96.0 })
                    .color(egui::Color32::from_rgb(230, 204, 153)),
            );
        });
}

fn round_end_overlay(
    ctx: &egui::Context,
    outcome_slot: &OutcomeSlot,
    stats: &RoundStats,
    log: &RoundLog,
) {
    let Some(outcome) = outcome_slot.0 else {
        return;
    };

    egui::Window::new("round_over")
        .title_bar(false)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.set_min_width(360.0);
            ui.vertical_centered(|ui| {
                ui.add_space(10.0);
                let (headline, color) = match outcome.winner {
                    Some(side) => (format!("{} WINS", side.label().to_uppercase()), side_color32(side)),
                    None => ("DRAW".to_string(), egui::Color32::from_rgb(200, 200, 200)),
                };
                ui.label(egui::RichText::new(headline).size(40.0).color(color));
                ui.label(
                    egui::RichText::new(format!(
                        "{:?} after {:.1}s",
                        outcome.reason,
                        outcome.fight_ticks as f32 / TICK_RATE as f32
                    ))
                    .size(16.0)
                    .color(egui::Color32::from_rgb(170, 170, 180)),
                );

                ui.add_space(12.0);
                for side in [FighterSide::Red, FighterSide::Blue] {
                    let side_stats = stats.side(side);
                    ui.label(
                        egui::RichText::new(format!(
                            "{}: {} dmg, {} hits, {} skills, {} orbs",
                            side.label(),
                            side_stats.damage_dealt,
                            side_stats.hits_landed,
                            side_stats.skills_used,
                            side_stats.orbs_collected,
                        ))
                        .size(14.0)
                        .color(side_color32(side)),
                    );
                }

                ui.add_space(12.0);
                ui.separator();
                for entry in log.recent(6) {
                    ui.label(
                        egui::RichText::new(format!("[{}] {}", entry.tick, entry.message))
                            .size(12.0)
                            .color(egui::Color32::from_rgb(140, 140, 150)),
                    );
                }
                ui.separator();

                ui.add_space(8.0);
                ui.label(
                    egui::RichText::new("R: new round    Esc: title")
                        .size(14.0)
                        .color(egui::Color32::from_rgb(180, 180, 180)),
                );
                ui.add_space(10.0);
            });
        });
}
