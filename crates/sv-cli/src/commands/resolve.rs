use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use sv_mechanics::{CombatEngine, EngineConfig, ResolutionResult};

pub struct Options<'a> {
    pub board: &'a Path,
    pub catalog: Option<&'a Path>,
    pub action: &'a Path,
    pub seed: u64,
    pub max_log: usize,
    pub json: bool,
    pub verbose: bool,
}

pub fn run(opts: &Options<'_>) -> Result<(), String> {
    let mut board = super::load_board(opts.board)?;
    let catalog = super::load_catalog(opts.catalog)?;
    let action = super::load_action(opts.action)?;

    let config = EngineConfig::default()
        .with_seed(opts.seed)
        .with_max_log_records(opts.max_log);
    let engine = CombatEngine::new(&catalog).with_config(config);
    let result = engine.resolve_seeded(&action, &mut board);

    if opts.json {
        let out = serde_json::to_string_pretty(&result)
            .map_err(|e| format!("cannot serialize result: {e}"))?;
        println!("{out}");
    } else {
        print_result(&result, opts.seed, opts.verbose);
    }

    match result.reason {
        Some(reason) if !result.success => Err(reason),
        _ => Ok(()),
    }
}

fn print_result(result: &ResolutionResult, seed: u64, verbose: bool) {
    if !result.success {
        return;
    }

    println!(
        "  {} {}",
        "Resolution".bold(),
        format!("(seed={seed})").dimmed()
    );
    println!();

    if result.assignments.is_empty() {
        println!("  No assignments.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "#", "Weapon", "Target", "Attacks", "Hits", "Wounds", "Mortal", "Failed saves", "Damage",
        "Casualties",
    ]);
    for a in &result.assignments {
        let s = &a.summary;
        let target = if a.target_destroyed {
            format!("{} (destroyed)", a.target_unit_id)
        } else {
            a.target_unit_id.to_string()
        };
        table.add_row(vec![
            a.index.to_string(),
            a.weapon_id.to_string(),
            target,
            s.attacks.to_string(),
            s.hits.to_string(),
            s.wounds.to_string(),
            s.mortal_wounds.to_string(),
            s.failed_saves.to_string(),
            s.damage_applied.to_string(),
            s.casualties.to_string(),
        ]);
    }
    println!("{table}");
    println!();

    if verbose {
        println!("  {}", "Roll Log".bold().underline());
        println!();
        for record in &result.log {
            println!("  {}", record.to_string().dimmed());
        }
        if result.log.is_empty() {
            println!("  {}", "(no rolls)".dimmed());
        }
        println!();
    }

    println!("  {}", result.summary);
}
