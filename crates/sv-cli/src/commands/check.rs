use std::path::Path;

use colored::Colorize;
use sv_mechanics::CombatEngine;

pub fn run(board: &Path, catalog: Option<&Path>, action: Option<&Path>) -> Result<(), String> {
    let board = super::load_board(board)?;
    let catalog = super::load_catalog(catalog)?;

    let models: usize = board.units().map(|u| u.models.len()).sum();
    let carried: usize = board.units().map(|u| u.weapons.len()).sum();
    for unit in board.units() {
        if unit.models.is_empty() {
            println!("  {} unit '{}' has no models", "warning:".yellow(), unit.id);
        }
        for w in &unit.weapons {
            if catalog.get(&w.id).is_some() {
                println!(
                    "  {} unit '{}' carries '{}', which shadows the catalog entry",
                    "note:".dimmed(),
                    unit.id,
                    w.id
                );
            }
        }
    }

    if let Some(path) = action {
        let action = super::load_action(path)?;
        CombatEngine::new(&catalog)
            .estimate(&action, &board)
            .map_err(|e| format!("{}: {e}", path.display()))?;
        println!("  Action is valid: {} assignments.", action.assignments.len());
    }

    println!("  All checks passed.");
    println!(
        "  {} units, {} models, {} carried weapons, {} catalog weapons",
        board.len(),
        models,
        carried,
        catalog.len()
    );

    Ok(())
}
