use std::path::Path;

use comfy_table::{ContentArrangement, Table};
use sv_mechanics::CombatEngine;

pub fn run(board: &Path, catalog: Option<&Path>, action: &Path, json: bool) -> Result<(), String> {
    let board = super::load_board(board)?;
    let catalog = super::load_catalog(catalog)?;
    let action = super::load_action(action)?;

    let engine = CombatEngine::new(&catalog);
    let estimates = engine.estimate(&action, &board).map_err(|e| e.to_string())?;

    if json {
        let out = serde_json::to_string_pretty(&estimates)
            .map_err(|e| format!("cannot serialize estimates: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    if estimates.is_empty() {
        println!("  No assignments.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Weapon", "Target", "Attacks", "Hits", "Wounds", "Unsaved", "Damage"]);
    let mut total = 0.0;
    for (i, (assignment, e)) in action.assignments.iter().zip(&estimates).enumerate() {
        total += e.damage;
        table.add_row(vec![
            i.to_string(),
            assignment.weapon_id.to_string(),
            assignment.target_unit_id.to_string(),
            format!("{:.2}", e.attacks),
            format!("{:.2}", e.hits),
            format!("{:.2}", e.wounds + e.mortal_wounds),
            format!("{:.2}", e.unsaved),
            format!("{:.2}", e.damage),
        ]);
    }
    println!("{table}");
    println!();
    println!("  Expected damage: {total:.2}");

    Ok(())
}
