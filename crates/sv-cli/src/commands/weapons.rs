use std::path::Path;

use comfy_table::{ContentArrangement, Table};
use sv_core::WeaponProfile;

pub fn run(catalog: Option<&Path>, board: Option<&Path>) -> Result<(), String> {
    let catalog = super::load_catalog(catalog)?;
    let board = board.map(super::load_board).transpose()?;

    let mut rows: Vec<(String, &WeaponProfile)> = catalog
        .iter()
        .map(|w| ("catalog".to_string(), w))
        .collect();
    if let Some(board) = &board {
        for unit in board.units() {
            rows.extend(unit.weapons.iter().map(|w| (unit.id.to_string(), w)));
        }
    }

    if rows.is_empty() {
        println!("  No weapons found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Id", "Name", "Source", "Range", "A", "Skill", "S", "AP", "D", "Keywords",
    ]);
    for (source, w) in &rows {
        let keywords: Vec<String> = w.keywords.iter().map(ToString::to_string).collect();
        let keywords = if keywords.is_empty() {
            "-".to_string()
        } else {
            keywords.join(", ")
        };
        table.add_row(vec![
            w.id.to_string(),
            w.name.clone(),
            source.clone(),
            w.range.to_string(),
            w.attacks.to_string(),
            format!("{}+", w.skill),
            w.strength.to_string(),
            w.ap.to_string(),
            w.damage.to_string(),
            keywords,
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} weapons", rows.len());

    Ok(())
}
