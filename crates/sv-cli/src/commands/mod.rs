pub mod check;
pub mod estimate;
pub mod resolve;
pub mod weapons;

use std::fs;
use std::path::Path;

use sv_core::Board;
use sv_core::load::board_from_json;
use sv_mechanics::{Action, WeaponCatalog};

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))
}

/// Load a board file.
fn load_board(path: &Path) -> Result<Board, String> {
    let board = board_from_json(&read(path)?).map_err(|e| format!("{}: {e}", path.display()))?;
    tracing::debug!(path = %path.display(), units = board.len(), "loaded board");
    Ok(board)
}

/// Load a catalog file, or an empty catalog when none is given.
fn load_catalog(path: Option<&Path>) -> Result<WeaponCatalog, String> {
    match path {
        Some(p) => {
            let catalog = WeaponCatalog::from_json(&read(p)?)
                .map_err(|e| format!("{}: {e}", p.display()))?;
            tracing::debug!(path = %p.display(), weapons = catalog.len(), "loaded catalog");
            Ok(catalog)
        }
        None => Ok(WeaponCatalog::new()),
    }
}

/// Load an action file.
fn load_action(path: &Path) -> Result<Action, String> {
    Action::from_json(&read(path)?).map_err(|e| format!("{}: {e}", path.display()))
}
