use super::load_index;
use crate::error::Result;
use std::path::Path;

pub fn run(file: &Path) -> Result<()> {
    let (reader, index) = load_index(file)?;
    crate::tui::run(reader, &index)
}
